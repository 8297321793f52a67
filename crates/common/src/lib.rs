//! Sysio Harness Common Library
//!
//! Process-free building blocks shared by the test harness and its CLI:
//! error types, closed enumerations, structural JSON comparison, JSON
//! extraction from noisy tool output and asset amount arithmetic.

pub mod asset;
pub mod compare;
pub mod error;
pub mod json;
pub mod types;

// Re-export commonly used types
pub use asset::{add_amount, deduct_amount, Asset};
pub use compare::{compare, compare_files, ValueKind};
pub use error::{Error, Result};
pub use json::{filter_json_object_or_array, to_json};
pub use types::*;

/// Harness version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
