//! Sysio Test Harness
//!
//! Helpers for integration tests that drive the node toolchain
//! (`nodeop`, `kiod`, `clio`, `sys-util`):
//! - a [`Session`] holding run configuration, the per-run data directory and
//!   the subprocess result log
//! - synchronous process invocation with shell-style command splitting
//! - bounded polling through [`Waiter`]
//! - per-node paths, block-log wrapper and node process handles
//! - local TCP helpers
//!
//! The process-free pieces (structural comparison, JSON extraction, asset
//! arithmetic, enumerations) live in `sysio-harness-common` and are
//! re-exported here.

pub mod block_log;
pub mod clock;
pub mod config;
pub mod logging;
pub mod net;
pub mod node;
pub mod paths;
pub mod process;
pub mod session;
pub mod wait;

pub use block_log::{BlockLogOutput, BlockLogRequest};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{BinariesConfig, HarnessConfig};
pub use net::{are_ports_available, make_http_request, read_socket_data, read_socket_data_str};
pub use node::NodeProcess;
pub use paths::{node_extension_to_name, RemoveNodeData};
pub use process::{pgrep_command, split_command_line, ErrorPolicy};
pub use session::{date_string, timestamp, Session, SubprocessLog};
pub use wait::{Condition, Readiness, WaitOptions, Waiter, DEFAULT_POLL_INTERVAL, DEFAULT_WAIT_TIMEOUT};

pub use sysio_harness_common::*;
