//! Asset arithmetic commands

use anyhow::{bail, Result};
use clap::Subcommand;
use serde::Serialize;

use crate::output::{print_item, OutputFormat, TableDisplay};
use sysio_harness_common::{add_amount, deduct_amount};

#[derive(Subcommand)]
pub enum AmountCommands {
    /// Add DELTA to ASSET
    Add {
        /// Asset, e.g. "10.0000 SYS"
        asset: String,
        /// Amount to add, same symbol
        delta: String,
    },

    /// Subtract DELTA from ASSET
    Sub {
        /// Asset, e.g. "10.0000 SYS"
        asset: String,
        /// Amount to subtract, same symbol
        delta: String,
    },
}

#[derive(Serialize)]
pub struct AmountResult {
    pub asset: String,
    pub delta: String,
    pub result: String,
}

impl TableDisplay for AmountResult {
    fn headers() -> Vec<&'static str> {
        vec!["Asset", "Delta", "Result"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.asset.clone(), self.delta.clone(), self.result.clone()]
    }
}

pub fn execute(cmd: AmountCommands, format: OutputFormat) -> Result<()> {
    let (asset, delta, result) = match cmd {
        AmountCommands::Add { asset, delta } => {
            let result = add_amount(&asset, &delta);
            (asset, delta, result)
        }
        AmountCommands::Sub { asset, delta } => {
            let result = deduct_amount(&asset, &delta);
            (asset, delta, result)
        }
    };

    let Some(result) = result else {
        bail!("Cannot combine \"{}\" and \"{}\": expected \"<amount> <symbol>\" with matching symbols", asset, delta);
    };
    print_item(&AmountResult { asset, delta, result }, format);
    Ok(())
}
