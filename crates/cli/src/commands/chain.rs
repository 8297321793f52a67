//! Chain sync strategies and node server version

use anyhow::{Context, Result};
use serde::Serialize;

use crate::output::{print_list, print_message, OutputFormat, TableDisplay};
use sysio_harness::{HarnessConfig, Session};
use sysio_harness_common::{chain_strategies, ChainSyncStrategy};

#[derive(Serialize)]
pub struct StrategyDisplay {
    pub name: String,
    pub id: u8,
    pub arg: String,
}

impl From<&ChainSyncStrategy> for StrategyDisplay {
    fn from(strategy: &ChainSyncStrategy) -> Self {
        Self {
            name: strategy.name.to_string(),
            id: strategy.id,
            arg: strategy.arg.to_string(),
        }
    }
}

impl TableDisplay for StrategyDisplay {
    fn headers() -> Vec<&'static str> {
        vec!["Name", "ID", "Argument"]
    }

    fn row(&self) -> Vec<String> {
        vec![self.name.clone(), self.id.to_string(), self.arg.clone()]
    }
}

pub fn list_strategies(format: OutputFormat) -> Result<()> {
    let mut rows: Vec<StrategyDisplay> = chain_strategies().values().map(StrategyDisplay::from).collect();
    rows.sort_by_key(|row| row.id);
    print_list(&rows, format);
    Ok(())
}

pub fn server_version(config: HarnessConfig, format: OutputFormat) -> Result<()> {
    let server = config.server_path();
    let session = Session::open(config);
    let version = session
        .server_version()
        .with_context(|| format!("Failed to query {}", server.display()))?;
    print_message(&version, format);
    Ok(())
}
