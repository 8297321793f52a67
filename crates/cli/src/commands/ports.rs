//! Port availability command

use anyhow::Result;
use clap::Args;
use serde::Serialize;
use tracing::debug;

use crate::output::{print_list, OutputFormat, TableDisplay};
use sysio_harness::are_ports_available;

#[derive(Args)]
pub struct PortsArgs {
    /// Ports to check
    #[arg(required = true)]
    pub ports: Vec<u16>,
}

#[derive(Serialize)]
pub struct PortStatus {
    pub port: u16,
    pub available: bool,
}

impl TableDisplay for PortStatus {
    fn headers() -> Vec<&'static str> {
        vec!["Port", "Available"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.port.to_string(),
            if self.available { "yes" } else { "no" }.to_string(),
        ]
    }

    fn failed(&self) -> bool {
        !self.available
    }
}

/// Check every port; returns whether all of them are free
pub fn execute(args: PortsArgs, format: OutputFormat) -> Result<bool> {
    let statuses: Vec<PortStatus> = args
        .ports
        .iter()
        .map(|&port| {
            let available = are_ports_available([port]);
            debug!("Port {}: {}", port, if available { "free" } else { "in use" });
            PortStatus { port, available }
        })
        .collect();

    print_list(&statuses, format);
    Ok(statuses.iter().all(|s| s.available))
}
