//! Core types for the sysio test harness

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::str::FromStr;

use crate::error::Error;

/// Chain sync strategy applied when a node starts
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyncStrategy {
    #[serde(rename = "none")]
    None,
    #[serde(rename = "replay")]
    Replay,
    #[serde(rename = "resync")]
    Resync,
    #[serde(rename = "hardReplay")]
    HardReplay,
}

impl SyncStrategy {
    pub const ALL: [SyncStrategy; 4] = [
        SyncStrategy::None,
        SyncStrategy::Replay,
        SyncStrategy::Resync,
        SyncStrategy::HardReplay,
    ];

    /// Tag used to look the strategy up by name
    pub fn name(&self) -> &'static str {
        match self {
            SyncStrategy::None => "none",
            SyncStrategy::Replay => "replay",
            SyncStrategy::Resync => "resync",
            SyncStrategy::HardReplay => "hardReplay",
        }
    }

    pub fn id(&self) -> u8 {
        match self {
            SyncStrategy::None => 0,
            SyncStrategy::Replay => 1,
            SyncStrategy::Resync => 2,
            SyncStrategy::HardReplay => 3,
        }
    }

    /// Command line argument passed to nodeop; empty for `None`
    pub fn arg(&self) -> &'static str {
        match self {
            SyncStrategy::None => "",
            SyncStrategy::Replay => "--replay-blockchain",
            SyncStrategy::Resync => "--delete-all-blocks",
            SyncStrategy::HardReplay => "--hard-replay-blockchain",
        }
    }

    pub fn record(&self) -> ChainSyncStrategy {
        ChainSyncStrategy {
            name: self.name(),
            id: self.id(),
            arg: self.arg(),
        }
    }
}

impl std::fmt::Display for SyncStrategy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for SyncStrategy {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SyncStrategy::ALL
            .into_iter()
            .find(|strategy| strategy.name() == s)
            .ok_or_else(|| Error::UnknownSyncStrategy(s.to_string()))
    }
}

/// Named chain sync strategy record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ChainSyncStrategy {
    pub name: &'static str,
    pub id: u8,
    pub arg: &'static str,
}

/// Lookup table of every chain sync strategy keyed by name
pub fn chain_strategies() -> BTreeMap<&'static str, ChainSyncStrategy> {
    SyncStrategy::ALL
        .iter()
        .map(|strategy| (strategy.name(), strategy.record()))
        .collect()
}

/// How the output of an external command is interpreted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReturnType {
    Raw,
    Json,
}

/// Subcommand of the block log utility
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BlockLogAction {
    MakeIndex,
    Trim,
    SmokeTest,
    #[default]
    ReturnBlocks,
}

impl BlockLogAction {
    pub const ALL: [BlockLogAction; 4] = [
        BlockLogAction::MakeIndex,
        BlockLogAction::Trim,
        BlockLogAction::SmokeTest,
        BlockLogAction::ReturnBlocks,
    ];

    /// Words placed after `block-log` on the utility's command line
    pub fn subcommand(&self) -> &'static [&'static str] {
        match self {
            BlockLogAction::MakeIndex => &["make-index"],
            BlockLogAction::Trim => &["trim-blocklog"],
            BlockLogAction::SmokeTest => &["smoke-test"],
            BlockLogAction::ReturnBlocks => &["print-log", "--as-json-array"],
        }
    }

    pub fn return_type(&self) -> ReturnType {
        match self {
            BlockLogAction::ReturnBlocks => ReturnType::Json,
            BlockLogAction::MakeIndex | BlockLogAction::Trim | BlockLogAction::SmokeTest => {
                ReturnType::Raw
            }
        }
    }
}

impl std::fmt::Display for BlockLogAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BlockLogAction::MakeIndex => write!(f, "make_index"),
            BlockLogAction::Trim => write!(f, "trim"),
            BlockLogAction::SmokeTest => write!(f, "smoke_test"),
            BlockLogAction::ReturnBlocks => write!(f, "return_blocks"),
        }
    }
}

impl FromStr for BlockLogAction {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BlockLogAction::ALL
            .into_iter()
            .find(|action| action.to_string() == s)
            .ok_or_else(|| Error::UnknownBlockLogAction(s.to_string()))
    }
}

/// Signal used to stop a launched process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShutdownSignal {
    Kill,
    #[default]
    Term,
}

impl std::fmt::Display for ShutdownSignal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ShutdownSignal::Kill => write!(f, "kill"),
            ShutdownSignal::Term => write!(f, "term"),
        }
    }
}

impl FromStr for ShutdownSignal {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "kill" => Ok(ShutdownSignal::Kill),
            "term" => Ok(ShutdownSignal::Term),
            other => Err(Error::UnknownSignal(other.to_string())),
        }
    }
}

/// Identifies a node in a test cluster
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeId {
    Bios,
    Index(u32),
}

impl NodeId {
    /// Directory name used for the node's data and config
    pub fn dir_name(&self) -> String {
        match self {
            NodeId::Bios => "node_bios".to_string(),
            NodeId::Index(index) => format!("node_{:02}", index),
        }
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.dir_name())
    }
}

impl From<u32> for NodeId {
    fn from(index: u32) -> Self {
        NodeId::Index(index)
    }
}
