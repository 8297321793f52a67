//! Wrapper around the utility's `block-log` subcommands

use serde::Serialize;
use serde_json::Value;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::process::ErrorPolicy;
use crate::session::Session;
use sysio_harness_common::{to_json, BlockLogAction, Result, ReturnType};

/// A single `block-log` invocation
#[derive(Debug, Clone)]
pub struct BlockLogRequest {
    pub blocks_dir: PathBuf,
    pub action: BlockLogAction,
    pub output_file: Option<PathBuf>,
    pub first: Option<u32>,
    pub last: Option<u32>,
}

impl BlockLogRequest {
    /// Print every block of the log in `blocks_dir` as a JSON array
    pub fn new(blocks_dir: impl Into<PathBuf>) -> Self {
        Self {
            blocks_dir: blocks_dir.into(),
            action: BlockLogAction::default(),
            output_file: None,
            first: None,
            last: None,
        }
    }

    pub fn action(mut self, action: BlockLogAction) -> Self {
        self.action = action;
        self
    }

    pub fn output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output_file = Some(path.into());
        self
    }

    pub fn first(mut self, block: u32) -> Self {
        self.first = Some(block);
        self
    }

    pub fn last(mut self, block: u32) -> Self {
        self.last = Some(block);
        self
    }

    /// Full argv for the utility at `util`
    pub fn argv(&self, util: &Path) -> Vec<String> {
        let mut argv = vec![util.to_string_lossy().into_owned(), "block-log".to_string()];
        argv.extend(self.action.subcommand().iter().map(|s| s.to_string()));
        argv.push("--blocks-dir".to_string());
        argv.push(self.blocks_dir.to_string_lossy().into_owned());
        if let Some(output_file) = &self.output_file {
            argv.push("--output-file".to_string());
            argv.push(output_file.to_string_lossy().into_owned());
        }
        if let Some(first) = self.first {
            argv.push("--first".to_string());
            argv.push(first.to_string());
        }
        if let Some(last) = self.last {
            argv.push("--last".to_string());
            argv.push(last.to_string());
        }
        argv
    }
}

/// What a `block-log` call printed
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum BlockLogOutput {
    Raw(String),
    Json(Value),
}

impl BlockLogOutput {
    pub fn as_json(&self) -> Option<&Value> {
        match self {
            BlockLogOutput::Json(value) => Some(value),
            BlockLogOutput::Raw(_) => None,
        }
    }

    pub fn as_raw(&self) -> Option<&str> {
        match self {
            BlockLogOutput::Raw(text) => Some(text),
            BlockLogOutput::Json(_) => None,
        }
    }
}

impl Session {
    /// Run `block-log` for `request`.
    ///
    /// Blocks are returned as parsed JSON, every other action as the
    /// utility's raw output. A failing utility yields `Ok(None)` unless
    /// `policy` says otherwise; unparsable JSON is always an error.
    pub fn block_log(&self, request: &BlockLogRequest, policy: &ErrorPolicy) -> Result<Option<BlockLogOutput>> {
        let argv = request.argv(&self.config().util_path());
        let command = argv.join(" ");
        if self.debug() {
            debug!("cmd: {}", command);
        }

        let raw = match self.check_output(&argv, false) {
            Ok(out) => out,
            Err(err) => {
                return self.apply_error_policy(err, policy, |stderr| {
                    format!("Failure during \"{}\". {}", command, stderr)
                })
            }
        };

        let output = match request.action.return_type() {
            ReturnType::Json => BlockLogOutput::Json(to_json(&raw, false, policy.silent_errors)?),
            ReturnType::Raw => BlockLogOutput::Raw(raw),
        };
        Ok(Some(output))
    }
}
