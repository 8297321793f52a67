//! Block log command

use anyhow::{Context, Result};
use clap::Args;
use std::path::PathBuf;

use crate::output::{print_message, print_value, OutputFormat};
use sysio_harness::{BlockLogOutput, BlockLogRequest, ErrorPolicy, HarnessConfig, Session};
use sysio_harness_common::BlockLogAction;

#[derive(Args)]
pub struct BlockLogArgs {
    /// Directory holding blocks.log
    pub blocks_dir: PathBuf,

    /// Action: return_blocks, make_index, trim or smoke_test
    #[arg(short, long, default_value = "return_blocks")]
    pub action: BlockLogAction,

    /// File the utility writes its result to
    #[arg(long)]
    pub output_file: Option<PathBuf>,

    /// First block number
    #[arg(long)]
    pub first: Option<u32>,

    /// Last block number
    #[arg(long)]
    pub last: Option<u32>,
}

pub fn execute(args: BlockLogArgs, config: HarnessConfig, format: OutputFormat) -> Result<()> {
    let mut request = BlockLogRequest::new(args.blocks_dir).action(args.action);
    request.output_file = args.output_file;
    request.first = args.first;
    request.last = args.last;

    let session = Session::open(config);
    let output = session
        .block_log(&request, &ErrorPolicy::throwing())
        .with_context(|| format!("block-log {} failed", request.action))?;

    match output {
        Some(BlockLogOutput::Json(value)) => print_value(&value, format),
        Some(BlockLogOutput::Raw(text)) => print_message(text.trim_end(), format),
        None => {}
    }
    session.close()?;
    Ok(())
}
