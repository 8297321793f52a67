//! Structural comparison and JSON extraction commands

use anyhow::{Context, Result};
use clap::Args;
use serde::Serialize;
use serde_json::Value;
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::output::{print_item, print_value, OutputFormat, TableDisplay};
use sysio_harness_common::{compare, compare_files, filter_json_object_or_array, to_json};

#[derive(Args)]
pub struct CompareArgs {
    /// Left-hand file
    pub left: PathBuf,

    /// Right-hand file
    pub right: PathBuf,

    /// Context prefix shown in difference messages
    #[arg(long, default_value = "root")]
    pub context: String,

    /// Compare the files line by line instead of as JSON documents
    #[arg(long)]
    pub lines: bool,
}

#[derive(Args)]
pub struct ExtractJsonArgs {
    /// File to read (stdin when omitted)
    pub input: Option<PathBuf>,

    /// Print the extracted text without parsing it
    #[arg(long)]
    pub raw: bool,
}

/// Comparison outcome for display
#[derive(Serialize)]
pub struct CompareReport {
    pub left: String,
    pub right: String,
    pub equal: bool,
    pub difference: Option<String>,
}

impl TableDisplay for CompareReport {
    fn headers() -> Vec<&'static str> {
        vec!["Left", "Right", "Equal", "Difference"]
    }

    fn row(&self) -> Vec<String> {
        vec![
            self.left.clone(),
            self.right.clone(),
            if self.equal { "yes" } else { "no" }.to_string(),
            self.difference.clone().unwrap_or_default(),
        ]
    }

    fn failed(&self) -> bool {
        !self.equal
    }
}

fn read_json(path: &Path) -> Result<Value> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    to_json(&text, false, false).with_context(|| format!("No JSON document in {}", path.display()))
}

/// Compare two files; returns whether they are equal
pub fn execute_compare(args: CompareArgs, format: OutputFormat) -> Result<bool> {
    debug!(
        "Comparing {} with {} ({})",
        args.left.display(),
        args.right.display(),
        if args.lines { "lines" } else { "json" }
    );
    let difference = if args.lines {
        let same = compare_files(&args.left, &args.right).context("Failed to compare files")?;
        (!same).then(|| "files differ".to_string())
    } else {
        let left = read_json(&args.left)?;
        let right = read_json(&args.right)?;
        compare(&left, &right, &args.context)
    };

    let report = CompareReport {
        left: args.left.display().to_string(),
        right: args.right.display().to_string(),
        equal: difference.is_none(),
        difference,
    };
    if let Some(difference) = &report.difference {
        info!("Mismatch: {}", difference);
    }
    print_item(&report, format);
    Ok(report.equal)
}

/// Cut the JSON document out of noisy tool output
pub fn execute_extract(args: ExtractJsonArgs, format: OutputFormat) -> Result<()> {
    let text = match &args.input {
        Some(path) => std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read stdin")?;
            text
        }
    };

    debug!("Extracting JSON from {} bytes of input", text.len());
    if args.raw {
        println!("{}", filter_json_object_or_array(&text));
    } else {
        let value = to_json(&text, false, false)?;
        print_value(&value, format);
    }
    Ok(())
}
