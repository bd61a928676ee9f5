//! Bundle subcommand - zip an existing output directory

use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Args;
use nipscrape_neurips::{OutputLayout, bundle};

use super::print_summary;
use crate::config::Config;

#[derive(Args, Debug)]
pub struct BundleArgs {
    /// Output directory of a previous crawl
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

pub fn run(args: BundleArgs, config: &Config) -> Result<()> {
    let layout = OutputLayout::new(args.output.unwrap_or_else(|| config.output.dir.clone()));
    if !layout.metadata_dir().is_dir() {
        bail!(
            "No metadata directory at {}; run `nipscrape crawl` first",
            layout.metadata_dir().display()
        );
    }

    let bundles = bundle(&layout).context("Failed to write bundles")?;
    print_summary(
        "Bundle",
        &[
            (
                "Metadata",
                format!("{} ({} files)", bundles.metadata.display(), bundles.metadata_entries),
            ),
            (
                "Incremental",
                format!(
                    "{} ({} files)",
                    bundles.incremental.display(),
                    bundles.incremental_entries
                ),
            ),
        ],
    );
    Ok(())
}
