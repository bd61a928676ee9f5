//! nipscrape - NeurIPS proceedings crawler
//!
//! Crawls the selected years of the NeurIPS paper archive into per-paper
//! JSON files, shared JSON-lines and CSV streams, optional PDFs, and two
//! zip bundles.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};

mod cmd;
mod config;
mod prompt;

use config::Config;

#[derive(Parser)]
#[command(name = "nipscrape")]
#[command(about = "Crawl NeurIPS proceedings into JSON, CSV and PDFs")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Enable debug logging
    #[arg(long, global = true)]
    debug: bool,

    /// Config file path (default: ./nipscrape.toml or ~/.config/nipscrape/config.toml)
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Per-request timeout in seconds
    #[arg(long, global = true)]
    timeout: Option<u64>,

    /// Attempts per page before giving up
    #[arg(long, global = true)]
    max_attempts: Option<u32>,

    /// Number of parallel workers
    #[arg(short, long, global = true)]
    workers: Option<usize>,
}

#[derive(Subcommand)]
enum Command {
    /// Crawl the selected years
    Crawl(cmd::crawl::CrawlArgs),
    /// Rebuild the zip bundles from existing output
    Bundle(cmd::bundle::BundleArgs),
    /// Show current configuration
    Config,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    // Progress context (TTY auto-detect)
    let progress = Arc::new(nipscrape_core::ProgressContext::new());

    // Logging:
    //   TTY:     info routed around the spinner; --debug for more
    //   non-TTY: info unless --debug, logs are the only progress indicator
    let multi = progress.is_tty().then(|| progress.multi());
    nipscrape_core::init_logging(false, cli.debug, multi);

    report(run(cli, &progress))
}

/// Log a fatal error with its context chain and map it to a failing exit code
fn report(result: Result<ExitCode>) -> ExitCode {
    match result {
        Ok(code) => code,
        Err(e) => {
            log::error!("{e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli, progress: &nipscrape_core::SharedProgress) -> Result<ExitCode> {
    if let Err(e) = nipscrape_core::install_signal_handlers() {
        log::warn!("Failed to install signal handlers: {e}");
    }

    let mut config = if let Some(path) = &cli.config {
        Config::from_file(path)?
    } else {
        Config::load()?
    };

    // CLI overrides
    if let Some(timeout) = cli.timeout {
        config.http.timeout = timeout;
    }
    if let Some(max_attempts) = cli.max_attempts {
        config.http.max_attempts = max_attempts;
    }
    if let Some(workers) = cli.workers {
        config.crawl.workers = workers;
    }

    match cli.command {
        Command::Crawl(args) => cmd::crawl::run(args, &config, progress),
        Command::Bundle(args) => cmd::bundle::run(args, &config).map(|()| ExitCode::SUCCESS),
        Command::Config => {
            use comfy_table::{
                Cell, Color, Table, modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL,
            };

            let mut table = Table::new();
            table
                .load_preset(UTF8_FULL)
                .apply_modifier(UTF8_ROUND_CORNERS)
                .set_header(vec![
                    Cell::new("Setting").fg(Color::Cyan),
                    Cell::new("Value").fg(Color::Cyan),
                ]);

            table.add_row(vec!["Base URL", &config.site.base_url]);
            table.add_row(vec!["Datasets URL", &config.site.datasets_url]);
            table.add_row(vec![
                "Output directory",
                &config.output.dir.display().to_string(),
            ]);
            table.add_row(vec!["Workers", &config.crawl.workers.to_string()]);
            table.add_row(vec![
                "Download PDFs",
                if config.crawl.download_pdfs { "yes" } else { "no" },
            ]);
            table.add_row(vec!["Timeout", &format!("{}s", config.http.timeout)]);
            table.add_row(vec!["Max attempts", &config.http.max_attempts.to_string()]);
            table.add_row(vec!["Backoff base", &format!("{}s", config.http.backoff_base)]);

            eprintln!("\n{table}");
            Ok(ExitCode::SUCCESS)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_passes_exit_codes_through() {
        let code = report(Ok(ExitCode::from(130)));
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::from(130)));
    }

    #[test]
    fn report_maps_errors_to_failure() {
        let err = anyhow::anyhow!("connection refused").context("Failed to fetch archive root");
        let code = report(Err(err));
        assert_eq!(format!("{code:?}"), format!("{:?}", ExitCode::FAILURE));
    }
}
