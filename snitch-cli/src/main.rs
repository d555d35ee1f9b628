//! Snitch CLI - Command line interface
//!
//! Runs an entry script with the exception-logging hook registered.

use clap::{ArgAction, Parser};
use std::path::PathBuf;
use std::process;
use std::sync::Arc;

mod config;
mod logging;
mod platform;

use crate::config::LogConfig;
use crate::logging::LogFormat;
use crate::platform::print_error;
use snitch_api::{RunConfig, SnitchError};
use snitch_vfs::VirtualFileSystem;

#[derive(Parser, Debug)]
#[command(
    name = "snitch",
    about = "Run a snitch script and log every exception its modules catch",
    version
)]
struct Cli {
    /// Entry script; runs as `__main__` and is never instrumented
    #[arg(value_name = "ENTRY")]
    entry: PathBuf,

    /// Instrument only modules whose identifier contains this (repeatable)
    #[arg(short = 'i', long = "include", value_name = "SUBSTRING")]
    include: Vec<String>,

    /// Never instrument modules whose identifier contains this (repeatable)
    #[arg(short = 'x', long = "exclude", value_name = "SUBSTRING")]
    exclude: Vec<String>,

    /// File caught-error records are appended to [default: /dev/stdout]
    #[arg(short = 'l', long = "log-file", value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Instrument only submodules of packages
    #[arg(long = "packages-only")]
    packages_only: bool,

    /// Extra module search directory (repeatable)
    #[arg(short = 'p', long = "path", value_name = "DIR")]
    search_path: Vec<PathBuf>,

    /// JSON file with the same options; flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Diagnostic verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    /// Diagnostic log format
    #[arg(long, value_enum, default_value_t = LogFormat::Compact)]
    log_format: LogFormat,
}

impl Cli {
    /// Overlay the flags onto `base`.
    fn apply(&self, mut base: RunConfig) -> RunConfig {
        if !self.include.is_empty() {
            base.hook.include = self.include.clone();
        }
        if !self.exclude.is_empty() {
            base.hook.exclude = self.exclude.clone();
        }
        if let Some(log_file) = &self.log_file {
            base.hook.log_destination = log_file.clone();
        }
        if self.packages_only {
            base.hook.restrict_to_packages = true;
        }
        base.search_path.extend(self.search_path.iter().cloned());
        base
    }
}

fn main() {
    let cli = Cli::parse();
    logging::init(&LogConfig::from_verbosity(cli.verbose), cli.log_format);

    let vfs: Arc<dyn VirtualFileSystem> = Arc::new(snitch_vfs::native_fs());
    if let Err(e) = run(&cli, vfs.clone()) {
        print_error(&e, vfs.as_ref());
        process::exit(1);
    }
}

fn run(cli: &Cli, vfs: Arc<dyn VirtualFileSystem>) -> Result<(), SnitchError> {
    let base = match &cli.config {
        Some(path) => RunConfig::load(vfs.as_ref(), path)?,
        None => RunConfig::default(),
    };
    let config = cli.apply(base);
    tracing::debug!(target: "snitch::hook", ?config, "effective configuration");

    let host = snitch_api::interpreter(&config, vfs);
    snitch_api::register(&host, config.hook.clone())?;
    snitch_api::run_entry(&host, &cli.entry)?;
    Ok(())
}
