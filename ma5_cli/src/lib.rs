//! Command-line interface of `ma5`.

mod cutflow;
mod helpers;
mod histo;
mod read;
mod report;

use anyhow::Result;
use clap::{Parser, ValueHint};
use enum_dispatch::enum_dispatch;
use git_version::git_version;
use std::path::PathBuf;
use std::process::ExitCode;
use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Name of the environment variable overriding `--log-level`.
pub const LOG_ENV: &str = "MA5_LOG";

/// Options shared by every subcommand.
#[derive(Parser)]
pub struct GlobalConfiguration {
    /// Log verbosity, overridden by the environment variable `MA5_LOG`.
    #[arg(default_value_t = Level::WARN, global = true, long, value_name = "LEVEL")]
    pub log_level: Level,
    /// LHAPDF index used to find the members of the central PDF.
    #[arg(global = true, long, value_hint = ValueHint::FilePath, value_name = "INDEX")]
    pub pdf_index: Option<PathBuf>,
}

impl GlobalConfiguration {
    /// Installs the global subscriber printing log messages to stderr.
    pub fn init_logging(&self) {
        let filter = EnvFilter::try_from_env(LOG_ENV)
            .unwrap_or_else(|_| EnvFilter::new(self.log_level.as_str().to_ascii_lowercase()));

        // a second initialization, for instance in tests, keeps the first subscriber
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

/// A subcommand of `ma5`.
#[enum_dispatch]
pub trait Subcommand {
    /// Runs the subcommand.
    ///
    /// # Errors
    ///
    /// Returns an error if reading or processing an input fails.
    fn run(&self, cfg: &GlobalConfiguration) -> Result<ExitCode>;
}

/// Every subcommand of `ma5`.
#[enum_dispatch(Subcommand)]
#[derive(Parser)]
pub enum SubcommandEnum {
    /// Print the cutflow of one or more signal regions.
    Cutflow(cutflow::Opts),
    /// Print the bins of histograms.
    Histo(histo::Opts),
    /// Summarize the content of a SAF file.
    Read(read::Opts),
    /// Print the cutflows of every dataset of a run card.
    Report(report::Opts),
}

/// Command-line options of `ma5`.
#[derive(Parser)]
#[command(
    arg_required_else_help = true,
    author,
    about,
    disable_help_subcommand = true,
    name = "ma5",
    version = git_version!(
        args = ["--always", "--dirty", "--long", "--tags"],
        cargo_prefix = "",
        fallback = "unknown"
    )
)]
pub struct Opts {
    /// Global options.
    #[command(flatten)]
    pub configuration: GlobalConfiguration,
    /// Subcommand to run.
    #[command(subcommand)]
    pub subcommand: SubcommandEnum,
}
