use anyhow::Result;
use clap::Parser;
use ma5_cli::{Opts, Subcommand};
use std::process::ExitCode;

fn main() -> Result<ExitCode> {
    let opts = Opts::parse();

    opts.configuration.init_logging();
    opts.subcommand.run(&opts.configuration)
}
