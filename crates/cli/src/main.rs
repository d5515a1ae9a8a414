//! Docid binary.
//!
//! Maintenance tooling for document id mapping files:
//! - inspecting and querying a mapping file
//! - merging mapping files of several runs
//! - timing the registry on synthetic data

use std::process::ExitCode;

use clap::Parser;
use tracing::debug;

mod cli;
mod commands;

use crate::cli::Cli;

fn main() -> anyhow::Result<ExitCode> {
	let cli = Cli::parse();

	setup_tracing(cli.verbose);

	let config = cli.load_config()?;
	debug!(?config, "configuration loaded");

	let mut stdout = std::io::stdout().lock();
	let status = commands::run(&cli.command, &config, &mut stdout)?;
	Ok(ExitCode::from(status))
}

fn setup_tracing(verbose: bool) {
	use tracing_subscriber::EnvFilter;

	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
		if verbose {
			EnvFilter::new("docid=debug,docid_registry=debug,info")
		} else {
			EnvFilter::new("info")
		}
	});

	tracing_subscriber::fmt()
		.with_env_filter(filter)
		.with_writer(std::io::stderr)
		.with_target(verbose)
		.init();
}
