//! CLI schema and configuration lookup for the docid binary.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use docid_registry::{ConfigError, RegistryConfig};

/// Scope used by `bench` when none is given.
pub const BENCH_SCOPE: &str = "someQualifier";

#[derive(Parser, Debug)]
#[command(name = "docid")]
#[command(about = "Inspect and maintain document id mapping files")]
#[command(version)]
/// Command-line arguments.
pub struct Cli {
	/// Configuration file (defaults to $XDG_CONFIG_HOME/docid/config.toml)
	#[arg(long, short = 'c', global = true, value_name = "PATH")]
	pub config: Option<PathBuf>,

	/// Verbose logging
	#[arg(short, long, global = true)]
	pub verbose: bool,

	/// Subcommand to execute.
	#[command(subcommand)]
	pub command: Command,
}

/// Available subcommands.
#[derive(Subcommand, Debug, PartialEq, Eq)]
pub enum Command {
	/// Load a mapping file and print per-scope counts
	Inspect {
		/// Mapping file to load
		snapshot: PathBuf,
	},
	/// Print the key of a document id (exit code 1 when unknown)
	Lookup {
		/// Mapping file to load
		snapshot: PathBuf,
		/// Naming scope of the id
		scope: String,
		/// Document id to resolve
		id: String,
	},
	/// Combine mapping files into one; earlier files win on conflicts
	Merge {
		/// Mapping files, in priority order
		#[arg(required = true)]
		snapshots: Vec<PathBuf>,
		/// File to write the merged mappings to
		#[arg(short, long, value_name = "FILE")]
		output: PathBuf,
	},
	/// Time registration and lookups on a synthetic data set
	Bench {
		/// Number of records to register
		#[arg(long, default_value_t = 50_000)]
		records: u32,
		/// Worker threads sharing the registry
		#[arg(long, default_value_t = 1, value_parser = clap::value_parser!(u16).range(1..))]
		workers: u16,
		/// Scope the records are registered in
		#[arg(long, default_value = BENCH_SCOPE)]
		scope: String,
	},
}

impl Cli {
	/// Loads the configuration named on the command line, else the user
	/// configuration when it exists, else defaults.
	pub fn load_config(&self) -> Result<RegistryConfig, ConfigError> {
		match resolve_config_path(self.config.as_deref(), default_config_path()) {
			Some(path) => RegistryConfig::load(path),
			None => Ok(RegistryConfig::default()),
		}
	}
}

/// `$XDG_CONFIG_HOME/docid/config.toml` or the platform equivalent.
pub fn default_config_path() -> Option<PathBuf> {
	dirs::config_dir().map(|dir| dir.join("docid").join("config.toml"))
}

/// An explicit path is always used, so a missing file is reported. The
/// default path is only used when the file exists.
pub fn resolve_config_path(explicit: Option<&Path>, default: Option<PathBuf>) -> Option<PathBuf> {
	if let Some(path) = explicit {
		return Some(path.to_path_buf());
	}
	default.filter(|path| path.is_file())
}

#[cfg(test)]
mod tests;
