use std::path::PathBuf;

use crate::key::{DocumentId, Key};

/// Errors returned by registry mutations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
	/// An explicit id is already mapped to another key in this scope.
	#[error("id {id} for scope {scope} already used for record with key={existing} (requested key={requested})")]
	DuplicateId {
		scope: String,
		id: DocumentId,
		existing: Key,
		requested: Key,
	},

	/// The key is already resolved under another id in this scope.
	#[error("key {key} in scope {scope} already resolved as {existing} (requested id={requested})")]
	KeyConflict {
		scope: String,
		key: Key,
		existing: DocumentId,
		requested: DocumentId,
	},

	/// An unresolved entry was resolved against a key it was never issued for.
	#[error(
		"document id <{scope},{id},{requested}> resolved, but the unresolved entry is mapped to key={stored}"
	)]
	InvariantViolation {
		scope: String,
		id: DocumentId,
		stored: Key,
		requested: Key,
	},
}

impl RegistryError {
	/// Whether the current job must abort instead of skipping the record.
	pub fn is_fatal(&self) -> bool {
		matches!(self, Self::InvariantViolation { .. })
	}
}

/// Errors raised by mapping sources and sinks.
#[derive(Debug, thiserror::Error)]
pub enum PersistError {
	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),

	#[error("csv error: {0}")]
	Csv(#[from] csv::Error),

	/// A persisted record that cannot become a mapping.
	#[error("malformed record at line {line}: {reason}")]
	Malformed { line: u64, reason: String },

	#[error("stream already closed")]
	Closed,
}

impl PersistError {
	/// Whether the stream is unusable after this error.
	///
	/// Record-level problems only cost the record; I/O failures end the stream.
	pub fn is_stream_failure(&self) -> bool {
		match self {
			Self::Io(_) | Self::Closed => true,
			Self::Csv(e) => e.is_io_error(),
			Self::Malformed { .. } => false,
		}
	}
}

/// Errors loading a [`crate::RegistryConfig`].
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	#[error("failed to read {path}: {error}")]
	Io {
		path: PathBuf,
		#[source]
		error: std::io::Error,
	},

	#[error("invalid TOML: {0}")]
	Parse(#[from] toml::de::Error),

	#[error("invalid value for {field}: {reason}")]
	Invalid { field: &'static str, reason: String },
}
