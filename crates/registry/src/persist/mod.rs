//! Streaming persistence of resolved mappings.
//!
//! # Purpose
//!
//! A registry can be warm-started from the mappings of an earlier run and can
//! stream its own resolved mappings out as they are created. Both directions
//! use the same record shape: three ordered fields `scope`, `documentID`,
//! `key` (decimal).
//!
//! The registry only sees the [`MappingSource`] and [`MappingSink`] traits.
//! [`CsvMappingSource`] and [`CsvMappingSink`] are the delimited-text
//! implementations used by the tooling.
//!
//! # Ownership
//!
//! Streams are handed to the registry and released by
//! [`crate::DocumentIdRegistry::close`] exactly once.

mod delimited;

pub use self::delimited::{CsvMappingSink, CsvMappingSource, Dialect};
use crate::error::PersistError;
use crate::key::Key;

/// Number of fields in a persisted mapping.
pub const RECORD_FIELDS: usize = 3;

/// One persisted `(scope, id, key)` triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MappingRecord<'a> {
	pub scope: &'a str,
	pub id: &'a str,
	pub key: Key,
}

/// Undecoded record as read from a source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
	/// 1-based line of the record in the stream, when known.
	pub line: u64,
	pub fields: Vec<String>,
}

impl RawRecord {
	/// Decodes the record, rejecting wrong field counts and non-numeric keys.
	pub fn decode(&self) -> Result<MappingRecord<'_>, PersistError> {
		let [scope, id, key] = self.fields.as_slice() else {
			return Err(PersistError::Malformed {
				line: self.line,
				reason: format!(
					"expected {RECORD_FIELDS} fields, found {}: {:?}",
					self.fields.len(),
					self.fields
				),
			});
		};
		let key = key.parse::<Key>().map_err(|e| PersistError::Malformed {
			line: self.line,
			reason: format!("key {key:?} is not a decimal integer: {e}"),
		})?;
		Ok(MappingRecord {
			scope: scope.as_str(),
			id: id.as_str(),
			key,
		})
	}
}

/// Pull-based stream of persisted mappings.
pub trait MappingSource: Send {
	/// Returns the next record, or `None` once the stream is exhausted.
	fn next_record(&mut self) -> Option<Result<RawRecord, PersistError>>;

	/// Releases the underlying stream. Called at most once by the registry.
	fn close(&mut self) -> Result<(), PersistError> {
		Ok(())
	}
}

/// Append-only destination for resolved mappings.
pub trait MappingSink: Send {
	fn write_mapping(&mut self, record: &MappingRecord<'_>) -> Result<(), PersistError>;

	fn flush(&mut self) -> Result<(), PersistError>;

	/// Flushes and releases the underlying stream.
	fn close(&mut self) -> Result<(), PersistError>;
}

/// When a sink pushes buffered records to its backing stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Deserialize, serde::Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum FlushPolicy {
	/// Flush only on close.
	#[default]
	Buffered,
	/// Flush after every record.
	EveryRecord,
}

#[cfg(test)]
mod tests;
