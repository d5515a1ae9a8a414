//! Registry configuration.
//!
//! Configuration is TOML. Every field is optional:
//!
//! ```toml
//! [persistence]
//! delimiter = ";"
//! quote = "\""
//! comment = "#"
//! flush = "buffered"   # or "every-record"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::persist::{Dialect, FlushPolicy};

/// Top-level configuration document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RegistryConfig {
	pub persistence: PersistenceConfig,
}

/// How mapping files are read and written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PersistenceConfig {
	pub delimiter: char,
	pub quote: char,
	/// Empty string disables comments.
	pub comment: String,
	pub flush: FlushPolicy,
}

impl Default for PersistenceConfig {
	fn default() -> Self {
		Self {
			delimiter: ';',
			quote: '"',
			comment: "#".to_string(),
			flush: FlushPolicy::default(),
		}
	}
}

impl PersistenceConfig {
	/// Validates the characters and converts them to a [`Dialect`].
	pub fn dialect(&self) -> Result<Dialect, ConfigError> {
		let delimiter = ascii_byte("persistence.delimiter", self.delimiter)?;
		let quote = ascii_byte("persistence.quote", self.quote)?;
		let comment = match self.comment.chars().collect::<Vec<_>>().as_slice() {
			[] => None,
			[c] => Some(ascii_byte("persistence.comment", *c)?),
			_ => {
				return Err(ConfigError::Invalid {
					field: "persistence.comment",
					reason: format!("expected at most one character, got {:?}", self.comment),
				});
			}
		};
		if delimiter == quote {
			return Err(ConfigError::Invalid {
				field: "persistence.quote",
				reason: "must differ from the delimiter".to_string(),
			});
		}
		Ok(Dialect {
			delimiter,
			quote,
			comment,
		})
	}
}

fn ascii_byte(field: &'static str, c: char) -> Result<u8, ConfigError> {
	if (c.is_ascii() && !c.is_ascii_control()) || c == '\t' {
		Ok(c as u8)
	} else {
		Err(ConfigError::Invalid {
			field,
			reason: format!("{c:?} is not a printable ASCII character"),
		})
	}
}

impl RegistryConfig {
	/// Parses a TOML document and validates it.
	pub fn parse(input: &str) -> Result<Self, ConfigError> {
		let config: Self = toml::from_str(input)?;
		config.persistence.dialect()?;
		Ok(config)
	}

	/// Loads configuration from a file.
	pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
		let path = path.as_ref();
		let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
			path: path.to_path_buf(),
			error: e,
		})?;
		Self::parse(&content)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn empty_document_gives_defaults() {
		let config = RegistryConfig::parse("").unwrap();
		assert_eq!(config, RegistryConfig::default());
		assert_eq!(config.persistence.dialect().unwrap(), Dialect::default());
	}

	#[test]
	fn parses_full_persistence_section() {
		let config = RegistryConfig::parse(
			r#"
			[persistence]
			delimiter = ","
			quote = "'"
			comment = ""
			flush = "every-record"
			"#,
		)
		.unwrap();

		assert_eq!(config.persistence.flush, FlushPolicy::EveryRecord);
		assert_eq!(
			config.persistence.dialect().unwrap(),
			Dialect {
				delimiter: b',',
				quote: b'\'',
				comment: None,
			}
		);
	}

	#[test]
	fn tab_delimiter_is_allowed() {
		let config = RegistryConfig::parse("[persistence]\ndelimiter = \"\\t\"\n").unwrap();
		assert_eq!(config.persistence.dialect().unwrap().delimiter, b'\t');
	}

	#[test]
	fn rejects_non_ascii_delimiter() {
		let err = RegistryConfig::parse("[persistence]\ndelimiter = \"§\"\n").unwrap_err();
		assert!(matches!(
			err,
			ConfigError::Invalid {
				field: "persistence.delimiter",
				..
			}
		));
	}

	#[test]
	fn rejects_quote_equal_to_delimiter() {
		let err = RegistryConfig::parse("[persistence]\ndelimiter = \"'\"\nquote = \"'\"\n").unwrap_err();
		assert!(matches!(err, ConfigError::Invalid { field: "persistence.quote", .. }));
	}

	#[test]
	fn rejects_unknown_keys() {
		let err = RegistryConfig::parse("[persistence]\nseparator = \";\"\n").unwrap_err();
		assert!(matches!(err, ConfigError::Parse(_)));
	}

	#[test]
	fn load_reports_missing_file_path() {
		let dir = tempfile::tempdir().unwrap();
		let path = dir.path().join("missing.toml");
		let err = RegistryConfig::load(&path).unwrap_err();
		assert!(matches!(err, ConfigError::Io { path: p, .. } if p == path));
	}
}
