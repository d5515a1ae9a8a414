//! Identifier vocabulary shared by every table in the registry.

use std::borrow::Borrow;
use std::fmt;
use std::num::ParseIntError;
use std::ops::Deref;
use std::str::FromStr;
use std::sync::Arc;

/// Internal numeric identifier of a materialized record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Key(pub i64);

impl Key {
	#[inline]
	pub fn get(self) -> i64 {
		self.0
	}
}

impl From<i64> for Key {
	fn from(value: i64) -> Self {
		Self(value)
	}
}

impl fmt::Display for Key {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}", self.0)
	}
}

impl FromStr for Key {
	type Err = ParseIntError;

	/// Parses a decimal key, tolerating surrounding whitespace.
	fn from_str(s: &str) -> Result<Self, Self::Err> {
		s.trim().parse().map(Self)
	}
}

/// Textual placeholder identifier, unique within a (scope, resolution) pair.
///
/// Clones share one allocation, so the forward and backward side of a
/// [`crate::BiMap`] point at the same string.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct DocumentId(Arc<str>);

impl DocumentId {
	pub fn new(id: impl Into<Arc<str>>) -> Self {
		Self(id.into())
	}

	#[inline]
	pub fn as_str(&self) -> &str {
		&self.0
	}
}

impl Deref for DocumentId {
	type Target = str;

	fn deref(&self) -> &str {
		&self.0
	}
}

impl Borrow<str> for DocumentId {
	fn borrow(&self) -> &str {
		&self.0
	}
}

impl AsRef<str> for DocumentId {
	fn as_ref(&self) -> &str {
		&self.0
	}
}

impl fmt::Display for DocumentId {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(&self.0)
	}
}

impl From<&str> for DocumentId {
	fn from(value: &str) -> Self {
		Self(Arc::from(value))
	}
}

impl From<String> for DocumentId {
	fn from(value: String) -> Self {
		Self(Arc::from(value))
	}
}

impl PartialEq<str> for DocumentId {
	fn eq(&self, other: &str) -> bool {
		&*self.0 == other
	}
}

impl PartialEq<&str> for DocumentId {
	fn eq(&self, other: &&str) -> bool {
		&*self.0 == *other
	}
}

/// Which of the two mapping tables an entry lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
	/// The referenced record has been materialized (imported, or exported).
	Resolved,
	/// The id was handed out for a forward reference whose target has not
	/// been exported yet.
	Unresolved,
}

impl fmt::Display for Resolution {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Resolved => write!(f, "resolved"),
			Self::Unresolved => write!(f, "unresolved"),
		}
	}
}
