//! Diagnostic snapshots returned by the registry.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::key::{DocumentId, Key};

/// A forward reference that has not been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnresolvedEntry {
	pub scope: Arc<str>,
	pub id: DocumentId,
	pub key: Key,
}

impl UnresolvedEntry {
	/// Renders `Scope:<scope><sep>ID:<id><sep>PK:<key>`.
	pub fn format_with(&self, separator: &str) -> String {
		format!(
			"Scope:{}{separator}ID:{}{separator}PK:{}",
			self.scope, self.id, self.key
		)
	}
}

/// Entry counts of one scope.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ScopeStats {
	pub resolved: usize,
	pub unresolved: usize,
}

impl ScopeStats {
	pub fn total(&self) -> usize {
		self.resolved + self.unresolved
	}
}

/// Entry counts of every scope, ordered by scope name.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RegistryStats {
	pub scopes: BTreeMap<Arc<str>, ScopeStats>,
}

impl RegistryStats {
	pub fn resolved(&self) -> usize {
		self.scopes.values().map(|s| s.resolved).sum()
	}

	pub fn unresolved(&self) -> usize {
		self.scopes.values().map(|s| s.unresolved).sum()
	}
}

impl fmt::Display for RegistryStats {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		for (scope, stats) in &self.scopes {
			writeln!(
				f,
				"{scope}: {} resolved, {} unresolved",
				stats.resolved, stats.unresolved
			)?;
		}
		write!(
			f,
			"total: {} resolved, {} unresolved",
			self.resolved(),
			self.unresolved()
		)
	}
}

/// Outcome of importing a mapping stream.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImportReport {
	/// Records added to the resolved table.
	pub imported: usize,
	/// Records identical to an existing mapping.
	pub unchanged: usize,
	/// Records with a wrong field count, a bad key, or undecodable bytes.
	pub malformed: usize,
	/// Records conflicting with an existing mapping.
	pub conflicts: usize,
	/// Set when the stream failed before its end.
	pub aborted: bool,
}

impl ImportReport {
	pub fn skipped(&self) -> usize {
		self.malformed + self.conflicts
	}

	/// Adds the counts of another import.
	pub fn merge(&mut self, other: &ImportReport) {
		self.imported += other.imported;
		self.unchanged += other.unchanged;
		self.malformed += other.malformed;
		self.conflicts += other.conflicts;
		self.aborted |= other.aborted;
	}
}

impl fmt::Display for ImportReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{} imported, {} unchanged, {} malformed, {} conflicting",
			self.imported, self.unchanged, self.malformed, self.conflicts
		)?;
		if self.aborted {
			write!(f, " (stream failed, import incomplete)")?;
		}
		Ok(())
	}
}
