#![cfg_attr(doc, allow(rustdoc::private_intra_doc_links))]
//! The document ID registry.
//!
//! # Purpose
//!
//! Translates between textual document ids and numeric record keys while a
//! bulk import or export walks a record graph. Records may reference records
//! that are not materialized yet, so every mapping lives in one of two
//! tables:
//!
//! - **resolved**: the record behind the key has been imported or exported.
//! - **unresolved**: an id was handed out for a forward reference during
//!   export and the referenced record has not been exported yet.
//!
//! # Mental Model
//!
//! 1. **Export:** [`DocumentIdRegistry::lookup_key`] names a referenced record
//!    (minting an unresolved id if needed). [`DocumentIdRegistry::register_key`]
//!    names a record being written and resolves a pending forward reference.
//! 2. **Import:** [`DocumentIdRegistry::register_id`] binds an id declared in
//!    the data, [`DocumentIdRegistry::lookup_id`] turns a reference back into
//!    a key.
//! 3. **Completion:** an export pass is consistent once
//!    [`DocumentIdRegistry::has_unresolved`] returns false.
//!
//! # Concurrency
//!
//! One [`RwLock`] guards both tables. Queries take it shared. Anything that
//! inserts, moves or persists a mapping takes it exclusive, so the move from
//! unresolved to resolved is atomic to readers. The sink mutex is only ever
//! taken while the table lock is held for writing.
//!
//! # Invariants
//!
//! - Within one (scope, state) the id/key relation is a bijection.
//!   - Enforced in: [`crate::BiMap::insert`].
//!   - Tested by: `registry::tests::explicit_id_collision_leaves_state_unchanged`.
//!   - Failure symptom: two ids for one record in the generated script.
//!
//! - A (scope, id) is never resolved and unresolved at the same time.
//!   - Enforced in: [`DocumentIdRegistry::bind_resolved`].
//!   - Tested by: `registry::tests::forward_reference_then_register_returns_same_id`.
//!   - Failure symptom: `has_unresolved` stays true after the target is exported.
//!
//! - A key pending under an id is only ever resolved under that same id.
//!   - Enforced in: [`DocumentIdRegistry::bind_resolved`].
//!   - Tested by: `registry::tests::explicit_id_for_pending_key_keeps_forward_reference`.
//!   - Failure symptom: export passes never finish because `has_unresolved`
//!     stays true.
//!
//! - Only resolved mappings reach the sink.
//!   - Enforced in: [`DocumentIdRegistry::persist`] call sites.
//!   - Tested by: `registry::tests::only_resolved_mappings_are_streamed`.
//!   - Failure symptom: a warm-started import resolves references to records
//!     that were never written.

use std::fmt;
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::bimap::Insert;
use crate::error::{PersistError, RegistryError};
use crate::key::{DocumentId, Key, Resolution};
use crate::persist::{MappingRecord, MappingSink, MappingSource};
use crate::report::{ImportReport, RegistryStats, ScopeStats, UnresolvedEntry};
use crate::tables::Tables;

/// Whether [`DocumentIdRegistry::bind_resolved`] added a mapping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bound {
	New,
	Existing,
}

/// How an unresolved entry bound to another key is reported.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnMismatch {
	/// The caller supplied an id that is already taken.
	Duplicate,
	/// The caller claimed the entry belongs to its key.
	Violation,
}

/// Thread-safe bidirectional document id registry for one import/export job.
pub struct DocumentIdRegistry {
	tables: RwLock<Tables>,
	sink: Mutex<Option<Box<dyn MappingSink>>>,
	source: Mutex<Option<Box<dyn MappingSource>>>,
}

/// Configures the persistence streams of a [`DocumentIdRegistry`].
#[derive(Default)]
pub struct RegistryBuilder {
	source: Option<Box<dyn MappingSource>>,
	sink: Option<Box<dyn MappingSink>>,
}

impl RegistryBuilder {
	/// Mappings of an earlier run, imported as resolved during [`Self::build`].
	pub fn source(mut self, source: impl MappingSource + 'static) -> Self {
		self.source = Some(Box::new(source));
		self
	}

	/// Receives every resolved mapping as it is created.
	pub fn sink(mut self, sink: impl MappingSink + 'static) -> Self {
		self.sink = Some(Box::new(sink));
		self
	}

	pub fn build(self) -> DocumentIdRegistry {
		self.build_with_report().0
	}

	/// Builds the registry and returns the outcome of the source import.
	pub fn build_with_report(self) -> (DocumentIdRegistry, ImportReport) {
		let registry = DocumentIdRegistry {
			tables: RwLock::new(Tables::default()),
			sink: Mutex::new(self.sink),
			source: Mutex::new(None),
		};
		let mut report = ImportReport::default();
		if let Some(mut source) = self.source {
			report = registry.import_mappings(source.as_mut());
			*registry.source.lock() = Some(source);
		}
		(registry, report)
	}
}

impl Default for DocumentIdRegistry {
	fn default() -> Self {
		Self::new()
	}
}

impl DocumentIdRegistry {
	/// Creates a registry without persistence streams.
	pub fn new() -> Self {
		RegistryBuilder::default().build()
	}

	pub fn builder() -> RegistryBuilder {
		RegistryBuilder::default()
	}

	/// Binds an explicitly supplied id to `key` as resolved.
	///
	/// Re-registering the same triple is a no-op. An unresolved entry with the
	/// same id and key is resolved.
	///
	/// # Errors
	///
	/// - [`RegistryError::DuplicateId`] if `id` is bound to another key.
	/// - [`RegistryError::KeyConflict`] if `key` is resolved under another id,
	///   or still pending under another id. The pending id is kept because it
	///   may already be referenced in exported output.
	///
	/// State is unchanged on error.
	pub fn register_id(&self, scope: &str, id: &str, key: Key) -> Result<DocumentId, RegistryError> {
		let id = DocumentId::from(id);
		let mut tables = self.tables.write();
		self.bind_resolved(&mut tables, scope, id.clone(), key, OnMismatch::Duplicate)?;
		Ok(id)
	}

	/// Returns the canonical id of a record being materialized.
	///
	/// Reuses the resolved id of `key`, else resolves a pending forward
	/// reference to it, else mints a fresh resolved id.
	pub fn register_key(&self, scope: &str, key: Key) -> DocumentId {
		if let Some(id) = self.tables.read().resolved.id_of(scope, key) {
			return id;
		}

		let mut tables = self.tables.write();
		if let Some(id) = tables.resolved.id_of(scope, key) {
			return id;
		}

		if let Some(id) = tables.unresolved.id_of(scope, key) {
			// Found through `key` under the write lock, so the stored key matches.
			if let Err(err) =
				self.bind_resolved(&mut tables, scope, id.clone(), key, OnMismatch::Violation)
			{
				panic!("document id registry corrupted while resolving {scope}/{id}: {err}");
			}
			debug!(scope, %id, %key, "resolved forward reference");
			return id;
		}

		let id = tables.next_id(scope);
		let outcome = tables.resolved.get_or_create(scope).insert(id.clone(), key);
		debug_assert_eq!(outcome, Insert::Inserted);
		self.persist(scope, &id, key);
		id
	}

	/// Returns an id for a referenced record, minting an unresolved one when
	/// the key has not been seen in `scope`.
	///
	/// Unresolved ids are not persisted.
	pub fn lookup_key(&self, scope: &str, key: Key) -> DocumentId {
		{
			let tables = self.tables.read();
			if let Some(id) = tables.resolved.id_of(scope, key) {
				return id;
			}
			if let Some(id) = tables.unresolved.id_of(scope, key) {
				return id;
			}
		}

		let mut tables = self.tables.write();
		if let Some(id) = tables.resolved.id_of(scope, key) {
			return id;
		}
		if let Some(id) = tables.unresolved.id_of(scope, key) {
			return id;
		}

		let id = tables.next_id(scope);
		let outcome = tables.unresolved.get_or_create(scope).insert(id.clone(), key);
		debug_assert_eq!(outcome, Insert::Inserted);
		debug!(scope, %id, %key, "issued unresolved id");
		id
	}

	/// Resolves a textual reference to its key. Only resolved mappings count.
	pub fn lookup_id(&self, scope: &str, id: &str) -> Option<Key> {
		self.tables.read().resolved.key_of(scope, id)
	}

	/// Moves `id` from unresolved to resolved under `key`.
	///
	/// An id that is not pending is bound as resolved directly.
	///
	/// # Errors
	///
	/// - [`RegistryError::InvariantViolation`] if the pending entry belongs to
	///   another key. This is a caller bug and the job should abort.
	/// - [`RegistryError::DuplicateId`] or [`RegistryError::KeyConflict`] as in
	///   [`Self::register_id`].
	pub fn resolve_id(&self, scope: &str, id: &str, key: Key) -> Result<(), RegistryError> {
		let mut tables = self.tables.write();
		self.bind_resolved(&mut tables, scope, DocumentId::from(id), key, OnMismatch::Violation)?;
		Ok(())
	}

	/// Whether `id` exists in `scope`, resolved or not.
	pub fn contains_id(&self, scope: &str, id: &str) -> bool {
		let tables = self.tables.read();
		tables.resolved.contains_id(scope, id) || tables.unresolved.contains_id(scope, id)
	}

	/// Whether `key` has an id in `scope`, resolved or not.
	pub fn contains_key(&self, scope: &str, key: Key) -> bool {
		let tables = self.tables.read();
		tables.resolved.contains_key(scope, key) || tables.unresolved.contains_key(scope, key)
	}

	/// Which table holds `id`, if any.
	pub fn resolution_of(&self, scope: &str, id: &str) -> Option<Resolution> {
		let tables = self.tables.read();
		if tables.resolved.contains_id(scope, id) {
			Some(Resolution::Resolved)
		} else if tables.unresolved.contains_id(scope, id) {
			Some(Resolution::Unresolved)
		} else {
			None
		}
	}

	pub fn is_resolved(&self, scope: &str, id: &str) -> bool {
		self.tables.read().resolved.contains_id(scope, id)
	}

	pub fn is_unresolved(&self, scope: &str, id: &str) -> bool {
		self.tables.read().unresolved.contains_id(scope, id)
	}

	/// Whether any scope still has a pending forward reference.
	pub fn has_unresolved(&self) -> bool {
		!self.tables.read().unresolved.is_empty()
	}

	/// Point-in-time list of pending forward references, ordered by scope
	/// and key.
	pub fn list_unresolved(&self) -> Vec<UnresolvedEntry> {
		let mut entries: Vec<_> = {
			let tables = self.tables.read();
			tables
				.unresolved
				.iter()
				.flat_map(|(scope, map)| {
					map.iter().map(move |(id, key)| UnresolvedEntry {
						scope: Arc::clone(scope),
						id: id.clone(),
						key,
					})
				})
				.collect()
		};
		entries.sort_by(|a, b| a.scope.cmp(&b.scope).then(a.key.cmp(&b.key)));
		entries
	}

	/// [`Self::list_unresolved`] rendered one line per entry.
	pub fn format_unresolved(&self, separator: &str) -> Vec<String> {
		self.list_unresolved()
			.iter()
			.map(|entry| entry.format_with(separator))
			.collect()
	}

	pub fn scope_stats(&self, scope: &str) -> ScopeStats {
		let tables = self.tables.read();
		ScopeStats {
			resolved: tables.resolved.scope_len(scope),
			unresolved: tables.unresolved.scope_len(scope),
		}
	}

	pub fn stats(&self) -> RegistryStats {
		let tables = self.tables.read();
		let mut stats = RegistryStats::default();
		for (scope, map) in tables.resolved.iter() {
			stats.scopes.entry(Arc::clone(scope)).or_default().resolved = map.len();
		}
		for (scope, map) in tables.unresolved.iter() {
			stats.scopes.entry(Arc::clone(scope)).or_default().unresolved = map.len();
		}
		stats.scopes.retain(|_, s| s.total() > 0);
		stats
	}

	/// Writes every resolved mapping to `sink`, ordered by scope and key, and
	/// flushes it. Returns the number of records written.
	///
	/// The sink is not closed.
	pub fn write_resolved(&self, sink: &mut dyn MappingSink) -> Result<usize, PersistError> {
		let mut mappings: Vec<(Arc<str>, DocumentId, Key)> = {
			let tables = self.tables.read();
			tables
				.resolved
				.iter()
				.flat_map(|(scope, map)| {
					map.iter().map(move |(id, key)| (Arc::clone(scope), id.clone(), key))
				})
				.collect()
		};
		mappings.sort_by(|a, b| a.0.cmp(&b.0).then(a.2.cmp(&b.2)));

		for (scope, id, key) in &mappings {
			sink.write_mapping(&MappingRecord {
				scope,
				id: id.as_str(),
				key: *key,
			})?;
		}
		sink.flush()?;
		Ok(mappings.len())
	}

	/// Loads persisted mappings into the resolved table.
	///
	/// Best effort: malformed and conflicting records are logged and skipped,
	/// and a failing stream ends the import. Accepted records are streamed to
	/// the sink like any other new resolved mapping.
	pub fn import_mappings(&self, source: &mut dyn MappingSource) -> ImportReport {
		let mut report = ImportReport::default();
		while let Some(next) = source.next_record() {
			let raw = match next {
				Ok(raw) => raw,
				Err(err) if err.is_stream_failure() => {
					warn!(error = %err, "mapping source failed, stopping import");
					report.aborted = true;
					break;
				}
				Err(err) => {
					warn!(error = %err, "cannot read mapping record, will skip it");
					report.malformed += 1;
					continue;
				}
			};
			let record = match raw.decode() {
				Ok(record) => record,
				Err(err) => {
					warn!(error = %err, "cannot interpret mapping record, will skip it");
					report.malformed += 1;
					continue;
				}
			};

			let mut tables = self.tables.write();
			match self.bind_resolved(
				&mut tables,
				record.scope,
				DocumentId::from(record.id),
				record.key,
				OnMismatch::Duplicate,
			) {
				Ok(Bound::New) => report.imported += 1,
				Ok(Bound::Existing) => report.unchanged += 1,
				Err(err) => {
					warn!(line = raw.line, error = %err, "cannot create mapping for record, will skip it");
					report.conflicts += 1;
				}
			}
		}
		info!(
			imported = report.imported,
			unchanged = report.unchanged,
			malformed = report.malformed,
			conflicts = report.conflicts,
			aborted = report.aborted,
			"imported document id mappings"
		);
		report
	}

	/// Flushes and releases the sink and source. Later calls do nothing.
	///
	/// Failures are logged, followed by a summary of the mapping counts.
	/// Mappings created afterwards stay in memory only.
	pub fn close(&self) {
		let sink = self.sink.lock().take();
		let source = self.source.lock().take();
		if sink.is_none() && source.is_none() {
			return;
		}
		if let Some(mut sink) = sink
			&& let Err(err) = sink.close()
		{
			warn!(error = %err, "error while closing mapping sink");
		}
		if let Some(mut source) = source
			&& let Err(err) = source.close()
		{
			warn!(error = %err, "error while closing mapping source");
		}
		let stats = self.stats();
		info!(
			resolved = stats.resolved(),
			unresolved = stats.unresolved(),
			"closed document id registry"
		);
	}

	/// Adds `id <-> key` to the resolved table of `scope`, moving a pending
	/// entry with the same id out of the unresolved table.
	///
	/// Nothing changes when an error is returned.
	fn bind_resolved(
		&self,
		tables: &mut Tables,
		scope: &str,
		id: DocumentId,
		key: Key,
		on_mismatch: OnMismatch,
	) -> Result<Bound, RegistryError> {
		if let Some(stored) = tables.unresolved.key_of(scope, &id)
			&& stored != key
		{
			return Err(match on_mismatch {
				OnMismatch::Duplicate => RegistryError::DuplicateId {
					scope: scope.to_string(),
					id,
					existing: stored,
					requested: key,
				},
				OnMismatch::Violation => RegistryError::InvariantViolation {
					scope: scope.to_string(),
					id,
					stored,
					requested: key,
				},
			});
		}
		// The pending id may already be written out as a reference, so the key
		// stays bound to it.
		if let Some(pending) = tables.unresolved.id_of(scope, key)
			&& pending != id
		{
			return Err(RegistryError::KeyConflict {
				scope: scope.to_string(),
				key,
				existing: pending,
				requested: id,
			});
		}
		if tables.unresolved.contains_id(scope, &id) {
			if let Some(existing) = tables.resolved.id_of(scope, key) {
				return Err(RegistryError::KeyConflict {
					scope: scope.to_string(),
					key,
					existing,
					requested: id,
				});
			}
			tables.unresolved.remove_id(scope, &id);
		}

		match tables.resolved.get_or_create(scope).insert(id.clone(), key) {
			Insert::Inserted => {
				self.persist(scope, &id, key);
				Ok(Bound::New)
			}
			Insert::Unchanged => Ok(Bound::Existing),
			Insert::IdTaken(existing) => Err(RegistryError::DuplicateId {
				scope: scope.to_string(),
				id,
				existing,
				requested: key,
			}),
			Insert::KeyTaken(existing) => Err(RegistryError::KeyConflict {
				scope: scope.to_string(),
				key,
				existing,
				requested: id,
			}),
		}
	}

	/// Streams a new resolved mapping. Must be called with the table lock
	/// held for writing.
	fn persist(&self, scope: &str, id: &DocumentId, key: Key) {
		let mut sink = self.sink.lock();
		let Some(sink) = sink.as_mut() else {
			return;
		};
		let record = MappingRecord {
			scope,
			id: id.as_str(),
			key,
		};
		if let Err(err) = sink.write_mapping(&record) {
			warn!(scope, %id, %key, error = %err, "error while writing document id mapping");
		}
	}
}

impl Drop for DocumentIdRegistry {
	fn drop(&mut self) {
		self.close();
	}
}

impl fmt::Debug for DocumentIdRegistry {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let stats = self.stats();
		f.debug_struct("DocumentIdRegistry")
			.field("resolved", &stats.resolved())
			.field("unresolved", &stats.unresolved())
			.field("sink", &self.sink.lock().is_some())
			.finish()
	}
}
