//! Scope-partitioned storage for both resolution states.

use std::sync::Arc;

use rustc_hash::FxHashMap;

use crate::bimap::BiMap;
use crate::key::{DocumentId, Key};

/// `scope -> BiMap` for a single resolution state.
///
/// Scopes whose table becomes empty are dropped, so [`Self::is_empty`] is
/// true exactly when no entry exists in any scope.
#[derive(Debug, Default)]
pub(crate) struct ScopedTables {
	scopes: FxHashMap<Arc<str>, BiMap>,
}

impl ScopedTables {
	#[inline]
	pub(crate) fn get(&self, scope: &str) -> Option<&BiMap> {
		self.scopes.get(scope)
	}

	pub(crate) fn get_or_create(&mut self, scope: &str) -> &mut BiMap {
		self.scopes.entry(Arc::from(scope)).or_default()
	}

	pub(crate) fn key_of(&self, scope: &str, id: &str) -> Option<Key> {
		self.get(scope)?.key_of(id)
	}

	pub(crate) fn id_of(&self, scope: &str, key: Key) -> Option<DocumentId> {
		self.get(scope)?.id_of(key).cloned()
	}

	pub(crate) fn contains_id(&self, scope: &str, id: &str) -> bool {
		self.get(scope).is_some_and(|map| map.contains_id(id))
	}

	pub(crate) fn contains_key(&self, scope: &str, key: Key) -> bool {
		self.get(scope).is_some_and(|map| map.contains_key(key))
	}

	pub(crate) fn scope_len(&self, scope: &str) -> usize {
		self.get(scope).map_or(0, BiMap::len)
	}

	/// Removes `id` from `scope`, dropping the scope table once it is empty.
	pub(crate) fn remove_id(&mut self, scope: &str, id: &str) -> Option<(DocumentId, Key)> {
		let map = self.scopes.get_mut(scope)?;
		let removed = map.remove_id(id);
		if map.is_empty() {
			self.scopes.remove(scope);
		}
		removed
	}

	pub(crate) fn is_empty(&self) -> bool {
		self.scopes.is_empty()
	}

	pub(crate) fn iter(&self) -> impl Iterator<Item = (&Arc<str>, &BiMap)> {
		self.scopes.iter()
	}
}

/// All registry state: one [`ScopedTables`] per resolution state.
#[derive(Debug, Default)]
pub(crate) struct Tables {
	pub(crate) resolved: ScopedTables,
	pub(crate) unresolved: ScopedTables,
}

impl Tables {
	/// Produces an id for `scope` that is unused in both states.
	///
	/// Starts at `scope` followed by the combined entry count of the scope and
	/// counts upward. Sizes drift from the highest suffix once entries move or
	/// explicit ids are registered, hence the probe loop.
	pub(crate) fn next_id(&self, scope: &str) -> DocumentId {
		let mut number = (self.resolved.scope_len(scope) + self.unresolved.scope_len(scope)) as u64;
		loop {
			let candidate = format!("{scope}{number}");
			if !self.resolved.contains_id(scope, &candidate)
				&& !self.unresolved.contains_id(scope, &candidate)
			{
				return DocumentId::from(candidate);
			}
			number += 1;
		}
	}
}
