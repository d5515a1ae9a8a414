//! One (scope, resolution) bijection between document ids and keys.
//!
//! # Invariants
//!
//! - `forward` and `backward` describe the same relation: `forward[id] == key`
//!   iff `backward[key] == id`.
//!   - Enforced in: [`BiMap::insert`], [`BiMap::remove_id`].
//!   - Tested by: `bimap::tests::prop_sides_stay_in_lock_step`.
//!   - Failure symptom: lookup by key disagrees with lookup by id.

use rustc_hash::FxHashMap;

use crate::key::{DocumentId, Key};

/// Outcome of a [`BiMap::insert`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Insert {
	/// Neither side was present; the pair was added.
	Inserted,
	/// The exact pair was already present.
	Unchanged,
	/// The id is bound to another key. Nothing changed.
	IdTaken(Key),
	/// The key is bound to another id. Nothing changed.
	KeyTaken(DocumentId),
}

/// Id to key map with an O(1) inverse index.
#[derive(Debug, Default, Clone)]
pub struct BiMap {
	forward: FxHashMap<DocumentId, Key>,
	backward: FxHashMap<Key, DocumentId>,
}

impl BiMap {
	pub fn new() -> Self {
		Self::default()
	}

	#[inline]
	pub fn key_of(&self, id: &str) -> Option<Key> {
		self.forward.get(id).copied()
	}

	#[inline]
	pub fn id_of(&self, key: Key) -> Option<&DocumentId> {
		self.backward.get(&key)
	}

	#[inline]
	pub fn contains_id(&self, id: &str) -> bool {
		self.forward.contains_key(id)
	}

	#[inline]
	pub fn contains_key(&self, key: Key) -> bool {
		self.backward.contains_key(&key)
	}

	/// Adds `id <-> key` unless either side is already bound elsewhere.
	pub fn insert(&mut self, id: DocumentId, key: Key) -> Insert {
		if let Some(&existing) = self.forward.get(&*id) {
			return if existing == key {
				Insert::Unchanged
			} else {
				Insert::IdTaken(existing)
			};
		}
		if let Some(existing) = self.backward.get(&key) {
			return Insert::KeyTaken(existing.clone());
		}
		self.backward.insert(key, id.clone());
		self.forward.insert(id, key);
		Insert::Inserted
	}

	/// Removes the pair owning `id`, returning both halves.
	pub fn remove_id(&mut self, id: &str) -> Option<(DocumentId, Key)> {
		let (id, key) = self.forward.remove_entry(id)?;
		self.backward.remove(&key);
		Some((id, key))
	}

	pub fn len(&self) -> usize {
		self.forward.len()
	}

	pub fn is_empty(&self) -> bool {
		self.forward.is_empty()
	}

	/// Iterates pairs in unspecified order.
	pub fn iter(&self) -> impl Iterator<Item = (&DocumentId, Key)> {
		self.forward.iter().map(|(id, key)| (id, *key))
	}
}
