//! Bidirectional document ID registry for bulk import and export.
//!
//! Records with non-unique natural keys reference each other through
//! placeholder document ids (`payAddress0`, `cust12`, ...). While a job walks
//! the records, [`DocumentIdRegistry`] translates those ids to numeric record
//! keys and back, per naming scope, in O(1) expected time in both directions.
//!
//! ```
//! use docid_registry::{DocumentIdRegistry, Key};
//!
//! let registry = DocumentIdRegistry::new();
//!
//! // A customer references address 5 before the address is exported.
//! let forward = registry.lookup_key("addr", Key(5));
//! assert_eq!(forward, "addr0");
//! assert!(registry.has_unresolved());
//!
//! // Exporting the address resolves the reference under the same id.
//! assert_eq!(registry.register_key("addr", Key(5)), forward);
//! assert!(!registry.has_unresolved());
//! assert_eq!(registry.lookup_id("addr", "addr0"), Some(Key(5)));
//! ```
//!
//! # Modules
//!
//! - [`persist`] - Mapping sources and sinks (delimited text on the `csv` crate)
//! - [`config`] - TOML configuration of the persistence dialect
//!
//! The job that owns a registry decides the walk order and when a record is
//! materialized; the registry only keeps the mappings consistent.

mod bimap;
pub mod config;
mod error;
mod key;
pub mod persist;
mod registry;
mod report;
mod tables;

pub use bimap::{BiMap, Insert};
pub use config::{PersistenceConfig, RegistryConfig};
pub use error::{ConfigError, PersistError, RegistryError};
pub use key::{DocumentId, Key, Resolution};
pub use persist::{
	CsvMappingSink, CsvMappingSource, Dialect, FlushPolicy, MappingRecord, MappingSink,
	MappingSource, RawRecord,
};
pub use registry::{DocumentIdRegistry, RegistryBuilder};
pub use report::{ImportReport, RegistryStats, ScopeStats, UnresolvedEntry};
