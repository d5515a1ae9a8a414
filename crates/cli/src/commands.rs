//! Subcommand implementations. Output goes to the passed writer; logs go to
//! stderr through `tracing`. Each subcommand returns the process exit status.

use std::io::Write;
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, bail};
use docid_registry::{
	CsvMappingSink, CsvMappingSource, DocumentIdRegistry, Key, MappingSink, MappingSource,
	RegistryConfig,
};
use tracing::info;

use crate::cli::Command;

pub fn run(command: &Command, config: &RegistryConfig, out: &mut dyn Write) -> anyhow::Result<u8> {
	match command {
		Command::Inspect { snapshot } => inspect(snapshot, config, out),
		Command::Lookup { snapshot, scope, id } => lookup(snapshot, scope, id, config, out),
		Command::Merge { snapshots, output } => merge(snapshots, output, config, out),
		Command::Bench {
			records,
			workers,
			scope,
		} => bench(*records, usize::from(*workers), scope, out),
	}
}

fn open_snapshot(
	path: &Path,
	config: &RegistryConfig,
) -> anyhow::Result<CsvMappingSource<std::fs::File>> {
	let dialect = config.persistence.dialect()?;
	CsvMappingSource::open(path, dialect)
		.with_context(|| format!("cannot open mapping file {}", path.display()))
}

/// Warm-starts a registry from `path`, failing when the file cannot be read
/// to its end.
fn load_snapshot(path: &Path, config: &RegistryConfig) -> anyhow::Result<DocumentIdRegistry> {
	let source = open_snapshot(path, config)?;
	let (registry, report) = DocumentIdRegistry::builder()
		.source(source)
		.build_with_report();
	if report.aborted {
		bail!("mapping file {} could not be read completely", path.display());
	}
	Ok(registry)
}

fn inspect(path: &Path, config: &RegistryConfig, out: &mut dyn Write) -> anyhow::Result<u8> {
	let source = open_snapshot(path, config)?;
	let (registry, report) = DocumentIdRegistry::builder()
		.source(source)
		.build_with_report();

	writeln!(out, "{}: {report}", path.display())?;
	writeln!(out, "{}", registry.stats())?;
	Ok(if report.aborted { 1 } else { 0 })
}

fn lookup(
	path: &Path,
	scope: &str,
	id: &str,
	config: &RegistryConfig,
	out: &mut dyn Write,
) -> anyhow::Result<u8> {
	let registry = load_snapshot(path, config)?;
	match registry.lookup_id(scope, id) {
		Some(key) => {
			writeln!(out, "{key}")?;
			Ok(0)
		}
		None => {
			info!(scope, id, "no resolved mapping");
			Ok(1)
		}
	}
}

fn merge(
	inputs: &[PathBuf],
	output: &Path,
	config: &RegistryConfig,
	out: &mut dyn Write,
) -> anyhow::Result<u8> {
	let registry = DocumentIdRegistry::new();
	for input in inputs {
		let mut source = open_snapshot(input, config)?;
		let report = registry.import_mappings(&mut source);
		source.close()?;
		if report.aborted {
			bail!("mapping file {} could not be read completely", input.display());
		}
		writeln!(out, "{}: {report}", input.display())?;
	}

	let dialect = config.persistence.dialect()?;
	let mut sink = CsvMappingSink::create(output, dialect, config.persistence.flush)
		.with_context(|| format!("cannot create {}", output.display()))?;
	let written = registry.write_resolved(&mut sink)?;
	sink.close()?;
	writeln!(out, "wrote {written} mappings to {}", output.display())?;
	Ok(0)
}

/// Wall-clock time of each bench phase.
#[derive(Debug, Clone, Copy)]
pub struct BenchTimings {
	pub register: Duration,
	pub lookup_by_key: Duration,
	pub lookup_by_id: Duration,
}

/// Registers `records` keys in `scope`, then looks each up by key and by id,
/// with the keys split across `workers` threads.
pub fn run_bench(records: u32, workers: usize, scope: &str) -> anyhow::Result<BenchTimings> {
	let registry = DocumentIdRegistry::new();
	let keys: Vec<Key> = (0..i64::from(records)).map(Key).collect();
	let chunk = keys.len().div_ceil(workers.max(1)).max(1);

	let started = Instant::now();
	let ids: Vec<_> = std::thread::scope(|s| {
		let handles: Vec<_> = keys
			.chunks(chunk)
			.map(|part| {
				let registry = &registry;
				s.spawn(move || {
					part.iter()
						.map(|key| registry.register_key(scope, *key))
						.collect::<Vec<_>>()
				})
			})
			.collect();
		handles
			.into_iter()
			.map(|h| h.join())
			.collect::<Result<Vec<_>, _>>()
	})
	.map_err(|_| anyhow::anyhow!("bench worker panicked"))?
	.into_iter()
	.flatten()
	.collect();
	let register = started.elapsed();

	let started = Instant::now();
	std::thread::scope(|s| {
		for part in keys.chunks(chunk) {
			let registry = &registry;
			s.spawn(move || {
				for key in part {
					std::hint::black_box(registry.lookup_key(scope, *key));
				}
			});
		}
	});
	let lookup_by_key = started.elapsed();

	let started = Instant::now();
	std::thread::scope(|s| {
		for part in ids.chunks(chunk) {
			let registry = &registry;
			s.spawn(move || {
				for id in part {
					std::hint::black_box(registry.lookup_id(scope, id));
				}
			});
		}
	});
	let lookup_by_id = started.elapsed();

	if registry.scope_stats(scope).resolved != keys.len() {
		bail!("registry lost mappings during the bench run");
	}
	Ok(BenchTimings {
		register,
		lookup_by_key,
		lookup_by_id,
	})
}

fn bench(records: u32, workers: usize, scope: &str, out: &mut dyn Write) -> anyhow::Result<u8> {
	info!(records, workers, scope, "starting bench");
	let timings = run_bench(records, workers, scope)?;
	writeln!(out, "records:        {records}")?;
	writeln!(out, "workers:        {workers}")?;
	writeln!(out, "register:       {} ms", timings.register.as_millis())?;
	writeln!(out, "lookup by key:  {} ms", timings.lookup_by_key.as_millis())?;
	writeln!(out, "lookup by id:   {} ms", timings.lookup_by_id.as_millis())?;
	Ok(0)
}
