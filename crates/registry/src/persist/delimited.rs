//! Delimited-text mapping streams on top of the `csv` crate.

use std::fs::{File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::Path;

use csv::{QuoteStyle, ReaderBuilder, StringRecord, WriterBuilder};
use tracing::debug;

use super::{FlushPolicy, MappingRecord, MappingSink, MappingSource, RawRecord};
use crate::error::PersistError;

/// Field separator, quote and comment bytes of a mapping file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dialect {
	pub delimiter: u8,
	pub quote: u8,
	/// Lines starting with this byte are skipped when reading.
	pub comment: Option<u8>,
}

impl Default for Dialect {
	fn default() -> Self {
		Self {
			delimiter: b';',
			quote: b'"',
			comment: Some(b'#'),
		}
	}
}

impl Dialect {
	fn reader_builder(&self) -> ReaderBuilder {
		let mut builder = ReaderBuilder::new();
		builder
			.delimiter(self.delimiter)
			.quote(self.quote)
			.comment(self.comment)
			.has_headers(false)
			// Wrong field counts are reported per record by the registry.
			.flexible(true);
		builder
	}

	fn writer_builder(&self) -> WriterBuilder {
		let mut builder = WriterBuilder::new();
		builder
			.delimiter(self.delimiter)
			.quote(self.quote)
			.has_headers(false)
			.flexible(false);
		builder
	}
}

/// Reads mapping records from delimited text.
pub struct CsvMappingSource<R: Read> {
	reader: Option<csv::Reader<R>>,
	record: StringRecord,
}

impl<R: Read + Send> CsvMappingSource<R> {
	pub fn new(inner: R, dialect: Dialect) -> Self {
		Self {
			reader: Some(dialect.reader_builder().from_reader(inner)),
			record: StringRecord::new(),
		}
	}
}

impl CsvMappingSource<File> {
	/// Opens a mapping file for reading.
	pub fn open(path: impl AsRef<Path>, dialect: Dialect) -> Result<Self, PersistError> {
		let file = File::open(path.as_ref())?;
		Ok(Self::new(file, dialect))
	}
}

impl<R: Read + Send> MappingSource for CsvMappingSource<R> {
	fn next_record(&mut self) -> Option<Result<RawRecord, PersistError>> {
		let reader = self.reader.as_mut()?;
		match reader.read_record(&mut self.record) {
			Ok(true) => {
				let line = self.record.position().map_or(0, |pos| pos.line());
				Some(Ok(RawRecord {
					line,
					fields: self.record.iter().map(str::to_owned).collect(),
				}))
			}
			Ok(false) => None,
			Err(e) => Some(Err(e.into())),
		}
	}

	fn close(&mut self) -> Result<(), PersistError> {
		match self.reader.take() {
			Some(reader) => {
				drop(reader.into_inner());
				debug!("mapping source closed");
				Ok(())
			}
			None => Err(PersistError::Closed),
		}
	}
}

/// Writes mapping records as delimited text.
///
/// A record whose scope starts with the comment byte is written fully quoted,
/// so that the reader does not take it for a comment line.
pub struct CsvMappingSink<W: Write> {
	writer: Option<csv::Writer<W>>,
	dialect: Dialect,
	flush: FlushPolicy,
}

impl<W: Write + Send> CsvMappingSink<W> {
	pub fn new(inner: W, dialect: Dialect, flush: FlushPolicy) -> Self {
		Self {
			writer: Some(dialect.writer_builder().from_writer(inner)),
			dialect,
			flush,
		}
	}

	fn writer(&mut self) -> Result<&mut csv::Writer<W>, PersistError> {
		self.writer.as_mut().ok_or(PersistError::Closed)
	}

	fn starts_with_comment(&self, record: &MappingRecord<'_>) -> bool {
		self.dialect
			.comment
			.is_some_and(|comment| record.scope.as_bytes().first() == Some(&comment))
	}

	/// Encodes `fields` as one line with every field quoted.
	fn quoted_line(&self, fields: [&str; 3]) -> Result<Vec<u8>, PersistError> {
		let mut builder = self.dialect.writer_builder();
		builder.quote_style(QuoteStyle::Always);
		let mut line = builder.from_writer(Vec::new());
		line.write_record(fields)?;
		line.into_inner().map_err(|e| PersistError::Io(e.into_error()))
	}

	/// Writes pre-encoded bytes after everything buffered so far.
	fn write_encoded(&mut self, line: &[u8]) -> Result<(), PersistError> {
		let writer = self.writer.take().ok_or(PersistError::Closed)?;
		let mut inner = match writer.into_inner() {
			Ok(inner) => inner,
			Err(err) => {
				let error = io::Error::new(err.error().kind(), err.error().to_string());
				self.writer = Some(err.into_inner());
				return Err(error.into());
			}
		};
		let written = inner.write_all(line);
		self.writer = Some(self.dialect.writer_builder().from_writer(inner));
		written.map_err(PersistError::from)
	}
}

impl CsvMappingSink<File> {
	/// Creates (or truncates) a mapping file.
	pub fn create(
		path: impl AsRef<Path>,
		dialect: Dialect,
		flush: FlushPolicy,
	) -> Result<Self, PersistError> {
		let file = File::create(path.as_ref())?;
		Ok(Self::new(file, dialect, flush))
	}

	/// Opens a mapping file for appending, creating it when missing.
	pub fn append(
		path: impl AsRef<Path>,
		dialect: Dialect,
		flush: FlushPolicy,
	) -> Result<Self, PersistError> {
		let file = OpenOptions::new()
			.create(true)
			.append(true)
			.open(path.as_ref())?;
		Ok(Self::new(file, dialect, flush))
	}
}

impl<W: Write + Send> MappingSink for CsvMappingSink<W> {
	fn write_mapping(&mut self, record: &MappingRecord<'_>) -> Result<(), PersistError> {
		let flush = self.flush;
		let key = record.key.to_string();
		let fields = [record.scope, record.id, key.as_str()];
		if self.starts_with_comment(record) {
			let line = self.quoted_line(fields)?;
			self.write_encoded(&line)?;
		} else {
			self.writer()?.write_record(fields)?;
		}
		let writer = self.writer()?;
		if flush == FlushPolicy::EveryRecord {
			writer.flush()?;
		}
		Ok(())
	}

	fn flush(&mut self) -> Result<(), PersistError> {
		self.writer()?.flush()?;
		Ok(())
	}

	fn close(&mut self) -> Result<(), PersistError> {
		let Some(writer) = self.writer.take() else {
			return Err(PersistError::Closed);
		};
		let mut inner = writer.into_inner().map_err(|e| e.into_error())?;
		inner.flush()?;
		debug!("mapping sink closed");
		Ok(())
	}
}
