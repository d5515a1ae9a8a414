use std::io::Cursor;

use pretty_assertions::assert_eq;

use super::*;
use crate::error::PersistError;

fn read_all(input: &str, dialect: Dialect) -> Vec<RawRecord> {
	let mut source = CsvMappingSource::new(Cursor::new(input.as_bytes().to_vec()), dialect);
	let mut out = Vec::new();
	while let Some(record) = source.next_record() {
		out.push(record.expect("record"));
	}
	out
}

#[test]
fn reads_semicolon_records_with_line_numbers() {
	let records = read_all("cust;cust0;100\ncust;cust1;101\n", Dialect::default());

	assert_eq!(records.len(), 2);
	assert_eq!(records[0].fields, vec!["cust", "cust0", "100"]);
	assert_eq!(records[1].line, 2);
}

#[test]
fn comment_lines_are_skipped() {
	let records = read_all("# exported mappings\naddr;addr0;5\n", Dialect::default());
	assert_eq!(records.len(), 1);
	assert_eq!(records[0].fields[1], "addr0");
}

#[test]
fn short_and_long_records_reach_the_caller() {
	let records = read_all("a;b\na;b;1;extra\n", Dialect::default());
	assert_eq!(records[0].fields.len(), 2);
	assert_eq!(records[1].fields.len(), 4);
}

#[test]
fn decode_rejects_wrong_field_count() {
	let raw = RawRecord {
		line: 3,
		fields: vec!["only".into(), "two".into()],
	};
	assert!(matches!(raw.decode(), Err(PersistError::Malformed { line: 3, .. })));
}

#[test]
fn decode_rejects_non_numeric_key() {
	let raw = RawRecord {
		line: 1,
		fields: vec!["s".into(), "s0".into(), "abc".into()],
	};
	let err = raw.decode().unwrap_err();
	assert!(!err.is_stream_failure());
	assert!(err.to_string().contains("not a decimal integer"));
}

#[test]
fn decode_trims_key_but_keeps_scope_and_id_verbatim() {
	let raw = RawRecord {
		line: 1,
		fields: vec![" s".into(), "s0 ".into(), " 12 ".into()],
	};
	assert_eq!(
		raw.decode().unwrap(),
		MappingRecord {
			scope: " s",
			id: "s0 ",
			key: Key(12),
		}
	);
}

#[test]
fn sink_quotes_fields_containing_the_delimiter() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("ids.csv");

	let mut sink = CsvMappingSink::create(&path, Dialect::default(), FlushPolicy::Buffered).unwrap();
	sink.write_mapping(&MappingRecord {
		scope: "addr",
		id: "a;b",
		key: Key(9),
	})
	.unwrap();
	sink.close().unwrap();

	let text = std::fs::read_to_string(&path).unwrap();
	assert_eq!(text, "addr;\"a;b\";9\n");

	let records = read_all(&text, Dialect::default());
	assert_eq!(records[0].fields, vec!["addr", "a;b", "9"]);
}

#[test]
fn custom_dialect_round_trips() {
	let dialect = Dialect {
		delimiter: b',',
		quote: b'\'',
		comment: None,
	};
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("ids.csv");

	let mut sink = CsvMappingSink::create(&path, dialect, FlushPolicy::EveryRecord).unwrap();
	sink.write_mapping(&MappingRecord {
		scope: "p",
		id: "x,y",
		key: Key(-3),
	})
	.unwrap();
	// Flushed eagerly, so visible before close.
	assert_eq!(std::fs::read_to_string(&path).unwrap(), "p,'x,y',-3\n");
	sink.close().unwrap();

	let mut source = CsvMappingSource::open(&path, dialect).unwrap();
	let raw = source.next_record().unwrap().unwrap();
	assert_eq!(raw.decode().unwrap().key, Key(-3));
	assert!(source.next_record().is_none());
	source.close().unwrap();
}

#[test]
fn append_keeps_existing_records() {
	let dir = tempfile::tempdir().unwrap();
	let path = dir.path().join("ids.csv");
	std::fs::write(&path, "s;s0;1\n").unwrap();

	let mut sink = CsvMappingSink::append(&path, Dialect::default(), FlushPolicy::Buffered).unwrap();
	sink.write_mapping(&MappingRecord {
		scope: "s",
		id: "s1",
		key: Key(2),
	})
	.unwrap();
	sink.close().unwrap();

	assert_eq!(std::fs::read_to_string(&path).unwrap(), "s;s0;1\ns;s1;2\n");
}

#[test]
fn closed_streams_report_closed() {
	let mut sink = CsvMappingSink::new(Vec::new(), Dialect::default(), FlushPolicy::Buffered);
	sink.close().unwrap();
	assert!(matches!(sink.close(), Err(PersistError::Closed)));
	assert!(matches!(
		sink.write_mapping(&MappingRecord {
			scope: "s",
			id: "s0",
			key: Key(0),
		}),
		Err(PersistError::Closed)
	));

	let mut source = CsvMappingSource::new(Cursor::new(Vec::new()), Dialect::default());
	source.close().unwrap();
	assert!(source.next_record().is_none());
}

#[test]
fn scope_starting_with_comment_byte_is_quoted() {
	let mut out = Vec::new();
	let mut sink = CsvMappingSink::new(&mut out, Dialect::default(), FlushPolicy::Buffered);
	for (scope, id, key) in [("cust", "cust0", 1), ("#tag", "#tag0", 2), ("cust", "cust1", 3)] {
		sink.write_mapping(&MappingRecord {
			scope,
			id,
			key: Key(key),
		})
		.unwrap();
	}
	sink.close().unwrap();
	drop(sink);
	let text = String::from_utf8(out).unwrap();
	assert_eq!(text, "cust;cust0;1\n\"#tag\";\"#tag0\";\"2\"\ncust;cust1;3\n");

	let records = read_all(&text, Dialect::default());
	let scopes: Vec<_> = records.iter().map(|r| r.fields[0].as_str()).collect();
	assert_eq!(scopes, vec!["cust", "#tag", "cust"]);
	assert_eq!(records[1].decode().unwrap().key, Key(2));
}

#[test]
fn comment_byte_is_plain_data_without_comments() {
	let dialect = Dialect {
		comment: None,
		..Dialect::default()
	};
	let mut out = Vec::new();
	let mut sink = CsvMappingSink::new(&mut out, dialect, FlushPolicy::Buffered);
	sink.write_mapping(&MappingRecord {
		scope: "#tag",
		id: "#tag0",
		key: Key(2),
	})
	.unwrap();
	sink.close().unwrap();
	drop(sink);
	assert_eq!(String::from_utf8(out).unwrap(), "#tag;#tag0;2\n");
}
