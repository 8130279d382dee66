// ---------------------------------------------------------------------------
// Segment codec
// ---------------------------------------------------------------------------
//
// A segment is the CSV file backing one partition: a header row followed by
// one row per record. Rows are held as raw `ByteRecord`s so a rewrite keeps
// rows that fail typed decoding, invalid UTF-8 included, byte for byte.
// ---------------------------------------------------------------------------

use std::io::Write;
use std::path::Path;

use csv::{ByteRecord, ReaderBuilder, StringRecord, WriterBuilder};
use tempfile::NamedTempFile;

use crate::error::CatalogError;
use crate::types::{Record, RecordField};

/// File name of the segment inside each partition directory.
pub const SEGMENT_FILE_NAME: &str = "pokemon.csv";

/// The canonical header row.
pub fn header() -> StringRecord {
	RecordField::ALL.iter().map(|f| f.column()).collect()
}

/// Records decoded from a segment, plus the count of rows that were skipped.
#[derive(Debug, Default)]
pub struct DecodedRows {
	pub records: Vec<Record>,
	pub skipped: usize,
}

#[derive(Debug, Clone)]
pub struct Segment {
	headers: StringRecord,
	rows: Vec<ByteRecord>,
}

impl Default for Segment {
	fn default() -> Self {
		Self::new()
	}
}

impl Segment {
	/// An empty segment with the canonical header.
	pub fn new() -> Self {
		Self {
			headers: header(),
			rows: Vec::new(),
		}
	}

	/// Read a segment file. Returns `Ok(None)` when the file does not exist.
	///
	/// A zero-byte file reads as an empty segment. Rows are kept as raw
	/// bytes; typed decoding happens later in `decode`.
	pub fn load(path: &Path) -> Result<Option<Self>, CatalogError> {
		if !path.is_file() {
			return Ok(None);
		}

		let mut reader = ReaderBuilder::new()
			.has_headers(true)
			.flexible(true)
			.from_path(path)?;

		let mut headers = reader.headers()?.clone();
		if headers.is_empty() {
			headers = header();
		}
		if !headers.iter().any(|h| h.trim() == RecordField::Name.column()) {
			return Err(CatalogError::Corruption(format!(
				"{}: header has no name column",
				path.display()
			)));
		}

		let rows = reader.byte_records().collect::<Result<Vec<_>, _>>()?;

		Ok(Some(Self { headers, rows }))
	}

	pub fn len(&self) -> usize {
		self.rows.len()
	}

	pub fn is_empty(&self) -> bool {
		self.rows.is_empty()
	}

	/// Decode every row into a typed `Record`, skipping malformed ones.
	pub fn decode(&self, origin: &Path) -> DecodedRows {
		let mut decoded = DecodedRows::default();
		for (line, row) in self.rows.iter().enumerate() {
			match self.decode_row(row) {
				Ok(record) => decoded.records.push(record),
				Err(e) => {
					decoded.skipped += 1;
					tracing::warn!(
						path = %origin.display(),
						row = line + 1,
						error = %e,
						"Skipping malformed record"
					);
				}
			}
		}
		decoded
	}

	fn decode_row(&self, row: &ByteRecord) -> Result<Record, CatalogError> {
		let record: Record = row.deserialize(Some(self.headers.as_byte_record()))?;
		record.validate()?;
		Ok(record)
	}

	/// Index of the first valid record whose name matches case-insensitively.
	/// Rows that fail decoding never match.
	pub fn position(&self, name: &str) -> Option<usize> {
		self.rows
			.iter()
			.position(|row| self.decode_row(row).is_ok_and(|r| r.has_name(name)))
	}

	pub fn contains(&self, name: &str) -> bool {
		self.position(name).is_some()
	}

	/// Append a record laid out in this segment's header order.
	pub fn push(&mut self, record: &Record) {
		let row: ByteRecord = self
			.headers
			.iter()
			.map(|h| {
				h.parse::<RecordField>()
					.map(|f| f.value_of(record))
					.unwrap_or_default()
			})
			.collect();
		self.rows.push(row);
	}

	/// Overwrite one cell of the row at `index`.
	pub fn set(&mut self, index: usize, field: RecordField, value: &str) -> Result<(), CatalogError> {
		let col = self
			.headers
			.iter()
			.position(|h| h.trim() == field.column())
			.ok_or_else(|| CatalogError::Corruption(format!("header has no {} column", field)))?;
		let width = self.headers.len();
		let row = self
			.rows
			.get_mut(index)
			.ok_or_else(|| CatalogError::Corruption(format!("row {} out of range", index)))?;

		let mut cells: Vec<Vec<u8>> = row.iter().map(<[u8]>::to_vec).collect();
		if cells.len() < width {
			cells.resize(width, Vec::new());
		}
		cells[col] = value.as_bytes().to_vec();
		*row = ByteRecord::from(cells);
		Ok(())
	}

	pub fn remove(&mut self, index: usize) -> Option<ByteRecord> {
		if index < self.rows.len() {
			Some(self.rows.remove(index))
		} else {
			None
		}
	}

	/// Write the segment atomically: the bytes go to a temporary file in the
	/// same directory which then replaces `path` by rename.
	pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
		let dir = path.parent().ok_or_else(|| {
			CatalogError::Corruption(format!("{}: segment path has no parent", path.display()))
		})?;
		std::fs::create_dir_all(dir)?;

		let mut writer = WriterBuilder::new().flexible(true).from_writer(Vec::new());
		writer.write_record(&self.headers)?;
		for row in &self.rows {
			writer.write_byte_record(row)?;
		}
		let bytes = writer
			.into_inner()
			.map_err(|e| CatalogError::Io(e.into_error()))?;

		let mut tmp = NamedTempFile::new_in(dir)?;
		tmp.write_all(&bytes)?;
		tmp.as_file().sync_all()?;
		tmp.persist(path).map_err(|e| CatalogError::Io(e.error))?;

		tracing::debug!(path = %path.display(), rows = self.rows.len(), "Segment written");
		Ok(())
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
