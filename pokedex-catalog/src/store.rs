// ---------------------------------------------------------------------------
// Partitioned record catalog
// ---------------------------------------------------------------------------
//
// Layout: `<root>/<generation>/<category>/pokemon.csv`, one segment per
// partition. Inserts are deduplicated by name within the partition. Scans,
// updates and deletes walk the tree with an explicit worklist and visit
// segments in lexicographic path order.
// ---------------------------------------------------------------------------

use std::path::{Path, PathBuf};

use crate::error::CatalogError;
use crate::segment::{Segment, SEGMENT_FILE_NAME};
use crate::types::{EditableField, Partition, Record};

/// Result of `CatalogStore::put`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PutOutcome {
	Inserted { partition: Partition, path: PathBuf },
	/// A record with the same name is already in the partition; nothing written.
	AlreadyExists { partition: Partition, path: PathBuf },
}

impl PutOutcome {
	pub fn inserted(&self) -> bool {
		matches!(self, Self::Inserted { .. })
	}

	pub fn path(&self) -> &Path {
		match self {
			Self::Inserted { path, .. } | Self::AlreadyExists { path, .. } => path,
		}
	}
}

/// Everything a full scan read.
#[derive(Debug, Default)]
pub struct ScanReport {
	pub records: Vec<Record>,
	/// Rows that failed to decode.
	pub skipped_rows: usize,
	/// Segments that could not be read at all.
	pub skipped_segments: usize,
}

pub struct CatalogStore {
	root: PathBuf,
}

impl CatalogStore {
	/// Open (creating if needed) a catalog rooted at `root`.
	pub fn open(root: impl Into<PathBuf>) -> Result<Self, CatalogError> {
		let root = root.into();
		std::fs::create_dir_all(&root)?;
		tracing::debug!(root = %root.display(), "Catalog opened");
		Ok(Self { root })
	}

	pub fn root(&self) -> &Path {
		&self.root
	}

	pub fn segment_path(&self, partition: &Partition) -> PathBuf {
		self.root
			.join(&partition.generation)
			.join(&partition.category)
			.join(SEGMENT_FILE_NAME)
	}

	// -- Writes --------------------------------------------------------------

	/// Insert `record` into its `(generation, category)` partition unless a
	/// record with the same name (ignoring case) is already there.
	pub fn put(&self, record: &Record) -> Result<PutOutcome, CatalogError> {
		record.validate()?;
		let partition = Partition::of(record)?;
		let path = self.segment_path(&partition);

		if self.exists_in_partition(&record.name, &partition)? {
			tracing::info!(name = %record.name, %partition, "Record already exists");
			return Ok(PutOutcome::AlreadyExists { partition, path });
		}

		let mut segment = Segment::load(&path)?.unwrap_or_default();
		segment.push(record);
		segment.save(&path)?;
		tracing::info!(name = %record.name, %partition, "Record inserted");
		Ok(PutOutcome::Inserted { partition, path })
	}

	/// Set one allow-listed field on the first record named `name`.
	///
	/// Returns `Ok(false)` when no record matches. The value is validated
	/// before any segment is touched.
	pub fn update_field(
		&self,
		name: &str,
		field: EditableField,
		new_value: &str,
	) -> Result<bool, CatalogError> {
		check_name(name)?;
		let value = field.normalize(new_value)?;

		let Some((path, mut segment, index)) = self.locate(name)? else {
			return Ok(false);
		};
		segment.set(index, field.field(), &value)?;
		segment.save(&path)?;

		tracing::info!(%name, %field, %value, path = %path.display(), "Record updated");
		Ok(true)
	}

	/// Remove the first record named `name`. Returns whether one was removed.
	pub fn delete(&self, name: &str) -> Result<bool, CatalogError> {
		check_name(name)?;

		let Some((path, mut segment, index)) = self.locate(name)? else {
			return Ok(false);
		};
		segment.remove(index);
		segment.save(&path)?;

		tracing::info!(%name, path = %path.display(), "Record deleted");
		Ok(true)
	}

	// -- Reads ---------------------------------------------------------------

	/// Whether `partition` already holds a valid record named `name`. Rows
	/// that fail to decode are not counted.
	pub fn exists_in_partition(&self, name: &str, partition: &Partition) -> Result<bool, CatalogError> {
		let path = self.segment_path(partition);
		Ok(Segment::load(&path)?.is_some_and(|s| s.contains(name)))
	}

	/// Every record in the catalog. Malformed rows and unreadable segments
	/// are skipped with a warning.
	pub fn scan_all(&self) -> Result<Vec<Record>, CatalogError> {
		Ok(self.scan()?.records)
	}

	/// Like `scan_all`, but also reports what was skipped.
	pub fn scan(&self) -> Result<ScanReport, CatalogError> {
		let mut report = ScanReport::default();
		for path in self.segment_paths()? {
			match Segment::load(&path) {
				Ok(Some(segment)) => {
					let decoded = segment.decode(&path);
					report.skipped_rows += decoded.skipped;
					report.records.extend(decoded.records);
				}
				Ok(None) => {}
				Err(e) => {
					report.skipped_segments += 1;
					tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable segment");
				}
			}
		}
		tracing::debug!(
			records = report.records.len(),
			skipped_rows = report.skipped_rows,
			skipped_segments = report.skipped_segments,
			"Catalog scanned"
		);
		Ok(report)
	}

	/// True once any segment file exists anywhere under the root.
	pub fn has_segments(&self) -> Result<bool, CatalogError> {
		Ok(!self.segment_paths()?.is_empty())
	}

	/// Partitions that have a segment on disk, in path order.
	pub fn partitions(&self) -> Result<Vec<Partition>, CatalogError> {
		Ok(self
			.segment_paths()?
			.iter()
			.filter_map(|path| self.partition_of(path))
			.collect())
	}

	/// All segment files under the root, sorted by path.
	///
	/// Only `<root>/<generation>/<category>/pokemon.csv` counts, and both
	/// directory names must form a valid partition. Walks the tree with a
	/// worklist. Unreadable subdirectories are logged and skipped; an
	/// unreadable root is an error.
	pub fn segment_paths(&self) -> Result<Vec<PathBuf>, CatalogError> {
		let mut found = Vec::new();
		let mut pending = vec![(self.root.clone(), 0usize)];

		while let Some((dir, depth)) = pending.pop() {
			let entries = match std::fs::read_dir(&dir) {
				Ok(entries) => entries,
				Err(e) if dir == self.root && e.kind() == std::io::ErrorKind::NotFound => {
					return Ok(Vec::new());
				}
				Err(e) if dir == self.root => return Err(e.into()),
				Err(e) => {
					tracing::warn!(dir = %dir.display(), error = %e, "Skipping unreadable directory");
					continue;
				}
			};

			for entry in entries {
				let entry = match entry {
					Ok(entry) => entry,
					Err(e) => {
						tracing::warn!(dir = %dir.display(), error = %e, "Skipping directory entry");
						continue;
					}
				};
				let path = entry.path();
				let Ok(file_type) = entry.file_type() else {
					continue;
				};
				if depth < PARTITION_DEPTH {
					if file_type.is_dir() {
						pending.push((path, depth + 1));
					}
				} else if file_type.is_file()
					&& entry.file_name() == SEGMENT_FILE_NAME
					&& self.partition_of(&path).is_some()
				{
					found.push(path);
				}
			}
		}

		found.sort();
		Ok(found)
	}

	/// The partition a segment path belongs to, if it sits at
	/// `<root>/<generation>/<category>/pokemon.csv`.
	fn partition_of(&self, path: &Path) -> Option<Partition> {
		let rel = path.strip_prefix(&self.root).ok()?;
		let parts: Vec<_> = rel.components().collect();
		let [generation, category, file] = parts.as_slice() else {
			return None;
		};
		if file.as_os_str() != SEGMENT_FILE_NAME {
			return None;
		}
		Partition::new(
			&generation.as_os_str().to_string_lossy(),
			&category.as_os_str().to_string_lossy(),
		)
		.ok()
	}

	/// First segment (in path order) holding a record named `name`.
	fn locate(&self, name: &str) -> Result<Option<(PathBuf, Segment, usize)>, CatalogError> {
		for path in self.segment_paths()? {
			let segment = match Segment::load(&path) {
				Ok(Some(segment)) => segment,
				Ok(None) => continue,
				Err(e) => {
					tracing::warn!(path = %path.display(), error = %e, "Skipping unreadable segment");
					continue;
				}
			};
			if let Some(index) = segment.position(name) {
				return Ok(Some((path, segment, index)));
			}
		}
		Ok(None)
	}
}

/// Directory levels between the root and a segment file.
const PARTITION_DEPTH: usize = 2;

fn check_name(name: &str) -> Result<(), CatalogError> {
	if name.trim().is_empty() {
		return Err(CatalogError::InvalidRecord("name is empty".into()));
	}
	Ok(())
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	fn record(id: u32, name: &str, category: &str, generation: &str) -> Record {
		Record {
			id,
			name: name.to_string(),
			category: category.to_string(),
			height: 10,
			weight: 100,
			experience: 50,
			abilities: "none".to_string(),
			encounter_areas: String::new(),
			generation: generation.to_string(),
		}
	}

	fn open_store() -> (tempfile::TempDir, CatalogStore) {
		let dir = tempfile::tempdir().unwrap();
		let store = CatalogStore::open(dir.path().join("pokedex")).unwrap();
		(dir, store)
	}

	#[test]
	fn open_creates_root() {
		let (_dir, store) = open_store();
		assert!(store.root().is_dir());
		assert!(!store.has_segments().unwrap());
		assert!(store.scan_all().unwrap().is_empty());
	}

	#[test]
	fn put_then_scan() {
		let (_dir, store) = open_store();
		let outcome = store
			.put(&record(25, "pikachu", "electric", "generation-i"))
			.unwrap();
		assert!(outcome.inserted());
		assert_eq!(
			outcome.path(),
			store
				.root()
				.join("generation-i")
				.join("electric")
				.join(SEGMENT_FILE_NAME)
		);

		let all = store.scan_all().unwrap();
		assert_eq!(all.len(), 1);
		assert!(all[0].has_name("PIKACHU"));
	}

	#[test]
	fn put_duplicate_name_is_noop() {
		let (_dir, store) = open_store();
		store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		let second = store
			.put(&record(25, "PikaChu", "electric", "generation-i"))
			.unwrap();
		assert!(matches!(second, PutOutcome::AlreadyExists { .. }));
		assert_eq!(store.scan_all().unwrap().len(), 1);
	}

	#[test]
	fn uniqueness_is_per_partition() {
		let (_dir, store) = open_store();
		store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		let other = store.put(&record(25, "pikachu", "normal", "generation-i")).unwrap();
		assert!(other.inserted());
		assert_eq!(store.scan_all().unwrap().len(), 2);
	}

	#[test]
	fn put_rejects_invalid_record() {
		let (_dir, store) = open_store();
		let err = store.put(&record(1, "", "grass", "generation-i")).unwrap_err();
		assert!(err.is_user_error());
		let err = store.put(&record(1, "bulbasaur", "../grass", "generation-i")).unwrap_err();
		assert!(matches!(err, CatalogError::InvalidRecord(_)));
		assert!(!store.has_segments().unwrap());
	}

	#[test]
	fn exists_in_partition_checks_only_that_partition() {
		let (_dir, store) = open_store();
		store.put(&record(4, "charmander", "fire", "generation-i")).unwrap();
		let fire = Partition::new("generation-i", "fire").unwrap();
		let water = Partition::new("generation-i", "water").unwrap();
		assert!(store.exists_in_partition("Charmander", &fire).unwrap());
		assert!(!store.exists_in_partition("charmander", &water).unwrap());
	}

	#[test]
	fn scan_order_is_lexicographic_by_path() {
		let (_dir, store) = open_store();
		store.put(&record(152, "chikorita", "grass", "generation-ii")).unwrap();
		store.put(&record(7, "squirtle", "water", "generation-i")).unwrap();
		store.put(&record(4, "charmander", "fire", "generation-i")).unwrap();
		store.put(&record(5, "charmeleon", "fire", "generation-i")).unwrap();

		let names: Vec<_> = store.scan_all().unwrap().into_iter().map(|r| r.name).collect();
		assert_eq!(names, vec!["charmander", "charmeleon", "squirtle", "chikorita"]);

		let partitions: Vec<_> = store
			.partitions()
			.unwrap()
			.into_iter()
			.map(|p| p.to_string())
			.collect();
		assert_eq!(
			partitions,
			vec!["generation-i/fire", "generation-i/water", "generation-ii/grass"]
		);
	}

	#[test]
	fn update_changes_only_target_field() {
		let (_dir, store) = open_store();
		store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		store.put(&record(26, "raichu", "electric", "generation-i")).unwrap();
		let before = store.scan_all().unwrap();

		assert!(store.update_field("PIKACHU", EditableField::Weight, "75").unwrap());

		let after = store.scan_all().unwrap();
		assert_eq!(after.len(), before.len());
		let mut expected = before[0].clone();
		expected.weight = 75;
		assert_eq!(after[0], expected);
		assert_eq!(after[1], before[1]);
	}

	#[test]
	fn update_missing_record_returns_false() {
		let (_dir, store) = open_store();
		store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		assert!(!store.update_field("mew", EditableField::Height, "4").unwrap());
	}

	#[test]
	fn update_invalid_value_leaves_segment_untouched() {
		let (_dir, store) = open_store();
		let outcome = store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		let before = std::fs::read(outcome.path()).unwrap();

		let err = store
			.update_field("pikachu", EditableField::Height, "tall")
			.unwrap_err();
		assert!(matches!(err, CatalogError::InvalidValue { .. }));
		assert_eq!(std::fs::read(outcome.path()).unwrap(), before);
	}

	#[test]
	fn update_first_match_only() {
		let (_dir, store) = open_store();
		store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		store.put(&record(25, "pikachu", "normal", "generation-i")).unwrap();

		assert!(store.update_field("pikachu", EditableField::EncounterAreas, "forest").unwrap());

		let all = store.scan_all().unwrap();
		assert_eq!(all[0].category, "electric");
		assert_eq!(all[0].encounter_areas, "forest");
		assert_eq!(all[1].encounter_areas, "");
	}

	#[test]
	fn delete_removes_record_and_keeps_partition() {
		let (_dir, store) = open_store();
		let outcome = store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();

		assert!(store.delete("Pikachu").unwrap());
		assert!(store.scan_all().unwrap().iter().all(|r| !r.has_name("pikachu")));
		assert!(outcome.path().is_file());
		assert_eq!(store.partitions().unwrap().len(), 1);
	}

	#[test]
	fn delete_missing_returns_false() {
		let (_dir, store) = open_store();
		store.put(&record(1, "bulbasaur", "grass", "generation-i")).unwrap();
		assert!(!store.delete("missingno").unwrap());
		assert_eq!(store.scan_all().unwrap().len(), 1);
	}

	#[test]
	fn blank_names_are_rejected() {
		let (_dir, store) = open_store();
		assert!(store.delete("  ").unwrap_err().is_user_error());
		assert!(store
			.update_field("", EditableField::Weight, "1")
			.unwrap_err()
			.is_user_error());
	}

	#[test]
	fn scan_skips_unreadable_segment() {
		let (_dir, store) = open_store();
		store.put(&record(1, "bulbasaur", "grass", "generation-i")).unwrap();

		let broken = store.root().join("generation-i").join("bug");
		std::fs::create_dir_all(&broken).unwrap();
		std::fs::write(broken.join(SEGMENT_FILE_NAME), "id,label\n1,x\n").unwrap();

		let report = store.scan().unwrap();
		assert_eq!(report.records.len(), 1);
		assert_eq!(report.skipped_segments, 1);
	}

	#[test]
	fn ignores_non_segment_files() {
		let (_dir, store) = open_store();
		std::fs::write(store.root().join("notes.txt"), "hello").unwrap();
		assert!(!store.has_segments().unwrap());
	}

	#[test]
	fn only_partition_segments_are_walked() {
		let (_dir, store) = open_store();
		store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();

		let stray = "id,name,category,height,weight,experience,abilities,encounter_areas,generation\n\
			151,mew,psychic,4,40,300,none,,generation-i\n";
		std::fs::write(store.root().join("stray.csv"), stray).unwrap();
		let nested = store.root().join("generation-i").join("psychic").join("old");
		std::fs::create_dir_all(&nested).unwrap();
		std::fs::write(nested.join(SEGMENT_FILE_NAME), stray).unwrap();
		std::fs::write(
			store.root().join("generation-i").join("electric").join("backup.csv"),
			stray,
		)
		.unwrap();

		assert_eq!(store.segment_paths().unwrap().len(), 1);
		assert_eq!(store.partitions().unwrap().len(), 1);
		assert!(store.scan_all().unwrap().iter().all(|r| !r.has_name("mew")));
		assert!(!store.update_field("mew", EditableField::Weight, "1").unwrap());
		assert!(!store.delete("mew").unwrap());
		assert_eq!(std::fs::read_to_string(store.root().join("stray.csv")).unwrap(), stray);
	}

	#[test]
	fn malformed_row_does_not_shadow_a_name() {
		let (_dir, store) = open_store();
		let outcome = store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		let mut body = std::fs::read_to_string(outcome.path()).unwrap();
		body.push_str("bad,raichu,electric,8,300,0,none,,generation-i\n");
		std::fs::write(outcome.path(), &body).unwrap();

		let electric = Partition::new("generation-i", "electric").unwrap();
		assert!(!store.exists_in_partition("raichu", &electric).unwrap());
		assert!(!store.update_field("raichu", EditableField::Weight, "9").unwrap());
		assert!(!store.delete("raichu").unwrap());

		assert!(store.put(&record(26, "raichu", "electric", "generation-i")).unwrap().inserted());
		assert!(store.scan_all().unwrap().iter().any(|r| r.has_name("raichu")));
		assert!(std::fs::read_to_string(outcome.path())
			.unwrap()
			.contains("bad,raichu,electric"));
	}

	#[test]
	fn edits_keep_rows_that_are_not_utf8() {
		let (_dir, store) = open_store();
		let outcome = store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		let odd_row = b"26,flab\xe9b\xe9,electric,8,300,0,none,,generation-i\n";
		let mut body = std::fs::read(outcome.path()).unwrap();
		body.extend_from_slice(odd_row);
		std::fs::write(outcome.path(), &body).unwrap();

		assert!(store.update_field("pikachu", EditableField::Weight, "75").unwrap());
		assert!(store.put(&record(172, "pichu", "electric", "generation-i")).unwrap().inserted());
		assert!(store.delete("pichu").unwrap());

		let bytes = std::fs::read(outcome.path()).unwrap();
		assert!(bytes.windows(odd_row.len()).any(|w| w == odd_row));
		let report = store.scan().unwrap();
		assert_eq!(report.records.len(), 1);
		assert_eq!(report.records[0].weight, 75);
		assert_eq!(report.skipped_rows, 1);
	}

	#[test]
	fn failed_put_into_blocked_segment_path_is_io_error() {
		let (_dir, store) = open_store();
		let partition = Partition::new("generation-i", "grass").unwrap();
		let path = store.segment_path(&partition);
		std::fs::create_dir_all(path.join("occupied")).unwrap();

		let err = store.put(&record(1, "bulbasaur", "grass", "generation-i")).unwrap_err();
		assert!(matches!(err, CatalogError::Io(_)));
		assert!(path.join("occupied").is_dir());
		assert!(store.scan_all().unwrap().is_empty());
	}

	#[cfg(unix)]
	#[test]
	fn failed_save_leaves_segment_unchanged() {
		use std::os::unix::fs::PermissionsExt;

		let (_dir, store) = open_store();
		let outcome = store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		let partition_dir = outcome.path().parent().unwrap().to_path_buf();
		let before = std::fs::read(outcome.path()).unwrap();

		std::fs::set_permissions(&partition_dir, std::fs::Permissions::from_mode(0o555)).unwrap();
		// Privileged users can still write; nothing to check there.
		if tempfile::NamedTempFile::new_in(&partition_dir).is_ok() {
			std::fs::set_permissions(&partition_dir, std::fs::Permissions::from_mode(0o755)).unwrap();
			return;
		}

		let put = store.put(&record(26, "raichu", "electric", "generation-i"));
		let update = store.update_field("pikachu", EditableField::Weight, "75");
		let delete = store.delete("pikachu");
		let after = std::fs::read(outcome.path()).unwrap();
		std::fs::set_permissions(&partition_dir, std::fs::Permissions::from_mode(0o755)).unwrap();

		assert!(matches!(put, Err(CatalogError::Io(_))));
		assert!(matches!(update, Err(CatalogError::Io(_))));
		assert!(matches!(delete, Err(CatalogError::Io(_))));
		assert_eq!(after, before);
	}
}
