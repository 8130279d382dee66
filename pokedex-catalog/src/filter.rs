// ---------------------------------------------------------------------------
// Filtering and enumeration by field
// ---------------------------------------------------------------------------

use std::collections::{BTreeMap, BTreeSet};

use crate::types::{Record, RecordField, UNKNOWN};

/// Value of `field` used for grouping; blank values group as `unknown`.
fn group_key(record: &Record, field: RecordField) -> String {
	let value = field.value_of(record);
	if value.trim().is_empty() {
		UNKNOWN.to_string()
	} else {
		value
	}
}

/// Every distinct value of `field`, case-sensitive, in sorted order.
pub fn distinct_values(records: &[Record], field: RecordField) -> BTreeSet<String> {
	records.iter().map(|r| group_key(r, field)).collect()
}

/// Records whose `field` equals `value` ignoring case, in input order.
pub fn filter_by<'a>(records: &'a [Record], field: RecordField, value: &str) -> Vec<&'a Record> {
	let wanted = value.trim().to_lowercase();
	records
		.iter()
		.filter(|r| group_key(r, field).to_lowercase() == wanted)
		.collect()
}

/// Distinct values of `field` with the number of records holding each.
pub fn count_by(records: &[Record], field: RecordField) -> BTreeMap<String, usize> {
	let mut counts = BTreeMap::new();
	for record in records {
		*counts.entry(group_key(record, field)).or_insert(0) += 1;
	}
	counts
}

/// Like `count_by`, but values that differ only in case share one entry.
/// Each entry is labelled with its first spelling in sorted order, and its
/// count equals what `filter_by` returns for that label.
pub fn count_by_ignore_case(records: &[Record], field: RecordField) -> Vec<(String, usize)> {
	let mut folded: BTreeMap<String, (String, usize)> = BTreeMap::new();
	for (value, count) in count_by(records, field) {
		folded
			.entry(value.to_lowercase())
			.or_insert_with(|| (value, 0))
			.1 += count;
	}
	folded.into_values().collect()
}
