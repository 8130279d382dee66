use crate::filter::count_by;
use crate::types::{Record, RecordField};

/// Aggregate figures over a record set.
#[derive(Debug, Clone, PartialEq)]
pub struct CatalogStats {
	pub total: usize,
	pub average_weight: f64,
	pub average_height: f64,
	/// Sorted by count descending, then by name.
	pub by_category: Vec<(String, usize)>,
	/// Sorted by name.
	pub by_generation: Vec<(String, usize)>,
}

pub fn summarize(records: &[Record]) -> CatalogStats {
	let total = records.len();
	let average = |f: fn(&Record) -> u32| {
		if total == 0 {
			0.0
		} else {
			records.iter().map(|r| f64::from(f(r))).sum::<f64>() / total as f64
		}
	};

	let mut by_category: Vec<_> = count_by(records, RecordField::Category).into_iter().collect();
	by_category.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));

	CatalogStats {
		total,
		average_weight: average(|r| r.weight),
		average_height: average(|r| r.height),
		by_category,
		by_generation: count_by(records, RecordField::Generation).into_iter().collect(),
	}
}
