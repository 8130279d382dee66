// ---------------------------------------------------------------------------
// Similarity search
// ---------------------------------------------------------------------------
//
// Scores every stored name against a query, keeps the ones at or above a
// threshold and orders them by descending score. Ties keep scan order.
// ---------------------------------------------------------------------------

use crate::error::CatalogError;
use crate::similarity::similarity;
use crate::store::CatalogStore;
use crate::types::{Record, SimilarityResult};

/// Shortest query the engine will score.
pub const MIN_QUERY_LEN: usize = 3;
/// Default minimum score for a result to be kept.
pub const DEFAULT_THRESHOLD: f64 = 60.0;

/// Clamp a threshold into `[0, 100]`. NaN falls back to the default.
pub fn clamp_threshold(threshold: f64) -> f64 {
	if threshold.is_nan() {
		return DEFAULT_THRESHOLD;
	}
	threshold.clamp(0.0, 100.0)
}

/// Whether `query` is long enough to search with.
pub fn is_searchable(query: &str) -> bool {
	query.trim().chars().count() >= MIN_QUERY_LEN
}

/// Rank `records` against `query`.
///
/// Short queries yield no results. The sort is stable, so records with equal
/// scores stay in the order they were given.
pub fn rank(records: Vec<Record>, query: &str, threshold: f64) -> Vec<SimilarityResult> {
	let query = query.trim();
	if !is_searchable(query) {
		tracing::warn!(%query, min = MIN_QUERY_LEN, "Query too short");
		return Vec::new();
	}
	let threshold = clamp_threshold(threshold);

	let mut results: Vec<SimilarityResult> = records
		.into_iter()
		.filter_map(|record| {
			let score = similarity(query, &record.name);
			(score >= threshold).then_some(SimilarityResult { record, score })
		})
		.collect();

	results.sort_by(|a, b| b.score.total_cmp(&a.score));
	results
}

/// Search the whole catalog.
pub fn search(
	store: &CatalogStore,
	query: &str,
	threshold: f64,
) -> Result<Vec<SimilarityResult>, CatalogError> {
	if !is_searchable(query) {
		tracing::warn!(query = %query.trim(), min = MIN_QUERY_LEN, "Query too short");
		return Ok(Vec::new());
	}
	let records = store.scan_all()?;
	let scanned = records.len();
	let results = rank(records, query, threshold);
	tracing::debug!(query = %query.trim(), scanned, matched = results.len(), "Search complete");
	Ok(results)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
