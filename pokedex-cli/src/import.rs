// ---------------------------------------------------------------------------
// Bulk import
// ---------------------------------------------------------------------------
//
// Seeds an empty catalog with the first few entries of every generation.
// A failed item is counted and skipped; a failed listing skips the whole
// generation. Storage errors abort the import.
// ---------------------------------------------------------------------------

use pokedex_catalog::{CatalogError, CatalogStore, Record};

use crate::config::{GenerationRange, GenerationTable};
use crate::error::LookupError;
use crate::lookup::RecordLookup;

/// Outcome of importing one generation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GenerationSummary {
	pub generation: String,
	pub inserted: usize,
	pub existing: usize,
	pub failed: usize,
	/// The listing request itself failed, so nothing was attempted.
	pub listing_failed: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PreloadSummary {
	pub generations: Vec<GenerationSummary>,
}

impl PreloadSummary {
	pub fn inserted(&self) -> usize {
		self.generations.iter().map(|g| g.inserted).sum()
	}

	pub fn existing(&self) -> usize {
		self.generations.iter().map(|g| g.existing).sum()
	}

	pub fn failed(&self) -> usize {
		self.generations.iter().map(|g| g.failed).sum()
	}
}

/// Whether the catalog is empty enough to be seeded.
pub fn needs_preload(store: &CatalogStore) -> Result<bool, CatalogError> {
	Ok(!store.has_segments()?)
}

/// Import up to `per_generation` entries of each generation in `table`.
///
/// The generation tag stored is the one the lookup resolved; the table only
/// decides which slice of the index is listed.
pub fn preload<L: RecordLookup + ?Sized>(
	store: &CatalogStore,
	lookup: &L,
	table: &GenerationTable,
	per_generation: u32,
) -> Result<PreloadSummary, CatalogError> {
	let mut summary = PreloadSummary::default();
	for range in table.ranges() {
		let generation = import_generation(store, lookup, range, per_generation)?;
		tracing::info!(
			generation = %generation.generation,
			inserted = generation.inserted,
			existing = generation.existing,
			failed = generation.failed,
			"Generation imported"
		);
		summary.generations.push(generation);
	}
	Ok(summary)
}

fn import_generation<L: RecordLookup + ?Sized>(
	store: &CatalogStore,
	lookup: &L,
	range: &GenerationRange,
	per_generation: u32,
) -> Result<GenerationSummary, CatalogError> {
	let mut summary = GenerationSummary {
		generation: range.name.clone(),
		..Default::default()
	};

	let names = match lookup.list_names(range.offset, per_generation.min(range.limit)) {
		Ok(names) => names,
		Err(e) => {
			tracing::warn!(generation = %range.name, error = %e, code = e.code(), "Listing failed");
			summary.listing_failed = true;
			return Ok(summary);
		}
	};

	for name in names {
		match fetch_and_store(store, lookup, &name) {
			Ok(FetchOutcome { inserted: true, .. }) => summary.inserted += 1,
			Ok(FetchOutcome { inserted: false, .. }) => summary.existing += 1,
			Err(ImportError::Lookup(e)) => {
				summary.failed += 1;
				tracing::warn!(%name, error = %e, code = e.code(), "Lookup failed");
			}
			Err(ImportError::Catalog(e)) if e.is_user_error() => {
				summary.failed += 1;
				tracing::warn!(%name, error = %e, code = e.code(), "Rejected record");
			}
			Err(ImportError::Catalog(e)) => return Err(e),
		}
	}
	Ok(summary)
}

/// Either half of a fetch-then-store step.
#[derive(Debug, thiserror::Error)]
pub enum ImportError {
	#[error(transparent)]
	Lookup(#[from] LookupError),
	#[error(transparent)]
	Catalog(#[from] CatalogError),
}

impl ImportError {
	pub fn code(&self) -> &str {
		match self {
			Self::Lookup(e) => e.code(),
			Self::Catalog(e) => e.code(),
		}
	}
}

/// The record a lookup resolved and whether `put` stored it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
	pub record: Record,
	/// False when the partition already held the name.
	pub inserted: bool,
}

/// Fetch `key` and insert the record it resolves to.
pub fn fetch_and_store<L: RecordLookup + ?Sized>(
	store: &CatalogStore,
	lookup: &L,
	key: &str,
) -> Result<FetchOutcome, ImportError> {
	let record: Record = lookup.fetch(key)?;
	let inserted = store.put(&record)?.inserted();
	Ok(FetchOutcome { record, inserted })
}
