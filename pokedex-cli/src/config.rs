use std::path::PathBuf;

use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "pokedex", about = "Personal Pokedex over a partitioned flat-file catalog")]
pub struct CliArgs {
	/// Root directory of the catalog
	#[arg(long, default_value = "pokedex", env = "POKEDEX_DATA_DIR")]
	pub data_dir: PathBuf,

	/// Base URL of the PokeAPI service
	#[arg(long, default_value = "https://pokeapi.co/api/v2", env = "POKEDEX_API_URL")]
	pub api_url: String,

	/// Timeout for each remote request in seconds
	#[arg(long, default_value = "10", env = "POKEDEX_TIMEOUT_SECS")]
	pub timeout_secs: u64,

	/// Records per page in listings (0 falls back to 10)
	#[arg(long, default_value = "10")]
	pub page_size: usize,

	/// Minimum similarity percentage for search results
	#[arg(long, default_value = "60")]
	pub search_threshold: f64,

	/// Records fetched per generation when seeding an empty catalog
	#[arg(long, default_value = "5")]
	pub preload_per_generation: u32,

	/// Skip seeding an empty catalog at start-up
	#[arg(long)]
	pub no_preload: bool,

	/// Log level (trace, debug, info, warn, error)
	#[arg(long, default_value = "warn", env = "POKEDEX_LOG_LEVEL")]
	pub log_level: String,
}

// ---------------------------------------------------------------------------
// Generation table
// ---------------------------------------------------------------------------

/// A contiguous slice of the national index belonging to one generation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationRange {
	pub name: String,
	pub offset: u32,
	pub limit: u32,
}

impl GenerationRange {
	pub fn new(name: &str, offset: u32, limit: u32) -> Self {
		Self {
			name: name.to_string(),
			offset,
			limit,
		}
	}
}

/// Immutable list of generation ranges used by the preload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenerationTable {
	ranges: Vec<GenerationRange>,
}

impl GenerationTable {
	pub fn new(ranges: Vec<GenerationRange>) -> Self {
		Self { ranges }
	}

	pub fn ranges(&self) -> &[GenerationRange] {
		&self.ranges
	}

	pub fn len(&self) -> usize {
		self.ranges.len()
	}

	pub fn is_empty(&self) -> bool {
		self.ranges.is_empty()
	}
}

impl Default for GenerationTable {
	fn default() -> Self {
		Self::new(vec![
			GenerationRange::new("generation-i", 0, 151),
			GenerationRange::new("generation-ii", 151, 100),
			GenerationRange::new("generation-iii", 251, 135),
			GenerationRange::new("generation-iv", 386, 107),
			GenerationRange::new("generation-v", 493, 156),
			GenerationRange::new("generation-vi", 649, 72),
			GenerationRange::new("generation-vii", 721, 88),
			GenerationRange::new("generation-viii", 809, 96),
			GenerationRange::new("generation-ix", 905, 120),
		])
	}
}
