use anyhow::Result;
use clap::Parser;
use pokedex_catalog::CatalogStore;
use pokedex_cli::config::{CliArgs, GenerationTable};
use pokedex_cli::import::{needs_preload, preload};
use pokedex_cli::lookup::{LookupConfig, PokeApiClient};
use pokedex_cli::menu::{Session, SessionConfig};

fn main() -> Result<()> {
	let args = CliArgs::parse();

	// Logs go to stderr; stdout belongs to the menu
	tracing_subscriber::fmt()
		.with_writer(std::io::stderr)
		.with_env_filter(
			tracing_subscriber::EnvFilter::try_from_default_env()
				.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&args.log_level)),
		)
		.init();

	let store = CatalogStore::open(&args.data_dir)?;
	tracing::info!(root = %store.root().display(), "Catalog ready");

	let client = PokeApiClient::new(LookupConfig {
		base_url: args.api_url.clone(),
		timeout_secs: args.timeout_secs,
	});

	if !args.no_preload && needs_preload(&store)? {
		println!("Empty Pokedex, loading the first {} Pokemon of each generation...", args.preload_per_generation);
		let summary = preload(&store, &client, &GenerationTable::default(), args.preload_per_generation)?;
		for generation in &summary.generations {
			if generation.listing_failed {
				println!("  {}: listing failed, skipped", generation.generation);
			} else {
				println!(
					"  {}: {} added, {} already present, {} failed",
					generation.generation, generation.inserted, generation.existing, generation.failed
				);
			}
		}
		println!(
			"Preload complete: {} added, {} already present, {} failed",
			summary.inserted(),
			summary.existing(),
			summary.failed()
		);
	}

	let stdin = std::io::stdin();
	let stdout = std::io::stdout();
	let config = SessionConfig {
		page_size: args.page_size,
		search_threshold: args.search_threshold,
	};
	let mut session = Session::new(&store, &client, stdin.lock(), stdout.lock(), config);
	session.run()?;

	tracing::info!("Session closed");
	Ok(())
}
