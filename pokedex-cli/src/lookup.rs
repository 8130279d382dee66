//! PokeAPI lookup client.
//!
//! Resolves a name or national index number into a catalog `Record` by
//! querying the public PokeAPI over HTTP. The generation tag comes from a
//! second request to the species resource.

use std::time::Duration;

use pokedex_catalog::types::{NO_ABILITIES, UNKNOWN};
use pokedex_catalog::Record;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use ureq::Agent;

use crate::error::LookupError;

/// Largest page `list_names` will request.
pub const MAX_LIST_LIMIT: u32 = 1000;

/// Source of records by name or id.
pub trait RecordLookup {
	/// Fetch one record. `key` is a name or a numeric id.
	fn fetch(&self, key: &str) -> Result<Record, LookupError>;

	/// Names of the entries at `offset..offset + limit` of the remote index.
	fn list_names(&self, offset: u32, limit: u32) -> Result<Vec<String>, LookupError>;
}

/// Lowercase and check a lookup key. Only ASCII letters, digits and `-`
/// are allowed so the key can be placed in a URL path as is.
pub fn normalize_key(key: &str) -> Result<String, LookupError> {
	let key = key.trim().to_lowercase();
	let valid = !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '-');
	if !valid {
		return Err(LookupError::InvalidKey(key));
	}
	Ok(key)
}

// ---------------------------------------------------------------------------
// Payloads
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
pub struct NamedResource {
	#[serde(default)]
	pub name: String,
	#[serde(default)]
	pub url: String,
}

#[derive(Debug, Deserialize)]
pub struct TypeSlot {
	#[serde(default)]
	pub slot: u32,
	#[serde(rename = "type")]
	pub kind: NamedResource,
}

#[derive(Debug, Deserialize)]
pub struct AbilitySlot {
	pub ability: NamedResource,
}

/// Body of `GET /pokemon/{key}`. Every field is optional here so that a
/// missing one is reported by name rather than as a parse failure.
#[derive(Debug, Deserialize)]
pub struct PokemonPayload {
	pub id: Option<u32>,
	pub name: Option<String>,
	pub height: Option<u32>,
	pub weight: Option<u32>,
	pub base_experience: Option<u32>,
	#[serde(default)]
	pub types: Vec<TypeSlot>,
	#[serde(default)]
	pub abilities: Vec<AbilitySlot>,
	pub species: Option<NamedResource>,
}

#[derive(Debug, Deserialize)]
pub struct SpeciesPayload {
	pub generation: Option<NamedResource>,
}

#[derive(Debug, Deserialize)]
pub struct ListPayload {
	#[serde(default)]
	pub results: Vec<NamedResource>,
}

/// Build a `Record` from a pokemon payload and an already resolved
/// generation tag.
pub fn record_from_payload(payload: PokemonPayload, generation: String) -> Result<Record, LookupError> {
	let id = payload.id.filter(|id| *id > 0).ok_or(LookupError::MissingField("id"))?;
	let name = payload
		.name
		.filter(|n| !n.trim().is_empty())
		.ok_or(LookupError::MissingField("name"))?;
	let height = payload.height.ok_or(LookupError::MissingField("height"))?;
	let weight = payload.weight.ok_or(LookupError::MissingField("weight"))?;

	let category = payload
		.types
		.iter()
		.find(|t| t.slot == 1)
		.or_else(|| payload.types.first())
		.map(|t| t.kind.name.clone())
		.filter(|n| !n.is_empty())
		.ok_or(LookupError::MissingField("types"))?;

	let abilities: Vec<&str> = payload
		.abilities
		.iter()
		.map(|a| a.ability.name.as_str())
		.filter(|n| !n.is_empty())
		.collect();
	let abilities = if abilities.is_empty() {
		NO_ABILITIES.to_string()
	} else {
		abilities.join(", ")
	};

	Ok(Record {
		id,
		name,
		category,
		height,
		weight,
		experience: payload.base_experience.unwrap_or(0),
		abilities,
		encounter_areas: String::new(),
		generation,
	})
}

/// Generation tag named by a species payload, or `unknown`.
pub fn generation_from_species(species: &SpeciesPayload) -> String {
	species
		.generation
		.as_ref()
		.map(|g| g.name.trim())
		.filter(|n| !n.is_empty())
		.unwrap_or(UNKNOWN)
		.to_string()
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Configuration for the PokeAPI client.
#[derive(Debug, Clone)]
pub struct LookupConfig {
	/// Base URL, e.g. `https://pokeapi.co/api/v2`.
	pub base_url: String,
	/// Timeout per request in seconds.
	pub timeout_secs: u64,
}

impl Default for LookupConfig {
	fn default() -> Self {
		Self {
			base_url: "https://pokeapi.co/api/v2".to_string(),
			timeout_secs: 10,
		}
	}
}

/// Blocking PokeAPI client. Requests are never retried.
pub struct PokeApiClient {
	base_url: String,
	agent: Agent,
}

impl PokeApiClient {
	pub fn new(config: LookupConfig) -> Self {
		let agent_config = Agent::config_builder()
			.timeout_global(Some(Duration::from_secs(config.timeout_secs)))
			.build();
		Self {
			base_url: config.base_url.trim_end_matches('/').to_string(),
			agent: Agent::new_with_config(agent_config),
		}
	}

	fn get_json<T: DeserializeOwned>(&self, url: &str, subject: &str) -> Result<T, LookupError> {
		tracing::debug!(%url, "GET");
		self.agent
			.get(url)
			.call()
			.map_err(|e| map_error(e, url, subject))?
			.body_mut()
			.read_json()
			.map_err(|e| map_error(e, url, subject))
	}

	/// A failed species lookup leaves the generation unknown.
	fn resolve_generation(&self, species: Option<&NamedResource>, name: &str) -> String {
		let Some(url) = species.map(|s| s.url.as_str()).filter(|u| !u.is_empty()) else {
			return UNKNOWN.to_string();
		};
		match self.get_json::<SpeciesPayload>(url, name) {
			Ok(species) => generation_from_species(&species),
			Err(e) => {
				tracing::warn!(%name, error = %e, code = e.code(), "Species lookup failed");
				UNKNOWN.to_string()
			}
		}
	}
}

impl RecordLookup for PokeApiClient {
	fn fetch(&self, key: &str) -> Result<Record, LookupError> {
		let key = normalize_key(key)?;
		let url = format!("{}/pokemon/{}", self.base_url, key);
		let payload: PokemonPayload = self.get_json(&url, &key)?;

		let name = payload.name.clone().unwrap_or_else(|| key.clone());
		let generation = self.resolve_generation(payload.species.as_ref(), &name);
		let record = record_from_payload(payload, generation)?;

		tracing::info!(name = %record.name, id = record.id, generation = %record.generation, "Record fetched");
		Ok(record)
	}

	fn list_names(&self, offset: u32, limit: u32) -> Result<Vec<String>, LookupError> {
		let limit = limit.min(MAX_LIST_LIMIT);
		if limit == 0 {
			return Ok(Vec::new());
		}
		let url = format!("{}/pokemon?limit={}&offset={}", self.base_url, limit, offset);
		let listing: ListPayload = self.get_json(&url, "pokemon listing")?;
		Ok(listing
			.results
			.into_iter()
			.map(|r| r.name)
			.filter(|n| !n.is_empty())
			.collect())
	}
}

fn map_error(err: ureq::Error, url: &str, subject: &str) -> LookupError {
	match err {
		ureq::Error::StatusCode(404) => LookupError::NotFound(subject.to_string()),
		ureq::Error::StatusCode(status) => LookupError::Http {
			status,
			url: url.to_string(),
		},
		ureq::Error::Timeout(_) => LookupError::Timeout(url.to_string()),
		ureq::Error::Io(e) if e.kind() == std::io::ErrorKind::TimedOut => {
			LookupError::Timeout(url.to_string())
		}
		ureq::Error::Json(e) => LookupError::Malformed(e.to_string()),
		other => LookupError::Connection(other.to_string()),
	}
}
