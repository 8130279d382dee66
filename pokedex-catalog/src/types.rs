use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize};

use crate::error::CatalogError;

/// Placeholder for an absent generation or an absent field value.
pub const UNKNOWN: &str = "unknown";
/// Stored in `abilities` when a record has none.
pub const NO_ABILITIES: &str = "none";

// ---------------------------------------------------------------------------
// Record
// ---------------------------------------------------------------------------

/// One catalog entry. `name` is the case-insensitive identity key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
	pub id: u32,
	pub name: String,
	pub category: String,
	pub height: u32,
	pub weight: u32,
	#[serde(default, deserialize_with = "zero_if_blank")]
	pub experience: u32,
	#[serde(default)]
	pub abilities: String,
	#[serde(default)]
	pub encounter_areas: String,
	#[serde(default = "unknown_generation", deserialize_with = "unknown_if_blank")]
	pub generation: String,
}

fn unknown_generation() -> String {
	UNKNOWN.to_string()
}

fn zero_if_blank<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	let trimmed = raw.trim();
	if trimmed.is_empty() {
		return Ok(0);
	}
	trimmed.parse().map_err(serde::de::Error::custom)
}

fn unknown_if_blank<'de, D>(deserializer: D) -> Result<String, D::Error>
where
	D: Deserializer<'de>,
{
	let raw = String::deserialize(deserializer)?;
	if raw.trim().is_empty() {
		Ok(unknown_generation())
	} else {
		Ok(raw)
	}
}

impl Record {
	/// Case-insensitive identity comparison.
	pub fn has_name(&self, name: &str) -> bool {
		names_match(&self.name, name)
	}

	/// Check the fields every stored record must carry.
	pub fn validate(&self) -> Result<(), CatalogError> {
		if self.id == 0 {
			return Err(CatalogError::InvalidRecord(format!(
				"{}: id must be a positive integer",
				self.name
			)));
		}
		if self.name.trim().is_empty() {
			return Err(CatalogError::InvalidRecord("name is empty".into()));
		}
		Partition::of(self).map(|_| ())
	}
}

pub(crate) fn names_match(a: &str, b: &str) -> bool {
	a.to_lowercase() == b.to_lowercase()
}

// ---------------------------------------------------------------------------
// Partition
// ---------------------------------------------------------------------------

/// Physical grouping key; maps to `<root>/<generation>/<category>/`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Partition {
	pub generation: String,
	pub category: String,
}

impl Partition {
	pub fn new(generation: &str, category: &str) -> Result<Self, CatalogError> {
		check_component("generation", generation)?;
		check_component("category", category)?;
		Ok(Self {
			generation: generation.to_string(),
			category: category.to_string(),
		})
	}

	pub fn of(record: &Record) -> Result<Self, CatalogError> {
		Self::new(&record.generation, &record.category)
	}
}

impl fmt::Display for Partition {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.generation, self.category)
	}
}

/// A partition key component becomes one directory name.
fn check_component(label: &str, value: &str) -> Result<(), CatalogError> {
	let invalid = value.trim().is_empty()
		|| value == "."
		|| value == ".."
		|| value.contains(['/', '\\']);
	if invalid {
		return Err(CatalogError::InvalidRecord(format!(
			"{} '{}' cannot be used as a partition name",
			label, value
		)));
	}
	Ok(())
}

// ---------------------------------------------------------------------------
// Fields
// ---------------------------------------------------------------------------

/// Every column of a record, in on-disk order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordField {
	Id,
	Name,
	Category,
	Height,
	Weight,
	Experience,
	Abilities,
	EncounterAreas,
	Generation,
}

impl RecordField {
	pub const ALL: [RecordField; 9] = [
		Self::Id,
		Self::Name,
		Self::Category,
		Self::Height,
		Self::Weight,
		Self::Experience,
		Self::Abilities,
		Self::EncounterAreas,
		Self::Generation,
	];

	/// Column name in the segment header.
	pub fn column(self) -> &'static str {
		match self {
			Self::Id => "id",
			Self::Name => "name",
			Self::Category => "category",
			Self::Height => "height",
			Self::Weight => "weight",
			Self::Experience => "experience",
			Self::Abilities => "abilities",
			Self::EncounterAreas => "encounter_areas",
			Self::Generation => "generation",
		}
	}

	/// The field rendered as it is stored.
	pub fn value_of(self, record: &Record) -> String {
		match self {
			Self::Id => record.id.to_string(),
			Self::Name => record.name.clone(),
			Self::Category => record.category.clone(),
			Self::Height => record.height.to_string(),
			Self::Weight => record.weight.to_string(),
			Self::Experience => record.experience.to_string(),
			Self::Abilities => record.abilities.clone(),
			Self::EncounterAreas => record.encounter_areas.clone(),
			Self::Generation => record.generation.clone(),
		}
	}
}

impl fmt::Display for RecordField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.column())
	}
}

impl FromStr for RecordField {
	type Err = CatalogError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let key = s.trim().to_lowercase();
		match key.as_str() {
			"type" => return Ok(Self::Category),
			"base_experience" => return Ok(Self::Experience),
			_ => {}
		}
		Self::ALL
			.into_iter()
			.find(|f| f.column() == key)
			.ok_or_else(|| CatalogError::InvalidField(s.trim().to_string()))
	}
}

/// The allow-list of fields that may change after a record is stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EditableField {
	Weight,
	Height,
	Abilities,
	EncounterAreas,
	Experience,
}

impl EditableField {
	pub const ALL: [EditableField; 5] = [
		Self::Weight,
		Self::Height,
		Self::Abilities,
		Self::EncounterAreas,
		Self::Experience,
	];

	pub fn field(self) -> RecordField {
		match self {
			Self::Weight => RecordField::Weight,
			Self::Height => RecordField::Height,
			Self::Abilities => RecordField::Abilities,
			Self::EncounterAreas => RecordField::EncounterAreas,
			Self::Experience => RecordField::Experience,
		}
	}

	pub fn column(self) -> &'static str {
		self.field().column()
	}

	/// Validate a user-supplied value and return the string to store.
	///
	/// Numeric fields accept non-negative integers only. Blank abilities are
	/// stored as `none`; encounter areas may be blank.
	pub fn normalize(self, raw: &str) -> Result<String, CatalogError> {
		let value = raw.trim();
		match self {
			Self::Weight | Self::Height | Self::Experience => value
				.parse::<u32>()
				.map(|n| n.to_string())
				.map_err(|_| CatalogError::InvalidValue {
					field: self.column().to_string(),
					reason: format!("'{}' is not a non-negative integer", value),
				}),
			Self::Abilities if value.is_empty() => Ok(NO_ABILITIES.to_string()),
			Self::Abilities | Self::EncounterAreas => Ok(value.to_string()),
		}
	}
}

impl fmt::Display for EditableField {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.column())
	}
}

impl FromStr for EditableField {
	type Err = CatalogError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		let field = s.parse::<RecordField>()?;
		Self::ALL
			.into_iter()
			.find(|e| e.field() == field)
			.ok_or_else(|| CatalogError::InvalidField(field.column().to_string()))
	}
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// A record paired with its similarity score in `[0, 100]`.
#[derive(Debug, Clone, PartialEq)]
pub struct SimilarityResult {
	pub record: Record,
	pub score: f64,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
