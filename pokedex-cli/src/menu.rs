// ---------------------------------------------------------------------------
// Menu session
// ---------------------------------------------------------------------------
//
// The numbered main menu and one handler per option. A session reads lines
// from any `BufRead` and writes to any `Write`; it ends on option 9 or at
// end of input. Failures inside an option are reported and the menu is
// shown again.
// ---------------------------------------------------------------------------

use std::fmt;
use std::io::{self, BufRead, Write};

use pokedex_catalog::filter::{count_by_ignore_case, filter_by};
use pokedex_catalog::search::{is_searchable, search, MIN_QUERY_LEN};
use pokedex_catalog::stats::summarize;
use pokedex_catalog::{CatalogError, CatalogStore, EditableField, Record, RecordField};

use crate::display::{
	capitalize, format_search_result, prompt, rule, write_stats, Paginator, RecordFormat,
};
use crate::error::LookupError;
use crate::import::{fetch_and_store, FetchOutcome, ImportError};
use crate::lookup::RecordLookup;

// ---------------------------------------------------------------------------
// Choice parsing
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MenuChoice {
	Add,
	ListAll,
	Search,
	FilterByGeneration,
	FilterByCategory,
	Edit,
	Delete,
	Statistics,
	Quit,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChoiceError {
	Empty,
	NotANumber(String),
	OutOfRange(u64),
}

impl fmt::Display for ChoiceError {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			Self::Empty => f.write_str("You must choose an option."),
			Self::NotANumber(_) => f.write_str("Invalid option. Enter a number from 1 to 9."),
			Self::OutOfRange(_) => f.write_str("Invalid option. Choose a number between 1 and 9."),
		}
	}
}

impl MenuChoice {
	const ORDER: [MenuChoice; 9] = [
		Self::Add,
		Self::ListAll,
		Self::Search,
		Self::FilterByGeneration,
		Self::FilterByCategory,
		Self::Edit,
		Self::Delete,
		Self::Statistics,
		Self::Quit,
	];

	pub fn parse(input: &str) -> Result<Self, ChoiceError> {
		let input = input.trim();
		if input.is_empty() {
			return Err(ChoiceError::Empty);
		}
		if !input.chars().all(|c| c.is_ascii_digit()) {
			return Err(ChoiceError::NotANumber(input.to_string()));
		}
		let n: u64 = input
			.parse()
			.map_err(|_| ChoiceError::NotANumber(input.to_string()))?;
		match n {
			1..=9 => Ok(Self::ORDER[(n - 1) as usize]),
			_ => Err(ChoiceError::OutOfRange(n)),
		}
	}

	pub fn label(self) -> &'static str {
		match self {
			Self::Add => "Add Pokemon",
			Self::ListAll => "Show all",
			Self::Search => "Search by name",
			Self::FilterByGeneration => "Filter by generation",
			Self::FilterByCategory => "Filter by type",
			Self::Edit => "Edit Pokemon",
			Self::Delete => "Delete Pokemon",
			Self::Statistics => "Statistics",
			Self::Quit => "Quit",
		}
	}
}

/// Whether the session keeps going after a handler returns.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
	Continue,
	Stop,
}

// ---------------------------------------------------------------------------
// Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct SessionConfig {
	pub page_size: usize,
	pub search_threshold: f64,
}

impl Default for SessionConfig {
	fn default() -> Self {
		Self {
			page_size: crate::display::DEFAULT_PAGE_SIZE,
			search_threshold: pokedex_catalog::search::DEFAULT_THRESHOLD,
		}
	}
}

pub struct Session<'a, L: RecordLookup + ?Sized, R: BufRead, W: Write> {
	store: &'a CatalogStore,
	lookup: &'a L,
	input: R,
	out: W,
	paginator: Paginator,
	threshold: f64,
}

impl<'a, L: RecordLookup + ?Sized, R: BufRead, W: Write> Session<'a, L, R, W> {
	pub fn new(store: &'a CatalogStore, lookup: &'a L, input: R, out: W, config: SessionConfig) -> Self {
		Self {
			store,
			lookup,
			input,
			out,
			paginator: Paginator::new(config.page_size),
			threshold: config.search_threshold,
		}
	}

	/// Run the menu loop until the user quits or input ends.
	pub fn run(&mut self) -> io::Result<()> {
		writeln!(self.out, "\n{}", rule('='))?;
		writeln!(self.out, "POKEDEX")?;
		writeln!(self.out, "{}", rule('='))?;

		loop {
			self.write_menu()?;
			let Some(line) = prompt(&mut self.input, &mut self.out, "Choose an option: ")? else {
				break;
			};
			let choice = match MenuChoice::parse(&line) {
				Ok(choice) => choice,
				Err(e) => {
					writeln!(self.out, "\nNOTICE: {}\n", e)?;
					continue;
				}
			};
			tracing::debug!(?choice, "Menu option selected");

			let flow = match choice {
				MenuChoice::Add => self.add()?,
				MenuChoice::ListAll => self.list_all()?,
				MenuChoice::Search => self.search()?,
				MenuChoice::FilterByGeneration => self.filter(RecordField::Generation, "generation")?,
				MenuChoice::FilterByCategory => self.filter(RecordField::Category, "type")?,
				MenuChoice::Edit => self.edit()?,
				MenuChoice::Delete => self.delete()?,
				MenuChoice::Statistics => self.statistics()?,
				MenuChoice::Quit => break,
			};
			if flow == Flow::Stop {
				break;
			}
		}

		writeln!(self.out, "\n{}", rule('='))?;
		writeln!(self.out, "Thanks for using the Pokedex")?;
		writeln!(self.out, "{}", rule('='))?;
		self.out.flush()
	}

	fn write_menu(&mut self) -> io::Result<()> {
		writeln!(self.out)?;
		for (i, choice) in MenuChoice::ORDER.iter().enumerate() {
			writeln!(self.out, "{}. {}", i + 1, choice.label())?;
		}
		Ok(())
	}

	fn ask(&mut self, label: &str) -> io::Result<Option<String>> {
		prompt(&mut self.input, &mut self.out, label)
	}

	fn report(&mut self, err: &CatalogError) -> io::Result<Flow> {
		tracing::error!(error = %err, code = err.code(), "Catalog operation failed");
		writeln!(self.out, "\n[Error {}] {}\n", err.code(), err)?;
		Ok(Flow::Continue)
	}

	/// Every stored record, or `None` after telling the user there are none.
	fn load_records(&mut self) -> io::Result<Result<Option<Vec<Record>>, CatalogError>> {
		let records = match self.store.scan_all() {
			Ok(records) => records,
			Err(e) => return Ok(Err(e)),
		};
		if records.is_empty() {
			writeln!(self.out, "\nNo Pokemon stored yet.\n")?;
			return Ok(Ok(None));
		}
		Ok(Ok(Some(records)))
	}

	// -- 1 --------------------------------------------------------------------

	fn add(&mut self) -> io::Result<Flow> {
		let Some(name) = self.ask("Pokemon name: ")? else {
			return Ok(Flow::Stop);
		};
		if name.is_empty() {
			writeln!(self.out, "\nYou must enter a valid name.\n")?;
			return Ok(Flow::Continue);
		}

		writeln!(self.out, "\nLooking up '{}'...", name.to_lowercase())?;
		match fetch_and_store(self.store, self.lookup, &name) {
			Ok(FetchOutcome { record, inserted: true }) => {
				writeln!(self.out, "\n{} added to the Pokedex.\n", capitalize(&record.name))?
			}
			Ok(FetchOutcome { record, inserted: false }) => {
				writeln!(self.out, "\n{} is already in the Pokedex.\n", capitalize(&record.name))?
			}
			Err(ImportError::Lookup(LookupError::NotFound(_))) => {
				writeln!(self.out, "\n'{}' was not found. Check the name and try again.\n", name)?
			}
			Err(ImportError::Lookup(e)) => {
				tracing::warn!(%name, error = %e, code = e.code(), "Lookup failed");
				writeln!(self.out, "\nCould not add '{}': {}\n", name, e)?
			}
			Err(ImportError::Catalog(e)) => return self.report(&e),
		}
		Ok(Flow::Continue)
	}

	// -- 2 --------------------------------------------------------------------

	fn list_all(&mut self) -> io::Result<Flow> {
		let records = match self.load_records()? {
			Ok(Some(records)) => records,
			Ok(None) => return Ok(Flow::Continue),
			Err(e) => return self.report(&e),
		};
		self.paginator.show(
			&records,
			"ALL POKEMON IN THE POKEDEX",
			RecordFormat::Full,
			&mut self.input,
			&mut self.out,
		)?;
		Ok(Flow::Continue)
	}

	// -- 3 --------------------------------------------------------------------

	fn search(&mut self) -> io::Result<Flow> {
		let Some(query) = self.ask("Name to search (at least 3 characters): ")? else {
			return Ok(Flow::Stop);
		};
		if !is_searchable(&query) {
			writeln!(self.out, "\nEnter at least {} characters to search.\n", MIN_QUERY_LEN)?;
			return Ok(Flow::Continue);
		}

		let results = match search(self.store, &query, self.threshold) {
			Ok(results) => results,
			Err(e) => return self.report(&e),
		};
		let Some(best) = results.first() else {
			writeln!(self.out, "\nNo Pokemon similar to '{}' were found.\n", query)?;
			return Ok(Flow::Continue);
		};

		writeln!(self.out, "\n{}", rule('='))?;
		writeln!(self.out, "SEARCH RESULTS: '{}'", query.to_uppercase())?;
		writeln!(self.out, "{}", rule('='))?;
		writeln!(self.out, "{} match(es) found\n", results.len())?;
		for (i, result) in results.iter().enumerate() {
			writeln!(self.out, "{}\n", format_search_result(i + 1, result))?;
		}
		writeln!(self.out, "{}", rule('='))?;
		writeln!(
			self.out,
			"Best match: {} ({:.1}%)\n",
			capitalize(&best.record.name),
			best.score
		)?;
		Ok(Flow::Continue)
	}

	// -- 4 / 5 ----------------------------------------------------------------

	fn filter(&mut self, field: RecordField, label: &str) -> io::Result<Flow> {
		let records = match self.load_records()? {
			Ok(Some(records)) => records,
			Ok(None) => return Ok(Flow::Continue),
			Err(e) => return self.report(&e),
		};
		let counts = count_by_ignore_case(&records, field);

		writeln!(self.out, "\n{}", rule('='))?;
		writeln!(self.out, "FILTER BY {}", label.to_uppercase())?;
		writeln!(self.out, "{}", rule('='))?;
		for (i, (value, count)) in counts.iter().enumerate() {
			writeln!(self.out, "  {}. {} ({} Pokemon)", i + 1, value, count)?;
		}
		let back = counts.len() + 1;
		writeln!(self.out, "  {}. Back", back)?;

		let Some(line) = self.ask(&format!("\nSelect a {} (1-{}): ", label, back))? else {
			return Ok(Flow::Stop);
		};
		let index = match line.parse::<usize>() {
			Ok(n) if n == back => return Ok(Flow::Continue),
			Ok(n) if (1..back).contains(&n) => n - 1,
			_ => {
				writeln!(self.out, "\nInvalid option. Choose a number between 1 and {}.\n", back)?;
				return Ok(Flow::Continue);
			}
		};

		let value = &counts[index].0;
		let matches: Vec<Record> = filter_by(&records, field, value).into_iter().cloned().collect();
		let title = format!("{}: {}", label.to_uppercase(), value);
		self.paginator.show(
			&matches,
			&title,
			RecordFormat::Detailed,
			&mut self.input,
			&mut self.out,
		)?;
		Ok(Flow::Continue)
	}

	// -- 6 --------------------------------------------------------------------

	fn edit(&mut self) -> io::Result<Flow> {
		let Some(name) = self.ask("Name of the Pokemon to edit: ")? else {
			return Ok(Flow::Stop);
		};
		if name.is_empty() {
			writeln!(self.out, "\nYou must enter a valid name.\n")?;
			return Ok(Flow::Continue);
		}

		writeln!(self.out, "\nEditable fields:")?;
		for field in EditableField::ALL {
			writeln!(self.out, "  - {}", field)?;
		}
		let Some(field) = self.ask("\nField to edit: ")? else {
			return Ok(Flow::Stop);
		};
		let field = match field.parse::<EditableField>() {
			Ok(field) => field,
			Err(e) => {
				writeln!(self.out, "\n{}\n", e)?;
				return Ok(Flow::Continue);
			}
		};
		let Some(value) = self.ask("New value: ")? else {
			return Ok(Flow::Stop);
		};

		match self.store.update_field(&name, field, &value) {
			Ok(true) => writeln!(self.out, "\n{} updated.\n", capitalize(&name.to_lowercase()))?,
			Ok(false) => writeln!(self.out, "\nPokemon '{}' not found.\n", name)?,
			Err(e) if e.is_user_error() => writeln!(self.out, "\n{}\n", e)?,
			Err(e) => return self.report(&e),
		}
		Ok(Flow::Continue)
	}

	// -- 7 --------------------------------------------------------------------

	fn delete(&mut self) -> io::Result<Flow> {
		let Some(name) = self.ask("Name of the Pokemon to delete: ")? else {
			return Ok(Flow::Stop);
		};
		if name.is_empty() {
			writeln!(self.out, "\nYou must enter a valid name.\n")?;
			return Ok(Flow::Continue);
		}

		let label = format!("Are you sure you want to delete {}? (y/n): ", capitalize(&name.to_lowercase()));
		let Some(confirm) = self.ask(&label)? else {
			return Ok(Flow::Stop);
		};
		if !confirm.eq_ignore_ascii_case("y") {
			writeln!(self.out, "\nDeletion cancelled.\n")?;
			return Ok(Flow::Continue);
		}

		match self.store.delete(&name) {
			Ok(true) => writeln!(self.out, "\n{} deleted.\n", capitalize(&name.to_lowercase()))?,
			Ok(false) => writeln!(self.out, "\nPokemon '{}' not found.\n", name)?,
			Err(e) => return self.report(&e),
		}
		Ok(Flow::Continue)
	}

	// -- 8 --------------------------------------------------------------------

	fn statistics(&mut self) -> io::Result<Flow> {
		let records = match self.load_records()? {
			Ok(Some(records)) => records,
			Ok(None) => return Ok(Flow::Continue),
			Err(e) => return self.report(&e),
		};
		write_stats(&mut self.out, &summarize(&records))?;
		Ok(Flow::Continue)
	}
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
	use super::*;

	struct Offline;

	impl RecordLookup for Offline {
		fn fetch(&self, key: &str) -> Result<Record, LookupError> {
			match key.trim().to_lowercase().as_str() {
				"pichu" | "172" => Ok(Record {
					id: 172,
					name: "pichu".into(),
					category: "electric".into(),
					height: 3,
					weight: 20,
					experience: 41,
					abilities: "static, lightning-rod".into(),
					encounter_areas: String::new(),
					generation: "generation-ii".into(),
				}),
				"slow" => Err(LookupError::Timeout("slow".into())),
				other => Err(LookupError::NotFound(other.to_string())),
			}
		}

		fn list_names(&self, _offset: u32, _limit: u32) -> Result<Vec<String>, LookupError> {
			Ok(Vec::new())
		}
	}

	fn record(id: u32, name: &str, category: &str, generation: &str) -> Record {
		Record {
			id,
			name: name.to_string(),
			category: category.to_string(),
			height: 4,
			weight: 60,
			experience: 112,
			abilities: "static".to_string(),
			encounter_areas: String::new(),
			generation: generation.to_string(),
		}
	}

	fn seeded() -> (tempfile::TempDir, CatalogStore) {
		let dir = tempfile::tempdir().unwrap();
		let store = CatalogStore::open(dir.path()).unwrap();
		store.put(&record(25, "pikachu", "electric", "generation-i")).unwrap();
		store.put(&record(26, "raichu", "electric", "generation-i")).unwrap();
		store.put(&record(7, "squirtle", "water", "generation-i")).unwrap();
		(dir, store)
	}

	fn drive(store: &CatalogStore, keys: &str) -> String {
		let mut out = Vec::new();
		Session::new(store, &Offline, keys.as_bytes(), &mut out, SessionConfig::default())
			.run()
			.unwrap();
		String::from_utf8(out).unwrap()
	}

	#[test]
	fn parse_choices() {
		assert_eq!(MenuChoice::parse("1"), Ok(MenuChoice::Add));
		assert_eq!(MenuChoice::parse(" 9 "), Ok(MenuChoice::Quit));
		assert_eq!(MenuChoice::parse(""), Err(ChoiceError::Empty));
		assert_eq!(MenuChoice::parse("abc"), Err(ChoiceError::NotANumber("abc".into())));
		assert_eq!(MenuChoice::parse("-1"), Err(ChoiceError::NotANumber("-1".into())));
		assert_eq!(MenuChoice::parse("0"), Err(ChoiceError::OutOfRange(0)));
		assert_eq!(MenuChoice::parse("10"), Err(ChoiceError::OutOfRange(10)));
		assert!(matches!(
			MenuChoice::parse("99999999999999999999999"),
			Err(ChoiceError::NotANumber(_))
		));
	}

	#[test]
	fn invalid_input_shows_menu_again() {
		let (_dir, store) = seeded();
		let out = drive(&store, "\nabc\n12\n9\n");
		assert!(out.contains("You must choose an option."));
		assert!(out.contains("Enter a number from 1 to 9."));
		assert!(out.contains("Choose a number between 1 and 9."));
		assert_eq!(out.matches("9. Quit").count(), 4);
		assert!(out.contains("Thanks for using the Pokedex"));
	}

	#[test]
	fn end_of_input_ends_session() {
		let (_dir, store) = seeded();
		let out = drive(&store, "");
		assert!(out.contains("Thanks for using the Pokedex"));
	}

	#[test]
	fn list_all_shows_every_record() {
		let (_dir, store) = seeded();
		let out = drive(&store, "2\n\n9\n");
		assert!(out.contains("Showing 3 Pokemon"));
		assert!(out.contains("PIKACHU"));
		assert!(out.contains("RAICHU"));
		assert!(out.contains("SQUIRTLE"));
	}

	#[test]
	fn search_reports_ranked_results() {
		let (_dir, store) = seeded();
		let out = drive(&store, "3\npika\n9\n");
		assert!(out.contains("1 match(es) found"));
		assert!(out.contains("[excellent] PIKACHU [90.0% similar]"));
		assert!(out.contains("Best match: Pikachu (90.0%)"));

		let out = drive(&store, "3\npi\n9\n");
		assert!(out.contains("Enter at least 3 characters"));
	}

	#[test]
	fn filter_by_category_lists_matches() {
		let (_dir, store) = seeded();
		let out = drive(&store, "5\n1\n\n9\n");
		assert!(out.contains("1. electric (2 Pokemon)"));
		assert!(out.contains("2. water (1 Pokemon)"));
		assert!(out.contains("3. Back"));
		assert!(out.contains("TYPE: electric"));
		assert!(out.contains(" 1. PIKACHU"));
		assert!(out.contains(" 2. RAICHU"));

		let out = drive(&store, "4\n2\n9\n");
		assert!(out.contains("1. generation-i (3 Pokemon)"));
		assert!(!out.contains("GENERATION: "));
	}

	#[test]
	fn edit_updates_allowed_field() {
		let (_dir, store) = seeded();
		let out = drive(&store, "6\nPikachu\nweight\n75\n9\n");
		assert!(out.contains("Pikachu updated."));
		let pikachu = store
			.scan_all()
			.unwrap()
			.into_iter()
			.find(|r| r.has_name("pikachu"))
			.unwrap();
		assert_eq!(pikachu.weight, 75);

		let out = drive(&store, "6\npikachu\nname\n");
		assert!(out.contains("Field is not editable: name"));

		let out = drive(&store, "6\npikachu\nheight\ntall\n9\n");
		assert!(out.contains("Invalid value for height"));
	}

	#[test]
	fn delete_requires_confirmation() {
		let (_dir, store) = seeded();
		let out = drive(&store, "7\nraichu\nn\n9\n");
		assert!(out.contains("Deletion cancelled."));
		assert_eq!(store.scan_all().unwrap().len(), 3);

		let out = drive(&store, "7\nraichu\ny\n7\nraichu\ny\n9\n");
		assert!(out.contains("Raichu deleted."));
		assert!(out.contains("Pokemon 'raichu' not found."));
		assert_eq!(store.scan_all().unwrap().len(), 2);
	}

	#[test]
	fn add_uses_lookup() {
		let (_dir, store) = seeded();
		let out = drive(&store, "1\nPichu\n1\npichu\n1\nmissingno\n1\nslow\n9\n");
		assert!(out.contains("Pichu added to the Pokedex."));
		assert!(out.contains("Pichu is already in the Pokedex."));
		assert!(out.contains("'missingno' was not found."));
		assert!(out.contains("Could not add 'slow'"));
		assert_eq!(store.scan_all().unwrap().len(), 4);
	}

	#[test]
	fn add_by_id_names_the_fetched_record() {
		let (_dir, store) = seeded();
		let out = drive(&store, "1\n172\n1\n172\n9\n");
		assert!(out.contains("Pichu added to the Pokedex."));
		assert!(out.contains("Pichu is already in the Pokedex."));
		assert!(!out.contains("172 added"));
		assert!(!out.contains("172 is already"));
	}

	#[test]
	fn filter_groups_values_that_differ_in_case() {
		let (_dir, store) = seeded();
		store.put(&record(179, "Mareep", "Electric", "generation-ii")).unwrap();
		let out = drive(&store, "5\n1\n\n9\n");
		assert!(out.contains("1. Electric (3 Pokemon)"));
		assert!(out.contains("2. water (1 Pokemon)"));
		assert!(out.contains("3. Back"));
		assert!(out.contains("Showing 3 Pokemon"));
	}

	#[test]
	fn statistics_summary() {
		let (_dir, store) = seeded();
		let out = drive(&store, "8\n9\n");
		assert!(out.contains("Total Pokemon: 3"));
		assert!(out.contains("   └─ Electric: 2"));
		assert!(out.contains("   └─ generation-i: 3"));
	}

	#[test]
	fn empty_catalog_messages() {
		let dir = tempfile::tempdir().unwrap();
		let store = CatalogStore::open(dir.path()).unwrap();
		let out = drive(&store, "2\n8\n4\n9\n");
		assert_eq!(out.matches("No Pokemon stored yet.").count(), 3);
	}
}
