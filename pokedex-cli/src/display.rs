// ---------------------------------------------------------------------------
// Display and pagination
// ---------------------------------------------------------------------------
//
// Text rendering of records, search results and statistics, plus the
// interactive paginator. Everything writes to a caller-supplied `Write` and
// reads from a `BufRead`, so the session can be driven from tests.
// ---------------------------------------------------------------------------

use std::io::{self, BufRead, Write};

use pokedex_catalog::stats::CatalogStats;
use pokedex_catalog::{Record, SimilarityResult};

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const RULE_WIDTH: usize = 80;
const BAR_CELLS: usize = 10;

// ---------------------------------------------------------------------------
// Input
// ---------------------------------------------------------------------------

/// Write `label`, then read one line. `Ok(None)` at end of input.
pub fn prompt<R: BufRead, W: Write>(input: &mut R, out: &mut W, label: &str) -> io::Result<Option<String>> {
	write!(out, "{}", label)?;
	out.flush()?;
	let mut line = String::new();
	if input.read_line(&mut line)? == 0 {
		writeln!(out)?;
		return Ok(None);
	}
	Ok(Some(line.trim().to_string()))
}

pub fn rule(ch: char) -> String {
	std::iter::repeat_n(ch, RULE_WIDTH).collect()
}

pub fn capitalize(s: &str) -> String {
	let mut chars = s.chars();
	match chars.next() {
		Some(first) => first.to_uppercase().chain(chars).collect(),
		None => String::new(),
	}
}

// ---------------------------------------------------------------------------
// Records
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordFormat {
	/// One line: name, category, generation.
	Simple,
	/// Three lines.
	Detailed,
	/// Every stored field.
	Full,
}

pub fn format_record(record: &Record, index: usize, format: RecordFormat) -> String {
	let name = record.name.to_uppercase();
	let category = capitalize(&record.category);
	match format {
		RecordFormat::Simple => format!(
			" {}. {} - Type: {} | Generation: {}",
			index, name, category, record.generation
		),
		RecordFormat::Detailed => format!(
			" {}. {}\n   Type: {} | Generation: {}\n   Weight: {} | Height: {} | EXP: {}",
			index, name, category, record.generation, record.weight, record.height, record.experience
		),
		RecordFormat::Full => {
			let areas = if record.encounter_areas.trim().is_empty() {
				"N/A"
			} else {
				record.encounter_areas.as_str()
			};
			format!(
				" {}. {}\n   ├─ ID: #{}\n   ├─ Type: {}\n   ├─ Generation: {}\n   ├─ Weight: {} | Height: {}\n   ├─ Base experience: {}\n   ├─ Abilities: {}\n   └─ Encounter areas: {}",
				index,
				name,
				record.id,
				category,
				record.generation,
				record.weight,
				record.height,
				record.experience,
				record.abilities,
				areas
			)
		}
	}
}

// ---------------------------------------------------------------------------
// Search results
// ---------------------------------------------------------------------------

/// Ten-cell bar with one filled cell per full 10%.
pub fn similarity_bar(score: f64) -> String {
	let filled = ((score / 10.0).floor().max(0.0) as usize).min(BAR_CELLS);
	let mut bar = "█".repeat(filled);
	bar.push_str(&"░".repeat(BAR_CELLS - filled));
	bar
}

/// Quality label for a score band.
pub fn match_marker(score: f64) -> &'static str {
	if score >= 90.0 {
		"[excellent]"
	} else if score >= 75.0 {
		"[good]"
	} else if score >= 60.0 {
		"[fair]"
	} else {
		"[weak]"
	}
}

pub fn format_search_result(rank: usize, result: &SimilarityResult) -> String {
	let record = &result.record;
	format!(
		"{}. {} {} [{:.1}% similar]\n   {} {:.1}%\n   ├─ ID: #{}\n   ├─ Type: {}\n   ├─ Generation: {}\n   ├─ Weight: {} | Height: {}\n   ├─ Base experience: {}\n   └─ Abilities: {}",
		rank,
		match_marker(result.score),
		record.name.to_uppercase(),
		result.score,
		similarity_bar(result.score),
		result.score,
		record.id,
		capitalize(&record.category),
		record.generation,
		record.weight,
		record.height,
		record.experience,
		record.abilities
	)
}

// ---------------------------------------------------------------------------
// Statistics
// ---------------------------------------------------------------------------

pub fn write_stats<W: Write>(out: &mut W, stats: &CatalogStats) -> io::Result<()> {
	writeln!(out, "\n{}", rule('='))?;
	writeln!(out, "POKEDEX STATISTICS")?;
	writeln!(out, "{}", rule('='))?;
	writeln!(out, "\nTotal Pokemon: {}", stats.total)?;
	writeln!(out, "Average weight: {:.2}", stats.average_weight)?;
	writeln!(out, "Average height: {:.2}", stats.average_height)?;

	writeln!(out, "\nBy type:")?;
	for (category, count) in &stats.by_category {
		writeln!(out, "   └─ {}: {}", capitalize(category), count)?;
	}
	writeln!(out, "\nBy generation:")?;
	for (generation, count) in &stats.by_generation {
		writeln!(out, "   └─ {}: {}", generation, count)?;
	}
	writeln!(out, "{}\n", rule('='))
}

// ---------------------------------------------------------------------------
// Pagination
// ---------------------------------------------------------------------------

/// Result of one keystroke in the paginator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Navigation {
	Go(usize),
	Exit,
	AlreadyFirst,
	InvalidPage,
	Unrecognized,
}

/// Decide where `input` moves from 1-based page `current` of `pages`.
///
/// Enter advances and wraps to page 1 after the last, `a` goes back, a
/// number jumps (only with more than two pages), `s` leaves.
pub fn navigate(current: usize, pages: usize, input: &str) -> Navigation {
	let input = input.trim().to_lowercase();
	match input.as_str() {
		"" if current < pages => Navigation::Go(current + 1),
		"" => Navigation::Go(1),
		"s" if pages >= 2 => Navigation::Exit,
		"a" if current > 1 => Navigation::Go(current - 1),
		"a" => Navigation::AlreadyFirst,
		n if pages > 2 && !n.is_empty() && n.chars().all(|c| c.is_ascii_digit()) => match n.parse() {
			Ok(page) if (1..=pages).contains(&page) => Navigation::Go(page),
			_ => Navigation::InvalidPage,
		},
		_ => Navigation::Unrecognized,
	}
}

fn controls(current: usize, pages: usize) -> String {
	let mut controls = vec![if current < pages {
		"Enter = Next"
	} else {
		"Enter = Back to page 1"
	}];
	if current > 1 {
		controls.push("A = Previous");
	}
	if pages > 2 {
		controls.push("[Number] = Go to page");
	}
	if pages >= 2 {
		controls.push("S = Exit");
	}
	controls.join(" | ")
}

fn valid_options(current: usize, pages: usize) -> String {
	let mut options = vec!["Enter"];
	if current > 1 {
		options.push("A (previous)");
	}
	if pages > 2 {
		options.push("[number] (go to page)");
	}
	if pages >= 2 {
		options.push("S (exit)");
	}
	options.join(", ")
}

pub struct Paginator {
	page_size: usize,
}

impl Default for Paginator {
	fn default() -> Self {
		Self::new(DEFAULT_PAGE_SIZE)
	}
}

impl Paginator {
	/// A zero page size falls back to the default.
	pub fn new(page_size: usize) -> Self {
		let page_size = if page_size == 0 { DEFAULT_PAGE_SIZE } else { page_size };
		Self { page_size }
	}

	pub fn page_size(&self) -> usize {
		self.page_size
	}

	pub fn page_count(&self, total: usize) -> usize {
		total.div_ceil(self.page_size)
	}

	/// Show `records` page by page until the user leaves or input ends.
	pub fn show<R: BufRead, W: Write>(
		&self,
		records: &[Record],
		title: &str,
		format: RecordFormat,
		input: &mut R,
		out: &mut W,
	) -> io::Result<()> {
		if records.is_empty() {
			return writeln!(out, "\nNo Pokemon to show.");
		}

		let total = records.len();
		if total <= self.page_size {
			write_page(out, records, 1, &format!("{}\nShowing {} Pokemon", title, total), format)?;
			prompt(input, out, "\nPress Enter to continue...")?;
			return Ok(());
		}

		let pages = self.page_count(total);
		let mut current = 1;
		loop {
			let start = (current - 1) * self.page_size;
			let end = (start + self.page_size).min(total);
			let heading = format!(
				"{}\nPage {} of {}\nShowing {}-{} of {} Pokemon",
				title,
				current,
				pages,
				start + 1,
				end,
				total
			);
			write_page(out, &records[start..end], start + 1, &heading, format)?;
			writeln!(out, "{}", controls(current, pages))?;
			writeln!(out, "{}", rule('-'))?;

			let Some(choice) = prompt(input, out, "\nSelect an option: ")? else {
				return Ok(());
			};
			match navigate(current, pages, &choice) {
				Navigation::Go(page) => current = page,
				Navigation::Exit => return Ok(()),
				Navigation::AlreadyFirst => writeln!(out, "\nAlready on the first page.")?,
				Navigation::InvalidPage => {
					writeln!(out, "\nInvalid page. It must be between 1 and {}.", pages)?
				}
				Navigation::Unrecognized => {
					writeln!(out, "\nOption \"{}\" not recognized.", choice)?;
					writeln!(out, "Valid options: {}", valid_options(current, pages))?;
				}
			}
		}
	}
}

fn write_page<W: Write>(
	out: &mut W,
	records: &[Record],
	first_index: usize,
	heading: &str,
	format: RecordFormat,
) -> io::Result<()> {
	writeln!(out, "\n{}", rule('='))?;
	writeln!(out, "{}", heading)?;
	writeln!(out, "{}\n", rule('='))?;
	for (offset, record) in records.iter().enumerate() {
		writeln!(out, "{}", format_record(record, first_index + offset, format))?;
	}
	writeln!(out, "\n{}", rule('-'))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
