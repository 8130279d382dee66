// ---------------------------------------------------------------------------
// Name similarity
// ---------------------------------------------------------------------------
//
// Percentage similarity between two names, built on unit-cost Levenshtein
// distance with a fixed score for substring matches.
// ---------------------------------------------------------------------------

/// Score given when one name contains the other.
pub const SUBSTRING_SCORE: f64 = 90.0;
/// Score of two identical (case-insensitive) names.
pub const EXACT_SCORE: f64 = 100.0;

/// Compute the Levenshtein edit-distance between two strings.
///
/// Uses the classic Wagner-Fischer dynamic-programming algorithm with a
/// single rolling row of O(min(a, b)) space. Operates on chars.
pub fn levenshtein_distance(a: &str, b: &str) -> usize {
	let a_chars: Vec<char> = a.chars().collect();
	let b_chars: Vec<char> = b.chars().collect();

	// Keep the shorter string in the row.
	let (short, long) = if a_chars.len() > b_chars.len() {
		(b_chars, a_chars)
	} else {
		(a_chars, b_chars)
	};

	if short.is_empty() {
		return long.len();
	}

	let mut prev: Vec<usize> = (0..=short.len()).collect();
	let mut curr: Vec<usize> = vec![0; short.len() + 1];

	for (j, lc) in long.iter().enumerate() {
		curr[0] = j + 1;
		for (i, sc) in short.iter().enumerate() {
			let cost = usize::from(sc != lc);
			curr[i + 1] = (curr[i] + 1).min(prev[i + 1] + 1).min(prev[i] + cost);
		}
		std::mem::swap(&mut prev, &mut curr);
	}

	prev[short.len()]
}

/// Similarity of two names as a percentage in `[0, 100]`, ignoring case.
///
/// Evaluated in order:
/// 1. either name empty: 0
/// 2. identical names: 100
/// 3. one name contains the other: a flat 90, even where the edit distance
///    alone would rate the pair higher (`"abcdefghij"` in `"abcdefghijk"`)
/// 4. otherwise `(max_len - distance) / max_len * 100`
pub fn similarity(a: &str, b: &str) -> f64 {
	let a = a.to_lowercase();
	let b = b.to_lowercase();

	if a.is_empty() || b.is_empty() {
		return 0.0;
	}
	if a == b {
		return EXACT_SCORE;
	}
	if a.contains(&b) || b.contains(&a) {
		return SUBSTRING_SCORE;
	}

	let max_len = a.chars().count().max(b.chars().count());
	let distance = levenshtein_distance(&a, &b);
	(max_len - distance) as f64 / max_len as f64 * 100.0
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
