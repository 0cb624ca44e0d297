//! Plain string metrics used to compare a consensus with ground truth.
//!
//! These never see cells; they only consume the surfaced strings.

/// Upper-cases `string` and replaces the letter `O` with the digit `0`,
/// so that the two are not counted as recognition errors.
pub fn normalize_string(string: &str) -> String {
	string.to_uppercase().replace('O', "0")
}

/// Classic Levenshtein distance between `a` and `b`, over characters.
///
/// `O(|a| * |b|)` time, `O(|b|)` memory.
pub fn levenshtein(a: &str, b: &str) -> usize {
	let a: Vec<char> = a.chars().collect();
	let b: Vec<char> = b.chars().collect();
	if a.is_empty() || b.is_empty() {
		return a.len().max(b.len());
	}

	let mut previous: Vec<usize> = (0..=b.len()).collect();
	let mut current = vec![0; b.len() + 1];
	for (i, ca) in a.iter().enumerate() {
		current[0] = i + 1;
		for (j, cb) in b.iter().enumerate() {
			let substitution = previous[j] + usize::from(ca != cb);
			current[j + 1] = substitution.min(previous[j + 1] + 1).min(current[j] + 1);
		}
		std::mem::swap(&mut previous, &mut current);
	}
	previous[b.len()]
}

/// 0 if the normalized strings are equal, 1 otherwise.
pub fn end_to_end(result: &str, ideal: &str) -> u32 {
	u32::from(normalize_string(result) != normalize_string(ideal))
}

/// Levenshtein distance after normalization of both strings.
pub fn d_levenshtein(a: &str, b: &str) -> f64 {
	levenshtein(&normalize_string(a), &normalize_string(b)) as f64
}

/// Normalized Levenshtein distance `2L / (|a| + |b| + L)`, in `[0, 1]`.
///
/// Two empty strings are at distance 0.
pub fn levmetric(a: &str, b: &str) -> f64 {
	let (len_a, len_b) = (a.chars().count(), b.chars().count());
	if len_a == 0 && len_b == 0 {
		return 0.0;
	}
	let l = d_levenshtein(a, b);
	2.0 * l / (len_a as f64 + len_b as f64 + l)
}
