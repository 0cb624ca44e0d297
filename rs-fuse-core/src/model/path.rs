use crate::error::Result;
use super::cell::{Cell, cell_dist};

/// A single move of an alignment between a base sequence and an input.
///
/// Indices are 0-based positions in the base and in the input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
	/// Base cell and input cell are aligned together.
	Matched { base: usize, input: usize },
	/// Base cell is aligned with a gap ('deletion').
	UnmatchedBase { base: usize },
	/// Input cell is aligned with a gap ('insertion').
	UnmatchedInput { input: usize },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Move {
	Undefined,
	Matched,
	UnmatchedBase,
	UnmatchedInput,
}

/// Prefix-wise DP table of the generalized Levenshtein distance.
///
/// `cost(i, j)` is the distance between the first `i` base cells and the
/// first `j` input cells; `moves` records which move achieved it.
struct Table {
	width: usize,
	costs: Vec<f64>,
	moves: Vec<Move>,
}

impl Table {
	fn index(&self, i: usize, j: usize) -> usize {
		i * self.width + j
	}

	fn cost(&self, i: usize, j: usize) -> f64 {
		self.costs[self.index(i, j)]
	}

	fn step(&self, i: usize, j: usize) -> Move {
		self.moves[self.index(i, j)]
	}

	fn set(&mut self, i: usize, j: usize, cost: f64, mv: Move) {
		let index = self.index(i, j);
		self.costs[index] = cost;
		self.moves[index] = mv;
	}

	/// Fills the table for `base` against `input`.
	///
	/// On equal costs the matched move wins over both gap moves, and an
	/// unmatched base cell wins over an unmatched input cell.
	fn fill(base: &[Cell], input: &[Cell]) -> Result<Self> {
		let height = base.len() + 1;
		let width = input.len() + 1;
		let mut table = Self {
			width,
			costs: vec![0.0; height * width],
			moves: vec![Move::Undefined; height * width],
		};

		let gap = Cell::gap();
		let base_gap = base.iter().map(|c| cell_dist(c, &gap)).collect::<Result<Vec<_>>>()?;
		let input_gap = input.iter().map(|c| cell_dist(c, &gap)).collect::<Result<Vec<_>>>()?;

		for j in 1..width {
			let cost = input_gap[j - 1] + table.cost(0, j - 1);
			table.set(0, j, cost, Move::UnmatchedInput);
		}
		for i in 1..height {
			let cost = base_gap[i - 1] + table.cost(i - 1, 0);
			table.set(i, 0, cost, Move::UnmatchedBase);
		}

		for i in 1..height {
			for j in 1..width {
				let unmatched_base = base_gap[i - 1] + table.cost(i - 1, j);
				let unmatched_input = input_gap[j - 1] + table.cost(i, j - 1);
				let matched = cell_dist(&base[i - 1], &input[j - 1])? + table.cost(i - 1, j - 1);

				let (cost, mv) = if matched <= unmatched_base && matched <= unmatched_input {
					(matched, Move::Matched)
				} else if unmatched_base <= unmatched_input {
					(unmatched_base, Move::UnmatchedBase)
				} else {
					(unmatched_input, Move::UnmatchedInput)
				};
				table.set(i, j, cost, mv);
			}
		}

		Ok(table)
	}
}

/// Computes a minimum-cost alignment of `input` against `base`.
///
/// Substitution costs `cell_dist` between the two cells, insertion and
/// deletion cost the distance of the cell to the gap template.
/// Returns the steps in left-to-right order.
///
/// # Errors
/// Propagates [`crate::error::Error::EmptyDistribution`] from a cell that
/// cannot be normalized.
pub fn align(base: &[Cell], input: &[Cell]) -> Result<Vec<Step>> {
	let table = Table::fill(base, input)?;

	let mut steps = Vec::with_capacity(base.len() + input.len());
	let (mut i, mut j) = (base.len(), input.len());
	while i > 0 || j > 0 {
		match table.step(i, j) {
			Move::Matched => {
				steps.push(Step::Matched { base: i - 1, input: j - 1 });
				i -= 1;
				j -= 1;
			}
			Move::UnmatchedBase => {
				steps.push(Step::UnmatchedBase { base: i - 1 });
				i -= 1;
			}
			Move::UnmatchedInput => {
				steps.push(Step::UnmatchedInput { input: j - 1 });
				j -= 1;
			}
			// Only (0, 0) is undefined, and the loop stops there
			Move::Undefined => break,
		}
	}
	steps.reverse();

	Ok(steps)
}

/// Normalized generalized Levenshtein distance between two cell sequences.
///
/// With `L` the minimum alignment cost, returns `2L / (|a| + |b| + L)`,
/// in `[0, 1]`. Two empty sequences are at distance 0. For sequences of
/// certain cells this is the normalized Levenshtein distance of the strings.
///
/// # Errors
/// Propagates [`crate::error::Error::EmptyDistribution`].
pub fn levmetric_ocr(a: &[Cell], b: &[Cell]) -> Result<f64> {
	if a.is_empty() && b.is_empty() {
		return Ok(0.0);
	}
	let table = Table::fill(a, b)?;
	let levenshtein = table.cost(a.len(), b.len());
	Ok(2.0 * levenshtein / (a.len() as f64 + b.len() as f64 + levenshtein))
}

#[cfg(test)]
mod tests {
	use super::*;

	fn certain(s: &str) -> Vec<Cell> {
		s.chars().map(Cell::certain).collect()
	}

	#[test]
	fn identical_sequences_match_everywhere() {
		let steps = align(&certain("ABC"), &certain("ABC")).unwrap();
		assert_eq!(
			steps,
			vec![
				Step::Matched { base: 0, input: 0 },
				Step::Matched { base: 1, input: 1 },
				Step::Matched { base: 2, input: 2 },
			]
		);
	}

	#[test]
	fn substitution_is_preferred_to_gap_pair() {
		let steps = align(&certain("ABC"), &certain("ABD")).unwrap();
		assert_eq!(steps[2], Step::Matched { base: 2, input: 2 });
	}

	#[test]
	fn missing_character_becomes_unmatched_base() {
		let steps = align(&certain("ABC"), &certain("AC")).unwrap();
		assert_eq!(
			steps,
			vec![
				Step::Matched { base: 0, input: 0 },
				Step::UnmatchedBase { base: 1 },
				Step::Matched { base: 2, input: 1 },
			]
		);
	}

	#[test]
	fn extra_character_becomes_unmatched_input() {
		let steps = align(&certain("AC"), &certain("ABC")).unwrap();
		assert_eq!(steps[1], Step::UnmatchedInput { input: 1 });
		assert_eq!(steps.len(), 3);
	}

	#[test]
	fn equal_costs_resolve_to_a_match() {
		// match: 0.5, unmatched base then input: 0.5 + 0, unmatched input then base: 0 + 0.5
		let half = Cell::from_weights([('A', 0.5), ('@', 0.5)]).unwrap();
		let steps = align(&[half], &[Cell::gap()]).unwrap();
		assert_eq!(steps, vec![Step::Matched { base: 0, input: 0 }]);

		let steps = align(&[Cell::certain('A')], &[Cell::gap()]).unwrap();
		assert_eq!(steps, vec![Step::Matched { base: 0, input: 0 }]);
	}

	#[test]
	fn equal_gap_costs_prefer_unmatched_base() {
		// last column: match h/B costs 3, both gap moves cost 2.5
		let half = Cell::from_weights([('A', 0.5), ('@', 0.5)]).unwrap();
		let base = vec![Cell::certain('B'), half];
		let steps = align(&base, &certain("AAB")).unwrap();
		assert_eq!(steps.last(), Some(&Step::UnmatchedBase { base: 1 }));
		assert_eq!(
			steps,
			vec![
				Step::UnmatchedInput { input: 0 },
				Step::UnmatchedInput { input: 1 },
				Step::Matched { base: 0, input: 2 },
				Step::UnmatchedBase { base: 1 },
			]
		);
	}

	#[test]
	fn gap_heavy_base_cell_is_skipped() {
		// base [A, @] against [@, A]: dropping the trailing base gap costs nothing
		let base = vec![Cell::certain('A'), Cell::gap()];
		let input = vec![Cell::gap(), Cell::certain('A')];
		let steps = align(&base, &input).unwrap();
		assert_eq!(steps.last(), Some(&Step::UnmatchedBase { base: 1 }));
	}

	#[test]
	fn empty_sides_align_with_gaps_only() {
		let steps = align(&[], &certain("AB")).unwrap();
		assert_eq!(steps, vec![Step::UnmatchedInput { input: 0 }, Step::UnmatchedInput { input: 1 }]);
		let steps = align(&certain("AB"), &[]).unwrap();
		assert_eq!(steps, vec![Step::UnmatchedBase { base: 0 }, Step::UnmatchedBase { base: 1 }]);
	}

	#[test]
	fn levmetric_of_certain_strings() {
		assert_eq!(levmetric_ocr(&[], &[]).unwrap(), 0.0);
		assert_eq!(levmetric_ocr(&certain("ABC"), &certain("ABC")).unwrap(), 0.0);
		// L = 1, 2 * 1 / (3 + 3 + 1)
		let d = levmetric_ocr(&certain("ABC"), &certain("ABD")).unwrap();
		assert!((d - 2.0 / 7.0).abs() < 1e-12);
		// L = 3, 2 * 3 / (3 + 0 + 3)
		assert_eq!(levmetric_ocr(&certain("ABC"), &[]).unwrap(), 1.0);
	}
}
