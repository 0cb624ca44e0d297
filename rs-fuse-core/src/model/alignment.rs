use log::debug;

use crate::error::{Error, Result};
use super::cell::{Cell, GAP, merge_cells};
use super::fusion_input::FusionInput;
use super::path::{Step, align};
use super::recognition::Recognition;

/// Online consensus of a sequence of text string recognition results.
///
/// Each new result is aligned against the current `base` with the
/// generalized Levenshtein distance and merged cell by cell.
///
/// # Responsibilities
/// - Seed the base with the first result
/// - Align and merge every following result with its weight
/// - Surface the consensus as a plain string
///
/// # Invariants
/// - Every base cell is normalized
/// - `base_weight` is the sum of the weights of all merged results
/// - The base never shrinks: unmatched base cells only lose mass
#[derive(Debug, Clone)]
pub struct Alignment {
	/// Aligned and combined result (`None` until the first input).
	base: Option<Vec<Cell>>,
	/// Sum of weights of combined inputs.
	base_weight: f64,
	/// Gap factor used by `get_string_result`.
	empty_weight: f64,
}

impl Alignment {
	/// Creates an empty alignment from shared parameters.
	///
	/// # Errors
	/// Returns an error if the parameters are invalid.
	pub fn new(input: &FusionInput) -> Result<Self> {
		input.validate()?;
		Ok(Self::with_empty_weight_unchecked(input.empty_weight()))
	}

	/// Creates an empty alignment with the given gap factor.
	///
	/// # Errors
	/// Returns an error if `empty_weight` is negative or not finite.
	pub fn with_empty_weight(empty_weight: f64) -> Result<Self> {
		Self::new(&FusionInput::new(empty_weight)?)
	}

	fn with_empty_weight_unchecked(empty_weight: f64) -> Self {
		Self { base: None, base_weight: 0.0, empty_weight }
	}

	/// Current consensus cells (empty before the first input).
	pub fn base(&self) -> &[Cell] {
		self.base.as_deref().unwrap_or(&[])
	}

	/// Sum of the weights of the merged results.
	pub fn base_weight(&self) -> f64 {
		self.base_weight
	}

	/// Whether at least one result has been added.
	pub fn is_seeded(&self) -> bool {
		self.base.is_some()
	}

	/// Adds a recognition result with confidence `weight`.
	///
	/// - The first result becomes the base verbatim (normalized).
	/// - Later results are aligned against the base; matched cells are
	///   merged with weights `(base_weight, weight)`, unmatched base cells
	///   are merged with the gap template, unmatched input cells are merged
	///   into a new position.
	///
	/// # Errors
	/// - [`Error::InvalidSampleWeight`] if `weight` is not positive and finite
	/// - [`Error::EmptyDistribution`] if an input cell has zero total weight
	///
	/// The alignment is left untouched on error.
	pub fn add_string<'a, R>(&mut self, input: R, weight: f64) -> Result<()>
	where
		R: Into<Recognition<'a>>,
	{
		if !weight.is_finite() || weight <= 0.0 {
			return Err(Error::InvalidSampleWeight(weight));
		}
		let s = input
			.into()
			.to_cells()
			.iter()
			.map(Cell::normalized)
			.collect::<Result<Vec<_>>>()?;

		let base = match &self.base {
			None => {
				debug!("alignment seeded with {} cells", s.len());
				self.base = Some(s);
				self.base_weight = weight;
				return Ok(());
			}
			Some(base) => base,
		};

		let gap = Cell::gap();
		let mut new_base = Vec::with_capacity(base.len() + s.len());
		for step in align(base, &s)? {
			let cell = match step {
				Step::Matched { base: b, input: i } => merge_cells(&base[b], &s[i], self.base_weight, weight)?,
				Step::UnmatchedBase { base: b } => merge_cells(&base[b], &gap, self.base_weight, weight)?,
				Step::UnmatchedInput { input: i } => merge_cells(&gap, &s[i], self.base_weight, weight)?,
			};
			new_base.push(cell);
		}

		debug!(
			"merged {} cells into base of {} cells, new length {}",
			s.len(),
			base.len(),
			new_base.len()
		);
		self.base = Some(new_base);
		self.base_weight += weight;
		Ok(())
	}

	/// Returns the consensus string.
	///
	/// A position is surfaced only if its best non-gap weight is strictly
	/// greater than `gap weight * empty_weight`.
	pub fn get_string_result(&self) -> String {
		string_result(self.base(), self.empty_weight)
	}
}

/// Surfaces the best non-gap label of every cell that beats the gap threshold.
pub(crate) fn string_result(base: &[Cell], empty_weight: f64) -> String {
	base.iter()
		.filter_map(|cell| {
			let best = cell.best_key_not_from(&[GAP])?;
			(cell.weight(best) > cell.weight(GAP) * empty_weight).then_some(best)
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn first_input_becomes_base() {
		let mut alignment = Alignment::with_empty_weight(1.0).unwrap();
		assert!(!alignment.is_seeded());
		assert_eq!(alignment.get_string_result(), "");
		alignment.add_string("ABC", 2.0).unwrap();
		assert_eq!(alignment.base().len(), 3);
		assert_eq!(alignment.base_weight(), 2.0);
		assert_eq!(alignment.get_string_result(), "ABC");
	}

	#[test]
	fn weight_must_be_positive() {
		let mut alignment = Alignment::with_empty_weight(1.0).unwrap();
		assert_eq!(alignment.add_string("A", 0.0), Err(Error::InvalidSampleWeight(0.0)));
		assert!(alignment.add_string("A", f64::NAN).is_err());
		assert!(!alignment.is_seeded());
	}

	#[test]
	fn zero_sum_cell_leaves_state_untouched() {
		let mut alignment = Alignment::with_empty_weight(1.0).unwrap();
		alignment.add_string("AB", 1.0).unwrap();
		let bad = vec![Cell::certain('A'), Cell::from_weights([('B', 0.0)]).unwrap()];
		assert_eq!(alignment.add_string(&bad, 1.0), Err(Error::EmptyDistribution));
		assert_eq!(alignment.base_weight(), 1.0);
		assert_eq!(alignment.base(), &[Cell::certain('A'), Cell::certain('B')]);
	}

	#[test]
	fn blended_position_after_substitution() {
		let mut alignment = Alignment::with_empty_weight(1.0).unwrap();
		alignment.add_string("ABC", 1.0).unwrap();
		alignment.add_string("ABD", 1.0).unwrap();
		let base = alignment.base();
		assert_eq!(base.len(), 3);
		assert_eq!(base[0].get('A'), Some(1.0));
		assert_eq!(base[1].get('B'), Some(1.0));
		assert_eq!(base[2].get('C'), Some(0.5));
		assert_eq!(base[2].get('D'), Some(0.5));
		// tie resolves to the smaller label
		assert_eq!(alignment.get_string_result(), "ABC");
	}

	#[test]
	fn unmatched_base_position_decays() {
		let mut alignment = Alignment::with_empty_weight(1.0).unwrap();
		alignment.add_string("ABC", 1.0).unwrap();
		alignment.add_string("AC", 1.0).unwrap();
		let base = alignment.base();
		assert_eq!(base.len(), 3);
		assert_eq!(base[1].get('B'), Some(0.5));
		assert_eq!(base[1].get(GAP), Some(0.5));
		// 0.5 is not strictly above 0.5 * 1.0
		assert_eq!(alignment.get_string_result(), "AC");

		let lenient = Alignment { empty_weight: 0.5, ..alignment.clone() };
		assert_eq!(lenient.get_string_result(), "ABC");
	}

	#[test]
	fn inserted_position_has_input_weight_share() {
		let mut alignment = Alignment::with_empty_weight(1.0).unwrap();
		alignment.add_string("AC", 3.0).unwrap();
		alignment.add_string("ABC", 1.0).unwrap();
		let base = alignment.base();
		assert_eq!(base.len(), 3);
		assert_eq!(base[1].get('B'), Some(0.25));
		assert_eq!(base[1].get(GAP), Some(0.75));
		assert_eq!(alignment.base_weight(), 4.0);
		assert_eq!(alignment.get_string_result(), "AC");
	}

	#[test]
	fn empty_input_decays_every_position() {
		let mut alignment = Alignment::with_empty_weight(1.0).unwrap();
		alignment.add_string("AB", 1.0).unwrap();
		alignment.add_string("", 1.0).unwrap();
		assert_eq!(alignment.base().len(), 2);
		assert_eq!(alignment.base_weight(), 2.0);
	}
}
