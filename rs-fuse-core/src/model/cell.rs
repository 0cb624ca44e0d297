use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Label reserved for "no character at this aligned position".
pub const GAP: char = '@';

/// Probability estimation for a single text position.
///
/// A `Cell` maps character labels to non-negative membership weights.
/// While under construction the weights need not sum to 1; the metric and
/// fusion operators always work on the normalized distribution.
///
/// ## Responsibilities
/// - Store a sparse distribution over labels
/// - Normalize weights on demand
/// - Report the dominant label, optionally excluding some labels
///
/// ## Invariants
/// - Every weight is finite and `>= 0`
/// - Labels are iterated in sorted order (ties resolve to the smallest label)
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
#[serde(try_from = "RawCell")]
pub struct Cell {
	/// Membership estimation indexed by label.
	/// Example: { 'B' => 0.8, '8' => 0.15, '@' => 0.05 }
	weights: BTreeMap<char, f64>,
}

/// Unchecked wire form of a [`Cell`], validated through [`Cell::from_weights`].
#[derive(Deserialize)]
struct RawCell {
	weights: BTreeMap<char, f64>,
}

impl TryFrom<RawCell> for Cell {
	type Error = Error;

	fn try_from(raw: RawCell) -> Result<Self> {
		Self::from_weights(raw.weights)
	}
}

impl Cell {
	/// Creates a cell with no labels.
	pub fn new() -> Self {
		Self { weights: BTreeMap::new() }
	}

	/// Creates a cell holding all its mass on `label`.
	pub fn certain(label: char) -> Self {
		let mut weights = BTreeMap::new();
		weights.insert(label, 1.0);
		Self { weights }
	}

	/// Creates the gap template: all mass on [`GAP`].
	pub fn gap() -> Self {
		Self::certain(GAP)
	}

	/// Builds a cell from `(label, weight)` pairs.
	///
	/// Repeated labels keep the last weight.
	///
	/// # Errors
	/// Returns [`Error::InvalidWeight`] for a negative or non-finite weight.
	pub fn from_weights<I>(weights: I) -> Result<Self>
	where
		I: IntoIterator<Item = (char, f64)>,
	{
		let mut cell = Self::new();
		for (label, weight) in weights {
			cell.set(label, weight)?;
		}
		Ok(cell)
	}

	/// Sets the weight of `label`.
	///
	/// # Errors
	/// Returns [`Error::InvalidWeight`] for a negative or non-finite weight.
	pub fn set(&mut self, label: char, weight: f64) -> Result<()> {
		if !weight.is_finite() || weight < 0.0 {
			return Err(Error::InvalidWeight { label, weight });
		}
		self.weights.insert(label, weight);
		Ok(())
	}

	/// Returns the weight of `label`, or `None` if the label is absent.
	pub fn get(&self, label: char) -> Option<f64> {
		self.weights.get(&label).copied()
	}

	/// Returns the weight of `label`, treating an absent label as 0.
	pub fn weight(&self, label: char) -> f64 {
		self.get(label).unwrap_or(0.0)
	}

	/// Whether `label` is present (possibly with a zero weight).
	pub fn contains(&self, label: char) -> bool {
		self.weights.contains_key(&label)
	}

	/// Iterates over `(label, weight)` in label order.
	pub fn iter(&self) -> impl Iterator<Item = (char, f64)> + '_ {
		self.weights.iter().map(|(label, weight)| (*label, *weight))
	}

	/// Iterates over labels in order.
	pub fn labels(&self) -> impl Iterator<Item = char> + '_ {
		self.weights.keys().copied()
	}

	/// Number of labels stored, zero-weight ones included.
	pub fn len(&self) -> usize {
		self.weights.len()
	}

	pub fn is_empty(&self) -> bool {
		self.weights.is_empty()
	}

	/// Sum of all weights.
	pub fn total(&self) -> f64 {
		self.weights.values().sum()
	}

	/// Adds `label` with a zero weight if it is not present yet.
	pub(crate) fn ensure_label(&mut self, label: char) {
		self.weights.entry(label).or_insert(0.0);
	}

	/// Brings the sum of weights to 1.
	///
	/// # Errors
	/// Returns [`Error::EmptyDistribution`] if the weights sum to zero.
	/// The cell is left unchanged in that case.
	pub fn normalize(&mut self) -> Result<()> {
		let total = self.total();
		if total <= 0.0 {
			return Err(Error::EmptyDistribution);
		}
		for weight in self.weights.values_mut() {
			*weight /= total;
		}
		Ok(())
	}

	/// Returns a normalized copy of this cell.
	///
	/// # Errors
	/// Returns [`Error::EmptyDistribution`] if the weights sum to zero.
	pub fn normalized(&self) -> Result<Self> {
		let mut cell = self.clone();
		cell.normalize()?;
		Ok(cell)
	}

	/// Label with the highest weight.
	///
	/// Ties resolve to the smallest label. Returns `None` for an empty cell.
	pub fn best_key(&self) -> Option<char> {
		self.best_key_not_from(&[])
	}

	/// Label with the highest weight, skipping every label in `mask`.
	///
	/// Returns `None` if no label qualifies.
	pub fn best_key_not_from(&self, mask: &[char]) -> Option<char> {
		let mut best: Option<(char, f64)> = None;
		for (label, weight) in self.iter() {
			if mask.contains(&label) {
				continue;
			}
			match best {
				Some((_, best_weight)) if weight <= best_weight => {}
				_ => best = Some((label, weight)),
			}
		}
		best.map(|(label, _)| label)
	}
}

/// Scaled taxicab distance between the normalized distributions of `a` and `b`.
///
/// Absent labels count as weight 0. The result lies in `[0, 1]`: 0 for
/// identical distributions, 1 for disjoint supports.
///
/// # Errors
/// Returns [`Error::EmptyDistribution`] if either cell cannot be normalized.
pub fn cell_dist(a: &Cell, b: &Cell) -> Result<f64> {
	let na = a.normalized()?;
	let nb = b.normalized()?;

	let mut distance = 0.0;
	for (label, weight) in na.iter() {
		distance += (weight - nb.weight(label)).abs();
	}
	for (label, weight) in nb.iter() {
		if !na.contains(label) {
			distance += weight;
		}
	}

	Ok(distance / 2.0)
}

/// Fuses `a` and `b` with confidence weights `wa` and `wb`.
///
/// Each output weight is the weighted average of the normalized input
/// weights (absent labels count as 0), so the result sums to 1.
///
/// # Errors
/// - [`Error::InvalidMergeWeights`] if a weight is negative or non-finite,
///   or if `wa + wb` is zero
/// - [`Error::EmptyDistribution`] if either cell cannot be normalized
pub fn merge_cells(a: &Cell, b: &Cell, wa: f64, wb: f64) -> Result<Cell> {
	let total = wa + wb;
	if !wa.is_finite() || !wb.is_finite() || wa < 0.0 || wb < 0.0 || total <= 0.0 {
		return Err(Error::InvalidMergeWeights { wa, wb });
	}

	let na = a.normalized()?;
	let nb = b.normalized()?;

	let mut merged = Cell::new();
	for label in na.labels().chain(nb.labels()) {
		if merged.contains(label) {
			continue;
		}
		let weight = (wa * na.weight(label) + wb * nb.weight(label)) / total;
		merged.weights.insert(label, weight);
	}

	Ok(merged)
}
