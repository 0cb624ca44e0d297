use std::collections::BTreeMap;

use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use super::fusion_input::StructureKind;
use super::treap::Treap;

/// Value histories of one base position, indexed by symbol.
pub type SymbolHistories<S> = BTreeMap<char, S>;

/// Storage for the sequence `y_1`, `y_2`, ..., `y_n` of values a symbol
/// received at one aligned position over `n` combined samples.
///
/// Two implementations exist:
/// - [`ListSequence`]: exact, keeps every value in order
/// - [`TreapSequence`]: approximate, keeps order statistics only
pub trait SequenceStructure: Sized {
	/// Backend tag matched against [`crate::FusionInput::structure`].
	const KIND: StructureKind;

	/// Creates an empty sequence. `rng` seeds any internal randomness.
	fn create<R: Rng>(rng: &mut R) -> Self;

	/// Appends one observed value.
	fn insert(&mut self, value: f64);

	/// Number of inserted values.
	fn len(&self) -> usize;

	fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Sum of inserted values.
	fn get_sum(&self) -> f64;

	/// Estimation of the normalized distance the next sample is expected
	/// to add, computed over every position and symbol of `y` after `n`
	/// samples.
	fn get_modelling_sum(y: &[SymbolHistories<Self>], n: usize) -> f64;
}

/// Scales a raw distance into `[0, 1)` the way the normalized generalized
/// Levenshtein distance does, for a sequence of `positions` cells.
fn normalize_distance(distance: f64, positions: usize) -> f64 {
	let denominator = distance + 2.0 * positions as f64;
	if denominator <= 0.0 { 0.0 } else { 2.0 * distance / denominator }
}

/// Exact history: every value in insertion order plus a running sum.
#[derive(Debug, Clone, Default)]
pub struct ListSequence {
	elements: Vec<f64>,
	sum: f64,
}

impl ListSequence {
	/// Inserted values, in insertion order.
	pub fn elements(&self) -> &[f64] {
		&self.elements
	}
}

impl SequenceStructure for ListSequence {
	const KIND: StructureKind = StructureKind::List;

	fn create<R: Rng>(_rng: &mut R) -> Self {
		Self::default()
	}

	/// Order is significant: index `i` is the value of sample `i`.
	fn insert(&mut self, value: f64) {
		self.elements.push(value);
		self.sum += value;
	}

	fn len(&self) -> usize {
		self.elements.len()
	}

	fn get_sum(&self) -> f64 {
		self.sum
	}

	/// Computes one distance per combined sample, normalizes each of them
	/// separately and sums the results.
	///
	/// Sample `i` contributes `|s - n * y_i|` for every history with sum `s`.
	fn get_modelling_sum(y: &[SymbolHistories<Self>], n: usize) -> f64 {
		if n == 0 {
			return 0.0;
		}
		let nf = n as f64;
		let mut distances = vec![0.0; n];
		for histories in y {
			for history in histories.values() {
				let s = history.get_sum();
				for (distance, element) in distances.iter_mut().zip(&history.elements) {
					*distance += (s - nf * element).abs();
				}
			}
		}
		distances
			.into_iter()
			.map(|distance| normalize_distance(distance / (2.0 * nf * (nf + 1.0)), y.len()))
			.sum()
	}
}

/// Approximate history backed by a [`Treap`]: only count, sum and order
/// statistics survive, insertion order is lost.
///
/// One history exists per position and symbol, so priorities come from a
/// small non-cryptographic generator.
#[derive(Debug, Clone)]
pub struct TreapSequence {
	treap: Treap<SmallRng>,
}

impl TreapSequence {
	/// Count and sum of the values strictly lower than `value`.
	pub fn get_lower(&self, value: f64) -> (usize, f64) {
		self.treap.get_lower(value)
	}
}

impl SequenceStructure for TreapSequence {
	const KIND: StructureKind = StructureKind::Treap;

	fn create<R: Rng>(rng: &mut R) -> Self {
		Self { treap: Treap::with_rng(SmallRng::from_rng(rng)) }
	}

	fn insert(&mut self, value: f64) {
		self.treap.insert(value);
	}

	fn len(&self) -> usize {
		self.treap.len()
	}

	fn get_sum(&self) -> f64 {
		self.treap.sum()
	}

	/// Sums `s * lc - n * ls` over every history, where `lc` / `ls` are the
	/// count and sum of values below the mean `s / n`.
	///
	/// Deviations below and above the mean cancel out, so this is half the
	/// sum of absolute deviations, times `n`. The grand total is normalized
	/// once instead of per sample.
	fn get_modelling_sum(y: &[SymbolHistories<Self>], n: usize) -> f64 {
		if n == 0 {
			return 0.0;
		}
		let nf = n as f64;
		let mut total = 0.0;
		for histories in y {
			for history in histories.values() {
				let s = history.get_sum();
				let (lc, ls) = history.get_lower(s / nf);
				total += s * lc as f64 - nf * ls;
			}
		}
		normalize_distance(total / (nf * (nf + 1.0)), y.len())
	}
}
