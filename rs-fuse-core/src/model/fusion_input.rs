use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Backend used to store per-position value histories.
///
/// # Variants
/// - `List`: exact, keeps every value in insertion order.
/// - `Treap`: approximate, keeps order statistics in a balanced tree.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum StructureKind {
	#[default]
	List,
	Treap,
}

/// Parameters shared by the consensus builders.
///
/// # Responsibilities
/// - Track the gap threshold used to surface the consensus string
/// - Carry the seed of the treap priority source
/// - Carry the history backend chosen by the caller
///
/// # Invariants
/// - `empty_weight` is finite and `>= 0`
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct FusionInput {
	/// Factor applied to the gap weight when deciding whether a position
	/// is surfaced. Does not affect the combination itself.
	empty_weight: f64,

	/// Seed of the treap priority source (`None` seeds from OS entropy).
	pub seed: Option<u64>,

	/// History backend. `AlignmentWithEstimation::<S>::new` rejects a
	/// value that does not name `S`.
	pub structure: StructureKind,
}

impl Default for FusionInput {
	fn default() -> Self {
		Self { empty_weight: 1.0, seed: None, structure: StructureKind::default() }
	}
}

impl FusionInput {
	/// Creates parameters with the given gap factor.
	///
	/// # Errors
	/// Returns an error if `empty_weight` is negative or not finite.
	pub fn new(empty_weight: f64) -> Result<Self> {
		let mut input = Self::default();
		input.set_empty_weight(empty_weight)?;
		Ok(input)
	}

	/// Returns the gap factor.
	pub fn empty_weight(&self) -> f64 {
		self.empty_weight
	}

	/// Sets the gap factor.
	///
	/// # Errors
	/// Returns an error if the value is negative or not finite.
	pub fn set_empty_weight(&mut self, empty_weight: f64) -> Result<()> {
		if !empty_weight.is_finite() || empty_weight < 0.0 {
			return Err(Error::InvalidParameter(format!(
				"empty weight must be finite and >= 0, got {}",
				empty_weight
			)));
		}
		self.empty_weight = empty_weight;
		Ok(())
	}

	/// Re-checks invariants, e.g. after deserialization.
	pub fn validate(&self) -> Result<()> {
		let mut copy = self.clone();
		copy.set_empty_weight(self.empty_weight)
	}

	/// Builder-style seed setter.
	pub fn with_seed(mut self, seed: u64) -> Self {
		self.seed = Some(seed);
		self
	}

	/// Builder-style backend setter.
	pub fn with_structure(mut self, structure: StructureKind) -> Self {
		self.structure = structure;
		self
	}
}
