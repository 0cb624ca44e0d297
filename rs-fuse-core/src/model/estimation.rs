use std::collections::BTreeSet;

use log::{debug, trace};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::error::{Error, Result};
use super::alignment::string_result;
use super::cell::{Cell, GAP, merge_cells};
use super::fusion_input::FusionInput;
use super::path::{Step, align};
use super::recognition::Recognition;
use super::sequence_structure::{SequenceStructure, SymbolHistories};

/// Online consensus with an estimation of the expected distance to the
/// next combined result.
///
/// Works like [`super::alignment::Alignment`] with every sample weighted 1,
/// and additionally records, for every base position and symbol, the
/// history of values the symbol received. The modelling sum over these
/// histories tells how much the consensus is still expected to move.
///
/// # Responsibilities
/// - Align and merge samples into the base
/// - Fix the alphabet from the first sample that carries a character
/// - Keep one value history per position and symbol
///
/// # Invariants
/// - `histories.len() == base.len()`
/// - Every history holds exactly `samples` values
/// - Once the alphabet is known, every base cell carries every alphabet
///   label and the gap label
#[derive(Debug, Clone)]
pub struct AlignmentWithEstimation<S: SequenceStructure> {
	/// Aligned and combined result (`None` until the first sample).
	base: Option<Vec<Cell>>,
	/// Number of processed samples.
	samples: usize,
	/// Gap factor used by `get_string_result`.
	empty_weight: f64,
	/// Value histories, one map per base position.
	histories: Vec<SymbolHistories<S>>,
	/// Labels of the first sample carrying a character.
	alphabet: Option<BTreeSet<char>>,
	/// Source of the seeds handed to new histories.
	rng: StdRng,
}

impl<S: SequenceStructure> AlignmentWithEstimation<S> {
	/// Creates an empty estimator from shared parameters.
	///
	/// # Errors
	/// Returns an error if the parameters are invalid, or if
	/// `input.structure` names another backend than `S`.
	pub fn new(input: &FusionInput) -> Result<Self> {
		input.validate()?;
		if input.structure != S::KIND {
			return Err(Error::InvalidParameter(format!(
				"structure {:?} requested for a {:?} estimator",
				input.structure,
				S::KIND
			)));
		}
		let rng = match input.seed {
			Some(seed) => StdRng::seed_from_u64(seed),
			None => StdRng::from_os_rng(),
		};
		Ok(Self {
			base: None,
			samples: 0,
			empty_weight: input.empty_weight(),
			histories: Vec::new(),
			alphabet: None,
			rng,
		})
	}

	/// Current consensus cells (empty before the first sample).
	pub fn base(&self) -> &[Cell] {
		self.base.as_deref().unwrap_or(&[])
	}

	/// Number of processed samples.
	pub fn samples(&self) -> usize {
		self.samples
	}

	/// Alphabet, once a sample carrying a character has been seen.
	pub fn alphabet(&self) -> Option<&BTreeSet<char>> {
		self.alphabet.as_ref()
	}

	/// Value histories, one map per base position.
	pub fn histories(&self) -> &[SymbolHistories<S>] {
		&self.histories
	}

	/// Adds a recognition result with weight 1.
	///
	/// # Errors
	/// Returns [`crate::error::Error::EmptyDistribution`] if an input cell
	/// has zero total weight. The estimator is left untouched on error.
	pub fn add_string<'a, R>(&mut self, input: R) -> Result<()>
	where
		R: Into<Recognition<'a>>,
	{
		let mut s = input
			.into()
			.to_cells()
			.iter()
			.map(Cell::normalized)
			.collect::<Result<Vec<_>>>()?;

		if self.alphabet.is_none() {
			let labels: BTreeSet<char> = s.iter().flat_map(Cell::labels).filter(|l| *l != GAP).collect();
			if !labels.is_empty() {
				self.fix_alphabet(labels);
			}
		}
		if let Some(alphabet) = &self.alphabet {
			for cell in &mut s {
				backfill(cell, alphabet);
			}
		}

		let Some(base) = &self.base else {
			debug!("estimator seeded with {} cells", s.len());
			let histories = s
				.iter()
				.map(|cell| new_position(&mut self.rng, self.alphabet.as_ref(), cell, 0))
				.collect();
			self.histories = histories;
			self.base = Some(s);
			self.samples = 1;
			return Ok(());
		};

		let steps = align(base, &s)?;

		let n = self.samples as f64;
		let gap = self.gap_cell();
		let mut new_base = Vec::with_capacity(steps.len());
		for step in &steps {
			let cell = match *step {
				Step::Matched { base: b, input: i } => merge_cells(&base[b], &s[i], n, 1.0)?,
				Step::UnmatchedBase { base: b } => merge_cells(&base[b], &gap, n, 1.0)?,
				Step::UnmatchedInput { input: i } => merge_cells(&gap, &s[i], n, 1.0)?,
			};
			new_base.push(cell);
		}
		let old_len = base.len();

		// Every base position appears in exactly one step
		let mut old = std::mem::take(&mut self.histories).into_iter().map(Some).collect::<Vec<_>>();
		let mut histories = Vec::with_capacity(steps.len());
		for step in &steps {
			let position = match *step {
				Step::Matched { base: b, input: i } => {
					let mut position = old[b].take().unwrap_or_default();
					record(&mut self.rng, &mut position, &s[i], self.samples);
					position
				}
				Step::UnmatchedBase { base: b } => {
					let mut position = old[b].take().unwrap_or_default();
					record(&mut self.rng, &mut position, &gap, self.samples);
					position
				}
				Step::UnmatchedInput { input: i } => {
					new_position(&mut self.rng, self.alphabet.as_ref(), &s[i], self.samples)
				}
			};
			histories.push(position);
		}

		debug!("sample {} merged: base length {} -> {}", self.samples + 1, old_len, new_base.len());
		self.base = Some(new_base);
		self.histories = histories;
		self.samples += 1;
		Ok(())
	}

	/// Returns the consensus string.
	///
	/// A position is surfaced only if its best non-gap weight is strictly
	/// greater than `gap weight * empty_weight`.
	pub fn get_string_result(&self) -> String {
		string_result(self.base(), self.empty_weight)
	}

	/// Approximation of the normalized distance the next sample is
	/// expected to add to the consensus. 0 before the first sample.
	pub fn get_modelling_sum(&self) -> f64 {
		let sum = S::get_modelling_sum(&self.histories, self.samples);
		trace!("modelling sum after {} samples: {}", self.samples, sum);
		sum
	}

	/// Fixes the alphabet and backfills the existing state with it.
	///
	/// Every base cell gains zero-weight entries for the new labels, and
	/// every position gains a zero history for each of them, one zero per
	/// sample already processed.
	fn fix_alphabet(&mut self, alphabet: BTreeSet<char>) {
		trace!("alphabet fixed after {} samples: {:?}", self.samples, alphabet);
		if let Some(base) = &mut self.base {
			for cell in base.iter_mut() {
				backfill(cell, &alphabet);
			}
		}
		for position in &mut self.histories {
			for label in &alphabet {
				if !position.contains_key(label) {
					position.insert(*label, repeated(&mut self.rng, self.samples, 0.0));
				}
			}
		}
		self.alphabet = Some(alphabet);
	}

	/// The gap template, carrying the alphabet with zero weights once known.
	fn gap_cell(&self) -> Cell {
		let mut gap = Cell::gap();
		if let Some(alphabet) = &self.alphabet {
			backfill(&mut gap, alphabet);
		}
		gap
	}
}

/// Histories of a position inserted after `prior` samples, which all saw a
/// gap there, then fed with `cell`.
fn new_position<S: SequenceStructure>(
	rng: &mut StdRng,
	alphabet: Option<&BTreeSet<char>>,
	cell: &Cell,
	prior: usize,
) -> SymbolHistories<S> {
	let mut position = SymbolHistories::new();
	position.insert(GAP, repeated(rng, prior, 1.0));
	for label in alphabet.into_iter().flatten() {
		position.insert(*label, repeated(rng, prior, 0.0));
	}
	record(rng, &mut position, cell, prior);
	position
}

/// Appends one value per symbol of the position: the weight in `cell`, or 0
/// for symbols the cell lacks. Symbols new to the position start with
/// `prior` zeros.
fn record<S: SequenceStructure>(rng: &mut StdRng, position: &mut SymbolHistories<S>, cell: &Cell, prior: usize) {
	for label in cell.labels() {
		if !position.contains_key(&label) {
			position.insert(label, repeated(rng, prior, 0.0));
		}
	}
	for (label, history) in position.iter_mut() {
		history.insert(cell.weight(*label));
	}
}

/// A history holding `len` copies of `value`.
fn repeated<S: SequenceStructure>(rng: &mut StdRng, len: usize, value: f64) -> S {
	let mut history = S::create(rng);
	for _ in 0..len {
		history.insert(value);
	}
	history
}

/// Adds zero-weight entries for the alphabet and the gap label.
fn backfill(cell: &mut Cell, alphabet: &BTreeSet<char>) {
	for label in alphabet {
		cell.ensure_label(*label);
	}
	cell.ensure_label(GAP);
}
