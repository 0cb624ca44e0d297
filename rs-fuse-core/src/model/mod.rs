//! Top-level module for the recognition results combination system.
//!
//! This module provides:
//! - Per-character probability estimations (`Cell`) with their metric and fusion
//! - Generalized Levenshtein alignment of cell sequences (`path`)
//! - Online consensus building (`Alignment`)
//! - Consensus building with convergence estimation (`AlignmentWithEstimation`)
//! - Value history backends (`ListSequence`, `TreapSequence`)
//! - Shared parameters (`FusionInput`)

/// Per-character probability estimation, distance and weighted merge.
pub mod cell;

/// Alignment moves and the generalized Levenshtein distance over cells.
pub mod path;

/// A single recognition result: plain text or cells.
pub mod recognition;

/// Parameters shared by the consensus builders.
pub mod fusion_input;

/// Online consensus of weighted recognition results.
pub mod alignment;

/// Online consensus with expected-change estimation.
///
/// Every sample has weight 1; per-position symbol histories feed the
/// modelling sum.
pub mod estimation;

/// Exact and approximate value history backends.
pub mod sequence_structure;

/// Randomized balanced search tree with subtree sums and counts.
pub mod treap;
