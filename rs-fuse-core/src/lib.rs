//! Combination of text string recognition results with per-character alternatives.
//!
//! This crate folds several noisy recognition passes over the same text
//! into a single consensus, including:
//! - Probability cells with a taxicab metric and weighted fusion
//! - Online alignment of each new result against the running consensus
//! - A cheap estimation of how much the consensus is still expected to change
//! - An order-statistics treap backing that estimation
//! - String metrics to evaluate results against ground truth

/// Consensus models and alignment logic.
pub mod model;

/// String metrics for offline evaluation.
pub mod metrics;

/// Crate-wide error type.
pub mod error;

pub use error::{Error, Result};
pub use model::alignment::Alignment;
pub use model::cell::{Cell, GAP, cell_dist, merge_cells};
pub use model::estimation::AlignmentWithEstimation;
pub use model::fusion_input::{FusionInput, StructureKind};
pub use model::path::levmetric_ocr;
pub use model::recognition::Recognition;
pub use model::sequence_structure::{ListSequence, SequenceStructure, TreapSequence};
pub use model::treap::Treap;
