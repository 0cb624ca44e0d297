//! Error type shared by every consensus operation.

use thiserror::Error;

/// Result type used across the crate.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while building or querying a consensus.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
	/// A cell whose weights sum to zero cannot be normalized:
	/// no label can be preferred over another.
	#[error("cannot normalize an empty distribution")]
	EmptyDistribution,

	/// A label weight is negative, NaN or infinite.
	#[error("invalid weight {weight} for label '{label}'")]
	InvalidWeight { label: char, weight: f64 },

	/// Weights given to `merge_cells` are unusable.
	#[error("invalid merge weights ({wa}, {wb})")]
	InvalidMergeWeights { wa: f64, wb: f64 },

	/// A recognition result was added with a non-positive weight.
	#[error("sample weight must be positive and finite, got {0}")]
	InvalidSampleWeight(f64),

	/// A configuration value was rejected.
	#[error("invalid parameter: {0}")]
	InvalidParameter(String),
}
