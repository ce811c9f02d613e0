use thiserror::Error;

/// Result type for all modelling operations.
pub type Result<T> = std::result::Result<T, NGramError>;

/// Errors that can occur across the modelling pipeline.
///
/// The first five variants are contract violations reported to the
/// caller; `CapacityOverflow` is a configuration error detected before
/// the count table is allocated; `EmptySplit` flags a degenerate
/// evaluation input. None of these are retried anywhere, every
/// operation is deterministic given its inputs.
#[derive(Debug, Error)]
pub enum NGramError {
	/// Character outside the configured alphabet.
	#[error("symbol {0:?} is not part of the alphabet")]
	InvalidSymbol(char),

	/// Token code outside `[0, vocab_size)`.
	#[error("token {0} is out of vocabulary range")]
	InvalidToken(usize),

	/// Zero vocabulary size or zero sequence length.
	#[error("vocab_size and seq_len must both be non-zero")]
	InvalidCapacity,

	/// A training window whose length differs from the model order.
	#[error("window has {actual} tokens, expected {expected}")]
	InvalidWindowLength { expected: usize, actual: usize },

	/// An inference context whose length differs from the model order minus one.
	#[error("context has {actual} tokens, expected {expected}")]
	InvalidContextLength { expected: usize, actual: usize },

	/// `vocab_size ^ seq_len` does not fit the table index type.
	#[error("count table of {vocab_size}^{seq_len} entries exceeds the addressable size")]
	CapacityOverflow { vocab_size: usize, seq_len: usize },

	/// An evaluation split that produced no windows at all.
	#[error("data split produced no windows")]
	EmptySplit,

	/// Merge or cache reload across models built with different hyperparameters.
	#[error("model hyperparameters do not match")]
	HyperparameterMismatch,

	/// Corpus or cache file access failed.
	#[error("i/o error: {0}")]
	Io(#[from] std::io::Error),

	/// Cached model bytes could not be decoded.
	#[error("model encoding error: {0}")]
	Codec(#[from] postcard::Error),
}
