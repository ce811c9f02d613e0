use std::path::Path;
use std::sync::mpsc;
use std::thread;

use serde::{Deserialize, Serialize};

use crate::error::{NGramError, Result};
use crate::io::{read_lines, sibling_with_extension};
use super::dataloader::DataLoader;
use super::tokenizer::{Token, Tokenizer};

/// Count-based n-gram model over a fixed vocabulary.
///
/// The model owns a flat table of `vocab_size ^ seq_len` counters, one
/// per possible window of `seq_len` tokens. A window is addressed by
/// treating its tokens as digits of a base-`vocab_size` number with the
/// last token as the least significant digit, so the counters of a
/// fixed context and a varying last token are contiguous.
///
/// # Responsibilities
/// - Accumulate window counts during training
/// - Produce a smoothed next-token distribution for a context
/// - Merge with another model of identical hyperparameters
/// - Load itself from a binary cache, rebuilding from the corpus when absent
///
/// # Invariants
/// - `vocab_size`, `seq_len` and `smoothing` are immutable after construction
/// - The count table is allocated once and never resized
/// - Counters only ever increase; training never decrements
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct NGramModel {
	/// Number of distinct tokens.
	vocab_size: usize,

	/// Window length, context plus one target token.
	seq_len: usize,

	/// Add-k constant applied to every counter at inference time.
	smoothing: f32,

	/// Flat counter table of `vocab_size ^ seq_len` entries.
	counts: Vec<u32>,
}

impl NGramModel {
	/// Creates a model with an all-zero count table.
	///
	/// # Parameters
	/// - `vocab_size`: Number of distinct tokens, at least 1.
	/// - `seq_len`: Window length, at least 1 (1 is the unigram case).
	/// - `smoothing`: Non-negative add-k constant.
	///
	/// # Errors
	/// - `InvalidCapacity` if `vocab_size` or `seq_len` is zero.
	/// - `CapacityOverflow` if `vocab_size ^ seq_len` does not fit the
	///   table index type. The table grows exponentially in `seq_len`,
	///   so this is checked before any allocation happens.
	pub fn new(vocab_size: usize, seq_len: usize, smoothing: f32) -> Result<Self> {
		if vocab_size == 0 || seq_len == 0 {
			return Err(NGramError::InvalidCapacity);
		}
		debug_assert!(smoothing >= 0.0);

		let num_counts = u32::try_from(seq_len)
			.ok()
			.and_then(|exponent| vocab_size.checked_pow(exponent))
			.ok_or(NGramError::CapacityOverflow { vocab_size, seq_len })?;

		Ok(Self { vocab_size, seq_len, smoothing, counts: vec![0; num_counts] })
	}

	/// Number of distinct tokens.
	pub fn vocab_size(&self) -> usize {
		self.vocab_size
	}

	/// Window length, context plus one target token.
	pub fn seq_len(&self) -> usize {
		self.seq_len
	}

	/// Add-k smoothing constant.
	pub fn smoothing(&self) -> f32 {
		self.smoothing
	}

	/// Total number of windows counted so far.
	pub fn count_total(&self) -> u64 {
		self.counts.iter().map(|&count| u64::from(count)).sum()
	}

	/// Converts a tuple of tokens into a flat table offset.
	///
	/// Positional base-`vocab_size` notation: the first token is the
	/// most significant digit, the last one the least significant. For
	/// a fixed tuple length `k` this is a bijection between all token
	/// tuples and `[0, vocab_size ^ k)`.
	///
	/// # Errors
	/// Returns `InvalidToken` if any token is outside `[0, vocab_size)`.
	fn ravel_index(&self, tokens: &[Token]) -> Result<usize> {
		let mut offset = 0;
		let mut multiplier = 1;
		for &token in tokens.iter().rev() {
			if token >= self.vocab_size {
				return Err(NGramError::InvalidToken(token));
			}
			offset += multiplier * token;
			multiplier *= self.vocab_size;
		}
		Ok(offset)
	}

	/// Counts one window of exactly `seq_len` tokens.
	///
	/// # Errors
	/// - `InvalidWindowLength` if the window length differs from `seq_len`.
	/// - `InvalidToken` if any token is outside the vocabulary.
	pub fn train(&mut self, window: &[Token]) -> Result<()> {
		if window.len() != self.seq_len {
			return Err(NGramError::InvalidWindowLength {
				expected: self.seq_len,
				actual: window.len(),
			});
		}
		let offset = self.ravel_index(window)?;
		self.counts[offset] += 1;
		Ok(())
	}

	/// Consumes a loader and counts every window it yields.
	///
	/// Returns the number of windows trained on.
	pub fn train_all<I>(&mut self, loader: &mut DataLoader<I>) -> Result<usize>
	where
		I: Iterator<Item = char>,
	{
		let mut windows = 0;
		while let Some(window) = loader.next_window()? {
			self.train(window)?;
			windows += 1;
		}
		Ok(windows)
	}

	/// Smoothed next-token distribution for a context of `seq_len - 1`
	/// tokens.
	///
	/// The context addresses a contiguous row of `vocab_size` counters.
	/// When the raw row sum is zero the context was never observed and
	/// the result is the uniform distribution; this branch is distinct
	/// from the smoothed formula, which would otherwise shape unseen
	/// contexts after the smoothing constant. Both branches return a
	/// non-negative vector summing to 1 within floating-point tolerance.
	///
	/// # Errors
	/// - `InvalidContextLength` if the context length differs from `seq_len - 1`.
	/// - `InvalidToken` if any token is outside the vocabulary.
	pub fn infer(&self, context: &[Token]) -> Result<Vec<f32>> {
		if context.len() != self.seq_len - 1 {
			return Err(NGramError::InvalidContextLength {
				expected: self.seq_len - 1,
				actual: context.len(),
			});
		}

		// The row starts at the offset of the context extended with token 0.
		let mut digits = Vec::with_capacity(self.seq_len);
		digits.extend_from_slice(context);
		digits.push(0);
		let row_base = self.ravel_index(&digits)?;

		let row = &self.counts[row_base..row_base + self.vocab_size];
		let raw_sum: u64 = row.iter().map(|&count| u64::from(count)).sum();

		if raw_sum == 0 {
			let uniform = 1.0 / self.vocab_size as f32;
			return Ok(vec![uniform; self.vocab_size]);
		}

		let denominator = raw_sum as f32 + self.vocab_size as f32 * self.smoothing;
		Ok(row
			.iter()
			.map(|&count| (count as f32 + self.smoothing) / denominator)
			.collect())
	}

	/// Merges another model into this one by elementwise count addition.
	///
	/// Counts form a commutative monoid under addition, so models built
	/// on independent data shards can be combined in any order.
	///
	/// # Errors
	/// Returns `HyperparameterMismatch` if the two models differ in
	/// vocabulary size, window length or smoothing.
	pub fn merge(&mut self, other: &Self) -> Result<()> {
		if self.vocab_size != other.vocab_size
			|| self.seq_len != other.seq_len
			|| self.smoothing != other.smoothing
		{
			return Err(NGramError::HyperparameterMismatch);
		}

		for (count, &extra) in self.counts.iter_mut().zip(&other.counts) {
			*count += extra;
		}

		Ok(())
	}

	/// Loads a model from a binary cache next to the corpus file,
	/// rebuilding and re-caching it when the cache is absent, unreadable
	/// or was built with different hyperparameters.
	///
	/// # Parameters
	/// - `path`: Corpus of line-terminated fragments; the cache lives at
	///   the same path with a `bin` extension.
	/// - `tokenizer`: Fixes the vocabulary the corpus is encoded with.
	///
	/// # Behavior
	/// - A valid cache with matching hyperparameters is returned as-is.
	/// - Otherwise the corpus is read, counted in parallel and the
	///   merged model is serialized to the cache path for future runs.
	pub fn load_or_train<P: AsRef<Path>>(
		path: P,
		tokenizer: &Tokenizer,
		seq_len: usize,
		smoothing: f32,
	) -> Result<Self> {
		let cache_path = sibling_with_extension(&path, "bin")?;

		if cache_path.exists() {
			let bytes = std::fs::read(&cache_path)?;
			match postcard::from_bytes::<Self>(&bytes) {
				Ok(model)
					if model.vocab_size == tokenizer.vocab_size()
						&& model.seq_len == seq_len
						&& model.smoothing == smoothing =>
				{
					tracing::info!("Loaded cached model from {}", cache_path.display());
					return Ok(model);
				}
				Ok(_) => {
					tracing::warn!(
						"Cached model at {} has different hyperparameters, rebuilding",
						cache_path.display()
					);
				}
				Err(error) => {
					tracing::warn!(
						"Failed to decode cached model at {}: {}, rebuilding",
						cache_path.display(),
						error
					);
				}
			}
		}

		let lines = read_lines(&path)?;
		let model = Self::train_lines(&lines, tokenizer, seq_len, smoothing)?;

		let bytes = postcard::to_stdvec(&model)?;
		std::fs::write(&cache_path, bytes)?;

		Ok(model)
	}

	/// Builds a model from corpus lines, fanning the counting out across
	/// threads.
	///
	/// # Behavior
	/// - Splits the lines into chunks (CPU cores * factor).
	/// - Each thread counts its chunk into a private model.
	/// - Partial models are merged by elementwise addition on this thread.
	///
	/// # Notes
	/// - Every chunk after the first is prefixed with one separator so
	///   windows that open on the separator between two chunks are still
	///   counted. Windows whose context reaches further back across a
	///   chunk boundary are not recovered.
	/// - Uses MPSC channels to collect the partial models.
	pub fn train_lines(
		lines: &[String],
		tokenizer: &Tokenizer,
		seq_len: usize,
		smoothing: f32,
	) -> Result<Self> {
		let mut merged = Self::new(tokenizer.vocab_size(), seq_len, smoothing)?;
		if lines.is_empty() {
			return Ok(merged);
		}

		let cpus = num_cpus::get();
		let factor = 8;
		let chunks = cpus * factor;
		let chunk_size = (lines.len() + chunks - 1) / chunks;
		tracing::info!(
			"Counting {} lines in chunks of up to {} lines",
			lines.len(),
			chunk_size
		);

		let (tx, rx) = mpsc::channel();
		for (index, chunk) in lines.chunks(chunk_size).enumerate() {
			let tx = tx.clone();
			let chunk: Vec<String> = chunk.to_vec();
			let tokenizer = tokenizer.clone();

			thread::spawn(move || {
				let partial = Self::train_chunk(&chunk, &tokenizer, seq_len, smoothing, index > 0);
				tx.send(partial).expect("Failed to send from thread");
			});
		}
		drop(tx);

		for partial in rx.iter() {
			merged.merge(&partial?)?;
		}

		Ok(merged)
	}

	/// Counts one chunk of lines into a fresh model.
	fn train_chunk(
		lines: &[String],
		tokenizer: &Tokenizer,
		seq_len: usize,
		smoothing: f32,
		leading_separator: bool,
	) -> Result<Self> {
		let mut text = String::new();
		if leading_separator {
			text.push('\n');
		}
		for line in lines {
			text.push_str(line);
			text.push('\n');
		}

		let mut model = Self::new(tokenizer.vocab_size(), seq_len, smoothing)?;
		let mut loader = DataLoader::new(text.chars(), tokenizer.clone(), seq_len);
		model.train_all(&mut loader)?;
		Ok(model)
	}
}
