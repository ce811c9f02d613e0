use crate::error::Result;
use super::ngram_model::NGramModel;
use super::rng::RandomState;
use super::tape::Tape;
use super::tokenizer::{SENTINEL_TOKEN, Token, Tokenizer};

/// Returns the smallest index whose cumulative probability reaches `coin`.
///
/// Inverse-CDF sampling over a discrete distribution: walks the vector
/// accumulating probability mass until it covers the coin. When rounding
/// leaves the cumulative sum just short of the coin at the end of the
/// vector, the last index is returned, so the result is always a valid
/// index into a non-empty vector.
pub fn sample_discrete(probabilities: &[f32], coin: f32) -> usize {
	let mut cumulative = 0.0;
	for (index, &probability) in probabilities.iter().enumerate() {
		cumulative += probability;
		if cumulative >= coin {
			return index;
		}
	}
	probabilities.len() - 1
}

/// Autoregressive sequence generator.
///
/// Owns the random stream and the length cap; borrows a model and a
/// tokenizer per call, so one generator can serve several models while
/// keeping a single reproducible stream of draws.
///
/// # Responsibilities
/// - Draw tokens from a model's next-token distributions
/// - Maintain the rolling context across generation steps
/// - Stop on the sentinel token or at the configured maximum length
#[derive(Clone, Debug)]
pub struct Generator {
	rng: RandomState,
	max_length: usize,
}

impl Generator {
	/// Creates a generator with a fixed seed and a maximum sequence length.
	///
	/// The cap bounds generation when the model never samples the
	/// sentinel, which can happen with smoothing 0 and a looping corpus.
	pub fn new(seed: u64, max_length: usize) -> Self {
		Self { rng: RandomState::new(seed), max_length }
	}

	/// Draws one token from a next-token distribution.
	pub fn sample(&mut self, probabilities: &[f32]) -> Token {
		sample_discrete(probabilities, self.rng.random_f32())
	}

	/// Generates one sequence from the model, decoded to a string.
	///
	/// The context starts as `seq_len - 1` sentinel tokens, the model
	/// state at a sequence boundary. Each step infers the next-token
	/// distribution, samples from it and shifts the sampled token into
	/// the context. Generation ends when the sentinel is sampled or the
	/// output reaches the maximum length; the sentinel itself is not
	/// part of the output.
	///
	/// # Errors
	/// Propagates `InvalidContextLength` / `InvalidToken` from the model
	/// when it was built for a different vocabulary than the tokenizer.
	pub fn generate(&mut self, model: &NGramModel, tokenizer: &Tokenizer) -> Result<String> {
		let mut context = Tape::new(model.seq_len() - 1);
		context.reset_with(SENTINEL_TOKEN);

		let mut output = String::new();
		while output.chars().count() < self.max_length {
			let probabilities = model.infer(context.tokens())?;
			let token = self.sample(&probabilities);
			if token == SENTINEL_TOKEN {
				break;
			}
			output.push(tokenizer.decode(token)?);
			context.push(token);
		}

		Ok(output)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ab_model(windows: &[[Token; 2]]) -> NGramModel {
		let mut model = NGramModel::new(3, 2, 0.0).unwrap();
		for window in windows {
			model.train(window).unwrap();
		}
		model
	}

	#[test]
	fn test_sample_discrete_picks_first_covering_index() {
		let probabilities = [0.2, 0.3, 0.5];
		assert_eq!(sample_discrete(&probabilities, 0.0), 0);
		assert_eq!(sample_discrete(&probabilities, 0.2), 0);
		assert_eq!(sample_discrete(&probabilities, 0.21), 1);
		assert_eq!(sample_discrete(&probabilities, 0.5), 1);
		assert_eq!(sample_discrete(&probabilities, 0.9), 2);
	}

	#[test]
	fn test_sample_discrete_clamps_on_rounding_shortfall() {
		// mass sums to slightly below 1, a coin above it must still land
		let probabilities = [0.3, 0.3, 0.3999];
		assert_eq!(sample_discrete(&probabilities, 0.99999), 2);
	}

	#[test]
	fn test_deterministic_rows_force_the_sequence() {
		// sentinel -> a, a -> b, b -> sentinel, all with certainty
		let model = ab_model(&[[0, 1], [1, 2], [2, 0]]);
		let tokenizer = Tokenizer::new("ab", '\n');

		let mut generator = Generator::new(42, 100);
		assert_eq!(generator.generate(&model, &tokenizer).unwrap(), "ab");
	}

	#[test]
	fn test_same_seed_same_sequences() {
		let model = ab_model(&[[0, 1], [1, 1], [1, 2], [2, 0], [0, 2]]);
		let tokenizer = Tokenizer::new("ab", '\n');

		let mut first = Generator::new(1337, 100);
		let mut second = Generator::new(1337, 100);
		for _ in 0..20 {
			assert_eq!(
				first.generate(&model, &tokenizer).unwrap(),
				second.generate(&model, &tokenizer).unwrap()
			);
		}
	}

	#[test]
	fn test_max_length_caps_non_terminating_models() {
		// a always follows both the sentinel and itself, so the model
		// never emits the sentinel and only the cap stops generation
		let model = ab_model(&[[0, 1], [1, 1]]);
		let tokenizer = Tokenizer::new("ab", '\n');

		let mut generator = Generator::new(7, 12);
		assert_eq!(generator.generate(&model, &tokenizer).unwrap(), "aaaaaaaaaaaa");
	}

	#[test]
	fn test_unigram_model_generates() {
		// seq_len 1 leaves an empty context, the degenerate unigram case
		let mut model = NGramModel::new(3, 1, 0.0).unwrap();
		for window in [[1], [1], [2], [0]] {
			model.train(&window).unwrap();
		}
		let tokenizer = Tokenizer::new("ab", '\n');

		let mut generator = Generator::new(99, 50);
		let word = generator.generate(&model, &tokenizer).unwrap();
		assert!(word.chars().all(|c| c == 'a' || c == 'b'));
		assert!(word.chars().count() <= 50);
	}
}
