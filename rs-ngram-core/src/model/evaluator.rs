use std::path::Path;

use crate::error::{NGramError, Result};
use super::dataloader::DataLoader;
use super::ngram_model::NGramModel;
use super::tokenizer::Tokenizer;

/// Aggregate quality of a model over one data split.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Metrics {
	/// Mean negative log-likelihood of the targets, natural log.
	pub mean_nll: f64,

	/// `exp(mean_nll)`; 1.0 is a perfect deterministic fit.
	pub perplexity: f64,
}

/// Scores a model over every window a loader yields.
///
/// Each window splits into a context and a target token; the model
/// infers the next-token distribution for the context and the target's
/// probability contributes `-ln p` to the total. The mean over all
/// windows is reported together with its exponential, the perplexity.
///
/// # Errors
/// - `EmptySplit` if the loader yields no window at all.
/// - Propagates tokenizer and model errors from the underlying calls.
pub fn evaluate<I>(model: &NGramModel, loader: &mut DataLoader<I>) -> Result<Metrics>
where
	I: Iterator<Item = char>,
{
	let mut total_nll = 0.0;
	let mut windows = 0u64;

	while let Some(window) = loader.next_window()? {
		let (context, target) = window.split_at(window.len() - 1);
		let probabilities = model.infer(context)?;
		total_nll -= f64::from(probabilities[target[0]]).ln();
		windows += 1;
	}

	if windows == 0 {
		return Err(NGramError::EmptySplit);
	}

	let mean_nll = total_nll / windows as f64;
	let metrics = Metrics { mean_nll, perplexity: mean_nll.exp() };
	tracing::debug!(
		"Evaluated {} windows: mean nll {:.6}, perplexity {:.6}",
		windows,
		metrics.mean_nll,
		metrics.perplexity
	);
	Ok(metrics)
}

/// Scores a model over the contents of a text file.
pub fn evaluate_file<P: AsRef<Path>>(
	model: &NGramModel,
	tokenizer: &Tokenizer,
	path: P,
) -> Result<Metrics> {
	let mut loader = DataLoader::from_file(path, tokenizer.clone(), model.seq_len())?;
	evaluate(model, &mut loader)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn ab_tokenizer() -> Tokenizer {
		Tokenizer::new("ab", '\n')
	}

	fn trained_on(text: &str, smoothing: f32) -> NGramModel {
		let tokenizer = ab_tokenizer();
		let mut model = NGramModel::new(tokenizer.vocab_size(), 2, smoothing).unwrap();
		let mut loader = DataLoader::new(text.chars(), tokenizer, 2);
		model.train_all(&mut loader).unwrap();
		model
	}

	fn score(model: &NGramModel, text: &str) -> Metrics {
		let mut loader = DataLoader::new(text.chars(), ab_tokenizer(), model.seq_len());
		evaluate(model, &mut loader).unwrap()
	}

	#[test]
	fn test_perfect_fit_has_perplexity_one() {
		// every context in the stream has a single observed successor
		let text = "ab\nab\n";
		let model = trained_on(text, 0.0);

		let metrics = score(&model, text);
		assert!(metrics.mean_nll.abs() < 1e-6);
		assert!((metrics.perplexity - 1.0).abs() < 1e-6);
	}

	#[test]
	fn test_perplexity_is_exp_of_mean_nll() {
		let text = "ab\nb\naab\n";
		let model = trained_on(text, 0.5);

		let metrics = score(&model, text);
		assert!((metrics.perplexity - metrics.mean_nll.exp()).abs() < 1e-9);
		assert!(metrics.perplexity >= 1.0);
	}

	#[test]
	fn test_smoothing_raises_training_perplexity() {
		// the raw counts are the maximum-likelihood fit of the training
		// data, so any smoothing strictly hurts once rows are non-uniform
		let text = "ab\nab\nb\n";
		let exact = trained_on(text, 0.0);
		let light = trained_on(text, 0.5);
		let heavy = trained_on(text, 2.0);

		let exact_ppl = score(&exact, text).perplexity;
		let light_ppl = score(&light, text).perplexity;
		let heavy_ppl = score(&heavy, text).perplexity;

		assert!(exact_ppl >= 1.0);
		assert!(exact_ppl < light_ppl);
		assert!(light_ppl < heavy_ppl);
	}

	#[test]
	fn test_empty_split_is_reported() {
		let model = trained_on("ab\n", 0.0);
		let mut loader = DataLoader::new("a".chars(), ab_tokenizer(), 2);
		assert!(matches!(evaluate(&model, &mut loader), Err(NGramError::EmptySplit)));
	}

	#[test]
	fn test_evaluate_file_matches_in_memory_evaluation() {
		let text = "ab\nb\n";
		let model = trained_on(text, 0.1);

		let path = std::env::temp_dir().join("rs-ngram-evaluator-test.txt");
		std::fs::write(&path, text).unwrap();
		let from_file = evaluate_file(&model, &ab_tokenizer(), &path).unwrap();
		std::fs::remove_file(&path).unwrap();

		assert_eq!(from_file, score(&model, text));
	}
}
