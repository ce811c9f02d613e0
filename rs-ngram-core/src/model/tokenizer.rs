use serde::{Deserialize, Serialize};

use crate::error::{NGramError, Result};

/// Dense integer code for a single symbol, always in `[0, vocab_size)`.
pub type Token = usize;

/// Code of the sentinel symbol that marks both sequence start and end.
pub const SENTINEL_TOKEN: Token = 0;

/// Bidirectional mapping between a fixed, ordered alphabet and dense
/// integer codes.
///
/// The sentinel symbol is encoded as [`SENTINEL_TOKEN`]; the i-th
/// alphabet symbol is encoded as `i + 1`. The vocabulary size is the
/// alphabet length plus one.
///
/// # Invariants
/// - `decode(encode(s)) == s` for every symbol of the alphabet
/// - `encode(decode(t)) == t` for every token in `[0, vocab_size)`
/// - The alphabet must not repeat symbols or contain the sentinel
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Tokenizer {
	/// Symbol separating sequences, encoded as token 0.
	sentinel: char,

	/// Ordered alphabet, symbol i encoded as token i + 1.
	alphabet: Vec<char>,
}

impl Tokenizer {
	/// Creates a tokenizer for the given alphabet and sentinel symbol.
	pub fn new(alphabet: &str, sentinel: char) -> Self {
		let alphabet: Vec<char> = alphabet.chars().collect();
		debug_assert!(!alphabet.contains(&sentinel));
		Self { sentinel, alphabet }
	}

	/// Creates the default tokenizer: 26 lowercase letters plus the
	/// newline sentinel, for a vocabulary of 27 tokens.
	pub fn lowercase() -> Self {
		Self { sentinel: '\n', alphabet: ('a'..='z').collect() }
	}

	/// Number of distinct tokens, alphabet length plus the sentinel.
	pub fn vocab_size(&self) -> usize {
		self.alphabet.len() + 1
	}

	/// Maps a symbol to its token code.
	///
	/// # Errors
	/// Returns `InvalidSymbol` if the character is neither the sentinel
	/// nor part of the alphabet.
	pub fn encode(&self, symbol: char) -> Result<Token> {
		if symbol == self.sentinel {
			return Ok(SENTINEL_TOKEN);
		}
		match self.alphabet.iter().position(|&c| c == symbol) {
			Some(position) => Ok(position + 1),
			None => Err(NGramError::InvalidSymbol(symbol)),
		}
	}

	/// Maps a token code back to its symbol. Exact inverse of `encode`.
	///
	/// # Errors
	/// Returns `InvalidToken` if the code is outside `[0, vocab_size)`.
	pub fn decode(&self, token: Token) -> Result<char> {
		if token == SENTINEL_TOKEN {
			return Ok(self.sentinel);
		}
		match self.alphabet.get(token - 1) {
			Some(&symbol) => Ok(symbol),
			None => Err(NGramError::InvalidToken(token)),
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_encode_decode_round_trip() {
		let tokenizer = Tokenizer::lowercase();
		for symbol in ('a'..='z').chain(std::iter::once('\n')) {
			let token = tokenizer.encode(symbol).unwrap();
			assert_eq!(tokenizer.decode(token).unwrap(), symbol);
		}
	}

	#[test]
	fn test_decode_encode_round_trip() {
		let tokenizer = Tokenizer::lowercase();
		for token in 0..tokenizer.vocab_size() {
			let symbol = tokenizer.decode(token).unwrap();
			assert_eq!(tokenizer.encode(symbol).unwrap(), token);
		}
	}

	#[test]
	fn test_sentinel_is_token_zero() {
		let tokenizer = Tokenizer::lowercase();
		assert_eq!(tokenizer.encode('\n').unwrap(), SENTINEL_TOKEN);
		assert_eq!(tokenizer.encode('a').unwrap(), 1);
		assert_eq!(tokenizer.encode('z').unwrap(), 26);
	}

	#[test]
	fn test_encode_rejects_foreign_symbols() {
		let tokenizer = Tokenizer::lowercase();
		for symbol in ['A', '0', ' ', 'é'] {
			assert!(matches!(
				tokenizer.encode(symbol),
				Err(NGramError::InvalidSymbol(s)) if s == symbol
			));
		}
	}

	#[test]
	fn test_decode_rejects_out_of_range_tokens() {
		let tokenizer = Tokenizer::lowercase();
		assert!(matches!(
			tokenizer.decode(27),
			Err(NGramError::InvalidToken(27))
		));
	}

	#[test]
	fn test_custom_alphabet() {
		let tokenizer = Tokenizer::new("ab", '\n');
		assert_eq!(tokenizer.vocab_size(), 3);
		assert_eq!(tokenizer.encode('b').unwrap(), 2);
		assert_eq!(tokenizer.decode(1).unwrap(), 'a');
		assert!(tokenizer.encode('c').is_err());
	}
}
