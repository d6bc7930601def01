//! Splitting raw sentences into word tokens.
//!
//! Case folding is not done here: the counting engine lower-cases every token
//! it receives.

use unicode_segmentation::UnicodeSegmentation;

/// Splits a raw sentence into an ordered sequence of tokens.
///
/// Implementations must be `Sync` to be shared by counting workers.
pub trait Tokenizer {
	fn tokenize(&self, sentence: &str) -> Vec<String>;
}

/// Splits on Unicode whitespace only.
#[derive(Clone, Copy, Debug, Default)]
pub struct WhitespaceTokenizer;

impl Tokenizer for WhitespaceTokenizer {
	fn tokenize(&self, sentence: &str) -> Vec<String> {
		sentence.split_whitespace().map(str::to_owned).collect()
	}
}

/// Splits on Unicode word boundaries (UAX #29), dropping whitespace segments.
///
/// Punctuation becomes its own token, while numbers and contractions stay
/// whole: `"it's 3.14."` becomes `["it's", "3.14", "."]`.
#[derive(Clone, Copy, Debug, Default)]
pub struct WordTokenizer;

impl Tokenizer for WordTokenizer {
	fn tokenize(&self, sentence: &str) -> Vec<String> {
		sentence
			.split_word_bounds()
			.filter(|segment| !segment.trim().is_empty())
			.map(str::to_owned)
			.collect()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_whitespace_tokenizer() {
		let tokens = WhitespaceTokenizer.tokenize("  The cat\tsat. ");
		assert_eq!(vec!["The", "cat", "sat."], tokens);
	}

	#[test]
	fn test_word_tokenizer_punctuation() {
		let tokens = WordTokenizer.tokenize("Hello, world: it's well-known.");
		assert_eq!(vec!["Hello", ",", "world", ":", "it's", "well", "-", "known", "."], tokens);
	}

	#[test]
	fn test_word_tokenizer_keeps_numbers() {
		let tokens = WordTokenizer.tokenize("pi is 3.14, roughly.");
		assert_eq!(vec!["pi", "is", "3.14", ",", "roughly", "."], tokens);
	}

	#[test]
	fn test_word_tokenizer_trailing_joiner() {
		let tokens = WordTokenizer.tokenize("rock- 'n'");
		assert_eq!(vec!["rock", "-", "'", "n", "'"], tokens);
	}

	#[test]
	fn test_empty_sentence() {
		assert!(WordTokenizer.tokenize("").is_empty());
		assert!(WhitespaceTokenizer.tokenize("   ").is_empty());
	}
}
