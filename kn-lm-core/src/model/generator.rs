use rand::prelude::IteratorRandom;

use super::ngram::{END, START};
use super::structured::StructuredModel;

/// Tokens written without a leading space.
const ATTACHED: [&str; 4] = [".", ",", ";", ":"];

/// Greedy sentence generator over a structured model.
///
/// Starting from a first word, repeatedly appends the most probable next
/// word, backing off to shorter contexts when the current one was never
/// observed, until the end sentinel or the word cap is reached.
#[derive(Debug, Clone, Copy)]
pub struct Generator<'a> {
	model: &'a StructuredModel,
	max_words: usize,
}

impl<'a> Generator<'a> {
	/// Default cap on generated words. Greedy decoding can cycle.
	pub const DEFAULT_MAX_WORDS: usize = 50;

	pub fn new(model: &'a StructuredModel) -> Self {
		Self {
			model,
			max_words: Self::DEFAULT_MAX_WORDS,
		}
	}

	pub fn with_max_words(mut self, max_words: usize) -> Self {
		self.max_words = max_words;
		self
	}

	/// A random non-sentinel word of the vocabulary.
	pub fn random_first_word(&self) -> Option<&'a str> {
		self.model
			.vocabulary()
			.filter(|w| *w != START && *w != END)
			.choose(&mut rand::rng())
	}

	/// Generates the tokens following `first_word` (the word itself first).
	///
	/// Returns `None` if no context starting from `first_word` was observed.
	/// A later dead end ends the sentence.
	pub fn generate_tokens(&self, first_word: &str) -> Option<Vec<String>> {
		let order = self.model.order();
		if order < 2 {
			return None;
		}

		let mut context: Vec<String> = vec![START.to_owned(); order - 2];
		context.push(first_word.to_lowercase());
		let mut generated = vec![first_word.to_owned()];

		while generated.len() < self.max_words {
			let (next, _) = match self.model.best_next_with_backoff(&context, order) {
				Some(best) => best,
				None if generated.len() == 1 => return None,
				None => break,
			};
			if next == END {
				break;
			}
			generated.push(next.to_owned());
			context.push(next.to_owned());
			if context.len() > order - 1 {
				context.remove(0);
			}
		}
		Some(generated)
	}

	/// Generates a sentence starting with `first_word`.
	///
	/// Tokens are joined with single spaces, except before `. , ; :`.
	pub fn generate(&self, first_word: &str) -> Option<String> {
		let tokens = self.generate_tokens(first_word)?;
		let mut sentence = String::new();
		for (i, token) in tokens.iter().enumerate() {
			if i > 0 && !ATTACHED.contains(&token.as_str()) {
				sentence.push(' ');
			}
			sentence.push_str(token);
		}
		Some(sentence)
	}
}
