use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::ngram::NGram;

/// n-gram -> natural-log smoothed probability.
pub type ProbabilityMap = HashMap<NGram, f64>;

/// Log-probabilities indexed by order, then by prefix.
///
/// Each bucket `[order][prefix]` lists every scored n-gram of that order
/// starting with `prefix`, in insertion order (no sorting). Unigrams are also
/// reachable directly by word.
///
/// # Invariants
/// - Every n-gram in bucket `[k][p]` has length `k` and starts with `p`
/// - `unigrams[w]` is present iff `(w,)` is in bucket `[1][()]`
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq)]
pub struct StructuredModel {
	/// Highest order present
	order: usize,

	/// order -> (prefix -> [(n-gram, log-probability)])
	buckets: HashMap<usize, HashMap<NGram, Vec<(NGram, f64)>>>,

	/// word -> (word, log-probability)
	unigrams: HashMap<String, (String, f64)>,
}

impl StructuredModel {
	/// Reorganizes a flat probability map in a single pass.
	pub fn from_probabilities(probabilities: &ProbabilityMap) -> Self {
		let mut model = Self::default();
		for (ngram, &log_prob) in probabilities {
			model.insert(ngram, log_prob);
		}
		model
	}

	fn insert(&mut self, ngram: &[String], log_prob: f64) {
		let order = ngram.len();
		if order == 0 {
			return;
		}
		self.order = self.order.max(order);
		if order == 1 {
			self.unigrams.insert(ngram[0].clone(), (ngram[0].clone(), log_prob));
		}
		self.buckets
			.entry(order)
			.or_default()
			.entry(ngram[..order - 1].to_vec())
			.or_default()
			.push((ngram.to_vec(), log_prob));
	}

	/// Highest order present in the model.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of scored n-grams.
	pub fn len(&self) -> usize {
		self.buckets
			.values()
			.flat_map(HashMap::values)
			.map(Vec::len)
			.sum()
	}

	pub fn is_empty(&self) -> bool {
		self.len() == 0
	}

	/// Scored n-grams of `order` starting with `prefix`.
	pub fn bucket(&self, order: usize, prefix: &[String]) -> Option<&[(NGram, f64)]> {
		self.buckets.get(&order)?.get(prefix).map(Vec::as_slice)
	}

	/// Direct unigram lookup.
	pub fn unigram(&self, word: &str) -> Option<(&str, f64)> {
		self.unigrams.get(word).map(|(w, p)| (w.as_str(), *p))
	}

	/// Words of the vocabulary, sentinels included.
	pub fn vocabulary(&self) -> impl Iterator<Item = &str> {
		self.unigrams.keys().map(String::as_str)
	}

	/// Most probable word following the context, using an n-gram of `order`.
	///
	/// The context is the trailing `order - 1` tokens of `prefix`. Ties go to
	/// the lexicographically smallest word.
	///
	/// Returns `None` if `order` is 0, the prefix is too short or the context
	/// was never observed.
	pub fn best_next(&self, prefix: &[String], order: usize) -> Option<(&str, f64)> {
		if order == 0 || prefix.len() < order - 1 {
			return None;
		}
		let context = &prefix[prefix.len() - (order - 1)..];
		let mut best: Option<(&str, f64)> = None;
		for (ngram, log_prob) in self.bucket(order, context)? {
			let word = ngram[ngram.len() - 1].as_str();
			best = match best {
				Some((w, p)) if p > *log_prob || (p == *log_prob && w <= word) => Some((w, p)),
				_ => Some((word, *log_prob)),
			};
		}
		best
	}

	/// [`StructuredModel::best_next`], dropping the oldest context word until
	/// a context matches.
	///
	/// Stops at a one-word context: `None` means that no context of any
	/// order was observed.
	pub fn best_next_with_backoff(&self, prefix: &[String], order: usize) -> Option<(&str, f64)> {
		let mut order = order.min(prefix.len() + 1);
		while order >= 2 {
			if let Some(best) = self.best_next(prefix, order) {
				return Some(best);
			}
			log::trace!("no context of order {} for {:?}, backing off", order, prefix);
			order -= 1;
		}
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ngram::ngram;

	fn probabilities() -> ProbabilityMap {
		HashMap::from([
			(ngram(&["the"]), -1.0),
			(ngram(&["cat"]), -2.0),
			(ngram(&["the", "cat"]), -0.4),
			(ngram(&["the", "dog"]), -1.1),
			(ngram(&["cat", "sat"]), -0.2),
			(ngram(&["<s>", "the", "cat"]), -0.3),
		])
	}

	#[test]
	fn test_structure() {
		let model = StructuredModel::from_probabilities(&probabilities());

		assert_eq!(3, model.order());
		assert_eq!(6, model.len());
		assert_eq!(Some(("the", -1.0)), model.unigram("the"));
		assert_eq!(None, model.unigram("dog"));

		let unigrams = model.bucket(1, &[]).unwrap();
		assert_eq!(2, unigrams.len());

		let mut after_the: Vec<_> = model
			.bucket(2, &ngram(&["the"]))
			.unwrap()
			.iter()
			.map(|(g, _)| g[1].as_str())
			.collect();
		after_the.sort();
		assert_eq!(vec!["cat", "dog"], after_the);
	}

	#[test]
	fn test_best_next() {
		let model = StructuredModel::from_probabilities(&probabilities());
		assert_eq!(Some(("cat", -0.4)), model.best_next(&ngram(&["the"]), 2));
		// only the trailing context is used
		assert_eq!(Some(("sat", -0.2)), model.best_next(&ngram(&["the", "cat"]), 2));
		assert_eq!(Some(("cat", -0.3)), model.best_next(&ngram(&["<s>", "the"]), 3));
		assert_eq!(None, model.best_next(&ngram(&["dog"]), 2));
		assert_eq!(None, model.best_next(&[], 2));
	}

	#[test]
	fn test_best_next_tie_break() {
		let probabilities = HashMap::from([
			(ngram(&["a", "y"]), -0.5),
			(ngram(&["a", "x"]), -0.5),
			(ngram(&["a", "z"]), -0.5),
		]);
		let model = StructuredModel::from_probabilities(&probabilities);
		assert_eq!(Some(("x", -0.5)), model.best_next(&ngram(&["a"]), 2));
	}

	#[test]
	fn test_best_next_with_backoff() {
		let model = StructuredModel::from_probabilities(&probabilities());
		// (zebra, cat) unseen at order 3, (cat) seen at order 2
		assert_eq!(Some(("sat", -0.2)), model.best_next_with_backoff(&ngram(&["zebra", "cat"]), 3));
		assert_eq!(None, model.best_next_with_backoff(&ngram(&["zebra", "quux"]), 3));
		assert_eq!(None, model.best_next_with_backoff(&[], 3));
	}
}
