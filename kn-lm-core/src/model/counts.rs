use std::collections::{HashMap, HashSet};
use std::hash::Hash;
use std::iter;

use serde::{Deserialize, Serialize};

use super::ngram::{self, END, NGram, START};
use crate::errors::{KnError, Result};
use crate::tokenizer::Tokenizer;

/// Raw n-gram statistics for every order `1..=order`.
///
/// Holds the frequency table and the auxiliary counts that Kneser-Ney
/// smoothing needs. Filled by [`NGramCounts::ingest`], one sentence at a time,
/// and read-only afterwards.
///
/// # Responsibilities
/// - Pad, window and count sentences for each order
/// - Maintain the set-valued continuation, succession and backoff structures
/// - Merge with another partial count (sharded counting)
///
/// # Invariants
/// - `frequencies` always contains the reserved `[UNK]` unigram with count 0
/// - `per_order` is a partition of `frequencies` without `[UNK]`
/// - Set-valued maps never hold duplicates
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct NGramCounts {
	/// Highest order counted (`N`)
	order: usize,

	/// n-gram (any order) -> frequency
	frequencies: HashMap<NGram, u64>,

	/// order -> (n-gram -> frequency)
	per_order: HashMap<usize, HashMap<NGram, u64>>,

	/// prefix -> (full n-gram -> frequency)
	prefix_full: HashMap<NGram, HashMap<NGram, u64>>,

	/// n-gram without first word -> full n-grams (orders > 2)
	continuations: HashMap<NGram, HashSet<NGram>>,

	/// n-gram without first and final words -> full n-grams (orders > 2)
	inner_continuations: HashMap<NGram, HashSet<NGram>>,

	/// prefix -> distinct final words (orders > 1)
	successions: HashMap<NGram, HashSet<String>>,

	/// n-gram without first word -> full n-grams (orders > 1)
	no_first_word: HashMap<NGram, HashSet<NGram>>,

	/// Number of ingested sentences
	sentences: usize,
}

fn bump(map: &mut HashMap<NGram, u64>, key: &[String], by: u64) {
	match map.get_mut(key) {
		Some(count) => *count += by,
		None => {
			map.insert(key.to_vec(), by);
		}
	}
}

fn insert_member<T>(map: &mut HashMap<NGram, HashSet<T>>, key: &[String], member: T)
where
	T: Eq + Hash,
{
	match map.get_mut(key) {
		Some(set) => {
			set.insert(member);
		}
		None => {
			map.insert(key.to_vec(), HashSet::from([member]));
		}
	}
}

fn union_sets<T>(target: &mut HashMap<NGram, HashSet<T>>, other: HashMap<NGram, HashSet<T>>)
where
	T: Eq + Hash,
{
	for (key, set) in other {
		target.entry(key).or_default().extend(set);
	}
}

fn sum_counts(target: &mut HashMap<NGram, u64>, other: HashMap<NGram, u64>) {
	for (key, count) in other {
		*target.entry(key).or_insert(0) += count;
	}
}

impl NGramCounts {
	/// Creates empty counts for orders `1..=order`.
	///
	/// # Errors
	/// Returns an error if `order` is 0.
	pub fn new(order: usize) -> Result<Self> {
		if order == 0 {
			return Err(KnError::invalid_argument("order", "must be at least 1"));
		}
		let mut frequencies = HashMap::new();
		frequencies.insert(ngram::unknown(), 0);
		Ok(Self {
			order,
			frequencies,
			per_order: HashMap::new(),
			prefix_full: HashMap::new(),
			continuations: HashMap::new(),
			inner_continuations: HashMap::new(),
			successions: HashMap::new(),
			no_first_word: HashMap::new(),
			sentences: 0,
		})
	}

	/// Tokenizes a raw sentence and counts it.
	pub fn ingest<T>(&mut self, sentence: &str, tokenizer: &T)
	where
		T: Tokenizer + ?Sized,
	{
		let tokens = tokenizer.tokenize(sentence);
		self.ingest_tokens(&tokens);
	}

	/// Counts an already tokenized sentence for every order.
	///
	/// # Notes
	/// - Tokens are lower-cased.
	/// - Order `k` is padded with `k` start and `k` end sentinels, so even an
	///   empty sentence produces n-grams made of sentinels only.
	pub fn ingest_tokens<S: AsRef<str>>(&mut self, tokens: &[S]) {
		let lowered: Vec<String> = tokens.iter().map(|t| t.as_ref().to_lowercase()).collect();

		for k in 1..=self.order {
			let padded: Vec<String> = iter::repeat_n(START.to_owned(), k)
				.chain(lowered.iter().cloned())
				.chain(iter::repeat_n(END.to_owned(), k))
				.collect();
			for window in padded.windows(k) {
				self.record(window);
			}
		}
		self.sentences += 1;
	}

	fn record(&mut self, window: &[String]) {
		let k = window.len();
		bump(&mut self.frequencies, window, 1);
		bump(self.per_order.entry(k).or_default(), window, 1);

		let prefix = ngram::prefix(window);
		match self.prefix_full.get_mut(prefix) {
			Some(full) => bump(full, window, 1),
			None => {
				self.prefix_full
					.insert(prefix.to_vec(), HashMap::from([(window.to_vec(), 1)]));
			}
		}

		if k > 1 {
			insert_member(&mut self.successions, prefix, window[k - 1].clone());
			insert_member(&mut self.no_first_word, ngram::suffix(window), window.to_vec());
		}
		if k > 2 {
			insert_member(&mut self.continuations, ngram::suffix(window), window.to_vec());
			insert_member(&mut self.inner_continuations, ngram::inner(window), window.to_vec());
		}
	}

	/// Merges another partial count into this one.
	///
	/// Frequencies are summed and sets are united key by key, so merging
	/// shards in any order yields the same counts as a single pass.
	///
	/// # Errors
	/// Returns an error if the orders do not match.
	pub fn merge(&mut self, other: Self) -> Result<()> {
		if self.order != other.order {
			return Err(KnError::invalid_argument(
				"other",
				format!("order mismatch: {} != {}", self.order, other.order),
			));
		}

		sum_counts(&mut self.frequencies, other.frequencies);
		for (k, table) in other.per_order {
			sum_counts(self.per_order.entry(k).or_default(), table);
		}
		for (prefix, full) in other.prefix_full {
			sum_counts(self.prefix_full.entry(prefix).or_default(), full);
		}
		union_sets(&mut self.continuations, other.continuations);
		union_sets(&mut self.inner_continuations, other.inner_continuations);
		union_sets(&mut self.successions, other.successions);
		union_sets(&mut self.no_first_word, other.no_first_word);
		self.sentences += other.sentences;

		Ok(())
	}

	/// Highest order counted.
	pub fn order(&self) -> usize {
		self.order
	}

	/// Number of sentences ingested.
	pub fn sentences(&self) -> usize {
		self.sentences
	}

	/// The full frequency table, `[UNK]` included.
	pub fn frequencies(&self) -> &HashMap<NGram, u64> {
		&self.frequencies
	}

	/// Frequencies of the n-grams of a single order.
	pub fn order_frequencies(&self, order: usize) -> Option<&HashMap<NGram, u64>> {
		self.per_order.get(&order)
	}

	/// Raw frequency of an n-gram, 0 when unseen.
	pub fn frequency(&self, ngram: &[String]) -> u64 {
		self.frequencies.get(ngram).copied().unwrap_or(0)
	}

	/// Whether the n-gram has an entry in the frequency table.
	pub fn contains(&self, ngram: &[String]) -> bool {
		self.frequencies.contains_key(ngram)
	}

	/// Number of distinct n-grams of all orders, `[UNK]` included.
	pub fn distinct_ngrams(&self) -> usize {
		self.frequencies.len()
	}

	/// Number of distinct observed unigrams.
	pub fn distinct_unigrams(&self) -> usize {
		self.per_order.get(&1).map_or(0, HashMap::len)
	}

	/// Sum of the frequencies of every n-gram starting with `prefix`.
	pub fn prefix_mass(&self, prefix: &[String]) -> u64 {
		self.prefix_full.get(prefix).map_or(0, |full| full.values().sum())
	}

	/// Number of distinct n-grams one order up whose suffix is `ngram`.
	pub fn continuation_count(&self, ngram: &[String]) -> usize {
		self.continuations.get(ngram).map_or(0, HashSet::len)
	}

	/// Number of distinct n-grams two orders up whose inner span is `span`.
	pub fn inner_continuation_count(&self, span: &[String]) -> usize {
		self.inner_continuations.get(span).map_or(0, HashSet::len)
	}

	/// Distinct words observed right after `prefix`.
	pub fn successors(&self, prefix: &[String]) -> Option<&HashSet<String>> {
		self.successions.get(prefix)
	}

	/// Number of distinct words observed right after `prefix`.
	pub fn succeeding_count(&self, prefix: &[String]) -> usize {
		self.successions.get(prefix).map_or(0, HashSet::len)
	}

	/// Observed n-grams whose suffix (n-gram without first word) is `suffix`.
	pub fn no_first_word(&self, suffix: &[String]) -> Option<&HashSet<NGram>> {
		self.no_first_word.get(suffix)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ngram::ngram;
	use crate::tokenizer::WhitespaceTokenizer;

	fn count(order: usize, sentences: &[&str]) -> NGramCounts {
		let mut counts = NGramCounts::new(order).unwrap();
		for s in sentences {
			counts.ingest(s, &WhitespaceTokenizer);
		}
		counts
	}

	#[test]
	fn test_zero_order_rejected() {
		assert!(NGramCounts::new(0).is_err());
	}

	#[test]
	fn test_bigram_counts() {
		let counts = count(2, &["the cat sat", "the dog sat"]);

		assert_eq!(1, counts.frequency(&ngram(&["the", "cat"])));
		assert_eq!(1, counts.frequency(&ngram(&["the", "dog"])));
		assert_eq!(2, counts.frequency(&ngram(&["sat", "</s>"])));
		assert_eq!(2, counts.frequency(&ngram(&["<s>", "<s>"])));
		assert_eq!(2, counts.frequency(&ngram(&["the"])));

		let successors = counts.successors(&ngram(&["the"])).unwrap();
		assert_eq!(2, successors.len());
		assert!(successors.contains("cat"));
		assert!(successors.contains("dog"));
		assert_eq!(2, counts.sentences());
	}

	#[test]
	fn test_unknown_entry_reserved() {
		let counts = count(2, &["the cat sat"]);
		assert!(counts.contains(&ngram::unknown()));
		assert_eq!(0, counts.frequency(&ngram::unknown()));
		assert!(!counts.order_frequencies(1).unwrap().contains_key(&ngram::unknown()));
	}

	#[test]
	fn test_lower_cased() {
		let counts = count(1, &["The THE the"]);
		assert_eq!(3, counts.frequency(&ngram(&["the"])));
		assert_eq!(0, counts.frequency(&ngram(&["The"])));
	}

	#[test]
	fn test_padding_width_follows_order() {
		let counts = count(3, &["a"]);
		// order 1: <s> a </s>
		assert_eq!(1, counts.frequency(&ngram(&["<s>"])));
		// order 2: <s> <s> a </s> </s>
		assert_eq!(1, counts.frequency(&ngram(&["<s>", "<s>"])));
		// order 3: <s> <s> <s> a </s> </s> </s>
		assert_eq!(1, counts.frequency(&ngram(&["<s>", "<s>", "<s>"])));
		assert_eq!(1, counts.frequency(&ngram(&["<s>", "a", "</s>"])));
		assert_eq!(5, counts.order_frequencies(3).unwrap().len());
	}

	#[test]
	fn test_empty_sentence_counts_sentinels() {
		let counts = count(2, &[""]);
		assert_eq!(1, counts.frequency(&ngram(&["<s>", "</s>"])));
		assert_eq!(1, counts.frequency(&ngram(&["</s>"])));
	}

	#[test]
	fn test_prefix_mass() {
		let counts = count(2, &["the cat sat", "the cat ran", "the dog sat"]);
		assert_eq!(3, counts.prefix_mass(&ngram(&["the"])));
		assert_eq!(2, counts.prefix_mass(&ngram(&["cat"])));
		assert_eq!(0, counts.prefix_mass(&ngram(&["zebra"])));
	}

	#[test]
	fn test_continuation_sets() {
		let counts = count(3, &["a x b", "c x b", "a x b"]);
		// trigrams ending in (x, b): (a, x, b) and (c, x, b)
		assert_eq!(2, counts.continuation_count(&ngram(&["x", "b"])));
		// trigrams with inner span (x): (a, x, b), (c, x, b)
		assert_eq!(2, counts.inner_continuation_count(&ngram(&["x"])));
		// bigrams are not recorded as continuations
		assert_eq!(0, counts.continuation_count(&ngram(&["x"])));
	}

	#[test]
	fn test_no_first_word() {
		let counts = count(2, &["the cat sat", "the dog sat"]);
		let candidates = counts.no_first_word(&ngram(&["sat"])).unwrap();
		assert_eq!(2, candidates.len());
		assert!(candidates.contains(&ngram(&["cat", "sat"])));
		assert!(candidates.contains(&ngram(&["dog", "sat"])));
		assert!(counts.no_first_word(&ngram(&["zebra"])).is_none());
	}

	#[test]
	fn test_merge_matches_single_pass() {
		let sentences = ["the cat sat", "the dog sat", "a dog ran", "the cat sat"];
		let single = count(3, &sentences);

		let mut merged = count(3, &sentences[..1]);
		merged.merge(count(3, &sentences[1..3])).unwrap();
		merged.merge(count(3, &sentences[3..])).unwrap();

		assert_eq!(single, merged);
	}

	#[test]
	fn test_merge_order_mismatch() {
		let mut a = count(2, &["a"]);
		assert!(a.merge(count(3, &["a"])).is_err());
	}
}
