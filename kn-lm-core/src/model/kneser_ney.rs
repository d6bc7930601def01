//! Recursive modified Kneser-Ney smoothing.
//!
//! For an n-gram `g` of order `k`, with `d` the discount of its frequency bucket:
//!
//! ```text
//! P(g) = max(c_KN(g) - d, 0) / c_KN(g[..k-1]) + λ(g[..k-1]) · P(g[1..])
//! λ(p) = d / freq(p) · |successors(p)|
//! ```
//!
//! `c_KN` is the raw count at the highest order being evaluated and the
//! continuation count below it. Unigrams stop the recursion with a uniform
//! continuation `1 / |unigrams|`.

use std::collections::HashMap;

use super::counts::NGramCounts;
use super::discount::DiscountTable;
use super::ngram::{self, NGram};

/// How a probability is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Mode {
	/// Full recursive estimate of an n-gram observed in training.
	Train,
	/// Backoff for contexts absent from training: the best observed n-gram
	/// sharing the longest known suffix.
	///
	/// Needs the raw counts, so it is only available from a [`KneserNey`]
	/// over live counts (a freshly built model or the counts cache), not from
	/// a cached structured model.
	Infer,
}

/// Lower-order probabilities already computed by a worker.
///
/// Only continuation values (orders below the one first requested) are
/// stored, since those do not depend on the n-gram that led to them.
pub type Memo = HashMap<NGram, f64>;

/// Smoothing engine over frozen counts.
///
/// Holds only shared references, so one instance can be used from several
/// threads at once, each with its own [`Memo`].
#[derive(Clone, Copy, Debug)]
pub struct KneserNey<'a> {
	counts: &'a NGramCounts,
	discounts: DiscountTable,
}

fn ratio(numerator: f64, denominator: f64) -> f64 {
	if denominator == 0.0 { 0.0 } else { numerator / denominator }
}

impl<'a> KneserNey<'a> {
	pub fn new(counts: &'a NGramCounts, discounts: DiscountTable) -> Self {
		Self { counts, discounts }
	}

	pub fn discounts(&self) -> &DiscountTable {
		&self.discounts
	}

	/// Smoothed probability of `ngram`.
	///
	/// A unigram never seen in training is mapped to `[UNK]` and gets
	/// [`KneserNey::unknown_probability`] without recursion. In [`Mode::Train`]
	/// the n-gram is expected to be in the frequency table; unseen higher-order
	/// n-grams collapse to their interpolated lower-order mass. The empty
	/// n-gram has no mass.
	pub fn probability(&self, ngram: &[String], mode: Mode) -> f64 {
		self.probability_with(ngram, mode, &mut Memo::new())
	}

	/// Same as [`KneserNey::probability`], reusing a caller-owned memo.
	pub fn probability_with(&self, ngram: &[String], mode: Mode, memo: &mut Memo) -> f64 {
		if ngram.is_empty() {
			return 0.0;
		}
		if self.is_unknown_word(ngram) {
			return self.unknown_probability();
		}
		match mode {
			Mode::Train => self.p_kn(ngram, ngram.len(), memo),
			Mode::Infer => self.backoff(ngram, memo),
		}
	}

	/// Natural logarithm of [`KneserNey::probability_with`].
	pub fn log_probability_with(&self, ngram: &[String], mode: Mode, memo: &mut Memo) -> f64 {
		self.probability_with(ngram, mode, memo).ln()
	}

	/// Probability assigned to any unigram absent from training.
	///
	/// `λ([UNK]) / |frequency table|`, where `[UNK]` is discounted as a
	/// singleton (`D[1]`). This departs from the plain bucket lookup: `[UNK]`
	/// has frequency 0 and `D[0]` is always 0, which would give every unseen
	/// word a probability of 0.
	pub fn unknown_probability(&self) -> f64 {
		let lambda = self.discounts.get(1);
		lambda / self.counts.distinct_ngrams() as f64
	}

	fn is_unknown_word(&self, ngram: &[String]) -> bool {
		ngram.len() == 1 && self.counts.frequency(ngram) == 0
	}

	fn backoff(&self, ngram: &[String], memo: &mut Memo) -> f64 {
		if ngram.len() == 1 {
			return self.p_kn(ngram, 1, memo);
		}
		match self.counts.no_first_word(ngram::suffix(ngram)) {
			Some(candidates) if !candidates.is_empty() => candidates
				.iter()
				.map(|candidate| self.p_kn(candidate, candidate.len(), memo))
				.fold(f64::NEG_INFINITY, f64::max),
			_ => self.probability_with(ngram::suffix(ngram), Mode::Infer, memo),
		}
	}

	/// Recursive estimate; `highest` is the order of the n-gram the recursion started from.
	fn p_kn(&self, ngram: &[String], highest: usize, memo: &mut Memo) -> f64 {
		let order = ngram.len();
		if order < highest {
			if let Some(&p) = memo.get(ngram) {
				return p;
			}
		}

		let d = self.discounts.get(self.counts.frequency(ngram));
		let p = if order == 1 {
			let continuation = 1.0 / self.counts.distinct_unigrams() as f64;
			(1.0 - d).max(0.0) + d * continuation
		} else {
			let prefix = ngram::prefix(ngram);
			let discount = ratio(
				(self.c_kn(ngram, highest) - d).max(0.0),
				self.c_kn_prefix(ngram, highest),
			);
			let lambda =
				ratio(d, self.counts.frequency(prefix) as f64) * self.counts.succeeding_count(prefix) as f64;
			discount + lambda * self.p_kn(ngram::suffix(ngram), highest, memo)
		};

		if order < highest {
			memo.insert(ngram.to_vec(), p);
		}
		p
	}

	/// Kneser-Ney count of the n-gram itself.
	fn c_kn(&self, ngram: &[String], highest: usize) -> f64 {
		if ngram.len() == highest {
			self.counts.frequency(ngram) as f64
		} else {
			self.counts.continuation_count(ngram) as f64
		}
	}

	/// Kneser-Ney count of the n-gram's prefix.
	fn c_kn_prefix(&self, ngram: &[String], highest: usize) -> f64 {
		let prefix = ngram::prefix(ngram);
		if ngram.len() == highest {
			self.counts.prefix_mass(prefix) as f64
		} else {
			self.counts.inner_continuation_count(prefix) as f64
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::model::ngram::ngram;
	use crate::tokenizer::WhitespaceTokenizer;

	const EPS: f64 = 1e-12;

	// n1 = 8, n2 = 4, n3 = 4, n4 = 4 at order 2 -> D = [0, 0.5, 0.5, 1.0]
	const CORPUS: [&str; 4] = ["the cat sat", "the cat sat", "the dog sat", "a dog ran"];

	fn counts(order: usize) -> NGramCounts {
		let mut counts = NGramCounts::new(order).unwrap();
		for s in CORPUS {
			counts.ingest(s, &WhitespaceTokenizer);
		}
		counts
	}

	fn discounts(counts: &NGramCounts) -> DiscountTable {
		DiscountTable::estimate(counts.frequencies().values().copied()).unwrap()
	}

	#[test]
	fn test_corpus_discounts() {
		let counts = counts(2);
		assert_eq!([0.0, 0.5, 0.5, 1.0], discounts(&counts).values());
		assert_eq!(8, counts.distinct_unigrams());
		assert_eq!(21, counts.distinct_ngrams());
	}

	#[test]
	fn test_unigram_closed_form() {
		let counts = counts(3);
		let table = discounts(&counts);
		let kn = KneserNey::new(&counts, table);
		for unigram in counts.order_frequencies(1).unwrap().keys() {
			let d = table.get(counts.frequency(unigram));
			let expected = (1.0 - d).max(0.0) + d * (1.0 / counts.distinct_unigrams() as f64);
			assert_eq!(expected, kn.probability(unigram, Mode::Train));
		}
	}

	#[test]
	fn test_bigram_probability() {
		let counts = counts(2);
		let kn = KneserNey::new(&counts, discounts(&counts));
		// (2 - 0.5) / 3 + (0.5 / 3 * 2) * ((1 - 0.5) + 0.5 / 8)
		let p = kn.probability(&ngram(&["the", "cat"]), Mode::Train);
		assert!((p - 0.6875).abs() < EPS);
		// (1 - 0.5) / 3 + (0.5 / 3 * 2) * 0.5625
		let p = kn.probability(&ngram(&["the", "dog"]), Mode::Train);
		assert!((p - (0.5 / 3.0 + 0.1875)).abs() < EPS);
	}

	#[test]
	fn test_unknown_word() {
		let counts = counts(2);
		let kn = KneserNey::new(&counts, discounts(&counts));
		let expected = 0.5 / 21.0;
		assert_eq!(expected, kn.probability(&ngram(&["zebra"]), Mode::Train));
		assert_eq!(expected, kn.probability(&ngram(&["zebra"]), Mode::Infer));
		assert_eq!(expected, kn.probability(&ngram::unknown(), Mode::Train));
	}

	#[test]
	fn test_infer_takes_best_candidate() {
		let counts = counts(2);
		let kn = KneserNey::new(&counts, discounts(&counts));
		// candidates for (*, sat): (cat, sat) = 0.78125, (dog, sat) = 0.3125
		let p = kn.probability(&ngram(&["zebra", "sat"]), Mode::Infer);
		assert!((p - 0.78125).abs() < EPS);
		assert_eq!(kn.probability(&ngram(&["cat", "sat"]), Mode::Train), p);
	}

	#[test]
	fn test_infer_backs_off_to_unigram() {
		let counts = counts(3);
		let kn = KneserNey::new(&counts, discounts(&counts));
		// (quux, cat) has no candidates, (cat) has a single one: (the, cat)
		let p = kn.probability(&ngram(&["zebra", "quux", "cat"]), Mode::Infer);
		assert_eq!(kn.probability(&ngram(&["the", "cat"]), Mode::Train), p);

		let p = kn.probability(&ngram(&["cat"]), Mode::Infer);
		assert_eq!(kn.probability(&ngram(&["cat"]), Mode::Train), p);

		let p = kn.probability(&ngram(&["zebra", "quux"]), Mode::Infer);
		assert_eq!(kn.unknown_probability(), p);
	}

	#[test]
	fn test_trigram_uses_continuation_counts() {
		let counts = counts(3);
		let table = discounts(&counts);
		let kn = KneserNey::new(&counts, table);

		let g = ngram(&["the", "cat", "sat"]);
		let (cat_sat, cat) = (ngram(&["cat", "sat"]), ngram(&["cat"]));

		let d_sat = table.get(counts.frequency(&ngram(&["sat"])));
		let p_sat = (1.0 - d_sat).max(0.0) + d_sat * (1.0 / counts.distinct_unigrams() as f64);

		let d = table.get(counts.frequency(&cat_sat));
		let lower = ((counts.continuation_count(&cat_sat) as f64 - d).max(0.0)
			/ counts.inner_continuation_count(&cat) as f64)
			+ d / counts.frequency(&cat) as f64 * counts.succeeding_count(&cat) as f64 * p_sat;

		let prefix = ngram(&["the", "cat"]);
		let d = table.get(counts.frequency(&g));
		let expected = (counts.frequency(&g) as f64 - d).max(0.0) / counts.prefix_mass(&prefix) as f64
			+ d / counts.frequency(&prefix) as f64 * counts.succeeding_count(&prefix) as f64 * lower;

		let p = kn.probability(&g, Mode::Train);
		assert!((p - expected).abs() < EPS);
		assert!(p > 0.0 && p <= 1.0);
	}

	#[test]
	fn test_recursion_visits_each_suffix_once() {
		let counts = counts(3);
		let kn = KneserNey::new(&counts, discounts(&counts));
		let mut memo = Memo::new();
		kn.probability_with(&ngram(&["the", "cat", "sat"]), Mode::Train, &mut memo);

		// one entry per strictly shorter suffix, nothing at order >= 3
		let mut keys: Vec<_> = memo.keys().cloned().collect();
		keys.sort_by_key(Vec::len);
		assert_eq!(vec![ngram(&["sat"]), ngram(&["cat", "sat"])], keys);
	}

	#[test]
	fn test_ngram_longer_than_order_is_not_memoized() {
		let counts = counts(2);
		let kn = KneserNey::new(&counts, discounts(&counts));
		let mut memo = Memo::new();
		let p = kn.probability_with(&ngram(&["the", "cat", "sat"]), Mode::Train, &mut memo);
		assert!(p.is_finite());
		assert_eq!(2, memo.len());
		assert!(memo.keys().all(|g| g.len() < 3));
	}

	#[test]
	fn test_memo_does_not_change_results() {
		let counts = counts(3);
		let kn = KneserNey::new(&counts, discounts(&counts));
		let mut memo = Memo::new();
		for g in counts.frequencies().keys() {
			let shared = kn.probability_with(g, Mode::Train, &mut memo);
			let fresh = kn.probability(g, Mode::Train);
			assert_eq!(fresh.to_bits(), shared.to_bits());
		}
		assert!(!memo.is_empty());
	}
}
