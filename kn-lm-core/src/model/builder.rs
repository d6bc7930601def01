use std::path::Path;
use std::sync::mpsc;
use std::thread;

use log::{debug, info};

use super::counts::NGramCounts;
use super::discount::DiscountTable;
use super::kneser_ney::{KneserNey, Memo, Mode};
use super::ngram::{self, NGram};
use super::structured::{ProbabilityMap, StructuredModel};
use crate::config::BuildConfig;
use crate::errors::Result;
use crate::io::read_lines;
use crate::tokenizer::Tokenizer;

/// A fully smoothed model.
///
/// Keeps the counts it was built from so that [`Mode::Infer`] queries can be
/// answered, along with the flat probability map (export) and its structured
/// form (generation).
#[derive(Debug)]
pub struct TrainedModel {
	counts: NGramCounts,
	discounts: DiscountTable,
	probabilities: ProbabilityMap,
	structured: StructuredModel,
}

impl TrainedModel {
	pub fn counts(&self) -> &NGramCounts {
		&self.counts
	}

	pub fn discounts(&self) -> &DiscountTable {
		&self.discounts
	}

	pub fn probabilities(&self) -> &ProbabilityMap {
		&self.probabilities
	}

	pub fn structured(&self) -> &StructuredModel {
		&self.structured
	}

	/// Smoothing engine over the training counts.
	///
	/// The entry point for [`Mode::Infer`] queries on a freshly built model;
	/// generation and the server only see the structured model and use its
	/// own backoff.
	pub fn kneser_ney(&self) -> KneserNey<'_> {
		KneserNey::new(&self.counts, self.discounts)
	}

	/// Splits the model, keeping only what generation needs.
	pub fn into_structured(self) -> StructuredModel {
		self.structured
	}
}

/// Runs the whole pipeline: counting, discount estimation, smoothing, structuring.
///
/// # Responsibilities
/// - Shard sentences across workers, each filling its own `NGramCounts`
/// - Merge every shard before any global statistic is computed
/// - Smooth every distinct n-gram in parallel over the frozen counts
///
/// # Examples
///
/// ```no_run
/// use kn_lm_core::config::BuildConfig;
/// use kn_lm_core::model::builder::ModelBuilder;
/// use kn_lm_core::tokenizer::WordTokenizer;
///
/// let builder = ModelBuilder::new(BuildConfig::new(3, 100_000), WordTokenizer).unwrap();
/// let model = builder.build_file("corpus.txt").unwrap();
/// println!("{} n-grams", model.probabilities().len());
/// ```
#[derive(Debug)]
pub struct ModelBuilder<T> {
	config: BuildConfig,
	tokenizer: T,
}

impl<T> ModelBuilder<T>
where
	T: Tokenizer + Sync,
{
	/// # Errors
	/// Returns an error if the configuration is invalid.
	pub fn new(config: BuildConfig, tokenizer: T) -> Result<Self> {
		config.validate()?;
		Ok(Self { config, tokenizer })
	}

	pub fn config(&self) -> &BuildConfig {
		&self.config
	}

	/// Reads at most `max_lines` sentences from `path` and builds a model.
	pub fn build_file<P: AsRef<Path>>(&self, path: P) -> Result<TrainedModel> {
		let counts = self.count_file(path)?;
		self.smooth(counts)
	}

	/// Builds a model from in-memory sentences (at most `max_lines` are used).
	pub fn build<S>(&self, sentences: &[S]) -> Result<TrainedModel>
	where
		S: AsRef<str> + Sync,
	{
		let counts = self.count(sentences)?;
		self.smooth(counts)
	}

	/// Reads at most `max_lines` sentences from `path` and counts them.
	pub fn count_file<P: AsRef<Path>>(&self, path: P) -> Result<NGramCounts> {
		info!("Reading {} ...", path.as_ref().display());
		let lines = read_lines(path, self.config.max_lines)?;
		self.count(&lines)
	}

	/// Counts sentences in parallel shards and merges them.
	pub fn count<S>(&self, sentences: &[S]) -> Result<NGramCounts>
	where
		S: AsRef<str> + Sync,
	{
		let sentences = &sentences[..sentences.len().min(self.config.max_lines)];
		let empty = NGramCounts::new(self.config.order)?;
		if sentences.is_empty() {
			return Ok(empty);
		}

		let workers = self.config.threads();
		let chunk_size = sentences.len().div_ceil(workers);
		info!(
			"Counting {} sentences up to order {} with {} workers...",
			sentences.len(),
			self.config.order,
			workers
		);

		let tokenizer = &self.tokenizer;
		let mut final_counts = empty.clone();
		thread::scope(|scope| -> Result<()> {
			let (tx, rx) = mpsc::channel();
			for (shard, chunk) in sentences.chunks(chunk_size).enumerate() {
				let tx = tx.clone();
				let mut partial = empty.clone();
				scope.spawn(move || {
					for sentence in chunk {
						partial.ingest(sentence.as_ref(), tokenizer);
					}
					debug!("shard {} counted {} sentences", shard, chunk.len());
					tx.send(partial).expect("Failed to send from thread");
				});
			}
			drop(tx);

			for partial in rx.iter() {
				final_counts.merge(partial)?;
			}
			Ok(())
		})?;

		info!("Counted {} distinct n-grams.", final_counts.distinct_ngrams() - 1);
		Ok(final_counts)
	}

	/// Estimates discounts, smooths every n-gram and structures the result.
	///
	/// # Errors
	/// Returns a configuration error if the counts cannot support discount
	/// estimation. No probability is computed in that case.
	pub fn smooth(&self, counts: NGramCounts) -> Result<TrainedModel> {
		let discounts = DiscountTable::estimate(counts.frequencies().values().copied())?;
		info!("Discounts: {:?}", discounts.values());

		let probabilities = Self::probabilities(&counts, discounts, self.config.threads());

		info!("Structuring {} n-grams...", probabilities.len());
		let structured = StructuredModel::from_probabilities(&probabilities);

		Ok(TrainedModel {
			counts,
			discounts,
			probabilities,
			structured,
		})
	}

	/// Log-probability of every distinct n-gram except `[UNK]`.
	///
	/// Workers only read the counts; each keeps its own memo, so results do not
	/// depend on the number of workers.
	fn probabilities(counts: &NGramCounts, discounts: DiscountTable, workers: usize) -> ProbabilityMap {
		let kn = KneserNey::new(counts, discounts);
		let ngrams: Vec<&NGram> = counts
			.frequencies()
			.keys()
			.filter(|g| !ngram::is_unknown(g))
			.collect();
		if ngrams.is_empty() {
			return ProbabilityMap::new();
		}

		let total = ngrams.len();
		let chunk_size = total.div_ceil(workers.max(1));
		let step = (total / 10).max(1);
		info!("Smoothing {} n-grams with {} workers...", total, workers);

		thread::scope(|scope| {
			let (tx, rx) = mpsc::channel();
			for chunk in ngrams.chunks(chunk_size) {
				let tx = tx.clone();
				scope.spawn(move || {
					let mut memo = Memo::new();
					let scored: Vec<(NGram, f64)> = chunk
						.iter()
						.map(|&g| (g.clone(), kn.log_probability_with(g, Mode::Train, &mut memo)))
						.collect();
					tx.send(scored).expect("Failed to send from thread");
				});
			}
			drop(tx);

			let mut probabilities = ProbabilityMap::with_capacity(total);
			for scored in rx.iter() {
				for (g, log_prob) in scored {
					probabilities.insert(g, log_prob);
					if probabilities.len() % step == 0 {
						info!(
							"{:.1}% smoothed ({} of {} n-grams)",
							probabilities.len() as f64 / total as f64 * 100.0,
							probabilities.len(),
							total
						);
					}
				}
			}
			probabilities
		})
	}
}
