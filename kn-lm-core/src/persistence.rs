//! Binary caches and delimited export.
//!
//! Caches are `postcard`-encoded and opaque to external tools; the export is
//! plain CSV meant for auditing.

use std::fs;
use std::path::Path;

use log::info;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::config::BuildConfig;
use crate::errors::Result;
use crate::io::build_output_path;
use crate::model::builder::ModelBuilder;
use crate::model::counts::NGramCounts;
use crate::model::structured::{ProbabilityMap, StructuredModel};
use crate::tokenizer::Tokenizer;

fn write_postcard<T, P>(value: &T, path: P) -> Result<()>
where
	T: Serialize,
	P: AsRef<Path>,
{
	let bytes = postcard::to_stdvec(value)?;
	fs::write(path, bytes)?;
	Ok(())
}

fn read_postcard<T, P>(path: P) -> Result<T>
where
	T: DeserializeOwned,
	P: AsRef<Path>,
{
	let bytes = fs::read(path)?;
	Ok(postcard::from_bytes(&bytes)?)
}

/// Writes the raw counts, so smoothing can be re-run without re-tokenizing.
pub fn write_counts<P: AsRef<Path>>(counts: &NGramCounts, path: P) -> Result<()> {
	info!("Writing counts to {} ...", path.as_ref().display());
	write_postcard(counts, path)
}

pub fn read_counts<P: AsRef<Path>>(path: P) -> Result<NGramCounts> {
	read_postcard(path)
}

/// Writes the structured model consumed by generation.
pub fn write_structured<P: AsRef<Path>>(model: &StructuredModel, path: P) -> Result<()> {
	info!("Writing model to {} ...", path.as_ref().display());
	write_postcard(model, path)
}

pub fn read_structured<P: AsRef<Path>>(path: P) -> Result<StructuredModel> {
	read_postcard(path)
}

#[derive(Serialize)]
struct CsvRecord<'a> {
	order: usize,
	ngram: &'a str,
	log_probability: f64,
}

/// Exports one `order,ngram,log_probability` row per n-gram.
///
/// Tokens are joined by single spaces. Rows are sorted by order, then n-gram.
pub fn export_csv<P: AsRef<Path>>(probabilities: &ProbabilityMap, path: P) -> Result<()> {
	info!("Exporting {} n-grams to {} ...", probabilities.len(), path.as_ref().display());
	let mut rows: Vec<_> = probabilities.iter().collect();
	rows.sort_by(|a, b| a.0.len().cmp(&b.0.len()).then_with(|| a.0.cmp(b.0)));

	let mut writer = csv::Writer::from_path(path)?;
	for (ngram, &log_probability) in rows {
		let joined = ngram.join(" ");
		writer.serialize(CsvRecord {
			order: ngram.len(),
			ngram: &joined,
			log_probability,
		})?;
	}
	writer.flush()?;
	Ok(())
}

/// Loads the structured model cached next to a corpus, building it if needed.
///
/// - `data/corpus.txt` is cached as `data/corpus.bin`
/// - A missing cache is built from the corpus with `config` and then written
pub fn load_or_build<P, T>(corpus: P, config: BuildConfig, tokenizer: T) -> Result<StructuredModel>
where
	P: AsRef<Path>,
	T: Tokenizer + Sync,
{
	let cache = build_output_path(&corpus, "bin")?;
	if cache.exists() {
		info!("Loading cached model {} ...", cache.display());
		return read_structured(cache);
	}

	let model = ModelBuilder::new(config, tokenizer)?
		.build_file(&corpus)?
		.into_structured();
	write_structured(&model, &cache)?;
	Ok(model)
}
