//! Modified Kneser-Ney n-gram language models.
//!
//! This crate builds a smoothed word n-gram model from a corpus of sentences:
//! - Counting of every order `1..=N` with the auxiliary counts smoothing needs
//! - Estimation of the modified Kneser-Ney discounts
//! - Recursive smoothing of every observed n-gram, in parallel
//! - Structuring of the results for "best next word" queries and generation
//! - Binary caches and CSV export
//!
//! ```no_run
//! use kn_lm_core::config::BuildConfig;
//! use kn_lm_core::model::builder::ModelBuilder;
//! use kn_lm_core::model::generator::Generator;
//! use kn_lm_core::tokenizer::WordTokenizer;
//!
//! let builder = ModelBuilder::new(BuildConfig::new(3, 200_000), WordTokenizer).unwrap();
//! let model = builder.build_file("corpus.txt").unwrap();
//! let sentence = Generator::new(model.structured()).generate("the");
//! println!("{:?}", sentence);
//! ```

/// Counting, discounting, smoothing and structuring.
pub mod model;

/// Build-time configuration.
pub mod config;

/// Error types.
pub mod errors;

/// Corpus reading and path helpers.
pub mod io;

/// Binary caches and CSV export.
pub mod persistence;

/// Sentence tokenizers.
pub mod tokenizer;
