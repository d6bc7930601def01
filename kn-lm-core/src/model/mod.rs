//! Top-level module for the language model.
//!
//! Components, in the order data flows through them:
//! - Frequency counting (`NGramCounts`)
//! - Discount estimation (`DiscountTable`)
//! - Recursive smoothing (`KneserNey`)
//! - Structuring for lookups (`StructuredModel`)

/// N-gram type, sentinels and slicing helpers.
pub mod ngram;

/// Frequency counting engine.
///
/// Pads and windows sentences for every order, accumulating the frequency
/// table and the continuation, succession and backoff sets. Supports merging
/// partial counts built in parallel.
pub mod counts;

/// Count-of-counts and modified Kneser-Ney discounts.
pub mod discount;

/// Recursive smoothing engine (training estimate and inference backoff).
pub mod kneser_ney;

/// Order- and prefix-indexed log-probabilities with best-next-word lookups.
pub mod structured;

/// End-to-end build pipeline (parallel counting and smoothing).
pub mod builder;

/// Greedy sentence generation over a structured model.
pub mod generator;
