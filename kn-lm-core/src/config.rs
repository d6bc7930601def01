use serde::{Deserialize, Serialize};

use crate::errors::{KnError, Result};

/// Build-time configuration of a model.
///
/// # Fields
/// - `order`: highest n-gram order `N` to count and smooth (>= 1).
/// - `max_lines`: cap on the number of corpus lines consumed (>= 1).
///   The whole model lives in memory, so this is the only guard against
///   running out of it.
/// - `threads`: number of workers for counting and smoothing, `0` means one per CPU.
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
#[serde(default)]
pub struct BuildConfig {
	pub order: usize,
	pub max_lines: usize,
	pub threads: usize,
}

impl Default for BuildConfig {
	fn default() -> Self {
		Self {
			order: 3,
			max_lines: 200_000,
			threads: 0,
		}
	}
}

impl BuildConfig {
	/// Creates a configuration with the given order and line cap, using all CPUs.
	pub fn new(order: usize, max_lines: usize) -> Self {
		Self { order, max_lines, threads: 0 }
	}

	/// Checks that every field holds a usable value.
	///
	/// # Errors
	/// Returns [`KnError::InvalidArgument`] if `order` or `max_lines` is zero.
	pub fn validate(&self) -> Result<()> {
		if self.order == 0 {
			return Err(KnError::invalid_argument("order", "must be at least 1"));
		}
		if self.max_lines == 0 {
			return Err(KnError::invalid_argument("max_lines", "must be at least 1"));
		}
		Ok(())
	}

	/// Resolves the effective number of workers.
	pub fn threads(&self) -> usize {
		if self.threads == 0 {
			num_cpus::get().max(1)
		} else {
			self.threads
		}
	}
}
