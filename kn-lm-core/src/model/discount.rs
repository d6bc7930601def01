use serde::{Deserialize, Serialize};

use crate::errors::{KnError, Result};

/// Number of distinct n-grams seen exactly 1, 2, 3 and 4 times.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CountOfCounts {
	pub n1: u64,
	pub n2: u64,
	pub n3: u64,
	pub n4: u64,
}

impl CountOfCounts {
	/// Buckets raw frequencies; anything outside `1..=4` is ignored.
	pub fn from_frequencies<I>(frequencies: I) -> Self
	where
		I: IntoIterator<Item = u64>,
	{
		let mut coc = Self::default();
		for freq in frequencies {
			match freq {
				1 => coc.n1 += 1,
				2 => coc.n2 += 1,
				3 => coc.n3 += 1,
				4 => coc.n4 += 1,
				_ => (),
			}
		}
		coc
	}
}

/// Modified Kneser-Ney discount constants for count buckets 0, 1, 2 and 3+.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq)]
pub struct DiscountTable {
	values: [f64; 4],
}

impl DiscountTable {
	/// Estimates the discounts from the frequencies of every distinct n-gram.
	///
	/// With `Y = n1 / (n1 + 2 n2)`:
	/// - `D0 = 0`
	/// - `D1 = 1 - 2 Y n2 / n1`
	/// - `D2 = 2 - 3 Y n3 / n2`
	/// - `D3 = 3 - 4 Y n4 / n3`
	///
	/// # Errors
	/// Returns [`KnError::Configuration`] if `n1`, `n2` or `n3` is zero: the
	/// corpus is too small or too degenerate for the requested order.
	pub fn estimate<I>(frequencies: I) -> Result<Self>
	where
		I: IntoIterator<Item = u64>,
	{
		Self::from_count_of_counts(CountOfCounts::from_frequencies(frequencies))
	}

	pub fn from_count_of_counts(coc: CountOfCounts) -> Result<Self> {
		for (name, n) in [("n1", coc.n1), ("n2", coc.n2), ("n3", coc.n3)] {
			if n == 0 {
				return Err(KnError::configuration(format!(
					"no n-gram occurs exactly {} time(s) ({name} = 0), the corpus is too small for this order",
					&name[1..],
				)));
			}
		}

		let n1 = coc.n1 as f64;
		let n2 = coc.n2 as f64;
		let n3 = coc.n3 as f64;
		let n4 = coc.n4 as f64;

		let y = n1 / (n1 + 2.0 * n2);
		let values = [
			0.0,
			1.0 - 2.0 * y * (n2 / n1),
			2.0 - 3.0 * y * (n3 / n2),
			3.0 - 4.0 * y * (n4 / n3),
		];
		log::debug!("discounts {:?} from {:?}", values, coc);
		Ok(Self { values })
	}

	/// Discount for an n-gram seen `frequency` times.
	pub fn get(&self, frequency: u64) -> f64 {
		self.values[frequency.min(3) as usize]
	}

	pub fn values(&self) -> [f64; 4] {
		self.values
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_count_of_counts() {
		let coc = CountOfCounts::from_frequencies([0, 1, 1, 2, 3, 3, 3, 4, 5, 9]);
		assert_eq!(CountOfCounts { n1: 2, n2: 1, n3: 3, n4: 1 }, coc);
	}

	#[test]
	fn test_estimate() {
		// n1 = 8, n2 = 4, n3 = 4, n4 = 4 -> Y = 0.5
		let freqs = [1u64; 8].into_iter().chain([2; 4]).chain([3; 4]).chain([4; 4]);
		let table = DiscountTable::estimate(freqs).unwrap();
		assert_eq!([0.0, 0.5, 0.5, 1.0], table.values());
	}

	#[test]
	fn test_values_reproducible_from_counts() {
		let coc = CountOfCounts { n1: 7, n2: 3, n3: 2, n4: 5 };
		let table = DiscountTable::from_count_of_counts(coc).unwrap();
		let y = 7.0 / (7.0 + 2.0 * 3.0);
		assert_eq!(0.0, table.get(0));
		assert_eq!(1.0 - 2.0 * y * (3.0 / 7.0), table.get(1));
		assert_eq!(2.0 - 3.0 * y * (2.0 / 3.0), table.get(2));
		assert_eq!(3.0 - 4.0 * y * (5.0 / 2.0), table.get(3));
	}

	#[test]
	fn test_high_frequencies_share_bucket() {
		let coc = CountOfCounts { n1: 4, n2: 2, n3: 1, n4: 0 };
		let table = DiscountTable::from_count_of_counts(coc).unwrap();
		assert_eq!(table.get(3), table.get(1000));
		assert_eq!(3.0, table.get(3));
	}

	#[test]
	fn test_missing_singletons_is_configuration_error() {
		let result = DiscountTable::estimate([2, 2, 3, 4]);
		assert!(matches!(result, Err(KnError::Configuration(_))));
	}

	#[test]
	fn test_missing_triples_is_configuration_error() {
		let result = DiscountTable::estimate([1, 1, 2, 4]);
		assert!(matches!(result, Err(KnError::Configuration(_))));
	}
}
