//! Definition of errors.

use std::error::Error;
use std::fmt;

/// Result type used across the crate.
pub type Result<T, E = KnError> = std::result::Result<T, E>;

/// Errors raised while building, loading or exporting a model.
///
/// Only [`KnError::Configuration`] can be raised by the smoothing pipeline itself;
/// the remaining variants come from argument validation and I/O.
#[derive(Debug)]
pub enum KnError {
	Configuration(ConfigurationError),
	InvalidArgument(InvalidArgumentError),
	Io(std::io::Error),
	Postcard(postcard::Error),
	Csv(csv::Error),
}

impl KnError {
	pub(crate) fn configuration<S>(msg: S) -> Self
	where
		S: Into<String>,
	{
		Self::Configuration(ConfigurationError { msg: msg.into() })
	}

	pub(crate) fn invalid_argument<S>(arg: &'static str, msg: S) -> Self
	where
		S: Into<String>,
	{
		Self::InvalidArgument(InvalidArgumentError {
			arg,
			msg: msg.into(),
		})
	}
}

impl fmt::Display for KnError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		match self {
			Self::Configuration(e) => e.fmt(f),
			Self::InvalidArgument(e) => e.fmt(f),
			Self::Io(e) => e.fmt(f),
			Self::Postcard(e) => e.fmt(f),
			Self::Csv(e) => e.fmt(f),
		}
	}
}

impl Error for KnError {}

/// Error used when the corpus cannot support discount estimation.
///
/// Raised before any probability is computed; the whole build is aborted.
#[derive(Debug)]
pub struct ConfigurationError {
	/// Error message.
	pub(crate) msg: String,
}

impl fmt::Display for ConfigurationError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "ConfigurationError: {}", self.msg)
	}
}

impl Error for ConfigurationError {}

/// Error used when the argument is invalid.
#[derive(Debug)]
pub struct InvalidArgumentError {
	/// Name of the argument.
	pub(crate) arg: &'static str,

	/// Error message.
	pub(crate) msg: String,
}

impl fmt::Display for InvalidArgumentError {
	fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
		write!(f, "InvalidArgumentError: {}: {}", self.arg, self.msg)
	}
}

impl Error for InvalidArgumentError {}

impl From<std::io::Error> for KnError {
	fn from(error: std::io::Error) -> Self {
		Self::Io(error)
	}
}

impl From<postcard::Error> for KnError {
	fn from(error: postcard::Error) -> Self {
		Self::Postcard(error)
	}
}

impl From<csv::Error> for KnError {
	fn from(error: csv::Error) -> Self {
		Self::Csv(error)
	}
}
