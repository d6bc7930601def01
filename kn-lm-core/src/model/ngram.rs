/// An ordered sequence of lower-cased tokens.
///
/// Compared and hashed by content; maps keyed by `NGram` are queried with `&[String]`.
pub type NGram = Vec<String>;

/// Sentinel prepended to every sentence.
pub const START: &str = "<s>";

/// Sentinel appended to every sentence.
pub const END: &str = "</s>";

/// Reserved out-of-vocabulary unigram.
pub const UNKNOWN: &str = "[UNK]";

/// The reserved out-of-vocabulary unigram as an n-gram.
pub fn unknown() -> NGram {
	vec![UNKNOWN.to_owned()]
}

/// Builds an n-gram from borrowed tokens.
pub fn ngram<S: AsRef<str>>(tokens: &[S]) -> NGram {
	tokens.iter().map(|t| t.as_ref().to_owned()).collect()
}

/// The n-gram without its final word.
pub(crate) fn prefix(ngram: &[String]) -> &[String] {
	&ngram[..ngram.len() - 1]
}

/// The n-gram without its first word.
pub(crate) fn suffix(ngram: &[String]) -> &[String] {
	&ngram[1..]
}

/// The n-gram without its first and final words.
pub(crate) fn inner(ngram: &[String]) -> &[String] {
	&ngram[1..ngram.len() - 1]
}

pub(crate) fn is_unknown(ngram: &[String]) -> bool {
	ngram.len() == 1 && ngram[0] == UNKNOWN
}
