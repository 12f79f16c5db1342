//! Library error type.

pub type Result<T> = std::result::Result<T, Error>;

use thiserror::Error;

/// Failures that abort a resolution.
///
/// A job whose inputs can't be satisfied is *not* an error, see [`crate::ResolverStatus::Missing`].
#[derive(Debug, Error)]
pub enum Error {
	#[error("IO error: {0}")]
	IO(#[from] std::io::Error),
	#[error("JSON error: {0}")]
	SerdeJSON(#[from] serde_json::Error),
	#[error("bincode error: {0}")]
	Bincode(#[from] bincode::Error),
	#[error("validation error: {0}")]
	Validation(String),
	/// Raised by a [`crate::History`] implementation when the underlying data can't be read.
	#[error("history query failed: {0}")]
	History(String),
	#[error("not found: {0}")]
	NotFound(String),
}
