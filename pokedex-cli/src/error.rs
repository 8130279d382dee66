use thiserror::Error;

/// Failures of a remote record lookup.
#[derive(Debug, Error)]
pub enum LookupError {
	#[error("Invalid lookup key: '{0}'")]
	InvalidKey(String),

	#[error("Not found: {0}")]
	NotFound(String),

	#[error("Request timed out: {0}")]
	Timeout(String),

	#[error("Connection failed: {0}")]
	Connection(String),

	#[error("Unexpected HTTP status {status} from {url}")]
	Http { status: u16, url: String },

	#[error("Malformed response: {0}")]
	Malformed(String),

	#[error("Response is missing field: {0}")]
	MissingField(&'static str),
}

impl LookupError {
	/// Return a machine-readable error code string for this error variant.
	pub fn code(&self) -> &str {
		match self {
			Self::InvalidKey(_) => "LOOKUP_INVALID_KEY",
			Self::NotFound(_) => "LOOKUP_NOT_FOUND",
			Self::Timeout(_) => "LOOKUP_TIMEOUT",
			Self::Connection(_) => "LOOKUP_CONNECTION",
			Self::Http { .. } => "LOOKUP_HTTP",
			Self::Malformed(_) => "LOOKUP_MALFORMED",
			Self::MissingField(_) => "LOOKUP_MISSING_FIELD",
		}
	}
}
