//! Relay-level error types shared by the acquirer, the token store, and header composition.

// self
use crate::_prelude::*;

/// Relay-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical relay error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// Local configuration problem; retrying without changing the input will not help.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// The credential exchange could not be performed or was rejected by the token endpoint.
	#[error(transparent)]
	TokenRequest(#[from] TokenRequestError),
	/// The token endpoint answered with a body that is not a usable token response.
	#[error(transparent)]
	InvalidTokenResponse(#[from] InvalidTokenResponseError),
}

/// Configuration and validation failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// A required descriptor field is empty.
	#[error("Credential descriptor is missing the required `{field}` field.")]
	MissingField {
		/// Name of the empty field.
		field: &'static str,
	},
	/// A duration field must be strictly positive.
	#[error("Credential descriptor field `{field}` must be a positive duration.")]
	NonPositiveDuration {
		/// Name of the offending field.
		field: &'static str,
	},
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// A composed header name cannot be used on the wire.
	#[error("Header name `{name}` is invalid.")]
	InvalidHeaderName {
		/// Offending header name.
		name: String,
	},
	/// A composed header value cannot be used on the wire.
	#[error("Header `{name}` carries an invalid value.")]
	InvalidHeaderValue {
		/// Header whose value was rejected.
		name: String,
	},
}
impl ConfigError {
	/// Wraps a transport's builder failure inside [`ConfigError`].
	pub fn http_client_build(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::HttpClientBuild { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for ConfigError {
	fn from(e: ReqwestError) -> Self {
		Self::http_client_build(e)
	}
}

/// Failures while talking to the token endpoint or preparing the request for it.
#[derive(Debug, ThisError)]
pub enum TokenRequestError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the token endpoint.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the token endpoint.")]
	Io(#[from] std::io::Error),
	/// The exchange did not complete within the descriptor's request timeout.
	#[error("Token endpoint did not answer within {timeout:?}.")]
	Timeout {
		/// Timeout that bounded the exchange.
		timeout: Duration,
	},
	/// Token endpoint answered with a non-success status.
	#[error("Token endpoint responded with HTTP {status}: {}.", preview(.body))]
	Status {
		/// HTTP status code.
		status: u16,
		/// Raw response body.
		body: String,
		/// OAuth `error` code, when the body is an OAuth error document.
		oauth_error: Option<String>,
		/// Retry-After hint from upstream, if supplied.
		retry_after: Option<Duration>,
	},
	/// The HTTP request could not be assembled.
	#[error("Token request could not be built.")]
	Build(#[from] oauth2::http::Error),
	/// The resolved token endpoint is not a usable URL.
	#[error("Resolved token endpoint is not a valid URL.")]
	InvalidEndpoint {
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The credential backend failed while resolving a placeholder.
	#[error("Credential for `{field}` could not be resolved.")]
	Credential {
		/// Descriptor field being resolved.
		field: &'static str,
		/// Backend failure.
		#[source]
		source: crate::credential::CredentialError,
	},
	/// A credential is still an unresolved placeholder after resolution.
	#[error("Credential for `{field}` is still an unresolved placeholder.")]
	UnresolvedCredential {
		/// Descriptor field left unresolved.
		field: &'static str,
	},
}
impl TokenRequestError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}

	/// Returns the HTTP status attached to the failure, if any.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::Status { status, .. } => Some(*status),
			_ => None,
		}
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TokenRequestError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

/// Token endpoint responses that parse but cannot become a token record.
#[derive(Debug, ThisError)]
pub enum InvalidTokenResponseError {
	/// Body is not valid JSON or does not match the token response shape.
	#[error("Token endpoint returned malformed JSON.")]
	Json {
		/// Structured parsing failure, including the failing path.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status code of the response.
		status: u16,
	},
	/// Response omitted `access_token` or returned it empty.
	#[error("Token endpoint response is missing access_token.")]
	MissingAccessToken,
	/// Response carried a zero or negative `expires_in`.
	#[error("The expires_in value must be positive.")]
	NonPositiveExpiresIn,
	/// Response carried an `expires_in` that cannot be represented.
	#[error("The expires_in value exceeds the supported range.")]
	ExpiresInOutOfRange,
}

const BODY_PREVIEW_LIMIT: usize = 256;

fn preview(body: &str) -> String {
	if body.chars().count() <= BODY_PREVIEW_LIMIT {
		return body.to_owned();
	}

	let mut buf = body.chars().take(BODY_PREVIEW_LIMIT).collect::<String>();

	buf.push('…');

	buf
}
