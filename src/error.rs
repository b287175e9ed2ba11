//! Client-level error types shared across the transport, recovery, and session layers.

// self
use crate::_prelude::*;

/// Client-wide result type alias returning [`Error`] by default.
pub type Result<T, E = Error> = std::result::Result<T, E>;

type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Canonical client error exposed by public APIs.
#[derive(Debug, ThisError)]
pub enum Error {
	/// No response was received (DNS, TCP, TLS, I/O).
	#[error(transparent)]
	Network(#[from] TransportError),
	/// A response arrived with a non-2xx status.
	#[error(transparent)]
	HttpStatus(#[from] HttpStatusError),
	/// An explicit session refresh failed.
	#[error(transparent)]
	AuthRecovery(#[from] AuthRecoveryError),
	/// Local configuration or request construction problem.
	#[error(transparent)]
	Config(#[from] ConfigError),
	/// A successful response body did not match the expected shape.
	#[error(transparent)]
	Decode(#[from] DecodeError),
	/// Client-side input validation rejected the request before sending.
	#[error(transparent)]
	Validation(#[from] crate::auth::ValidationError),
	/// Session persistence failure.
	#[error("{0}")]
	Storage(
		#[from]
		#[source]
		crate::session::SessionStoreError,
	),
}
impl Error {
	/// Returns the HTTP status carried by the error, if a response was received.
	pub fn status(&self) -> Option<u16> {
		match self {
			Self::HttpStatus(e) => Some(e.status),
			Self::AuthRecovery(AuthRecoveryError::Rejected { status, .. }) => Some(*status),
			Self::Decode(DecodeError::Json { status, .. }) => Some(*status),
			_ => None,
		}
	}

	/// Normalizes the error into the `{ status, message }` view shown to users.
	///
	/// The server-supplied `message` wins; otherwise the error's own display text is used.
	pub fn api_error(&self) -> ApiError {
		let message = match self {
			Self::HttpStatus(HttpStatusError { message: Some(message), .. })
			| Self::AuthRecovery(AuthRecoveryError::Rejected { message: Some(message), .. }) =>
				message.clone(),
			other => other.to_string(),
		};

		ApiError { status: self.status(), message }
	}

	/// Returns `true` when the error is a response with the given status.
	pub fn is_status(&self, status: u16) -> bool {
		self.status() == Some(status)
	}
}

/// Normalized error view consumed by presentation code.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
	/// HTTP status, when a response was received.
	pub status: Option<u16>,
	/// Human-readable message.
	pub message: String,
}
impl From<&Error> for ApiError {
	fn from(e: &Error) -> Self {
		e.api_error()
	}
}

/// Response received with a non-2xx status.
#[derive(Clone, Debug, ThisError)]
#[error("Request failed with status {status}{}.", message_suffix(.message.as_deref()))]
pub struct HttpStatusError {
	/// HTTP status code.
	pub status: u16,
	/// `message` field extracted from a JSON error body, if present.
	pub message: Option<String>,
	/// Raw response body, lossily decoded as UTF-8.
	pub body: String,
	/// `Retry-After` hint in whole seconds, when the server supplied one.
	pub retry_after: Option<u64>,
}
impl HttpStatusError {
	/// Builds an error from a raw response, extracting the `{ message }` body field.
	pub fn from_parts(status: u16, retry_after: Option<u64>, body: &[u8]) -> Self {
		#[derive(Deserialize)]
		struct ErrorBody {
			message: Option<String>,
		}

		let message = serde_json::from_slice::<ErrorBody>(body).ok().and_then(|b| b.message);

		Self { status, message, body: String::from_utf8_lossy(body).into_owned(), retry_after }
	}

	/// Authentication expired or missing.
	pub fn is_unauthorized(&self) -> bool {
		self.status == 401
	}

	/// Server-side rate limiting.
	pub fn is_rate_limited(&self) -> bool {
		self.status == 429
	}
}

fn message_suffix(message: Option<&str>) -> String {
	message.map(|m| format!(": {m}")).unwrap_or_default()
}

/// Failures raised while recovering an expired session.
#[derive(Clone, Debug, PartialEq, Eq, ThisError)]
pub enum AuthRecoveryError {
	/// The refresh endpoint answered with a non-2xx status.
	#[error("Refresh endpoint rejected the session with status {status}.")]
	Rejected {
		/// HTTP status returned by the refresh endpoint.
		status: u16,
		/// Server-supplied message, if any.
		message: Option<String>,
	},
	/// The refresh call could not complete (transport or decode failure).
	#[error("Session refresh could not complete: {reason}.")]
	Unavailable {
		/// Summary of the underlying failure.
		reason: String,
	},
}
impl AuthRecoveryError {
	pub(crate) fn from_refresh_error(e: &Error) -> Self {
		match e {
			Error::HttpStatus(status) =>
				Self::Rejected { status: status.status, message: status.message.clone() },
			other => Self::Unavailable { reason: other.to_string() },
		}
	}
}

/// Configuration and request construction failures.
#[derive(Debug, ThisError)]
pub enum ConfigError {
	/// HTTP client could not be constructed.
	#[error("HTTP client could not be constructed.")]
	HttpClientBuild {
		/// Underlying transport builder failure.
		#[source]
		source: BoxError,
	},
	/// HTTP request construction failed.
	#[error(transparent)]
	HttpRequest(#[from] ::http::Error),
	/// The resolved base endpoint is not a valid absolute URL.
	#[error("Base endpoint `{url}` is invalid.")]
	InvalidBaseUrl {
		/// Normalized value that failed to parse.
		url: String,
		/// Underlying parsing failure.
		#[source]
		source: url::ParseError,
	},
	/// The credential cannot be encoded as a header value.
	#[error("Access credential contains characters not allowed in a header.")]
	InvalidCredentialHeader,
	/// The JSON request body could not be serialized.
	#[error("Request body could not be serialized.")]
	RequestBody {
		/// Serialization failure.
		#[source]
		source: serde_json::Error,
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

/// Successful responses whose body could not be decoded.
#[derive(Debug, ThisError)]
pub enum DecodeError {
	/// The body was not the expected JSON document.
	#[error("Response body did not match the expected JSON shape at `{}`.", .source.path())]
	Json {
		/// Path-aware parsing failure.
		#[source]
		source: serde_path_to_error::Error<serde_json::Error>,
		/// HTTP status of the response.
		status: u16,
	},
}

/// Transport-level failures (network, IO).
#[derive(Debug, ThisError)]
pub enum TransportError {
	/// Underlying HTTP client reported a network failure.
	#[error("Network error occurred while calling the API.")]
	Network {
		/// Transport-specific network error.
		#[source]
		source: BoxError,
	},
	/// Underlying IO failure surfaced during transport.
	#[error("I/O error occurred while calling the API.")]
	Io(#[from] std::io::Error),
}
impl TransportError {
	/// Wraps a transport-specific network error.
	pub fn network(src: impl 'static + Send + Sync + std::error::Error) -> Self {
		Self::Network { source: Box::new(src) }
	}
}
#[cfg(feature = "reqwest")]
impl From<ReqwestError> for TransportError {
	fn from(e: ReqwestError) -> Self {
		Self::network(e)
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn status_error_extracts_server_message() {
		let err = HttpStatusError::from_parts(
			429,
			Some(5),
			br#"{"message":"Please wait 5s before trying again"}"#,
		);

		assert!(err.is_rate_limited());
		assert_eq!(err.message.as_deref(), Some("Please wait 5s before trying again"));
		assert_eq!(
			err.to_string(),
			"Request failed with status 429: Please wait 5s before trying again."
		);
	}

	#[test]
	fn status_error_tolerates_non_json_bodies() {
		let err = HttpStatusError::from_parts(502, None, b"<html>bad gateway</html>");

		assert_eq!(err.message, None);
		assert_eq!(err.body, "<html>bad gateway</html>");
		assert_eq!(err.to_string(), "Request failed with status 502.");
	}

	#[test]
	fn api_error_prefers_server_message_then_display_text() {
		let err: Error = HttpStatusError::from_parts(400, None, br#"{"message":"Bad email"}"#).into();

		assert_eq!(err.api_error(), ApiError { status: Some(400), message: "Bad email".into() });

		let err: Error = TransportError::Io(std::io::Error::other("reset")).into();

		assert_eq!(
			err.api_error(),
			ApiError { status: None, message: "I/O error occurred while calling the API.".into() }
		);
	}

	#[test]
	fn refresh_errors_are_classified() {
		let rejected: Error = HttpStatusError::from_parts(401, None, b"{}").into();

		assert_eq!(
			AuthRecoveryError::from_refresh_error(&rejected),
			AuthRecoveryError::Rejected { status: 401, message: None }
		);

		let io: Error = TransportError::Io(std::io::Error::other("reset")).into();

		assert!(matches!(
			AuthRecoveryError::from_refresh_error(&io),
			AuthRecoveryError::Unavailable { .. }
		));
	}
}
