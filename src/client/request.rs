//! Request and response values exchanged with [`SessionClient`](super::SessionClient).

// crates.io
use ::http::{HeaderMap, HeaderName, HeaderValue, Method, StatusCode};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	error::{ConfigError, DecodeError, HttpStatusError},
	http::HttpResponse,
	rate_limit,
};

/// Per-request options layered on top of the client defaults.
#[derive(Clone, Debug, Default)]
pub struct RequestOptions {
	/// Query pairs appended to the resolved URL.
	pub query: Vec<(String, String)>,
	/// Extra headers; an explicit `Authorization` suppresses credential injection.
	pub headers: HeaderMap,
}

/// One logical API call. The value is kept intact across resends.
#[derive(Clone, Debug)]
pub struct ApiRequest {
	/// HTTP method.
	pub method: Method,
	/// Path relative to the versioned base endpoint.
	pub path: String,
	/// Serialized JSON body, if any.
	pub body: Option<Vec<u8>>,
	/// Query and header options.
	pub options: RequestOptions,
}
impl ApiRequest {
	/// Creates a body-less request.
	pub fn new(method: Method, path: impl Into<String>) -> Self {
		Self { method, path: path.into(), body: None, options: Default::default() }
	}

	/// `GET path`.
	pub fn get(path: impl Into<String>) -> Self {
		Self::new(Method::GET, path)
	}

	/// `POST path`.
	pub fn post(path: impl Into<String>) -> Self {
		Self::new(Method::POST, path)
	}

	/// `PUT path`.
	pub fn put(path: impl Into<String>) -> Self {
		Self::new(Method::PUT, path)
	}

	/// `PATCH path`.
	pub fn patch(path: impl Into<String>) -> Self {
		Self::new(Method::PATCH, path)
	}

	/// `DELETE path`.
	pub fn delete(path: impl Into<String>) -> Self {
		Self::new(Method::DELETE, path)
	}

	/// Serializes `body` as the JSON payload.
	pub fn with_json<B>(mut self, body: &B) -> Result<Self, ConfigError>
	where
		B: ?Sized + Serialize,
	{
		self.body = Some(
			serde_json::to_vec(body).map_err(|source| ConfigError::RequestBody { source })?,
		);

		Ok(self)
	}

	/// Appends one query pair.
	pub fn with_query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
		self.options.query.push((key.into(), value.into()));

		self
	}

	/// Adds a header, replacing any previous value with the same name.
	pub fn with_header(mut self, name: HeaderName, value: HeaderValue) -> Self {
		self.options.headers.insert(name, value);

		self
	}
}

/// Buffered response returned by a successful call.
#[derive(Clone, Debug)]
pub struct ApiResponse {
	/// HTTP status.
	pub status: StatusCode,
	/// Response headers.
	pub headers: HeaderMap,
	/// Raw body bytes.
	pub body: Vec<u8>,
}
impl ApiResponse {
	/// Returns `true` for 2xx statuses.
	pub fn is_success(&self) -> bool {
		self.status.is_success()
	}

	/// Decodes the body as JSON, reporting the failing path on mismatch.
	///
	/// An empty body decodes as JSON `null`, so `()` and `Option<T>` accept `204 No Content`.
	pub fn json<T>(&self) -> Result<T>
	where
		T: DeserializeOwned,
	{
		let body: &[u8] = if self.body.is_empty() { b"null" } else { &self.body };
		let mut deserializer = serde_json::Deserializer::from_slice(body);

		serde_path_to_error::deserialize(&mut deserializer)
			.map_err(|source| DecodeError::Json { source, status: self.status.as_u16() }.into())
	}

	/// Returns the body decoded lossily as UTF-8.
	pub fn text(&self) -> String {
		String::from_utf8_lossy(&self.body).into_owned()
	}

	pub(crate) fn from_http(response: HttpResponse) -> Self {
		let (parts, body) = response.into_parts();

		Self { status: parts.status, headers: parts.headers, body }
	}

	pub(crate) fn into_status_error(self) -> HttpStatusError {
		HttpStatusError::from_parts(
			self.status.as_u16(),
			rate_limit::retry_after_from_headers(&self.headers),
			&self.body,
		)
	}
}

#[cfg(test)]
mod tests {
	// crates.io
	use ::http::header::RETRY_AFTER;
	// self
	use super::*;

	fn response(status: u16, body: &str) -> ApiResponse {
		ApiResponse {
			status: StatusCode::from_u16(status).expect("Status fixture should be valid."),
			headers: HeaderMap::new(),
			body: body.as_bytes().to_vec(),
		}
	}

	#[test]
	fn builders_keep_body_and_options() {
		let request = ApiRequest::post("/quizzes")
			.with_json(&serde_json::json!({ "title": "N5" }))
			.expect("JSON body should serialize.")
			.with_query("draft", "true")
			.with_header(HeaderName::from_static("x-trace"), HeaderValue::from_static("1"));

		assert_eq!(request.method, Method::POST);
		assert_eq!(request.body.as_deref(), Some(br#"{"title":"N5"}"#.as_slice()));
		assert_eq!(request.options.query, vec![("draft".to_owned(), "true".to_owned())]);
		assert_eq!(request.options.headers.len(), 1);
	}

	#[test]
	fn json_reports_failing_path() {
		let err = response(200, r#"{"kana":7}"#)
			.json::<HashMap<String, String>>()
			.expect_err("Shape mismatch should fail.");

		assert!(matches!(err, Error::Decode(DecodeError::Json { status: 200, .. })));
		assert!(err.to_string().contains("kana"));

		response(204, "").json::<()>().expect("Empty body should decode as unit.");

		let missing: Option<String> =
			response(204, "").json().expect("Empty body should decode as `None`.");

		assert_eq!(missing, None);
	}

	#[test]
	fn status_error_carries_retry_hint() {
		let mut limited = response(429, r#"{"message":"Please wait 3s"}"#);

		limited.headers.insert(RETRY_AFTER, HeaderValue::from_static("3"));

		let err = limited.into_status_error();

		assert_eq!(err.status, 429);
		assert_eq!(err.retry_after, Some(3));
		assert_eq!(err.message.as_deref(), Some("Please wait 3s"));
	}
}
