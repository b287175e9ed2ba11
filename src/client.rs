//! Session-aware request client.
//!
//! [`SessionClient::request`] sends one logical request and applies two recovery policies to
//! every call site:
//!
//! - **Auth expiry (401).** The request joins the single in-flight refresh or starts one,
//!   then resends once with the fresh credential. A 401 from the refresh endpoint itself never
//!   triggers a nested refresh.
//! - **Rate limiting (429).** GET requests honour a numeric `Retry-After` up to the configured
//!   ceiling (10 seconds by default) and resend once.
//!
//! Every other status and every transport failure propagates unchanged.

pub mod auth;
pub mod quiz;
pub mod request;

mod attempt;
mod metrics;
mod refresh;

pub use attempt::Attempt;
pub use metrics::RecoveryMetrics;
pub use request::*;

// crates.io
use ::http::{
	HeaderValue, Method,
	header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
};
use serde::de::DeserializeOwned;
// self
use crate::{
	_prelude::*,
	auth::{AccessCredential, RefreshGrant},
	config::{ClientConfig, EndpointResolver, normalize_path},
	error::{ConfigError, HttpStatusError, TransportError},
	http::{HttpRequest, HttpTransport},
	obs::{self, RecoveryKind, RecoveryOutcome, RecoverySpan},
};
#[cfg(feature = "reqwest")] use crate::http::ReqwestHttpClient;
use refresh::RefreshGate;

/// Zero-argument accessor returning the credential to attach to the next send.
pub type CredentialAccessor = Arc<dyn Fn() -> Option<AccessCredential> + Send + Sync>;

#[cfg(feature = "reqwest")]
/// Client specialized for the crate's default reqwest transport.
pub type ReqwestSessionClient = SessionClient<ReqwestHttpClient>;

/// Callbacks through which the client mutates the externally owned session.
///
/// Each callback runs at most once per refresh, on the request that performed it.
pub trait AuthRecoveryHandlers
where
	Self: Send + Sync,
{
	/// A refresh succeeded; store the new user and credential.
	fn on_refresh_success(&self, grant: &RefreshGrant);

	/// The session cannot be recovered; clear it.
	fn on_unauthenticated(&self);
}

/// Closure-backed [`AuthRecoveryHandlers`].
pub struct RecoveryCallbacks {
	on_refresh_success: Box<dyn Fn(&RefreshGrant) + Send + Sync>,
	on_unauthenticated: Box<dyn Fn() + Send + Sync>,
}
impl RecoveryCallbacks {
	/// Bundles the two callbacks.
	pub fn new(
		on_refresh_success: impl Fn(&RefreshGrant) + 'static + Send + Sync,
		on_unauthenticated: impl Fn() + 'static + Send + Sync,
	) -> Self {
		Self {
			on_refresh_success: Box::new(on_refresh_success),
			on_unauthenticated: Box::new(on_unauthenticated),
		}
	}
}
impl AuthRecoveryHandlers for RecoveryCallbacks {
	fn on_refresh_success(&self, grant: &RefreshGrant) {
		(self.on_refresh_success)(grant)
	}

	fn on_unauthenticated(&self) {
		(self.on_unauthenticated)()
	}
}
impl Debug for RecoveryCallbacks {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str("RecoveryCallbacks(..)")
	}
}

/// Issues API requests against the resolved base endpoint with credential injection and
/// transparent recovery.
///
/// Clones share the transport, accessor, handlers, refresh gate, and metrics.
pub struct SessionClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// HTTP transport used for every outbound request.
	pub http_client: Arc<C>,
	/// Counters for recovery paths.
	pub metrics: Arc<RecoveryMetrics>,
	endpoints: Arc<EndpointResolver>,
	refresh_path: String,
	rate_limit_ceiling: Duration,
	credential_accessor: Arc<RwLock<Option<CredentialAccessor>>>,
	recovery_handlers: Arc<RwLock<Option<Arc<dyn AuthRecoveryHandlers>>>>,
	refresh_gate: Arc<RefreshGate>,
}
impl<C> SessionClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Creates a client that reuses the caller-provided transport.
	pub fn with_http_client(config: ClientConfig, http_client: impl Into<Arc<C>>) -> Self {
		Self {
			http_client: http_client.into(),
			metrics: Default::default(),
			endpoints: Arc::new(EndpointResolver::new(&config)),
			refresh_path: normalize_path(&config.refresh_path),
			rate_limit_ceiling: config.rate_limit_ceiling,
			credential_accessor: Default::default(),
			recovery_handlers: Default::default(),
			refresh_gate: Default::default(),
		}
	}

	/// Replaces the credential accessor consulted before every send.
	pub fn set_credential_accessor(
		&self,
		accessor: impl Fn() -> Option<AccessCredential> + 'static + Send + Sync,
	) {
		*self.credential_accessor.write() = Some(Arc::new(accessor));
	}

	/// Replaces the callbacks invoked on refresh success and on irrecoverable auth failure.
	pub fn set_auth_recovery_handlers(&self, handlers: impl AuthRecoveryHandlers + 'static) {
		*self.recovery_handlers.write() = Some(Arc::new(handlers));
	}

	/// Installs a runtime base endpoint that overrides the configured default.
	pub fn set_runtime_base_url(&self, url: impl Into<String>) {
		self.endpoints.set_runtime_override(url);
	}

	/// Returns the base endpoint the next request would use.
	pub fn base_url(&self) -> String {
		self.endpoints.base()
	}

	/// Sends `request`, recovering from a single auth expiry and a single short rate limit.
	pub async fn request(&self, request: ApiRequest) -> Result<ApiResponse> {
		let mut attempt = Attempt::default();

		loop {
			let generation = self.refresh_gate.generation();
			let response = self.send_once(&request).await?;

			if response.is_success() {
				return Ok(response);
			}

			let error = response.into_status_error();

			match self.recover(&request, attempt, generation, error).await {
				Ok(next) => attempt = next,
				Err(error) => return Err(error.into()),
			}
		}
	}

	/// `GET path`, decoding a JSON body.
	pub async fn get<T>(&self, path: &str) -> Result<T>
	where
		T: DeserializeOwned,
	{
		self.request(ApiRequest::get(path)).await?.json()
	}

	/// `GET path?query`, decoding a JSON body.
	pub async fn get_with_query<T, I, K, V>(&self, path: &str, query: I) -> Result<T>
	where
		T: DeserializeOwned,
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		let request =
			query.into_iter().fold(ApiRequest::get(path), |req, (k, v)| req.with_query(k, v));

		self.request(request).await?.json()
	}

	/// `POST path` with a JSON body, decoding a JSON response.
	pub async fn post<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.request(ApiRequest::post(path).with_json(body)?).await?.json()
	}

	/// `PUT path` with a JSON body, decoding a JSON response.
	pub async fn put<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.request(ApiRequest::put(path).with_json(body)?).await?.json()
	}

	/// `PATCH path` with a JSON body, decoding a JSON response.
	pub async fn patch<B, T>(&self, path: &str, body: &B) -> Result<T>
	where
		B: ?Sized + Serialize,
		T: DeserializeOwned,
	{
		self.request(ApiRequest::patch(path).with_json(body)?).await?.json()
	}

	/// `DELETE path`; the response body is ignored.
	pub async fn delete(&self, path: &str) -> Result<()> {
		self.request(ApiRequest::delete(path)).await.map(|_| ())
	}

	/// Decides whether a failed attempt is resent, returning the marker for the next attempt.
	async fn recover(
		&self,
		request: &ApiRequest,
		attempt: Attempt,
		generation: u64,
		error: HttpStatusError,
	) -> Result<Attempt, HttpStatusError> {
		if error.is_unauthorized() {
			return self.recover_auth(request, attempt, generation, error).await;
		}
		if error.is_rate_limited() {
			return self.recover_rate_limit(request, attempt, error).await;
		}

		Err(error)
	}

	async fn recover_auth(
		&self,
		request: &ApiRequest,
		attempt: Attempt,
		generation: u64,
		error: HttpStatusError,
	) -> Result<Attempt, HttpStatusError> {
		const KIND: RecoveryKind = RecoveryKind::AuthRefresh;

		if self.is_refresh_call(request) {
			obs::trace_decision(KIND, error.status, &request.path, "refresh_rejected");
			self.notify_unauthenticated();

			return Err(error);
		}
		if attempt.auth_retried() {
			obs::trace_decision(KIND, error.status, &request.path, "already_retried");

			return Err(error);
		}

		let next = attempt.with_auth_retry();

		match self.refresh_after(generation).await {
			Ok(_) => Ok(next),
			Err(_) => Err(error),
		}
	}

	async fn recover_rate_limit(
		&self,
		request: &ApiRequest,
		attempt: Attempt,
		error: HttpStatusError,
	) -> Result<Attempt, HttpStatusError> {
		const KIND: RecoveryKind = RecoveryKind::RateLimit;

		if request.method != Method::GET || attempt.rate_limit_retried() {
			obs::trace_decision(KIND, error.status, &request.path, "not_retryable");

			return Err(error);
		}

		let Some(wait) = error
			.retry_after
			.and_then(|secs| i64::try_from(secs).ok())
			.map(Duration::seconds)
			.filter(|wait| *wait <= self.rate_limit_ceiling)
		else {
			obs::trace_decision(KIND, error.status, &request.path, "wait_out_of_bounds");

			return Err(error);
		};
		let span = RecoverySpan::new(KIND, "retry_after");

		obs::record_recovery_outcome(KIND, RecoveryOutcome::Attempt);
		self.metrics.record_rate_limit_retry();
		span.instrument(futures_timer::Delay::new(wait.unsigned_abs())).await;

		Ok(attempt.with_rate_limit_retry())
	}

	/// Sends a single attempt without any recovery.
	async fn send_once(&self, request: &ApiRequest) -> Result<ApiResponse> {
		let outbound = self.build_http_request(request)?;
		let response = self
			.http_client
			.execute(outbound)
			.await
			.map_err(|e| Error::from(TransportError::network(e)))?;

		Ok(ApiResponse::from_http(response))
	}

	fn build_http_request(&self, request: &ApiRequest) -> Result<HttpRequest> {
		let url = self.endpoints.resolve(&request.path, &request.options.query)?;
		let mut headers = request.options.headers.clone();

		headers.entry(ACCEPT).or_insert(HeaderValue::from_static("application/json"));

		if request.body.is_some() {
			headers.entry(CONTENT_TYPE).or_insert(HeaderValue::from_static("application/json"));
		}
		if let Some(credential) =
			self.current_credential().filter(|_| !headers.contains_key(AUTHORIZATION))
		{
			let value = HeaderValue::from_str(&credential.bearer())
				.map_err(|_| ConfigError::InvalidCredentialHeader)?;

			headers.insert(AUTHORIZATION, value);
		}

		let mut outbound = ::http::Request::builder()
			.method(request.method.clone())
			.uri(url.as_str())
			.body(request.body.clone().unwrap_or_default())
			.map_err(ConfigError::from)?;

		*outbound.headers_mut() = headers;

		Ok(outbound)
	}

	fn current_credential(&self) -> Option<AccessCredential> {
		let accessor = self.credential_accessor.read().clone();

		accessor.and_then(|get| get())
	}

	fn handlers(&self) -> Option<Arc<dyn AuthRecoveryHandlers>> {
		self.recovery_handlers.read().clone()
	}

	fn notify_unauthenticated(&self) {
		self.metrics.record_unauthenticated();

		if let Some(handlers) = self.handlers() {
			handlers.on_unauthenticated();
		}
	}

	fn is_refresh_call(&self, request: &ApiRequest) -> bool {
		normalize_path(&request.path) == self.refresh_path
	}
}
#[cfg(feature = "reqwest")]
impl SessionClient<ReqwestHttpClient> {
	/// Creates a client backed by a default reqwest transport.
	pub fn new(config: ClientConfig) -> Self {
		Self::with_http_client(config, ReqwestHttpClient::default())
	}
}
impl<C> Clone for SessionClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn clone(&self) -> Self {
		Self {
			http_client: Arc::clone(&self.http_client),
			metrics: Arc::clone(&self.metrics),
			endpoints: Arc::clone(&self.endpoints),
			refresh_path: self.refresh_path.clone(),
			rate_limit_ceiling: self.rate_limit_ceiling,
			credential_accessor: Arc::clone(&self.credential_accessor),
			recovery_handlers: Arc::clone(&self.recovery_handlers),
			refresh_gate: Arc::clone(&self.refresh_gate),
		}
	}
}
impl<C> Debug for SessionClient<C>
where
	C: ?Sized + HttpTransport,
{
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("SessionClient")
			.field("base_url", &self.endpoints.base())
			.field("refresh_path", &self.refresh_path)
			.field("rate_limit_ceiling", &self.rate_limit_ceiling)
			.field("credential_accessor_set", &self.credential_accessor.read().is_some())
			.field("recovery_handlers_set", &self.recovery_handlers.read().is_some())
			.finish()
	}
}
