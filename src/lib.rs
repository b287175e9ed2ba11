//! Session-aware REST client for the KotobaMichi API: bearer injection, single-flight token
//! refresh, and bounded rate-limit backoff behind one `request` call.

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod auth;
pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod obs;
pub mod rate_limit;
pub mod results;
pub mod session;
#[cfg(all(any(test, feature = "test"), feature = "reqwest"))]
pub mod _preludet {
	//! Convenience re-exports and helpers for tests; enabled via `cfg(test)` or the `test` crate
	//! feature.

	pub use crate::_prelude::*;

	// std
	use std::time::{Duration as StdDuration, Instant};
	// crates.io
	use ::http::{HeaderName, HeaderValue, Method, StatusCode, header::AUTHORIZATION};
	// self
	use crate::{
		client::SessionClient,
		config::ClientConfig,
		http::{HttpRequest, HttpResponse, HttpTransport, ReqwestHttpClient, TransportFuture},
		session::{self, MemorySessionStore},
	};

	/// Client type alias used by reqwest-backed tests.
	pub type ReqwestTestClient = SessionClient<ReqwestHttpClient>;
	/// Client type alias used by scripted-transport tests.
	pub type ScriptedTestClient = SessionClient<ScriptedTransport>;

	type Handler = Arc<dyn Fn(&HttpRequest) -> ScriptedReply + Send + Sync>;

	/// Builds a config pointing at a server root; the version prefix is appended during
	/// resolution.
	pub fn test_config(server_root: &str) -> ClientConfig {
		ClientConfig::new(server_root)
	}

	/// Constructs a [`SessionClient`] over reqwest with a fresh in-memory session store
	/// already attached.
	pub fn build_reqwest_test_client(server_root: &str) -> (ReqwestTestClient, Arc<MemorySessionStore>) {
		let store = Arc::new(MemorySessionStore::default());
		let client = SessionClient::new(test_config(server_root));

		session::attach(store.clone(), &client);

		(client, store)
	}

	/// Constructs a [`SessionClient`] over `transport` with `store` attached.
	pub fn build_scripted_test_client(
		transport: Arc<ScriptedTransport>,
		store: Arc<MemorySessionStore>,
	) -> ScriptedTestClient {
		let client: ScriptedTestClient =
			SessionClient::with_http_client(test_config("http://api.test"), transport);

		session::attach(store, &client);

		client
	}

	/// Canned reply produced by a [`ScriptedTransport`] route.
	#[derive(Clone, Debug)]
	pub struct ScriptedReply {
		status: u16,
		headers: Vec<(HeaderName, HeaderValue)>,
		body: String,
		delay: Option<StdDuration>,
		disconnect: bool,
	}
	impl ScriptedReply {
		/// Reply with `status` and a raw body.
		pub fn new(status: u16, body: impl Into<String>) -> Self {
			Self { status, headers: Vec::new(), body: body.into(), delay: None, disconnect: false }
		}

		/// Reply with `status` and a JSON body.
		pub fn json(status: u16, body: serde_json::Value) -> Self {
			Self::new(status, body.to_string())
		}

		/// Fails the exchange as if the connection dropped.
		pub fn disconnect() -> Self {
			Self { disconnect: true, ..Self::new(0, "") }
		}

		/// Adds a response header.
		pub fn with_header(mut self, name: &'static str, value: &str) -> Self {
			self.headers.push((
				HeaderName::from_static(name),
				HeaderValue::from_str(value).expect("Scripted header value should be valid."),
			));

			self
		}

		/// Waits before replying.
		pub fn with_delay(mut self, delay: StdDuration) -> Self {
			self.delay = Some(delay);

			self
		}
	}

	/// Request as observed by a [`ScriptedTransport`].
	#[derive(Clone, Debug)]
	pub struct SentRequest {
		/// HTTP method.
		pub method: Method,
		/// Full URL.
		pub url: String,
		/// URL path.
		pub path: String,
		/// `Authorization` header, if any.
		pub authorization: Option<String>,
		/// When the request reached the transport.
		pub at: Instant,
	}

	/// Error returned for [`ScriptedReply::disconnect`].
	#[derive(Debug, ThisError)]
	#[error("Scripted connection dropped.")]
	pub struct ScriptedDisconnect;

	/// In-process transport that answers through per-route handlers and records every request.
	///
	/// Unrouted requests receive a 404.
	#[derive(Default)]
	pub struct ScriptedTransport {
		routes: RwLock<HashMap<(Method, String), Handler>>,
		log: Mutex<Vec<SentRequest>>,
	}
	impl ScriptedTransport {
		/// Routes `method path` to `handler`, replacing a previous route.
		pub fn on(
			&self,
			method: Method,
			path: &str,
			handler: impl Fn(&HttpRequest) -> ScriptedReply + 'static + Send + Sync,
		) {
			self.routes.write().insert((method, path.to_owned()), Arc::new(handler));
		}

		/// Returns every recorded request.
		pub fn sent(&self) -> Vec<SentRequest> {
			self.log.lock().clone()
		}

		/// Counts recorded requests to `method path`.
		pub fn hits(&self, method: Method, path: &str) -> usize {
			self.log.lock().iter().filter(|r| r.method == method && r.path == path).count()
		}
	}
	impl Debug for ScriptedTransport {
		fn fmt(&self, f: &mut Formatter) -> FmtResult {
			f.debug_struct("ScriptedTransport").field("sent", &self.log.lock().len()).finish()
		}
	}
	impl HttpTransport for ScriptedTransport {
		type TransportError = ScriptedDisconnect;

		fn execute(&self, request: HttpRequest) -> TransportFuture<'_, Self::TransportError> {
			let key = (request.method().clone(), request.uri().path().to_owned());

			self.log.lock().push(SentRequest {
				method: key.0.clone(),
				url: request.uri().to_string(),
				path: key.1.clone(),
				authorization: request
					.headers()
					.get(AUTHORIZATION)
					.and_then(|v| v.to_str().ok())
					.map(str::to_owned),
				at: Instant::now(),
			});

			let handler = self.routes.read().get(&key).cloned();
			let reply = match handler {
				Some(handler) => handler(&request),
				None => ScriptedReply::json(404, serde_json::json!({ "message": "No scripted route" })),
			};

			Box::pin(async move {
				if let Some(delay) = reply.delay {
					futures_timer::Delay::new(delay).await;
				}
				if reply.disconnect {
					return Err(ScriptedDisconnect);
				}

				let mut response = HttpResponse::new(reply.body.into_bytes());

				*response.status_mut() =
					StatusCode::from_u16(reply.status).expect("Scripted status should be valid.");

				for (name, value) in reply.headers {
					response.headers_mut().append(name, value);
				}

				Ok(response)
			})
		}
	}
}

mod _prelude {
	pub use std::{
		collections::HashMap,
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		sync::Arc,
	};

	pub use async_lock::Mutex as AsyncMutex;
	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::{Duration, OffsetDateTime};
	pub use url::Url;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
pub use url;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
