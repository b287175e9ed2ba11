//! Client configuration and base endpoint resolution.
//!
//! The base endpoint comes from two places: a default captured when the crate is built
//! (`KOTOBA_API_URL` at compile time) and an optional runtime override installed after the
//! client exists, e.g. by a container entrypoint. [`EndpointResolver::resolve`] is evaluated
//! for every attempt so a late override takes effect without rebuilding the client.

// self
use crate::{_prelude::*, error::ConfigError};

/// Base endpoint used when neither a build-time nor a runtime value is provided.
pub const FALLBACK_BASE_URL: &str = "http://localhost:3001/v1/";
/// Environment variable read for the build-time default and the runtime override.
pub const BASE_URL_ENV: &str = "KOTOBA_API_URL";

/// Static settings for a [`SessionClient`](crate::client::SessionClient).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
	/// Default base endpoint used when no runtime override is installed.
	pub default_base_url: String,
	/// Runtime override applied at construction, if any.
	pub runtime_base_url: Option<String>,
	/// Version segment that must terminate the base path exactly once.
	pub api_version: String,
	/// Path of the credential refresh endpoint, relative to the versioned base.
	pub refresh_path: String,
	/// Longest `Retry-After` the client will wait before resending a read.
	pub rate_limit_ceiling: Duration,
}
impl ClientConfig {
	const DEFAULT_API_VERSION: &'static str = "v1";
	const DEFAULT_RATE_LIMIT_CEILING: Duration = Duration::seconds(10);
	const DEFAULT_REFRESH_PATH: &'static str = "/auth/refresh";

	/// Creates a config with the provided default base endpoint.
	pub fn new(default_base_url: impl Into<String>) -> Self {
		Self {
			default_base_url: default_base_url.into(),
			runtime_base_url: None,
			api_version: Self::DEFAULT_API_VERSION.into(),
			refresh_path: Self::DEFAULT_REFRESH_PATH.into(),
			rate_limit_ceiling: Self::DEFAULT_RATE_LIMIT_CEILING,
		}
	}

	/// Uses the build-time default and honours a runtime `KOTOBA_API_URL` override.
	pub fn from_env() -> Self {
		let runtime_base_url = std::env::var(BASE_URL_ENV).ok().filter(|v| !v.trim().is_empty());

		Self { runtime_base_url, ..Self::default() }
	}

	/// Installs a runtime override at construction time.
	pub fn with_runtime_base_url(mut self, url: impl Into<String>) -> Self {
		self.runtime_base_url = Some(url.into());

		self
	}

	/// Overrides the version segment (defaults to `v1`).
	pub fn with_api_version(mut self, version: impl Into<String>) -> Self {
		self.api_version = version.into().trim_matches('/').to_owned();

		self
	}

	/// Overrides the refresh endpoint path (defaults to `/auth/refresh`).
	pub fn with_refresh_path(mut self, path: impl Into<String>) -> Self {
		self.refresh_path = normalize_path(&path.into());

		self
	}

	/// Overrides the longest honoured `Retry-After` (defaults to 10 seconds).
	pub fn with_rate_limit_ceiling(mut self, ceiling: Duration) -> Self {
		self.rate_limit_ceiling = if ceiling.is_negative() { Duration::ZERO } else { ceiling };

		self
	}
}
impl Default for ClientConfig {
	fn default() -> Self {
		Self::new(option_env!("KOTOBA_API_URL").unwrap_or(FALLBACK_BASE_URL))
	}
}

/// Resolves the effective base endpoint for each attempt.
#[derive(Debug)]
pub struct EndpointResolver {
	default_base_url: String,
	api_version: String,
	runtime_override: RwLock<Option<String>>,
}
impl EndpointResolver {
	/// Builds a resolver from the config's default and optional runtime override.
	pub fn new(config: &ClientConfig) -> Self {
		Self {
			default_base_url: config.default_base_url.clone(),
			api_version: config.api_version.clone(),
			runtime_override: RwLock::new(config.runtime_base_url.clone()),
		}
	}

	/// Installs or replaces the runtime override.
	pub fn set_runtime_override(&self, url: impl Into<String>) {
		*self.runtime_override.write() = Some(url.into());
	}

	/// Removes the runtime override so the default applies again.
	pub fn clear_runtime_override(&self) {
		*self.runtime_override.write() = None;
	}

	/// Returns the normalized base endpoint (no trailing slash).
	pub fn base(&self) -> String {
		let runtime = self.runtime_override.read().clone();
		let raw = runtime.as_deref().filter(|v| !v.trim().is_empty()).unwrap_or(&self.default_base_url);

		normalize_base_url(raw, &self.api_version)
	}

	/// Joins `path` (and optional query pairs) onto the resolved base endpoint.
	pub fn resolve(&self, path: &str, query: &[(String, String)]) -> Result<Url, ConfigError> {
		let joined = format!("{}{}", self.base(), normalize_path(path));
		let mut url = Url::parse(&joined)
			.map_err(|source| ConfigError::InvalidBaseUrl { url: joined.clone(), source })?;

		if !query.is_empty() {
			url.query_pairs_mut().extend_pairs(query.iter().map(|(k, v)| (k.as_str(), v.as_str())));
		}

		Ok(url)
	}
}

/// Normalizes a base endpoint: trims whitespace and trailing slashes, then makes sure the path
/// ends with exactly one `/{version}` segment.
pub fn normalize_base_url(raw: &str, version: &str) -> String {
	let version = version.trim_matches('/');
	let mut base = raw.trim().trim_end_matches('/');

	if version.is_empty() {
		return base.to_owned();
	}

	let suffix = format!("/{version}");

	while let Some(stripped) = base.strip_suffix(suffix.as_str()) {
		base = stripped.trim_end_matches('/');
	}

	format!("{base}{suffix}")
}

/// Ensures a request path has exactly one leading slash and no trailing slash.
pub fn normalize_path(path: &str) -> String {
	let trimmed = path.trim().trim_matches('/');

	if trimmed.is_empty() { String::new() } else { format!("/{trimmed}") }
}
