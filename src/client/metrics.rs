// std
use std::sync::atomic::{AtomicU64, Ordering};

/// Thread-safe counters for the client's recovery paths.
#[derive(Debug, Default)]
pub struct RecoveryMetrics {
	refresh_attempts: AtomicU64,
	refresh_success: AtomicU64,
	refresh_failure: AtomicU64,
	refresh_joined: AtomicU64,
	rate_limit_retries: AtomicU64,
	unauthenticated: AtomicU64,
}
impl RecoveryMetrics {
	/// Returns the number of refresh calls actually sent.
	pub fn refresh_attempts(&self) -> u64 {
		self.refresh_attempts.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls that produced a grant.
	pub fn refresh_successes(&self) -> u64 {
		self.refresh_success.load(Ordering::Relaxed)
	}

	/// Returns the number of refresh calls that failed.
	pub fn refresh_failures(&self) -> u64 {
		self.refresh_failure.load(Ordering::Relaxed)
	}

	/// Returns the number of requests that reused another request's refresh.
	pub fn refresh_joins(&self) -> u64 {
		self.refresh_joined.load(Ordering::Relaxed)
	}

	/// Returns the number of delayed resends after a 429.
	pub fn rate_limit_retries(&self) -> u64 {
		self.rate_limit_retries.load(Ordering::Relaxed)
	}

	/// Returns how many times the unauthenticated callback was invoked.
	pub fn unauthenticated_notifications(&self) -> u64 {
		self.unauthenticated.load(Ordering::Relaxed)
	}

	pub(crate) fn record_refresh_attempt(&self) {
		self.refresh_attempts.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_success(&self) {
		self.refresh_success.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_failure(&self) {
		self.refresh_failure.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_refresh_join(&self) {
		self.refresh_joined.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_rate_limit_retry(&self) {
		self.rate_limit_retries.fetch_add(1, Ordering::Relaxed);
	}

	pub(crate) fn record_unauthenticated(&self) {
		self.unauthenticated.fetch_add(1, Ordering::Relaxed);
	}
}
