//! Optional observability helpers for recovery paths.
//!
//! # Feature Flags
//!
//! - Enable `tracing` to emit spans named `kotoba_client.recovery` with the `recovery` (kind) and
//!   `stage` (call site) fields, plus debug events at each retry decision.
//! - Enable `metrics` to increment the `kotoba_client_recovery_total` counter for every
//!   attempt/success/failure/join, labeled by `recovery` + `outcome`.

mod metrics;
mod tracing;

pub use metrics::*;
pub use tracing::*;

// self
use crate::_prelude::*;

/// Recovery paths taken by the client.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecoveryKind {
	/// Credential refresh after a 401.
	AuthRefresh,
	/// Delayed resend after a 429.
	RateLimit,
}
impl RecoveryKind {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RecoveryKind::AuthRefresh => "auth_refresh",
			RecoveryKind::RateLimit => "rate_limit",
		}
	}
}
impl Display for RecoveryKind {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}

/// Outcome labels recorded for each recovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RecoveryOutcome {
	/// Entry into a recovery path.
	Attempt,
	/// The recovery produced a usable result.
	Success,
	/// The recovery failed and the original error surfaces.
	Failure,
	/// A waiter reused the outcome of a refresh performed by another request.
	Joined,
}
impl RecoveryOutcome {
	/// Returns a stable label suitable for span or metric fields.
	pub const fn as_str(self) -> &'static str {
		match self {
			RecoveryOutcome::Attempt => "attempt",
			RecoveryOutcome::Success => "success",
			RecoveryOutcome::Failure => "failure",
			RecoveryOutcome::Joined => "joined",
		}
	}
}
impl Display for RecoveryOutcome {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.write_str(self.as_str())
	}
}
