//! Pure helpers for interpreting rate-limit responses.
//!
//! The retry state machine in [`client`](crate::client) only consults the numeric
//! `Retry-After` header via [`retry_after_from_headers`]. [`parse_rate_limit_message`] reads the
//! human-readable server message for callers that want to show a countdown or tell a temporary
//! throttle apart from a daily cap.

// std
use std::sync::LazyLock;
// crates.io
use ::http::{HeaderMap, header::RETRY_AFTER};
use regex::Regex;
// self
use crate::_prelude::*;

// TODO: switch daily-cap detection to a structured error code once the backend exposes one.
static WAIT_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)please wait\s+(\d+)s").expect("Wait pattern should compile.")
});
static DAILY_CAP_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
	Regex::new(r"(?i)daily limit|try again later").expect("Daily-cap pattern should compile.")
});

/// Rate-limit details extracted from a server message.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitInfo {
	/// HTTP status, when extracted from an error.
	pub status: Option<u16>,
	/// Wait hint parsed from a `Please wait <N>s` phrase.
	pub retry_after_seconds: Option<u64>,
	/// Whether the message indicates a longer-horizon cap.
	pub is_daily_cap: bool,
	/// Original message, if any.
	pub raw_message: Option<String>,
}

/// Parses a human-readable rate-limit message.
pub fn parse_rate_limit_message(message: Option<&str>) -> RateLimitInfo {
	let Some(message) = message.filter(|m| !m.is_empty()) else {
		return RateLimitInfo { raw_message: message.map(str::to_owned), ..Default::default() };
	};
	let retry_after_seconds = WAIT_PATTERN
		.captures(message)
		.and_then(|captures| captures.get(1))
		.and_then(|digits| digits.as_str().parse::<u64>().ok());

	RateLimitInfo {
		status: None,
		retry_after_seconds,
		is_daily_cap: DAILY_CAP_PATTERN.is_match(message),
		raw_message: Some(message.to_owned()),
	}
}

/// Extracts rate-limit details from a 429 error; returns `None` for any other error.
pub fn extract_rate_limit(error: &Error) -> Option<RateLimitInfo> {
	let Error::HttpStatus(status) = error else {
		return None;
	};

	if !status.is_rate_limited() {
		return None;
	}

	let message = error.api_error().message;

	Some(RateLimitInfo { status: Some(status.status), ..parse_rate_limit_message(Some(&message)) })
}

/// Reads `Retry-After` as whole seconds.
///
/// Only the numeric form is understood; an HTTP-date or any other value yields `None`, which
/// leaves the 429 to surface unchanged.
pub fn retry_after_from_headers(headers: &HeaderMap) -> Option<u64> {
	headers.get(RETRY_AFTER)?.to_str().ok()?.trim().parse().ok()
}
