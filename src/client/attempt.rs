/// Per-request retry marker threaded through the send loop.
///
/// Each recovery kind may fire at most once per logical request, so a request is sent at most
/// three times: the original, one resend after a refresh, and one resend after a rate limit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Attempt {
	auth_retried: bool,
	rate_limit_retried: bool,
}
impl Attempt {
	/// Whether this request already resent after a credential refresh.
	pub fn auth_retried(self) -> bool {
		self.auth_retried
	}

	/// Whether this request already resent after a rate limit.
	pub fn rate_limit_retried(self) -> bool {
		self.rate_limit_retried
	}

	/// Marks the next attempt as the post-refresh resend.
	pub fn with_auth_retry(self) -> Self {
		Self { auth_retried: true, ..self }
	}

	/// Marks the next attempt as the post-rate-limit resend.
	pub fn with_rate_limit_retry(self) -> Self {
		Self { rate_limit_retried: true, ..self }
	}
}

#[cfg(test)]
mod tests {
	// self
	use super::*;

	#[test]
	fn markers_are_independent_and_sticky() {
		let fresh = Attempt::default();

		assert!(!fresh.auth_retried());
		assert!(!fresh.rate_limit_retried());

		let both = fresh.with_rate_limit_retry().with_auth_retry();

		assert!(both.auth_retried());
		assert!(both.rate_limit_retried());
		assert_eq!(both.with_auth_retry(), both);
	}
}
