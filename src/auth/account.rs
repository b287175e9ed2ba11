//! Account maintenance payloads: registration, password reset, and email verification.
//!
//! Every constructor validates locally with the same rules as [`LoginRequest`](super::LoginRequest),
//! so malformed input never reaches the network.

// self
use crate::{
	_prelude::*,
	auth::login::{ValidationError, validate_email, validate_password},
};

/// Body of `POST /auth/register`.
#[derive(Clone, Serialize)]
pub struct RegisterRequest {
	email: String,
	password: String,
}
impl RegisterRequest {
	/// Validates the email, the password rule, and that `confirm_password` matches.
	pub fn new(
		email: impl Into<String>,
		password: impl Into<String>,
		confirm_password: impl AsRef<str>,
	) -> Result<Self, ValidationError> {
		let email = email.into().trim().to_owned();
		let password = password.into();

		validate_email(&email)?;
		validate_password(&password)?;

		if password != confirm_password.as_ref() {
			return Err(ValidationError::PasswordMismatch);
		}

		Ok(Self { email, password })
	}

	/// Normalized email address.
	pub fn email(&self) -> &str {
		&self.email
	}
}
impl Debug for RegisterRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("RegisterRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

/// Body of `POST /auth/forgot-password` and `POST /auth/resend-verification`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct EmailRequest {
	email: String,
}
impl EmailRequest {
	/// Validates and trims `email`.
	pub fn new(email: impl Into<String>) -> Result<Self, ValidationError> {
		let email = email.into().trim().to_owned();

		validate_email(&email)?;

		Ok(Self { email })
	}

	/// Normalized email address.
	pub fn email(&self) -> &str {
		&self.email
	}
}

/// Body of `POST /auth/reset-password`.
#[derive(Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PasswordResetRequest {
	token: String,
	new_password: String,
}
impl PasswordResetRequest {
	/// Pairs the emailed reset token with a new password that passes the password rule.
	pub fn new(
		token: impl Into<String>,
		new_password: impl Into<String>,
		confirm_password: impl AsRef<str>,
	) -> Result<Self, ValidationError> {
		let token = required_token(token.into())?;
		let new_password = new_password.into();

		validate_password(&new_password)?;

		if new_password != confirm_password.as_ref() {
			return Err(ValidationError::PasswordMismatch);
		}

		Ok(Self { token, new_password })
	}
}
impl Debug for PasswordResetRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("PasswordResetRequest")
			.field("token", &"<redacted>")
			.field("new_password", &"<redacted>")
			.finish()
	}
}

/// Body of `POST /auth/verify-email`.
#[derive(Clone, Serialize)]
pub struct VerifyEmailRequest {
	token: String,
}
impl VerifyEmailRequest {
	/// Wraps the emailed verification token.
	pub fn new(token: impl Into<String>) -> Result<Self, ValidationError> {
		Ok(Self { token: required_token(token.into())? })
	}
}
impl Debug for VerifyEmailRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("VerifyEmailRequest").field("token", &"<redacted>").finish()
	}
}

fn required_token(token: String) -> Result<String, ValidationError> {
	let token = token.trim();

	if token.is_empty() {
		return Err(ValidationError::MissingToken);
	}

	Ok(token.to_owned())
}
