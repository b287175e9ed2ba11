//! Login form validation and the grant payloads returned by login/refresh.

// self
use crate::{
	_prelude::*,
	auth::{AccessCredential, AuthUser},
};

const PASSWORD_MIN_LEN: usize = 6;

/// Client-side validation failures raised before a request is sent.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize, ThisError)]
pub enum ValidationError {
	/// The email is not shaped like `local@domain`.
	#[error("Email address is invalid.")]
	InvalidEmail,
	/// The password is shorter than the accepted minimum.
	#[error("Password must be at least {min} characters.")]
	PasswordTooShort {
		/// Minimum accepted length.
		min: usize,
	},
	/// The password and its confirmation differ.
	#[error("Passwords do not match.")]
	PasswordMismatch,
	/// A one-time token from an email link was empty.
	#[error("Token is missing.")]
	MissingToken,
}

/// Credentials submitted to `POST /auth/login`.
#[derive(Clone, Serialize)]
pub struct LoginRequest {
	email: String,
	password: String,
}
impl LoginRequest {
	/// Validates and builds a login payload.
	pub fn new(email: impl Into<String>, password: impl Into<String>) -> Result<Self, ValidationError> {
		let email = email.into().trim().to_owned();
		let password = password.into();

		validate_email(&email)?;
		validate_password(&password)?;

		Ok(Self { email, password })
	}

	/// Normalized email address.
	pub fn email(&self) -> &str {
		&self.email
	}
}
impl Debug for LoginRequest {
	fn fmt(&self, f: &mut Formatter) -> FmtResult {
		f.debug_struct("LoginRequest")
			.field("email", &self.email)
			.field("password", &"<redacted>")
			.finish()
	}
}

pub(crate) fn validate_password(password: &str) -> Result<(), ValidationError> {
	if password.chars().count() < PASSWORD_MIN_LEN {
		return Err(ValidationError::PasswordTooShort { min: PASSWORD_MIN_LEN });
	}

	Ok(())
}

pub(crate) fn validate_email(email: &str) -> Result<(), ValidationError> {
	let mut parts = email.split('@');
	let (Some(local), Some(domain), None) = (parts.next(), parts.next(), parts.next()) else {
		return Err(ValidationError::InvalidEmail);
	};

	if local.is_empty()
		|| domain.is_empty()
		|| !domain.contains('.')
		|| domain.starts_with('.')
		|| domain.ends_with('.')
		|| email.chars().any(char::is_whitespace)
	{
		return Err(ValidationError::InvalidEmail);
	}

	Ok(())
}

/// Session grant returned by `POST /auth/login` and `POST /auth/refresh`.
///
/// Cookie-based deployments omit `access_token`; the session then keeps whatever credential it
/// already holds.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RefreshGrant {
	/// Signed-in user.
	pub user: AuthUser,
	/// Fresh bearer credential, when the backend returns one in the body.
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub access_token: Option<AccessCredential>,
}

/// Body of `GET /auth/validate`.
#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct SessionValidation {
	/// Whether the presented credential is still accepted.
	#[serde(default)]
	pub valid: bool,
	/// User attached to the credential, when the backend includes it.
	#[serde(default)]
	pub user: Option<AuthUser>,
}
