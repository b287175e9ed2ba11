//! Login, logout, session validation, and account maintenance calls.
//!
//! These are ordinary requests through [`SessionClient::request`], so they get the same recovery
//! behavior as every other call. The store-aware helpers at the bottom apply the results to a
//! [`SessionStore`].

// self
use crate::{
	_prelude::*,
	auth::{
		AuthUser, EmailRequest, LoginRequest, PasswordResetRequest, RefreshGrant, RegisterRequest,
		SessionValidation, VerifyEmailRequest,
	},
	client::{ApiRequest, SessionClient},
	http::HttpTransport,
	session::SessionStore,
};

const LOGIN_PATH: &str = "/auth/login";
const LOGOUT_PATH: &str = "/auth/logout";
const VALIDATE_PATH: &str = "/auth/validate";
const PROFILE_PATH: &str = "/users/me";
const REGISTER_PATH: &str = "/auth/register";
const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
const RESET_PASSWORD_PATH: &str = "/auth/reset-password";
const VERIFY_EMAIL_PATH: &str = "/auth/verify-email";
const RESEND_VERIFICATION_PATH: &str = "/auth/resend-verification";

impl<C> SessionClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Exchanges validated credentials for a grant; the caller decides where to store it.
	pub async fn login(&self, credentials: &LoginRequest) -> Result<RefreshGrant> {
		self.request(ApiRequest::post(LOGIN_PATH).with_json(credentials)?).await?.json()
	}

	/// Ends the server-side session.
	pub async fn logout(&self) -> Result<()> {
		self.request(ApiRequest::post(LOGOUT_PATH)).await.map(|_| ())
	}

	/// Asks the backend who is signed in.
	///
	/// `/auth/validate` is consulted first; when it does not name a user the profile endpoint is
	/// tried. A 401 from either, or a 404 from the profile endpoint, means nobody is signed in.
	pub async fn validate_session(&self) -> Result<Option<AuthUser>> {
		let validation = match self.request(ApiRequest::get(VALIDATE_PATH)).await {
			Ok(response) => response.json::<SessionValidation>()?,
			Err(e) if e.is_status(401) => return Ok(None),
			Err(e) => return Err(e),
		};

		if let Some(user) = validation.user {
			return Ok(Some(user));
		}

		match self.request(ApiRequest::get(PROFILE_PATH)).await {
			Ok(response) => response.json::<Option<AuthUser>>(),
			Err(e) if e.is_status(401) || e.is_status(404) => Ok(None),
			Err(e) => Err(e),
		}
	}

	/// Creates an account. The backend emails a verification link; nobody is signed in afterwards.
	pub async fn register(&self, account: &RegisterRequest) -> Result<()> {
		self.post_ignoring_body(REGISTER_PATH, account).await
	}

	/// Asks for a password reset link. The backend answers the same way for unknown addresses.
	pub async fn request_password_reset(&self, email: &EmailRequest) -> Result<()> {
		self.post_ignoring_body(FORGOT_PASSWORD_PATH, email).await
	}

	/// Sets a new password using the token from a reset link.
	pub async fn reset_password(&self, reset: &PasswordResetRequest) -> Result<()> {
		self.post_ignoring_body(RESET_PASSWORD_PATH, reset).await
	}

	/// Confirms an email address using the token from a verification link.
	pub async fn verify_email(&self, verification: &VerifyEmailRequest) -> Result<()> {
		self.post_ignoring_body(VERIFY_EMAIL_PATH, verification).await
	}

	/// Sends a fresh verification link.
	pub async fn resend_verification(&self, email: &EmailRequest) -> Result<()> {
		self.post_ignoring_body(RESEND_VERIFICATION_PATH, email).await
	}

	async fn post_ignoring_body<B>(&self, path: &str, body: &B) -> Result<()>
	where
		B: ?Sized + Serialize,
	{
		self.request(ApiRequest::post(path).with_json(body)?).await.map(|_| ())
	}

	/// Logs in and applies the grant to `store`.
	pub async fn login_into<S>(&self, store: &S, credentials: &LoginRequest) -> Result<AuthUser>
	where
		S: ?Sized + SessionStore,
	{
		let grant = self.login(credentials).await?;

		store.apply_grant(&grant)?;

		Ok(grant.user)
	}

	/// Logs out and clears `store` whether or not the server call succeeded.
	///
	/// The server error, if any, is returned after the store is cleared.
	pub async fn logout_and_clear<S>(&self, store: &S) -> Result<()>
	where
		S: ?Sized + SessionStore,
	{
		let outcome = self.logout().await;

		store.clear()?;

		outcome
	}

	/// Resolves the signed-in user once at startup.
	///
	/// A store that already holds a user is trusted as-is. Otherwise the backend is asked via
	/// [`validate_session`](Self::validate_session): a found user is written back, and a store
	/// left without a user is cleared of any stale credential. The store is marked as checked on
	/// every path, including errors.
	pub async fn bootstrap_session<S>(&self, store: &S) -> Result<Option<AuthUser>>
	where
		S: ?Sized + SessionStore,
	{
		if let Some(user) = store.snapshot().current_user {
			store.mark_auth_checked();

			return Ok(Some(user));
		}

		let outcome = self.validate_session().await;
		let stored = match &outcome {
			Ok(Some(user)) => store.set_user(Some(user.clone())),
			Ok(None) => store.clear(),
			Err(_) => Ok(()),
		};

		store.mark_auth_checked();
		stored?;

		outcome
	}
}
