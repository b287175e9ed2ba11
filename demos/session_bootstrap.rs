//! Demonstrates the startup path of an app shell: persisted session, bootstrap validation, and a
//! transparent refresh when the stored credential has expired.
//!
//! A local mock server plays the backend. The stored credential is rejected once, the client
//! refreshes it through `/auth/refresh`, and the original request is resent without the caller
//! noticing.

// std
use std::{env, process, sync::Arc};
// crates.io
use color_eyre::Result;
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use kotoba_client::{
	auth::{AccessCredential, RefreshGrant},
	client::SessionClient,
	config::ClientConfig,
	session::{self, FileSessionStore, SessionStore},
};

#[tokio::main]
async fn main() -> Result<()> {
	color_eyre::install()?;

	let server = MockServer::start_async().await;
	let user = json!({ "id": "u-1", "email": "learner@kotoba.jp", "role": "USER" });
	let stale_words = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/words").header("authorization", "Bearer expired");
			then.status(401).json_body(json!({ "message": "Token expired" }));
		})
		.await;
	let fresh_words = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/words").header("authorization", "Bearer renewed");
			then.status(200).json_body(json!([{ "kana": "まなぶ", "meaning": "to learn" }]));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/refresh");
			then.status(200).json_body(json!({ "user": user.clone(), "access_token": "renewed" }));
		})
		.await;

	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/auth/validate");
			then.status(200).json_body(json!({ "valid": true }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/users/me");
			then.status(200).json_body(user.clone());
		})
		.await;

	let path = env::temp_dir().join(format!("kotoba_session_demo_{}.json", process::id()));
	let store = Arc::new(FileSessionStore::open(&path)?);

	store.clear()?;
	store.apply_grant(&RefreshGrant {
		user: serde_json::from_value(user.clone())?,
		access_token: Some(AccessCredential::new("expired")),
	})?;
	store.set_user(None)?;

	let client = SessionClient::new(ClientConfig::new(server.base_url()));

	session::attach(store.clone(), &client);

	let bootstrapped = client.bootstrap_session(store.as_ref()).await?;

	println!("Bootstrapped user: {:?}", bootstrapped.map(|u| u.email));

	let words: Value = client.get("/words").await?;

	println!("Words after transparent refresh: {words}");
	println!(
		"Refresh calls: {}, stale sends: {}, fresh sends: {}.",
		refresh.calls_async().await,
		stale_words.calls_async().await,
		fresh_words.calls_async().await,
	);
	println!("Session persisted at {}.", store.path().display());

	std::fs::remove_file(&path)?;

	Ok(())
}
