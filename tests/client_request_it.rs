#![cfg(feature = "reqwest")]

// std
use std::sync::Arc;
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use kotoba_client::{
	auth::{AccessCredential, LoginRequest, Role},
	client::{ApiRequest, ReqwestSessionClient, SessionClient},
	config::ClientConfig,
	error::{ApiError, Error},
	http::ReqwestHttpClient,
	session::{self, MemorySessionStore, Session, SessionStore},
};

fn user_json() -> Value {
	json!({ "id": "u-42", "email": "learner@kotoba.jp", "role": "ADMIN" })
}

fn client_for(server: &MockServer, token: Option<&str>) -> (ReqwestSessionClient, Arc<MemorySessionStore>) {
	let store = Arc::new(MemorySessionStore::with_session(Session {
		access_credential: token.map(AccessCredential::new),
		..Default::default()
	}));
	let client = SessionClient::new(ClientConfig::new(format!("{}/", server.base_url())));

	session::attach(store.clone(), &client);

	(client, store)
}

#[tokio::test]
async fn bearer_accept_and_query_reach_the_server() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(GET)
				.path("/v1/words")
				.query_param("level", "N5")
				.header("authorization", "Bearer abc")
				.header("accept", "application/json");
			then.status(200).json_body(json!([{ "kana": "たべる", "meaning": "to eat" }]));
		})
		.await;
	let (client, _) = client_for(&server, Some("abc"));
	let words: Value =
		client.get_with_query("/words", [("level", "N5")]).await.expect("Query GET should succeed.");

	mock.assert_async().await;
	assert_eq!(words[0]["meaning"], "to eat");
}

#[tokio::test]
async fn json_bodies_are_sent_with_content_type() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(PUT)
				.path("/v1/quizzes/9")
				.header("content-type", "application/json")
				.json_body(json!({ "title": "Verbs" }));
			then.status(200).json_body(json!({ "id": 9, "title": "Verbs" }));
		})
		.await;
	let (client, _) = client_for(&server, None);
	let quiz: Value =
		client.put("/quizzes/9", &json!({ "title": "Verbs" })).await.expect("PUT should succeed.");

	mock.assert_async().await;
	assert_eq!(quiz["title"], "Verbs");
}

#[tokio::test]
async fn runtime_override_replaces_build_default() {
	let server = MockServer::start_async().await;
	let mock = server
		.mock_async(|when, then| {
			when.method(DELETE).path("/v1/words/3");
			then.status(204);
		})
		.await;
	let client = SessionClient::new(ClientConfig::new("http://unreachable.invalid"));

	client.set_runtime_base_url(format!("{}/v1/v1/", server.base_url()));

	assert_eq!(client.base_url(), format!("{}/v1", server.base_url()));

	client.delete("/words/3").await.expect("DELETE should reach the override.");
	mock.assert_async().await;
}

#[tokio::test]
async fn error_bodies_normalize_to_api_error() {
	let server = MockServer::start_async().await;

	server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/words");
			then.status(400).json_body(json!({ "message": "Kana is required" }));
		})
		.await;
	server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/words");
			then.status(200).body("not json");
		})
		.await;

	let (client, _) = client_for(&server, Some("abc"));
	let err = client.post::<_, Value>("/words", &json!({})).await.expect_err("400 should surface.");

	assert_eq!(err.api_error(), ApiError { status: Some(400), message: "Kana is required".into() });

	let err = client.get::<Value>("/words").await.expect_err("Garbage body should fail to decode.");

	assert!(matches!(err, Error::Decode(_)));
	assert_eq!(err.status(), Some(200));
}

#[tokio::test]
async fn unreachable_server_is_a_network_error() {
	let client = SessionClient::new(ClientConfig::new("http://127.0.0.1:9"));
	let err = client.request(ApiRequest::get("/words")).await.expect_err("Nothing listens on port 9.");

	assert!(matches!(err, Error::Network(_)));
	assert_eq!(err.status(), None);
}

#[tokio::test]
async fn login_validate_and_logout_round_trip_through_the_store() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST)
				.path("/v1/auth/login")
				.json_body(json!({ "email": "learner@kotoba.jp", "password": "hunter22" }));
			then.status(200).json_body(json!({ "access_token": "tok-1", "user": user_json() }));
		})
		.await;
	let validate = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/auth/validate").header("authorization", "Bearer tok-1");
			then.status(200).json_body(json!({ "valid": true, "user": user_json() }));
		})
		.await;
	let logout = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/logout");
			then.status(500).json_body(json!({ "message": "Session store offline" }));
		})
		.await;
	let (client, store) = client_for(&server, None);
	let credentials =
		LoginRequest::new("learner@kotoba.jp", "hunter22").expect("Credentials should validate.");
	let user = client.login_into(store.as_ref(), &credentials).await.expect("Login should succeed.");

	assert_eq!(user.role, Role::Admin);
	assert_eq!(store.credential().map(|c| c.expose().to_owned()).as_deref(), Some("tok-1"));

	let validated = client.validate_session().await.expect("Validation should succeed.");

	assert_eq!(validated.map(|u| u.email).as_deref(), Some("learner@kotoba.jp"));

	let err = client.logout_and_clear(store.as_ref()).await.expect_err("Logout error should surface.");

	assert_eq!(err.status(), Some(500));
	assert_eq!(store.snapshot(), Session::default());

	login.assert_async().await;
	validate.assert_async().await;
	logout.assert_async().await;
}

#[tokio::test]
async fn bootstrap_falls_back_to_profile_and_marks_checked() {
	let server = MockServer::start_async().await;
	let validate = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/auth/validate");
			then.status(200).json_body(json!({ "valid": true }));
		})
		.await;
	let profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/users/me");
			then.status(200).json_body(user_json());
		})
		.await;
	let (client, store) = client_for(&server, Some("cookie-session"));
	let user = client.bootstrap_session(store.as_ref()).await.expect("Bootstrap should succeed.");

	assert_eq!(user.map(|u| u.id.to_string()).as_deref(), Some("u-42"));

	let snapshot = store.snapshot();

	assert!(snapshot.auth_checked);
	assert!(snapshot.is_authenticated());

	client.bootstrap_session(store.as_ref()).await.expect("Second bootstrap should be local.");
	validate.assert_calls_async(1).await;
	profile.assert_calls_async(1).await;
}

#[test]
fn login_validation_happens_before_any_request() {
	assert!(matches!(
		LoginRequest::new("learner", "hunter22").map_err(Error::from),
		Err(Error::Validation(_))
	));
}

#[tokio::test]
async fn bootstrap_without_a_user_clears_leftover_credential() {
	let server = MockServer::start_async().await;
	let validate = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/auth/validate");
			then.status(200).json_body(json!({ "valid": false }));
		})
		.await;
	let profile = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/users/me");
			then.status(404).json_body(json!({ "message": "Not found" }));
		})
		.await;
	let (client, store) = client_for(&server, Some("leftover"));
	let user = client.bootstrap_session(store.as_ref()).await.expect("Bootstrap should succeed.");

	assert_eq!(user, None);
	assert_eq!(store.credential(), None);
	assert!(store.snapshot().auth_checked);

	validate.assert_async().await;
	profile.assert_async().await;
}

#[tokio::test]
async fn cookie_store_client_replays_session_cookie() {
	let server = MockServer::start_async().await;
	let login = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/login");
			then.status(200)
				.header("set-cookie", "sid=s-1; Path=/; HttpOnly")
				.json_body(json!({ "user": user_json() }));
		})
		.await;
	let validate = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/auth/validate").header("cookie", "sid=s-1");
			then.status(200).json_body(json!({ "valid": true, "user": user_json() }));
		})
		.await;
	let transport =
		ReqwestHttpClient::with_cookie_store().expect("Cookie-enabled client should build.");
	let client: ReqwestSessionClient =
		SessionClient::with_http_client(ClientConfig::new(server.base_url()), transport);
	let store = Arc::new(MemorySessionStore::default());

	session::attach(store.clone(), &client);

	let credentials =
		LoginRequest::new("learner@kotoba.jp", "hunter22").expect("Credentials should validate.");

	client.login_into(store.as_ref(), &credentials).await.expect("Login should succeed.");

	assert_eq!(store.credential(), None);

	let user = client.validate_session().await.expect("Cookie session should validate.");

	assert_eq!(user.map(|u| u.role), Some(Role::Admin));

	login.assert_async().await;
	validate.assert_async().await;
}
