#![cfg(feature = "reqwest")]

// std
use std::{
	sync::{
		Arc,
		atomic::{AtomicUsize, Ordering},
	},
	time::{Duration, Instant},
};
// crates.io
use httpmock::prelude::*;
use serde_json::{Value, json};
// self
use kotoba_client::{
	auth::AccessCredential,
	client::{RecoveryCallbacks, ReqwestSessionClient, SessionClient},
	config::ClientConfig,
	rate_limit,
	session::{self, MemorySessionStore, Session, SessionStore},
};

fn grant(token: &str) -> Value {
	json!({
		"user": { "id": "u-7", "email": "learner@kotoba.jp", "role": "USER" },
		"access_token": token,
	})
}

fn client_for(server: &MockServer, token: &str) -> (ReqwestSessionClient, Arc<MemorySessionStore>) {
	let store = Arc::new(MemorySessionStore::with_session(Session {
		access_credential: Some(AccessCredential::new(token)),
		..Default::default()
	}));
	let client = SessionClient::new(ClientConfig::new(server.base_url()));

	session::attach(store.clone(), &client);

	(client, store)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_expiries_trigger_exactly_one_refresh() {
	let server = MockServer::start_async().await;
	let stale = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/words").header("authorization", "Bearer stale");
			then.status(401).json_body(json!({ "message": "Token expired" }));
		})
		.await;
	let fresh = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/words").header("authorization", "Bearer fresh");
			then.status(200).json_body(json!([]));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/refresh");
			then.status(200).delay(Duration::from_millis(200)).json_body(grant("fresh"));
		})
		.await;
	let (client, store) = client_for(&server, "stale");
	let tasks = (0..4)
		.map(|_| {
			let client = client.clone();

			tokio::spawn(async move { client.get::<Value>("/words").await })
		})
		.collect::<Vec<_>>();

	for task in tasks {
		task.await.expect("Task should not panic.").expect("Each request should recover.");
	}

	refresh.assert_calls_async(1).await;
	fresh.assert_calls_async(4).await;
	assert!(stale.calls_async().await >= 1);
	assert_eq!(client.metrics.refresh_attempts(), 1);
	assert_eq!(store.credential().map(|c| c.expose().to_owned()).as_deref(), Some("fresh"));
}

#[tokio::test]
async fn rejected_refresh_notifies_once_and_does_not_recurse() {
	let server = MockServer::start_async().await;
	let words = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/words");
			then.status(401).json_body(json!({ "message": "Token expired" }));
		})
		.await;
	let refresh = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/auth/refresh");
			then.status(401).json_body(json!({ "message": "Missing refresh cookie" }));
		})
		.await;
	let client = SessionClient::new(ClientConfig::new(server.base_url()));
	let (refreshed, cleared) = (Arc::new(AtomicUsize::new(0)), Arc::new(AtomicUsize::new(0)));
	let (on_refresh, on_clear) = (refreshed.clone(), cleared.clone());

	client.set_credential_accessor(|| Some(AccessCredential::new("stale")));
	client.set_auth_recovery_handlers(RecoveryCallbacks::new(
		move |_| {
			on_refresh.fetch_add(1, Ordering::SeqCst);
		},
		move || {
			on_clear.fetch_add(1, Ordering::SeqCst);
		},
	));

	let err = client.get::<Value>("/words").await.expect_err("The original 401 should surface.");

	assert_eq!(err.status(), Some(401));
	assert_eq!(err.api_error().message, "Token expired");
	words.assert_calls_async(1).await;
	refresh.assert_calls_async(1).await;
	assert_eq!(refreshed.load(Ordering::SeqCst), 0);
	assert_eq!(cleared.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn short_retry_after_is_honoured_once_for_reads() {
	let server = MockServer::start_async().await;
	let limited = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/words");
			then.status(429)
				.header("retry-after", "1")
				.json_body(json!({ "message": "Please wait 1s before trying again" }));
		})
		.await;
	let (client, _) = client_for(&server, "abc");
	let started = Instant::now();
	let err = client.get::<Value>("/words").await.expect_err("The second 429 should surface.");

	assert!(started.elapsed() >= Duration::from_secs(1));
	limited.assert_calls_async(2).await;

	let info = rate_limit::extract_rate_limit(&err).expect("A 429 should carry rate-limit info.");

	assert_eq!(info.status, Some(429));
	assert_eq!(info.retry_after_seconds, Some(1));
	assert!(!info.is_daily_cap);
}

#[tokio::test]
async fn writes_and_long_waits_are_never_retried() {
	let server = MockServer::start_async().await;
	let write = server
		.mock_async(|when, then| {
			when.method(POST).path("/v1/quizzes/1/attempts");
			then.status(429).header("retry-after", "1").json_body(json!({}));
		})
		.await;
	let long = server
		.mock_async(|when, then| {
			when.method(GET).path("/v1/words");
			then.status(429)
				.header("retry-after", "20")
				.json_body(json!({ "message": "Daily limit reached, try again later" }));
		})
		.await;
	let (client, _) = client_for(&server, "abc");
	let started = Instant::now();
	let err = client
		.post::<_, Value>("/quizzes/1/attempts", &json!({ "answers": [] }))
		.await
		.expect_err("POST 429 should surface.");

	assert_eq!(err.status(), Some(429));

	let err = client.get::<Value>("/words").await.expect_err("A 20s wait should surface.");
	let info = rate_limit::extract_rate_limit(&err).expect("A 429 should carry rate-limit info.");

	assert!(info.is_daily_cap);
	assert!(started.elapsed() < Duration::from_secs(1));
	write.assert_calls_async(1).await;
	long.assert_calls_async(1).await;
}
