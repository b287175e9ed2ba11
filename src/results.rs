//! In-process cache of submitted quiz results, keyed by attempt.
//!
//! A submission response is the only place the per-word breakdown is available, so callers keep
//! it here and look it up again when showing an attempt.

// crates.io
use serde_json::{Map, Value};
// self
use crate::{_prelude::*, auth::AttemptId};

/// One answer in a quiz submission.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SubmitAnswer {
	/// Word the answer belongs to.
	pub word_id: String,
	/// Answer text; empty when the learner skipped the word.
	pub answer: String,
}
impl SubmitAnswer {
	/// Pairs a word with its answer.
	pub fn new(word_id: impl Into<String>, answer: impl Into<String>) -> Self {
		Self { word_id: word_id.into(), answer: answer.into() }
	}
}

/// Response of `POST /quizzes/{id}/submit`.
///
/// Only the attempt id is interpreted; score and breakdown fields are kept verbatim.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QuizResult {
	/// Attempt created by the submission.
	pub attempt_id: AttemptId,
	/// Remaining response fields.
	#[serde(flatten)]
	pub details: Map<String, Value>,
}

/// Thread-safe results cache.
#[derive(Debug, Default)]
pub struct ResultsCache(RwLock<HashMap<AttemptId, QuizResult>>);
impl ResultsCache {
	/// Stores `result` under its attempt id, returning the entry it replaced.
	pub fn save(&self, result: QuizResult) -> Option<QuizResult> {
		self.0.write().insert(result.attempt_id.clone(), result)
	}

	/// Returns the cached result for `attempt_id`.
	pub fn get(&self, attempt_id: &str) -> Option<QuizResult> {
		self.0.read().get(attempt_id).cloned()
	}

	/// Drops one attempt.
	pub fn remove(&self, attempt_id: &str) -> Option<QuizResult> {
		self.0.write().remove(attempt_id)
	}

	/// Drops every attempt.
	pub fn clear(&self) {
		self.0.write().clear();
	}

	/// Number of cached attempts.
	pub fn len(&self) -> usize {
		self.0.read().len()
	}

	/// Whether nothing is cached.
	pub fn is_empty(&self) -> bool {
		self.0.read().is_empty()
	}
}
