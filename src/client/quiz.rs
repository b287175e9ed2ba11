//! Quiz submission, optionally recorded in a [`ResultsCache`].

// self
use crate::{
	_prelude::*,
	client::{ApiRequest, SessionClient},
	http::HttpTransport,
	results::{QuizResult, ResultsCache, SubmitAnswer},
};

#[derive(Serialize)]
struct SubmitBody<'a> {
	answers: &'a [SubmitAnswer],
}

impl<C> SessionClient<C>
where
	C: ?Sized + HttpTransport,
{
	/// Submits answers for `quiz_id` via `POST /quizzes/{quiz_id}/submit`.
	pub async fn submit_quiz(&self, quiz_id: &str, answers: &[SubmitAnswer]) -> Result<QuizResult> {
		let request =
			ApiRequest::post(format!("/quizzes/{quiz_id}/submit")).with_json(&SubmitBody { answers })?;

		self.request(request).await?.json()
	}

	/// Submits answers and caches the result under its attempt id.
	pub async fn submit_quiz_into(
		&self,
		cache: &ResultsCache,
		quiz_id: &str,
		answers: &[SubmitAnswer],
	) -> Result<QuizResult> {
		let result = self.submit_quiz(quiz_id, answers).await?;

		cache.save(result.clone());

		Ok(result)
	}
}
