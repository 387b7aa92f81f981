//! Endpoints of the CBT API as traits, so stores can be driven by
//! [`ApiClient`](http::ApiClient) or by an in-memory stand-in.
//!
//! Futures returned by these traits aren't required to be `Send`; stores are
//! driven from the task that owns them.

use crate::data::analytics::QuestionPerformance;
use crate::data::assignment::{AssignRequest, Assignment};
use crate::data::attempt::{SessionStart, Submission, SubmissionResult};
use crate::data::question::{NewQuestion, Question, QuestionUpload};
use crate::data::quiz::{NewQuiz, Quiz};
use crate::data::user::{Credentials, MessageResponse, Profile, TokenResponse};
use crate::error::ClientError;

pub mod http;
pub mod scope;

#[allow(async_fn_in_trait)]
pub trait AuthApi {
    /// `POST /auth/login`
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ClientError>;
    /// `POST /auth/register`
    async fn register(&self, profile: &Profile) -> Result<TokenResponse, ClientError>;
}

#[allow(async_fn_in_trait)]
pub trait CbtApi {
    /// `GET /questions`
    async fn questions(&self) -> Result<Vec<Question>, ClientError>;
    /// `POST /questions`
    async fn create_question(&self, question: &NewQuestion) -> Result<Question, ClientError>;
    /// `DELETE /questions/{id}`
    async fn delete_question(&self, id: &str) -> Result<(), ClientError>;
    /// `POST /questions/upload` as multipart form.
    async fn upload_questions(&self, upload: QuestionUpload)
        -> Result<MessageResponse, ClientError>;

    /// `GET /quizzes`
    async fn quizzes(&self) -> Result<Vec<Quiz>, ClientError>;
    /// `GET /quizzes/{id}`
    async fn quiz(&self, id: &str) -> Result<Quiz, ClientError>;
    /// `POST /quizzes`
    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, ClientError>;
    /// `DELETE /quizzes/{id}`
    async fn delete_quiz(&self, id: &str) -> Result<(), ClientError>;

    /// `GET /assignments/student`
    async fn student_assignments(&self) -> Result<Vec<Assignment>, ClientError>;
    /// `POST /assignments/quiz/{quiz_id}/assign`
    async fn assign_quiz(
        &self,
        quiz_id: &str,
        request: &AssignRequest,
    ) -> Result<MessageResponse, ClientError>;

    /// `GET /session/start/{quiz_id}`
    async fn start_session(&self, quiz_id: &str) -> Result<SessionStart, ClientError>;
    /// `POST /submissions/quiz/{quiz_id}/submit`
    async fn submit_session(
        &self,
        quiz_id: &str,
        submission: &Submission,
    ) -> Result<SubmissionResult, ClientError>;

    /// `GET /analytics/quiz/{quiz_id}/question-performance`
    async fn question_performance(
        &self,
        quiz_id: &str,
    ) -> Result<Vec<QuestionPerformance>, ClientError>;
}
