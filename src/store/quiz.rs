use std::future::Future;
use std::sync::Arc;

use tokio::sync::watch;

use super::{ActionError, OrMessage};
use crate::api::CbtApi;
use crate::data::analytics::QuestionPerformance;
use crate::data::assignment::{AssignRequest, Assignment};
use crate::data::attempt::{SessionStart, Submission, SubmissionResult};
use crate::data::question::{NewQuestion, Question, QuestionUpload};
use crate::data::quiz::{NewQuiz, Quiz};
use crate::error::ClientError;

#[derive(Debug, Clone, Default, PartialEq)]
pub struct QuizState {
    pub questions: Vec<Question>,
    pub quizzes: Vec<Quiz>,
    pub assignments: Vec<Assignment>,
    pub current_quiz: Option<Quiz>,
    pub is_loading: bool,
}

/// Questions, quizzes and assignments cached from the API.
pub struct QuizStore<A> {
    api: Arc<A>,
    state: Arc<watch::Sender<QuizState>>,
}

impl<A> Clone for QuizStore<A> {
    fn clone(&self) -> Self {
        QuizStore {
            api: self.api.clone(),
            state: self.state.clone(),
        }
    }
}

impl<A> std::fmt::Debug for QuizStore<A> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QuizStore")
            .field("state", &*self.state.borrow())
            .finish_non_exhaustive()
    }
}

impl<A: CbtApi> QuizStore<A> {
    pub fn new(api: Arc<A>) -> QuizStore<A> {
        let (state, _) = watch::channel(QuizState::default());
        QuizStore {
            api,
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> QuizState {
        self.state.borrow().clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<QuizState> {
        self.state.subscribe()
    }

    async fn load<T: Clone>(
        &self,
        request: impl Future<Output = Result<T, ClientError>>,
        apply: impl FnOnce(&mut QuizState, T),
    ) -> Result<T, ClientError> {
        self.state.send_modify(|state| state.is_loading = true);
        let _loading = Loading(&self.state);

        match request.await {
            Ok(value) => {
                self.state.send_modify(|state| {
                    apply(state, value.clone());
                    state.is_loading = false;
                });
                Ok(value)
            }
            Err(e) => {
                tracing::debug!("fetch failed: {}", e);
                Err(e)
            }
        }
    }

    pub async fn fetch_questions(&self) -> Result<(), ClientError> {
        self.load(self.api.questions(), |state, questions| {
            state.questions = questions
        })
        .await
        .map(drop)
    }

    pub async fn fetch_quizzes(&self) -> Result<(), ClientError> {
        self.load(self.api.quizzes(), |state, quizzes| state.quizzes = quizzes)
            .await
            .map(drop)
    }

    /// Fetches one quiz into `current_quiz` and returns it.
    pub async fn fetch_quiz(&self, id: &str) -> Result<Quiz, ClientError> {
        self.load(self.api.quiz(id), |state, quiz| state.current_quiz = Some(quiz))
            .await
    }

    /// Assignments of the logged in student.
    pub async fn fetch_assignments(&self) -> Result<(), ClientError> {
        self.load(self.api.student_assignments(), |state, assignments| {
            state.assignments = assignments
        })
        .await
        .map(drop)
    }

    pub async fn create_question(&self, question: NewQuestion) -> Result<Question, ActionError> {
        const FAILED: &str = "Failed to create question";

        let question = question.normalized();
        question.validate().or_message(FAILED)?;

        let created = self.api.create_question(&question).await.or_message(FAILED)?;
        tracing::info!("Created question: {}", created.id);

        self.state
            .send_modify(|state| state.questions.push(created.clone()));
        Ok(created)
    }

    pub async fn delete_question(&self, id: &str) -> Result<(), ActionError> {
        if let Err(e) = self.api.delete_question(id).await {
            return Err(delete_failed(e, "Failed to delete question"));
        }

        self.state
            .send_modify(|state| state.questions.retain(|it| it.id != id));
        Ok(())
    }

    /// Sends a question file for bulk import and returns the server's message.
    ///
    /// Local questions are left as they are; call [`fetch_questions`](Self::fetch_questions)
    /// (or use [`upload_questions_and_refresh`](Self::upload_questions_and_refresh))
    /// to see the imported ones.
    pub async fn upload_questions(&self, upload: QuestionUpload) -> Result<String, ActionError> {
        let response = self
            .api
            .upload_questions(upload)
            .await
            .or_message("Failed to upload questions")?;
        Ok(response.msg.unwrap_or_else(|| "Questions uploaded".to_string()))
    }

    pub async fn upload_questions_and_refresh(
        &self,
        upload: QuestionUpload,
    ) -> Result<String, ActionError> {
        let message = self.upload_questions(upload).await?;
        if let Err(e) = self.fetch_questions().await {
            tracing::warn!("Questions uploaded but refreshing them failed: {}", e);
        }
        Ok(message)
    }

    pub async fn create_quiz(&self, quiz: NewQuiz) -> Result<Quiz, ActionError> {
        const FAILED: &str = "Failed to create quiz";

        quiz.validate().or_message(FAILED)?;
        let created = self.api.create_quiz(&quiz).await.or_message(FAILED)?;
        tracing::info!("Created quiz: {}", created.id);

        self.state
            .send_modify(|state| state.quizzes.push(created.clone()));
        Ok(created)
    }

    pub async fn delete_quiz(&self, id: &str) -> Result<(), ActionError> {
        if let Err(e) = self.api.delete_quiz(id).await {
            return Err(delete_failed(e, "Failed to delete quiz"));
        }

        self.state
            .send_modify(|state| state.quizzes.retain(|it| it.id != id));
        Ok(())
    }

    /// Assigns a quiz and returns the server's message.
    ///
    /// Assignments aren't cached for teachers; nothing local changes.
    pub async fn assign_quiz(
        &self,
        quiz_id: &str,
        request: &AssignRequest,
    ) -> Result<String, ActionError> {
        let response = self
            .api
            .assign_quiz(quiz_id, request)
            .await
            .or_message("Failed to assign quiz")?;
        Ok(response.msg.unwrap_or_else(|| "Quiz assigned".to_string()))
    }

    pub async fn start_quiz_session(&self, quiz_id: &str) -> Result<SessionStart, ActionError> {
        self.api
            .start_session(quiz_id)
            .await
            .or_message("Failed to start quiz session")
    }

    pub async fn submit_quiz(
        &self,
        quiz_id: &str,
        submission: &Submission,
    ) -> Result<SubmissionResult, ActionError> {
        self.api
            .submit_session(quiz_id, submission)
            .await
            .or_message("Failed to submit quiz")
    }

    pub async fn question_performance(
        &self,
        quiz_id: &str,
    ) -> Result<Vec<QuestionPerformance>, ActionError> {
        self.api
            .question_performance(quiz_id)
            .await
            .or_message("Failed to fetch analytics data")
    }
}

/// Clears `is_loading` however a fetch ends, including being dropped
/// mid-flight by its scope.
struct Loading<'a>(&'a watch::Sender<QuizState>);

impl Drop for Loading<'_> {
    fn drop(&mut self) {
        self.0
            .send_if_modified(|state| std::mem::replace(&mut state.is_loading, false));
    }
}

/// Deletes report a fixed message whatever the server said, except for an
/// expired session.
fn delete_failed(e: ClientError, message: &str) -> ActionError {
    let mut e = ActionError::new(e, message);
    if !e.is_session_expired() {
        e.message = message.to_string();
    }
    e
}
