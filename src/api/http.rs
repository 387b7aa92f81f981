use reqwest::header::{HeaderName, HeaderValue};
use reqwest::multipart::{Form, Part};
use reqwest::{Method, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use url::Url;

use super::{AuthApi, CbtApi};
use crate::config::Config;
use crate::data::analytics::QuestionPerformance;
use crate::data::assignment::{AssignRequest, Assignment};
use crate::data::attempt::{SessionStart, Submission, SubmissionResult};
use crate::data::question::{NewQuestion, Question, QuestionUpload};
use crate::data::quiz::{NewQuiz, Quiz};
use crate::data::user::{Credentials, MessageResponse, Profile, TokenResponse};
use crate::error::{ClientError, ConfigurationError};
use crate::resp::problem::Problem;
use crate::store::auth::AuthStore;

/// HTTP adapter for the CBT API.
///
/// Attaches the session token to every request and clears the session when
/// the API answers an authenticated request with `401 Unauthorized`.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    root: Url,
    auth_header: HeaderName,
    auth: AuthStore,
}

impl ApiClient {
    pub fn new(config: &Config, auth: AuthStore) -> Result<ApiClient, ClientError> {
        let root = config.api_root()?;
        if root.cannot_be_a_base() {
            return Err(ConfigurationError::ApiRoot(
                url::ParseError::RelativeUrlWithCannotBeABaseBase,
            )
            .into());
        }

        let auth_header = HeaderName::from_bytes(config.auth_header.as_bytes())
            .map_err(|_| ConfigurationError::AuthHeader(config.auth_header.clone()))?;

        let http = reqwest::Client::builder()
            .timeout(config.request_timeout())
            .build()?;

        Ok(ApiClient {
            http,
            root,
            auth_header,
            auth,
        })
    }

    pub fn auth(&self) -> &AuthStore {
        &self.auth
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.root.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str]) -> (RequestBuilder, bool) {
        let url = self.endpoint(segments);
        tracing::debug!("{} {}", method, url);

        let mut request = self.http.request(method, url);
        let mut authenticated = false;

        if let Some(token) = self.auth.token() {
            match HeaderValue::from_str(&token) {
                Ok(value) => {
                    request = request.header(self.auth_header.clone(), value);
                    authenticated = true;
                }
                Err(_) => {
                    tracing::warn!("stored token isn't a valid header value; sending without it")
                }
            }
        }

        (request, authenticated)
    }

    async fn send(
        &self,
        (request, authenticated): (RequestBuilder, bool),
    ) -> Result<Response, ClientError> {
        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED && authenticated {
            tracing::warn!("API rejected the session token");
            self.auth.expire();
            return Err(ClientError::SessionExpired);
        }

        let body = response.bytes().await.unwrap_or_default();
        let problem = Problem::from_body(status, &body);
        tracing::debug!("request failed: {}", problem);

        Err(problem.into())
    }

    async fn json<T: DeserializeOwned>(
        &self,
        request: (RequestBuilder, bool),
    ) -> Result<T, ClientError> {
        let body = self.send(request).await?.bytes().await?;
        Ok(serde_json::from_slice(&body)?)
    }

    async fn get<T: DeserializeOwned>(&self, segments: &[&str]) -> Result<T, ClientError> {
        self.json(self.request(Method::GET, segments)).await
    }

    async fn post<B: serde::Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        segments: &[&str],
        body: &B,
    ) -> Result<T, ClientError> {
        let (request, authenticated) = self.request(Method::POST, segments);
        self.json((request.json(body), authenticated)).await
    }

    async fn delete(&self, segments: &[&str]) -> Result<(), ClientError> {
        self.send(self.request(Method::DELETE, segments)).await?;
        Ok(())
    }
}

impl AuthApi for ApiClient {
    #[tracing::instrument(skip(self))]
    async fn login(&self, credentials: &Credentials) -> Result<TokenResponse, ClientError> {
        self.post(&["auth", "login"], credentials).await
    }

    #[tracing::instrument(skip(self))]
    async fn register(&self, profile: &Profile) -> Result<TokenResponse, ClientError> {
        self.post(&["auth", "register"], profile).await
    }
}

impl CbtApi for ApiClient {
    #[tracing::instrument(skip(self))]
    async fn questions(&self) -> Result<Vec<Question>, ClientError> {
        self.get(&["questions"]).await
    }

    #[tracing::instrument(skip(self))]
    async fn create_question(&self, question: &NewQuestion) -> Result<Question, ClientError> {
        self.post(&["questions"], question).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_question(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&["questions", id]).await
    }

    #[tracing::instrument(skip(self, upload), fields(file = %upload.file_name))]
    async fn upload_questions(
        &self,
        upload: QuestionUpload,
    ) -> Result<MessageResponse, ClientError> {
        let file = Part::bytes(upload.contents)
            .file_name(upload.file_name)
            .mime_str(upload.file_type.mime())?;
        let form = Form::new()
            .part("questionsFile", file)
            .text("fileType", upload.file_type.as_str());

        let (request, authenticated) = self.request(Method::POST, &["questions", "upload"]);
        self.json((request.multipart(form), authenticated)).await
    }

    #[tracing::instrument(skip(self))]
    async fn quizzes(&self) -> Result<Vec<Quiz>, ClientError> {
        self.get(&["quizzes"]).await
    }

    #[tracing::instrument(skip(self))]
    async fn quiz(&self, id: &str) -> Result<Quiz, ClientError> {
        self.get(&["quizzes", id]).await
    }

    #[tracing::instrument(skip(self))]
    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, ClientError> {
        self.post(&["quizzes"], quiz).await
    }

    #[tracing::instrument(skip(self))]
    async fn delete_quiz(&self, id: &str) -> Result<(), ClientError> {
        self.delete(&["quizzes", id]).await
    }

    #[tracing::instrument(skip(self))]
    async fn student_assignments(&self) -> Result<Vec<Assignment>, ClientError> {
        self.get(&["assignments", "student"]).await
    }

    #[tracing::instrument(skip(self))]
    async fn assign_quiz(
        &self,
        quiz_id: &str,
        request: &AssignRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.post(&["assignments", "quiz", quiz_id, "assign"], request)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn start_session(&self, quiz_id: &str) -> Result<SessionStart, ClientError> {
        self.get(&["session", "start", quiz_id]).await
    }

    #[tracing::instrument(skip(self, submission))]
    async fn submit_session(
        &self,
        quiz_id: &str,
        submission: &Submission,
    ) -> Result<SubmissionResult, ClientError> {
        self.post(&["submissions", "quiz", quiz_id, "submit"], submission)
            .await
    }

    #[tracing::instrument(skip(self))]
    async fn question_performance(
        &self,
        quiz_id: &str,
    ) -> Result<Vec<QuestionPerformance>, ClientError> {
        self.get(&["analytics", "quiz", quiz_id, "question-performance"])
            .await
    }
}
