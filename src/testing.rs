//! Shared test fixtures: an in-memory API and a one-shot loopback server.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use reqwest::StatusCode;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tokio::task::JoinHandle;

use crate::api::{AuthApi, CbtApi};
use crate::config::Config;
use crate::data::analytics::QuestionPerformance;
use crate::data::assignment::{AssignRequest, Assignment};
use crate::data::attempt::{SessionStart, Submission, SubmissionResult};
use crate::data::question::{NewQuestion, Question, QuestionType, QuestionUpload};
use crate::data::quiz::{NewQuiz, Quiz, QuestionRef};
use crate::data::user::{Credentials, MessageResponse, Profile, TokenResponse};
use crate::error::ClientError;
use crate::store::auth::Session;

pub fn mint_token(id: &str, name: &str, role: &str, exp: DateTime<Utc>) -> String {
    use jsonwebtoken::{encode, EncodingKey, Header};

    let claims = serde_json::json!({
        "user": { "id": id, "name": name, "role": role },
        "iat": Utc::now().timestamp(),
        "exp": exp.timestamp(),
    });
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(b"server side secret"),
    )
    .expect("encoding should work for example")
}

pub fn session_for(role: &str) -> Session {
    let token = mint_token("u1", "Test User", role, Utc::now() + Duration::hours(1));
    Session::from_token(token).expect("minted token decodes")
}

pub fn question(id: &str) -> Question {
    Question {
        id: id.to_string(),
        question_text: format!("Question {}", id),
        question_type: QuestionType::TrueFalse,
        options: vec![],
        answer: None,
    }
}

pub fn quiz(id: &str, questions: &[&str], time_limit: u32) -> Quiz {
    Quiz {
        id: id.to_string(),
        title: format!("Quiz {}", id),
        description: String::new(),
        questions: questions
            .iter()
            .map(|it| QuestionRef::Id(it.to_string()))
            .collect(),
        time_limit,
        created_at: Some(Utc::now()),
    }
}

pub fn session_start(questions: &[&str], minutes: u32) -> SessionStart {
    SessionStart {
        quiz_title: "Test quiz".to_string(),
        questions: questions.iter().map(|it| question(it)).collect(),
        time_limit: Some(minutes),
    }
}

/// Fresh directory under the system temp dir.
pub fn scratch_dir() -> PathBuf {
    std::env::temp_dir().join(format!("cbt-client-test-{:016x}", rand::random::<u64>()))
}

pub fn config_for(addr: SocketAddr) -> Config {
    let mut config = Config::default();
    config.api_root = format!("http://{}/api", addr);
    config.request_timeout_secs = 5;
    config
}

/// Answers a single HTTP request and hands back the raw request text.
pub async fn serve_once(status: &str, body: &str) -> (SocketAddr, JoinHandle<String>) {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("loopback is bindable");
    let addr = listener.local_addr().expect("bound address");
    let response = format!(
        "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\n\
         Connection: close\r\n\r\n{}",
        status,
        body.len(),
        body
    );

    let handle = tokio::spawn(async move {
        let (mut socket, _) = listener.accept().await.expect("client connects");

        let mut request = Vec::new();
        let mut buf = [0u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.expect("readable");
            if n == 0 {
                break;
            }
            request.extend_from_slice(&buf[..n]);
            if request_complete(&request) {
                break;
            }
        }

        socket
            .write_all(response.as_bytes())
            .await
            .expect("writable");
        socket.shutdown().await.ok();
        String::from_utf8_lossy(&request).to_string()
    });

    (addr, handle)
}

fn request_complete(request: &[u8]) -> bool {
    let text = String::from_utf8_lossy(request);
    let Some(header_end) = text.find("\r\n\r\n") else {
        return false;
    };
    let length = text[..header_end]
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);
    request.len() >= header_end + 4 + length
}

/// In-memory stand-in for the CBT API.
#[derive(Default)]
pub struct FakeApi {
    pub questions: Mutex<Vec<Question>>,
    pub quizzes: Mutex<Vec<Quiz>>,
    pub assignments: Mutex<Vec<Assignment>>,
    pub session: Mutex<Option<SessionStart>>,
    pub performance: Mutex<Vec<QuestionPerformance>>,
    pub submissions: Mutex<Vec<(String, Submission)>>,
    token: Mutex<Option<String>>,
    failure: Mutex<Option<(StatusCode, Option<String>)>>,
    failing_submissions: AtomicUsize,
    calls: AtomicUsize,
    next_id: AtomicUsize,
    stall: Mutex<Option<StdDuration>>,
}

impl FakeApi {
    pub fn with_user(id: &str, name: &str, role: &str) -> FakeApi {
        let api = FakeApi::default();
        api.set_token(&mint_token(id, name, role, Utc::now() + Duration::hours(1)));
        api
    }

    pub fn set_token(&self, token: &str) {
        *self.token.lock().unwrap() = Some(token.to_string());
    }

    /// Makes the next call fail with `status`.
    pub fn fail_next(&self, status: StatusCode, message: Option<&str>) {
        *self.failure.lock().unwrap() = Some((status, message.map(str::to_string)));
    }

    pub fn fail_submissions(&self, count: usize) {
        self.failing_submissions.store(count, Ordering::SeqCst);
    }

    /// Makes question fetches take `delay` before answering.
    pub fn stall(&self, delay: StdDuration) {
        *self.stall.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn call(&self) -> Result<(), ClientError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.failure.lock().unwrap().take() {
            Some((status, message)) => Err(ClientError::api(status, message)),
            None => Ok(()),
        }
    }

    fn id(&self, prefix: &str) -> String {
        format!("{}{}", prefix, self.next_id.fetch_add(1, Ordering::SeqCst))
    }

    fn token(&self) -> Result<TokenResponse, ClientError> {
        self.call()?;
        let token = self.token.lock().unwrap().clone();
        token
            .map(|token| TokenResponse { token })
            .ok_or_else(|| ClientError::api(StatusCode::BAD_REQUEST, None))
    }

    fn not_found() -> ClientError {
        ClientError::api(StatusCode::NOT_FOUND, Some("Not found".to_string()))
    }
}

impl AuthApi for FakeApi {
    async fn login(&self, _credentials: &Credentials) -> Result<TokenResponse, ClientError> {
        self.token()
    }

    async fn register(&self, _profile: &Profile) -> Result<TokenResponse, ClientError> {
        self.token()
    }
}

impl CbtApi for FakeApi {
    async fn questions(&self) -> Result<Vec<Question>, ClientError> {
        self.call()?;
        let stall = *self.stall.lock().unwrap();
        if let Some(delay) = stall {
            tokio::time::sleep(delay).await;
        }
        Ok(self.questions.lock().unwrap().clone())
    }

    async fn create_question(&self, question: &NewQuestion) -> Result<Question, ClientError> {
        self.call()?;
        let created = Question {
            id: self.id("q"),
            question_text: question.question_text.clone(),
            question_type: question.question_type,
            options: question.options.clone(),
            answer: Some(question.answer.clone()),
        };
        self.questions.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_question(&self, id: &str) -> Result<(), ClientError> {
        self.call()?;
        self.questions.lock().unwrap().retain(|it| it.id != id);
        Ok(())
    }

    async fn upload_questions(
        &self,
        _upload: QuestionUpload,
    ) -> Result<MessageResponse, ClientError> {
        self.call()?;
        Ok(MessageResponse {
            msg: Some("Questions uploaded successfully".to_string()),
        })
    }

    async fn quizzes(&self) -> Result<Vec<Quiz>, ClientError> {
        self.call()?;
        Ok(self.quizzes.lock().unwrap().clone())
    }

    async fn quiz(&self, id: &str) -> Result<Quiz, ClientError> {
        self.call()?;
        self.quizzes
            .lock()
            .unwrap()
            .iter()
            .find(|it| it.id == id)
            .cloned()
            .ok_or_else(FakeApi::not_found)
    }

    async fn create_quiz(&self, quiz: &NewQuiz) -> Result<Quiz, ClientError> {
        self.call()?;
        let created = Quiz {
            id: self.id("z"),
            title: quiz.title.clone(),
            description: quiz.description.clone(),
            questions: quiz
                .questions
                .iter()
                .cloned()
                .map(QuestionRef::Id)
                .collect(),
            time_limit: quiz.time_limit,
            created_at: Some(Utc::now()),
        };
        self.quizzes.lock().unwrap().push(created.clone());
        Ok(created)
    }

    async fn delete_quiz(&self, id: &str) -> Result<(), ClientError> {
        self.call()?;
        self.quizzes.lock().unwrap().retain(|it| it.id != id);
        Ok(())
    }

    async fn student_assignments(&self) -> Result<Vec<Assignment>, ClientError> {
        self.call()?;
        Ok(self.assignments.lock().unwrap().clone())
    }

    async fn assign_quiz(
        &self,
        _quiz_id: &str,
        request: &AssignRequest,
    ) -> Result<MessageResponse, ClientError> {
        self.call()?;
        Ok(MessageResponse {
            msg: Some(format!(
                "Quiz assigned to {} students",
                request.student_ids.len()
            )),
        })
    }

    async fn start_session(&self, _quiz_id: &str) -> Result<SessionStart, ClientError> {
        self.call()?;
        self.session
            .lock()
            .unwrap()
            .clone()
            .ok_or_else(FakeApi::not_found)
    }

    async fn submit_session(
        &self,
        quiz_id: &str,
        submission: &Submission,
    ) -> Result<SubmissionResult, ClientError> {
        self.call()?;
        let failing = self.failing_submissions.load(Ordering::SeqCst);
        if failing > 0 {
            self.failing_submissions.store(failing - 1, Ordering::SeqCst);
            return Err(ClientError::api(StatusCode::INTERNAL_SERVER_ERROR, None));
        }

        self.submissions
            .lock()
            .unwrap()
            .push((quiz_id.to_string(), submission.clone()));
        Ok(SubmissionResult {
            score: 100.0,
            msg: None,
        })
    }

    async fn question_performance(
        &self,
        _quiz_id: &str,
    ) -> Result<Vec<QuestionPerformance>, ClientError> {
        self.call()?;
        Ok(self.performance.lock().unwrap().clone())
    }
}
