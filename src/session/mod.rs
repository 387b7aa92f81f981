//! Quiz taking: `Loading → Active → Submitting → {Completed | Error}`.
//!
//! [`QuizSession`] holds the attempt and its pure transitions; [`driver`]
//! runs it against the API with a countdown.

use std::collections::HashMap;

use chrono::{DateTime, Utc};

use crate::data::attempt::{SessionStart, Submission, SubmissionResult};
use crate::data::question::Question;

pub mod driver;

#[derive(Debug, Clone, PartialEq)]
pub enum Phase {
    Loading,
    Active,
    Submitting,
    Completed(SubmissionResult),
    Error(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    /// Untimed session, countdown already over, or not active.
    Inert,
    Running(u32),
    Expired,
}

/// In-progress attempt. Lives only in memory; a restart loses it.
#[derive(Debug, Clone)]
pub struct QuizSession {
    quiz_id: String,
    title: String,
    questions: Vec<Question>,
    current: usize,
    answers: HashMap<String, String>,
    remaining_secs: Option<u32>,
    started_at: DateTime<Utc>,
    phase: Phase,
}

impl QuizSession {
    pub fn loading(quiz_id: impl ToString) -> QuizSession {
        QuizSession {
            quiz_id: quiz_id.to_string(),
            title: String::new(),
            questions: vec![],
            current: 0,
            answers: HashMap::new(),
            remaining_secs: None,
            started_at: Utc::now(),
            phase: Phase::Loading,
        }
    }

    /// `Loading → Active`
    pub fn start(&mut self, start: SessionStart, now: DateTime<Utc>) {
        if self.phase != Phase::Loading {
            return;
        }
        self.remaining_secs = start.time_limit_secs();
        self.title = start.quiz_title;
        self.questions = start.questions;
        self.started_at = now;
        self.phase = Phase::Active;
    }

    /// `Loading → Error`
    pub fn fail(&mut self, message: impl ToString) {
        if self.phase == Phase::Loading {
            self.phase = Phase::Error(message.to_string());
        }
    }

    pub fn quiz_id(&self) -> &str {
        &self.quiz_id
    }

    pub fn title(&self) -> &str {
        &self.title
    }

    pub fn phase(&self) -> &Phase {
        &self.phase
    }

    pub fn is_active(&self) -> bool {
        self.phase == Phase::Active
    }

    pub fn is_finished(&self) -> bool {
        matches!(self.phase, Phase::Completed(_) | Phase::Error(_))
    }

    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.questions.get(self.current)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    pub fn remaining_secs(&self) -> Option<u32> {
        self.remaining_secs
    }

    pub fn next(&mut self) -> bool {
        self.go_to(self.current + 1)
    }

    pub fn previous(&mut self) -> bool {
        match self.current.checked_sub(1) {
            Some(index) => self.go_to(index),
            None => false,
        }
    }

    /// Moves to `index`; out of range indices are ignored.
    pub fn go_to(&mut self, index: usize) -> bool {
        if !self.is_active() || index >= self.questions.len() {
            return false;
        }
        self.current = index;
        true
    }

    /// Records an answer, replacing any earlier answer for the same question.
    pub fn record_answer(&mut self, question_id: &str, answer: impl ToString) -> bool {
        if !self.is_active() || !self.questions.iter().any(|q| q.id == question_id) {
            return false;
        }
        self.answers
            .insert(question_id.to_string(), answer.to_string());
        true
    }

    pub fn answer_current(&mut self, answer: impl ToString) -> bool {
        match self.current_question().map(|q| q.id.clone()) {
            Some(id) => self.record_answer(&id, answer),
            None => false,
        }
    }

    pub fn answer(&self, question_id: &str) -> Option<&str> {
        self.answers.get(question_id).map(String::as_str)
    }

    pub fn answers(&self) -> &HashMap<String, String> {
        &self.answers
    }

    pub fn answered_count(&self) -> usize {
        self.answers.len()
    }

    pub fn unanswered_count(&self) -> usize {
        self.questions.len().saturating_sub(self.answers.len())
    }

    /// Position of the current question as a percentage of the quiz.
    pub fn progress_percent(&self) -> f64 {
        if self.questions.is_empty() {
            return 0.0;
        }
        (self.current + 1) as f64 / self.questions.len() as f64 * 100.0
    }

    /// Advances the countdown by one second.
    pub fn tick(&mut self) -> Tick {
        if !self.is_active() {
            return Tick::Inert;
        }
        match self.remaining_secs {
            Some(left) if left > 0 => {
                let left = left - 1;
                self.remaining_secs = Some(left);
                if left == 0 {
                    Tick::Expired
                } else {
                    Tick::Running(left)
                }
            }
            _ => Tick::Inert,
        }
    }

    /// Number of unanswered questions a manual submit has to be confirmed
    /// for, if any.
    pub fn needs_confirmation(&self) -> Option<usize> {
        match self.unanswered_count() {
            0 => None,
            n => Some(n),
        }
    }

    /// `Active → Submitting`, producing what to send.
    pub fn begin_submit(&mut self) -> Option<Submission> {
        if !self.is_active() {
            return None;
        }
        self.phase = Phase::Submitting;
        Some(Submission {
            answers: self.answers.clone(),
            started_at: self.started_at,
        })
    }

    /// `Submitting → Active`; the submission can be retried.
    pub fn submission_failed(&mut self) {
        if self.phase == Phase::Submitting {
            self.phase = Phase::Active;
        }
    }

    /// `Submitting → Completed`
    pub fn complete(&mut self, result: SubmissionResult) {
        if self.phase == Phase::Submitting {
            self.phase = Phase::Completed(result);
        }
    }
}
