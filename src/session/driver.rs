use std::future::pending;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::mpsc;
use tokio::time::{interval_at, Instant, Interval};

use super::{QuizSession, Tick};
use crate::data::attempt::{Submission, SubmissionResult};
use crate::api::CbtApi;
use crate::store::quiz::QuizStore;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Next,
    Previous,
    GoTo(usize),
    Answer { question_id: String, answer: String },
    AnswerCurrent(String),
    Submit,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Completed(SubmissionResult),
    /// The session couldn't be started.
    Failed(String),
    /// Command sender went away before submission.
    Abandoned,
}

/// Whatever presents the session to the student.
#[allow(async_fn_in_trait)]
pub trait SessionView {
    fn render(&mut self, session: &QuizSession);

    fn countdown(&mut self, _remaining_secs: u32) {}

    fn notify(&mut self, message: &str);

    /// Asked before a manual submit while questions are unanswered.
    async fn confirm_submit(&mut self, unanswered: usize) -> bool;
}

async fn next_tick(ticker: &mut Option<Interval>) {
    match ticker {
        Some(ticker) => {
            ticker.tick().await;
        }
        None => pending().await,
    }
}

/// Waits for the student's confirmation while the clock keeps running.
/// `None` means time ran out first.
async fn confirm_or_expire<V: SessionView>(
    view: &mut V,
    session: &mut QuizSession,
    ticker: &mut Option<Interval>,
    unanswered: usize,
) -> Option<bool> {
    let confirm = view.confirm_submit(unanswered);
    tokio::pin!(confirm);

    loop {
        tokio::select! {
            confirmed = &mut confirm => return Some(confirmed),
            _ = next_tick(ticker) => {
                if session.tick() == Tick::Expired {
                    return None;
                }
            }
        }
    }
}

fn expire<V: SessionView>(
    session: &mut QuizSession,
    ticker: &mut Option<Interval>,
    view: &mut V,
) -> Option<Submission> {
    tracing::info!("Time limit reached; submitting.");
    *ticker = None;
    view.notify("Time is up! Submitting your answers.");
    session.begin_submit()
}

fn apply(session: &mut QuizSession, command: Command) {
    match command {
        Command::Next => {
            session.next();
        }
        Command::Previous => {
            session.previous();
        }
        Command::GoTo(index) => {
            session.go_to(index);
        }
        Command::Answer {
            question_id,
            answer,
        } => {
            session.record_answer(&question_id, answer);
        }
        Command::AnswerCurrent(answer) => {
            session.answer_current(answer);
        }
        Command::Submit => {}
    }
}

/// Runs a quiz session until it's submitted, fails to start, or the student
/// leaves (`commands` closes).
///
/// Timed quizzes count down once per second and submit automatically when
/// time runs out, with whatever answers were recorded by then.
#[tracing::instrument(skip(store, commands, view))]
pub async fn take_quiz<A: CbtApi, V: SessionView>(
    store: &QuizStore<A>,
    quiz_id: &str,
    mut commands: mpsc::Receiver<Command>,
    view: &mut V,
) -> Outcome {
    let mut session = QuizSession::loading(quiz_id);

    match store.start_quiz_session(quiz_id).await {
        Ok(start) => session.start(start, Utc::now()),
        Err(e) => {
            tracing::info!("Quiz session rejected: {}", e);
            session.fail(&e.message);
            view.notify(&e.message);
            return Outcome::Failed(e.message);
        }
    }
    view.render(&session);

    let second = Duration::from_secs(1);
    let mut ticker = session
        .remaining_secs()
        .map(|_| interval_at(Instant::now() + second, second));

    loop {
        let submission = tokio::select! {
            _ = next_tick(&mut ticker) => match session.tick() {
                Tick::Expired => expire(&mut session, &mut ticker, view),
                Tick::Running(left) => {
                    view.countdown(left);
                    None
                }
                Tick::Inert => None,
            },
            command = commands.recv() => match command {
                None => {
                    tracing::info!("Quiz session abandoned.");
                    return Outcome::Abandoned;
                }
                Some(Command::Submit) => match session.needs_confirmation() {
                    None => session.begin_submit(),
                    Some(unanswered) => {
                        match confirm_or_expire(view, &mut session, &mut ticker, unanswered).await
                        {
                            Some(true) => session.begin_submit(),
                            Some(false) => None,
                            None => expire(&mut session, &mut ticker, view),
                        }
                    }
                },
                Some(command) => {
                    apply(&mut session, command);
                    view.render(&session);
                    None
                }
            },
        };

        let submission = match submission {
            Some(submission) => submission,
            None => continue,
        };

        match store.submit_quiz(session.quiz_id(), &submission).await {
            Ok(result) => {
                session.complete(result.clone());
                view.notify(&format!(
                    "Quiz submitted successfully! Your score: {}%",
                    result.score
                ));
                return Outcome::Completed(result);
            }
            Err(e) => {
                tracing::warn!("Submitting quiz failed: {}", e);
                session.submission_failed();
                view.notify(&e.message);
                view.render(&session);
            }
        }
    }
}
