use std::io::BufRead;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, bail, Context};
use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use tokio::sync::mpsc;
use tracing::Level;

use cbt_client::api::scope::Scope;
use cbt_client::data::assignment::AssignRequest;
use cbt_client::data::question::{
    NewQuestion, Question, QuestionType, QuestionUpload, UploadFileType,
};
use cbt_client::data::quiz::NewQuiz;
use cbt_client::data::user::{Credentials, Profile};
use cbt_client::role::Role;
use cbt_client::route::{self, Route};
use cbt_client::session::driver::{take_quiz, Command as SessionCommand, Outcome, SessionView};
use cbt_client::session::QuizSession;
use cbt_client::view::analytics::{AnalyticsSummary, Difficulty};
use cbt_client::view::assignments::{describe, AssignmentBoard};
use cbt_client::view::dashboard::{StudentDashboard, TeacherDashboard};
use cbt_client::view::{format_time, resolve_answer};
use cbt_client::Client;

#[derive(Parser)]
#[clap(name = "cbt", about = "Computer-based testing client")]
struct Cli {
    /// Overrides the configured API root.
    #[clap(long, value_name = "URL")]
    api_root: Option<String>,
    /// Don't log to stderr.
    #[clap(short, long)]
    quiet: bool,
    #[clap(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    Login {
        #[clap(short, long)]
        email: String,
        #[clap(short, long, env = "CBT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    Register {
        #[clap(short, long)]
        name: String,
        #[clap(short, long)]
        email: String,
        #[clap(short, long, env = "CBT_PASSWORD", hide_env_values = true)]
        password: String,
        #[clap(short, long, default_value = "student")]
        role: Role,
    },
    Logout,
    Whoami,
    Dashboard,
    Questions,
    CreateQuestion {
        #[clap(short, long)]
        text: String,
        #[clap(short = 'k', long = "type", default_value = "multiple-choice")]
        question_type: QuestionType,
        /// Repeat for each choice of a multiple choice question.
        #[clap(short, long = "option")]
        options: Vec<String>,
        #[clap(short, long)]
        answer: String,
    },
    DeleteQuestion {
        id: String,
    },
    UploadQuestions {
        #[clap(value_name = "PATH")]
        path: PathBuf,
        /// Guessed from the file extension when omitted.
        #[clap(long, value_enum)]
        file_type: Option<FileType>,
    },
    Quizzes,
    Quiz {
        id: String,
    },
    CreateQuiz {
        #[clap(short, long)]
        title: String,
        #[clap(short, long, default_value = "")]
        description: String,
        /// Question id; repeat to add more.
        #[clap(short, long = "question")]
        questions: Vec<String>,
        /// Minutes, 0 for no limit.
        #[clap(short = 'l', long, default_value = "0")]
        time_limit: u32,
        /// Start from the questions and settings of an existing quiz.
        #[clap(long, value_name = "QUIZ_ID")]
        from: Option<String>,
    },
    DeleteQuiz {
        id: String,
    },
    Assign {
        quiz_id: String,
        /// Comma separated student ids.
        #[clap(short, long)]
        students: String,
        /// RFC 3339 timestamp, or a date meaning the end of that day (UTC).
        #[clap(short, long)]
        due: String,
    },
    Assignments,
    Analytics {
        quiz_id: String,
    },
    Take {
        quiz_id: String,
    },
}

#[derive(Clone, Copy, clap::ValueEnum)]
enum FileType {
    Json,
    Csv,
}

impl From<FileType> for UploadFileType {
    fn from(it: FileType) -> Self {
        match it {
            FileType::Json => UploadFileType::Json,
            FileType::Csv => UploadFileType::Csv,
        }
    }
}

impl Command {
    fn route(&self) -> Route {
        match self {
            Command::Login { .. } | Command::Logout | Command::Whoami => Route::Login,
            Command::Register { .. } => Route::Register,
            Command::Dashboard => Route::Dashboard,
            Command::Questions
            | Command::CreateQuestion { .. }
            | Command::DeleteQuestion { .. }
            | Command::UploadQuestions { .. } => Route::Questions,
            Command::Quizzes | Command::DeleteQuiz { .. } | Command::Assign { .. } => {
                Route::Quizzes
            }
            Command::Quiz { id } => Route::EditQuiz(id.clone()),
            Command::CreateQuiz { .. } => Route::CreateQuiz,
            Command::Assignments => Route::Assignments,
            Command::Analytics { quiz_id } => Route::Analytics(quiz_id.clone()),
            Command::Take { quiz_id } => Route::TakeQuiz(quiz_id.clone()),
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    #[cfg(debug_assertions)]
    let level = Some(Level::DEBUG);
    #[cfg(not(debug_assertions))]
    let level = Some(Level::INFO);

    let mut client = cbt_client::create(level.filter(|_| !cli.quiet)).await?;
    if let Some(api_root) = cli.api_root {
        let mut config = client.config.clone();
        config.api_root = api_root;
        client = Client::new(config)?;
    }

    let scope = Arc::new(Scope::new());
    let interrupt = scope.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            interrupt.close();
        }
    });

    match scope.run(run(&client, cli.command)).await {
        Ok(result) => result,
        Err(_) => bail!("Interrupted."),
    }
}

async fn run(client: &Client, command: Command) -> anyhow::Result<()> {
    let user = client.auth.user();

    // Session management commands work either way.
    match &command {
        Command::Login { email, password } => {
            let credentials = Credentials {
                email: email.clone(),
                password: password.clone(),
            };
            let user = client.auth.login(&client.api, &credentials).await?;
            println!("Logged in as {} ({}).", user.name, user.role);
            return Ok(());
        }
        Command::Logout => {
            client.auth.logout();
            println!("Logged out.");
            return Ok(());
        }
        Command::Whoami => {
            match &user {
                Some(user) => {
                    println!("{} ({}), id {}", user.name, user.role, user.id);
                    let nav: Vec<&str> = route::nav(user.role).iter().map(Route::title).collect();
                    println!("Available: {}", nav.join(", "));
                }
                None => println!("Not logged in."),
            }
            return Ok(());
        }
        _ => {}
    }

    let requested = command.route();
    let landed = route::resolve(requested.clone(), user.as_ref());
    if landed != requested {
        match landed {
            Route::Login => bail!("Not logged in; run `cbt login` first."),
            _ => bail!("Already logged in; run `cbt logout` first."),
        }
    }

    let quizzes = &client.quizzes;
    match command {
        Command::Register {
            name,
            email,
            password,
            role,
        } => {
            let profile = Profile {
                name,
                email,
                password,
                role,
            };
            let user = client.auth.register(&client.api, &profile).await?;
            println!("Registered and logged in as {} ({}).", user.name, user.role);
        }
        Command::Dashboard => {
            let user = user.ok_or_else(|| anyhow!("Not logged in."))?;
            println!("Welcome back, {}!", user.name);
            if user.role.can_author() {
                quizzes.fetch_quizzes().await?;
                let state = quizzes.state();
                let dashboard = TeacherDashboard::new(&state.quizzes);
                println!("Total quizzes: {}", dashboard.total_quizzes);
                println!("Total questions: {}", dashboard.total_questions);
                println!("Recent quizzes:");
                if dashboard.recent_quizzes.is_empty() {
                    println!("  No quizzes created yet.");
                }
                for quiz in dashboard.recent_quizzes {
                    println!(
                        "  {} ({}): {} questions, {}",
                        quiz.title,
                        quiz.id,
                        quiz.questions.len(),
                        time_limit(quiz.time_limit)
                    );
                }
            } else {
                quizzes.fetch_assignments().await?;
                let state = quizzes.state();
                let dashboard = StudentDashboard::new(&state.assignments);
                println!(
                    "Pending: {}  Completed: {}  Overdue: {}",
                    dashboard.pending, dashboard.completed, dashboard.overdue
                );
                println!("Recent assignments:");
                if dashboard.recent_assignments.is_empty() {
                    println!("  No assignments yet.");
                }
                let now = Utc::now();
                for assignment in dashboard.recent_assignments {
                    println!("  {}", describe(assignment, now));
                }
            }
        }
        Command::Questions => {
            quizzes.fetch_questions().await?;
            let state = quizzes.state();
            if state.questions.is_empty() {
                println!("No questions yet.");
            }
            for question in &state.questions {
                print_question(question);
            }
        }
        Command::CreateQuestion {
            text,
            question_type,
            options,
            answer,
        } => {
            let question = quizzes
                .create_question(NewQuestion {
                    question_text: text,
                    question_type,
                    options,
                    answer,
                })
                .await?;
            println!("Created question {}.", question.id);
        }
        Command::DeleteQuestion { id } => {
            quizzes.delete_question(&id).await?;
            println!("Deleted question {}.", id);
        }
        Command::UploadQuestions { path, file_type } => {
            let file_type = match file_type {
                Some(it) => it.into(),
                None => UploadFileType::from_path(&path).ok_or_else(|| {
                    anyhow!("Can't tell the file type of {}; pass --file-type.", path.display())
                })?,
            };
            let contents = tokio::fs::read(&path)
                .await
                .with_context(|| format!("Unable to read {}", path.display()))?;
            let file_name = path
                .file_name()
                .map(|it| it.to_string_lossy().to_string())
                .unwrap_or_else(|| format!("questions.{}", file_type.as_str()));

            let message = quizzes
                .upload_questions_and_refresh(QuestionUpload {
                    file_name,
                    file_type,
                    contents,
                })
                .await?;
            println!("{}", message);
            println!("{} questions in the bank.", quizzes.state().questions.len());
        }
        Command::Quizzes => {
            quizzes.fetch_quizzes().await?;
            let state = quizzes.state();
            if state.quizzes.is_empty() {
                println!("No quizzes yet.");
            }
            for quiz in &state.quizzes {
                println!(
                    "{}  {} ({} questions, {})",
                    quiz.id,
                    quiz.title,
                    quiz.questions.len(),
                    time_limit(quiz.time_limit)
                );
            }
        }
        Command::Quiz { id } => {
            let quiz = quizzes.fetch_quiz(&id).await?;
            println!("{} ({})", quiz.title, quiz.id);
            if !quiz.description.is_empty() {
                println!("{}", quiz.description);
            }
            println!("{}", time_limit(quiz.time_limit));
            println!("Questions: {}", quiz.question_ids().join(", "));
        }
        Command::CreateQuiz {
            title,
            description,
            questions,
            time_limit,
            from,
        } => {
            let mut quiz = match from {
                Some(id) => NewQuiz::from(&quizzes.fetch_quiz(&id).await?),
                None => NewQuiz::default(),
            };
            quiz.title = title;
            if !description.is_empty() {
                quiz.description = description;
            }
            if time_limit > 0 {
                quiz.time_limit = time_limit;
            }
            for question in &questions {
                quiz.toggle_question(question);
            }

            let created = quizzes.create_quiz(quiz).await?;
            println!("Created quiz {} ({}).", created.title, created.id);
        }
        Command::DeleteQuiz { id } => {
            quizzes.delete_quiz(&id).await?;
            println!("Deleted quiz {}.", id);
        }
        Command::Assign {
            quiz_id,
            students,
            due,
        } => {
            let request = AssignRequest::parse(&students, parse_due(&due)?)?;
            let message = quizzes.assign_quiz(&quiz_id, &request).await?;
            println!("{}", message);
        }
        Command::Assignments => {
            quizzes.fetch_assignments().await?;
            let state = quizzes.state();
            let board = AssignmentBoard::new(&state.assignments);
            if board.is_empty() {
                println!("No assignments yet.");
            }
            let now = Utc::now();
            for (status, assignments) in board.groups() {
                println!("{} ({})", status, assignments.len());
                for assignment in assignments {
                    let start = if assignment.can_start() {
                        format!("  -> cbt take {}", assignment.quiz.id())
                    } else {
                        String::new()
                    };
                    println!("  {}{}", describe(assignment, now), start);
                }
            }
        }
        Command::Analytics { quiz_id } => {
            let performance = quizzes.question_performance(&quiz_id).await?;
            let summary = AnalyticsSummary::new(&performance);
            println!("Questions: {}", summary.total_questions);
            println!("Average correct rate: {:.1}%", summary.average_correct_rate);
            println!("Total attempts: {}", summary.total_attempts);
            println!("Difficult questions: {}", summary.difficult_questions);
            let bands = summary.bands;
            println!(
                "Excellent (>80%): {}  Good (60-80%): {}  Fair (40-60%): {}  Poor (<40%): {}",
                bands.excellent, bands.good, bands.fair, bands.poor
            );
            if summary.needs_review() {
                println!(
                    "Consider reviewing the quiz content or providing additional instruction."
                );
            }
            for (i, p) in performance.iter().enumerate() {
                println!(
                    "{}. {} [{}] {}/{} correct ({:.1}%)",
                    i + 1,
                    p.question_text,
                    Difficulty::of(p.correct_percentage),
                    p.correct_attempts,
                    p.total_attempts,
                    p.correct_percentage
                );
            }
        }
        Command::Take { quiz_id } => take(client, &quiz_id).await?,
        Command::Login { .. } | Command::Logout | Command::Whoami => {} // handled above
    }

    Ok(())
}

fn time_limit(minutes: u32) -> String {
    match minutes {
        0 => "no time limit".to_string(),
        n => format!("{} min", n),
    }
}

fn print_question(question: &Question) {
    println!("{}  [{}] {}", question.id, question.question_type, question.question_text);
    for (i, option) in question.options.iter().enumerate() {
        println!("    {}. {}", i + 1, option);
    }
    if let Some(answer) = &question.answer {
        println!("    answer: {}", answer);
    }
}

fn parse_due(input: &str) -> anyhow::Result<DateTime<Utc>> {
    if let Ok(due) = DateTime::parse_from_rfc3339(input) {
        return Ok(due.with_timezone(&Utc));
    }
    let date = NaiveDate::parse_from_str(input, "%Y-%m-%d")
        .with_context(|| format!("'{}' isn't a date or RFC 3339 timestamp", input))?;
    date.and_hms_opt(23, 59, 59)
        .map(|it| Utc.from_utc_datetime(&it))
        .ok_or_else(|| anyhow!("'{}' isn't a valid due date", input))
}

/// A line typed during a quiz.
#[derive(Debug, PartialEq)]
enum Input {
    Command(SessionCommand),
    Answer(String),
    Quit,
}

fn parse_input(line: &str) -> Option<Input> {
    let line = line.trim();
    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let input = match word.to_ascii_lowercase().as_str() {
        "" => return None,
        ":n" | ":next" => Input::Command(SessionCommand::Next),
        ":p" | ":prev" => Input::Command(SessionCommand::Previous),
        ":g" | ":go" => {
            let n: usize = rest.parse().ok()?;
            Input::Command(SessionCommand::GoTo(n.checked_sub(1)?))
        }
        ":s" | ":submit" => Input::Command(SessionCommand::Submit),
        ":q" | ":quit" => Input::Quit,
        _ => Input::Answer(line.to_string()),
    };
    Some(input)
}

struct TerminalView {
    current: Arc<Mutex<Option<Question>>>,
    awaiting_confirm: Arc<AtomicBool>,
    confirmations: mpsc::Receiver<String>,
}

impl SessionView for TerminalView {
    fn render(&mut self, session: &QuizSession) {
        // A prompt cut short by the clock is over once the session redraws.
        self.awaiting_confirm.store(false, Ordering::SeqCst);
        let question = session.current_question().cloned();
        if let Ok(mut current) = self.current.lock() {
            *current = question.clone();
        }
        let question = match question {
            Some(it) => it,
            None => return,
        };

        println!();
        println!(
            "{}: question {} of {} ({} answered, {:.0}%)",
            session.title(),
            session.current_index() + 1,
            session.questions().len(),
            session.answered_count(),
            session.progress_percent()
        );
        if let Some(left) = session.remaining_secs() {
            println!("Time left: {}", format_time(left));
        }
        println!("{}", question.question_text);
        match question.question_type {
            QuestionType::MultipleChoice => {
                for (i, option) in question.options.iter().enumerate() {
                    println!("  {}. {}", i + 1, option);
                }
            }
            QuestionType::TrueFalse => println!("  (t)rue / (f)alse"),
            QuestionType::ShortAnswer => println!("  type your answer"),
        }
        if let Some(answer) = session.answer(&question.id) {
            println!("Your answer: {}", answer);
        }
        println!("[:n]ext [:p]rev [:g N] [:s]ubmit [:q]uit");
    }

    fn countdown(&mut self, remaining_secs: u32) {
        if remaining_secs % 60 == 0 || remaining_secs <= 10 {
            println!("Time left: {}", format_time(remaining_secs));
        }
    }

    fn notify(&mut self, message: &str) {
        println!("{}", message);
    }

    async fn confirm_submit(&mut self, unanswered: usize) -> bool {
        self.awaiting_confirm.store(true, Ordering::SeqCst);
        println!(
            "You have {} unanswered question(s). Submit anyway? [y/N]",
            unanswered
        );
        // Lines typed for an earlier prompt that ran out of time.
        while self.confirmations.try_recv().is_ok() {}
        let answer = self.confirmations.recv().await.unwrap_or_default();
        self.awaiting_confirm.store(false, Ordering::SeqCst);
        answer.trim().eq_ignore_ascii_case("y") || answer.trim().eq_ignore_ascii_case("yes")
    }
}

/// Answer for the question the student was shown, keyed by its id so a
/// navigation still in flight can't move it to another question.
fn answer_command(question: Option<&Question>, text: &str) -> Option<SessionCommand> {
    let question = question?;
    let answer = resolve_answer(question, text)?;
    Some(SessionCommand::Answer {
        question_id: question.id.clone(),
        answer,
    })
}

async fn take(client: &Client, quiz_id: &str) -> anyhow::Result<()> {
    let (commands, command_rx) = mpsc::channel(16);
    let (confirm, confirm_rx) = mpsc::channel(1);
    let current = Arc::new(Mutex::new(None::<Question>));
    let awaiting_confirm = Arc::new(AtomicBool::new(false));

    let mut view = TerminalView {
        current: current.clone(),
        awaiting_confirm: awaiting_confirm.clone(),
        confirmations: confirm_rx,
    };

    // A plain thread, so a pending read never holds up runtime shutdown.
    std::thread::spawn(move || {
        for line in std::io::stdin().lock().lines() {
            let line = match line {
                Ok(line) => line,
                Err(_) => break,
            };
            if awaiting_confirm.load(Ordering::SeqCst) {
                if confirm.blocking_send(line).is_err() {
                    break;
                }
                continue;
            }

            let command = match parse_input(&line) {
                None => continue,
                Some(Input::Quit) => break,
                Some(Input::Command(command)) => command,
                Some(Input::Answer(text)) => {
                    let question = current.lock().ok().and_then(|it| it.clone());
                    match answer_command(question.as_ref(), &text) {
                        Some(command) => command,
                        None => {
                            println!("'{}' isn't a valid answer here.", text);
                            continue;
                        }
                    }
                }
            };
            if commands.blocking_send(command).is_err() {
                break;
            }
        }
    });

    let outcome = take_quiz(&client.quizzes, quiz_id, command_rx, &mut view).await;

    match outcome {
        Outcome::Completed(_) => Ok(()),
        Outcome::Failed(message) => Err(anyhow!(message)),
        Outcome::Abandoned => {
            println!("Left the quiz without submitting.");
            Ok(())
        }
    }
}
