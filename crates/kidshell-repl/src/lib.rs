//! kidshell REPL — a line editor around the kidshell engine.
//!
//! The REPL owns everything the engine does not:
//! - Restoring the saved session and injecting custom data at startup
//! - Cleaning up raw lines (prompt markers, stray arrow escapes)
//! - Exit words and meta-commands: `/help`, `/progress`, `/reset`
//! - Draining the pending response and saving after every turn
//! - Command history via rustyline

pub mod format;

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use rustyline::error::ReadlineError;
use rustyline::history::DefaultHistory;
use rustyline::Editor;

use kidshell_kernel::data::load_custom_data;
use kidshell_kernel::input::{normalize_user_input, resolve_arrow_escape, LineAction};
use kidshell_kernel::store::{load_session_from, save_session_to};
use kidshell_kernel::types::{Content, QuizContent, Response};
use kidshell_kernel::{paths, KidShellEngine, KidshellConfig, Session};

use format::{format_response, OutputContext};

/// Result from handling one line.
#[derive(Debug, PartialEq)]
pub enum MetaResult {
    /// Continue with optional output
    Continue(Option<String>),
    /// Save and leave
    Exit,
}

pub struct Repl {
    engine: KidShellEngine,
    config: KidshellConfig,
    /// Where the session is saved after each turn; `None` keeps it in memory.
    session_path: Option<PathBuf>,
    context: OutputContext,
    last_input: String,
}

impl Repl {
    /// Build a REPL from the user's config, resuming the saved session unless `start_new`.
    pub fn new(config: KidshellConfig, start_new: bool) -> Result<Self> {
        let data_dir = paths::data_dir();
        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory {}", data_dir.display()))?;
        let session_path = paths::session_state_path();

        let mut session = Session::new();
        if config.restore_session && !start_new {
            match load_session_from(&session_path) {
                Ok(Some(saved)) => session = saved,
                Ok(None) => {}
                Err(e) => tracing::warn!("Starting fresh, saved session unusable: {}", e),
            }
        }
        session.custom_data = load_custom_data(&config.data_dirs());

        let engine = KidShellEngine::from_config(&config, session);
        Ok(Self {
            engine,
            config,
            session_path: Some(session_path),
            context: format::detect_context(),
            last_input: String::new(),
        })
    }

    /// A REPL around an existing engine that never touches disk.
    pub fn in_memory(engine: KidShellEngine, config: KidshellConfig) -> Self {
        Self {
            engine,
            config,
            session_path: None,
            context: OutputContext::Plain,
            last_input: String::new(),
        }
    }

    pub fn engine(&self) -> &KidShellEngine {
        &self.engine
    }

    /// What to show before the first prompt: the active quiz, or a new one.
    pub fn opening(&mut self) -> String {
        let responses = match self.engine.session().current_quiz.clone() {
            Some(quiz) => vec![Response::new(Content::Quiz(QuizContent::Prompt(quiz)))],
            None => self.engine.process_turn(""),
        };
        self.save();
        self.render(&responses)
    }

    /// Process a single raw line from the terminal.
    pub fn process_line(&mut self, raw: &str) -> MetaResult {
        let line = match resolve_arrow_escape(raw, &self.last_input) {
            LineAction::Use(line) => line.to_string(),
            LineAction::Skip => return MetaResult::Continue(None),
        };

        let normalized = normalize_user_input(&line);
        if !normalized.is_empty() {
            self.last_input = line;
        }

        if self.config.is_exit_word(&normalized) {
            self.save();
            return MetaResult::Exit;
        }

        if is_meta_command(&normalized) {
            return self.handle_meta_command(&normalized);
        }

        let responses = self.engine.process_turn(&normalized);
        self.save();
        MetaResult::Continue(Some(self.render(&responses)))
    }

    fn handle_meta_command(&mut self, cmd: &str) -> MetaResult {
        let command = cmd.split_whitespace().next().unwrap_or("");

        match command {
            "/quit" | "/q" => {
                self.save();
                MetaResult::Exit
            }
            "/help" | "/h" | "/?" => MetaResult::Continue(Some(HELP_TEXT.to_string())),
            "/progress" => {
                let session = self.engine.session();
                let badges: Vec<&str> = session.achievements.iter().map(String::as_str).collect();
                MetaResult::Continue(Some(format!(
                    "Solved: {}\nStreak: {}\nBadges: {}",
                    session.problems_solved,
                    session.current_streak,
                    if badges.is_empty() { "(none yet)".to_string() } else { badges.join(", ") }
                )))
            }
            "/reset" => {
                let custom_data = std::mem::take(&mut self.engine.session_mut().custom_data);
                let mut fresh = Session::new();
                fresh.custom_data = custom_data;
                *self.engine.session_mut() = fresh;
                self.save();
                MetaResult::Continue(Some("Fresh start! Press Enter for a new question.".to_string()))
            }
            _ => MetaResult::Continue(Some(format!(
                "Unknown command: {}\nType /help for available commands.",
                command
            ))),
        }
    }

    fn render(&self, responses: &[Response]) -> String {
        responses
            .iter()
            .map(|response| format_response(response, self.context))
            .collect::<Vec<_>>()
            .join("\n")
    }

    fn save(&self) {
        if let Some(path) = &self.session_path {
            if let Err(e) = save_session_to(path, self.engine.session()) {
                tracing::warn!("Failed to save session: {}", e);
            }
        }
    }
}

const META_COMMANDS: &[&str] = &["/quit", "/q", "/help", "/h", "/?", "/progress", "/reset"];

/// A line is a meta-command only if its first word is a known command, or a
/// slash followed by letters; `/ 2` stays math.
fn is_meta_command(line: &str) -> bool {
    let Some(command) = line.split_whitespace().next() else {
        return false;
    };
    META_COMMANDS.contains(&command)
        || command
            .strip_prefix('/')
            .is_some_and(|rest| !rest.is_empty() && rest.chars().all(|c| c.is_ascii_alphabetic()))
}

const HELP_TEXT: &str = r#"kidshell — type something and press Enter!

  Enter (empty)     Get a math question
  7                 Answer the question, or explore a number
  2 + 3, 8 x 6      Do some math
  x, x = 4, x + 1   Make a symbol and use it
  red, tree, cat    Colours and emoji
  1...10            Count (1...10...2 counts by twos)

Commands:
  /progress         Problems solved, streak and badges
  /reset            Start over with a fresh session
  /help             Show this help
  bye, quit         Save and leave
"#;

/// Save REPL history to disk.
fn save_history(rl: &mut Editor<(), DefaultHistory>, history_path: &Path) {
    if let Some(parent) = history_path.parent() {
        if let Err(e) = std::fs::create_dir_all(parent) {
            tracing::warn!("Failed to create history directory: {}", e);
        }
    }
    if let Err(e) = rl.save_history(history_path) {
        tracing::warn!("Failed to save history: {}", e);
    }
}

/// Run the REPL.
pub fn run(config: KidshellConfig, start_new: bool) -> Result<()> {
    println!("kidshell v{}", env!("CARGO_PKG_VERSION"));
    println!("Type /help for ideas, bye to leave.");

    let mut rl: Editor<(), DefaultHistory> = Editor::new().context("Failed to create editor")?;

    let history_path = paths::history_path();
    if let Err(e) = rl.load_history(&history_path) {
        let is_not_found =
            matches!(&e, ReadlineError::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound);
        if !is_not_found {
            tracing::warn!("Failed to load history: {}", e);
        }
    }

    let mut repl = Repl::new(config, start_new)?;
    println!();
    println!("{}", repl.opening());

    loop {
        match rl.readline("> ") {
            Ok(line) => {
                if !line.trim().is_empty() {
                    if let Err(e) = rl.add_history_entry(line.as_str()) {
                        tracing::warn!("Failed to add history entry: {}", e);
                    }
                }

                match repl.process_line(&line) {
                    MetaResult::Continue(Some(output)) => println!("{}", output),
                    MetaResult::Continue(None) => {}
                    MetaResult::Exit => {
                        println!("👋 Bye!");
                        break;
                    }
                }
            }
            Err(ReadlineError::Interrupted | ReadlineError::Eof) => {
                repl.save();
                println!("👋 Bye!");
                break;
            }
            Err(err) => {
                repl.save();
                eprintln!("Error: {}", err);
                break;
            }
        }
    }

    save_history(&mut rl, &history_path);

    Ok(())
}
