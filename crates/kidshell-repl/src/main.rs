//! kidshell CLI entry point.
//!
//! Usage:
//!   kidshell                   # Interactive REPL, resuming the saved session
//!   kidshell --new             # Interactive REPL with a fresh session
//!   kidshell -c <line>         # Answer one line and exit (no saving)

use std::env;
use std::process::ExitCode;

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use kidshell_kernel::{KidShellEngine, KidshellConfig, Session};
use kidshell_repl::{MetaResult, Repl};

fn main() -> ExitCode {
    // Initialize tracing (respects RUST_LOG env var)
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    match run() {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {e:?}");
            ExitCode::FAILURE
        }
    }
}

fn run() -> Result<ExitCode> {
    let args: Vec<String> = env::args().collect();

    match args.get(1).map(|s| s.as_str()) {
        None => {
            kidshell_repl::run(load_config()?, false)?;
            Ok(ExitCode::SUCCESS)
        }

        Some("--new") => {
            kidshell_repl::run(load_config()?, true)?;
            Ok(ExitCode::SUCCESS)
        }

        Some("--help" | "-h") => {
            print_help();
            Ok(ExitCode::SUCCESS)
        }

        Some("--version" | "-V") => {
            println!("kidshell {}", env!("CARGO_PKG_VERSION"));
            Ok(ExitCode::SUCCESS)
        }

        Some("-c") => {
            let line = args.get(2).context("-c requires a line to answer")?;
            run_line(line)
        }

        Some(unknown) => {
            eprintln!("Unknown option: {unknown}");
            eprintln!("Run 'kidshell --help' for usage.");
            Ok(ExitCode::FAILURE)
        }
    }
}

fn load_config() -> Result<KidshellConfig> {
    KidshellConfig::load().context("Failed to load kidshell config")
}

/// Answer one line with a throwaway session.
fn run_line(line: &str) -> Result<ExitCode> {
    let config = load_config()?;
    let engine = KidShellEngine::from_config(&config, Session::new());
    let mut repl = Repl::in_memory(engine, config);

    if let MetaResult::Continue(Some(output)) = repl.process_line(line) {
        println!("{output}");
    }
    Ok(ExitCode::SUCCESS)
}

fn print_help() {
    println!(r#"kidshell v{}

Usage:
  kidshell                     Interactive REPL (resumes your last session)
  kidshell --new               Start with a fresh session
  kidshell -c <line>           Answer one line and exit

Options:
  -h, --help                   Show this help
  -V, --version                Show version

Environment:
  KIDSHELL_HOME                Keep config, data and session in one directory
  RUST_LOG                     Log filter, e.g. RUST_LOG=kidshell_kernel=debug

Examples:
  kidshell                     # Start playing
  kidshell -c '8 x 6'          # Quick calculation
"#, env!("CARGO_PKG_VERSION"));
}
