//! `solus`: refactor a text file through deliberate/execute rounds.
//!
//! Besides running sessions, the CLI exposes the buffer and the command parser
//! directly (`view`, `parse`, `apply`) so replies can be checked offline.

use std::fs;
use std::io::Read;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use clap::{Parser, Subcommand};
use tracing::debug;

use solus::agents::session::{RefactorSession, RoundResult};
use solus::core::buffer::LineBuffer;
use solus::core::parser::{ParseError, parse_command};
use solus::exit_codes;
use solus::io::backend::CommandBackend;
use solus::io::config::{DEFAULT_CONFIG_FILE, SolusConfig, load_config, write_config};
use solus::logging;
use solus::report::SessionSummary;

#[derive(Parser)]
#[command(
    name = "solus",
    version,
    about = "Deliberator/executor refactoring agent for line-addressed text"
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run a refactoring session on a file and print the summary.
    Refactor {
        /// Source file to refactor. It is read, never written.
        file: PathBuf,
        /// Number of deliberate/execute rounds (overrides config).
        #[arg(short, long)]
        iterations: Option<u32>,
        /// Config file (defaults to ./solus.toml when present).
        #[arg(short, long)]
        config: Option<PathBuf>,
        /// Model name substituted into the backend command (overrides config).
        #[arg(short, long)]
        model: Option<String>,
        /// Print a JSON report instead of the text summary.
        #[arg(long)]
        json: bool,
    },
    /// Print a file as a numbered resource view.
    View { file: PathBuf },
    /// Parse an executor reply from stdin and print the command as JSON.
    Parse,
    /// Apply an executor reply from stdin to a file and print the new view.
    Apply { file: PathBuf },
    /// Write a default `solus.toml`.
    Init {
        /// Overwrite an existing file.
        #[arg(short, long)]
        force: bool,
        /// Destination path.
        #[arg(long, default_value = DEFAULT_CONFIG_FILE)]
        path: PathBuf,
    },
}

fn main() {
    logging::init();
    match run() {
        Ok(code) => std::process::exit(code),
        Err(err) => {
            eprintln!("{:#}", err);
            std::process::exit(exit_codes::INVALID);
        }
    }
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Refactor {
            file,
            iterations,
            config,
            model,
            json,
        } => cmd_refactor(&file, iterations, config.as_deref(), model, json),
        Command::View { file } => cmd_view(&file),
        Command::Parse => cmd_parse(),
        Command::Apply { file } => cmd_apply(&file),
        Command::Init { force, path } => cmd_init(&path, force),
    }
}

fn cmd_refactor(
    file: &Path,
    iterations: Option<u32>,
    config: Option<&Path>,
    model: Option<String>,
    json: bool,
) -> Result<i32> {
    let mut cfg = load_config(config.unwrap_or(Path::new(DEFAULT_CONFIG_FILE)))?;
    if let Some(iterations) = iterations {
        cfg.iterations = iterations;
    }
    if let Some(model) = model {
        cfg.backend.model = model;
    }
    cfg.validate()?;
    debug!(iterations = cfg.iterations, model = %cfg.backend.model, "config resolved");

    let source = read_source(file)?;
    let backend = CommandBackend::from_config(&cfg.backend)?;
    let mut session = RefactorSession::new(&source, backend, cfg.policy.to_policy())?;

    let initial = session.buffer().view();
    let report = session.run_with(cfg.iterations, |outcome| match &outcome.result {
        RoundResult::Applied { command } => {
            eprintln!("round {}: applied {}", outcome.round, command.kind());
        }
        RoundResult::Skipped { message, .. } => {
            eprintln!("round {}: skipped ({message})", outcome.round);
        }
    })?;
    let refactored = session.buffer().view();

    let summary = SessionSummary {
        initial: &initial,
        refactored: &refactored,
        report: &report,
        transcript: session.transcript().entries(),
    };
    if json {
        println!("{}", summary.render_json().context("serialize report")?);
    } else {
        print!("{}", summary.render_text());
    }
    Ok(exit_codes::OK)
}

fn cmd_view(file: &Path) -> Result<i32> {
    let buffer = LineBuffer::from_text(&read_source(file)?);
    print!("{}", buffer.view());
    Ok(exit_codes::OK)
}

fn cmd_parse() -> Result<i32> {
    let reply = read_stdin()?;
    match parse_command(&reply) {
        Ok(command) => {
            let json = serde_json::to_string_pretty(&command).context("serialize command")?;
            println!("{json}");
            Ok(exit_codes::OK)
        }
        Err(err) => Ok(report_parse_error(&err)),
    }
}

fn cmd_apply(file: &Path) -> Result<i32> {
    let mut buffer = LineBuffer::from_text(&read_source(file)?);
    let reply = read_stdin()?;
    let command = match parse_command(&reply) {
        Ok(command) => command,
        Err(err) => return Ok(report_parse_error(&err)),
    };
    if let Err(err) = buffer.apply(&command) {
        eprintln!("{err}");
        return Ok(exit_codes::OUT_OF_RANGE);
    }
    print!("{}", buffer.view());
    Ok(exit_codes::OK)
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }
    write_config(path, &SolusConfig::default())?;
    Ok(exit_codes::OK)
}

fn report_parse_error(err: &ParseError) -> i32 {
    eprintln!("{err}");
    match err {
        ParseError::NoCommandMatched => exit_codes::NO_COMMAND,
        ParseError::MalformedCommand { .. } => exit_codes::INVALID,
    }
}

/// Read a source file, dropping one trailing newline so it does not become an empty last line.
fn read_source(path: &Path) -> Result<String> {
    let contents = fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
    Ok(contents
        .strip_suffix('\n')
        .map(|s| s.strip_suffix('\r').unwrap_or(s))
        .unwrap_or(&contents)
        .to_string())
}

fn read_stdin() -> Result<String> {
    let mut buf = String::new();
    std::io::stdin()
        .read_to_string(&mut buf)
        .context("read stdin")?;
    Ok(buf)
}
