//! Code review pipeline client.
//!
//! Drives a remote review service through Analyze, Fix, Generate Tests and
//! Verify, either interactively (`session`) or in one shot (`review`).

use std::fs;
use std::io::{Write, stdout};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::BufReader;

use codeflow::core::error::StageError;
use codeflow::exit_codes;
use codeflow::io::config::{CodeflowConfig, DEFAULT_CONFIG_PATH, load_config, write_config};
use codeflow::io::service::HttpReviewService;
use codeflow::io::view::TerminalView;
use codeflow::logging;
use codeflow::pipeline::{ReviewOptions, ReviewStop, run_review};
use codeflow::repl::run_session;
use codeflow::session::Session;

#[derive(Parser)]
#[command(
    name = "codeflow",
    version,
    about = "Analyze, fix, test and verify code with a review service"
)]
struct Cli {
    /// Config file to read.
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    /// Override `service.base_url` from the config.
    #[arg(long, global = true)]
    service_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Write a default config file if missing.
    Init {
        /// Overwrite an existing config.
        #[arg(short, long)]
        force: bool,
    },
    /// Start an interactive review session.
    Session {
        /// Load this file as the initial snippet.
        #[arg(short, long)]
        file: Option<PathBuf>,
        /// Language tag (defaults to `default_language` from the config).
        #[arg(short, long)]
        language: Option<String>,
    },
    /// Run every stage against a file and print the report.
    Review {
        path: PathBuf,
        #[arg(short, long)]
        language: Option<String>,
        /// Go straight from Fix to Verify.
        #[arg(long)]
        skip_tests: bool,
    },
}

fn main() {
    logging::init();
    let code = match run() {
        Ok(code) => code,
        Err(err) => {
            eprintln!("{:#}", err);
            exit_codes::INVALID
        }
    };
    std::process::exit(code);
}

fn run() -> Result<i32> {
    let cli = Cli::parse();
    match cli.command {
        Command::Init { force } => cmd_init(&cli.config, force),
        Command::Session { file, language } => {
            let config = resolve_config(&cli.config, cli.service_url)?;
            block_on(cmd_session(config, file, language))
        }
        Command::Review {
            path,
            language,
            skip_tests,
        } => {
            let config = resolve_config(&cli.config, cli.service_url)?;
            block_on(cmd_review(config, &path, language, ReviewOptions { skip_tests }))
        }
    }
}

fn cmd_init(path: &Path, force: bool) -> Result<i32> {
    if path.exists() && !force {
        println!("{} already exists", path.display());
        return Ok(exit_codes::OK);
    }
    write_config(path, &CodeflowConfig::default())
        .with_context(|| format!("write {}", path.display()))?;
    println!("wrote {}", path.display());
    Ok(exit_codes::OK)
}

async fn cmd_session(
    config: CodeflowConfig,
    file: Option<PathBuf>,
    language: Option<String>,
) -> Result<i32> {
    let service = HttpReviewService::new(&config.service)?;
    let language = language.unwrap_or(config.default_language);
    let view = TerminalView::new(stdout(), true);
    let mut session = Session::new(language, config.stale_responses, view);
    if let Some(path) = file {
        session.set_code(read_snippet(&path)?);
    }

    println!(
        "codeflow session against {} (type 'help' for commands)",
        config.service.base_url
    );
    session.show();
    let mut out = stdout();
    let input = BufReader::new(tokio::io::stdin());
    run_session(input, &mut session, &service, &mut out).await?;
    out.flush().context("flush stdout")?;
    Ok(exit_codes::OK)
}

async fn cmd_review(
    config: CodeflowConfig,
    path: &Path,
    language: Option<String>,
    options: ReviewOptions,
) -> Result<i32> {
    let code = read_snippet(path)?;
    let service = HttpReviewService::new(&config.service)?;
    let language = language.unwrap_or(config.default_language);
    let view = TerminalView::new(stdout(), false);
    let mut session = Session::new(language, config.stale_responses, view);
    session.set_code(code);

    let outcome = run_review(&mut session, &service, options).await;
    session.show();

    let code = match outcome.stop {
        ReviewStop::Clean | ReviewStop::Verified => exit_codes::OK,
        ReviewStop::IssuesRemain => exit_codes::ISSUES_REMAIN,
        ReviewStop::Failed { stage, error } => {
            eprintln!("review stopped at {stage}: {error}");
            match error {
                StageError::Gate(_) => exit_codes::INVALID,
                StageError::Transport(_) | StageError::Domain(_) => exit_codes::STAGE_FAILED,
            }
        }
    };
    Ok(code)
}

fn resolve_config(path: &Path, service_url: Option<String>) -> Result<CodeflowConfig> {
    let mut config = load_config(path)?;
    if let Some(url) = service_url {
        config.service.base_url = url;
        config.validate().context("invalid --service-url")?;
    }
    Ok(config)
}

fn read_snippet(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("read {}", path.display()))
}

fn block_on<F: Future<Output = Result<i32>>>(future: F) -> Result<i32> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("start async runtime")?;
    runtime.block_on(future)
}
