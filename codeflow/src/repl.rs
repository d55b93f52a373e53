//! Line-oriented interactive session for `codeflow session`.
//!
//! Stage commands return immediately; responses are reconciled as they
//! arrive, so several stages can be in flight while the user keeps typing.

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::str::FromStr;

use anyhow::{Context, Result};
use futures::future::{FutureExt, LocalBoxFuture};
use futures::stream::{FuturesUnordered, StreamExt};
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tracing::{debug, info};

use crate::core::error::StageError;
use crate::core::types::{Stage, StageResult};
use crate::io::service::ReviewService;
use crate::io::view::ViewSink;
use crate::session::{Session, Ticket};

/// Ends paste mode when entered on its own line.
pub const PASTE_TERMINATOR: &str = ".";

pub const HELP: &str = "\
commands:
  load <path>    replace the snippet with the contents of a file
  paste          enter code line by line; finish with a lone '.'
  lang <tag>     set the language tag
  analyze        find bugs in the snippet
  fix            fix the bugs found by analyze
  test           generate tests for the snippet
  verify         verify the fixed code
  use-fixed      copy the fixed code into the snippet
  show           print the full report
  clear          reset the session
  help           print this help
  quit           exit (Ctrl-D waits for outstanding requests)
";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Load(PathBuf),
    Paste,
    Lang(String),
    Run(Stage),
    UseFixed,
    Show,
    Clear,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let line = line.trim();
        let (word, arg) = match line.split_once(char::is_whitespace) {
            Some((word, arg)) => (word, arg.trim()),
            None => (line, ""),
        };
        let command = match word.to_ascii_lowercase().as_str() {
            "load" if arg.is_empty() => return Err("usage: load <path>".to_string()),
            "load" => Command::Load(PathBuf::from(arg)),
            "lang" | "language" if arg.is_empty() => {
                return Err("usage: lang <tag>".to_string());
            }
            "lang" | "language" => Command::Lang(arg.to_string()),
            "paste" => Command::Paste,
            "use-fixed" | "use" => Command::UseFixed,
            "show" => Command::Show,
            "clear" | "reset" => Command::Clear,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => match Stage::from_str(other) {
                Ok(stage) => Command::Run(stage),
                Err(_) => return Err(format!("unknown command '{other}'")),
            },
        };
        Ok(command)
    }
}

type Response = (Ticket, Result<StageResult, StageError>);

enum Flow {
    Continue,
    Quit,
}

/// Read commands from `input` until `quit` or end of input.
///
/// At end of input, an unfinished paste is kept as the snippet and requests
/// still in flight are awaited and reconciled before returning. `quit` returns at once and drops them.
pub async fn run_session<R, V, S, W>(
    input: R,
    session: &mut Session<V>,
    service: &S,
    out: &mut W,
) -> Result<()>
where
    R: AsyncBufRead + Unpin,
    V: ViewSink,
    S: ReviewService + ?Sized,
    W: Write,
{
    let mut lines = input.lines();
    let mut in_flight: FuturesUnordered<LocalBoxFuture<'_, Response>> = FuturesUnordered::new();
    let mut paste: Option<Vec<String>> = None;
    let mut input_open = true;

    loop {
        tokio::select! {
            biased;
            Some((ticket, outcome)) = in_flight.next(), if !in_flight.is_empty() => {
                session.finish(ticket, outcome);
            }
            line = lines.next_line(), if input_open => {
                let Some(line) = line.context("read command")? else {
                    debug!(pending = in_flight.len(), "input closed");
                    input_open = false;
                    if let Some(buffer) = paste.take() {
                        session.set_code(buffer.join("\n"));
                    }
                    continue;
                };
                if let Some(buffer) = paste.as_mut() {
                    if line.trim() == PASTE_TERMINATOR {
                        session.set_code(buffer.join("\n"));
                        paste = None;
                    } else {
                        buffer.push(line);
                    }
                    continue;
                }
                if line.trim().is_empty() {
                    continue;
                }
                let command = match line.parse::<Command>() {
                    Ok(command) => command,
                    Err(err) => {
                        writeln!(out, "{err}; type 'help' for commands").context("write output")?;
                        continue;
                    }
                };
                if command == Command::Paste {
                    paste = Some(Vec::new());
                    continue;
                }
                match dispatch(command, session, service, &mut in_flight, out)? {
                    Flow::Continue => {}
                    Flow::Quit => {
                        info!(dropped = in_flight.len(), "session quit");
                        return Ok(());
                    }
                }
            }
            else => break,
        }
    }
    Ok(())
}

fn dispatch<'a, V, S, W>(
    command: Command,
    session: &mut Session<V>,
    service: &'a S,
    in_flight: &mut FuturesUnordered<LocalBoxFuture<'a, Response>>,
    out: &mut W,
) -> Result<Flow>
where
    V: ViewSink,
    S: ReviewService + ?Sized,
    W: Write,
{
    match command {
        Command::Load(path) => match fs::read_to_string(&path) {
            Ok(code) => session.set_code(code),
            Err(err) => {
                writeln!(out, "cannot read {}: {err}", path.display()).context("write output")?;
            }
        },
        Command::Lang(language) => session.set_language(language),
        Command::Run(stage) => {
            // A rejection has already been reported through the view.
            if let Ok(pending) = session.begin(stage) {
                in_flight.push(pending.send(service).boxed_local());
            }
        }
        Command::UseFixed => {
            session.use_fixed_code();
        }
        Command::Show => session.show(),
        Command::Clear => session.clear(),
        Command::Help => out.write_all(HELP.as_bytes()).context("write output")?,
        Command::Quit => return Ok(Flow::Quit),
        Command::Paste => {}
    }
    Ok(Flow::Continue)
}
