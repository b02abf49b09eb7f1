//! Interactive chat loop.

use std::io::Write;
use std::path::PathBuf;

use anyhow::Result;
use futures::StreamExt;
use ragdesk_agent::AgentEvent;
use rustyline::DefaultEditor;
use rustyline::error::ReadlineError;
use tracing::warn;

use crate::app::{RagApp, Reply};

const HELP: &str = "\
Commands:
  /ingest <file.pdf> ...   process PDF files (replaces the current index)
  /status                  show the index status
  /clear                   delete the index
  /reset                   forget the conversation
  /help                    show this help
  /quit                    exit
Anything else is asked as a question about your documents.";

/// One line of console input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Ask(String),
    Ingest(Vec<PathBuf>),
    Clear,
    Reset,
    Status,
    Help,
    Quit,
    Empty,
    Unknown(String),
}

impl Command {
    pub fn parse(line: &str) -> Self {
        let line = line.trim();
        if line.is_empty() {
            return Command::Empty;
        }
        if matches!(line, "quit" | "exit") {
            return Command::Quit;
        }
        let Some(rest) = line.strip_prefix('/') else {
            return Command::Ask(line.to_string());
        };

        let mut parts = rest.split_whitespace();
        match parts.next().unwrap_or_default() {
            "ingest" | "upload" => Command::Ingest(parts.map(PathBuf::from).collect()),
            "clear" => Command::Clear,
            "reset" => Command::Reset,
            "status" => Command::Status,
            "help" | "?" => Command::Help,
            "quit" | "exit" => Command::Quit,
            other => Command::Unknown(other.to_string()),
        }
    }
}

/// Run the read-eval-print loop until the user quits.
pub async fn run_console(app: &RagApp) -> Result<()> {
    let mut rl = DefaultEditor::new()?;

    println!("ragdesk: chat with your PDFs. Type /help for commands.");
    println!("{}", app.status().await);

    loop {
        let line = match rl.readline("\n> ") {
            Ok(line) => line,
            Err(ReadlineError::Interrupted) | Err(ReadlineError::Eof) => break,
            Err(e) => return Err(e.into()),
        };
        if !line.trim().is_empty() {
            let _ = rl.add_history_entry(line.as_str());
        }

        match Command::parse(&line) {
            Command::Empty => {}
            Command::Quit => break,
            Command::Help => println!("{HELP}"),
            Command::Unknown(name) => println!("Unknown command '/{name}'. Type /help for commands."),
            Command::Ingest(paths) => println!("{}", app.ingest_paths(&paths).await),
            Command::Clear => println!("{}", app.clear().await),
            Command::Reset => println!("{}", app.reset_conversation().await),
            Command::Status => println!("{}", app.status().await),
            Command::Ask(question) => stream_answer(app, &question).await?,
        }
    }

    Ok(())
}

/// Print answer text as it arrives; tool activity goes to stderr.
async fn stream_answer(app: &RagApp, question: &str) -> Result<()> {
    let mut stream = match app.ask_stream(question).await {
        Ok(stream) => stream,
        Err(reply) => {
            println!("{reply}");
            return Ok(());
        }
    };

    let mut stdout = std::io::stdout();
    while let Some(event) = stream.next().await {
        match event {
            Ok(AgentEvent::TextDelta(text)) => {
                print!("{text}");
                stdout.flush()?;
            }
            Ok(AgentEvent::ToolCall(call)) => {
                eprintln!("[looking up: {}]", call.arguments["query"].as_str().unwrap_or(&call.name));
            }
            Ok(AgentEvent::ToolResult(result)) if result.is_error => {
                eprintln!("[{} failed: {}]", result.name, result.content);
            }
            Ok(AgentEvent::ToolResult(_)) => {}
            Ok(AgentEvent::Done(answer)) => {
                println!();
                if !answer.sources.is_empty() {
                    println!("\nSources: {}", answer.sources.join(", "));
                }
            }
            Err(e) => {
                warn!(error = %e, "streamed answer failed");
                println!("\n{}", Reply::Error(format!("The assistant could not answer. {e}")));
                break;
            }
        }
    }
    Ok(())
}
