//! Line-oriented interactive session over one signed-in board.
use chrono::Utc;
use clap::Parser;
use std::io::Write;
use taskboard_core::api::{CliError, CollectionError};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::board::{Board, Toasts};
use crate::commands::board::{self as handlers, ViewState};
use crate::commands::cli::{OutputFormat, ShellCommand, ShellLine};
use crate::render;

const PROMPT: &str = "taskboard> ";

/// Splits a typed line into words; double quotes group words with spaces.
pub fn split_words(line: &str) -> Result<Vec<String>, String> {
    let mut words = Vec::new();
    let mut current = String::new();
    let mut in_quotes = false;
    let mut has_word = false;

    for ch in line.chars() {
        match ch {
            '"' => {
                in_quotes = !in_quotes;
                has_word = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if has_word {
                    words.push(std::mem::take(&mut current));
                    has_word = false;
                }
            }
            c => {
                current.push(c);
                has_word = true;
            }
        }
    }
    if in_quotes {
        return Err("unterminated quote".to_string());
    }
    if has_word {
        words.push(current);
    }
    Ok(words)
}

fn prompt() {
    print!("{PROMPT}");
    let _ = std::io::stdout().flush();
}

pub async fn run(
    board: &Board,
    view: &mut ViewState,
    format: OutputFormat,
    toasts: &mut Toasts,
) -> Result<(), CliError> {
    println!(
        "Signed in as {}. Type `help` for commands, `quit` to leave.",
        board.user().email
    );
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt();
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = tokio::signal::ctrl_c() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        let words = match split_words(&line) {
            Ok(words) if words.is_empty() => continue,
            Ok(words) => words,
            Err(msg) => {
                eprintln!("{msg}");
                continue;
            }
        };
        let parsed = match ShellLine::try_parse_from(words) {
            Ok(parsed) => parsed,
            Err(err) => {
                let _ = err.print();
                continue;
            }
        };

        let result = match parsed.command {
            ShellCommand::Quit => break,
            ShellCommand::Select { date } => {
                view.filter = view.filter.select(date, Utc::now().date_naive());
                match view.filter.day() {
                    Some(day) => println!("Showing tasks due {day}"),
                    None => println!("Showing all tasks"),
                }
                Ok(())
            }
            ShellCommand::Clear => {
                view.filter = view.filter.clear();
                println!("Showing all tasks");
                Ok(())
            }
            ShellCommand::Refresh => match board.collection().refresh().await {
                Ok(count) => {
                    println!("Loaded {count} tasks");
                    Ok(())
                }
                Err(err) => Err(err.into()),
            },
            ShellCommand::Board(cmd) => handlers::handle(cmd, board, view, format).await,
        };

        toasts.drain();
        match result {
            Ok(()) => {}
            // Already surfaced as an error notification.
            Err(CliError::Collection(CollectionError::Remote(_))) => {}
            Err(err) => eprintln!("{err}"),
        }
    }

    tracing::debug!(target: "taskboard.cli", stage = "shell.exit");
    let summary = taskboard_core::api::Summary::from_tasks(&board.collection().tasks().await);
    println!("{}", render::summary(&summary));
    Ok(())
}
