use chrono::NaiveDate;
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;
use taskboard_core::api::{TaskOrder, TaskPriority};

#[derive(clap::ValueEnum, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "taskboard", version, about = "Personal task dashboard in the terminal")]
pub struct Args {
    #[command(subcommand)]
    pub command: Commands,

    /// Config file; defaults to ~/.taskboard/config.toml, then ./config.toml.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Account to sign in with. The password is read from TASKBOARD_PASSWORD.
    #[arg(long, global = true)]
    pub email: Option<String>,

    #[arg(long, value_enum, default_value_t = OutputFormat::Text, global = true)]
    pub format: OutputFormat,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    #[command(flatten)]
    Board(BoardCommand),
    /// Interactive session over one signed-in collection.
    Shell,
}

/// Everything that works on the signed-in user's collection.
#[derive(Subcommand, Debug, Clone)]
pub enum BoardCommand {
    /// List tasks, optionally only those due on one day.
    List(ListArgs),
    /// Create a task.
    Add(AddArgs),
    /// Change fields of an existing task.
    Edit(EditArgs),
    /// Flip a task between pending and completed.
    Toggle(IdArgs),
    Delete(IdArgs),
    /// Total, pending and completed counts.
    Summary,
    /// Month grid with per-day task counts and priority markers.
    Calendar(CalendarArgs),
    /// Priority distribution and status counts.
    Charts,
    /// Summary, charts, calendar and list together.
    Dashboard,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct ListArgs {
    /// Only tasks due on this day (YYYY-MM-DD).
    #[arg(long)]
    pub date: Option<NaiveDate>,

    /// created (newest first) or due (earliest first).
    #[arg(long)]
    pub order: Option<TaskOrder>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct AddArgs {
    #[arg(long)]
    pub title: String,

    #[arg(long, default_value = "")]
    pub description: String,

    /// Due date (YYYY-MM-DD or RFC 3339). Defaults to today.
    #[arg(long)]
    pub due: Option<String>,

    #[arg(long, default_value_t = TaskPriority::Medium)]
    pub priority: TaskPriority,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct EditArgs {
    pub id: String,

    #[arg(long)]
    pub title: Option<String>,

    #[arg(long)]
    pub description: Option<String>,

    #[arg(long)]
    pub due: Option<String>,

    #[arg(long)]
    pub priority: Option<TaskPriority>,
}

#[derive(ClapArgs, Debug, Clone)]
pub struct IdArgs {
    pub id: String,
}

#[derive(ClapArgs, Debug, Clone, Default)]
pub struct CalendarArgs {
    /// Month to show (YYYY-MM). Defaults to the current month.
    #[arg(long)]
    pub month: Option<String>,
}

/// One line typed at the `shell` prompt.
#[derive(Parser, Debug)]
#[command(no_binary_name = true, disable_version_flag = true)]
pub struct ShellLine {
    #[command(subcommand)]
    pub command: ShellCommand,
}

#[derive(Subcommand, Debug)]
pub enum ShellCommand {
    #[command(flatten)]
    Board(BoardCommand),
    /// Pick a calendar day; picking the selected day again clears it.
    Select { date: NaiveDate },
    /// Drop the day filter.
    Clear,
    /// Refetch from the backend.
    Refresh,
    #[command(alias = "exit")]
    Quit,
}
