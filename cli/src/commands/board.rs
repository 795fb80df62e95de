//! Handlers for the collection subcommands, shared by one-shot mode and the shell.
use chrono::{Datelike, NaiveDate, Utc};
use serde_json::json;
use taskboard_core::api::{
    filter_by_day, normalize_due_date, sort_by_due_date, CalendarMonth, ChartData, CliError,
    DateFilter, ItemSync, Summary, Task, TaskForm, TaskOrder, TaskPatch,
};

use crate::board::Board;
use crate::commands::cli::{AddArgs, BoardCommand, CalendarArgs, EditArgs, ListArgs, OutputFormat};
use crate::render;

/// View settings that outlive a single command in the shell.
#[derive(Debug, Clone, Copy, Default)]
pub struct ViewState {
    pub filter: DateFilter,
    pub order: TaskOrder,
}

pub async fn handle(
    cmd: BoardCommand,
    board: &Board,
    view: &ViewState,
    format: OutputFormat,
) -> Result<(), CliError> {
    match cmd {
        BoardCommand::List(args) => handle_list(args, board, view, format).await,
        BoardCommand::Add(args) => handle_add(args, board, format).await,
        BoardCommand::Edit(args) => handle_edit(args, board, format).await,
        BoardCommand::Toggle(args) => {
            let status = board.collection().toggle(&args.id).await?;
            emit(format, &json!({ "id": args.id, "status": status }), || {
                format!("{} is now {}", args.id, status)
            })
        }
        BoardCommand::Delete(args) => {
            board.collection().delete(&args.id).await?;
            emit(format, &json!({ "id": args.id, "deleted": true }), || {
                format!("Deleted {}", args.id)
            })
        }
        BoardCommand::Summary => {
            let summary = Summary::from_tasks(&board.collection().tasks().await);
            emit(format, &summary, || render::summary(&summary))
        }
        BoardCommand::Calendar(args) => handle_calendar(args, board, view, format).await,
        BoardCommand::Charts => {
            let data = ChartData::from_tasks(&board.collection().tasks().await);
            emit(format, &data, || render::charts(&data))
        }
        BoardCommand::Dashboard => handle_dashboard(board, view, format).await,
    }
}

fn emit<T, F>(format: OutputFormat, value: &T, text: F) -> Result<(), CliError>
where
    T: serde::Serialize + ?Sized,
    F: FnOnce() -> String,
{
    match format {
        OutputFormat::Json => println!("{}", render::json(value)?),
        OutputFormat::Text => println!("{}", text()),
    }
    Ok(())
}

fn today() -> NaiveDate {
    Utc::now().date_naive()
}

/// Collection order is newest first; due-date order is applied here.
fn ordered(mut tasks: Vec<Task>, order: TaskOrder) -> Vec<Task> {
    if order == TaskOrder::DueDateAsc {
        sort_by_due_date(&mut tasks);
    }
    tasks
}

async fn handle_list(
    args: ListArgs,
    board: &Board,
    view: &ViewState,
    format: OutputFormat,
) -> Result<(), CliError> {
    let day = args.date.or(view.filter.day());
    let tasks = ordered(board.collection().tasks().await, args.order.unwrap_or(view.order));
    let visible = filter_by_day(&tasks, day);

    if format == OutputFormat::Json {
        println!("{}", render::json(&visible)?);
        return Ok(());
    }

    let mut rows = Vec::with_capacity(visible.len());
    for task in visible {
        rows.push((task, board.collection().sync_of(&task.id).await));
    }
    println!("{}", render::task_list(&rows, day));
    Ok(())
}

async fn handle_add(args: AddArgs, board: &Board, format: OutputFormat) -> Result<(), CliError> {
    let mut form = TaskForm::blank(board.user().id.clone(), today());
    form.data.title = args.title;
    form.data.description = args.description;
    form.data.priority = args.priority;
    if let Some(due) = args.due {
        form.data.due_date = due;
    }

    let submission = form
        .submit()
        .map_err(|e| CliError::Command(format!("invalid task: {e}")))?;
    let created = submission.dispatch(board.collection()).await?;
    match created {
        Some(task) => emit(format, &task, || {
            format!("Created {}\n{}", task.id, render::task_line(&task, &ItemSync::Settled))
        }),
        None => Ok(()),
    }
}

async fn handle_edit(args: EditArgs, board: &Board, format: OutputFormat) -> Result<(), CliError> {
    let due_date = args
        .due
        .as_deref()
        .map(normalize_due_date)
        .transpose()
        .map_err(|e| CliError::Command(format!("invalid task: {e}")))?;
    let patch = TaskPatch {
        title: args.title,
        description: args.description,
        status: None,
        due_date,
        priority: args.priority,
    };
    if patch.is_empty() {
        return Err(CliError::Command(
            "nothing to change: pass at least one of --title, --description, --due, --priority (use toggle for status)"
                .to_string(),
        ));
    }

    board.collection().update(&args.id, patch).await?;
    match board.collection().get(&args.id).await {
        Some(task) => emit(format, &task, || {
            render::task_line(&task, &ItemSync::Settled)
        }),
        None => emit(format, &json!({ "id": args.id, "updated": true }), || {
            format!("Updated {}", args.id)
        }),
    }
}

fn parse_month(month: &str) -> Result<NaiveDate, CliError> {
    NaiveDate::parse_from_str(&format!("{}-01", month.trim()), "%Y-%m-%d")
        .map_err(|_| CliError::Command(format!("invalid month {month:?} (expected YYYY-MM)")))
}

async fn handle_calendar(
    args: CalendarArgs,
    board: &Board,
    view: &ViewState,
    format: OutputFormat,
) -> Result<(), CliError> {
    let anchor = match args.month.as_deref() {
        Some(m) => parse_month(m)?,
        None => view.filter.day().unwrap_or_else(today),
    };
    let month = CalendarMonth::of(&board.collection().tasks().await, anchor);
    emit(format, &month, || render::calendar(&month, view.filter.day()))
}

async fn handle_dashboard(
    board: &Board,
    view: &ViewState,
    format: OutputFormat,
) -> Result<(), CliError> {
    let snapshot = board.collection().snapshot().await;
    let tasks = &snapshot.tasks;
    let day = view.filter.day();
    let summary = Summary::from_tasks(tasks);
    let charts = ChartData::from_tasks(tasks);
    let anchor = day.unwrap_or_else(today);
    let month = CalendarMonth::of(tasks, anchor);

    let mut listed = tasks.clone();
    sort_by_due_date(&mut listed);
    let visible = filter_by_day(&listed, day);

    if format == OutputFormat::Json {
        let out = json!({
            "user": board.user(),
            "phase": snapshot.phase,
            "summary": summary,
            "charts": charts,
            "calendar": month,
            "date_filter": day,
            "tasks": visible,
            "sync": snapshot.sync,
        });
        println!("{}", render::json(&out)?);
        return Ok(());
    }

    let rows: Vec<_> = visible
        .into_iter()
        .map(|task| {
            let sync = snapshot.sync_of(&task.id);
            (task, sync)
        })
        .collect();
    println!("Signed in as {}", board.user().email);
    println!("{}\n", render::summary(&summary));
    println!("{}\n", render::charts(&charts));
    println!("{}\n", render::calendar(&month, day));
    println!("{}", render::task_list(&rows, day));
    tracing::debug!(
        target: "taskboard.cli",
        month = month.month,
        year = anchor.year(),
        tasks = tasks.len(),
        "dashboard rendered"
    );
    Ok(())
}
