//! Plain-text rendering of the dashboard views.

use chrono::NaiveDate;
use serde::Serialize;
use std::fmt::Write as _;
use taskboard_core::api::{
    CalendarMonth, ChartData, CliError, ItemSync, Notification, Summary, Task, TaskPriority,
    TaskStatus,
};

const BAR_WIDTH: usize = 30;

pub fn json<T: Serialize + ?Sized>(value: &T) -> Result<String, CliError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| CliError::Command(format!("failed to encode output: {e}")))
}

fn priority_marker(priority: TaskPriority) -> char {
    match priority {
        TaskPriority::High => 'H',
        TaskPriority::Medium => 'M',
        TaskPriority::Low => 'L',
    }
}

pub fn task_line(task: &Task, sync: &ItemSync) -> String {
    let check = match task.status {
        TaskStatus::Completed => "[x]",
        TaskStatus::Pending => "[ ]",
    };
    let mut line = format!(
        "{} {}  {:<6} {}  {}",
        check,
        task.due_day(),
        task.priority.as_str(),
        task.title,
        task.id
    );
    match sync {
        ItemSync::Settled => {}
        ItemSync::Pending => line.push_str("  (saving)"),
        ItemSync::Failed(msg) => {
            let _ = write!(line, "  (failed: {msg})");
        }
    }
    if !task.description.is_empty() {
        let _ = write!(line, "\n      {}", task.description);
    }
    line
}

pub fn task_list(tasks: &[(&Task, ItemSync)], day: Option<NaiveDate>) -> String {
    if tasks.is_empty() {
        return match day {
            Some(d) => format!("No tasks due on {d}."),
            None => "No tasks yet.".to_string(),
        };
    }
    let mut out = String::new();
    if let Some(d) = day {
        let _ = writeln!(out, "Tasks due {d}:");
    }
    for (task, sync) in tasks {
        let _ = writeln!(out, "{}", task_line(task, sync));
    }
    out.trim_end().to_string()
}

pub fn summary(summary: &Summary) -> String {
    format!(
        "Total: {}   Pending: {}   Completed: {}",
        summary.total, summary.pending, summary.completed
    )
}

/// Sunday-first month grid. Days with tasks show their count and the
/// priority markers present; the selected day is bracketed.
pub fn calendar(month: &CalendarMonth, selected: Option<NaiveDate>) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{:04}-{:02}", month.year, month.month);
    let _ = writeln!(
        out,
        "{}",
        ["Sun", "Mon", "Tue", "Wed", "Thu", "Fri", "Sat"]
            .map(|d| format!("{d:<9}"))
            .concat()
            .trim_end()
    );

    let mut cells: Vec<String> = vec![String::new(); month.leading_blanks as usize];
    for bucket in &month.days {
        let day = bucket.date.format("%d").to_string();
        let marks: String = bucket.priorities().into_iter().map(priority_marker).collect();
        let cell = if bucket.count > 0 {
            format!("{day}:{}{marks}", bucket.count)
        } else {
            day
        };
        cells.push(if selected == Some(bucket.date) {
            format!("[{cell}]")
        } else {
            cell
        });
    }

    for week in cells.chunks(7) {
        let row: String = week.iter().map(|c| format!("{c:<9}")).collect();
        let _ = writeln!(out, "{}", row.trim_end());
    }
    out.trim_end().to_string()
}

fn bar(value: usize, max: usize) -> String {
    let width = if max == 0 { 0 } else { value * BAR_WIDTH / max };
    "#".repeat(width)
}

pub fn charts(data: &ChartData) -> String {
    let mut out = String::from("Tasks by Priority\n");
    if data.by_priority.is_empty() {
        out.push_str("  (no tasks)\n");
    }
    for (label, pct) in data.priority_shares() {
        let _ = writeln!(out, "  {label:<16} {pct:>3}%");
    }

    out.push_str("Tasks by Status\n");
    let max = data.by_status.iter().map(|b| b.value).max().unwrap_or(0);
    for bucket in &data.by_status {
        let _ = writeln!(
            out,
            "  {:<16} {:>3} {}",
            bucket.label,
            bucket.value,
            bar(bucket.value, max)
        );
    }
    out.trim_end().to_string()
}

pub fn toast(notification: &Notification) -> String {
    let tag = if notification.is_error() { "error" } else { "info" };
    if notification.description.is_empty() {
        format!("[{tag}] {}", notification.title)
    } else {
        format!("[{tag}] {}: {}", notification.title, notification.description)
    }
}
