use chrono::NaiveDate;

use crate::task::Task;

/// Tasks due on `day`, or all of them when no day is selected.
pub fn filter_by_day(tasks: &[Task], day: Option<NaiveDate>) -> Vec<&Task> {
    match day {
        Some(day) => tasks.iter().filter(|t| t.due_day() == day).collect(),
        None => tasks.iter().collect(),
    }
}

/// Earliest due date first; ties keep their current (creation) order.
pub fn sort_by_due_date(tasks: &mut [Task]) {
    tasks.sort_by_key(|t| t.due_date);
}
