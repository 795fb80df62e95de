//! Day bucketing for the month calendar.
//!
//! A task lands on exactly one day: the UTC calendar day of its due date.

use chrono::{Datelike, NaiveDate};
use serde::Serialize;
use std::collections::BTreeMap;

use crate::task::{Task, TaskPriority};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DayBucket {
    pub date: NaiveDate,
    pub count: usize,
    pub has_high: bool,
    pub has_medium: bool,
    pub has_low: bool,
    pub task_ids: Vec<String>,
}

impl DayBucket {
    fn empty(date: NaiveDate) -> Self {
        Self {
            date,
            count: 0,
            has_high: false,
            has_medium: false,
            has_low: false,
            task_ids: Vec::new(),
        }
    }

    fn push(&mut self, task: &Task) {
        self.count += 1;
        match task.priority {
            TaskPriority::High => self.has_high = true,
            TaskPriority::Medium => self.has_medium = true,
            TaskPriority::Low => self.has_low = true,
        }
        self.task_ids.push(task.id.clone());
    }

    /// Priority indicators present on this day, highest first.
    pub fn priorities(&self) -> Vec<TaskPriority> {
        TaskPriority::DESCENDING
            .into_iter()
            .filter(|p| match p {
                TaskPriority::High => self.has_high,
                TaskPriority::Medium => self.has_medium,
                TaskPriority::Low => self.has_low,
            })
            .collect()
    }
}

/// Groups tasks by due day. Only days with at least one task appear.
pub fn bucket_by_day(tasks: &[Task]) -> BTreeMap<NaiveDate, DayBucket> {
    let mut out: BTreeMap<NaiveDate, DayBucket> = BTreeMap::new();
    for task in tasks {
        let day = task.due_day();
        out.entry(day)
            .or_insert_with(|| DayBucket::empty(day))
            .push(task);
    }
    out
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Blank cells before day 1 in a Sunday-first week grid.
    pub leading_blanks: u32,
    pub days: Vec<DayBucket>,
}

impl CalendarMonth {
    /// One bucket per day of the month, empty days included.
    /// Returns `None` for an invalid year/month.
    pub fn build(tasks: &[Task], year: i32, month: u32) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let by_day = bucket_by_day(tasks);

        let days = first
            .iter_days()
            .take_while(|d| d.month() == month)
            .map(|d| by_day.get(&d).cloned().unwrap_or_else(|| DayBucket::empty(d)))
            .collect();

        Some(Self {
            year,
            month,
            leading_blanks: first.weekday().num_days_from_sunday(),
            days,
        })
    }

    pub fn of(tasks: &[Task], day: NaiveDate) -> Self {
        // `day` is a valid date, so its month is too.
        Self::build(tasks, day.year(), day.month()).unwrap_or(Self {
            year: day.year(),
            month: day.month(),
            leading_blanks: 0,
            days: Vec::new(),
        })
    }

    pub fn day(&self, date: NaiveDate) -> Option<&DayBucket> {
        self.days.iter().find(|b| b.date == date)
    }

    pub fn busy_days(&self) -> impl Iterator<Item = &DayBucket> {
        self.days.iter().filter(|b| b.count > 0)
    }
}

/// The host page's day selection over the list view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateFilter(Option<NaiveDate>);

impl DateFilter {
    pub fn day(self) -> Option<NaiveDate> {
        self.0
    }

    /// Selecting the already-selected day clears the filter. With no filter
    /// set, the comparison is against `today`, so picking today leaves the
    /// list unfiltered.
    pub fn select(self, date: NaiveDate, today: NaiveDate) -> Self {
        let reference = self.0.unwrap_or(today);
        if reference == date {
            Self(None)
        } else {
            Self(Some(date))
        }
    }

    pub fn clear(self) -> Self {
        Self(None)
    }
}
