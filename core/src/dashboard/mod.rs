//! Pure derivations over a task sequence, recomputed on every change.

pub mod calendar;
pub mod charts;
pub mod form;
pub mod list;
pub mod summary;

pub use calendar::{bucket_by_day, CalendarMonth, DateFilter, DayBucket};
pub use charts::{ChartBucket, ChartData};
pub use form::{FormSubmission, TaskForm};
pub use list::{filter_by_day, sort_by_due_date};
pub use summary::Summary;
