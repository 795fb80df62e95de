use serde::Serialize;

use crate::task::{Task, TaskPriority, TaskStatus};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartBucket {
    pub key: String,
    pub label: String,
    pub value: usize,
}

/// Priority distribution (pie) and status counts (bar).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChartData {
    /// High, Medium, Low; buckets with no tasks are omitted.
    pub by_priority: Vec<ChartBucket>,
    /// Pending then Completed, always both present.
    pub by_status: Vec<ChartBucket>,
}

impl ChartData {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        let by_priority = TaskPriority::DESCENDING
            .into_iter()
            .map(|p| ChartBucket {
                key: p.as_str().to_string(),
                label: format!("{} Priority", p),
                value: tasks.iter().filter(|t| t.priority == p).count(),
            })
            .filter(|b| b.value > 0)
            .collect();

        let by_status = [
            (TaskStatus::Pending, "Pending"),
            (TaskStatus::Completed, "Completed"),
        ]
        .into_iter()
        .map(|(s, label)| ChartBucket {
            key: s.as_str().to_string(),
            label: label.to_string(),
            value: tasks.iter().filter(|t| t.status == s).count(),
        })
        .collect();

        Self {
            by_priority,
            by_status,
        }
    }

    pub fn status_count(&self, status: TaskStatus) -> usize {
        self.by_status
            .iter()
            .find(|b| b.key == status.as_str())
            .map(|b| b.value)
            .unwrap_or(0)
    }

    /// Share of each priority bucket in whole percent, as a pie label shows it.
    pub fn priority_shares(&self) -> Vec<(String, u32)> {
        let total: usize = self.by_priority.iter().map(|b| b.value).sum();
        if total == 0 {
            return Vec::new();
        }
        self.by_priority
            .iter()
            .map(|b| {
                let pct = (b.value as f64 * 100.0 / total as f64).round() as u32;
                (b.label.clone(), pct)
            })
            .collect()
    }
}
