use serde::Serialize;

use crate::task::Task;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Summary {
    pub total: usize,
    pub pending: usize,
    pub completed: usize,
}

impl Summary {
    pub fn from_tasks(tasks: &[Task]) -> Self {
        tasks.iter().fold(Self::default(), |mut acc, t| {
            acc.total += 1;
            if t.is_completed() {
                acc.completed += 1;
            } else {
                acc.pending += 1;
            }
            acc
        })
    }
}
