mod types;

pub use types::{
    normalize_due_date, Task, TaskFieldError, TaskFormData, TaskOrder, TaskPatch, TaskPriority,
    TaskStatus,
};
