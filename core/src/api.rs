//! Stable re-exports for consumers (`cli`, `plugins`, and external crates).
//!
//! Prefer importing from `taskboard_core::api` instead of reaching into internal modules.

pub use crate::auth::{AuthProvider, AuthSession, AuthUser, SessionHandle};
pub use crate::collection::{CollectionPhase, CollectionSnapshot, ItemSync, TaskCollection};
pub use crate::config::{
    load_from, AppConfig, BackendProvider, HttpBackendConfig, LoggingConfig,
    MemoryBackendConfig,
};
pub use crate::context::{AppContext, Services, ServicesFactory};
pub use crate::dashboard::{
    filter_by_day, sort_by_due_date, CalendarMonth, ChartBucket, ChartData, DateFilter,
    DayBucket, FormSubmission, Summary, TaskForm,
};
pub use crate::error::{CliError, CollectionError, RemoteError, RemoteErrorKind};
pub use crate::notify::{Notification, NotificationHub, Notifier, Severity};
pub use crate::store::TaskStore;
pub use crate::task::{
    normalize_due_date, Task, TaskFieldError, TaskFormData, TaskOrder, TaskPatch, TaskPriority,
    TaskStatus,
};
