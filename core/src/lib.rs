//! Task model, collection synchronization and dashboard derivations for taskboard.
//!
//! Concrete stores and auth providers live in `taskboard-plugins`; this crate
//! only defines the seams (`TaskStore`, `AuthProvider`, `Notifier`) and the
//! logic that runs on top of them.

pub mod api;
pub mod auth;
pub mod collection;
pub mod config;
pub mod context;
pub mod dashboard;
pub mod error;
pub mod notify;
pub mod store;
pub mod task;
