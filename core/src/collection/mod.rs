//! Client-side task collection and its synchronization with a `TaskStore`.

pub mod manager;
pub mod transitions;
pub mod types;

pub use manager::TaskCollection;
pub use transitions::{PhaseTransition, PhaseTransitionError};
pub use types::{CollectionPhase, CollectionSnapshot, ItemSync};
