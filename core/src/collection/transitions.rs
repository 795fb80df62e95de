use super::types::CollectionPhase;
use thiserror::Error;

#[derive(Debug, Error)]
#[error("Invalid collection transition from {from:?} to {to:?}")]
pub struct PhaseTransitionError {
    pub from: CollectionPhase,
    pub to: CollectionPhase,
}

pub struct PhaseTransition;

impl PhaseTransition {
    pub fn validate(from: CollectionPhase, to: CollectionPhase) -> Result<(), PhaseTransitionError> {
        let is_valid = match (from, to) {
            // sign-in (mount or identity change)
            (CollectionPhase::Uninitialized, CollectionPhase::Loading) => true,

            // fetch settled, successfully or not
            (CollectionPhase::Loading, CollectionPhase::Ready) => true,

            // refresh, or a different user signed in
            (CollectionPhase::Ready, CollectionPhase::Loading) => true,
            (CollectionPhase::Loading, CollectionPhase::Loading) => true,

            // sign-out is allowed from anywhere
            (_, CollectionPhase::Uninitialized) => true,

            _ => false,
        };

        if is_valid {
            Ok(())
        } else {
            Err(PhaseTransitionError { from, to })
        }
    }

    pub fn accepts_mutations(phase: CollectionPhase) -> bool {
        phase == CollectionPhase::Ready
    }
}
