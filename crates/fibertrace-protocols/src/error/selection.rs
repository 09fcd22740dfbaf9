//! Selection session errors.

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("Selection session is already observing")]
    AlreadyObserving,

    #[error("No selection session is observing")]
    NotObserving,

    #[error("Selection is unavailable while the engine is disabled")]
    EngineDisabled,
}
