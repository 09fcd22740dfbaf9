//! # fibertrace core
//!
//! Tracks a host renderer's component tree from the outside, one commit at
//! a time, and answers "which component is this?" questions about it.
//!
//! ## Components
//!
//! - [`hook`] - The global devtools hook service, its installer and the
//!   renderer detection poll
//! - [`Engine`] - Commit listener that classifies nodes and maintains the
//!   [`MetadataIndex`]
//! - [`Extractor`] - Builds a `ComponentRecord` from one render node
//! - [`hit_test`] - Point to component resolution
//! - [`SelectionSession`] - Hover, click and escape workflow
//! - [`Inspector`] - Query facade handed to the rest of the assistant

pub mod commit;
pub mod engine;
pub mod extractor;
pub mod hook;
pub mod identity;
pub mod index;
pub mod inspector;
pub mod selection;

pub use engine::{Engine, RendererStatus};
pub use extractor::{Extractor, ParentLink};
pub use hit_test::hit_test;
pub use hook::{
    DetectionStatus, GlobalHook, HookInstaller, HookOccupant, HookSlot, InstallOutcome,
    RendererDetector,
};
pub use identity::IdentityTable;
pub use index::{ElementMap, MetadataIndex};
pub use inspector::Inspector;
pub use selection::{SelectionSession, SessionState};
