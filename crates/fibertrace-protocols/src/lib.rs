//! # fibertrace Protocols
//!
//! Contract definitions (traits and types) between fibertrace and the host
//! UI framework. Contains only interface definitions - no implementations.
//!
//! ## Core Traits
//!
//! - [`RenderTree`] - Read-only access to the host's render tree
//! - [`Renderer`] - A registered renderer and its descriptor
//! - [`DevtoolsHook`] - The hook renderers register against
//! - [`CommitListener`] - Receives commits from a hook
//! - [`HostSurface`] - Point queries and element geometry
//! - [`HighlightSurface`] - Externally supplied highlight drawing
//! - [`CommitObserver`] - Receives classified commit events
//! - [`SelectionListener`] - Receives highlight and selection callbacks

pub mod error;
pub mod events;
pub mod node;
pub mod record;
pub mod renderer;
pub mod selection;
pub mod surface;
pub mod tree;

pub use error::{ExtractionError, FibertraceError, HookError, SelectionError};
pub use events::{CommitEvent, CommitEventKind, CommitObserver, CommitSummary};
pub use node::{
    ElementHandle, ElementType, FiberFlags, HookEntry, HookRef, NodeKind, NodeRef, RootRef,
    SourceLocation, WorkTag,
};
pub use record::{ComponentKind, ComponentRecord, HookValue, Identity};
pub use renderer::{
    BundleType, CommitListener, DevtoolsHook, ForeignHook, Renderer, RendererId, RendererInfo,
};
pub use selection::{SelectCallback, SelectionListener};
pub use surface::{HighlightSurface, HostSurface, InputKind, ListenerId, Rect};
pub use tree::RenderTree;
