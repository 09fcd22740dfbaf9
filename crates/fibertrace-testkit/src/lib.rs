//! Test infrastructure for fibertrace.
//!
//! - [`MemoryHost`] - An in-memory renderer that reconciles declarative
//!   [`FiberSpec`] trees into fiber-like node versions and a DOM-like
//!   element tree, and reports commits to a devtools hook.
//! - [`Scenario`] - A JSON-described sequence of commits and probes.
//! - Recording fakes for highlight surfaces, selection listeners and
//!   commit observers.

#![allow(clippy::unwrap_used)]
#![allow(clippy::expect_used)]

pub mod host;
pub mod recording;
pub mod scenario;
pub mod spec;

pub use host::MemoryHost;
pub use recording::{HighlightCall, RecordingHighlight, RecordingObserver, RecordingSelection};
pub use scenario::{Probe, Scenario, ScenarioCommit};
pub use spec::{FiberSpec, SpecKind};
