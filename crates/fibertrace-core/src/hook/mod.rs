//! The devtools hook: service object, installer and detection poll.

mod detector;
mod global;
mod installer;

pub use detector::{DetectionStatus, RendererDetector};
pub use global::GlobalHook;
pub use installer::{HookInstaller, HookOccupant, HookSlot, InstallOutcome};
