//! Arbitration over the single global hook slot.

use std::fmt;
use std::sync::Arc;

use fibertrace_protocols::{CommitListener, DevtoolsHook, ForeignHook, HookError};
use parking_lot::RwLock;
use tracing::{info, warn};

use super::global::GlobalHook;

/// Whatever currently occupies the global hook slot.
#[derive(Clone)]
pub enum HookOccupant {
    Vacant,
    /// A hook this engine can merge into.
    Compatible(Arc<GlobalHook>),
    /// A more authoritative tool owns the slot.
    Authoritative(Arc<dyn ForeignHook>),
    /// Something that is neither.
    Incompatible { description: String },
}

impl fmt::Debug for HookOccupant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HookOccupant::Vacant => write!(f, "Vacant"),
            HookOccupant::Compatible(_) => write!(f, "Compatible"),
            HookOccupant::Authoritative(owner) => write!(f, "Authoritative({})", owner.owner_name()),
            HookOccupant::Incompatible { description } => write!(f, "Incompatible({description})"),
        }
    }
}

/// The process-wide slot renderers look the hook up in.
///
/// Created once at startup and shared by everything that needs to install
/// into or merge with the hook.
pub struct HookSlot {
    occupant: RwLock<HookOccupant>,
}

impl Default for HookSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl HookSlot {
    pub fn new() -> Self {
        Self::with_occupant(HookOccupant::Vacant)
    }

    pub fn with_occupant(occupant: HookOccupant) -> Self {
        Self {
            occupant: RwLock::new(occupant),
        }
    }

    pub fn occupant(&self) -> HookOccupant {
        self.occupant.read().clone()
    }

    /// The installed hook, when the slot holds a compatible one.
    pub fn hook(&self) -> Option<Arc<GlobalHook>> {
        match &*self.occupant.read() {
            HookOccupant::Compatible(hook) => Some(hook.clone()),
            _ => None,
        }
    }
}

/// Result of a successful install.
#[derive(Clone)]
pub enum InstallOutcome {
    /// The slot was empty; a new hook was installed.
    Installed(Arc<GlobalHook>),
    /// An existing compatible hook was reused with its renderers intact.
    Merged(Arc<GlobalHook>),
    /// Registered through an authoritative owner's channel.
    Deferred { owner: String },
}

impl InstallOutcome {
    pub fn hook(&self) -> Option<Arc<GlobalHook>> {
        match self {
            InstallOutcome::Installed(hook) | InstallOutcome::Merged(hook) => Some(hook.clone()),
            InstallOutcome::Deferred { .. } => None,
        }
    }
}

impl fmt::Debug for InstallOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InstallOutcome::Installed(_) => write!(f, "Installed"),
            InstallOutcome::Merged(_) => write!(f, "Merged"),
            InstallOutcome::Deferred { owner } => write!(f, "Deferred({owner})"),
        }
    }
}

/// Installs listeners into a [`HookSlot`].
pub struct HookInstaller {
    slot: Arc<HookSlot>,
}

impl HookInstaller {
    pub fn new(slot: Arc<HookSlot>) -> Self {
        Self { slot }
    }

    pub fn slot(&self) -> &Arc<HookSlot> {
        &self.slot
    }

    /// Make sure `listener` receives renderer commits.
    ///
    /// Idempotent: installing the same listener again merges into the hook
    /// it already sits on.
    pub fn install(&self, listener: Arc<dyn CommitListener>) -> Result<InstallOutcome, HookError> {
        let occupant = {
            let mut slot = self.slot.occupant.write();
            if matches!(*slot, HookOccupant::Vacant) {
                let hook = Arc::new(GlobalHook::new());
                *slot = HookOccupant::Compatible(hook.clone());
                drop(slot);
                hook.subscribe(listener);
                info!("Installed devtools hook");
                return Ok(InstallOutcome::Installed(hook));
            }
            slot.clone()
        };

        match occupant {
            HookOccupant::Compatible(hook) => {
                let added = hook.subscribe(listener);
                info!(
                    renderers = hook.renderers().len(),
                    added,
                    "Merged into existing devtools hook"
                );
                Ok(InstallOutcome::Merged(hook))
            }
            HookOccupant::Authoritative(owner) => {
                let name = owner.owner_name().to_string();
                owner.register_listener(listener)?;
                info!(owner = %name, "Deferred to authoritative hook owner");
                Ok(InstallOutcome::Deferred { owner: name })
            }
            HookOccupant::Incompatible { description } => {
                warn!(occupant = %description, "Incompatible hook occupies the slot");
                Err(HookError::InstallConflict(description))
            }
            HookOccupant::Vacant => Err(HookError::Registration(
                "hook slot emptied during install".to_string(),
            )),
        }
    }
}

#[cfg(test)]
#[path = "installer_tests.rs"]
mod tests;
