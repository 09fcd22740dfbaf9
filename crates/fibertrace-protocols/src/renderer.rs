//! Renderer descriptors and the devtools hook surface renderers talk to.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::error::HookError;
use crate::node::{NodeRef, RootRef};
use crate::tree::RenderTree;

/// Identifier handed out by `DevtoolsHook::inject`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RendererId(pub u32);

impl fmt::Display for RendererId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Build flavor reported by a renderer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BundleType {
    Production,
    Development,
}

/// Descriptor a renderer registers with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RendererInfo {
    pub package_name: String,
    pub version: String,
    pub bundle_type: BundleType,
}

impl RendererInfo {
    pub fn development(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            bundle_type: BundleType::Development,
        }
    }

    pub fn production(package_name: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            package_name: package_name.into(),
            version: version.into(),
            bundle_type: BundleType::Production,
        }
    }
}

/// A host renderer: a descriptor plus read access to the trees it commits.
pub trait Renderer: Send + Sync {
    fn info(&self) -> RendererInfo;

    fn tree(&self) -> &dyn RenderTree;
}

/// The well-known hook renderers register against and report commits to.
pub trait DevtoolsHook: Send + Sync {
    /// Register a renderer and return its id.
    fn inject(&self, renderer: Arc<dyn Renderer>) -> RendererId;

    /// Registered renderers in registration order.
    fn renderers(&self) -> Vec<(RendererId, RendererInfo)>;

    /// Called by a renderer after it committed a new tree for `root`.
    fn on_commit_fiber_root(&self, renderer: RendererId, root: RootRef, priority: Option<u8>);

    /// Called by a renderer for each node it deletes during a commit.
    fn on_commit_fiber_unmount(&self, renderer: RendererId, node: NodeRef);
}

/// Receives renderer registrations and commit notifications from a hook.
///
/// All callbacks run synchronously inside the host's commit phase.
pub trait CommitListener: Send + Sync {
    /// Stable identifier used to keep subscription idempotent.
    fn listener_id(&self) -> &str;

    fn on_renderer_injected(&self, _renderer: RendererId, _info: &RendererInfo) {}

    fn on_commit_fiber_root(
        &self,
        renderer: RendererId,
        tree: &dyn RenderTree,
        root: RootRef,
        priority: Option<u8>,
    );

    fn on_commit_fiber_unmount(&self, renderer: RendererId, tree: &dyn RenderTree, node: NodeRef);
}

/// A more authoritative tool that already owns the global hook slot.
///
/// Listeners defer to it and announce themselves through its registration
/// channel instead of replacing it.
pub trait ForeignHook: Send + Sync {
    fn owner_name(&self) -> &str;

    fn register_listener(&self, listener: Arc<dyn CommitListener>) -> Result<(), HookError>;
}
