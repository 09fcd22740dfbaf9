//! The global devtools hook as an explicit service object.
//!
//! Renderers register through [`DevtoolsHook::inject`] and report commits to
//! it; the hook fans those out to its subscribed [`CommitListener`]s.

use std::sync::Arc;
use std::sync::atomic::{AtomicU32, Ordering};

use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use fibertrace_protocols::{
    CommitListener, DevtoolsHook, NodeRef, Renderer, RendererId, RendererInfo, RootRef,
};
use indexmap::IndexMap;
use parking_lot::RwLock;
use tracing::{debug, info};

struct Registration {
    renderer: Arc<dyn Renderer>,
    info: RendererInfo,
}

/// Shared devtools hook renderers register against.
pub struct GlobalHook {
    renderers: RwLock<IndexMap<RendererId, Registration>>,
    listeners: DashMap<String, Arc<dyn CommitListener>>,
    next_renderer: AtomicU32,
}

impl Default for GlobalHook {
    fn default() -> Self {
        Self::new()
    }
}

impl GlobalHook {
    pub fn new() -> Self {
        Self {
            renderers: RwLock::new(IndexMap::new()),
            listeners: DashMap::new(),
            next_renderer: AtomicU32::new(1),
        }
    }

    /// Subscribe a listener. Subscribing the same listener id twice is a
    /// no-op and returns `false`.
    ///
    /// Renderers registered before the subscription are replayed to the new
    /// listener.
    pub fn subscribe(&self, listener: Arc<dyn CommitListener>) -> bool {
        let id = listener.listener_id().to_string();
        match self.listeners.entry(id.clone()) {
            Entry::Occupied(_) => return false,
            Entry::Vacant(slot) => {
                slot.insert(listener.clone());
            }
        }

        let existing: Vec<(RendererId, RendererInfo)> = self.renderers();
        for (renderer, info) in &existing {
            listener.on_renderer_injected(*renderer, info);
        }
        info!(listener = %id, replayed = existing.len(), "Listener subscribed");
        true
    }

    pub fn unsubscribe(&self, listener_id: &str) -> bool {
        self.listeners.remove(listener_id).is_some()
    }

    pub fn is_subscribed(&self, listener_id: &str) -> bool {
        self.listeners.contains_key(listener_id)
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }

    pub fn renderer(&self, id: RendererId) -> Option<Arc<dyn Renderer>> {
        self.renderers.read().get(&id).map(|r| r.renderer.clone())
    }

    fn snapshot(&self) -> Vec<Arc<dyn CommitListener>> {
        self.listeners.iter().map(|entry| entry.value().clone()).collect()
    }
}

impl DevtoolsHook for GlobalHook {
    fn inject(&self, renderer: Arc<dyn Renderer>) -> RendererId {
        let id = RendererId(self.next_renderer.fetch_add(1, Ordering::SeqCst));
        let info = renderer.info();
        self.renderers.write().insert(
            id,
            Registration {
                renderer,
                info: info.clone(),
            },
        );
        info!(
            renderer = %id,
            package = %info.package_name,
            version = %info.version,
            "Renderer injected"
        );
        for listener in self.snapshot() {
            listener.on_renderer_injected(id, &info);
        }
        id
    }

    fn renderers(&self) -> Vec<(RendererId, RendererInfo)> {
        self.renderers
            .read()
            .iter()
            .map(|(id, r)| (*id, r.info.clone()))
            .collect()
    }

    fn on_commit_fiber_root(&self, renderer: RendererId, root: RootRef, priority: Option<u8>) {
        let Some(registered) = self.renderer(renderer) else {
            debug!(renderer = %renderer, "Commit from unknown renderer");
            return;
        };
        for listener in self.snapshot() {
            listener.on_commit_fiber_root(renderer, registered.tree(), root, priority);
        }
    }

    fn on_commit_fiber_unmount(&self, renderer: RendererId, node: NodeRef) {
        let Some(registered) = self.renderer(renderer) else {
            return;
        };
        for listener in self.snapshot() {
            listener.on_commit_fiber_unmount(renderer, registered.tree(), node);
        }
    }
}

#[cfg(test)]
#[path = "global_tests.rs"]
mod tests;
