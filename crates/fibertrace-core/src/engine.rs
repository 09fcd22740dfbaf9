//! The instrumentation engine.
//!
//! [`Engine`] is the commit listener registered with the devtools hook. Each
//! root commit runs one [`CommitPass`] under the engine's locks, then hands
//! the resulting events to observers after the locks are released.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fibertrace_config::Config;
use fibertrace_protocols::{
    BundleType, CommitEvent, CommitListener, CommitObserver, CommitSummary, ComponentRecord,
    ElementHandle, HookError, HostSurface, Identity, NodeRef, RenderTree, RendererId,
    RendererInfo, RootRef,
};
use indexmap::IndexMap;
use parking_lot::{Mutex, RwLock};
use tracing::{debug, info, warn};

use crate::commit::{CommitOutput, CommitPass};
use crate::extractor::Extractor;
use crate::hit_test;
use crate::hook::{HookInstaller, InstallOutcome};
use crate::identity::IdentityTable;
use crate::index::MetadataIndex;

const LISTENER_ID: &str = "fibertrace-engine";

/// Admission decision for a registered renderer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RendererStatus {
    Attached(RendererInfo),
    /// Production build without override; its commits are ignored.
    Refused(RendererInfo),
}

impl RendererStatus {
    pub fn is_attached(&self) -> bool {
        matches!(self, RendererStatus::Attached(_))
    }
}

/// Per observed root: the root node seen at the previous commit.
#[derive(Debug, Clone, Copy)]
struct RootSession {
    previous: NodeRef,
}

#[derive(Default)]
struct EngineState {
    identities: IdentityTable,
    sessions: HashMap<(RendererId, RootRef), RootSession>,
    pending_unmounts: HashMap<RendererId, Vec<NodeRef>>,
    renderers: IndexMap<RendererId, RendererStatus>,
    commits: u64,
}

/// Commit listener that keeps the metadata index in sync with the host.
pub struct Engine {
    extractor: Extractor,
    allow_production: bool,
    prune_interval: u64,
    index: RwLock<MetadataIndex>,
    state: Mutex<EngineState>,
    observers: RwLock<Vec<Arc<dyn CommitObserver>>>,
    surface: RwLock<Option<Arc<dyn HostSurface>>>,
    disabled: AtomicBool,
}

impl Engine {
    pub fn new(config: &Config) -> Self {
        Self {
            extractor: Extractor::new(&config.engine),
            allow_production: config.hook.allow_production,
            prune_interval: config.engine.prune_interval_commits,
            index: RwLock::new(MetadataIndex::new()),
            state: Mutex::new(EngineState::default()),
            observers: RwLock::new(Vec::new()),
            surface: RwLock::new(None),
            disabled: AtomicBool::new(false),
        }
    }

    /// Install or merge into the hook slot and subscribe this engine.
    ///
    /// An incompatible occupant disables the engine.
    pub fn attach(self: &Arc<Self>, installer: &HookInstaller) -> Result<InstallOutcome, HookError> {
        match installer.install(self.clone()) {
            Ok(outcome) => {
                info!(outcome = ?outcome, "Engine attached to devtools hook");
                Ok(outcome)
            }
            Err(err @ HookError::InstallConflict(_)) => {
                warn!(error = %err, "Cannot merge with existing hook; engine disabled");
                self.disable();
                Err(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Surface used to prune element entries of detached elements.
    pub fn set_surface(&self, surface: Arc<dyn HostSurface>) {
        *self.surface.write() = Some(surface);
    }

    pub fn add_observer(&self, observer: Arc<dyn CommitObserver>) {
        self.observers.write().push(observer);
    }

    pub fn disable(&self) {
        self.disabled.store(true, Ordering::SeqCst);
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled.load(Ordering::SeqCst)
    }

    pub fn renderer_status(&self, renderer: RendererId) -> Option<RendererStatus> {
        self.state.lock().renderers.get(&renderer).cloned()
    }

    /// Admitted renderers in registration order.
    pub fn attached_renderers(&self) -> Vec<RendererId> {
        self.state
            .lock()
            .renderers
            .iter()
            .filter(|(_, status)| status.is_attached())
            .map(|(id, _)| *id)
            .collect()
    }

    pub fn commit_count(&self) -> u64 {
        self.state.lock().commits
    }

    pub fn tracked_roots(&self) -> usize {
        self.state.lock().sessions.len()
    }

    /// Identities currently assigned, including non-relevant nodes.
    pub fn identity_count(&self) -> usize {
        self.state.lock().identities.len()
    }

    pub fn get_component_by_id(&self, id: Identity) -> Option<ComponentRecord> {
        self.index.read().get(id).cloned()
    }

    /// Every record, shallowest first.
    pub fn get_all_components(&self) -> Vec<ComponentRecord> {
        self.index.read().all_by_depth()
    }

    /// Records without a parent.
    pub fn get_component_tree(&self) -> Vec<ComponentRecord> {
        self.index.read().roots()
    }

    pub fn get_logical_components(&self) -> Vec<ComponentRecord> {
        self.index
            .read()
            .all_by_depth()
            .into_iter()
            .filter(|r| r.is_logical_component)
            .collect()
    }

    /// Display names from the outermost ancestor down to `id`.
    pub fn get_component_stack(&self, id: Identity) -> Vec<String> {
        let index = self.index.read();
        let mut stack = Vec::new();
        let mut next = index.get(id);
        while let Some(record) = next {
            stack.push(record.display_name.clone());
            if stack.len() > index.len() {
                break;
            }
            next = record.parent.and_then(|p| index.get(p));
        }
        stack.reverse();
        stack
    }

    /// Owner of the element under a point. Never mutates the index.
    pub fn hit_test(&self, surface: &dyn HostSurface, x: f64, y: f64) -> Option<ComponentRecord> {
        let index = self.index.read();
        hit_test::hit_test(surface, &index, x, y).and_then(|id| index.get(id).cloned())
    }

    /// Owner identity of an element, if any.
    pub fn element_owner(&self, element: ElementHandle) -> Option<Identity> {
        self.index.read().element_owner(element)
    }

    /// Number of element entries.
    pub fn element_count(&self) -> usize {
        self.index.read().elements().len()
    }

    fn admit(&self, renderer: RendererId, info: &RendererInfo) -> RendererStatus {
        if info.bundle_type == BundleType::Production && !self.allow_production {
            let err = HookError::InstrumentationUnsafe {
                renderer,
                package: info.package_name.clone(),
            };
            warn!(error = %err, "Renderer refused");
            return RendererStatus::Refused(info.clone());
        }
        info!(
            renderer = %renderer,
            package = %info.package_name,
            version = %info.version,
            "Renderer attached"
        );
        RendererStatus::Attached(info.clone())
    }

    fn is_admitted(state: &EngineState, renderer: RendererId) -> bool {
        state
            .renderers
            .get(&renderer)
            .is_some_and(RendererStatus::is_attached)
    }

    fn process_commit(
        &self,
        renderer: RendererId,
        tree: &dyn RenderTree,
        root: RootRef,
    ) -> Option<CommitOutput> {
        let mut guard = self.state.lock();
        let state = &mut *guard;
        if !Self::is_admitted(state, renderer) {
            return None;
        }
        let mut index = self.index.write();

        let pending = state.pending_unmounts.remove(&renderer).unwrap_or_default();
        let key = (renderer, root);
        let previous = state.sessions.get(&key).map(|s| s.previous);
        let current = tree.current(root);

        let mut pass = CommitPass::new(tree, &mut state.identities, &mut index, &self.extractor);
        for node in pending.iter().rev() {
            pass.sweep(*node);
        }

        let next_session = match (current, previous) {
            (None, None) => None,
            (None, Some(prev)) => {
                pass.sweep(prev);
                None
            }
            (Some(next), None) => {
                pass.mount_walk(next, None);
                Some(next)
            }
            (Some(next), Some(prev)) => {
                if tree.child(next).is_none() && tree.child(prev).is_some() {
                    pass.sweep(prev);
                    None
                } else {
                    pass.diff(next, prev);
                    Some(next)
                }
            }
        };
        let mut output = pass.finish();

        match next_session {
            Some(previous) => {
                state.sessions.insert(key, RootSession { previous });
            }
            None => {
                if state.sessions.remove(&key).is_some() {
                    info!(renderer = %renderer, root = root.0, "Root unmounted");
                }
            }
        }

        state.commits += 1;
        if self.prune_interval > 0 && state.commits % self.prune_interval == 0 {
            if let Some(surface) = self.surface.read().as_ref() {
                let pruned = index.prune_detached(surface.as_ref());
                if pruned > 0 {
                    debug!(pruned, "Pruned detached element entries");
                }
            }
        }

        output.summary.renderer = Some(renderer);
        output.summary.root = Some(root);
        Some(output)
    }

    fn dispatch(&self, events: &[CommitEvent], summary: &CommitSummary) {
        let observers: Vec<Arc<dyn CommitObserver>> = self.observers.read().clone();
        for observer in &observers {
            for event in events {
                observer.on_commit_event(event);
            }
            observer.on_commit_complete(summary);
        }
    }
}

impl CommitListener for Engine {
    fn listener_id(&self) -> &str {
        LISTENER_ID
    }

    fn on_renderer_injected(&self, renderer: RendererId, info: &RendererInfo) {
        let status = self.admit(renderer, info);
        self.state.lock().renderers.insert(renderer, status);
    }

    fn on_commit_fiber_root(
        &self,
        renderer: RendererId,
        tree: &dyn RenderTree,
        root: RootRef,
        _priority: Option<u8>,
    ) {
        if self.is_disabled() {
            return;
        }
        let Some(output) = self.process_commit(renderer, tree, root) else {
            return;
        };
        debug!(
            renderer = %renderer,
            root = root.0,
            mounted = output.summary.mounted,
            updated = output.summary.updated,
            unmounted = output.summary.unmounted,
            failures = output.summary.extraction_failures,
            duration_us = output.summary.duration.as_micros() as u64,
            "Processed commit"
        );
        self.dispatch(&output.events, &output.summary);
    }

    fn on_commit_fiber_unmount(&self, renderer: RendererId, _tree: &dyn RenderTree, node: NodeRef) {
        if self.is_disabled() {
            return;
        }
        let mut state = self.state.lock();
        if Self::is_admitted(&state, renderer) {
            state.pending_unmounts.entry(renderer).or_default().push(node);
        }
    }
}

#[cfg(test)]
#[path = "engine_tests.rs"]
mod tests;
