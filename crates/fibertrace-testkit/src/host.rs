//! In-memory host renderer.
//!
//! Each `render` reconciles a [`FiberSpec`] against the root's current tree
//! the way the real renderer does: matched children get a fresh node version
//! whose `alternate` points at the previous one, unchanged child lists are
//! reused as-is, deleted subtrees are reported node by node, and Suspense
//! boundaries are expanded into an Offscreen primary wrapper plus a Fragment
//! fallback wrapper.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use fibertrace_protocols::{
    DevtoolsHook, ElementHandle, ElementType, ExtractionError, FiberFlags, HookEntry, HookRef,
    HostSurface, InputKind, ListenerId, NodeRef, Rect, RenderTree, Renderer, RendererId,
    RendererInfo, RootRef, SourceLocation, WorkTag,
};
use parking_lot::RwLock;
use serde_json::{Value, json};
use tracing::trace;

use crate::scenario::Scenario;
use crate::spec::{FiberSpec, SpecKind};

/// In-memory renderer, render tree and element surface in one.
pub struct MemoryHost {
    info: RendererInfo,
    state: RwLock<HostState>,
    notify_unmounts: AtomicBool,
}

struct HostState {
    next_id: u64,
    nodes: HashMap<NodeRef, NodeData>,
    hooks: HashMap<HookRef, HookEntry>,
    roots: HashMap<RootRef, RootData>,
    elements: HashMap<ElementHandle, ElementData>,
    document: ElementHandle,
    listeners: HashMap<ListenerId, InputKind>,
    unreadable: HashSet<NodeRef>,
}

struct NodeData {
    spec: FiberSpec,
    tag: WorkTag,
    flags: FiberFlags,
    element_type: ElementType,
    state: Option<Value>,
    first_hook: Option<HookRef>,
    element: Option<ElementHandle>,
    alternate: Option<NodeRef>,
    parent: Option<NodeRef>,
    child: Option<NodeRef>,
    sibling: Option<NodeRef>,
    child_specs: Vec<FiberSpec>,
}

struct RootData {
    current: Option<NodeRef>,
    container: ElementHandle,
    elements: HashSet<ElementHandle>,
}

#[derive(Default)]
struct ElementData {
    parent: Option<ElementHandle>,
    children: Vec<ElementHandle>,
    rect: Option<Rect>,
    attached: bool,
    hidden: bool,
    overlay: bool,
}

impl Default for MemoryHost {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryHost {
    /// A development build of `react-dom`.
    pub fn new() -> Self {
        Self::with_info(RendererInfo::development("react-dom", "18.3.1"))
    }

    pub fn with_info(info: RendererInfo) -> Self {
        let document = ElementHandle(1);
        let mut elements = HashMap::new();
        elements.insert(
            document,
            ElementData {
                attached: true,
                ..ElementData::default()
            },
        );
        Self {
            info,
            state: RwLock::new(HostState {
                next_id: 2,
                nodes: HashMap::new(),
                hooks: HashMap::new(),
                roots: HashMap::new(),
                elements,
                document,
                listeners: HashMap::new(),
                unreadable: HashSet::new(),
            }),
            notify_unmounts: AtomicBool::new(true),
        }
    }

    /// Whether `commit` reports deleted nodes through
    /// `on_commit_fiber_unmount` before the root commit.
    pub fn set_notify_unmounts(&self, enabled: bool) {
        self.notify_unmounts.store(enabled, Ordering::SeqCst);
    }

    /// Create an empty root container attached to the document.
    pub fn create_root(&self) -> RootRef {
        let mut state = self.state.write();
        let root = RootRef(state.alloc());
        let container = ElementHandle(state.alloc());
        let document = state.document;
        state.elements.insert(
            container,
            ElementData {
                parent: Some(document),
                attached: true,
                ..ElementData::default()
            },
        );
        if let Some(doc) = state.elements.get_mut(&document) {
            doc.children.push(container);
        }
        state.roots.insert(
            root,
            RootData {
                current: None,
                container,
                elements: HashSet::new(),
            },
        );
        root
    }

    /// Render `spec` into `root` and return the nodes deleted by this render,
    /// parents before children. `None` unmounts the root.
    pub fn render(&self, root: RootRef, spec: Option<FiberSpec>) -> Vec<NodeRef> {
        let mut state = self.state.write();
        let mut deleted = Vec::new();
        let Some(prev) = state.roots.get(&root).map(|r| r.current) else {
            return deleted;
        };

        let current = match spec {
            Some(spec) => {
                let host_root = state.alloc_node(NodeData {
                    alternate: prev,
                    flags: FiberFlags::UPDATE,
                    ..NodeData::new(FiberSpec::new(SpecKind::Fragment), WorkTag::HOST_ROOT)
                });
                state.reconcile_children(host_root, prev, &[spec], &mut deleted);
                Some(host_root)
            }
            None => {
                if let Some(prev_child) = prev.and_then(|p| state.nodes.get(&p)).and_then(|n| n.child)
                {
                    state.collect_chain(prev_child, &mut deleted);
                }
                None
            }
        };

        if let Some(data) = state.roots.get_mut(&root) {
            data.current = current;
        }
        state.rebuild_elements(root);
        trace!(root = root.0, deleted = deleted.len(), "Rendered root");
        deleted
    }

    /// Render and report the commit to `hook` as the real renderer would.
    pub fn commit(
        &self,
        hook: &dyn DevtoolsHook,
        renderer: RendererId,
        root: RootRef,
        spec: Option<FiberSpec>,
    ) -> Vec<NodeRef> {
        let deleted = self.render(root, spec);
        if self.notify_unmounts.load(Ordering::SeqCst) {
            for node in &deleted {
                hook.on_commit_fiber_unmount(renderer, *node);
            }
        }
        hook.on_commit_fiber_root(renderer, root, None);
        deleted
    }

    /// Replay every commit of `scenario`, creating roots on first use.
    pub fn play(
        &self,
        hook: &dyn DevtoolsHook,
        renderer: RendererId,
        scenario: &Scenario,
    ) -> HashMap<u32, RootRef> {
        let mut roots = HashMap::new();
        for commit in &scenario.commits {
            let root = *roots
                .entry(commit.root)
                .or_insert_with(|| self.create_root());
            self.commit(hook, renderer, root, commit.tree.clone());
        }
        roots
    }

    /// Register this host with `hook`.
    pub fn inject_into(self: &Arc<Self>, hook: &dyn DevtoolsHook) -> RendererId {
        hook.inject(self.clone())
    }

    /// Current node of `root` rendered from a spec with the given key.
    pub fn find_node(&self, root: RootRef, key: &str) -> Option<NodeRef> {
        let state = self.state.read();
        let start = state.roots.get(&root)?.current?;
        let mut stack = vec![start];
        while let Some(node) = stack.pop() {
            let data = state.nodes.get(&node)?;
            if data.spec.key.as_deref() == Some(key) {
                return Some(node);
            }
            let mut next = data.child;
            while let Some(child) = next {
                stack.push(child);
                next = state.nodes.get(&child).and_then(|c| c.sibling);
            }
        }
        None
    }

    /// Element of the host node rendered from a spec with the given key.
    pub fn find_element(&self, root: RootRef, key: &str) -> Option<ElementHandle> {
        let node = self.find_node(root, key)?;
        self.state.read().nodes.get(&node)?.element
    }

    /// Container element of a root.
    pub fn container(&self, root: RootRef) -> Option<ElementHandle> {
        self.state.read().roots.get(&root).map(|r| r.container)
    }

    /// Move or resize an element without a commit.
    pub fn set_rect(&self, element: ElementHandle, rect: Rect) {
        if let Some(data) = self.state.write().elements.get_mut(&element) {
            data.rect = Some(rect);
        }
    }

    /// Add an overlay element on top of everything else.
    pub fn add_overlay(&self, rect: Rect) -> ElementHandle {
        let mut state = self.state.write();
        let overlay = ElementHandle(state.alloc());
        let document = state.document;
        state.elements.insert(
            overlay,
            ElementData {
                parent: Some(document),
                rect: Some(rect),
                attached: true,
                overlay: true,
                ..ElementData::default()
            },
        );
        if let Some(doc) = state.elements.get_mut(&document) {
            doc.children.push(overlay);
        }
        overlay
    }

    /// Make every data read of `node` fail.
    pub fn make_unreadable(&self, node: NodeRef) {
        self.state.write().unreadable.insert(node);
    }

    pub fn active_listeners(&self) -> usize {
        self.state.read().listeners.len()
    }

    pub fn is_listening(&self, kind: InputKind) -> bool {
        self.state.read().listeners.values().any(|k| *k == kind)
    }

    fn read_node<T>(
        &self,
        node: NodeRef,
        read: impl FnOnce(&NodeData) -> T,
    ) -> Result<T, ExtractionError> {
        let state = self.state.read();
        if state.unreadable.contains(&node) {
            return Err(ExtractionError::Detached(node));
        }
        let data = state.nodes.get(&node).ok_or(ExtractionError::Detached(node))?;
        Ok(read(data))
    }

    fn structural<T>(&self, node: NodeRef, read: impl FnOnce(&NodeData) -> T) -> Option<T> {
        self.state.read().nodes.get(&node).map(read)
    }
}

impl NodeData {
    fn new(spec: FiberSpec, tag: WorkTag) -> Self {
        Self {
            spec,
            tag,
            flags: FiberFlags::empty(),
            element_type: ElementType::default(),
            state: None,
            first_hook: None,
            element: None,
            alternate: None,
            parent: None,
            child: None,
            sibling: None,
            child_specs: Vec::new(),
        }
    }
}

impl HostState {
    fn alloc(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    fn alloc_node(&mut self, data: NodeData) -> NodeRef {
        let node = NodeRef(self.alloc());
        self.nodes.insert(node, data);
        node
    }

    fn child_list(&self, parent: NodeRef) -> Vec<NodeRef> {
        let mut out = Vec::new();
        let mut next = self.nodes.get(&parent).and_then(|p| p.child);
        while let Some(child) = next {
            out.push(child);
            next = self.nodes.get(&child).and_then(|c| c.sibling);
        }
        out
    }

    fn reconcile_children(
        &mut self,
        parent: NodeRef,
        prev_parent: Option<NodeRef>,
        specs: &[FiberSpec],
        deleted: &mut Vec<NodeRef>,
    ) {
        if let Some(prev) = prev_parent.and_then(|p| self.nodes.get(&p)) {
            if prev.child_specs == specs {
                let reused = prev.child;
                if let Some(data) = self.nodes.get_mut(&parent) {
                    data.child = reused;
                    data.child_specs = specs.to_vec();
                }
                return;
            }
        }

        let prev_children = prev_parent.map(|p| self.child_list(p)).unwrap_or_default();
        let mut used = vec![false; prev_children.len()];
        let mut created = Vec::with_capacity(specs.len());

        for (index, spec) in specs.iter().enumerate() {
            let matched = prev_children.iter().enumerate().position(|(j, prev)| {
                !used[j]
                    && self.nodes.get(prev).is_some_and(|p| {
                        p.spec.same_type(spec) && (spec.key.is_some() || j == index)
                    })
            });
            if let Some(j) = matched {
                used[j] = true;
            }
            let node = self.render_node(spec, matched.map(|j| prev_children[j]), parent, deleted);
            created.push(node);
        }

        for pair in created.windows(2) {
            if let Some(data) = self.nodes.get_mut(&pair[0]) {
                data.sibling = Some(pair[1]);
            }
        }
        if let Some(data) = self.nodes.get_mut(&parent) {
            data.child = created.first().copied();
            data.child_specs = specs.to_vec();
        }

        for (j, prev) in prev_children.into_iter().enumerate() {
            if !used[j] {
                self.collect_subtree(prev, deleted);
            }
        }
    }

    fn render_node(
        &mut self,
        spec: &FiberSpec,
        prev: Option<NodeRef>,
        parent: NodeRef,
        deleted: &mut Vec<NodeRef>,
    ) -> NodeRef {
        let tag = spec.kind.tag();
        let prev_data = prev.and_then(|p| self.nodes.get(&p));
        let flags = match prev_data {
            None => FiberFlags::PERFORMED_WORK | FiberFlags::PLACEMENT,
            Some(p) if spec.data_changed(&p.spec) => {
                if spec.kind == SpecKind::Host {
                    FiberFlags::PERFORMED_WORK | FiberFlags::UPDATE
                } else {
                    FiberFlags::PERFORMED_WORK
                }
            }
            Some(_) => FiberFlags::empty(),
        };
        let reused_element = prev_data.and_then(|p| p.element);

        let element = if spec.kind == SpecKind::Host {
            let handle = match reused_element {
                Some(handle) => handle,
                None => {
                    let handle = ElementHandle(self.alloc());
                    self.elements.insert(handle, ElementData::default());
                    handle
                }
            };
            if let Some(data) = self.elements.get_mut(&handle) {
                data.rect = spec.rect;
            }
            Some(handle)
        } else {
            None
        };

        let mut first_hook = None;
        for value in spec.hooks.iter().rev() {
            let hook = HookRef(self.alloc());
            self.hooks.insert(
                hook,
                HookEntry {
                    memoized_value: value.clone(),
                    base_value: value.clone(),
                    next: first_hook,
                },
            );
            first_hook = Some(hook);
        }

        let state = match spec.kind {
            SpecKind::Suspense if spec.show_fallback => Some(json!({ "dehydrated": null })),
            SpecKind::Suspense => None,
            SpecKind::Text => None,
            _ => spec.state.clone(),
        };

        let mut own = spec.clone();
        own.children.clear();
        own.fallback.clear();
        let node = self.alloc_node(NodeData {
            flags,
            element_type: spec.element_type(),
            state,
            first_hook,
            element,
            alternate: prev,
            parent: Some(parent),
            ..NodeData::new(own, tag)
        });

        match spec.kind {
            SpecKind::Text => {}
            SpecKind::Suspense => {
                let mut wrappers = vec![FiberSpec {
                    hidden: spec.show_fallback,
                    children: spec.children.clone(),
                    ..FiberSpec::new(SpecKind::Offscreen)
                }];
                if spec.show_fallback {
                    wrappers.push(FiberSpec::fragment().with_children(spec.fallback.clone()));
                }
                self.reconcile_children(node, prev, &wrappers, deleted);
            }
            _ => self.reconcile_children(node, prev, &spec.children, deleted),
        }
        node
    }

    /// Push `node` and all of its descendants, parents first.
    fn collect_subtree(&self, node: NodeRef, out: &mut Vec<NodeRef>) {
        out.push(node);
        if let Some(child) = self.nodes.get(&node).and_then(|n| n.child) {
            self.collect_chain(child, out);
        }
    }

    fn collect_chain(&self, first: NodeRef, out: &mut Vec<NodeRef>) {
        let mut next = Some(first);
        while let Some(node) = next {
            self.collect_subtree(node, out);
            next = self.nodes.get(&node).and_then(|n| n.sibling);
        }
    }

    fn rebuild_elements(&mut self, root: RootRef) {
        let Some(data) = self.roots.get_mut(&root) else {
            return;
        };
        let container = data.container;
        let previous = std::mem::take(&mut data.elements);
        let current = data.current;

        if let Some(el) = self.elements.get_mut(&container) {
            el.children.clear();
        }

        let mut reached = HashSet::new();
        let mut stack: Vec<(NodeRef, ElementHandle, bool)> = Vec::new();
        if let Some(current) = current {
            for child in self.child_list(current).into_iter().rev() {
                stack.push((child, container, false));
            }
        }

        while let Some((node, parent_el, hidden)) = stack.pop() {
            let Some(data) = self.nodes.get(&node) else {
                continue;
            };
            let mut next_parent = parent_el;
            let next_hidden = hidden || (data.tag == WorkTag::OFFSCREEN_COMPONENT && data.spec.hidden);
            if let Some(handle) = data.element {
                reached.insert(handle);
                if let Some(el) = self.elements.get_mut(&handle) {
                    el.parent = Some(parent_el);
                    el.children.clear();
                    el.attached = true;
                    el.hidden = hidden;
                }
                if let Some(parent) = self.elements.get_mut(&parent_el) {
                    parent.children.push(handle);
                }
                next_parent = handle;
            }
            for child in self.child_list(node).into_iter().rev() {
                stack.push((child, next_parent, next_hidden));
            }
        }

        for handle in previous.difference(&reached) {
            if let Some(el) = self.elements.get_mut(handle) {
                el.attached = false;
                el.parent = None;
                el.children.clear();
            }
        }
        if let Some(data) = self.roots.get_mut(&root) {
            data.elements = reached;
        }
    }

    fn hit(&self, element: ElementHandle, x: f64, y: f64) -> Option<ElementHandle> {
        let data = self.elements.get(&element)?;
        if !data.attached || data.hidden {
            return None;
        }
        for child in data.children.iter().rev() {
            if let Some(hit) = self.hit(*child, x, y) {
                return Some(hit);
            }
        }
        data.rect.filter(|r| r.contains(x, y)).map(|_| element)
    }
}

impl Renderer for MemoryHost {
    fn info(&self) -> RendererInfo {
        self.info.clone()
    }

    fn tree(&self) -> &dyn RenderTree {
        self
    }
}

impl RenderTree for MemoryHost {
    fn current(&self, root: RootRef) -> Option<NodeRef> {
        self.state.read().roots.get(&root)?.current
    }

    fn tag(&self, node: NodeRef) -> WorkTag {
        self.structural(node, |n| n.tag).unwrap_or(WorkTag(u32::MAX))
    }

    fn flags(&self, node: NodeRef) -> FiberFlags {
        self.structural(node, |n| n.flags).unwrap_or_default()
    }

    fn alternate(&self, node: NodeRef) -> Option<NodeRef> {
        self.structural(node, |n| n.alternate).flatten()
    }

    fn parent(&self, node: NodeRef) -> Option<NodeRef> {
        self.structural(node, |n| n.parent).flatten()
    }

    fn child(&self, node: NodeRef) -> Option<NodeRef> {
        self.structural(node, |n| n.child).flatten()
    }

    fn sibling(&self, node: NodeRef) -> Option<NodeRef> {
        self.structural(node, |n| n.sibling).flatten()
    }

    fn key(&self, node: NodeRef) -> Option<String> {
        self.structural(node, |n| n.spec.key.clone()).flatten()
    }

    fn element_type(&self, node: NodeRef) -> Result<ElementType, ExtractionError> {
        self.read_node(node, |n| n.element_type.clone())
    }

    fn memoized_props(&self, node: NodeRef) -> Result<Value, ExtractionError> {
        self.read_node(node, |n| n.spec.props.clone())
    }

    fn memoized_state(&self, node: NodeRef) -> Result<Option<Value>, ExtractionError> {
        self.read_node(node, |n| n.state.clone())
    }

    fn first_hook(&self, node: NodeRef) -> Result<Option<HookRef>, ExtractionError> {
        let (corrupt, head) = self.read_node(node, |n| (n.spec.corrupt_hooks, n.first_hook))?;
        if corrupt {
            return Err(ExtractionError::CorruptHookList { node, hook: head });
        }
        Ok(head)
    }

    fn hook(&self, hook: HookRef) -> Result<HookEntry, ExtractionError> {
        self.state
            .read()
            .hooks
            .get(&hook)
            .cloned()
            .ok_or(ExtractionError::CorruptHookList {
                node: NodeRef(0),
                hook: Some(hook),
            })
    }

    fn state_node(&self, node: NodeRef) -> Result<Option<ElementHandle>, ExtractionError> {
        self.read_node(node, |n| n.element)
    }

    fn debug_source(&self, node: NodeRef) -> Option<SourceLocation> {
        self.structural(node, |n| n.spec.source.clone()).flatten()
    }
}

impl HostSurface for MemoryHost {
    fn element_at_point(&self, x: f64, y: f64) -> Option<ElementHandle> {
        let state = self.state.read();
        state.hit(state.document, x, y)
    }

    fn parent_element(&self, element: ElementHandle) -> Option<ElementHandle> {
        self.state.read().elements.get(&element)?.parent
    }

    fn bounding_rect(&self, element: ElementHandle) -> Option<Rect> {
        let state = self.state.read();
        let data = state.elements.get(&element)?;
        if data.attached { data.rect } else { None }
    }

    fn is_attached(&self, element: ElementHandle) -> bool {
        self.state
            .read()
            .elements
            .get(&element)
            .is_some_and(|e| e.attached)
    }

    fn is_overlay(&self, element: ElementHandle) -> bool {
        self.state
            .read()
            .elements
            .get(&element)
            .is_some_and(|e| e.overlay)
    }

    fn listen(&self, kind: InputKind) -> ListenerId {
        let mut state = self.state.write();
        let id = ListenerId(state.alloc());
        state.listeners.insert(id, kind);
        id
    }

    fn unlisten(&self, id: ListenerId) {
        self.state.write().listeners.remove(&id);
    }
}

#[cfg(test)]
#[path = "host_tests.rs"]
mod tests;
