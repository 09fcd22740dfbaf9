//! Read-only accessor for the host's render tree.

use serde_json::Value;

use crate::error::ExtractionError;
use crate::node::{
    ElementHandle, ElementType, FiberFlags, HookEntry, HookRef, NodeRef, RootRef, SourceLocation,
    WorkTag,
};

/// Read-only view of the host renderer's internal tree.
///
/// Structural reads are infallible: the host guarantees them for any node
/// delivered during the current commit. Data reads may fail and are isolated
/// to the node being extracted.
///
/// Implementations must never hand out a way to mutate the tree.
pub trait RenderTree: Send + Sync {
    /// The current tree of a root container, if it has one.
    fn current(&self, root: RootRef) -> Option<NodeRef>;

    fn tag(&self, node: NodeRef) -> WorkTag;

    fn flags(&self, node: NodeRef) -> FiberFlags;

    /// The immediately prior version of this node.
    fn alternate(&self, node: NodeRef) -> Option<NodeRef>;

    /// The `return` pointer.
    fn parent(&self, node: NodeRef) -> Option<NodeRef>;

    fn child(&self, node: NodeRef) -> Option<NodeRef>;

    fn sibling(&self, node: NodeRef) -> Option<NodeRef>;

    fn key(&self, node: NodeRef) -> Option<String>;

    fn element_type(&self, node: NodeRef) -> Result<ElementType, ExtractionError>;

    fn memoized_props(&self, node: NodeRef) -> Result<Value, ExtractionError>;

    /// Class state, or the Suspense "showing fallback" marker.
    fn memoized_state(&self, node: NodeRef) -> Result<Option<Value>, ExtractionError>;

    /// Head of the node's hook linked list.
    fn first_hook(&self, node: NodeRef) -> Result<Option<HookRef>, ExtractionError>;

    fn hook(&self, hook: HookRef) -> Result<HookEntry, ExtractionError>;

    /// Native element of a Host-tagged node.
    fn state_node(&self, node: NodeRef) -> Result<Option<ElementHandle>, ExtractionError>;

    fn debug_source(&self, node: NodeRef) -> Option<SourceLocation>;
}

/// Iterate a node's direct children in sibling order.
pub fn children(tree: &dyn RenderTree, node: NodeRef) -> Children<'_> {
    Children {
        tree,
        next: tree.child(node),
    }
}

/// Iterator over a sibling chain.
pub struct Children<'a> {
    tree: &'a dyn RenderTree,
    next: Option<NodeRef>,
}

impl Iterator for Children<'_> {
    type Item = NodeRef;

    fn next(&mut self) -> Option<NodeRef> {
        let current = self.next?;
        self.next = self.tree.sibling(current);
        Some(current)
    }
}

/// Whether a Suspense boundary currently displays its fallback.
///
/// An unreadable state is treated as showing the primary branch.
pub fn is_showing_fallback(tree: &dyn RenderTree, node: NodeRef) -> bool {
    tree.tag(node) == WorkTag::SUSPENSE_COMPONENT
        && matches!(tree.memoized_state(node), Ok(Some(ref state)) if !state.is_null())
}

/// Primary branch wrapper of a Suspense boundary.
pub fn primary_branch(tree: &dyn RenderTree, boundary: NodeRef) -> Option<NodeRef> {
    tree.child(boundary)
}

/// Fallback branch wrapper of a Suspense boundary, when present.
pub fn fallback_branch(tree: &dyn RenderTree, boundary: NodeRef) -> Option<NodeRef> {
    tree.child(boundary).and_then(|primary| tree.sibling(primary))
}
