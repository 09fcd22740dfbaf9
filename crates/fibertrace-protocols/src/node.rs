//! Render-node handles, work tags and flags as exposed by the host renderer.
//!
//! Every handle here is an opaque key minted by the host. Holding one never
//! keeps the referenced node or element alive, and a handle is only
//! guaranteed to be readable for the duration of the commit callback that
//! delivered it.

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Handle to one host render node (a fiber).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeRef(pub u64);

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Handle to a host root container (a fiber root).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct RootRef(pub u64);

/// Handle to one entry of a node's hook linked list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct HookRef(pub u64);

/// Handle to a native (DOM-like) element.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ElementHandle(pub u64);

/// Numeric work tag, matching the host renderer's values exactly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkTag(pub u32);

impl WorkTag {
    pub const FUNCTION_COMPONENT: WorkTag = WorkTag(0);
    pub const CLASS_COMPONENT: WorkTag = WorkTag(1);
    pub const INDETERMINATE_COMPONENT: WorkTag = WorkTag(2);
    pub const HOST_ROOT: WorkTag = WorkTag(3);
    pub const HOST_PORTAL: WorkTag = WorkTag(4);
    pub const HOST_COMPONENT: WorkTag = WorkTag(5);
    pub const HOST_TEXT: WorkTag = WorkTag(6);
    pub const FRAGMENT: WorkTag = WorkTag(7);
    pub const MODE: WorkTag = WorkTag(8);
    pub const CONTEXT_CONSUMER: WorkTag = WorkTag(9);
    pub const CONTEXT_PROVIDER: WorkTag = WorkTag(10);
    pub const FORWARD_REF: WorkTag = WorkTag(11);
    pub const PROFILER: WorkTag = WorkTag(12);
    pub const SUSPENSE_COMPONENT: WorkTag = WorkTag(13);
    pub const MEMO_COMPONENT: WorkTag = WorkTag(14);
    pub const SIMPLE_MEMO_COMPONENT: WorkTag = WorkTag(15);
    pub const LAZY_COMPONENT: WorkTag = WorkTag(16);
    pub const INCOMPLETE_CLASS_COMPONENT: WorkTag = WorkTag(17);
    pub const DEHYDRATED_FRAGMENT: WorkTag = WorkTag(18);
    pub const SUSPENSE_LIST_COMPONENT: WorkTag = WorkTag(19);
    pub const SCOPE_COMPONENT: WorkTag = WorkTag(21);
    pub const OFFSCREEN_COMPONENT: WorkTag = WorkTag(22);
    pub const LEGACY_HIDDEN_COMPONENT: WorkTag = WorkTag(23);
    pub const CACHE_COMPONENT: WorkTag = WorkTag(24);
    pub const TRACING_MARKER_COMPONENT: WorkTag = WorkTag(25);
    pub const HOST_HOISTABLE: WorkTag = WorkTag(26);
    pub const HOST_SINGLETON: WorkTag = WorkTag(27);

    /// Coarse classification used by the walker and differ.
    pub fn kind(self) -> NodeKind {
        match self {
            Self::HOST_ROOT => NodeKind::Root,
            Self::HOST_COMPONENT | Self::HOST_HOISTABLE | Self::HOST_SINGLETON => NodeKind::Host,
            Self::FUNCTION_COMPONENT
            | Self::CLASS_COMPONENT
            | Self::INDETERMINATE_COMPONENT
            | Self::FORWARD_REF
            | Self::MEMO_COMPONENT
            | Self::SIMPLE_MEMO_COMPONENT
            | Self::INCOMPLETE_CLASS_COMPONENT => NodeKind::Composite,
            Self::FRAGMENT => NodeKind::Fragment,
            Self::SUSPENSE_COMPONENT => NodeKind::SuspenseBoundary,
            Self::HOST_TEXT => NodeKind::Text,
            _ => NodeKind::Other,
        }
    }

    /// Whether nodes with this tag are user-authored components
    /// (function, class, forward-ref or memo).
    pub fn is_logical_component(self) -> bool {
        self.kind() == NodeKind::Composite
    }

    /// Fixed display label for host and bookkeeping tags.
    pub fn fixed_label(self) -> Option<&'static str> {
        let label = match self {
            Self::HOST_ROOT => "Root",
            Self::HOST_PORTAL => "Portal",
            Self::HOST_TEXT => "#text",
            Self::FRAGMENT => "Fragment",
            Self::MODE => "StrictMode",
            Self::CONTEXT_CONSUMER => "Context.Consumer",
            Self::CONTEXT_PROVIDER => "Context.Provider",
            Self::PROFILER => "Profiler",
            Self::SUSPENSE_COMPONENT => "Suspense",
            Self::LAZY_COMPONENT => "Lazy",
            Self::DEHYDRATED_FRAGMENT => "DehydratedFragment",
            Self::SUSPENSE_LIST_COMPONENT => "SuspenseList",
            Self::SCOPE_COMPONENT => "Scope",
            Self::OFFSCREEN_COMPONENT => "Offscreen",
            Self::LEGACY_HIDDEN_COMPONENT => "LegacyHidden",
            Self::CACHE_COMPONENT => "Cache",
            Self::TRACING_MARKER_COMPONENT => "TracingMarker",
            _ => return None,
        };
        Some(label)
    }
}

impl fmt::Display for WorkTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Coarse node classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    Root,
    Host,
    Composite,
    Fragment,
    SuspenseBoundary,
    Text,
    Other,
}

impl NodeKind {
    /// Relevant kinds get a `ComponentRecord`; the rest are traversed through.
    pub fn is_relevant(self) -> bool {
        matches!(self, NodeKind::Host | NodeKind::Composite)
    }
}

bitflags! {
    /// Side-effect flags the host sets on a node during a commit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct FiberFlags: u32 {
        const PERFORMED_WORK = 0b0000_0000_0000_0001;
        const PLACEMENT = 0b0000_0000_0000_0010;
        const UPDATE = 0b0000_0000_0000_0100;
        const CHILD_DELETION = 0b0000_0000_0001_0000;
        const CONTENT_RESET = 0b0000_0000_0010_0000;
        const CALLBACK = 0b0000_0000_0100_0000;
        const DID_CAPTURE = 0b0000_0000_1000_0000;
        const FORCE_CLIENT_RENDER = 0b0000_0001_0000_0000;
        const REF = 0b0000_0010_0000_0000;
        const SNAPSHOT = 0b0000_0100_0000_0000;
        const PASSIVE = 0b0000_1000_0000_0000;
        const HYDRATING = 0b0001_0000_0000_0000;
        const VISIBILITY = 0b0010_0000_0000_0000;
    }
}

impl FiberFlags {
    /// Whether the node rendered, was placed or received a host update in
    /// the commit that produced it.
    pub fn did_perform_work(self) -> bool {
        self.intersects(FiberFlags::PERFORMED_WORK | FiberFlags::PLACEMENT | FiberFlags::UPDATE)
    }
}

/// The `type` of a node, reduced to what naming needs.
///
/// `inner` carries the wrapped type of memo and forward-ref wrappers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementType {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner: Option<Box<ElementType>>,
}

impl ElementType {
    /// A named component type.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::default()
        }
    }

    /// A host element type such as `"div"`.
    pub fn host(tag: impl Into<String>) -> Self {
        Self::named(tag)
    }

    /// A wrapper type (memo, forward-ref) around `inner`.
    pub fn wrapping(inner: ElementType) -> Self {
        Self {
            inner: Some(Box::new(inner)),
            ..Self::default()
        }
    }

    /// Set an explicit debug name.
    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    /// Explicit debug name, then own name, then the wrapped type's name.
    pub fn resolved_name(&self) -> Option<&str> {
        self.display_name
            .as_deref()
            .filter(|n| !n.is_empty())
            .or_else(|| self.name.as_deref().filter(|n| !n.is_empty()))
            .or_else(|| self.inner.as_ref().and_then(|inner| inner.resolved_name()))
    }
}

/// Debug source location attached by development builds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceLocation {
    pub file_name: String,
    pub line_number: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub column_number: Option<u32>,
}

impl fmt::Display for SourceLocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_name, self.line_number)?;
        if let Some(column) = self.column_number {
            write!(f, ":{}", column)?;
        }
        Ok(())
    }
}

/// One raw entry of a node's hook linked list.
#[derive(Debug, Clone, PartialEq)]
pub struct HookEntry {
    pub memoized_value: serde_json::Value,
    pub base_value: serde_json::Value,
    pub next: Option<HookRef>,
}

#[cfg(test)]
#[path = "node_tests.rs"]
mod tests;
