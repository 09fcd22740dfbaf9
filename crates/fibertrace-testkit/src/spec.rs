//! Declarative description of one rendered tree.

use fibertrace_protocols::{ElementType, Rect, SourceLocation, WorkTag};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What kind of node a spec renders to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpecKind {
    Function,
    Class,
    Memo,
    ForwardRef,
    Host,
    Text,
    Fragment,
    Provider,
    Suspense,
    Offscreen,
}

impl SpecKind {
    pub fn tag(self) -> WorkTag {
        match self {
            SpecKind::Function => WorkTag::FUNCTION_COMPONENT,
            SpecKind::Class => WorkTag::CLASS_COMPONENT,
            SpecKind::Memo => WorkTag::MEMO_COMPONENT,
            SpecKind::ForwardRef => WorkTag::FORWARD_REF,
            SpecKind::Host => WorkTag::HOST_COMPONENT,
            SpecKind::Text => WorkTag::HOST_TEXT,
            SpecKind::Fragment => WorkTag::FRAGMENT,
            SpecKind::Provider => WorkTag::CONTEXT_PROVIDER,
            SpecKind::Suspense => WorkTag::SUSPENSE_COMPONENT,
            SpecKind::Offscreen => WorkTag::OFFSCREEN_COMPONENT,
        }
    }
}

/// One node of a declarative tree, plus its children.
///
/// Re-rendering the same spec produces no work on the matching node; any
/// change to props, state or hooks marks it as having performed work.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FiberSpec {
    pub kind: SpecKind,
    /// Component name, host tag, or text content.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub props: Value,
    #[serde(default)]
    pub state: Option<Value>,
    #[serde(default)]
    pub hooks: Vec<Value>,
    /// Geometry of a host element.
    #[serde(default)]
    pub rect: Option<Rect>,
    #[serde(default)]
    pub source: Option<SourceLocation>,
    #[serde(default)]
    pub children: Vec<FiberSpec>,
    /// Fallback content of a Suspense boundary.
    #[serde(default)]
    pub fallback: Vec<FiberSpec>,
    #[serde(default)]
    pub show_fallback: bool,
    /// Offscreen only: the subtree is hidden from hit testing.
    #[serde(default)]
    pub hidden: bool,
    /// Make the hook list unreadable.
    #[serde(default)]
    pub corrupt_hooks: bool,
}

impl FiberSpec {
    pub fn new(kind: SpecKind) -> Self {
        Self {
            kind,
            name: None,
            display_name: None,
            key: None,
            props: Value::Null,
            state: None,
            hooks: Vec::new(),
            rect: None,
            source: None,
            children: Vec::new(),
            fallback: Vec::new(),
            show_fallback: false,
            hidden: false,
            corrupt_hooks: false,
        }
    }

    fn named(kind: SpecKind, name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            ..Self::new(kind)
        }
    }

    pub fn function(name: impl Into<String>) -> Self {
        Self::named(SpecKind::Function, name)
    }

    pub fn class(name: impl Into<String>) -> Self {
        Self::named(SpecKind::Class, name)
    }

    pub fn memo(name: impl Into<String>) -> Self {
        Self::named(SpecKind::Memo, name)
    }

    pub fn forward_ref(name: impl Into<String>) -> Self {
        Self::named(SpecKind::ForwardRef, name)
    }

    /// A host element such as `div`.
    pub fn host(tag: impl Into<String>) -> Self {
        Self::named(SpecKind::Host, tag)
    }

    pub fn text(content: impl Into<String>) -> Self {
        Self::named(SpecKind::Text, content)
    }

    pub fn fragment() -> Self {
        Self::new(SpecKind::Fragment)
    }

    pub fn provider() -> Self {
        Self::new(SpecKind::Provider)
    }

    /// A Suspense boundary around `primary`, showing `fallback` when
    /// `show_fallback` is set.
    pub fn suspense(primary: Vec<FiberSpec>, fallback: Vec<FiberSpec>, show_fallback: bool) -> Self {
        Self {
            children: primary,
            fallback,
            show_fallback,
            ..Self::new(SpecKind::Suspense)
        }
    }

    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    pub fn with_display_name(mut self, display_name: impl Into<String>) -> Self {
        self.display_name = Some(display_name.into());
        self
    }

    pub fn with_props(mut self, props: Value) -> Self {
        self.props = props;
        self
    }

    pub fn with_state(mut self, state: Value) -> Self {
        self.state = Some(state);
        self
    }

    pub fn with_hooks(mut self, hooks: Vec<Value>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn with_rect(mut self, x: f64, y: f64, width: f64, height: f64) -> Self {
        self.rect = Some(Rect::new(x, y, width, height));
        self
    }

    pub fn with_source(mut self, file_name: impl Into<String>, line_number: u32) -> Self {
        self.source = Some(SourceLocation {
            file_name: file_name.into(),
            line_number,
            column_number: None,
        });
        self
    }

    pub fn with_child(mut self, child: FiberSpec) -> Self {
        self.children.push(child);
        self
    }

    pub fn with_children(mut self, children: Vec<FiberSpec>) -> Self {
        self.children = children;
        self
    }

    pub fn with_corrupt_hooks(mut self) -> Self {
        self.corrupt_hooks = true;
        self
    }

    /// Element type as the renderer exposes it.
    pub fn element_type(&self) -> ElementType {
        let base = || {
            let mut ty = ElementType {
                name: self.name.clone(),
                ..ElementType::default()
            };
            ty.display_name = self.display_name.clone();
            ty
        };
        match self.kind {
            SpecKind::Function | SpecKind::Class | SpecKind::Host => base(),
            SpecKind::Memo | SpecKind::ForwardRef => {
                let inner = ElementType {
                    name: self.name.clone(),
                    ..ElementType::default()
                };
                ElementType {
                    display_name: self.display_name.clone(),
                    ..ElementType::wrapping(inner)
                }
            }
            _ => ElementType::default(),
        }
    }

    /// Whether a node rendered from `other` can be updated in place by this
    /// spec.
    pub fn same_type(&self, other: &FiberSpec) -> bool {
        self.kind == other.kind && self.name == other.name && self.key == other.key
    }

    /// Whether rendering this spec over `prev` changes the node's own data.
    pub(crate) fn data_changed(&self, prev: &FiberSpec) -> bool {
        self.props != prev.props
            || self.state != prev.state
            || self.hooks != prev.hooks
            || self.rect != prev.rect
            || self.show_fallback != prev.show_fallback
            || self.hidden != prev.hidden
            || self.display_name != prev.display_name
            || self.corrupt_hooks != prev.corrupt_hooks
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_memo_type_wraps_name() {
        let spec = FiberSpec::memo("Card");
        assert_eq!(spec.element_type().resolved_name(), Some("Card"));
        assert!(spec.element_type().name.is_none());
    }

    #[test]
    fn test_spec_from_json() {
        let spec: FiberSpec = serde_json::from_value(json!({
            "kind": "function",
            "name": "App",
            "children": [
                { "kind": "host", "name": "div", "rect": { "x": 0.0, "y": 0.0, "width": 10.0, "height": 10.0 } }
            ]
        }))
        .unwrap();
        assert_eq!(spec.kind, SpecKind::Function);
        assert_eq!(spec.children.len(), 1);
        assert_eq!(spec.children[0].rect, Some(Rect::new(0.0, 0.0, 10.0, 10.0)));
    }

    #[test]
    fn test_same_type_respects_key() {
        let a = FiberSpec::function("Row").with_key("a");
        let b = FiberSpec::function("Row").with_key("b");
        assert!(!a.same_type(&b));
        assert!(a.same_type(&a.clone().with_props(json!({"x": 1}))));
    }
}
