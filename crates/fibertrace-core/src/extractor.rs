//! Turns one render node into a `ComponentRecord`.
//!
//! Every data read is isolated: a failing read is recorded on the record as
//! an extraction error and replaced by an empty value, so one bad node never
//! aborts a commit.

use fibertrace_config::EngineConfig;
use fibertrace_protocols::tree::{self as render_tree, children};
use fibertrace_protocols::{
    ComponentKind, ComponentRecord, ElementHandle, ExtractionError, HookValue, Identity, NodeKind,
    NodeRef, RenderTree, WorkTag,
};
use serde_json::Value;

/// The record a new record hangs under.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParentLink {
    pub id: Identity,
    pub depth: usize,
}

impl ParentLink {
    pub fn of(record: &ComponentRecord) -> Self {
        Self {
            id: record.id,
            depth: record.depth,
        }
    }
}

/// Bounded metadata reader.
#[derive(Debug, Clone)]
pub struct Extractor {
    max_hook_entries: usize,
    max_handle_search_nodes: usize,
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new(&EngineConfig::default())
    }
}

impl Extractor {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            max_hook_entries: config.max_hook_entries,
            max_handle_search_nodes: config.max_handle_search_nodes,
        }
    }

    /// Build the record of `node`. Children are left empty; linkage is the
    /// caller's business.
    pub fn extract(
        &self,
        tree: &dyn RenderTree,
        node: NodeRef,
        id: Identity,
        parent: Option<ParentLink>,
    ) -> ComponentRecord {
        let tag = tree.tag(node);
        let kind = ComponentKind::from(tag);
        let mut errors = Vec::new();

        let display_name = self.display_name(tree, node, tag, &mut errors);
        let props = tree.memoized_props(node).unwrap_or_else(|err| {
            errors.push(err.to_string());
            Value::Null
        });
        let state = if kind == ComponentKind::Class {
            tree.memoized_state(node).unwrap_or_else(|err| {
                errors.push(err.to_string());
                None
            })
        } else {
            None
        };
        let hooks = if matches!(
            kind,
            ComponentKind::Function | ComponentKind::ForwardRef | ComponentKind::Memo
        ) {
            self.read_hooks(tree, node).unwrap_or_else(|err| {
                errors.push(err.to_string());
                Vec::new()
            })
        } else {
            Vec::new()
        };
        let native_handle = self.resolve_handle(tree, node).unwrap_or_else(|err| {
            errors.push(err.to_string());
            direct_child_handle(tree, node)
        });

        ComponentRecord {
            id,
            display_name,
            kind,
            key: tree.key(node),
            props,
            state,
            hooks,
            parent: parent.map(|p| p.id),
            children: Vec::new(),
            native_handle,
            source: tree.debug_source(node),
            depth: parent.map_or(0, |p| p.depth + 1),
            is_logical_component: tag.is_logical_component(),
            extraction_errors: errors,
        }
    }

    fn display_name(
        &self,
        tree: &dyn RenderTree,
        node: NodeRef,
        tag: WorkTag,
        errors: &mut Vec<String>,
    ) -> String {
        match tree.element_type(node) {
            Ok(ty) => {
                if let Some(name) = ty.resolved_name() {
                    return name.to_string();
                }
            }
            Err(err) => errors.push(err.to_string()),
        }
        tag.fixed_label()
            .map(str::to_string)
            .unwrap_or_else(|| format!("Unknown({tag})"))
    }

    /// Walk the hook list, capped at `max_hook_entries`.
    pub fn read_hooks(
        &self,
        tree: &dyn RenderTree,
        node: NodeRef,
    ) -> Result<Vec<HookValue>, ExtractionError> {
        let mut hooks = Vec::new();
        let mut next = tree.first_hook(node)?;
        while let Some(hook) = next {
            if hooks.len() >= self.max_hook_entries {
                break;
            }
            let entry = tree.hook(hook)?;
            hooks.push(HookValue {
                memoized_value: entry.memoized_value,
                base_value: entry.base_value,
                has_next: entry.next.is_some(),
            });
            next = entry.next;
        }
        Ok(hooks)
    }

    /// Nearest host element: the node's own for host nodes, otherwise the
    /// first host descendant in depth-first order.
    pub fn resolve_handle(
        &self,
        tree: &dyn RenderTree,
        node: NodeRef,
    ) -> Result<Option<ElementHandle>, ExtractionError> {
        if tree.tag(node).kind() == NodeKind::Host {
            return tree.state_node(node);
        }

        let mut stack: Vec<NodeRef> = displayed_children(tree, node);
        stack.reverse();
        let mut visited = 0;
        while let Some(current) = stack.pop() {
            visited += 1;
            if visited > self.max_handle_search_nodes {
                return Err(ExtractionError::SearchBudgetExceeded(
                    self.max_handle_search_nodes,
                ));
            }
            if tree.tag(current).kind() == NodeKind::Host {
                return tree.state_node(current);
            }
            let mut next = displayed_children(tree, current);
            next.reverse();
            stack.extend(next);
        }
        Ok(None)
    }
}

/// Children on the branch the host currently displays.
///
/// A Suspense boundary contributes only its fallback wrapper while timed
/// out, otherwise only its primary wrapper.
pub fn displayed_children(tree: &dyn RenderTree, node: NodeRef) -> Vec<NodeRef> {
    if tree.tag(node).kind() == NodeKind::SuspenseBoundary {
        let branch = if render_tree::is_showing_fallback(tree, node) {
            render_tree::fallback_branch(tree, node)
        } else {
            render_tree::primary_branch(tree, node)
        };
        return branch.into_iter().collect();
    }
    children(tree, node).collect()
}

fn direct_child_handle(tree: &dyn RenderTree, node: NodeRef) -> Option<ElementHandle> {
    children(tree, node)
        .filter(|child| tree.tag(*child).kind() == NodeKind::Host)
        .find_map(|child| tree.state_node(child).ok().flatten())
}

#[cfg(test)]
#[path = "extractor_tests.rs"]
mod tests;
