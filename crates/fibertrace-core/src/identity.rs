//! Stable identities for logical nodes across node versions.
//!
//! A node and its `alternate` always share one [`Identity`]. Only the two
//! most recent versions of a node are remembered, so superseded versions
//! stop resolving once the host has moved two commits past them.

use std::collections::HashMap;

use fibertrace_protocols::{Identity, NodeRef};

#[derive(Debug, Clone, Copy)]
struct Versions {
    current: NodeRef,
    previous: Option<NodeRef>,
}

/// Node version to identity table.
#[derive(Debug)]
pub struct IdentityTable {
    next: u64,
    by_node: HashMap<NodeRef, Identity>,
    versions: HashMap<Identity, Versions>,
}

impl Default for IdentityTable {
    fn default() -> Self {
        Self::new()
    }
}

impl IdentityTable {
    pub fn new() -> Self {
        Self {
            next: 1,
            by_node: HashMap::new(),
            versions: HashMap::new(),
        }
    }

    pub fn lookup(&self, node: NodeRef) -> Option<Identity> {
        self.by_node.get(&node).copied()
    }

    /// Identity of `node`, inherited from `alternate` when the node itself is
    /// unknown. Returns `true` alongside a freshly minted identity.
    pub fn get_or_assign(&mut self, node: NodeRef, alternate: Option<NodeRef>) -> (Identity, bool) {
        if let Some(id) = self.lookup(node) {
            self.touch(id, node);
            return (id, false);
        }
        if let Some(id) = alternate.and_then(|alt| self.lookup(alt)) {
            self.by_node.insert(node, id);
            self.touch(id, node);
            return (id, false);
        }

        let id = Identity(self.next);
        self.next += 1;
        self.by_node.insert(node, id);
        self.versions.insert(
            id,
            Versions {
                current: node,
                previous: None,
            },
        );
        (id, true)
    }

    /// Most recent node version seen for `id`.
    pub fn current_node(&self, id: Identity) -> Option<NodeRef> {
        self.versions.get(&id).map(|v| v.current)
    }

    /// Forget every version of `id`. The identity is never handed out again.
    pub fn release(&mut self, id: Identity) {
        if let Some(versions) = self.versions.remove(&id) {
            self.forget(versions.current, id);
            if let Some(previous) = versions.previous {
                self.forget(previous, id);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.versions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.versions.is_empty()
    }

    fn touch(&mut self, id: Identity, node: NodeRef) {
        let Some(versions) = self.versions.get_mut(&id) else {
            return;
        };
        if versions.current == node {
            return;
        }
        let stale = versions.previous.replace(versions.current);
        versions.current = node;
        if let Some(stale) = stale.filter(|s| *s != node) {
            self.forget(stale, id);
        }
    }

    fn forget(&mut self, node: NodeRef, id: Identity) {
        if self.by_node.get(&node) == Some(&id) {
            self.by_node.remove(&node);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_identities_increase() {
        let mut table = IdentityTable::new();
        let (a, fresh_a) = table.get_or_assign(NodeRef(10), None);
        let (b, fresh_b) = table.get_or_assign(NodeRef(11), None);
        assert!(fresh_a && fresh_b);
        assert_eq!(a, Identity(1));
        assert_eq!(b, Identity(2));
    }

    #[test]
    fn test_alternate_shares_identity() {
        let mut table = IdentityTable::new();
        let (id, _) = table.get_or_assign(NodeRef(1), None);
        let (next, fresh) = table.get_or_assign(NodeRef(2), Some(NodeRef(1)));
        assert_eq!(id, next);
        assert!(!fresh);
        assert_eq!(table.current_node(id), Some(NodeRef(2)));
    }

    #[test]
    fn test_keeps_two_versions() {
        let mut table = IdentityTable::new();
        let (id, _) = table.get_or_assign(NodeRef(1), None);
        table.get_or_assign(NodeRef(2), Some(NodeRef(1)));
        table.get_or_assign(NodeRef(3), Some(NodeRef(2)));
        assert_eq!(table.lookup(NodeRef(1)), None);
        assert_eq!(table.lookup(NodeRef(2)), Some(id));
        assert_eq!(table.lookup(NodeRef(3)), Some(id));
    }

    #[test]
    fn test_release_never_reuses() {
        let mut table = IdentityTable::new();
        let (id, _) = table.get_or_assign(NodeRef(1), None);
        table.release(id);
        assert!(table.is_empty());
        assert_eq!(table.lookup(NodeRef(1)), None);

        let (again, fresh) = table.get_or_assign(NodeRef(1), None);
        assert!(fresh);
        assert_ne!(again, id);
    }
}
