//! Prev/next comparison of a tracked root.

use std::collections::HashSet;

use fibertrace_protocols::tree::{self as render_tree, children};
use fibertrace_protocols::{NodeKind, NodeRef};

use super::CommitPass;
use crate::extractor::ParentLink;

impl CommitPass<'_> {
    /// Compare the new root node against the one seen at the previous
    /// commit of the same root.
    pub fn diff(&mut self, next: NodeRef, prev: NodeRef) {
        if next != prev {
            self.update_node(next, prev, None);
        }
    }

    fn update_node(&mut self, next: NodeRef, prev: NodeRef, parent: Option<ParentLink>) {
        let (id, _) = self.identities.get_or_assign(next, Some(prev));
        let kind = self.tree.tag(next).kind();

        if kind.is_relevant() {
            if !self.index.contains(id) {
                self.mount(next, id, parent);
            } else if self.tree.flags(next).did_perform_work() {
                self.update(next, id, parent);
            }
        }
        let link = self.link_for(id, parent);

        if kind == NodeKind::SuspenseBoundary {
            self.update_suspense(next, prev, link);
        } else if self.tree.child(next) != self.tree.child(prev) {
            self.update_children(next, prev, link);
        }
    }

    fn update_children(&mut self, next: NodeRef, prev: NodeRef, parent: Option<ParentLink>) {
        let prev_children: Vec<NodeRef> = children(self.tree, prev).collect();
        let prev_set: HashSet<NodeRef> = prev_children.iter().copied().collect();
        let mut matched = HashSet::new();

        let next_children: Vec<NodeRef> = children(self.tree, next).collect();
        for child in next_children {
            if prev_set.contains(&child) {
                matched.insert(child);
                continue;
            }
            match self.tree.alternate(child) {
                Some(alternate) if prev_set.contains(&alternate) => {
                    matched.insert(alternate);
                    self.update_node(child, alternate, parent);
                }
                _ => self.mount_walk(child, parent),
            }
        }

        for old in prev_children {
            if !matched.contains(&old) {
                self.sweep(old);
            }
        }
        if let Some(parent) = parent {
            self.dirty.insert(parent.id);
        }
    }

    fn update_suspense(&mut self, next: NodeRef, prev: NodeRef, parent: Option<ParentLink>) {
        let was_fallback = render_tree::is_showing_fallback(self.tree, prev);
        let is_fallback = render_tree::is_showing_fallback(self.tree, next);
        let next_primary = render_tree::primary_branch(self.tree, next);
        let prev_primary = render_tree::primary_branch(self.tree, prev);
        let next_fallback = render_tree::fallback_branch(self.tree, next);
        let prev_fallback = render_tree::fallback_branch(self.tree, prev);

        match (was_fallback, is_fallback) {
            (true, true) => {
                self.carry_hidden(next_primary, prev_primary);
                self.update_branch(next_fallback, prev_fallback, parent);
            }
            (true, false) => {
                if let Some(old) = prev_fallback {
                    self.sweep(old);
                }
                self.carry_hidden(next_primary, prev_primary);
                if let Some(primary) = next_primary {
                    self.mount_walk(primary, parent);
                }
            }
            (false, true) => {
                // The primary subtree stays recorded while hidden.
                self.carry_hidden(next_primary, prev_primary);
                if let Some(fallback) = next_fallback {
                    self.mount_walk(fallback, parent);
                }
            }
            (false, false) => self.update_branch(next_primary, prev_primary, parent),
        }
        if let Some(parent) = parent {
            self.dirty.insert(parent.id);
        }
    }

    fn update_branch(
        &mut self,
        next: Option<NodeRef>,
        prev: Option<NodeRef>,
        parent: Option<ParentLink>,
    ) {
        match (next, prev) {
            (Some(next), Some(prev)) if next == prev => {}
            (Some(next), Some(prev)) if self.tree.alternate(next) == Some(prev) => {
                self.update_node(next, prev, parent)
            }
            (Some(next), Some(prev)) => {
                self.sweep(prev);
                self.mount_walk(next, parent);
            }
            (Some(next), None) => self.mount_walk(next, parent),
            (None, Some(prev)) => self.sweep(prev),
            (None, None) => {}
        }
    }

    /// Follow a hidden primary branch to its newest node versions without
    /// recording anything, so identities and a later sweep keep reaching
    /// every recorded node below it. Nodes dropped from the branch while it
    /// was hidden are swept.
    fn carry_hidden(&mut self, next: Option<NodeRef>, prev: Option<NodeRef>) {
        let (Some(next), Some(prev)) = (next, prev) else {
            return;
        };
        let mut stack = vec![(next, prev)];
        while let Some((next, prev)) = stack.pop() {
            if next == prev || self.identities.lookup(prev).is_none() {
                continue;
            }
            self.identities.get_or_assign(next, Some(prev));
            if self.tree.child(next) == self.tree.child(prev) {
                continue;
            }

            let prev_children: Vec<NodeRef> = children(self.tree, prev).collect();
            let mut matched = HashSet::new();
            for child in children(self.tree, next) {
                if prev_children.contains(&child) {
                    matched.insert(child);
                    continue;
                }
                if let Some(alternate) = self
                    .tree
                    .alternate(child)
                    .filter(|alternate| prev_children.contains(alternate))
                {
                    matched.insert(alternate);
                    stack.push((child, alternate));
                }
            }
            for old in prev_children {
                if !matched.contains(&old) {
                    self.sweep(old);
                }
            }
        }
    }
}
