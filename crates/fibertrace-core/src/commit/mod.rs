//! One commit's worth of classification work.
//!
//! A [`CommitPass`] borrows the engine's identity table and index for the
//! duration of a single host commit callback. The walker, differ and sweeper
//! each add an `impl` block to it; together they keep the index equal to the
//! set of relevant nodes reachable from the tracked roots.

mod differ;
mod sweeper;
mod walker;

use std::collections::HashSet;
use std::time::Instant;

use fibertrace_protocols::tree::children;
use fibertrace_protocols::{
    CommitEvent, CommitEventKind, CommitSummary, Identity, NodeRef, RenderTree,
};
use indexmap::IndexSet;
use tracing::{debug, trace};

use crate::extractor::{Extractor, ParentLink};
use crate::identity::IdentityTable;
use crate::index::MetadataIndex;

/// Mutable view over engine state for one commit.
pub struct CommitPass<'a> {
    tree: &'a dyn RenderTree,
    identities: &'a mut IdentityTable,
    index: &'a mut MetadataIndex,
    extractor: &'a Extractor,
    events: Vec<CommitEvent>,
    mounted: HashSet<Identity>,
    dirty: IndexSet<Identity>,
    failures: usize,
    started: Instant,
}

/// Events and totals produced by a finished pass.
pub struct CommitOutput {
    pub events: Vec<CommitEvent>,
    pub summary: CommitSummary,
}

impl<'a> CommitPass<'a> {
    pub fn new(
        tree: &'a dyn RenderTree,
        identities: &'a mut IdentityTable,
        index: &'a mut MetadataIndex,
        extractor: &'a Extractor,
    ) -> Self {
        Self {
            tree,
            identities,
            index,
            extractor,
            events: Vec::new(),
            mounted: HashSet::new(),
            dirty: IndexSet::new(),
            failures: 0,
            started: Instant::now(),
        }
    }

    /// Relink dirty parents and hand back what happened.
    pub fn finish(mut self) -> CommitOutput {
        let dirty: Vec<Identity> = self.dirty.drain(..).collect();
        for parent in dirty {
            self.relink(parent);
        }

        let mut summary = CommitSummary {
            extraction_failures: self.failures,
            duration: self.started.elapsed(),
            ..CommitSummary::default()
        };
        for event in &self.events {
            match event.kind {
                CommitEventKind::Mount => summary.mounted += 1,
                CommitEventKind::Update => summary.updated += 1,
                CommitEventKind::Unmount => summary.unmounted += 1,
            }
        }
        CommitOutput {
            events: self.events,
            summary,
        }
    }

    /// Record a relevant node for the first time.
    fn mount(&mut self, node: NodeRef, id: Identity, parent: Option<ParentLink>) {
        let record = self.extractor.extract(self.tree, node, id, parent);
        self.note_failures(&record.extraction_errors, node);
        let handle = record.native_handle;
        let display_name = record.display_name.clone();
        self.index.insert(record);
        if let Some(handle) = handle {
            self.index.claim_element(handle, id);
        }

        if let Some(parent) = parent {
            if let Some(parent_record) = self.index.get_mut(parent.id) {
                if !parent_record.children.contains(&id) {
                    parent_record.children.push(id);
                }
            }
            if !self.mounted.contains(&parent.id) {
                self.dirty.insert(parent.id);
            }
        }
        self.mounted.insert(id);
        trace!(id = %id, name = %display_name, "mount");
        self.events.push(CommitEvent {
            kind: CommitEventKind::Mount,
            id,
            display_name,
        });
    }

    /// Re-extract an already recorded node in place.
    fn update(&mut self, node: NodeRef, id: Identity, parent: Option<ParentLink>) {
        let Some(previous) = self.index.get(id) else {
            return;
        };
        let children = previous.children.clone();
        let old_parent = previous.parent;
        let old_depth = previous.depth;

        let mut record = self.extractor.extract(self.tree, node, id, parent);
        self.note_failures(&record.extraction_errors, node);
        record.children = children;
        let handle = record.native_handle;
        let display_name = record.display_name.clone();
        let depth = record.depth;
        self.index.insert(record);
        if let Some(handle) = handle {
            self.index.claim_element(handle, id);
        }

        if old_parent != parent.map(|p| p.id) {
            self.detach_from(old_parent, id);
            if let Some(parent) = parent {
                self.dirty.insert(parent.id);
            }
        }
        if depth != old_depth {
            self.propagate_depth(id);
        }
        trace!(id = %id, name = %display_name, "update");
        self.events.push(CommitEvent {
            kind: CommitEventKind::Update,
            id,
            display_name,
        });
    }

    /// Drop a record and release its identity.
    fn unmount(&mut self, id: Identity) {
        if let Some(record) = self.index.remove(id) {
            self.detach_from(record.parent, id);
            trace!(id = %id, name = %record.display_name, "unmount");
            self.events.push(CommitEvent {
                kind: CommitEventKind::Unmount,
                id,
                display_name: record.display_name,
            });
        }
        self.identities.release(id);
    }

    /// Link for records created under a record, or `inherited` when the
    /// node has none.
    fn link_for(&self, id: Identity, inherited: Option<ParentLink>) -> Option<ParentLink> {
        self.index.get(id).map(ParentLink::of).or(inherited)
    }

    fn detach_from(&mut self, parent: Option<Identity>, id: Identity) {
        if let Some(parent) = parent.and_then(|p| self.index.get_mut(p)) {
            parent.children.retain(|child| *child != id);
        }
    }

    fn note_failures(&mut self, errors: &[String], node: NodeRef) {
        if !errors.is_empty() {
            self.failures += 1;
            debug!(node = %node, errors = ?errors, "Partial extraction");
        }
    }

    /// Rebuild a parent's ordered child list from the current tree and fix
    /// parent links and depths below it.
    fn relink(&mut self, parent: Identity) {
        let Some(node) = self.identities.current_node(parent) else {
            return;
        };
        let Some(record) = self.index.get(parent) else {
            return;
        };
        let depth = record.depth;
        let handle = record.native_handle;

        let mut ordered = Vec::new();
        let mut stack: Vec<NodeRef> = children(self.tree, node).collect();
        stack.reverse();
        while let Some(current) = stack.pop() {
            let Some(id) = self.identities.lookup(current) else {
                continue;
            };
            if self.index.contains(id) {
                if !ordered.contains(&id) {
                    ordered.push(id);
                }
                continue;
            }
            let mut below: Vec<NodeRef> = children(self.tree, current).collect();
            below.reverse();
            stack.extend(below);
        }

        for child in &ordered {
            let previous_parent = self.index.get(*child).and_then(|r| r.parent);
            if previous_parent != Some(parent) {
                self.detach_from(previous_parent, *child);
            }
            if let Some(record) = self.index.get_mut(*child) {
                record.parent = Some(parent);
                if record.depth != depth + 1 {
                    record.depth = depth + 1;
                    self.propagate_depth(*child);
                }
            }
        }
        if let Some(record) = self.index.get_mut(parent) {
            record.children = ordered;
        }
        if let Some(handle) = handle {
            if self.index.element_owner(handle).is_none() {
                self.index.claim_element(handle, parent);
            }
        }
    }

    /// Recompute depths below `id` from its own depth.
    fn propagate_depth(&mut self, id: Identity) {
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(record) = self.index.get(current) else {
                continue;
            };
            let depth = record.depth + 1;
            for child in record.children.clone() {
                if let Some(child_record) = self.index.get_mut(child) {
                    if child_record.depth != depth {
                        child_record.depth = depth;
                        stack.push(child);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "commit_tests.rs"]
mod tests;
