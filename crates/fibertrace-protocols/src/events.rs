//! Per-node commit events and the observer interface.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::node::RootRef;
use crate::record::Identity;
use crate::renderer::RendererId;

/// Classification of a node within one commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommitEventKind {
    Mount,
    Update,
    Unmount,
}

/// One classified node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitEvent {
    pub kind: CommitEventKind,
    pub id: Identity,
    pub display_name: String,
}

/// Totals for one processed commit.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitSummary {
    pub renderer: Option<RendererId>,
    pub root: Option<RootRef>,
    pub mounted: usize,
    pub updated: usize,
    pub unmounted: usize,
    pub extraction_failures: usize,
    pub duration: Duration,
}

impl CommitSummary {
    pub fn total(&self) -> usize {
        self.mounted + self.updated + self.unmounted
    }
}

/// Receives commit events after the engine released its locks.
pub trait CommitObserver: Send + Sync {
    fn on_commit_event(&self, _event: &CommitEvent) {}

    fn on_commit_complete(&self, _summary: &CommitSummary) {}
}
