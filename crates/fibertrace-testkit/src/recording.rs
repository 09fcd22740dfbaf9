//! Recording fakes for the engine's outward callbacks.

use fibertrace_protocols::{
    CommitEvent, CommitEventKind, CommitObserver, CommitSummary, ComponentRecord, HighlightSurface,
    Identity, Rect, SelectionListener,
};
use parking_lot::Mutex;

/// One call made against a highlight surface.
#[derive(Debug, Clone, PartialEq)]
pub enum HighlightCall {
    Draw { rect: Rect, label: String },
    Clear,
}

/// Highlight surface that records every call.
#[derive(Default)]
pub struct RecordingHighlight {
    calls: Mutex<Vec<HighlightCall>>,
}

impl RecordingHighlight {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> Vec<HighlightCall> {
        self.calls.lock().clone()
    }

    pub fn draw_count(&self) -> usize {
        self.calls
            .lock()
            .iter()
            .filter(|c| matches!(c, HighlightCall::Draw { .. }))
            .count()
    }

    pub fn last(&self) -> Option<HighlightCall> {
        self.calls.lock().last().cloned()
    }
}

impl HighlightSurface for RecordingHighlight {
    fn draw_highlight(&self, rect: Rect, label: &str) {
        self.calls.lock().push(HighlightCall::Draw {
            rect,
            label: label.to_string(),
        });
    }

    fn clear_highlight(&self) {
        self.calls.lock().push(HighlightCall::Clear);
    }
}

/// Selection listener that records highlights and selections.
#[derive(Default)]
pub struct RecordingSelection {
    highlights: Mutex<Vec<Option<Identity>>>,
    selections: Mutex<Vec<Option<ComponentRecord>>>,
}

impl RecordingSelection {
    pub fn new() -> Self {
        Self::default()
    }

    /// Highlight callbacks in order; `None` for a clear.
    pub fn highlights(&self) -> Vec<Option<Identity>> {
        self.highlights.lock().clone()
    }

    pub fn selections(&self) -> Vec<Option<ComponentRecord>> {
        self.selections.lock().clone()
    }
}

impl SelectionListener for RecordingSelection {
    fn on_highlight(&self, record: &ComponentRecord) {
        self.highlights.lock().push(Some(record.id));
    }

    fn on_highlight_cleared(&self) {
        self.highlights.lock().push(None);
    }

    fn on_select(&self, record: Option<&ComponentRecord>) {
        self.selections.lock().push(record.cloned());
    }
}

/// Commit observer that records every event and summary.
#[derive(Default)]
pub struct RecordingObserver {
    events: Mutex<Vec<CommitEvent>>,
    summaries: Mutex<Vec<CommitSummary>>,
}

impl RecordingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<CommitEvent> {
        self.events.lock().clone()
    }

    pub fn summaries(&self) -> Vec<CommitSummary> {
        self.summaries.lock().clone()
    }

    /// Display names of events of one kind, in order.
    pub fn names(&self, kind: CommitEventKind) -> Vec<String> {
        self.events
            .lock()
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.display_name.clone())
            .collect()
    }

    pub fn clear(&self) {
        self.events.lock().clear();
        self.summaries.lock().clear();
    }
}

impl CommitObserver for RecordingObserver {
    fn on_commit_event(&self, event: &CommitEvent) {
        self.events.lock().push(event.clone());
    }

    fn on_commit_complete(&self, summary: &CommitSummary) {
        self.summaries.lock().push(summary.clone());
    }
}
