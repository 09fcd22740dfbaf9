//! Consumer callbacks of a selection session.

use crate::record::ComponentRecord;

/// Receives highlight changes and the final selection of a session.
pub trait SelectionListener: Send + Sync {
    /// The hovered component changed to `record`.
    fn on_highlight(&self, _record: &ComponentRecord) {}

    /// Nothing is hovered anymore.
    fn on_highlight_cleared(&self) {}

    /// The session ended: `Some` on click or programmatic selection,
    /// `None` on cancel.
    fn on_select(&self, record: Option<&ComponentRecord>);
}

/// Adapter turning a closure into a select-only listener.
pub struct SelectCallback<F>(pub F);

impl<F> SelectionListener for SelectCallback<F>
where
    F: Fn(Option<&ComponentRecord>) + Send + Sync,
{
    fn on_select(&self, record: Option<&ComponentRecord>) {
        (self.0)(record)
    }
}
