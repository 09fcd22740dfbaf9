//! Query facade handed to the rest of the assistant.

use std::sync::Arc;

use fibertrace_config::SelectionConfig;
use fibertrace_protocols::{
    ComponentRecord, HighlightSurface, HostSurface, Identity, Rect, SelectCallback, SelectionError,
    SelectionListener,
};

use crate::engine::Engine;
use crate::selection::SelectionSession;

/// Read-only queries over the engine plus the selection workflow.
pub struct Inspector {
    engine: Arc<Engine>,
    surface: Arc<dyn HostSurface>,
    highlight: Option<Arc<dyn HighlightSurface>>,
    selection: SelectionConfig,
    session: SelectionSession,
}

impl Inspector {
    /// Build the facade over `engine`. The engine also gets `surface` for
    /// detached-element pruning.
    pub fn new(
        engine: Arc<Engine>,
        surface: Arc<dyn HostSurface>,
        highlight: Option<Arc<dyn HighlightSurface>>,
        selection: SelectionConfig,
    ) -> Self {
        engine.set_surface(surface.clone());
        let session = SelectionSession::new(
            engine.clone(),
            surface.clone(),
            highlight.clone(),
            selection.clone(),
        );
        Self {
            engine,
            surface,
            highlight,
            selection,
            session,
        }
    }

    pub fn engine(&self) -> &Arc<Engine> {
        &self.engine
    }

    pub fn session(&self) -> &SelectionSession {
        &self.session
    }

    pub fn get_component_at_point(&self, x: f64, y: f64) -> Option<ComponentRecord> {
        self.engine.hit_test(self.surface.as_ref(), x, y)
    }

    pub fn get_component_by_id(&self, id: Identity) -> Option<ComponentRecord> {
        self.engine.get_component_by_id(id)
    }

    /// Every record in ascending depth order.
    pub fn get_all_components(&self) -> Vec<ComponentRecord> {
        self.engine.get_all_components()
    }

    /// Records without a parent.
    pub fn get_component_tree(&self) -> Vec<ComponentRecord> {
        self.engine.get_component_tree()
    }

    pub fn get_logical_components(&self) -> Vec<ComponentRecord> {
        self.engine.get_logical_components()
    }

    pub fn get_component_stack(&self, id: Identity) -> Vec<String> {
        self.engine.get_component_stack(id)
    }

    /// Start a selection session reporting to `listener`.
    pub fn on_selection(&self, listener: Arc<dyn SelectionListener>) -> Result<(), SelectionError> {
        self.session.start(listener)
    }

    /// Start a selection session that only cares about the final pick.
    pub fn on_selection_fn<F>(&self, callback: F) -> Result<(), SelectionError>
    where
        F: Fn(Option<&ComponentRecord>) + Send + Sync + 'static,
    {
        self.session.start(Arc::new(SelectCallback(callback)))
    }

    pub fn select_component(&self, record: &ComponentRecord) -> Result<(), SelectionError> {
        self.session.select_component(record)
    }

    pub fn draw_highlight(&self, rect: Rect, label: &str) {
        if let Some(surface) = &self.highlight {
            surface.draw_highlight(rect, label);
        }
    }

    pub fn clear_highlight(&self) {
        if let Some(surface) = &self.highlight {
            surface.clear_highlight();
        }
    }

    /// Outline a component by id. Returns false when it has no visible
    /// element.
    pub fn highlight_component(&self, id: Identity) -> bool {
        let Some(record) = self.engine.get_component_by_id(id) else {
            return false;
        };
        let Some(rect) = record
            .native_handle
            .and_then(|element| self.surface.bounding_rect(element))
        else {
            return false;
        };
        self.draw_highlight(
            rect,
            &record.label(self.selection.show_source_in_label, self.selection.label_max_len),
        );
        true
    }
}
