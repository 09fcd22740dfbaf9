//! Hover, click and escape workflow on top of the hit-tester.
//!
//! The host feeds raw input into the session (`on_pointer_move`, `on_click`,
//! `on_key_down`, `on_resize`) and drives `on_animation_frame` once per
//! frame. Pointer moves are only recorded; the hit-test runs on the frame
//! tick, so there is at most one per frame.

use std::sync::Arc;

use fibertrace_config::SelectionConfig;
use fibertrace_protocols::{
    ComponentRecord, HighlightSurface, HostSurface, InputKind, ListenerId, Rect, SelectionError,
    SelectionListener,
};
use parking_lot::Mutex;
use tracing::{debug, info};

use crate::engine::Engine;

const INPUTS: [InputKind; 4] = [
    InputKind::PointerMove,
    InputKind::Click,
    InputKind::KeyDown,
    InputKind::Resize,
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Idle,
    Observing,
    Selected,
    Cancelled,
}

struct Inner {
    state: SessionState,
    listener: Option<Arc<dyn SelectionListener>>,
    subscriptions: Vec<ListenerId>,
    pending_point: Option<(f64, f64)>,
    hovered: Option<ComponentRecord>,
    geometry_dirty: bool,
}

impl Inner {
    fn new() -> Self {
        Self {
            state: SessionState::Idle,
            listener: None,
            subscriptions: Vec::new(),
            pending_point: None,
            hovered: None,
            geometry_dirty: false,
        }
    }

    /// Leave observation; returns the subscriptions to drop.
    fn teardown(&mut self, state: SessionState) -> Vec<ListenerId> {
        self.state = state;
        self.listener = None;
        self.pending_point = None;
        self.hovered = None;
        self.geometry_dirty = false;
        std::mem::take(&mut self.subscriptions)
    }
}

/// Work decided under the session lock and performed after releasing it.
enum Effect {
    Highlight(Arc<dyn SelectionListener>, ComponentRecord),
    HighlightCleared(Arc<dyn SelectionListener>),
    Draw(ComponentRecord),
    Erase,
    Select(Arc<dyn SelectionListener>, Option<ComponentRecord>),
    Unlisten(Vec<ListenerId>),
}

/// One interactive pick of a component.
pub struct SelectionSession {
    engine: Arc<Engine>,
    surface: Arc<dyn HostSurface>,
    highlight: Option<Arc<dyn HighlightSurface>>,
    config: SelectionConfig,
    inner: Mutex<Inner>,
}

impl SelectionSession {
    pub fn new(
        engine: Arc<Engine>,
        surface: Arc<dyn HostSurface>,
        highlight: Option<Arc<dyn HighlightSurface>>,
        config: SelectionConfig,
    ) -> Self {
        Self {
            engine,
            surface,
            highlight,
            config,
            inner: Mutex::new(Inner::new()),
        }
    }

    pub fn state(&self) -> SessionState {
        self.inner.lock().state
    }

    /// The record currently under the pointer, as of the last frame.
    pub fn hovered(&self) -> Option<ComponentRecord> {
        self.inner.lock().hovered.clone()
    }

    /// Begin observing pointer input.
    pub fn start(&self, listener: Arc<dyn SelectionListener>) -> Result<(), SelectionError> {
        if self.engine.is_disabled() {
            return Err(SelectionError::EngineDisabled);
        }
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Observing {
            return Err(SelectionError::AlreadyObserving);
        }
        inner.subscriptions = INPUTS.iter().map(|kind| self.surface.listen(*kind)).collect();
        inner.state = SessionState::Observing;
        inner.listener = Some(listener);
        inner.pending_point = None;
        inner.hovered = None;
        inner.geometry_dirty = false;
        info!("Selection session started");
        Ok(())
    }

    pub fn on_pointer_move(&self, x: f64, y: f64) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Observing {
            inner.pending_point = Some((x, y));
        }
    }

    /// Viewport geometry changed; the highlight is redrawn on the next frame.
    pub fn on_resize(&self) {
        let mut inner = self.inner.lock();
        if inner.state == SessionState::Observing {
            inner.geometry_dirty = true;
        }
    }

    /// Run at most one hit-test for the latest pointer position.
    pub fn on_animation_frame(&self) {
        let effects = {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Observing {
                return;
            }
            let Some(listener) = inner.listener.clone() else {
                return;
            };
            let mut effects = Vec::new();

            if let Some((x, y)) = inner.pending_point.take() {
                if !self.lands_on_overlay(x, y) {
                    let hit = self.engine.hit_test(self.surface.as_ref(), x, y);
                    let changed = hit.as_ref().map(|r| r.id) != inner.hovered.as_ref().map(|r| r.id);
                    if changed {
                        match &hit {
                            Some(record) => {
                                effects.push(Effect::Highlight(listener, record.clone()));
                                effects.push(Effect::Draw(record.clone()));
                            }
                            None => {
                                effects.push(Effect::HighlightCleared(listener));
                                effects.push(Effect::Erase);
                            }
                        }
                        inner.geometry_dirty = false;
                    }
                    inner.hovered = hit;
                }
            }

            if inner.geometry_dirty {
                inner.geometry_dirty = false;
                if let Some(record) = &inner.hovered {
                    effects.push(Effect::Draw(record.clone()));
                }
            }
            effects
        };
        self.apply(effects);
    }

    /// Select the component under the click. Clicks on the overlay or on
    /// empty space are ignored.
    pub fn on_click(&self, x: f64, y: f64) {
        let effects = {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Observing || self.lands_on_overlay(x, y) {
                return;
            }
            let Some(record) = self.engine.hit_test(self.surface.as_ref(), x, y) else {
                debug!(x, y, "Click hit no component");
                return;
            };
            let Some(listener) = inner.listener.clone() else {
                return;
            };
            let subscriptions = inner.teardown(SessionState::Selected);
            info!(id = %record.id, name = %record.display_name, "Component selected");
            vec![
                Effect::Unlisten(subscriptions),
                Effect::Erase,
                Effect::Select(listener, Some(record)),
            ]
        };
        self.apply(effects);
    }

    /// Escape cancels the session; other keys are ignored.
    pub fn on_key_down(&self, key: &str) {
        if key != "Escape" {
            return;
        }
        let effects = {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Observing {
                return;
            }
            let Some(listener) = inner.listener.clone() else {
                return;
            };
            let subscriptions = inner.teardown(SessionState::Cancelled);
            info!("Selection cancelled");
            vec![
                Effect::Unlisten(subscriptions),
                Effect::Erase,
                Effect::Select(listener, None),
            ]
        };
        self.apply(effects);
    }

    /// Programmatic selection while observing.
    pub fn select_component(&self, record: &ComponentRecord) -> Result<(), SelectionError> {
        let effects = {
            let mut inner = self.inner.lock();
            if inner.state != SessionState::Observing {
                return Err(SelectionError::NotObserving);
            }
            let Some(listener) = inner.listener.clone() else {
                return Err(SelectionError::NotObserving);
            };
            let subscriptions = inner.teardown(SessionState::Selected);
            vec![
                Effect::Unlisten(subscriptions),
                Effect::Erase,
                Effect::Select(listener, Some(record.clone())),
            ]
        };
        self.apply(effects);
        Ok(())
    }

    /// Tear down from any state without invoking the listener.
    pub fn stop(&self) {
        let effects = {
            let mut inner = self.inner.lock();
            let was_observing = inner.state == SessionState::Observing;
            let subscriptions = inner.teardown(SessionState::Idle);
            if !was_observing {
                return;
            }
            debug!("Selection session stopped");
            vec![Effect::Unlisten(subscriptions), Effect::Erase]
        };
        self.apply(effects);
    }

    fn lands_on_overlay(&self, x: f64, y: f64) -> bool {
        self.surface
            .element_at_point(x, y)
            .is_some_and(|element| self.surface.is_overlay(element))
    }

    fn highlight_rect(&self, record: &ComponentRecord) -> Option<Rect> {
        record
            .native_handle
            .and_then(|element| self.surface.bounding_rect(element))
    }

    fn apply(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::Highlight(listener, record) => listener.on_highlight(&record),
                Effect::HighlightCleared(listener) => listener.on_highlight_cleared(),
                Effect::Draw(record) => {
                    let Some(surface) = &self.highlight else {
                        continue;
                    };
                    match self.highlight_rect(&record) {
                        Some(rect) => surface.draw_highlight(
                            rect,
                            &record.label(self.config.show_source_in_label, self.config.label_max_len),
                        ),
                        None => surface.clear_highlight(),
                    }
                }
                Effect::Erase => {
                    if let Some(surface) = &self.highlight {
                        surface.clear_highlight();
                    }
                }
                Effect::Select(listener, record) => listener.on_select(record.as_ref()),
                Effect::Unlisten(subscriptions) => {
                    for id in subscriptions {
                        self.surface.unlisten(id);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[path = "selection_tests.rs"]
mod tests;
