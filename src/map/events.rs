//! Session events and the listener registry.

use crate::core::{config::MapStyle, geo::Coordinate};
use crate::prelude::HashMap;
use std::collections::VecDeque;
use std::sync::Arc;

/// Events emitted by a map session
#[derive(Debug, Clone, PartialEq)]
pub enum SessionEvent {
    /// Map is loaded and accepts highlight requests
    Ready,
    /// Camera flew to a district and its marker was placed
    Highlighted { label: String, coordinate: Coordinate },
    /// Label did not resolve, map left untouched
    HighlightSkipped { label: String },
    /// Highlight arrived before the map was ready and was kept for later
    HighlightDeferred { label: String },
    StyleChanged { style: MapStyle },
    ViewReset { center: Coordinate },
    /// Session failed; the message is meant for the user
    Failed { message: String },
    Disposed,
}

impl SessionEvent {
    /// Name listeners subscribe with
    pub fn event_type(&self) -> &'static str {
        match self {
            SessionEvent::Ready => "ready",
            SessionEvent::Highlighted { .. } => "highlighted",
            SessionEvent::HighlightSkipped { .. } => "highlightskipped",
            SessionEvent::HighlightDeferred { .. } => "highlightdeferred",
            SessionEvent::StyleChanged { .. } => "stylechanged",
            SessionEvent::ViewReset { .. } => "viewreset",
            SessionEvent::Failed { .. } => "failed",
            SessionEvent::Disposed => "disposed",
        }
    }
}

/// Event listener callback type
pub type EventCallback = Arc<dyn Fn(&SessionEvent) + Send + Sync>;

/// A queued event paired with the listeners it goes to.
pub struct Dispatch {
    pub event: SessionEvent,
    callbacks: Vec<EventCallback>,
}

impl Dispatch {
    pub fn run(&self) {
        for callback in &self.callbacks {
            callback(&self.event);
        }
    }
}

/// Listener registry and event queue for a session.
///
/// Events are queued while the session holds its locks and dispatched
/// afterwards, so listeners may call back into the session.
#[derive(Default)]
pub struct EventManager {
    /// Event listeners by event type
    listeners: HashMap<String, Vec<EventCallback>>,
    /// Event queue for processing
    event_queue: VecDeque<SessionEvent>,
}

impl EventManager {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an event listener; `"*"` receives every event
    pub fn on<F>(&mut self, event_type: &str, callback: F)
    where
        F: Fn(&SessionEvent) + Send + Sync + 'static,
    {
        self.listeners
            .entry(event_type.to_string())
            .or_default()
            .push(Arc::new(callback));
    }

    /// Emit an event to the queue
    pub fn emit(&mut self, event: SessionEvent) {
        self.event_queue.push_back(event);
    }

    /// Drain the queue, pairing each event with its listeners
    pub fn take_dispatches(&mut self) -> Vec<Dispatch> {
        let events: Vec<_> = self.event_queue.drain(..).collect();

        events
            .into_iter()
            .map(|event| {
                let callbacks = [event.event_type(), "*"]
                    .iter()
                    .filter_map(|key| self.listeners.get(*key))
                    .flatten()
                    .cloned()
                    .collect();
                Dispatch { event, callbacks }
            })
            .collect()
    }

    /// Get number of pending events
    pub fn pending_events(&self) -> usize {
        self.event_queue.len()
    }
}
