//! Notifications for the UI collaborator.

use freeview_core::{DisplayMode, Structure};
use serde::Serialize;

/// Fire-and-forget notifications consumed by the UI.
///
/// Implementations must not call back into the coordinator; nothing they do
/// feeds back into session state.
pub trait UiSink {
    fn structure_activated(&mut self, structure: Structure);
    fn mode_changed(&mut self, mode: DisplayMode);
    fn status_changed(&mut self, text: &str, emphasized: bool);
}

/// Sink that drops everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullUi;

impl UiSink for NullUi {
    fn structure_activated(&mut self, _structure: Structure) {}
    fn mode_changed(&mut self, _mode: DisplayMode) {}
    fn status_changed(&mut self, _text: &str, _emphasized: bool) {}
}

/// One recorded notification.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum UiEvent {
    StructureActivated { structure: Structure },
    ModeChanged { mode: DisplayMode },
    StatusChanged { text: String, emphasized: bool },
}

/// Sink that keeps every notification, in order.
#[derive(Clone, Debug, Default)]
pub struct RecordingUi {
    pub events: Vec<UiEvent>,
}

impl RecordingUi {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `structure_activated` notifications received.
    pub fn activations(&self) -> usize {
        self.events
            .iter()
            .filter(|e| matches!(e, UiEvent::StructureActivated { .. }))
            .count()
    }

    /// The most recent status text, if any.
    pub fn last_status(&self) -> Option<&str> {
        self.events.iter().rev().find_map(|e| match e {
            UiEvent::StatusChanged { text, .. } => Some(text.as_str()),
            _ => None,
        })
    }
}

impl UiSink for RecordingUi {
    fn structure_activated(&mut self, structure: Structure) {
        self.events.push(UiEvent::StructureActivated { structure });
    }

    fn mode_changed(&mut self, mode: DisplayMode) {
        self.events.push(UiEvent::ModeChanged { mode });
    }

    fn status_changed(&mut self, text: &str, emphasized: bool) {
        self.events.push(UiEvent::StatusChanged {
            text: text.to_owned(),
            emphasized,
        });
    }
}

impl<U: UiSink + ?Sized> UiSink for &mut U {
    fn structure_activated(&mut self, structure: Structure) {
        (**self).structure_activated(structure);
    }

    fn mode_changed(&mut self, mode: DisplayMode) {
        (**self).mode_changed(mode);
    }

    fn status_changed(&mut self, text: &str, emphasized: bool) {
        (**self).status_changed(text, emphasized);
    }
}
