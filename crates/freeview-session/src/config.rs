//! JSON configuration for a viewer session.

use std::{fs, path::Path};

use freeview_anchor::{AnchorParams, EnforcerParams};
use freeview_core::DisplayMode;
use freeview_gesture::GestureParams;
use serde::{Deserialize, Serialize};

#[derive(thiserror::Error, Debug)]
pub enum ConfigIoError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// All tunables of a session. Missing fields take their defaults.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    pub anchor: AnchorParams,
    pub gesture: GestureParams,
    pub enforcer: EnforcerParams,
    /// Display mode a fresh coordinator starts in.
    pub initial_mode: DisplayMode,
}

impl ViewerConfig {
    /// Load a JSON config from disk.
    pub fn load_json(path: impl AsRef<Path>) -> Result<Self, ConfigIoError> {
        let raw = fs::read_to_string(path)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Write this config to disk as pretty JSON.
    pub fn write_json(&self, path: impl AsRef<Path>) -> Result<(), ConfigIoError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }
}
