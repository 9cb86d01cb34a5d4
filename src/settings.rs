//! Functions for loading renderer and scene settings.

use crate::errors::*;

/// Configurations of the render side: the state cache and the draw stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererSettings {
    /// The number of texture units that the state cache tracks. Snapshots that bind
    /// more units are rejected.
    pub max_texture_units: usize,
    /// The initial capacity of command queue.
    pub queue_capacity: usize,
    /// Checks every cache entry against the snapshot after it has been applied.
    pub verify_cache: bool,
}

impl Default for RendererSettings {
    fn default() -> Self {
        RendererSettings {
            max_texture_units: 8,
            queue_capacity: 256,
            verify_cache: cfg!(debug_assertions),
        }
    }
}

impl RendererSettings {
    /// Parses settings from a JSON document, missing fields fall back to defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| Error::Settings(format!("{}", err)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SceneSettings {
    /// The initial capacity of pending change list.
    pub pending_capacity: usize,
}

impl Default for SceneSettings {
    fn default() -> Self {
        SceneSettings {
            pending_capacity: 64,
        }
    }
}

impl SceneSettings {
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|err| Error::Settings(format!("{}", err)))
    }
}
