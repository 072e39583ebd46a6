//! The serialized project document an editor saves and the compiler reads.
//!
//! The model is deliberately lenient: unknown fields are ignored, visual data
//! such as block positions is kept but never interpreted, and structural
//! problems (dangling connections, duplicate ids) survive parsing so that the
//! validator can report them all at once.

pub mod conversion;

pub use conversion::*;

use crate::error::ProjectError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Project {
    #[serde(default)]
    pub version: Option<String>,
    #[serde(default)]
    pub metadata: ProjectMetadata,
    #[serde(default)]
    pub manifest: Manifest,
    #[serde(default)]
    pub canvas: Canvas,
    /// Asset references (icons, images). Carried for editors.
    #[serde(default)]
    pub resources: Vec<Value>,
}

impl Project {
    pub fn from_json(json: &str) -> Result<Self, ProjectError> {
        serde_json::from_str(json).map_err(|e| ProjectError::JsonParseError(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String, ProjectError> {
        serde_json::to_string_pretty(self).map_err(|e| ProjectError::ConversionError(e.to_string()))
    }
}

/// Authoring information. Never affects compilation.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct ProjectMetadata {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub created: Option<String>,
    #[serde(default)]
    pub modified: Option<String>,
}

/// Application manifest consumed by the firmware build.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct Manifest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub appid: String,
    #[serde(default)]
    pub version: String,
    #[serde(default = "default_entry_point")]
    pub entry_point: String,
    /// Firmware subsystems the application depends on, such as `gui` or `storage`.
    #[serde(default)]
    pub requires: Vec<String>,
    #[serde(default)]
    pub stack_size: Option<u32>,
    #[serde(default)]
    pub icon: Option<String>,
}

fn default_entry_point() -> String {
    "app_main".to_string()
}

impl Default for Manifest {
    fn default() -> Self {
        Self {
            name: "New Flipper App".to_string(),
            appid: "new_flipper_app".to_string(),
            version: "1.0".to_string(),
            entry_point: default_entry_point(),
            requires: vec!["gui".to_string()],
            stack_size: Some(1024),
            icon: None,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct Canvas {
    #[serde(default)]
    pub blocks: Vec<BlockRecord>,
    #[serde(default)]
    pub connections: Vec<ConnectionRecord>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct BlockRecord {
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: String,
    #[serde(default)]
    pub properties: Map<String, Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

#[derive(Debug, Clone, Copy, PartialEq, Deserialize, Serialize)]
pub struct Position {
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConnectionRecord {
    pub from: EndpointRecord,
    pub to: EndpointRecord,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EndpointRecord {
    pub block: String,
    #[serde(alias = "connector")]
    pub port: String,
}
