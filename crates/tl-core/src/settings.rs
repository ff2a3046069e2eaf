//! Visual settings parsed from the host's configuration blob
//!
//! The host stores property-pane values as JSON objects keyed by object name.
//! Only the `timeline` object is read; anything else in the blob is ignored.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Errors raised while reading the configuration blob
#[derive(Error, Debug)]
pub enum SettingsError {
    #[error("Invalid timeline settings: {0}")]
    Invalid(#[from] serde_json::Error),

    #[error("Configuration blob is not an object")]
    NotAnObject,
}

/// Where the time axis is drawn relative to the items
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AxisOrientation {
    #[default]
    Top,
    Bottom,
}

impl AxisOrientation {
    pub fn as_str(&self) -> &'static str {
        match self {
            AxisOrientation::Top => "top",
            AxisOrientation::Bottom => "bottom",
        }
    }
}

/// Options governing how the surface lays out items
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RenderOptions {
    /// Offset overlapping items in the same lane onto separate levels
    pub stack_items: bool,

    /// Start of the initially visible window; fitted to the items when absent
    pub view_start: Option<DateTime<Utc>>,

    /// End of the initially visible window; fitted to the items when absent
    pub view_end: Option<DateTime<Utc>>,

    /// Minimal spacing between stacked items
    pub item_margin: f32,

    /// Minimal spacing between items and the axis
    pub axis_margin: f32,

    pub orientation: AxisOrientation,

    /// Whether items may be dragged. Not wired to any persistence.
    pub editable: bool,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            stack_items: false,
            view_start: None,
            view_end: None,
            item_margin: 10.0,
            axis_margin: 5.0,
            orientation: AxisOrientation::Top,
            editable: true,
        }
    }
}

/// All settings the visual reads from the host
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisualSettings {
    pub timeline: RenderOptions,
}

impl VisualSettings {
    /// Parse the host's configuration blob; an absent blob yields defaults
    pub fn parse(config: Option<&Value>) -> Result<Self, SettingsError> {
        match config {
            None | Some(Value::Null) => Ok(Self::default()),
            Some(value @ Value::Object(_)) => Ok(Self::deserialize(value)?),
            Some(_) => Err(SettingsError::NotAnObject),
        }
    }

    /// Serialize back into the blob shape the host persists
    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
