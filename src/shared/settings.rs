use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

use super::error::{AppError, AppResult};

/// Reserved `data` key holding the persisted global settings.
pub const SETTINGS_KEY: &str = "__settings";

const DEFAULT_BACKGROUND_COLOR: &str = "#0f172a80";
const DEFAULT_FONT_COLOR: &str = "#ffffff";

/// Appearance settings shared by every window.
///
/// Keys the host does not know about are carried in `extra` so a UI can
/// extend the settings object without a host release. A colour set to
/// `null` or any non-string value falls back to its default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GlobalSettings {
    #[serde(default = "default_background_color", deserialize_with = "background_color_or_default")]
    pub background_color: String,
    #[serde(default = "default_font_color", deserialize_with = "font_color_or_default")]
    pub font_color: String,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

fn default_background_color() -> String {
    DEFAULT_BACKGROUND_COLOR.to_string()
}

fn default_font_color() -> String {
    DEFAULT_FONT_COLOR.to_string()
}

fn color_or(value: Value, default: &str) -> String {
    match value {
        Value::String(color) => color,
        _ => default.to_string(),
    }
}

fn background_color_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(|value| color_or(value, DEFAULT_BACKGROUND_COLOR))
}

fn font_color_or_default<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    Value::deserialize(deserializer).map(|value| color_or(value, DEFAULT_FONT_COLOR))
}

impl Default for GlobalSettings {
    fn default() -> Self {
        Self {
            background_color: default_background_color(),
            font_color: default_font_color(),
            extra: Map::new(),
        }
    }
}

impl GlobalSettings {
    /// Settings as persisted under [`SETTINGS_KEY`], layered over the defaults.
    pub fn from_stored(value: &Value) -> Self {
        let mut settings = Self::default();
        match value.as_object() {
            Some(stored) => {
                if let Err(e) = settings.merge(stored) {
                    tracing::warn!(error = %e, "stored settings are invalid; using defaults");
                    return Self::default();
                }
            }
            None => tracing::warn!(%value, "stored settings are not an object; using defaults"),
        }
        settings
    }

    /// Shallow-merge `partial` over the current values. On error `self` is left untouched.
    pub fn merge(&mut self, partial: &Map<String, Value>) -> AppResult<()> {
        let mut merged = match self.to_value() {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        merged.extend(partial.iter().map(|(k, v)| (k.clone(), v.clone())));

        let next: GlobalSettings = serde_json::from_value(Value::Object(merged))
            .map_err(|e| AppError::Validation(format!("Invalid settings: {}", e)))?;
        *self = next;
        Ok(())
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or_else(|_| Value::Object(Map::new()))
    }
}
