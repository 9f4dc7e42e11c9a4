use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use ts_rs::TS;

use super::error::AppError;

/// The four widget kinds a window can be launched as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
#[ts(export, export_to = "bindings.ts")]
pub enum WidgetKind {
    Todo,
    Calendar,
    Notes,
    Timer,
}

impl WidgetKind {
    pub const ALL: [WidgetKind; 4] = [
        WidgetKind::Todo,
        WidgetKind::Calendar,
        WidgetKind::Notes,
        WidgetKind::Timer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            WidgetKind::Todo => "todo",
            WidgetKind::Calendar => "calendar",
            WidgetKind::Notes => "notes",
            WidgetKind::Timer => "timer",
        }
    }

    /// Prefix the widget UIs use for their keyed data entries.
    fn data_prefix(&self) -> &'static str {
        match self {
            WidgetKind::Todo => "todos",
            WidgetKind::Calendar => "calendar",
            WidgetKind::Notes => "notes",
            WidgetKind::Timer => "timer",
        }
    }

    /// Deterministic `data` key for a widget instance, e.g. `todos-1712345678901`.
    pub fn data_key(&self, id: &str) -> String {
        format!("{}-{}", self.data_prefix(), id)
    }
}

impl fmt::Display for WidgetKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WidgetKind {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        WidgetKind::ALL
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| AppError::Validation(format!("Unknown widget type: {}", s)))
    }
}

/// Window rectangle in logical screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct Bounds {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

/// Persisted record linking a widget id to its type and last known bounds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct WidgetRegistration {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
    pub bounds: Bounds,
}

/// The whole on-disk document: registrations plus the keyed blob store.
///
/// Both fields are required; a document missing either is treated as corrupt.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct StoreDocument {
    pub widgets: Vec<WidgetRegistration>,
    pub data: Map<String, Value>,
}

impl StoreDocument {
    pub fn widget(&self, id: &str) -> Option<&WidgetRegistration> {
        self.widgets.iter().find(|w| w.id == id)
    }

    pub fn widget_mut(&mut self, id: &str) -> Option<&mut WidgetRegistration> {
        self.widgets.iter_mut().find(|w| w.id == id)
    }

    /// Replace the registration with the same id in place, or append it.
    /// Returns `true` when an existing entry was replaced.
    pub fn upsert_widget(&mut self, registration: WidgetRegistration) -> bool {
        match self.widget_mut(&registration.id) {
            Some(existing) => {
                *existing = registration;
                true
            }
            None => {
                self.widgets.push(registration);
                false
            }
        }
    }

    pub fn remove_widget(&mut self, id: &str) -> Option<WidgetRegistration> {
        let index = self.widgets.iter().position(|w| w.id == id)?;
        Some(self.widgets.remove(index))
    }
}

/// Partial geometry a caller may pass when creating a widget.
///
/// Numbers arrive from the UI as JSON numbers and are floored to integers.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings.ts")]
pub struct BoundsHint {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl From<Bounds> for BoundsHint {
    fn from(bounds: Bounds) -> Self {
        Self {
            x: Some(bounds.x as f64),
            y: Some(bounds.y as f64),
            width: Some(bounds.width as f64),
            height: Some(bounds.height as f64),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings.ts")]
pub struct CreateWidgetOptions {
    /// Explicit id, used when restoring a widget from the store.
    pub id: Option<String>,
    pub bounds: Option<BoundsHint>,
    pub width: Option<f64>,
    pub height: Option<f64>,
}

impl CreateWidgetOptions {
    pub fn restore(registration: &WidgetRegistration) -> Self {
        Self {
            id: Some(registration.id.clone()),
            bounds: Some(registration.bounds.into()),
            ..Self::default()
        }
    }
}

/// What a window learns about itself from its launch URL.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct WidgetInfo {
    #[serde(rename = "type")]
    pub kind: Option<WidgetKind>,
    pub id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct OpenWidget {
    pub id: String,
    #[serde(rename = "type")]
    pub kind: WidgetKind,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct SaveResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

impl SaveResult {
    pub fn ok() -> Self {
        Self {
            success: true,
            error: None,
        }
    }

    pub fn failed(error: impl fmt::Display) -> Self {
        Self {
            success: false,
            error: Some(error.to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct LoadResult {
    pub success: bool,
    /// Stored value, or `null` when the key is absent.
    #[ts(type = "unknown")]
    pub data: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub error: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings.ts")]
pub struct LogRequest {
    pub level: String,
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn registration(id: &str, kind: WidgetKind, x: i32) -> WidgetRegistration {
        WidgetRegistration {
            id: id.to_string(),
            kind,
            bounds: Bounds {
                x,
                y: 10,
                width: 300,
                height: 400,
            },
        }
    }

    #[test]
    fn widget_kind_uses_lowercase_names() {
        assert_eq!(serde_json::to_value(WidgetKind::Calendar).unwrap(), json!("calendar"));
        assert_eq!("notes".parse::<WidgetKind>().unwrap(), WidgetKind::Notes);
        assert!("clock".parse::<WidgetKind>().is_err());
    }

    #[test]
    fn data_keys_match_widget_ui_prefixes() {
        assert_eq!(WidgetKind::Todo.data_key("42"), "todos-42");
        assert_eq!(WidgetKind::Calendar.data_key("42"), "calendar-42");
        assert_eq!(WidgetKind::Notes.data_key("42"), "notes-42");
        assert_eq!(WidgetKind::Timer.data_key("42"), "timer-42");
    }

    #[test]
    fn upsert_replaces_in_place() {
        let mut doc = StoreDocument::default();
        assert!(!doc.upsert_widget(registration("a", WidgetKind::Todo, 1)));
        assert!(!doc.upsert_widget(registration("b", WidgetKind::Timer, 2)));
        assert!(doc.upsert_widget(registration("a", WidgetKind::Notes, 99)));

        assert_eq!(doc.widgets.len(), 2);
        assert_eq!(doc.widgets[0].id, "a");
        assert_eq!(doc.widgets[0].kind, WidgetKind::Notes);
        assert_eq!(doc.widgets[0].bounds.x, 99);
    }

    #[test]
    fn remove_widget_keeps_order_of_the_rest() {
        let mut doc = StoreDocument::default();
        doc.upsert_widget(registration("a", WidgetKind::Todo, 1));
        doc.upsert_widget(registration("b", WidgetKind::Todo, 2));
        doc.upsert_widget(registration("c", WidgetKind::Todo, 3));

        assert!(doc.remove_widget("b").is_some());
        assert!(doc.remove_widget("missing").is_none());
        let ids: Vec<_> = doc.widgets.iter().map(|w| w.id.as_str()).collect();
        assert_eq!(ids, ["a", "c"]);
    }

    #[test]
    fn document_requires_both_sections() {
        assert!(serde_json::from_value::<StoreDocument>(json!({ "widgets": [] })).is_err());
        assert!(serde_json::from_value::<StoreDocument>(json!({ "data": {} })).is_err());
        let doc: StoreDocument = serde_json::from_value(json!({
            "widgets": [{ "id": "a", "type": "todo", "bounds": { "x": 1, "y": 2, "width": 3, "height": 4 } }],
            "data": { "todos-a": [] }
        }))
        .unwrap();
        assert_eq!(doc.widgets[0].kind, WidgetKind::Todo);
        assert!(doc.data.contains_key("todos-a"));
    }

    #[test]
    fn create_options_accept_camel_case_payload() {
        let options: CreateWidgetOptions =
            serde_json::from_value(json!({ "width": 350, "height": 500 })).unwrap();
        assert_eq!(options.width, Some(350.0));
        assert!(options.id.is_none());

        let restored = CreateWidgetOptions::restore(&registration("a", WidgetKind::Todo, 7));
        assert_eq!(restored.id.as_deref(), Some("a"));
        assert_eq!(restored.bounds.and_then(|b| b.x), Some(7.0));
    }

    #[test]
    fn save_result_omits_missing_error() {
        assert_eq!(serde_json::to_value(SaveResult::ok()).unwrap(), json!({ "success": true }));
        assert_eq!(
            serde_json::to_value(SaveResult::failed("disk full")).unwrap(),
            json!({ "success": false, "error": "disk full" })
        );
    }
}
