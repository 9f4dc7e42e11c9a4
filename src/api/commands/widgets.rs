//! Widget window command module
//!
//! Handles creating, inspecting and closing widget windows, and quitting.

use tauri::{AppHandle, State, WebviewWindow};

use crate::config::widget_info_from_url;
use crate::shared::types::{CreateWidgetOptions, OpenWidget, WidgetInfo, WidgetKind};
use crate::shared::AppResult;
use crate::AppLifecycle;

/// Open a new widget window (or show it again if `options.id` is open)
#[tauri::command]
pub async fn create_widget(
    lifecycle: State<'_, AppLifecycle>,
    widget_type: String,
    options: Option<CreateWidgetOptions>,
) -> AppResult<String> {
    let kind: WidgetKind = widget_type.parse()?;
    let id = lifecycle.create_widget(kind, options.unwrap_or_default()).await?;
    Ok(id)
}

/// `{type, id}` of the calling window, read from its launch URL
#[tauri::command]
pub fn get_widget_info(window: WebviewWindow) -> AppResult<WidgetInfo> {
    let url = window.url()?;
    let info = widget_info_from_url(&url);
    tracing::debug!(label = window.label(), ?info, "widget info requested");
    Ok(info)
}

#[tauri::command]
pub fn close_widget(lifecycle: State<'_, AppLifecycle>, id: String) -> AppResult<()> {
    lifecycle.close_widget(&id)
}

/// Widgets currently open
#[tauri::command]
pub fn list_widgets(lifecycle: State<'_, AppLifecycle>) -> Vec<OpenWidget> {
    lifecycle.open_widgets()
}

/// Persist every open widget, then exit
#[tauri::command]
pub async fn close_app(app: AppHandle) -> AppResult<()> {
    crate::quit(&app).await;
    Ok(())
}
