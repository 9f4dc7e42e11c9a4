//! Settings command module
//!
//! Handles global appearance settings shared by every window.

use serde_json::{Map, Value};
use tauri::State;

use crate::shared::types::{LoadResult, SaveResult};
use crate::shared::AppResult;
use crate::AppSettingsService;

/// Merge a partial settings object, persist it and broadcast the result
#[tauri::command]
pub async fn update_settings(
    service: State<'_, AppSettingsService>,
    settings: Map<String, Value>,
) -> AppResult<SaveResult> {
    match service.update(&settings).await {
        Ok(_) => Ok(SaveResult::ok()),
        Err(e) => {
            tracing::warn!(error = %e, "settings update rejected");
            Ok(SaveResult::failed(e))
        }
    }
}

/// Get current settings
#[tauri::command]
pub async fn get_settings(service: State<'_, AppSettingsService>) -> AppResult<LoadResult> {
    let settings = service.get().await;
    Ok(LoadResult {
        success: true,
        data: settings.to_value(),
        error: None,
    })
}
