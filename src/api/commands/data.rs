//! Keyed data command module

use serde_json::Value;
use tauri::State;

use crate::core::data::DataService;
use crate::shared::types::{LoadResult, SaveResult};
use crate::shared::AppResult;

#[tauri::command]
pub async fn save_data(
    service: State<'_, DataService>,
    key: String,
    data: Value,
) -> AppResult<SaveResult> {
    Ok(service.save_data(&key, data).await)
}

#[tauri::command]
pub async fn load_data(service: State<'_, DataService>, key: String) -> AppResult<LoadResult> {
    Ok(service.load_data(&key).await)
}
