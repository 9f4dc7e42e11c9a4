//! System integration command module
//!
//! Handles logging forwarded from the widget UIs.

use crate::shared::types::LogRequest;
use crate::shared::AppResult;

/// Log a message from the frontend
#[tauri::command]
pub async fn log_message(request: LogRequest) -> AppResult<()> {
    let message = request.message;
    match request.level.to_ascii_lowercase().as_str() {
        "error" => tracing::error!(target: "frontend", "{}", message),
        "warn" | "warning" => tracing::warn!(target: "frontend", "{}", message),
        "debug" => tracing::debug!(target: "frontend", "{}", message),
        "trace" => tracing::trace!(target: "frontend", "{}", message),
        _ => tracing::info!(target: "frontend", "{}", message),
    }
    Ok(())
}
