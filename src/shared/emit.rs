use tauri::{AppHandle, Emitter};

use super::error::AppResult;
use super::events::AppEvent;

/// Emit an application event to all windows
pub fn emit_event(app: &AppHandle, event: &AppEvent) -> AppResult<()> {
    // Bare payloads: same shape `get_settings` returns.
    match event {
        AppEvent::SettingsUpdated(settings) => app.emit(event.name(), settings)?,
        AppEvent::DesktopVisibilityChanged(visible) => app.emit(event.name(), visible)?,
    }
    tracing::debug!(event = event.name(), "event broadcast");
    Ok(())
}
