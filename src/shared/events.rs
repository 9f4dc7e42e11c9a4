use super::settings::GlobalSettings;

/// Events the host pushes to every window.
#[derive(Debug, Clone, PartialEq)]
pub enum AppEvent {
    SettingsUpdated(GlobalSettings),
    DesktopVisibilityChanged(bool),
}

impl AppEvent {
    /// Name the UIs subscribe to.
    pub fn name(&self) -> &'static str {
        match self {
            AppEvent::SettingsUpdated(_) => "settings-updated",
            AppEvent::DesktopVisibilityChanged(_) => "desktop://visibility",
        }
    }
}
