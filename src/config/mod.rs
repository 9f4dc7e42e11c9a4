//! Window configuration registry and host configuration
//!
//! Centralized window configuration per widget kind, plus the process-level
//! settings (run mode, store location, timings) read from the environment.

use std::path::PathBuf;
use std::time::Duration;

use directories::ProjectDirs;
use url::Url;

use crate::shared::types::{WidgetInfo, WidgetKind};

pub const MANAGER_LABEL: &str = "manager";
pub const STORE_FILE_NAME: &str = "storage.json";
pub const DEFAULT_DEV_URL: &str = "http://localhost:5173";
pub const BOUNDS_DEBOUNCE: Duration = Duration::from_millis(250);
pub const DISPLAY_POLL_INTERVAL: Duration = Duration::from_millis(1000);

const ENV_MODE: &str = "WIDGET_MANAGER_ENV";
const ENV_DEV_URL: &str = "WIDGET_MANAGER_DEV_URL";
const ENV_STORE: &str = "WIDGET_MANAGER_STORE";
const ENV_PURGE_ON_CLOSE: &str = "WIDGET_MANAGER_PURGE_ON_CLOSE";

/// Window configuration for a widget or the manager
#[derive(Debug, Clone, PartialEq)]
pub struct WindowConfig {
    pub width: f64,
    pub height: f64,
    pub title: String,
    pub resizable: bool,
}

impl WindowConfig {
    pub fn new(width: f64, height: f64, title: impl Into<String>) -> Self {
        Self {
            width,
            height,
            title: title.into(),
            resizable: true,
        }
    }
}

/// Default window for each widget kind
pub fn get_window_config(kind: WidgetKind) -> WindowConfig {
    match kind {
        WidgetKind::Todo => WindowConfig::new(350.0, 500.0, "Todo List"),
        WidgetKind::Calendar => WindowConfig::new(600.0, 700.0, "Calendar"),
        WidgetKind::Notes => WindowConfig::new(320.0, 400.0, "Notes"),
        WidgetKind::Timer => WindowConfig::new(550.0, 400.0, "Timer"),
    }
}

pub fn manager_window_config() -> WindowConfig {
    WindowConfig {
        resizable: false,
        ..WindowConfig::new(350.0, 350.0, "Desktop Widgets")
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    Development,
    Production,
}

/// Where a window loads its UI from.
#[derive(Debug, Clone, PartialEq)]
pub enum LaunchTarget {
    /// Dev server URL, query included.
    Remote(Url),
    /// Path inside the bundled frontend, query included.
    Bundled(String),
}

#[derive(Debug, Clone)]
pub struct HostConfig {
    pub mode: RunMode,
    pub dev_url: Url,
    pub store_path: PathBuf,
    pub bounds_debounce: Duration,
    pub display_poll: Duration,
    pub purge_data_on_close: bool,
}

impl HostConfig {
    pub fn from_env() -> Self {
        Self::from_vars(|key| std::env::var(key).ok(), cfg!(debug_assertions))
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>, debug_build: bool) -> Self {
        let mode = match var(ENV_MODE).as_deref() {
            Some("development") => RunMode::Development,
            Some("production") => RunMode::Production,
            _ if debug_build => RunMode::Development,
            _ => RunMode::Production,
        };

        let dev_url = var(ENV_DEV_URL)
            .and_then(|raw| match Url::parse(&raw) {
                Ok(url) => Some(url),
                Err(err) => {
                    tracing::warn!(?err, %raw, "invalid dev server URL; using default");
                    None
                }
            })
            .unwrap_or_else(default_dev_url);

        let store_path = var(ENV_STORE)
            .filter(|path| !path.is_empty())
            .map(PathBuf::from)
            .unwrap_or_else(|| default_store_path(mode));

        let purge_data_on_close = matches!(
            var(ENV_PURGE_ON_CLOSE).as_deref(),
            Some("1") | Some("true")
        );

        Self {
            mode,
            dev_url,
            store_path,
            bounds_debounce: BOUNDS_DEBOUNCE,
            display_poll: DISPLAY_POLL_INTERVAL,
            purge_data_on_close,
        }
    }

    /// Load target for a window; widgets carry `type` and `id` in the query.
    pub fn launch_target(&self, widget: Option<(WidgetKind, &str)>) -> LaunchTarget {
        match self.mode {
            RunMode::Development => {
                let mut url = self.dev_url.clone();
                if let Some((kind, id)) = widget {
                    url.query_pairs_mut()
                        .append_pair("type", kind.as_str())
                        .append_pair("id", id);
                }
                LaunchTarget::Remote(url)
            }
            RunMode::Production => match widget {
                Some((kind, id)) => {
                    let query = url::form_urlencoded::Serializer::new(String::new())
                        .append_pair("type", kind.as_str())
                        .append_pair("id", id)
                        .finish();
                    LaunchTarget::Bundled(format!("index.html?{}", query))
                }
                None => LaunchTarget::Bundled("index.html".to_string()),
            },
        }
    }
}

fn default_dev_url() -> Url {
    Url::parse(DEFAULT_DEV_URL).expect("default dev URL is valid")
}

fn default_store_path(mode: RunMode) -> PathBuf {
    if mode == RunMode::Development {
        return std::env::current_dir()
            .unwrap_or_else(|_| PathBuf::from("."))
            .join(STORE_FILE_NAME);
    }
    match ProjectDirs::from("com", "antigravity", "widget-manager") {
        Some(dirs) => dirs.data_dir().join(STORE_FILE_NAME),
        None => {
            tracing::warn!("failed to determine data directory; storing next to the executable");
            PathBuf::from(STORE_FILE_NAME)
        }
    }
}

/// Recover `{type, id}` from the URL a window was launched with.
pub fn widget_info_from_url(url: &Url) -> WidgetInfo {
    let mut info = WidgetInfo::default();
    for (key, value) in url.query_pairs() {
        match key.as_ref() {
            "type" => info.kind = value.parse().ok(),
            "id" if !value.is_empty() => info.id = Some(value.into_owned()),
            _ => {}
        }
    }
    info
}
