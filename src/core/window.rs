//! Window abstractions
//!
//! The lifecycle logic talks to windows only through these traits so it can
//! run against the Tauri host in the app and a fake host in tests.

use std::sync::Arc;

use crate::config::WindowConfig;
use crate::shared::events::AppEvent;
use crate::shared::types::{Bounds, WidgetKind};
use crate::shared::AppResult;

/// Native notifications a widget window forwards to the lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowSignal {
    Moved,
    Resized,
    Closed,
}

pub type SignalHandler = Arc<dyn Fn(WindowSignal) + Send + Sync>;

/// A live widget window.
pub trait WidgetWindow: Clone + Send + Sync + 'static {
    /// Current outer position and inner size in logical pixels.
    fn bounds(&self) -> AppResult<Bounds>;
    fn show(&self) -> AppResult<()>;
    fn hide(&self) -> AppResult<()>;
    /// Ask the window to close; a `Closed` signal follows.
    fn close(&self) -> AppResult<()>;
}

/// Everything needed to open one widget window.
#[derive(Debug, Clone)]
pub struct WidgetWindowRequest {
    pub id: String,
    pub kind: WidgetKind,
    pub bounds: Bounds,
    pub config: WindowConfig,
}

/// Broadcast channel to every open window.
pub trait EventSink: Send + Sync + 'static {
    fn broadcast(&self, event: &AppEvent) -> AppResult<()>;
}

pub trait WindowHost: EventSink {
    type Window: WidgetWindow;

    /// Open a transparent, frameless widget window. `on_signal` receives its
    /// move, resize and close notifications.
    fn open_widget(
        &self,
        request: &WidgetWindowRequest,
        on_signal: SignalHandler,
    ) -> AppResult<Self::Window>;

    /// Usable area of the primary display.
    fn work_area(&self) -> AppResult<Bounds>;

    fn manager_window(&self) -> Option<Self::Window>;
}
