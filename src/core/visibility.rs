//! Desktop visibility monitor
//!
//! Hides every managed window while something covers a whole display and
//! shows them again once it goes away. Displays are polled; the windows are
//! only toggled when the display snapshot actually changes.

use std::sync::Mutex;
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

use crate::shared::types::Bounds;
use crate::shared::AppResult;

/// Geometry of one display, logical pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DisplayMetrics {
    pub bounds: Bounds,
    pub work_area: Bounds,
}

pub trait DisplaySource: Send + Sync + 'static {
    fn displays(&self) -> AppResult<Vec<DisplayMetrics>>;
}

pub trait VisibilityTarget: Send + Sync + 'static {
    fn set_all_visible(&self, visible: bool);
}

/// A top-level window owned by some process, as seen by a window enumerator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignWindow {
    pub title: String,
    pub fullscreen: bool,
    /// Window belongs to this host.
    pub managed: bool,
}

/// Obscured when a display has no reserved area left (no menu bar, dock or
/// taskbar), which is what a fullscreen window looks like from here.
pub fn desktop_obscured(displays: &[DisplayMetrics]) -> bool {
    displays.iter().any(|d| {
        d.bounds.width == d.work_area.width && d.bounds.height == d.work_area.height
    })
}

/// Obscured when any window not owned by this host is fullscreen.
pub fn desktop_obscured_by_windows(windows: &[ForeignWindow]) -> bool {
    windows.iter().any(|w| !w.managed && w.fullscreen)
}

pub struct DesktopVisibilityMonitor<D, T> {
    source: D,
    target: T,
    last: Mutex<Option<Vec<DisplayMetrics>>>,
}

impl<D: DisplaySource, T: VisibilityTarget> DesktopVisibilityMonitor<D, T> {
    pub fn new(source: D, target: T) -> Self {
        Self {
            source,
            target,
            last: Mutex::new(None),
        }
    }

    /// Sample the displays once. The first sample only records a baseline;
    /// later samples re-evaluate visibility when the metrics changed.
    /// Returns the visibility that was applied, if any.
    pub fn poll(&self) -> Option<bool> {
        let displays = match self.source.displays() {
            Ok(displays) => displays,
            Err(e) => {
                tracing::debug!(error = %e, "display metrics unavailable");
                return None;
            }
        };

        {
            let mut last = match self.last.lock() {
                Ok(guard) => guard,
                Err(poisoned) => poisoned.into_inner(),
            };
            let baseline = last.is_none();
            if last.as_ref() == Some(&displays) {
                return None;
            }
            *last = Some(displays.clone());
            if baseline {
                return None;
            }
        }

        let visible = !desktop_obscured(&displays);
        tracing::info!(visible, displays = displays.len(), "display metrics changed");
        self.target.set_all_visible(visible);
        Some(visible)
    }

    pub fn start(self, runtime: &Handle, interval: Duration) -> JoinHandle<()> {
        runtime.spawn(async move {
            tracing::info!(interval_ms = interval.as_millis() as u64, "desktop visibility monitor started");
            loop {
                self.poll();
                tokio::time::sleep(interval).await;
            }
        })
    }
}
