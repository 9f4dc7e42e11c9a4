//! In-memory window host for exercising the core without a display.

use std::collections::{BTreeMap, HashSet};
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::window::{
    EventSink, SignalHandler, WidgetWindow, WidgetWindowRequest, WindowHost, WindowSignal,
};
use crate::shared::events::AppEvent;
use crate::shared::types::{Bounds, WidgetKind};
use crate::shared::{AppError, AppResult};

struct FakeWindowState {
    kind: Option<WidgetKind>,
    bounds: Mutex<Bounds>,
    visible: AtomicBool,
    closed: AtomicBool,
    handler: Option<SignalHandler>,
}

#[derive(Clone)]
pub struct FakeWindow(Arc<FakeWindowState>);

impl FakeWindow {
    fn new(kind: Option<WidgetKind>, bounds: Bounds, handler: Option<SignalHandler>) -> Self {
        Self(Arc::new(FakeWindowState {
            kind,
            bounds: Mutex::new(bounds),
            visible: AtomicBool::new(true),
            closed: AtomicBool::new(false),
            handler,
        }))
    }

    fn notify(&self, signal: WindowSignal) {
        if let Some(handler) = &self.0.handler {
            handler(signal);
        }
    }

    pub fn kind(&self) -> WidgetKind {
        self.0.kind.unwrap_or(WidgetKind::Todo)
    }

    pub fn current_bounds(&self) -> Bounds {
        *self.0.bounds.lock().unwrap()
    }

    pub fn is_visible(&self) -> bool {
        self.0.visible.load(Ordering::SeqCst)
    }

    pub fn is_closed(&self) -> bool {
        self.0.closed.load(Ordering::SeqCst)
    }

    /// Simulate the user dragging the window.
    pub fn move_to(&self, x: i32, y: i32) {
        {
            let mut bounds = self.0.bounds.lock().unwrap();
            bounds.x = x;
            bounds.y = y;
        }
        self.notify(WindowSignal::Moved);
    }

    pub fn set_bounds_silently(&self, bounds: Bounds) {
        *self.0.bounds.lock().unwrap() = bounds;
    }
}

impl WidgetWindow for FakeWindow {
    fn bounds(&self) -> AppResult<Bounds> {
        if self.is_closed() {
            return Err(AppError::Window("window is closed".into()));
        }
        Ok(self.current_bounds())
    }

    fn show(&self) -> AppResult<()> {
        self.0.visible.store(true, Ordering::SeqCst);
        Ok(())
    }

    fn hide(&self) -> AppResult<()> {
        self.0.visible.store(false, Ordering::SeqCst);
        Ok(())
    }

    fn close(&self) -> AppResult<()> {
        if !self.0.closed.swap(true, Ordering::SeqCst) {
            self.notify(WindowSignal::Closed);
        }
        Ok(())
    }
}

struct FakeHostState {
    windows: Mutex<BTreeMap<String, FakeWindow>>,
    opened: Mutex<usize>,
    failing: Mutex<HashSet<String>>,
    broadcasts: Mutex<Vec<AppEvent>>,
    work_area: Bounds,
    manager: FakeWindow,
}

#[derive(Clone)]
pub struct FakeHost(Arc<FakeHostState>);

impl FakeHost {
    pub fn new() -> Self {
        Self(Arc::new(FakeHostState {
            windows: Mutex::new(BTreeMap::new()),
            opened: Mutex::new(0),
            failing: Mutex::new(HashSet::new()),
            broadcasts: Mutex::new(Vec::new()),
            work_area: Bounds {
                x: 0,
                y: 25,
                width: 1440,
                height: 875,
            },
            manager: FakeWindow::new(None, Bounds::default(), None),
        }))
    }

    /// Make `open_widget` fail for this id.
    pub fn fail_for(&self, id: &str) {
        self.0.failing.lock().unwrap().insert(id.to_string());
    }

    /// Most recent window opened for `id`.
    pub fn window(&self, id: &str) -> Option<FakeWindow> {
        self.0.windows.lock().unwrap().get(id).cloned()
    }

    pub fn opened_count(&self) -> usize {
        *self.0.opened.lock().unwrap()
    }

    pub fn manager(&self) -> FakeWindow {
        self.0.manager.clone()
    }

    pub fn broadcasts(&self) -> Vec<AppEvent> {
        self.0.broadcasts.lock().unwrap().clone()
    }
}

impl EventSink for FakeHost {
    fn broadcast(&self, event: &AppEvent) -> AppResult<()> {
        self.0.broadcasts.lock().unwrap().push(event.clone());
        Ok(())
    }
}

impl WindowHost for FakeHost {
    type Window = FakeWindow;

    fn open_widget(
        &self,
        request: &WidgetWindowRequest,
        on_signal: SignalHandler,
    ) -> AppResult<FakeWindow> {
        if self.0.failing.lock().unwrap().contains(&request.id) {
            return Err(AppError::Window(format!("cannot open {}", request.id)));
        }
        let window = FakeWindow::new(Some(request.kind), request.bounds, Some(on_signal));
        self.0
            .windows
            .lock()
            .unwrap()
            .insert(request.id.clone(), window.clone());
        *self.0.opened.lock().unwrap() += 1;
        Ok(window)
    }

    fn work_area(&self) -> AppResult<Bounds> {
        Ok(self.0.work_area)
    }

    fn manager_window(&self) -> Option<FakeWindow> {
        Some(self.0.manager.clone())
    }
}

/// Poll `check` until it holds, failing the test after two seconds.
pub async fn wait_until<F, Fut>(mut check: F)
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + Duration::from_secs(2);
    while !check().await {
        assert!(tokio::time::Instant::now() < deadline, "condition not reached in time");
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
}
