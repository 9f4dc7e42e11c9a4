//! Widget lifecycle and persistence coordinator
//!
//! Creates widget windows, tracks them in the [`WindowRegistry`], and keeps
//! their registrations in the [`JsonStore`] in step with what is on screen:
//! upsert on create, debounced bounds on move/resize, removal on close.

use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Weak};
use std::time::Duration;

use rand::Rng;
use tokio::runtime::Handle;

use super::debounce::Debouncer;
use super::registry::WindowRegistry;
use super::store::JsonStore;
use super::visibility::VisibilityTarget;
use super::window::{
    SignalHandler, WidgetWindow, WidgetWindowRequest, WindowHost, WindowSignal,
};
use crate::config::{get_window_config, HostConfig};
use crate::shared::events::AppEvent;
use crate::shared::types::{
    Bounds, CreateWidgetOptions, OpenWidget, WidgetKind, WidgetRegistration,
};
use crate::shared::AppResult;

/// Used when the work area cannot be queried.
const FALLBACK_WORK_AREA: Bounds = Bounds {
    x: 0,
    y: 0,
    width: 1280,
    height: 800,
};

#[derive(Debug, Clone, Copy)]
pub struct LifecycleSettings {
    pub bounds_debounce: Duration,
    /// Also drop `data["<prefix>-<id>"]` when a widget is closed.
    pub purge_data_on_close: bool,
}

impl From<&HostConfig> for LifecycleSettings {
    fn from(config: &HostConfig) -> Self {
        Self {
            bounds_debounce: config.bounds_debounce,
            purge_data_on_close: config.purge_data_on_close,
        }
    }
}

/// Timestamp ids, strictly increasing within the process.
struct IdGenerator {
    last: AtomicI64,
}

impl IdGenerator {
    fn new() -> Self {
        Self {
            last: AtomicI64::new(0),
        }
    }

    fn next(&self, taken: impl Fn(&str) -> bool) -> String {
        loop {
            let now = chrono::Utc::now().timestamp_millis();
            let previous = match self
                .last
                .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |prev| Some(now.max(prev + 1)))
            {
                Ok(prev) | Err(prev) => prev,
            };
            let id = now.max(previous + 1).to_string();
            if !taken(&id) {
                return id;
            }
        }
    }
}

struct Inner<H: WindowHost> {
    host: H,
    store: Arc<JsonStore>,
    registry: WindowRegistry<H::Window>,
    debouncer: Debouncer,
    runtime: Handle,
    ids: IdGenerator,
    shutting_down: AtomicBool,
    purge_data_on_close: bool,
}

pub struct WidgetLifecycle<H: WindowHost> {
    inner: Arc<Inner<H>>,
}

impl<H: WindowHost> Clone for WidgetLifecycle<H> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<H: WindowHost> WidgetLifecycle<H> {
    pub fn new(host: H, store: Arc<JsonStore>, runtime: Handle, settings: LifecycleSettings) -> Self {
        Self {
            inner: Arc::new(Inner {
                host,
                store,
                registry: WindowRegistry::new(),
                debouncer: Debouncer::new(settings.bounds_debounce, runtime.clone()),
                runtime,
                ids: IdGenerator::new(),
                shutting_down: AtomicBool::new(false),
                purge_data_on_close: settings.purge_data_on_close,
            }),
        }
    }

    #[cfg(test)]
    pub fn host(&self) -> &H {
        &self.inner.host
    }

    pub fn open_widgets(&self) -> Vec<OpenWidget> {
        self.inner.registry.open_widgets()
    }

    #[cfg(test)]
    pub fn is_open(&self, id: &str) -> bool {
        self.inner.registry.contains(id)
    }

    pub fn is_shutting_down(&self) -> bool {
        self.inner.shutting_down.load(Ordering::SeqCst)
    }

    /// Open a widget window and return its id.
    ///
    /// An id that is already open is shown again instead of opening a
    /// second window. Generated ids are unique among open widgets and
    /// stored registrations. The store write happens in the background.
    pub async fn create_widget(&self, kind: WidgetKind, options: CreateWidgetOptions) -> AppResult<String> {
        let requested_id = options.id.clone().filter(|id| !id.is_empty());
        if let Some(existing) = requested_id.as_deref().and_then(|id| self.inner.registry.get(id)) {
            tracing::debug!(id = %existing.id, "widget already open");
            existing.window.show()?;
            return Ok(existing.id);
        }

        let id = match requested_id {
            Some(id) => id,
            None => {
                let stored = self.inner.store.read().await;
                self.inner.ids.next(|candidate| {
                    self.inner.registry.contains(candidate) || stored.widget(candidate).is_some()
                })
            }
        };

        let config = get_window_config(kind);
        let hint = options.bounds.unwrap_or_default();
        let width = hint.width.or(options.width).map(floor_extent).unwrap_or(config.width as i32);
        let height = hint.height.or(options.height).map(floor_extent).unwrap_or(config.height as i32);
        let (x, y) = match (hint.x, hint.y) {
            (Some(x), Some(y)) if x.is_finite() && y.is_finite() => (x.floor() as i32, y.floor() as i32),
            _ => self.random_position(width, height),
        };
        let bounds = Bounds { x, y, width, height };

        let request = WidgetWindowRequest {
            id: id.clone(),
            kind,
            bounds,
            config,
        };
        let window = self.inner.host.open_widget(&request, self.signal_handler(&id))?;
        self.inner.registry.insert(&id, kind, window);
        tracing::info!(%id, %kind, ?bounds, "widget opened");

        let inner = Arc::clone(&self.inner);
        let task_id = id.clone();
        self.inner.runtime.spawn(async move {
            upsert_registration(&inner, &task_id, kind, bounds).await;
        });

        Ok(id)
    }

    /// Close a widget's window. Unknown ids are ignored.
    pub fn close_widget(&self, id: &str) -> AppResult<()> {
        match self.inner.registry.get(id) {
            Some(entry) => {
                tracing::debug!(%id, "closing widget");
                entry.window.close()
            }
            None => {
                tracing::debug!(%id, "close requested for unknown widget");
                Ok(())
            }
        }
    }

    /// Reopen every stored widget that is not already open. Returns how
    /// many windows were created.
    pub async fn restore_all(&self) -> usize {
        let document = self.inner.store.read().await;
        let mut restored = 0;
        for registration in &document.widgets {
            if self.inner.registry.contains(&registration.id) {
                continue;
            }
            match self.create_widget(registration.kind, CreateWidgetOptions::restore(registration)).await {
                Ok(_) => restored += 1,
                Err(e) => tracing::error!(
                    id = %registration.id,
                    kind = %registration.kind,
                    error = %e,
                    "failed to restore widget"
                ),
            }
        }
        tracing::info!(restored, stored = document.widgets.len(), "widgets restored");
        restored
    }

    /// Write the current bounds of every open widget in one store update.
    pub async fn persist_all_open_now(&self) -> AppResult<usize> {
        let registrations: Vec<WidgetRegistration> = self
            .inner
            .registry
            .snapshot()
            .into_iter()
            .filter_map(|entry| match entry.window.bounds() {
                Ok(bounds) => Some(WidgetRegistration {
                    id: entry.id,
                    kind: entry.kind,
                    bounds,
                }),
                Err(e) => {
                    tracing::warn!(id = %entry.id, error = %e, "skipping widget with unreadable bounds");
                    None
                }
            })
            .collect();

        let count = registrations.len();
        self.inner
            .store
            .update(move |document| {
                for registration in registrations {
                    document.upsert_widget(registration);
                }
                true
            })
            .await?;
        tracing::info!(count, "open widgets persisted");
        Ok(count)
    }

    /// From now on closing windows keeps their registrations. Returns
    /// `true` if shutdown had already begun.
    pub fn begin_shutdown(&self) -> bool {
        let already = self.inner.shutting_down.swap(true, Ordering::SeqCst);
        if !already {
            let cancelled = self.inner.debouncer.cancel_all();
            tracing::info!(cancelled, "shutdown started");
        }
        already
    }

    fn signal_handler(&self, id: &str) -> SignalHandler {
        let weak: Weak<Inner<H>> = Arc::downgrade(&self.inner);
        let id = id.to_string();
        Arc::new(move |signal| {
            if let Some(inner) = weak.upgrade() {
                WidgetLifecycle { inner }.on_signal(&id, signal);
            }
        })
    }

    fn on_signal(&self, id: &str, signal: WindowSignal) {
        match signal {
            WindowSignal::Moved | WindowSignal::Resized => self.schedule_bounds_persist(id),
            WindowSignal::Closed => self.on_closed(id),
        }
    }

    fn schedule_bounds_persist(&self, id: &str) {
        if self.is_shutting_down() {
            return;
        }
        let inner = Arc::clone(&self.inner);
        let owned_id = id.to_string();
        self.inner.debouncer.schedule(id, move || async move {
            persist_bounds(&inner, &owned_id).await;
        });
    }

    fn on_closed(&self, id: &str) {
        self.inner.debouncer.cancel(id);
        let Some(entry) = self.inner.registry.remove(id) else {
            return;
        };
        tracing::info!(%id, kind = %entry.kind, "widget closed");

        if self.is_shutting_down() {
            return;
        }

        let store = Arc::clone(&self.inner.store);
        let purge = self.inner.purge_data_on_close;
        let data_key = entry.kind.data_key(id);
        let id = id.to_string();
        self.inner.runtime.spawn(async move {
            let result = store
                .update(|document| {
                    let removed = document.remove_widget(&id).is_some();
                    let purged = purge && document.data.remove(&data_key).is_some();
                    removed || purged
                })
                .await;
            if let Err(e) = result {
                tracing::error!(%id, error = %e, "failed to remove widget registration");
            }
        });
    }

    fn random_position(&self, width: i32, height: i32) -> (i32, i32) {
        let area = self.inner.host.work_area().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "work area unavailable; using fallback");
            FALLBACK_WORK_AREA
        });
        let mut rng = rand::thread_rng();
        let x = area.x + rng.gen_range(0..=(area.width - width).max(0));
        let y = area.y + rng.gen_range(0..=(area.height - height).max(0));
        (x, y)
    }
}

impl<H: WindowHost> VisibilityTarget for WidgetLifecycle<H> {
    fn set_all_visible(&self, visible: bool) {
        let windows = self
            .inner
            .host
            .manager_window()
            .into_iter()
            .chain(self.inner.registry.snapshot().into_iter().map(|entry| entry.window));
        for window in windows {
            let result = if visible { window.show() } else { window.hide() };
            if let Err(e) = result {
                tracing::warn!(visible, error = %e, "failed to toggle window visibility");
            }
        }
        tracing::info!(visible, widgets = self.inner.registry.len(), "widget visibility toggled");

        if let Err(e) = self.inner.host.broadcast(&AppEvent::DesktopVisibilityChanged(visible)) {
            tracing::warn!(error = %e, "failed to broadcast visibility change");
        }
    }
}

fn floor_extent(value: f64) -> i32 {
    if value.is_finite() {
        (value.floor() as i32).max(1)
    } else {
        1
    }
}

/// Store the registration written right after a window opens. Skipped if
/// the window closed before the store was reached.
async fn upsert_registration<H: WindowHost>(inner: &Arc<Inner<H>>, id: &str, kind: WidgetKind, requested: Bounds) {
    let bounds = match inner.registry.get(id) {
        Some(entry) => entry.window.bounds().unwrap_or(requested),
        None => return,
    };
    let registration = WidgetRegistration {
        id: id.to_string(),
        kind,
        bounds,
    };
    let result = inner
        .store
        .update(|document| {
            if !inner.registry.contains(id) {
                return false;
            }
            document.upsert_widget(registration);
            true
        })
        .await;
    if let Err(e) = result {
        tracing::error!(%id, error = %e, "failed to store widget registration");
    }
}

/// Debounced bounds write. Only touches an existing registration of a
/// widget that is still open.
async fn persist_bounds<H: WindowHost>(inner: &Arc<Inner<H>>, id: &str) {
    let Some(entry) = inner.registry.get(id) else {
        return;
    };
    let bounds = match entry.window.bounds() {
        Ok(bounds) => bounds,
        Err(e) => {
            tracing::warn!(%id, error = %e, "failed to read widget bounds");
            return;
        }
    };
    let result = inner
        .store
        .update(|document| {
            if !inner.registry.contains(id) {
                return false;
            }
            match document.widget_mut(id) {
                Some(registration) if registration.bounds != bounds => {
                    registration.bounds = bounds;
                    true
                }
                _ => false,
            }
        })
        .await;
    match result {
        Ok(true) => tracing::debug!(%id, ?bounds, "widget bounds persisted"),
        Ok(false) => {}
        Err(e) => tracing::error!(%id, error = %e, "failed to persist widget bounds"),
    }
}
