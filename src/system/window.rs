//! Tauri window host
//!
//! Builds the manager and widget webview windows and adapts them to the
//! core window traits.

use std::sync::Arc;

use tauri::{AppHandle, Manager, Monitor, WebviewUrl, WebviewWindow, WebviewWindowBuilder, WindowEvent};

use crate::config::{manager_window_config, HostConfig, LaunchTarget, MANAGER_LABEL};
use crate::core::visibility::{DisplayMetrics, DisplaySource};
use crate::core::window::{
    EventSink, SignalHandler, WidgetWindow, WidgetWindowRequest, WindowHost, WindowSignal,
};
use crate::shared::emit::emit_event;
use crate::shared::events::AppEvent;
use crate::shared::types::Bounds;
use crate::shared::{AppError, AppResult};

const WIDGET_LABEL_PREFIX: &str = "widget-";
const MANAGER_MARGIN_RIGHT: f64 = 370.0;
const MANAGER_MARGIN_TOP: f64 = 20.0;

/// Window label for a widget id. Labels only allow `a-zA-Z0-9-/:_`, so
/// every other byte (and `_` itself) is written as `_xx` hex, keeping
/// distinct ids on distinct labels.
pub fn widget_label(id: &str) -> String {
    let mut label = String::from(WIDGET_LABEL_PREFIX);
    for byte in id.bytes() {
        match byte {
            b'a'..=b'z' | b'A'..=b'Z' | b'0'..=b'9' | b'-' => label.push(char::from(byte)),
            _ => label.push_str(&format!("_{:02x}", byte)),
        }
    }
    label
}

fn webview_url(target: LaunchTarget) -> WebviewUrl {
    match target {
        LaunchTarget::Remote(url) => WebviewUrl::External(url),
        LaunchTarget::Bundled(path) => WebviewUrl::App(path.into()),
    }
}

#[derive(Clone)]
pub struct TauriWidgetWindow(WebviewWindow);

impl TauriWidgetWindow {
    pub fn new(window: WebviewWindow) -> Self {
        Self(window)
    }
}

impl WidgetWindow for TauriWidgetWindow {
    fn bounds(&self) -> AppResult<Bounds> {
        let scale = self.0.scale_factor()?;
        let position = self.0.outer_position()?.to_logical::<f64>(scale);
        let size = self.0.inner_size()?.to_logical::<f64>(scale);
        Ok(Bounds {
            x: position.x.round() as i32,
            y: position.y.round() as i32,
            width: size.width.round() as i32,
            height: size.height.round() as i32,
        })
    }

    fn show(&self) -> AppResult<()> {
        Ok(self.0.show()?)
    }

    fn hide(&self) -> AppResult<()> {
        Ok(self.0.hide()?)
    }

    fn close(&self) -> AppResult<()> {
        Ok(self.0.close()?)
    }
}

#[derive(Clone)]
pub struct TauriWindowHost {
    app: AppHandle,
    config: Arc<HostConfig>,
}

impl TauriWindowHost {
    pub fn new(app: AppHandle, config: Arc<HostConfig>) -> Self {
        Self { app, config }
    }

    fn primary_monitor(&self) -> AppResult<Monitor> {
        self.app
            .primary_monitor()?
            .ok_or_else(|| AppError::System("No primary monitor found".to_string()))
    }

    /// Create the manager window in the top-right corner of the primary
    /// display. Closing it quits the application.
    pub fn create_manager_window(&self) -> AppResult<WebviewWindow> {
        if let Some(existing) = self.app.get_webview_window(MANAGER_LABEL) {
            return Ok(existing);
        }

        let config = manager_window_config();
        let url = webview_url(self.config.launch_target(None));
        let mut builder = WebviewWindowBuilder::new(&self.app, MANAGER_LABEL, url)
            .title(&config.title)
            .inner_size(config.width, config.height)
            .resizable(config.resizable)
            .transparent(true)
            .decorations(false)
            .shadow(false)
            .skip_taskbar(true)
            .always_on_top(false)
            .focused(true);

        match self.work_area() {
            Ok(area) => {
                builder = builder.position(
                    area.width as f64 - MANAGER_MARGIN_RIGHT,
                    MANAGER_MARGIN_TOP,
                );
            }
            Err(e) => {
                tracing::warn!(error = %e, "work area unavailable; centering manager");
                builder = builder.center();
            }
        }

        let window = builder.build()?;
        let app = self.app.clone();
        window.on_window_event(move |event| {
            if let WindowEvent::CloseRequested { api, .. } = event {
                api.prevent_close();
                tracing::info!("manager closed; quitting");
                let app = app.clone();
                tauri::async_runtime::spawn(async move {
                    crate::quit(&app).await;
                });
            }
        });
        tracing::info!(label = MANAGER_LABEL, "manager window created");
        Ok(window)
    }
}

impl EventSink for TauriWindowHost {
    fn broadcast(&self, event: &AppEvent) -> AppResult<()> {
        emit_event(&self.app, event)
    }
}

impl WindowHost for TauriWindowHost {
    type Window = TauriWidgetWindow;

    fn open_widget(
        &self,
        request: &WidgetWindowRequest,
        on_signal: SignalHandler,
    ) -> AppResult<TauriWidgetWindow> {
        let label = widget_label(&request.id);
        if self.app.get_webview_window(&label).is_some() {
            return Err(AppError::Window(format!("Window {} already exists", label)));
        }

        let url = webview_url(self.config.launch_target(Some((request.kind, &request.id))));
        let bounds = request.bounds;
        let window = WebviewWindowBuilder::new(&self.app, &label, url)
            .title(&request.config.title)
            .inner_size(bounds.width as f64, bounds.height as f64)
            .position(bounds.x as f64, bounds.y as f64)
            .resizable(request.config.resizable)
            .transparent(true)
            .decorations(false)
            .shadow(false)
            .skip_taskbar(true)
            .always_on_top(false)
            .focused(true)
            .build()?;

        window.on_window_event(move |event| match event {
            WindowEvent::Moved(_) => on_signal(WindowSignal::Moved),
            WindowEvent::Resized(_) => on_signal(WindowSignal::Resized),
            WindowEvent::Destroyed => on_signal(WindowSignal::Closed),
            _ => {}
        });

        tracing::debug!(%label, kind = %request.kind, "widget window built");
        Ok(TauriWidgetWindow::new(window))
    }

    fn work_area(&self) -> AppResult<Bounds> {
        let monitor = self.primary_monitor()?;
        Ok(logical_work_area(&monitor))
    }

    fn manager_window(&self) -> Option<TauriWidgetWindow> {
        self.app
            .get_webview_window(MANAGER_LABEL)
            .map(TauriWidgetWindow::new)
    }
}

impl DisplaySource for TauriWindowHost {
    fn displays(&self) -> AppResult<Vec<DisplayMetrics>> {
        Ok(self
            .app
            .available_monitors()?
            .iter()
            .map(|monitor| {
                let scale = monitor.scale_factor();
                let position = monitor.position().to_logical::<f64>(scale);
                let size = monitor.size().to_logical::<f64>(scale);
                DisplayMetrics {
                    bounds: Bounds {
                        x: position.x.round() as i32,
                        y: position.y.round() as i32,
                        width: size.width.round() as i32,
                        height: size.height.round() as i32,
                    },
                    work_area: logical_work_area(monitor),
                }
            })
            .collect())
    }
}

fn logical_work_area(monitor: &Monitor) -> Bounds {
    let scale = monitor.scale_factor();
    let area = monitor.work_area();
    let position = area.position.to_logical::<f64>(scale);
    let size = area.size.to_logical::<f64>(scale);
    Bounds {
        x: position.x.round() as i32,
        y: position.y.round() as i32,
        width: size.width.round() as i32,
        height: size.height.round() as i32,
    }
}
