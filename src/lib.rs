mod api;
mod config;
mod core;
mod shared;
mod system;

use std::sync::Arc;

use tauri::{AppHandle, Manager, RunEvent};
use tracing_subscriber::EnvFilter;

use crate::config::{HostConfig, MANAGER_LABEL};
use crate::core::data::{DataService, SettingsService};
use crate::core::lifecycle::{LifecycleSettings, WidgetLifecycle};
use crate::core::store::JsonStore;
use crate::core::visibility::{DesktopVisibilityMonitor, VisibilityTarget};
use crate::system::window::TauriWindowHost;

pub(crate) type AppLifecycle = WidgetLifecycle<TauriWindowHost>;
pub(crate) type AppSettingsService = SettingsService<TauriWindowHost>;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}

/// Stop deleting registrations on close and write every open widget once.
async fn shutdown(lifecycle: &AppLifecycle) {
    if lifecycle.begin_shutdown() {
        return;
    }
    if let Err(e) = lifecycle.persist_all_open_now().await {
        tracing::error!(error = %e, "failed to persist widgets before exit");
    }
}

/// Persist all open widgets, then exit the process.
pub(crate) async fn quit(app: &AppHandle) {
    if let Some(lifecycle) = app.try_state::<AppLifecycle>() {
        let lifecycle = lifecycle.inner().clone();
        shutdown(&lifecycle).await;
    }
    app.exit(0);
}

#[cfg_attr(mobile, tauri::mobile_entry_point)]
pub fn run() {
    init_tracing();

    let config = Arc::new(HostConfig::from_env());
    tracing::info!(
        mode = ?config.mode,
        store = %config.store_path.display(),
        "starting widget manager"
    );

    let setup_config = Arc::clone(&config);
    let app = tauri::Builder::default()
        .plugin(tauri_plugin_single_instance::init(|app, _argv, _cwd| {
            if let Some(manager) = app.get_webview_window(MANAGER_LABEL) {
                let _ = manager.show();
                let _ = manager.set_focus();
            }
        }))
        .setup(move |app| {
            let config = setup_config;
            let runtime = tauri::async_runtime::block_on(async { tokio::runtime::Handle::current() });

            let store = Arc::new(JsonStore::new(config.store_path.clone()));
            if let Err(e) = tauri::async_runtime::block_on(store.ensure_initialized()) {
                tracing::error!(error = %e, "failed to initialize widget store");
            }

            let host = TauriWindowHost::new(app.handle().clone(), Arc::clone(&config));
            let settings = tauri::async_runtime::block_on(SettingsService::load(
                Arc::clone(&store),
                host.clone(),
            ));
            host.create_manager_window()?;

            let lifecycle: AppLifecycle = WidgetLifecycle::new(
                host.clone(),
                Arc::clone(&store),
                runtime.clone(),
                LifecycleSettings::from(config.as_ref()),
            );
            lifecycle.set_all_visible(true);

            app.manage(lifecycle.clone());
            app.manage(DataService::new(Arc::clone(&store)));
            app.manage(settings);

            DesktopVisibilityMonitor::new(host, lifecycle.clone()).start(&runtime, config.display_poll);

            runtime.spawn(async move {
                lifecycle.restore_all().await;
            });

            Ok(())
        })
        .invoke_handler(tauri::generate_handler![
            api::commands::widgets::create_widget,
            api::commands::widgets::get_widget_info,
            api::commands::widgets::close_widget,
            api::commands::widgets::list_widgets,
            api::commands::widgets::close_app,
            api::commands::data::save_data,
            api::commands::data::load_data,
            api::commands::settings::update_settings,
            api::commands::settings::get_settings,
            api::commands::system::log_message,
        ])
        .build(tauri::generate_context!())
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "failed to build the widget manager");
            std::process::exit(1);
        });

    app.run(|app, event| {
        if let RunEvent::ExitRequested { .. } = event {
            if let Some(lifecycle) = app.try_state::<AppLifecycle>() {
                let lifecycle = lifecycle.inner().clone();
                tauri::async_runtime::block_on(shutdown(&lifecycle));
            }
        }
    });
}
