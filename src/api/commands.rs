//! Command modules for Tauri application
//!
//! Commands are grouped by concern, one submodule each (no mod.rs pattern).
//!
//! - `widgets`: create, inspect, list and close widget windows; quit
//! - `data`: keyed data shared by all widgets
//! - `settings`: global appearance settings
//! - `system`: logging from the UIs

pub mod data;
pub mod settings;
pub mod system;
pub mod widgets;
