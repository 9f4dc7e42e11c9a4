//! System integration
//!
//! Tauri-backed implementations of the core window traits.

pub mod window;
