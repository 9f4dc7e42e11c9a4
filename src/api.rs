//! Boundary API consumed by the widget UIs.

pub mod commands;
