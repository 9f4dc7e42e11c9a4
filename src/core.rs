//! Core module
//!
//! Widget lifecycle and persistence, independent of the windowing toolkit.
//!
//! - `store`: the shared JSON document on disk
//! - `lifecycle`: creates, tracks, restores and closes widget windows
//! - `visibility`: hides everything while the desktop is covered
//! - `data`: keyed data and global settings

pub mod data;
pub mod debounce;
pub mod lifecycle;
pub mod registry;
pub mod store;
pub mod visibility;
pub mod window;

#[cfg(test)]
pub mod testing;
