//! In-memory map of open widget windows.
//!
//! An id is present exactly while its window is open; the persisted
//! registrations live in the store and may outlive the window.

use std::collections::BTreeMap;
use std::sync::{Mutex, MutexGuard};

use crate::shared::types::{OpenWidget, WidgetKind};

#[derive(Debug, Clone)]
pub struct RegisteredWidget<W> {
    pub id: String,
    pub kind: WidgetKind,
    pub window: W,
}

pub struct WindowRegistry<W> {
    widgets: Mutex<BTreeMap<String, RegisteredWidget<W>>>,
}

impl<W: Clone> WindowRegistry<W> {
    pub fn new() -> Self {
        Self {
            widgets: Mutex::new(BTreeMap::new()),
        }
    }

    fn guard(&self) -> MutexGuard<'_, BTreeMap<String, RegisteredWidget<W>>> {
        match self.widgets.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::warn!("window registry mutex poisoned, recovering");
                poisoned.into_inner()
            }
        }
    }

    /// Returns the entry previously registered under the same id.
    pub fn insert(&self, id: &str, kind: WidgetKind, window: W) -> Option<RegisteredWidget<W>> {
        self.guard().insert(
            id.to_string(),
            RegisteredWidget {
                id: id.to_string(),
                kind,
                window,
            },
        )
    }

    pub fn remove(&self, id: &str) -> Option<RegisteredWidget<W>> {
        self.guard().remove(id)
    }

    pub fn get(&self, id: &str) -> Option<RegisteredWidget<W>> {
        self.guard().get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.guard().contains_key(id)
    }

    pub fn snapshot(&self) -> Vec<RegisteredWidget<W>> {
        self.guard().values().cloned().collect()
    }

    pub fn open_widgets(&self) -> Vec<OpenWidget> {
        self.guard()
            .values()
            .map(|w| OpenWidget {
                id: w.id.clone(),
                kind: w.kind,
            })
            .collect()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }
}

impl<W: Clone> Default for WindowRegistry<W> {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_and_remove_track_open_ids() {
        let registry = WindowRegistry::new();
        assert!(registry.insert("a", WidgetKind::Todo, 1u8).is_none());
        assert!(registry.insert("b", WidgetKind::Notes, 2u8).is_none());

        assert!(registry.contains("a"));
        assert_eq!(registry.get("b").map(|w| w.window), Some(2));
        assert_eq!(registry.len(), 2);

        assert_eq!(registry.remove("a").map(|w| w.kind), Some(WidgetKind::Todo));
        assert!(registry.remove("a").is_none());
        assert!(!registry.contains("a"));
    }

    #[test]
    fn open_widgets_lists_ids_in_order() {
        let registry = WindowRegistry::new();
        registry.insert("2", WidgetKind::Timer, ());
        registry.insert("1", WidgetKind::Calendar, ());

        let open = registry.open_widgets();
        assert_eq!(
            open,
            vec![
                OpenWidget { id: "1".into(), kind: WidgetKind::Calendar },
                OpenWidget { id: "2".into(), kind: WidgetKind::Timer },
            ]
        );
    }
}
