//! Per-key trailing-edge debounce
//!
//! Each key has at most one pending job. Scheduling again before the delay
//! elapses replaces the pending job and restarts the delay.

use std::collections::HashMap;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tokio::runtime::Handle;
use tokio::task::JoinHandle;

struct Slot {
    generation: u64,
    task: JoinHandle<()>,
}

type Slots = Arc<Mutex<HashMap<String, Slot>>>;

#[derive(Clone)]
pub struct Debouncer {
    delay: Duration,
    runtime: Handle,
    slots: Slots,
    next_generation: Arc<AtomicU64>,
}

fn lock(slots: &Slots) -> MutexGuard<'_, HashMap<String, Slot>> {
    match slots.lock() {
        Ok(guard) => guard,
        Err(poisoned) => {
            tracing::warn!("debounce mutex poisoned, recovering");
            poisoned.into_inner()
        }
    }
}

impl Debouncer {
    pub fn new(delay: Duration, runtime: Handle) -> Self {
        Self {
            delay,
            runtime,
            slots: Arc::new(Mutex::new(HashMap::new())),
            next_generation: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Run `job` once `delay` has passed without another `schedule` for `key`.
    pub fn schedule<F, Fut>(&self, key: &str, job: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let generation = self.next_generation.fetch_add(1, Ordering::SeqCst);
        let slots = Arc::clone(&self.slots);
        let delay = self.delay;
        let owned_key = key.to_string();

        // Hold the lock across spawn so the task cannot observe its slot missing.
        let mut guard = lock(&self.slots);
        let task = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            {
                let mut guard = lock(&slots);
                match guard.get(&owned_key) {
                    Some(slot) if slot.generation == generation => {
                        guard.remove(&owned_key);
                    }
                    _ => return,
                }
            }
            job().await;
        });
        if let Some(previous) = guard.insert(key.to_string(), Slot { generation, task }) {
            previous.task.abort();
        }
    }

    /// Drop the pending job for `key`, if any. Returns whether one was pending.
    pub fn cancel(&self, key: &str) -> bool {
        match lock(&self.slots).remove(key) {
            Some(slot) => {
                slot.task.abort();
                true
            }
            None => false,
        }
    }

    pub fn cancel_all(&self) -> usize {
        let drained: Vec<Slot> = lock(&self.slots).drain().map(|(_, slot)| slot).collect();
        for slot in &drained {
            slot.task.abort();
        }
        drained.len()
    }

    #[cfg(test)]
    pub fn is_pending(&self, key: &str) -> bool {
        lock(&self.slots).contains_key(key)
    }

    #[cfg(test)]
    pub fn pending(&self) -> usize {
        lock(&self.slots).len()
    }
}
