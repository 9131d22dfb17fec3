//! Display-refresh driven scheduling.
//!
//! A [`DisplayLink`] stands in for the platform's vsync signal: the host calls
//! [`DisplayLink::fire`] once per refresh and every registered callback runs
//! with that frame's render timestamp. Registrations are owned by the
//! [`FrameSubscription`] handle; dropping it deregisters the callback, so a
//! torn-down view can never leave a callback behind.

use std::cell::RefCell;
use std::rc::{Rc, Weak};

use crate::Millis;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameControl {
    Continue,
    Stop,
}

type FrameCallback = Box<dyn FnMut(Millis) -> FrameControl>;

struct Entry {
    id: u64,
    /// Taken out while the callback runs.
    callback: Option<FrameCallback>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    entries: Vec<Entry>,
}

impl Registry {
    fn take(&mut self, id: u64) -> Option<Entry> {
        let index = self.entries.iter().position(|entry| entry.id == id)?;
        Some(self.entries.remove(index))
    }
}

#[derive(Clone, Default)]
pub struct DisplayLink {
    registry: Rc<RefCell<Registry>>,
}

impl DisplayLink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<F>(&self, callback: F) -> FrameSubscription
    where
        F: FnMut(Millis) -> FrameControl + 'static,
    {
        let mut registry = self.registry.borrow_mut();
        let id = registry.next_id;
        registry.next_id += 1;
        registry.entries.push(Entry {
            id,
            callback: Some(Box::new(callback)),
        });
        FrameSubscription {
            id,
            registry: Rc::downgrade(&self.registry),
        }
    }

    /// Number of live registrations.
    pub fn active_count(&self) -> usize {
        self.registry.borrow().entries.len()
    }

    /// Runs one refresh. Callbacks may register or drop subscriptions while
    /// running; those changes take effect from the next refresh.
    /// Returns how many callbacks ran.
    pub fn fire(&self, render_ms: Millis) -> usize {
        let ids: Vec<u64> = self.registry.borrow().entries.iter().map(|e| e.id).collect();
        let mut ran = 0;

        for id in ids {
            let callback = {
                let mut registry = self.registry.borrow_mut();
                let taken = registry
                    .entries
                    .iter_mut()
                    .find(|entry| entry.id == id)
                    .and_then(|entry| entry.callback.take());
                taken
            };
            let Some(mut callback) = callback else {
                continue;
            };

            let control = callback(render_ms);
            ran += 1;

            let mut registry = self.registry.borrow_mut();
            match control {
                FrameControl::Continue => {
                    if let Some(entry) = registry.entries.iter_mut().find(|entry| entry.id == id) {
                        entry.callback = Some(callback);
                    }
                }
                FrameControl::Stop => {
                    registry.take(id);
                }
            }
        }
        ran
    }
}

/// Handle for one registered frame callback. Dropping it cancels the callback.
pub struct FrameSubscription {
    id: u64,
    registry: Weak<RefCell<Registry>>,
}

impl FrameSubscription {
    /// Still registered: not dropped and the callback has not returned `Stop`.
    pub fn is_active(&self) -> bool {
        let Some(registry) = self.registry.upgrade() else {
            return false;
        };
        let registered = registry.borrow().entries.iter().any(|entry| entry.id == self.id);
        registered
    }

    pub fn cancel(self) {}
}

impl Drop for FrameSubscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            // The entry is dropped after the borrow ends; its callback may own
            // other subscriptions.
            let removed = registry
                .try_borrow_mut()
                .ok()
                .and_then(|mut registry| registry.take(self.id));
            drop(removed);
        }
    }
}
