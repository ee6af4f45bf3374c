use std::thread::{self, ThreadId};

use parking_lot::{Mutex, MutexGuard};

/// Mutual-exclusion domain shared by a set of event channels.
///
/// Tracks the owning thread so a nested acquisition can be refused instead of
/// deadlocking.
#[derive(Debug)]
pub struct LockGroup {
    name: &'static str,
    gate: Mutex<()>,
    owner: Mutex<Option<ThreadId>>,
}

impl LockGroup {
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            gate: Mutex::new(()),
            owner: Mutex::new(None),
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the calling thread currently holds this group.
    pub fn is_held_by_current_thread(&self) -> bool {
        *self.owner.lock() == Some(thread::current().id())
    }

    /// Acquire the group, or `None` if the calling thread already holds it.
    pub(crate) fn enter(&self) -> Option<GroupGuard<'_>> {
        if self.is_held_by_current_thread() {
            return None;
        }
        let gate = self.gate.lock();
        *self.owner.lock() = Some(thread::current().id());
        Some(GroupGuard {
            group: self,
            _gate: gate,
        })
    }
}

/// Held while a handler runs. Dropping it (including during unwinding)
/// clears the owner before the gate is released.
pub(crate) struct GroupGuard<'a> {
    group: &'a LockGroup,
    _gate: MutexGuard<'a, ()>,
}

impl Drop for GroupGuard<'_> {
    fn drop(&mut self) {
        *self.group.owner.lock() = None;
    }
}
