use std::fmt;
use std::sync::Arc;

use arc_swap::ArcSwapOption;
use tracing::{trace, warn};

use crate::error::{BoxError, EventError, Result};
use crate::group::LockGroup;

/// A registered event handler.
///
/// Handlers are compared by identity: [`EventChannel::deregister`] only
/// clears the slot when given a clone of the registered `Arc`.
pub type Handler<E> = Arc<dyn Fn(&E) -> std::result::Result<(), BoxError> + Send + Sync>;

/// Wrap a closure as a [`Handler`].
pub fn handler<E, F>(f: F) -> Handler<E>
where
    F: Fn(&E) -> std::result::Result<(), BoxError> + Send + Sync + 'static,
{
    Arc::new(f)
}

// ArcSwapOption needs a sized pointee.
struct Slot<E> {
    handler: Handler<E>,
}

/// Named channel holding at most one handler.
pub struct EventChannel<E> {
    name: &'static str,
    slot: ArcSwapOption<Slot<E>>,
    group: Arc<LockGroup>,
}

impl<E> EventChannel<E> {
    pub fn new(name: &'static str, group: Arc<LockGroup>) -> Self {
        Self {
            name,
            slot: ArcSwapOption::empty(),
            group,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn group(&self) -> &Arc<LockGroup> {
        &self.group
    }

    pub fn is_registered(&self) -> bool {
        self.slot.load().is_some()
    }

    /// Install `handler`, replacing any existing one. Always returns `true`.
    pub fn register(&self, handler: Handler<E>) -> bool {
        let previous = self.slot.swap(Some(Arc::new(Slot { handler })));
        if previous.is_some() {
            warn!(channel = self.name, "replaced an already registered handler");
        }
        true
    }

    /// Clear the slot if `handler` is the registered one.
    pub fn deregister(&self, handler: &Handler<E>) -> bool {
        let current = self.slot.load();
        let matches = (*current)
            .as_ref()
            .is_some_and(|slot| Arc::ptr_eq(&slot.handler, handler));
        if !matches {
            return false;
        }

        let previous = self.slot.compare_and_swap(&current, None);
        match ((*previous).as_ref(), (*current).as_ref()) {
            (Some(prev), Some(cur)) => Arc::ptr_eq(prev, cur),
            _ => false,
        }
    }

    /// Remove whatever handler is registered.
    pub fn clear(&self) {
        self.slot.store(None);
    }

    /// Invoke the registered handler with `event`.
    ///
    /// Returns `Ok(false)` when no handler is registered, including one
    /// deregistered while this call waited for the group. The group lock is
    /// held for the duration of the call and released on every exit path.
    pub fn notify(&self, event: &E) -> Result<bool> {
        if self.slot.load().is_none() {
            return Ok(false);
        }

        let Some(_guard) = self.group.enter() else {
            return Err(EventError::ReentrantNotification {
                channel: self.name,
                group: self.group.name(),
            });
        };
        // Reload under the lock: the handler may have been deregistered while
        // this call waited on a sibling.
        let Some(slot) = self.slot.load_full() else {
            return Ok(false);
        };

        trace!(channel = self.name, "dispatching event");
        (slot.handler)(event).map_err(|source| EventError::Handler {
            channel: self.name,
            source,
        })?;
        Ok(true)
    }
}

impl<E> fmt::Debug for EventChannel<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventChannel")
            .field("name", &self.name)
            .field("group", &self.group.name())
            .field("registered", &self.is_registered())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn channel() -> EventChannel<u32> {
        EventChannel::new("test", Arc::new(LockGroup::new("group")))
    }

    #[test]
    fn empty_slot_notify_is_false() {
        let ch = channel();
        assert!(!ch.notify(&1).unwrap());
        assert!(!ch.group().is_held_by_current_thread());
    }

    #[test]
    fn register_and_notify() {
        let ch = channel();
        let seen = Arc::new(AtomicUsize::new(0));
        let sink = Arc::clone(&seen);
        assert!(ch.register(handler(move |v: &u32| {
            sink.fetch_add(*v as usize, Ordering::SeqCst);
            Ok(())
        })));

        assert!(ch.notify(&5).unwrap());
        assert_eq!(seen.load(Ordering::SeqCst), 5);
    }

    #[test]
    fn clear_empties_slot() {
        let ch = channel();
        ch.register(handler(|_: &u32| Ok(())));
        ch.clear();
        assert!(!ch.is_registered());
    }

    #[test]
    fn debug_shows_registration() {
        let ch = channel();
        assert!(format!("{ch:?}").contains("registered: false"));
    }
}
