//! The single outstanding-exchange slot.

use std::time::{Duration, Instant};

use crossbeam_channel::{bounded, Receiver, Sender};
use parking_lot::{Condvar, Mutex};

use crate::apdu::ResponseApdu;
use crate::error::{Result, SessionError};

struct Pending {
    id: u64,
    address: u8,
    tx: Sender<ResponseApdu>,
}

enum Slot {
    Idle,
    Waiting(Pending),
    /// A timed-out exchange may still be answered until `until`.
    Draining { until: Instant },
    /// Session is down; every caller gets `LinkLost` until reset.
    Closed,
}

/// What the reader did with a response frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Delivery {
    Delivered,
    Late,
    Unmatched,
}

/// Outcome of a timed-out wait.
pub(crate) enum Expired {
    /// The slot moved to draining (or idle with no grace).
    TimedOut,
    /// The response won the race against the timeout.
    Answered(ResponseApdu),
    /// The slot was closed while waiting.
    Closed,
}

pub(crate) struct Ticket {
    pub(crate) id: u64,
    pub(crate) rx: Receiver<ResponseApdu>,
}

pub(crate) struct Exchange {
    slot: Mutex<Slot>,
    changed: Condvar,
    next_id: Mutex<u64>,
}

impl Exchange {
    pub(crate) fn new() -> Self {
        Self {
            slot: Mutex::new(Slot::Closed),
            changed: Condvar::new(),
            next_id: Mutex::new(0),
        }
    }

    /// Claim the slot for a command to `address`.
    ///
    /// Waits out a draining slot; fails immediately if another exchange is
    /// waiting.
    pub(crate) fn begin(&self, address: u8) -> Result<Ticket> {
        let mut slot = self.slot.lock();
        loop {
            let until = match &*slot {
                Slot::Idle => break,
                Slot::Waiting(pending) => {
                    return Err(SessionError::ProtocolViolation {
                        outstanding: pending.address,
                    })
                }
                Slot::Closed => return Err(SessionError::LinkLost),
                Slot::Draining { until } => *until,
            };
            if Instant::now() >= until {
                *slot = Slot::Idle;
                break;
            }
            self.changed.wait_until(&mut slot, until);
        }

        let id = {
            let mut next = self.next_id.lock();
            *next += 1;
            *next
        };
        let (tx, rx) = bounded(1);
        *slot = Slot::Waiting(Pending { id, address, tx });
        Ok(Ticket { id, rx })
    }

    /// Release the slot after a failed write.
    pub(crate) fn abandon(&self, id: u64) {
        let mut slot = self.slot.lock();
        if matches!(&*slot, Slot::Waiting(pending) if pending.id == id) {
            *slot = Slot::Idle;
            self.changed.notify_all();
        }
    }

    /// Handle a wait that ran out of time.
    pub(crate) fn expire(&self, ticket: &Ticket, grace: Duration) -> Expired {
        let mut slot = self.slot.lock();
        if matches!(&*slot, Slot::Waiting(pending) if pending.id == ticket.id) {
            *slot = if grace.is_zero() {
                Slot::Idle
            } else {
                Slot::Draining {
                    until: Instant::now() + grace,
                }
            };
            self.changed.notify_all();
            return Expired::TimedOut;
        }
        drop(slot);

        match ticket.rx.try_recv() {
            Ok(response) => Expired::Answered(response),
            Err(_) => Expired::Closed,
        }
    }

    /// Hand a response from `address` to the waiting caller.
    pub(crate) fn deliver(&self, address: u8, response: ResponseApdu) -> Delivery {
        let mut slot = self.slot.lock();
        if matches!(&*slot, Slot::Draining { .. }) {
            *slot = Slot::Idle;
            self.changed.notify_all();
            return Delivery::Late;
        }
        if !matches!(&*slot, Slot::Waiting(pending) if pending.address == address) {
            return Delivery::Unmatched;
        }

        let Slot::Waiting(pending) = std::mem::replace(&mut *slot, Slot::Idle) else {
            return Delivery::Unmatched;
        };
        self.changed.notify_all();
        drop(slot);

        // Capacity 1 and a single send per exchange: this only fails when
        // the caller already gave up.
        match pending.tx.try_send(response) {
            Ok(()) => Delivery::Delivered,
            Err(_) => Delivery::Late,
        }
    }

    /// Whether an exchange is currently waiting for its response.
    pub(crate) fn is_waiting(&self) -> bool {
        matches!(&*self.slot.lock(), Slot::Waiting(_))
    }

    /// Wake every waiter with `LinkLost` and refuse new exchanges.
    pub(crate) fn close(&self) {
        let mut slot = self.slot.lock();
        // Dropping the pending sender disconnects the parked receiver.
        *slot = Slot::Closed;
        self.changed.notify_all();
    }

    /// Accept exchanges again after a successful open.
    pub(crate) fn reset(&self) {
        *self.slot.lock() = Slot::Idle;
        self.changed.notify_all();
    }
}
