//! Thread-safe, time-ordered delivery queue.
//!
//! Any number of producer threads enqueue envelopes under one mutex; exactly
//! one owning thread blocks in [`DeliveryQueue::take_next`] and drains them
//! in due-time order, ties broken by arrival. Waiting uses a condition
//! variable with a recomputed timeout, never a fixed poll interval: every
//! accepted enqueue signals all waiters so a newly-arrived earlier entry
//! shortens the wait.

use std::cmp::Ordering;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::clock;
use crate::list::SortedList;
use crate::message::{Envelope, Tag};
use crate::trace::{debug, trace};

/// Upper bound on a single wait while the queue is empty. Wakes are signaled
/// on every enqueue, so this only caps how long an idle loop sleeps between
/// re-checks.
const IDLE_WAIT: Duration = Duration::from_secs(30);

fn by_due_time(a: &Envelope, b: &Envelope) -> Ordering {
    a.due_time().cmp(&b.due_time())
}

struct State {
    entries: SortedList<Envelope, fn(&Envelope, &Envelope) -> Ordering>,
    /// Set once, when a termination envelope is accepted. Blocks future
    /// enqueues; already-queued entries still drain.
    closed: bool,
}

/// The shared-mutable core: a sorted list of envelopes behind a mutex, plus
/// a condition variable for the owning thread's timed wait.
///
/// Created by [`crate::event_loop::EventLoop::prepare`] and bound to that
/// thread for its lifetime; producers reach it through cloned
/// [`crate::receiver::Receiver`] handles.
pub struct DeliveryQueue {
    state: Mutex<State>,
    available: Condvar,
}

impl DeliveryQueue {
    pub(crate) fn new() -> Self {
        Self {
            state: Mutex::new(State {
                entries: SortedList::new(by_due_time),
                closed: false,
            }),
            available: Condvar::new(),
        }
    }

    /// Number of pending envelopes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.state.lock().entries.len()
    }

    /// True if nothing is queued.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.state.lock().entries.is_empty()
    }

    /// Enqueues an envelope at its due-time.
    ///
    /// Returns `false` if the queue is already closed. A termination
    /// envelope closes the queue but is still inserted and delivered;
    /// closing only rejects enqueues that come after it.
    pub fn enqueue(&self, envelope: Envelope) -> bool {
        let accepted = {
            let mut state = self.state.lock();
            Self::insert_locked(&mut state, envelope)
        };
        if accepted {
            self.available.notify_all();
        }
        accepted
    }

    /// Enqueues `envelope` with a due-time strictly below the current
    /// minimum (front minus one, or 0 on an empty queue), making it the next
    /// entry dequeued regardless of its nominal schedule.
    pub fn enqueue_at_front(&self, envelope: Envelope) -> bool {
        let accepted = {
            let mut state = self.state.lock();
            let due = state
                .entries
                .peek_first()
                .map_or(0, |front| front.due_time() - 1);
            trace!(due, "promoting envelope to queue front");
            Self::insert_locked(&mut state, envelope.with_due_time(due))
        };
        if accepted {
            self.available.notify_all();
        }
        accepted
    }

    fn insert_locked(state: &mut State, envelope: Envelope) -> bool {
        if state.closed {
            trace!(due = envelope.due_time(), "enqueue rejected: queue closed");
            return false;
        }
        if envelope.is_terminate() {
            // Close first so no later enqueue lands behind the termination
            // entry; the entry itself still goes in for the loop to see.
            state.closed = true;
            debug!("termination envelope accepted, queue closed");
        }
        state.entries.insert(envelope);
        trace!(pending = state.entries.len(), "envelope enqueued");
        true
    }

    /// Blocks until the earliest envelope is due, then removes and returns
    /// it.
    ///
    /// While empty, waits in bounded 30-second slices; while
    /// non-empty, waits exactly until the front's due-time and re-checks on
    /// every wake, since an enqueue may have installed an earlier front.
    pub fn take_next(&self) -> Envelope {
        let mut state = self.state.lock();
        loop {
            let wait = match state.entries.peek_first() {
                Some(front) => {
                    let remaining = front.due_time() - clock::uptime_ms();
                    if remaining <= 0 {
                        break;
                    }
                    Duration::from_millis(remaining as u64)
                }
                None => IDLE_WAIT,
            };
            // Timed out or signaled: either way the front may have changed,
            // so loop and recompute.
            let _ = self.available.wait_for(&mut state, wait);
        }
        state
            .entries
            .remove_first()
            .expect("front checked due and non-empty under the same lock")
    }

    /// True if any queued record carries `code`. In-flight envelopes already
    /// handed to the loop are not visible here.
    #[must_use]
    pub fn has_pending(&self, code: i32) -> bool {
        self.state
            .lock()
            .entries
            .exists_matching(|envelope| envelope.matches_record(code, None))
    }

    /// Removes every queued record with `code` and, if `tag` is given, the
    /// identical tag reference. A point-in-time filter: entries already
    /// dequeued are unaffected.
    pub fn cancel_pending(&self, code: i32, tag: Option<&Tag>) {
        let removed = self
            .state
            .lock()
            .entries
            .remove_matching(|envelope| envelope.matches_record(code, tag));
        if removed > 0 {
            trace!(code, removed, "cancelled pending records");
        }
    }
}
