//! Per-thread event loop: prepare once, run forever, stop cooperatively.
//!
//! [`EventLoop::prepare`] creates the thread's delivery queue and returns an
//! explicit handle; a thread-local slot keeps the queue reachable for
//! [`EventLoop::current`] and the convenience receiver constructor. The
//! handle is deliberately not [`Send`]: the loop drains its queue only on
//! the thread that prepared it, while producers reach the queue through
//! cloned [`crate::receiver::Receiver`] handles.

use std::cell::RefCell;
use std::marker::PhantomData;
use std::sync::Arc;

use thiserror::Error;

use crate::message::Envelope;
use crate::queue::DeliveryQueue;
use crate::trace::{debug, info, trace};

thread_local! {
    static CURRENT: RefCell<Option<Arc<DeliveryQueue>>> = const { RefCell::new(None) };
}

/// Caller contract violations around loop setup. Never retried internally.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum LoopError {
    /// `prepare()` was called twice on one thread.
    #[error("event loop already prepared on this thread")]
    AlreadyPrepared,
    /// An accessor ran before `prepare()` on this thread.
    #[error("event loop not prepared on this thread")]
    NotPrepared,
}

/// Marker type to opt-out of `Send`: the handle stays on its loop thread.
type PhantomUnsend = PhantomData<*const ()>;

/// Handle to the current thread's event loop.
///
/// Cheap to obtain again via [`EventLoop::current`]; all handles on one
/// thread refer to the same queue.
pub struct EventLoop {
    queue: Arc<DeliveryQueue>,
    _unsend: PhantomUnsend,
}

impl EventLoop {
    fn from_queue(queue: Arc<DeliveryQueue>) -> Self {
        Self {
            queue,
            _unsend: PhantomData,
        }
    }

    /// Creates and binds a fresh delivery queue to this thread.
    ///
    /// Must run once per thread, before any receiver is constructed on it.
    ///
    /// # Errors
    ///
    /// [`LoopError::AlreadyPrepared`] if this thread already has a loop.
    pub fn prepare() -> Result<Self, LoopError> {
        CURRENT.with(|slot| {
            let mut slot = slot.borrow_mut();
            if slot.is_some() {
                return Err(LoopError::AlreadyPrepared);
            }
            let queue = Arc::new(DeliveryQueue::new());
            *slot = Some(Arc::clone(&queue));
            info!("event loop prepared");
            Ok(Self::from_queue(queue))
        })
    }

    /// The loop already prepared on this thread.
    ///
    /// # Errors
    ///
    /// [`LoopError::NotPrepared`] if `prepare()` has not run here.
    pub fn current() -> Result<Self, LoopError> {
        Ok(Self::from_queue(Self::current_queue()?))
    }

    pub(crate) fn current_queue() -> Result<Arc<DeliveryQueue>, LoopError> {
        CURRENT.with(|slot| {
            slot.borrow()
                .as_ref()
                .map(Arc::clone)
                .ok_or(LoopError::NotPrepared)
        })
    }

    /// This loop's delivery queue.
    #[must_use]
    pub fn queue(&self) -> &DeliveryQueue {
        &self.queue
    }

    pub(crate) fn queue_handle(&self) -> &Arc<DeliveryQueue> {
        &self.queue
    }

    /// Runs the message loop on this thread.
    ///
    /// Blocks in [`DeliveryQueue::take_next`], dispatches each envelope
    /// synchronously on this stack, and returns when a termination envelope
    /// reaches the front. Entries still queued at that point are dropped
    /// undispatched (see [`EventLoop::request_stop`]).
    pub fn run(&self) {
        info!("event loop running");
        loop {
            let envelope = self.queue.take_next();
            let Some(target) = envelope.target().cloned() else {
                info!("termination envelope reached the front, loop exiting");
                return;
            };
            trace!(due = envelope.due_time(), "dispatching envelope");
            target.dispatch(envelope);
        }
    }

    /// Requests cooperative termination by enqueuing a termination envelope
    /// at due-time 0.
    ///
    /// Returns `false` if termination was already requested. Due-time 0
    /// sorts at or before every normally-scheduled entry: already-due
    /// entries that arrived earlier still drain first (arrival-order
    /// tie-break), but entries whose due-time lies in the future are dropped
    /// when the loop returns — termination does not flush pending delayed
    /// work.
    pub fn request_stop(&self) -> bool {
        debug!("termination requested");
        self.queue.enqueue(Envelope::terminate())
    }
}
