//! Receivers: the dispatch targets that schedule work onto a loop's queue.
//!
//! A receiver is permanently bound to one delivery queue at construction and
//! cannot migrate. Scheduling calls are safe from any thread; the dispatch
//! hook always runs on the queue's owning loop thread.

use std::sync::Arc;

use crate::clock;
use crate::event_loop::{EventLoop, LoopError};
use crate::message::{Envelope, EnvelopeKind, Payload, Record, Tag};
use crate::queue::DeliveryQueue;

/// Hook invoked on the loop thread for each record addressed to a receiver.
///
/// Blanket-implemented for closures, so `Receiver::new(|record| ..)` works;
/// implement it on a type when the hook carries state of its own.
pub trait MessageHook: Send + Sync + 'static {
    fn on_message(&self, record: &Record);
}

impl<F> MessageHook for F
where
    F: Fn(&Record) + Send + Sync + 'static,
{
    fn on_message(&self, record: &Record) {
        self(record);
    }
}

struct Inner {
    queue: Arc<DeliveryQueue>,
    hook: Box<dyn MessageHook>,
}

/// Cloneable handle to a dispatch target bound to one delivery queue.
///
/// Clones share the binding and the hook; envelopes compare the binding by
/// identity at dispatch time.
#[derive(Clone)]
pub struct Receiver {
    inner: Arc<Inner>,
}

impl Receiver {
    /// Binds a receiver to the loop prepared on the current thread.
    ///
    /// # Errors
    ///
    /// [`LoopError::NotPrepared`] if this thread has no event loop.
    pub fn new(hook: impl MessageHook) -> Result<Self, LoopError> {
        Ok(Self::with_queue(
            EventLoop::current_queue()?,
            Box::new(hook),
        ))
    }

    /// Binds a receiver to an explicit loop handle.
    #[must_use]
    pub fn bound(event_loop: &EventLoop, hook: impl MessageHook) -> Self {
        Self::with_queue(Arc::clone(event_loop.queue_handle()), Box::new(hook))
    }

    pub(crate) fn with_queue(queue: Arc<DeliveryQueue>, hook: Box<dyn MessageHook>) -> Self {
        Self {
            inner: Arc::new(Inner { queue, hook }),
        }
    }

    /// Sends `record` due immediately. Returns `false` if the queue closed.
    pub fn send_now(&self, record: Record) -> bool {
        self.send_after(record, 0)
    }

    /// Sends `record` due `delay_ms` milliseconds from now.
    pub fn send_after(&self, record: Record, delay_ms: u64) -> bool {
        let due = clock::uptime_ms() + delay_ms as i64;
        self.inner
            .queue
            .enqueue(Envelope::record(self.clone(), record, due))
    }

    /// Sends `record` ahead of everything currently queued, regardless of
    /// due-times.
    pub fn send_to_front(&self, record: Record) -> bool {
        self.inner
            .queue
            .enqueue_at_front(Envelope::record(self.clone(), record, 0))
    }

    /// Sends a record carrying only `code`, due immediately.
    pub fn send_code(&self, code: i32) -> bool {
        self.send_now(Record::with_code(code))
    }

    /// Sends a record carrying only `code`, due `delay_ms` from now.
    pub fn send_code_after(&self, code: i32, delay_ms: u64) -> bool {
        self.send_after(Record::with_code(code), delay_ms)
    }

    /// Schedules `callback` to run on the loop thread, due immediately.
    pub fn post(&self, callback: impl FnOnce() + Send + 'static) -> bool {
        self.post_after(callback, 0)
    }

    /// Schedules `callback` to run on the loop thread after `delay_ms`.
    pub fn post_after(&self, callback: impl FnOnce() + Send + 'static, delay_ms: u64) -> bool {
        let due = clock::uptime_ms() + delay_ms as i64;
        self.inner
            .queue
            .enqueue(Envelope::callback(self.clone(), Box::new(callback), due))
    }

    /// Schedules `callback` ahead of everything currently queued.
    pub fn post_to_front(&self, callback: impl FnOnce() + Send + 'static) -> bool {
        self.inner
            .queue
            .enqueue_at_front(Envelope::callback(self.clone(), Box::new(callback), 0))
    }

    /// True if the bound queue holds any record with `code`.
    #[must_use]
    pub fn has_pending(&self, code: i32) -> bool {
        self.inner.queue.has_pending(code)
    }

    /// Removes queued records with `code` (and the identical `tag`, when
    /// given) from the bound queue.
    pub fn cancel_pending(&self, code: i32, tag: Option<&Tag>) {
        self.inner.queue.cancel_pending(code, tag);
    }

    /// Executes one dequeued envelope on the calling (loop) thread.
    ///
    /// # Panics
    ///
    /// If the envelope is bound to a different receiver, or is a
    /// termination envelope: both are loop-internal contract violations.
    pub(crate) fn dispatch(&self, envelope: Envelope) {
        let EnvelopeKind::Deliver { target, payload } = envelope.kind else {
            panic!("termination envelope is not dispatchable");
        };
        assert!(
            Arc::ptr_eq(&self.inner, &target.inner),
            "envelope dispatched to a receiver it is not bound to"
        );
        match payload {
            Payload::Callback(callback) => callback(),
            Payload::Record(record) => self.inner.hook.on_message(&record),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;

    fn standalone(hook: Box<dyn MessageHook>) -> (Arc<DeliveryQueue>, Receiver) {
        let queue = Arc::new(DeliveryQueue::new());
        let receiver = Receiver::with_queue(Arc::clone(&queue), hook);
        (queue, receiver)
    }

    #[test]
    fn record_dispatch_reaches_the_hook() {
        let seen: Arc<Mutex<Vec<(i32, i32, i32)>>> = Arc::new(Mutex::new(Vec::new()));
        let seen_in_hook = Arc::clone(&seen);
        let (queue, receiver) = standalone(Box::new(move |record: &Record| {
            seen_in_hook
                .lock()
                .expect("hook mutex")
                .push((record.code, record.arg1, record.arg2));
        }));

        assert!(receiver.send_now(Record {
            code: 7,
            arg1: 10,
            arg2: 20,
            tag: None,
        }));
        receiver.dispatch(queue.take_next());
        assert_eq!(*seen.lock().expect("hook mutex"), vec![(7, 10, 20)]);
    }

    #[test]
    fn callback_dispatch_runs_the_closure_not_the_hook() {
        let hook_calls = Arc::new(AtomicUsize::new(0));
        let hook_calls_in_hook = Arc::clone(&hook_calls);
        let (queue, receiver) = standalone(Box::new(move |_: &Record| {
            hook_calls_in_hook.fetch_add(1, Ordering::SeqCst);
        }));

        let ran = Arc::new(AtomicUsize::new(0));
        let ran_in_callback = Arc::clone(&ran);
        assert!(receiver.post(move || {
            ran_in_callback.fetch_add(1, Ordering::SeqCst);
        }));

        receiver.dispatch(queue.take_next());
        assert_eq!(ran.load(Ordering::SeqCst), 1);
        assert_eq!(hook_calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    #[should_panic(expected = "not bound")]
    fn cross_bound_dispatch_is_fatal() {
        let (queue, receiver) = standalone(Box::new(|_: &Record| {}));
        let stranger = Receiver::with_queue(Arc::clone(&queue), Box::new(|_: &Record| {}));

        assert!(stranger.send_code(1));
        // The envelope is bound to `stranger`; handing it to `receiver` is a
        // programming error.
        receiver.dispatch(queue.take_next());
    }

    #[test]
    fn clones_share_one_binding() {
        let (queue, receiver) = standalone(Box::new(|_: &Record| {}));
        let clone = receiver.clone();

        assert!(clone.send_code(5));
        assert!(receiver.has_pending(5));
        // A clone's envelope dispatches fine through the original.
        receiver.dispatch(queue.take_next());
    }

    #[test]
    fn pending_filters_delegate_to_the_bound_queue() {
        let (queue, receiver) = standalone(Box::new(|_: &Record| {}));
        assert!(receiver.send_code_after(3, 60_000));
        assert!(receiver.send_code_after(4, 60_000));

        assert!(receiver.has_pending(3));
        receiver.cancel_pending(3, None);
        assert!(!receiver.has_pending(3));
        assert!(receiver.has_pending(4));
        assert_eq!(queue.len(), 1);
    }
}
