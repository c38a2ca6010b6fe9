//! Per-thread asynchronous message delivery.
//!
//! Any thread may address a data [`Record`] or a one-shot callback to a
//! [`Receiver`] owned by another thread, optionally delayed; the owning
//! thread's [`EventLoop`] drains its delivery queue strictly in due-time
//! order (ties broken by arrival) and dispatches each unit synchronously on
//! its own stack, one at a time.
//!
//! # Overview
//!
//! - [`EventLoop`] — per-thread driver: prepare once, `run()` forever,
//!   stop cooperatively through the queue itself.
//! - [`Receiver`] — dispatch target bound to one loop's queue; scheduling
//!   calls (`send_now`, `send_after`, `send_to_front`, `post`, ...) are safe
//!   from any thread.
//! - [`queue::DeliveryQueue`] — the thread-safe, time-ordered store behind
//!   both, built on the sorted container in [`list`].
//!
//! The queue is unbounded and applies no backpressure; a thread that never
//! runs its loop accumulates entries without limit.
//!
//! # Example
//!
//! ```
//! use spindle::{EventLoop, Receiver, Record};
//!
//! let event_loop = EventLoop::prepare().expect("first prepare on this thread");
//! let receiver = Receiver::bound(&event_loop, |record: &Record| {
//!     println!("got code {}", record.code);
//! });
//!
//! receiver.send_code(1);
//! receiver.post(|| {
//!     // Runs on the loop thread, after the record above.
//!     EventLoop::current().expect("loop thread").request_stop();
//! });
//!
//! event_loop.run(); // returns once the stop request reaches the front
//! ```

pub mod clock;
pub mod event_loop;
pub mod list;
pub mod message;
pub mod queue;
pub mod receiver;
mod trace;

pub use event_loop::{EventLoop, LoopError};
pub use list::SortedList;
pub use message::{Record, Tag};
pub use receiver::{MessageHook, Receiver};
pub use trace::init_tracing;
