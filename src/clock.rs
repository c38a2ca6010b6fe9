//! Monotonic uptime clock shared by scheduling and dequeue timing.
//!
//! Due-times and delays are expressed in whole milliseconds measured from an
//! epoch fixed the first time the clock is read. The reading never goes
//! backward, so an entry scheduled at `uptime_ms() + delay` can only become
//! due, never un-due.

use std::sync::LazyLock;

use minstant::Instant;

static EPOCH: LazyLock<Instant> = LazyLock::new(Instant::now);

/// Milliseconds elapsed since the process-local epoch.
///
/// Signed so that front-of-queue entries may carry due-times below the epoch
/// (see [`crate::queue::DeliveryQueue::enqueue_at_front`]); ordinary
/// scheduling always produces non-negative values.
#[must_use]
pub fn uptime_ms() -> i64 {
    EPOCH.elapsed().as_millis() as i64
}
