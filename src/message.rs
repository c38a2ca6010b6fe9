//! Message payloads and the queue envelope.
//!
//! A payload is either a plain data [`Record`] or a one-shot callback; an
//! [`Envelope`] pairs one payload with its bound [`Receiver`] and a due-time.
//! The termination envelope carries neither payload nor receiver and tells
//! the event loop to return.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use crate::receiver::Receiver;

/// Opaque reference attached to a [`Record`].
///
/// Compared by identity (`Arc::ptr_eq`), never by value, when used as a
/// cancellation filter.
pub type Tag = Arc<dyn Any + Send + Sync>;

/// One-shot callback payload, executed on the loop thread.
pub type Callback = Box<dyn FnOnce() + Send + 'static>;

/// Plain data record sent to a receiver.
///
/// `code` discriminates record kinds for a given receiver; `arg1`/`arg2`
/// carry small arguments and `tag` an arbitrary shared reference.
#[derive(Clone, Default)]
pub struct Record {
    pub code: i32,
    pub arg1: i32,
    pub arg2: i32,
    pub tag: Option<Tag>,
}

impl Record {
    /// A record carrying only a discriminant code.
    #[must_use]
    pub fn with_code(code: i32) -> Self {
        Self {
            code,
            ..Self::default()
        }
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Record")
            .field("code", &self.code)
            .field("arg1", &self.arg1)
            .field("arg2", &self.arg2)
            .field("tag", &self.tag.is_some())
            .finish()
    }
}

/// What an envelope delivers: exactly one of record or callback.
pub(crate) enum Payload {
    Record(Record),
    Callback(Callback),
}

pub(crate) enum EnvelopeKind {
    /// Ordinary delivery to the bound receiver.
    Deliver {
        target: Receiver,
        payload: Payload,
    },
    /// Termination request; the loop returns when this reaches the front.
    Terminate,
}

/// A queue entry: one payload, its receiver, and the due-time at which it
/// becomes eligible for dequeue.
///
/// Owned by the delivery queue from enqueue until the loop dequeues it for
/// one-shot dispatch; never reused.
pub struct Envelope {
    due: i64,
    pub(crate) kind: EnvelopeKind,
}

impl Envelope {
    pub(crate) fn record(target: Receiver, record: Record, due: i64) -> Self {
        Self {
            due,
            kind: EnvelopeKind::Deliver {
                target,
                payload: Payload::Record(record),
            },
        }
    }

    pub(crate) fn callback(target: Receiver, callback: Callback, due: i64) -> Self {
        Self {
            due,
            kind: EnvelopeKind::Deliver {
                target,
                payload: Payload::Callback(callback),
            },
        }
    }

    /// The termination request; due-time 0 sorts it at (or near) the front.
    pub(crate) fn terminate() -> Self {
        Self {
            due: 0,
            kind: EnvelopeKind::Terminate,
        }
    }

    /// Monotonic clock value at or after which this entry may be dequeued.
    #[must_use]
    pub fn due_time(&self) -> i64 {
        self.due
    }

    /// Same envelope, rescheduled.
    pub(crate) fn with_due_time(mut self, due: i64) -> Self {
        self.due = due;
        self
    }

    /// The bound receiver, or `None` for the termination envelope.
    pub(crate) fn target(&self) -> Option<&Receiver> {
        match &self.kind {
            EnvelopeKind::Deliver { target, .. } => Some(target),
            EnvelopeKind::Terminate => None,
        }
    }

    pub(crate) fn is_terminate(&self) -> bool {
        matches!(self.kind, EnvelopeKind::Terminate)
    }

    /// True for a record payload with the given code, and, when `tag` is
    /// given, the identical tag reference. Callback and termination
    /// envelopes never match.
    pub(crate) fn matches_record(&self, code: i32, tag: Option<&Tag>) -> bool {
        let EnvelopeKind::Deliver {
            payload: Payload::Record(record),
            ..
        } = &self.kind
        else {
            return false;
        };
        if record.code != code {
            return false;
        }
        match tag {
            None => true,
            Some(tag) => record
                .tag
                .as_ref()
                .is_some_and(|own| Arc::ptr_eq(own, tag)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn record_debug_hides_tag_contents() {
        let record = Record {
            code: 3,
            arg1: 1,
            arg2: 2,
            tag: Some(Arc::new("opaque")),
        };
        let rendered = format!("{record:?}");
        assert!(rendered.contains("code: 3"));
        assert!(rendered.contains("tag: true"));
        assert!(!rendered.contains("opaque"));
    }

    #[test]
    fn terminate_envelope_has_no_target() {
        let envelope = Envelope::terminate();
        assert!(envelope.is_terminate());
        assert!(envelope.target().is_none());
        assert_eq!(envelope.due_time(), 0);
        assert!(!envelope.matches_record(0, None));
    }
}
