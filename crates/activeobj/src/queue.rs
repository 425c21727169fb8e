//! Ready and delayed message queues.
//!
//! Both queues sit behind the single scheduler mutex; nothing in here locks.
//! Delayed entries are ordered by `(deadline, seq)`, so two messages with the
//! same deadline are both kept and promoted in the order they were sent.

use std::cmp::Ordering;
use std::collections::{BinaryHeap, VecDeque};
use std::mem;
use std::time::Instant;

use crate::message::BoxedMessage;

struct DelayedEntry {
    deadline: Instant,
    seq: u64,
    message: BoxedMessage,
}

impl PartialEq for DelayedEntry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for DelayedEntry {}

impl Ord for DelayedEntry {
    // BinaryHeap is a max-heap; reverse both keys to pop the earliest first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for DelayedEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// The scheduler's dual queue.
#[derive(Default)]
pub(crate) struct Queues {
    ready: VecDeque<BoxedMessage>,
    delayed: BinaryHeap<DelayedEntry>,
    next_seq: u64,
}

impl Queues {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn push_ready(&mut self, message: BoxedMessage) {
        self.ready.push_back(message);
    }

    pub(crate) fn push_delayed(&mut self, deadline: Instant, message: BoxedMessage) {
        let seq = self.next_seq;
        self.next_seq = self.next_seq.wrapping_add(1);
        self.delayed.push(DelayedEntry {
            deadline,
            seq,
            message,
        });
    }

    /// Moves every delayed message due at `now` to the ready tail.
    ///
    /// Returns the number of promoted messages.
    pub(crate) fn promote_due(&mut self, now: Instant) -> usize {
        let mut promoted = 0;
        while self
            .delayed
            .peek()
            .is_some_and(|entry| entry.deadline <= now)
        {
            if let Some(entry) = self.delayed.pop() {
                self.ready.push_back(entry.message);
                promoted += 1;
            }
        }
        promoted
    }

    pub(crate) fn next_deadline(&self) -> Option<Instant> {
        self.delayed.peek().map(|entry| entry.deadline)
    }

    pub(crate) fn pop_ready(&mut self) -> Option<BoxedMessage> {
        self.ready.pop_front()
    }

    pub(crate) fn is_idle(&self) -> bool {
        self.ready.is_empty() && self.delayed.is_empty()
    }

    pub(crate) fn ready_len(&self) -> usize {
        self.ready.len()
    }

    pub(crate) fn delayed_len(&self) -> usize {
        self.delayed.len()
    }

    /// Takes every delayed message out without running it.
    pub(crate) fn take_delayed(&mut self) -> Discarded {
        Discarded {
            ready: VecDeque::new(),
            delayed: mem::take(&mut self.delayed),
        }
    }

    /// Takes every message in both queues out without running it.
    pub(crate) fn take_all(&mut self) -> Discarded {
        Discarded {
            ready: mem::take(&mut self.ready),
            delayed: mem::take(&mut self.delayed),
        }
    }
}

/// Messages removed from the queues unrun.
///
/// Dropping a message runs its captured destructors, which may re-enter the
/// scheduler. Drop this only after the queue lock has been released.
#[must_use]
pub(crate) struct Discarded {
    ready: VecDeque<BoxedMessage>,
    delayed: BinaryHeap<DelayedEntry>,
}

impl Discarded {
    pub(crate) fn len(&self) -> usize {
        self.ready.len() + self.delayed.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.ready.is_empty() && self.delayed.is_empty()
    }
}
