//! One-shot timer queue driven by explicit instants.

use std::collections::BTreeMap;
use std::time::{Duration, Instant};

use crate::notify::NotificationId;
use crate::render::Surface;

/// Handle of an armed timer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

/// What a timer is for; routes the firing back to its owner.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerKind {
    Reconnect,
    Poll,
    NotificationExpiry(NotificationId),
    MarkerSweep,
    AnimationFrame(Surface),
}

#[derive(Debug, Clone, Copy)]
struct Armed {
    deadline: Instant,
    kind: TimerKind,
}

/// Armed timers keyed by id.
#[derive(Debug, Default)]
pub struct TimerQueue {
    next_id: u64,
    armed: BTreeMap<TimerId, Armed>,
}

impl TimerQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn arm(&mut self, kind: TimerKind, deadline: Instant) -> TimerId {
        self.next_id += 1;
        let id = TimerId(self.next_id);
        self.armed.insert(id, Armed { deadline, kind });
        log::trace!("TIMER_ARMED id={} kind={:?}", id.0, kind);
        id
    }

    pub fn arm_after(&mut self, kind: TimerKind, now: Instant, delay: Duration) -> TimerId {
        self.arm(kind, now + delay)
    }

    /// Cancel a timer. Returns false if it already fired or was cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        self.armed.remove(&id).is_some()
    }

    pub fn is_armed(&self, id: TimerId) -> bool {
        self.armed.contains_key(&id)
    }

    pub fn deadline(&self, id: TimerId) -> Option<Instant> {
        self.armed.get(&id).map(|a| a.deadline)
    }

    pub fn len(&self) -> usize {
        self.armed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.armed.is_empty()
    }

    /// Number of armed timers matching `predicate`.
    pub fn count_where<F: Fn(&TimerKind) -> bool>(&self, predicate: F) -> usize {
        self.armed.values().filter(|a| predicate(&a.kind)).count()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.armed.values().map(|a| a.deadline).min()
    }

    /// Remove and return every timer due at `now`, earliest first.
    pub fn pop_due(&mut self, now: Instant) -> Vec<(TimerId, TimerKind)> {
        let mut due: Vec<(Instant, TimerId, TimerKind)> = self
            .armed
            .iter()
            .filter(|(_, a)| a.deadline <= now)
            .map(|(id, a)| (a.deadline, *id, a.kind))
            .collect();
        due.sort_by_key(|(deadline, id, _)| (*deadline, *id));

        for (_, id, _) in &due {
            self.armed.remove(id);
        }
        due.into_iter().map(|(_, id, kind)| (id, kind)).collect()
    }
}
