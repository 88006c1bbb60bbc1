//! Auto-expiring notification queue.
//!
//! At most `max_visible` notifications are shown at once; the rest wait in
//! arrival order and start their display timer only when shown.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use crate::logging::structured::LogContext;
use crate::model::Category;
use crate::scheduling::{TimerId, TimerKind, TimerQueue};
use crate::security::markup::sanitize_display_text;

use super::audio::{AudioCue, Cue};

/// Waiting notifications beyond this drop the oldest non-urgent entry.
pub const MAX_PENDING: usize = 50;

/// Handle returned by `show`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NotificationId(pub u64);

/// One toast.
#[derive(Debug, Clone, PartialEq)]
pub struct Notification {
    pub id: NotificationId,
    pub category: Category,
    pub message: String,
    /// Zero means persistent until dismissed.
    pub duration: Duration,
    pub created_at: Instant,
}

impl Notification {
    pub fn is_persistent(&self) -> bool {
        self.duration.is_zero()
    }
}

#[derive(Debug)]
struct Shown {
    notification: Notification,
    expiry: Option<TimerId>,
}

pub struct NotificationQueue {
    ctx: LogContext,
    max_visible: usize,
    next_id: u64,
    visible: Vec<Shown>,
    pending: VecDeque<Notification>,
    audio: Box<dyn AudioCue>,
}

impl NotificationQueue {
    pub fn new(ctx: &LogContext, max_visible: usize, audio: Box<dyn AudioCue>) -> Self {
        Self {
            ctx: ctx.with_component("notify"),
            max_visible: max_visible.max(1),
            next_id: 0,
            visible: Vec::new(),
            pending: VecDeque::new(),
            audio,
        }
    }

    /// Append a notification. Urgent ones also play the alarm cue.
    pub fn show(
        &mut self,
        message: &str,
        category: Category,
        duration: Duration,
        timers: &mut TimerQueue,
        now: Instant,
    ) -> NotificationId {
        self.next_id += 1;
        let id = NotificationId(self.next_id);
        let notification = Notification {
            id,
            category,
            message: sanitize_display_text(message, &self.ctx),
            duration,
            created_at: now,
        };

        log::info!(
            "{} NOTIFICATION id={} category={} duration_ms={} message={:?}",
            self.ctx,
            id.0,
            category,
            duration.as_millis(),
            notification.message
        );

        if category == Category::Urgent {
            if let Err(e) = self.audio.play(Cue::Alarm) {
                log::debug!("{} AUDIO_CUE_FAILED error={}", self.ctx, e);
            }
        }

        if self.visible.len() < self.max_visible {
            self.display(notification, timers, now);
        } else {
            log::debug!(
                "{} NOTIFICATION_QUEUED id={} pending={}",
                self.ctx,
                id.0,
                self.pending.len() + 1
            );
            if self.pending.len() >= MAX_PENDING {
                self.drop_oldest_pending();
            }
            self.pending.push_back(notification);
        }
        id
    }

    /// Remove a notification, visible or pending.
    pub fn dismiss(&mut self, id: NotificationId, timers: &mut TimerQueue, now: Instant) -> bool {
        if let Some(pos) = self.visible.iter().position(|s| s.notification.id == id) {
            let shown = self.visible.remove(pos);
            if let Some(timer) = shown.expiry {
                timers.cancel(timer);
            }
            self.promote(timers, now);
            return true;
        }
        if let Some(pos) = self.pending.iter().position(|n| n.id == id) {
            self.pending.remove(pos);
            return true;
        }
        false
    }

    /// Expiry timer fired for `id`.
    pub fn on_expired(
        &mut self,
        timer: TimerId,
        id: NotificationId,
        timers: &mut TimerQueue,
        now: Instant,
    ) {
        let Some(pos) = self
            .visible
            .iter()
            .position(|s| s.notification.id == id && s.expiry == Some(timer))
        else {
            return;
        };
        self.visible.remove(pos);
        log::debug!("{} NOTIFICATION_EXPIRED id={}", self.ctx, id.0);
        self.promote(timers, now);
    }

    /// Drop everything and cancel all expiry timers.
    pub fn clear(&mut self, timers: &mut TimerQueue) {
        for shown in self.visible.drain(..) {
            if let Some(timer) = shown.expiry {
                timers.cancel(timer);
            }
        }
        self.pending.clear();
    }

    pub fn visible(&self) -> impl Iterator<Item = &Notification> {
        self.visible.iter().map(|s| &s.notification)
    }

    pub fn visible_len(&self) -> usize {
        self.visible.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    fn display(&mut self, notification: Notification, timers: &mut TimerQueue, now: Instant) {
        let expiry = (!notification.is_persistent()).then(|| {
            timers.arm_after(
                TimerKind::NotificationExpiry(notification.id),
                now,
                notification.duration,
            )
        });
        self.visible.push(Shown {
            notification,
            expiry,
        });
    }

    fn drop_oldest_pending(&mut self) {
        let pos = self
            .pending
            .iter()
            .position(|n| n.category != Category::Urgent)
            .unwrap_or(0);
        if let Some(dropped) = self.pending.remove(pos) {
            log::warn!(
                "{} NOTIFICATION_DROPPED id={} category={} pending={}",
                self.ctx,
                dropped.id.0,
                dropped.category,
                self.pending.len()
            );
        }
    }

    fn promote(&mut self, timers: &mut TimerQueue, now: Instant) {
        while self.visible.len() < self.max_visible {
            match self.pending.pop_front() {
                Some(next) => self.display(next, timers, now),
                None => break,
            }
        }
    }
}

impl std::fmt::Debug for NotificationQueue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NotificationQueue")
            .field("visible", &self.visible.len())
            .field("pending", &self.pending.len())
            .field("max_visible", &self.max_visible)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::notify::audio::AudioError;

    struct CountingAudio(Rc<RefCell<usize>>);

    impl AudioCue for CountingAudio {
        fn play(&mut self, _cue: Cue) -> Result<(), AudioError> {
            *self.0.borrow_mut() += 1;
            Ok(())
        }
    }

    struct DeniedAudio;

    impl AudioCue for DeniedAudio {
        fn play(&mut self, _cue: Cue) -> Result<(), AudioError> {
            Err(AudioError::PermissionDenied)
        }
    }

    fn queue(max: usize) -> NotificationQueue {
        NotificationQueue::new(
            &LogContext::new("test-session"),
            max,
            Box::new(crate::notify::SilentAudio),
        )
    }

    fn fire_due(q: &mut NotificationQueue, timers: &mut TimerQueue, now: Instant) {
        for (timer, kind) in timers.pop_due(now) {
            if let TimerKind::NotificationExpiry(id) = kind {
                q.on_expired(timer, id, timers, now);
            }
        }
    }

    #[test]
    fn test_expires_after_duration() {
        let mut timers = TimerQueue::new();
        let mut q = queue(5);
        let t0 = Instant::now();

        q.show("hello", Category::Info, Duration::from_secs(3), &mut timers, t0);
        fire_due(&mut q, &mut timers, t0 + Duration::from_millis(2_999));
        assert_eq!(q.visible_len(), 1);
        fire_due(&mut q, &mut timers, t0 + Duration::from_secs(3));
        assert_eq!(q.visible_len(), 0);
    }

    #[test]
    fn test_persistent_until_dismissed() {
        let mut timers = TimerQueue::new();
        let mut q = queue(5);
        let t0 = Instant::now();

        let id = q.show("sticky", Category::Warning, Duration::ZERO, &mut timers, t0);
        assert!(timers.is_empty());
        assert!(q.dismiss(id, &mut timers, t0));
        assert!(!q.dismiss(id, &mut timers, t0));
        assert_eq!(q.visible_len(), 0);
    }

    #[test]
    fn test_cap_queues_overflow_in_order() {
        let mut timers = TimerQueue::new();
        let mut q = queue(2);
        let t0 = Instant::now();

        for i in 0..4 {
            q.show(&format!("n{}", i), Category::Info, Duration::from_secs(1), &mut timers, t0);
        }
        assert_eq!(q.visible_len(), 2);
        assert_eq!(q.pending_len(), 2);

        fire_due(&mut q, &mut timers, t0 + Duration::from_secs(1));
        let shown: Vec<&str> = q.visible().map(|n| n.message.as_str()).collect();
        assert_eq!(shown, vec!["n2", "n3"]);

        // Promoted entries get a full display period from promotion time.
        fire_due(&mut q, &mut timers, t0 + Duration::from_millis(1_500));
        assert_eq!(q.visible_len(), 2);
        fire_due(&mut q, &mut timers, t0 + Duration::from_secs(2));
        assert_eq!(q.visible_len(), 0);
    }

    #[test]
    fn test_created_at_is_the_supplied_instant() {
        let mut timers = TimerQueue::new();
        let mut q = queue(5);
        let t0 = Instant::now() + Duration::from_secs(42);
        q.show("hello", Category::Info, Duration::ZERO, &mut timers, t0);
        assert_eq!(q.visible().next().unwrap().created_at, t0);
    }

    #[test]
    fn test_pending_is_bounded_behind_persistent_toasts() {
        let mut timers = TimerQueue::new();
        let mut q = queue(1);
        let t0 = Instant::now();

        q.show("sticky", Category::Warning, Duration::ZERO, &mut timers, t0);
        q.show("urgent", Category::Urgent, Duration::ZERO, &mut timers, t0);
        for i in 0..(MAX_PENDING * 2) {
            q.show(&format!("n{}", i), Category::Info, Duration::from_secs(1), &mut timers, t0);
        }

        assert_eq!(q.visible_len(), 1);
        assert_eq!(q.pending_len(), MAX_PENDING);

        // The urgent entry survives; the oldest informational ones went first.
        let sticky = q.visible().next().unwrap().id;
        q.dismiss(sticky, &mut timers, t0);
        assert_eq!(q.visible().next().unwrap().message, "urgent");
        q.clear(&mut timers);
    }

    #[test]
    fn test_urgent_plays_cue_even_when_queued() {
        let plays = Rc::new(RefCell::new(0));
        let mut timers = TimerQueue::new();
        let mut q = NotificationQueue::new(
            &LogContext::new("s"),
            1,
            Box::new(CountingAudio(plays.clone())),
        );
        let t0 = Instant::now();

        q.show("a", Category::Urgent, Duration::from_secs(1), &mut timers, t0);
        q.show("b", Category::Urgent, Duration::from_secs(1), &mut timers, t0);
        q.show("c", Category::Info, Duration::from_secs(1), &mut timers, t0);
        assert_eq!(*plays.borrow(), 2);
    }

    #[test]
    fn test_audio_failure_is_silent() {
        let mut timers = TimerQueue::new();
        let mut q = NotificationQueue::new(&LogContext::new("s"), 5, Box::new(DeniedAudio));
        q.show("critical", Category::Urgent, Duration::ZERO, &mut timers, Instant::now());
        assert_eq!(q.visible_len(), 1);
    }

    #[test]
    fn test_messages_are_sanitized() {
        let mut timers = TimerQueue::new();
        let mut q = queue(5);
        q.show("<b>x</b>", Category::Info, Duration::ZERO, &mut timers, Instant::now());
        assert_eq!(q.visible().next().unwrap().message, "&lt;b&gt;x&lt;/b&gt;");
    }

    #[test]
    fn test_clear_cancels_timers() {
        let mut timers = TimerQueue::new();
        let mut q = queue(1);
        let t0 = Instant::now();
        q.show("a", Category::Info, Duration::from_secs(1), &mut timers, t0);
        q.show("b", Category::Info, Duration::from_secs(1), &mut timers, t0);
        q.clear(&mut timers);
        assert!(timers.is_empty());
        assert_eq!(q.visible_len() + q.pending_len(), 0);
    }
}
