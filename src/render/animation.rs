//! Per-surface animation loops.
//!
//! A loop is a self-rearming frame timer. Starting a loop for a surface that
//! already has one replaces it, so at most one loop per surface is live no
//! matter how often navigation re-initializes the surface.

use std::time::{Duration, Instant};

use crate::scheduling::{TimerId, TimerKind, TimerQueue};

use super::Surface;

#[derive(Debug)]
pub struct AnimationLoop {
    surface: Surface,
    interval: Duration,
    timer: Option<TimerId>,
    last_tick: Option<Instant>,
}

impl AnimationLoop {
    pub fn new(surface: Surface, interval: Duration) -> Self {
        Self {
            surface,
            interval,
            timer: None,
            last_tick: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.is_some()
    }

    pub fn start(&mut self, timers: &mut TimerQueue, now: Instant) {
        self.stop(timers);
        self.last_tick = Some(now);
        self.timer = Some(timers.arm_after(
            TimerKind::AnimationFrame(self.surface),
            now,
            self.interval,
        ));
    }

    pub fn stop(&mut self, timers: &mut TimerQueue) {
        if let Some(timer) = self.timer.take() {
            timers.cancel(timer);
        }
        self.last_tick = None;
    }

    /// Accept a fired frame timer. Returns the elapsed time since the last
    /// frame, or `None` if the timer does not belong to the live loop.
    pub fn on_frame(
        &mut self,
        id: TimerId,
        timers: &mut TimerQueue,
        now: Instant,
    ) -> Option<Duration> {
        if self.timer != Some(id) {
            return None;
        }
        let elapsed = self
            .last_tick
            .map(|last| now.saturating_duration_since(last))
            .unwrap_or(self.interval);
        self.last_tick = Some(now);
        self.timer = Some(timers.arm_after(
            TimerKind::AnimationFrame(self.surface),
            now,
            self.interval,
        ));
        Some(elapsed)
    }
}
