//! Push-channel state machine.
//!
//! `Disconnected → Connecting → Open → Reconnecting → (Connecting | FallbackPolling)`
//!
//! The manager performs no IO. It returns `ConnectionAction`s for the
//! caller to execute and arms its reconnect/poll timers on the shared
//! `TimerQueue`. At any instant it holds at most one live channel and at
//! most one reconnect timer; fallback polling and the push channel are
//! never active together.

use std::time::{Duration, Instant};

use url::Url;

use crate::logging::structured::LogContext;
use crate::model::Category;
use crate::scheduling::{TimerId, TimerKind, TimerQueue};

use super::backoff::ReconnectPolicy;
use super::state::ConnectionState;

/// Identity of one channel instance. Events from older instances are stale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ChannelId(pub u64);

/// Work requested by the connection manager.
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectionAction {
    Open { channel: ChannelId, url: Url },
    Close(ChannelId),
    FetchSummary,
    Notify { message: String, category: Category },
    StatusChanged(ConnectionState),
}

pub const CONNECTED_MESSAGE: &str = "Connected to real-time threat stream";
pub const FALLBACK_MESSAGE: &str = "Connection lost, falling back to periodic refresh";

/// Owns the push-channel lifecycle for one session.
#[derive(Debug)]
pub struct ConnectionManager {
    ctx: LogContext,
    endpoint: Url,
    policy: ReconnectPolicy,
    poll_interval: Duration,
    state: ConnectionState,
    retries: u32,
    next_channel: u64,
    channel: Option<ChannelId>,
    reconnect_timer: Option<TimerId>,
    poll_timer: Option<TimerId>,
    fallback_announced: bool,
}

impl ConnectionManager {
    pub fn new(
        ctx: &LogContext,
        endpoint: Url,
        policy: ReconnectPolicy,
        poll_interval: Duration,
    ) -> Self {
        Self {
            ctx: ctx.with_component("connection"),
            endpoint,
            policy,
            poll_interval,
            state: ConnectionState::Disconnected,
            retries: 0,
            next_channel: 0,
            channel: None,
            reconnect_timer: None,
            poll_timer: None,
            fallback_announced: false,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn retries(&self) -> u32 {
        self.retries
    }

    pub fn channel(&self) -> Option<ChannelId> {
        self.channel
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_timer.is_some()
    }

    pub fn polling(&self) -> bool {
        self.poll_timer.is_some()
    }

    /// Whether frames from `channel` should be dispatched.
    pub fn accepts(&self, channel: ChannelId) -> bool {
        self.state == ConnectionState::Open && self.channel == Some(channel)
    }

    /// Open a new channel. Valid from `Disconnected` and `Reconnecting`.
    pub fn connect(&mut self, timers: &mut TimerQueue) -> Vec<ConnectionAction> {
        if !matches!(
            self.state,
            ConnectionState::Disconnected | ConnectionState::Reconnecting
        ) {
            log::debug!(
                "{} CONNECT_SKIPPED state={}",
                self.ctx,
                self.state
            );
            return Vec::new();
        }

        let mut actions = Vec::new();

        if let Some(timer) = self.reconnect_timer.take() {
            timers.cancel(timer);
        }
        if let Some(stale) = self.channel.take() {
            log::debug!("{} CHANNEL_CLOSE_STALE channel={}", self.ctx, stale.0);
            actions.push(ConnectionAction::Close(stale));
        }

        self.next_channel += 1;
        let channel = ChannelId(self.next_channel);
        self.channel = Some(channel);

        log::info!(
            "{} CHANNEL_OPEN channel={} url={} attempt={}",
            self.ctx,
            channel.0,
            self.endpoint,
            self.retries
        );

        actions.push(ConnectionAction::Open {
            channel,
            url: self.endpoint.clone(),
        });
        self.transition(ConnectionState::Connecting, &mut actions);
        actions
    }

    /// The channel finished its handshake.
    pub fn on_open(&mut self, channel: ChannelId) -> Vec<ConnectionAction> {
        if self.channel != Some(channel) || self.state != ConnectionState::Connecting {
            log::warn!(
                "{} CHANNEL_OPEN_STALE channel={} current={:?} state={}",
                self.ctx,
                channel.0,
                self.channel.map(|c| c.0),
                self.state
            );
            return vec![ConnectionAction::Close(channel)];
        }

        let mut actions = Vec::new();
        self.retries = 0;
        self.transition(ConnectionState::Open, &mut actions);
        actions.push(ConnectionAction::Notify {
            message: CONNECTED_MESSAGE.to_string(),
            category: Category::Success,
        });
        actions
    }

    /// The channel errored or closed.
    pub fn on_closed(
        &mut self,
        channel: ChannelId,
        reason: Option<&str>,
        timers: &mut TimerQueue,
        now: Instant,
    ) -> Vec<ConnectionAction> {
        if self.channel != Some(channel) {
            log::debug!(
                "{} CHANNEL_CLOSED_STALE channel={} reason={:?}",
                self.ctx,
                channel.0,
                reason
            );
            return Vec::new();
        }
        self.channel = None;

        log::warn!(
            "{} CHANNEL_CLOSED channel={} state={} retries={} reason={:?}",
            self.ctx,
            channel.0,
            self.state,
            self.retries,
            reason
        );

        // The instance ended on its own; its handle still has to go.
        let mut actions = vec![ConnectionAction::Close(channel)];
        match self.state {
            ConnectionState::Connecting | ConnectionState::Open => {
                self.transition(ConnectionState::Reconnecting, &mut actions);
            }
            _ => return actions,
        }

        if self.policy.allows(self.retries) {
            self.retries += 1;
            let delay = self.policy.delay(self.retries);
            if let Some(previous) = self.reconnect_timer.take() {
                timers.cancel(previous);
            }
            self.reconnect_timer = Some(timers.arm_after(TimerKind::Reconnect, now, delay));
            log::info!(
                "{} RECONNECT_SCHEDULED attempt={} delay_ms={}",
                self.ctx,
                self.retries,
                delay.as_millis()
            );
        } else {
            self.enter_fallback(timers, now, &mut actions);
        }
        actions
    }

    /// Handle one of this manager's timers.
    pub fn on_timer(
        &mut self,
        id: TimerId,
        kind: TimerKind,
        timers: &mut TimerQueue,
        now: Instant,
    ) -> Vec<ConnectionAction> {
        match kind {
            TimerKind::Reconnect if self.reconnect_timer == Some(id) => {
                self.reconnect_timer = None;
                self.connect(timers)
            }
            TimerKind::Poll if self.poll_timer == Some(id) => {
                self.poll_timer = Some(timers.arm_after(TimerKind::Poll, now, self.poll_interval));
                log::debug!("{} FALLBACK_POLL", self.ctx);
                vec![ConnectionAction::FetchSummary]
            }
            _ => {
                log::debug!("{} TIMER_STALE kind={:?}", self.ctx, kind);
                Vec::new()
            }
        }
    }

    /// Tear everything down: cancel timers, close the channel.
    pub fn shutdown(&mut self, timers: &mut TimerQueue) -> Vec<ConnectionAction> {
        let mut actions = Vec::new();
        if let Some(timer) = self.reconnect_timer.take() {
            timers.cancel(timer);
        }
        if let Some(timer) = self.poll_timer.take() {
            timers.cancel(timer);
        }
        if let Some(channel) = self.channel.take() {
            actions.push(ConnectionAction::Close(channel));
        }
        if self.state != ConnectionState::Disconnected {
            self.transition(ConnectionState::Disconnected, &mut actions);
        }
        actions
    }

    fn enter_fallback(
        &mut self,
        timers: &mut TimerQueue,
        now: Instant,
        actions: &mut Vec<ConnectionAction>,
    ) {
        if let Some(timer) = self.reconnect_timer.take() {
            timers.cancel(timer);
        }
        self.transition(ConnectionState::FallbackPolling, actions);

        if self.poll_timer.is_none() {
            self.poll_timer = Some(timers.arm_after(TimerKind::Poll, now, self.poll_interval));
        }
        actions.push(ConnectionAction::FetchSummary);

        if !self.fallback_announced {
            self.fallback_announced = true;
            actions.push(ConnectionAction::Notify {
                message: FALLBACK_MESSAGE.to_string(),
                category: Category::Warning,
            });
        }

        log::warn!(
            "{} FALLBACK_POLLING retries={} interval_ms={}",
            self.ctx,
            self.retries,
            self.poll_interval.as_millis()
        );
    }

    fn transition(&mut self, next: ConnectionState, actions: &mut Vec<ConnectionAction>) {
        debug_assert!(
            self.state.can_transition_to(next),
            "illegal transition {} -> {}",
            self.state,
            next
        );
        log::info!(
            "{} CONNECTION_STATE from={} to={}",
            self.ctx,
            self.state,
            next
        );
        self.state = next;
        actions.push(ConnectionAction::StatusChanged(next));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn manager() -> ConnectionManager {
        let ctx = LogContext::new("test-session");
        ConnectionManager::new(
            &ctx,
            Url::parse("ws://127.0.0.1:8081/ws").unwrap(),
            ReconnectPolicy::default(),
            Duration::from_secs(5),
        )
    }

    fn opened_channel(actions: &[ConnectionAction]) -> ChannelId {
        actions
            .iter()
            .find_map(|a| match a {
                ConnectionAction::Open { channel, .. } => Some(*channel),
                _ => None,
            })
            .expect("no open action")
    }

    #[test]
    fn test_open_resets_retries_and_notifies() {
        let mut timers = TimerQueue::new();
        let mut conn = manager();
        let t0 = Instant::now();

        let channel = opened_channel(&conn.connect(&mut timers));
        conn.on_closed(channel, Some("refused"), &mut timers, t0);
        assert_eq!(conn.retries(), 1);

        let fired = timers.pop_due(t0 + Duration::from_secs(2));
        let (id, kind) = fired[0];
        let channel = opened_channel(&conn.on_timer(id, kind, &mut timers, t0));

        let actions = conn.on_open(channel);
        assert_eq!(conn.state(), ConnectionState::Open);
        assert_eq!(conn.retries(), 0);
        assert!(actions.contains(&ConnectionAction::Notify {
            message: CONNECTED_MESSAGE.to_string(),
            category: Category::Success,
        }));
        assert!(conn.accepts(channel));
    }

    #[test]
    fn test_backoff_sequence_then_fallback() {
        let mut timers = TimerQueue::new();
        let mut conn = manager();
        let mut now = Instant::now();
        let mut delays = Vec::new();

        let mut channel = opened_channel(&conn.connect(&mut timers));
        loop {
            let actions = conn.on_closed(channel, None, &mut timers, now);
            if conn.state() == ConnectionState::FallbackPolling {
                assert!(actions.contains(&ConnectionAction::FetchSummary));
                break;
            }
            let deadline = timers.next_deadline().unwrap();
            delays.push(deadline.duration_since(now).as_millis() as u64);
            now = deadline;
            let fired = timers.pop_due(now);
            assert_eq!(fired.len(), 1);
            let (id, kind) = fired[0];
            channel = opened_channel(&conn.on_timer(id, kind, &mut timers, now));
        }

        assert_eq!(delays, vec![2_000, 4_000, 8_000, 16_000, 30_000]);
        assert!(!conn.reconnect_pending());
        assert!(conn.polling());
        assert_eq!(timers.count_where(|k| *k == TimerKind::Reconnect), 0);
        assert_eq!(timers.count_where(|k| *k == TimerKind::Poll), 1);

        // No further push attempts in fallback.
        assert!(conn.connect(&mut timers).is_empty());
    }

    #[test]
    fn test_fallback_polls_on_interval() {
        let mut timers = TimerQueue::new();
        let mut conn = manager();
        let mut now = Instant::now();

        let mut channel = opened_channel(&conn.connect(&mut timers));
        while conn.state() != ConnectionState::FallbackPolling {
            conn.on_closed(channel, None, &mut timers, now);
            if conn.state() == ConnectionState::FallbackPolling {
                break;
            }
            now = timers.next_deadline().unwrap();
            let (id, kind) = timers.pop_due(now)[0];
            channel = opened_channel(&conn.on_timer(id, kind, &mut timers, now));
        }

        for _ in 0..3 {
            now += Duration::from_secs(5);
            let fired = timers.pop_due(now);
            assert_eq!(fired.len(), 1);
            let (id, kind) = fired[0];
            assert_eq!(
                conn.on_timer(id, kind, &mut timers, now),
                vec![ConnectionAction::FetchSummary]
            );
        }
        assert_eq!(timers.len(), 1);
    }

    #[test]
    fn test_fallback_notification_once() {
        let mut timers = TimerQueue::new();
        let mut conn = ConnectionManager::new(
            &LogContext::new("s"),
            Url::parse("ws://h/ws").unwrap(),
            ReconnectPolicy {
                max_retries: 0,
                ..ReconnectPolicy::default()
            },
            Duration::from_secs(5),
        );
        let now = Instant::now();
        let channel = opened_channel(&conn.connect(&mut timers));
        let actions = conn.on_closed(channel, None, &mut timers, now);
        let notices = actions
            .iter()
            .filter(|a| matches!(a, ConnectionAction::Notify { .. }))
            .count();
        assert_eq!(notices, 1);
        assert_eq!(conn.state(), ConnectionState::FallbackPolling);
    }

    #[test]
    fn test_stale_channel_events_are_ignored() {
        let mut timers = TimerQueue::new();
        let mut conn = manager();
        let now = Instant::now();

        let first = opened_channel(&conn.connect(&mut timers));
        assert!(conn
            .on_closed(first, None, &mut timers, now)
            .contains(&ConnectionAction::Close(first)));
        // Duplicate close for the same instance is a no-op.
        assert!(conn.on_closed(first, None, &mut timers, now).is_empty());
        assert_eq!(conn.retries(), 1);
        assert_eq!(timers.count_where(|k| *k == TimerKind::Reconnect), 1);

        // An old instance completing its handshake gets closed.
        assert_eq!(conn.on_open(first), vec![ConnectionAction::Close(first)]);
        assert!(!conn.accepts(first));
    }

    #[test]
    fn test_manual_connect_while_reconnecting_cancels_timer() {
        let mut timers = TimerQueue::new();
        let mut conn = manager();
        let now = Instant::now();

        let first = opened_channel(&conn.connect(&mut timers));
        conn.on_closed(first, None, &mut timers, now);
        assert!(conn.reconnect_pending());

        let actions = conn.connect(&mut timers);
        assert!(!conn.reconnect_pending());
        assert!(timers.is_empty());
        assert_ne!(opened_channel(&actions), first);
    }

    #[test]
    fn test_shutdown_releases_everything() {
        let mut timers = TimerQueue::new();
        let mut conn = manager();
        let channel = opened_channel(&conn.connect(&mut timers));
        conn.on_open(channel);

        let actions = conn.shutdown(&mut timers);
        assert!(actions.contains(&ConnectionAction::Close(channel)));
        assert_eq!(conn.state(), ConnectionState::Disconnected);
        assert!(timers.is_empty());
    }
}
