//! The dashboard core.
//!
//! `Dashboard` owns every component of one session and performs no IO:
//! the driver feeds it `Input`s with the current instant and executes the
//! `Command`s it returns. Timer firing is explicit through `fire_due`, so
//! every timing behavior can be exercised with synthetic instants.

use std::time::{Duration, Instant};

use crate::config::SyncConfig;
use crate::connection::{
    push_endpoint, ConnectionAction, ConnectionManager, ConnectionState, ReconnectPolicy,
};
use crate::dispatch::{
    Alert, ConnectionNotice, DispatchStats, Dispatcher, LogSourceUpdate, MessageHandler,
    RemediationNotice, ThreatUpdate,
};
use crate::error::Result;
use crate::logging::structured::LogContext;
use crate::model::{Category, ThreatSummary};
use crate::notify::{AudioCue, NotificationQueue};
use crate::reconcile::{ReconciliationEngine, ViewState};
use crate::render::{Backend, Module, RenderCx};
use crate::scheduling::{TimerKind, TimerQueue};
use crate::sources::{SourcePanel, ToggleOutcome};

use super::command::{Command, Input};
use super::context::SessionContext;
use super::fetch::SummaryFetcher;
use super::surfaces::Surfaces;

/// Session state reachable from message handlers.
struct Session {
    ctx: LogContext,
    notification_duration: Duration,
    timers: TimerQueue,
    connection: ConnectionManager,
    engine: ReconciliationEngine,
    fetcher: SummaryFetcher,
    notifications: NotificationQueue,
    sources: SourcePanel,
    surfaces: Surfaces,
    backend: Box<dyn Backend>,
    active: Module,
}

pub struct Dashboard {
    session_info: SessionContext,
    dispatcher: Dispatcher,
    session: Session,
}

impl Dashboard {
    pub fn new(
        config: &SyncConfig,
        backend: Box<dyn Backend>,
        audio: Box<dyn AudioCue>,
    ) -> Result<Self> {
        Self::with_session(SessionContext::new(&config.origin), config, backend, audio)
    }

    pub fn with_session(
        session_info: SessionContext,
        config: &SyncConfig,
        backend: Box<dyn Backend>,
        audio: Box<dyn AudioCue>,
    ) -> Result<Self> {
        let ctx = session_info.log_context();
        let endpoint = push_endpoint(&config.origin)?;
        let connection = ConnectionManager::new(
            &ctx,
            endpoint,
            ReconnectPolicy::from_config(config),
            config.poll_interval(),
        );

        log::info!(
            "{} SESSION_CREATED origin={} push={}",
            ctx,
            config.origin,
            connection.endpoint()
        );

        Ok(Self {
            dispatcher: Dispatcher::new(&ctx),
            session: Session {
                notification_duration: config.notification_duration(),
                timers: TimerQueue::new(),
                connection,
                engine: ReconciliationEngine::new(&ctx, config),
                fetcher: SummaryFetcher::new(),
                notifications: NotificationQueue::new(
                    &ctx,
                    config.max_visible_notifications,
                    audio,
                ),
                sources: SourcePanel::new(&ctx),
                surfaces: Surfaces::new(&ctx, config),
                backend,
                active: Module::Overview,
                ctx,
            },
            session_info,
        })
    }

    pub fn session(&self) -> &SessionContext {
        &self.session_info
    }

    pub fn connection_state(&self) -> ConnectionState {
        self.session.connection.state()
    }

    /// Text of the connection-status indicator.
    pub fn status_label(&self) -> &'static str {
        self.session.connection.state().indicator_label()
    }

    pub fn connection(&self) -> &ConnectionManager {
        &self.session.connection
    }

    pub fn view(&self) -> &ViewState {
        self.session.engine.view()
    }

    pub fn notifications(&self) -> &NotificationQueue {
        &self.session.notifications
    }

    pub fn sources(&self) -> &SourcePanel {
        &self.session.sources
    }

    pub fn surfaces(&self) -> &Surfaces {
        &self.session.surfaces
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.session.timers
    }

    pub fn active_module(&self) -> Module {
        self.session.active
    }

    pub fn dispatch_stats(&self) -> DispatchStats {
        self.dispatcher.stats()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.session.timers.next_deadline()
    }

    pub fn handle(&mut self, input: Input, now: Instant) -> Vec<Command> {
        let mut out = Vec::new();
        let s = &mut self.session;

        match input {
            Input::Start => {
                log::info!("{} SESSION_START", s.ctx);
                let actions = s.connection.connect(&mut s.timers);
                s.run_actions(actions, now, &mut out);
                s.request_summary(&mut out);
                out.push(Command::ListSources);
                s.activate(s.active, now);
            }
            Input::ChannelOpened(channel) => {
                let actions = s.connection.on_open(channel);
                let opened = s.connection.accepts(channel);
                s.run_actions(actions, now, &mut out);
                if opened {
                    s.request_summary(&mut out);
                }
            }
            Input::ChannelFrame(channel, raw) => {
                if !s.connection.accepts(channel) {
                    log::debug!("{} FRAME_FROM_STALE_CHANNEL channel={}", s.ctx, channel.0);
                } else {
                    let mut handler = Handler {
                        session: s,
                        now,
                        out: &mut out,
                    };
                    self.dispatcher.dispatch(&raw, &mut handler);
                }
            }
            Input::ChannelClosed { channel, reason } => {
                let actions =
                    s.connection
                        .on_closed(channel, reason.as_deref(), &mut s.timers, now);
                s.run_actions(actions, now, &mut out);
            }
            Input::SummaryFetched(result) => s.on_summary(result, now, &mut out),
            Input::SourcesListed(Ok(listing)) => s.sources.replace(listing),
            Input::SourcesListed(Err(e)) => {
                log::warn!("{} SOURCES_FETCH_FAILED error={}", s.ctx, e);
            }
            Input::ToggleSettled { source, result } => {
                if let ToggleOutcome::Reverted { reason, .. } =
                    s.sources.complete_toggle(&source, result)
                {
                    s.notify(
                        &format!("Failed to toggle {}: {}", source, reason),
                        Category::Error,
                        now,
                    );
                }
            }
            Input::RemediationSettled { threat_id, result } => match result {
                Ok(response) if response.is_success() => {
                    s.notify(
                        &format!("Remediation applied for {}", threat_id),
                        Category::Success,
                        now,
                    );
                    s.request_summary(&mut out);
                }
                Ok(response) => {
                    let detail = response.message.unwrap_or(response.status);
                    s.notify(
                        &format!("Remediation failed for {}: {}", threat_id, detail),
                        Category::Error,
                        now,
                    );
                }
                Err(e) => {
                    log::warn!(
                        "{} REMEDIATION_FAILED threat_id={} error={}",
                        s.ctx,
                        threat_id,
                        e
                    );
                    s.notify(
                        &format!("Remediation failed for {}: {}", threat_id, e),
                        Category::Error,
                        now,
                    );
                }
            },
            Input::SubmissionSettled { label, result } => match result {
                Ok(()) => {
                    s.notify(&format!("{} complete", label), Category::Success, now);
                    s.request_summary(&mut out);
                }
                Err(e) => {
                    log::warn!("{} SUBMISSION_FAILED kind={} error={}", s.ctx, label, e);
                    s.notify(&format!("{} failed: {}", label, e), Category::Error, now);
                }
            },
            Input::Refresh => s.request_summary(&mut out),
            Input::Remediate(threat_id) => {
                log::info!("{} REMEDIATE threat_id={}", s.ctx, threat_id);
                out.push(Command::Remediate(threat_id));
            }
            Input::ToggleSource(source) => {
                if s.sources.begin_toggle(&source).is_some() {
                    out.push(Command::ToggleSource(source));
                } else {
                    log::debug!("{} TOGGLE_IGNORED source={}", s.ctx, source);
                }
            }
            Input::Submit(submission) => {
                log::info!("{} SUBMIT kind={}", s.ctx, submission.label());
                out.push(Command::Submit(submission));
            }
            Input::Navigate(module) => s.navigate(module, now),
            Input::DragStart(node) => {
                s.surfaces.graph.drag_start(&node);
            }
            Input::DragMove { x, y } => s.surfaces.graph.drag_move(x, y),
            Input::DragEnd => s.surfaces.graph.drag_end(),
            Input::Dismiss(id) => {
                s.notifications.dismiss(id, &mut s.timers, now);
            }
            Input::Shutdown => {
                let actions = s.connection.shutdown(&mut s.timers);
                s.run_actions(actions, now, &mut out);
                s.notifications.clear(&mut s.timers);
                let active = s.active;
                let mut cx = RenderCx::new(s.backend.as_mut(), &mut s.timers, now);
                s.surfaces.deactivate(active, &mut cx);
                log::info!("{} SESSION_SHUTDOWN", s.ctx);
            }
        }
        out
    }

    /// Fire every timer due at `now`.
    pub fn fire_due(&mut self, now: Instant) -> Vec<Command> {
        let mut out = Vec::new();
        let s = &mut self.session;

        for (id, kind) in s.timers.pop_due(now) {
            match kind {
                TimerKind::Reconnect | TimerKind::Poll => {
                    let actions = s.connection.on_timer(id, kind, &mut s.timers, now);
                    s.run_actions(actions, now, &mut out);
                }
                TimerKind::NotificationExpiry(notification) => {
                    s.notifications
                        .on_expired(id, notification, &mut s.timers, now);
                }
                TimerKind::MarkerSweep => {
                    let mut cx = RenderCx::new(s.backend.as_mut(), &mut s.timers, now);
                    s.surfaces.on_marker_sweep(id, &mut cx);
                }
                TimerKind::AnimationFrame(surface) => {
                    let mut cx = RenderCx::new(s.backend.as_mut(), &mut s.timers, now);
                    s.surfaces.on_frame(surface, id, &mut cx);
                }
            }
        }
        out
    }
}

impl std::fmt::Debug for Dashboard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dashboard")
            .field("session", &self.session_info.session_id)
            .field("state", &self.session.connection.state())
            .field("active", &self.session.active)
            .field("timers", &self.session.timers.len())
            .finish()
    }
}

impl Session {
    fn notify(&mut self, message: &str, category: Category, now: Instant) {
        self.notifications.show(
            message,
            category,
            self.notification_duration,
            &mut self.timers,
            now,
        );
    }

    fn request_summary(&mut self, out: &mut Vec<Command>) {
        if self.fetcher.request() {
            out.push(Command::FetchSummary);
        } else {
            log::debug!("{} SUMMARY_FETCH_COALESCED", self.ctx);
        }
    }

    fn run_actions(&mut self, actions: Vec<ConnectionAction>, now: Instant, out: &mut Vec<Command>) {
        for action in actions {
            match action {
                ConnectionAction::Open { channel, url } => {
                    out.push(Command::OpenChannel { channel, url })
                }
                ConnectionAction::Close(channel) => out.push(Command::CloseChannel(channel)),
                ConnectionAction::FetchSummary => self.request_summary(out),
                ConnectionAction::Notify { message, category } => {
                    self.notify(&message, category, now)
                }
                ConnectionAction::StatusChanged(state) => {
                    log::info!(
                        "{} STATUS_INDICATOR state={} label={:?}",
                        self.ctx,
                        state,
                        state.indicator_label()
                    );
                }
            }
        }
    }

    fn on_summary(
        &mut self,
        result: std::result::Result<ThreatSummary, String>,
        now: Instant,
        out: &mut Vec<Command>,
    ) {
        if self.fetcher.complete() {
            out.push(Command::FetchSummary);
        }
        match result {
            Ok(summary) => {
                let plan = self.engine.apply_full_summary(summary);
                let mut cx = RenderCx::new(self.backend.as_mut(), &mut self.timers, now);
                self.surfaces
                    .apply_plan(&plan, self.engine.view(), self.active, &mut cx);
            }
            Err(e) => {
                // Retried by the next push, poll or explicit refresh.
                log::warn!("{} SUMMARY_FETCH_FAILED error={}", self.ctx, e);
            }
        }
    }

    fn activate(&mut self, module: Module, now: Instant) {
        let mut cx = RenderCx::new(self.backend.as_mut(), &mut self.timers, now);
        self.surfaces
            .activate(module, self.engine.view(), &mut cx);
    }

    fn navigate(&mut self, module: Module, now: Instant) {
        if module != self.active {
            let previous = self.active;
            let mut cx = RenderCx::new(self.backend.as_mut(), &mut self.timers, now);
            self.surfaces.deactivate(previous, &mut cx);
            self.active = module;
        }
        log::info!("{} NAVIGATE module={:?}", self.ctx, module);
        self.activate(module, now);
    }
}

/// Routes dispatched messages into the session.
struct Handler<'a> {
    session: &'a mut Session,
    now: Instant,
    out: &'a mut Vec<Command>,
}

impl MessageHandler for Handler<'_> {
    fn on_connection(&mut self, notice: ConnectionNotice) {
        log::debug!(
            "{} SERVER_GREETING status={} message={:?}",
            self.session.ctx,
            notice.status,
            notice.message
        );
    }

    fn on_threat_update(&mut self, update: ThreatUpdate) {
        let s = &mut *self.session;
        let effects = s.engine.apply_threat_update(&update, self.now);

        let mut cx = RenderCx::new(s.backend.as_mut(), &mut s.timers, self.now);
        s.surfaces.add_markers(&effects.markers, &mut cx);

        for (message, category) in effects.notifications {
            s.notify(&message, category, self.now);
        }
        if effects.refetch {
            s.request_summary(self.out);
        }
    }

    fn on_alert(&mut self, alert: Alert) {
        let category = alert.severity.urgency();
        self.session.notify(&alert.message, category, self.now);
    }

    fn on_remediation(&mut self, notice: RemediationNotice) {
        self.session.notify(
            &format!("Threat {} remediated", notice.threat_id),
            Category::Info,
            self.now,
        );
        self.session.request_summary(self.out);
    }

    fn on_log_source_update(&mut self, update: LogSourceUpdate) {
        self.session.sources.apply_stats(&update.source, update.stats);
    }
}
