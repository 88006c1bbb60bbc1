//! Routing of inbound frames to handlers.

use crate::logging::structured::LogContext;

use super::message::{
    Alert, ConnectionNotice, DispatchError, InboundMessage, LogSourceUpdate, MessageKind,
    RemediationNotice, ThreatUpdate,
};

/// Receiver of routed messages; one method per known tag.
pub trait MessageHandler {
    fn on_connection(&mut self, notice: ConnectionNotice);
    fn on_threat_update(&mut self, update: ThreatUpdate);
    fn on_alert(&mut self, alert: Alert);
    fn on_remediation(&mut self, notice: RemediationNotice);
    fn on_log_source_update(&mut self, update: LogSourceUpdate);
}

/// What happened to one frame.
#[derive(Debug, Clone, PartialEq)]
pub enum DispatchOutcome {
    Handled(MessageKind),
    Ignored(String),
    Dropped(DispatchError),
}

/// Running totals, for diagnostics.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchStats {
    pub handled: u64,
    pub ignored: u64,
    pub dropped: u64,
}

/// Routes parsed frames to exactly one handler method.
///
/// A bad frame is logged and dropped; it never propagates to the channel.
#[derive(Debug)]
pub struct Dispatcher {
    ctx: LogContext,
    stats: DispatchStats,
}

impl Dispatcher {
    pub fn new(ctx: &LogContext) -> Self {
        Self {
            ctx: ctx.with_component("dispatch"),
            stats: DispatchStats::default(),
        }
    }

    pub fn stats(&self) -> DispatchStats {
        self.stats
    }

    /// Parse and route one text frame.
    pub fn dispatch<H: MessageHandler>(&mut self, raw: &str, handler: &mut H) -> DispatchOutcome {
        match InboundMessage::parse(raw) {
            Ok(message) => self.route(message, handler),
            Err(e) => {
                log::warn!(
                    "{} MESSAGE_DROPPED error={} bytes={}",
                    self.ctx,
                    e,
                    raw.len()
                );
                self.stats.dropped += 1;
                DispatchOutcome::Dropped(e)
            }
        }
    }

    /// Route an already parsed message.
    pub fn route<H: MessageHandler>(
        &mut self,
        message: InboundMessage,
        handler: &mut H,
    ) -> DispatchOutcome {
        let kind = message.kind();
        match message {
            InboundMessage::Connection(notice) => handler.on_connection(notice),
            InboundMessage::ThreatUpdate(update) => handler.on_threat_update(update),
            InboundMessage::Alert(alert) => handler.on_alert(alert),
            InboundMessage::Remediation(notice) => handler.on_remediation(notice),
            InboundMessage::LogSourceUpdate(update) => handler.on_log_source_update(update),
            InboundMessage::Unknown(tag) => {
                log::info!("{} MESSAGE_IGNORED type={}", self.ctx, tag);
                self.stats.ignored += 1;
                return DispatchOutcome::Ignored(tag);
            }
        }

        log::debug!("{} MESSAGE_ROUTED type={}", self.ctx, kind.as_str());
        self.stats.handled += 1;
        DispatchOutcome::Handled(kind)
    }
}
