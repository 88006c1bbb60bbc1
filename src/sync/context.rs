//! Session context.
//!
//! One dashboard session: its id, start time and origin, used for log
//! prefixes and diagnostics.

use chrono::{DateTime, Utc};

use crate::logging::structured::LogContext;

#[derive(Debug, Clone)]
pub struct SessionContext {
    pub session_id: String,
    pub started_at: DateTime<Utc>,
    pub origin: String,
}

impl SessionContext {
    pub fn new(origin: &str) -> Self {
        let log = LogContext::generate();
        Self {
            session_id: log.session_id,
            started_at: Utc::now(),
            origin: origin.to_string(),
        }
    }

    /// Fixed session id, for reproducible logs in tests.
    pub fn with_id(session_id: &str, origin: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            started_at: Utc::now(),
            origin: origin.to_string(),
        }
    }

    pub fn log_context(&self) -> LogContext {
        LogContext::new(&self.session_id)
    }

    pub fn uptime(&self) -> chrono::Duration {
        Utc::now() - self.started_at
    }
}
