//! Structured logging utilities.
//!
//! Provides context-aware logging with session_id and component included
//! in every log message.

use std::fmt;

use uuid::Uuid;

/// Logging context for one dashboard session.
#[derive(Debug, Clone)]
pub struct LogContext {
    pub session_id: String,
    pub component: Option<&'static str>,
}

impl LogContext {
    pub fn new(session_id: &str) -> Self {
        Self {
            session_id: session_id.to_string(),
            component: None,
        }
    }

    /// Fresh context with a random short session id.
    pub fn generate() -> Self {
        Self::new(&format!("session-{}", &Uuid::new_v4().to_string()[..8]))
    }

    pub fn with_component(&self, component: &'static str) -> Self {
        Self {
            session_id: self.session_id.clone(),
            component: Some(component),
        }
    }
}

impl fmt::Display for LogContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.component {
            Some(component) => write!(
                f,
                "[session={}] [component={}]",
                self.session_id, component
            ),
            None => write!(f, "[session={}]", self.session_id),
        }
    }
}

/// Log an info message with context.
#[macro_export]
macro_rules! log_info {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::info!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a warning message with context.
#[macro_export]
macro_rules! log_warn {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::warn!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log an error message with context.
#[macro_export]
macro_rules! log_error {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::error!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

/// Log a debug message with context.
#[macro_export]
macro_rules! log_debug {
    ($ctx:expr, $event:expr, $($key:ident = $value:expr),* $(,)?) => {
        log::debug!(
            "{} {} {}",
            $ctx,
            $event,
            format_args!(concat!($(stringify!($key), "={:?} "),*), $($value),*)
        );
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_context_display() {
        let ctx = LogContext::new("session-123");
        assert_eq!(format!("{}", ctx), "[session=session-123]");

        let ctx_with_component = ctx.with_component("connection");
        assert_eq!(
            format!("{}", ctx_with_component),
            "[session=session-123] [component=connection]"
        );
    }

    #[test]
    fn test_generated_session_id() {
        let ctx = LogContext::generate();
        assert!(ctx.session_id.starts_with("session-"));
        assert_eq!(ctx.session_id.len(), "session-".len() + 8);
    }

    #[test]
    fn test_macros_expand() {
        let ctx = LogContext::new("s");
        crate::log_info!(ctx, "TEST_EVENT", count = 3, label = "x");
        crate::log_debug!(ctx, "TEST_EVENT", flag = true);
        crate::log_warn!(ctx, "TEST_EVENT",);
    }
}
