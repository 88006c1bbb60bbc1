//! Connection lifecycle states.

use std::fmt;

/// Lifecycle of the push channel. Exactly one is active per session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum ConnectionState {
    #[default]
    Disconnected,
    Connecting,
    Open,
    Reconnecting,
    FallbackPolling,
}

impl ConnectionState {
    /// Whether `self -> next` is a legal transition.
    pub fn can_transition_to(&self, next: ConnectionState) -> bool {
        use ConnectionState::*;
        matches!(
            (self, next),
            (Disconnected, Connecting)
                | (Connecting, Open)
                | (Connecting, Reconnecting)
                | (Connecting, Disconnected)
                | (Open, Reconnecting)
                | (Open, Disconnected)
                | (Reconnecting, Connecting)
                | (Reconnecting, FallbackPolling)
                | (Reconnecting, Disconnected)
                | (FallbackPolling, Disconnected)
        )
    }

    /// Text for the connection-status indicator.
    pub fn indicator_label(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "Offline",
            ConnectionState::Connecting => "Connecting…",
            ConnectionState::Open => "Live",
            ConnectionState::Reconnecting => "Reconnecting",
            ConnectionState::FallbackPolling => "Polling",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Connecting => "connecting",
            ConnectionState::Open => "open",
            ConnectionState::Reconnecting => "reconnecting",
            ConnectionState::FallbackPolling => "fallback_polling",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ConnectionState; 5] = [
        ConnectionState::Disconnected,
        ConnectionState::Connecting,
        ConnectionState::Open,
        ConnectionState::Reconnecting,
        ConnectionState::FallbackPolling,
    ];

    #[test]
    fn test_every_state_has_an_exit() {
        for state in ALL {
            assert!(
                ALL.iter().any(|next| state.can_transition_to(*next)),
                "{} has no exit",
                state
            );
        }
    }

    #[test]
    fn test_fallback_only_from_reconnecting() {
        for state in ALL {
            let allowed = state.can_transition_to(ConnectionState::FallbackPolling);
            assert_eq!(allowed, state == ConnectionState::Reconnecting);
        }
    }
}
