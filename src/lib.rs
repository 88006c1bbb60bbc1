//! ThreatLens Sync - real-time synchronization layer for the ThreatLens
//! security dashboard
//!
//! Keeps the dashboard's visual surfaces (charts, 3D threat globe,
//! investigation graph, decision feed, toasts) consistent with the server's
//! threat state, delivered over a push channel with a polling fallback.
//! The implementation prioritizes:
//!
//! 1. **Determinism** - the session core performs no IO and reads no clock
//! 2. **No redundant redraws** - reconciliation decides what redraws
//! 3. **Logging** - every transition logged with session context
//!
//! ## Architecture
//!
//! The crate is organized into modules:
//! - `sync` - Session core (`Dashboard`) and fetch coalescing
//! - `connection` - Push-channel state machine, backoff, endpoints
//! - `dispatch` - Typed parsing and routing of inbound messages
//! - `reconcile` - View state, funnel and MITRE derivations, feed diffing
//! - `render` - Renderer capability, surfaces and backends
//! - `notify` - Auto-expiring notification queue and audio cues
//! - `sources` - Log-source panel with optimistic toggles
//! - `client` - Dashboard HTTP API
//! - `runtime` - tokio driver executing the core's commands
//! - `scheduling` - One-shot timer queue
//! - `model` - Wire types
//! - `security` - Display-text sanitization
//! - `config` - Settings and environment overrides
//! - `logging` - Structured logging with session context

pub mod client;
pub mod config;
pub mod connection;
pub mod dispatch;
pub mod error;
pub mod logging;
pub mod model;
pub mod notify;
pub mod reconcile;
pub mod render;
pub mod runtime;
pub mod scheduling;
pub mod security;
pub mod sources;
pub mod sync;

pub use config::SyncConfig;
pub use error::{Result, SyncError};
pub use runtime::{Driver, DriverHandle};
pub use sync::{Command, Dashboard, Input};

/// Initialize the process-wide logger. `RUST_LOG` refines the default
/// `info` level; repeated calls are no-ops.
pub fn init_logger() {
    let _ = env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .format_timestamp_millis()
        .try_init();
}
