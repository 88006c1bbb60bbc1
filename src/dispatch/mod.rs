//! Inbound message dispatch.
//!
//! Parses push-channel frames into a closed set of message variants and
//! routes each to exactly one handler:
//! - `connection` - server greeting
//! - `threat_update` - change notification with newly reported threats
//! - `alert` - free-form alert for a toast
//! - `remediation` - a threat was remediated
//! - `log_source_update` - per-source ingestion statistics

pub mod message;
pub mod router;

pub use message::*;
pub use router::*;
