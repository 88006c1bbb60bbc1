//! Push-channel connection management.
//!
//! Owns the channel lifecycle:
//! - `state` - the five-state lifecycle and its legal transitions
//! - `backoff` - reconnect delay policy
//! - `endpoint` - push/HTTP endpoints derived from the page origin
//! - `manager` - the state machine itself

pub mod backoff;
pub mod endpoint;
pub mod manager;
pub mod state;

pub use backoff::*;
pub use endpoint::*;
pub use manager::*;
pub use state::*;
