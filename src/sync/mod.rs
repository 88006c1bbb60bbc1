//! Dashboard session core.
//!
//! Coordinates the session's components without performing IO:
//! 1. Connection lifecycle and fallback polling
//! 2. Dispatch of push-channel frames
//! 3. Summary fetch coalescing
//! 4. Reconciliation and surface redraws
//! 5. Notifications, log sources, remediation and submissions

pub mod command;
pub mod context;
pub mod controller;
pub mod fetch;
pub mod surfaces;

pub use command::*;
pub use context::*;
pub use controller::*;
pub use fetch::*;
pub use surfaces::*;
