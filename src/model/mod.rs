//! Wire and view models.
//!
//! Types received from the dashboard server: the full summary snapshot,
//! AI decisions, newly reported threats and severity labels.

pub mod counts;
pub mod severity;
pub mod summary;
pub mod threat;
pub mod wire;

pub use counts::*;
pub use severity::*;
pub use summary::*;
pub use threat::*;
pub use wire::parse_timestamp;
