//! User-visible notifications.
//!
//! An auto-expiring toast queue, decoupled from dashboard data state, plus
//! the audio cue played for urgent notifications.

pub mod audio;
pub mod queue;

pub use audio::*;
pub use queue::*;
