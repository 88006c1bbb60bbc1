//! Timer scheduling.
//!
//! One queue of one-shot deadlines shared by every component. Components
//! keep the `TimerId`s they arm and cancel them on teardown.

pub mod timers;

pub use timers::*;
