//! Structured logging with session context.
//!
//! Provides logging macros and utilities that include the session id and,
//! where relevant, the emitting component in every log message.

pub mod structured;

pub use structured::*;
