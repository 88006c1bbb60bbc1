//! Security module.
//!
//! Neutralizes markup in server-supplied text before it is displayed.

pub mod markup;

pub use markup::*;
