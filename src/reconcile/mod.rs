//! Reconciliation of server state into view state.
//!
//! A full summary replaces every derived panel wholesale; decision lists go
//! through a count diff so an unchanged feed is never redrawn; threat
//! updates produce markers, notifications and a re-fetch request.

pub mod engine;
pub mod funnel;
pub mod mitre;
pub mod view;

pub use engine::*;
pub use funnel::*;
pub use mitre::*;
pub use view::*;
