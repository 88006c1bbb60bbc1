//! Async IO around the dashboard core: push-channel tasks and HTTP
//! requests on a single-threaded tokio runtime.

pub mod channel;
pub mod driver;

pub use channel::*;
pub use driver::*;
