//! Dashboard HTTP API: summary fetches, submissions, remediation and
//! log-source control.

pub mod http;
pub mod types;

pub use http::*;
pub use types::*;
