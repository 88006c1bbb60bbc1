//! Log ingestion sources as shown in the dashboard.

pub mod panel;

pub use panel::*;
