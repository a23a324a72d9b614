//! Ingestion core for the job market display widget.
//!
//! A published spreadsheet export is fetched as CSV, mapped onto a typed
//! [`report::Report`] through a configurable addressing table, and kept in a
//! time-bounded cache so refreshes inside the TTL skip the network.

pub mod cache;
pub mod config;
pub mod error;
pub mod extract;
pub mod loader;
pub mod refresh;
pub mod report;
pub mod source;
pub mod telemetry;

pub use extract::{extract, ExtractorConfig};
pub use report::Report;
