//! Adapters layer: Concrete implementations of ports.
//!
//! These modules contain the actual integration with external libraries:
//! - `http`: reqwest client for the MedPredict API
//! - `session`: in-memory session store
//! - `pdf`: printpdf report writer
//! - `export`: CSV history export via the csv crate
//! - `sanitize`: credential and patient-id filtering for logs

pub mod export;
pub mod http;
pub mod pdf;
pub mod sanitize;
pub mod session;

pub use http::HttpBackend;
pub use pdf::PdfReportWriter;
pub use session::InMemorySessionStore;
