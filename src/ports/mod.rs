//! Ports layer: Trait definitions for external operations.
//!
//! Following Hexagonal Architecture, these traits define the boundaries
//! between the application and external systems (the MedPredict API, the
//! session holder, document output).

mod backend;
mod report;
mod session;

pub use backend::{
    ApiError, ApiEvent, HealthBackend, PredictRequest, RegisterRequest, SharedBackend,
};
pub use report::{ReportError, ReportWriter};
pub use session::{SessionEvent, SessionStore};
