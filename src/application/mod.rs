//! Application layer: Use cases and services.
//!
//! This module orchestrates domain logic with ports to implement
//! the core use cases of the client.

mod analytics;
mod auth;
pub mod history;
mod prediction;
mod report;
mod worker;

#[cfg(test)]
pub(crate) mod testing;

pub use analytics::{AnalyticsError, AnalyticsService, AnalyticsView, Slice};
pub use auth::{guard, validate_registration, AuthError, AuthService, FieldError, RouteDecision};
pub use history::{HistoryPage, HistoryQuery, HistoryService, PatientSummary};
pub use prediction::{
    extract_error_message, PredictionWorkflow, SubmitOutcome, VerifyError, WorkflowError,
    WorkflowEvent, WorkflowStatus,
};
pub use report::{
    build_report, generate_report, wrap_text, Report, ReportBlock, ReportSubject, TextStyle,
};
pub use worker::{BackgroundTask, TaskPoll};
