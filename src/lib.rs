//! # MedPredict
//!
//! Terminal client for the MedPredict disease-risk prediction service.
//!
//! This crate provides:
//! - Per-disease feature schemas and the prediction workflow state machine
//! - Risk rendering, PDF reports and CSV history export
//! - A terminal UI for patients, providers and administrators
//!
//! ## Architecture
//!
//! The crate follows Hexagonal Architecture:
//! - `domain`: Core business types (diseases, schemas, risk, identities)
//! - `ports`: Trait definitions for external operations
//! - `adapters`: Concrete implementations (reqwest, printpdf, csv)
//! - `application`: Use cases orchestrating domain and ports
//! - `tui`: Terminal user interface

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
pub mod tui;

pub use config::ClientConfig;
pub use domain::{DiseaseType, PredictionResult, RiskLevel};

/// Result type for MedPredict operations
pub type Result<T> = std::result::Result<T, MedPredictError>;

/// Main error type for MedPredict
#[derive(Debug, thiserror::Error)]
pub enum MedPredictError {
    #[error("Backend request failed: {0}")]
    Api(#[from] ports::ApiError),

    #[error("Prediction workflow error: {0}")]
    Workflow(#[from] application::WorkflowError),

    #[error("Report generation failed: {0}")]
    Report(#[from] ports::ReportError),

    #[error("Export failed: {0}")]
    Export(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
