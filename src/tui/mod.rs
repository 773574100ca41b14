//! TUI module: Terminal User Interface using Ratatui.
//!
//! Provides a medical-themed interface for:
//! - Sign-in and account registration
//! - Role-specific dashboards
//! - Disease-risk prediction with PDF reports
//! - Prediction history with CSV export
//! - Admin analytics

mod app;
mod styles;
mod ui;

pub use app::{App, Screen};
pub use styles::{MedicalTheme, RiskStyle};
