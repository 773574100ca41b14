//! Domain layer: Core business types and logic.
//!
//! Pure types with no I/O. Wire formats live in the HTTP adapter; everything
//! here is what the rest of the client works with.

mod disease;
mod patient;
mod prediction;
pub mod recommendations;
pub mod schema;
mod session;
mod stats;

pub use disease::DiseaseType;
pub use patient::{PatientDetails, PatientReference};
pub use prediction::{
    format_percentage, PredictionRecord, PredictionResult, RiskAssessment, RiskColor, RiskLevel,
    RiskTone,
};
pub use schema::{get_schema, schema_for, FeatureVector, FieldSpec};
pub use session::{username_from_email, Identity, RegistrationForm, Role};
pub use stats::{AdminStats, DailyCount, Registration};
