//! Patient references used by providers when predicting on someone's behalf.

use serde::{Deserialize, Serialize};

/// A patient confirmed by the backend for a given patient code.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatientReference {
    /// Opaque identifier (the "patient code")
    pub id: String,
    pub full_name: String,
}

impl PatientReference {
    #[must_use]
    pub fn new(id: impl Into<String>, full_name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            full_name: full_name.into(),
        }
    }
}

/// Patient details shown on the provider dashboard.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct PatientDetails {
    pub id: u64,
    #[serde(default)]
    pub full_name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub date_joined: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(default)]
    pub total_predictions: u64,
}

impl PatientDetails {
    /// Up to two uppercase initials, falling back to the e-mail's first letter.
    #[must_use]
    pub fn initials(&self) -> String {
        let from_name: String = self
            .full_name
            .split_whitespace()
            .filter_map(|part| part.chars().next())
            .flat_map(char::to_uppercase)
            .take(2)
            .collect();

        if !from_name.is_empty() {
            return from_name;
        }

        self.email
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_else(|| "?".to_string())
    }
}
