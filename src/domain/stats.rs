//! System-wide statistics returned to administrators.

use std::collections::HashMap;

use serde::Deserialize;

/// Aggregate counts for the admin analytics view.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AdminStats {
    #[serde(default)]
    pub total_patients: u64,
    #[serde(default)]
    pub total_providers: u64,
    #[serde(default)]
    pub total_predictions: u64,
    /// Disease identifier → count
    #[serde(default)]
    pub predictions_by_disease: HashMap<String, u64>,
    /// Risk level label → count
    #[serde(default)]
    pub predictions_by_risk_level: HashMap<String, u64>,
    #[serde(default)]
    pub recent_registrations: Vec<Registration>,
    #[serde(default)]
    pub daily_predictions: Vec<DailyCount>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Registration {
    pub username: String,
    pub role: String,
    #[serde(default)]
    pub date_joined: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DailyCount {
    pub date: chrono::NaiveDate,
    pub count: u64,
}
