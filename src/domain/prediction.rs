//! Prediction result types.
//!
//! Represents the risk assessment returned by the remote prediction service.
//! Two response shapes exist: one carrying only a named risk level and one
//! carrying an explicit color next to the level. Both are folded into a single
//! [`RiskAssessment`] at the API boundary.

use serde::{Deserialize, Serialize};

use super::DiseaseType;

/// Risk level category assigned by the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RiskLevel {
    /// No significant indicators
    Low,
    /// Follow-up recommended
    Moderate,
    /// Synonym of `Moderate` used by some backend paths
    Medium,
    /// Intervention recommended
    High,
    /// Immediate attention required
    Critical,
}

impl RiskLevel {
    /// Levels shown on charts, in display order. `Medium` is folded into `Moderate`.
    pub const CHART_ORDER: [RiskLevel; 4] = [
        RiskLevel::Low,
        RiskLevel::Moderate,
        RiskLevel::High,
        RiskLevel::Critical,
    ];

    /// Parse a backend label. Matching is exact apart from surrounding whitespace.
    #[must_use]
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim() {
            "Low" => Some(Self::Low),
            "Moderate" => Some(Self::Moderate),
            "Medium" => Some(Self::Medium),
            "High" => Some(Self::High),
            "Critical" => Some(Self::Critical),
            _ => None,
        }
    }

    /// Canonical level for table lookups: `Medium` becomes `Moderate`.
    #[must_use]
    pub fn normalized(self) -> Self {
        match self {
            Self::Medium => Self::Moderate,
            other => other,
        }
    }

    #[must_use]
    pub fn label(&self) -> &'static str {
        match self {
            Self::Low => "Low",
            Self::Moderate => "Moderate",
            Self::Medium => "Medium",
            Self::High => "High",
            Self::Critical => "Critical",
        }
    }

    /// Get a human-readable description.
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self.normalized() {
            Self::Low => "Low risk - No significant indicators",
            Self::High => "High risk - Consultation advised",
            Self::Critical => "Critical risk - Immediate medical attention",
            _ => "Moderate risk - Follow-up recommended",
        }
    }
}

impl std::fmt::Display for RiskLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

/// Explicit risk color sent by the newer response shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskColor {
    Green,
    Orange,
    Red,
    #[serde(rename = "darkred")]
    DarkRed,
}

impl RiskColor {
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name.trim().to_ascii_lowercase().as_str() {
            "green" => Some(Self::Green),
            "orange" => Some(Self::Orange),
            "red" => Some(Self::Red),
            "darkred" => Some(Self::DarkRed),
            _ => None,
        }
    }
}

/// Presentation tone of a risk, shared by the terminal and PDF renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskTone {
    Success,
    Warning,
    Danger,
    Severe,
    Neutral,
}

impl RiskTone {
    /// Resolve from an explicit color first, then from the level name,
    /// falling back to `Neutral` when neither is known.
    #[must_use]
    pub fn resolve(level: Option<RiskLevel>, color: Option<RiskColor>) -> Self {
        if let Some(color) = color {
            return match color {
                RiskColor::Green => Self::Success,
                RiskColor::Orange => Self::Warning,
                RiskColor::Red => Self::Danger,
                RiskColor::DarkRed => Self::Severe,
            };
        }

        match level {
            Some(RiskLevel::Low) => Self::Success,
            Some(RiskLevel::Moderate | RiskLevel::Medium) => Self::Warning,
            Some(RiskLevel::High) => Self::Danger,
            Some(RiskLevel::Critical) => Self::Severe,
            None => Self::Neutral,
        }
    }

    /// RGB components for document output.
    #[must_use]
    pub fn rgb(&self) -> (u8, u8, u8) {
        match self {
            Self::Success => (5, 150, 105),  // Emerald (#059669)
            Self::Warning => (217, 119, 6),  // Amber (#D97706)
            Self::Danger => (220, 38, 38),   // Red (#DC2626)
            Self::Severe => (153, 27, 27),   // Dark red (#991B1B)
            Self::Neutral => (31, 41, 55),   // Gray (#1F2937)
        }
    }
}

/// Canonical risk classification, independent of the response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RiskAssessment {
    /// Label exactly as the backend sent it
    pub label: String,
    /// Parsed level, if the label is a known one
    pub level: Option<RiskLevel>,
    pub color: Option<RiskColor>,
}

impl RiskAssessment {
    /// Build from the raw wire fields.
    #[must_use]
    pub fn from_wire(label: &str, color: Option<&str>) -> Self {
        Self {
            label: label.trim().to_string(),
            level: RiskLevel::from_label(label),
            color: color.and_then(RiskColor::from_name),
        }
    }

    #[must_use]
    pub fn tone(&self) -> RiskTone {
        RiskTone::resolve(self.level, self.color)
    }
}

/// Outcome of one prediction request.
#[derive(Debug, Clone, PartialEq)]
pub struct PredictionResult {
    /// Probability of disease (0.0 to 1.0)
    pub probability: f64,
    pub risk: RiskAssessment,
    /// Free-text clinical advice, when the backend supplies it
    pub risk_advice: Option<String>,
}

impl PredictionResult {
    /// Probability rendered as a percentage with one decimal place.
    #[must_use]
    pub fn percentage(&self) -> String {
        format_percentage(self.probability)
    }
}

/// Format a probability as a percentage with one decimal place: `0.847` → `84.7%`.
#[must_use]
pub fn format_percentage(probability: f64) -> String {
    format!("{:.1}%", probability * 100.0)
}

/// A stored prediction as listed in history views.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictionRecord {
    pub id: u64,
    #[serde(default)]
    pub patient: Option<u64>,
    /// Raw disease identifier as stored by the backend
    pub disease_type: String,
    /// Binary prediction (0 = negative, 1 = positive)
    #[serde(default)]
    pub prediction: u8,
    pub probability: f64,
    #[serde(default)]
    pub risk_level: String,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl PredictionRecord {
    #[must_use]
    pub fn disease(&self) -> Option<DiseaseType> {
        DiseaseType::from_id(&self.disease_type)
    }

    /// Disease identifier with underscores replaced, for display.
    #[must_use]
    pub fn disease_label(&self) -> String {
        self.disease_type.replace('_', " ")
    }

    #[must_use]
    pub fn risk_level(&self) -> Option<RiskLevel> {
        RiskLevel::from_label(&self.risk_level)
    }

    #[must_use]
    pub fn is_positive(&self) -> bool {
        self.prediction == 1
    }
}
