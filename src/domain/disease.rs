//! Disease identifiers supported by the prediction backend.

use serde::{Deserialize, Serialize};

/// Disease selecting a field schema and a recommendation set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DiseaseType {
    Heart,
    Diabetes,
    Hypertension,
    Stroke,
}

impl DiseaseType {
    /// All diseases, in menu order.
    pub const ALL: [DiseaseType; 4] = [
        DiseaseType::Heart,
        DiseaseType::Diabetes,
        DiseaseType::Hypertension,
        DiseaseType::Stroke,
    ];

    /// Parse a disease identifier. Case and surrounding whitespace are ignored.
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        match id.trim().to_ascii_lowercase().as_str() {
            "heart" => Some(Self::Heart),
            "diabetes" => Some(Self::Diabetes),
            "hypertension" => Some(Self::Hypertension),
            "stroke" => Some(Self::Stroke),
            _ => None,
        }
    }

    /// Identifier used on the wire and in file names.
    #[must_use]
    pub fn id(&self) -> &'static str {
        match self {
            Self::Heart => "heart",
            Self::Diabetes => "diabetes",
            Self::Hypertension => "hypertension",
            Self::Stroke => "stroke",
        }
    }

    /// Title shown above the prediction form and in reports.
    #[must_use]
    pub fn title(&self) -> &'static str {
        match self {
            Self::Heart => "Heart Disease Risk Assessment",
            Self::Diabetes => "Diabetes Risk Assessment",
            Self::Hypertension => "Hypertension Risk Assessment",
            Self::Stroke => "Stroke Risk Assessment",
        }
    }

    /// Short capitalized name for charts and tables.
    #[must_use]
    pub fn short_name(&self) -> &'static str {
        match self {
            Self::Heart => "Heart",
            Self::Diabetes => "Diabetes",
            Self::Hypertension => "Hypertension",
            Self::Stroke => "Stroke",
        }
    }
}

impl std::fmt::Display for DiseaseType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.id())
    }
}

impl std::str::FromStr for DiseaseType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_id(s).ok_or_else(|| {
            format!("Unknown disease '{s}'. Choose: heart, diabetes, hypertension, stroke.")
        })
    }
}
