//! Response payloads as the backend sends them.

use serde::Deserialize;

use crate::domain::{PatientReference, PredictionRecord, PredictionResult, RiskAssessment};
use crate::ports::ApiError;

/// Prediction response. Older backend paths omit `risk_color`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(super) enum PredictResponse {
    Colored {
        probability: f64,
        risk_level: String,
        risk_color: String,
        #[serde(default)]
        risk_advice: Option<String>,
    },
    Named {
        probability: f64,
        risk_level: String,
        #[serde(default)]
        risk_advice: Option<String>,
    },
}

impl PredictResponse {
    pub(super) fn into_result(self) -> PredictionResult {
        let (probability, risk, risk_advice) = match self {
            Self::Colored {
                probability,
                risk_level,
                risk_color,
                risk_advice,
            } => (
                probability,
                RiskAssessment::from_wire(&risk_level, Some(&risk_color)),
                risk_advice,
            ),
            Self::Named {
                probability,
                risk_level,
                risk_advice,
            } => (probability, RiskAssessment::from_wire(&risk_level, None), risk_advice),
        };

        PredictionResult {
            probability,
            risk,
            risk_advice: risk_advice.filter(|advice| !advice.trim().is_empty()),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub(super) struct PatientUser {
    #[serde(default)]
    full_name: Option<String>,
}

/// `GET /api/patients/{id}/` payload. The id may arrive as a number or a string.
#[derive(Debug, Deserialize)]
pub(super) struct PatientPayload {
    id: serde_json::Value,
    #[serde(default)]
    user: Option<PatientUser>,
    #[serde(default)]
    full_name: Option<String>,
}

impl PatientPayload {
    pub(super) fn into_reference(self) -> PatientReference {
        let id = match self.id {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        };

        let full_name = self
            .user
            .and_then(|user| user.full_name)
            .or(self.full_name)
            .filter(|name| !name.trim().is_empty())
            .unwrap_or_else(|| "Patient".to_string());

        PatientReference::new(id, full_name)
    }
}

/// Decode a prediction list; anything other than an array is treated as empty.
pub(super) fn records_from_value(value: serde_json::Value) -> Result<Vec<PredictionRecord>, ApiError> {
    if !value.is_array() {
        return Ok(Vec::new());
    }
    serde_json::from_value(value).map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{RiskColor, RiskLevel};

    #[test]
    fn test_colored_response() {
        let response: PredictResponse = serde_json::from_str(
            r#"{"prediction": 1, "probability": 0.91, "risk_level": "Critical", "risk_color": "darkred", "risk_advice": "Immediate medical attention"}"#,
        )
        .expect("Should parse");

        let result = response.into_result();
        assert_eq!(result.risk.level, Some(RiskLevel::Critical));
        assert_eq!(result.risk.color, Some(RiskColor::DarkRed));
        assert_eq!(result.risk_advice.as_deref(), Some("Immediate medical attention"));
    }

    #[test]
    fn test_named_response() {
        let response: PredictResponse =
            serde_json::from_str(r#"{"probability": 0.42, "risk_level": "Medium"}"#).expect("Should parse");

        let result = response.into_result();
        assert_eq!(result.risk.level, Some(RiskLevel::Medium));
        assert_eq!(result.risk.color, None);
        assert_eq!(result.risk_advice, None);
    }

    #[test]
    fn test_null_color_falls_back_to_named() {
        let response: PredictResponse = serde_json::from_str(
            r#"{"probability": 0.2, "risk_level": "Low", "risk_color": null}"#,
        )
        .expect("Should parse");
        assert_eq!(response.into_result().risk.color, None);
    }

    #[test]
    fn test_patient_payload() {
        let nested: PatientPayload =
            serde_json::from_str(r#"{"id": 12, "user": {"full_name": "Ann Oak"}, "created_at": "2026-01-01"}"#)
                .expect("Should parse");
        assert_eq!(nested.into_reference(), PatientReference::new("12", "Ann Oak"));

        let anonymous: PatientPayload =
            serde_json::from_str(r#"{"id": "P-9", "user": {"full_name": ""}}"#).expect("Should parse");
        assert_eq!(anonymous.into_reference(), PatientReference::new("P-9", "Patient"));
    }

    #[test]
    fn test_non_array_history_is_empty() {
        let records = records_from_value(serde_json::json!({"detail": "x"})).expect("Should decode");
        assert!(records.is_empty());
    }
}
