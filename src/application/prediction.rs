//! Prediction workflow: patient verification, feature entry and submission.
//!
//! One workflow exists per open prediction form. It owns the entered feature
//! values, the verified patient (providers only) and the latest result or
//! error. Backend calls run on [`BackgroundTask`]s; the UI calls
//! [`PredictionWorkflow::poll`] every tick to apply finished responses.
//!
//! # Liveness
//!
//! Pending responses are owned by the workflow. Dropping the workflow, or
//! changing the patient code while a verification is outstanding, drops the
//! corresponding channel and the late response is discarded.

use serde_json::Value;

use super::worker::{BackgroundTask, TaskPoll};
use crate::domain::{
    schema_for, DiseaseType, FeatureVector, FieldSpec, PatientReference, PredictionResult, Role,
};
use crate::ports::{ApiError, PredictRequest, SharedBackend};

/// Fallback message when a failed response carries nothing displayable.
pub const DEFAULT_FAILURE_MESSAGE: &str = "Prediction failed.";

/// Client-side validation errors. None of these reach the network.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WorkflowError {
    #[error("Unknown disease '{0}'. Choose: heart, diabetes, hypertension, stroke.")]
    UnknownDisease(String),

    #[error("Unknown field '{0}'")]
    UnknownField(String),

    #[error("'{value}' is not a valid number for {field}")]
    InvalidNumber { field: String, value: String },

    #[error("Please enter a patient ID")]
    EmptyPatientCode,

    #[error("Please verify a patient before submitting")]
    PatientNotVerified,
}

/// Why a patient code could not be verified.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum VerifyError {
    #[error("No patient found with that ID")]
    NotFound,

    #[error("{0}")]
    AccessDenied(String),

    #[error("{0}")]
    Other(String),
}

impl VerifyError {
    fn from_api(err: &ApiError) -> Self {
        match err.status() {
            Some(404) => Self::NotFound,
            Some(403) => Self::AccessDenied(err.detail_or("You do not have access to this patient")),
            _ => Self::Other(err.detail_or("Failed to verify patient")),
        }
    }
}

/// Observable state of the workflow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkflowStatus {
    /// Provider with no patient code entered
    Idle,
    /// Provider with a patient code that is not (yet) verified
    AwaitingVerification,
    /// Ready to submit
    Ready,
    Submitting,
    Succeeded,
    Failed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    Started,
    /// A submission is already in flight; nothing was sent.
    AlreadySubmitting,
}

/// Changes applied by [`PredictionWorkflow::poll`], for notifications.
#[derive(Debug, Clone, PartialEq)]
pub enum WorkflowEvent {
    PatientVerified(PatientReference),
    VerificationFailed(VerifyError),
    PredictionSucceeded(PredictionResult),
    PredictionFailed(String),
}

struct PendingVerification {
    code: String,
    task: BackgroundTask<Result<PatientReference, ApiError>>,
}

/// State machine for one prediction form.
pub struct PredictionWorkflow {
    backend: SharedBackend,
    disease: DiseaseType,
    role: Role,
    features: FeatureVector,
    patient_code: String,
    patient: Option<PatientReference>,
    verify_error: Option<VerifyError>,
    pending_verify: Option<PendingVerification>,
    pending_submit: Option<BackgroundTask<Result<PredictionResult, ApiError>>>,
    result: Option<PredictionResult>,
    error: Option<String>,
}

impl PredictionWorkflow {
    /// Open a form for `disease_id` with every feature at 0.
    ///
    /// # Errors
    /// Returns `WorkflowError::UnknownDisease` for unrecognized identifiers.
    pub fn open(backend: SharedBackend, disease_id: &str, role: Role) -> Result<Self, WorkflowError> {
        let disease = DiseaseType::from_id(disease_id)
            .ok_or_else(|| WorkflowError::UnknownDisease(disease_id.trim().to_string()))?;

        tracing::info!("Opened {} prediction form (role={})", disease, role);
        Ok(Self {
            backend,
            disease,
            role,
            features: FeatureVector::zeroed(schema_for(disease)),
            patient_code: String::new(),
            patient: None,
            verify_error: None,
            pending_verify: None,
            pending_submit: None,
            result: None,
            error: None,
        })
    }

    #[must_use]
    pub fn disease(&self) -> DiseaseType {
        self.disease
    }

    #[must_use]
    pub fn schema(&self) -> &'static [FieldSpec] {
        schema_for(self.disease)
    }

    #[must_use]
    pub fn features(&self) -> &FeatureVector {
        &self.features
    }

    #[must_use]
    pub fn requires_patient(&self) -> bool {
        self.role == Role::Provider
    }

    #[must_use]
    pub fn patient_code(&self) -> &str {
        &self.patient_code
    }

    #[must_use]
    pub fn patient(&self) -> Option<&PatientReference> {
        self.patient.as_ref()
    }

    #[must_use]
    pub fn verify_error(&self) -> Option<&VerifyError> {
        self.verify_error.as_ref()
    }

    #[must_use]
    pub fn is_verifying(&self) -> bool {
        self.pending_verify.is_some()
    }

    #[must_use]
    pub fn result(&self) -> Option<&PredictionResult> {
        self.result.as_ref()
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    #[must_use]
    pub fn status(&self) -> WorkflowStatus {
        if self.pending_submit.is_some() {
            WorkflowStatus::Submitting
        } else if self.error.is_some() {
            WorkflowStatus::Failed
        } else if self.result.is_some() {
            WorkflowStatus::Succeeded
        } else if self.requires_patient() && self.patient.is_none() {
            if self.patient_code.trim().is_empty() {
                WorkflowStatus::Idle
            } else {
                WorkflowStatus::AwaitingVerification
            }
        } else {
            WorkflowStatus::Ready
        }
    }

    /// Set one feature from raw text. Empty input means 0.
    ///
    /// Bounds are not enforced here; out-of-range values go to the backend as-is.
    ///
    /// # Errors
    /// `UnknownField` if the disease has no such field, `InvalidNumber` if the
    /// text is not a finite number. The stored value is unchanged on error.
    pub fn update_feature(&mut self, name: &str, raw: &str) -> Result<f64, WorkflowError> {
        if self.features.get(name).is_none() {
            return Err(WorkflowError::UnknownField(name.to_string()));
        }

        let trimmed = raw.trim();
        let value = if trimmed.is_empty() {
            0.0
        } else {
            trimmed
                .parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .ok_or_else(|| WorkflowError::InvalidNumber {
                    field: name.to_string(),
                    value: trimmed.to_string(),
                })?
        };

        self.features.set(name, value);
        Ok(value)
    }

    /// Record the typed patient code. A different code invalidates the
    /// verified patient and any verification still in flight.
    pub fn set_patient_code(&mut self, raw: &str) {
        if raw == self.patient_code {
            return;
        }
        self.patient_code = raw.to_string();

        if self.patient.take().is_some() {
            tracing::debug!("Patient code changed; verified patient cleared");
        }
        self.verify_error = None;
        self.pending_verify = None;
    }

    /// Start verifying `code` in the background.
    ///
    /// Re-verifying the code that is already in flight is a no-op.
    ///
    /// # Errors
    /// Returns `WorkflowError::EmptyPatientCode` for a blank code.
    pub fn verify_patient(&mut self, code: &str) -> Result<(), WorkflowError> {
        self.set_patient_code(code);
        let code = code.trim().to_string();
        if code.is_empty() {
            return Err(WorkflowError::EmptyPatientCode);
        }

        if self.pending_verify.as_ref().is_some_and(|p| p.code == code) {
            return Ok(());
        }

        self.patient = None;
        self.verify_error = None;

        let backend = self.backend.clone();
        let lookup = code.clone();
        let task = BackgroundTask::spawn("patient verification", move || backend.get_patient(&lookup));
        self.pending_verify = Some(PendingVerification { code, task });
        Ok(())
    }

    /// Submit the current features.
    ///
    /// # Errors
    /// Returns `WorkflowError::PatientNotVerified` for a provider without a
    /// verified patient; no request is made.
    pub fn submit(&mut self) -> Result<SubmitOutcome, WorkflowError> {
        if self.pending_submit.is_some() {
            return Ok(SubmitOutcome::AlreadySubmitting);
        }

        let patient_id = if self.requires_patient() {
            let patient = self.patient.as_ref().ok_or(WorkflowError::PatientNotVerified)?;
            Some(patient.id.clone())
        } else {
            None
        };

        let request = PredictRequest {
            features: self.features.clone(),
            patient_id,
        };

        self.result = None;
        self.error = None;

        let backend = self.backend.clone();
        let disease = self.disease;
        tracing::info!("Submitting {} prediction", disease);
        self.pending_submit = Some(BackgroundTask::spawn("prediction", move || {
            backend.predict(disease, &request)
        }));
        Ok(SubmitOutcome::Started)
    }

    /// Apply any finished background responses without blocking.
    pub fn poll(&mut self) -> Vec<WorkflowEvent> {
        let mut events = Vec::new();

        if let Some(pending) = &self.pending_verify {
            match pending.task.try_recv() {
                TaskPoll::Pending => {}
                TaskPoll::Done(response) => {
                    if let Some(pending) = self.pending_verify.take() {
                        events.extend(self.finish_verification(&pending.code, response));
                    }
                }
                TaskPoll::Lost => {
                    self.pending_verify = None;
                    let err = VerifyError::Other("Failed to verify patient".to_string());
                    self.verify_error = Some(err.clone());
                    events.push(WorkflowEvent::VerificationFailed(err));
                }
            }
        }

        if let Some(task) = &self.pending_submit {
            match task.try_recv() {
                TaskPoll::Pending => {}
                TaskPoll::Done(response) => {
                    self.pending_submit = None;
                    events.push(self.finish_submission(response));
                }
                TaskPoll::Lost => {
                    self.pending_submit = None;
                    events.push(self.finish_submission(Err(ApiError::Decode(
                        "worker exited".to_string(),
                    ))));
                }
            }
        }

        events
    }

    /// Block until every outstanding request has finished, then apply them.
    pub fn wait(&mut self) -> Vec<WorkflowEvent> {
        let mut events = Vec::new();

        if let Some(pending) = self.pending_verify.take() {
            let response = pending
                .task
                .wait()
                .unwrap_or_else(|| Err(ApiError::Decode("worker exited".to_string())));
            events.extend(self.finish_verification(&pending.code, response));
        }

        if let Some(task) = self.pending_submit.take() {
            let response = task
                .wait()
                .unwrap_or_else(|| Err(ApiError::Decode("worker exited".to_string())));
            events.push(self.finish_submission(response));
        }

        events
    }

    fn finish_verification(
        &mut self,
        code: &str,
        response: Result<PatientReference, ApiError>,
    ) -> Option<WorkflowEvent> {
        if code != self.patient_code.trim() {
            tracing::debug!("Dropping verification for a superseded patient code");
            return None;
        }

        match response {
            Ok(patient) => {
                tracing::info!("Patient verified");
                self.patient = Some(patient.clone());
                Some(WorkflowEvent::PatientVerified(patient))
            }
            Err(e) => {
                tracing::warn!("Patient verification failed: {}", e);
                let err = VerifyError::from_api(&e);
                self.verify_error = Some(err.clone());
                Some(WorkflowEvent::VerificationFailed(err))
            }
        }
    }

    fn finish_submission(&mut self, response: Result<PredictionResult, ApiError>) -> WorkflowEvent {
        match response {
            Ok(result) => {
                tracing::info!("Prediction complete: {}", result.risk.label);
                self.result = Some(result.clone());
                WorkflowEvent::PredictionSucceeded(result)
            }
            Err(e) => {
                tracing::warn!("Prediction failed: {}", e);
                let message = extract_error_message(e.body());
                self.error = Some(message.clone());
                WorkflowEvent::PredictionFailed(message)
            }
        }
    }
}

/// Turn any backend error body into a displayable message.
///
/// `error` is consulted before `detail`. A string is used as-is; for a list the
/// first element's `message` (or its JSON text); for an object its `message`
/// (or its JSON text). A string `hint` is appended after a space.
#[must_use]
pub fn extract_error_message(body: Option<&Value>) -> String {
    let Some(body) = body else {
        return DEFAULT_FAILURE_MESSAGE.to_string();
    };

    let primary = body
        .get("error")
        .filter(|v| !v.is_null())
        .or_else(|| body.get("detail"))
        .and_then(message_from)
        .unwrap_or_else(|| DEFAULT_FAILURE_MESSAGE.to_string());

    match body.get("hint").and_then(Value::as_str) {
        Some(hint) if !hint.trim().is_empty() => format!("{primary} {hint}"),
        _ => primary,
    }
}

fn message_from(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.clone(),
        Value::Array(items) => {
            let first = items.first()?;
            match first.get("message").and_then(Value::as_str) {
                Some(message) if !message.is_empty() => message.to_string(),
                _ => match first {
                    Value::String(s) => s.clone(),
                    other => other.to_string(),
                },
            }
        }
        Value::Object(map) => match map.get("message").and_then(Value::as_str) {
            Some(message) if !message.is_empty() => message.to_string(),
            _ => value.to_string(),
        },
        _ => return None,
    };

    Some(text).filter(|t| !t.trim().is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{self, Calls, FakeBackend};
    use serde_json::json;
    use std::sync::Arc;

    fn open(fake: &Arc<FakeBackend>, disease: &str, role: Role) -> PredictionWorkflow {
        let backend: SharedBackend = fake.clone();
        PredictionWorkflow::open(backend, disease, role).expect("Should open")
    }

    #[test]
    fn test_open_zeroes_every_field() {
        let fake = Arc::new(FakeBackend::default());
        let workflow = open(&fake, " Heart ", Role::Patient);

        assert_eq!(workflow.disease(), DiseaseType::Heart);
        assert_eq!(workflow.features().len(), workflow.schema().len());
        assert!(workflow.features().iter().all(|(_, v)| v == 0.0));
        assert_eq!(workflow.status(), WorkflowStatus::Ready);
    }

    #[test]
    fn test_open_unknown_disease() {
        let backend: SharedBackend = Arc::new(FakeBackend::default());
        let err = PredictionWorkflow::open(backend, "kidney", Role::Patient).err();
        assert_eq!(err, Some(WorkflowError::UnknownDisease("kidney".to_string())));
    }

    #[test]
    fn test_update_feature() {
        let fake = Arc::new(FakeBackend::default());
        let mut workflow = open(&fake, "diabetes", Role::Patient);

        assert_eq!(workflow.update_feature("glucose", "148"), Ok(148.0));
        assert_eq!(workflow.update_feature("glucose", ""), Ok(0.0));
        assert_eq!(workflow.features().get("glucose"), Some(0.0));

        workflow.update_feature("bmi", "33.6").expect("valid");
        assert!(matches!(
            workflow.update_feature("bmi", "abc"),
            Err(WorkflowError::InvalidNumber { .. })
        ));
        assert!(matches!(workflow.update_feature("bmi", "NaN"), Err(WorkflowError::InvalidNumber { .. })));
        assert_eq!(workflow.features().get("bmi"), Some(33.6));

        // Out of range is accepted as-is.
        assert_eq!(workflow.update_feature("age", "500"), Ok(500.0));
        assert_eq!(
            workflow.update_feature("thalach", "1"),
            Err(WorkflowError::UnknownField("thalach".to_string()))
        );
    }

    #[test]
    fn test_submit_sends_features_once() {
        let fake = Arc::new(FakeBackend::default());
        let mut workflow = open(&fake, "heart", Role::Patient);
        workflow.update_feature("age", "63").expect("valid");

        assert_eq!(workflow.submit(), Ok(SubmitOutcome::Started));
        assert_eq!(workflow.status(), WorkflowStatus::Submitting);
        assert_eq!(workflow.submit(), Ok(SubmitOutcome::AlreadySubmitting));

        let events = workflow.wait();
        assert!(matches!(events.as_slice(), [WorkflowEvent::PredictionSucceeded(_)]));
        assert_eq!(Calls::count(&fake.calls.predict), 1);
        assert_eq!(workflow.status(), WorkflowStatus::Succeeded);
        assert_eq!(workflow.result().map(PredictionResult::percentage), Some("84.7%".to_string()));

        let (disease, request) = fake.last_predict.lock().expect("lock").clone().expect("sent");
        assert_eq!(disease, DiseaseType::Heart);
        assert_eq!(request.features.get("age"), Some(63.0));
        assert_eq!(request.patient_id, None);
    }

    #[test]
    fn test_editing_does_not_clear_result() {
        let fake = Arc::new(FakeBackend::default());
        let mut workflow = open(&fake, "stroke", Role::Patient);
        workflow.submit().expect("submit");
        workflow.wait();

        workflow.update_feature("age", "40").expect("valid");
        assert_eq!(workflow.status(), WorkflowStatus::Succeeded);
        assert!(workflow.result().is_some());
    }

    #[test]
    fn test_provider_must_verify_before_submit() {
        let fake = Arc::new(FakeBackend::default().with_patient("42", "Ann Oak"));
        let mut workflow = open(&fake, "hypertension", Role::Provider);
        assert_eq!(workflow.status(), WorkflowStatus::Idle);

        assert_eq!(workflow.submit(), Err(WorkflowError::PatientNotVerified));
        assert_eq!(Calls::count(&fake.calls.predict), 0);

        workflow.set_patient_code("42");
        assert_eq!(workflow.status(), WorkflowStatus::AwaitingVerification);

        workflow.verify_patient("42").expect("verify");
        let events = workflow.wait();
        assert_eq!(
            events,
            vec![WorkflowEvent::PatientVerified(PatientReference::new("42", "Ann Oak"))]
        );
        assert_eq!(workflow.status(), WorkflowStatus::Ready);

        workflow.submit().expect("submit");
        workflow.wait();
        let (_, request) = fake.last_predict.lock().expect("lock").clone().expect("sent");
        assert_eq!(request.patient_id.as_deref(), Some("42"));
    }

    #[test]
    fn test_code_change_clears_verified_patient() {
        let fake = Arc::new(FakeBackend::default().with_patient("42", "Ann Oak"));
        let mut workflow = open(&fake, "heart", Role::Provider);
        workflow.verify_patient("42").expect("verify");
        workflow.wait();
        assert!(workflow.patient().is_some());

        workflow.set_patient_code("43");
        assert!(workflow.patient().is_none());
        assert_eq!(workflow.status(), WorkflowStatus::AwaitingVerification);
        assert_eq!(workflow.submit(), Err(WorkflowError::PatientNotVerified));
    }

    #[test]
    fn test_stale_verification_is_dropped() {
        let fake = Arc::new(FakeBackend::default().with_patient("42", "Ann Oak"));
        let mut workflow = open(&fake, "heart", Role::Provider);

        let release = fake.hold_next_call();
        workflow.verify_patient("42").expect("verify");
        assert!(workflow.is_verifying());

        workflow.set_patient_code("4");
        assert!(!workflow.is_verifying());
        release.send(()).expect("release");

        assert!(workflow.wait().is_empty());
        assert!(workflow.patient().is_none());
    }

    #[test]
    fn test_verification_errors() {
        let fake = Arc::new(FakeBackend::default());
        fake.patients.lock().expect("lock").insert(
            "9".to_string(),
            Err(testing::status(403, json!({"detail": "Not your patient."}))),
        );
        let mut workflow = open(&fake, "heart", Role::Provider);

        assert_eq!(workflow.verify_patient("  "), Err(WorkflowError::EmptyPatientCode));
        assert_eq!(Calls::count(&fake.calls.get_patient), 0);

        workflow.verify_patient("1").expect("verify");
        assert_eq!(
            workflow.wait(),
            vec![WorkflowEvent::VerificationFailed(VerifyError::NotFound)]
        );

        workflow.verify_patient("9").expect("verify");
        workflow.wait();
        assert_eq!(
            workflow.verify_error(),
            Some(&VerifyError::AccessDenied("Not your patient.".to_string()))
        );
    }

    #[test]
    fn test_failure_keeps_values_and_allows_resubmit() {
        let fake = Arc::new(FakeBackend::default().with_prediction(Err(testing::status(
            400,
            json!({"error": "Invalid input", "hint": "Check the age field."}),
        ))));
        let mut workflow = open(&fake, "heart", Role::Patient);
        workflow.update_feature("age", "63").expect("valid");

        workflow.submit().expect("submit");
        workflow.wait();
        assert_eq!(workflow.status(), WorkflowStatus::Failed);
        assert_eq!(workflow.error(), Some("Invalid input Check the age field."));
        assert_eq!(workflow.features().get("age"), Some(63.0));

        *fake.prediction.lock().expect("lock") = Ok(testing::result(0.1, "Low", None));
        assert_eq!(workflow.submit(), Ok(SubmitOutcome::Started));
        workflow.wait();
        assert_eq!(workflow.status(), WorkflowStatus::Succeeded);
        assert_eq!(Calls::count(&fake.calls.predict), 2);
    }

    #[test]
    fn test_network_failure_is_generic() {
        let fake = Arc::new(FakeBackend::default().with_prediction(Err(ApiError::Network {
            url: "http://localhost:8000/api/predict/heart/".to_string(),
            message: "connection refused".to_string(),
        })));
        let mut workflow = open(&fake, "heart", Role::Patient);
        workflow.submit().expect("submit");
        workflow.wait();
        assert_eq!(workflow.error(), Some(DEFAULT_FAILURE_MESSAGE));
    }

    #[test]
    fn test_poll_applies_finished_response() {
        let fake = Arc::new(FakeBackend::default());
        let mut workflow = open(&fake, "heart", Role::Patient);
        let release = fake.hold_next_call();
        workflow.submit().expect("submit");

        assert!(workflow.poll().is_empty());
        assert_eq!(workflow.status(), WorkflowStatus::Submitting);
        release.send(()).expect("release");

        let mut events = Vec::new();
        for _ in 0..400 {
            events = workflow.poll();
            if !events.is_empty() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(5));
        }
        assert!(matches!(events.as_slice(), [WorkflowEvent::PredictionSucceeded(_)]));
    }

    #[test]
    fn test_extract_error_message() {
        assert_eq!(
            extract_error_message(Some(&json!({"detail": [{"message": "bad field"}]}))),
            "bad field"
        );
        assert_eq!(extract_error_message(Some(&json!({}))), "Prediction failed.");
        assert_eq!(extract_error_message(None), "Prediction failed.");
        assert_eq!(extract_error_message(Some(&json!({"detail": "Nope"}))), "Nope");
        assert_eq!(
            extract_error_message(Some(&json!({"error": {"message": "Model offline"}, "detail": "x"}))),
            "Model offline"
        );
        assert_eq!(
            extract_error_message(Some(&json!({"detail": {"code": 3}}))),
            r#"{"code":3}"#
        );
        assert_eq!(extract_error_message(Some(&json!({"detail": ["first", "second"]}))), "first");
        assert_eq!(extract_error_message(Some(&json!({"detail": []}))), "Prediction failed.");
        assert_eq!(
            extract_error_message(Some(&json!({"hint": "Try again later."}))),
            "Prediction failed. Try again later."
        );
    }
}
