//! Backend port: Trait for the remote MedPredict API.
//!
//! This trait abstracts the HTTP transport from the application logic so the
//! prediction workflow and services can run against an in-process fake.

use std::sync::Arc;

use serde::Serialize;

use crate::domain::{
    AdminStats, DiseaseType, FeatureVector, Identity, PatientDetails, PatientReference,
    PredictionRecord, PredictionResult, RegistrationForm, Role,
};

/// Errors returned by backend calls.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    /// No response was received.
    #[error("Cannot reach backend API at {url}: {message}")]
    Network { url: String, message: String },

    /// The backend answered with a non-2xx status.
    #[error("Request failed ({status})")]
    Status {
        status: u16,
        body: Option<serde_json::Value>,
    },

    /// A 2xx response whose body could not be decoded.
    #[error("Unexpected response: {0}")]
    Decode(String),

    /// A path segment that cannot be sent, such as `..`. No request was made.
    #[error("Invalid request path segment '{0}'")]
    InvalidPath(String),
}

impl ApiError {
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// JSON error body, if the backend sent one.
    #[must_use]
    pub fn body(&self) -> Option<&serde_json::Value> {
        match self {
            Self::Status { body, .. } => body.as_ref(),
            _ => None,
        }
    }

    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// The `detail` string of the body, falling back to `fallback`.
    #[must_use]
    pub fn detail_or(&self, fallback: &str) -> String {
        self.body()
            .and_then(|body| body.get("detail"))
            .and_then(serde_json::Value::as_str)
            .map_or_else(|| fallback.to_string(), str::to_string)
    }
}

/// Notifications emitted by the transport for the application to act on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiEvent {
    /// A response came back with status 401.
    Unauthorized,
}

/// Body of `POST /api/predict/{disease}/`.
#[derive(Debug, Clone, Serialize)]
pub struct PredictRequest {
    pub features: FeatureVector,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub patient_id: Option<String>,
}

/// Body of `POST /api/auth/register/`.
#[derive(Debug, Clone, Serialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub role: Role,
    pub full_name: String,
    pub phone: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<Option<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub specialization: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub license_number: Option<String>,
}

impl RegisterRequest {
    /// Build the payload for `role`, deriving a username from the e-mail when none is given.
    #[must_use]
    pub fn from_form(form: &RegistrationForm, role: Role) -> Self {
        let username = form
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map_or_else(|| crate::domain::username_from_email(&form.email), str::to_string);

        let (date_of_birth, specialization, license_number) = match role {
            Role::Patient => (
                Some(form.date_of_birth.clone().filter(|d| !d.trim().is_empty())),
                None,
                None,
            ),
            _ => (
                None,
                Some(form.specialization.clone()),
                Some(form.license_number.clone()),
            ),
        };

        Self {
            username,
            email: form.email.clone(),
            password: form.password.clone(),
            confirm_password: form.confirm_password.clone(),
            role,
            full_name: form.full_name.clone(),
            phone: form.phone.clone(),
            date_of_birth,
            specialization,
            license_number,
        }
    }
}

/// Trait for the remote health API.
///
/// Every method is a single blocking request; callers that must stay
/// responsive run them on a worker thread.
pub trait HealthBackend: Send + Sync {
    /// Start a session. Accepts an e-mail or username.
    ///
    /// # Errors
    /// Returns `ApiError::Status` with 401 for bad credentials.
    fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError>;

    /// End the current session.
    ///
    /// # Errors
    /// Returns error if the request fails.
    fn logout(&self) -> Result<(), ApiError>;

    /// Fetch the identity bound to the current session.
    ///
    /// # Errors
    /// Returns 401 when no session is active.
    fn current_user(&self) -> Result<Identity, ApiError>;

    /// Create an account.
    ///
    /// # Errors
    /// Returns 400 with field errors when the form is rejected.
    fn register(&self, request: &RegisterRequest) -> Result<Identity, ApiError>;

    /// Look up a patient by patient code (provider only).
    ///
    /// # Errors
    /// Returns 404 when no patient has that code.
    fn get_patient(&self, code: &str) -> Result<PatientReference, ApiError>;

    /// Patient card for the provider dashboard.
    ///
    /// # Errors
    /// Returns 404 when no patient has that code.
    fn patient_details(&self, code: &str) -> Result<PatientDetails, ApiError>;

    /// Run a prediction.
    ///
    /// # Errors
    /// Returns 4xx/5xx with an `error`/`detail` body when the backend rejects the input.
    fn predict(
        &self,
        disease: DiseaseType,
        request: &PredictRequest,
    ) -> Result<PredictionResult, ApiError>;

    /// List past predictions: the caller's own, or `patient_id`'s for providers.
    ///
    /// # Errors
    /// Returns error if the request fails.
    fn list_predictions(&self, patient_id: Option<&str>) -> Result<Vec<PredictionRecord>, ApiError>;

    /// System-wide statistics (admin only).
    ///
    /// # Errors
    /// Returns 403 for non-admin users.
    fn admin_stats(&self) -> Result<AdminStats, ApiError>;
}

/// Backend handle shared by services and worker threads.
pub type SharedBackend = Arc<dyn HealthBackend>;
