//! Scripted in-process backend for service tests.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;

use chrono::{TimeZone, Utc};

use crate::domain::{
    AdminStats, DiseaseType, Identity, PatientDetails, PatientReference, PredictionRecord,
    PredictionResult, RiskAssessment, Role,
};
use crate::ports::{ApiError, HealthBackend, PredictRequest, RegisterRequest};

#[derive(Default)]
pub(crate) struct Calls {
    pub login: AtomicUsize,
    pub logout: AtomicUsize,
    pub current_user: AtomicUsize,
    pub register: AtomicUsize,
    pub get_patient: AtomicUsize,
    pub predict: AtomicUsize,
    pub list_predictions: AtomicUsize,
    pub admin_stats: AtomicUsize,
}

impl Calls {
    pub fn count(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }
}

pub(crate) struct FakeBackend {
    pub calls: Calls,
    pub identity: Mutex<Result<Identity, ApiError>>,
    pub logout: Mutex<Result<(), ApiError>>,
    pub patients: Mutex<HashMap<String, Result<PatientReference, ApiError>>>,
    pub prediction: Mutex<Result<PredictionResult, ApiError>>,
    pub records: Mutex<Result<Vec<PredictionRecord>, ApiError>>,
    pub stats: Mutex<Result<AdminStats, ApiError>>,
    pub last_predict: Mutex<Option<(DiseaseType, PredictRequest)>>,
    pub last_register: Mutex<Option<RegisterRequest>>,
    pub last_patient_filter: Mutex<Option<Option<String>>>,
    gate: Mutex<Option<Receiver<()>>>,
}

impl Default for FakeBackend {
    fn default() -> Self {
        Self {
            calls: Calls::default(),
            identity: Mutex::new(Ok(identity(Role::Patient))),
            logout: Mutex::new(Ok(())),
            patients: Mutex::new(HashMap::new()),
            prediction: Mutex::new(Ok(result(0.847, "High", Some("red")))),
            records: Mutex::new(Ok(Vec::new())),
            stats: Mutex::new(Ok(AdminStats::default())),
            last_predict: Mutex::new(None),
            last_register: Mutex::new(None),
            last_patient_filter: Mutex::new(None),
            gate: Mutex::new(None),
        }
    }
}

impl FakeBackend {
    pub fn with_patient(self, code: &str, name: &str) -> Self {
        self.patients
            .lock()
            .expect("lock")
            .insert(code.to_string(), Ok(PatientReference::new(code, name)));
        self
    }

    pub fn with_prediction(self, response: Result<PredictionResult, ApiError>) -> Self {
        *self.prediction.lock().expect("lock") = response;
        self
    }

    /// Hold the next `get_patient` or `predict` call until the sender fires.
    pub fn hold_next_call(&self) -> Sender<()> {
        let (tx, rx) = mpsc::channel();
        *self.gate.lock().expect("lock") = Some(rx);
        tx
    }

    fn pass_gate(&self) {
        let gate = self.gate.lock().expect("lock").take();
        if let Some(rx) = gate {
            let _ = rx.recv();
        }
    }
}

pub(crate) fn identity(role: Role) -> Identity {
    Identity {
        id: 7,
        username: "sam".to_string(),
        email: "sam@example.org".to_string(),
        role,
        full_name: "Sam Lee".to_string(),
    }
}

pub(crate) fn result(probability: f64, level: &str, color: Option<&str>) -> PredictionResult {
    PredictionResult {
        probability,
        risk: RiskAssessment::from_wire(level, color),
        risk_advice: None,
    }
}

pub(crate) fn record(id: u64, disease: &str, probability: f64, level: &str, day: u32) -> PredictionRecord {
    PredictionRecord {
        id,
        patient: Some(7),
        disease_type: disease.to_string(),
        prediction: u8::from(probability >= 0.5),
        probability,
        risk_level: level.to_string(),
        created_at: Utc
            .with_ymd_and_hms(2026, 4, day, 10, 0, 0)
            .single()
            .expect("valid date"),
    }
}

pub(crate) fn status(code: u16, body: serde_json::Value) -> ApiError {
    ApiError::Status {
        status: code,
        body: Some(body),
    }
}

impl HealthBackend for FakeBackend {
    fn login(&self, _email: &str, _password: &str) -> Result<Identity, ApiError> {
        self.calls.login.fetch_add(1, Ordering::SeqCst);
        self.identity.lock().expect("lock").clone()
    }

    fn logout(&self) -> Result<(), ApiError> {
        self.calls.logout.fetch_add(1, Ordering::SeqCst);
        self.logout.lock().expect("lock").clone()
    }

    fn current_user(&self) -> Result<Identity, ApiError> {
        self.calls.current_user.fetch_add(1, Ordering::SeqCst);
        self.identity.lock().expect("lock").clone()
    }

    fn register(&self, request: &RegisterRequest) -> Result<Identity, ApiError> {
        self.calls.register.fetch_add(1, Ordering::SeqCst);
        *self.last_register.lock().expect("lock") = Some(request.clone());
        self.identity.lock().expect("lock").clone()
    }

    fn get_patient(&self, code: &str) -> Result<PatientReference, ApiError> {
        self.calls.get_patient.fetch_add(1, Ordering::SeqCst);
        self.pass_gate();
        self.patients
            .lock()
            .expect("lock")
            .get(code)
            .cloned()
            .unwrap_or_else(|| Err(status(404, serde_json::json!({"detail": "Not found."}))))
    }

    fn patient_details(&self, code: &str) -> Result<PatientDetails, ApiError> {
        let reference = self.get_patient(code)?;
        Ok(PatientDetails {
            id: reference.id.parse().unwrap_or_default(),
            full_name: reference.full_name,
            email: String::new(),
            date_joined: None,
            total_predictions: 0,
        })
    }

    fn predict(&self, disease: DiseaseType, request: &PredictRequest) -> Result<PredictionResult, ApiError> {
        self.calls.predict.fetch_add(1, Ordering::SeqCst);
        *self.last_predict.lock().expect("lock") = Some((disease, request.clone()));
        self.pass_gate();
        self.prediction.lock().expect("lock").clone()
    }

    fn list_predictions(&self, patient_id: Option<&str>) -> Result<Vec<PredictionRecord>, ApiError> {
        self.calls.list_predictions.fetch_add(1, Ordering::SeqCst);
        *self.last_patient_filter.lock().expect("lock") = Some(patient_id.map(str::to_string));
        self.records.lock().expect("lock").clone()
    }

    fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.calls.admin_stats.fetch_add(1, Ordering::SeqCst);
        self.stats.lock().expect("lock").clone()
    }
}
