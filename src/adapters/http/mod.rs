//! HTTP adapter: Implementation of `HealthBackend` over the MedPredict REST API.
//!
//! Sessions are cookie based. The `csrftoken` cookie set by the backend is
//! echoed as `X-CSRFToken` on every mutating request. A 401 on any response is
//! reported through the event callback; this adapter never touches UI state.

mod wire;

use std::sync::Arc;

use reqwest::blocking::{Client, RequestBuilder, Response};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest::{StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::ClientConfig;
use crate::domain::{
    AdminStats, DiseaseType, Identity, PatientDetails, PatientReference, PredictionRecord,
    PredictionResult,
};
use crate::ports::{ApiError, ApiEvent, HealthBackend, PredictRequest, RegisterRequest};
use crate::MedPredictError;

use wire::{PatientPayload, PredictResponse};

const CSRF_COOKIE: &str = "csrftoken";
const CSRF_HEADER: &str = "X-CSRFToken";

/// Callback invoked for transport-level events such as an expired session.
pub type EventHandler = Arc<dyn Fn(ApiEvent) + Send + Sync>;

/// Blocking reqwest client bound to one backend.
pub struct HttpBackend {
    client: Client,
    jar: Arc<Jar>,
    base_url: Url,
    on_event: Option<EventHandler>,
}

impl HttpBackend {
    /// Create a client for the configured API URL.
    ///
    /// # Errors
    /// Returns `MedPredictError::Config` if the URL is invalid or the client cannot be built.
    pub fn new(config: &ClientConfig) -> Result<Self, MedPredictError> {
        let base_url = Url::parse(&config.api_url)
            .map_err(|e| MedPredictError::Config(format!("Invalid API URL {}: {e}", config.api_url)))?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .default_headers(headers)
            .user_agent(config.user_agent.clone())
            .build()
            .map_err(|e| MedPredictError::Config(format!("Failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            jar,
            base_url,
            on_event: None,
        })
    }

    /// Install the handler that receives `ApiEvent`s.
    #[must_use]
    pub fn with_event_handler(mut self, handler: EventHandler) -> Self {
        self.on_event = Some(handler);
        self
    }

    /// Append `segments` to the base URL with a trailing slash. Each segment
    /// is percent-encoded, so caller data can never add or climb path levels.
    fn endpoint(&self, segments: &[&str]) -> Result<Url, ApiError> {
        if let Some(bad) = segments.iter().find(|s| s.is_empty() || matches!(**s, "." | "..")) {
            return Err(ApiError::InvalidPath(bad.to_string()));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| ApiError::InvalidPath(self.base_url.to_string()))?
            .pop_if_empty()
            .extend(segments)
            .push("");
        Ok(url)
    }

    fn emit(&self, event: ApiEvent) {
        if let Some(handler) = &self.on_event {
            handler(event);
        }
    }

    fn csrf_token(&self) -> Option<String> {
        let header = self.jar.cookies(&self.base_url)?;
        let raw = header.to_str().ok()?;
        csrf_from_cookie_header(raw)
    }

    fn execute(&self, request: RequestBuilder, url: &Url) -> Result<Response, ApiError> {
        let path = url.path();
        let response = request.send().map_err(|e| ApiError::Network {
            url: url.to_string(),
            message: e.to_string(),
        })?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        if status == StatusCode::UNAUTHORIZED {
            tracing::warn!("Session rejected by backend on {}", path);
            self.emit(ApiEvent::Unauthorized);
        }

        let text = response.text().unwrap_or_default();
        let body = if text.trim().is_empty() {
            None
        } else {
            serde_json::from_str(&text).ok()
        };
        tracing::debug!("{} -> {}", path, status);

        Err(ApiError::Status {
            status: status.as_u16(),
            body,
        })
    }

    fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response.json().map_err(|e| ApiError::Decode(e.to_string()))
    }

    fn get_json<T: DeserializeOwned>(&self, segments: &[&str], query: &[(&str, &str)]) -> Result<T, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!("GET {}", url.path());
        let request = self.client.get(url.clone()).query(query);
        Self::decode(self.execute(request, &url)?)
    }

    fn post(&self, segments: &[&str], body: &impl Serialize) -> Result<Response, ApiError> {
        let url = self.endpoint(segments)?;
        tracing::debug!("POST {}", url.path());
        let mut request = self.client.post(url.clone()).json(body);
        if let Some(token) = self.csrf_token() {
            request = request.header(CSRF_HEADER, token);
        }
        self.execute(request, &url)
    }
}

/// Extract the CSRF token from a `Cookie` header value.
pub(crate) fn csrf_from_cookie_header(raw: &str) -> Option<String> {
    raw.split(';')
        .map(str::trim)
        .find_map(|pair| pair.strip_prefix(CSRF_COOKIE)?.strip_prefix('='))
        .filter(|token| !token.is_empty())
        .map(str::to_string)
}

impl HealthBackend for HttpBackend {
    fn login(&self, email: &str, password: &str) -> Result<Identity, ApiError> {
        let body = serde_json::json!({ "email": email, "password": password });
        Self::decode(self.post(&["api", "auth", "login"], &body)?)
    }

    fn logout(&self) -> Result<(), ApiError> {
        self.post(&["api", "auth", "logout"], &serde_json::json!({}))?;
        Ok(())
    }

    fn current_user(&self) -> Result<Identity, ApiError> {
        self.get_json(&["api", "auth", "me"], &[])
    }

    fn register(&self, request: &RegisterRequest) -> Result<Identity, ApiError> {
        Self::decode(self.post(&["api", "auth", "register"], request)?)
    }

    fn get_patient(&self, code: &str) -> Result<PatientReference, ApiError> {
        let payload: PatientPayload = self.get_json(&["api", "patients", code], &[])?;
        Ok(payload.into_reference())
    }

    fn patient_details(&self, code: &str) -> Result<PatientDetails, ApiError> {
        self.get_json(&["api", "patients"], &[("patient_id", code)])
    }

    fn predict(
        &self,
        disease: DiseaseType,
        request: &PredictRequest,
    ) -> Result<PredictionResult, ApiError> {
        let response: PredictResponse = Self::decode(self.post(&["api", "predict", disease.id()], request)?)?;
        Ok(response.into_result())
    }

    fn list_predictions(&self, patient_id: Option<&str>) -> Result<Vec<PredictionRecord>, ApiError> {
        let query: Vec<(&str, &str)> = patient_id.map(|id| ("patient_id", id)).into_iter().collect();
        let value: serde_json::Value = self.get_json(&["api", "predictions"], &query)?;
        wire::records_from_value(value)
    }

    fn admin_stats(&self) -> Result<AdminStats, ApiError> {
        self.get_json(&["api", "admin", "stats"], &[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{BufRead, BufReader, Write};
    use std::net::TcpListener;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::mpsc;
    use std::time::Duration;

    const NOT_FOUND: &str = "HTTP/1.1 404 Not Found\r\nContent-Length: 0\r\nConnection: close\r\n\r\n";

    /// Serve a single request on a local port and report its request line.
    fn serve_once(response: &'static str) -> (ClientConfig, mpsc::Receiver<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").expect("bind");
        let addr = listener.local_addr().expect("local addr");
        let (tx, rx) = mpsc::channel();

        std::thread::spawn(move || {
            let (mut stream, _) = listener.accept().expect("accept");
            let mut reader = BufReader::new(stream.try_clone().expect("clone stream"));
            let mut request_line = String::new();
            reader.read_line(&mut request_line).expect("read request line");
            loop {
                let mut header = String::new();
                if reader.read_line(&mut header).unwrap_or(0) <= 2 {
                    break;
                }
            }
            stream.write_all(response.as_bytes()).expect("write response");
            tx.send(request_line.trim_end().to_string()).expect("report request line");
        });

        let config = ClientConfig {
            api_url: format!("http://{addr}"),
            ..ClientConfig::default()
        };
        (config, rx)
    }

    #[test]
    fn test_endpoint_paths() {
        let backend = HttpBackend::new(&ClientConfig::default()).expect("Should build");
        let url = backend.endpoint(&["api", "predict", "heart"]).expect("valid path");
        assert_eq!(url.as_str(), "http://localhost:8000/api/predict/heart/");

        let prefixed = HttpBackend::new(&ClientConfig {
            api_url: "https://example.org/medpredict/".to_string(),
            ..ClientConfig::default()
        })
        .expect("Should build");
        let url = prefixed.endpoint(&["api", "auth", "me"]).expect("valid path");
        assert_eq!(url.path(), "/medpredict/api/auth/me/");
    }

    #[test]
    fn test_patient_code_stays_inside_patients_path() {
        let (config, rx) = serve_once(NOT_FOUND);
        let backend = HttpBackend::new(&config).expect("Should build");

        let err = backend
            .get_patient("1/../../admin/stats")
            .expect_err("server answers 404");
        assert_eq!(err.status(), Some(404));

        let line = rx.recv_timeout(Duration::from_secs(5)).expect("request seen");
        assert_eq!(line, "GET /api/patients/1%2F..%2F..%2Fadmin%2Fstats/ HTTP/1.1");
    }

    #[test]
    fn test_dot_segments_are_never_sent() {
        let backend = HttpBackend::new(&ClientConfig::default()).expect("Should build");
        for code in ["..", ".", ""] {
            assert!(matches!(
                backend.get_patient(code),
                Err(ApiError::InvalidPath(_))
            ));
        }
    }

    #[test]
    fn test_csrf_from_cookie_header() {
        assert_eq!(
            csrf_from_cookie_header("sessionid=abc; csrftoken=tok123"),
            Some("tok123".to_string())
        );
        assert_eq!(csrf_from_cookie_header("csrftoken=; sessionid=abc"), None);
        assert_eq!(csrf_from_cookie_header("xcsrftoken=nope"), None);
        assert_eq!(csrf_from_cookie_header(""), None);
    }

    #[test]
    fn test_csrf_token_read_from_jar() {
        let backend = HttpBackend::new(&ClientConfig::default()).expect("Should build");
        assert!(backend.csrf_token().is_none());

        backend
            .jar
            .add_cookie_str("csrftoken=abc42; Path=/", &backend.base_url);
        assert_eq!(backend.csrf_token(), Some("abc42".to_string()));
    }

    #[test]
    fn test_invalid_url_is_a_config_error() {
        let config = ClientConfig {
            api_url: "not a url".to_string(),
            ..ClientConfig::default()
        };
        assert!(matches!(HttpBackend::new(&config), Err(MedPredictError::Config(_))));
    }

    #[test]
    fn test_event_handler_receives_events() {
        let seen = Arc::new(AtomicUsize::new(0));
        let counter = seen.clone();
        let backend = HttpBackend::new(&ClientConfig::default())
            .expect("Should build")
            .with_event_handler(Arc::new(move |event| {
                assert_eq!(event, ApiEvent::Unauthorized);
                counter.fetch_add(1, Ordering::SeqCst);
            }));

        backend.emit(ApiEvent::Unauthorized);
        assert_eq!(seen.load(Ordering::SeqCst), 1);
    }
}
