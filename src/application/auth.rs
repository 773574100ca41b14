//! Auth service: the only writer of the session store.
//!
//! Login, logout, session refresh and registration go through here, as does
//! the reaction to an expired session reported by the transport.

use std::sync::{Arc, OnceLock};

use regex::Regex;

use crate::domain::{Identity, RegistrationForm, Role};
use crate::ports::{ApiError, RegisterRequest, SessionStore, SharedBackend};

static EMAIL: OnceLock<Option<Regex>> = OnceLock::new();
static DATE: OnceLock<Option<Regex>> = OnceLock::new();

/// Minimum password length accepted at sign-up.
pub const MIN_PASSWORD_LEN: usize = 8;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthError {
    #[error("Please enter email and password.")]
    MissingCredentials,

    #[error("{0}")]
    Rejected(String),

    #[error("Please fix the errors below.")]
    InvalidForm(Vec<FieldError>),
}

/// A sign-up field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

/// Where navigation to a screen should go.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteDecision {
    Allow,
    /// No session: go to the login screen
    Login,
    /// Signed in with another role: go to that role's home
    Redirect(Role),
}

/// Decide whether `identity` may open a screen restricted to `required`.
#[must_use]
pub fn guard(identity: Option<&Identity>, required: Option<Role>) -> RouteDecision {
    match (identity, required) {
        (None, _) => RouteDecision::Login,
        (Some(identity), Some(role)) if identity.role != role => RouteDecision::Redirect(identity.role),
        _ => RouteDecision::Allow,
    }
}

fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

/// Client-side sign-up checks. An empty result means the form may be sent.
#[must_use]
pub fn validate_registration(form: &RegistrationForm, role: Role) -> Vec<FieldError> {
    let mut errors = Vec::new();
    let mut push = |field: &'static str, message: &'static str| errors.push(FieldError { field, message });

    if form.full_name.trim().is_empty() {
        push("full_name", "Required.");
    }

    let email = form.email.trim();
    if email.is_empty() {
        push("email", "Required.");
    } else if !pattern(&EMAIL, r"^[^\s@]+@[^\s@]+\.[^\s@]+$").is_some_and(|re| re.is_match(email)) {
        push("email", "Invalid email.");
    }

    if role == Role::Patient {
        let dob = form.date_of_birth.as_deref().unwrap_or_default().trim();
        if !dob.is_empty() && !pattern(&DATE, r"^\d{4}-\d{2}-\d{2}$").is_some_and(|re| re.is_match(dob)) {
            push("date_of_birth", "Use YYYY-MM-DD.");
        }
    } else {
        if form.specialization.trim().is_empty() {
            push("specialization", "Required.");
        }
        if form.license_number.trim().is_empty() {
            push("license_number", "Required.");
        }
    }

    if form.password.is_empty() {
        push("password", "Required.");
    } else if form.password.chars().count() < MIN_PASSWORD_LEN {
        push("password", "At least 8 characters.");
    }
    if form.password != form.confirm_password {
        push("confirm_password", "Passwords do not match.");
    }

    errors
}

/// Message for a rejected registration: `detail`, else `field: first error` pairs.
fn registration_message(err: &ApiError) -> String {
    let Some(body) = err.body() else {
        return "Registration failed.".to_string();
    };

    match body.get("detail") {
        Some(serde_json::Value::String(detail)) => return detail.clone(),
        Some(detail) if !detail.is_null() => return detail.to_string(),
        _ => {}
    }

    let parts: Vec<String> = body
        .as_object()
        .map(|fields| {
            fields
                .iter()
                .map(|(key, value)| {
                    let first = match value {
                        serde_json::Value::Array(items) => items.first().cloned().unwrap_or_default(),
                        other => other.clone(),
                    };
                    match first {
                        serde_json::Value::String(s) => format!("{key}: {s}"),
                        other => format!("{key}: {other}"),
                    }
                })
                .collect()
        })
        .unwrap_or_default();

    if parts.is_empty() {
        "Registration failed.".to_string()
    } else {
        parts.join(" ")
    }
}

/// Authentication use cases.
pub struct AuthService {
    backend: SharedBackend,
    session: Arc<dyn SessionStore>,
}

impl AuthService {
    #[must_use]
    pub fn new(backend: SharedBackend, session: Arc<dyn SessionStore>) -> Self {
        Self { backend, session }
    }

    #[must_use]
    pub fn current(&self) -> Option<Identity> {
        self.session.get()
    }

    /// Sign in and store the identity.
    ///
    /// # Errors
    /// `MissingCredentials` for blank input, `Rejected` with the backend's
    /// `detail` (or "Invalid credentials.") otherwise.
    pub fn login(&self, email: &str, password: &str) -> Result<Identity, AuthError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AuthError::MissingCredentials);
        }

        match self.backend.login(email.trim(), password) {
            Ok(identity) => {
                self.session.set(identity.clone());
                Ok(identity)
            }
            Err(e) => {
                tracing::warn!("Login failed: {}", e);
                Err(AuthError::Rejected(e.detail_or("Invalid credentials.")))
            }
        }
    }

    /// End the session. Local state is cleared first, so it is cleared even
    /// if the request fails.
    pub fn logout(&self) {
        self.sign_out();
        self.end_remote_session();
    }

    /// Clear the local session without contacting the backend.
    pub fn sign_out(&self) {
        self.session.clear();
    }

    /// Tell the backend the session is over. Never touches local state, so a
    /// slow response cannot undo a later sign-in.
    pub fn end_remote_session(&self) {
        if let Err(e) = self.backend.logout() {
            tracing::warn!("Logout request failed: {}", e);
        }
    }

    /// Re-read the identity bound to the session cookie. Any failure signs out.
    pub fn refresh(&self) -> Option<Identity> {
        match self.backend.current_user() {
            Ok(identity) => {
                self.session.set(identity.clone());
                Some(identity)
            }
            Err(e) if e.is_unauthorized() => {
                tracing::debug!("No active session");
                self.session.clear();
                None
            }
            Err(e) => {
                tracing::warn!("Session check failed: {}", e);
                self.session.clear();
                None
            }
        }
    }

    /// Create an account. The session is left untouched; the user signs in afterwards.
    ///
    /// # Errors
    /// `InvalidForm` when client-side checks fail (no request is made),
    /// `Rejected` with the backend's message otherwise.
    pub fn register(&self, form: &RegistrationForm, role: Role) -> Result<Identity, AuthError> {
        let errors = validate_registration(form, role);
        if !errors.is_empty() {
            return Err(AuthError::InvalidForm(errors));
        }

        let request = RegisterRequest::from_form(form, role);
        self.backend.register(&request).map_err(|e| {
            tracing::warn!("Registration failed: {}", e);
            let message = if e.status() == Some(403) && e.body().is_none() {
                "Request blocked. Check CORS/CSRF settings.".to_string()
            } else {
                registration_message(&e)
            };
            AuthError::Rejected(message)
        })
    }

    /// React to a 401. Returns `Login` when the user should be sent to the
    /// login screen; nothing happens while already on login or register.
    pub fn handle_unauthorized(&self, on_auth_screen: bool) -> RouteDecision {
        if on_auth_screen {
            return RouteDecision::Allow;
        }
        tracing::info!("Session expired; signing out");
        self.session.clear();
        RouteDecision::Login
    }

    /// Route guard against the current session.
    #[must_use]
    pub fn guard(&self, required: Option<Role>) -> RouteDecision {
        guard(self.session.get().as_ref(), required)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::session::InMemorySessionStore;
    use crate::application::testing::{identity, status, Calls, FakeBackend};
    use serde_json::json;

    fn service(fake: &Arc<FakeBackend>) -> (AuthService, Arc<InMemorySessionStore>) {
        let session = Arc::new(InMemorySessionStore::new());
        (AuthService::new(fake.clone(), session.clone()), session)
    }

    fn valid_form() -> RegistrationForm {
        RegistrationForm {
            email: "ann.oak@example.org".to_string(),
            password: "longenough".to_string(),
            confirm_password: "longenough".to_string(),
            full_name: "Ann Oak".to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn test_login_sets_session() {
        let fake = Arc::new(FakeBackend::default());
        let (auth, session) = service(&fake);

        assert_eq!(auth.login(" ", "x"), Err(AuthError::MissingCredentials));
        assert_eq!(Calls::count(&fake.calls.login), 0);

        let identity = auth.login("sam@example.org", "pw").expect("Should login");
        assert_eq!(session.get(), Some(identity));
    }

    #[test]
    fn test_login_rejected() {
        let fake = Arc::new(FakeBackend::default());
        *fake.identity.lock().expect("lock") = Err(status(401, json!({})));
        let (auth, session) = service(&fake);

        assert_eq!(
            auth.login("sam@example.org", "bad"),
            Err(AuthError::Rejected("Invalid credentials.".to_string()))
        );
        assert!(session.get().is_none());
    }

    #[test]
    fn test_logout_clears_even_on_failure() {
        let fake = Arc::new(FakeBackend::default());
        *fake.logout.lock().expect("lock") = Err(status(500, json!({})));
        let (auth, session) = service(&fake);
        session.set(identity(Role::Patient));

        auth.logout();
        assert!(session.get().is_none());
        assert_eq!(Calls::count(&fake.calls.logout), 1);
    }

    #[test]
    fn test_remote_logout_leaves_newer_session_alone() {
        let fake = Arc::new(FakeBackend::default());
        let (auth, session) = service(&fake);
        session.set(identity(Role::Patient));

        auth.sign_out();
        assert!(session.get().is_none());

        session.set(identity(Role::Provider));
        auth.end_remote_session();
        assert_eq!(session.get().map(|i| i.role), Some(Role::Provider));
        assert_eq!(Calls::count(&fake.calls.logout), 1);
    }

    #[test]
    fn test_refresh() {
        let fake = Arc::new(FakeBackend::default());
        let (auth, session) = service(&fake);
        assert!(auth.refresh().is_some());
        assert!(session.get().is_some());

        *fake.identity.lock().expect("lock") = Err(status(401, json!({})));
        assert!(auth.refresh().is_none());
        assert!(session.get().is_none());

        session.set(identity(Role::Patient));
        *fake.identity.lock().expect("lock") = Err(status(503, json!({})));
        assert!(auth.refresh().is_none());
        assert!(session.get().is_none());
    }

    #[test]
    fn test_guard() {
        let patient = identity(Role::Patient);
        assert_eq!(guard(None, None), RouteDecision::Login);
        assert_eq!(guard(Some(&patient), None), RouteDecision::Allow);
        assert_eq!(guard(Some(&patient), Some(Role::Patient)), RouteDecision::Allow);
        assert_eq!(
            guard(Some(&patient), Some(Role::Admin)),
            RouteDecision::Redirect(Role::Patient)
        );
    }

    #[test]
    fn test_handle_unauthorized() {
        let fake = Arc::new(FakeBackend::default());
        let (auth, session) = service(&fake);
        session.set(identity(Role::Provider));

        assert_eq!(auth.handle_unauthorized(true), RouteDecision::Allow);
        assert!(session.get().is_some());

        assert_eq!(auth.handle_unauthorized(false), RouteDecision::Login);
        assert!(session.get().is_none());
    }

    #[test]
    fn test_validate_registration() {
        assert!(validate_registration(&valid_form(), Role::Patient).is_empty());

        let mut form = valid_form();
        form.email = "not-an-email".to_string();
        form.password = "short".to_string();
        form.date_of_birth = Some("1/2/1990".to_string());
        let fields: Vec<&str> = validate_registration(&form, Role::Patient)
            .iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(fields, vec!["email", "date_of_birth", "password", "confirm_password"]);

        let provider_fields: Vec<&str> = validate_registration(&valid_form(), Role::Provider)
            .iter()
            .map(|e| e.field)
            .collect();
        assert_eq!(provider_fields, vec!["specialization", "license_number"]);
    }

    #[test]
    fn test_register() {
        let fake = Arc::new(FakeBackend::default());
        let (auth, session) = service(&fake);

        auth.register(&valid_form(), Role::Patient).expect("Should register");
        assert!(session.get().is_none());
        let sent = fake.last_register.lock().expect("lock").clone().expect("sent");
        assert_eq!(sent.username, "ann_oak");

        *fake.identity.lock().expect("lock") =
            Err(status(400, json!({"email": ["A user with this email already exists."]})));
        assert_eq!(
            auth.register(&valid_form(), Role::Patient),
            Err(AuthError::Rejected(
                "email: A user with this email already exists.".to_string()
            ))
        );

        assert!(matches!(
            auth.register(&RegistrationForm::default(), Role::Patient),
            Err(AuthError::InvalidForm(_))
        ));
        assert_eq!(Calls::count(&fake.calls.register), 2);
    }
}
