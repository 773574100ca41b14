//! Authenticated identities and account registration data.

use serde::{Deserialize, Serialize};

/// Account role, deciding which screens a user may reach.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Patient,
    Provider,
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Patient => write!(f, "patient"),
            Self::Provider => write!(f, "provider"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

/// The currently signed-in user, as returned by the auth endpoints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: u64,
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
    #[serde(default)]
    pub full_name: String,
}

impl Identity {
    /// Name to print on screens and reports.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if !self.full_name.trim().is_empty() {
            &self.full_name
        } else if !self.username.is_empty() {
            &self.username
        } else {
            "Patient"
        }
    }
}

/// Sign-up form contents. Role-specific fields are ignored for the other role.
#[derive(Debug, Clone, Default)]
pub struct RegistrationForm {
    pub username: Option<String>,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
    pub full_name: String,
    pub phone: String,
    pub date_of_birth: Option<String>,
    pub specialization: String,
    pub license_number: String,
}

/// Username derived from the e-mail local part, with non-alphanumerics replaced.
#[must_use]
pub fn username_from_email(email: &str) -> String {
    let local = email.split('@').next().unwrap_or_default();
    let derived: String = local
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect();

    if derived.is_empty() {
        "user".to_string()
    } else {
        derived
    }
}
