//! Client configuration read from the environment.

use std::path::PathBuf;

use crate::MedPredictError;

const DEFAULT_API_URL: &str = "http://localhost:8000";

/// Settings shared by the HTTP client and the export paths.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    /// Backend base URL, without a trailing slash
    pub api_url: String,
    /// Directory that downloaded reports and CSV exports are written to
    pub report_dir: PathBuf,
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            report_dir: PathBuf::from("."),
            user_agent: format!("medpredict/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

impl ClientConfig {
    /// Load from `MEDPREDICT_API_URL`, `MEDPREDICT_REPORT_DIR` and `MEDPREDICT_USER_AGENT`.
    ///
    /// # Errors
    /// Returns `MedPredictError::Config` if the API URL is not an http(s) URL.
    pub fn from_env() -> Result<Self, MedPredictError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, MedPredictError> {
        let defaults = Self::default();
        let non_empty = |key: &str| lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty());

        let api_url = non_empty("MEDPREDICT_API_URL")
            .map_or(defaults.api_url, |url| url.trim_end_matches('/').to_string());

        let parsed = reqwest::Url::parse(&api_url)
            .map_err(|e| MedPredictError::Config(format!("Invalid MEDPREDICT_API_URL {api_url}: {e}")))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(MedPredictError::Config(format!(
                "MEDPREDICT_API_URL must be http or https, got {}",
                parsed.scheme()
            )));
        }

        Ok(Self {
            api_url,
            report_dir: non_empty("MEDPREDICT_REPORT_DIR").map_or(defaults.report_dir, PathBuf::from),
            user_agent: non_empty("MEDPREDICT_USER_AGENT").unwrap_or(defaults.user_agent),
        })
    }
}
