//! Analytics service: System-wide statistics for administrators.
//!
//! Fetches `AdminStats` and reshapes them into the series the analytics
//! screen draws: a disease breakdown, risk-level bars and a daily count line.

use crate::domain::{AdminStats, DiseaseType, Registration, RiskLevel};
use crate::ports::SharedBackend;

/// Order of the disease breakdown.
const SLICE_ORDER: [DiseaseType; 4] = [
    DiseaseType::Heart,
    DiseaseType::Diabetes,
    DiseaseType::Stroke,
    DiseaseType::Hypertension,
];

/// Why statistics could not be shown.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AnalyticsError {
    #[error("Admin access required.")]
    AdminRequired,

    #[error("Failed to load stats.")]
    Unavailable,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Slice {
    pub label: String,
    pub value: u64,
}

/// Chart-ready statistics.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalyticsView {
    pub total_patients: u64,
    pub total_providers: u64,
    pub total_predictions: u64,
    /// Non-empty. A single `"No data"` slice when every disease count is zero.
    pub disease_slices: Vec<Slice>,
    /// Low, Moderate, High, Critical, in that order
    pub risk_bars: Vec<(RiskLevel, u64)>,
    pub daily: Vec<(chrono::NaiveDate, u64)>,
    pub recent_registrations: Vec<Registration>,
}

impl AnalyticsView {
    #[must_use]
    pub fn from_stats(stats: AdminStats) -> Self {
        let mut disease_slices: Vec<Slice> = SLICE_ORDER
            .iter()
            .map(|disease| Slice {
                label: disease.short_name().to_string(),
                value: stats.predictions_by_disease.get(disease.id()).copied().unwrap_or(0),
            })
            .filter(|slice| slice.value > 0)
            .collect();
        if disease_slices.is_empty() {
            disease_slices.push(Slice {
                label: "No data".to_string(),
                value: 1,
            });
        }

        let mut risk_bars: Vec<(RiskLevel, u64)> =
            RiskLevel::CHART_ORDER.iter().map(|level| (*level, 0)).collect();
        for (label, count) in &stats.predictions_by_risk_level {
            let Some(level) = RiskLevel::from_label(label) else {
                tracing::debug!("Ignoring unknown risk level bucket in stats");
                continue;
            };
            if let Some(bar) = risk_bars.iter_mut().find(|(l, _)| *l == level.normalized()) {
                bar.1 += count;
            }
        }

        let mut daily: Vec<(chrono::NaiveDate, u64)> = stats
            .daily_predictions
            .iter()
            .map(|d| (d.date, d.count))
            .collect();
        daily.sort_by_key(|(date, _)| *date);

        Self {
            total_patients: stats.total_patients,
            total_providers: stats.total_providers,
            total_predictions: stats.total_predictions,
            disease_slices,
            risk_bars,
            daily,
            recent_registrations: stats.recent_registrations,
        }
    }
}

/// Service for the admin analytics screen.
pub struct AnalyticsService {
    backend: SharedBackend,
}

impl AnalyticsService {
    /// Create a new analytics service.
    #[must_use]
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// Fetch and reshape the statistics.
    ///
    /// # Errors
    /// `AdminRequired` on 403, `Unavailable` on any other failure.
    pub fn load(&self) -> Result<AnalyticsView, AnalyticsError> {
        match self.backend.admin_stats() {
            Ok(stats) => {
                tracing::info!(
                    "Loaded admin statistics: {} predictions, {} patients",
                    stats.total_predictions,
                    stats.total_patients
                );
                Ok(AnalyticsView::from_stats(stats))
            }
            Err(e) if e.status() == Some(403) => Err(AnalyticsError::AdminRequired),
            Err(e) => {
                tracing::warn!("Failed to load admin statistics: {}", e);
                Err(AnalyticsError::Unavailable)
            }
        }
    }
}
