//! Prediction history: loading, filtering, paging, summaries and CSV export.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

use crate::adapters::export::{export_history_csv, history_filename, save_export};
use crate::domain::{format_percentage, DiseaseType, PredictionRecord};
use crate::ports::{ApiError, SharedBackend};
use crate::MedPredictError;

/// Rows per history page.
pub const PAGE_SIZE: usize = 10;

/// Filter and page selection for the history table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryQuery {
    pub disease: Option<DiseaseType>,
    /// Zero-based page index; clamped to the last page
    pub page: usize,
}

/// One page of the (filtered) history.
#[derive(Debug, Clone, PartialEq)]
pub struct HistoryPage<'a> {
    pub rows: &'a [PredictionRecord],
    /// Zero-based, after clamping
    pub page: usize,
    /// At least 1, even for an empty history
    pub total_pages: usize,
    pub total_rows: usize,
}

/// Slice the history for `query`. Returned rows borrow from `filtered`.
#[must_use]
pub fn page(filtered: &[PredictionRecord], query: HistoryQuery) -> HistoryPage<'_> {
    let total_rows = filtered.len();
    let total_pages = total_rows.div_ceil(PAGE_SIZE).max(1);
    let page = query.page.min(total_pages - 1);
    let start = (page * PAGE_SIZE).min(total_rows);
    let end = (start + PAGE_SIZE).min(total_rows);

    HistoryPage {
        rows: &filtered[start..end],
        page,
        total_pages,
        total_rows,
    }
}

/// Records matching the disease filter, order preserved.
#[must_use]
pub fn filter(records: &[PredictionRecord], disease: Option<DiseaseType>) -> Vec<PredictionRecord> {
    match disease {
        None => records.to_vec(),
        Some(disease) => records
            .iter()
            .filter(|r| r.disease() == Some(disease))
            .cloned()
            .collect(),
    }
}

/// Dashboard figures derived from one patient's history.
#[derive(Debug, Clone, PartialEq)]
pub struct PatientSummary {
    pub total: usize,
    /// Disease label → number of predictions
    pub counts_by_disease: BTreeMap<String, usize>,
    pub most_predicted: Option<String>,
    pub last_prediction: Option<DateTime<Utc>>,
    /// Risk level label of the newest prediction
    pub last_risk: Option<String>,
    /// `"heart: 84.7%"` for the highest probability seen
    pub highest_risk: Option<String>,
    /// Disease label → probability of the newest prediction for that disease
    pub latest_by_disease: BTreeMap<String, f64>,
}

#[must_use]
pub fn summarize(records: &[PredictionRecord]) -> PatientSummary {
    let mut counts_by_disease: BTreeMap<String, usize> = BTreeMap::new();
    let mut latest: BTreeMap<String, &PredictionRecord> = BTreeMap::new();

    for record in records {
        let label = record.disease_label();
        *counts_by_disease.entry(label.clone()).or_default() += 1;
        latest
            .entry(label)
            .and_modify(|current| {
                if record.created_at > current.created_at {
                    *current = record;
                }
            })
            .or_insert(record);
    }

    let newest = records.iter().max_by_key(|r| r.created_at);
    let highest = records
        .iter()
        .fold(None::<&PredictionRecord>, |best, r| match best {
            Some(b) if b.probability >= r.probability => Some(b),
            _ => Some(r),
        });

    // Ties go to the first disease in label order.
    let most_predicted = counts_by_disease
        .iter()
        .fold(None::<(&String, usize)>, |best, (label, &count)| match best {
            Some((_, top)) if top >= count => best,
            _ => Some((label, count)),
        })
        .map(|(label, _)| label.clone());

    PatientSummary {
        total: records.len(),
        most_predicted,
        last_prediction: newest.map(|r| r.created_at),
        last_risk: newest.map(|r| r.risk_level.clone()),
        highest_risk: highest
            .map(|r| format!("{}: {}", r.disease_label(), format_percentage(r.probability))),
        latest_by_disease: latest
            .into_iter()
            .map(|(label, r)| (label, r.probability))
            .collect(),
        counts_by_disease,
    }
}

/// Loads history through the backend and exports it.
pub struct HistoryService {
    backend: SharedBackend,
}

impl HistoryService {
    #[must_use]
    pub fn new(backend: SharedBackend) -> Self {
        Self { backend }
    }

    /// The caller's own history, or `patient_id`'s for providers. Newest first.
    ///
    /// # Errors
    /// Returns `ApiError` if the request fails.
    pub fn load(&self, patient_id: Option<&str>) -> Result<Vec<PredictionRecord>, ApiError> {
        let patient_id = patient_id.map(str::trim).filter(|id| !id.is_empty());
        let mut records = self.backend.list_predictions(patient_id)?;
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        tracing::debug!("Loaded {} history rows", records.len());
        Ok(records)
    }

    /// Write `records` as `Patient_{id}_History.csv` into `dir`.
    ///
    /// # Errors
    /// Returns `MedPredictError::Export` or `Io` if the file cannot be produced.
    pub fn export_csv(
        &self,
        records: &[PredictionRecord],
        patient_id: Option<&str>,
        dir: &Path,
    ) -> Result<PathBuf, MedPredictError> {
        let csv = export_history_csv(records)?;
        let id = patient_id
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .unwrap_or("unknown");
        save_export(dir, &history_filename(id), csv.as_bytes())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::{record, Calls, FakeBackend};
    use std::sync::Arc;

    fn records(n: usize) -> Vec<PredictionRecord> {
        (0..n)
            .map(|i| {
                let disease = if i % 2 == 0 { "heart" } else { "diabetes" };
                record(i as u64, disease, 0.1, "Low", 1 + (i % 28) as u32)
            })
            .collect()
    }

    #[test]
    fn test_paging() {
        let all = records(23);
        let first = page(&all, HistoryQuery::default());
        assert_eq!(first.rows.len(), PAGE_SIZE);
        assert_eq!(first.total_pages, 3);

        let last = page(&all, HistoryQuery { disease: None, page: 2 });
        assert_eq!(last.rows.len(), 3);

        let clamped = page(&all, HistoryQuery { disease: None, page: 99 });
        assert_eq!(clamped.page, 2);
    }

    #[test]
    fn test_empty_history_has_one_page() {
        let empty = page(&[], HistoryQuery { disease: None, page: 4 });
        assert_eq!(empty.total_pages, 1);
        assert_eq!(empty.page, 0);
        assert!(empty.rows.is_empty());
    }

    #[test]
    fn test_filter_by_disease() {
        let all = records(5);
        let hearts = filter(&all, Some(DiseaseType::Heart));
        assert_eq!(hearts.len(), 3);
        assert!(hearts.iter().all(|r| r.disease_type == "heart"));
        assert_eq!(filter(&all, None).len(), 5);
    }

    #[test]
    fn test_summary() {
        let all = vec![
            record(1, "heart", 0.30, "Moderate", 1),
            record(2, "heart", 0.847, "High", 2),
            record(3, "diabetes", 0.20, "Low", 5),
        ];
        let summary = summarize(&all);

        assert_eq!(summary.total, 3);
        assert_eq!(summary.most_predicted.as_deref(), Some("heart"));
        assert_eq!(summary.highest_risk.as_deref(), Some("heart: 84.7%"));
        assert_eq!(summary.last_risk.as_deref(), Some("Low"));
        assert_eq!(summary.latest_by_disease.get("heart"), Some(&0.847));
        assert_eq!(summary.counts_by_disease.get("diabetes"), Some(&1));

        let empty = summarize(&[]);
        assert_eq!(empty.highest_risk, None);
        assert_eq!(empty.last_prediction, None);
    }

    #[test]
    fn test_load_sorts_newest_first() {
        let fake = Arc::new(FakeBackend::default());
        *fake.records.lock().expect("lock") = Ok(vec![
            record(1, "heart", 0.1, "Low", 3),
            record(2, "stroke", 0.2, "Low", 9),
        ]);
        let service = HistoryService::new(fake.clone());

        let loaded = service.load(Some(" 42 ")).expect("Should load");
        assert_eq!(loaded.iter().map(|r| r.id).collect::<Vec<_>>(), vec![2, 1]);
        assert_eq!(Calls::count(&fake.calls.list_predictions), 1);
        assert_eq!(
            fake.last_patient_filter.lock().expect("lock").clone(),
            Some(Some("42".to_string()))
        );

        service.load(Some("")).expect("Should load");
        assert_eq!(fake.last_patient_filter.lock().expect("lock").clone(), Some(None));
    }

    #[test]
    fn test_export_csv_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let service = HistoryService::new(Arc::new(FakeBackend::default()));
        let path = service
            .export_csv(&records(2), Some("42"), dir.path())
            .expect("Should export");

        assert!(path.ends_with("Patient_42_History.csv"));
        let text = std::fs::read_to_string(path).expect("read");
        assert_eq!(text.lines().count(), 3);
    }
}
