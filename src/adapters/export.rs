//! File exports: prediction history as CSV and saving generated documents.

use std::path::{Path, PathBuf};

use csv::{QuoteStyle, Terminator, WriterBuilder};

use crate::domain::{format_percentage, PredictionRecord};
use crate::MedPredictError;

const HEADER: [&str; 5] = ["Date", "Disease", "Risk Probability", "Risk Level", "Prediction"];

/// Render history rows as CSV, one line per record after the header.
///
/// # Errors
/// Returns `MedPredictError::Export` if the CSV writer fails.
pub fn export_history_csv(records: &[PredictionRecord]) -> Result<String, MedPredictError> {
    let mut writer = WriterBuilder::new()
        .quote_style(QuoteStyle::Necessary)
        .terminator(Terminator::Any(b'\n'))
        .from_writer(Vec::new());

    writer.write_record(HEADER).map_err(export_error)?;
    for record in records {
        let date = record.created_at.format("%Y-%m-%d %H:%M").to_string();
        let outcome = if record.is_positive() { "Positive" } else { "Negative" };
        writer
            .write_record([
                date.as_str(),
                record.disease_label().as_str(),
                format_percentage(record.probability).as_str(),
                record.risk_level.as_str(),
                outcome,
            ])
            .map_err(export_error)?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| MedPredictError::Export(e.to_string()))?;
    String::from_utf8(bytes).map_err(|e| MedPredictError::Export(e.to_string()))
}

/// Suggested file name for a patient's history export.
#[must_use]
pub fn history_filename(patient_id: &str) -> String {
    format!("Patient_{patient_id}_History.csv")
}

/// Write `bytes` to `dir/filename`, creating `dir` if needed.
///
/// # Errors
/// Returns `MedPredictError::Io` if the directory or file cannot be written.
pub fn save_export(dir: &Path, filename: &str, bytes: &[u8]) -> Result<PathBuf, MedPredictError> {
    std::fs::create_dir_all(dir)?;
    let path = dir.join(filename);
    std::fs::write(&path, bytes)?;
    tracing::info!("Export written ({} bytes)", bytes.len());
    Ok(path)
}

fn export_error(e: csv::Error) -> MedPredictError {
    MedPredictError::Export(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn record(id: u64, disease: &str, prediction: u8, probability: f64, level: &str) -> PredictionRecord {
        PredictionRecord {
            id,
            patient: Some(7),
            disease_type: disease.to_string(),
            prediction,
            probability,
            risk_level: level.to_string(),
            created_at: Utc.with_ymd_and_hms(2026, 3, 14, 9, 30, 0).single().expect("valid date"),
        }
    }

    #[test]
    fn test_one_line_per_record() {
        let csv = export_history_csv(&[
            record(1, "heart", 1, 0.847, "High"),
            record(2, "diabetes", 0, 0.12, "Low"),
        ])
        .expect("Should export");

        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0], "Date,Disease,Risk Probability,Risk Level,Prediction");
        assert_eq!(lines[1], "2026-03-14 09:30,heart,84.7%,High,Positive");
        assert_eq!(lines[2], "2026-03-14 09:30,diabetes,12.0%,Low,Negative");
    }

    #[test]
    fn test_fields_with_commas_are_quoted() {
        let csv = export_history_csv(&[record(1, "heart", 0, 0.5, "Moderate, \"watch\"")])
            .expect("Should export");
        assert!(csv.contains(r#""Moderate, ""watch""""#));
    }

    #[test]
    fn test_empty_history_is_header_only() {
        let csv = export_history_csv(&[]).expect("Should export");
        assert_eq!(csv, "Date,Disease,Risk Probability,Risk Level,Prediction\n");
    }

    #[test]
    fn test_save_export() {
        let dir = tempfile::tempdir().expect("tempdir");
        let target = dir.path().join("nested");
        let path = save_export(&target, &history_filename("42"), b"x").expect("Should save");
        assert!(path.ends_with("Patient_42_History.csv"));
        assert_eq!(std::fs::read(path).expect("read"), b"x");
    }
}
