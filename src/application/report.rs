//! Report generation: turns a prediction result into a printable document model.
//!
//! The model is layout-free. Each block already carries its wrapped lines, so
//! document backends only decide fonts, colors and pagination.

use chrono::{DateTime, Local};

use crate::domain::recommendations::recommendations;
use crate::domain::{DiseaseType, PredictionResult, RiskTone};
use crate::ports::ReportWriter;
use crate::MedPredictError;

/// Column width for body text.
pub const WRAP_COLUMNS: usize = 90;
/// Column width for bullet text, leaving room for the indent.
pub const BULLET_WRAP_COLUMNS: usize = 86;

pub const REPORT_TITLE: &str = "MedPredict - Disease Risk Report";
pub const DISCLAIMER: &str = "This report is for clinical reference only. Consult a licensed \
                              healthcare professional before making medical decisions.";

/// Who the report is about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportSubject {
    pub name: String,
    /// Patient id, when known
    pub id: Option<String>,
}

impl ReportSubject {
    #[must_use]
    pub fn new(name: impl Into<String>, id: Option<String>) -> Self {
        Self {
            name: name.into(),
            id,
        }
    }
}

/// Typographic role of a block.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextStyle {
    Body,
    Strong,
    /// Bold text colored by the risk tone
    Accent,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReportBlock {
    Text { lines: Vec<String>, style: TextStyle },
    Heading(String),
    /// One bullet, already wrapped
    Bullet(Vec<String>),
    Spacer,
}

/// A finished report, ready for a [`ReportWriter`].
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub title: String,
    pub disease: DiseaseType,
    pub generated_at: DateTime<Local>,
    pub tone: RiskTone,
    pub blocks: Vec<ReportBlock>,
    pub footer: Vec<String>,
}

impl Report {
    /// `Report_{disease}_{YYYY-MM-DD}.{extension}`
    #[must_use]
    pub fn filename(&self, extension: &str) -> String {
        format!(
            "Report_{}_{}.{}",
            self.disease.id(),
            self.generated_at.format("%Y-%m-%d"),
            extension
        )
    }

    /// Every line of the report as plain text, in reading order.
    #[must_use]
    pub fn plain_lines(&self) -> Vec<String> {
        let mut out = vec![self.title.clone()];
        for block in &self.blocks {
            match block {
                ReportBlock::Text { lines, .. } => out.extend(lines.iter().cloned()),
                ReportBlock::Heading(text) => out.push(text.clone()),
                ReportBlock::Bullet(lines) => {
                    for (i, line) in lines.iter().enumerate() {
                        out.push(if i == 0 { format!("- {line}") } else { format!("  {line}") });
                    }
                }
                ReportBlock::Spacer => out.push(String::new()),
            }
        }
        out.extend(self.footer.iter().cloned());
        out
    }
}

/// Assemble the report for one prediction.
///
/// The recommendations section is present only when the table has bullets for
/// the disease and the normalized risk level.
#[must_use]
pub fn build_report(
    result: &PredictionResult,
    subject: &ReportSubject,
    disease: DiseaseType,
    generated_at: DateTime<Local>,
) -> Report {
    let mut blocks = vec![
        ReportBlock::Text {
            lines: [
                format!("Patient: {}", subject.name),
                format!("Patient ID: {}", subject.id.as_deref().unwrap_or("-")),
                format!("Date: {}", generated_at.format("%Y-%m-%d %H:%M")),
            ]
            .iter()
            .flat_map(|line| wrap_text(line, WRAP_COLUMNS))
            .collect(),
            style: TextStyle::Body,
        },
        ReportBlock::Spacer,
        ReportBlock::Text {
            lines: vec![format!("Disease tested: {}", disease.title())],
            style: TextStyle::Strong,
        },
        ReportBlock::Text {
            lines: vec![format!("Risk Probability: {}", result.percentage())],
            style: TextStyle::Body,
        },
        ReportBlock::Text {
            lines: wrap_text(&format!("Risk Level: {}", result.risk.label), WRAP_COLUMNS),
            style: TextStyle::Accent,
        },
    ];

    if let Some(advice) = &result.risk_advice {
        blocks.push(ReportBlock::Text {
            lines: wrap_text(&format!("Clinical advice: {advice}"), WRAP_COLUMNS),
            style: TextStyle::Body,
        });
    }

    let bullets = result
        .risk
        .level
        .and_then(|level| recommendations(disease, level));
    if let Some(bullets) = bullets {
        blocks.push(ReportBlock::Spacer);
        blocks.push(ReportBlock::Heading("Preventive Recommendations".to_string()));
        blocks.extend(
            bullets
                .iter()
                .map(|bullet| ReportBlock::Bullet(wrap_text(bullet, BULLET_WRAP_COLUMNS))),
        );
    }

    Report {
        title: REPORT_TITLE.to_string(),
        disease,
        generated_at,
        tone: result.risk.tone(),
        blocks,
        footer: wrap_text(DISCLAIMER, WRAP_COLUMNS + 10),
    }
}

/// Build and render a report in one step.
///
/// # Errors
/// Returns `MedPredictError::Report` if the writer fails.
pub fn generate_report(
    writer: &dyn ReportWriter,
    result: &PredictionResult,
    subject: &ReportSubject,
    disease: DiseaseType,
    generated_at: DateTime<Local>,
) -> Result<(String, Vec<u8>), MedPredictError> {
    let report = build_report(result, subject, disease, generated_at);
    let bytes = writer.render(&report)?;
    tracing::info!("Report rendered for {} ({} bytes)", disease, bytes.len());
    Ok((report.filename(writer.extension()), bytes))
}

/// Greedy word wrap at `max_chars` columns. Words longer than a line are
/// split into line-sized pieces, so no line is ever wider than `max_chars`.
#[must_use]
pub fn wrap_text(text: &str, max_chars: usize) -> Vec<String> {
    let max_chars = max_chars.max(1);
    let mut lines = Vec::new();
    let mut current = String::new();

    let pieces = text.split_whitespace().flat_map(|word| {
        let chars: Vec<char> = word.chars().collect();
        chars
            .chunks(max_chars)
            .map(|chunk| chunk.iter().collect::<String>())
            .collect::<Vec<_>>()
    });

    for word in pieces {
        let width = current.chars().count();
        if width > 0 && width + 1 + word.chars().count() > max_chars {
            lines.push(std::mem::take(&mut current));
        }
        if !current.is_empty() {
            current.push(' ');
        }
        current.push_str(&word);
    }
    if !current.is_empty() || lines.is_empty() {
        lines.push(current);
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::RiskAssessment;
    use crate::ports::ReportError;
    use chrono::TimeZone;

    fn at() -> DateTime<Local> {
        Local
            .with_ymd_and_hms(2026, 5, 2, 14, 5, 0)
            .single()
            .expect("valid local time")
    }

    fn result(label: &str, advice: Option<&str>) -> PredictionResult {
        PredictionResult {
            probability: 0.847,
            risk: RiskAssessment::from_wire(label, Some("red")),
            risk_advice: advice.map(str::to_string),
        }
    }

    fn subject() -> ReportSubject {
        ReportSubject::new("Ann Oak", Some("12".to_string()))
    }

    #[test]
    fn test_report_lines() {
        let report = build_report(
            &result("High", Some("See a cardiologist")),
            &subject(),
            DiseaseType::Heart,
            at(),
        );
        let lines = report.plain_lines();

        assert!(lines.contains(&"Risk Probability: 84.7%".to_string()));
        assert!(lines.contains(&"Risk Level: High".to_string()));
        assert!(lines.contains(&"Patient ID: 12".to_string()));
        assert!(lines.contains(&"Disease tested: Heart Disease Risk Assessment".to_string()));
        assert!(lines.contains(&"Clinical advice: See a cardiologist".to_string()));
        assert!(lines.contains(&"Preventive Recommendations".to_string()));
        assert_eq!(report.tone, RiskTone::Danger);
        assert_eq!(report.filename("pdf"), "Report_heart_2026-05-02.pdf");
    }

    #[test]
    fn test_all_bullets_for_normalized_level() {
        let report = build_report(&result("Medium", None), &subject(), DiseaseType::Diabetes, at());
        let expected = recommendations(DiseaseType::Diabetes, crate::domain::RiskLevel::Moderate)
            .expect("table entry")
            .len();
        let bullets = report
            .blocks
            .iter()
            .filter(|b| matches!(b, ReportBlock::Bullet(_)))
            .count();
        assert_eq!(bullets, expected);
    }

    #[test]
    fn test_no_recommendations_for_unknown_level() {
        let report = build_report(&result("Elevated", None), &subject(), DiseaseType::Stroke, at());
        assert!(!report
            .blocks
            .iter()
            .any(|b| matches!(b, ReportBlock::Heading(_) | ReportBlock::Bullet(_))));
        assert!(!report.plain_lines().iter().any(|l| l.starts_with("Clinical advice")));
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("alpha beta gamma delta", 11);
        assert_eq!(lines, vec!["alpha beta", "gamma delta"]);
        assert_eq!(wrap_text("", 10), vec![String::new()]);
        assert_eq!(wrap_text("unbreakableword", 4), vec!["unbr", "eaka", "blew", "ord"]);
        assert_eq!(wrap_text("see abcdefgh", 5), vec!["see", "abcde", "fgh"]);
        assert!(wrap_text(DISCLAIMER, 40).iter().all(|l| l.chars().count() <= 40));
    }

    #[test]
    fn test_long_tokens_wrap_without_loss() {
        let url = format!("https://example.org/{}", "a".repeat(200));
        let name = "Ø".repeat(150);
        let report = build_report(
            &result("High", Some(&format!("see {url}"))),
            &ReportSubject::new(name.clone(), Some("12".to_string())),
            DiseaseType::Heart,
            at(),
        );
        let lines = report.plain_lines();

        let widest = lines.iter().map(|l| l.chars().count()).max().unwrap_or(0);
        assert!(widest <= WRAP_COLUMNS + 10, "widest line {widest}");

        let joined = lines.concat();
        assert!(joined.contains(&"a".repeat(WRAP_COLUMNS / 2)));
        assert_eq!(joined.matches('Ø').count(), 150);
    }

    struct EchoWriter;

    impl ReportWriter for EchoWriter {
        fn extension(&self) -> &'static str {
            "txt"
        }

        fn render(&self, report: &Report) -> Result<Vec<u8>, ReportError> {
            Ok(report.plain_lines().join("\n").into_bytes())
        }
    }

    #[test]
    fn test_generate_report() {
        let (name, bytes) = generate_report(
            &EchoWriter,
            &result("Low", None),
            &subject(),
            DiseaseType::Hypertension,
            at(),
        )
        .expect("Should render");
        assert_eq!(name, "Report_hypertension_2026-05-02.txt");
        assert!(String::from_utf8(bytes).expect("utf8").starts_with(REPORT_TITLE));
    }
}
