//! Prediction history table with disease filter, paging and CSV export.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Cell, Paragraph, Row, Table},
    Frame,
};

use super::{render_footer, render_header, Notice};
use crate::application::history::{filter, page};
use crate::application::HistoryQuery;
use crate::domain::{format_percentage, DiseaseType, PredictionRecord};
use crate::tui::styles::MedicalTheme;

/// History screen state
#[derive(Default)]
pub struct HistoryState {
    /// Whose history this is; `None` for the caller's own
    pub patient_id: Option<String>,
    pub records: Vec<PredictionRecord>,
    pub query: HistoryQuery,
    pub loading: bool,
    pub error: Option<String>,
    pub notice: Option<Notice>,
}

impl HistoryState {
    #[must_use]
    pub fn for_patient(patient_id: Option<String>) -> Self {
        Self {
            patient_id,
            loading: true,
            ..Self::default()
        }
    }

    /// Records matching the current disease filter.
    #[must_use]
    pub fn filtered(&self) -> Vec<PredictionRecord> {
        filter(&self.records, self.query.disease)
    }

    /// Cycle All → Heart → Diabetes → Hypertension → Stroke → All. Resets paging.
    pub fn cycle_filter(&mut self) {
        let next = match self.query.disease {
            None => DiseaseType::ALL.first().copied(),
            Some(current) => DiseaseType::ALL
                .iter()
                .position(|d| *d == current)
                .and_then(|i| DiseaseType::ALL.get(i + 1).copied()),
        };
        self.query = HistoryQuery {
            disease: next,
            page: 0,
        };
    }

    pub fn next_page(&mut self) {
        let rows = self.filtered();
        let current = page(&rows, self.query);
        if current.page + 1 < current.total_pages {
            self.query.page = current.page + 1;
        }
    }

    pub fn prev_page(&mut self) {
        self.query.page = self.query.page.saturating_sub(1);
    }
}

pub fn render_history(f: &mut Frame, area: Rect, state: &HistoryState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Length(1), // Filter line
            Constraint::Min(0),    // Table
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let subtitle = match &state.patient_id {
        Some(id) => format!("Patient {id}"),
        None => "My predictions".to_string(),
    };
    render_header(f, chunks[0], "Prediction History", &subtitle);

    let rows = state.filtered();
    let current = page(&rows, state.query);

    let filter_label = state.query.disease.map_or("All", |d| d.short_name());
    let filter_line = Paragraph::new(Line::from(vec![
        Span::styled(" Filter: ", MedicalTheme::text_secondary()),
        Span::styled(filter_label, MedicalTheme::focused()),
        Span::styled(
            format!(
                "   Page {} of {}   ({} records)",
                current.page + 1,
                current.total_pages,
                current.total_rows
            ),
            MedicalTheme::text_muted(),
        ),
    ]));
    f.render_widget(filter_line, chunks[1]);

    if state.loading || state.error.is_some() || current.rows.is_empty() {
        let (message, style) = match (&state.error, state.loading) {
            (_, true) => ("Loading history...".to_string(), MedicalTheme::text_muted()),
            (Some(err), false) => (err.clone(), MedicalTheme::danger()),
            (None, false) => ("No predictions found.".to_string(), MedicalTheme::text_muted()),
        };
        let content = Paragraph::new(vec![Line::from(""), Line::from(Span::styled(message, style))])
            .alignment(Alignment::Center)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(MedicalTheme::border()),
            );
        f.render_widget(content, chunks[2]);
    } else {
        render_table(f, chunks[2], current.rows);
    }

    render_footer(
        f,
        chunks[3],
        &[
            ("←→", "Page"),
            ("F", "Filter"),
            ("E", "Export CSV"),
            ("R", "Reload"),
            ("Esc", "Back"),
        ],
        state.notice.as_ref(),
    );
}

fn render_table(f: &mut Frame, area: Rect, rows: &[PredictionRecord]) {
    let header = Row::new(["Date", "Disease", "Probability", "Risk Level", "Prediction"])
        .style(MedicalTheme::header());

    let body = rows.iter().map(|record| {
        let (outcome, outcome_style) = if record.is_positive() {
            ("Positive", MedicalTheme::danger())
        } else {
            ("Negative", MedicalTheme::success())
        };
        Row::new(vec![
            Cell::from(record.created_at.format("%Y-%m-%d %H:%M").to_string()),
            Cell::from(record.disease_label()),
            Cell::from(format_percentage(record.probability)),
            Cell::from(Span::styled(
                record.risk_level.clone(),
                MedicalTheme::risk_level(record.risk_level()),
            )),
            Cell::from(Span::styled(outcome, outcome_style)),
        ])
        .style(MedicalTheme::text())
    });

    let table = Table::new(
        body,
        [
            Constraint::Length(18),
            Constraint::Length(14),
            Constraint::Length(12),
            Constraint::Length(12),
            Constraint::Min(10),
        ],
    )
    .header(header)
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(table, area);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::testing::record;

    #[test]
    fn test_filter_cycles_back_to_all() {
        let mut state = HistoryState::default();
        let mut seen = Vec::new();
        for _ in 0..5 {
            state.cycle_filter();
            seen.push(state.query.disease);
        }
        assert_eq!(seen.first(), Some(&Some(DiseaseType::Heart)));
        assert_eq!(seen.last(), Some(&None));
    }

    #[test]
    fn test_paging_stops_at_last_page() {
        let mut state = HistoryState {
            records: (0..12).map(|i| record(i, "heart", 0.4, "Moderate", 1)).collect(),
            ..HistoryState::default()
        };
        state.next_page();
        state.next_page();
        assert_eq!(state.query.page, 1);

        state.cycle_filter();
        assert_eq!(state.query.page, 0);
    }
}
