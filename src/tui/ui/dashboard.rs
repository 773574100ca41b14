//! Dashboard view: the signed-in user's home screen.
//!
//! Patients see a summary of their own history. Providers look a patient up
//! by code first and then see that patient's card and summary. Admins get
//! the entry point to the analytics screen.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};

use super::{render_footer, render_header, render_input, Notice, TextInput};
use crate::application::PatientSummary;
use crate::domain::{format_percentage, DiseaseType, Identity, PatientDetails, RiskLevel, Role};
use crate::tui::styles::MedicalTheme;

/// Dashboard state for rendering.
#[derive(Default)]
pub struct DashboardState {
    pub summary: Option<PatientSummary>,
    pub loading_summary: bool,
    /// Provider patient lookup
    pub patient_code: TextInput,
    pub editing_code: bool,
    pub patient: Option<PatientDetails>,
    /// Code `patient` was looked up with
    pub patient_lookup_code: Option<String>,
    pub looking_up: bool,
    pub notice: Option<Notice>,
}

impl DashboardState {
    /// Code of the patient currently shown, if any.
    #[must_use]
    pub fn selected_patient_code(&self) -> Option<String> {
        self.patient.as_ref()?;
        self.patient_lookup_code.clone()
    }

    pub fn push_code(&mut self, c: char) {
        self.patient_code.push(c);
        self.forget_stale_patient();
    }

    pub fn pop_code(&mut self) {
        self.patient_code.pop();
        self.forget_stale_patient();
    }

    /// Show a finished lookup, unless the code was edited while it ran.
    pub fn apply_lookup(&mut self, code: String, patient: PatientDetails, summary: Option<PatientSummary>) -> bool {
        if self.patient_code.value.trim() != code {
            return false;
        }
        self.patient = Some(patient);
        self.patient_lookup_code = Some(code);
        self.summary = summary;
        true
    }

    /// The card and summary belong to the looked-up code; drop them once the typed code differs.
    fn forget_stale_patient(&mut self) {
        let typed = self.patient_code.value.trim();
        if self.patient_lookup_code.as_deref() == Some(typed) {
            return;
        }
        if self.patient.take().is_some() {
            tracing::debug!("Patient code edited; shown patient cleared");
        }
        self.patient_lookup_code = None;
        self.summary = None;
    }
}

/// Render the main dashboard view.
pub fn render_dashboard(f: &mut Frame, area: Rect, state: &DashboardState, identity: &Identity) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Main content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(
        f,
        chunks[0],
        "MedPredict",
        &format!("Welcome, {} ({})", identity.display_name(), identity.role),
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(35), // Quick actions
            Constraint::Percentage(65), // Role panel
        ])
        .split(chunks[1]);

    render_actions(f, columns[0], identity.role);
    match identity.role {
        Role::Patient => render_summary(f, columns[1], state, " My Health Summary "),
        Role::Provider => render_provider_panel(f, columns[1], state),
        Role::Admin => render_admin_panel(f, columns[1]),
    }

    let hints: &[(&str, &str)] = if state.editing_code {
        &[("Enter", "Look up"), ("Esc", "Stop editing")]
    } else {
        &[("1-4", "Predict"), ("H", "History"), ("L", "Log out")]
    };
    render_footer(f, chunks[2], hints, state.notice.as_ref());
}

fn render_actions(f: &mut Frame, area: Rect, role: Role) {
    let mut actions: Vec<Line> = DiseaseType::ALL
        .iter()
        .enumerate()
        .map(|(i, disease)| {
            Line::from(vec![
                Span::styled(format!("[{}] ", i + 1), MedicalTheme::key_hint()),
                Span::styled(disease.title(), MedicalTheme::key_desc()),
            ])
        })
        .collect();

    actions.push(Line::from(""));
    actions.push(Line::from(vec![
        Span::styled("[H] ", MedicalTheme::key_hint()),
        Span::styled("Prediction history", MedicalTheme::key_desc()),
    ]));
    if role == Role::Provider {
        actions.push(Line::from(vec![
            Span::styled("[P] ", MedicalTheme::key_hint()),
            Span::styled("Find patient", MedicalTheme::key_desc()),
        ]));
    }
    if role == Role::Admin {
        actions.push(Line::from(vec![
            Span::styled("[A] ", MedicalTheme::key_hint()),
            Span::styled("Analytics", MedicalTheme::key_desc()),
        ]));
    }
    actions.push(Line::from(vec![
        Span::styled("[L] ", MedicalTheme::key_hint()),
        Span::styled("Log out", MedicalTheme::key_desc()),
    ]));

    let block = Block::default()
        .title(Span::styled(" Quick Actions ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    f.render_widget(Paragraph::new(actions).block(block), area);
}

fn render_provider_panel(f: &mut Frame, area: Rect, state: &DashboardState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Lookup
            Constraint::Length(6), // Patient card
            Constraint::Min(0),    // Summary
        ])
        .split(area);

    render_input(
        f,
        chunks[0],
        "Patient ID",
        &state.patient_code,
        "press [P] and type a patient code",
        state.editing_code,
    );

    let card_block = Block::default()
        .title(Span::styled(" Patient ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let card = match (&state.patient, state.looking_up) {
        (_, true) => vec![Line::from(Span::styled("Looking up...", MedicalTheme::text_muted()))],
        (Some(patient), false) => vec![
            Line::from(vec![
                Span::styled(format!("({}) ", patient.initials()), MedicalTheme::focused()),
                Span::styled(patient.full_name.clone(), MedicalTheme::text()),
            ]),
            Line::from(vec![
                Span::styled("Email: ", MedicalTheme::text_secondary()),
                Span::styled(patient.email.clone(), MedicalTheme::text()),
            ]),
            Line::from(vec![
                Span::styled("Joined: ", MedicalTheme::text_secondary()),
                Span::styled(
                    patient
                        .date_joined
                        .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d").to_string()),
                    MedicalTheme::text(),
                ),
                Span::styled("  Predictions: ", MedicalTheme::text_secondary()),
                Span::styled(patient.total_predictions.to_string(), MedicalTheme::text()),
            ]),
        ],
        (None, false) => vec![Line::from(Span::styled(
            "No patient selected.",
            MedicalTheme::text_muted(),
        ))],
    };
    f.render_widget(Paragraph::new(card).block(card_block), chunks[1]);

    render_summary(f, chunks[2], state, " Patient Summary ");
}

fn render_summary(f: &mut Frame, area: Rect, state: &DashboardState, title: &str) {
    let block = Block::default()
        .title(Span::styled(title.to_string(), MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let lines = match (&state.summary, state.loading_summary) {
        (_, true) => vec![Line::from(Span::styled("Loading...", MedicalTheme::text_muted()))],
        (Some(summary), false) if summary.total > 0 => summary_lines(summary),
        _ => vec![Line::from(Span::styled(
            "No predictions yet. Press [1]-[4] to start.",
            MedicalTheme::text_muted(),
        ))],
    };

    f.render_widget(
        Paragraph::new(lines).block(block).wrap(Wrap { trim: true }),
        area,
    );
}

fn summary_lines(summary: &PatientSummary) -> Vec<Line<'static>> {
    let field = |label: &str, value: String| {
        Line::from(vec![
            Span::styled(format!("{label}: "), MedicalTheme::text_secondary()),
            Span::styled(value, MedicalTheme::text()),
        ])
    };

    let mut lines = vec![
        field("Total predictions", summary.total.to_string()),
        field(
            "Most predicted",
            summary.most_predicted.clone().unwrap_or_else(|| "-".to_string()),
        ),
        field(
            "Last prediction",
            summary
                .last_prediction
                .map_or_else(|| "-".to_string(), |d| d.format("%Y-%m-%d %H:%M").to_string()),
        ),
        Line::from(vec![
            Span::styled("Last risk: ", MedicalTheme::text_secondary()),
            Span::styled(
                summary.last_risk.clone().unwrap_or_else(|| "-".to_string()),
                MedicalTheme::risk_level(summary.last_risk.as_deref().and_then(RiskLevel::from_label)),
            ),
        ]),
        field(
            "Highest risk",
            summary.highest_risk.clone().unwrap_or_else(|| "-".to_string()),
        ),
        Line::from(""),
        Line::from(Span::styled("Latest by disease", MedicalTheme::subtitle())),
    ];

    lines.extend(summary.latest_by_disease.iter().map(|(disease, probability)| {
        let count = summary.counts_by_disease.get(disease).copied().unwrap_or(0);
        Line::from(vec![
            Span::styled(format!("  {disease:<14}"), MedicalTheme::text_secondary()),
            Span::styled(format!("{:>7}", format_percentage(*probability)), MedicalTheme::text()),
            Span::styled(format!("  ({count} total)"), MedicalTheme::text_muted()),
        ])
    }));

    lines
}

fn render_admin_panel(f: &mut Frame, area: Rect) {
    let block = Block::default()
        .title(Span::styled(" Administration ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let lines = vec![
        Line::from(Span::styled(
            "System-wide statistics are available on the analytics screen.",
            MedicalTheme::text_secondary(),
        )),
        Line::from(""),
        Line::from(vec![
            Span::styled("[A] ", MedicalTheme::key_hint()),
            Span::styled("Open analytics", MedicalTheme::key_desc()),
        ]),
    ];

    f.render_widget(Paragraph::new(lines).block(block), area);
}
