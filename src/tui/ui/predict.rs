//! Prediction form and result view.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::Modifier,
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph, Wrap},
    Frame,
};

use super::{render_footer, render_header, render_input, Notice, TextInput};
use crate::application::{PredictionWorkflow, WorkflowError, WorkflowStatus};
use crate::domain::recommendations::recommendations;
use crate::domain::PredictionResult;
use crate::tui::styles::MedicalTheme;

/// Prediction screen state. The workflow owns the parsed values; the inputs
/// keep what was typed so partial numbers like `-` can be edited.
pub struct PredictFormState {
    pub workflow: PredictionWorkflow,
    pub patient_code: TextInput,
    pub inputs: Vec<TextInput>,
    /// Per feature: the typed text does not parse
    pub invalid: Vec<bool>,
    /// Focus index; for providers 0 is the patient code
    pub selected: usize,
    pub notice: Option<Notice>,
}

impl PredictFormState {
    #[must_use]
    pub fn new(workflow: PredictionWorkflow) -> Self {
        let count = workflow.schema().len();
        Self {
            workflow,
            patient_code: TextInput::default(),
            inputs: (0..count).map(|_| TextInput::default()).collect(),
            invalid: vec![false; count],
            selected: 0,
            notice: None,
        }
    }

    fn offset(&self) -> usize {
        usize::from(self.workflow.requires_patient())
    }

    fn focus_count(&self) -> usize {
        self.inputs.len() + self.offset()
    }

    #[must_use]
    pub fn on_patient_code(&self) -> bool {
        self.workflow.requires_patient() && self.selected == 0
    }

    /// Index of the focused feature, if a feature is focused.
    fn feature_index(&self) -> Option<usize> {
        self.selected.checked_sub(self.offset())
    }

    pub fn next_field(&mut self) {
        self.selected = (self.selected + 1) % self.focus_count();
    }

    pub fn prev_field(&mut self) {
        if self.selected == 0 {
            self.selected = self.focus_count() - 1;
        } else {
            self.selected -= 1;
        }
    }

    /// Prefill and start verifying a patient code picked elsewhere.
    pub fn preselect_patient(&mut self, code: &str) {
        self.patient_code = TextInput::default();
        for c in code.chars() {
            self.patient_code.push(c);
        }
        if let Err(e) = self.workflow.verify_patient(code) {
            self.notice = Some(Notice::error(e.to_string()));
        }
    }

    pub fn input_char(&mut self, c: char) {
        if self.on_patient_code() {
            self.patient_code.push(c);
            let code = self.patient_code.value.clone();
            self.workflow.set_patient_code(&code);
            return;
        }
        if c.is_ascii_digit() || matches!(c, '.' | '-' | 'e' | 'E') {
            if let Some(index) = self.feature_index() {
                self.inputs[index].push(c);
                self.sync_feature(index);
            }
        }
    }

    pub fn delete_char(&mut self) {
        if self.on_patient_code() {
            self.patient_code.pop();
            let code = self.patient_code.value.clone();
            self.workflow.set_patient_code(&code);
            return;
        }
        if let Some(index) = self.feature_index() {
            self.inputs[index].pop();
            self.sync_feature(index);
        }
    }

    /// The typed value parses but lies outside the field's usual bounds. Advisory only.
    #[must_use]
    pub fn out_of_range(&self, index: usize) -> bool {
        let Some(field) = self.workflow.schema().get(index) else {
            return false;
        };
        !self.invalid[index]
            && !self.inputs[index].is_blank()
            && self
                .workflow
                .features()
                .get(field.name)
                .is_some_and(|value| !field.in_range(value))
    }

    fn sync_feature(&mut self, index: usize) {
        let name = self.workflow.schema()[index].name;
        let raw = self.inputs[index].value.clone();
        self.invalid[index] = matches!(
            self.workflow.update_feature(name, &raw),
            Err(WorkflowError::InvalidNumber { .. })
        );
        self.notice = None;
    }

    /// Enter on the patient code verifies; anywhere else submits.
    pub fn confirm(&mut self) {
        if self.on_patient_code() {
            let code = self.patient_code.value.clone();
            self.notice = self
                .workflow
                .verify_patient(&code)
                .err()
                .map(|e| Notice::error(e.to_string()));
            return;
        }

        if let Some(index) = self.invalid.iter().position(|bad| *bad) {
            let field = &self.workflow.schema()[index];
            self.notice = Some(Notice::error(format!(
                "'{}' is not a valid number for {}",
                self.inputs[index].value, field.label
            )));
            return;
        }

        self.notice = match self.workflow.submit() {
            Ok(_) => None,
            Err(e) => Some(Notice::error(e.to_string())),
        };
    }
}

/// Render the prediction screen
pub fn render_predict(f: &mut Frame, area: Rect, state: &PredictFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form + result
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(
        f,
        chunks[0],
        state.workflow.disease().title(),
        "Enter the clinical features and press Enter",
    );

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(55), Constraint::Percentage(45)])
        .split(chunks[1]);

    render_form(f, columns[0], state);
    render_outcome(f, columns[1], state);

    let hints: &[(&str, &str)] = match state.workflow.status() {
        WorkflowStatus::Succeeded => &[
            ("Ctrl+R", "Save PDF report"),
            ("Enter", "Predict again"),
            ("Esc", "Back"),
        ],
        _ if state.on_patient_code() => &[("Enter", "Verify patient"), ("↑↓", "Navigate"), ("Esc", "Back")],
        _ => &[("↑↓", "Navigate"), ("Enter", "Predict"), ("Esc", "Back")],
    };
    render_footer(f, chunks[2], hints, state.notice.as_ref());
}

fn render_form(f: &mut Frame, area: Rect, state: &PredictFormState) {
    let offset = state.offset();
    let mut constraints = Vec::new();
    if offset == 1 {
        constraints.push(Constraint::Length(4));
    }
    constraints.push(Constraint::Min(0));

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    if offset == 1 {
        render_patient_lookup(f, rows[0], state);
    }

    let fields_area = rows[offset];
    let schema = state.workflow.schema();
    let half = schema.len().div_ceil(2);
    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(fields_area);

    for (column, range) in [(0, 0..half), (1, half..schema.len())] {
        let constraints: Vec<Constraint> = range
            .clone()
            .map(|_| Constraint::Length(3))
            .chain(std::iter::once(Constraint::Min(0)))
            .collect();
        let cells = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(columns[column]);

        for (cell, index) in range.enumerate() {
            let field = &schema[index];
            let label = if state.invalid[index] {
                format!("{} (invalid)", field.label)
            } else if state.out_of_range(index) {
                format!("{} (unusual, expected {})", field.label, field.hint())
            } else {
                field.label.to_string()
            };
            render_input(
                f,
                cells[cell],
                &label,
                &state.inputs[index],
                &format!("0  ({})", field.hint()),
                state.selected == index + offset,
            );
        }
    }
}

fn render_patient_lookup(f: &mut Frame, area: Rect, state: &PredictFormState) {
    let parts = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(3), Constraint::Length(1)])
        .split(area);

    render_input(
        f,
        parts[0],
        "Patient ID",
        &state.patient_code,
        "patient code, then Enter to verify",
        state.on_patient_code(),
    );

    let workflow = &state.workflow;
    let status = if workflow.is_verifying() {
        Span::styled("  Verifying...", MedicalTheme::text_muted())
    } else if let Some(patient) = workflow.patient() {
        Span::styled(format!("  Verified: {}", patient.full_name), MedicalTheme::success())
    } else if let Some(err) = workflow.verify_error() {
        Span::styled(format!("  {err}"), MedicalTheme::danger())
    } else {
        Span::styled("  Not verified", MedicalTheme::text_muted())
    };
    f.render_widget(Paragraph::new(Line::from(status)), parts[1]);
}

fn render_outcome(f: &mut Frame, area: Rect, state: &PredictFormState) {
    let workflow = &state.workflow;
    match workflow.status() {
        WorkflowStatus::Submitting => render_message(f, area, "Running prediction...", false),
        WorkflowStatus::Failed => {
            render_message(f, area, workflow.error().unwrap_or_default(), true);
        }
        WorkflowStatus::Succeeded => {
            if let Some(result) = workflow.result() {
                render_result(f, area, state, result);
            }
        }
        WorkflowStatus::Idle | WorkflowStatus::AwaitingVerification => {
            render_message(f, area, "Verify a patient before predicting.", false);
        }
        WorkflowStatus::Ready => {
            render_message(f, area, "Empty fields are sent as 0.", false);
        }
    }
}

fn render_message(f: &mut Frame, area: Rect, message: &str, is_error: bool) {
    let (title, style, border) = if is_error {
        ("! Prediction Failed", MedicalTheme::danger(), MedicalTheme::danger())
    } else {
        ("Result", MedicalTheme::text_secondary(), MedicalTheme::border())
    };

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(title, style)),
        Line::from(""),
        Line::from(Span::styled(message.to_string(), MedicalTheme::text())),
    ])
    .alignment(Alignment::Center)
    .wrap(Wrap { trim: true })
    .block(Block::default().borders(Borders::ALL).border_style(border));

    f.render_widget(content, area);
}

fn render_result(f: &mut Frame, area: Rect, state: &PredictFormState, result: &PredictionResult) {
    let block = Block::default()
        .title(Span::styled(" Prediction Result ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border_focused());

    let inner = block.inner(area);
    f.render_widget(block, area);

    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Risk badge
            Constraint::Length(3), // Probability
            Constraint::Min(0),    // Advice + recommendations
        ])
        .margin(1)
        .split(inner);

    let style = MedicalTheme::render_risk(result.risk.level, result.risk.color);

    let description = result
        .risk
        .level
        .map_or("", |level| level.description());
    let badge = Paragraph::new(vec![
        Line::from(Span::styled(format!(" {} ", result.risk.label), style.badge)),
        Line::from(Span::styled(description, MedicalTheme::text_secondary())),
    ])
    .alignment(Alignment::Center);
    f.render_widget(badge, chunks[0]);

    let gauge = Gauge::default()
        .block(
            Block::default()
                .title(Span::styled(" Risk Probability ", MedicalTheme::text_secondary()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .gauge_style(style.percentage)
        .ratio(result.probability.clamp(0.0, 1.0))
        .label(Span::styled(
            result.percentage(),
            style.percentage.add_modifier(Modifier::BOLD),
        ));
    f.render_widget(gauge, chunks[1]);

    let mut lines = Vec::new();
    if let Some(advice) = &result.risk_advice {
        lines.push(Line::from(vec![
            Span::styled("Clinical advice: ", MedicalTheme::text_secondary()),
            Span::styled(advice.clone(), MedicalTheme::text()),
        ]));
        lines.push(Line::from(""));
    }

    let bullets = result
        .risk
        .level
        .and_then(|level| recommendations(state.workflow.disease(), level));
    if let Some(bullets) = bullets {
        lines.push(Line::from(Span::styled(
            "Preventive Recommendations",
            MedicalTheme::subtitle(),
        )));
        lines.extend(bullets.iter().map(|bullet| {
            Line::from(vec![
                Span::styled("• ", MedicalTheme::focused()),
                Span::styled(*bullet, MedicalTheme::text()),
            ])
        }));
    }

    f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: true }), chunks[2]);
}
