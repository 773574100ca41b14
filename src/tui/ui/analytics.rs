//! Analytics view: system-wide statistics for administrators.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Bar, BarChart, BarGroup, Block, Borders, Gauge, Paragraph},
    Frame,
};

use super::{render_footer, render_header};
use crate::application::AnalyticsView;
use crate::tui::styles::MedicalTheme;

/// Days shown in the daily predictions chart.
const DAILY_WINDOW: usize = 14;

/// Analytics state
#[derive(Default)]
pub struct AnalyticsState {
    pub view: Option<AnalyticsView>,
    pub loading: bool,
    pub error: Option<String>,
}

/// Render the analytics view
pub fn render_analytics(f: &mut Frame, area: Rect, state: &AnalyticsState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Content
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], "Analytics", "System-wide prediction statistics");

    match (&state.view, &state.error) {
        _ if state.loading => render_message(f, chunks[1], "Loading statistics...", false),
        (_, Some(err)) => render_message(f, chunks[1], err, true),
        (Some(view), None) => render_content(f, chunks[1], view),
        (None, None) => render_message(f, chunks[1], "No statistics available", false),
    }

    render_footer(f, chunks[2], &[("R", "Refresh"), ("Esc", "Back")], None);
}

fn render_message(f: &mut Frame, area: Rect, message: &str, is_error: bool) {
    let (style, border) = if is_error {
        (MedicalTheme::danger(), MedicalTheme::danger())
    } else {
        (MedicalTheme::text_muted(), MedicalTheme::border())
    };

    let content = Paragraph::new(vec![
        Line::from(""),
        Line::from(Span::styled(message.to_string(), style)),
    ])
    .alignment(Alignment::Center)
    .block(Block::default().borders(Borders::ALL).border_style(border));

    f.render_widget(content, area);
}

fn render_content(f: &mut Frame, area: Rect, view: &AnalyticsView) {
    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),      // Totals
            Constraint::Percentage(50), // Diseases + risk levels
            Constraint::Min(0),         // Daily + registrations
        ])
        .split(area);

    let totals = Paragraph::new(Line::from(vec![
        Span::styled(" Patients: ", MedicalTheme::text_secondary()),
        Span::styled(view.total_patients.to_string(), MedicalTheme::text()),
        Span::styled("   Providers: ", MedicalTheme::text_secondary()),
        Span::styled(view.total_providers.to_string(), MedicalTheme::text()),
        Span::styled("   Predictions: ", MedicalTheme::text_secondary()),
        Span::styled(view.total_predictions.to_string(), MedicalTheme::text()),
    ]))
    .block(
        Block::default()
            .borders(Borders::ALL)
            .border_style(MedicalTheme::border()),
    );
    f.render_widget(totals, rows[0]);

    let top = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .split(rows[1]);
    render_disease_breakdown(f, top[0], view);
    render_risk_bars(f, top[1], view);

    let bottom = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(60), Constraint::Percentage(40)])
        .split(rows[2]);
    render_daily(f, bottom[0], view);
    render_registrations(f, bottom[1], view);
}

fn render_disease_breakdown(f: &mut Frame, area: Rect, view: &AnalyticsView) {
    let block = Block::default()
        .title(Span::styled(" Predictions by Disease ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    let inner = block.inner(area);
    f.render_widget(block, area);

    let total: u64 = view.disease_slices.iter().map(|s| s.value).sum();
    let constraints: Vec<Constraint> = view
        .disease_slices
        .iter()
        .map(|_| Constraint::Length(2))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();
    let cells = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .margin(1)
        .split(inner);

    for (i, slice) in view.disease_slices.iter().enumerate() {
        let ratio = if total == 0 {
            0.0
        } else {
            slice.value as f64 / total as f64
        };
        let gauge = Gauge::default()
            .gauge_style(MedicalTheme::info())
            .ratio(ratio)
            .label(format!("{} ({})", slice.label, slice.value));
        f.render_widget(gauge, cells[i]);
    }
}

fn render_risk_bars(f: &mut Frame, area: Rect, view: &AnalyticsView) {
    let bars: Vec<Bar> = view
        .risk_bars
        .iter()
        .map(|(level, count)| {
            Bar::default()
                .value(*count)
                .label(Line::from(level.label()))
                .style(MedicalTheme::risk_level(Some(*level)))
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(Span::styled(" Risk Levels ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(9)
        .bar_gap(2)
        .value_style(MedicalTheme::title());

    f.render_widget(chart, area);
}

fn render_daily(f: &mut Frame, area: Rect, view: &AnalyticsView) {
    let start = view.daily.len().saturating_sub(DAILY_WINDOW);
    let bars: Vec<Bar> = view.daily[start..]
        .iter()
        .map(|(date, count)| {
            Bar::default()
                .value(*count)
                .label(Line::from(date.format("%m-%d").to_string()))
                .style(MedicalTheme::info())
        })
        .collect();

    let chart = BarChart::default()
        .block(
            Block::default()
                .title(Span::styled(" Daily Predictions ", MedicalTheme::subtitle()))
                .borders(Borders::ALL)
                .border_style(MedicalTheme::border()),
        )
        .data(BarGroup::default().bars(&bars))
        .bar_width(5)
        .bar_gap(1);

    f.render_widget(chart, area);
}

fn render_registrations(f: &mut Frame, area: Rect, view: &AnalyticsView) {
    let block = Block::default()
        .title(Span::styled(" Recent Registrations ", MedicalTheme::subtitle()))
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());

    let lines: Vec<Line> = if view.recent_registrations.is_empty() {
        vec![Line::from(Span::styled("None", MedicalTheme::text_muted()))]
    } else {
        view.recent_registrations
            .iter()
            .map(|r| {
                Line::from(vec![
                    Span::styled(format!("{:<10}", r.role), MedicalTheme::text_secondary()),
                    Span::styled(r.username.clone(), MedicalTheme::text()),
                ])
            })
            .collect()
    };

    f.render_widget(Paragraph::new(lines).block(block), area);
}
