//! Login screen.

use ratatui::{
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame,
};

use super::{render_footer, render_header, render_input, Notice, TextInput};
use crate::tui::styles::MedicalTheme;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Email,
    Password,
}

/// Login form state
pub struct LoginFormState {
    pub email: TextInput,
    pub password: TextInput,
    pub focus: LoginField,
    pub submitting: bool,
    pub notice: Option<Notice>,
}

impl Default for LoginFormState {
    fn default() -> Self {
        Self {
            email: TextInput::default(),
            password: TextInput::masked(),
            focus: LoginField::Email,
            submitting: false,
            notice: None,
        }
    }
}

impl LoginFormState {
    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            LoginField::Email => LoginField::Password,
            LoginField::Password => LoginField::Email,
        };
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        match self.focus {
            LoginField::Email => &mut self.email,
            LoginField::Password => &mut self.password,
        }
    }

    /// Wipe the password after an attempt.
    pub fn clear_sensitive(&mut self) {
        self.password.clear();
    }
}

pub fn render_login(f: &mut Frame, area: Rect, state: &LoginFormState, api_url: &str) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer
        ])
        .split(area);

    render_header(f, chunks[0], "MedPredict", "Sign in");

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage(25),
            Constraint::Percentage(50),
            Constraint::Percentage(25),
        ])
        .split(chunks[1]);

    let form = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(2),
            Constraint::Length(3),
            Constraint::Length(3),
            Constraint::Length(2),
            Constraint::Min(0),
        ])
        .margin(1)
        .split(columns[1]);

    let intro = Paragraph::new(Line::from(vec![
        Span::styled("Server: ", MedicalTheme::text_secondary()),
        Span::styled(api_url.to_string(), MedicalTheme::text_muted()),
    ]))
    .alignment(Alignment::Center);
    f.render_widget(intro, form[0]);

    render_input(
        f,
        form[1],
        "Email or username",
        &state.email,
        "name@example.org",
        state.focus == LoginField::Email,
    );
    render_input(
        f,
        form[2],
        "Password",
        &state.password,
        "",
        state.focus == LoginField::Password,
    );

    if state.submitting {
        let waiting = Paragraph::new(Span::styled("Signing in...", MedicalTheme::text_muted()))
            .alignment(Alignment::Center);
        f.render_widget(waiting, form[3]);
    }

    let block = Block::default()
        .borders(Borders::ALL)
        .border_style(MedicalTheme::border());
    f.render_widget(block, columns[1]);

    render_footer(
        f,
        chunks[2],
        &[
            ("Tab", "Switch field"),
            ("Enter", "Sign in"),
            ("F2", "Create patient account"),
            ("F3", "Create provider account"),
        ],
        state.notice.as_ref(),
    );
}
