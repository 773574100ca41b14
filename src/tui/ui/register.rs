//! Account registration form.

use ratatui::{
    layout::{Constraint, Direction, Layout, Rect},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use super::{render_footer, render_header, render_input, Notice, TextInput};
use crate::application::FieldError;
use crate::domain::{RegistrationForm, Role};
use crate::tui::styles::MedicalTheme;

/// Form field definition
pub struct RegisterField {
    /// Key matching `FieldError::field`
    pub key: &'static str,
    pub label: &'static str,
    pub hint: &'static str,
    pub input: TextInput,
}

impl RegisterField {
    fn new(key: &'static str, label: &'static str, hint: &'static str) -> Self {
        Self {
            key,
            label,
            hint,
            input: TextInput::default(),
        }
    }

    fn secret(key: &'static str, label: &'static str) -> Self {
        Self {
            key,
            label,
            hint: "",
            input: TextInput::masked(),
        }
    }
}

/// Registration form state
pub struct RegisterFormState {
    pub role: Role,
    pub fields: Vec<RegisterField>,
    pub selected_field: usize,
    pub field_errors: Vec<FieldError>,
    pub submitting: bool,
    pub notice: Option<Notice>,
}

impl RegisterFormState {
    #[must_use]
    pub fn new(role: Role) -> Self {
        let mut fields = vec![
            RegisterField::new("full_name", "Full name", "Jane Doe"),
            RegisterField::new("email", "Email", "name@example.org"),
            RegisterField::new("username", "Username", "optional, derived from email"),
            RegisterField::new("phone", "Phone", "optional"),
        ];
        if role == Role::Provider {
            fields.push(RegisterField::new("specialization", "Specialization", "Cardiology"));
            fields.push(RegisterField::new("license_number", "License number", "required"));
        } else {
            fields.push(RegisterField::new("date_of_birth", "Date of birth", "YYYY-MM-DD, optional"));
        }
        fields.push(RegisterField::secret("password", "Password"));
        fields.push(RegisterField::secret("confirm_password", "Confirm password"));

        Self {
            role,
            fields,
            selected_field: 0,
            field_errors: Vec::new(),
            submitting: false,
            notice: None,
        }
    }

    pub fn next_field(&mut self) {
        self.selected_field = (self.selected_field + 1) % self.fields.len();
    }

    pub fn prev_field(&mut self) {
        if self.selected_field == 0 {
            self.selected_field = self.fields.len() - 1;
        } else {
            self.selected_field -= 1;
        }
    }

    pub fn focused_mut(&mut self) -> &mut TextInput {
        &mut self.fields[self.selected_field].input
    }

    fn value(&self, key: &str) -> String {
        self.fields
            .iter()
            .find(|field| field.key == key)
            .map(|field| field.input.value.clone())
            .unwrap_or_default()
    }

    /// Collect the typed values.
    #[must_use]
    pub fn to_form(&self) -> RegistrationForm {
        let username = self.value("username");
        let date_of_birth = self.value("date_of_birth");
        RegistrationForm {
            username: (!username.trim().is_empty()).then_some(username),
            email: self.value("email"),
            password: self.value("password"),
            confirm_password: self.value("confirm_password"),
            full_name: self.value("full_name"),
            phone: self.value("phone"),
            date_of_birth: (!date_of_birth.trim().is_empty()).then_some(date_of_birth),
            specialization: self.value("specialization"),
            license_number: self.value("license_number"),
        }
    }

    fn error_for(&self, key: &str) -> Option<&'static str> {
        self.field_errors
            .iter()
            .find(|e| e.field == key)
            .map(|e| e.message)
    }
}

pub fn render_register(f: &mut Frame, area: Rect, state: &RegisterFormState) {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3), // Header
            Constraint::Min(0),    // Form
            Constraint::Length(3), // Footer
        ])
        .split(area);

    let subtitle = match state.role {
        Role::Provider => "New provider account",
        _ => "New patient account",
    };
    render_header(f, chunks[0], "Sign up", subtitle);

    let columns = Layout::default()
        .direction(Direction::Horizontal)
        .constraints([Constraint::Percentage(50), Constraint::Percentage(50)])
        .margin(1)
        .split(chunks[1]);

    let mid = state.fields.len().div_ceil(2);
    render_column(f, columns[0], state, 0, mid);
    render_column(f, columns[1], state, mid, state.fields.len());

    let notice = if state.submitting {
        Some(Notice::info("Creating account..."))
    } else {
        state.notice.clone()
    };
    render_footer(
        f,
        chunks[2],
        &[("↑↓", "Navigate"), ("Enter", "Create account"), ("Esc", "Back to sign in")],
        notice.as_ref(),
    );
}

fn render_column(f: &mut Frame, area: Rect, state: &RegisterFormState, start: usize, end: usize) {
    let constraints: Vec<Constraint> = (start..end)
        .map(|_| Constraint::Length(4))
        .chain(std::iter::once(Constraint::Min(0)))
        .collect();

    let rows = Layout::default()
        .direction(Direction::Vertical)
        .constraints(constraints)
        .split(area);

    for (row, index) in (start..end).enumerate() {
        let field = &state.fields[index];
        let parts = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Length(1)])
            .split(rows[row]);

        render_input(
            f,
            parts[0],
            field.label,
            &field.input,
            field.hint,
            index == state.selected_field,
        );

        if let Some(message) = state.error_for(field.key) {
            let line = Paragraph::new(Line::from(Span::styled(
                format!("  {message}"),
                MedicalTheme::danger(),
            )));
            f.render_widget(line, parts[1]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn type_into(state: &mut RegisterFormState, key: &str, text: &str) {
        let index = state
            .fields
            .iter()
            .position(|field| field.key == key)
            .expect("field exists");
        state.selected_field = index;
        for c in text.chars() {
            state.focused_mut().push(c);
        }
    }

    #[test]
    fn test_role_specific_fields() {
        let patient = RegisterFormState::new(Role::Patient);
        assert!(patient.fields.iter().any(|f| f.key == "date_of_birth"));
        assert!(!patient.fields.iter().any(|f| f.key == "license_number"));

        let provider = RegisterFormState::new(Role::Provider);
        assert!(provider.fields.iter().any(|f| f.key == "license_number"));
    }

    #[test]
    fn test_blank_optionals_become_none() {
        let mut state = RegisterFormState::new(Role::Patient);
        type_into(&mut state, "email", "kim@example.org");
        type_into(&mut state, "username", "   ");

        let form = state.to_form();
        assert_eq!(form.email, "kim@example.org");
        assert_eq!(form.username, None);
        assert_eq!(form.date_of_birth, None);
    }
}
