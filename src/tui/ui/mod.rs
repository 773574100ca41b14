//! UI module: View components for the TUI.

pub mod analytics;
pub mod dashboard;
pub mod history;
pub mod login;
pub mod predict;
pub mod register;

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use zeroize::Zeroize;

use crate::tui::styles::MedicalTheme;

pub fn render_disclaimer(f: &mut Frame, area: Rect) {
    let text = vec![
        Line::from(vec![Span::styled(
            "DISCLAIMER: Risk estimates are indicative and do not replace professional medical evaluation.",
            MedicalTheme::text_muted(),
        )]),
        Line::from(vec![Span::styled(
            "[Ctrl+Q] Quit",
            MedicalTheme::text_muted(),
        )]),
    ];

    let block = Block::default()
        .borders(Borders::TOP)
        .border_style(MedicalTheme::border());

    let p = Paragraph::new(text).block(block).wrap(Wrap { trim: true });

    f.render_widget(p, area);
}

/// Title bar shared by every screen.
pub fn render_header(f: &mut Frame, area: Rect, title: &str, subtitle: &str) {
    let header = Paragraph::new(Line::from(vec![
        Span::styled(" ", MedicalTheme::text()),
        Span::styled(title.to_string(), MedicalTheme::title()),
        Span::styled(format!(" │ {subtitle}"), MedicalTheme::text_secondary()),
    ]))
    .block(
        Block::default()
            .borders(Borders::BOTTOM)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(header, area);
}

/// Key hints, replaced by the notice when there is one.
pub fn render_footer(f: &mut Frame, area: Rect, hints: &[(&str, &str)], notice: Option<&Notice>) {
    let content = match notice {
        Some(notice) => Line::from(vec![
            Span::styled(notice.kind.marker(), notice.kind.style()),
            Span::styled(notice.text.clone(), notice.kind.style()),
        ]),
        None => Line::from(
            hints
                .iter()
                .flat_map(|(key, desc)| {
                    [
                        Span::styled(format!("[{key}] "), MedicalTheme::key_hint()),
                        Span::styled(format!("{desc} "), MedicalTheme::key_desc()),
                    ]
                })
                .collect::<Vec<_>>(),
        ),
    };

    let footer = Paragraph::new(content).block(
        Block::default()
            .borders(Borders::TOP)
            .border_style(MedicalTheme::border()),
    );

    f.render_widget(footer, area);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Info,
    Success,
    Error,
}

impl NoticeKind {
    fn marker(self) -> &'static str {
        match self {
            Self::Info => "i ",
            Self::Success => "OK ",
            Self::Error => "! ",
        }
    }

    fn style(self) -> Style {
        match self {
            Self::Info => MedicalTheme::info(),
            Self::Success => MedicalTheme::success(),
            Self::Error => MedicalTheme::danger(),
        }
    }
}

/// One-line status message shown in a screen's footer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            text: text.into(),
        }
    }

    pub fn success(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Success,
            text: text.into(),
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            text: text.into(),
        }
    }
}

/// Single-line text input. Masked inputs are wiped from memory on clear.
#[derive(Debug, Clone, Default)]
pub struct TextInput {
    pub value: String,
    pub masked: bool,
}

impl TextInput {
    #[must_use]
    pub fn masked() -> Self {
        Self {
            value: String::new(),
            masked: true,
        }
    }

    pub fn push(&mut self, c: char) {
        if !c.is_control() {
            self.value.push(c);
        }
    }

    pub fn pop(&mut self) {
        self.value.pop();
    }

    pub fn clear(&mut self) {
        self.value.zeroize();
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.value.trim().is_empty()
    }

    fn display(&self) -> String {
        if self.masked {
            "•".repeat(self.value.chars().count())
        } else {
            self.value.clone()
        }
    }
}

impl Drop for TextInput {
    fn drop(&mut self) {
        if self.masked {
            self.value.zeroize();
        }
    }
}

/// Bordered input box with a label, a placeholder and a cursor when focused.
pub fn render_input(
    f: &mut Frame,
    area: Rect,
    label: &str,
    input: &TextInput,
    placeholder: &str,
    focused: bool,
) {
    let (border_style, title_style) = if focused {
        (MedicalTheme::border_focused(), MedicalTheme::focused())
    } else {
        (MedicalTheme::border(), MedicalTheme::text_secondary())
    };

    let block = Block::default()
        .title(Span::styled(format!(" {label} "), title_style))
        .borders(Borders::ALL)
        .border_style(border_style);

    let value = if input.value.is_empty() {
        Span::styled(placeholder.to_string(), MedicalTheme::text_muted())
    } else {
        Span::styled(input.display(), MedicalTheme::text())
    };

    let content = Paragraph::new(Line::from(vec![
        Span::raw(" "),
        value,
        if focused {
            Span::styled("▌", MedicalTheme::cursor())
        } else {
            Span::raw("")
        },
    ]))
    .block(block);

    f.render_widget(content, area);
}
