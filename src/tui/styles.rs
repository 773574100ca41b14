//! Medical-themed color palette and styles.
//!
//! Colors chosen for:
//! - Professional healthcare appearance
//! - High contrast for accessibility

use ratatui::style::{Color, Modifier, Style};

use crate::domain::{RiskColor, RiskLevel, RiskTone};

/// Styles for one rendered risk: the level badge and the probability figure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RiskStyle {
    pub badge: Style,
    pub percentage: Style,
}

/// Medical theme color palette.
pub struct MedicalTheme;

impl MedicalTheme {
    // === Primary Colors ===

    /// Deep teal - Primary color (trust, medical)
    pub const PRIMARY: Color = Color::Rgb(13, 148, 136); // #0D9488

    /// Lighter teal for highlights
    pub const PRIMARY_LIGHT: Color = Color::Rgb(45, 212, 191); // #2DD4BF

    /// Darker teal for accents
    pub const PRIMARY_DARK: Color = Color::Rgb(15, 118, 110); // #0F766E

    // === Secondary Colors ===

    /// Light slate for borders
    pub const SECONDARY_LIGHT: Color = Color::Rgb(148, 163, 184); // #94A3B8

    // === Semantic Colors ===

    /// Emerald - Low risk
    pub const SUCCESS: Color = Color::Rgb(16, 185, 129); // #10B981

    /// Amber - Moderate risk
    pub const WARNING: Color = Color::Rgb(251, 191, 36); // #FBBF24

    /// Rose - High risk
    pub const DANGER: Color = Color::Rgb(244, 63, 94); // #F43F5E

    /// Dark red - Critical risk
    pub const SEVERE: Color = Color::Rgb(153, 27, 27); // #991B1B

    /// Blue - Info
    pub const INFO: Color = Color::Rgb(59, 130, 246); // #3B82F6

    // === Background Colors ===

    /// Near-black with blue tint
    pub const BG_DARK: Color = Color::Rgb(15, 23, 42); // #0F172A

    // === Text Colors ===

    /// Primary text (white)
    pub const TEXT_PRIMARY: Color = Color::Rgb(248, 250, 252); // #F8FAFC

    /// Secondary text (gray)
    pub const TEXT_SECONDARY: Color = Color::Rgb(148, 163, 184); // #94A3B8

    /// Muted text
    pub const TEXT_MUTED: Color = Color::Rgb(100, 116, 139); // #64748B

    // === Preset Styles ===

    /// Style for titles
    #[must_use]
    pub fn title() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for subtitles
    #[must_use]
    pub fn subtitle() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for normal text
    #[must_use]
    pub fn text() -> Style {
        Style::default().fg(Self::TEXT_PRIMARY)
    }

    /// Style for secondary text
    #[must_use]
    pub fn text_secondary() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Style for muted text
    #[must_use]
    pub fn text_muted() -> Style {
        Style::default().fg(Self::TEXT_MUTED)
    }

    #[must_use]
    pub fn success() -> Style {
        Style::default().fg(Self::SUCCESS)
    }

    #[must_use]
    pub fn warning() -> Style {
        Style::default().fg(Self::WARNING)
    }

    #[must_use]
    pub fn danger() -> Style {
        Style::default().fg(Self::DANGER)
    }

    #[must_use]
    pub fn info() -> Style {
        Style::default().fg(Self::INFO)
    }

    /// Style for selected items
    #[must_use]
    pub fn selected() -> Style {
        Style::default()
            .fg(Self::BG_DARK)
            .bg(Self::PRIMARY)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for focused elements
    #[must_use]
    pub fn focused() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for borders
    #[must_use]
    pub fn border() -> Style {
        Style::default().fg(Self::SECONDARY_LIGHT)
    }

    /// Style for focused borders
    #[must_use]
    pub fn border_focused() -> Style {
        Style::default().fg(Self::PRIMARY)
    }

    /// Style for the header bar
    #[must_use]
    pub fn header() -> Style {
        Style::default()
            .fg(Self::TEXT_PRIMARY)
            .bg(Self::PRIMARY_DARK)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for key hints
    #[must_use]
    pub fn key_hint() -> Style {
        Style::default()
            .fg(Self::PRIMARY_LIGHT)
            .add_modifier(Modifier::BOLD)
    }

    /// Style for key descriptions
    #[must_use]
    pub fn key_desc() -> Style {
        Style::default().fg(Self::TEXT_SECONDARY)
    }

    /// Text cursor at the end of the focused input
    #[must_use]
    pub fn cursor() -> Style {
        Style::default().fg(Self::PRIMARY_LIGHT)
    }

    /// Foreground color for a risk tone. `Neutral` has none.
    #[must_use]
    pub fn tone_color(tone: RiskTone) -> Option<Color> {
        match tone {
            RiskTone::Success => Some(Self::SUCCESS),
            RiskTone::Warning => Some(Self::WARNING),
            RiskTone::Danger => Some(Self::DANGER),
            RiskTone::Severe => Some(Self::SEVERE),
            RiskTone::Neutral => None,
        }
    }

    /// Styles for a returned risk. An explicit color wins over the level
    /// name; with neither known both styles are the default style.
    #[must_use]
    pub fn render_risk(level: Option<RiskLevel>, color: Option<RiskColor>) -> RiskStyle {
        match Self::tone_color(RiskTone::resolve(level, color)) {
            Some(fg) => RiskStyle {
                badge: Style::default()
                    .fg(Self::TEXT_PRIMARY)
                    .bg(fg)
                    .add_modifier(Modifier::BOLD),
                percentage: Style::default().fg(fg).add_modifier(Modifier::BOLD),
            },
            None => RiskStyle {
                badge: Style::default(),
                percentage: Style::default(),
            },
        }
    }

    /// Plain foreground style for a risk level in tables and counters.
    #[must_use]
    pub fn risk_level(level: Option<RiskLevel>) -> Style {
        Self::tone_color(RiskTone::resolve(level, None))
            .map_or_else(Self::text, |fg| Style::default().fg(fg))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_color_styles_badge() {
        let style = MedicalTheme::render_risk(Some(RiskLevel::High), Some(RiskColor::Red));
        assert_eq!(style.badge.bg, Some(MedicalTheme::DANGER));
        assert_eq!(style.percentage.fg, Some(MedicalTheme::DANGER));
    }

    #[test]
    fn test_color_wins_over_level() {
        let style = MedicalTheme::render_risk(Some(RiskLevel::High), Some(RiskColor::Green));
        assert_eq!(style.percentage.fg, Some(MedicalTheme::SUCCESS));
    }

    #[test]
    fn test_level_only_is_still_styled() {
        let style = MedicalTheme::render_risk(Some(RiskLevel::High), None);
        assert_ne!(style.badge, Style::default());
        assert_eq!(style.percentage.fg, Some(MedicalTheme::DANGER));

        let medium = MedicalTheme::render_risk(Some(RiskLevel::Medium), None);
        assert_eq!(medium.percentage.fg, Some(MedicalTheme::WARNING));
    }

    #[test]
    fn test_unknown_risk_is_unstyled() {
        let style = MedicalTheme::render_risk(None, None);
        assert_eq!(style.badge, Style::default());
        assert_eq!(style.percentage, Style::default());
    }
}
