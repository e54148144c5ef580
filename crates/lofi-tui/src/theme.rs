//! Color palette and style constants for the lofi TUI.

use ratatui::style::{Color, Modifier, Style};

// ── Color palette ─────────────────────────────────────────────────────────────

pub const C_BG: Color = Color::Rgb(16, 14, 22); // night purple
pub const C_ACCENT: Color = Color::Rgb(255, 107, 157); // bass-layer pink
pub const C_PLAYING: Color = Color::Rgb(255, 235, 59); // pulse yellow
pub const C_CONNECTING: Color = Color::Rgb(196, 69, 105);
pub const C_MUTED: Color = Color::Rgb(84, 76, 100);
pub const C_SEPARATOR: Color = Color::Rgb(44, 36, 56);
pub const C_SECONDARY: Color = Color::Rgb(150, 132, 168);
pub const C_PRIMARY: Color = Color::Rgb(210, 210, 225);
pub const C_SELECTION_BG: Color = Color::Rgb(48, 28, 52);
pub const C_MENU_BORDER: Color = Color::Rgb(196, 69, 105);
pub const C_NUMBER_HINT: Color = Color::Rgb(104, 92, 124);
pub const C_TOAST_INFO: Color = Color::Rgb(210, 210, 225);
pub const C_TOAST_WARNING: Color = Color::Rgb(255, 235, 59);
pub const C_TOAST_ERROR: Color = Color::Rgb(255, 82, 110);

// ── Predefined styles ─────────────────────────────────────────────────────────

pub fn style_default() -> Style {
    Style::default().fg(C_PRIMARY)
}

pub fn style_secondary() -> Style {
    Style::default().fg(C_SECONDARY)
}

pub fn style_accent() -> Style {
    Style::default().fg(C_ACCENT)
}

pub fn style_selected_focused() -> Style {
    Style::default()
        .bg(C_SELECTION_BG)
        .fg(C_PRIMARY)
        .add_modifier(Modifier::BOLD)
}

pub fn style_menu_border() -> Style {
    Style::default().fg(C_MENU_BORDER)
}

pub fn style_muted() -> Style {
    Style::default().fg(C_MUTED)
}
