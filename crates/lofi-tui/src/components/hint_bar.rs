//! One-line key hint bar along the bottom edge.

use ratatui::{
    layout::Rect,
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};

use crate::theme::{style_accent, style_muted};

const HINTS: &[(&str, &str)] = &[
    ("space", "play/pause"),
    ("←/→", "station"),
    ("↑/↓", "volume"),
    ("0", "mute"),
    ("m", "menu"),
    ("f", "fullscreen"),
    ("q", "quit"),
];

const MENU_HINTS: &[(&str, &str)] = &[("↑/↓", "move"), ("enter", "play"), ("esc", "close")];

pub fn build(menu_open: bool) -> Line<'static> {
    let hints = if menu_open { MENU_HINTS } else { HINTS };
    let mut spans = vec![Span::raw(" ")];
    for (i, (key, what)) in hints.iter().enumerate() {
        if i > 0 {
            spans.push(Span::styled("  ", style_muted()));
        }
        spans.push(Span::styled(*key, style_accent()));
        spans.push(Span::styled(format!(" {what}"), style_muted()));
    }
    Line::from(spans)
}

pub fn draw(frame: &mut Frame, area: Rect, menu_open: bool) {
    frame.render_widget(Paragraph::new(build(menu_open)), area);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hints_switch_with_menu() {
        let text = |l: Line<'_>| l.spans.iter().map(|s| s.content.to_string()).collect::<String>();
        assert!(text(build(false)).contains("fullscreen"));
        let menu = text(build(true));
        assert!(menu.contains("esc close"));
        assert!(!menu.contains("fullscreen"));
    }
}
