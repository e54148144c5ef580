//! Header: 2-row top bar.
//!
//! Row 1: play/pause icon, now-playing title, station position.
//! Row 2: current station name, volume gauge.

use ratatui::{
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
    Frame,
};
use unicode_width::UnicodeWidthStr;

use lofi_core::playback::{PlayIcon, Presentation, ServiceStatus};

use crate::theme::{
    style_accent, style_default, style_muted, style_secondary, C_CONNECTING, C_PLAYING,
    C_SEPARATOR,
};

const GAUGE_CELLS: usize = 10;

/// What the header shows, borrowed from the controller each frame.
pub struct HeaderView<'a> {
    pub presentation: &'a Presentation,
    pub service: ServiceStatus,
    pub station_name: &'a str,
    pub index: usize,
    pub count: usize,
    pub volume: f32,
}

pub fn draw(frame: &mut Frame, area: Rect, view: &HeaderView<'_>) {
    if area.height == 0 {
        return;
    }
    let row1 = Rect { height: 1, ..area };
    frame.render_widget(Paragraph::new(build_row1(view, area.width)), row1);
    if area.height > 1 {
        let row2 = Rect {
            y: area.y + 1,
            height: 1,
            ..area
        };
        frame.render_widget(Paragraph::new(build_row2(view, area.width)), row2);
    }
}

fn icon_span(view: &HeaderView<'_>) -> Span<'static> {
    match (view.service, view.presentation.icon) {
        (ServiceStatus::Loading, _) => Span::styled(" … ", Style::default().fg(C_CONNECTING)),
        (_, PlayIcon::Pause) => Span::styled(
            " ⏸ ",
            Style::default().fg(C_PLAYING).add_modifier(Modifier::BOLD),
        ),
        (_, PlayIcon::Play) => Span::styled(" ▶ ", style_accent().add_modifier(Modifier::BOLD)),
    }
}

pub fn build_row1(view: &HeaderView<'_>, width: u16) -> Line<'static> {
    let icon = icon_span(view);
    let position = format!(" {}/{} ", view.index + 1, view.count);
    let room = (width as usize)
        .saturating_sub(icon.content.width())
        .saturating_sub(position.width());
    let title = truncate(&view.presentation.title, room);
    let pad = room.saturating_sub(title.width());

    Line::from(vec![
        icon,
        Span::styled(title, style_default().add_modifier(Modifier::BOLD)),
        Span::raw(" ".repeat(pad)),
        Span::styled(position, style_secondary()),
    ])
}

pub fn build_row2(view: &HeaderView<'_>, width: u16) -> Line<'static> {
    let gauge = volume_gauge(view.volume);
    let percent = format!(" {:>3}% ", (view.volume * 100.0).round() as u32);
    let label = if view.volume <= 0.0 { " mute" } else { " vol " };
    let right = gauge.width() + percent.width() + label.width();
    let room = (width as usize).saturating_sub(right + 3);
    let name = truncate(view.station_name, room);
    let pad = room.saturating_sub(name.width());

    Line::from(vec![
        Span::raw("   "),
        Span::styled(name, style_secondary()),
        Span::raw(" ".repeat(pad)),
        Span::styled(label, style_muted()),
        Span::styled(gauge, style_accent()),
        Span::styled(percent, style_secondary()),
    ])
}

/// `█` cells for the level, `░` for the rest.
pub fn volume_gauge(level: f32) -> String {
    let filled = ((level.clamp(0.0, 1.0) * GAUGE_CELLS as f32).round() as usize).min(GAUGE_CELLS);
    format!("{}{}", "█".repeat(filled), "░".repeat(GAUGE_CELLS - filled))
}

/// Cut `s` to at most `max` display columns, marking the cut with `…`.
pub fn truncate(s: &str, max: usize) -> String {
    if s.width() <= max {
        return s.to_string();
    }
    if max == 0 {
        return String::new();
    }
    let mut out = String::new();
    let mut used = 0;
    for ch in s.chars() {
        let w = unicode_width::UnicodeWidthChar::width(ch).unwrap_or(0);
        if used + w + 1 > max {
            break;
        }
        out.push(ch);
        used += w;
    }
    out.push('…');
    out
}

/// Thin rule under the header.
pub fn separator(width: u16) -> Line<'static> {
    Line::from(Span::styled(
        "─".repeat(width as usize),
        Style::default().fg(C_SEPARATOR),
    ))
}
