//! Station menu: centred overlay listing the catalog.
//!
//! The cursor moves with ↑/↓; the station the player is actually on
//! (`active`) is marked with a dot.

use ratatui::{
    layout::Rect,
    style::Style,
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

use lofi_core::catalog::Station;

use crate::components::header::truncate;
use crate::theme::{
    style_default, style_menu_border, style_secondary, style_selected_focused, C_ACCENT,
    C_BG, C_NUMBER_HINT,
};

const MAX_WIDTH: u16 = 48;

#[derive(Debug, Default)]
pub struct StationMenu {
    open: bool,
    cursor: usize,
}

impl StationMenu {
    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Open with the cursor on `current`.
    pub fn open(&mut self, current: usize) {
        self.open = true;
        self.cursor = current;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn up(&mut self, count: usize) {
        if count > 0 {
            self.cursor = (self.cursor + count - 1) % count;
        }
    }

    pub fn down(&mut self, count: usize) {
        if count > 0 {
            self.cursor = (self.cursor + 1) % count;
        }
    }

    pub fn draw(&self, frame: &mut Frame, area: Rect, stations: &[Station], active: Option<usize>) {
        if !self.open {
            return;
        }
        let rect = menu_rect(area, stations.len());
        if rect.width < 4 || rect.height < 3 {
            return;
        }
        frame.render_widget(Clear, rect);

        let inner_width = rect.width.saturating_sub(2) as usize;
        let lines: Vec<Line> = stations
            .iter()
            .enumerate()
            .map(|(i, station)| {
                let marker = if Some(i) == active {
                    Span::styled(" ● ", Style::default().fg(C_ACCENT))
                } else {
                    Span::styled(format!("{:>2} ", i + 1), Style::default().fg(C_NUMBER_HINT))
                };
                let name = truncate(&station.name, inner_width.saturating_sub(4));
                let style = if i == self.cursor {
                    style_selected_focused()
                } else {
                    style_default()
                };
                Line::from(vec![marker, Span::styled(name, style)])
            })
            .collect();

        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(style_menu_border())
            .title(Span::styled(" Stations ", style_secondary()))
            .style(Style::default().bg(C_BG));
        frame.render_widget(Paragraph::new(lines).block(block), rect);
    }
}

/// Where the menu lands inside `area` for `count` stations.
pub fn menu_rect(area: Rect, count: usize) -> Rect {
    let width = MAX_WIDTH.min(area.width);
    let height = (count as u16).saturating_add(2).min(area.height);
    Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + (area.height - height) / 2,
        width,
        height,
    }
}

/// Station row under the terminal cell (`col`, `row`), if any.
pub fn row_at(area: Rect, count: usize, col: u16, row: u16) -> Option<usize> {
    let rect = menu_rect(area, count);
    let inside_x = col > rect.x && col < rect.x + rect.width.saturating_sub(1);
    let inside_y = row > rect.y && row < rect.y + rect.height.saturating_sub(1);
    if !(inside_x && inside_y) {
        return None;
    }
    let index = (row - rect.y - 1) as usize;
    (index < count).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratatui::{backend::TestBackend, Terminal};

    fn stations() -> Vec<Station> {
        vec![
            Station::new("a", "Alpha"),
            Station::new("b", "Bravo"),
            Station::new("c", "Charlie"),
        ]
    }

    #[test]
    fn test_cursor_wraps() {
        let mut m = StationMenu::default();
        m.open(0);
        m.up(3);
        assert_eq!(m.cursor(), 2);
        m.down(3);
        assert_eq!(m.cursor(), 0);
    }

    #[test]
    fn test_row_hit_testing() {
        let area = Rect::new(0, 0, 80, 20);
        let rect = menu_rect(area, 3);
        assert_eq!(rect, Rect::new(16, 7, 48, 5));
        assert_eq!(row_at(area, 3, 20, 8), Some(0));
        assert_eq!(row_at(area, 3, 20, 10), Some(2));
        // border rows and cells outside the box
        assert_eq!(row_at(area, 3, 20, 7), None);
        assert_eq!(row_at(area, 3, 20, 11), None);
        assert_eq!(row_at(area, 3, 2, 8), None);
    }

    #[test]
    fn test_draw_marks_active_station() {
        let mut terminal = Terminal::new(TestBackend::new(60, 10)).unwrap();
        let mut menu = StationMenu::default();
        menu.open(1);
        terminal
            .draw(|f| menu.draw(f, f.area(), &stations(), Some(2)))
            .unwrap();
        let buffer = terminal.backend().buffer().clone();
        let rows: Vec<String> = (0..10u16)
            .map(|y| (0..60u16).map(|x| buffer[(x, y)].symbol().to_string()).collect())
            .collect();
        let charlie = rows.iter().find(|r| r.contains("Charlie")).unwrap();
        assert!(charlie.contains('●'));
        let alpha = rows.iter().find(|r| r.contains("Alpha")).unwrap();
        assert!(alpha.contains(" 1 "));
    }
}
