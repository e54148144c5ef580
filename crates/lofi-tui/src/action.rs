//! Action enum: every user intent the key and mouse handlers can produce.

use ratatui::crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// All actions that can flow from input into the app.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // ── Playback ─────────────────────────────────────────────────────────────
    TogglePlay,
    Next,
    Prev,
    Select(usize),
    VolumeUp,
    VolumeDown,
    Mute,

    // ── View ─────────────────────────────────────────────────────────────────
    ToggleFullscreen,
    OpenMenu,
    CloseMenu,
    MenuUp,
    MenuDown,
    MenuConfirm,

    Quit,
}

/// Map a key press to actions. The station menu, while open, captures
/// navigation keys.
pub fn map_key(key: KeyEvent, menu_open: bool) -> Vec<Action> {
    if key.kind != KeyEventKind::Press {
        return vec![];
    }
    if key.modifiers.contains(KeyModifiers::CONTROL) && key.code == KeyCode::Char('c') {
        return vec![Action::Quit];
    }

    if menu_open {
        return match key.code {
            KeyCode::Up | KeyCode::Char('k') => vec![Action::MenuUp],
            KeyCode::Down | KeyCode::Char('j') => vec![Action::MenuDown],
            KeyCode::Enter => vec![Action::MenuConfirm],
            KeyCode::Esc | KeyCode::Char('m') => vec![Action::CloseMenu],
            KeyCode::Char('q') => vec![Action::Quit],
            _ => vec![],
        };
    }

    match key.code {
        KeyCode::Char(' ') | KeyCode::Char('k') => vec![Action::TogglePlay],
        KeyCode::Left | KeyCode::Char('j') => vec![Action::Prev],
        KeyCode::Right | KeyCode::Char('l') => vec![Action::Next],
        KeyCode::Up | KeyCode::Char('=') | KeyCode::Char('+') => vec![Action::VolumeUp],
        KeyCode::Down | KeyCode::Char('-') => vec![Action::VolumeDown],
        KeyCode::Char('0') => vec![Action::Mute],
        KeyCode::Char('m') => vec![Action::OpenMenu],
        KeyCode::Char('f') => vec![Action::ToggleFullscreen],
        KeyCode::Char('q') => vec![Action::Quit],
        _ => vec![],
    }
}
