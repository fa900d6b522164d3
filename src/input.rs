//! Key bindings: normal and vim-style.

use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use edgefall::{Edge, Intent};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Move(Intent),
    Pause,
    Restart,
    Quit,
    None,
}

/// Map key event to game action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent { code, modifiers, .. } = key;
    let no_mod = modifiers.is_empty() || modifiers == KeyModifiers::SHIFT;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !no_mod {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Char('n' | 'N') => Action::Restart,
        KeyCode::Left | KeyCode::Char('h') => Action::Move(Intent::Shift(Edge::Left)),
        KeyCode::Right | KeyCode::Char('l') => Action::Move(Intent::Shift(Edge::Right)),
        KeyCode::Up | KeyCode::Char('k') => Action::Move(Intent::Shift(Edge::Top)),
        KeyCode::Down | KeyCode::Char('j') => Action::Move(Intent::Shift(Edge::Bottom)),
        KeyCode::Char('r' | 'R' | 'x' | 'X' | 'i') | KeyCode::Tab => Action::Move(Intent::Rotate),
        KeyCode::Enter | KeyCode::Char(' ') => Action::Move(Intent::Drop),
        _ => Action::None,
    }
}
