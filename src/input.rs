//! Key bindings: arrows and vim-style keys.

use crate::game::Command;
use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};

/// Action from a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    MoveLeft,
    MoveRight,
    Rotate,
    SoftDrop,
    HardDrop,
    Pause,
    /// Start a new game (also restarts).
    Start,
    Quit,
    None,
}

impl Action {
    /// Game command for in-play actions; host-level actions map to `None`.
    pub fn command(self) -> Option<Command> {
        match self {
            Self::MoveLeft => Some(Command::MoveLeft),
            Self::MoveRight => Some(Command::MoveRight),
            Self::Rotate => Some(Command::Rotate),
            Self::SoftDrop => Some(Command::SoftDrop),
            Self::HardDrop => Some(Command::HardDrop),
            Self::Pause => Some(Command::TogglePause),
            Self::Start | Self::Quit | Self::None => None,
        }
    }

    /// Actions that auto-repeat while the key is held.
    pub fn repeats(self) -> bool {
        matches!(self, Self::MoveLeft | Self::MoveRight | Self::SoftDrop)
    }
}

/// Map key event to game action. Supports both normal (arrows, space) and vim (hjkl).
pub fn key_to_action(key: KeyEvent) -> Action {
    let KeyEvent {
        code, modifiers, ..
    } = key;
    if modifiers == KeyModifiers::CONTROL && code == KeyCode::Char('c') {
        return Action::Quit;
    }
    if !(modifiers.is_empty() || modifiers == KeyModifiers::SHIFT) {
        return Action::None;
    }
    match code {
        KeyCode::Char('q' | 'Q') | KeyCode::Esc => Action::Quit,
        KeyCode::Char('p' | 'P') => Action::Pause,
        KeyCode::Enter | KeyCode::Char('r' | 'R') => Action::Start,
        KeyCode::Left | KeyCode::Char('h') => Action::MoveLeft,
        KeyCode::Right | KeyCode::Char('l') => Action::MoveRight,
        KeyCode::Up | KeyCode::Char('k') => Action::Rotate,
        KeyCode::Down | KeyCode::Char('j') => Action::SoftDrop,
        KeyCode::Char(' ') => Action::HardDrop,
        _ => Action::None,
    }
}
