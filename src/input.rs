//! Keyboard routing.
//!
//! Shortcuts and transport keys resolve to the same [`Command`]s, so there is
//! a single place deciding what a key does. While the path prompt has focus,
//! keys edit the prompt instead.

use std::ops::ControlFlow;
use std::path::PathBuf;

use crossterm::event::{KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

use crate::playback::Command;

/// What the event loop should do in response to a key
#[derive(Debug, Clone, PartialEq)]
pub enum InputAction {
    Command(Command),
    AdjustGridWidth(i32),
    AdjustContrast(f64),
    /// A file was picked; `None` when the prompt was submitted empty
    OpenFile(Option<PathBuf>),
    /// The prompt text changed, opened or closed
    PromptChanged,
    Quit,
    Ignored,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
enum Focus {
    #[default]
    Controls,
    /// Text input for a file path
    PathPrompt(String),
}

#[derive(Debug, Default)]
pub struct InputRouter {
    focus: Focus,
}

impl InputRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Prompt contents while the path prompt has focus
    pub fn prompt(&self) -> Option<&str> {
        match &self.focus {
            Focus::PathPrompt(text) => Some(text),
            Focus::Controls => None,
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) -> InputAction {
        if key.kind == KeyEventKind::Release {
            return InputAction::Ignored;
        }
        if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
            return InputAction::Quit;
        }

        match &mut self.focus {
            Focus::PathPrompt(text) => match key.code {
                KeyCode::Enter => {
                    let path = text.trim().to_string();
                    self.focus = Focus::Controls;
                    InputAction::OpenFile((!path.is_empty()).then(|| PathBuf::from(path)))
                }
                KeyCode::Esc => {
                    self.focus = Focus::Controls;
                    InputAction::PromptChanged
                }
                KeyCode::Backspace => {
                    text.pop();
                    InputAction::PromptChanged
                }
                KeyCode::Char(c) => {
                    text.push(c);
                    InputAction::PromptChanged
                }
                _ => InputAction::Ignored,
            },
            Focus::Controls => self.handle_control_key(key),
        }
    }

    fn handle_control_key(&mut self, key: KeyEvent) -> InputAction {
        match key.code {
            KeyCode::Char(' ') => InputAction::Command(Command::TogglePlayback),
            KeyCode::Esc => InputAction::Command(Command::Stop),
            KeyCode::Char('p') => InputAction::Command(Command::Play),
            KeyCode::Char('a') => InputAction::Command(Command::Pause),
            KeyCode::Char('s') => InputAction::Command(Command::Stop),
            KeyCode::Left => InputAction::AdjustGridWidth(-crate::GRID_WIDTH_STEP),
            KeyCode::Right => InputAction::AdjustGridWidth(crate::GRID_WIDTH_STEP),
            KeyCode::Up => InputAction::AdjustContrast(crate::CONTRAST_STEP),
            KeyCode::Down => InputAction::AdjustContrast(-crate::CONTRAST_STEP),
            KeyCode::Char('o') => {
                self.focus = Focus::PathPrompt(String::new());
                InputAction::PromptChanged
            }
            KeyCode::Char('q') => InputAction::Quit,
            _ => InputAction::Ignored,
        }
    }
}

/// Input events handled before the event loop gets back to its ticks
pub const MAX_EVENTS_PER_TURN: usize = 32;

/// Feed up to `limit` ready events from `next` into `handle`.
///
/// `next` returns `None` once nothing is ready. Stops early when `handle`
/// breaks, and returns the break so the caller can quit.
pub fn drain_events<E>(
    limit: usize,
    mut next: impl FnMut() -> anyhow::Result<Option<E>>,
    mut handle: impl FnMut(E) -> anyhow::Result<ControlFlow<()>>,
) -> anyhow::Result<ControlFlow<()>> {
    for _ in 0..limit {
        let Some(event) = next()? else {
            break;
        };
        if handle(event)?.is_break() {
            return Ok(ControlFlow::Break(()));
        }
    }
    Ok(ControlFlow::Continue(()))
}

/// Help text for the key bindings
pub const HELP_TEXT: &str = "SPACE play/pause  P play  A pause  S/ESC stop  \u{2190}\u{2192} width  \u{2191}\u{2193} contrast  O open  Q quit";
