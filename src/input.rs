//! Keyboard input.
//!
//! Terminal events are reduced to [`KeyInput`] before they reach the client
//! loop, so the loop can be driven by crossterm in production and by a
//! scripted [`KeySource`] in tests.

use std::io;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};

/// Key classes the client reacts to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyInput {
    /// Printable character.
    Char(char),
    Enter,
    Backspace,
    /// Move the peer selection up.
    Up,
    /// Move the peer selection down.
    Down,
    /// Quit (Esc or Ctrl-C).
    Quit,
}

impl KeyInput {
    /// Map a crossterm key event; `None` for keys the client ignores.
    pub fn from_key_event(key: KeyEvent) -> Option<Self> {
        if key.kind != KeyEventKind::Press {
            return None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => Some(Self::Quit),
            KeyCode::Char(_) if key.modifiers.contains(KeyModifiers::CONTROL) => None,
            KeyCode::Char(c) if !c.is_control() => Some(Self::Char(c)),
            KeyCode::Enter => Some(Self::Enter),
            KeyCode::Backspace => Some(Self::Backspace),
            KeyCode::Up => Some(Self::Up),
            KeyCode::Down => Some(Self::Down),
            KeyCode::Esc => Some(Self::Quit),
            _ => None,
        }
    }
}

/// Where the client loop gets its keys from.
pub trait KeySource {
    /// Wait at most `timeout` for the next key.
    ///
    /// Returns `Ok(None)` when nothing relevant arrived in time. An error
    /// ends the client loop.
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>>;
}

/// Reads keys from the terminal through crossterm.
#[derive(Debug, Default)]
pub struct CrosstermKeys;

impl KeySource for CrosstermKeys {
    fn next_key(&mut self, timeout: Duration) -> io::Result<Option<KeyInput>> {
        if !event::poll(timeout)? {
            return Ok(None);
        }
        match event::read()? {
            Event::Key(key) => Ok(KeyInput::from_key_event(key)),
            _ => Ok(None),
        }
    }
}

/// Unsent text typed by the user.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct InputBuffer {
    text: String,
}

impl InputBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, c: char) {
        self.text.push(c);
    }

    /// Drop the last character, if any.
    pub fn backspace(&mut self) {
        self.text.pop();
    }

    /// Empty the buffer and return what it held.
    pub fn take(&mut self) -> String {
        std::mem::take(&mut self.text)
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }
}
