use color_eyre::eyre::Result;
use crossterm::event::KeyEvent;
use tui_textarea::TextArea;

use super::Browser;
use crate::{action::Action, mode::Mode, tui::Event};

impl Browser {
    pub(super) fn handle_events(&mut self, event: Option<Event>) -> Result<Option<Action>> {
        match event {
            Some(Event::Key(key)) => self.handle_key_events(key),
            Some(Event::Paste(text)) => {
                if let Some(input) = self.active_input() {
                    input.insert_str(text.replace(['\r', '\n'], " "));
                }
                Ok(None)
            },
            _ => Ok(None),
        }
    }

    /// Feeds keys to the focused text input. Keys bound in the current mode
    /// are left to the app, which turns them into actions.
    pub(super) fn handle_key_events(&mut self, key: KeyEvent) -> Result<Option<Action>> {
        if !self.mode.is_text_input() || self.is_bound(key) {
            return Ok(None);
        }
        if let Some(input) = self.active_input() {
            input.input(key);
        }
        Ok(None)
    }

    fn is_bound(&self, key: KeyEvent) -> bool {
        self.config.keybindings.get(&self.mode).is_some_and(|bindings| bindings.contains_key(&vec![key]))
    }

    fn active_input(&mut self) -> Option<&mut TextArea<'static>> {
        match self.mode {
            Mode::EditCell => Some(&mut self.cell_editor),
            Mode::Query => Some(&mut self.query_input),
            Mode::Sql => Some(&mut self.sql_input),
            Mode::Insert => Some(&mut self.insert_input),
            Mode::Tables | Mode::Grid => None,
        }
    }
}
