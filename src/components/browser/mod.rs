pub mod handlers;
pub mod rendering;
pub mod state;

use color_eyre::eyre::Result;
use ratatui::prelude::*;
use tokio::sync::mpsc::UnboundedSender;
use tui_textarea::TextArea;

use super::Component;
use crate::{
    action::Action,
    config::Config,
    mode::Mode,
    query::QueryPanel,
    session::{InsertForm, RowToken, TableView},
};

pub(crate) const VISIBLE_COLUMNS: usize = 5;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    pub text: String,
    pub is_error: bool,
}

/// Table list, editable grid and query area in one screen.
///
/// The browser only mirrors state: every change to rows or query results
/// arrives as an action carrying a fresh snapshot from the app.
pub struct Browser {
    pub command_tx: Option<UnboundedSender<Action>>,
    pub config: Config,
    pub mode: Mode,

    // Table list
    pub tables: Vec<String>,
    pub selected_table_index: usize,

    // Grid
    pub view: TableView,
    pub selected_row_index: usize,
    pub selected_column_index: usize,
    pub horizontal_scroll_offset: usize,
    pub cell_editor: TextArea<'static>,
    pub pending_delete: Option<RowToken>,

    // Insert form
    pub insert_form: Option<InsertForm>,
    pub insert_input: TextArea<'static>,

    // Query area
    pub query_input: TextArea<'static>,
    pub sql_input: TextArea<'static>,
    pub natural_language: bool,
    pub panel: QueryPanel,

    pub status: Option<StatusLine>,
}

impl Default for Browser {
    fn default() -> Self {
        Self::new()
    }
}

impl Browser {
    pub fn new() -> Self {
        Self::new_with_config(None)
    }

    pub fn new_with_config(config: Option<Config>) -> Self {
        Self {
            command_tx: None,
            config: config.unwrap_or_default(),
            mode: Mode::Tables,
            tables: vec![],
            selected_table_index: 0,
            view: TableView::default(),
            selected_row_index: 0,
            selected_column_index: 0,
            horizontal_scroll_offset: 0,
            cell_editor: TextArea::default(),
            pending_delete: None,
            insert_form: None,
            insert_input: TextArea::default(),
            query_input: TextArea::default(),
            sql_input: TextArea::default(),
            natural_language: true,
            panel: QueryPanel::default(),
            status: None,
        }
    }

    pub fn selected_table(&self) -> Option<&str> {
        self.tables.get(self.selected_table_index).map(String::as_str)
    }

    pub fn selected_column(&self) -> Option<&str> {
        self.view.headers.get(self.selected_column_index).map(String::as_str)
    }

    fn send(&self, action: Action) {
        if let Some(tx) = &self.command_tx {
            if let Err(e) = tx.send(action) {
                log::error!("Failed to send action: {e}");
            }
        }
    }

    fn set_status(&mut self, text: impl Into<String>, is_error: bool) {
        self.status = Some(StatusLine { text: text.into(), is_error });
    }
}

impl Component for Browser {
    fn register_action_handler(&mut self, tx: UnboundedSender<Action>) -> Result<()> {
        self.command_tx = Some(tx);
        Ok(())
    }

    fn register_config_handler(&mut self, config: Config) -> Result<()> {
        self.config = config;
        Ok(())
    }

    fn init(&mut self, _area: Rect) -> Result<()> {
        Ok(())
    }

    fn handle_events(&mut self, event: Option<crate::tui::Event>) -> Result<Option<Action>> {
        self.handle_events(event)
    }

    fn handle_key_events(&mut self, key: crossterm::event::KeyEvent) -> Result<Option<Action>> {
        self.handle_key_events(key)
    }

    fn update(&mut self, action: Action) -> Result<Option<Action>> {
        self.update(action)
    }

    fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        self.draw(f, area)
    }
}
