use color_eyre::eyre::Result;
use tui_textarea::{CursorMove, TextArea};

use super::{Browser, VISIBLE_COLUMNS};
use crate::{
    action::Action,
    mode::Mode,
    session::{SessionError, TableView},
};

fn text_of(input: &TextArea<'_>) -> String {
    input.lines().join("\n")
}

fn textarea_with(text: &str) -> TextArea<'static> {
    let mut input = TextArea::from(text.lines().map(str::to_string).collect::<Vec<_>>());
    input.move_cursor(CursorMove::Bottom);
    input.move_cursor(CursorMove::End);
    input
}

impl Browser {
    pub(super) fn update(&mut self, action: Action) -> Result<Option<Action>> {
        match action {
            Action::EnterMode(mode) => {
                if mode != Mode::Grid {
                    self.pending_delete = None;
                }
                self.mode = mode;
            },
            Action::FocusTables => return Ok(Some(Action::EnterMode(Mode::Tables))),
            Action::FocusGrid => return Ok(Some(Action::EnterMode(Mode::Grid))),
            Action::FocusQuery => return Ok(Some(Action::EnterMode(Mode::Query))),
            Action::FocusSql => {
                if self.panel.translated_sql.is_none() {
                    self.set_status("No translated SQL to edit", false);
                    return Ok(None);
                }
                return Ok(Some(Action::EnterMode(Mode::Sql)));
            },
            Action::Status(text) => self.set_status(text, false),
            Action::Error(text) => self.set_status(text, true),

            Action::TablesLoaded(tables) => {
                self.tables = tables;
                self.selected_table_index = self.selected_table_index.min(self.tables.len().saturating_sub(1));
            },
            Action::TableMoveDown => {
                if !self.tables.is_empty() {
                    self.selected_table_index = (self.selected_table_index + 1) % self.tables.len();
                }
            },
            Action::TableMoveUp => {
                if !self.tables.is_empty() {
                    self.selected_table_index =
                        self.selected_table_index.checked_sub(1).unwrap_or(self.tables.len() - 1);
                }
            },
            Action::LoadSelectedTable => {
                if let Some(table) = self.selected_table() {
                    return Ok(Some(Action::SelectTable(table.to_string())));
                }
            },
            Action::ShowTable(view) => self.show_table(*view),

            Action::RowMoveDown => {
                if !self.view.rows.is_empty() {
                    self.selected_row_index = (self.selected_row_index + 1) % self.view.rows.len();
                }
            },
            Action::RowMoveUp => {
                if !self.view.rows.is_empty() {
                    self.selected_row_index =
                        self.selected_row_index.checked_sub(1).unwrap_or(self.view.rows.len() - 1);
                }
            },
            Action::ColumnRight => {
                if self.selected_column_index + 1 < self.view.headers.len() {
                    self.selected_column_index += 1;
                }
                self.scroll_to_selected_column();
            },
            Action::ColumnLeft => {
                self.selected_column_index = self.selected_column_index.saturating_sub(1);
                self.scroll_to_selected_column();
            },
            Action::StartEdit => return Ok(self.start_edit()),
            Action::CommitInput => return Ok(self.commit_input()),
            Action::CancelInput => {
                if self.mode == Mode::Insert {
                    self.insert_form = None;
                    self.set_status("Insert cancelled", false);
                }
                return Ok(Some(Action::EnterMode(Mode::Grid)));
            },
            Action::InsertFormReady(form) => {
                if form.is_complete() {
                    return Ok(Some(Action::SubmitInsert(form)));
                }
                self.insert_form = Some(*form);
                self.insert_input = TextArea::default();
                return Ok(Some(Action::EnterMode(Mode::Insert)));
            },
            Action::RequestDelete => return Ok(self.request_delete()),

            Action::ToggleNaturalLanguage => {
                self.natural_language = !self.natural_language;
                let kind = if self.natural_language { "natural language" } else { "SQL" };
                self.set_status(format!("Query input is {kind}"), false);
            },
            Action::ShowQuery(panel) => {
                if panel.translated_sql != self.panel.translated_sql {
                    self.sql_input = textarea_with(panel.translated_sql.as_deref().unwrap_or_default());
                }
                if let Some(failure) = &panel.failure {
                    self.set_status(failure.message.clone(), true);
                } else if let Some(status) = panel.status.as_deref().filter(|s| !s.is_empty()) {
                    self.set_status(status, false);
                }
                self.panel = *panel;
            },
            _ => {},
        }
        Ok(None)
    }

    fn show_table(&mut self, view: TableView) {
        if view.table != self.view.table {
            self.selected_row_index = 0;
            self.selected_column_index = 0;
            self.horizontal_scroll_offset = 0;
        }
        self.view = view;
        self.selected_row_index = self.selected_row_index.min(self.view.rows.len().saturating_sub(1));
        self.selected_column_index = self.selected_column_index.min(self.view.headers.len().saturating_sub(1));
        self.scroll_to_selected_column();
        if let Some(token) = self.pending_delete {
            if self.view.index_of(token).is_none() {
                self.pending_delete = None;
            }
        }
    }

    fn scroll_to_selected_column(&mut self) {
        if self.selected_column_index < self.horizontal_scroll_offset {
            self.horizontal_scroll_offset = self.selected_column_index;
        } else if self.selected_column_index >= self.horizontal_scroll_offset + VISIBLE_COLUMNS {
            self.horizontal_scroll_offset = self.selected_column_index + 1 - VISIBLE_COLUMNS;
        }
    }

    fn start_edit(&mut self) -> Option<Action> {
        let column = self.selected_column()?.to_string();
        let row = self.view.rows.get(self.selected_row_index)?;
        if self.view.is_read_only(&column) {
            return Some(Action::Error(SessionError::ReadOnlyColumn(column).to_string()));
        }
        let current = row.cells.get(self.selected_column_index).cloned().unwrap_or_default();
        self.cell_editor = textarea_with(&current);
        Some(Action::EnterMode(Mode::EditCell))
    }

    fn commit_input(&mut self) -> Option<Action> {
        match self.mode {
            Mode::EditCell => {
                let column = self.selected_column()?.to_string();
                let row = self.view.rows.get(self.selected_row_index)?.token;
                self.send(Action::EditCell {
                    row,
                    column,
                    value: text_of(&self.cell_editor),
                });
                Some(Action::EnterMode(Mode::Grid))
            },
            Mode::Query => Some(Action::RunQuery {
                text: text_of(&self.query_input),
                natural_language: self.natural_language,
            }),
            Mode::Sql => Some(Action::RunDirect(text_of(&self.sql_input))),
            Mode::Insert => {
                let mut form = self.insert_form.take()?;
                if let Some(field) = form.next_unanswered() {
                    let column = field.column.name.clone();
                    if let Err(e) = form.answer(&column, text_of(&self.insert_input)) {
                        self.set_status(e.to_string(), true);
                    }
                }
                self.insert_input = TextArea::default();
                if form.is_complete() {
                    self.send(Action::EnterMode(Mode::Grid));
                    Some(Action::SubmitInsert(Box::new(form)))
                } else {
                    self.insert_form = Some(form);
                    None
                }
            },
            Mode::Tables | Mode::Grid => None,
        }
    }

    fn request_delete(&mut self) -> Option<Action> {
        let row = self.view.rows.get(self.selected_row_index)?;
        if self.pending_delete == Some(row.token) {
            self.pending_delete = None;
            return Some(Action::DeleteRow(row.token));
        }
        self.pending_delete = Some(row.token);
        self.set_status(format!("Press d again to delete row {}", self.selected_row_index + 1), false);
        None
    }
}
