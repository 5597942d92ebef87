use color_eyre::eyre::Result;
use ratatui::{
    prelude::*,
    widgets::{Block, BorderType, Borders, Cell, Clear, List, ListItem, ListState, Paragraph, Row, Table, TableState, Wrap},
};

use super::{Browser, VISIBLE_COLUMNS};
use crate::{mode::Mode, session::SessionState, theme};

fn panel(title: impl Into<Line<'static>>, focused: bool) -> Block<'static> {
    Block::default()
        .borders(Borders::ALL)
        .border_type(BorderType::Rounded)
        .border_style(theme::border(focused))
        .title(title)
        .title_style(theme::title())
}

fn centered(area: Rect, width_percent: u16, height: u16) -> Rect {
    let [_, middle, _] =
        Layout::vertical([Constraint::Fill(1), Constraint::Length(height), Constraint::Fill(1)]).areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Percentage((100 - width_percent) / 2),
        Constraint::Percentage(width_percent),
        Constraint::Percentage((100 - width_percent) / 2),
    ])
    .areas(middle);
    center
}

impl Browser {
    pub(super) fn draw(&mut self, f: &mut Frame<'_>, area: Rect) -> Result<()> {
        let [title_area, body, status_area] =
            Layout::vertical([Constraint::Length(3), Constraint::Min(1), Constraint::Length(1)]).areas(area);

        let title = Paragraph::new(Text::styled(
            "Table Crafter - [1] Tables [2] Grid [3] Query",
            theme::title(),
        ))
        .block(panel("", false));
        f.render_widget(title, title_area);

        let [tables_area, main_area] =
            Layout::horizontal([Constraint::Percentage(20), Constraint::Percentage(80)]).areas(body);
        self.render_table_list(f, tables_area);

        let [grid_area, query_area] =
            Layout::vertical([Constraint::Percentage(55), Constraint::Percentage(45)]).areas(main_area);
        self.render_grid(f, grid_area);
        self.render_query_area(f, query_area);

        self.render_status(f, status_area);

        match self.mode {
            Mode::EditCell => self.render_cell_editor(f, area),
            Mode::Insert => self.render_insert_prompt(f, area),
            _ => {},
        }
        Ok(())
    }

    fn render_table_list(&mut self, f: &mut Frame<'_>, area: Rect) {
        let block = panel("[1] Tables", self.mode == Mode::Tables);
        if self.tables.is_empty() {
            let empty = Paragraph::new("No tables").style(theme::muted()).block(block);
            f.render_widget(empty, area);
            return;
        }

        let items: Vec<ListItem> = self
            .tables
            .iter()
            .map(|name| {
                let marker = if self.view.table.as_deref() == Some(name.as_str()) { "> " } else { "  " };
                ListItem::new(format!("{marker}{name}"))
            })
            .collect();
        let mut state = ListState::default().with_selected(Some(self.selected_table_index));
        let list = List::new(items).block(block).style(theme::bg_primary()).highlight_style(theme::selection_active());
        f.render_stateful_widget(list, area, &mut state);
    }

    fn render_grid(&mut self, f: &mut Frame<'_>, area: Rect) {
        let focused = matches!(self.mode, Mode::Grid | Mode::EditCell);
        let title = match &self.view.table {
            Some(table) => {
                let dirty = self.view.rows.iter().filter(|row| row.dirty).count();
                let mut title = format!("[2] {table} ({} rows", self.view.rows.len());
                if dirty > 0 {
                    title.push_str(&format!(", {dirty} edited"));
                }
                title.push(')');
                title
            },
            None => "[2] Grid".to_string(),
        };
        let block = panel(title, focused);

        let message = match &self.view.state {
            SessionState::Empty => Some(Text::styled("Please select a table", theme::muted())),
            SessionState::Error(message) if self.view.rows.is_empty() => {
                Some(Text::styled(message.clone(), theme::error()))
            },
            _ => self.view.placeholder().map(|text| Text::styled(text, theme::muted())),
        };
        if let Some(message) = message {
            f.render_widget(Paragraph::new(message).wrap(Wrap { trim: true }).block(block), area);
            return;
        }

        let end = (self.horizontal_scroll_offset + VISIBLE_COLUMNS).min(self.view.headers.len());
        let visible = self.horizontal_scroll_offset..end;

        let header = Row::new(std::iter::once(Cell::from(" ")).chain(self.view.headers[visible.clone()].iter().map(
            |name| {
                let style = if self.view.is_read_only(name) { theme::header().add_modifier(Modifier::ITALIC) } else { theme::header() };
                Cell::from(name.clone()).style(style)
            },
        )))
        .style(theme::header());

        let rows = self.view.rows.iter().enumerate().map(|(index, row)| {
            let marker = if self.pending_delete == Some(row.token) {
                Cell::from("x").style(theme::error())
            } else if row.dirty {
                Cell::from("*").style(theme::dirty())
            } else {
                Cell::from(" ")
            };
            let cells = visible.clone().map(|column| {
                let text = row.cells.get(column).cloned().unwrap_or_default();
                let style = if index == self.selected_row_index && column == self.selected_column_index && focused {
                    theme::selection_active()
                } else if self.view.is_read_only(&self.view.headers[column]) {
                    theme::read_only()
                } else if row.dirty {
                    theme::dirty()
                } else {
                    Style::default()
                };
                Cell::from(text).style(style)
            });
            Row::new(std::iter::once(marker).chain(cells))
        });

        let widths = std::iter::once(Constraint::Length(1))
            .chain(std::iter::repeat(Constraint::Fill(1)).take(visible.len()))
            .collect::<Vec<_>>();
        let table = Table::new(rows, widths)
            .header(header)
            .block(block)
            .style(theme::bg_primary())
            .row_highlight_style(theme::selection());
        let mut state = TableState::default().with_selected(Some(self.selected_row_index));
        f.render_stateful_widget(table, area, &mut state);
    }

    fn render_query_area(&mut self, f: &mut Frame<'_>, area: Rect) {
        let sql_height = if self.panel.translated_sql.is_some() { 5 } else { 0 };
        let banner = self.banner_lines();
        let [input_area, sql_area, banner_area, results_area] = Layout::vertical([
            Constraint::Length(3),
            Constraint::Length(sql_height),
            Constraint::Length(banner.len() as u16),
            Constraint::Min(3),
        ])
        .areas(area);

        let kind = if self.natural_language { "Natural language" } else { "SQL" };
        self.query_input.set_block(panel(format!("[3] Query ({kind}) - [ctrl-n] toggle"), self.mode == Mode::Query));
        self.query_input.set_cursor_line_style(Style::default());
        f.render_widget(&self.query_input, input_area);

        if sql_height > 0 {
            self.sql_input
                .set_block(panel("Translated SQL - [ctrl-e] edit, [enter] execute", self.mode == Mode::Sql));
            self.sql_input.set_cursor_line_style(Style::default());
            f.render_widget(&self.sql_input, sql_area);
        }

        if !banner.is_empty() {
            f.render_widget(Paragraph::new(banner), banner_area);
        }

        self.render_results(f, results_area);
    }

    fn banner_lines(&self) -> Vec<Line<'static>> {
        let mut lines = Vec::new();
        if let Some(advisory) = &self.panel.advisory {
            lines.push(Line::styled(advisory.clone(), theme::warning()));
        }
        for notice in &self.panel.notices {
            lines.push(Line::styled(notice.clone(), theme::muted()));
        }
        lines
    }

    fn render_results(&mut self, f: &mut Frame<'_>, area: Rect) {
        let block = panel("Results", false);

        if let Some(failure) = &self.panel.failure {
            let mut lines = vec![Line::styled(format!("Error: {}", failure.message), theme::error())];
            if let Some(traceback) = &failure.traceback {
                lines.push(Line::styled("Traceback:", theme::warning()));
                lines.extend(traceback.lines().map(|line| Line::styled(line.to_string(), theme::muted())));
            }
            f.render_widget(Paragraph::new(lines).wrap(Wrap { trim: false }).block(block), area);
            return;
        }

        if let Some(placeholder) = &self.panel.placeholder {
            f.render_widget(Paragraph::new(Text::styled(placeholder.clone(), theme::muted())).block(block), area);
            return;
        }

        let style = if self.panel.highlight { theme::highlight() } else { theme::bg_primary() };
        let header = Row::new(self.panel.headers.iter().map(|h| Cell::from(h.clone()))).style(theme::header());
        let rows = self.panel.rows.iter().map(|row| Row::new(row.iter().map(|cell| Cell::from(cell.clone()))));
        let widths = vec![Constraint::Fill(1); self.panel.headers.len().max(1)];
        let table = Table::new(rows, widths).header(header).block(block).style(style);
        f.render_widget(table, area);
    }

    fn render_status(&mut self, f: &mut Frame<'_>, area: Rect) {
        let mode = Span::styled(format!(" {:?} ", self.mode).to_uppercase(), theme::selection_active());
        let status = match &self.status {
            Some(status) if status.is_error => Span::styled(format!(" {}", status.text), theme::error()),
            Some(status) => Span::styled(format!(" {}", status.text), theme::success()),
            None => Span::raw(""),
        };
        f.render_widget(Paragraph::new(Line::from(vec![mode, status])).style(theme::status_bar()), area);
    }

    fn render_cell_editor(&mut self, f: &mut Frame<'_>, area: Rect) {
        let column = self.selected_column().unwrap_or_default().to_string();
        let popup = centered(area, 60, 3);
        self.cell_editor.set_block(panel(format!("Edit {column} - [enter] apply, [esc] cancel"), true));
        self.cell_editor.set_style(theme::input());
        f.render_widget(Clear, popup);
        f.render_widget(&self.cell_editor, popup);
    }

    fn render_insert_prompt(&mut self, f: &mut Frame<'_>, area: Rect) {
        let Some(prompt) = self.insert_form.as_ref().and_then(|form| form.next_unanswered()).map(|field| field.prompt())
        else {
            return;
        };
        let popup = centered(area, 60, 5);
        let [prompt_area, input_area] = Layout::vertical([Constraint::Length(2), Constraint::Length(3)]).areas(popup);
        f.render_widget(Clear, popup);
        f.render_widget(Paragraph::new(Text::styled(prompt, theme::warning())).style(theme::input()), prompt_area);
        self.insert_input.set_block(panel("Insert row - [enter] next, [esc] cancel", true));
        self.insert_input.set_style(theme::input());
        f.render_widget(&self.insert_input, input_area);
    }
}
