use crossterm::event::{KeyCode, KeyEvent, KeyModifiers};
use pretty_assertions::assert_eq;
use table_crafter::{
    action::Action,
    components::browser::Browser,
    mode::Mode,
    query::{QueryFailure, QueryPanel},
    schema::ColumnSet,
    session::InsertForm,
};

use crate::test_utils::{
    fixtures::{loaded_session, notes_fields, sample_tables, users_api},
    ComponentTestHarness,
};

fn key(c: char) -> KeyEvent {
    KeyEvent::new(KeyCode::Char(c), KeyModifiers::NONE)
}

async fn browser_with_users() -> ComponentTestHarness<Browser> {
    let session = loaded_session(users_api(), "users").await;
    let mut harness = ComponentTestHarness::new(Browser::new()).unwrap();
    harness.update(Action::TablesLoaded(sample_tables())).unwrap();
    harness.update(Action::ShowTable(Box::new(session.view().clone()))).unwrap();
    harness.dispatch(Action::FocusGrid).unwrap();
    harness
}

#[test]
fn empty_screen_asks_for_a_table() {
    let mut harness = ComponentTestHarness::new(Browser::new()).unwrap();
    let screen = harness.render().unwrap();
    assert!(screen.contains("Table Crafter"));
    assert!(screen.contains("No tables"));
    assert!(screen.contains("Please select a table"));
}

#[test]
fn table_list_navigation_selects_a_table() {
    let mut harness = ComponentTestHarness::new(Browser::new()).unwrap();
    harness.update(Action::TablesLoaded(sample_tables())).unwrap();
    harness.update(Action::TableMoveDown).unwrap();
    assert_eq!(harness.update(Action::LoadSelectedTable).unwrap(), Some(Action::SelectTable("notes".to_string())));

    harness.update(Action::TableMoveUp).unwrap();
    harness.update(Action::TableMoveUp).unwrap();
    assert_eq!(harness.component.selected_table(), Some("audit_log"));

    let screen = harness.render().unwrap();
    assert!(screen.contains("users"));
    assert!(screen.contains("audit_log"));
}

#[tokio::test]
async fn loaded_rows_are_drawn() {
    let mut harness = browser_with_users().await;
    assert_eq!(harness.component.mode, Mode::Grid);

    let screen = harness.render().unwrap();
    assert!(screen.contains("users (2 rows)"));
    assert!(screen.contains("Grace"));
    assert!(screen.contains("Linus"));
    assert!(screen.contains("created"));
}

#[tokio::test]
async fn key_columns_cannot_be_opened_for_editing() {
    let mut harness = browser_with_users().await;
    assert_eq!(
        harness.update(Action::StartEdit).unwrap(),
        Some(Action::Error("Column 'id' is part of the primary key and cannot be edited".to_string()))
    );
}

#[tokio::test]
async fn committed_cell_edit_is_sent_to_the_app() {
    let mut harness = browser_with_users().await;
    harness.update(Action::ColumnRight).unwrap();
    assert_eq!(harness.dispatch(Action::StartEdit).unwrap(), vec![Action::EnterMode(Mode::EditCell)]);

    harness.send_key_event(key('!')).unwrap();
    let screen = harness.render().unwrap();
    assert!(screen.contains("Edit name"));

    assert_eq!(harness.dispatch(Action::CommitInput).unwrap(), vec![Action::EnterMode(Mode::Grid)]);
    let row = harness.component.view.rows[0].token;
    assert_eq!(
        harness.collect_actions(),
        vec![Action::EditCell { row, column: "name".to_string(), value: "Grace!".to_string() }]
    );
    assert_eq!(harness.component.mode, Mode::Grid);
}

#[tokio::test]
async fn bound_keys_are_not_typed_into_the_editor() {
    let mut harness = browser_with_users().await;
    harness.update(Action::ColumnRight).unwrap();
    harness.dispatch(Action::StartEdit).unwrap();

    harness.send_key_event(KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)).unwrap();
    harness.dispatch(Action::CommitInput).unwrap();
    let row = harness.component.view.rows[0].token;
    assert_eq!(
        harness.collect_actions(),
        vec![Action::EditCell { row, column: "name".to_string(), value: "Grace".to_string() }]
    );
}

#[tokio::test]
async fn delete_needs_a_second_press_on_the_same_row() {
    let mut harness = browser_with_users().await;
    assert_eq!(harness.update(Action::RequestDelete).unwrap(), None);
    assert_eq!(harness.component.status.as_ref().unwrap().text, "Press d again to delete row 1");

    harness.update(Action::RowMoveDown).unwrap();
    assert_eq!(harness.update(Action::RequestDelete).unwrap(), None);
    let second = harness.component.view.rows[1].token;
    assert_eq!(harness.update(Action::RequestDelete).unwrap(), Some(Action::DeleteRow(second)));
    assert_eq!(harness.component.pending_delete, None);
}

#[tokio::test]
async fn insert_prompts_for_required_columns_only() {
    let mut harness = browser_with_users().await;
    let columns: ColumnSet = notes_fields().into_iter().collect();
    let form = InsertForm::new("notes", &columns);

    assert_eq!(
        harness.dispatch(Action::InsertFormReady(Box::new(form))).unwrap(),
        vec![Action::EnterMode(Mode::Insert)]
    );
    let screen = harness.render().unwrap();
    assert!(screen.contains("Enter value for required column 'name'"));

    for c in "Ada".chars() {
        harness.send_key_event(key(c)).unwrap();
    }
    let Some(Action::SubmitInsert(submitted)) = harness.update(Action::CommitInput).unwrap() else {
        panic!("form was not submitted");
    };
    assert!(submitted.is_complete());
    assert_eq!(submitted.fields[0].value.as_deref(), Some("Ada"));
    assert_eq!(submitted.fields[1].value, None);
    assert_eq!(harness.collect_actions(), vec![Action::EnterMode(Mode::Grid)]);
}

#[tokio::test]
async fn form_without_questions_is_submitted_immediately() {
    let mut harness = browser_with_users().await;
    let columns: ColumnSet = notes_fields().into_iter().filter(|f| f.field != "name").collect();
    let form = InsertForm::new("notes", &columns);

    let returned = harness.update(Action::InsertFormReady(Box::new(form.clone()))).unwrap();
    assert_eq!(returned, Some(Action::SubmitInsert(Box::new(form))));
}

#[test]
fn query_failures_show_the_traceback() {
    let mut harness = ComponentTestHarness::new(Browser::new()).unwrap();
    let panel = QueryPanel {
        failure: Some(QueryFailure {
            message: "Unknown column 'nme'".to_string(),
            traceback: Some("File \"app.py\", line 10".to_string()),
        }),
        ..QueryPanel::default()
    };
    harness.update(Action::ShowQuery(Box::new(panel))).unwrap();

    let status = harness.component.status.clone().unwrap();
    assert!(status.is_error);
    assert_eq!(status.text, "Unknown column 'nme'");

    let screen = harness.render().unwrap();
    assert!(screen.contains("Error: Unknown column 'nme'"));
    assert!(screen.contains("Traceback:"));
}

#[test]
fn translated_sql_can_be_edited_and_executed() {
    let mut harness = ComponentTestHarness::new(Browser::new()).unwrap();
    assert_eq!(harness.update(Action::FocusSql).unwrap(), None);

    let panel = QueryPanel {
        translated_sql: Some("SELECT * FROM users".to_string()),
        placeholder: Some("No results found".to_string()),
        ..QueryPanel::default()
    };
    harness.update(Action::ShowQuery(Box::new(panel))).unwrap();
    assert_eq!(harness.dispatch(Action::FocusSql).unwrap(), vec![Action::EnterMode(Mode::Sql)]);

    for c in " LIMIT 5".chars() {
        harness.send_key_event(key(c)).unwrap();
    }
    assert_eq!(
        harness.update(Action::CommitInput).unwrap(),
        Some(Action::RunDirect("SELECT * FROM users LIMIT 5".to_string()))
    );
    assert!(harness.render().unwrap().contains("No results found"));
}

#[test]
fn query_text_is_sent_with_the_input_kind() {
    let mut harness = ComponentTestHarness::new(Browser::new()).unwrap();
    harness.dispatch(Action::FocusQuery).unwrap();
    for c in "SELECT 1".chars() {
        harness.send_key_event(key(c)).unwrap();
    }
    harness.update(Action::ToggleNaturalLanguage).unwrap();
    assert_eq!(
        harness.update(Action::CommitInput).unwrap(),
        Some(Action::RunQuery { text: "SELECT 1".to_string(), natural_language: false })
    );
}
