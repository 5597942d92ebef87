use std::fs;

use pretty_assertions::assert_eq;
use serial_test::serial;
use table_crafter::{
    action::Action,
    config::{parse_key_sequence, Config, DEFAULT_BASE_URL},
    mode::Mode,
};
use tempfile::TempDir;

#[test]
fn defaults_bind_the_grid_commands() {
    let config = Config::defaults().unwrap();
    assert_eq!(config.api.base_url, DEFAULT_BASE_URL);

    let grid = config.keybindings.get(&Mode::Grid).unwrap();
    assert_eq!(grid.get(&parse_key_sequence("<d>").unwrap()), Some(&Action::RequestDelete));
    assert_eq!(grid.get(&parse_key_sequence("<enter>").unwrap()), Some(&Action::StartEdit));

    let query = config.keybindings.get(&Mode::Query).unwrap();
    assert_eq!(query.get(&parse_key_sequence("<ctrl-n>").unwrap()), Some(&Action::ToggleNaturalLanguage));
    assert_eq!(query.get(&parse_key_sequence("<q>").unwrap()), None);
}

// The config directory is resolved once per process, so this is the only
// test that may point it somewhere.
#[test]
#[serial]
fn user_file_overrides_api_and_extends_bindings() {
    let dir = TempDir::new().unwrap();
    fs::write(
        dir.path().join("config.json5"),
        r#"{
            "api": { "base_url": "http://db.internal:8080" },
            "keybindings": { "Grid": { "<x>": "RequestDelete" } },
        }"#,
    )
    .unwrap();
    std::env::set_var("TABLE_CRAFTER_CONFIG", dir.path());

    let config = Config::new().unwrap();
    std::env::remove_var("TABLE_CRAFTER_CONFIG");

    assert_eq!(config.api.base_url, "http://db.internal:8080");
    let grid = config.keybindings.get(&Mode::Grid).unwrap();
    assert_eq!(grid.get(&parse_key_sequence("<x>").unwrap()), Some(&Action::RequestDelete));
    assert_eq!(grid.get(&parse_key_sequence("<ctrl-s>").unwrap()), Some(&Action::SubmitUpdates));
    assert_eq!(config.config.config_dir, dir.path());
}
