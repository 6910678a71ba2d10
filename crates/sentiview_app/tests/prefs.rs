use std::fs;

use pretty_assertions::assert_eq;
use sentiview_app::prefs::{Preferences, PrefsStore, PREFS_FILENAME};
use sentiview_client::TokenStore;
use tempfile::TempDir;

fn init_logging() {
    static INIT: std::sync::Once = std::sync::Once::new();
    INIT.call_once(sentiview_logging::initialize_for_tests);
}

#[test]
fn missing_file_yields_defaults() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = PrefsStore::new(&temp.path().join("state"));

    let prefs = store.load();
    assert_eq!(prefs, Preferences::default());
    assert_eq!(prefs.theme(), "gruvbox-dark");
}

#[test]
fn saved_preferences_round_trip_and_replace_the_file() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = PrefsStore::new(temp.path());

    store.update(|prefs| prefs.theme_id = "nord".into());
    let updated = store.update(|prefs| prefs.token = Some("abc".into()));

    assert_eq!(updated.theme_id, "nord");
    assert_eq!(store.load(), updated);
    assert_eq!(store.path(), temp.path().join(PREFS_FILENAME));
    // Only the preferences file is left behind; no temp files.
    assert_eq!(fs::read_dir(temp.path()).unwrap().count(), 1);
}

#[test]
fn corrupt_file_falls_back_to_defaults() {
    init_logging();
    let temp = TempDir::new().unwrap();
    fs::write(temp.path().join(PREFS_FILENAME), "(token: Some(").unwrap();

    let store = PrefsStore::new(temp.path());
    assert_eq!(store.load(), Preferences::default());
}

#[test]
fn unknown_theme_reads_as_default() {
    let prefs = Preferences {
        token: None,
        theme_id: "neon".into(),
    };
    assert_eq!(prefs.theme(), "gruvbox-dark");
}

#[test]
fn token_changes_are_written_through() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = PrefsStore::new(temp.path());
    let tokens = TokenStore::new().on_change(store.token_hook());

    tokens.set("secret");
    assert_eq!(store.load().token.as_deref(), Some("secret"));

    assert!(tokens.clear());
    assert_eq!(store.load().token, None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn token_cleared_from_a_runtime_task_is_written_through() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let store = PrefsStore::new(temp.path());
    let tokens = TokenStore::new().on_change(store.token_hook());
    tokens.set("secret");

    let cleared = tokio::spawn({
        let tokens = tokens.clone();
        async move { tokens.clear() }
    })
    .await
    .unwrap();

    assert!(cleared);
    assert_eq!(store.load().token, None);
}

#[test]
fn unwritable_state_dir_is_logged_not_fatal() {
    init_logging();
    let temp = TempDir::new().unwrap();
    let blocker = temp.path().join("not_a_dir");
    fs::write(&blocker, "x").unwrap();

    let store = PrefsStore::new(&blocker);
    store.save(&Preferences::default());
    assert_eq!(store.load(), Preferences::default());
    assert_eq!(fs::read_to_string(&blocker).unwrap(), "x");
}
