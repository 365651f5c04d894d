use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use predicates::str::contains;
use regex::Regex;
use tempfile::TempDir;

const CLOUD_ENV: &[&str] = &[
    "SUPABASE_URL",
    "SUPABASE_ANON_KEY",
    "FIREBASE_DATABASE_URL",
    "FIREBASE_AUTH_TOKEN",
    "SHEETS_SPREADSHEET_ID",
    "SHEETS_ACCESS_TOKEN",
    "QUICKLINK_STORAGE_MODE",
];

fn script(home: &Path) -> Command {
    let mut cmd = Command::cargo_bin("quicklink_cli").unwrap();
    cmd.env("QUICKLINK_CLI_SCRIPT", "1")
        .env("QUICKLINK_HOME", home)
        .env("NO_COLOR", "1")
        .env_remove("QUICKLINK_TODAY");
    for key in CLOUD_ENV {
        cmd.env_remove(key);
    }
    cmd
}

fn run(home: &Path, input: &str) -> String {
    let output = script(home).write_stdin(input.to_string()).output().unwrap();
    assert!(output.status.success());
    String::from_utf8(output.stdout).unwrap()
}

#[test]
fn script_mode_adds_and_lists_shortcuts() {
    let home = TempDir::new().unwrap();
    script(home.path())
        .write_stdin(
            "category add Dev Tools\n\
             shortcut add GitHub github.com --category \"dev tools\"\n\
             shortcut add \"Rust Docs\" https://doc.rust-lang.org\n\
             list\n\
             shortcut show github\n\
             exit\n",
        )
        .assert()
        .success()
        .stdout(contains("Category `Dev Tools` added"))
        .stdout(contains("Shortcut `GitHub` added"))
        .stdout(contains("=== Dev Tools (1) ==="))
        .stdout(contains("=== Uncategorized (1) ==="))
        .stdout(contains("https://github.com"));

    let json = std::fs::read_to_string(home.path().join("data").join("quicklink.json")).unwrap();
    assert!(json.contains("\"Rust Docs\""));
    assert!(json.contains("\"schema_version\": 1"));
}

#[test]
fn removing_a_category_uncategorizes_its_shortcuts() {
    let home = TempDir::new().unwrap();
    script(home.path())
        .write_stdin(
            "category add Video\n\
             shortcut add Netflix netflix.com --category video\n\
             category remove Video --yes\n\
             list\n",
        )
        .assert()
        .success()
        .stdout(contains("Category `Video` removed."))
        .stdout(contains("1 shortcut(s) moved to Uncategorized."))
        .stdout(contains("=== Uncategorized (1) ==="));
}

#[test]
fn due_and_summary_follow_the_pinned_date() {
    let home = TempDir::new().unwrap();
    script(home.path())
        .env("QUICKLINK_TODAY", "2024-02-10")
        .write_stdin("seed\ndue 7\nsummary\n")
        .assert()
        .success()
        .stdout(contains("Loaded sample data: 6 categories and 20 shortcuts."))
        .stdout(contains("Notion"))
        .stdout(contains("2024-02-12"))
        .stdout(contains("Netflix").not())
        .stdout(contains("Summary for February 2024"))
        .stdout(predicate::str::is_match(r"Subscriptions:\s+14").unwrap());
}

#[test]
fn seed_refuses_a_populated_store() {
    let home = TempDir::new().unwrap();
    script(home.path())
        .write_stdin("shortcut add Mine https://example.com\nseed\n")
        .assert()
        .success()
        .stdout(contains("sample data is only loaded into an empty store"));
}

#[test]
fn backup_then_restore_rolls_back_changes() {
    let home = TempDir::new().unwrap();
    let first = run(
        home.path(),
        "shortcut add Alpha https://alpha.dev\n\
         backup before beta\n\
         shortcut add Beta https://beta.dev\n",
    );
    let id_pattern = Regex::new(r"(quicklink_\d{8}_\d{6}(?:-\d+)?_before-beta\.json)").unwrap();
    let backup_id = id_pattern
        .captures(&first)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .expect("backup id in output");

    script(home.path())
        .write_stdin(format!("backups\nrestore {}\nshortcut list\n", backup_id))
        .assert()
        .success()
        .stdout(contains(backup_id.as_str()))
        .stdout(contains("Restored 1 shortcuts and 0 categories"))
        .stdout(contains("Alpha"))
        .stdout(contains("Beta").not());
}

#[test]
fn export_then_import_merges_without_duplicates() {
    let source = TempDir::new().unwrap();
    let target = TempDir::new().unwrap();
    let export_path = source.path().join("export.json");

    run(
        source.path(),
        &format!("seed\nexport \"{}\"\n", export_path.display()),
    );
    assert!(export_path.is_file());

    script(target.path())
        .write_stdin(format!(
            "import \"{0}\"\nimport \"{0}\"\n",
            export_path.display()
        ))
        .assert()
        .success()
        .stdout(contains("Imported 6 categories and 20 shortcuts."))
        .stdout(contains("Nothing new to add"));
}

#[test]
fn cloud_mode_without_credentials_falls_back_to_local() {
    let home = TempDir::new().unwrap();
    script(home.path())
        .write_stdin("config set storage_mode firebase\nstorage\n")
        .assert()
        .success()
        .stdout(contains("Updated `storage_mode`."))
        .stdout(contains("storage unavailable"))
        .stdout(contains("Storage: local"))
        .stdout(contains("credentials are missing"));

    let config = std::fs::read_to_string(home.path().join("config").join("config.json")).unwrap();
    assert!(config.contains("firebase"));
}

#[test]
fn unknown_commands_get_a_suggestion() {
    let home = TempDir::new().unwrap();
    script(home.path())
        .write_stdin("lsit\nhelp due\n")
        .assert()
        .success()
        .stdout(contains("Unknown command `lsit`"))
        .stdout(contains("Suggestion: `list`?"))
        .stdout(contains("Help: due"));
}
