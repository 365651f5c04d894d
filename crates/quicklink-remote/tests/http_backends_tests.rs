mod support;

use std::time::Duration;

use quicklink_core::{CoreError, DocumentBackend, ShortcutStore};
use quicklink_domain::{Collection, Shortcut, ShortcutDraft};
use quicklink_remote::{
    ConnectionMode, ConnectionProbe, FirebaseSettings, FirebaseStore, SheetsBackend, SheetsSettings,
    SupabaseSettings, SupabaseStore,
};
use support::StubServer;

const PROBE_TIMEOUT: Duration = Duration::from_secs(2);

fn firebase(server: &StubServer) -> FirebaseStore {
    let settings =
        FirebaseSettings::validate(Some(&server.base_url), Some("tok")).expect("settings");
    FirebaseStore::new(settings, PROBE_TIMEOUT).expect("store")
}

fn supabase(server: &StubServer) -> SupabaseStore {
    let settings = SupabaseSettings {
        url: server.base_url.clone(),
        anon_key: "eyJa.eyJb.sig".into(),
        user_id: "u1".into(),
    };
    SupabaseStore::new(settings, PROBE_TIMEOUT).expect("store")
}

fn sheets(server: &StubServer) -> SheetsBackend {
    let settings = SheetsSettings {
        api_base: format!("{}/v4/spreadsheets", server.base_url),
        spreadsheet_id: "sheet1".into(),
        access_token: "tok".into(),
    };
    SheetsBackend::new(settings, PROBE_TIMEOUT).expect("backend")
}

#[test]
fn firebase_push_uses_generated_key_as_id() {
    let server = StubServer::start(vec![(200, r#"{"name":"-Nabc"}"#)]);
    let store = firebase(&server);

    let shortcut = store
        .add_shortcut(ShortcutDraft::new("Spotify", "https://spotify.com"))
        .expect("push shortcut");
    assert_eq!(shortcut.id, "-Nabc");

    let requests = server.requests();
    assert_eq!(requests[0].method, "POST");
    assert_eq!(requests[0].target, "/shortcuts.json?auth=tok");
    assert!(requests[0].body.contains(r#""name":"Spotify""#));
    assert!(!requests[0].body.contains(r#""id""#));
}

#[test]
fn firebase_lists_newest_first_and_handles_null() {
    let server = StubServer::start(vec![
        (
            200,
            concat!(
                r#"{"-N1":{"name":"A","url":"https://a.com"},"#,
                r#""-N2":{"name":"B","url":"https://b.com","categoryId":"c1"}}"#,
            ),
        ),
        (200, "null"),
    ]);
    let store = firebase(&server);

    let shortcuts = store.list_shortcuts().expect("list shortcuts");
    let names: Vec<_> = shortcuts.iter().map(|s| s.name.as_str()).collect();
    assert_eq!(names, vec!["B", "A"]);
    assert_eq!(shortcuts[0].category_id.as_deref(), Some("c1"));

    assert!(store.list_categories().expect("list categories").is_empty());
}

#[test]
fn firebase_category_delete_clears_references_in_one_update() {
    let server = StubServer::start(vec![
        (200, r#"{"name":"Work"}"#),
        (
            200,
            concat!(
                r#"{"-N1":{"name":"Slack","url":"https://slack.com","categoryId":"c1"},"#,
                r#""-N2":{"name":"Mail","url":"https://mail.com"}}"#,
            ),
        ),
        (200, "{}"),
    ]);
    let store = firebase(&server);

    store.delete_category("c1").expect("delete category");

    let requests = server.requests();
    assert_eq!(requests.len(), 3);
    assert_eq!(requests[2].method, "PATCH");
    assert_eq!(requests[2].target, "/.json?auth=tok");
    assert!(requests[2].body.contains("shortcuts/-N1/categoryId"));
    assert!(requests[2].body.contains("categories/c1"));
    assert!(!requests[2].body.contains("-N2"));
}

#[test]
fn firebase_update_of_missing_record_is_not_found() {
    let server = StubServer::start(vec![(200, "null")]);
    let store = firebase(&server);
    let ghost = Shortcut::from_draft("-Nghost", ShortcutDraft::new("Ghost", "https://ghost.io"));

    let err = store.update_shortcut(&ghost).unwrap_err();
    assert!(matches!(err, CoreError::ShortcutNotFound(_)));
}

#[test]
fn firebase_probe_reports_rejections() {
    let server = StubServer::start(vec![(401, r#"{"error":"Permission denied"}"#)]);
    let status = firebase(&server).probe();
    assert!(!status.connected);
    assert_eq!(status.mode, ConnectionMode::Local);
    assert!(status.error.unwrap_or_default().contains("permission denied"));
    assert_eq!(server.requests()[0].target, "/.info/connected.json?auth=tok");
}

#[test]
fn supabase_scopes_requests_to_user_and_asks_for_rows() {
    let server =
        StubServer::start(vec![(201, r#"[{"id":"c-1","name":"Work","user_id":"u1"}]"#)]);
    let store = supabase(&server);

    let category = store.add_category("Work").expect("add category");
    assert_eq!(category.id, "c-1");

    let request = &server.requests()[0];
    assert_eq!(request.method, "POST");
    assert_eq!(request.target, "/rest/v1/categories");
    assert_eq!(request.header("prefer"), Some("return=representation"));
    assert_eq!(request.header("apikey"), Some("eyJa.eyJb.sig"));
    assert!(request.body.contains(r#""user_id":"u1""#));
}

#[test]
fn supabase_category_delete_detaches_shortcuts_first() {
    let server =
        StubServer::start(vec![(200, "[]"), (200, r#"[{"id":"c-1","name":"Work"}]"#)]);
    let store = supabase(&server);

    store.delete_category("c-1").expect("delete category");

    let requests = server.requests();
    assert_eq!(requests[0].method, "PATCH");
    assert!(requests[0].target.starts_with("/rest/v1/shortcuts?"));
    assert!(requests[0].target.contains("user_id=eq.u1"));
    assert!(requests[0].target.contains("category_id=eq.c-1"));
    assert!(requests[0].body.contains(r#""category_id":null"#));
    assert_eq!(requests[1].method, "DELETE");
    assert!(requests[1].target.contains("id=eq.c-1"));
}

#[test]
fn supabase_update_without_rows_is_not_found() {
    let server = StubServer::start(vec![(200, "[]")]);
    let store = supabase(&server);
    let ghost = Shortcut::from_draft("missing", ShortcutDraft::new("Ghost", "https://ghost.io"));

    assert!(matches!(
        store.update_shortcut(&ghost),
        Err(CoreError::ShortcutNotFound(_))
    ));
}

#[test]
fn supabase_server_errors_are_backend_failures() {
    let server = StubServer::start(vec![(500, r#"{"message":"boom"}"#)]);
    let err = supabase(&server).list_categories().unwrap_err();
    assert!(err.is_backend_failure());
}

#[test]
fn sheets_load_reads_both_ranges() {
    let body = r#"{
        "spreadsheetId": "sheet1",
        "valueRanges": [
            {"range": "Shortcuts!A1:G3", "values": [
                ["id", "name", "url", "paymentDate", "paymentAmount",
                 "paymentFrequency", "categoryId"],
                ["s1", "Netflix", "https://netflix.com", "2024-01-22", 15.49, "monthly", "c1"]
            ]},
            {"range": "Categories!A1:B2", "values": [["id", "name"], ["c1", "Entertainment"]]}
        ]
    }"#;
    let server = StubServer::start(vec![(200, body)]);
    let backend = sheets(&server);

    let collection = backend.load().expect("load sheets");
    assert_eq!(collection.shortcuts.len(), 1);
    assert_eq!(collection.categories[0].name, "Entertainment");
    assert!(collection.shortcuts[0].is_subscription());

    let request = &server.requests()[0];
    assert!(request.target.starts_with("/v4/spreadsheets/sheet1/values:batchGet?"));
    assert!(request.target.contains("ranges=Shortcuts"));
    assert_eq!(request.header("authorization"), Some("Bearer tok"));
}

#[test]
fn sheets_save_clears_then_writes_user_entered_rows() {
    let server = StubServer::start(vec![(200, "{}"), (200, "{}")]);
    let backend = sheets(&server);
    let collection = Collection::new(
        vec![Shortcut::from_draft("s1", ShortcutDraft::new("Google", "https://google.com"))],
        Vec::new(),
    );

    backend.save(&collection).expect("save sheets");

    let requests = server.requests();
    assert!(requests[0].target.ends_with("/values:batchClear"));
    assert!(requests[1].target.ends_with("/values:batchUpdate"));
    assert!(requests[1].body.contains("USER_ENTERED"));
    assert!(requests[1].body.contains("Shortcuts!A1"));
}

#[test]
fn sheets_save_of_empty_collection_only_clears() {
    let server = StubServer::start(vec![(200, "{}")]);
    sheets(&server).save(&Collection::default()).expect("save empty");
    assert_eq!(server.requests().len(), 1);
}
