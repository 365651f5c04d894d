use std::sync::Arc;

use chrono::NaiveDate;

use crate::{CoreError, FixedClock, MemoryStore, ShortcutManager};
use quicklink_domain::{PaymentFrequency, ShortcutDraft};

fn manager_on(date: NaiveDate) -> ShortcutManager {
    ShortcutManager::with_clock(
        Arc::new(MemoryStore::in_memory("memory")),
        Arc::new(FixedClock::on(date)),
    )
}

fn jan(day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, day).unwrap()
}

#[test]
fn manager_normalizes_and_links_categories_by_name() {
    let manager = manager_on(jan(1));
    let category = manager.add_category("  AI Tools ").expect("add category");
    assert_eq!(category.name, "AI Tools");

    let shortcut = manager
        .add_shortcut(ShortcutDraft::new("Claude", "claude.ai").with_category("ai tools"))
        .expect("add shortcut");
    assert_eq!(shortcut.url, "https://claude.ai");
    assert_eq!(shortcut.category_id.as_deref(), Some(category.id.as_str()));
}

#[test]
fn manager_rejects_unknown_category_and_duplicates() {
    let manager = manager_on(jan(1));
    let err = manager
        .add_shortcut(ShortcutDraft::new("Claude", "claude.ai").with_category("missing"))
        .unwrap_err();
    assert!(matches!(err, CoreError::CategoryNotFound(_)));

    manager.add_category("Music").expect("add category");
    assert!(matches!(manager.add_category("music"), Err(CoreError::Validation(_))));
}

#[test]
fn update_replaces_fields_and_keeps_id() {
    let manager = manager_on(jan(1));
    let original = manager
        .add_shortcut(ShortcutDraft::new("Spotify", "spotify.com").with_payment(
            jan(14),
            9.99,
            PaymentFrequency::Monthly,
        ))
        .expect("add shortcut");

    let updated = manager
        .update_shortcut(&original.id, ShortcutDraft::new("Spotify Family", "https://spotify.com"))
        .expect("update shortcut");
    assert_eq!(updated.id, original.id);
    assert!(!updated.is_subscription());
    assert_eq!(manager.shortcut(&original.id).unwrap().name, "Spotify Family");
    assert!(matches!(
        manager.update_shortcut("missing", ShortcutDraft::new("x", "x.example")),
        Err(CoreError::ShortcutNotFound(_))
    ));
}

#[test]
fn removing_category_uncategorizes_its_shortcuts() {
    let manager = manager_on(jan(1));
    manager.add_category("Work").unwrap();
    let shortcut = manager
        .add_shortcut(ShortcutDraft::new("Slack", "slack.com").with_category("Work"))
        .unwrap();

    let removed = manager.remove_category("work").expect("remove by name");
    assert_eq!(removed.name, "Work");
    assert_eq!(manager.shortcut(&shortcut.id).unwrap().category_id, None);

    let groups = manager.groups().unwrap();
    assert_eq!(groups.len(), 1);
    assert_eq!(groups[0].name, crate::UNCATEGORIZED_LABEL);
}

#[test]
fn seed_loads_sample_only_into_empty_store() {
    let manager = manager_on(jan(10));
    let report = manager.seed_sample().expect("seed");
    assert_eq!(report.categories, 6);
    assert_eq!(report.shortcuts, 20);
    assert!(matches!(manager.seed_sample(), Err(CoreError::Validation(_))));

    let due: Vec<_> = manager
        .upcoming(7)
        .unwrap()
        .into_iter()
        .map(|payment| payment.name)
        .collect();
    assert_eq!(due, vec!["X (Twitter)", "Notion", "Spotify", "ChatGPT", "YouTube"]);
}

#[test]
fn monthly_total_uses_clock_month() {
    let manager = manager_on(NaiveDate::from_ymd_opt(2024, 3, 1).unwrap());
    manager
        .add_shortcut(ShortcutDraft::new("Amazon", "amazon.com").with_payment(
            NaiveDate::from_ymd_opt(2023, 3, 15).unwrap(),
            139.0,
            PaymentFrequency::Yearly,
        ))
        .unwrap();
    manager
        .add_shortcut(ShortcutDraft::new("Todoist", "todoist.com").with_payment(
            jan(8),
            4.0,
            PaymentFrequency::Monthly,
        ))
        .unwrap();
    assert_eq!(manager.monthly_total().unwrap(), 143.0);
}
