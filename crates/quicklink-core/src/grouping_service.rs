use std::collections::HashMap;

use quicklink_domain::{Collection, Shortcut, UNCATEGORIZED_ID};

pub const UNCATEGORIZED_LABEL: &str = "Uncategorized";

/// Shortcuts sharing one category, in display order.
#[derive(Debug, Clone, PartialEq)]
pub struct ShortcutGroup {
    pub category_id: String,
    pub name: String,
    pub shortcuts: Vec<Shortcut>,
}

pub struct GroupingService;

impl GroupingService {
    /// Groups shortcuts by category order, with unknown or missing categories last.
    /// Empty groups are omitted.
    pub fn group(collection: &Collection) -> Vec<ShortcutGroup> {
        let mut buckets: HashMap<&str, Vec<Shortcut>> = collection
            .categories
            .iter()
            .map(|category| (category.id.as_str(), Vec::new()))
            .collect();
        let mut uncategorized = Vec::new();

        for shortcut in &collection.shortcuts {
            match shortcut
                .category_id
                .as_deref()
                .and_then(|id| buckets.get_mut(id))
            {
                Some(bucket) => bucket.push(shortcut.clone()),
                None => uncategorized.push(shortcut.clone()),
            }
        }

        let mut groups: Vec<ShortcutGroup> = collection
            .categories
            .iter()
            .filter_map(|category| {
                let shortcuts = buckets.remove(category.id.as_str())?;
                (!shortcuts.is_empty()).then(|| ShortcutGroup {
                    category_id: category.id.clone(),
                    name: category.name.clone(),
                    shortcuts,
                })
            })
            .collect();

        if !uncategorized.is_empty() {
            groups.push(ShortcutGroup {
                category_id: UNCATEGORIZED_ID.to_string(),
                name: UNCATEGORIZED_LABEL.to_string(),
                shortcuts: uncategorized,
            });
        }
        groups
    }
}

#[cfg(test)]
mod tests {
    use quicklink_domain::{Category, ShortcutDraft};

    use super::*;

    #[test]
    fn groups_follow_category_order_with_uncategorized_last() {
        let collection = Collection::new(
            vec![
                Shortcut::from_draft(
                    "1",
                    ShortcutDraft::new("Orphan", "https://o.example").with_category("gone"),
                ),
                Shortcut::from_draft(
                    "2",
                    ShortcutDraft::new("GitHub", "https://github.com").with_category("dev"),
                ),
                Shortcut::from_draft(
                    "3",
                    ShortcutDraft::new("Google", "https://google.com").with_category("search"),
                ),
                Shortcut::from_draft("4", ShortcutDraft::new("Loose", "https://l.example")),
            ],
            vec![
                Category::with_id("search", "Search"),
                Category::with_id("empty", "Empty"),
                Category::with_id("dev", "Development"),
            ],
        );

        let groups = GroupingService::group(&collection);
        let names: Vec<_> = groups.iter().map(|group| group.name.as_str()).collect();
        assert_eq!(names, vec!["Search", "Development", UNCATEGORIZED_LABEL]);
        let loose: Vec<_> = groups[2].shortcuts.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(loose, vec!["1", "4"]);
    }

    #[test]
    fn empty_collection_has_no_groups() {
        assert!(GroupingService::group(&Collection::default()).is_empty());
    }
}
