//! Snapshot of every shortcut and category held by a store.

use serde::{Deserialize, Serialize};

use crate::{category::Category, shortcut::Shortcut};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Collection {
    #[serde(default)]
    pub shortcuts: Vec<Shortcut>,
    #[serde(default)]
    pub categories: Vec<Category>,
}

impl Collection {
    pub fn new(shortcuts: Vec<Shortcut>, categories: Vec<Category>) -> Self {
        Self {
            shortcuts,
            categories,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.shortcuts.is_empty() && self.categories.is_empty()
    }

    pub fn shortcut(&self, id: &str) -> Option<&Shortcut> {
        self.shortcuts.iter().find(|shortcut| shortcut.id == id)
    }

    pub fn shortcut_mut(&mut self, id: &str) -> Option<&mut Shortcut> {
        self.shortcuts.iter_mut().find(|shortcut| shortcut.id == id)
    }

    pub fn category(&self, id: &str) -> Option<&Category> {
        self.categories.iter().find(|category| category.id == id)
    }

    pub fn category_mut(&mut self, id: &str) -> Option<&mut Category> {
        self.categories.iter_mut().find(|category| category.id == id)
    }

    /// Finds a category by name, ignoring case and surrounding whitespace.
    pub fn category_by_name(&self, name: &str) -> Option<&Category> {
        let needle = name.trim().to_lowercase();
        self.categories
            .iter()
            .find(|category| category.name.trim().to_lowercase() == needle)
    }

    /// Clears every shortcut reference to `category_id`, returning how many changed.
    pub fn detach_category(&mut self, category_id: &str) -> usize {
        let mut changed = 0;
        for shortcut in &mut self.shortcuts {
            if shortcut.category_id.as_deref() == Some(category_id) {
                shortcut.category_id = None;
                changed += 1;
            }
        }
        changed
    }

    pub fn shortcuts_in(&self, category_id: &str) -> impl Iterator<Item = &Shortcut> + '_ {
        let category_id = category_id.to_string();
        self.shortcuts
            .iter()
            .filter(move |shortcut| shortcut.category_id.as_deref() == Some(category_id.as_str()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ShortcutDraft;

    fn sample() -> Collection {
        let dev = Category::with_id("dev", "Development");
        let a = Shortcut::from_draft(
            "a",
            ShortcutDraft::new("GitHub", "https://github.com").with_category("dev"),
        );
        let b = Shortcut::from_draft(
            "b",
            ShortcutDraft::new("Docs", "https://docs.rs").with_category("dev"),
        );
        let c =
            Shortcut::from_draft("c", ShortcutDraft::new("News", "https://news.ycombinator.com"));
        Collection::new(vec![a, b, c], vec![dev])
    }

    #[test]
    fn detach_category_clears_only_matching_references() {
        let mut collection = sample();
        assert_eq!(collection.shortcuts_in("dev").count(), 2);
        assert_eq!(collection.detach_category("dev"), 2);
        assert!(collection.shortcuts.iter().all(|s| s.category_id.is_none()));
        assert_eq!(collection.detach_category("dev"), 0);
    }

    #[test]
    fn category_lookup_by_name_ignores_case() {
        let collection = sample();
        assert_eq!(
            collection.category_by_name("  development ").map(|c| c.id.as_str()),
            Some("dev")
        );
        assert!(collection.category_by_name("Social").is_none());
    }

    #[test]
    fn deserializes_partial_documents() {
        let collection: Collection =
            serde_json::from_str(r#"{"categories":[{"id":"x","name":"X"}]}"#).unwrap();
        assert!(collection.shortcuts.is_empty());
        assert_eq!(collection.categories.len(), 1);
    }
}
