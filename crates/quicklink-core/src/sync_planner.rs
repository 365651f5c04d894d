//! Local-to-cloud reconciliation.

use quicklink_domain::{Category, Collection, Shortcut};
use tracing::{info, warn};

use crate::{CategoryService, CoreError, ShortcutService, ShortcutStore};

/// Records that exist locally but not in the target store.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncPlan {
    pub categories: Vec<Category>,
    /// Normalized the same way as user input.
    pub shortcuts: Vec<Shortcut>,
    /// Local records left out because they fail validation.
    pub skipped: usize,
    local_categories: Vec<Category>,
}

/// Counts of records handled by [`SyncPlan::apply`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub categories: usize,
    pub shortcuts: usize,
    pub skipped: usize,
}

impl SyncReport {
    /// Nothing was created.
    pub fn is_empty(&self) -> bool {
        self.categories == 0 && self.shortcuts == 0
    }
}

pub struct SyncPlanner;

impl SyncPlanner {
    /// Categories are matched by case-insensitive name, shortcuts by their (name, url) pair.
    /// Duplicates inside `local` collapse to the first occurrence.
    pub fn plan(local: &Collection, remote: &Collection) -> SyncPlan {
        let mut skipped = 0;

        let mut known = Collection::new(Vec::new(), remote.categories.clone());
        let mut categories = Vec::new();
        for category in &local.categories {
            if category.name.trim().is_empty() {
                warn!(category = %category.id, "skipping category without a name");
                skipped += 1;
                continue;
            }
            let Ok(name) = CategoryService::validate_name(&known, None, &category.name) else {
                continue;
            };
            let planned = Category {
                name,
                ..category.clone()
            };
            known.categories.push(planned.clone());
            categories.push(planned);
        }

        let mut shortcuts: Vec<Shortcut> = Vec::new();
        for candidate in &local.shortcuts {
            let draft = match ShortcutService::prepare(candidate.to_draft()) {
                Ok(draft) => draft,
                Err(err) => {
                    warn!(shortcut = %candidate.name, error = %err, "skipping invalid shortcut");
                    skipped += 1;
                    continue;
                }
            };
            let present = remote
                .shortcuts
                .iter()
                .chain(shortcuts.iter())
                .any(|existing| existing.name == draft.name && existing.url == draft.url);
            if !present {
                shortcuts.push(Shortcut::from_draft(candidate.id.clone(), draft));
            }
        }

        SyncPlan {
            categories,
            shortcuts,
            skipped,
            local_categories: local.categories.clone(),
        }
    }
}

impl SyncPlan {
    pub fn is_empty(&self) -> bool {
        self.categories.is_empty() && self.shortcuts.is_empty()
    }

    /// Maps a local category reference onto the target's category with the same name.
    pub fn remap_category(
        &self,
        local_id: Option<&str>,
        remote_categories: &[Category],
    ) -> Option<String> {
        let local = self
            .local_categories
            .iter()
            .find(|category| Some(category.id.as_str()) == local_id)?;
        let needle = local.name.trim().to_lowercase();
        remote_categories
            .iter()
            .find(|category| category.name.trim().to_lowercase() == needle)
            .map(|category| category.id.clone())
    }

    /// Creates the planned records in `target`, categories first.
    pub fn apply(&self, target: &dyn ShortcutStore) -> Result<SyncReport, CoreError> {
        let mut report = SyncReport {
            skipped: self.skipped,
            ..SyncReport::default()
        };
        for category in &self.categories {
            target.add_category(&category.name)?;
            report.categories += 1;
        }
        if !self.shortcuts.is_empty() {
            let remote_categories = target.list_categories()?;
            for shortcut in &self.shortcuts {
                let mut draft = shortcut.to_draft();
                draft.category_id =
                    self.remap_category(shortcut.category_id.as_deref(), &remote_categories);
                if shortcut.category_id.is_some() && draft.category_id.is_none() {
                    warn!(
                        shortcut = %shortcut.name,
                        "category missing on sync target; uploading uncategorized"
                    );
                }
                target.add_shortcut(draft)?;
                report.shortcuts += 1;
            }
        }
        info!(
            backend = target.backend_name(),
            categories = report.categories,
            shortcuts = report.shortcuts,
            skipped = report.skipped,
            "sync completed"
        );
        Ok(report)
    }
}
