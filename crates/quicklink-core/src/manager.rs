use std::sync::Arc;

use quicklink_domain::{Category, Collection, Shortcut, ShortcutDraft};
use tracing::{debug, info};

use crate::{
    sample_collection, CategoryService, Clock, CoreError, GroupingService, PaymentService,
    ShortcutGroup, ShortcutService, ShortcutStore, SyncPlanner, SyncReport, SystemClock,
    UpcomingPayment,
};

/// Facade that validates requests and forwards them to the active store.
#[derive(Clone)]
pub struct ShortcutManager {
    store: Arc<dyn ShortcutStore>,
    clock: Arc<dyn Clock>,
}

impl ShortcutManager {
    pub fn new(store: Arc<dyn ShortcutStore>) -> Self {
        Self::with_clock(store, Arc::new(SystemClock))
    }

    pub fn with_clock(store: Arc<dyn ShortcutStore>, clock: Arc<dyn Clock>) -> Self {
        Self { store, clock }
    }

    pub fn store(&self) -> &dyn ShortcutStore {
        self.store.as_ref()
    }

    pub fn clock(&self) -> &dyn Clock {
        self.clock.as_ref()
    }

    pub fn collection(&self) -> Result<Collection, CoreError> {
        self.store.load_collection()
    }

    pub fn shortcut(&self, id: &str) -> Result<Shortcut, CoreError> {
        self.store
            .list_shortcuts()?
            .into_iter()
            .find(|shortcut| shortcut.id == id)
            .ok_or_else(|| CoreError::ShortcutNotFound(id.to_string()))
    }

    pub fn add_shortcut(&self, draft: ShortcutDraft) -> Result<Shortcut, CoreError> {
        let draft = self.resolve_category(ShortcutService::prepare(draft)?)?;
        let shortcut = self.store.add_shortcut(draft)?;
        info!(id = %shortcut.id, backend = self.store.backend_name(), "shortcut added");
        Ok(shortcut)
    }

    /// Replaces every field of shortcut `id` with `draft`.
    pub fn update_shortcut(&self, id: &str, draft: ShortcutDraft) -> Result<Shortcut, CoreError> {
        self.shortcut(id)?;
        let draft = self.resolve_category(ShortcutService::prepare(draft)?)?;
        let shortcut = Shortcut::from_draft(id, draft);
        self.store.update_shortcut(&shortcut)?;
        info!(id, backend = self.store.backend_name(), "shortcut updated");
        Ok(shortcut)
    }

    pub fn remove_shortcut(&self, id: &str) -> Result<(), CoreError> {
        self.store.delete_shortcut(id)?;
        info!(id, backend = self.store.backend_name(), "shortcut removed");
        Ok(())
    }

    pub fn add_category(&self, name: &str) -> Result<Category, CoreError> {
        let collection = self.store.load_collection()?;
        let name = CategoryService::validate_name(&collection, None, name)?;
        let category = self.store.add_category(&name)?;
        info!(id = %category.id, backend = self.store.backend_name(), "category added");
        Ok(category)
    }

    pub fn rename_category(&self, reference: &str, name: &str) -> Result<Category, CoreError> {
        let collection = self.store.load_collection()?;
        let id = CategoryService::resolve(&collection, reference)?.id.clone();
        let name = CategoryService::validate_name(&collection, Some(&id), name)?;
        self.store.update_category(&id, &name)?;
        Ok(Category::with_id(id, name))
    }

    pub fn remove_category(&self, reference: &str) -> Result<Category, CoreError> {
        let collection = self.store.load_collection()?;
        let category = CategoryService::resolve(&collection, reference)?.clone();
        self.store.delete_category(&category.id)?;
        info!(id = %category.id, backend = self.store.backend_name(), "category removed");
        Ok(category)
    }

    pub fn groups(&self) -> Result<Vec<ShortcutGroup>, CoreError> {
        Ok(GroupingService::group(&self.store.load_collection()?))
    }

    pub fn monthly_total(&self) -> Result<f64, CoreError> {
        let shortcuts = self.store.list_shortcuts()?;
        Ok(PaymentService::monthly_total(&shortcuts, self.clock.today()))
    }

    pub fn upcoming(&self, within_days: i64) -> Result<Vec<UpcomingPayment>, CoreError> {
        let shortcuts = self.store.list_shortcuts()?;
        Ok(PaymentService::upcoming(&shortcuts, self.clock.today(), within_days))
    }

    pub fn is_due_soon(&self, shortcut: &Shortcut) -> bool {
        PaymentService::shortcut_due_soon(shortcut, self.clock.today())
    }

    /// Merges `incoming` into the store, skipping records that already exist.
    pub fn import(&self, incoming: &Collection) -> Result<SyncReport, CoreError> {
        let current = self.store.load_collection()?;
        let plan = SyncPlanner::plan(incoming, &current);
        debug!(
            categories = plan.categories.len(),
            shortcuts = plan.shortcuts.len(),
            skipped = plan.skipped,
            "import planned"
        );
        plan.apply(self.store.as_ref())
    }

    /// Loads the starter data set; only allowed on an empty store.
    pub fn seed_sample(&self) -> Result<SyncReport, CoreError> {
        if !self.store.load_collection()?.is_empty() {
            return Err(CoreError::Validation(
                "store already contains data; sample data is only loaded into an empty store"
                    .into(),
            ));
        }
        self.import(&sample_collection())
    }

    fn resolve_category(&self, mut draft: ShortcutDraft) -> Result<ShortcutDraft, CoreError> {
        if let Some(reference) = draft.category_id.take() {
            let collection = self.store.load_collection()?;
            let category = CategoryService::resolve(&collection, &reference)?;
            draft.category_id = Some(category.id.clone());
        }
        Ok(draft)
    }
}
