use std::sync::{Mutex, MutexGuard};

use quicklink_domain::{Category, Collection, Shortcut, ShortcutDraft};

use crate::CoreError;

/// Common shape implemented by every persistence backend.
pub trait ShortcutStore: Send + Sync {
    fn backend_name(&self) -> &str;
    fn list_shortcuts(&self) -> Result<Vec<Shortcut>, CoreError>;
    fn list_categories(&self) -> Result<Vec<Category>, CoreError>;
    fn add_shortcut(&self, draft: ShortcutDraft) -> Result<Shortcut, CoreError>;
    fn update_shortcut(&self, shortcut: &Shortcut) -> Result<(), CoreError>;
    fn delete_shortcut(&self, id: &str) -> Result<(), CoreError>;
    fn add_category(&self, name: &str) -> Result<Category, CoreError>;
    fn update_category(&self, id: &str, name: &str) -> Result<(), CoreError>;
    /// Removes the category and clears every shortcut reference to it.
    fn delete_category(&self, id: &str) -> Result<(), CoreError>;

    fn load_collection(&self) -> Result<Collection, CoreError> {
        Ok(Collection::new(self.list_shortcuts()?, self.list_categories()?))
    }
}

/// Backends that persist the whole collection in a single read / write.
pub trait DocumentBackend: Send + Sync {
    fn name(&self) -> &str;
    fn load(&self) -> Result<Collection, CoreError>;
    fn save(&self, collection: &Collection) -> Result<(), CoreError>;
}

/// Implements [`ShortcutStore`] on top of a [`DocumentBackend`] by load-modify-save.
pub struct DocumentStore<B> {
    backend: B,
    write_lock: Mutex<()>,
}

impl<B: DocumentBackend> DocumentStore<B> {
    pub fn new(backend: B) -> Self {
        Self {
            backend,
            write_lock: Mutex::new(()),
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Overwrites the stored collection.
    pub fn replace(&self, collection: &Collection) -> Result<(), CoreError> {
        let _guard = self.lock()?;
        self.backend.save(collection)
    }

    fn lock(&self) -> Result<MutexGuard<'_, ()>, CoreError> {
        self.write_lock
            .lock()
            .map_err(|_| CoreError::Storage("document store lock poisoned".into()))
    }

    fn modify<T>(
        &self,
        change: impl FnOnce(&mut Collection) -> Result<T, CoreError>,
    ) -> Result<T, CoreError> {
        let _guard = self.lock()?;
        let mut collection = self.backend.load()?;
        let outcome = change(&mut collection)?;
        self.backend.save(&collection)?;
        Ok(outcome)
    }
}

impl<B: DocumentBackend> ShortcutStore for DocumentStore<B> {
    fn backend_name(&self) -> &str {
        self.backend.name()
    }

    fn list_shortcuts(&self) -> Result<Vec<Shortcut>, CoreError> {
        Ok(self.backend.load()?.shortcuts)
    }

    fn list_categories(&self) -> Result<Vec<Category>, CoreError> {
        Ok(self.backend.load()?.categories)
    }

    fn load_collection(&self) -> Result<Collection, CoreError> {
        self.backend.load()
    }

    fn add_shortcut(&self, draft: ShortcutDraft) -> Result<Shortcut, CoreError> {
        self.modify(|collection| {
            let shortcut = Shortcut::from_draft(quicklink_domain::generate_shortcut_id(), draft);
            collection.shortcuts.insert(0, shortcut.clone());
            Ok(shortcut)
        })
    }

    fn update_shortcut(&self, shortcut: &Shortcut) -> Result<(), CoreError> {
        self.modify(|collection| {
            let slot = collection
                .shortcut_mut(&shortcut.id)
                .ok_or_else(|| CoreError::ShortcutNotFound(shortcut.id.clone()))?;
            *slot = shortcut.clone();
            Ok(())
        })
    }

    fn delete_shortcut(&self, id: &str) -> Result<(), CoreError> {
        self.modify(|collection| {
            let before = collection.shortcuts.len();
            collection.shortcuts.retain(|shortcut| shortcut.id != id);
            if collection.shortcuts.len() == before {
                return Err(CoreError::ShortcutNotFound(id.to_string()));
            }
            Ok(())
        })
    }

    fn add_category(&self, name: &str) -> Result<Category, CoreError> {
        self.modify(|collection| {
            let category = Category::new(name);
            collection.categories.push(category.clone());
            Ok(category)
        })
    }

    fn update_category(&self, id: &str, name: &str) -> Result<(), CoreError> {
        self.modify(|collection| {
            let category = collection
                .category_mut(id)
                .ok_or_else(|| CoreError::CategoryNotFound(id.to_string()))?;
            category.name = name.to_string();
            Ok(())
        })
    }

    fn delete_category(&self, id: &str) -> Result<(), CoreError> {
        self.modify(|collection| {
            let before = collection.categories.len();
            collection.categories.retain(|category| category.id != id);
            if collection.categories.len() == before {
                return Err(CoreError::CategoryNotFound(id.to_string()));
            }
            collection.detach_category(id);
            Ok(())
        })
    }
}

/// Volatile backend used by tests and previews.
#[derive(Default)]
pub struct MemoryBackend {
    name: String,
    data: Mutex<Collection>,
}

impl MemoryBackend {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_collection(name, Collection::default())
    }

    pub fn with_collection(name: impl Into<String>, collection: Collection) -> Self {
        Self {
            name: name.into(),
            data: Mutex::new(collection),
        }
    }
}

impl DocumentBackend for MemoryBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn load(&self) -> Result<Collection, CoreError> {
        self.data
            .lock()
            .map(|data| data.clone())
            .map_err(|_| CoreError::Storage("memory backend lock poisoned".into()))
    }

    fn save(&self, collection: &Collection) -> Result<(), CoreError> {
        let mut data = self
            .data
            .lock()
            .map_err(|_| CoreError::Storage("memory backend lock poisoned".into()))?;
        *data = collection.clone();
        Ok(())
    }
}

pub type MemoryStore = DocumentStore<MemoryBackend>;

impl MemoryStore {
    pub fn in_memory(name: impl Into<String>) -> Self {
        DocumentStore::new(MemoryBackend::new(name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_shortcuts_are_inserted_first() {
        let store = MemoryStore::in_memory("memory");
        store.add_shortcut(ShortcutDraft::new("First", "https://a.example")).unwrap();
        let second = store.add_shortcut(ShortcutDraft::new("Second", "https://b.example")).unwrap();
        let shortcuts = store.list_shortcuts().unwrap();
        assert_eq!(shortcuts.len(), 2);
        assert_eq!(shortcuts[0].id, second.id);
    }

    #[test]
    fn deleting_category_detaches_shortcuts() {
        let store = MemoryStore::in_memory("memory");
        let category = store.add_category("Tools").unwrap();
        let shortcut = store
            .add_shortcut(
                ShortcutDraft::new("Figma", "https://figma.com").with_category(&category.id),
            )
            .unwrap();

        store.delete_category(&category.id).unwrap();

        let collection = store.load_collection().unwrap();
        assert!(collection.categories.is_empty());
        assert_eq!(collection.shortcut(&shortcut.id).unwrap().category_id, None);
    }

    #[test]
    fn missing_records_report_not_found() {
        let store = MemoryStore::in_memory("memory");
        assert!(matches!(store.delete_shortcut("nope"), Err(CoreError::ShortcutNotFound(_))));
        assert!(matches!(store.update_category("nope", "x"), Err(CoreError::CategoryNotFound(_))));
        assert!(matches!(store.delete_category("nope"), Err(CoreError::CategoryNotFound(_))));
        let ghost = quicklink_domain::Shortcut::new("Ghost", "https://ghost.example");
        assert!(matches!(store.update_shortcut(&ghost), Err(CoreError::ShortcutNotFound(_))));
    }
}
