//! Domain types representing shortcut categories.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::common::*;

/// User-defined label used to group shortcuts.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Category {
    pub id: String,
    pub name: String,
}

impl Category {
    pub fn new(name: impl Into<String>) -> Self {
        Self::with_id(generate_category_id(), name)
    }

    pub fn with_id(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
        }
    }
}

impl Identifiable for Category {
    fn id(&self) -> &str {
        &self.id
    }
}

impl NamedEntity for Category {
    fn name(&self) -> &str {
        &self.name
    }
}

impl Displayable for Category {
    fn display_label(&self) -> String {
        format!("{} [{}]", self.name, self.id)
    }
}

/// Generates an id for a category created in local storage.
pub fn generate_category_id() -> String {
    format!("cat_{}", Uuid::new_v4().simple())
}
