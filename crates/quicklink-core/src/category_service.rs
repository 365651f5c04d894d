use quicklink_domain::Collection;

use crate::CoreError;

pub struct CategoryService;

impl CategoryService {
    /// Trims `candidate` and rejects empty or duplicate (case-insensitive) names.
    pub fn validate_name(
        collection: &Collection,
        exclude: Option<&str>,
        candidate: &str,
    ) -> Result<String, CoreError> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return Err(CoreError::Validation("category name is required".into()));
        }
        let normalized = trimmed.to_lowercase();
        let duplicate = collection.categories.iter().any(|category| {
            category.name.trim().to_lowercase() == normalized
                && exclude.map_or(true, |id| category.id != id)
        });
        if duplicate {
            Err(CoreError::Validation(format!(
                "Category `{}` already exists",
                trimmed
            )))
        } else {
            Ok(trimmed.to_string())
        }
    }

    /// Resolves a category by id first, then by name.
    pub fn resolve<'a>(
        collection: &'a Collection,
        reference: &str,
    ) -> Result<&'a quicklink_domain::Category, CoreError> {
        collection
            .category(reference.trim())
            .or_else(|| collection.category_by_name(reference))
            .ok_or_else(|| CoreError::CategoryNotFound(reference.to_string()))
    }
}
