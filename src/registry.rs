//! Live models, keyed by model name. Owned by the application state and consulted on every
//! data request, so registration and removal take effect without re-mounting routes.

use crate::error::AppError;
use crate::model::{resolve_stored, ResolvedModel};
use crate::sql::Store;
use crate::store;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};

#[derive(Default)]
pub struct ModelRegistry {
    models: RwLock<HashMap<String, Arc<ResolvedModel>>>,
}

impl ModelRegistry {
    pub fn new() -> Self {
        ModelRegistry::default()
    }

    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, Arc<ResolvedModel>>> {
        self.models.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, Arc<ResolvedModel>>> {
        self.models.write().unwrap_or_else(|e| e.into_inner())
    }

    /// Build a registry from every stored definition. Rows whose table name is unusable are skipped.
    pub async fn load(store: &dyn Store) -> Result<Self, AppError> {
        let registry = ModelRegistry::new();
        let stored = store::get_all(store).await?;
        let total = stored.len();
        let resolved: Vec<ResolvedModel> = stored.into_iter().filter_map(resolve_stored).collect();
        let degraded = resolved.iter().filter(|m| m.is_degraded()).count();
        registry.replace_all(resolved);
        tracing::info!(
            models = registry.len(),
            skipped = total - registry.len(),
            degraded,
            "model registry loaded"
        );
        Ok(registry)
    }

    pub fn register(&self, model: ResolvedModel) -> Arc<ResolvedModel> {
        let model = Arc::new(model);
        self.write().insert(model.stored.name.clone(), Arc::clone(&model));
        model
    }

    /// Remove a model. Requests already holding its `Arc` finish against the old definition.
    pub fn deregister(&self, name: &str) -> Option<Arc<ResolvedModel>> {
        self.write().remove(name)
    }

    pub fn get(&self, name: &str) -> Option<Arc<ResolvedModel>> {
        self.read().get(name).cloned()
    }

    pub fn replace_all(&self, models: impl IntoIterator<Item = ResolvedModel>) {
        let fresh: HashMap<_, _> = models
            .into_iter()
            .map(|m| (m.stored.name.clone(), Arc::new(m)))
            .collect();
        *self.write() = fresh;
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::StoredModel;
    use serde_json::json;

    fn resolved(name: &str, minute: u32) -> ResolvedModel {
        let created_at = chrono::NaiveDate::from_ymd_opt(2024, 5, 1)
            .unwrap()
            .and_hms_opt(10, minute, 0)
            .unwrap();
        resolve_stored(StoredModel {
            id: minute as i64,
            name: name.into(),
            table_name: format!("{}s", name.to_lowercase()),
            definition: json!({"fields": []}),
            created_by: None,
            created_by_username: None,
            created_at,
        })
        .unwrap()
    }

    #[test]
    fn register_get_deregister() {
        let registry = ModelRegistry::new();
        assert!(registry.is_empty());
        registry.register(resolved("Task", 1));
        assert_eq!(registry.get("Task").unwrap().definition.table_name, "tasks");
        assert!(registry.get("task").is_none());

        let held = registry.get("Task").unwrap();
        assert!(registry.deregister("Task").is_some());
        assert!(registry.get("Task").is_none());
        assert_eq!(held.stored.name, "Task");
        assert!(registry.deregister("Task").is_none());
    }

    #[test]
    fn replace_all_swaps_the_whole_set() {
        let registry = ModelRegistry::new();
        registry.register(resolved("Old", 0));
        registry.replace_all([resolved("Task", 1), resolved("Note", 5), resolved("Tag", 3)]);
        assert_eq!(registry.len(), 3);
        assert!(registry.get("Old").is_none());
        assert_eq!(registry.get("Note").unwrap().stored.id, 5);
    }
}
