//! Model lifecycle: validate, synthesize the table, persist, mirror, register; and the reverse.

use crate::error::{AppError, DefinitionError};
use crate::identity::Identity;
use crate::migration::synthesize_table;
use crate::mirror::FileMirror;
use crate::model::{build_definition, resolve_stored, ModelDefinitionInput, ResolvedModel};
use crate::registry::ModelRegistry;
use crate::sql::Store;
use crate::store;
use serde_json::Value;
use std::path::PathBuf;
use std::sync::Arc;

/// A freshly created model and where its mirror snapshot landed (None when the write failed).
pub struct CreatedModel {
    pub model: Arc<ResolvedModel>,
    pub file_path: Option<PathBuf>,
}

pub struct ModelService;

impl ModelService {
    pub async fn create(
        store: &dyn Store,
        registry: &ModelRegistry,
        mirror: &FileMirror,
        caller: &Identity,
        body: Value,
    ) -> Result<CreatedModel, AppError> {
        let input: ModelDefinitionInput =
            serde_json::from_value(body).map_err(|e| DefinitionError::Malformed(e.to_string()))?;
        let def = build_definition(input)?;

        if store::find_conflict(store, &def.name, &def.table_name).await?.is_some() {
            return Err(AppError::Validation(format!("model '{}' already exists", def.name)));
        }

        let ddl = synthesize_table(&def)?;
        let stored = store::persist(store, &ddl, &def, caller.id).await?;
        let file_path = mirror.write_best_effort(&def).await;

        let resolved = resolve_stored(stored).ok_or_else(|| {
            AppError::Persistence(format!("stored model '{}' could not be resolved", def.name))
        })?;
        let model = registry.register(resolved);
        tracing::info!(model = %def.name, table = %def.table_name, created_by = caller.id, "model created");
        Ok(CreatedModel { model, file_path })
    }

    /// Drop the table, delete the definition row, remove the mirror file, deregister.
    pub async fn delete(
        store: &dyn Store,
        registry: &ModelRegistry,
        mirror: &FileMirror,
        name: &str,
    ) -> Result<(), AppError> {
        let stored = store::get_by_name(store, name)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("model '{}' not found", name)))?;
        store::delete(store, &stored).await?;
        mirror.remove(&stored.name).await;
        registry.deregister(&stored.name);
        tracing::info!(model = %stored.name, table = %stored.table_name, "model deleted");
        Ok(())
    }
}
