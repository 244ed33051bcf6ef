//! Generic CRUD execution for a resolved model, with ownership scoping applied to every statement.

use crate::error::AppError;
use crate::identity::Identity;
use crate::model::ModelDefinition;
use crate::permission::{owner_scope, OwnerScope};
use crate::service::RequestValidator;
use crate::sql::{self, Store};
use serde_json::{Map, Value};

pub struct CrudService;

impl CrudService {
    /// Rows visible to the caller, newest first. Absent limit/offset returns everything.
    pub async fn list(
        store: &dyn Store,
        def: &ModelDefinition,
        caller: &Identity,
        limit: Option<u32>,
        offset: Option<u32>,
    ) -> Result<Vec<Value>, AppError> {
        let scope = owner_scope(def, caller);
        let q = sql::select_list(def, scope.as_ref(), limit, offset);
        store.fetch_all(&q).await
    }

    /// One row by id. Absent and not-owned are both NotFound.
    pub async fn read(
        store: &dyn Store,
        def: &ModelDefinition,
        caller: &Identity,
        id: i64,
    ) -> Result<Value, AppError> {
        let scope = owner_scope(def, caller);
        let q = sql::select_by_id(def, id, scope.as_ref());
        store
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| not_found(def))
    }

    /// Insert one row. The owner column is always the caller; declared defaults fill absent fields.
    pub async fn create(
        store: &dyn Store,
        def: &ModelDefinition,
        caller: &Identity,
        body: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        RequestValidator::validate(def, body)?;
        let mut values = Map::new();
        for field in &def.fields {
            match body.get(&field.name) {
                Some(v) if !v.is_null() => {
                    values.insert(field.name.clone(), v.clone());
                }
                _ => {
                    if let Some(default) = &field.default {
                        values.insert(field.name.clone(), default.clone());
                    }
                }
            }
        }
        let owner_id = def.owner_field.as_ref().map(|_| caller.id);
        let q = sql::insert(def, &values, owner_id);
        store
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| AppError::Persistence(format!("insert into {} returned no row", def.table_name)))
    }

    /// Guard select, then update the present non-null fields. The mutation repeats the
    /// ownership predicate; zero affected rows is NotFound.
    pub async fn update(
        store: &dyn Store,
        def: &ModelDefinition,
        caller: &Identity,
        id: i64,
        body: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        RequestValidator::validate_partial(def, body)?;
        let scope = owner_scope(def, caller);
        Self::guard(store, def, id, scope.as_ref()).await?;
        let values: Map<String, Value> = body
            .iter()
            .filter(|(k, v)| !v.is_null() && def.field(k).is_some())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        let q = sql::update(def, id, &values, scope.as_ref());
        store
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| not_found(def))
    }

    /// Guard select, then delete. Returns the removed row.
    pub async fn delete(
        store: &dyn Store,
        def: &ModelDefinition,
        caller: &Identity,
        id: i64,
    ) -> Result<Value, AppError> {
        let scope = owner_scope(def, caller);
        Self::guard(store, def, id, scope.as_ref()).await?;
        let q = sql::delete(def, id, scope.as_ref());
        store
            .fetch_optional(&q)
            .await?
            .ok_or_else(|| not_found(def))
    }

    async fn guard(
        store: &dyn Store,
        def: &ModelDefinition,
        id: i64,
        scope: Option<&OwnerScope<'_>>,
    ) -> Result<(), AppError> {
        let q = sql::select_guard(def, id, scope);
        match store.fetch_optional(&q).await? {
            Some(_) => Ok(()),
            None => Err(not_found(def)),
        }
    }
}

fn not_found(def: &ModelDefinition) -> AppError {
    AppError::NotFound(format!("{} not found", def.name))
}
