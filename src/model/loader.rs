//! Resolve stored definition rows into routable models.

use crate::model::{validate_definition, validate_identifier, ModelDefinition};
use crate::store::StoredModel;
use serde::{Serialize, Serializer};

/// Whether a stored definition parsed cleanly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DefinitionHealth {
    Ok,
    /// Served from the restrictive fallback; carries the parse/validation failure.
    Degraded(String),
}

/// A stored model ready for per-request routing.
#[derive(Clone, Debug, PartialEq)]
pub struct ResolvedModel {
    pub stored: StoredModel,
    pub definition: ModelDefinition,
    pub health: DefinitionHealth,
}

impl ResolvedModel {
    pub fn is_degraded(&self) -> bool {
        matches!(self.health, DefinitionHealth::Degraded(_))
    }

    /// API projection for `/models` responses.
    pub fn view(&self) -> ModelView<'_> {
        ModelView {
            id: self.stored.id,
            name: &self.stored.name,
            table_name: &self.stored.table_name,
            definition: &self.definition,
            created_by: self.stored.created_by,
            created_by_username: self.stored.created_by_username.as_deref(),
            created_at: self.stored.created_at,
            degraded: match &self.health {
                DefinitionHealth::Ok => None,
                DefinitionHealth::Degraded(reason) => Some(reason),
            },
        }
    }
}

impl Serialize for ResolvedModel {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.view().serialize(serializer)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelView<'a> {
    pub id: i64,
    pub name: &'a str,
    pub table_name: &'a str,
    pub definition: &'a ModelDefinition,
    pub created_by: Option<i64>,
    pub created_by_username: Option<&'a str>,
    pub created_at: chrono::NaiveDateTime,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub degraded: Option<&'a str>,
}

/// Parse and re-validate a stored definition. The stored row's name and table name are
/// authoritative. A definition that fails either step is replaced by the restrictive
/// fallback and flagged degraded. Returns None when even the table name is unusable.
pub fn resolve_stored(stored: StoredModel) -> Option<ResolvedModel> {
    if let Err(e) = validate_identifier(&stored.table_name) {
        tracing::warn!(model = %stored.name, error = %e, "skipping stored model with unusable table name");
        return None;
    }

    let parsed = serde_json::from_value::<ModelDefinition>(stored.definition.clone())
        .map_err(|e| e.to_string())
        .map(|mut def| {
            def.name = stored.name.clone();
            def.table_name = stored.table_name.clone();
            def
        })
        .and_then(|def| validate_definition(&def).map(|_| def).map_err(|e| e.to_string()));

    let (definition, health) = match parsed {
        Ok(def) => (def, DefinitionHealth::Ok),
        Err(reason) => {
            tracing::warn!(model = %stored.name, %reason, "stored definition is corrupt; serving restrictive fallback");
            (
                ModelDefinition::restrictive_fallback(&stored.name, &stored.table_name),
                DefinitionHealth::Degraded(reason),
            )
        }
    };
    Some(ResolvedModel {
        stored,
        definition,
        health,
    })
}
