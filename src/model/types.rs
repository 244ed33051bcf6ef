//! Model definition types as submitted by operators and persisted in `model_definitions`.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

/// Role that bypasses both action checks and ownership filtering.
pub const ADMIN_ROLE: &str = "Admin";

/// Closed set of abstract field kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    String,
    Text,
    Number,
    Integer,
    Boolean,
    Date,
    Json,
}

impl FieldKind {
    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::String => "string",
            FieldKind::Text => "text",
            FieldKind::Number => "number",
            FieldKind::Integer => "integer",
            FieldKind::Boolean => "boolean",
            FieldKind::Date => "date",
            FieldKind::Json => "json",
        }
    }
}

/// CRUD action a generated route performs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub fn as_str(self) -> &'static str {
        match self {
            Action::Create => "create",
            Action::Read => "read",
            Action::Update => "update",
            Action::Delete => "delete",
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One entry of a role's grant list: an action or the `all` wildcard.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Grant {
    Create,
    Read,
    Update,
    Delete,
    All,
}

impl Grant {
    pub fn covers(self, action: Action) -> bool {
        matches!(
            (self, action),
            (Grant::All, _)
                | (Grant::Create, Action::Create)
                | (Grant::Read, Action::Read)
                | (Grant::Update, Action::Update)
                | (Grant::Delete, Action::Delete)
        )
    }
}

/// Role name to granted actions.
pub type Rbac = BTreeMap<String, BTreeSet<Grant>>;

/// Grants applied when a definition is submitted without `rbac`.
pub fn default_rbac() -> Rbac {
    use Grant::*;
    Rbac::from([
        (ADMIN_ROLE.to_string(), BTreeSet::from([Create, Read, Update, Delete])),
        ("Manager".to_string(), BTreeSet::from([Create, Read, Update])),
        ("Viewer".to_string(), BTreeSet::from([Read])),
    ])
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct FieldSpec {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub unique: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
}

/// Definition body accepted by `POST /models`. The table name is always derived, never submitted.
#[derive(Clone, Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinitionInput {
    pub name: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub owner_field: Option<String>,
    #[serde(default)]
    pub rbac: Option<Rbac>,
}

/// A validated model definition. Immutable after creation.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelDefinition {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub table_name: String,
    pub fields: Vec<FieldSpec>,
    #[serde(default)]
    pub owner_field: Option<String>,
    #[serde(default)]
    pub rbac: Rbac,
}

impl ModelDefinition {
    pub fn field(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Least-privilege stand-in for a stored definition that no longer parses:
    /// no fields, no ownership, no grants (only Admin passes).
    pub fn restrictive_fallback(name: &str, table_name: &str) -> Self {
        ModelDefinition {
            name: name.to_string(),
            table_name: table_name.to_string(),
            fields: Vec::new(),
            owner_field: None,
            rbac: Rbac::new(),
        }
    }
}

/// Physical table name for a model: lowercased name plus a trailing "s".
pub fn table_name_for(model_name: &str) -> String {
    format!("{}s", model_name.to_lowercase())
}
