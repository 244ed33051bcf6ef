//! Schemaforge: runtime-defined models become permission-checked REST resources on PostgreSQL.

pub mod error;
pub mod extractors;
pub mod handlers;
pub mod identity;
pub mod migration;
pub mod mirror;
pub mod model;
pub mod permission;
pub mod registry;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;
pub mod store;

pub use error::{AppError, ConfigError, DefinitionError};
pub use identity::{Identity, IdentityProvider, JwtIdentity};
pub use mirror::FileMirror;
pub use model::{ModelDefinition, ResolvedModel};
pub use registry::ModelRegistry;
pub use response::{success_many, success_one, success_one_ok, Envelope, Meta};
pub use routes::{api_router, common_routes, data_routes, model_routes};
pub use service::{CrudService, ModelService};
pub use settings::Settings;
pub use sql::{PgStore, Store};
pub use state::AppState;
pub use store::ensure_sys_tables;
