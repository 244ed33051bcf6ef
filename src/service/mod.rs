//! Services behind the handlers: model lifecycle and generic record CRUD.

mod crud;
mod models;
mod validation;
pub use crud::CrudService;
pub use models::{CreatedModel, ModelService};
pub use validation::RequestValidator;
