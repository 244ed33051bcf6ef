//! Model definitions: types, identifier validation, and loading of stored definitions.

pub mod types;
pub mod validator;
pub mod loader;

pub use types::*;
pub use validator::*;
pub use loader::*;
