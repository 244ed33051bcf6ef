//! Safe SQL builder: identifiers from validated definitions only, values as parameters.

mod builder;
pub mod executor;
pub mod params;
pub use builder::*;
pub use executor::*;
pub use params::*;
