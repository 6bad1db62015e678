//! Safe SQL builder: identifiers from code only, values as parameters.

mod builder;
mod condition;
pub mod params;
mod query;
pub use builder::*;
pub use condition::*;
pub use params::*;
pub use query::*;
