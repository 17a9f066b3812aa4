pub mod compile;
pub mod dates;
pub mod filter;
pub mod schema;
pub mod time_serde;
pub mod validate;

mod error;

pub use compile::{DatabaseDirectory, DatabaseRegistry, QueryCompiler};
pub use error::{Error, Result};
pub use filter::{CompiledQuery, FilterSpec, LeafFilter, SortDirection, SortSpec};
pub use schema::{DatabaseSchema, Property, SelectOption, Snapshot};
