// MySQL backend over sqlx's async pool.
//
// - config: connect options and pool limits from a DataSource
// - params: positional argument binding
// - query: row extraction
// - executor: statement execution against the pool

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{connect, connect_options};
pub use executor::{execute_dml, execute_select, ping};
pub use query::build_result_set;
