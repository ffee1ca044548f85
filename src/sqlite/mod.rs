// SQLite backend: a bb8 pool of rusqlite connections, with all blocking calls
// moved onto tokio's blocking thread pool.
//
// - config: pool manager and the blocking-call helper
// - params: bind argument conversion
// - query: row extraction and result set building
// - executor: statement execution against the pool

pub mod config;
pub mod executor;
pub mod params;
pub mod query;

pub use config::{SharedSqliteConnection, SqliteManager, SqlitePool};
pub use executor::{execute_dml, execute_select, ping};
pub use query::build_result_set;
