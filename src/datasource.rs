//! Connection parameters and their rendering into a driver-specific DSN.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::OrmError;
use crate::helpers::map_to_string;
use crate::types::Driver;

/// Pool limits applied when [`Db`](crate::db::Db) builds its connection pool.
///
/// Unset fields keep the backend's own defaults.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum number of open connections
    pub max_open_conns: Option<u32>,
    /// Idle connections the pool opens up front and keeps warm, capped at the pool size.
    ///
    /// bb8 and sqlx offer a floor on idle connections, not a ceiling; idle connections
    /// beyond it are reaped by `conn_max_idle_time`.
    pub min_idle_conns: Option<u32>,
    /// Maximum time a connection may be reused
    #[serde(with = "duration_secs")]
    pub conn_max_lifetime: Option<Duration>,
    /// Maximum time a connection may sit idle
    #[serde(with = "duration_secs")]
    pub conn_max_idle_time: Option<Duration>,
}

/// Structured connection parameters, before rendering to a DSN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DataSource {
    pub user: String,
    pub password: String,
    pub net: String,
    pub host: String,
    pub port: u16,
    pub db_name: String,
    pub params: BTreeMap<String, String>,
    pub driver: Driver,
    pub pool: PoolConfig,
}

impl Default for DataSource {
    fn default() -> Self {
        Self {
            user: String::new(),
            password: String::new(),
            net: "tcp".to_string(),
            host: "localhost".to_string(),
            port: 3306,
            db_name: String::new(),
            params: BTreeMap::new(),
            driver: Driver::Mysql,
            pool: PoolConfig::default(),
        }
    }
}

impl DataSource {
    #[must_use]
    pub fn builder() -> DataSourceBuilder {
        DataSourceBuilder::new()
    }

    /// Parse a JSON document; missing fields take the defaults.
    ///
    /// # Errors
    /// Returns `OrmError::ConfigError` if the document is not a valid data source.
    pub fn from_json(json: &str) -> Result<Self, OrmError> {
        serde_json::from_str(json)
            .map_err(|e| OrmError::ConfigError(format!("invalid data source: {e}")))
    }

    /// Render the driver-specific connection string.
    ///
    /// MySQL: `user:password@net(host:port)/dbname?k1=v1&k2=v2`.
    /// `SQLite`: the database path, or a `file:` URI when params are present.
    #[must_use]
    pub fn dsn(&self) -> String {
        let params = map_to_string(&self.params);
        match self.driver {
            Driver::Mysql => format!(
                "{}:{}@{}({}:{})/{}?{}",
                self.user, self.password, self.net, self.host, self.port, self.db_name, params
            ),
            Driver::Sqlite if params.is_empty() => self.db_name.clone(),
            Driver::Sqlite => format!("file:{}?{}", self.db_name, params),
        }
    }
}

/// Fluent builder for [`DataSource`]; every setter overrides one default.
#[derive(Debug, Clone, Default)]
pub struct DataSourceBuilder {
    ds: DataSource,
}

impl DataSourceBuilder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn user(mut self, user: impl Into<String>) -> Self {
        self.ds.user = user.into();
        self
    }

    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.ds.password = password.into();
        self
    }

    #[must_use]
    pub fn net(mut self, net: impl Into<String>) -> Self {
        self.ds.net = net.into();
        self
    }

    #[must_use]
    pub fn host(mut self, host: impl Into<String>) -> Self {
        self.ds.host = host.into();
        self
    }

    #[must_use]
    pub fn port(mut self, port: u16) -> Self {
        self.ds.port = port;
        self
    }

    #[must_use]
    pub fn db_name(mut self, db_name: impl Into<String>) -> Self {
        self.ds.db_name = db_name.into();
        self
    }

    /// Replace all params.
    #[must_use]
    pub fn params(mut self, params: BTreeMap<String, String>) -> Self {
        self.ds.params = params;
        self
    }

    /// Add or overwrite a single param.
    #[must_use]
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.ds.params.insert(key.into(), value.into());
        self
    }

    #[must_use]
    pub fn driver(mut self, driver: Driver) -> Self {
        self.ds.driver = driver;
        self
    }

    #[must_use]
    pub fn pool(mut self, pool: PoolConfig) -> Self {
        self.ds.pool = pool;
        self
    }

    #[must_use]
    pub fn max_open_conns(mut self, n: u32) -> Self {
        self.ds.pool.max_open_conns = Some(n);
        self
    }

    #[must_use]
    pub fn min_idle_conns(mut self, n: u32) -> Self {
        self.ds.pool.min_idle_conns = Some(n);
        self
    }

    #[must_use]
    pub fn conn_max_lifetime(mut self, d: Duration) -> Self {
        self.ds.pool.conn_max_lifetime = Some(d);
        self
    }

    #[must_use]
    pub fn conn_max_idle_time(mut self, d: Duration) -> Self {
        self.ds.pool.conn_max_idle_time = Some(d);
        self
    }

    #[must_use]
    pub fn build(self) -> DataSource {
        self.ds
    }
}

mod duration_secs {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    #[allow(clippy::ref_option)]
    pub(super) fn serialize<S: Serializer>(
        value: &Option<Duration>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(d) => serializer.serialize_some(&d.as_secs()),
            None => serializer.serialize_none(),
        }
    }

    pub(super) fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<Duration>, D::Error> {
        Ok(Option::<u64>::deserialize(deserializer)?.map(Duration::from_secs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let ds = DataSource::default();
        assert_eq!(ds.user, "");
        assert_eq!(ds.password, "");
        assert_eq!(ds.net, "tcp");
        assert_eq!(ds.host, "localhost");
        assert_eq!(ds.port, 3306);
        assert_eq!(ds.db_name, "");
        assert_eq!(ds.driver, Driver::Mysql);
        assert_eq!(DataSource::builder().build(), ds);
    }

    #[test]
    fn builder_overrides() {
        let ds = DataSource::builder()
            .user("testuser")
            .password("testpass")
            .net("unix")
            .host("/var/run/mysql.sock")
            .port(1234)
            .db_name("testdb")
            .build();
        assert_eq!(ds.user, "testuser");
        assert_eq!(ds.password, "testpass");
        assert_eq!(ds.net, "unix");
        assert_eq!(ds.host, "/var/run/mysql.sock");
        assert_eq!(ds.port, 1234);
        assert_eq!(ds.db_name, "testdb");
        assert_eq!(ds.driver, Driver::Mysql);
    }

    #[test]
    fn mysql_dsn() {
        let ds = DataSource {
            user: "testuser".into(),
            password: "testpassword".into(),
            db_name: "testdb".into(),
            params: BTreeMap::from([("charset".to_string(), "utf8mb4".to_string())]),
            ..DataSource::default()
        };
        assert_eq!(
            ds.dsn(),
            "testuser:testpassword@tcp(localhost:3306)/testdb?charset=utf8mb4"
        );
    }

    #[test]
    fn sqlite_dsn() {
        let ds = DataSource::builder()
            .driver(Driver::Sqlite)
            .db_name("/tmp/app.db")
            .build();
        assert_eq!(ds.dsn(), "/tmp/app.db");

        let ds = DataSource::builder()
            .driver(Driver::Sqlite)
            .db_name("/tmp/app.db")
            .param("mode", "ro")
            .build();
        assert_eq!(ds.dsn(), "file:/tmp/app.db?mode=ro");
    }

    #[test]
    fn from_json_fills_defaults() {
        let ds = DataSource::from_json(
            r#"{"user":"root","db_name":"orm","pool":{"max_open_conns":4,"min_idle_conns":2,"conn_max_lifetime":30}}"#,
        )
        .unwrap();
        assert_eq!(ds.user, "root");
        assert_eq!(ds.host, "localhost");
        assert_eq!(ds.port, 3306);
        assert_eq!(ds.pool.max_open_conns, Some(4));
        assert_eq!(ds.pool.min_idle_conns, Some(2));
        assert_eq!(ds.pool.conn_max_lifetime, Some(Duration::from_secs(30)));
        assert_eq!(ds.pool.conn_max_idle_time, None);

        assert!(matches!(
            DataSource::from_json(r#"{"driver":"oracle"}"#),
            Err(OrmError::ConfigError(_))
        ));
    }
}
