use sqlx::mysql::{MySqlConnectOptions, MySqlPool, MySqlPoolOptions};

use crate::datasource::{DataSource, PoolConfig};
use crate::error::OrmError;

/// Translate a [`DataSource`] into sqlx connect options.
///
/// `net = "unix"` treats `host` as the socket path. The `charset` and `collation` params
/// are honored; any other param is ignored with a warning.
#[must_use]
pub fn connect_options(ds: &DataSource) -> MySqlConnectOptions {
    let mut options = MySqlConnectOptions::new()
        .username(&ds.user)
        .password(&ds.password)
        .database(&ds.db_name);

    options = if ds.net == "unix" {
        options.socket(&ds.host)
    } else {
        options.host(&ds.host).port(ds.port)
    };

    for (key, value) in &ds.params {
        match key.as_str() {
            "charset" => options = options.charset(value),
            "collation" => options = options.collation(value),
            other => tracing::warn!(param = other, "ignoring unsupported mysql data source param"),
        }
    }

    options
}

/// Open a pool for `ds`, applying the configured limits.
///
/// # Errors
/// Returns `OrmError::MysqlError` if the server cannot be reached.
pub async fn connect(ds: &DataSource) -> Result<MySqlPool, OrmError> {
    let pool = pool_options(&ds.pool)
        .connect_with(connect_options(ds))
        .await?;
    tracing::info!(host = %ds.host, port = ds.port, db = %ds.db_name, "connected to mysql");
    Ok(pool)
}

fn pool_options(config: &PoolConfig) -> MySqlPoolOptions {
    let mut options = MySqlPoolOptions::new();
    if let Some(max) = config.max_open_conns.filter(|&n| n > 0) {
        options = options.max_connections(max);
    }
    if let Some(idle) = config.min_idle_conns {
        let cap = options.get_max_connections();
        options = options.min_connections(idle.min(cap));
    }
    options
        .max_lifetime(config.conn_max_lifetime)
        .idle_timeout(config.conn_max_idle_time)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_limits() {
        let config = PoolConfig {
            max_open_conns: Some(4),
            min_idle_conns: Some(2),
            ..PoolConfig::default()
        };
        let options = pool_options(&config);
        assert_eq!(options.get_max_connections(), 4);
        assert_eq!(options.get_min_connections(), 2);

        let config = PoolConfig {
            max_open_conns: Some(3),
            min_idle_conns: Some(8),
            ..PoolConfig::default()
        };
        assert_eq!(pool_options(&config).get_min_connections(), 3);

        let options = pool_options(&PoolConfig::default());
        assert_eq!(options.get_min_connections(), 0);
    }

    #[test]
    fn options_follow_data_source() {
        let ds = DataSource::builder()
            .user("root")
            .password("secret")
            .host("db.internal")
            .port(3307)
            .db_name("orm")
            .param("charset", "utf8mb4")
            .build();
        let options = connect_options(&ds);
        assert_eq!(options.get_host(), "db.internal");
        assert_eq!(options.get_port(), 3307);
        assert_eq!(options.get_username(), "root");
        assert_eq!(options.get_database(), Some("orm"));
        assert_eq!(options.get_charset(), "utf8mb4");
    }

    #[test]
    fn unix_socket() {
        let ds = DataSource::builder()
            .net("unix")
            .host("/var/run/mysqld/mysqld.sock")
            .build();
        let options = connect_options(&ds);
        assert_eq!(
            options
                .get_socket()
                .map(|p| p.to_string_lossy().into_owned()),
            Some("/var/run/mysqld/mysqld.sock".to_string())
        );
    }
}
