use std::path::PathBuf;

use clap::{Parser, Subcommand};
use sql_orm::{DataSource, Driver, OrmError};

#[derive(Parser, Debug)]
#[command(author, version, about = "Inspect and query a database through sql-orm")]
pub(crate) struct Args {
    /// JSON data source file; flags given on the command line override its fields
    #[arg(long)]
    pub(crate) config: Option<PathBuf>,
    #[arg(long, value_enum)]
    pub(crate) driver: Option<Driver>,
    #[arg(long)]
    pub(crate) host: Option<String>,
    #[arg(long)]
    pub(crate) port: Option<u16>,
    #[arg(long)]
    pub(crate) user: Option<String>,
    #[arg(long)]
    pub(crate) password: Option<String>,
    /// Database name, or the database file for sqlite
    #[arg(long)]
    pub(crate) db_name: Option<String>,
    /// Extra DSN parameter, repeatable
    #[arg(long = "param", value_name = "KEY=VALUE", value_parser = parse_param)]
    pub(crate) params: Vec<(String, String)>,
    #[arg(long)]
    pub(crate) max_open_conns: Option<u32>,
    /// Log every statement at info level
    #[arg(long)]
    pub(crate) debug: bool,
    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Subcommand, Debug)]
pub(crate) enum Command {
    /// Print the server version
    Version,
    /// Report whether a table exists
    Exists { table: String },
    /// Drop a table if it exists
    Drop { table: String },
    /// Execute a statement and print the affected row count
    Exec {
        sql: String,
        /// Positional arguments bound to `?` placeholders
        args: Vec<String>,
    },
    /// Run a query and print its rows as JSON lines
    Query { sql: String, args: Vec<String> },
    /// Print the schema of the sample `User` model
    Schema {
        /// Also create the table
        #[arg(long)]
        apply: bool,
    },
}

fn parse_param(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw}"))
}

impl Args {
    /// Data source from `--config` (or the defaults) with command-line overrides applied.
    pub(crate) fn data_source(&self) -> Result<DataSource, OrmError> {
        let mut ds = match &self.config {
            Some(path) => {
                let json = std::fs::read_to_string(path).map_err(|e| {
                    OrmError::ConfigError(format!("cannot read {}: {e}", path.display()))
                })?;
                DataSource::from_json(&json)?
            }
            None => DataSource::default(),
        };

        if let Some(driver) = self.driver {
            ds.driver = driver;
        }
        if let Some(host) = &self.host {
            ds.host.clone_from(host);
        }
        if let Some(port) = self.port {
            ds.port = port;
        }
        if let Some(user) = &self.user {
            ds.user.clone_from(user);
        }
        if let Some(password) = &self.password {
            ds.password.clone_from(password);
        }
        if let Some(db_name) = &self.db_name {
            ds.db_name.clone_from(db_name);
        }
        for (key, value) in &self.params {
            ds.params.insert(key.clone(), value.clone());
        }
        if let Some(max) = self.max_open_conns {
            ds.pool.max_open_conns = Some(max);
        }
        Ok(ds)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flags_override_defaults() {
        let args = Args::parse_from([
            "ormctl",
            "--driver",
            "sqlite",
            "--db-name",
            "/tmp/app.db",
            "--param",
            "mode=ro",
            "exists",
            "users",
        ]);
        let ds = args.data_source().unwrap();
        assert_eq!(ds.driver, Driver::Sqlite);
        assert_eq!(ds.db_name, "/tmp/app.db");
        assert_eq!(ds.params.get("mode").map(String::as_str), Some("ro"));
        assert_eq!(ds.host, "localhost");
        assert!(matches!(args.command, Command::Exists { ref table } if table == "users"));
    }

    #[test]
    fn bad_param_is_rejected() {
        assert!(Args::try_parse_from(["ormctl", "--param", "novalue", "version"]).is_err());
    }
}
