use std::fmt;

use sqlx::postgres::PgConnectOptions;
use vacancy_core::AppError;

/// Database the server always has; used to create the target database.
const ADMIN_DATABASE: &str = "postgres";

/// Connection settings for the vacancy database.
#[derive(Clone, PartialEq, Eq)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub dbname: String,
    pub max_connections: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 5432,
            user: "postgres".into(),
            password: String::new(),
            dbname: "vacancies".into(),
            max_connections: 1,
        }
    }
}

impl fmt::Debug for DatabaseConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DatabaseConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("dbname", &self.dbname)
            .field("max_connections", &self.max_connections)
            .finish()
    }
}

impl DatabaseConfig {
    /// Read configuration from environment variables.
    ///
    /// - `DB_HOST` (defaults to `localhost`)
    /// - `DB_PORT` (defaults to 5432)
    /// - `DB_USER` (defaults to `postgres`)
    /// - `DB_PASSWORD` (defaults to empty)
    /// - `DB_NAME` (defaults to `vacancies`)
    ///
    /// The pool size is not configurable and stays at one connection.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_vars(|key| std::env::var(key).ok())
    }

    fn from_vars(var: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let defaults = Self::default();

        let port = match var("DB_PORT") {
            None => defaults.port,
            Some(raw) => raw.trim().parse().map_err(|_| {
                AppError::ConfigError(format!("Invalid DB_PORT '{raw}': must be a port number"))
            })?,
        };

        let dbname = var("DB_NAME").unwrap_or(defaults.dbname);
        if dbname.is_empty() {
            return Err(AppError::ConfigError("DB_NAME must not be empty".into()));
        }

        Ok(Self {
            host: var("DB_HOST").unwrap_or(defaults.host),
            port,
            user: var("DB_USER").unwrap_or(defaults.user),
            password: var("DB_PASSWORD").unwrap_or(defaults.password),
            dbname,
            max_connections: defaults.max_connections,
        })
    }

    /// Options for the target database.
    pub fn connect_options(&self) -> PgConnectOptions {
        self.server_options().database(&self.dbname)
    }

    /// Options for the administrative database.
    pub fn admin_connect_options(&self) -> PgConnectOptions {
        self.server_options().database(ADMIN_DATABASE)
    }

    fn server_options(&self) -> PgConnectOptions {
        let options = PgConnectOptions::new()
            .host(&self.host)
            .port(self.port)
            .username(&self.user);
        if self.password.is_empty() {
            options
        } else {
            options.password(&self.password)
        }
    }
}
