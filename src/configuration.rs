use secrecy::{ExposeSecret, Secret};
use serde_aux::field_attributes::deserialize_number_from_string;
use sqlx::postgres::{PgConnectOptions, PgSslMode};
use sqlx::ConnectOptions;
use std::time::Duration;

#[derive(serde::Deserialize, Clone)]
pub struct Settings {
    pub database: DatabaseSettings,
    pub application: ApplicationSettings,
    pub registry: RegistrySettings,
}

#[derive(serde::Deserialize, Clone)]
pub struct ApplicationSettings {
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
}

#[derive(serde::Deserialize, Clone)]
pub struct DatabaseSettings {
    pub username: String,
    pub password: Secret<String>,
    #[serde(deserialize_with = "deserialize_number_from_string")]
    pub port: u16,
    pub host: String,
    pub database_name: String,
    /// Determine if we demand the connection to be encrypted or not
    pub require_ssl: bool,
    /// How long to wait for a pooled connection before giving up
    pub acquire_timeout_milliseconds: u64,
    /// Postgres cancels (and rolls back) any statement running longer than this
    pub statement_timeout_milliseconds: u64,
    /// Apply the embedded migrations when the application starts
    #[serde(default)]
    pub migrate_on_startup: bool,
}

impl DatabaseSettings {
    pub fn without_db(&self) -> PgConnectOptions {
        let ssl_mode = if self.require_ssl {
            PgSslMode::Require
        } else {
            // Try an encrypted connection, fallback to unencrypted if it fails
            PgSslMode::Prefer
        };

        PgConnectOptions::new()
            .host(&self.host)
            .username(&self.username)
            .password(self.password.expose_secret())
            .port(self.port)
            .ssl_mode(ssl_mode)
    }

    /// Every connection opened with these options carries a server-side `statement_timeout`.
    /// An expired INSERT is rolled back by Postgres itself, so a timed out write never leaves a
    /// record behind.
    pub fn with_db(&self) -> PgConnectOptions {
        let mut options = self
            .without_db()
            .database(&self.database_name)
            .options([("statement_timeout", self.statement_timeout_setting())]);
        options.log_statements(tracing::log::LevelFilter::Trace);
        options
    }

    pub fn acquire_timeout(&self) -> Duration {
        Duration::from_millis(self.acquire_timeout_milliseconds)
    }

    /// `statement_timeout` value in the unit syntax Postgres accepts, e.g. `3000ms`.
    fn statement_timeout_setting(&self) -> String {
        format!("{}ms", self.statement_timeout_milliseconds)
    }
}

#[derive(serde::Deserialize, Clone)]
pub struct RegistrySettings {
    /// Upper bound on a single storage round-trip issued by the registry. Keep it above
    /// `database.statement_timeout_milliseconds` so that Postgres gives up first.
    pub operation_timeout_milliseconds: u64,
}

impl RegistrySettings {
    pub fn operation_timeout(&self) -> Duration {
        Duration::from_millis(self.operation_timeout_milliseconds)
    }
}

/// Layers `base.yaml`, the environment specific file and `APP_*` environment variables, in this
/// order of precedence (last one wins).
pub fn get_configuration() -> Result<Settings, config::ConfigError> {
    let base_path = std::env::current_dir().expect("Failed to determine the current directory");
    let configuration_directory = base_path.join("configuration");

    // Detect the running environment. Default to `local` if unspecified.
    let environment: Environment = std::env::var("APP_ENVIRONMENT")
        .unwrap_or_else(|_| "local".into())
        .try_into()
        .expect("Failed to parse APP_ENVIRONMENT.");
    let environment_filename = format!("{}.yaml", environment.as_str());

    let settings = config::Config::builder()
        .add_source(config::File::from(configuration_directory.join("base.yaml")))
        .add_source(config::File::from(
            configuration_directory.join(environment_filename),
        ))
        // E.g. `APP_APPLICATION__PORT=5001` would set `Settings.application.port`
        .add_source(
            config::Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__"),
        )
        .build()?;

    settings.try_deserialize::<Settings>()
}

/// The possible runtime environment for our application.
#[derive(Debug)]
pub enum Environment {
    Local,
    Production,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Local => "local",
            Environment::Production => "production",
        }
    }
}

impl TryFrom<String> for Environment {
    type Error = String;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        match s.to_lowercase().as_str() {
            "local" => Ok(Self::Local),
            "production" => Ok(Self::Production),
            other => Err(format!(
                "{other} is not a supported environment. Use either `local` or `production`."
            )),
        }
    }
}
