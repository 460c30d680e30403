use std::env;

use crate::errors::{ConfigError, TimelineError};

/// Rows written per batched insert unless overridden.
pub const DEFAULT_BULK_BATCH_SIZE: usize = 1000;

/// Runtime environment used by the process.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Environment {
    #[default]
    Development,
    Staging,
    Production,
}

impl Environment {
    fn parse(value: &str) -> Self {
        match value.to_ascii_lowercase().as_str() {
            "production" | "prod" => Environment::Production,
            "staging" | "stage" => Environment::Staging,
            _ => Environment::Development,
        }
    }
}

/// Configuration shared by the timeline service and its tooling.
#[derive(Debug, Clone)]
pub struct CoreConfig {
    pub database_url: String,
    pub environment: Environment,
    /// Interactive/debug mode. Offline jobs refuse to run while it is on.
    pub debug: bool,
    /// Hand live timeline writes to a background task instead of awaiting them.
    pub async_dispatch: bool,
    pub bulk_batch_size: usize,
}

impl CoreConfig {
    /// Loads configuration from the process environment.
    ///
    /// Reads `DATABASE_URL`, `ACTIVITY_ENV`, `ACTIVITY_DEBUG`,
    /// `ACTIVITY_ASYNC_DISPATCH` and `ACTIVITY_BULK_BATCH_SIZE`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| read_var(&default_var_name(key)))
    }

    /// Loads configuration where `<prefix><KEY>` overrides the `from_env` name of each key.
    ///
    /// Keys are resolved one by one, so `TIMELINE_DEBUG` still applies when the
    /// database URL comes from plain `DATABASE_URL`.
    pub fn from_env_with_prefix(prefix: &str) -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(layered_lookup(prefix, read_var))
    }

    /// Builds the configuration from an arbitrary key lookup.
    ///
    /// Keys are the unprefixed names: `DATABASE_URL`, `ENV`, `DEBUG`,
    /// `ASYNC_DISPATCH`, `BULK_BATCH_SIZE`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|value| !value.trim().is_empty())
            .ok_or_else(|| ConfigError::MissingEnvVar("DATABASE_URL".into()))?;

        let environment = lookup("ENV")
            .map(|raw| Environment::parse(&raw))
            .unwrap_or_default();

        let debug = parse_flag("DEBUG", lookup("DEBUG"))?;
        let async_dispatch = parse_flag("ASYNC_DISPATCH", lookup("ASYNC_DISPATCH"))?;

        let bulk_batch_size = match lookup("BULK_BATCH_SIZE") {
            Some(raw) => match raw.trim().parse::<usize>() {
                Ok(size) if size > 0 => size,
                _ => {
                    return Err(ConfigError::InvalidEnvVar {
                        key: "BULK_BATCH_SIZE".into(),
                        value: raw,
                    })
                }
            },
            None => DEFAULT_BULK_BATCH_SIZE,
        };

        Ok(Self {
            database_url,
            environment,
            debug,
            async_dispatch,
            bulk_batch_size,
        })
    }

    /// Returns the base Postgres URL.
    pub fn database_url(&self) -> &str {
        &self.database_url
    }

    /// Whether the service is running in production.
    pub fn is_production(&self) -> bool {
        matches!(self.environment, Environment::Production)
    }
}

fn parse_flag(key: &str, raw: Option<String>) -> Result<bool, ConfigError> {
    let Some(raw) = raw else {
        return Ok(false);
    };
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "" | "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidEnvVar {
            key: key.to_string(),
            value: raw,
        }),
    }
}

fn default_var_name(key: &str) -> String {
    match key {
        "DATABASE_URL" => key.to_string(),
        other => format!("ACTIVITY_{other}"),
    }
}

/// Unset and blank variables both count as missing.
fn read_var(name: &str) -> Option<String> {
    env::var(name).ok().filter(|value| !value.trim().is_empty())
}

fn layered_lookup<'a, E>(prefix: &'a str, read: E) -> impl Fn(&str) -> Option<String> + 'a
where
    E: Fn(&str) -> Option<String> + 'a,
{
    move |key: &str| read(&format!("{prefix}{key}")).or_else(|| read(&default_var_name(key)))
}

/// Loads the timeline configuration, preferring `TIMELINE_`-prefixed variables key by key.
pub fn load_timeline_config() -> Result<CoreConfig, TimelineError> {
    CoreConfig::from_env_with_prefix("TIMELINE_").map_err(Into::into)
}
