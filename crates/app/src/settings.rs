//! Handles settings for the application. Configuration is read from
//! `settings.toml` (or the file passed with `--config`), then overridden by
//! `BUDGETLY__*` environment variables, e.g. `BUDGETLY__SERVER__PORT=8080`.
use clap::Parser;
use config::{Config, ConfigError, Environment, File, FileFormat, FileSourceFile};
use serde::Deserialize;

const DEFAULT_CONFIG_PATH: &str = "settings";

#[derive(Debug, Parser)]
#[command(name = "budgetly", version, about = "Budgeting service")]
struct Args {
    /// Optional config file path (TOML).
    #[arg(long, env = "BUDGETLY_CONFIG")]
    config: Option<String>,
}

#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Database {
    /// In-memory SQLite, lost on exit.
    Memory,
    /// SQLite file path, created when missing.
    Sqlite(String),
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct App {
    pub level: String,
}

impl Default for App {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Server {
    pub bind: String,
    pub port: u16,
    pub database: Database,
    pub session_ttl_hours: i64,
}

impl Default for Server {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 3000,
            database: Database::Sqlite("budgetly.db".to_string()),
            session_ttl_hours: 720,
        }
    }
}

impl Server {
    /// Session lifetime, rejecting hour counts that are not positive or do
    /// not fit a `chrono::Duration`.
    pub fn session_ttl(&self) -> Result<chrono::Duration, ConfigError> {
        chrono::Duration::try_hours(self.session_ttl_hours)
            .filter(|ttl| *ttl > chrono::Duration::zero())
            .ok_or_else(|| {
                ConfigError::Message(format!(
                    "server.session_ttl_hours out of range: {}",
                    self.session_ttl_hours
                ))
            })
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub app: App,
    pub server: Server,
}

impl Settings {
    pub fn new() -> Result<Self, ConfigError> {
        let args = Args::parse();
        let path = args.config.as_deref().unwrap_or(DEFAULT_CONFIG_PATH);
        Self::from_sources(
            File::with_name(path).required(args.config.is_some()),
            Environment::with_prefix("BUDGETLY")
                .separator("__")
                .try_parsing(true),
        )
    }

    fn from_sources(
        file: File<FileSourceFile, FileFormat>,
        env: Environment,
    ) -> Result<Self, ConfigError> {
        Config::builder()
            .add_source(file)
            .add_source(env)
            .build()?
            .try_deserialize()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn env(vars: &[(&str, &str)]) -> Environment {
        let source: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Environment::with_prefix("BUDGETLY")
            .separator("__")
            .try_parsing(true)
            .source(Some(source))
    }

    fn no_file() -> File<FileSourceFile, FileFormat> {
        File::with_name("does-not-exist").required(false)
    }

    #[test]
    fn defaults_without_sources() {
        let settings = Settings::from_sources(no_file(), env(&[])).unwrap();
        assert_eq!(settings.app.level, "info");
        assert_eq!(settings.server.bind, "127.0.0.1");
        assert_eq!(settings.server.port, 3000);
        assert_eq!(settings.server.session_ttl_hours, 720);
    }

    #[test]
    fn environment_overrides_nested_keys() {
        let settings = Settings::from_sources(
            no_file(),
            env(&[
                ("BUDGETLY__APP__LEVEL", "debug"),
                ("BUDGETLY__SERVER__PORT", "8080"),
                ("BUDGETLY__SERVER__DATABASE", "memory"),
            ]),
        )
        .unwrap();
        assert_eq!(settings.app.level, "debug");
        assert_eq!(settings.server.port, 8080);
        assert_eq!(settings.server.database, Database::Memory);
    }

    #[test]
    fn session_ttl_rejects_out_of_range_hours() {
        let mut server = Server::default();
        assert_eq!(server.session_ttl().unwrap(), chrono::Duration::hours(720));

        for hours in [i64::MAX, 0, -1] {
            server.session_ttl_hours = hours;
            assert!(matches!(
                server.session_ttl(),
                Err(ConfigError::Message(_))
            ));
        }
    }
}
