//! Layered configuration for the console target and helper context.
//!
//! Precedence (highest first):
//! 1. CLI flags
//! 2. Environment: `ORM_CONSOLE`, `DATABASE_URL`, `ORM_ENTITY_MANAGER`
//! 3. Config file: `--config` / `ORM_TASKS_CONFIG`, else the first of
//!    `orm-tasks.yaml`, `orm-tasks.yml`, `orm-tasks.json` in the working dir
//! 4. Defaults (`vendor/bin/doctrine`, no connection override)

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;
use url::Url;

use crate::console::{ConsoleTarget, DEFAULT_CONSOLE};
use crate::context::HelperContext;

pub const CONFIG_CANDIDATES: &[&str] = &["orm-tasks.yaml", "orm-tasks.yml", "orm-tasks.json"];

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}: {message}", path.display())]
    Parse { path: PathBuf, message: String },

    #[error("invalid database url '{value}': {source}")]
    DatabaseUrl {
        value: String,
        #[source]
        source: url::ParseError,
    },

    #[error("invalid console command line '{value}': {message}")]
    Console { value: String, message: String },
}

/// On-disk config file shape.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default, deny_unknown_fields)]
pub struct FileConfig {
    pub console: Option<String>,
    pub working_dir: Option<PathBuf>,
    pub database_url: Option<String>,
    pub entity_manager: Option<String>,
    pub env: BTreeMap<String, String>,
}

impl FileConfig {
    /// Load a YAML or JSON config file (chosen by extension; YAML otherwise).
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let is_json = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("json"));
        let parsed: Result<FileConfig, String> = if is_json {
            serde_json::from_str(&raw).map_err(|e| e.to_string())
        } else {
            serde_yaml::from_str(&raw).map_err(|e| e.to_string())
        };
        parsed.map_err(|message| ConfigError::Parse {
            path: path.to_path_buf(),
            message,
        })
    }

    /// First existing candidate file in `dir`.
    pub fn discover(dir: &Path) -> Option<PathBuf> {
        CONFIG_CANDIDATES
            .iter()
            .map(|name| dir.join(name))
            .find(|p| p.is_file())
    }
}

/// Values supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub console: Option<String>,
    pub config: Option<PathBuf>,
    pub working_dir: Option<PathBuf>,
    pub database_url: Option<String>,
    pub entity_manager: Option<String>,
}

/// Fully resolved runtime settings.
#[derive(Debug, Clone)]
pub struct Settings {
    pub console: ConsoleTarget,
    pub helpers: HelperContext,
    /// Config file that contributed, if any.
    pub source: Option<PathBuf>,
}

impl Settings {
    /// Resolve against the real process environment.
    pub fn resolve(overrides: &Overrides) -> Result<Self, ConfigError> {
        Self::resolve_with(overrides, |key| std::env::var(key).ok())
    }

    /// Resolve with an injected environment lookup.
    pub fn resolve_with(
        overrides: &Overrides,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        let lookup = |key: &str| env(key).filter(|v| !v.trim().is_empty());

        let config_path = overrides
            .config
            .clone()
            .or_else(|| lookup("ORM_TASKS_CONFIG").map(PathBuf::from))
            .or_else(|| {
                let base = overrides.working_dir.clone().unwrap_or_else(|| PathBuf::from("."));
                FileConfig::discover(&base)
            });
        let file = match &config_path {
            Some(p) => {
                debug!(path = %p.display(), "loading config file");
                FileConfig::load(p)?
            }
            None => FileConfig::default(),
        };

        let console_raw = overrides
            .console
            .clone()
            .or_else(|| lookup("ORM_CONSOLE"))
            .or(file.console)
            .unwrap_or_else(|| DEFAULT_CONSOLE.to_string());
        let console = ConsoleTarget::parse(&console_raw).map_err(|e| ConfigError::Console {
            value: console_raw.clone(),
            message: e.to_string(),
        })?;

        let database_url = overrides
            .database_url
            .clone()
            .or_else(|| lookup("DATABASE_URL"))
            .or(file.database_url)
            .map(|raw| {
                Url::parse(raw.trim()).map_err(|source| ConfigError::DatabaseUrl {
                    value: raw.clone(),
                    source,
                })
            })
            .transpose()?;

        let entity_manager = overrides
            .entity_manager
            .clone()
            .or_else(|| lookup("ORM_ENTITY_MANAGER"))
            .or(file.entity_manager);

        let helpers = HelperContext {
            working_dir: overrides.working_dir.clone().or(file.working_dir),
            database_url,
            entity_manager,
            env: file.env,
        };

        Ok(Self {
            console,
            helpers,
            source: config_path,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    fn temp_file(name: &str, contents: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("orm_tasks_cfg_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = dir.join(name);
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn defaults_without_anything() {
        let dir = std::env::temp_dir().join(format!("orm_tasks_empty_{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let overrides = Overrides {
            working_dir: Some(dir.clone()),
            ..Default::default()
        };
        let s = Settings::resolve_with(&overrides, no_env).unwrap();
        assert_eq!(s.console.program, DEFAULT_CONSOLE);
        assert_eq!(s.helpers.database_url, None);
        assert_eq!(s.helpers.working_dir, Some(dir));
        assert!(s.source.is_none());
    }

    #[test]
    fn yaml_file_loaded() {
        let path = temp_file(
            "cfg_yaml.yaml",
            "console: php bin/console\nentity_manager: reporting\nenv:\n  APP_ENV: prod\n",
        );
        let overrides = Overrides {
            config: Some(path.clone()),
            ..Default::default()
        };
        let s = Settings::resolve_with(&overrides, no_env).unwrap();
        assert_eq!(s.console.program, "php");
        assert_eq!(s.console.args, vec!["bin/console"]);
        assert_eq!(s.helpers.entity_manager.as_deref(), Some("reporting"));
        assert_eq!(s.helpers.env.get("APP_ENV").map(String::as_str), Some("prod"));
        assert_eq!(s.source, Some(path));
    }

    #[test]
    fn json_file_loaded() {
        let path = temp_file(
            "cfg_json.json",
            r#"{"database_url":"sqlite:///tmp/app.db","console":"bin/doctrine"}"#,
        );
        let cfg = FileConfig::load(&path).unwrap();
        assert_eq!(cfg.console.as_deref(), Some("bin/doctrine"));
        assert_eq!(cfg.database_url.as_deref(), Some("sqlite:///tmp/app.db"));
    }

    #[test]
    fn unknown_keys_rejected() {
        let path = temp_file("cfg_bad.yaml", "consle: typo\n");
        let err = FileConfig::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
    }

    #[test]
    fn missing_file_is_read_error() {
        let err = FileConfig::load(Path::new("/nonexistent/orm-tasks.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Read { .. }));
    }

    #[test]
    fn precedence_cli_then_env_then_file() {
        let path = temp_file(
            "cfg_prec.yaml",
            "console: from-file\ndatabase_url: mysql://file@db/app\nentity_manager: file_em\n",
        );
        let vars: HashMap<&str, &str> = HashMap::from([
            ("ORM_CONSOLE", "from-env"),
            ("DATABASE_URL", "mysql://env@db/app"),
        ]);
        let env = |k: &str| vars.get(k).map(|v| v.to_string());

        let overrides = Overrides {
            config: Some(path.clone()),
            console: Some("from-cli".into()),
            ..Default::default()
        };
        let s = Settings::resolve_with(&overrides, env).unwrap();
        assert_eq!(s.console.program, "from-cli");
        assert_eq!(s.helpers.database_url.unwrap().username(), "env");
        assert_eq!(s.helpers.entity_manager.as_deref(), Some("file_em"));
    }

    #[test]
    fn blank_env_values_ignored() {
        let overrides = Overrides {
            working_dir: Some(std::env::temp_dir().join("orm_tasks_no_cfg_here")),
            ..Default::default()
        };
        let s = Settings::resolve_with(&overrides, |k| {
            (k == "ORM_CONSOLE").then(|| "   ".to_string())
        })
        .unwrap();
        assert_eq!(s.console.program, DEFAULT_CONSOLE);
    }

    #[test]
    fn invalid_database_url() {
        let overrides = Overrides {
            working_dir: Some(std::env::temp_dir().join("orm_tasks_no_cfg_here")),
            database_url: Some("not a url".into()),
            ..Default::default()
        };
        let err = Settings::resolve_with(&overrides, no_env).unwrap_err();
        assert!(matches!(err, ConfigError::DatabaseUrl { .. }));
    }
}
