//! Helper context: the connection + metadata handle every ORM command needs.
//!
//! Built by the embedding application (see `config`), shared read-only across
//! dispatches. The dispatcher only threads `&HelperContext` through to
//! `ConsoleCommand::configure`.

use std::collections::BTreeMap;
use std::path::PathBuf;
use url::Url;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HelperContext {
    /// Directory the console runs in (where its bootstrap / cli-config lives).
    pub working_dir: Option<PathBuf>,
    /// Database connection, exported to the console as `DATABASE_URL`.
    pub database_url: Option<Url>,
    /// Named entity manager (`--em`), when the console hosts several.
    pub entity_manager: Option<String>,
    /// Extra environment for the console process.
    pub env: BTreeMap<String, String>,
}

impl HelperContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn with_database_url(mut self, url: Url) -> Self {
        self.database_url = Some(url);
        self
    }

    pub fn with_entity_manager(mut self, name: impl Into<String>) -> Self {
        self.entity_manager = Some(name.into());
        self
    }

    pub fn with_env(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.env.insert(key.into(), value.into());
        self
    }

    /// Database URL with any password masked, for logs and human output.
    pub fn redacted_database_url(&self) -> Option<String> {
        let url = self.database_url.as_ref()?;
        let mut masked = url.clone();
        if masked.password().is_some() {
            let _ = masked.set_password(Some("***"));
        }
        Some(masked.to_string())
    }
}
