use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::Result;
use crate::transport::Session;

pub const DEFAULT_CONFIG_FILE: &str = "moddb.toml";

#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub user_agent: String,
    pub timeout_secs: u64,
    #[serde(default)]
    pub session_cookie: Option<String>,
}

impl Settings {
    /// Defaults, then the optional config file, then `MODDB_*` env vars.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let file = match path {
            Some(p) => File::from(p).required(true),
            None => File::with_name(DEFAULT_CONFIG_FILE).required(false),
        };
        let settings = Config::builder()
            .set_default("user_agent", concat!("moddb_scrape/", env!("CARGO_PKG_VERSION")))?
            .set_default("timeout_secs", 30)?
            .add_source(file)
            .add_source(Environment::with_prefix("MODDB"))
            .build()?
            .try_deserialize()?;
        Ok(settings)
    }

    pub fn session(&self) -> Option<Session> {
        self.session_cookie
            .as_deref()
            .map(Session::from_cookie_header)
            .filter(|s| !s.cookies.is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_without_file() {
        let settings = Settings::load(None).unwrap();
        assert!(settings.user_agent.starts_with("moddb_scrape/"));
        assert!(settings.timeout_secs > 0);
    }

    #[test]
    fn session_from_cookie() {
        let settings = Settings {
            user_agent: "test".into(),
            timeout_secs: 5,
            session_cookie: Some("freeman=1".into()),
        };
        assert_eq!(settings.session().unwrap().cookies.len(), 1);

        let anonymous = Settings {
            session_cookie: Some("  ".into()),
            ..settings
        };
        assert!(anonymous.session().is_none());
    }
}
