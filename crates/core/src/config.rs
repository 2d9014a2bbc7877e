use std::fmt;

use secrecy::SecretString;
use tracing::warn;

use crate::types::ListOptions;

pub const HOST_VAR: &str = "DRONE_HOST";
pub const TOKEN_VAR: &str = "DRONE_TOKEN";
pub const NAMESPACE_VAR: &str = "DRONE_NAMESPACE";
pub const REPO_VAR: &str = "DRONE_REPO_NAME";
pub const PAGE_VAR: &str = "DRONE_REPO_PAGE";
pub const PAGE_SIZE_VAR: &str = "DRONE_REPO_PAGE_SIZE";
pub const BEFORE_VAR: &str = "DRONE_PURGE_BEFORE";
pub const PURGE_BUILDS_VAR: &str = "DRONE_PURGE_BUILDS";
pub const PURGE_LOGS_VAR: &str = "DRONE_PURGE_LOGS";

/// Errors that can occur when loading a PurgeConfig.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// One or more required variables are unset or blank
    #[error("Missing required environment variables: {}", .0.join(", "))]
    Missing(Vec<&'static str>),
}

/// PurgeConfig holds everything a purge run needs, read once at startup.
pub struct PurgeConfig {
    /// Drone server base URL, without a trailing slash.
    pub host: String,
    pub token: SecretString,
    /// Repository owner.
    pub namespace: String,
    pub repo: String,
    pub page: i64,
    pub page_size: i64,
    /// Builds numbered strictly below this are eligible for purging.
    pub before: i64,
    pub purge_builds: bool,
    pub purge_logs: bool,
}

impl PurgeConfig {
    /// Loads the config from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Loads the config using `lookup` to resolve each variable.
    ///
    /// Numeric and boolean variables never fail: an unset or blank value
    /// becomes 0 / false, and a value that does not parse becomes 0 / false
    /// with a warning. The four string variables are required.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut missing = Vec::new();
        let mut required = |key: &'static str| match lookup(key) {
            Some(val) if !val.trim().is_empty() => val.trim().to_string(),
            _ => {
                missing.push(key);
                String::new()
            }
        };

        let host = required(HOST_VAR).trim_end_matches('/').to_string();
        let token = required(TOKEN_VAR);
        let namespace = required(NAMESPACE_VAR);
        let repo = required(REPO_VAR);

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        Ok(Self {
            host,
            token: SecretString::from(token),
            namespace,
            repo,
            page: int_var(PAGE_VAR, lookup(PAGE_VAR)),
            page_size: int_var(PAGE_SIZE_VAR, lookup(PAGE_SIZE_VAR)),
            before: int_var(BEFORE_VAR, lookup(BEFORE_VAR)),
            purge_builds: bool_var(PURGE_BUILDS_VAR, lookup(PURGE_BUILDS_VAR)),
            purge_logs: bool_var(PURGE_LOGS_VAR, lookup(PURGE_LOGS_VAR)),
        })
    }

    pub fn list_options(&self) -> ListOptions {
        ListOptions {
            page: self.page,
            size: self.page_size,
        }
    }
}

impl fmt::Debug for PurgeConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PurgeConfig")
            .field("host", &self.host)
            .field("token", &"[REDACTED]")
            .field("namespace", &self.namespace)
            .field("repo", &self.repo)
            .field("page", &self.page)
            .field("page_size", &self.page_size)
            .field("before", &self.before)
            .field("purge_builds", &self.purge_builds)
            .field("purge_logs", &self.purge_logs)
            .finish()
    }
}

fn int_var(key: &str, raw: Option<String>) -> i64 {
    let Some(raw) = raw.filter(|v| !v.is_empty()) else {
        return 0;
    };
    raw.parse().unwrap_or_else(|_| {
        warn!(var = key, value = %raw, "Not a valid integer, defaulting to 0");
        0
    })
}

fn bool_var(key: &str, raw: Option<String>) -> bool {
    let Some(raw) = raw.filter(|v| !v.is_empty()) else {
        return false;
    };
    parse_bool(&raw).unwrap_or_else(|| {
        warn!(var = key, value = %raw, "Not a valid boolean, defaulting to false");
        false
    })
}

/// Accepts the same spellings as Drone's own tooling.
fn parse_bool(s: &str) -> Option<bool> {
    match s {
        "1" | "t" | "T" | "TRUE" | "true" | "True" => Some(true),
        "0" | "f" | "F" | "FALSE" | "false" | "False" => Some(false),
        _ => None,
    }
}
