//! Environment configuration
//!
//! A config file is a YAML map of stanzas. The `global` stanza carries
//! defaults shared by every environment (proxy settings in practice); each
//! other top-level key names an environment such as `production`.
//!
//! ```yaml
//! global:
//!   proxy_url: proxy.corp.example:3128
//! production:
//!   url: https://acme.service-now.com
//!   user: svc_ingest
//!   password: hunter2
//!   timeout: 120
//!   value_replacements: "assigned_to=user_name, assignment_group=name"
//! ```

use crate::error::{Error, Result, ResultExt};
use crate::resolver::ReplacementMap;
use crate::types::OptionStringExt;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Environment used when none is given
pub const DEFAULT_ENVIRONMENT: &str = "production";

/// Per-request timeout used when a stanza does not set one
pub const DEFAULT_TIMEOUT_SECS: u64 = 120;

/// Name of the stanza holding shared defaults
const GLOBAL_STANZA: &str = "global";

// ============================================================================
// Raw file model
// ============================================================================

/// Config file as written on disk
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigFile {
    /// Shared defaults
    #[serde(default)]
    pub global: Stanza,

    /// Named environments
    #[serde(flatten)]
    pub environments: BTreeMap<String, Stanza>,
}

/// One stanza of the config file. Every key is optional at this level;
/// [`ConfigFile::environment`] enforces what an environment must have.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Stanza {
    /// Instance base URL, e.g. `https://acme.service-now.com`
    #[serde(default)]
    pub url: Option<String>,

    /// Basic auth user
    #[serde(default)]
    pub user: Option<String>,

    /// Basic auth password
    #[serde(default)]
    pub password: Option<String>,

    /// Per-request timeout in seconds
    #[serde(default)]
    pub timeout: Option<u64>,

    /// Proxy host[:port], optionally with a scheme
    #[serde(default)]
    pub proxy_url: Option<String>,

    /// Proxy user
    #[serde(default)]
    pub proxy_user: Option<String>,

    /// Proxy password
    #[serde(default)]
    pub proxy_password: Option<String>,

    /// Reference fields to resolve, as `target=remote` pairs
    #[serde(default)]
    pub value_replacements: Option<String>,

    /// Client-side request rate cap
    #[serde(default)]
    pub requests_per_second: Option<u32>,
}

impl ConfigFile {
    /// Load a config file from disk
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(Error::FileNotFound {
                path: path.display().to_string(),
            });
        }
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;
        Self::from_yaml(&content)
    }

    /// Parse a config file from YAML text
    pub fn from_yaml(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    /// Resolve a named environment, merged with the global stanza.
    ///
    /// Names are matched case-insensitively.
    pub fn environment(&self, name: &str) -> Result<Environment> {
        let wanted = name.trim().to_lowercase();
        if wanted == GLOBAL_STANZA {
            return Err(Error::config("'global' is not an environment"));
        }

        let stanza = self
            .environments
            .iter()
            .find(|(key, _)| key.to_lowercase() == wanted)
            .map(|(_, stanza)| stanza)
            .ok_or_else(|| Error::UnknownEnvironment { env: wanted.clone() })?;

        let base_url = required(stanza.url.clone(), "url")?;
        url::Url::parse(&base_url).map_err(|e| Error::invalid_option("url", e.to_string()))?;

        let replacements = stanza
            .value_replacements
            .as_deref()
            .map(ReplacementMap::parse)
            .unwrap_or_default();

        Ok(Environment {
            name: wanted,
            base_url: base_url.trim_end_matches('/').to_string(),
            username: required(stanza.user.clone(), "user")?,
            password: required(stanza.password.clone(), "password")?,
            timeout: Duration::from_secs(
                stanza
                    .timeout
                    .or(self.global.timeout)
                    .unwrap_or(DEFAULT_TIMEOUT_SECS),
            ),
            proxy: resolve_proxy(stanza, &self.global),
            replacements,
            requests_per_second: stanza.requests_per_second.or(self.global.requests_per_second),
        })
    }
}

fn required(value: Option<String>, field: &str) -> Result<String> {
    value.none_if_empty().ok_or_else(|| Error::missing_field(field))
}

// ============================================================================
// Resolved environment
// ============================================================================

/// A fully resolved environment, ready to build a client from
#[derive(Debug, Clone)]
pub struct Environment {
    /// Lowercased environment name
    pub name: String,
    /// Instance base URL without trailing slash
    pub base_url: String,
    /// Basic auth user
    pub username: String,
    /// Basic auth password
    pub password: String,
    /// Per-request timeout
    pub timeout: Duration,
    /// Proxy URL including credentials, if any
    pub proxy: Option<String>,
    /// Reference fields to resolve on emitted records
    pub replacements: ReplacementMap,
    /// Client-side request rate cap
    pub requests_per_second: Option<u32>,
}

/// Compose the proxy URL from an environment stanza and the global stanza.
///
/// Environment keys win over global ones. A password without a user is
/// ignored.
pub fn resolve_proxy(local: &Stanza, global: &Stanza) -> Option<String> {
    let pick = |local: &Option<String>, global: &Option<String>| {
        local
            .clone()
            .none_if_empty()
            .or_else(|| global.clone().none_if_empty())
    };

    let host = pick(&local.proxy_url, &global.proxy_url)?;
    let user = pick(&local.proxy_user, &global.proxy_user);
    let password = pick(&local.proxy_password, &global.proxy_password);

    let (scheme, host) = match host.split_once("://") {
        Some((scheme, rest)) => (scheme.to_string(), rest.to_string()),
        None => ("http".to_string(), host),
    };

    let authority = match (user, password) {
        (Some(user), Some(password)) => format!("{user}:{password}@{host}"),
        (Some(user), None) => format!("{user}@{host}"),
        _ => host,
    };

    Some(format!("{scheme}://{authority}"))
}
