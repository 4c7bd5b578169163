use std::fs;
use std::path::Path;

use dkron_errors::{ProviderError, ProviderResult};
use serde::Deserialize;
use url::Url;

/// Environment variable consulted when `host` is not configured explicitly.
pub const HOST_ENV_VAR: &str = "DKRON_HOST";

/// Connection settings shared by every request the provider issues.
///
/// Built once at startup and handed to the resource adapter by reference.
/// The only setting is the base address of the Dkron API, e.g.
/// `http://dkron.internal:8080`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProviderConfig {
    host: String,
}

#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    #[serde(default)]
    provider: ProviderSection,
}

#[derive(Debug, Default, Deserialize)]
struct ProviderSection {
    host: Option<String>,
}

impl ProviderConfig {
    /// Validate and build a configuration from an already resolved host.
    pub fn new<S: Into<String>>(host: S) -> ProviderResult<Self> {
        let host = host.into();
        let trimmed = host.trim().trim_end_matches('/');
        if trimmed.is_empty() {
            return Err(ProviderError::config_error(
                "provider variable 'host' should not be empty",
            ));
        }
        Ok(Self {
            host: trimmed.to_string(),
        })
    }

    /// Resolve `host` from an explicit value, falling back to `DKRON_HOST`.
    pub fn resolve(explicit: Option<&str>) -> ProviderResult<Self> {
        Self::resolve_with(explicit, |key| std::env::var(key).ok())
    }

    /// Same as [`ProviderConfig::resolve`] with an injectable environment lookup.
    pub fn resolve_with<F>(explicit: Option<&str>, lookup: F) -> ProviderResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        match explicit {
            Some(host) => Self::new(host),
            None => Self::new(lookup(HOST_ENV_VAR).unwrap_or_default()),
        }
    }

    /// Load the `[provider]` table of a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> ProviderResult<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|e| {
            ProviderError::config_error(format!(
                "Failed to read config file {}: {e}",
                path.display()
            ))
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> ProviderResult<Self> {
        let file: ConfigFile = toml::from_str(content)
            .map_err(|e| ProviderError::config_error(format!("TOML parse error: {e}")))?;
        Self::resolve(file.provider.host.as_deref())
    }

    pub fn host(&self) -> &str {
        &self.host
    }

    /// `{host}/v1/jobs`
    pub fn jobs_endpoint(&self) -> String {
        format!("{}/v1/jobs", self.host)
    }

    /// `{host}/v1/jobs/{name}`, with `name` escaped as a single path segment.
    ///
    /// A host that does not parse as a base URL gets `name` appended verbatim.
    pub fn job_endpoint(&self, name: &str) -> String {
        let Ok(mut url) = Url::parse(&self.jobs_endpoint()) else {
            return format!("{}/v1/jobs/{name}", self.host);
        };
        match url.path_segments_mut() {
            Ok(mut segments) => {
                segments.push(name);
            }
            Err(()) => return format!("{}/v1/jobs/{name}", self.host),
        }
        url.into()
    }
}
