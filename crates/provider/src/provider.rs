use std::sync::OnceLock;

use dkron_config::{ProviderConfig, HOST_ENV_VAR};
use dkron_domain::{
    job_schema, AttributeMap, AttributeValue, FieldKind, FieldSchema, ResourceSchema,
    JOB_RESOURCE_TYPE,
};
use dkron_errors::{ProviderError, ProviderResult};
use tracing::info;

use crate::resource::{JobResource, Resource};

pub const PROVIDER_NAME: &str = "dkron";

/// Provider-level settings: just `host`, which falls back to `DKRON_HOST`.
pub fn provider_schema() -> &'static ResourceSchema {
    static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
    SCHEMA.get_or_init(|| ResourceSchema {
        type_name: PROVIDER_NAME,
        fields: vec![FieldSchema::required("host", FieldKind::String)],
    })
}

/// Entry point the host talks to: configuration plus the resource registry.
#[derive(Debug, Clone, Copy, Default)]
pub struct DkronProvider;

impl DkronProvider {
    pub fn new() -> Self {
        Self
    }

    pub fn schema(&self) -> &'static ResourceSchema {
        provider_schema()
    }

    /// Resolve provider settings into a [`ProviderConfig`].
    pub fn configure(&self, settings: &AttributeMap) -> ProviderResult<ProviderConfig> {
        self.configure_with(settings, |key| std::env::var(key).ok())
    }

    pub fn configure_with<F>(&self, settings: &AttributeMap, lookup: F) -> ProviderResult<ProviderConfig>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(unknown) = settings.keys().find(|k| k.as_str() != "host") {
            return Err(ProviderError::validation_error(
                unknown.as_str(),
                "unsupported provider attribute",
            ));
        }

        let explicit = match settings.get("host") {
            None => None,
            Some(AttributeValue::String(host)) => Some(host.as_str()),
            Some(other) => {
                return Err(ProviderError::validation_error(
                    "host",
                    format!("expected string, found {}", other.kind_name()),
                ))
            }
        };
        if explicit.is_none() {
            info!("Provider 'host' not set, falling back to {}", HOST_ENV_VAR);
        }

        let config = ProviderConfig::resolve_with(explicit, lookup)?;
        info!("Provider configured for {}", config.host());
        Ok(config)
    }

    pub fn resource_types(&self) -> Vec<&'static str> {
        vec![JOB_RESOURCE_TYPE]
    }

    /// The provider has no data sources.
    pub fn data_source_types(&self) -> Vec<&'static str> {
        Vec::new()
    }

    pub fn resource_schema(&self, type_name: &str) -> Option<&'static ResourceSchema> {
        (type_name == JOB_RESOURCE_TYPE).then(job_schema)
    }

    pub fn resource(&self, type_name: &str, config: &ProviderConfig) -> Option<Box<dyn Resource>> {
        match type_name {
            JOB_RESOURCE_TYPE => Some(Box::new(self.job_resource(config))),
            _ => None,
        }
    }

    pub fn job_resource(&self, config: &ProviderConfig) -> JobResource {
        JobResource::new(config)
    }
}
