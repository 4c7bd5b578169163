use async_trait::async_trait;
use dkron_config::ProviderConfig;
use dkron_domain::{job_schema, AttributeMap, AttributeValue, Job, ResourceSchema};
use dkron_errors::{ProviderError, ProviderResult};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::client::DkronClient;

/// Host-side state of one managed resource: the durable identifier and the
/// last known attributes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResourceData {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    id: Option<String>,
    #[serde(default)]
    attributes: AttributeMap,
}

impl ResourceData {
    pub fn new(attributes: AttributeMap) -> Self {
        Self {
            id: None,
            attributes,
        }
    }

    pub fn with_id<S: Into<String>>(mut self, id: S) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn id(&self) -> Option<&str> {
        self.id.as_deref()
    }

    pub fn set_id<S: Into<String>>(&mut self, id: S) {
        self.id = Some(id.into());
    }

    pub fn clear_id(&mut self) {
        self.id = None;
    }

    pub fn is_tracked(&self) -> bool {
        self.id.is_some()
    }

    pub fn attributes(&self) -> &AttributeMap {
        &self.attributes
    }

    pub fn set_attributes(&mut self, attributes: AttributeMap) {
        self.attributes = attributes;
    }

    pub fn get(&self, key: &str) -> Option<&AttributeValue> {
        self.attributes.get(key)
    }

    fn require_id(&self) -> ProviderResult<&str> {
        self.id()
            .ok_or_else(|| ProviderError::validation_error("id", "resource has not been created"))
    }
}

/// CRUD entry points the host drives for a resource type.
#[async_trait]
pub trait Resource: Send + Sync {
    fn schema(&self) -> &'static ResourceSchema;

    /// Create the remote object from `data`'s attributes and record its id.
    async fn create(&self, data: &mut ResourceData) -> ProviderResult<()>;

    /// Refresh `data`'s attributes from the remote object.
    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()>;

    /// Apply `planned` attributes to the object tracked by `data`.
    async fn update(&self, data: &mut ResourceData, planned: AttributeMap) -> ProviderResult<()>;

    /// Remove the remote object and stop tracking it.
    async fn delete(&self, data: &mut ResourceData) -> ProviderResult<()>;
}

/// The `dkron_job` resource.
#[derive(Debug, Clone)]
pub struct JobResource {
    client: DkronClient,
}

impl JobResource {
    pub fn new(config: &ProviderConfig) -> Self {
        Self::with_client(DkronClient::new(config.clone()))
    }

    pub fn with_client(client: DkronClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &DkronClient {
        &self.client
    }

    async fn submit(&self, data: &mut ResourceData, job: &Job) -> ProviderResult<()> {
        let created = self.client.create_job(job).await?;
        data.set_id(created.name);
        Ok(())
    }
}

#[async_trait]
impl Resource for JobResource {
    fn schema(&self) -> &'static ResourceSchema {
        job_schema()
    }

    async fn create(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let job = Job::from_attributes(data.attributes())?;
        self.submit(data, &job).await
    }

    async fn read(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        let job = self.client.get_job(&id).await?;
        data.set_attributes(job.to_attributes());
        Ok(())
    }

    async fn update(&self, data: &mut ResourceData, planned: AttributeMap) -> ProviderResult<()> {
        let job = Job::from_attributes(&planned)?;
        let previous = data.id().map(str::to_string);

        match previous {
            Some(old_name) if old_name != job.name => {
                info!("Job renamed from '{}' to '{}', recreating", old_name, job.name);
                self.delete(data).await?;
            }
            Some(_) => debug!("Job '{}' keeps its name, re-submitting", job.name),
            None => debug!("Job '{}' was not tracked yet, creating", job.name),
        }

        // Planned attributes only become state once the job is accepted.
        self.submit(data, &job).await?;
        data.set_attributes(planned);
        Ok(())
    }

    async fn delete(&self, data: &mut ResourceData) -> ProviderResult<()> {
        let id = data.require_id()?.to_string();
        self.client.delete_job(&id).await?;
        data.clear_id();
        Ok(())
    }
}
