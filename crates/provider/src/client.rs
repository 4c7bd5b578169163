use dkron_config::ProviderConfig;
use dkron_domain::Job;
use dkron_errors::{ProviderError, ProviderResult};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use tracing::{debug, error, info, warn};

/// Thin HTTP client for the Dkron `/v1/jobs` API.
///
/// One request per call, no retries and no timeout beyond the
/// `reqwest::Client` defaults.
#[derive(Debug, Clone)]
pub struct DkronClient {
    config: ProviderConfig,
    http_client: reqwest::Client,
}

struct RawResponse {
    status: StatusCode,
    body: String,
}

impl DkronClient {
    pub fn new(config: ProviderConfig) -> Self {
        Self::with_http_client(config, reqwest::Client::new())
    }

    pub fn with_http_client(config: ProviderConfig, http_client: reqwest::Client) -> Self {
        Self {
            config,
            http_client,
        }
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    /// `POST /v1/jobs`. Anything but `201 Created` is a remote error carrying
    /// the response body.
    pub async fn create_job(&self, job: &Job) -> ProviderResult<Job> {
        let url = self.config.jobs_endpoint();
        let payload = serde_json::to_string(job)?;

        info!("Posting job creation for '{}' to {}", job.name, url);
        debug!("Payload created: {}", payload);

        let response = self.send(Method::POST, &url, payload).await?;

        if response.status != StatusCode::CREATED {
            error!(
                "Job creation for '{}' failed: HTTP {} - {}",
                job.name, response.status, response.body
            );
            return Err(ProviderError::remote_error(
                response.status.as_u16(),
                response.body,
            ));
        }

        let created: Job = serde_json::from_str(&response.body)?;
        info!("Job '{}' created", created.name);
        Ok(created)
    }

    /// `GET /v1/jobs/{name}`.
    ///
    /// The status code is not treated as an error: a non-success response is
    /// decoded as well and falls back to an empty job when the body is not a
    /// job document.
    pub async fn get_job(&self, name: &str) -> ProviderResult<Job> {
        let url = self.config.job_endpoint(name);
        info!("Request to {} endpoint", url);

        let response = self.send(Method::GET, &url, String::new()).await?;

        if response.status.is_success() {
            return Ok(serde_json::from_str(&response.body)?);
        }

        warn!(
            "Reading job '{}' returned HTTP {}, using whatever the body contains",
            name, response.status
        );
        match serde_json::from_str::<Job>(&response.body) {
            Ok(job) => Ok(job),
            Err(e) => {
                debug!("Response body is not a job document: {}", e);
                Ok(Job::default())
            }
        }
    }

    /// `DELETE /v1/jobs/{name}`. Only transport failures are reported.
    pub async fn delete_job(&self, name: &str) -> ProviderResult<()> {
        let url = self.config.job_endpoint(name);
        info!("Request to {} endpoint", url);

        let response = self.send(Method::DELETE, &url, String::new()).await?;

        if !response.status.is_success() {
            warn!(
                "Deleting job '{}' returned HTTP {} - {}",
                name, response.status, response.body
            );
        }
        Ok(())
    }

    async fn send(&self, method: Method, url: &str, body: String) -> ProviderResult<RawResponse> {
        let response = self
            .http_client
            .request(method.clone(), url)
            .header(CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .map_err(|e| {
                error!("Failed to send {} request to {}: {}", method, url, e);
                ProviderError::transport_error(format!("{method} {url}: {e}"))
            })?;

        let status = response.status();
        debug!("response Status: {}", status);
        debug!("response Headers: {:?}", response.headers());

        let body = response.text().await.map_err(|e| {
            error!("Failed to read response body from {}: {}", url, e);
            ProviderError::transport_error(format!("reading response from {url}: {e}"))
        })?;
        debug!("response Body: {}", body);

        Ok(RawResponse { status, body })
    }
}
