use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Configuration error: {0}")]
    Configuration(String),
    #[error("Invalid attribute '{attribute}': {message}")]
    Validation { attribute: String, message: String },
    #[error("Transport error: {0}")]
    Transport(String),
    #[error("Remote API error (HTTP {status}): {body}")]
    Remote { status: u16, body: String },
    #[error("Serialization error: {0}")]
    Serialization(String),
}

pub type ProviderResult<T> = Result<T, ProviderError>;

impl ProviderError {
    pub fn config_error<S: Into<String>>(msg: S) -> Self {
        Self::Configuration(msg.into())
    }
    pub fn validation_error<A: Into<String>, S: Into<String>>(attribute: A, msg: S) -> Self {
        Self::Validation {
            attribute: attribute.into(),
            message: msg.into(),
        }
    }
    pub fn transport_error<S: Into<String>>(msg: S) -> Self {
        Self::Transport(msg.into())
    }
    pub fn remote_error<S: Into<String>>(status: u16, body: S) -> Self {
        Self::Remote {
            status,
            body: body.into(),
        }
    }
    pub fn is_fatal(&self) -> bool {
        matches!(self, ProviderError::Configuration(_))
    }
    pub fn is_retryable(&self) -> bool {
        matches!(self, ProviderError::Transport(_))
    }
    /// Short summary shown to the host next to the full error text.
    pub fn user_message(&self) -> &str {
        match self {
            ProviderError::Configuration(_) => "Provider is not configured correctly",
            ProviderError::Validation { .. } => "Resource attributes do not match the schema",
            ProviderError::Transport(_) => "Could not reach the Dkron API",
            ProviderError::Remote { .. } => "The Dkron API rejected the request",
            ProviderError::Serialization(_) => "Could not encode or decode job JSON",
        }
    }
}

impl From<serde_json::Error> for ProviderError {
    fn from(err: serde_json::Error) -> Self {
        ProviderError::Serialization(err.to_string())
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ProviderError::Serialization(err.to_string())
        } else {
            ProviderError::Transport(err.to_string())
        }
    }
}
