pub mod client;
pub mod provider;
pub mod resource;

pub use client::DkronClient;
pub use provider::{provider_schema, DkronProvider, PROVIDER_NAME};
pub use resource::{JobResource, Resource, ResourceData};
