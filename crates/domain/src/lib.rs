pub mod attributes;
pub mod job;
pub mod mapping;
pub mod schema;

pub use attributes::{AttributeMap, AttributeValue};
pub use job::{ExecutorConfig, Job, ProcessorConfig, ProcessorType, TagValue};
pub use mapping::{processors_from_wire, processors_to_wire, ProcessorSpec};
pub use schema::{job_schema, FieldKind, FieldSchema, ResourceSchema, JOB_RESOURCE_TYPE};
