//! Translation between the host's flat attributes and the wire [`Job`].

use std::collections::BTreeMap;

use dkron_errors::{ProviderError, ProviderResult};

use crate::attributes::{
    get_bool, get_int, get_list, get_map, get_optional_string, get_string, AttributeMap,
    AttributeValue,
};
use crate::job::{ExecutorConfig, Job, ProcessorConfig, ProcessorType, TagValue};
use crate::schema::job_schema;

/// One entry of the host-side `processors` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessorSpec {
    pub processor_type: ProcessorType,
    pub forward: Option<String>,
    pub log_dir: Option<String>,
}

impl ProcessorSpec {
    pub fn new(processor_type: ProcessorType) -> Self {
        Self {
            processor_type,
            forward: None,
            log_dir: None,
        }
    }

    fn from_attributes(index: usize, attrs: &AttributeMap) -> ProviderResult<Self> {
        let path = format!("processors.{index}.type");
        let processor_type = get_string(attrs, "type")?
            .parse::<ProcessorType>()
            .map_err(|e| ProviderError::validation_error(path, e))?;
        Ok(Self {
            processor_type,
            forward: get_optional_string(attrs, "forward")?,
            log_dir: get_optional_string(attrs, "log_dir")?,
        })
    }
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|s| !s.is_empty()).cloned()
}

/// Fold the processor list into the wire mapping keyed by type.
///
/// Empty `forward`/`log_dir` are dropped. When two entries share a type the
/// later one replaces the earlier one.
pub fn processors_to_wire(specs: &[ProcessorSpec]) -> BTreeMap<String, ProcessorConfig> {
    let mut processors = BTreeMap::new();
    for spec in specs {
        processors.insert(
            spec.processor_type.as_str().to_string(),
            ProcessorConfig {
                forward: non_empty(&spec.forward),
                log_dir: non_empty(&spec.log_dir),
            },
        );
    }
    processors
}

/// Flatten the wire mapping back into the host list, in key order.
pub fn processors_from_wire(processors: &BTreeMap<String, ProcessorConfig>) -> Vec<AttributeValue> {
    processors
        .iter()
        .map(|(processor_type, config)| {
            let mut entry = AttributeMap::new();
            entry.insert("type".to_string(), processor_type.clone().into());
            if let Some(forward) = &config.forward {
                entry.insert("forward".to_string(), forward.clone().into());
            }
            if let Some(log_dir) = &config.log_dir {
                entry.insert("log_dir".to_string(), log_dir.clone().into());
            }
            AttributeValue::Map(entry)
        })
        .collect()
}

fn tag_from_attribute(key: &str, value: &AttributeValue) -> ProviderResult<TagValue> {
    match value {
        AttributeValue::Bool(b) => Ok(TagValue::Bool(*b)),
        AttributeValue::Int(i) => Ok(TagValue::Int(*i)),
        AttributeValue::Float(f) => Ok(TagValue::Float(*f)),
        AttributeValue::String(s) => Ok(TagValue::String(s.clone())),
        other => Err(ProviderError::validation_error(
            format!("tags.{key}"),
            format!("expected scalar value, found {}", other.kind_name()),
        )),
    }
}

fn tag_to_attribute(value: &TagValue) -> AttributeValue {
    match value {
        TagValue::Bool(b) => AttributeValue::Bool(*b),
        TagValue::Int(i) => AttributeValue::Int(*i),
        TagValue::Float(f) => AttributeValue::Float(*f),
        TagValue::String(s) => AttributeValue::String(s.clone()),
    }
}

impl Job {
    /// Build a job from host attributes, validating them against the
    /// `dkron_job` schema first.
    pub fn from_attributes(attrs: &AttributeMap) -> ProviderResult<Self> {
        job_schema().validate(attrs)?;

        let retries = u32::try_from(get_int(attrs, "retries")?).map_err(|_| {
            ProviderError::validation_error("retries", "must be a non-negative integer")
        })?;

        let mut tags = BTreeMap::new();
        if let Some(map) = get_map(attrs, "tags")? {
            for (key, value) in map {
                tags.insert(key.clone(), tag_from_attribute(key, value)?);
            }
        }

        let dependent_jobs = get_list(attrs, "dependent_jobs")?
            .iter()
            .enumerate()
            .map(|(index, item)| {
                item.as_str().map(str::to_string).ok_or_else(|| {
                    ProviderError::validation_error(
                        format!("dependent_jobs.{index}"),
                        "expected string",
                    )
                })
            })
            .collect::<ProviderResult<Vec<_>>>()?;

        let specs = get_list(attrs, "processors")?
            .iter()
            .enumerate()
            .map(|(index, item)| match item.as_map() {
                Some(map) => ProcessorSpec::from_attributes(index, map),
                None => Err(ProviderError::validation_error(
                    format!("processors.{index}"),
                    "expected block",
                )),
            })
            .collect::<ProviderResult<Vec<_>>>()?;

        Ok(Job {
            name: get_string(attrs, "name")?,
            schedule: get_string(attrs, "schedule")?,
            owner: get_string(attrs, "owner")?,
            owner_email: get_string(attrs, "owner_email")?,
            disabled: get_bool(attrs, "disabled")?,
            tags,
            dependent_jobs,
            retries,
            processors: processors_to_wire(&specs),
            concurrency: get_string(attrs, "concurrency")?,
            executor: get_string(attrs, "executor")?,
            timezone: get_string(attrs, "timezone")?,
            parent_job: get_string(attrs, "parent_job")?,
            executor_config: ExecutorConfig {
                command: get_string(attrs, "command")?,
                timeout: get_string(attrs, "timeout")?,
                project: get_string(attrs, "project")?,
                mem_limit_kb: get_string(attrs, "mem_limit_kb")?,
                cwd: get_string(attrs, "cwd")?,
                shell: get_bool(attrs, "shell")?,
                allowed_exitcodes: get_string(attrs, "allowed_exitcodes")?,
            },
        })
    }

    /// Write every field back as host attributes.
    pub fn to_attributes(&self) -> AttributeMap {
        let mut attrs = AttributeMap::new();
        let mut set = |key: &str, value: AttributeValue| {
            attrs.insert(key.to_string(), value);
        };

        set("name", self.name.clone().into());
        set("parent_job", self.parent_job.clone().into());
        set("schedule", self.schedule.clone().into());
        set("timezone", self.timezone.clone().into());
        set("owner", self.owner.clone().into());
        set("owner_email", self.owner_email.clone().into());
        set("disabled", self.disabled.into());
        set("retries", i64::from(self.retries).into());
        set("concurrency", self.concurrency.clone().into());
        set("executor", self.executor.clone().into());

        let config = &self.executor_config;
        set("command", config.command.clone().into());
        set("timeout", config.timeout.clone().into());
        set("project", config.project.clone().into());
        set("mem_limit_kb", config.mem_limit_kb.clone().into());
        set("cwd", config.cwd.clone().into());
        set("shell", config.shell.into());
        set("allowed_exitcodes", config.allowed_exitcodes.clone().into());

        let tags: AttributeMap = self
            .tags
            .iter()
            .map(|(k, v)| (k.clone(), tag_to_attribute(v)))
            .collect();
        set("tags", tags.into());
        set(
            "dependent_jobs",
            self.dependent_jobs
                .iter()
                .cloned()
                .map(AttributeValue::String)
                .collect::<Vec<_>>()
                .into(),
        );
        set("processors", processors_from_wire(&self.processors).into());

        attrs
    }
}
