//! Test data builders for `dkron_job` attribute sets

use dkron_domain::{AttributeMap, AttributeValue};

/// Builder for host-side `dkron_job` attributes.
///
/// Starts with every required attribute set, so `build()` on a fresh builder
/// passes schema validation.
pub struct JobAttributesBuilder {
    attributes: AttributeMap,
}

impl JobAttributesBuilder {
    pub fn new(name: &str) -> Self {
        let mut attributes = AttributeMap::new();
        attributes.insert("name".to_string(), name.into());
        attributes.insert("executor".to_string(), "shell".into());
        attributes.insert("command".to_string(), "echo hello".into());
        attributes.insert("timeout".to_string(), "30s".into());
        attributes.insert("project".to_string(), "default".into());
        attributes.insert("allowed_exitcodes".to_string(), "0".into());
        attributes.insert("tags".to_string(), AttributeValue::Map(AttributeMap::new()));
        attributes.insert("processors".to_string(), AttributeValue::List(Vec::new()));
        Self { attributes }
    }

    pub fn with<V: Into<AttributeValue>>(mut self, key: &str, value: V) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }

    pub fn without(mut self, key: &str) -> Self {
        self.attributes.remove(key);
        self
    }

    pub fn with_name(self, name: &str) -> Self {
        self.with("name", name)
    }

    pub fn with_schedule(self, schedule: &str) -> Self {
        self.with("schedule", schedule)
    }

    pub fn with_command(self, command: &str) -> Self {
        self.with("command", command)
    }

    pub fn with_retries(self, retries: i64) -> Self {
        self.with("retries", retries)
    }

    pub fn with_shell(self, shell: bool) -> Self {
        self.with("shell", shell)
    }

    pub fn disabled(self) -> Self {
        self.with("disabled", true)
    }

    pub fn with_tag<V: Into<AttributeValue>>(mut self, key: &str, value: V) -> Self {
        if let Some(AttributeValue::Map(tags)) = self.attributes.get_mut("tags") {
            tags.insert(key.to_string(), value.into());
        }
        self
    }

    /// Append a processor block; empty strings are kept as given.
    pub fn with_processor(mut self, processor_type: &str, forward: Option<&str>, log_dir: Option<&str>) -> Self {
        let mut block = AttributeMap::new();
        block.insert("type".to_string(), processor_type.into());
        if let Some(forward) = forward {
            block.insert("forward".to_string(), forward.into());
        }
        if let Some(log_dir) = log_dir {
            block.insert("log_dir".to_string(), log_dir.into());
        }
        if let Some(AttributeValue::List(processors)) = self.attributes.get_mut("processors") {
            processors.push(AttributeValue::Map(block));
        }
        self
    }

    pub fn with_dependent_jobs(self, jobs: &[&str]) -> Self {
        let jobs: Vec<AttributeValue> = jobs.iter().map(|j| (*j).into()).collect();
        self.with("dependent_jobs", jobs)
    }

    pub fn build(self) -> AttributeMap {
        self.attributes
    }
}
