//! Static attribute schema of the `dkron_job` resource.
//!
//! The schema is what the host sees: a flat attribute set, with nested
//! blocks only for `processors`. Validation happens here, at the boundary,
//! so the mapping code can assume well-typed attributes.

use std::sync::OnceLock;

use dkron_errors::{ProviderError, ProviderResult};
use serde::Serialize;

use crate::attributes::{AttributeMap, AttributeValue};
use crate::job::ProcessorType;

pub const JOB_RESOURCE_TYPE: &str = "dkron_job";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type", content = "elem", rename_all = "snake_case")]
pub enum FieldKind {
    String,
    Int,
    Bool,
    /// String keys to scalar values.
    Map,
    List(Box<FieldKind>),
    Block(Vec<FieldSchema>),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldSchema {
    pub name: &'static str,
    pub kind: FieldKind,
    pub required: bool,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub allowed_values: Vec<&'static str>,
}

impl FieldSchema {
    pub fn required(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: true,
            allowed_values: Vec::new(),
        }
    }

    pub fn optional(name: &'static str, kind: FieldKind) -> Self {
        Self {
            name,
            kind,
            required: false,
            allowed_values: Vec::new(),
        }
    }

    pub fn one_of(mut self, values: Vec<&'static str>) -> Self {
        self.allowed_values = values;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResourceSchema {
    pub type_name: &'static str,
    pub fields: Vec<FieldSchema>,
}

impl ResourceSchema {
    pub fn field(&self, name: &str) -> Option<&FieldSchema> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Check an attribute set, reporting the first violation with its path.
    pub fn validate(&self, attrs: &AttributeMap) -> ProviderResult<()> {
        validate_block("", &self.fields, attrs)
    }
}

fn join_path(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else {
        format!("{prefix}.{name}")
    }
}

fn validate_block(prefix: &str, fields: &[FieldSchema], attrs: &AttributeMap) -> ProviderResult<()> {
    if let Some(unknown) = attrs.keys().find(|k| !fields.iter().any(|f| f.name == k.as_str())) {
        return Err(ProviderError::validation_error(
            join_path(prefix, unknown),
            "unsupported attribute",
        ));
    }

    for field in fields {
        let path = join_path(prefix, field.name);
        match attrs.get(field.name) {
            None if field.required => {
                return Err(ProviderError::validation_error(
                    path,
                    "required attribute is missing",
                ));
            }
            None => {}
            Some(value) => validate_value(&path, &field.kind, &field.allowed_values, value)?,
        }
    }
    Ok(())
}

fn validate_value(
    path: &str,
    kind: &FieldKind,
    allowed: &[&'static str],
    value: &AttributeValue,
) -> ProviderResult<()> {
    let mismatch = |expected: &str| {
        ProviderError::validation_error(
            path,
            format!("expected {expected}, found {}", value.kind_name()),
        )
    };

    match (kind, value) {
        (FieldKind::String, AttributeValue::String(s)) => {
            if !allowed.is_empty() && !allowed.contains(&s.as_str()) {
                return Err(ProviderError::validation_error(
                    path,
                    format!("expected one of [{}], got '{s}'", allowed.join(", ")),
                ));
            }
            Ok(())
        }
        (FieldKind::String, _) => Err(mismatch("string")),
        (FieldKind::Int, AttributeValue::Int(_)) => Ok(()),
        (FieldKind::Int, _) => Err(mismatch("int")),
        (FieldKind::Bool, AttributeValue::Bool(_)) => Ok(()),
        (FieldKind::Bool, _) => Err(mismatch("bool")),
        (FieldKind::Map, AttributeValue::Map(map)) => {
            match map.iter().find(|(_, v)| !v.is_scalar()) {
                Some((key, v)) => Err(ProviderError::validation_error(
                    join_path(path, key),
                    format!("expected scalar value, found {}", v.kind_name()),
                )),
                None => Ok(()),
            }
        }
        (FieldKind::Map, _) => Err(mismatch("map")),
        (FieldKind::List(elem), AttributeValue::List(items)) => {
            for (index, item) in items.iter().enumerate() {
                validate_value(&join_path(path, &index.to_string()), elem, allowed, item)?;
            }
            Ok(())
        }
        (FieldKind::List(_), _) => Err(mismatch("list")),
        (FieldKind::Block(fields), AttributeValue::Map(map)) => validate_block(path, fields, map),
        (FieldKind::Block(_), _) => Err(mismatch("block")),
    }
}

fn build_job_schema() -> ResourceSchema {
    use FieldKind::*;

    let processor_block = Block(vec![
        FieldSchema::required("type", String).one_of(ProcessorType::names()),
        FieldSchema::optional("forward", String),
        FieldSchema::optional("log_dir", String),
    ]);

    ResourceSchema {
        type_name: JOB_RESOURCE_TYPE,
        fields: vec![
            FieldSchema::required("name", String),
            FieldSchema::optional("parent_job", String),
            FieldSchema::optional("schedule", String),
            FieldSchema::optional("timezone", String),
            FieldSchema::optional("owner", String),
            FieldSchema::optional("retries", Int),
            FieldSchema::optional("owner_email", String),
            FieldSchema::optional("disabled", Bool),
            FieldSchema::optional("concurrency", String),
            FieldSchema::required("executor", String),
            FieldSchema::required("command", String),
            FieldSchema::required("timeout", String),
            FieldSchema::optional("cwd", String),
            FieldSchema::optional("shell", Bool),
            FieldSchema::optional("mem_limit_kb", String),
            FieldSchema::required("project", String),
            FieldSchema::required("allowed_exitcodes", String),
            FieldSchema::required("tags", Map),
            FieldSchema::required("processors", List(Box::new(processor_block))),
            FieldSchema::optional("dependent_jobs", List(Box::new(String))),
        ],
    }
}

/// Schema of the `dkron_job` resource.
pub fn job_schema() -> &'static ResourceSchema {
    static SCHEMA: OnceLock<ResourceSchema> = OnceLock::new();
    SCHEMA.get_or_init(build_job_schema)
}
