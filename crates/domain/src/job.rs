use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::de::IgnoredAny;
use serde::{Deserialize, Deserializer, Serialize};

/// A Dkron job as exchanged with `/v1/jobs`.
///
/// Every field defaults when missing from a response, and `null` collections
/// decode as empty. Fields the service adds on its own (status, counters,
/// timestamps) are ignored.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Job {
    pub name: String,
    pub schedule: String,
    pub owner: String,
    pub owner_email: String,
    pub disabled: bool,
    #[serde(deserialize_with = "null_as_default")]
    pub tags: BTreeMap<String, TagValue>,
    #[serde(deserialize_with = "null_as_default")]
    pub dependent_jobs: Vec<String>,
    pub retries: u32,
    /// Processor type name -> processor settings.
    #[serde(deserialize_with = "null_as_default")]
    pub processors: BTreeMap<String, ProcessorConfig>,
    pub concurrency: String,
    pub executor: String,
    pub timezone: String,
    pub parent_job: String,
    #[serde(deserialize_with = "null_as_default")]
    pub executor_config: ExecutorConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutorConfig {
    pub command: String,
    pub timeout: String,
    pub project: String,
    pub mem_limit_kb: String,
    pub cwd: String,
    /// Sent as the string `"true"` or `"false"`.
    #[serde(with = "shell_flag")]
    pub shell: bool,
    pub allowed_exitcodes: String,
}

/// Settings of one processor. Dkron stores these as free-form values, so
/// booleans and numbers read back as their text form and other keys are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessorConfig {
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar_as_text"
    )]
    pub forward: Option<String>,
    #[serde(
        skip_serializing_if = "Option::is_none",
        deserialize_with = "scalar_as_text"
    )]
    pub log_dir: Option<String>,
}

/// Scalar tag value. Tags are used by Dkron for target node selection and
/// are passed through untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ProcessorType {
    Files,
    Log,
    Syslog,
    Fluent,
}

impl ProcessorType {
    pub const ALL: [ProcessorType; 4] = [
        ProcessorType::Files,
        ProcessorType::Log,
        ProcessorType::Syslog,
        ProcessorType::Fluent,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessorType::Files => "files",
            ProcessorType::Log => "log",
            ProcessorType::Syslog => "syslog",
            ProcessorType::Fluent => "fluent",
        }
    }

    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(ProcessorType::as_str).collect()
    }
}

impl FromStr for ProcessorType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "files" => Ok(ProcessorType::Files),
            "log" => Ok(ProcessorType::Log),
            "syslog" => Ok(ProcessorType::Syslog),
            "fluent" => Ok(ProcessorType::Fluent),
            _ => Err(format!(
                "Invalid processor type: {s}. Valid types: files, log, syslog, fluent"
            )),
        }
    }
}

impl fmt::Display for ProcessorType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

fn scalar_as_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Scalar {
        Text(String),
        Bool(bool),
        Int(i64),
        Float(f64),
        Other(IgnoredAny),
    }

    Ok(match Option::<Scalar>::deserialize(deserializer)? {
        Some(Scalar::Text(s)) => Some(s),
        Some(Scalar::Bool(b)) => Some(b.to_string()),
        Some(Scalar::Int(i)) => Some(i.to_string()),
        Some(Scalar::Float(f)) => Some(f.to_string()),
        Some(Scalar::Other(_)) | None => None,
    })
}

mod shell_flag {
    use serde::{de, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(value: &bool, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(if *value { "true" } else { "false" })
    }

    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<bool, D::Error> {
        match Option::<Flag>::deserialize(deserializer)? {
            None => Ok(false),
            Some(Flag::Bool(b)) => Ok(b),
            Some(Flag::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
                "true" => Ok(true),
                "false" | "" => Ok(false),
                other => Err(de::Error::custom(format!(
                    "invalid shell flag '{other}', expected \"true\" or \"false\""
                ))),
            },
        }
    }
}
