use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use dkron_domain::AttributeMap;
use dkron_provider_core::ResourceData;

/// Read a resource attribute file. `.toml` files are parsed as TOML,
/// anything else as JSON.
pub fn load_attributes(path: &Path) -> Result<AttributeMap> {
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read attribute file {}", path.display()))?;

    let is_toml = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("toml"));

    if is_toml {
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML attributes in {}", path.display()))
    } else {
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON attributes in {}", path.display()))
    }
}

/// Load the tracked resource, or an empty untracked one when the file is absent.
pub fn load_state(path: &Path) -> Result<ResourceData> {
    if !path.exists() {
        return Ok(ResourceData::default());
    }
    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read state file {}", path.display()))?;
    serde_json::from_str(&content)
        .with_context(|| format!("Failed to parse state file {}", path.display()))
}

pub fn save_state(path: &Path, data: &ResourceData) -> Result<()> {
    let content = serde_json::to_string_pretty(data).context("Failed to encode state")?;
    fs::write(path, content)
        .with_context(|| format!("Failed to write state file {}", path.display()))
}

pub fn remove_state(path: &Path) -> Result<()> {
    if path.exists() {
        fs::remove_file(path)
            .with_context(|| format!("Failed to remove state file {}", path.display()))?;
    }
    Ok(())
}
