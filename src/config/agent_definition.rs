//! Agent definition file loading

use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::info;

use super::error::DefinitionLoadError;
use crate::domain::agent::AgentDefinition;

/// Where the agent definition lives
#[derive(Debug, Clone, Deserialize)]
pub struct AgentConfig {
    #[serde(default = "default_definition_path")]
    pub definition_path: PathBuf,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            definition_path: default_definition_path(),
        }
    }
}

fn default_definition_path() -> PathBuf {
    PathBuf::from("agent.yaml")
}

/// Parses and validates an agent definition from YAML text.
pub fn parse_agent_definition(
    yaml: &str,
    path: &Path,
) -> Result<AgentDefinition, DefinitionLoadError> {
    let definition: AgentDefinition =
        serde_yaml::from_str(yaml).map_err(|source| DefinitionLoadError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
    definition.validate()?;
    Ok(definition)
}

/// Reads, parses and validates an agent definition file.
///
/// # Errors
///
/// - `Io` if the file cannot be read
/// - `Parse` if the YAML does not match the definition shape
/// - `Invalid` if the definition fails validation
pub fn load_agent_definition(path: impl AsRef<Path>) -> Result<AgentDefinition, DefinitionLoadError> {
    let path = path.as_ref();
    let yaml = std::fs::read_to_string(path).map_err(|source| DefinitionLoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let definition = parse_agent_definition(&yaml, path)?;
    info!(
        path = %path.display(),
        fields = definition.fields.len(),
        policies = definition.escalation_policies.len(),
        "agent definition loaded"
    );
    Ok(definition)
}
