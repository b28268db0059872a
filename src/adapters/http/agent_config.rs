//! Agent configuration endpoints.
//!
//! - GET /config/current - The loaded agent definition, summarized
//! - GET /config/list - Definition files in the configs directory
//! - PUT /config - Load a definition file and swap the agent
//!
//! Swapping is refused while any conversation is active.

use std::path::{Path, PathBuf};

use axum::extract::{Json, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, put};
use axum::Router;
use serde::{Deserialize, Serialize};

use crate::config::{load_agent_definition, DefinitionLoadError};
use crate::domain::conversation::ConversationStatus;
use crate::domain::fields::FieldType;
use crate::domain::turn::AgentContext;

use super::error::ApiError;
use super::state::IntakeAppState;

// ════════════════════════════════════════════════════════════════════════════════
// DTOs
// ════════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Deserialize)]
pub struct ConfigLoadRequest {
    /// File stem or file name inside the configs directory.
    pub config_name: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfigInfo {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct FieldSummary {
    pub name: String,
    #[serde(rename = "type")]
    pub field_type: FieldType,
    pub required: bool,
    pub prompt_hint: Option<String>,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PersonalitySummary {
    pub tone: &'static str,
    pub style: String,
    pub formality: &'static str,
    pub emoji_usage: bool,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct LlmSummary {
    pub provider: String,
    pub model: String,
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct CurrentConfigResponse {
    pub loaded: bool,
    pub greeting: Option<String>,
    pub fields: Vec<FieldSummary>,
    pub personality: Option<PersonalitySummary>,
    pub llm: Option<LlmSummary>,
}

impl CurrentConfigResponse {
    fn unloaded() -> Self {
        Self {
            loaded: false,
            greeting: None,
            fields: Vec::new(),
            personality: None,
            llm: None,
        }
    }

    fn from_context(context: &AgentContext) -> Self {
        let definition = context.definition();
        let personality = &definition.personality;
        let info = context.ai().provider_info();
        Self {
            loaded: true,
            greeting: Some(definition.greeting.clone()),
            fields: definition
                .fields
                .iter()
                .map(|f| FieldSummary {
                    name: f.name.clone(),
                    field_type: f.field_type,
                    required: f.required,
                    prompt_hint: f.prompt_hint.clone(),
                })
                .collect(),
            personality: Some(PersonalitySummary {
                tone: personality.tone.as_str(),
                style: personality.style.clone(),
                formality: personality.formality.as_str(),
                emoji_usage: personality.emoji_usage,
            }),
            llm: Some(LlmSummary {
                provider: info.name,
                model: info.model,
            }),
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConfigLoadResponse {
    pub message: String,
    pub config_path: String,
    pub greeting: String,
    pub fields_count: usize,
}

// ════════════════════════════════════════════════════════════════════════════════
// Handlers
// ════════════════════════════════════════════════════════════════════════════════

/// GET /config/current
pub async fn get_current_config(State(state): State<IntakeAppState>) -> Json<CurrentConfigResponse> {
    Json(match state.agent().await {
        Some(context) => CurrentConfigResponse::from_context(&context),
        None => CurrentConfigResponse::unloaded(),
    })
}

/// GET /config/list - `.yaml` and `.yml` files, sorted by name.
/// A missing directory lists nothing.
pub async fn list_configs(
    State(state): State<IntakeAppState>,
) -> Result<Json<Vec<ConfigInfo>>, ApiError> {
    let mut entries = match tokio::fs::read_dir(&state.configs_dir).await {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Json(Vec::new())),
        Err(e) => return Err(ApiError::Internal(e.to_string())),
    };

    let mut configs = Vec::new();
    while let Some(entry) = entries
        .next_entry()
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?
    {
        let path = entry.path();
        let is_yaml = matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("yaml") | Some("yml")
        );
        if !is_yaml {
            continue;
        }
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            configs.push(ConfigInfo {
                name: stem.to_string(),
                path: path.display().to_string(),
            });
        }
    }
    configs.sort_by(|a, b| a.name.cmp(&b.name));
    Ok(Json(configs))
}

/// PUT /config - Load a definition file and replace the agent.
///
/// # Errors
/// - 400 Bad Request: Name escapes the configs directory, or the file is invalid
/// - 404 Not Found: No such file
/// - 409 Conflict: Conversations are still active
pub async fn load_config(
    State(state): State<IntakeAppState>,
    Json(request): Json<ConfigLoadRequest>,
) -> Result<impl IntoResponse, ApiError> {
    let active = state
        .store
        .count(Some(ConversationStatus::Active))
        .await
        .map_err(|e| ApiError::Internal(e.to_string()))?;
    if active > 0 {
        return Err(ApiError::Conflict(format!(
            "Cannot change configuration while {} conversation(s) are active. \
             Please end all conversations first.",
            active
        )));
    }

    let path = resolve_config_path(&state.configs_dir, &request.config_name)?;

    let definition = load_agent_definition(&path).map_err(|e| match e {
        DefinitionLoadError::Io { .. } => ApiError::Internal(e.to_string()),
        other => ApiError::BadRequest(format!("Invalid configuration: {}", other)),
    })?;
    let context = AgentContext::new(definition, state.ai.clone())
        .map_err(|e| ApiError::BadRequest(format!("Invalid configuration: {}", e)))?;

    let response = ConfigLoadResponse {
        message: format!("Configuration '{}' loaded successfully", request.config_name),
        config_path: path.display().to_string(),
        greeting: context.definition().greeting.clone(),
        fields_count: context.definition().fields.len(),
    };
    state.replace_agent(context).await;
    tracing::info!(config_path = %response.config_path, "agent configuration replaced");

    Ok((StatusCode::OK, Json(response)))
}

/// Maps a config name onto an existing file in `dir`, trying `.yaml`
/// then `.yml` when no extension is given.
fn resolve_config_path(dir: &Path, name: &str) -> Result<PathBuf, ApiError> {
    let name = name.trim();
    if name.is_empty() || name.contains(['/', '\\']) || name.contains("..") {
        return Err(ApiError::BadRequest(format!("Invalid configuration name '{}'", name)));
    }

    let candidates: Vec<String> = if name.ends_with(".yaml") || name.ends_with(".yml") {
        vec![name.to_string()]
    } else {
        vec![format!("{}.yaml", name), format!("{}.yml", name)]
    };

    candidates
        .into_iter()
        .map(|file| dir.join(file))
        .find(|path| path.is_file())
        .ok_or_else(|| {
            ApiError::NotFound(
                "Configuration file".to_string(),
                format!("{} in {}", name, dir.display()),
            )
        })
}

/// Config inspection and reload routes.
pub fn agent_config_routes() -> Router<IntakeAppState> {
    Router::new()
        .route("/config", put(load_config))
        .route("/config/current", get(get_current_config))
        .route("/config/list", get(list_configs))
}
