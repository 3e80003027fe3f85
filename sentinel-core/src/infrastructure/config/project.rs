// sentinel-core/src/infrastructure/config/project.rs

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{info, instrument};
use validator::Validate;

use crate::domain::entity::EntityConfig;
use crate::infrastructure::error::InfrastructureError;

const CONFIG_CANDIDATES: [&str; 2] = ["sentinel.yaml", "sentinel_project.yaml"];

#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct ProjectConfig {
    #[validate(length(min = 1, message = "Project name cannot be empty"))]
    pub name: String,

    #[serde(default = "default_version")]
    pub version: String,

    /// DuckDB file holding source tables and result tables.
    #[serde(default = "default_database")]
    pub database: String,

    /// Rule file or directory of rule files.
    #[serde(rename = "rules-path", default = "default_rules_path")]
    pub rules_path: String,

    #[validate(nested)]
    #[serde(default)]
    pub sources: Vec<SourceConfig>,

    #[validate(nested)]
    #[serde(default)]
    pub entities: Vec<EntityConfig>,
}

/// A CSV file exposed to the warehouse as a view.
#[derive(Debug, Serialize, Deserialize, Clone, Validate)]
pub struct SourceConfig {
    #[validate(length(min = 1, message = "Source name cannot be empty"))]
    pub name: String,
    #[validate(length(min = 1, message = "Source path cannot be empty"))]
    pub path: String,
}

fn default_version() -> String {
    "1.0.0".to_string()
}
fn default_database() -> String {
    "sentinel.duckdb".to_string()
}
fn default_rules_path() -> String {
    "rules".to_string()
}

impl ProjectConfig {
    pub fn entity(&self, name: &str) -> Option<&EntityConfig> {
        self.entities.iter().find(|e| e.name == name)
    }

    /// Resolves a project-relative path against `project_dir`.
    pub fn resolve(project_dir: &Path, path: &str) -> PathBuf {
        let raw = Path::new(path);
        if raw.is_absolute() || path == ":memory:" {
            raw.to_path_buf()
        } else {
            project_dir.join(raw)
        }
    }
}

#[instrument(skip(project_dir))]
pub fn load_project_config(project_dir: &Path) -> Result<ProjectConfig, InfrastructureError> {
    let config_path = find_main_config(project_dir)?;
    info!(path = ?config_path, "Loading project configuration");

    let content = fs::read_to_string(&config_path)?;
    let mut config: ProjectConfig = serde_yaml::from_str(&content)?;

    apply_env_overrides(&mut config);
    config.validate()?;

    let mut seen = std::collections::HashSet::new();
    if let Some(dup) = config.entities.iter().find(|e| !seen.insert(e.name.as_str())) {
        return Err(InfrastructureError::ConfigError(format!(
            "Entity '{}' is declared more than once",
            dup.name
        )));
    }

    info!(entities = config.entities.len(), "Project configuration loaded");
    Ok(config)
}

fn find_main_config(root: &Path) -> Result<PathBuf, InfrastructureError> {
    CONFIG_CANDIDATES
        .iter()
        .map(|f| root.join(f))
        .find(|p| p.exists())
        .ok_or_else(|| {
            InfrastructureError::ConfigNotFound(format!(
                "No configuration file found in {:?}. Checked: {:?}",
                root, CONFIG_CANDIDATES
            ))
        })
}

fn apply_env_overrides(config: &mut ProjectConfig) {
    if let Ok(val) = std::env::var("SENTINEL_DATABASE") {
        info!(old = ?config.database, new = ?val, "Overriding database via ENV");
        config.database = val;
    }
    if let Ok(val) = std::env::var("SENTINEL_RULES_PATH") {
        info!(old = ?config.rules_path, new = ?val, "Overriding rules path via ENV");
        config.rules_path = val;
    }
}
