use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;

use super::types::{
    AssessmentConfig, InvitationConfig, RawAssessmentConfig, RawInvitationConfig,
    RawRenvalConfig, RawServerConfig, RawStorageConfig, RenvalConfig, ServerConfig,
    StorageConfig,
};

/// Environment variable overriding the project config directory
pub const PROJECT_CONFIG_DIR_ENV: &str = "RENVAL_PROJECT_CONFIG_DIR";

pub struct ConfigLoader;

impl ConfigLoader {
    /// Load merged configuration (user + project)
    pub fn load() -> Result<RenvalConfig> {
        Self::load_layers(Self::user_config_path(), Self::project_config_path())
    }

    /// Merge the given layers in order over the built-in defaults; missing
    /// files are skipped
    pub fn load_layers(user: Option<PathBuf>, project: PathBuf) -> Result<RenvalConfig> {
        let mut raw = RawRenvalConfig::default();

        // Layer 1: User config
        if let Some(user_path) = user
            && let Some(user_config) = Self::read_layer(&user_path)?
        {
            raw = Self::merge_raw(raw, user_config);
        }

        // Layer 2: Project config
        if let Some(project_config) = Self::read_layer(&project)? {
            raw = Self::merge_raw(raw, project_config);
        }

        Ok(Self::finalize(raw))
    }

    /// Get user config path (platform-specific)
    pub fn user_config_path() -> Option<PathBuf> {
        ProjectDirs::from("", "", "renval").map(|dirs| dirs.config_dir().join("config.toml"))
    }

    /// Get project config path
    /// Can be overridden with RENVAL_PROJECT_CONFIG_DIR env var
    pub fn project_config_path() -> PathBuf {
        if let Ok(dir) = std::env::var(PROJECT_CONFIG_DIR_ENV) {
            PathBuf::from(dir).join("config.toml")
        } else {
            PathBuf::from(".renval/config.toml")
        }
    }

    fn read_layer(path: &Path) -> Result<Option<RawRenvalConfig>> {
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        let config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse {}", path.display()))?;
        Ok(Some(config))
    }

    /// Merge two raw configs (overlay values override base only if explicitly set)
    fn merge_raw(base: RawRenvalConfig, overlay: RawRenvalConfig) -> RawRenvalConfig {
        RawRenvalConfig {
            server: RawServerConfig {
                host: overlay.server.host.or(base.server.host),
                port: overlay.server.port.or(base.server.port),
            },
            storage: RawStorageConfig {
                database: overlay.storage.database.or(base.storage.database),
                artifacts_dir: overlay.storage.artifacts_dir.or(base.storage.artifacts_dir),
            },
            invitation: RawInvitationConfig {
                endpoint: overlay.invitation.endpoint.or(base.invitation.endpoint),
                template: overlay.invitation.template.or(base.invitation.template),
                portal_link: overlay.invitation.portal_link.or(base.invitation.portal_link),
            },
            assessment: RawAssessmentConfig {
                max_evaluators: overlay
                    .assessment
                    .max_evaluators
                    .or(base.assessment.max_evaluators),
            },
        }
    }

    /// Convert raw config to final config with defaults applied
    fn finalize(raw: RawRenvalConfig) -> RenvalConfig {
        let server = ServerConfig::default();
        let storage = StorageConfig::default();
        let invitation = InvitationConfig::default();
        let assessment = AssessmentConfig::default();

        RenvalConfig {
            server: ServerConfig {
                host: raw.server.host.unwrap_or(server.host),
                port: raw.server.port.unwrap_or(server.port),
            },
            storage: StorageConfig {
                database: raw.storage.database.unwrap_or(storage.database),
                artifacts_dir: raw.storage.artifacts_dir.unwrap_or(storage.artifacts_dir),
            },
            invitation: InvitationConfig {
                endpoint: raw.invitation.endpoint.unwrap_or(invitation.endpoint),
                template: raw.invitation.template.unwrap_or(invitation.template),
                portal_link: raw.invitation.portal_link.unwrap_or(invitation.portal_link),
            },
            assessment: AssessmentConfig {
                max_evaluators: raw
                    .assessment
                    .max_evaluators
                    .unwrap_or(assessment.max_evaluators),
            },
        }
    }
}
