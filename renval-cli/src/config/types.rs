use std::path::PathBuf;

use renval_core::{CoreConfig, DEFAULT_MAX_EVALUATORS};
use serde::{Deserialize, Serialize};

/// Default host for the renval server
pub const DEFAULT_HOST: &str = "127.0.0.1";
/// Default port for the renval server
pub const DEFAULT_PORT: u16 = 7480;
pub const DEFAULT_DATABASE: &str = "renval.db";
pub const DEFAULT_ARTIFACTS_DIR: &str = "artifacts";
/// Default message gateway endpoint
pub const DEFAULT_INVITATION_ENDPOINT: &str = "http://localhost:2200/api/messages/send";

/// Configuration as stored in TOML files (with optional fields for merging)
#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawRenvalConfig {
    #[serde(default)]
    pub server: RawServerConfig,

    #[serde(default)]
    pub storage: RawStorageConfig,

    #[serde(default)]
    pub invitation: RawInvitationConfig,

    #[serde(default)]
    pub assessment: RawAssessmentConfig,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawServerConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawStorageConfig {
    /// SQLite database file
    pub database: Option<PathBuf>,
    /// Root directory of the artifact store
    pub artifacts_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawInvitationConfig {
    pub endpoint: Option<String>,
    pub template: Option<String>,
    pub portal_link: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Default)]
pub struct RawAssessmentConfig {
    pub max_evaluators: Option<usize>,
}

/// Final configuration with defaults applied
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct RenvalConfig {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub storage: StorageConfig,

    #[serde(default)]
    pub invitation: InvitationConfig,

    #[serde(default)]
    pub assessment: AssessmentConfig,
}

impl RenvalConfig {
    /// Settings handed to the core services
    pub fn core_config(&self) -> CoreConfig {
        CoreConfig {
            max_evaluators: self.assessment.max_evaluators,
            invitation_template: self.invitation.template.clone(),
            portal_link: self.invitation.portal_link.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageConfig {
    pub database: PathBuf,
    pub artifacts_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
            artifacts_dir: PathBuf::from(DEFAULT_ARTIFACTS_DIR),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InvitationConfig {
    /// Message gateway the invitations are posted to
    pub endpoint: String,
    pub template: String,
    /// Link participants are sent to
    pub portal_link: String,
}

impl Default for InvitationConfig {
    fn default() -> Self {
        let core = CoreConfig::default();
        Self {
            endpoint: DEFAULT_INVITATION_ENDPOINT.to_string(),
            template: core.invitation_template,
            portal_link: core.portal_link,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AssessmentConfig {
    pub max_evaluators: usize,
}

impl Default for AssessmentConfig {
    fn default() -> Self {
        Self {
            max_evaluators: DEFAULT_MAX_EVALUATORS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_values() {
        let config = RenvalConfig::default();
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.server.port, DEFAULT_PORT);
        assert_eq!(config.storage.database, PathBuf::from("renval.db"));
        assert_eq!(config.invitation.template, "fitAndProper");
        assert_eq!(config.invitation.portal_link, "https://renval.msdm.app/");
        assert_eq!(config.assessment.max_evaluators, 2);
    }

    #[test]
    fn test_toml_round_trip() {
        let config = RenvalConfig {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 8080,
            },
            assessment: AssessmentConfig { max_evaluators: 3 },
            ..Default::default()
        };

        let toml_str = toml::to_string(&config).unwrap();
        let parsed: RenvalConfig = toml::from_str(&toml_str).unwrap();

        assert_eq!(parsed, config);
    }

    #[test]
    fn test_raw_config_partial_parsing() {
        let toml_str = r#"
[server]
port = 9000

[invitation]
template = "renewal"
"#;
        let raw: RawRenvalConfig = toml::from_str(toml_str).unwrap();

        assert_eq!(raw.server.port, Some(9000));
        assert!(raw.server.host.is_none());
        assert_eq!(raw.invitation.template.as_deref(), Some("renewal"));
        assert!(raw.storage.database.is_none());
        assert!(raw.assessment.max_evaluators.is_none());
    }

    #[test]
    fn test_core_config_carries_assessment_settings() {
        let mut config = RenvalConfig::default();
        config.assessment.max_evaluators = 4;
        config.invitation.template = "renewal".to_string();

        let core = config.core_config();
        assert_eq!(core.max_evaluators, 4);
        assert_eq!(core.invitation_template, "renewal");
    }
}
