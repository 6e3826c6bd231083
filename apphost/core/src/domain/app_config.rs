// Copyright (c) 2026 100monkeys.ai
// SPDX-License-Identifier: AGPL-3.0

// AppHost Configuration Types
//
// Kubernetes-style manifest (apiVersion/kind/metadata/spec) describing:
// - Keycloak resource name and pinned host ports
// - Optional API service container
// - Developer certificate policy
// - Container runtime settings
// - Parameter values

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::path::{Path, PathBuf};

pub const API_VERSION: &str = "apphost.dev/v1";
pub const KIND: &str = "AppHostConfig";

/// Top-level AppHost configuration manifest
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppHostConfigManifest {
    /// API version (must be "apphost.dev/v1")
    #[serde(rename = "apiVersion")]
    pub api_version: String,

    /// Resource kind (must be "AppHostConfig")
    pub kind: String,

    pub metadata: ManifestMetadata,

    #[serde(default)]
    pub spec: AppHostConfigSpec,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManifestMetadata {
    /// Application name; also the prefix of generated volume names
    pub name: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub labels: Option<HashMap<String, String>>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppHostConfigSpec {
    #[serde(default)]
    pub keycloak: KeycloakConfig,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_service: Option<ApiServiceConfig>,

    #[serde(default)]
    pub dev_certs: DevCertsConfig,

    #[serde(default)]
    pub runtime: RuntimeConfig,

    /// Parameter values by parameter name
    #[serde(default)]
    pub parameters: HashMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeycloakConfig {
    #[serde(default = "default_keycloak_name")]
    pub name: String,

    /// Pinned host port for the plaintext endpoint (None = ephemeral)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_port: Option<u16>,

    /// Pinned host port for the HTTPS endpoint (None = ephemeral)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub https_port: Option<u16>,

    /// Data volume name. Empty string derives a name from the application.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data_volume: Option<String>,

    /// Host directory of realm JSON files imported on start
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm_import: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiServiceConfig {
    #[serde(default = "default_api_service_name")]
    pub name: String,

    pub image: String,

    #[serde(default = "default_tag")]
    pub tag: String,

    #[serde(default = "default_api_target_port")]
    pub target_port: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,

    #[serde(default = "default_health_path")]
    pub health_path: String,

    /// Extra environment variables for the service container
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub environment: BTreeMap<String, String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DevCertsConfig {
    /// Default HTTPS policy for resources without their own annotation
    #[serde(default = "default_true")]
    pub use_for_https: bool,

    /// Directory holding cert.pem, key.pem and optionally cert.pfx.
    /// Default: ~/.apphost/dev-certs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub directory: Option<PathBuf>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub pfx_password: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Path to Docker socket. Default: auto-detect
    #[serde(skip_serializing_if = "Option::is_none")]
    pub docker_socket_path: Option<String>,

    /// Pull images that are missing locally
    #[serde(default = "default_true")]
    pub autopull: bool,

    /// How long to wait for health checks after start
    #[serde(default = "default_health_timeout")]
    pub health_timeout_seconds: u64,
}

fn default_true() -> bool {
    true
}

fn default_keycloak_name() -> String {
    "keycloak".to_string()
}

fn default_api_service_name() -> String {
    "apiservice".to_string()
}

fn default_tag() -> String {
    "latest".to_string()
}

fn default_api_target_port() -> u16 {
    8080
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_health_timeout() -> u64 {
    120
}

impl Default for KeycloakConfig {
    fn default() -> Self {
        Self {
            name: default_keycloak_name(),
            http_port: Some(8080),
            https_port: Some(8093),
            data_volume: Some("keycloak".to_string()),
            realm_import: None,
        }
    }
}

impl Default for DevCertsConfig {
    fn default() -> Self {
        Self {
            use_for_https: true,
            directory: None,
            pfx_password: None,
        }
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self {
            docker_socket_path: None,
            autopull: true,
            health_timeout_seconds: default_health_timeout(),
        }
    }
}

impl Default for AppHostConfigManifest {
    fn default() -> Self {
        Self {
            api_version: API_VERSION.to_string(),
            kind: KIND.to_string(),
            metadata: ManifestMetadata {
                name: "keycloak-apphost".to_string(),
                labels: None,
            },
            spec: AppHostConfigSpec::default(),
        }
    }
}

impl DevCertsConfig {
    pub fn resolved_directory(&self) -> Option<PathBuf> {
        self.directory
            .clone()
            .or_else(|| dirs::home_dir().map(|home| home.join(".apphost").join("dev-certs")))
    }
}

impl AppHostConfigManifest {
    /// Load configuration from YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config = serde_yaml::from_str(&content)?;
        Ok(config)
    }

    pub fn to_yaml_file(&self, path: impl AsRef<Path>) -> anyhow::Result<()> {
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    pub fn from_yaml_str(yaml: &str) -> anyhow::Result<Self> {
        let config = serde_yaml::from_str(yaml)?;
        Ok(config)
    }

    /// Discover configuration file using precedence order
    /// 1. APPHOST_CONFIG_PATH environment variable
    /// 2. ./apphost.yaml (working directory)
    /// 3. ~/.apphost/config.yaml (user home)
    /// 4. /etc/apphost/config.yaml (system, Unix)
    pub fn discover_config() -> Option<PathBuf> {
        if let Ok(path) = std::env::var("APPHOST_CONFIG_PATH") {
            let path = PathBuf::from(path);
            if path.exists() {
                return Some(path);
            }
        }

        let cwd = PathBuf::from("./apphost.yaml");
        if cwd.exists() {
            return Some(cwd);
        }

        if let Some(home) = dirs::home_dir() {
            let user_config = home.join(".apphost").join("config.yaml");
            if user_config.exists() {
                return Some(user_config);
            }
        }

        #[cfg(unix)]
        {
            let system_config = PathBuf::from("/etc/apphost/config.yaml");
            if system_config.exists() {
                return Some(system_config);
            }
        }

        None
    }

    /// Load configuration with discovery, fallback to default
    pub fn load_or_default(cli_path: Option<PathBuf>) -> anyhow::Result<Self> {
        // Explicit CLI path fails if missing/invalid
        if let Some(path) = cli_path {
            tracing::info!("Loading configuration from explicit path: {:?}", path);
            let mut config = Self::from_yaml_file(&path)
                .map_err(|e| anyhow::anyhow!("Failed to load config at {:?}: {}", path, e))?;
            config.apply_env_overrides();
            return Ok(config);
        }

        if let Some(config_path) = Self::discover_config() {
            tracing::info!("Loading configuration from discovered path: {:?}", config_path);
            let mut config = Self::from_yaml_file(config_path)?;
            config.apply_env_overrides();
            Ok(config)
        } else {
            tracing::warn!("No configuration file found in standard locations. Using defaults.");
            let mut config = Self::default();
            config.apply_env_overrides();
            Ok(config)
        }
    }

    /// Apply environment variable overrides to configuration
    pub fn apply_env_overrides(&mut self) {
        if let Ok(val) = std::env::var("APPHOST_USE_DEV_CERT") {
            match parse_bool(&val) {
                Some(flag) => {
                    tracing::info!("Environment override: APPHOST_USE_DEV_CERT={}", flag);
                    self.spec.dev_certs.use_for_https = flag;
                }
                None => {
                    tracing::warn!(
                        "Invalid value for APPHOST_USE_DEV_CERT: '{}'. Expected true/false. Ignoring.",
                        val
                    );
                }
            }
        }

        if let Ok(socket) = std::env::var("APPHOST_DOCKER_SOCKET") {
            tracing::info!("Environment override: APPHOST_DOCKER_SOCKET={}", socket);
            self.spec.runtime.docker_socket_path = Some(socket);
        }
    }

    /// Validate configuration
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.api_version != API_VERSION {
            anyhow::bail!("Invalid apiVersion: '{}'. Must be '{}'", self.api_version, API_VERSION);
        }

        if self.kind != KIND {
            anyhow::bail!("Invalid kind: '{}'. Must be '{}'", self.kind, KIND);
        }

        if self.metadata.name.is_empty() {
            anyhow::bail!("metadata.name cannot be empty");
        }

        if self.spec.keycloak.name.is_empty() {
            anyhow::bail!("spec.keycloak.name cannot be empty");
        }

        for (field, port) in [
            ("spec.keycloak.http_port", self.spec.keycloak.http_port),
            ("spec.keycloak.https_port", self.spec.keycloak.https_port),
        ] {
            if port == Some(0) {
                anyhow::bail!("{} cannot be 0; omit it to get an ephemeral port", field);
            }
        }

        if let (Some(http), Some(https)) = (self.spec.keycloak.http_port, self.spec.keycloak.https_port) {
            if http == https {
                anyhow::bail!("spec.keycloak.http_port and https_port are both {}", http);
            }
        }

        if let Some(api) = &self.spec.api_service {
            if api.image.is_empty() {
                anyhow::bail!("spec.api_service.image cannot be empty");
            }
            if api.name == self.spec.keycloak.name {
                anyhow::bail!("spec.api_service.name collides with the Keycloak resource name");
            }
            if !api.health_path.starts_with('/') {
                anyhow::bail!("spec.api_service.health_path must start with '/'");
            }
        }

        Ok(())
    }
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Some(true),
        "false" | "0" | "no" | "off" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_manifest() {
        let manifest = AppHostConfigManifest::default();
        assert_eq!(manifest.api_version, "apphost.dev/v1");
        assert_eq!(manifest.kind, "AppHostConfig");
        assert_eq!(manifest.spec.keycloak.http_port, Some(8080));
        assert_eq!(manifest.spec.keycloak.https_port, Some(8093));
        assert!(manifest.spec.api_service.is_none());
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_parse_minimal_yaml() {
        let yaml = r#"
apiVersion: apphost.dev/v1
kind: AppHostConfig
metadata:
  name: demo
spec:
  keycloak:
    name: idp
    https_port: 9443
  api_service:
    image: ghcr.io/example/api
    environment:
      APP_ENV: development
  parameters:
    username: admin
"#;
        let manifest = AppHostConfigManifest::from_yaml_str(yaml).unwrap();
        assert_eq!(manifest.metadata.name, "demo");
        assert_eq!(manifest.spec.keycloak.name, "idp");
        assert_eq!(manifest.spec.keycloak.http_port, None);
        assert_eq!(manifest.spec.keycloak.https_port, Some(9443));

        let api = manifest.spec.api_service.as_ref().unwrap();
        assert_eq!(api.name, "apiservice");
        assert_eq!(api.tag, "latest");
        assert_eq!(api.health_path, "/health");
        assert_eq!(api.environment["APP_ENV"], "development");
        assert_eq!(manifest.spec.parameters["username"], "admin");
        assert!(manifest.spec.dev_certs.use_for_https);
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_validation() {
        let mut manifest = AppHostConfigManifest::default();

        manifest.api_version = "wrong/v1".to_string();
        assert!(manifest.validate().is_err());
        manifest.api_version = API_VERSION.to_string();

        manifest.kind = "NodeConfig".to_string();
        assert!(manifest.validate().is_err());
        manifest.kind = KIND.to_string();

        manifest.spec.keycloak.https_port = Some(8080);
        assert!(manifest.validate().is_err());
        manifest.spec.keycloak.https_port = Some(0);
        assert!(manifest.validate().is_err());
        manifest.spec.keycloak.https_port = None;
        assert!(manifest.validate().is_ok());
    }

    #[test]
    fn test_yaml_file_roundtrip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("apphost.yaml");

        let mut manifest = AppHostConfigManifest::default();
        manifest.spec.parameters.insert("username".to_string(), "ops".to_string());
        manifest.to_yaml_file(&path).unwrap();

        let loaded = AppHostConfigManifest::load_or_default(Some(path)).unwrap();
        assert_eq!(loaded.spec.parameters["username"], "ops");
        assert_eq!(loaded.spec.keycloak.data_volume.as_deref(), Some("keycloak"));
    }

    #[test]
    fn test_parse_bool() {
        assert_eq!(parse_bool("Yes"), Some(true));
        assert_eq!(parse_bool("off"), Some(false));
        assert_eq!(parse_bool("maybe"), None);
    }
}
