//! Api tester configuration
//!
//! Base values come from environment variables with hard-coded fallbacks.
//! The datastore fields can then be overridden once from a mounted YAML
//! secret; that override is best-effort and never fatal.

use anyhow::Result;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{info, warn};

/// Api tester configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// Allowed request role (ALL, GET, POST, PUT, DELETE)
    #[serde(rename = "application_role", default = "default_role")]
    pub role: String,

    #[serde(rename = "application_version", default = "default_version")]
    pub version: String,

    #[serde(rename = "spring_profiles_active", default = "default_profile")]
    pub profile: String,

    /// Directory backed by a persistent volume
    #[serde(
        rename = "volume_path_persistent_volume_data",
        default = "default_path_persistent"
    )]
    pub path_persistent: String,

    /// Directory local to the pod
    #[serde(rename = "volume_path_pod_volume_data", default = "default_path_pod")]
    pub path_pod: String,

    /// Location of the mounted datasource secret
    #[serde(default = "default_postgresql_filepath")]
    pub postgresql_filepath: String,

    #[serde(default = "default_server_port")]
    pub server_port: u16,

    /// Display-only datastore descriptor
    #[serde(skip)]
    pub datasource: DatasourceConfig,
}

fn default_role() -> String {
    "ALL".to_string()
}

fn default_version() -> String {
    "Api Tester v1.0.0".to_string()
}

fn default_profile() -> String {
    "default".to_string()
}

fn default_path_persistent() -> String {
    "./files/pv/".to_string()
}

fn default_path_pod() -> String {
    "./files/pod/".to_string()
}

fn default_postgresql_filepath() -> String {
    "/etc/config/postgresql.yaml".to_string()
}

fn default_server_port() -> u16 {
    8080
}

/// Datastore descriptor shown by `/info`; never connected to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasourceConfig {
    pub driver_class_name: String,
    pub url: String,
    pub username: String,
    pub password: String,
}

impl Default for DatasourceConfig {
    fn default() -> Self {
        Self {
            driver_class_name: "org.postgresql.Driver".to_string(),
            url: "jdbc:postgresql://localhost:5432/db".to_string(),
            username: "user".to_string(),
            password: "pass".to_string(),
        }
    }
}

/// Keys recognized in the datasource secret file
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct DatasourceSecret {
    #[serde(rename = "driver-class-name")]
    driver_class_name: String,
    url: String,
    username: String,
    password: String,
}

#[derive(Debug, Error)]
pub enum SecretLoadError {
    #[error("Failed to parse datasource secret {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: config::ConfigError,
    },
}

impl AppConfig {
    /// Load configuration from the process environment
    pub fn load() -> Result<Self> {
        Self::from_environment(config::Environment::default())
    }

    /// Load configuration from an explicit variable map instead of the process
    /// environment
    pub fn from_env_map(vars: config::Map<String, String>) -> Result<Self> {
        Self::from_environment(config::Environment::default().source(Some(vars)))
    }

    fn from_environment(environment: config::Environment) -> Result<Self> {
        let config = config::Config::builder()
            .add_source(environment.ignore_empty(true))
            .build()?;

        Ok(config.try_deserialize()?)
    }

    /// Overwrite datastore fields from the mounted secret, if any
    ///
    /// Returns true when the secret was read. A missing file is silent; an
    /// unreadable one is logged and the current values are kept.
    pub fn apply_datasource_secret(&mut self) -> bool {
        let path = PathBuf::from(&self.postgresql_filepath);

        match read_datasource_secret(&path) {
            Ok(Some(secret)) => {
                self.datasource.merge(secret);
                info!(
                    event = "datasource_loaded",
                    path = %path.display(),
                    "DataSource properties loaded from YAML file"
                );
                true
            }
            Ok(None) => false,
            Err(e) => {
                warn!(error = %e, "Keeping default datasource properties");
                false
            }
        }
    }
}

impl DatasourceConfig {
    fn merge(&mut self, secret: DatasourceSecret) {
        let overrides = [
            (&mut self.driver_class_name, secret.driver_class_name),
            (&mut self.url, secret.url),
            (&mut self.username, secret.username),
            (&mut self.password, secret.password),
        ];

        for (field, value) in overrides {
            if !value.is_empty() {
                *field = value;
            }
        }
    }
}

fn read_datasource_secret(path: &Path) -> Result<Option<DatasourceSecret>, SecretLoadError> {
    if !path.exists() {
        return Ok(None);
    }

    let parse_err = |source| SecretLoadError::Parse {
        path: path.to_path_buf(),
        source,
    };

    config::Config::builder()
        .add_source(config::File::from(path).format(config::FileFormat::Yaml))
        .build()
        .and_then(|secret| secret.try_deserialize::<DatasourceSecret>())
        .map(Some)
        .map_err(parse_err)
}
