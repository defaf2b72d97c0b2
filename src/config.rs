//! Configuration management for the container registry
//!
//! Supports loading configuration from:
//! - Default values
//! - Config file (containers.toml)
//! - Environment variables (CONTAINERS__*)
//!
//! ## Example config file (containers.toml):
//! ```toml
//! [schema]
//! namespace = "avalon-core"
//! kind = "container"
//!
//! [identifiers]
//! current = "pyblish.avalon.container"
//! legacy = ["pyblish.mindbender.container"]
//!
//! [host]
//! names = ["houdini", "hython", "hpython"]
//! ```

use config_crate::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};

use crate::record::ContainerIds;
use crate::registry::{CONTAINER_KIND, DEFAULT_NAMESPACE};

/// Main configuration for the container registry
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContainerConfig {
    /// Schema lineage settings
    #[serde(default)]
    pub schema: SchemaSettings,

    /// Container identifiers written and recognised
    #[serde(default)]
    pub identifiers: ContainerIds,

    /// Host integration settings
    #[serde(default)]
    pub host: HostConfig,
}

/// Schema lineage configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SchemaSettings {
    /// Namespace of schema identifiers (`<namespace>:<kind>-<major>.<minor>`)
    #[serde(default = "default_namespace")]
    pub namespace: String,

    /// Kind of schema identifiers
    #[serde(default = "default_kind")]
    pub kind: String,
}

/// Host integration configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HostConfig {
    /// Host names registered on install
    #[serde(default = "default_host_names")]
    pub names: Vec<String>,
}

fn default_namespace() -> String {
    DEFAULT_NAMESPACE.to_string()
}

fn default_kind() -> String {
    CONTAINER_KIND.to_string()
}

fn default_host_names() -> Vec<String> {
    vec!["houdini".to_string(), "hython".to_string(), "hpython".to_string()]
}

impl Default for SchemaSettings {
    fn default() -> Self {
        Self {
            namespace: default_namespace(),
            kind: default_kind(),
        }
    }
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            names: default_host_names(),
        }
    }
}

impl ContainerConfig {
    /// Load configuration from default locations
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(None)
    }

    /// Load configuration from a specific file
    pub fn load_from(config_path: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = Config::builder();

        let config_locations = [
            "containers.toml",
            ".containers.toml",
            "config/containers.toml",
        ];

        for location in config_locations {
            builder = builder.add_source(File::with_name(location).required(false));
        }

        if let Some(config_dir) = directories::ProjectDirs::from("dev", "pipeline", "containers") {
            let xdg_config = config_dir.config_dir().join("containers.toml");
            if xdg_config.exists() {
                builder = builder.add_source(File::from(xdg_config).required(false));
            }
        }

        if let Some(path) = config_path {
            builder = builder.add_source(File::with_name(path).required(true));
        }

        builder = builder.add_source(
            Environment::with_prefix("CONTAINERS")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Save configuration to a file
    pub fn save(&self, path: &str) -> std::io::Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        std::fs::write(path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DEFAULT_CONTAINER_ID, DEFAULT_LEGACY_CONTAINER_ID};

    #[test]
    fn test_default_config() {
        let config = ContainerConfig::default();
        assert_eq!(config.schema.namespace, "pipeline");
        assert_eq!(config.identifiers.current, DEFAULT_CONTAINER_ID);
        assert_eq!(config.identifiers.legacy, vec![DEFAULT_LEGACY_CONTAINER_ID]);
        assert_eq!(config.host.names.len(), 3);
    }

    #[test]
    fn test_serialize_config() {
        let config = ContainerConfig::default();
        let toml_str = toml::to_string_pretty(&config).unwrap();
        assert!(toml_str.contains("[schema]"));
        assert!(toml_str.contains("[identifiers]"));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("custom.toml");
        std::fs::write(
            &path,
            r#"
[schema]
namespace = "avalon-core"

[identifiers]
current = "pyblish.avalon.container"
legacy = ["pyblish.mindbender.container"]
"#,
        )
        .unwrap();

        let config = ContainerConfig::load_from(path.to_str()).unwrap();
        assert_eq!(config.schema.namespace, "avalon-core");
        assert_eq!(config.schema.kind, "container");
        assert_eq!(config.identifiers.current, "pyblish.avalon.container");
        assert_eq!(config.identifiers.legacy, vec!["pyblish.mindbender.container"]);
    }

    #[test]
    fn test_save_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("saved.toml");
        let path = path.to_str().unwrap();

        let mut config = ContainerConfig::default();
        config.host.names = vec!["fusion".to_string()];
        config.save(path).unwrap();

        let reloaded = ContainerConfig::load_from(Some(path)).unwrap();
        assert_eq!(reloaded.host.names, vec!["fusion"]);
    }
}
