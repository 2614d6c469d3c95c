//! # DigSiNet Configuration
//!
//! The top-level YAML configuration schema and its loader.
//!
//! Grounded on `examples/original_source/config/settings.py`'s pydantic
//! `Settings` model. Reimplemented with `serde` derive + `serde_yaml`
//! rather than a runtime-validated model, matching the teacher's heavy
//! `serde` usage; structural validation that `serde` cannot express
//! (exactly-one-of `kafka`/`rabbit`, dangling name references) is done as
//! an explicit post-deserialize pass in [`validate`].
#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod error;
mod settings;
mod validate;

pub use error::ConfigError;
pub use settings::{
    AppSettings, BuilderSettings, ControllerSettings, InterfaceCredentials, InterfaceSettings, KafkaOffsetSettings,
    KafkaSettings, KafkaTopicSettings, OffsetResetType, RabbitSettings, RealnetSettings, Settings, SiblingSettings,
    TopologyFile,
};
pub use validate::validate;

use std::path::Path;

/// Read, parse, and validate the configuration file at `path`.
///
/// # Errors
///
/// Returns [`ConfigError::Read`] if the file cannot be read,
/// [`ConfigError::Parse`] if it is not valid YAML matching [`Settings`],
/// or [`ConfigError::BrokerSelection`]/[`ConfigError::DanglingReference`]
/// if it fails structural validation.
pub fn load(path: impl AsRef<Path>) -> Result<Settings, ConfigError> {
    let path = path.as_ref();
    let raw = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.display().to_string(),
        source,
    })?;

    let settings: Settings = serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
        path: path.display().to_string(),
        source,
    })?;

    validate::validate(&settings)?;

    tracing::info!(topology = settings.topology_name, path = %path.display(), "loaded configuration");
    Ok(settings)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn loading_a_missing_file_is_a_read_error() {
        let result = load("/nonexistent/digsinet.yml");
        assert!(matches!(result, Err(ConfigError::Read { .. })));
    }

    #[test]
    fn loading_valid_yaml_round_trips_into_settings() {
        let yaml = r"
name: net
topology:
  type: file
  file: net.clab.yml
interval: 1000
create_sibling_timeout: 5000
realnet:
  apps: []
  interfaces: {}
siblings: {}
controllers: {}
builders: {}
interfaces: {}
apps: {}
kafka:
  host: localhost
  port: 9092
  topics:
    num_partitions: 1
    replication_factor: 1
  offset:
    reset_type: latest
";
        let settings: Settings = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(settings.topology_name, "net");
        assert!(validate(&settings).is_ok());
    }
}
