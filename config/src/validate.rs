//! Cross-reference validation beyond what `serde` can express.

use crate::error::ConfigError;
use crate::settings::Settings;

/// Check the structural invariants `serde` alone cannot enforce:
/// exactly one broker backend, and every name referenced by a
/// `siblings`/`controllers` entry actually exists in its target table.
///
/// # Errors
///
/// Returns [`ConfigError::BrokerSelection`] if zero or both of
/// `kafka`/`rabbit` are present, or [`ConfigError::DanglingReference`] for
/// the first unresolved name found.
pub fn validate(settings: &Settings) -> Result<(), ConfigError> {
    match (&settings.kafka, &settings.rabbit) {
        (Some(_), None) | (None, Some(_)) => {}
        (Some(_), Some(_)) => return Err(ConfigError::BrokerSelection("both")),
        (None, None) => return Err(ConfigError::BrokerSelection("neither")),
    }

    for app_name in &settings.realnet.apps {
        require(settings.apps.contains_key(app_name), "realnet", "app", app_name)?;
    }
    for interface_name in settings.realnet.interfaces.keys() {
        require(
            settings.interface_credentials.contains_key(interface_name),
            "realnet",
            "interface",
            interface_name,
        )?;
    }

    for (sibling_name, sibling) in &settings.siblings {
        let section = format!("siblings.{sibling_name}");
        require(settings.controllers.contains_key(&sibling.controller), &section, "controller", &sibling.controller)?;
        for interface_name in sibling.interfaces.keys() {
            require(
                settings.interface_credentials.contains_key(interface_name),
                &section,
                "interface",
                interface_name,
            )?;
        }
    }

    for (controller_name, controller) in &settings.controllers {
        let section = format!("controllers.{controller_name}");
        require(settings.builders.contains_key(&controller.builder), &section, "builder", &controller.builder)?;
        for interface_name in &controller.interfaces {
            require(
                settings.interface_credentials.contains_key(interface_name),
                &section,
                "interface",
                interface_name,
            )?;
        }
        for app_name in &controller.apps {
            require(settings.apps.contains_key(app_name), &section, "app", app_name)?;
        }
    }

    Ok(())
}

fn require(present: bool, section: &str, referenced_kind: &'static str, name: &str) -> Result<(), ConfigError> {
    if present {
        Ok(())
    } else {
        Err(ConfigError::DanglingReference {
            section: section.to_string(),
            referenced_kind,
            name: name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::settings::*;
    use std::collections::BTreeMap;

    fn minimal_settings() -> Settings {
        Settings {
            topology_name: "net".to_string(),
            topology: TopologyFile { kind: "file".to_string(), file: "net.clab.yml".to_string() },
            sync_interval_ms: 1000,
            sibling_timeout_ms: 5000,
            realnet: RealnetSettings { apps: Vec::new(), interfaces: BTreeMap::new() },
            siblings: BTreeMap::new(),
            controllers: BTreeMap::new(),
            builders: BTreeMap::new(),
            interface_credentials: BTreeMap::new(),
            apps: BTreeMap::new(),
            kafka: Some(KafkaSettings {
                host: "localhost".to_string(),
                port: 9092,
                topics: KafkaTopicSettings { num_partitions: 1, replication_factor: 1 },
                offset: KafkaOffsetSettings { reset_type: OffsetResetType::Latest },
                delete_topics_on_close: false,
            }),
            rabbit: None,
        }
    }

    #[test]
    fn minimal_settings_with_one_broker_is_valid() {
        assert!(validate(&minimal_settings()).is_ok());
    }

    #[test]
    fn neither_broker_is_rejected() {
        let mut settings = minimal_settings();
        settings.kafka = None;
        assert!(matches!(validate(&settings), Err(ConfigError::BrokerSelection("neither"))));
    }

    #[test]
    fn both_brokers_is_rejected() {
        let mut settings = minimal_settings();
        settings.rabbit = Some(RabbitSettings {
            host: "localhost".to_string(),
            port: 5672,
            username: "guest".to_string(),
            password: "guest".to_string(),
            vhost: "/".to_string(),
        });
        assert!(matches!(validate(&settings), Err(ConfigError::BrokerSelection("both"))));
    }

    #[test]
    fn sibling_referencing_unknown_controller_is_rejected() {
        let mut settings = minimal_settings();
        settings.siblings.insert(
            "ci".to_string(),
            SiblingSettings {
                topology_adjustments: None,
                interfaces: BTreeMap::new(),
                controller: "missing".to_string(),
                autostart: true,
            },
        );
        assert!(matches!(validate(&settings), Err(ConfigError::DanglingReference { .. })));
    }
}
