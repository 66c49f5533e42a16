//! Configuration for the integrator

use serde::{Deserialize, Serialize};

/// Main integrator configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntegratorConfig {
    /// Application name used in operator messages
    #[serde(default = "default_app_name")]
    pub app_name: String,

    /// Peer endpoint holding the credential cache
    #[serde(default = "default_peer_relation")]
    pub peer_relation: String,

    /// Endpoint related to the Kafka provider
    #[serde(default = "default_kafka_relation")]
    pub kafka_relation: String,

    /// Topic requested from the provider
    #[serde(default = "default_topic")]
    pub topic: String,

    /// ACL roles requested from the provider
    #[serde(default = "default_extra_user_roles")]
    pub extra_user_roles: Vec<String>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl Default for IntegratorConfig {
    fn default() -> Self {
        Self {
            app_name: default_app_name(),
            peer_relation: default_peer_relation(),
            kafka_relation: default_kafka_relation(),
            topic: default_topic(),
            extra_user_roles: default_extra_user_roles(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String,

    /// JSON format
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Default value helpers
fn default_app_name() -> String {
    "integrator".to_string()
}

fn default_peer_relation() -> String {
    "cluster".to_string()
}

fn default_kafka_relation() -> String {
    "kafka-client".to_string()
}

fn default_topic() -> String {
    "demo".to_string()
}

fn default_extra_user_roles() -> Vec<String> {
    ["admin", "consumer", "producer"]
        .into_iter()
        .map(String::from)
        .collect()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl IntegratorConfig {
    /// Load configuration from defaults, an optional file and `INTEGRATOR__*`
    /// environment variables, in increasing precedence.
    pub fn load(path: Option<&str>) -> Result<Self, config::ConfigError> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&IntegratorConfig::default())?);

        if let Some(path) = path {
            builder = builder.add_source(config::File::with_name(path).required(false));
        }

        builder = builder.add_source(
            config::Environment::with_prefix("INTEGRATOR")
                .prefix_separator("__")
                .separator("__")
                .list_separator(",")
                .with_list_parse_key("extra_user_roles")
                .try_parsing(true),
        );

        builder.build()?.try_deserialize()
    }

    /// Value written under `extra-user-roles`.
    pub fn extra_user_roles_value(&self) -> String {
        self.extra_user_roles.join(",")
    }
}
