//! Command-line arguments

use clap::{ArgGroup, Parser};
use integrator_types::SecurityProtocol;

use crate::settings::ConnectionSettings;

/// Which side of the topic to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Producer,
    Consumer,
}

/// Demo Kafka client driven by integrator credentials
#[derive(Debug, Parser)]
#[command(name = "kafka-client")]
#[command(about = "Demo producer/consumer for credentials handed out by the integrator", long_about = None)]
#[command(version)]
#[command(group(ArgGroup::new("mode").required(true).args(["producer", "consumer"])))]
pub struct ClientArgs {
    /// Comma-separated list of bootstrap servers
    #[arg(short, long, env = "KAFKA_SERVERS", value_delimiter = ',', required = true)]
    pub servers: Vec<String>,

    /// Username issued by the provider
    #[arg(short, long, env = "KAFKA_USERNAME")]
    pub username: String,

    /// Password issued by the provider
    #[arg(short, long, env = "KAFKA_PASSWORD", hide_env_values = true)]
    pub password: String,

    /// Topic to produce to or consume from
    #[arg(short, long, env = "KAFKA_TOPIC")]
    pub topic: String,

    /// Consumer group prefix issued by the provider
    #[arg(short, long, env = "KAFKA_CONSUMER_GROUP_PREFIX", default_value = "")]
    pub consumer_group_prefix: String,

    /// SASL_PLAINTEXT or SASL_SSL
    #[arg(long, env = "KAFKA_SECURITY_PROTOCOL", default_value = "SASL_PLAINTEXT")]
    pub security_protocol: SecurityProtocol,

    /// Publish new Hacker News stories
    #[arg(long)]
    pub producer: bool,

    /// Log messages from the topic
    #[arg(long)]
    pub consumer: bool,

    /// Emit logs as JSON
    #[arg(long)]
    pub json: bool,
}

impl ClientArgs {
    pub fn mode(&self) -> Mode {
        if self.producer {
            Mode::Producer
        } else {
            Mode::Consumer
        }
    }

    pub fn settings(&self) -> ConnectionSettings {
        ConnectionSettings {
            servers: self.servers.clone(),
            username: self.username.clone(),
            password: self.password.clone(),
            security_protocol: self.security_protocol,
        }
    }
}
