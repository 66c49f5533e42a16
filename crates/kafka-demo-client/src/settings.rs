//! librdkafka configuration built from integrator credentials.

use std::time::Duration;

use integrator_types::SecurityProtocol;
use rdkafka::ClientConfig;

/// SASL mechanism the provider issues credentials for.
pub const SASL_MECHANISM: &str = "SCRAM-SHA-512";

/// Connection details as returned by the integrator's `get-data` action.
#[derive(Debug, Clone)]
pub struct ConnectionSettings {
    pub servers: Vec<String>,
    pub username: String,
    pub password: String,
    pub security_protocol: SecurityProtocol,
}

impl ConnectionSettings {
    /// Settings shared by producer and consumer.
    pub fn client_config(&self) -> ClientConfig {
        let mut config = ClientConfig::new();
        config
            .set("bootstrap.servers", self.servers.join(","))
            .set("security.protocol", self.security_protocol.as_str())
            .set("sasl.mechanism", SASL_MECHANISM)
            .set("sasl.username", &self.username)
            .set("sasl.password", &self.password);
        if self.security_protocol == SecurityProtocol::SaslSsl {
            // Provider certificates are not issued for the advertised hostnames.
            config.set("ssl.endpoint.identification.algorithm", "none");
        }
        config
    }

    /// Producer settings; `ack_timeout` bounds the wait for a delivery report.
    pub fn producer_config(&self, ack_timeout: Duration) -> ClientConfig {
        let mut config = self.client_config();
        config.set("message.timeout.ms", ack_timeout.as_millis().to_string());
        config
    }

    /// Consumer settings for the group `<prefix>1`.
    pub fn consumer_config(&self, group_prefix: &str) -> ClientConfig {
        let mut config = self.client_config();
        config
            .set("group.id", consumer_group(group_prefix))
            .set("enable.auto.commit", "true")
            .set("auto.offset.reset", "earliest");
        config
    }
}

/// Consumer group id derived from the provider's prefix.
pub fn consumer_group(prefix: &str) -> String {
    format!("{}1", prefix)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn settings(protocol: SecurityProtocol) -> ConnectionSettings {
        ConnectionSettings {
            servers: vec!["a:9092".into(), "b:9092".into()],
            username: "relation-4".into(),
            password: "secret".into(),
            security_protocol: protocol,
        }
    }

    #[test]
    fn test_client_config_carries_credentials() {
        let config = settings(SecurityProtocol::SaslPlaintext).client_config();
        assert_eq!(config.get("bootstrap.servers"), Some("a:9092,b:9092"));
        assert_eq!(config.get("security.protocol"), Some("SASL_PLAINTEXT"));
        assert_eq!(config.get("sasl.mechanism"), Some("SCRAM-SHA-512"));
        assert_eq!(config.get("sasl.username"), Some("relation-4"));
        assert_eq!(config.get("sasl.password"), Some("secret"));
        assert_eq!(config.get("ssl.endpoint.identification.algorithm"), None);
    }

    #[test]
    fn test_ssl_skips_hostname_check() {
        let config = settings(SecurityProtocol::SaslSsl).client_config();
        assert_eq!(config.get("security.protocol"), Some("SASL_SSL"));
        assert_eq!(
            config.get("ssl.endpoint.identification.algorithm"),
            Some("none")
        );
    }

    #[test]
    fn test_consumer_group_from_prefix() {
        let config = settings(SecurityProtocol::SaslPlaintext).consumer_config("app-");
        assert_eq!(config.get("group.id"), Some("app-1"));
        assert_eq!(config.get("enable.auto.commit"), Some("true"));
        assert_eq!(config.get("auto.offset.reset"), Some("earliest"));
    }

    #[test]
    fn test_producer_ack_timeout() {
        let config =
            settings(SecurityProtocol::SaslPlaintext).producer_config(Duration::from_secs(60));
        assert_eq!(config.get("message.timeout.ms"), Some("60000"));
    }
}
