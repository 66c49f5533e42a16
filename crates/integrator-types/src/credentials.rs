//! Credential sets assembled from the peer cache.

use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::bag::RelationBag;
use crate::keys;

/// `true` when the provider's tls flag is `"enabled"`, in any case.
pub fn tls_enabled(flag: &str) -> bool {
    flag.eq_ignore_ascii_case(keys::TLS_ENABLED)
}

/// Credentials handed to the downstream application.
///
/// Incomplete sets are an expected transient state while the provider is
/// still filling in its bag.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct CredentialSet {
    pub username: String,
    pub password: String,
    pub bootstrap_server: String,
    pub consumer_group_prefix: String,
    pub topic: String,
    pub tls: bool,
}

impl CredentialSet {
    /// Assemble from a peer cache bag. Absent keys read as empty.
    pub fn from_peer_cache(bag: &RelationBag) -> Self {
        Self {
            username: bag.get_or_empty(keys::USERNAME).to_string(),
            password: bag.get_or_empty(keys::PASSWORD).to_string(),
            bootstrap_server: bag.get_or_empty(keys::BOOTSTRAP_SERVER).to_string(),
            consumer_group_prefix: bag.get_or_empty(keys::CONSUMER_GROUP_PREFIX).to_string(),
            topic: bag.get_or_empty(keys::TOPIC).to_string(),
            tls: tls_enabled(bag.get_or_empty(keys::TLS)),
        }
    }

    /// First empty mandatory field in check order, if any.
    pub fn first_missing(&self) -> Option<MandatoryField> {
        MandatoryField::CHECK_ORDER
            .into_iter()
            .find(|field| self.field(*field).is_empty())
    }

    pub fn is_complete(&self) -> bool {
        self.first_missing().is_none()
    }

    pub fn field(&self, field: MandatoryField) -> &str {
        match field {
            MandatoryField::Topic => &self.topic,
            MandatoryField::Username => &self.username,
            MandatoryField::Password => &self.password,
            MandatoryField::BootstrapServer => &self.bootstrap_server,
        }
    }

    pub fn security_protocol(&self) -> SecurityProtocol {
        SecurityProtocol::from_tls(self.tls)
    }

    /// Flatten into action results, including the derived security protocol.
    pub fn to_results(&self) -> BTreeMap<String, String> {
        BTreeMap::from([
            (keys::TOPIC.to_string(), self.topic.clone()),
            (keys::USERNAME.to_string(), self.username.clone()),
            (keys::PASSWORD.to_string(), self.password.clone()),
            (keys::BOOTSTRAP_SERVER.to_string(), self.bootstrap_server.clone()),
            (
                keys::CONSUMER_GROUP_PREFIX.to_string(),
                self.consumer_group_prefix.clone(),
            ),
            (keys::TLS.to_string(), self.tls.to_string()),
            (
                keys::SECURITY_PROTOCOL.to_string(),
                self.security_protocol().to_string(),
            ),
        ])
    }
}

/// Fields that must be non-empty before credentials are handed out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MandatoryField {
    Topic,
    Username,
    Password,
    BootstrapServer,
}

impl MandatoryField {
    /// Order in which completeness is checked; the first gap is reported.
    pub const CHECK_ORDER: [MandatoryField; 4] = [
        MandatoryField::Topic,
        MandatoryField::Username,
        MandatoryField::Password,
        MandatoryField::BootstrapServer,
    ];

    /// Label used in operator-facing messages.
    pub fn label(&self) -> &'static str {
        match self {
            MandatoryField::Topic => "Topic",
            MandatoryField::Username => "Username",
            MandatoryField::Password => "Password",
            MandatoryField::BootstrapServer => "Bootstrap-Server",
        }
    }
}

impl fmt::Display for MandatoryField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Kafka security protocol implied by the tls flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SecurityProtocol {
    #[serde(rename = "SASL_SSL")]
    SaslSsl,
    #[serde(rename = "SASL_PLAINTEXT")]
    SaslPlaintext,
}

impl SecurityProtocol {
    pub fn from_tls(tls: bool) -> Self {
        if tls {
            SecurityProtocol::SaslSsl
        } else {
            SecurityProtocol::SaslPlaintext
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            SecurityProtocol::SaslSsl => "SASL_SSL",
            SecurityProtocol::SaslPlaintext => "SASL_PLAINTEXT",
        }
    }
}

impl fmt::Display for SecurityProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SecurityProtocol {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "SASL_SSL" => Ok(SecurityProtocol::SaslSsl),
            "SASL_PLAINTEXT" => Ok(SecurityProtocol::SaslPlaintext),
            other => Err(format!("unsupported security protocol: {}", other)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete_cache() -> RelationBag {
        [
            ("username", "u"),
            ("password", "p"),
            ("bootstrap-server", "host:9092"),
            ("topic", "demo"),
            ("tls", "enabled"),
            ("consumer-group-prefix", ""),
        ]
        .into_iter()
        .collect()
    }

    #[test]
    fn test_tls_flag_case_insensitive() {
        assert!(tls_enabled("enabled"));
        assert!(tls_enabled("ENABLED"));
        assert!(tls_enabled("Enabled"));
        assert!(!tls_enabled("disabled"));
        assert!(!tls_enabled(""));
        assert!(!tls_enabled("true"));
    }

    #[test]
    fn test_complete_set() {
        let creds = CredentialSet::from_peer_cache(&complete_cache());
        assert!(creds.is_complete());
        assert!(creds.tls);
        assert_eq!(creds.security_protocol(), SecurityProtocol::SaslSsl);
    }

    #[test]
    fn test_consumer_group_prefix_not_mandatory() {
        let creds = CredentialSet::from_peer_cache(&complete_cache());
        assert!(creds.consumer_group_prefix.is_empty());
        assert_eq!(creds.first_missing(), None);
    }

    #[test]
    fn test_first_missing_follows_check_order() {
        let creds = CredentialSet {
            bootstrap_server: "host:9092".into(),
            ..Default::default()
        };
        assert_eq!(creds.first_missing(), Some(MandatoryField::Topic));

        let creds = CredentialSet {
            topic: "demo".into(),
            password: "p".into(),
            ..Default::default()
        };
        assert_eq!(creds.first_missing(), Some(MandatoryField::Username));
    }

    #[test]
    fn test_results_include_security_protocol() {
        let creds = CredentialSet::from_peer_cache(&complete_cache());
        let results = creds.to_results();
        assert_eq!(results["security-protocol"], "SASL_SSL");
        assert_eq!(results["bootstrap-server"], "host:9092");
        assert_eq!(results["tls"], "true");
        assert_eq!(results.len(), 7);
    }

    #[test]
    fn test_security_protocol_parse() {
        assert_eq!(
            "sasl_ssl".parse::<SecurityProtocol>().unwrap(),
            SecurityProtocol::SaslSsl
        );
        assert!("PLAINTEXT".parse::<SecurityProtocol>().is_err());
    }
}
