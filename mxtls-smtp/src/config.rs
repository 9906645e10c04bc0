use serde::{Deserialize, Serialize};

/// SMTP-side settings shared by every probe.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SmtpConfig {
    /// Domain the EHLO hostname is built from: `gatewayN.<suffix>`.
    ///
    /// Default: `mxtls.invalid`
    #[serde(default = "defaults::gateway_suffix")]
    pub gateway_suffix: String,

    /// Size of the gateway pool N is drawn from.
    ///
    /// Default: 5
    #[serde(default = "defaults::gateway_pool")]
    pub gateway_pool: u8,

    /// Port probes connect to.
    ///
    /// Default: 25
    #[serde(default = "defaults::port")]
    pub port: u16,
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            gateway_suffix: defaults::gateway_suffix(),
            gateway_pool: defaults::gateway_pool(),
            port: defaults::port(),
        }
    }
}

mod defaults {
    pub fn gateway_suffix() -> String {
        String::from("mxtls.invalid")
    }
    pub const fn gateway_pool() -> u8 {
        5
    }
    pub const fn port() -> u16 {
        25
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_defaults_from_empty_config() {
        let config: SmtpConfig = ron::from_str("()").unwrap();
        assert_eq!(config, SmtpConfig::default());
        assert_eq!(config.port, 25);
        assert_eq!(config.gateway_suffix, "mxtls.invalid");
    }

    #[test]
    fn test_override_suffix() {
        let config: SmtpConfig = ron::from_str(r#"(gateway_suffix: "probe.example.net")"#).unwrap();
        assert_eq!(config.gateway_suffix, "probe.example.net");
        assert_eq!(config.gateway_pool, 5);
    }
}
