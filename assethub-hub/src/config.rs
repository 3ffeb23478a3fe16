use std::fmt::{self, Display};
use std::str::FromStr;
use std::time::Duration;

use thiserror::Error;

use crate::util::sas::DEFAULT_TOKEN_TTL;

/// Protocol used to talk to the hub
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum HubTransport {
    #[default]
    Mqtt,
    Https,
}

#[derive(Debug, Error)]
#[error("unknown hub transport '{0}', expected 'mqtt' or 'https'")]
pub struct InvalidHubTransportError(String);

impl FromStr for HubTransport {
    type Err = InvalidHubTransportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mqtt" => Ok(Self::Mqtt),
            "https" => Ok(Self::Https),
            _ => Err(InvalidHubTransportError(s.to_owned())),
        }
    }
}

impl Display for HubTransport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Mqtt => f.write_str("mqtt"),
            Self::Https => f.write_str("https"),
        }
    }
}

#[derive(Clone, Debug)]
pub struct HubConfig {
    pub transport: HubTransport,

    /// Time limit for connecting, and for each message to be acknowledged
    pub timeout: Duration,

    /// Validity of the hub token
    pub token_ttl: Duration,

    /// MQTT keep alive interval
    pub keep_alive: Duration,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            transport: HubTransport::default(),
            timeout: Duration::from_millis(59_000),
            token_ttl: DEFAULT_TOKEN_TTL,
            keep_alive: Duration::from_secs(60),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transport_parse() {
        assert_eq!("mqtt".parse::<HubTransport>().unwrap(), HubTransport::Mqtt);
        assert_eq!("HTTPS".parse::<HubTransport>().unwrap(), HubTransport::Https);
        assert!("amqp".parse::<HubTransport>().is_err());
    }
}
