use std::future::Future;

use tracing::debug;

use crate::config::{HubConfig, HubTransport};
use crate::error::HubError;
use crate::https::HttpsTransport;
use crate::message::Message;
use crate::mqtt::MqttTransport;
use crate::util::types::SymmetricKey;

/// A device connection to its hub.
///
/// Messages can only be sent between `connect` and `disconnect`.
pub trait DeviceHub {
    fn connect(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;

    fn send_message(
        &mut self,
        message: &Message,
    ) -> impl Future<Output = Result<(), HubError>> + Send;

    fn disconnect(&mut self) -> impl Future<Output = Result<(), HubError>> + Send;
}

/// Creates hub clients for provisioned devices
pub trait HubConnect {
    type Hub: DeviceHub + Send;

    fn create_from_symmetric_key(
        &self,
        symmetric_key: &SymmetricKey,
        hostname: &str,
        device_id: &str,
    ) -> Result<Self::Hub, HubError>;
}

enum Transport {
    Mqtt(MqttTransport),
    Https(HttpsTransport),
}

/// Hub client authenticated with the device symmetric key
pub struct HubClient {
    transport: Transport,
}

impl HubClient {
    pub fn create_from_symmetric_key(
        symmetric_key: &SymmetricKey,
        hostname: &str,
        device_id: &str,
        config: HubConfig,
    ) -> Result<Self, HubError> {
        debug!(hub = hostname, device_id, transport = %config.transport, "creating hub client");
        let transport = match config.transport {
            HubTransport::Mqtt => Transport::Mqtt(MqttTransport::new(
                symmetric_key,
                hostname,
                device_id,
                config,
            )),
            HubTransport::Https => Transport::Https(HttpsTransport::new(
                symmetric_key,
                hostname,
                device_id,
                config,
            )?),
        };
        Ok(Self { transport })
    }
}

impl DeviceHub for HubClient {
    async fn connect(&mut self) -> Result<(), HubError> {
        match &mut self.transport {
            Transport::Mqtt(t) => t.connect().await,
            Transport::Https(t) => t.connect().await,
        }
    }

    async fn send_message(&mut self, message: &Message) -> Result<(), HubError> {
        match &mut self.transport {
            Transport::Mqtt(t) => t.send_message(message).await,
            Transport::Https(t) => t.send_message(message).await,
        }
    }

    async fn disconnect(&mut self) -> Result<(), HubError> {
        match &mut self.transport {
            Transport::Mqtt(t) => t.disconnect().await,
            Transport::Https(t) => t.disconnect().await,
        }
    }
}

/// Creates [`HubClient`]s sharing one configuration
#[derive(Clone, Debug, Default)]
pub struct HubConnector {
    config: HubConfig,
}

impl HubConnector {
    pub fn new(config: HubConfig) -> Self {
        Self { config }
    }
}

impl HubConnect for HubConnector {
    type Hub = HubClient;

    fn create_from_symmetric_key(
        &self,
        symmetric_key: &SymmetricKey,
        hostname: &str,
        device_id: &str,
    ) -> Result<HubClient, HubError> {
        HubClient::create_from_symmetric_key(
            symmetric_key,
            hostname,
            device_id,
            self.config.clone(),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_selects_configured_transport() {
        let key: SymmetricKey = "c2VjcmV0".parse().unwrap();

        let mqtt = HubConnector::default()
            .create_from_symmetric_key(&key, "hub1.example.net", "dev1")
            .unwrap();
        assert!(matches!(mqtt.transport, Transport::Mqtt(_)));

        let https = HubConnector::new(HubConfig {
            transport: HubTransport::Https,
            ..Default::default()
        })
        .create_from_symmetric_key(&key, "hub1.example.net", "dev1")
        .unwrap();
        assert!(matches!(https.transport, Transport::Https(_)));
    }

    #[test]
    fn test_https_rejects_invalid_hostname() {
        let key: SymmetricKey = "c2VjcmV0".parse().unwrap();
        let result = HubConnector::new(HubConfig {
            transport: HubTransport::Https,
            ..Default::default()
        })
        .create_from_symmetric_key(&key, "", "dev1");

        assert!(matches!(result, Err(HubError::InvalidEndpoint(_))));
    }
}
