use std::future::Future;
use std::time::Duration;

use rumqttc::{
    AsyncClient, ConnectReturnCode, ConnectionError, Event, EventLoop, MqttOptions, Outgoing,
    Packet, QoS, Transport,
};
use tracing::{debug, instrument, trace};

use crate::config::HubConfig;
use crate::error::HubError;
use crate::message::Message;
use crate::util::sas::SasToken;
use crate::util::types::SymmetricKey;

const MQTT_TLS_PORT: u16 = 8883;
const MQTT_API_VERSION: &str = "2021-04-12";

// pending requests between the client handle and the event loop
const REQUEST_CHANNEL_CAPACITY: usize = 10;

struct Session {
    client: AsyncClient,
    eventloop: EventLoop,
}

/// Hub transport over MQTT 3.1.1 with TLS
pub(crate) struct MqttTransport {
    hostname: String,
    device_id: String,
    symmetric_key: SymmetricKey,
    config: HubConfig,
    port: u16,
    // TLS with the platform roots when unset
    transport: Option<Transport>,
    session: Option<Session>,
}

impl MqttTransport {
    pub fn new(
        symmetric_key: &SymmetricKey,
        hostname: &str,
        device_id: &str,
        config: HubConfig,
    ) -> Self {
        Self {
            hostname: hostname.to_owned(),
            device_id: device_id.to_owned(),
            symmetric_key: symmetric_key.clone(),
            config,
            port: MQTT_TLS_PORT,
            transport: None,
            session: None,
        }
    }

    fn username(&self) -> String {
        format!(
            "{}/{}/?api-version={MQTT_API_VERSION}",
            self.hostname, self.device_id
        )
    }

    fn telemetry_topic(&self, message: &Message) -> String {
        format!(
            "devices/{}/messages/events/{}",
            self.device_id,
            message.topic_properties()
        )
    }

    fn options(&self) -> MqttOptions {
        let resource = format!("{}/devices/{}", self.hostname, self.device_id);
        let token = SasToken::with_ttl(&self.symmetric_key, &resource, None, self.config.token_ttl);

        // the hub only accepts the device id as client id
        let mut options = MqttOptions::new(&self.device_id, &self.hostname, self.port);
        options.set_credentials(self.username(), token.to_string());
        options.set_keep_alive(self.config.keep_alive);
        options.set_clean_session(true);
        options
    }

    #[instrument(name = "mqtt_connect", skip_all, fields(hub = %self.hostname), err)]
    pub async fn connect(&mut self) -> Result<(), HubError> {
        let mut options = self.options();
        let transport = self
            .transport
            .clone()
            .unwrap_or_else(Transport::tls_with_default_config);
        options.set_transport(transport);
        let (client, mut eventloop) = AsyncClient::new(options, REQUEST_CHANNEL_CAPACITY);

        with_timeout(self.config.timeout, "connection acknowledgement", async {
            loop {
                match eventloop.poll().await {
                    Ok(Event::Incoming(Packet::ConnAck(ack))) => {
                        return match ack.code {
                            ConnectReturnCode::Success => Ok(()),
                            code => Err(HubError::Refused(format!("{code:?}"))),
                        };
                    }
                    Ok(event) => trace!(?event, "waiting for connack"),
                    Err(ConnectionError::ConnectionRefused(code)) => {
                        return Err(HubError::Refused(format!("{code:?}")));
                    }
                    Err(err) => return Err(err.into()),
                }
            }
        })
        .await?;

        debug!("connected");
        self.session = Some(Session { client, eventloop });
        Ok(())
    }

    #[instrument(name = "mqtt_send", skip_all, err)]
    pub async fn send_message(&mut self, message: &Message) -> Result<(), HubError> {
        let topic = self.telemetry_topic(message);
        let timeout = self.config.timeout;
        let session = self.session.as_mut().ok_or(HubError::NotConnected)?;

        session
            .client
            .publish(topic, QoS::AtLeastOnce, false, message.body().to_vec())
            .await?;

        with_timeout(timeout, "publish acknowledgement", async {
            let mut pkid = None;
            loop {
                match session.eventloop.poll().await? {
                    Event::Outgoing(Outgoing::Publish(id)) => pkid = Some(id),
                    Event::Incoming(Packet::PubAck(ack)) if Some(ack.pkid) == pkid => {
                        return Ok(());
                    }
                    event => trace!(?event, "waiting for puback"),
                }
            }
        })
        .await?;

        debug!("message acknowledged");
        Ok(())
    }

    #[instrument(name = "mqtt_disconnect", skip_all, err)]
    pub async fn disconnect(&mut self) -> Result<(), HubError> {
        let mut session = self.session.take().ok_or(HubError::NotConnected)?;
        session.client.disconnect().await?;

        with_timeout(self.config.timeout, "disconnect", async {
            loop {
                if let Event::Outgoing(Outgoing::Disconnect) = session.eventloop.poll().await? {
                    return Ok(());
                }
            }
        })
        .await?;

        debug!("disconnected");
        Ok(())
    }
}

async fn with_timeout<F>(limit: Duration, waiting_for: &'static str, fut: F) -> Result<(), HubError>
where
    F: Future<Output = Result<(), HubError>>,
{
    tokio::time::timeout(limit, fut)
        .await
        .map_err(|_| HubError::Timeout(limit, waiting_for))?
}
