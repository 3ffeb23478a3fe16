use reqwest::Client;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use tracing::{Span, debug, field, instrument};

use crate::config::HubConfig;
use crate::error::HubError;
use crate::message::Message;
use crate::util::http::Uri;
use crate::util::sas::SasToken;
use crate::util::types::SymmetricKey;

const HTTPS_API_VERSION: &str = "2020-03-13";

struct Session {
    client: Client,
    token: String,
}

/// Hub transport over HTTPS
///
/// There is no connection to keep, connecting only prepares the client and
/// its token.
pub(crate) struct HttpsTransport {
    endpoint: Uri,
    hostname: String,
    device_id: String,
    symmetric_key: SymmetricKey,
    config: HubConfig,
    session: Option<Session>,
}

impl HttpsTransport {
    pub fn new(
        symmetric_key: &SymmetricKey,
        hostname: &str,
        device_id: &str,
        config: HubConfig,
    ) -> Result<Self, HubError> {
        let endpoint = Uri::from_host(hostname)?;
        Ok(Self::with_endpoint(
            endpoint,
            symmetric_key,
            hostname,
            device_id,
            config,
        ))
    }

    /// Use `endpoint` for requests instead of `https://{hostname}`
    pub fn with_endpoint(
        endpoint: Uri,
        symmetric_key: &SymmetricKey,
        hostname: &str,
        device_id: &str,
        config: HubConfig,
    ) -> Self {
        Self {
            endpoint,
            hostname: hostname.to_owned(),
            device_id: device_id.to_owned(),
            symmetric_key: symmetric_key.clone(),
            config,
            session: None,
        }
    }

    #[instrument(name = "https_connect", skip_all, fields(hub = %self.hostname), err)]
    pub async fn connect(&mut self) -> Result<(), HubError> {
        let resource = format!("{}/devices/{}", self.hostname, self.device_id);
        let token = SasToken::with_ttl(&self.symmetric_key, &resource, None, self.config.token_ttl);

        self.session = Some(Session {
            client: Client::new(),
            token: token.to_string(),
        });
        debug!("ready");
        Ok(())
    }

    #[instrument(name = "https_send", skip_all, fields(result = field::Empty), err)]
    pub async fn send_message(&mut self, message: &Message) -> Result<(), HubError> {
        let session = self.session.as_ref().ok_or(HubError::NotConnected)?;
        let endpoint = Uri::from_parts(
            self.endpoint.clone(),
            &format!(
                "/devices/{}/messages/events",
                urlencoding::encode(&self.device_id)
            ),
            Some(&format!("api-version={HTTPS_API_VERSION}")),
        )?;

        let mut request = session
            .client
            .post(endpoint.to_string())
            .header(AUTHORIZATION, &session.token)
            .header(CONTENT_TYPE, message.content_type())
            .header("iothub-contenttype", message.content_type())
            .header("iothub-contentencoding", message.content_encoding())
            .timeout(self.config.timeout)
            .body(message.body().to_vec());
        if let Some(message_id) = message.message_id() {
            request = request.header("iothub-messageid", message_id);
        }

        debug!("calling hub");
        let response = request.send().await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(HubError::Status(status, body));
        }

        Span::current().record("result", field::display(status));
        Ok(())
    }

    #[instrument(name = "https_disconnect", skip_all, err)]
    pub async fn disconnect(&mut self) -> Result<(), HubError> {
        self.session.take().ok_or(HubError::NotConnected)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use reqwest::StatusCode;

    fn transport(endpoint: String) -> HttpsTransport {
        HttpsTransport::with_endpoint(
            endpoint.parse().unwrap(),
            &"c2VjcmV0".parse().unwrap(),
            "hub1.example.net",
            "dev1",
            HubConfig::default(),
        )
    }

    #[tokio::test]
    async fn test_send_message_posts_event() {
        let mut server = Server::new_async().await;
        let body = r#"{"AveragePowerGenerationInKW":27.0}"#;

        let mock = server
            .mock("POST", "/devices/dev1/messages/events")
            .match_query(Matcher::UrlEncoded(
                "api-version".into(),
                "2020-03-13".into(),
            ))
            .match_header(
                "authorization",
                Matcher::Regex(
                    "^SharedAccessSignature sr=hub1.example.net%2Fdevices%2Fdev1&sig=.+&se=[0-9]+$"
                        .to_string(),
                ),
            )
            .match_header("content-type", "application/json")
            .match_header("iothub-contenttype", "application/json")
            .match_header("iothub-contentencoding", "utf-8")
            .match_header("iothub-messageid", "m1")
            .match_body(body)
            .with_status(204)
            .expect(1)
            .create_async()
            .await;

        let mut transport = transport(server.url());
        transport.connect().await.unwrap();
        transport
            .send_message(&Message::json(body).with_message_id("m1"))
            .await
            .unwrap();
        transport.disconnect().await.unwrap();

        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_message_surfaces_rejection() {
        let mut server = Server::new_async().await;

        let mock = server
            .mock("POST", "/devices/dev1/messages/events")
            .match_query(Matcher::Any)
            .with_status(401)
            .with_body("unauthorized")
            .create_async()
            .await;

        let mut transport = transport(server.url());
        transport.connect().await.unwrap();
        let err = transport
            .send_message(&Message::json("{}"))
            .await
            .unwrap_err();

        assert!(matches!(err, HubError::Status(StatusCode::UNAUTHORIZED, _)));
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_send_after_disconnect_fails() {
        let mut transport = transport("http://127.0.0.1:1".to_string());
        transport.connect().await.unwrap();
        transport.disconnect().await.unwrap();

        let result = transport.send_message(&Message::json("{}")).await;
        assert!(matches!(result, Err(HubError::NotConnected)));
    }
}
