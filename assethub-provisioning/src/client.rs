use std::future::Future;
use std::time::Duration;

use reqwest::header::{AUTHORIZATION, HeaderMap, RETRY_AFTER, USER_AGENT};
use reqwest::{Client, Response, StatusCode};
use serde::Serialize;
use thiserror::Error;
use tracing::{Span, debug, field, info, instrument, trace};

use crate::assignment::RegistrationResult;
use crate::config::RequestConfig;
use crate::identity::ProvisioningIdentity;
use crate::util::http::InvalidUriError;

const CLIENT_USER_AGENT: &str = concat!("assethub/", env!("CARGO_PKG_VERSION"));

#[derive(Debug, Error)]
pub enum ProvisioningError {
    #[error("Invalid provisioning endpoint URI: {0}")]
    InvalidRemote(#[from] InvalidUriError),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Remote returned error: ({0}) {1}")]
    Status(StatusCode, String),

    #[error("Registration did not complete within {0:?}")]
    Timeout(Duration),
}

/// Something that can register a device with a provisioning service
pub trait Provision {
    fn register(
        &self,
        identity: &ProvisioningIdentity,
    ) -> impl Future<Output = Result<RegistrationResult, ProvisioningError>> + Send;
}

/*
    request {
        registrationId
        payload?
    }
*/
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct RegisterRequest<'a> {
    registration_id: &'a str,
}

/// Provisioning service client using symmetric key attestation over HTTPS
#[derive(Clone, Debug)]
pub struct ProvisioningClient {
    client: Client,
    config: RequestConfig,
}

impl ProvisioningClient {
    pub fn new(config: RequestConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    /// Send the registration request and wait for the service to finish
    /// processing it.
    ///
    /// The request is sent once. While the service reports the registration
    /// as in progress, its operation status is polled at the interval the
    /// service asks for, up to `provisioning_timeout`.
    #[instrument(
        skip_all,
        fields(registration_id = %identity.registration_id, result = field::Empty),
        err
    )]
    pub async fn register(
        &self,
        identity: &ProvisioningIdentity,
    ) -> Result<RegistrationResult, ProvisioningError> {
        let limit = self.config.provisioning_timeout;
        let result = tokio::time::timeout(limit, self.register_and_wait(identity))
            .await
            .map_err(|_| ProvisioningError::Timeout(limit))??;

        Span::current().record("result", field::display(&result.status));
        Ok(result)
    }

    async fn register_and_wait(
        &self,
        identity: &ProvisioningIdentity,
    ) -> Result<RegistrationResult, ProvisioningError> {
        let token = identity.sas_token(self.config.token_ttl).to_string();
        let endpoint = identity.register_endpoint()?;
        let request = RegisterRequest {
            registration_id: &identity.registration_id,
        };

        debug!("calling remote");
        let response = self
            .client
            .put(endpoint.to_string())
            .header(AUTHORIZATION, &token)
            .header(USER_AGENT, CLIENT_USER_AGENT)
            .timeout(self.config.timeout)
            .json(&request)
            .send()
            .await?;
        let (mut result, mut wait) = self.decode(response).await?;

        while !result.status.is_terminal() {
            trace!(
                operation = %result.operation_id,
                status = %result.status,
                "registration in progress, checking again in {wait:?}"
            );
            tokio::time::sleep(wait).await;

            let endpoint = identity.operation_endpoint(&result.operation_id)?;
            let response = self
                .client
                .get(endpoint.to_string())
                .header(AUTHORIZATION, &token)
                .header(USER_AGENT, CLIENT_USER_AGENT)
                .timeout(self.config.timeout)
                .send()
                .await?;
            (result, wait) = self.decode(response).await?;
        }

        info!(result = %result, "registration complete");
        Ok(result)
    }

    /// Decode a registration reply along with the time to wait before the
    /// next status poll
    async fn decode(
        &self,
        response: Response,
    ) -> Result<(RegistrationResult, Duration), ProvisioningError> {
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProvisioningError::Status(status, body));
        }

        let wait = poll_wait(response.headers(), self.config.poll_interval);
        let result = response.json::<RegistrationResult>().await?;
        Ok((result, wait))
    }
}

impl Provision for ProvisioningClient {
    async fn register(
        &self,
        identity: &ProvisioningIdentity,
    ) -> Result<RegistrationResult, ProvisioningError> {
        ProvisioningClient::register(self, identity).await
    }
}

// the service only sends delays in seconds
fn retry_after(headers: &HeaderMap) -> Option<Duration> {
    headers
        .get(RETRY_AFTER)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.trim().parse::<u64>().ok())
        .map(Duration::from_secs)
}

// never shorter than `poll_interval`
fn poll_wait(headers: &HeaderMap, poll_interval: Duration) -> Duration {
    retry_after(headers)
        .unwrap_or(poll_interval)
        .max(poll_interval)
}
