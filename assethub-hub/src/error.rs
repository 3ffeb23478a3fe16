use std::time::Duration;

use reqwest::StatusCode;
use thiserror::Error;

use crate::util::http::InvalidUriError;

#[derive(Debug, Error)]
pub enum HubError {
    #[error("Invalid hub endpoint URI: {0}")]
    InvalidEndpoint(#[from] InvalidUriError),

    #[error("client is not connected")]
    NotConnected,

    #[error("MQTT connection failed: {0}")]
    Connection(#[from] rumqttc::ConnectionError),

    #[error("MQTT request failed: {0}")]
    Client(#[from] rumqttc::ClientError),

    #[error("Hub refused the connection: {0}")]
    Refused(String),

    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Hub returned error: ({0}) {1}")]
    Status(StatusCode, String),

    #[error("timed out after {0:?} waiting for {1}")]
    Timeout(Duration, &'static str),
}
