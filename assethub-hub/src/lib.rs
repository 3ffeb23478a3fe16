/*
Device side of the hub connection.

Once provisioned, a device authenticates to its assigned hub with the same
symmetric key and sends device-to-cloud messages. The hub accepts these
over MQTT, which keeps a session open between connect and disconnect, or
over HTTPS, where every message is an independent request.
*/

mod client;
mod config;
mod error;
mod https;
mod message;
mod mqtt;

pub use client::{DeviceHub, HubClient, HubConnect, HubConnector};
pub use config::{HubConfig, HubTransport, InvalidHubTransportError};
pub use error::HubError;
pub use message::Message;

use assethub_util as util;
