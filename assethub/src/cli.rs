use std::num::ParseIntError;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use clap::builder::NonEmptyStringValueParser;

use crate::hub::{HubConfig, HubTransport};
use crate::provisioning::{ProvisioningIdentity, RequestConfig};
use crate::util::http::Uri;
use crate::util::types::SymmetricKey;

/// Global device provisioning service endpoint
pub const DEFAULT_PROVISIONING_HOST: &str = "global.azure-devices-provisioning.net";

fn parse_duration(s: &str) -> Result<Duration, ParseIntError> {
    let millis: u64 = s.parse()?;
    Ok(Duration::from_millis(millis))
}

#[derive(Clone, Debug, Parser)]
#[command(version, about, long_about = None)] // read from Cargo.toml
pub struct Cli {
    /// Device provisioning service host
    #[arg(
        env = "ASSETHUB_PROVISIONING_HOST",
        long = "provisioning-host",
        value_name = "host",
        default_value = DEFAULT_PROVISIONING_HOST
    )]
    pub provisioning_host: Uri,

    /// ID scope of the provisioning service instance
    #[arg(
        env = "ASSETHUB_ID_SCOPE",
        long = "id-scope",
        value_name = "scope",
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub id_scope: String,

    /// Registration id of this device
    #[arg(
        env = "ASSETHUB_REGISTRATION_ID",
        long = "registration-id",
        value_name = "id",
        value_parser = NonEmptyStringValueParser::new()
    )]
    pub registration_id: String,

    /// Base64 encoded device symmetric key
    #[arg(
        env = "ASSETHUB_SYMMETRIC_KEY",
        long = "symmetric-key",
        value_name = "key",
        hide_env_values = true
    )]
    pub symmetric_key: SymmetricKey,

    /// Protocol used to send telemetry to the assigned hub
    #[arg(
        env = "ASSETHUB_HUB_TRANSPORT",
        long = "hub-transport",
        value_name = "mqtt|https",
        default_value_t = HubTransport::Mqtt
    )]
    pub hub_transport: HubTransport,

    /// Request timeout in milliseconds
    #[arg(
        env = "ASSETHUB_REQUEST_TIMEOUT_MS",
        long = "request-timeout-ms",
        value_name = "ms",
        value_parser = parse_duration
    )]
    pub request_timeout: Option<Duration>,

    /// Time limit for the provisioning service to assign the device, in milliseconds
    #[arg(
        env = "ASSETHUB_PROVISIONING_TIMEOUT_MS",
        long = "provisioning-timeout-ms",
        value_name = "ms",
        value_parser = parse_duration
    )]
    pub provisioning_timeout: Option<Duration>,

    /// File with `<yyyyMMddHHmmss>;<load>` readings to send instead of the default sample
    #[arg(env = "ASSETHUB_READINGS", long = "readings", value_name = "path")]
    pub readings: Option<PathBuf>,

    /// Store the assignment and reuse it on later runs instead of provisioning again
    #[arg(env = "ASSETHUB_PERSIST_REGISTRATION", long = "persist-registration")]
    pub persist_registration: bool,
}

impl Cli {
    pub fn identity(&self) -> ProvisioningIdentity {
        ProvisioningIdentity {
            provisioning_host: self.provisioning_host.clone(),
            id_scope: self.id_scope.clone(),
            registration_id: self.registration_id.clone(),
            symmetric_key: self.symmetric_key.clone(),
        }
    }

    pub fn request_config(&self) -> RequestConfig {
        let defaults = RequestConfig::default();
        RequestConfig {
            timeout: self.request_timeout.unwrap_or(defaults.timeout),
            provisioning_timeout: self
                .provisioning_timeout
                .unwrap_or(defaults.provisioning_timeout),
            ..defaults
        }
    }

    pub fn hub_config(&self) -> HubConfig {
        let defaults = HubConfig::default();
        HubConfig {
            transport: self.hub_transport,
            timeout: self.request_timeout.unwrap_or(defaults.timeout),
            ..defaults
        }
    }
}

pub fn parse() -> Cli {
    Parser::parse()
}
