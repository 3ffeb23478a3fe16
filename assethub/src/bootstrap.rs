use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing::{debug, info, instrument, warn};

use crate::hub::{DeviceHub, HubConnect, HubError, Message};
use crate::provisioning::{
    Assignment, DeviceRegistration, Provision, ProvisioningError, ProvisioningIdentity,
    RegistrationStatus, StoredRegistration,
};
use crate::telemetry::{
    DEFAULT_TELEMETRY, ReadingsError, aggregate_per_minute, parse_readings, to_metered_values,
};
use crate::util::crypto::{ALPHA_NUM, pseudorandom_string};
use crate::util::store::{Store, StoreError};

// length of the id attached to each telemetry message
const MESSAGE_ID_LEN: usize = 16;

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("Provisioning failed: {0}")]
    Provisioning(#[from] ProvisioningError),

    #[error("Device was not assigned to a hub (status: {status}): {reason}")]
    NotAssigned {
        status: RegistrationStatus,
        reason: String,
    },

    #[error("Hub client failed: {0}")]
    Hub(#[from] HubError),

    #[error("Failed to read readings from {path}: {source}")]
    ReadingsFile {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Invalid readings: {0}")]
    Readings(#[from] ReadingsError),

    #[error("Failed to encode telemetry: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("Failed to read/write stored registration: {0}")]
    Store(#[from] StoreError),
}

/// Everything a run needs to know
#[derive(Clone, Debug)]
pub struct Config {
    pub identity: ProvisioningIdentity,

    /// Readings to send instead of the default telemetry sample
    pub readings: Option<PathBuf>,

    /// Where to keep the assignment between runs, if anywhere
    pub registration_store: Option<Store>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Summary {
    pub registration: DeviceRegistration,
    pub messages_sent: usize,
}

/// Provision the device, then send its telemetry to the assigned hub.
///
/// Each network step runs once and only after the previous one succeeded:
/// register, create the hub client, connect, send, disconnect. A hub client
/// is only created when the device was assigned. Once connected, the client
/// is always disconnected, and a send failure takes precedence over a
/// disconnect failure.
#[instrument(
    name = "bootstrap",
    skip_all,
    fields(registration_id = %config.identity.registration_id),
    err
)]
pub async fn run<P, C>(
    config: &Config,
    provisioner: &P,
    connector: &C,
) -> Result<Summary, BootstrapError>
where
    P: Provision,
    C: HubConnect,
{
    // fail on bad input before touching the network
    let telemetry = load_telemetry(config).await?;

    let registration = if let Some(stored) = read_stored_registration(config).await? {
        info!(
            hub = %stored.assigned_hub,
            device_id = %stored.device_id,
            "using stored registration"
        );
        stored
    } else {
        let result = provisioner.register(&config.identity).await?;
        info!("registration result: {result}");

        match Assignment::from(result) {
            Assignment::Assigned(registration) => {
                info!("provisioned the device");
                store_registration(config, &registration).await?;
                registration
            }
            Assignment::Rejected { status, reason } => {
                return Err(BootstrapError::NotAssigned { status, reason });
            }
        }
    };

    let mut hub = connector.create_from_symmetric_key(
        &config.identity.symmetric_key,
        &registration.assigned_hub,
        &registration.device_id,
    )?;

    hub.connect().await?;

    let messages = telemetry_messages(telemetry);
    let sent = send_all(&mut hub, &messages).await;
    let disconnected = hub.disconnect().await;

    let messages_sent = match (sent, disconnected) {
        (Ok(count), Ok(())) => count,
        (Ok(_), Err(err)) => return Err(err.into()),
        (Err(err), Ok(())) => return Err(err.into()),
        (Err(err), Err(disconnect_err)) => {
            warn!("failed to disconnect after send failure: {disconnect_err}");
            return Err(err.into());
        }
    };

    Ok(Summary {
        registration,
        messages_sent,
    })
}

async fn send_all<H: DeviceHub>(hub: &mut H, messages: &[Message]) -> Result<usize, HubError> {
    for message in messages {
        hub.send_message(message).await?;
        info!("sent message to AssetHub");
    }
    Ok(messages.len())
}

fn telemetry_messages(bodies: Vec<String>) -> Vec<Message> {
    bodies
        .into_iter()
        .map(|body| {
            Message::json(body).with_message_id(pseudorandom_string(ALPHA_NUM, MESSAGE_ID_LEN))
        })
        .collect()
}

/// JSON bodies to send, in order
async fn load_telemetry(config: &Config) -> Result<Vec<String>, BootstrapError> {
    let Some(path) = &config.readings else {
        return Ok(vec![DEFAULT_TELEMETRY.to_owned()]);
    };

    let contents =
        tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BootstrapError::ReadingsFile {
                path: path.clone(),
                source,
            })?;
    let readings = parse_readings(&contents)?;
    let values = to_metered_values(&aggregate_per_minute(&readings));

    let bodies = values
        .iter()
        .map(|value| value.to_json())
        .collect::<Result<Vec<_>, _>>()?;
    Ok(bodies)
}

async fn read_stored_registration(
    config: &Config,
) -> Result<Option<DeviceRegistration>, BootstrapError> {
    let Some(store) = &config.registration_store else {
        return Ok(None);
    };

    let identity = &config.identity;
    let name = StoredRegistration::name_for(&identity.id_scope, &identity.registration_id);
    let stored: Option<StoredRegistration> = store.read(&name).await?;
    Ok(stored.map(|stored| stored.registration()))
}

async fn store_registration(
    config: &Config,
    registration: &DeviceRegistration,
) -> Result<(), BootstrapError> {
    if let Some(store) = &config.registration_store {
        let identity = &config.identity;
        store
            .save(&StoredRegistration::new(
                &identity.id_scope,
                &identity.registration_id,
                registration,
            ))
            .await?;
        debug!("registration stored");
    }
    Ok(())
}
