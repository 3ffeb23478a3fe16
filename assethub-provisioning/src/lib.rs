/*
Everything related to the device provisioning service.

Provisioning is the one-time handshake that tells a device which hub it
belongs to. The device proves its identity with a symmetric key, the
service answers with an assignment (a hub host name and the device id to
use there), or with the reason it refused one.
*/

mod assignment;
mod client;
mod config;
mod identity;

pub use assignment::{
    Assignment, DeviceRegistration, RegistrationResult, RegistrationState, RegistrationStatus,
};
pub use client::{Provision, ProvisioningClient, ProvisioningError};
pub use config::{RequestConfig, StoredRegistration};
pub use identity::ProvisioningIdentity;

use assethub_util as util;
