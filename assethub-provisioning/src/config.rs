use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::DeviceRegistration;
use crate::util::config::StoredConfig;
use crate::util::crypto::sha256_hex_digest;
use crate::util::sas::DEFAULT_TOKEN_TTL;

#[derive(Clone, Debug)]
pub struct RequestConfig {
    /// Time limit for a single HTTP request
    pub timeout: Duration,

    /// Time limit for the whole registration, status polling included
    pub provisioning_timeout: Duration,

    /// Wait between status polls when the service does not send Retry-After
    pub poll_interval: Duration,

    /// Validity of the registration token
    pub token_ttl: Duration,
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(59_000),
            provisioning_timeout: Duration::from_millis(60_000),
            poll_interval: Duration::from_millis(2_000),
            token_ttl: DEFAULT_TOKEN_TTL,
        }
    }
}

// IMPORTANT: this struct is persisted to disk. A stored registration that
// no longer deserializes makes the device provision again on its next run.

/// A registration persisted after a successful assignment
#[derive(Clone, Debug, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoredRegistration {
    pub id_scope: String,
    pub registration_id: String,
    pub assigned_hub: String,
    pub device_id: String,
}

impl StoredRegistration {
    pub fn new(id_scope: &str, registration_id: &str, registration: &DeviceRegistration) -> Self {
        Self {
            id_scope: id_scope.to_owned(),
            registration_id: registration_id.to_owned(),
            assigned_hub: registration.assigned_hub.clone(),
            device_id: registration.device_id.clone(),
        }
    }

    /// Document name for the registration of `registration_id` in `id_scope`
    pub fn name_for(id_scope: &str, registration_id: &str) -> String {
        let digest = sha256_hex_digest(format!("{id_scope}/{registration_id}"));
        format!("{}-{digest}", Self::kind())
    }

    pub fn registration(&self) -> DeviceRegistration {
        DeviceRegistration {
            assigned_hub: self.assigned_hub.clone(),
            device_id: self.device_id.clone(),
        }
    }
}

impl StoredConfig for StoredRegistration {
    fn kind() -> &'static str {
        "registration"
    }

    fn name(&self) -> String {
        Self::name_for(&self.id_scope, &self.registration_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::util::store::Store;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_stored_registration_is_found_by_identity() {
        let dir = tempdir().unwrap();
        let store = Store::new(dir.path());
        let registration = DeviceRegistration {
            assigned_hub: "hub1.example.net".to_string(),
            device_id: "dev1".to_string(),
        };

        store
            .save(&StoredRegistration::new("scope1", "dev1", &registration))
            .await
            .unwrap();

        let found: Option<StoredRegistration> = store
            .read(&StoredRegistration::name_for("scope1", "dev1"))
            .await
            .unwrap();
        let other: Option<StoredRegistration> = store
            .read(&StoredRegistration::name_for("scope2", "dev1"))
            .await
            .unwrap();

        assert_eq!(found.map(|s| s.registration()), Some(registration));
        assert!(other.is_none());
    }
}
