use std::time::Duration;

use crate::util::http::{InvalidUriError, Uri};
use crate::util::sas::SasToken;
use crate::util::types::SymmetricKey;

/// API version of the provisioning service REST endpoints
const API_VERSION: &str = "2021-06-01";

// SAS key name expected by the service for device registrations
const REGISTRATION_KEY_NAME: &str = "registration";

/// What a device needs to know to ask for an assignment
#[derive(Clone, Debug)]
pub struct ProvisioningIdentity {
    pub provisioning_host: Uri,
    pub id_scope: String,
    pub registration_id: String,
    pub symmetric_key: SymmetricKey,
}

impl ProvisioningIdentity {
    /// Resource the registration token is scoped to
    fn resource(&self) -> String {
        format!("{}/registrations/{}", self.id_scope, self.registration_id)
    }

    pub(crate) fn sas_token(&self, ttl: Duration) -> SasToken {
        SasToken::with_ttl(
            &self.symmetric_key,
            &self.resource(),
            Some(REGISTRATION_KEY_NAME),
            ttl,
        )
    }

    /// `{host}/{id_scope}/registrations/{registration_id}/register`
    pub(crate) fn register_endpoint(&self) -> Result<Uri, InvalidUriError> {
        self.endpoint("register")
    }

    /// `{host}/{id_scope}/registrations/{registration_id}/operations/{operation_id}`
    pub(crate) fn operation_endpoint(&self, operation_id: &str) -> Result<Uri, InvalidUriError> {
        self.endpoint(&format!("operations/{}", urlencoding::encode(operation_id)))
    }

    fn endpoint(&self, suffix: &str) -> Result<Uri, InvalidUriError> {
        let path = format!(
            "/{}/registrations/{}/{suffix}",
            urlencoding::encode(&self.id_scope),
            urlencoding::encode(&self.registration_id),
        );
        Uri::from_parts(
            self.provisioning_host.clone(),
            &path,
            Some(&format!("api-version={API_VERSION}")),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity() -> ProvisioningIdentity {
        ProvisioningIdentity {
            provisioning_host: "global.azure-devices-provisioning.net".parse().unwrap(),
            id_scope: "0ne00000000".to_string(),
            registration_id: "dev1".to_string(),
            symmetric_key: "c2VjcmV0".parse().unwrap(),
        }
    }

    #[test]
    fn test_register_endpoint() {
        let uri = identity().register_endpoint().unwrap();
        assert_eq!(
            uri.to_string(),
            "https://global.azure-devices-provisioning.net/0ne00000000/registrations/dev1/register?api-version=2021-06-01"
        );
    }

    #[test]
    fn test_operation_endpoint() {
        let uri = identity().operation_endpoint("4.abc.def").unwrap();
        assert_eq!(
            uri.to_string(),
            "https://global.azure-devices-provisioning.net/0ne00000000/registrations/dev1/operations/4.abc.def?api-version=2021-06-01"
        );
    }

    #[test]
    fn test_path_segments_stay_in_place() {
        let mut identity = identity();
        identity.registration_id = "a/b c".to_string();
        let uri = identity.register_endpoint().unwrap();
        assert!(uri.to_string().contains("/registrations/a%2Fb%20c/register"));
    }

    #[test]
    fn test_sas_token_is_scoped_to_registration() {
        let token = identity().sas_token(Duration::from_secs(60)).to_string();
        assert!(token.starts_with("SharedAccessSignature sr=0ne00000000%2Fregistrations%2Fdev1&sig="));
        assert!(token.ends_with("&skn=registration"));
    }
}
