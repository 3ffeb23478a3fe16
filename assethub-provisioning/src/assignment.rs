use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Status of a registration as reported by the provisioning service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RegistrationStatus {
    Unassigned,
    Assigning,
    Assigned,
    Failed,
    Disabled,
    /// A status this client does not know about, kept verbatim
    Other(String),
}

impl RegistrationStatus {
    /// Whether the service is done processing the registration
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Unassigned | Self::Assigning)
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Unassigned => "unassigned",
            Self::Assigning => "assigning",
            Self::Assigned => "assigned",
            Self::Failed => "failed",
            Self::Disabled => "disabled",
            Self::Other(status) => status,
        }
    }
}

impl From<String> for RegistrationStatus {
    fn from(value: String) -> Self {
        match value.as_str() {
            "unassigned" => Self::Unassigned,
            "assigning" => Self::Assigning,
            "assigned" => Self::Assigned,
            "failed" => Self::Failed,
            "disabled" => Self::Disabled,
            _ => Self::Other(value),
        }
    }
}

impl From<&str> for RegistrationStatus {
    fn from(value: &str) -> Self {
        Self::from(value.to_owned())
    }
}

impl From<RegistrationStatus> for String {
    fn from(value: RegistrationStatus) -> Self {
        value.as_str().to_owned()
    }
}

impl Display for RegistrationStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/*
    {
        operationId,
        status,
        registrationState?: {
            registrationId,
            createdDateTimeUtc,
            assignedHub,
            deviceId,
            status,
            substatus,
            errorCode?,
            errorMessage?,
            lastUpdatedDateTimeUtc,
            etag
        }
    }
*/
/// Provisioning service reply to a registration or operation status request
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationResult {
    pub operation_id: String,
    pub status: RegistrationStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_state: Option<RegistrationState>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationState {
    pub registration_id: Option<String>,
    #[serde(rename = "createdDateTimeUtc")]
    pub created: Option<String>,
    pub assigned_hub: Option<String>,
    pub device_id: Option<String>,
    pub status: Option<RegistrationStatus>,
    pub substatus: Option<String>,
    pub error_code: Option<i64>,
    pub error_message: Option<String>,
    #[serde(rename = "lastUpdatedDateTimeUtc")]
    pub last_updated: Option<String>,
    pub etag: Option<String>,
}

impl RegistrationResult {
    pub fn assigned_hub(&self) -> Option<&str> {
        self.registration_state
            .as_ref()
            .and_then(|state| state.assigned_hub.as_deref())
    }

    pub fn device_id(&self) -> Option<&str> {
        self.registration_state
            .as_ref()
            .and_then(|state| state.device_id.as_deref())
    }
}

impl Display for RegistrationResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} (operation: {}, hub: {}, device: {})",
            self.status,
            self.operation_id,
            self.assigned_hub().unwrap_or("none"),
            self.device_id().unwrap_or("none"),
        )
    }
}

/// Where the device was placed by the provisioning service
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceRegistration {
    pub assigned_hub: String,
    pub device_id: String,
}

/// Outcome of a registration.
///
/// A device may only talk to a hub after it was `Assigned` one.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Assignment {
    Assigned(DeviceRegistration),
    Rejected {
        status: RegistrationStatus,
        reason: String,
    },
}

impl From<RegistrationResult> for Assignment {
    fn from(result: RegistrationResult) -> Self {
        let state = result.registration_state.unwrap_or_default();

        if result.status != RegistrationStatus::Assigned {
            let reason = state
                .error_message
                .or(state.substatus)
                .unwrap_or_else(|| "no reason given".to_owned());
            return Assignment::Rejected {
                status: result.status,
                reason,
            };
        }

        match (state.assigned_hub, state.device_id) {
            (Some(assigned_hub), Some(device_id))
                if !assigned_hub.is_empty() && !device_id.is_empty() =>
            {
                Assignment::Assigned(DeviceRegistration {
                    assigned_hub,
                    device_id,
                })
            }
            _ => Assignment::Rejected {
                status: result.status,
                reason: "assignment is missing the hub or device id".to_owned(),
            },
        }
    }
}
