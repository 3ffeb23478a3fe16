use std::fmt::{self, Debug, Display};
use std::str::FromStr;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum InvalidSymmetricKeyError {
    #[error("symmetric key must not be empty")]
    Empty,

    #[error("symmetric key is not valid base64: {0}")]
    Encoding(#[from] base64::DecodeError),
}

/// A device symmetric key, as handed out by the provisioning service
/// enrollment.
///
/// Only the decoded bytes used to sign tokens are kept.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey {
    decoded: Vec<u8>,
}

impl SymmetricKey {
    pub fn as_bytes(&self) -> &[u8] {
        &self.decoded
    }
}

impl FromStr for SymmetricKey {
    type Err = InvalidSymmetricKeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let encoded = s.trim();
        if encoded.is_empty() {
            return Err(InvalidSymmetricKeyError::Empty);
        }

        let decoded = STANDARD.decode(encoded)?;
        Ok(Self { decoded })
    }
}

// Never print the secret
impl Debug for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SymmetricKey(<redacted>)")
    }
}

impl Display for SymmetricKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("<redacted>")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_symmetric_key_decodes_base64() {
        let key: SymmetricKey = "c2VjcmV0".parse().unwrap();
        assert_eq!(key.as_bytes(), b"secret");
    }

    #[test]
    fn test_symmetric_key_rejects_empty() {
        let result = "   ".parse::<SymmetricKey>();
        assert!(matches!(result, Err(InvalidSymmetricKeyError::Empty)));
    }

    #[test]
    fn test_symmetric_key_rejects_invalid_base64() {
        let result = "not base64!".parse::<SymmetricKey>();
        assert!(matches!(result, Err(InvalidSymmetricKeyError::Encoding(_))));
    }

    #[test]
    fn test_symmetric_key_is_redacted() {
        let key: SymmetricKey = "c2VjcmV0".parse().unwrap();
        assert_eq!(format!("{key:?}"), "SymmetricKey(<redacted>)");
        assert_eq!(key.to_string(), "<redacted>");
    }
}
