use std::fmt::Display;
use std::str::FromStr;

use thiserror::Error;

#[derive(Debug, Error)]
#[error("{0}")]
pub struct InvalidUriError(String);

impl From<http::uri::InvalidUri> for InvalidUriError {
    fn from(value: http::uri::InvalidUri) -> Self {
        InvalidUriError(value.to_string())
    }
}

impl From<http::uri::InvalidUriParts> for InvalidUriError {
    fn from(value: http::uri::InvalidUriParts) -> Self {
        InvalidUriError(value.to_string())
    }
}

/// An absolute endpoint URI
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Uri(http::Uri);

impl Uri {
    /// Parse a bare host name (e.g. `global.azure-devices-provisioning.net`)
    /// or a full URI, assuming `https` when no scheme is given.
    pub fn from_host(host: &str) -> Result<Self, InvalidUriError> {
        let host = host.trim().trim_end_matches('/');
        if host.is_empty() {
            return Err(InvalidUriError("host must not be empty".to_owned()));
        }

        let uri: http::Uri = if host.contains("://") {
            host.parse()?
        } else {
            format!("https://{host}").parse()?
        };

        if uri.host().is_none() {
            return Err(InvalidUriError(format!("missing host in '{host}'")));
        }
        Ok(Self(uri))
    }

    pub fn host(&self) -> Option<&str> {
        self.0.host()
    }

    /// Replace the path and query of `base_uri`
    pub fn from_parts(
        base_uri: Uri,
        path: &str,
        query: Option<&str>,
    ) -> Result<Self, InvalidUriError> {
        let path_and_query = if let Some(qs) = query {
            http::uri::PathAndQuery::from_maybe_shared(format!("{path}?{qs}"))?
        } else {
            http::uri::PathAndQuery::from_str(path)?
        };
        let mut parts = base_uri.0.into_parts();
        parts.path_and_query = Some(path_and_query);

        Ok(http::Uri::from_parts(parts).map(Self)?)
    }
}

impl Display for Uri {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.0.fmt(f)
    }
}

impl FromStr for Uri {
    type Err = InvalidUriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_host(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_host_defaults_to_https() {
        let uri = Uri::from_host("global.azure-devices-provisioning.net").unwrap();
        assert_eq!(uri.to_string(), "https://global.azure-devices-provisioning.net/");
        assert_eq!(uri.host(), Some("global.azure-devices-provisioning.net"));
    }

    #[test]
    fn test_explicit_scheme_is_kept() {
        let uri: Uri = "http://127.0.0.1:1234".parse().unwrap();
        assert_eq!(uri.host(), Some("127.0.0.1"));
        assert_eq!(uri.to_string(), "http://127.0.0.1:1234/");
    }

    #[test]
    fn test_empty_host_is_rejected() {
        assert!(Uri::from_host(" ").is_err());
    }

    #[test]
    fn test_from_parts_replaces_path_and_query() {
        let base: Uri = "https://hub1.example.net".parse().unwrap();
        let uri = Uri::from_parts(base, "/devices/dev1/messages/events", Some("api-version=1")).unwrap();
        assert_eq!(
            uri.to_string(),
            "https://hub1.example.net/devices/dev1/messages/events?api-version=1"
        );
    }
}
