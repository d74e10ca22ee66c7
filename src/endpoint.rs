//! Backend endpoint configuration.

use crate::{Error, Result};
use url::Url;

/// The identity of the backend a client talks to.
///
/// `name` labels the client in logs, `scheme`/`host`/`port` locate the
/// service. The host is fixed for the life of a client; the scheme and port
/// may be changed on a live [`Client`](crate::Client).
///
/// # Examples
///
/// ```
/// use netspec::ClientEndpoint;
///
/// let endpoint = ClientEndpoint::new("accounts", "https", "api.example.com", None)?;
/// assert_eq!(endpoint.host(), "api.example.com");
///
/// let local = ClientEndpoint::from_url("local", "http://127.0.0.1:8080")?;
/// assert_eq!(local.port(), Some(8080));
/// # Ok::<(), netspec::Error>(())
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientEndpoint {
    name: String,
    scheme: String,
    host: String,
    port: Option<u16>,
}

impl ClientEndpoint {
    /// Creates an endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if `host` is empty.
    pub fn new(
        name: impl Into<String>,
        scheme: impl Into<String>,
        host: impl Into<String>,
        port: Option<u16>,
    ) -> Result<Self> {
        let host = host.into();
        if host.trim().is_empty() {
            return Err(Error::ConfigurationError(
                "Endpoint host must not be empty".to_string(),
            ));
        }
        Ok(Self {
            name: name.into(),
            scheme: scheme.into(),
            host,
            port,
        })
    }

    /// Creates an endpoint from a base URL such as `https://api.example.com:8443`.
    ///
    /// Only the scheme, host and explicit port are kept; any path or query in
    /// the URL is ignored.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ConfigurationError`] if the URL does not parse or has
    /// no host.
    pub fn from_url(name: impl Into<String>, url: impl AsRef<str>) -> Result<Self> {
        let url = Url::parse(url.as_ref())
            .map_err(|e| Error::ConfigurationError(format!("Invalid base URL: {}", e)))?;
        let host = url
            .host_str()
            .ok_or_else(|| Error::ConfigurationError("Base URL has no host".to_string()))?;
        Self::new(name, url.scheme(), host, url.port())
    }

    /// The symbolic name of the backend.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The URL scheme, e.g. `https`.
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// The host name or address.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// The explicit port, if any.
    pub fn port(&self) -> Option<u16> {
        self.port
    }

    pub(crate) fn set_scheme(&mut self, scheme: String) {
        self.scheme = scheme;
    }

    pub(crate) fn set_port(&mut self, port: Option<u16>) {
        self.port = port;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_host_rejected() {
        let result = ClientEndpoint::new("svc", "https", "  ", None);
        assert!(matches!(result, Err(Error::ConfigurationError(_))));
    }

    #[test]
    fn test_from_url_keeps_scheme_host_port() {
        let endpoint =
            ClientEndpoint::from_url("svc", "http://localhost:3000/ignored?x=1").unwrap();
        assert_eq!(endpoint.name(), "svc");
        assert_eq!(endpoint.scheme(), "http");
        assert_eq!(endpoint.host(), "localhost");
        assert_eq!(endpoint.port(), Some(3000));
    }

    #[test]
    fn test_from_url_default_port_is_none() {
        let endpoint = ClientEndpoint::from_url("svc", "https://api.example.com").unwrap();
        assert_eq!(endpoint.port(), None);
    }

    #[test]
    fn test_from_url_rejects_garbage() {
        assert!(matches!(
            ClientEndpoint::from_url("svc", "not a url"),
            Err(Error::ConfigurationError(_))
        ));
    }
}
