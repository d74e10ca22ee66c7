//! Resolution of request specs into concrete wire requests.
//!
//! The [`RequestAssembler`] combines a [`RequestSpec`] with a
//! [`ClientEndpoint`] to produce a [`ConcreteRequest`]: absolute URL, method,
//! headers, JSON body bytes and timeout. Assembly is synchronous and never
//! touches the network; a URL that cannot be built fails here, before any
//! transport call.

use crate::{endpoint::ClientEndpoint, manager::RequestManager, spec::RequestSpec, Error, Result};
use bytes::Bytes;
use http::{header, HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::Value;
use std::time::Duration;
use url::{Host, Url};

/// Timeout applied to both connecting and transferring.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// A fully resolved request, ready for a [`Transport`](crate::Transport).
///
/// Application code only sees it read-only (through [`Client::assemble`] or
/// a manager's error hook); the manager's [`configure`] hook is the one place
/// allowed to change it.
///
/// [`Client::assemble`]: crate::Client::assemble
/// [`configure`]: crate::RequestManager::configure
#[derive(Debug, Clone)]
pub struct ConcreteRequest {
    method: Method,
    url: Url,
    headers: HeaderMap,
    body: Option<Bytes>,
    timeout: Duration,
}

impl ConcreteRequest {
    /// The HTTP method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// The absolute URL, query included.
    pub fn url(&self) -> &Url {
        &self.url
    }

    /// The request headers.
    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Mutable access to the headers, for [`RequestManager::configure`].
    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Returns a header value by name.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)?.to_str().ok()
    }

    /// The serialized JSON body, if the spec had body fields.
    pub fn body(&self) -> Option<&Bytes> {
        self.body.as_ref()
    }

    /// The body parsed back into JSON, mostly useful in tests and logs.
    pub fn body_json(&self) -> Option<Value> {
        serde_json::from_slice(self.body.as_ref()?).ok()
    }

    /// The timeout for connecting and for the whole transfer.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }
}

/// Turns [`RequestSpec`]s into [`ConcreteRequest`]s.
///
/// # Examples
///
/// ```
/// use netspec::{ClientEndpoint, RequestAssembler, RequestSpec};
///
/// let endpoint = ClientEndpoint::new("api", "https", "api.example.com", None)?;
/// let spec = RequestSpec::get("users")
///     .change_version(Some("v2"))
///     .add_query("id", Some(7));
///
/// let request = RequestAssembler::new().assemble(&spec, &endpoint, None)?;
/// assert_eq!(request.url().as_str(), "https://api.example.com/v2/users?id=7");
/// # Ok::<(), netspec::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct RequestAssembler {
    timeout: Duration,
    default_headers: HeaderMap,
}

impl RequestAssembler {
    /// Creates an assembler with the default timeout and no extra headers.
    pub fn new() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            default_headers: HeaderMap::new(),
        }
    }

    /// Sets the timeout stamped on every request.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets headers added to every request before the manager hook runs.
    pub fn with_default_headers(mut self, headers: HeaderMap) -> Self {
        self.default_headers = headers;
        self
    }

    /// Resolves `spec` against `endpoint`.
    ///
    /// When a manager is given, its [`configure`](RequestManager::configure)
    /// hook receives the complete draft and its result is returned.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlConstruction`] if the scheme, host, port and path
    /// do not form a valid URL, and [`Error::Transform`] if the body cannot be
    /// encoded.
    pub fn assemble(
        &self,
        spec: &RequestSpec,
        endpoint: &ClientEndpoint,
        manager: Option<&dyn RequestManager>,
    ) -> Result<ConcreteRequest> {
        let url = build_url(spec, endpoint)?;

        let mut headers = self.default_headers.clone();
        headers
            .entry(header::ACCEPT)
            .or_insert(HeaderValue::from_static("application/json"));

        let body = match spec.body() {
            Some(fields) if !fields.is_empty() => {
                let bytes = serde_json::to_vec(&Value::Object(fields.clone()))
                    .map_err(|e| Error::Transform(e.to_string()))?;
                headers.insert(
                    header::CONTENT_TYPE,
                    HeaderValue::from_static("application/json"),
                );
                Some(Bytes::from(bytes))
            }
            _ => None,
        };

        let request = ConcreteRequest {
            method: spec.method().clone(),
            url,
            headers,
            body,
            timeout: self.timeout,
        };

        tracing::debug!(
            client = %endpoint.name(),
            method = %request.method,
            url = %request.url,
            has_body = request.body.is_some(),
            "Assembled request"
        );

        Ok(match manager {
            Some(manager) => manager.configure(request),
            None => request,
        })
    }
}

impl Default for RequestAssembler {
    fn default() -> Self {
        Self::new()
    }
}

fn build_url(spec: &RequestSpec, endpoint: &ClientEndpoint) -> Result<Url> {
    let base = format!("{}://{}", endpoint.scheme(), endpoint.host());
    let mut url =
        Url::parse(&base).map_err(|e| Error::UrlConstruction(format!("{}: {}", base, e)))?;

    // A host containing '/', '@' or '?' parses, but not as the host we were given.
    // Compare normalized forms: IDNA and IPv4 shorthand are rewritten by the parser.
    let host_matches = url.host().is_some_and(|actual| {
        Host::parse(endpoint.host()).is_ok_and(|expected| expected == actual.to_owned())
            || actual.to_string().eq_ignore_ascii_case(endpoint.host())
    });
    if !host_matches || url.cannot_be_a_base() {
        return Err(Error::UrlConstruction(format!(
            "{} is not a valid host for scheme {}",
            endpoint.host(),
            endpoint.scheme()
        )));
    }

    url.set_port(endpoint.port()).map_err(|_| {
        Error::UrlConstruction(format!("scheme {} cannot carry a port", endpoint.scheme()))
    })?;

    let path = match spec.version() {
        Some(version) => format!("/{}/{}", version, spec.path()),
        None => format!("/{}", spec.path()),
    };
    url.set_path(&path);

    if !spec.query().is_empty() {
        let mut pairs: Vec<_> = spec.query().iter().collect();
        pairs.sort();
        url.query_pairs_mut().extend_pairs(pairs);
    }

    Ok(url)
}

/// Parses a header name/value pair, as used by the client builder.
pub(crate) fn parse_header(name: &str, value: &str) -> Result<(HeaderName, HeaderValue)> {
    let name = HeaderName::try_from(name)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header name: {}", e)))?;
    let value = HeaderValue::try_from(value)
        .map_err(|e| Error::ConfigurationError(format!("Invalid header value: {}", e)))?;
    Ok((name, value))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn endpoint() -> ClientEndpoint {
        ClientEndpoint::new("test", "https", "api.example.com", None).unwrap()
    }

    #[test]
    fn test_versioned_url_with_query() {
        let spec = RequestSpec::get("users")
            .change_version(Some("v2"))
            .add_query("id", Some("7"));
        let request = RequestAssembler::new()
            .assemble(&spec, &endpoint(), None)
            .unwrap();
        assert_eq!(
            request.url().as_str(),
            "https://api.example.com/v2/users?id=7"
        );
        assert_eq!(request.method(), &Method::GET);
    }

    #[test]
    fn test_missing_version_omits_segment() {
        let spec = RequestSpec::get("ping").without_version();
        let request = RequestAssembler::new()
            .assemble(&spec, &endpoint(), None)
            .unwrap();
        assert_eq!(request.url().path(), "/ping");
        assert_eq!(request.url().query(), None);
    }

    #[test]
    fn test_default_version_prefix() {
        let request = RequestAssembler::new()
            .assemble(&RequestSpec::get("ping"), &endpoint(), None)
            .unwrap();
        assert_eq!(request.url().path(), "/v1/ping");
    }

    #[test]
    fn test_port_is_applied() {
        let endpoint = ClientEndpoint::new("test", "http", "localhost", Some(8080)).unwrap();
        let request = RequestAssembler::new()
            .assemble(&RequestSpec::get("ping"), &endpoint, None)
            .unwrap();
        assert_eq!(request.url().as_str(), "http://localhost:8080/v1/ping");
    }

    #[test]
    fn test_query_values_are_encoded() {
        let spec = RequestSpec::get("search")
            .add_query("q", Some("a&b c"))
            .add_query("lang", Some("en"));
        let request = RequestAssembler::new()
            .assemble(&spec, &endpoint(), None)
            .unwrap();
        assert_eq!(request.url().query(), Some("lang=en&q=a%26b+c"));
    }

    #[test]
    fn test_body_is_json_encoded() {
        let spec =
            RequestSpec::post("users").add_body([("name", json!("ada")), ("age", json!(36))]);
        let request = RequestAssembler::new()
            .assemble(&spec, &endpoint(), None)
            .unwrap();
        assert_eq!(request.header("content-type"), Some("application/json"));
        assert_eq!(request.body_json(), Some(json!({"name": "ada", "age": 36})));
    }

    #[test]
    fn test_no_body_without_fields() {
        let request = RequestAssembler::new()
            .assemble(&RequestSpec::get("users"), &endpoint(), None)
            .unwrap();
        assert!(request.body().is_none());
        assert!(request.header("content-type").is_none());
        assert_eq!(request.header("accept"), Some("application/json"));
    }

    #[test]
    fn test_timeout() {
        let assembler = RequestAssembler::new();
        let request = assembler
            .assemble(&RequestSpec::get("a"), &endpoint(), None)
            .unwrap();
        assert_eq!(request.timeout(), Duration::from_secs(15));

        let request = assembler
            .with_timeout(Duration::from_secs(3))
            .assemble(&RequestSpec::get("a"), &endpoint(), None)
            .unwrap();
        assert_eq!(request.timeout(), Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_scheme_fails() {
        let endpoint = ClientEndpoint::new("test", "ht tp", "api.example.com", None).unwrap();
        let result = RequestAssembler::new().assemble(&RequestSpec::get("a"), &endpoint, None);
        assert!(matches!(result, Err(Error::UrlConstruction(_))));
    }

    #[test]
    fn test_normalized_hosts_are_accepted() {
        let cases = [
            ("bücher.example", "https://xn--bcher-kva.example/v1/a"),
            ("127.1", "https://127.0.0.1/v1/a"),
            ("API.Example.com", "https://api.example.com/v1/a"),
            ("[::1]", "https://[::1]/v1/a"),
        ];
        for (host, expected) in cases {
            let endpoint = ClientEndpoint::new("test", "https", host, None).unwrap();
            let request = RequestAssembler::new()
                .assemble(&RequestSpec::get("a"), &endpoint, None)
                .unwrap();
            assert_eq!(request.url().as_str(), expected);
        }
    }

    #[test]
    fn test_invalid_host_fails() {
        for host in ["exa mple.com", "example.com/evil", "user@example.com"] {
            let endpoint = ClientEndpoint::new("test", "https", host, None).unwrap();
            let result =
                RequestAssembler::new().assemble(&RequestSpec::get("a"), &endpoint, None);
            assert!(
                matches!(result, Err(Error::UrlConstruction(_))),
                "host {host:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_manager_configures_last() {
        struct Auth;
        impl RequestManager for Auth {
            fn configure(&self, mut request: ConcreteRequest) -> ConcreteRequest {
                assert!(request.url().as_str().ends_with("/v1/me"));
                request
                    .headers_mut()
                    .insert(header::AUTHORIZATION, HeaderValue::from_static("X"));
                request
            }
        }

        let request = RequestAssembler::new()
            .assemble(&RequestSpec::get("me"), &endpoint(), Some(&Auth))
            .unwrap();
        assert_eq!(request.header("authorization"), Some("X"));
    }

    #[test]
    fn test_default_headers() {
        let (name, value) = parse_header("x-client", "netspec").unwrap();
        let mut headers = HeaderMap::new();
        headers.insert(name, value);
        let request = RequestAssembler::new()
            .with_default_headers(headers)
            .assemble(&RequestSpec::get("a"), &endpoint(), None)
            .unwrap();
        assert_eq!(request.header("x-client"), Some("netspec"));
    }

    #[test]
    fn test_parse_header_rejects_invalid_name() {
        assert!(matches!(
            parse_header("bad header", "v"),
            Err(Error::ConfigurationError(_))
        ));
    }
}
