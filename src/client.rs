//! HTTP client that assembles request specs and decodes response envelopes.
//!
//! The [`Client`] type is the main entry point for making requests.
//! Use [`ClientBuilder`] to configure and create clients.

use crate::{
    assembler::{parse_header, ConcreteRequest, RequestAssembler, DEFAULT_TIMEOUT},
    dispatch::RequestHandle,
    endpoint::ClientEndpoint,
    envelope::{self, ResponseEnvelope},
    manager::{ManagerSlot, RequestManager},
    reachability::Reachability,
    spec::ToRequestSpec,
    transport::{ReqwestTransport, Transport, TransportResponse},
    Error, Result,
};
use bytes::Bytes;
use http::HeaderMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::{Arc, PoisonError, RwLock, Weak};
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};
use tracing::Instrument;

/// A client bound to one backend endpoint.
///
/// The client is designed to be reused across requests and is cheap to
/// clone; clones share the endpoint, transport and manager.
///
/// # Examples
///
/// ```no_run
/// use netspec::{Client, RequestSpec};
/// use serde::Deserialize;
///
/// #[derive(Deserialize)]
/// struct User {
///     id: u64,
///     name: String,
/// }
///
/// # async fn example() -> Result<(), netspec::Error> {
/// let client = Client::builder()
///     .base_url("https://api.example.com")?
///     .build()?;
///
/// // GET https://api.example.com/v1/users?id=7, reading {"code":1,"data":{...}}
/// let spec = RequestSpec::get("users").add_query("id", Some(7));
/// let user: User = client.net_request(spec).await?;
/// println!("{} is #{}", user.name, user.id);
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Client {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    transport: Box<dyn Transport>,
    endpoint: RwLock<ClientEndpoint>,
    assembler: RequestAssembler,
    manager: ManagerSlot,
    queue: Handle,
    owned_queue: Option<Runtime>,
    reachability: Option<Arc<Reachability>>,
}

impl Drop for ClientInner {
    fn drop(&mut self) {
        // May run on one of the queue's own workers.
        if let Some(queue) = self.owned_queue.take() {
            queue.shutdown_background();
        }
    }
}

impl Client {
    /// Creates a new `ClientBuilder` for configuring a client.
    pub fn builder() -> ClientBuilder {
        ClientBuilder::new()
    }

    /// Returns a snapshot of the endpoint configuration.
    pub fn endpoint(&self) -> ClientEndpoint {
        self.inner
            .endpoint
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Changes the scheme used by subsequent requests.
    pub fn set_scheme(&self, scheme: impl Into<String>) {
        self.inner
            .endpoint
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_scheme(scheme.into());
    }

    /// Changes the port used by subsequent requests.
    pub fn set_port(&self, port: Option<u16>) {
        self.inner
            .endpoint
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .set_port(port);
    }

    /// Attaches a request manager.
    ///
    /// The client only keeps a weak reference: once every `Arc` to the
    /// manager is dropped, requests proceed as if none were attached.
    ///
    /// # Examples
    ///
    /// ```no_run
    /// use netspec::{Client, RequestManager};
    /// use std::sync::Arc;
    ///
    /// struct Audit;
    /// impl RequestManager for Audit {}
    ///
    /// # fn example() -> Result<(), netspec::Error> {
    /// let client = Client::builder().base_url("https://api.example.com")?.build()?;
    /// let audit = Arc::new(Audit);
    /// client.set_request_manager(Arc::<Audit>::downgrade(&audit));
    /// # Ok(())
    /// # }
    /// ```
    pub fn set_request_manager(&self, manager: Weak<dyn RequestManager>) {
        self.inner.manager.set(manager);
    }

    /// Detaches the request manager, if any.
    pub fn clear_request_manager(&self) {
        self.inner.manager.clear();
    }

    /// The reachability service given to the builder, if any.
    pub fn reachability(&self) -> Option<&Arc<Reachability>> {
        self.inner.reachability.as_ref()
    }

    /// Resolves a spec into the request that would be sent, without sending it.
    ///
    /// The endpoint is read once, so a concurrent [`set_scheme`](Self::set_scheme)
    /// or [`set_port`](Self::set_port) applies either entirely or not at all.
    ///
    /// # Errors
    ///
    /// Returns [`Error::UrlConstruction`] if no valid URL can be built.
    pub fn assemble(&self, spec: impl ToRequestSpec) -> Result<ConcreteRequest> {
        let spec = spec.to_request_spec();
        let endpoint = self.endpoint();
        let manager = self.inner.manager.get();
        self.inner
            .assembler
            .assemble(&spec, &endpoint, manager.as_deref())
    }

    /// Sends a request and decodes the `data` field of its envelope.
    ///
    /// # Errors
    ///
    /// * [`Error::UrlConstruction`] if the request cannot be built (nothing is sent)
    /// * [`Error::Network`] or [`Error::Timeout`] from the transport
    /// * [`Error::Transform`] if the body is not an envelope, or has neither
    ///   data nor message
    /// * [`Error::ServerReported`] if the envelope has a message but no data
    pub async fn net_request<T>(&self, spec: impl ToRequestSpec) -> Result<T>
    where
        T: DeserializeOwned,
    {
        self.execute(spec, |response| envelope::decode(&response.body)).await
    }

    /// Like [`net_request`](Self::net_request), but a successful envelope
    /// without `data` yields `Ok(None)` instead of an error.
    ///
    /// # Errors
    ///
    /// Same as [`net_request`](Self::net_request), except for the
    /// success-without-data case.
    pub async fn net_optional_request<T>(&self, spec: impl ToRequestSpec) -> Result<Option<T>>
    where
        T: DeserializeOwned,
    {
        self.execute(spec, |response| {
            ResponseEnvelope::<T>::from_slice(&response.body)?.into_optional()
        })
        .await
    }

    /// Sends a request and returns the response body untouched.
    ///
    /// # Errors
    ///
    /// * [`Error::UrlConstruction`] if the request cannot be built
    /// * [`Error::Network`] or [`Error::Timeout`] from the transport
    /// * [`Error::HttpError`] for a non-2xx status
    pub async fn net_data_request(&self, spec: impl ToRequestSpec) -> Result<Bytes> {
        self.execute(spec, envelope::decode_raw).await
    }

    /// Sends a request and returns its JSON body after checking the HTTP
    /// status and the envelope `code`.
    ///
    /// # Errors
    ///
    /// * [`Error::UrlConstruction`] if the request cannot be built
    /// * [`Error::Network`] or [`Error::Timeout`] from the transport
    /// * [`Error::ServerReported`] carrying the HTTP status, for a non-2xx
    ///   status or a `code` other than 1 (a missing `code` included)
    /// * [`Error::Transform`] if a 2xx body is not JSON
    pub async fn net_default_request(&self, spec: impl ToRequestSpec) -> Result<Value> {
        self.execute(spec, |response| envelope::decode_loose(&response)).await
    }

    /// Spawns [`net_request`](Self::net_request) on the client's work queue
    /// and returns a cancellable handle.
    ///
    /// Every client owns a single-worker runtime unless one was supplied with
    /// [`ClientBuilder::runtime`], so a slow backend only delays its own
    /// client. The handle can be awaited from any runtime. Requests
    /// dispatched from one client are independent; no ordering between them
    /// is guaranteed.
    pub fn dispatch<T>(&self, spec: impl ToRequestSpec) -> RequestHandle<T>
    where
        T: DeserializeOwned + Send + 'static,
    {
        let client = self.clone();
        let spec = spec.to_request_spec();
        let span = tracing::info_span!("dispatch", client = %self.endpoint().name());
        let task = self
            .inner
            .queue
            .spawn(async move { client.net_request::<T>(spec).await }.instrument(span));
        RequestHandle::new(task)
    }

    /// Assembles, sends and decodes one request, reporting failures to the
    /// manager.
    async fn execute<R, F>(&self, spec: impl ToRequestSpec, decode: F) -> Result<R>
    where
        F: FnOnce(TransportResponse) -> Result<R>,
    {
        let request = self.assemble(spec)?;

        tracing::debug!(
            method = %request.method(),
            url = %request.url(),
            "Executing HTTP request"
        );

        let result = match self.inner.transport.send(request.clone()).await {
            Ok(response) => {
                tracing::info!(
                    status = response.status.as_u16(),
                    latency_ms = response.latency.as_millis(),
                    "Received HTTP response"
                );
                decode(response)
            }
            Err(e) => Err(e),
        };

        if let Err(e) = &result {
            self.report_failure(&request, e);
        }
        result
    }

    fn report_failure(&self, request: &ConcreteRequest, error: &Error) {
        tracing::warn!(
            error = %error,
            method = %request.method(),
            url = %request.url(),
            "Request failed"
        );
        if let Some(manager) = self.inner.manager.get() {
            manager.error_handle(request, error);
        }
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("endpoint", &self.endpoint())
            .field("assembler", &self.inner.assembler)
            .field("manager", &self.inner.manager)
            .field("owns_queue", &self.inner.owned_queue.is_some())
            .finish_non_exhaustive()
    }
}

/// Builder for configuring and creating a [`Client`].
///
/// # Examples
///
/// ```no_run
/// use netspec::{ClientBuilder, ClientEndpoint};
/// use std::time::Duration;
///
/// # fn example() -> Result<(), netspec::Error> {
/// let client = ClientBuilder::new()
///     .endpoint(ClientEndpoint::new("billing", "https", "billing.example.com", Some(8443))?)
///     .timeout(Duration::from_secs(5))
///     .default_header("User-Agent", "my-app/1.0")?
///     .build()?;
/// # Ok(())
/// # }
/// ```
pub struct ClientBuilder {
    endpoint: Option<ClientEndpoint>,
    name: Option<String>,
    default_headers: HeaderMap,
    timeout: Duration,
    transport: Option<Box<dyn Transport>>,
    manager: Option<Weak<dyn RequestManager>>,
    runtime: Option<Handle>,
    reachability: Option<Arc<Reachability>>,
}

impl ClientBuilder {
    /// Creates a new `ClientBuilder` with default settings.
    pub fn new() -> Self {
        Self {
            endpoint: None,
            name: None,
            default_headers: HeaderMap::new(),
            timeout: DEFAULT_TIMEOUT,
            transport: None,
            manager: None,
            runtime: None,
            reachability: None,
        }
    }

    /// Sets the backend endpoint.
    pub fn endpoint(mut self, endpoint: ClientEndpoint) -> Self {
        self.endpoint = Some(endpoint);
        self
    }

    /// Sets the backend endpoint from a base URL.
    ///
    /// The endpoint is named after the host unless [`name`](Self::name) is set.
    ///
    /// # Errors
    ///
    /// Returns an error if the URL is invalid or has no host.
    pub fn base_url(mut self, url: impl AsRef<str>) -> Result<Self> {
        self.endpoint = Some(ClientEndpoint::from_url("", url)?);
        Ok(self)
    }

    /// Sets the name the client logs under.
    pub fn name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Adds a default header that will be included in all requests.
    ///
    /// # Errors
    ///
    /// Returns an error if the header name or value is invalid.
    pub fn default_header(mut self, name: impl AsRef<str>, value: impl AsRef<str>) -> Result<Self> {
        let (name, value) = parse_header(name.as_ref(), value.as_ref())?;
        self.default_headers.insert(name, value);
        Ok(self)
    }

    /// Sets the request timeout. Defaults to 15 seconds.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Replaces the default reqwest-based transport.
    pub fn transport(mut self, transport: impl Transport + 'static) -> Self {
        self.transport = Some(Box::new(transport));
        self
    }

    /// Attaches a request manager, held weakly.
    pub fn request_manager(mut self, manager: Weak<dyn RequestManager>) -> Self {
        self.manager = Some(manager);
        self
    }

    /// Sets the runtime dispatched requests run on.
    ///
    /// By default each client builds its own single-worker runtime, named
    /// `netspec-<client name>`, and shuts it down when the last clone is
    /// dropped. Passing a handle shares that runtime instead; clients given
    /// the same handle share its workers.
    pub fn runtime(mut self, runtime: Handle) -> Self {
        self.runtime = Some(runtime);
        self
    }

    /// Shares a reachability service with the client.
    pub fn reachability(mut self, reachability: Arc<Reachability>) -> Self {
        self.reachability = Some(reachability);
        self
    }

    /// Builds the configured `Client`.
    ///
    /// # Errors
    ///
    /// Returns an error if no endpoint was provided or if the default
    /// transport cannot be built.
    pub fn build(self) -> Result<Client> {
        let endpoint = self
            .endpoint
            .ok_or_else(|| Error::ConfigurationError("Endpoint is required".to_string()))?;
        let name = match self.name {
            Some(name) => name,
            None if endpoint.name().is_empty() => endpoint.host().to_string(),
            None => endpoint.name().to_string(),
        };
        let endpoint =
            ClientEndpoint::new(name, endpoint.scheme(), endpoint.host(), endpoint.port())?;

        let transport = match self.transport {
            Some(transport) => transport,
            None => Box::new(ReqwestTransport::with_connect_timeout(self.timeout)?),
        };

        let assembler = RequestAssembler::new()
            .with_timeout(self.timeout)
            .with_default_headers(self.default_headers);

        let manager = ManagerSlot::default();
        if let Some(weak) = self.manager {
            manager.set(weak);
        }

        let (queue, owned_queue) = match self.runtime {
            Some(handle) => (handle, None),
            None => {
                let runtime = tokio::runtime::Builder::new_multi_thread()
                    .worker_threads(1)
                    .thread_name(format!("netspec-{}", endpoint.name()))
                    .enable_all()
                    .build()
                    .map_err(|e| {
                        Error::ConfigurationError(format!("Failed to build work queue: {}", e))
                    })?;
                (runtime.handle().clone(), Some(runtime))
            }
        };

        tracing::debug!(
            client = %endpoint.name(),
            scheme = %endpoint.scheme(),
            host = %endpoint.host(),
            "Built client"
        );

        Ok(Client {
            inner: Arc::new(ClientInner {
                transport,
                endpoint: RwLock::new(endpoint),
                assembler,
                manager,
                queue,
                owned_queue,
                reachability: self.reachability,
            }),
        })
    }
}

impl Default for ClientBuilder {
    fn default() -> Self {
        Self::new()
    }
}
