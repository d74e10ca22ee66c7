//! # netspec - Typed request specs and envelope decoding over HTTP
//!
//! netspec sits between application call sites and an HTTP transport. Callers
//! describe *what* to request as an immutable [`RequestSpec`]; a [`Client`]
//! bound to one [`ClientEndpoint`] turns it into a concrete request, sends it,
//! and decodes the backend's `{code, data, message}` envelope into a typed
//! payload or a structured [`Error`].
//!
//! ## Quick Start
//!
//! ```no_run
//! use netspec::{Client, RequestSpec};
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Serialize)]
//! struct NewComment {
//!     body: String,
//! }
//!
//! #[derive(Deserialize)]
//! struct Comment {
//!     id: u64,
//!     body: String,
//! }
//!
//! #[tokio::main]
//! async fn main() -> Result<(), netspec::Error> {
//!     let client = Client::builder()
//!         .base_url("https://api.example.com")?
//!         .build()?;
//!
//!     // GET /v1/posts/42/comments?page=2
//!     let comments: Vec<Comment> = client
//!         .net_request(RequestSpec::get("posts/42/comments").add_query("page", Some(2)))
//!         .await?;
//!     println!("{} comments", comments.len());
//!
//!     // POST /v2/posts/42/comments with a JSON body
//!     let spec = RequestSpec::post("posts/42/comments")
//!         .change_version(Some("v2"))
//!         .add_typed_body(&NewComment { body: "Nice!".to_string() }, None);
//!     let created: Comment = client.net_request(spec).await?;
//!     println!("Created comment {}: {}", created.id, created.body);
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Features
//!
//! - **Immutable request specs** - every builder call returns a new value
//! - **Typed query values** - numbers, flags and strings via [`QueryValue`]
//! - **Envelope decoding** - `data` on success, [`Error::ServerReported`] otherwise
//! - **Raw and loose modes** - [`Client::net_data_request`], [`Client::net_default_request`]
//! - **Request manager hook** - one place to inject auth headers and observe failures
//! - **Cancellable dispatch** - [`Client::dispatch`] returns a [`RequestHandle`]
//! - **Automatic logging** - Structured logging with `tracing` for observability
//!
//! ## Error Handling
//!
//! ```no_run
//! use netspec::{Client, Error, RequestSpec};
//!
//! # async fn example() -> Result<(), Error> {
//! # let client = Client::builder().base_url("https://api.example.com")?.build()?;
//! match client.net_request::<serde_json::Value>(RequestSpec::get("me")).await {
//!     Ok(me) => println!("Hello {}", me["name"]),
//!     Err(Error::ServerReported { code, message }) => {
//!         eprintln!("Backend said no ({}): {}", code, message);
//!     }
//!     Err(Error::Transform(reason)) => {
//!         eprintln!("Unexpected response shape: {}", reason);
//!     }
//!     Err(e) => eprintln!("Other error: {}", e),
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Request Managers
//!
//! ```no_run
//! use netspec::{Client, ConcreteRequest, Error, RequestManager};
//! use http::HeaderValue;
//! use std::sync::Arc;
//!
//! struct Session {
//!     token: HeaderValue,
//! }
//!
//! impl RequestManager for Session {
//!     fn configure(&self, mut request: ConcreteRequest) -> ConcreteRequest {
//!         request.headers_mut().insert("authorization", self.token.clone());
//!         request
//!     }
//!
//!     fn error_handle(&self, _request: &ConcreteRequest, error: &Error) {
//!         if error.code() == Some(401) {
//!             eprintln!("session expired");
//!         }
//!     }
//! }
//!
//! # fn example() -> Result<(), Error> {
//! let session = Arc::new(Session { token: HeaderValue::from_static("Bearer abc") });
//! let client = Client::builder()
//!     .base_url("https://api.example.com")?
//!     .request_manager(Arc::<Session>::downgrade(&session))
//!     .build()?;
//! # Ok(())
//! # }
//! ```

mod assembler;
mod client;
mod dispatch;
mod endpoint;
pub mod envelope;
pub mod error;
mod manager;
mod query;
pub mod reachability;
mod single_key;
mod spec;
mod transport;

pub use assembler::{ConcreteRequest, RequestAssembler, DEFAULT_TIMEOUT};
pub use client::{Client, ClientBuilder};
pub use dispatch::RequestHandle;
pub use endpoint::ClientEndpoint;
pub use envelope::ResponseEnvelope;
pub use error::{Error, Result};
pub use manager::RequestManager;
pub use query::QueryValue;
pub use single_key::SingleKeyEntry;
pub use spec::{RequestSpec, ToRequestSpec, DEFAULT_VERSION};
pub use transport::{ReqwestTransport, Transport, TransportResponse};
