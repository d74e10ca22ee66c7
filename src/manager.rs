//! Pluggable request mutation and failure reporting.

use crate::{assembler::ConcreteRequest, Error};
use std::sync::{Arc, PoisonError, RwLock, Weak};

/// A hook that sees every request a client sends and every failure it
/// surfaces.
///
/// Clients hold their manager weakly: dropping the last `Arc` detaches it, and
/// requests then go out unmodified with failures unreported.
///
/// # Examples
///
/// ```
/// use netspec::{ConcreteRequest, Error, RequestManager};
/// use http::HeaderValue;
///
/// struct BearerAuth {
///     token: HeaderValue,
/// }
///
/// impl RequestManager for BearerAuth {
///     fn configure(&self, mut request: ConcreteRequest) -> ConcreteRequest {
///         request
///             .headers_mut()
///             .insert(http::header::AUTHORIZATION, self.token.clone());
///         request
///     }
///
///     fn error_handle(&self, request: &ConcreteRequest, error: &Error) {
///         eprintln!("{} {} failed: {}", request.method(), request.url(), error);
///     }
/// }
/// ```
pub trait RequestManager: Send + Sync {
    /// Finalizes an outgoing request.
    ///
    /// Called once per request after every other field is set. Must not have
    /// side effects beyond the returned request.
    fn configure(&self, request: ConcreteRequest) -> ConcreteRequest {
        request
    }

    /// Observes a failed request.
    ///
    /// Called once per failure, before the error reaches the caller. Must not
    /// panic or block.
    fn error_handle(&self, request: &ConcreteRequest, error: &Error) {
        let _ = (request, error);
    }
}

/// Non-owning, replaceable reference to a [`RequestManager`].
#[derive(Default)]
pub(crate) struct ManagerSlot {
    inner: RwLock<Option<Weak<dyn RequestManager>>>,
}

impl ManagerSlot {
    pub(crate) fn set(&self, manager: Weak<dyn RequestManager>) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = Some(manager);
    }

    pub(crate) fn clear(&self) {
        *self.inner.write().unwrap_or_else(PoisonError::into_inner) = None;
    }

    /// Returns the manager if it is attached and still alive.
    pub(crate) fn get(&self) -> Option<Arc<dyn RequestManager>> {
        self.inner
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
            .and_then(Weak::upgrade)
    }
}

impl std::fmt::Debug for ManagerSlot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ManagerSlot")
            .field("attached", &self.get().is_some())
            .finish()
    }
}
