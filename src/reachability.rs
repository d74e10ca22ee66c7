//! Network reachability.
//!
//! Reachability is process-wide knowledge the request pipeline only reads.
//! It is modelled as an explicitly constructed [`Reachability`] service that
//! is shared by `Arc`, creates its platform probe lazily on first use, and can
//! be shut down.

use std::sync::{Arc, PoisonError, RwLock};

/// The class of the current network connection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConnectionClass {
    /// No route to the network.
    NotReachable,
    /// Reachable over a cellular (WWAN) link.
    Cellular,
    /// Reachable over any other link, e.g. Wi-Fi or ethernet.
    Other,
}

/// Platform hook answering reachability queries.
pub trait ReachabilityProbe: Send + Sync {
    /// Returns the current connection class.
    fn connection_class(&self) -> ConnectionClass;
}

type ProbeFactory = Box<dyn Fn() -> Option<Arc<dyn ReachabilityProbe>> + Send + Sync>;

/// Lazily probed, read-only reachability service.
///
/// # Examples
///
/// ```
/// use netspec::reachability::{ConnectionClass, Reachability, ReachabilityProbe};
/// use std::sync::Arc;
///
/// struct AlwaysCellular;
///
/// impl ReachabilityProbe for AlwaysCellular {
///     fn connection_class(&self) -> ConnectionClass {
///         ConnectionClass::Cellular
///     }
/// }
///
/// let reachability =
///     Reachability::new(|| Some(Arc::new(AlwaysCellular) as Arc<dyn ReachabilityProbe>));
/// assert!(reachability.is_using_cellular());
/// ```
pub struct Reachability {
    factory: ProbeFactory,
    probe: RwLock<Option<Arc<dyn ReachabilityProbe>>>,
}

impl Reachability {
    /// Creates the service. `factory` is called on first query, and again on
    /// later queries for as long as it returns `None`.
    pub fn new<F>(factory: F) -> Self
    where
        F: Fn() -> Option<Arc<dyn ReachabilityProbe>> + Send + Sync + 'static,
    {
        Self {
            factory: Box::new(factory),
            probe: RwLock::new(None),
        }
    }

    /// The current connection class, or `None` if no probe is available.
    pub fn connection_class(&self) -> Option<ConnectionClass> {
        self.probe().map(|p| p.connection_class())
    }

    /// Returns `true` if the connection is cellular. Without a probe this is
    /// `false`.
    pub fn is_using_cellular(&self) -> bool {
        self.connection_class() == Some(ConnectionClass::Cellular)
    }

    /// Returns `true` if any route to the network exists.
    pub fn is_reachable(&self) -> bool {
        matches!(
            self.connection_class(),
            Some(ConnectionClass::Cellular | ConnectionClass::Other)
        )
    }

    /// Releases the probe. The next query creates a new one.
    pub fn shutdown(&self) {
        if self
            .probe
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .take()
            .is_some()
        {
            tracing::debug!("Reachability probe released");
        }
    }

    fn probe(&self) -> Option<Arc<dyn ReachabilityProbe>> {
        if let Some(probe) = self
            .probe
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .as_ref()
        {
            return Some(Arc::clone(probe));
        }

        let mut slot = self.probe.write().unwrap_or_else(PoisonError::into_inner);
        if slot.is_none() {
            *slot = (self.factory)();
            if slot.is_none() {
                tracing::warn!("Reachability probe unavailable");
            } else {
                tracing::debug!("Reachability probe created");
            }
        }
        slot.clone()
    }
}

impl std::fmt::Debug for Reachability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Reachability")
            .field(
                "probe_created",
                &self
                    .probe
                    .read()
                    .unwrap_or_else(PoisonError::into_inner)
                    .is_some(),
            )
            .finish()
    }
}
