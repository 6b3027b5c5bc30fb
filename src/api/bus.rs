//! Purpose: Capability traits the accessor needs from a message bus.
//! Exports: `Bus`, `ModelProxy`.
//! Role: Seam between snapshot decoding and any concrete transport.
//! Invariants: Binding a proxy performs no remote I/O.
//! Invariants: Proxy failures surface as `ErrorKind::Transport`.

use crate::core::error::Error;
use crate::core::wire::RawSnapshot;
use async_trait::async_trait;
use std::sync::Arc;

/// A connected bus able to hand out proxies for remote model objects.
///
/// Implementations may talk to D-Bus, an in-process registry, or a test
/// harness. Connection setup and authentication happen before a `Bus` exists.
pub trait Bus: Send + Sync {
    fn bind_model(
        &self,
        service: &str,
        object_path: &str,
        interface: &str,
    ) -> Result<Arc<dyn ModelProxy>, Error>;
}

/// A bound remote model object.
#[async_trait]
pub trait ModelProxy: Send + Sync + 'static {
    /// Invokes the remote `Clone` method and returns the full snapshot.
    async fn clone_model(&self) -> Result<RawSnapshot, Error>;
}

impl<B: Bus + ?Sized> Bus for Arc<B> {
    fn bind_model(
        &self,
        service: &str,
        object_path: &str,
        interface: &str,
    ) -> Result<Arc<dyn ModelProxy>, Error> {
        (**self).bind_model(service, object_path, interface)
    }
}
