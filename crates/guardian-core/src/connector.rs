//! Router login handshake.

use async_trait::async_trait;

use crate::credentials::Credentials;
use crate::error::LinkError;

/// Performs the login round trip against a router.
///
/// Implementations only talk to the router; validation of the credential
/// triple and all state bookkeeping belong to the connection manager.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Open (or verify) a session with the router.
    async fn connect(&self, credentials: &Credentials) -> Result<(), LinkError>;
}
