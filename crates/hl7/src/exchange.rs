use async_trait::async_trait;

use crate::application::Hl7Application;
use crate::error::TransportError;

/// Request/response transport to a remote HL7 application.
///
/// ## Connection Lifecycle
///
/// 1. `connect(local, remote)` -- pick a compatible connection pair and open a session
/// 2. `send` one framed request, then `receive` one framed response
/// 3. `close(connection)` -- release the session, consuming the connection
///
/// Callers close every connection they opened exactly once, whether the
/// exchange succeeded or not. Timeouts are enforced by the implementation and
/// reported as [`TransportError::Timeout`].
#[async_trait]
pub trait IdentityExchange: Send + Sync {
    /// An open session to one peer.
    type Connection: Send;

    async fn connect(
        &self,
        local: &Hl7Application,
        remote: &Hl7Application,
    ) -> Result<Self::Connection, TransportError>;

    /// Write one complete message.
    async fn send(
        &self,
        connection: &mut Self::Connection,
        message: &[u8],
    ) -> Result<(), TransportError>;

    /// Block until one complete message has been read.
    async fn receive(&self, connection: &mut Self::Connection) -> Result<Vec<u8>, TransportError>;

    async fn close(&self, connection: Self::Connection);
}
