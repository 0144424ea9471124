//! The pluggable framed IPC transport.
//!
//! The core only ever depends on two small traits: something it can push
//! `(tag, payload)` frames into ([`FrameSender`]), and something the
//! connection's inbound-delivery thread pulls frames out of
//! ([`FrameReceiver`]). Concrete transports (domain socket, named pipe,
//! shared-memory ring, or the length-prefixed TCP transport shipped in
//! `eep-proxy`) live outside this crate.

use crate::error::TransportIoError;

/// Sends framed `(tag, payload)` messages to the engine.
///
/// Implementations must be safe to call concurrently: `invoke`, `get_api`,
/// and `send_result` may all be called from different host threads while the
/// proxy's own dispatch thread is also alive.
pub trait FrameSender: Send + Sync {
    fn send_frame(&self, tag: u8, payload: Vec<u8>) -> Result<(), TransportIoError>;

    /// Closes the transport. Called once the connection is torn down; must
    /// be idempotent.
    fn close(&self);
}

/// Pulls the next framed `(tag, payload)` message from the engine.
///
/// Only ever called by the proxy's single inbound-dispatch thread: message
/// dispatch is sequential per connection.
pub trait FrameReceiver: Send {
    fn recv_frame(&mut self) -> Result<(u8, Vec<u8>), TransportIoError>;
}
