//! Error kinds produced by the proxy.
//!
//! Every variant here is fatal to the connection: there is no retry policy
//! inside a single proxy. A `PoolManager` or `HostContext` implementation may
//! still recover at a higher level (respawn the engine, surface the failure
//! to an operator), but the `ProxyEndpoint` itself always closes.

use thiserror::Error;

/// Errors that can arise while dispatching messages on one proxy connection.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// A send or transport-level close failed.
    #[error("transport error: {0}")]
    TransportError(String),

    /// A payload for the given tag could not be decoded.
    #[error("malformed message (tag {0})")]
    MalformedMessage(u8),

    /// The tag is not one of the nine known message kinds.
    #[error("unknown message tag {0}")]
    UnknownMessage(u8),

    /// `VERSION.type` was not one of the closed set of engine kinds.
    #[error("unknown engine kind: {0}")]
    UnknownEngineKind(String),

    /// A host callback (`get_value`, `set_value`, ...) returned an error.
    #[error("host context error: {0}")]
    HostContextError(String),

    /// An intermediate or terminal message arrived in a state that
    /// contradicts the frame-stack invariants (e.g. empty stack, or a
    /// duplicate terminal message for a frame already popped).
    #[error("protocol violation: {0}")]
    ProtocolViolation(String),
}

/// Error returned by a [`crate::transport::FrameSender`] or
/// [`crate::transport::FrameReceiver`] implementation.
#[derive(Debug, Error)]
#[error("transport io error: {0}")]
pub struct TransportIoError(pub String);

impl From<TransportIoError> for DispatchError {
    fn from(e: TransportIoError) -> Self {
        DispatchError::TransportError(e.0)
    }
}

/// Error returned by a [`crate::pool::PoolManager`] implementation.
#[derive(Debug, Error)]
#[error("pool manager error: {0}")]
pub struct PoolError(pub String);

/// Error returned by a [`crate::host::HostContext`] implementation.
#[derive(Debug, Error)]
#[error("{0}")]
pub struct HostError(pub String);
