//! Execution-Engine Proxy (EEP): the per-connection proxy state machine and
//! message dispatcher that lets a host blockchain service invoke smart
//! contracts running in separate sandboxed engine processes.
//!
//! This crate is the core: nested call-frame tracking, the nine-message wire
//! taxonomy, reentrant callback handling while an outer invocation is in
//! flight, and the reservation/readiness protocol a pool manager uses to
//! hand engines out and reclaim them. The concrete IPC transport and the
//! pool manager's scheduling policy are external collaborators behind the
//! [`transport`] and [`pool`] traits.

pub mod codec;
pub mod error;
pub mod frame;
pub mod host;
pub mod message;
pub mod pool;
pub mod proxy;
pub mod transport;

pub use error::{DispatchError, HostError, PoolError, TransportIoError};
pub use frame::{Frame, FrameStack};
pub use host::HostContext;
pub use message::{Address, HexBigInt, MessageTag};
pub use pool::{EngineKind, PoolManager};
pub use proxy::ProxyEndpoint;
pub use transport::{FrameReceiver, FrameSender};
