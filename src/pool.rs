//! The pool manager interface, external and consumed by the core. The core
//! only ever calls [`PoolManager::on_ready`] and [`PoolManager::kill`];
//! everything else (matching idle proxies to host requests, engine respawn
//! policy, per-kind idle sets) lives in the embedding application.

use crate::error::PoolError;
use crate::proxy::ProxyEndpoint;
use std::sync::Arc;

/// The closed set of engine flavors selected by the `VERSION` handshake.
/// An embedder targeting a different set of engines extends this enum, it
/// does not make it open-ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineKind {
    Python,
    Java,
    Rust,
}

impl std::str::FromStr for EngineKind {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "python" => Ok(Self::Python),
            "java" => Ok(Self::Java),
            "rust" => Ok(Self::Rust),
            _ => Err(()),
        }
    }
}

impl std::fmt::Display for EngineKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Python => "python",
            Self::Java => "java",
            Self::Rust => "rust",
        };
        write!(f, "{s}")
    }
}

/// External collaborator that matches idle proxies to host requests and
/// tracks engines by `uid`.
///
/// A doubly-linked intrusive pointer pair (`next`/`pprev`) in the proxy
/// record is one way to get O(1) removal from a per-kind idle set; this
/// crate's reference implementation (`eep-proxy`) instead keeps a plain
/// `HashMap<EngineKind, Vec<Uid>>`, which is simpler at the scale a demo
/// binary runs at.
pub trait PoolManager: Send + Sync {
    /// Announces that `proxy` has become idle-and-unreserved for engines of
    /// `kind`. Called at exactly the moments that cross into "idle".
    fn on_ready(&self, kind: EngineKind, proxy: Arc<ProxyEndpoint>) -> Result<(), PoolError>;

    /// Requests that the engine identified by `uid` be terminated.
    fn kill(&self, uid: &str) -> Result<(), PoolError>;
}
