//! The host context interface, external and consumed by the core. A host
//! application implements [`HostContext`] once per invocation and hands the
//! dispatcher a `ctx` when it calls `invoke`/`get_api`; the dispatcher calls
//! back into it as the engine drives intermediate and terminal messages.
//!
//! Terminal callbacks (`on_result`, `on_api`) fire exactly once per matching
//! frame; intermediate callbacks may fire any number of times before the
//! terminal one.

use crate::error::HostError;
use crate::message::{Address, HexBigInt};
use serde_json::Value;

/// Per-invocation callback target. Implemented by the host application, not
/// by this crate.
pub trait HostContext: Send + Sync {
    /// Reads a key from host-owned state. `Ok(None)` means the key is
    /// absent, matching the `GETVALUE` response's `success` flag.
    fn get_value(&self, key: &[u8]) -> Result<Option<Vec<u8>>, HostError>;

    /// Writes a key to host-owned state.
    fn set_value(&self, key: &[u8], value: &[u8]) -> Result<(), HostError>;

    /// Deletes a key from host-owned state.
    fn delete_value(&self, key: &[u8]) -> Result<(), HostError>;

    /// Returns an opaque, host-defined informational value (`GETINFO`).
    fn get_info(&self) -> Result<Value, HostError>;

    /// Returns an address's balance (`GETBALANCE`).
    fn get_balance(&self, addr: &Address) -> Result<HexBigInt, HostError>;

    /// An `EVENT` was emitted by the contract at `addr`.
    fn on_event(&self, addr: Option<Address>, indexed: Vec<Vec<u8>>, data: Vec<Vec<u8>>);

    /// Terminal callback for an `invoke`: the matching `RESULT` arrived.
    /// Invoked exactly once per frame.
    fn on_result(&self, status: u16, step_used: HexBigInt, result: Option<Value>);

    /// The engine issued a `CALL` sub-invocation. The host is expected to
    /// eventually answer it, either by a nested `invoke` on the same proxy
    /// or by `send_result`.
    fn on_call(
        &self,
        from: Option<Address>,
        to: Address,
        value: HexBigInt,
        limit: HexBigInt,
        method: String,
        params: Value,
    );

    /// Terminal callback for a `get_api`: the matching `GETAPI` response
    /// arrived. Invoked exactly once per frame.
    fn on_api(&self, status: u16, info: Value);
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    /// A `HostContext` that answers every call with an empty/absent value
    /// and ignores every callback. Used only to exercise the frame stack in
    /// isolation from dispatch behavior.
    pub struct NullContext;

    impl HostContext for NullContext {
        fn get_value(&self, _key: &[u8]) -> Result<Option<Vec<u8>>, HostError> {
            Ok(None)
        }
        fn set_value(&self, _key: &[u8], _value: &[u8]) -> Result<(), HostError> {
            Ok(())
        }
        fn delete_value(&self, _key: &[u8]) -> Result<(), HostError> {
            Ok(())
        }
        fn get_info(&self) -> Result<Value, HostError> {
            Ok(Value::Null)
        }
        fn get_balance(&self, _addr: &Address) -> Result<HexBigInt, HostError> {
            Ok(HexBigInt::from_u128(0))
        }
        fn on_event(&self, _addr: Option<Address>, _indexed: Vec<Vec<u8>>, _data: Vec<Vec<u8>>) {}
        fn on_result(&self, _status: u16, _step_used: HexBigInt, _result: Option<Value>) {}
        fn on_call(
            &self,
            _from: Option<Address>,
            _to: Address,
            _value: HexBigInt,
            _limit: HexBigInt,
            _method: String,
            _params: Value,
        ) {
        }
        fn on_api(&self, _status: u16, _info: Value) {}
    }
}
