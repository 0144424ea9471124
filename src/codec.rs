//! Message codec adapter: a thin layer that turns a payload struct into
//! bytes for the framed transport and back.
//!
//! The dispatcher never serializes to a specific format directly; it goes
//! through [`MessageCodec`] so the wire format can be swapped without
//! touching dispatch logic. [`RmpCodec`] is the one shipped implementation,
//! backed by MessagePack via `rmp-serde`.

use crate::error::DispatchError;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Encodes and decodes message payloads for one wire format.
pub trait MessageCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, DispatchError>;
    fn decode<T: DeserializeOwned>(&self, tag: u8, bytes: &[u8]) -> Result<T, DispatchError>;
}

/// MessagePack codec, the wire format this crate ships by default.
#[derive(Debug, Default, Clone, Copy)]
pub struct RmpCodec;

impl MessageCodec for RmpCodec {
    fn encode<T: Serialize>(&self, value: &T) -> Result<Vec<u8>, DispatchError> {
        rmp_serde::to_vec_named(value)
            .map_err(|e| DispatchError::TransportError(format!("encode failed: {e}")))
    }

    fn decode<T: DeserializeOwned>(&self, tag: u8, bytes: &[u8]) -> Result<T, DispatchError> {
        rmp_serde::from_slice(bytes).map_err(|_| DispatchError::MalformedMessage(tag))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::{HexBigInt, ResultPayload};

    #[test]
    fn nil_result_round_trips() {
        let codec = RmpCodec;
        let payload = ResultPayload {
            status: 0,
            step_used: HexBigInt::from_u128(42),
            result: None,
        };
        let bytes = codec.encode(&payload).unwrap();
        let decoded: ResultPayload = codec.decode(2, &bytes).unwrap();
        assert_eq!(decoded.result, None);
        assert_eq!(decoded.step_used, payload.step_used);
    }

    #[test]
    fn result_with_value_round_trips() {
        let codec = RmpCodec;
        let payload = ResultPayload {
            status: 0,
            step_used: HexBigInt::from_u128(5),
            result: Some(serde_json::json!({"ok": true})),
        };
        let bytes = codec.encode(&payload).unwrap();
        let decoded: ResultPayload = codec.decode(2, &bytes).unwrap();
        assert_eq!(decoded.result, payload.result);
    }

    #[test]
    fn malformed_payload_reports_tag() {
        let codec = RmpCodec;
        let err = codec.decode::<ResultPayload>(2, &[0xff, 0xff, 0xff]).unwrap_err();
        match err {
            DispatchError::MalformedMessage(tag) => assert_eq!(tag, 2),
            other => panic!("expected MalformedMessage, got {other:?}"),
        }
    }
}
