//! The nine-message wire taxonomy and the payload each tag carries.
//!
//! Addresses and big integers both travel as hex text on the wire;
//! [`Address`] and [`HexBigInt`] give that text a typed home instead of
//! passing bare `String`s around the dispatcher.

use serde::{Deserialize, Serialize};

/// One of the nine wire tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MessageTag {
    Version = 0,
    Invoke = 1,
    Result = 2,
    GetValue = 3,
    SetValue = 4,
    Call = 5,
    Event = 6,
    GetInfo = 7,
    GetBalance = 8,
    GetApi = 9,
}

impl MessageTag {
    pub fn from_u8(tag: u8) -> Option<Self> {
        Some(match tag {
            0 => Self::Version,
            1 => Self::Invoke,
            2 => Self::Result,
            3 => Self::GetValue,
            4 => Self::SetValue,
            5 => Self::Call,
            6 => Self::Event,
            7 => Self::GetInfo,
            8 => Self::GetBalance,
            9 => Self::GetApi,
            _ => return None,
        })
    }
}

/// A contract/account address, carried as hex on the wire.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(pub String);

impl Address {
    pub fn new(hex: impl Into<String>) -> Self {
        Self(hex.into())
    }
}

impl std::fmt::Display for Address {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A big integer, carried as a hex-encoded string.
///
/// No arithmetic is implemented here: the core dispatcher only ever routes
/// these values between the engine and the host, it never computes with
/// them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HexBigInt(pub String);

impl HexBigInt {
    pub fn from_u128(value: u128) -> Self {
        Self(format!("{value:x}"))
    }

    pub fn to_u128(&self) -> Option<u128> {
        u128::from_str_radix(self.0.trim_start_matches("0x"), 16).ok()
    }
}

/// `VERSION` payload (engine → host).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionPayload {
    pub version: u16,
    pub uid: String,
    #[serde(rename = "type")]
    pub engine_type: String,
}

/// `INVOKE` payload (host → engine): the invocation descriptor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvokePayload {
    pub code: String,
    pub is_query: bool,
    pub from: Address,
    pub to: Address,
    pub value: HexBigInt,
    pub limit: HexBigInt,
    pub method: String,
    pub params: serde_json::Value,
}

/// `RESULT` payload (both directions).
///
/// `result` is `None` when the host supplied no value; the codec still
/// writes an explicit nil marker rather than omitting the field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResultPayload {
    pub status: u16,
    pub step_used: HexBigInt,
    #[serde(default)]
    pub result: Option<serde_json::Value>,
}

/// `GETVALUE` request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetValueRequest {
    #[serde(with = "hex_bytes")]
    pub key: Vec<u8>,
}

/// `GETVALUE` response payload. `success` is `false` iff the key was absent.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetValueResponse {
    pub success: bool,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

/// `SETVALUE` payload (engine → host).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SetValuePayload {
    #[serde(with = "hex_bytes")]
    pub key: Vec<u8>,
    pub is_delete: bool,
    #[serde(with = "hex_bytes")]
    pub value: Vec<u8>,
}

/// `CALL` payload (engine → host): a sub-call descriptor.
///
/// `from` is not carried on the wire: the dispatcher derives it from the
/// address of the frame currently on top of the stack.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallPayload {
    pub to: Address,
    pub value: HexBigInt,
    pub limit: HexBigInt,
    pub method: String,
    pub params: serde_json::Value,
}

/// `EVENT` payload (engine → host).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventPayload {
    #[serde(with = "hex_bytes_vec")]
    pub indexed: Vec<Vec<u8>>,
    #[serde(with = "hex_bytes_vec")]
    pub data: Vec<Vec<u8>>,
}

/// `GETBALANCE` request payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBalanceRequest {
    pub address: Address,
}

/// `GETBALANCE` response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetBalanceResponse {
    pub balance: HexBigInt,
}

/// `GETAPI` request payload (host → engine).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetApiRequest {
    pub code: String,
}

/// `GETAPI` response payload (engine → host).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GetApiResponse {
    pub status: u16,
    pub info: serde_json::Value,
}

mod hex_bytes {
    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(bytes: &[u8], s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&hex::encode(bytes))
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<u8>, D::Error> {
        let s = String::deserialize(d)?;
        hex::decode(&s).map_err(serde::de::Error::custom)
    }
}

mod hex_bytes_vec {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    pub fn serialize<S: Serializer>(items: &[Vec<u8>], s: S) -> Result<S::Ok, S::Error> {
        let hexes: Vec<String> = items.iter().map(|b| hex::encode(b)).collect();
        hexes.serialize(s)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<Vec<u8>>, D::Error> {
        let hexes = Vec::<String>::deserialize(d)?;
        hexes
            .into_iter()
            .map(|s| hex::decode(&s).map_err(serde::de::Error::custom))
            .collect()
    }
}
