use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use starknet::core::{types::Felt, utils::cairo_short_string_to_felt};

use crate::errors::HashError;

/// A concrete value laid out like a declared type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypedValue {
    Felt(Felt),
    Struct(IndexMap<String, TypedValue>),
    Array(Vec<TypedValue>),
}

impl TypedValue {
    /// Builds a struct value, keeping the fields in the given order.
    ///
    /// # Arguments
    ///
    /// * `fields` - `(name, value)` pairs.
    pub fn structure<I, K>(fields: I) -> Self
    where
        I: IntoIterator<Item = (K, Self)>,
        K: Into<String>,
    {
        Self::Struct(fields.into_iter().map(|(k, v)| (k.into(), v)).collect())
    }

    /// Builds a value out of a JSON document, encoding scalars with
    /// [`felt_from_json`].
    pub fn from_json(value: &Value) -> Result<Self, HashError> {
        match value {
            Value::Object(map) => map
                .iter()
                .map(|(name, value)| Ok((name.clone(), Self::from_json(value)?)))
                .collect::<Result<IndexMap<_, _>, HashError>>()
                .map(Self::Struct),
            Value::Array(items) => items
                .iter()
                .map(Self::from_json)
                .collect::<Result<Vec<_>, _>>()
                .map(Self::Array),
            scalar => felt_from_json(scalar).map(Self::Felt),
        }
    }

    /// The element held by a `Felt` value.
    pub fn as_felt(&self) -> Option<Felt> {
        match self {
            Self::Felt(felt) => Some(*felt),
            _ => None,
        }
    }

    pub(crate) fn kind(&self) -> &'static str {
        match self {
            Self::Felt(_) => "a felt",
            Self::Struct(_) => "a struct",
            Self::Array(_) => "an array",
        }
    }
}

impl From<Felt> for TypedValue {
    fn from(felt: Felt) -> Self {
        Self::Felt(felt)
    }
}

impl From<Uint256> for TypedValue {
    fn from(value: Uint256) -> Self {
        Self::structure([("low", value.low.into()), ("high", value.high.into())])
    }
}

/// A 256-bit unsigned integer split in two 128-bit felts, the way it is
/// declared by the `u256` type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Uint256 {
    pub low: Felt,
    pub high: Felt,
}

impl Uint256 {
    pub fn from_words(low: u128, high: u128) -> Self {
        Self {
            low: Felt::from(low),
            high: Felt::from(high),
        }
    }
}

impl From<u128> for Uint256 {
    fn from(value: u128) -> Self {
        Self::from_words(value, 0)
    }
}

impl From<Felt> for Uint256 {
    fn from(value: Felt) -> Self {
        let bytes = value.to_bytes_be();
        let mut high = [0u8; 16];
        let mut low = [0u8; 16];
        high.copy_from_slice(&bytes[..16]);
        low.copy_from_slice(&bytes[16..]);
        Self::from_words(u128::from_be_bytes(low), u128::from_be_bytes(high))
    }
}

/// Encodes a string the way wallets do: `0x` prefixed hex, plain decimal,
/// otherwise a Cairo short string.
pub fn felt_from_str(value: &str) -> Result<Felt, HashError> {
    let invalid = || HashError::InvalidValue(value.to_string());
    if value.is_empty() {
        Ok(Felt::ZERO)
    } else if let Some(hex) = value
        .strip_prefix("0x")
        .or_else(|| value.strip_prefix("0X"))
    {
        Felt::from_hex(&hex.to_ascii_lowercase()).map_err(|_| invalid())
    } else if value.chars().all(|c| c.is_ascii_digit()) {
        Felt::from_dec_str(value).map_err(|_| invalid())
    } else {
        cairo_short_string_to_felt(value).map_err(|_| invalid())
    }
}

pub fn felt_from_json(value: &Value) -> Result<Felt, HashError> {
    match value {
        Value::Number(n) => {
            Felt::from_dec_str(&n.to_string()).map_err(|_| HashError::InvalidValue(n.to_string()))
        }
        Value::String(s) => felt_from_str(s),
        Value::Bool(b) => Ok(if *b { Felt::ONE } else { Felt::ZERO }),
        other => Err(HashError::InvalidValue(other.to_string())),
    }
}
