//! Shared primitive types
//!
//! Identities, assets and the per-call execution context handed to every
//! state-changing operation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Amount of an asset, in its smallest unit
pub type Amount = u128;

/// Seconds since the Unix epoch
pub type Timestamp = u64;

/// Identifier of a transaction request, unique per vault
pub type RequestId = u64;

/// An account identity (externally owned or derived contract address)
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Address(String);

impl Address {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True for `0x`-prefixed addresses produced by [`crate::crypto::derive_address`]
    pub fn is_derived(&self) -> bool {
        self.0.len() == 42
            && self.0.starts_with("0x")
            && self.0[2..].chars().all(|c| c.is_ascii_hexdigit())
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Address {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for Address {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl AsRef<str> for Address {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

/// The asset a transfer moves
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Asset {
    /// The host ledger's native currency
    Native,
    /// A fungible token identified by its contract address
    Token(Address),
}

impl Asset {
    /// Map an optional token address to an asset (`None` is native currency)
    pub fn from_token(token: Option<Address>) -> Self {
        match token {
            Some(address) => Asset::Token(address),
            None => Asset::Native,
        }
    }
}

impl fmt::Display for Asset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Asset::Native => f.write_str("native"),
            Asset::Token(address) => write!(f, "token:{}", address),
        }
    }
}

/// Who is calling and when
///
/// The host fills this in for every call; operations never consult a clock
/// on their own.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CallContext {
    /// Identity invoking the operation
    pub caller: Address,
    /// Host time at which the call is evaluated
    pub timestamp: Timestamp,
}

impl CallContext {
    pub fn new(caller: impl Into<Address>, timestamp: Timestamp) -> Self {
        Self {
            caller: caller.into(),
            timestamp,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_display_and_serde() {
        let address = Address::from("alice");
        assert_eq!(address.to_string(), "alice");

        let json = serde_json::to_string(&address).unwrap();
        assert_eq!(json, "\"alice\"");
        let back: Address = serde_json::from_str(&json).unwrap();
        assert_eq!(back, address);
    }

    #[test]
    fn test_is_derived() {
        assert!(Address::from("0x00112233445566778899aabbccddeeff00112233").is_derived());
        assert!(!Address::from("0x1234").is_derived());
        assert!(!Address::from("alice").is_derived());
    }

    #[test]
    fn test_asset_from_token() {
        assert_eq!(Asset::from_token(None), Asset::Native);
        let token = Address::from("0xabc");
        assert_eq!(
            Asset::from_token(Some(token.clone())),
            Asset::Token(token.clone())
        );
        assert_eq!(Asset::Native.to_string(), "native");
    }
}
