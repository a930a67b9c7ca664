//! Core stream types: identities, amounts, price quotes, stream parameters.
//!
//! Amounts are integers in the asset's smallest unit. Timestamps are Unix
//! seconds.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

use crate::constants::{BPS_PRECISION, MAX_DECIMALS};
use crate::error::{IdentityError, StreamError};

/// Token quantity in the asset's smallest unit.
pub type Amount = u128;

/// Unix timestamp in seconds.
pub type Timestamp = u64;

/// Decode an optionally `0x`-prefixed hex string into exactly `N` bytes.
fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], IdentityError> {
    let digits = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(digits).map_err(|e| IdentityError::InvalidHex(e.to_string()))?;
    let got = bytes.len();
    bytes
        .try_into()
        .map_err(|_| IdentityError::InvalidLength { expected: N, got })
}

/// A 20-byte account or asset identity.
///
/// Used for parties (creator, recipient, return address), assets, factories,
/// and deployed streamers. Displays as `0x`-prefixed lowercase hex.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Address(pub [u8; 20]);

impl Address {
    /// The zero address. Never a valid party or asset.
    pub const ZERO: Self = Self([0u8; 20]);

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Check if this is the zero address.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Address {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<20>(s).map(Self)
    }
}

impl From<[u8; 20]> for Address {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl Serialize for Address {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Address {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A 32-byte hash value.
///
/// Used for deployment salts, deployment keys, and parameter hashes (BLAKE3).
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Default,
    bincode::Encode, bincode::Decode,
)]
pub struct Hash256(pub [u8; 32]);

impl Hash256 {
    /// The zero hash (32 zero bytes). The conventional default salt.
    pub const ZERO: Self = Self([0u8; 32]);

    /// Return the underlying bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Check if this is the zero hash.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 32]
    }
}

impl fmt::Display for Hash256 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl FromStr for Hash256 {
    type Err = IdentityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        decode_fixed::<32>(s).map(Self)
    }
}

impl From<[u8; 32]> for Hash256 {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl From<blake3::Hash> for Hash256 {
    fn from(hash: blake3::Hash) -> Self {
        Self(*hash.as_bytes())
    }
}

impl AsRef<[u8]> for Hash256 {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl Serialize for Hash256 {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for Hash256 {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// A fixed-point price: `value / 10^decimals`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceQuote {
    /// Scaled price, strictly positive.
    pub value: u128,
    /// Number of decimal places in `value`.
    pub decimals: u8,
}

impl PriceQuote {
    pub fn new(value: u128, decimals: u8) -> Self {
        Self { value, decimals }
    }
}

impl fmt::Display for PriceQuote {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}e-{}", self.value, self.decimals)
    }
}

/// Construction parameters of a streamer. Immutable once the streamer exists.
#[derive(
    Clone, Debug, PartialEq, Eq, Serialize, Deserialize,
    bincode::Encode, bincode::Decode,
)]
pub struct StreamerParams {
    /// Asset actually held by the streamer and paid to the recipient.
    pub streaming_asset: Address,
    /// Unit of account the entitlement is denominated in.
    pub native_asset: Address,
    /// Receives the remaining balance on sweep.
    pub return_address: Address,
    /// Funder; the only party allowed to initialize and sweep.
    pub stream_creator: Address,
    /// The only party allowed to claim.
    pub recipient: Address,
    pub native_decimals: u8,
    pub streaming_decimals: u8,
    /// Total entitlement in native units.
    pub total_native_amount: Amount,
    /// Extra funding required at initialize, in basis points of the total.
    pub slippage_tolerance_bps: u64,
    pub claim_cooldown: u64,
    pub sweep_cooldown: u64,
    pub stream_duration: u64,
    /// `None` means the creator may sweep without prior notice.
    pub minimum_notice_period: Option<u64>,
}

impl StreamerParams {
    /// Check every field against its allowed range.
    pub fn validate(&self) -> Result<(), StreamError> {
        let parties = [
            (self.streaming_asset, "streaming_asset"),
            (self.native_asset, "native_asset"),
            (self.return_address, "return_address"),
            (self.stream_creator, "stream_creator"),
            (self.recipient, "recipient"),
        ];
        if let Some(&(_, name)) = parties.iter().find(|(addr, _)| addr.is_zero()) {
            return Err(StreamError::InvalidParameter(name));
        }
        if self.native_decimals > MAX_DECIMALS {
            return Err(StreamError::InvalidParameter("native_decimals"));
        }
        if self.streaming_decimals > MAX_DECIMALS {
            return Err(StreamError::InvalidParameter("streaming_decimals"));
        }
        if self.total_native_amount == 0 {
            return Err(StreamError::InvalidParameter("total_native_amount"));
        }
        if self.slippage_tolerance_bps > BPS_PRECISION {
            return Err(StreamError::InvalidParameter("slippage_tolerance_bps"));
        }
        if self.stream_duration == 0 {
            return Err(StreamError::InvalidParameter("stream_duration"));
        }
        if self
            .minimum_notice_period
            .is_some_and(|notice| notice > self.stream_duration)
        {
            return Err(StreamError::InvalidParameter("minimum_notice_period"));
        }
        Ok(())
    }
}

/// Logical stream state, derived from stored timestamps and amounts.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StreamStatus {
    /// Deployed, waiting for funding and `initialize`.
    Uninitialized,
    /// Vesting; the recipient may claim.
    Streaming,
    /// The full native total has been paid out.
    Completed,
    /// The creator moved the remaining balance back to the return address.
    Swept,
}

impl fmt::Display for StreamStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Uninitialized => "uninitialized",
            Self::Streaming => "streaming",
            Self::Completed => "completed",
            Self::Swept => "swept",
        };
        f.write_str(s)
    }
}
