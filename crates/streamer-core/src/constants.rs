//! Protocol constants. Durations are in seconds, ratios in basis points.

/// Denominator for every basis-point ratio (`10_000` = 100%).
pub const BPS_PRECISION: u64 = 10_000;

/// Largest decimal precision accepted for an asset or a price feed.
///
/// Conversions combine up to two of these into one power of ten, and
/// `10^(2 · MAX_DECIMALS)` still fits in the 256-bit intermediate.
pub const MAX_DECIMALS: u8 = 36;

pub const SECONDS_PER_DAY: u64 = 86_400;
pub const SECONDS_PER_YEAR: u64 = 365 * SECONDS_PER_DAY;

/// Default wait between two claims by the recipient.
pub const DEFAULT_CLAIM_COOLDOWN: u64 = 7 * SECONDS_PER_DAY;

/// Default grace period after the stream ends before the creator may sweep,
/// and the minimum gap between two sweeps.
pub const DEFAULT_SWEEP_COOLDOWN: u64 = 10 * SECONDS_PER_DAY;

/// Domain separator for the deployment key derived from `(creator, salt[, params])`.
pub const DEPLOYMENT_KEY_DOMAIN: &[u8] = b"streamer/deployment-key/v1";

/// Domain separator for the hash of a full deployment parameter set.
pub const PARAMS_HASH_DOMAIN: &[u8] = b"streamer/params/v1";

/// Domain separator for deterministic streamer addresses.
pub const STREAMER_ADDRESS_DOMAIN: &[u8] = b"streamer/address/v1";
