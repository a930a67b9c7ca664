//! # streamer-feeds — Price feed implementations.
//!
//! All calculations use integer arithmetic only.
//!
//! - **Constant**: a pegged rate fixed at construction.
//! - **Multiplicative**: A/C synthesised from A/B and B/C, for pairs that lack
//!   a direct oracle but share an intermediate asset.
//! - **Ratio**: A/B synthesised from A/C and B/C, for two assets each quoted
//!   against the same reference (usually USD).
//! - **Manual**: an externally updated feed standing in for an oracle.

pub mod constant;
pub mod manual;
pub mod multiplicative;
pub mod ratio;

pub use constant::ConstantPriceFeed;
pub use manual::ManualPriceFeed;
pub use multiplicative::MultiplicativePriceFeed;
pub use ratio::RatioPriceFeed;

use streamer_core::constants::MAX_DECIMALS;
use streamer_core::error::FeedError;
use streamer_core::traits::PriceFeed;
use streamer_core::types::PriceQuote;

pub(crate) fn check_decimals(decimals: u8) -> Result<(), FeedError> {
    if decimals > MAX_DECIMALS {
        return Err(FeedError::InvalidDecimals(decimals));
    }
    Ok(())
}

/// Query one leg of a composite feed, reporting any failure as the composite
/// being unavailable.
pub(crate) fn query_leg(composite: &str, leg: &dyn PriceFeed) -> Result<PriceQuote, FeedError> {
    let quote = leg.price().map_err(|e| FeedError::Unavailable {
        feed: composite.to_string(),
        reason: format!("leg '{}': {e}", leg.description()),
    })?;
    if quote.value == 0 || quote.decimals > MAX_DECIMALS {
        return Err(FeedError::Unavailable {
            feed: composite.to_string(),
            reason: format!("leg '{}' returned {quote}", leg.description()),
        });
    }
    Ok(quote)
}
