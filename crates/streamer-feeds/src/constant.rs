//! Price feed returning a rate fixed at construction.

use streamer_core::error::FeedError;
use streamer_core::traits::PriceFeed;
use streamer_core::types::PriceQuote;

use crate::check_decimals;

/// A pegged price, e.g. `USDC / USD` treated as exactly 1.
#[derive(Debug, Clone)]
pub struct ConstantPriceFeed {
    quote: PriceQuote,
    label: String,
}

impl ConstantPriceFeed {
    /// Create a feed that always answers `rate / 10^decimals`.
    pub fn new(rate: u128, decimals: u8, label: impl Into<String>) -> Result<Self, FeedError> {
        check_decimals(decimals)?;
        if rate == 0 {
            return Err(FeedError::InvalidPrice);
        }
        Ok(Self {
            quote: PriceQuote::new(rate, decimals),
            label: label.into(),
        })
    }

    /// A 1:1 peg at the given precision.
    pub fn unit(decimals: u8, label: impl Into<String>) -> Result<Self, FeedError> {
        check_decimals(decimals)?;
        Self::new(10u128.pow(decimals as u32), decimals, label)
    }
}

impl PriceFeed for ConstantPriceFeed {
    fn price(&self) -> Result<PriceQuote, FeedError> {
        Ok(self.quote)
    }

    fn decimals(&self) -> u8 {
        self.quote.decimals
    }

    fn description(&self) -> &str {
        &self.label
    }
}
