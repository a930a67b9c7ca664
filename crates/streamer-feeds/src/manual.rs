//! Externally updated price feed.

use parking_lot::RwLock;
use streamer_core::error::FeedError;
use streamer_core::traits::PriceFeed;
use streamer_core::types::PriceQuote;
use tracing::debug;

use crate::check_decimals;

#[derive(Debug)]
struct ManualState {
    value: u128,
    available: bool,
}

/// A feed whose answer is pushed in from outside, like an oracle aggregator
/// round. Can be switched off to model an oracle outage.
#[derive(Debug)]
pub struct ManualPriceFeed {
    state: RwLock<ManualState>,
    decimals: u8,
    label: String,
}

impl ManualPriceFeed {
    pub fn new(value: u128, decimals: u8, label: impl Into<String>) -> Result<Self, FeedError> {
        check_decimals(decimals)?;
        if value == 0 {
            return Err(FeedError::InvalidPrice);
        }
        Ok(Self {
            state: RwLock::new(ManualState {
                value,
                available: true,
            }),
            decimals,
            label: label.into(),
        })
    }

    /// Publish a new price. Zero is rejected and the previous price kept.
    pub fn set_price(&self, value: u128) -> Result<(), FeedError> {
        if value == 0 {
            return Err(FeedError::InvalidPrice);
        }
        self.state.write().value = value;
        debug!(feed = %self.label, value, "manual price updated");
        Ok(())
    }

    pub fn set_available(&self, available: bool) {
        self.state.write().available = available;
    }
}

impl PriceFeed for ManualPriceFeed {
    fn price(&self) -> Result<PriceQuote, FeedError> {
        let state = self.state.read();
        if !state.available {
            return Err(FeedError::Unavailable {
                feed: self.label.clone(),
                reason: "no answer".into(),
            });
        }
        Ok(PriceQuote::new(state.value, self.decimals))
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn description(&self) -> &str {
        &self.label
    }
}
