//! Price feed dividing A/C by B/C into A/B.

use std::fmt;
use std::sync::Arc;

use streamer_core::error::FeedError;
use streamer_core::math::{mul_div_pow10, net_exponent};
use streamer_core::traits::PriceFeed;
use streamer_core::types::PriceQuote;
use tracing::debug;

use crate::{check_decimals, query_leg};

/// Synthetic A/B price from two feeds quoted against the same reference C.
///
/// This is how a pair of per-asset USD oracles becomes the single
/// streaming/native price a streamer consumes.
pub struct RatioPriceFeed {
    feed_a_c: Arc<dyn PriceFeed>,
    feed_b_c: Arc<dyn PriceFeed>,
    decimals: u8,
    label: String,
}

impl fmt::Debug for RatioPriceFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RatioPriceFeed")
            .field("feed_a_c", &self.feed_a_c.description())
            .field("feed_b_c", &self.feed_b_c.description())
            .field("decimals", &self.decimals)
            .field("label", &self.label)
            .finish()
    }
}

impl RatioPriceFeed {
    pub fn new(
        feed_a_c: Arc<dyn PriceFeed>,
        feed_b_c: Arc<dyn PriceFeed>,
        decimals: u8,
        label: impl Into<String>,
    ) -> Result<Self, FeedError> {
        check_decimals(decimals)?;
        Ok(Self {
            feed_a_c,
            feed_b_c,
            decimals,
            label: label.into(),
        })
    }
}

impl PriceFeed for RatioPriceFeed {
    fn price(&self) -> Result<PriceQuote, FeedError> {
        let a = query_leg(&self.label, self.feed_a_c.as_ref())?;
        let b = query_leg(&self.label, self.feed_b_c.as_ref())?;

        // (a / 10^da) / (b / 10^db) · 10^out, floored once.
        let exponent = net_exponent(&[self.decimals, b.decimals], &[a.decimals]);
        let value =
            mul_div_pow10(&[a.value], &[b.value], exponent).ok_or(FeedError::ArithmeticOverflow)?;
        if value == 0 {
            return Err(FeedError::InvalidPrice);
        }
        debug!(feed = %self.label, %a, %b, value, decimals = self.decimals, "ratio price");
        Ok(PriceQuote::new(value, self.decimals))
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn description(&self) -> &str {
        &self.label
    }
}
