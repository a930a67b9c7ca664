//! Price feed composing A/B and B/C into A/C.

use std::fmt;
use std::sync::Arc;

use streamer_core::error::FeedError;
use streamer_core::math::{mul_div_pow10, net_exponent};
use streamer_core::traits::PriceFeed;
use streamer_core::types::PriceQuote;
use tracing::debug;

use crate::{check_decimals, query_leg};

/// Synthetic A/C price from an A/B feed and a B/C feed.
///
/// The leg precisions and the output precision cancel into one power of ten
/// and the product is floored to `decimals`. Each call queries both legs; if
/// either fails the whole price is unavailable.
pub struct MultiplicativePriceFeed {
    feed_a_b: Arc<dyn PriceFeed>,
    feed_b_c: Arc<dyn PriceFeed>,
    decimals: u8,
    label: String,
}

impl fmt::Debug for MultiplicativePriceFeed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MultiplicativePriceFeed")
            .field("feed_a_b", &self.feed_a_b.description())
            .field("feed_b_c", &self.feed_b_c.description())
            .field("decimals", &self.decimals)
            .field("label", &self.label)
            .finish()
    }
}

impl MultiplicativePriceFeed {
    pub fn new(
        feed_a_b: Arc<dyn PriceFeed>,
        feed_b_c: Arc<dyn PriceFeed>,
        decimals: u8,
        label: impl Into<String>,
    ) -> Result<Self, FeedError> {
        check_decimals(decimals)?;
        Ok(Self {
            feed_a_b,
            feed_b_c,
            decimals,
            label: label.into(),
        })
    }
}

impl PriceFeed for MultiplicativePriceFeed {
    fn price(&self) -> Result<PriceQuote, FeedError> {
        let a = query_leg(&self.label, self.feed_a_b.as_ref())?;
        let b = query_leg(&self.label, self.feed_b_c.as_ref())?;

        // (a / 10^da) · (b / 10^db) · 10^out, floored once.
        let exponent = net_exponent(&[self.decimals], &[a.decimals, b.decimals]);
        let value = mul_div_pow10(&[a.value, b.value], &[], exponent)
            .ok_or(FeedError::ArithmeticOverflow)?;
        if value == 0 {
            return Err(FeedError::InvalidPrice);
        }
        debug!(feed = %self.label, %a, %b, value, decimals = self.decimals, "multiplicative price");
        Ok(PriceQuote::new(value, self.decimals))
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }

    fn description(&self) -> &str {
        &self.label
    }
}
