//! Trait interfaces for oracle-priced token streams.
//!
//! These traits define the contracts between crates and the outside world:
//! - [`PriceFeed`] — scalar price source (streamer-feeds implements)
//! - [`AssetLedger`] — token balances and transfers (an external ledger, or
//!   [`MemoryLedger`](crate::ledger::MemoryLedger) in tests and simulation)
//! - [`Clock`] — non-decreasing time source

use crate::error::{FeedError, LedgerError};
use crate::types::{Address, Amount, PriceQuote, Timestamp};

/// A source of prices for one trading pair.
///
/// Implementations must query their source on every call; a failed source is
/// reported as [`FeedError::Unavailable`], never replaced by a stale or zero
/// value.
pub trait PriceFeed: Send + Sync {
    /// Latest price, with `quote.decimals == self.decimals()`.
    fn price(&self) -> Result<PriceQuote, FeedError>;

    /// Decimal precision of the values returned by [`price`](Self::price).
    fn decimals(&self) -> u8;

    /// Human-readable pair label, e.g. `"COMP / USD"`.
    fn description(&self) -> &str;
}

/// Token balances and atomic transfers.
///
/// A transfer either fully succeeds or leaves every balance untouched. The
/// amount credited to `to` may be smaller than `amount` for fee-charging
/// assets, so callers read balances back rather than assuming.
pub trait AssetLedger: Send + Sync {
    /// Balance of `holder` in `asset`. Unknown holders have a zero balance.
    fn balance_of(&self, asset: &Address, holder: &Address) -> Result<Amount, LedgerError>;

    /// Move `amount` of `asset` from `from` to `to`.
    fn transfer(
        &self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError>;
}

/// Coarse, non-decreasing wall-clock time in Unix seconds.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    // ------------------------------------------------------------------
    // Mock: PriceFeed
    // ------------------------------------------------------------------

    struct MockFeed {
        quote: Option<PriceQuote>,
    }

    impl PriceFeed for MockFeed {
        fn price(&self) -> Result<PriceQuote, FeedError> {
            self.quote.ok_or_else(|| FeedError::Unavailable {
                feed: self.description().to_string(),
                reason: "no round".into(),
            })
        }

        fn decimals(&self) -> u8 {
            8
        }

        fn description(&self) -> &str {
            "MOCK / USD"
        }
    }

    // ------------------------------------------------------------------
    // Mock: AssetLedger
    // ------------------------------------------------------------------

    #[derive(Default)]
    struct MockLedger {
        balances: Mutex<HashMap<(Address, Address), Amount>>,
    }

    impl AssetLedger for MockLedger {
        fn balance_of(&self, asset: &Address, holder: &Address) -> Result<Amount, LedgerError> {
            Ok(*self
                .balances
                .lock()
                .unwrap()
                .get(&(*asset, *holder))
                .unwrap_or(&0))
        }

        fn transfer(
            &self,
            asset: &Address,
            from: &Address,
            to: &Address,
            amount: Amount,
        ) -> Result<(), LedgerError> {
            let mut balances = self.balances.lock().unwrap();
            let have = *balances.get(&(*asset, *from)).unwrap_or(&0);
            if have < amount {
                return Err(LedgerError::InsufficientBalance { have, need: amount });
            }
            balances.insert((*asset, *from), have - amount);
            *balances.entry((*asset, *to)).or_insert(0) += amount;
            Ok(())
        }
    }

    struct FixedClock(Timestamp);

    impl Clock for FixedClock {
        fn now(&self) -> Timestamp {
            self.0
        }
    }

    #[test]
    fn feed_trait_object_reports_unavailable() {
        let feed: Box<dyn PriceFeed> = Box::new(MockFeed { quote: None });
        match feed.price() {
            Err(FeedError::Unavailable { feed, .. }) => assert_eq!(feed, "MOCK / USD"),
            other => panic!("expected unavailable, got {other:?}"),
        }
    }

    #[test]
    fn feed_trait_object_returns_quote() {
        let feed: Box<dyn PriceFeed> = Box::new(MockFeed {
            quote: Some(PriceQuote::new(42_00000000, 8)),
        });
        let q = feed.price().unwrap();
        assert_eq!(q.decimals, feed.decimals());
        assert_eq!(q.value, 42_00000000);
    }

    #[test]
    fn ledger_trait_object_transfers_atomically() {
        let asset = Address([0xAA; 20]);
        let alice = Address([1; 20]);
        let bob = Address([2; 20]);
        let ledger = MockLedger::default();
        ledger.balances.lock().unwrap().insert((asset, alice), 100);
        let ledger: &dyn AssetLedger = &ledger;

        ledger.transfer(&asset, &alice, &bob, 60).unwrap();
        assert_eq!(ledger.balance_of(&asset, &alice).unwrap(), 40);
        assert_eq!(ledger.balance_of(&asset, &bob).unwrap(), 60);

        let err = ledger.transfer(&asset, &alice, &bob, 41).unwrap_err();
        assert_eq!(err, LedgerError::InsufficientBalance { have: 40, need: 41 });
        assert_eq!(ledger.balance_of(&asset, &alice).unwrap(), 40);
    }

    #[test]
    fn clock_trait_object() {
        let clock: Box<dyn Clock> = Box::new(FixedClock(1_700_000_000));
        assert_eq!(clock.now(), 1_700_000_000);
    }
}
