//! Shared fixtures for scenario, property and concurrency tests.

use std::sync::Arc;

use streamer_core::clock::ManualClock;
use streamer_core::constants::{
    DEFAULT_CLAIM_COOLDOWN, DEFAULT_SWEEP_COOLDOWN, SECONDS_PER_DAY, SECONDS_PER_YEAR,
};
use streamer_core::ledger::MemoryLedger;
use streamer_core::traits::AssetLedger;
use streamer_core::types::{Address, Amount, Hash256, Timestamp};
use streamer_engine::Streamer;
use streamer_factory::{
    DeployRequest, DeploymentKeyPolicy, FactoryConfig, FeedConfig, StreamerFactory,
};
use streamer_feeds::ManualPriceFeed;

pub const FACTORY: Address = Address([0xFA; 20]);
pub const COMP: Address = Address([0xC0; 20]);
pub const USD: Address = Address([0xD0; 20]);
pub const CREATOR: Address = Address([0x02; 20]);
pub const RECIPIENT: Address = Address([0x03; 20]);
pub const RETURN: Address = Address([0x04; 20]);

pub const START: Timestamp = 1_700_000_000;
pub const DAY: u64 = SECONDS_PER_DAY;
pub const YEAR: u64 = SECONDS_PER_YEAR;
pub const USD_UNIT: Amount = 1_000_000;
pub const COMP_UNIT: Amount = 1_000_000_000_000_000_000;
/// 2,000,000 USD at 6 decimals.
pub const TOTAL: Amount = 2_000_000 * USD_UNIT;
/// $50 at 8 decimals.
pub const PRICE_50: u128 = 50_00000000;

/// Address from a seed byte.
pub fn addr(seed: u8) -> Address {
    Address([seed; 20])
}

/// Salt from a seed byte.
pub fn salt(seed: u8) -> Hash256 {
    Hash256([seed; 32])
}

/// A factory with its ledger, clock and a manually driven COMP/USD feed.
pub struct World {
    pub factory: StreamerFactory,
    pub ledger: Arc<MemoryLedger>,
    pub clock: Arc<ManualClock>,
    pub feed: Arc<ManualPriceFeed>,
}

impl World {
    pub fn new() -> Self {
        Self::with_policy(DeploymentKeyPolicy::CreatorAndSalt)
    }

    pub fn with_policy(key_policy: DeploymentKeyPolicy) -> Self {
        let ledger = Arc::new(MemoryLedger::new());
        let clock = Arc::new(ManualClock::new(START));
        let feed = Arc::new(ManualPriceFeed::new(PRICE_50, 8, "COMP / USD").unwrap());
        let config = FactoryConfig {
            address: FACTORY,
            key_policy,
        };
        let factory = StreamerFactory::new(config, ledger.clone(), clock.clone());
        Self {
            factory,
            ledger,
            clock,
            feed,
        }
    }

    /// 2,000,000 USD over one year, paid in COMP, 30-day sweep notice.
    pub fn request(&self) -> DeployRequest {
        DeployRequest {
            streaming_asset: COMP,
            native_asset: USD,
            return_address: RETURN,
            recipient: RECIPIENT,
            native_decimals: 6,
            streaming_decimals: 18,
            total_native_amount: TOTAL,
            slippage_tolerance_bps: 50,
            claim_cooldown: DEFAULT_CLAIM_COOLDOWN,
            sweep_cooldown: DEFAULT_SWEEP_COOLDOWN,
            stream_duration: SECONDS_PER_YEAR,
            minimum_notice_period: Some(30 * DAY),
            feed: FeedConfig::Direct(self.feed.clone()),
        }
    }

    pub fn deploy(&self, request: DeployRequest, salt: Hash256) -> Arc<Streamer> {
        self.factory.deploy(&CREATOR, request, salt).unwrap().streamer
    }

    /// Mint exactly the required funding into the streamer and initialize it.
    /// Returns the amount minted.
    pub fn fund_and_start(&self, streamer: &Streamer) -> Amount {
        let need = streamer.required_funding().unwrap();
        self.ledger
            .mint(&COMP, &streamer.address(), need)
            .unwrap();
        streamer.initialize(&CREATOR).unwrap();
        need
    }

    /// The standard stream, deployed, funded and started at [`START`].
    pub fn started(&self) -> Arc<Streamer> {
        let streamer = self.deploy(self.request(), salt(1));
        self.fund_and_start(&streamer);
        streamer
    }

    pub fn comp_balance(&self, holder: &Address) -> Amount {
        self.ledger.balance_of(&COMP, holder).unwrap()
    }
}

impl Default for World {
    fn default() -> Self {
        Self::new()
    }
}
