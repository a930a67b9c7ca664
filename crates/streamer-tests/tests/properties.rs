//! Property-based tests for stream accounting.
//!
//! Randomized prices, schedules and parameters check the invariants every
//! stream must hold:
//! - conversions floor, and a round trip loses at most one native unit
//! - the supplied amount never decreases and never exceeds the total
//! - vesting is linear and clamps at the end
//! - funding requirement covers the whole entitlement plus slippage
//! - addresses are deterministic and previewable

use std::sync::Arc;

use proptest::prelude::*;
use streamer_core::clock::ManualClock;
use streamer_core::constants::{DEFAULT_CLAIM_COOLDOWN, DEFAULT_SWEEP_COOLDOWN};
use streamer_core::error::StreamError;
use streamer_core::ledger::MemoryLedger;
use streamer_core::math::mul_div;
use streamer_core::types::{Address, Hash256, StreamerParams};
use streamer_engine::Streamer;
use streamer_feeds::ConstantPriceFeed;
use streamer_tests::helpers::*;

const STREAMER: Address = Address([0x5A; 20]);

fn params(
    total: u128,
    native_decimals: u8,
    streaming_decimals: u8,
    slippage: u64,
) -> StreamerParams {
    StreamerParams {
        streaming_asset: COMP,
        native_asset: USD,
        return_address: RETURN,
        stream_creator: CREATOR,
        recipient: RECIPIENT,
        native_decimals,
        streaming_decimals,
        total_native_amount: total,
        slippage_tolerance_bps: slippage,
        claim_cooldown: DEFAULT_CLAIM_COOLDOWN,
        sweep_cooldown: DEFAULT_SWEEP_COOLDOWN,
        stream_duration: YEAR,
        minimum_notice_period: None,
    }
}

fn standalone(
    params: StreamerParams,
    price: u128,
) -> (Streamer, Arc<MemoryLedger>, Arc<ManualClock>) {
    let ledger = Arc::new(MemoryLedger::new());
    let clock = Arc::new(ManualClock::new(START));
    let feed = Arc::new(ConstantPriceFeed::new(price, 8, "COMP / USD").unwrap());
    let streamer = Streamer::new(STREAMER, params, feed, ledger.clone(), clock.clone()).unwrap();
    (streamer, ledger, clock)
}

// ---------------------------------------------------------------------------
// Conversions
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(256))]

    /// With a finer streaming asset, native → streaming → native drops at most
    /// one native unit and never gains.
    #[test]
    fn round_trip_within_one_native_unit(
        native in 0u128..1_000_000_000_000,
        price in 1u128..10_000_000_000_000_000,
        native_decimals in 0u8..=6,
    ) {
        let (streamer, _, _) = standalone(params(1, native_decimals, 18, 0), price);
        let streaming = streamer.to_streaming_amount(native).unwrap();
        let back = streamer.to_native_amount(streaming).unwrap();
        prop_assert!(back <= native);
        prop_assert!(native - back <= 1);
    }

    #[test]
    fn required_funding_covers_total_plus_slippage(
        total in 1u128..1_000_000_000_000_000,
        price in 1_000_000u128..1_000_000_000_000,
        slippage in 0u64..=10_000,
    ) {
        let (streamer, _, _) = standalone(params(total, 6, 18, slippage), price);
        let base = streamer.to_streaming_amount(total).unwrap();
        let required = streamer.required_funding().unwrap();
        prop_assert!(required >= base);
        prop_assert_eq!(required, mul_div(base, 10_000 + slippage as u128, 10_000).unwrap());
    }
}

// ---------------------------------------------------------------------------
// Accounting
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    /// First claim at any point pays exactly the linear share, clamped at the end.
    #[test]
    fn first_claim_pays_linear_share(elapsed in 1u64..(400 * DAY)) {
        let (streamer, ledger, clock) = standalone(params(TOTAL, 6, 18, 50), PRICE_50);
        ledger.mint(&COMP, &STREAMER, streamer.required_funding().unwrap()).unwrap();
        streamer.initialize(&CREATOR).unwrap();
        clock.advance(elapsed);

        let vested = mul_div(TOTAL, elapsed.min(YEAR) as u128, YEAR as u128).unwrap();
        let receipt = streamer.claim(&RECIPIENT).unwrap();
        prop_assert_eq!(receipt.native_amount, vested);
        prop_assert_eq!(receipt.streaming_amount, streamer.to_streaming_amount(vested).unwrap());
    }

    /// Under any schedule and price path the supplied amount is monotone,
    /// bounded by the total, and only moves on successful claims.
    #[test]
    fn supplied_is_monotone_and_bounded(
        steps in prop::collection::vec((1u64..(20 * DAY), 1_00000000u128..200_00000000), 1..40),
        slippage in 0u64..=2_000,
    ) {
        let world = World::new();
        let mut request = world.request();
        request.slippage_tolerance_bps = slippage;
        let streamer = world.deploy(request, salt(1));
        world.fund_and_start(&streamer);

        let mut supplied = 0;
        for (step, price) in steps {
            world.clock.advance(step);
            world.feed.set_price(price).unwrap();
            let before = streamer.state();
            match streamer.claim(&RECIPIENT) {
                Ok(r) => {
                    prop_assert!(r.total_supplied > supplied);
                    prop_assert!(r.native_amount <= TOTAL);
                    supplied = r.total_supplied;
                }
                Err(
                    StreamError::CooldownActive { .. }
                    | StreamError::NothingToClaim
                    | StreamError::InsufficientFunding { .. },
                ) => prop_assert_eq!(streamer.state(), before),
                Err(e) => prop_assert!(false, "unexpected error: {}", e),
            }
            prop_assert!(streamer.state().native_asset_supplied_amount <= TOTAL);
            prop_assert_eq!(streamer.state().native_asset_supplied_amount, supplied);
        }
    }

    /// Claims against a constant price exhaust exactly the total, whatever the
    /// claim rhythm.
    #[test]
    fn completed_stream_supplied_exactly_total(
        gaps in prop::collection::vec(7 * DAY..(90 * DAY), 1..20),
    ) {
        let world = World::new();
        let streamer = world.started();
        for gap in gaps {
            world.clock.advance(gap);
            let _ = streamer.claim(&RECIPIENT);
        }
        world.clock.set(START + YEAR + 90 * DAY);
        let _ = streamer.claim(&RECIPIENT);
        prop_assert_eq!(streamer.state().native_asset_supplied_amount, TOTAL);
        prop_assert_eq!(streamer.owed_native_amount().unwrap(), 0);
    }
}

// ---------------------------------------------------------------------------
// Deployment addresses
// ---------------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(128))]

    #[test]
    fn preview_matches_deploy(creator in any::<[u8; 20]>(), salt_bytes in any::<[u8; 32]>()) {
        prop_assume!(creator != [0u8; 20]);
        let world = World::new();
        let creator = Address(creator);
        let salt = Hash256(salt_bytes);
        let predicted = world.factory.preview_address(&creator, &world.request(), &salt).unwrap();
        let deployed = world.factory.deploy(&creator, world.request(), salt).unwrap();
        prop_assert_eq!(deployed.address, predicted);
        prop_assert!(world.factory.is_deployed(&creator, &world.request(), &salt).unwrap());
    }
}

#[test]
fn world_feed_drives_conversions() {
    let world = World::new();
    world.feed.set_price(2 * PRICE_50).unwrap();
    let streamer = world.deploy(world.request(), salt(1));
    assert_eq!(streamer.to_streaming_amount(100 * USD_UNIT).unwrap(), COMP_UNIT);
}
