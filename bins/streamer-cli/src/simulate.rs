//! Time-stepped stream simulation over a memory ledger and a manual clock.

use std::sync::Arc;

use anyhow::{bail, Context, Result};
use serde::Serialize;
use tracing::{debug, info};

use streamer_core::clock::ManualClock;
use streamer_core::constants::SECONDS_PER_DAY;
use streamer_core::error::{StreamError, StreamerError};
use streamer_core::ledger::MemoryLedger;
use streamer_core::traits::PriceFeed;
use streamer_core::types::{Address, Amount, StreamStatus, Timestamp};
use streamer_engine::{
    ClaimReceipt, InitializeReceipt, Streamer, StreamerSnapshot, SweepReceipt,
};
use streamer_factory::StreamerFactory;

use crate::settings::{SimulationConfig, StreamConfig};

#[derive(Debug, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    Deployed {
        address: Address,
        required_funding: Amount,
    },
    Initialized {
        day: u64,
        receipt: InitializeReceipt,
    },
    PriceUpdated {
        day: u64,
        price: u64,
    },
    Claimed {
        day: u64,
        receipt: ClaimReceipt,
    },
    ClaimSkipped {
        day: u64,
        reason: String,
    },
    SweepRequested {
        day: u64,
        at: Timestamp,
    },
    Swept {
        day: u64,
        receipt: SweepReceipt,
    },
}

#[derive(Debug, Serialize)]
pub struct Report {
    pub events: Vec<Event>,
    pub snapshot: StreamerSnapshot,
}

/// Deploy, fund exactly the required amount, initialize, then step the clock
/// by `step_days` and claim until the stream completes or is swept.
pub fn run(config: &SimulationConfig, step_days: u64) -> Result<Report> {
    if step_days == 0 {
        bail!("step must be at least one day");
    }
    let stream = &config.stream;
    let ledger = Arc::new(MemoryLedger::new());
    let clock = Arc::new(ManualClock::new(config.start_timestamp));
    let feed = config.feed.build()?;
    let factory = StreamerFactory::new(config.factory.clone(), ledger.clone(), clock.clone());

    let (address, streamer, required_funding, receipt) =
        launch(&factory, &ledger, stream, feed.clone()).context("launching stream")?;
    let mut events = vec![
        Event::Deployed {
            address,
            required_funding,
        },
        Event::Initialized { day: 0, receipt },
    ];

    let horizon = stream.stream_duration
        + stream.sweep_cooldown
        + stream.minimum_notice_period.unwrap_or(0);
    let last_day = horizon.div_ceil(SECONDS_PER_DAY) + step_days;
    let mut path = config.feed.path.iter().peekable();
    let mut day = 0;

    while day < last_day {
        day += step_days;
        clock.set(config.start_timestamp + day * SECONDS_PER_DAY);

        while let Some(point) = path.next_if(|p| p.day <= day) {
            feed.set_price(point.price as u128)?;
            events.push(Event::PriceUpdated {
                day: point.day,
                price: point.price,
            });
        }

        if config.sweep_notice_day.is_some_and(|d| d <= day)
            && streamer.state().notice_timestamp.is_none()
        {
            let at = streamer.request_sweep(&stream.creator)?;
            events.push(Event::SweepRequested { day, at });
        }

        match streamer.claim(&stream.recipient) {
            Ok(receipt) => events.push(Event::Claimed { day, receipt }),
            Err(
                e @ (StreamError::CooldownActive { .. }
                | StreamError::NothingToClaim
                | StreamError::InsufficientFunding { .. }),
            ) => {
                debug!(day, reason = %e, "claim skipped");
                events.push(Event::ClaimSkipped {
                    day,
                    reason: e.to_string(),
                });
            }
            Err(e) => return Err(e).with_context(|| format!("claim on day {day}")),
        }

        if streamer.state().notice_timestamp.is_some() {
            match streamer.sweep(&stream.creator) {
                Ok(receipt) => {
                    events.push(Event::Swept { day, receipt });
                    break;
                }
                Err(StreamError::NoticeNotElapsed { .. } | StreamError::NothingToSweep) => {}
                Err(e) => return Err(e).with_context(|| format!("sweep on day {day}")),
            }
        }

        if streamer.status() == StreamStatus::Completed {
            break;
        }
    }

    let snapshot = streamer.snapshot()?;
    info!(
        streamer = %snapshot.address,
        status = %snapshot.status,
        days = day,
        supplied = snapshot.state.native_asset_supplied_amount,
        "simulation finished"
    );
    Ok(Report { events, snapshot })
}

/// Deploy the configured stream, mint exactly its required funding into it
/// and initialize it.
fn launch(
    factory: &StreamerFactory,
    ledger: &MemoryLedger,
    stream: &StreamConfig,
    feed: Arc<dyn PriceFeed>,
) -> Result<(Address, Arc<Streamer>, Amount, InitializeReceipt), StreamerError> {
    let deployment = factory.deploy(&stream.creator, stream.request(feed), stream.salt)?;
    let streamer = deployment.streamer;
    let required = streamer.required_funding()?;
    ledger.mint(&stream.streaming_asset, &deployment.address, required)?;
    let receipt = streamer.initialize(&stream.creator)?;
    Ok((deployment.address, streamer, required, receipt))
}
