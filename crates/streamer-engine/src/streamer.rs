//! The [`Streamer`] state machine.
//!
//! Lifecycle: `Uninitialized → Streaming → (Completed | Swept)`. Every
//! mutating operation runs under one state lock, so two callers never observe
//! the same intermediate state. State is only written after the external
//! transfer succeeds; a failed feed query or transfer leaves it untouched.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use streamer_core::constants::{BPS_PRECISION, MAX_DECIMALS};
use streamer_core::error::{FeedError, StreamError};
use streamer_core::math::{mul_div, mul_div_pow10, net_exponent};
use streamer_core::traits::{AssetLedger, Clock, PriceFeed};
use streamer_core::types::{
    Address, Amount, PriceQuote, StreamStatus, StreamerParams, Timestamp,
};

/// Mutable accounting of a single stream.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamState {
    /// Set once by a successful `initialize`.
    pub start_timestamp: Option<Timestamp>,
    /// Native-unit value already paid out. Never decreases, never exceeds the total.
    pub native_asset_supplied_amount: Amount,
    pub last_claim_timestamp: Option<Timestamp>,
    /// When the creator announced the intent to sweep.
    pub notice_timestamp: Option<Timestamp>,
    pub last_sweep_timestamp: Option<Timestamp>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InitializeReceipt {
    pub start_timestamp: Timestamp,
    /// Streaming-asset balance held at initialization.
    pub balance: Amount,
    /// Funding the stream required, slippage included.
    pub required: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimReceipt {
    /// Native-unit value credited against the entitlement.
    pub native_amount: Amount,
    /// Streaming-asset units sent by the streamer.
    pub streaming_amount: Amount,
    /// Streaming-asset units the recipient actually gained.
    pub received: Amount,
    pub claimed_at: Timestamp,
    /// Cumulative native value supplied after this claim.
    pub total_supplied: Amount,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SweepReceipt {
    /// Streaming-asset units sent by the streamer.
    pub amount: Amount,
    /// Streaming-asset units the return address actually gained.
    pub received: Amount,
    pub return_address: Address,
    pub swept_at: Timestamp,
}

/// Point-in-time view of a streamer, for reporting.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StreamerSnapshot {
    pub address: Address,
    pub status: StreamStatus,
    pub params: StreamerParams,
    pub state: StreamState,
    pub feed: String,
    pub streaming_balance: Amount,
    pub owed_native_amount: Amount,
    pub taken_at: Timestamp,
}

/// One oracle-priced stream between a creator and a recipient.
///
/// The recipient is owed `total_native_amount` in native units, vesting
/// linearly over `stream_duration` seconds from initialization. Claims pay
/// the vested-but-unpaid delta in the streaming asset, converted at the
/// current feed price.
pub struct Streamer {
    address: Address,
    params: StreamerParams,
    feed: Arc<dyn PriceFeed>,
    ledger: Arc<dyn AssetLedger>,
    clock: Arc<dyn Clock>,
    state: Mutex<StreamState>,
}

impl fmt::Debug for Streamer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Streamer")
            .field("address", &self.address)
            .field("feed", &self.feed.description())
            .finish_non_exhaustive()
    }
}

impl Streamer {
    /// Build a streamer holding its funds at `address`.
    ///
    /// Fails with [`StreamError::InvalidParameter`] if the parameters are
    /// inconsistent or the feed reports more than `MAX_DECIMALS` decimals.
    pub fn new(
        address: Address,
        params: StreamerParams,
        feed: Arc<dyn PriceFeed>,
        ledger: Arc<dyn AssetLedger>,
        clock: Arc<dyn Clock>,
    ) -> Result<Self, StreamError> {
        params.validate()?;
        if address.is_zero() {
            return Err(StreamError::InvalidParameter("address"));
        }
        if feed.decimals() > MAX_DECIMALS {
            return Err(StreamError::InvalidParameter("feed decimals"));
        }
        info!(
            %address,
            creator = %params.stream_creator,
            recipient = %params.recipient,
            total = params.total_native_amount,
            feed = feed.description(),
            "streamer created"
        );
        Ok(Self {
            address,
            params,
            feed,
            ledger,
            clock,
            state: Mutex::new(StreamState::default()),
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn params(&self) -> &StreamerParams {
        &self.params
    }

    pub fn feed_description(&self) -> &str {
        self.feed.description()
    }

    /// Copy of the current accounting state.
    pub fn state(&self) -> StreamState {
        self.state.lock().clone()
    }

    pub fn status(&self) -> StreamStatus {
        self.status_of(&self.state.lock())
    }

    /// Streaming-asset balance currently held by the streamer.
    pub fn balance(&self) -> Result<Amount, StreamError> {
        Ok(self
            .ledger
            .balance_of(&self.params.streaming_asset, &self.address)?)
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    /// Streaming-asset units worth `native_amount` at the current price, floored.
    pub fn to_streaming_amount(&self, native_amount: Amount) -> Result<Amount, StreamError> {
        let quote = self.quote()?;
        self.streaming_for(native_amount, &quote)
    }

    /// Native-unit value of `streaming_amount` at the current price, floored.
    pub fn to_native_amount(&self, streaming_amount: Amount) -> Result<Amount, StreamError> {
        let quote = self.quote()?;
        self.native_for(streaming_amount, &quote)
    }

    /// Streaming-asset balance needed to initialize: the whole entitlement at
    /// the current price, inflated by the slippage tolerance.
    pub fn required_funding(&self) -> Result<Amount, StreamError> {
        let quote = self.quote()?;
        self.required_for(&quote)
    }

    /// Vested native value not yet supplied. Zero before initialization and
    /// after a sweep.
    pub fn owed_native_amount(&self) -> Result<Amount, StreamError> {
        let state = self.state.lock();
        self.unpaid(&state, self.clock.now())
    }

    // ------------------------------------------------------------------
    // Operations
    // ------------------------------------------------------------------

    /// Start the stream. Creator only; requires the streamer to already hold
    /// at least [`required_funding`](Self::required_funding).
    pub fn initialize(&self, caller: &Address) -> Result<InitializeReceipt, StreamError> {
        self.authorize(caller, &self.params.stream_creator, "initialize")?;
        let mut state = self.state.lock();
        if state.last_sweep_timestamp.is_some() {
            return Err(StreamError::StreamSwept);
        }
        if state.start_timestamp.is_some() {
            return Err(StreamError::AlreadyInitialized);
        }

        let quote = self.quote()?;
        let required = self.required_for(&quote)?;
        let balance = self.balance()?;
        if balance < required {
            debug!(streamer = %self.address, balance, required, "initialize: underfunded");
            return Err(StreamError::InsufficientFunding {
                have: balance,
                need: required,
            });
        }

        let now = self.clock.now();
        state.start_timestamp = Some(now);
        info!(
            streamer = %self.address,
            start = now,
            balance,
            required,
            price = %quote,
            "stream initialized"
        );
        Ok(InitializeReceipt {
            start_timestamp: now,
            balance,
            required,
        })
    }

    /// Pay the recipient everything vested since the last claim.
    ///
    /// Recipient only; at most once per `claim_cooldown`. If the streamer
    /// holds less than the converted amount, the whole balance is paid and
    /// only its native value is credited, so the remainder stays owed.
    pub fn claim(&self, caller: &Address) -> Result<ClaimReceipt, StreamError> {
        self.authorize(caller, &self.params.recipient, "claim")?;
        let mut state = self.state.lock();
        if state.last_sweep_timestamp.is_some() {
            return Err(StreamError::StreamSwept);
        }
        let start = state.start_timestamp.ok_or(StreamError::NotInitialized)?;
        if state.native_asset_supplied_amount >= self.params.total_native_amount {
            return Err(StreamError::NothingToClaim);
        }

        let now = self.clock.now();
        if let Some(last) = state.last_claim_timestamp {
            let ready_at = last.saturating_add(self.params.claim_cooldown);
            if now < ready_at {
                debug!(streamer = %self.address, now, ready_at, "claim: cooldown active");
                return Err(StreamError::CooldownActive { ready_at });
            }
        }

        let owed = self.vested(start, now)?;
        let delta = owed.saturating_sub(state.native_asset_supplied_amount);
        if delta == 0 {
            return Err(StreamError::NothingToClaim);
        }

        let quote = self.quote()?;
        let requested = self.streaming_for(delta, &quote)?;
        if requested == 0 {
            return Err(StreamError::NothingToClaim);
        }
        let balance = self.balance()?;
        if balance == 0 {
            return Err(StreamError::InsufficientFunding {
                have: 0,
                need: requested,
            });
        }
        let (payout, credited) = if balance >= requested {
            (requested, delta)
        } else {
            let credited = self.native_for(balance, &quote)?.min(delta);
            warn!(
                streamer = %self.address,
                balance,
                requested,
                credited,
                "claim capped at held balance"
            );
            (balance, credited)
        };
        let total_supplied = state
            .native_asset_supplied_amount
            .checked_add(credited)
            .ok_or(StreamError::ArithmeticOverflow)?;

        let recipient = self.params.recipient;
        let before = self
            .ledger
            .balance_of(&self.params.streaming_asset, &recipient)?;
        self.ledger
            .transfer(&self.params.streaming_asset, &self.address, &recipient, payout)?;

        state.native_asset_supplied_amount = total_supplied;
        state.last_claim_timestamp = Some(now);
        let received = self.received_by(&recipient, before, payout);

        info!(
            streamer = %self.address,
            %recipient,
            native = credited,
            streaming = payout,
            received,
            price = %quote,
            total_supplied,
            "claimed"
        );
        Ok(ClaimReceipt {
            native_amount: credited,
            streaming_amount: payout,
            received,
            claimed_at: now,
            total_supplied,
        })
    }

    /// Announce the intent to sweep, starting the notice period. Creator
    /// only. Repeating the request keeps the original timestamp.
    pub fn request_sweep(&self, caller: &Address) -> Result<Timestamp, StreamError> {
        self.authorize(caller, &self.params.stream_creator, "request_sweep")?;
        let mut state = self.state.lock();
        if state.last_sweep_timestamp.is_some() {
            return Err(StreamError::StreamSwept);
        }
        if state.start_timestamp.is_none() {
            return Err(StreamError::NotInitialized);
        }
        if let Some(at) = state.notice_timestamp {
            return Ok(at);
        }
        let now = self.clock.now();
        state.notice_timestamp = Some(now);
        info!(
            streamer = %self.address,
            at = now,
            notice_period = ?self.params.minimum_notice_period,
            "sweep requested"
        );
        Ok(now)
    }

    /// Send the whole streaming-asset balance to the return address.
    ///
    /// Creator only. Allowed while uninitialized, once completed, after the
    /// stream end plus `sweep_cooldown`, or once the notice period has
    /// elapsed. A sweep ends the stream; further sweeps only recover later
    /// deposits and are rate limited by `sweep_cooldown`.
    pub fn sweep(&self, caller: &Address) -> Result<SweepReceipt, StreamError> {
        self.authorize(caller, &self.params.stream_creator, "sweep")?;
        let mut state = self.state.lock();
        let now = self.clock.now();
        match state.last_sweep_timestamp {
            Some(last) => {
                let ready_at = last.saturating_add(self.params.sweep_cooldown);
                if now < ready_at {
                    return Err(StreamError::CooldownActive { ready_at });
                }
            }
            None => self.check_sweep_allowed(&state, now)?,
        }

        let amount = self.balance()?;
        if amount == 0 {
            return Err(StreamError::NothingToSweep);
        }
        let return_address = self.params.return_address;
        let before = self
            .ledger
            .balance_of(&self.params.streaming_asset, &return_address)?;
        self.ledger.transfer(
            &self.params.streaming_asset,
            &self.address,
            &return_address,
            amount,
        )?;
        state.last_sweep_timestamp = Some(now);
        let received = self.received_by(&return_address, before, amount);

        info!(streamer = %self.address, %return_address, amount, received, "swept");
        Ok(SweepReceipt {
            amount,
            received,
            return_address,
            swept_at: now,
        })
    }

    pub fn snapshot(&self) -> Result<StreamerSnapshot, StreamError> {
        let state = self.state.lock();
        let now = self.clock.now();
        Ok(StreamerSnapshot {
            address: self.address,
            status: self.status_of(&state),
            params: self.params.clone(),
            owed_native_amount: self.unpaid(&state, now)?,
            streaming_balance: self.balance()?,
            feed: self.feed.description().to_string(),
            state: state.clone(),
            taken_at: now,
        })
    }

    // ------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------

    fn authorize(&self, caller: &Address, expected: &Address, op: &str) -> Result<(), StreamError> {
        if caller != expected {
            warn!(streamer = %self.address, %caller, op, "unauthorized call");
            return Err(StreamError::Unauthorized { caller: *caller });
        }
        Ok(())
    }

    fn status_of(&self, state: &StreamState) -> StreamStatus {
        if state.last_sweep_timestamp.is_some() {
            StreamStatus::Swept
        } else if state.start_timestamp.is_none() {
            StreamStatus::Uninitialized
        } else if state.native_asset_supplied_amount >= self.params.total_native_amount {
            StreamStatus::Completed
        } else {
            StreamStatus::Streaming
        }
    }

    fn check_sweep_allowed(&self, state: &StreamState, now: Timestamp) -> Result<(), StreamError> {
        let Some(start) = state.start_timestamp else {
            return Ok(());
        };
        if state.native_asset_supplied_amount >= self.params.total_native_amount {
            return Ok(());
        }
        let abandoned_at = start
            .saturating_add(self.params.stream_duration)
            .saturating_add(self.params.sweep_cooldown);
        if now >= abandoned_at {
            return Ok(());
        }
        let Some(period) = self.params.minimum_notice_period else {
            return Ok(());
        };
        let notice = state.notice_timestamp.ok_or(StreamError::NotRequested)?;
        let ready_at = notice.saturating_add(period);
        if now < ready_at {
            return Err(StreamError::NoticeNotElapsed { ready_at });
        }
        Ok(())
    }

    /// One feed query per operation; every conversion in it uses this quote.
    fn quote(&self) -> Result<PriceQuote, StreamError> {
        let quote = self.feed.price()?;
        if quote.value == 0 {
            return Err(FeedError::InvalidPrice.into());
        }
        if quote.decimals > MAX_DECIMALS {
            return Err(FeedError::InvalidDecimals(quote.decimals).into());
        }
        Ok(quote)
    }

    /// `native · 10^(feed + streaming − native) / price`
    fn streaming_for(&self, native: Amount, quote: &PriceQuote) -> Result<Amount, StreamError> {
        mul_div_pow10(&[native], &[quote.value], self.scale_exponent(quote))
            .ok_or(StreamError::ArithmeticOverflow)
    }

    /// `streaming · price / 10^(feed + streaming − native)`
    fn native_for(&self, streaming: Amount, quote: &PriceQuote) -> Result<Amount, StreamError> {
        mul_div_pow10(&[streaming, quote.value], &[], -self.scale_exponent(quote))
            .ok_or(StreamError::ArithmeticOverflow)
    }

    fn required_for(&self, quote: &PriceQuote) -> Result<Amount, StreamError> {
        let base = self.streaming_for(self.params.total_native_amount, quote)?;
        let inflated = BPS_PRECISION as u128 + self.params.slippage_tolerance_bps as u128;
        mul_div(base, inflated, BPS_PRECISION as u128).ok_or(StreamError::ArithmeticOverflow)
    }

    fn scale_exponent(&self, quote: &PriceQuote) -> i32 {
        net_exponent(
            &[quote.decimals, self.params.streaming_decimals],
            &[self.params.native_decimals],
        )
    }

    /// Native value vested at `now`, clamped to the total after the end.
    fn vested(&self, start: Timestamp, now: Timestamp) -> Result<Amount, StreamError> {
        let elapsed = now.saturating_sub(start);
        if elapsed >= self.params.stream_duration {
            return Ok(self.params.total_native_amount);
        }
        mul_div(
            self.params.total_native_amount,
            elapsed as u128,
            self.params.stream_duration as u128,
        )
        .ok_or(StreamError::ArithmeticOverflow)
    }

    fn unpaid(&self, state: &StreamState, now: Timestamp) -> Result<Amount, StreamError> {
        match (state.start_timestamp, state.last_sweep_timestamp) {
            (Some(start), None) => Ok(self
                .vested(start, now)?
                .saturating_sub(state.native_asset_supplied_amount)),
            _ => Ok(0),
        }
    }

    /// Balance gained by `holder` since `before`. Falls back to `sent` when
    /// the ledger cannot be read after the transfer already went through.
    fn received_by(&self, holder: &Address, before: Amount, sent: Amount) -> Amount {
        match self.ledger.balance_of(&self.params.streaming_asset, holder) {
            Ok(after) => after.saturating_sub(before),
            Err(e) => {
                warn!(streamer = %self.address, %holder, error = %e, "balance read-back failed");
                sent
            }
        }
    }
}
