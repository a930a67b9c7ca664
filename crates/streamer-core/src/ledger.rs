//! In-memory [`AssetLedger`] implementation.
//!
//! Suitable for tests and simulation; a deployment plugs in a real token
//! ledger behind the same trait. Supports fee-on-transfer assets and an
//! injectable outage so callers can exercise the failure paths.

use std::collections::HashMap;

use parking_lot::Mutex;
use tracing::debug;

use crate::constants::BPS_PRECISION;
use crate::error::LedgerError;
use crate::traits::AssetLedger;
use crate::types::{Address, Amount};

#[derive(Debug, Default)]
struct LedgerInner {
    /// `(asset, holder) → balance`.
    balances: HashMap<(Address, Address), Amount>,
    /// Per-asset transfer fee in basis points, burned on every transfer.
    fees_bps: HashMap<Address, u64>,
    /// When set, every transfer is rejected with this reason.
    outage: Option<String>,
}

/// Token balances held in a `HashMap` behind a single lock.
///
/// Every transfer is applied under the lock, so it is atomic with respect to
/// every other ledger operation.
#[derive(Debug, Default)]
pub struct MemoryLedger {
    inner: Mutex<LedgerInner>,
}

impl MemoryLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Credit `amount` of `asset` to `holder` out of thin air.
    pub fn mint(
        &self,
        asset: &Address,
        holder: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        let balance = inner.balances.entry((*asset, *holder)).or_insert(0);
        *balance = balance
            .checked_add(amount)
            .ok_or(LedgerError::BalanceOverflow)?;
        debug!(%asset, %holder, amount, "ledger: minted");
        Ok(())
    }

    /// Charge `fee_bps` of every future transfer of `asset`. The fee is burned.
    pub fn set_transfer_fee_bps(&self, asset: &Address, fee_bps: u64) {
        self.inner
            .lock()
            .fees_bps
            .insert(*asset, fee_bps.min(BPS_PRECISION));
    }

    /// Reject every transfer until [`resume`](Self::resume) is called.
    pub fn suspend(&self, reason: impl Into<String>) {
        self.inner.lock().outage = Some(reason.into());
    }

    pub fn resume(&self) {
        self.inner.lock().outage = None;
    }
}

impl AssetLedger for MemoryLedger {
    fn balance_of(&self, asset: &Address, holder: &Address) -> Result<Amount, LedgerError> {
        Ok(self
            .inner
            .lock()
            .balances
            .get(&(*asset, *holder))
            .copied()
            .unwrap_or(0))
    }

    fn transfer(
        &self,
        asset: &Address,
        from: &Address,
        to: &Address,
        amount: Amount,
    ) -> Result<(), LedgerError> {
        let mut inner = self.inner.lock();
        if let Some(reason) = &inner.outage {
            return Err(LedgerError::Rejected(reason.clone()));
        }

        let have = inner.balances.get(&(*asset, *from)).copied().unwrap_or(0);
        if have < amount {
            return Err(LedgerError::InsufficientBalance { have, need: amount });
        }
        let fee_bps = inner.fees_bps.get(asset).copied().unwrap_or(0);
        let fee = amount * fee_bps as u128 / BPS_PRECISION as u128;
        let credited = amount - fee;

        // Check the credit before debiting so a failure leaves both sides untouched.
        let to_balance = if from == to {
            have - amount
        } else {
            inner.balances.get(&(*asset, *to)).copied().unwrap_or(0)
        };
        let new_to = to_balance
            .checked_add(credited)
            .ok_or(LedgerError::BalanceOverflow)?;

        inner.balances.insert((*asset, *from), have - amount);
        inner.balances.insert((*asset, *to), new_to);
        debug!(%asset, %from, %to, amount, fee, "ledger: transferred");
        Ok(())
    }
}
