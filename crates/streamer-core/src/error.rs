//! Error types for oracle-priced token streams.
use thiserror::Error;

use crate::types::{Address, Amount, Timestamp};

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum IdentityError {
    #[error("invalid hex: {0}")] InvalidHex(String),
    #[error("invalid length: expected {expected} bytes, got {got}")] InvalidLength { expected: usize, got: usize },
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FeedError {
    #[error("price feed '{feed}' unavailable: {reason}")] Unavailable { feed: String, reason: String },
    #[error("price must be strictly positive")] InvalidPrice,
    #[error("decimals out of range: {0}")] InvalidDecimals(u8),
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("insufficient balance: have {have}, need {need}")] InsufficientBalance { have: Amount, need: Amount },
    #[error("balance overflow")] BalanceOverflow,
    #[error("transfer rejected: {0}")] Rejected(String),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StreamError {
    #[error("insufficient funding: have {have}, need {need}")] InsufficientFunding { have: Amount, need: Amount },
    #[error("stream already initialized")] AlreadyInitialized,
    #[error("stream not initialized")] NotInitialized,
    #[error("cooldown active until {ready_at}")] CooldownActive { ready_at: Timestamp },
    #[error("nothing to claim")] NothingToClaim,
    #[error("nothing to sweep")] NothingToSweep,
    #[error("notice period not elapsed until {ready_at}")] NoticeNotElapsed { ready_at: Timestamp },
    #[error("sweep notice not requested")] NotRequested,
    #[error("stream has been swept")] StreamSwept,
    #[error("feed unavailable: {0}")] FeedUnavailable(#[from] FeedError),
    #[error("failed transfer: {0}")] FailedTransfer(#[from] LedgerError),
    #[error("unauthorized caller: {caller}")] Unauthorized { caller: Address },
    #[error("invalid parameter: {0}")] InvalidParameter(&'static str),
    #[error("arithmetic overflow")] ArithmeticOverflow,
}

impl StreamError {
    /// Whether the failure came from an external collaborator and may succeed
    /// if the same call is retried later.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::FeedUnavailable(_) | Self::FailedTransfer(_))
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FactoryError {
    #[error("streaming and native assets match")] AssetsMatch,
    #[error("streamer already deployed at {address}")] DuplicateDeployment { address: Address },
    #[error("feed: {0}")] Feed(#[from] FeedError),
    #[error(transparent)] Stream(#[from] StreamError),
    #[error("encoding: {0}")] Encoding(String),
}

impl FactoryError {
    /// See [`StreamError::is_transient`].
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Stream(e) => e.is_transient(),
            _ => false,
        }
    }
}

#[derive(Error, Debug)]
pub enum StreamerError {
    #[error(transparent)] Identity(#[from] IdentityError),
    #[error(transparent)] Feed(#[from] FeedError),
    #[error(transparent)] Ledger(#[from] LedgerError),
    #[error(transparent)] Stream(#[from] StreamError),
    #[error(transparent)] Factory(#[from] FactoryError),
}
