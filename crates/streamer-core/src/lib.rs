//! # streamer-core
//! Foundation types and traits for oracle-priced token streams.
//!
//! - [`types`] — identities, amounts, price quotes, stream parameters
//! - [`traits`] — the [`PriceFeed`](traits::PriceFeed), [`AssetLedger`](traits::AssetLedger)
//!   and [`Clock`](traits::Clock) collaborator interfaces
//! - [`math`] — integer fixed-point helpers with 256-bit intermediates
//! - [`ledger`] / [`clock`] — in-memory ledger and clocks for tests and simulation

pub mod clock;
pub mod constants;
pub mod error;
pub mod ledger;
pub mod math;
pub mod traits;
pub mod types;
