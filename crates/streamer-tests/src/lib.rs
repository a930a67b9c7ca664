//! Cross-crate test suite for oracle-priced streams.
//!
//! The integration tests under `tests/` drive factories, streamers, feeds and
//! the memory ledger together, checking accounting invariants under scripted
//! scenarios, randomized schedules and concurrent callers.

pub mod helpers;
