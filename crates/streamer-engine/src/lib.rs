//! # streamer-engine — Streaming-accounting state machine.
//!
//! A [`Streamer`] holds one funding/vesting schedule between one creator and
//! one recipient. The entitlement is fixed in native units and vests linearly;
//! every payout is converted to the streaming asset at the price the feed
//! reports at claim time.
//!
//! All arithmetic is integer fixed-point and floors, so the streamer never
//! pays out more than its schedule allows.

pub mod streamer;

pub use streamer::{
    ClaimReceipt, InitializeReceipt, StreamState, Streamer, StreamerSnapshot, SweepReceipt,
};
