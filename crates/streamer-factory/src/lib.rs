//! # streamer-factory — Streamer deployment.
//!
//! The factory turns a [`DeployRequest`] into a live
//! [`Streamer`](streamer_engine::Streamer) at an address derived from the
//! caller and a salt, and refuses to deploy twice under the same key.

pub mod address;
pub mod factory;

pub use address::DeploymentKeyPolicy;
pub use factory::{DeployRequest, Deployment, FactoryConfig, FeedConfig, StreamerFactory};
