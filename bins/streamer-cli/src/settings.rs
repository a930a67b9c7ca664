//! Simulation configuration loaded from a file plus `STREAMER__*` environment
//! overrides.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use serde::Deserialize;

use streamer_core::constants::{DEFAULT_CLAIM_COOLDOWN, DEFAULT_SWEEP_COOLDOWN, SECONDS_PER_YEAR};
use streamer_core::traits::PriceFeed;
use streamer_core::types::{Address, Hash256, Timestamp};
use streamer_factory::{DeployRequest, FactoryConfig, FeedConfig};
use streamer_feeds::ManualPriceFeed;

/// Prefix of environment overrides. Nested keys are separated by `__`.
pub const ENV_PREFIX: &str = "STREAMER";

#[derive(Clone, Debug, Deserialize)]
pub struct SimulationConfig {
    /// Clock value when the simulation starts.
    #[serde(default = "default_start")]
    pub start_timestamp: Timestamp,
    pub factory: FactoryConfig,
    pub stream: StreamConfig,
    pub feed: FeedSettings,
    /// Day on which the creator requests a sweep, if any.
    #[serde(default)]
    pub sweep_notice_day: Option<u64>,
}

/// Deployment inputs. Amounts are in the asset's smallest unit.
#[derive(Clone, Debug, Deserialize)]
pub struct StreamConfig {
    pub creator: Address,
    pub salt: Hash256,
    pub streaming_asset: Address,
    pub native_asset: Address,
    pub return_address: Address,
    pub recipient: Address,
    pub native_decimals: u8,
    pub streaming_decimals: u8,
    pub total_native_amount: u64,
    pub slippage_tolerance_bps: u64,
    #[serde(default = "default_claim_cooldown")]
    pub claim_cooldown: u64,
    #[serde(default = "default_sweep_cooldown")]
    pub sweep_cooldown: u64,
    #[serde(default = "default_stream_duration")]
    pub stream_duration: u64,
    #[serde(default)]
    pub minimum_notice_period: Option<u64>,
}

/// A manually driven STREAMING/NATIVE feed and its scripted price moves.
#[derive(Clone, Debug, Deserialize)]
pub struct FeedSettings {
    pub label: String,
    pub decimals: u8,
    /// Opening price, scaled by `10^decimals`.
    pub price: u64,
    #[serde(default)]
    pub path: Vec<PricePoint>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
pub struct PricePoint {
    pub day: u64,
    pub price: u64,
}

fn default_start() -> Timestamp {
    1_700_000_000
}

fn default_claim_cooldown() -> u64 {
    DEFAULT_CLAIM_COOLDOWN
}

fn default_sweep_cooldown() -> u64 {
    DEFAULT_SWEEP_COOLDOWN
}

fn default_stream_duration() -> u64 {
    SECONDS_PER_YEAR
}

impl SimulationConfig {
    /// Load from `path`, then apply overrides from the process environment.
    pub fn load(path: &Path) -> Result<Self> {
        Self::load_with_env(path, None)
    }

    /// Like [`load`](Self::load), reading overrides from `env` instead of the
    /// process environment when given.
    pub fn load_with_env(path: &Path, env: Option<HashMap<String, String>>) -> Result<Self> {
        let environment = config::Environment::with_prefix(ENV_PREFIX)
            .prefix_separator("__")
            .separator("__")
            .try_parsing(true)
            .source(env);
        let mut loaded: Self = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(environment)
            .build()
            .with_context(|| format!("reading {}", path.display()))?
            .try_deserialize()
            .with_context(|| format!("parsing {}", path.display()))?;
        loaded.feed.path.sort_by_key(|p| p.day);
        Ok(loaded)
    }
}

impl FeedSettings {
    /// A manual feed at the opening price.
    pub fn build(&self) -> Result<Arc<ManualPriceFeed>> {
        let feed = ManualPriceFeed::new(self.price as u128, self.decimals, self.label.clone())
            .with_context(|| format!("feed '{}'", self.label))?;
        Ok(Arc::new(feed))
    }
}

impl StreamConfig {
    pub fn request(&self, feed: Arc<dyn PriceFeed>) -> DeployRequest {
        DeployRequest {
            streaming_asset: self.streaming_asset,
            native_asset: self.native_asset,
            return_address: self.return_address,
            recipient: self.recipient,
            native_decimals: self.native_decimals,
            streaming_decimals: self.streaming_decimals,
            total_native_amount: self.total_native_amount as u128,
            slippage_tolerance_bps: self.slippage_tolerance_bps,
            claim_cooldown: self.claim_cooldown,
            sweep_cooldown: self.sweep_cooldown,
            stream_duration: self.stream_duration,
            minimum_notice_period: self.minimum_notice_period,
            feed: FeedConfig::Direct(feed),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use streamer_factory::DeploymentKeyPolicy;

    const SAMPLE: &str = r#"
[factory]
address = "0xfafafafafafafafafafafafafafafafafafafafa"
key_policy = "creator_salt_and_params"

[stream]
creator = "0x0202020202020202020202020202020202020202"
salt = "0x0000000000000000000000000000000000000000000000000000000000000001"
streaming_asset = "0xc0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0c0"
native_asset = "0xd0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0d0"
return_address = "0x0202020202020202020202020202020202020202"
recipient = "0x0303030303030303030303030303030303030303"
native_decimals = 6
streaming_decimals = 18
total_native_amount = 2000000000000
slippage_tolerance_bps = 50
sweep_cooldown = 1209600

[feed]
label = "COMP / USD"
decimals = 8
price = 5000000000

[[feed.path]]
day = 200
price = 6000000000

[[feed.path]]
day = 100
price = 4000000000
"#;

    fn write_sample() -> tempfile::NamedTempFile {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();
        file
    }

    #[test]
    fn loads_toml_with_defaults() {
        let file = write_sample();
        let config =
            SimulationConfig::load_with_env(file.path(), Some(HashMap::new())).unwrap();
        assert_eq!(config.start_timestamp, 1_700_000_000);
        assert_eq!(config.factory.key_policy, DeploymentKeyPolicy::CreatorSaltAndParams);
        assert_eq!(config.stream.recipient, Address([0x03; 20]));
        let mut salt = [0u8; 32];
        salt[31] = 1;
        assert_eq!(config.stream.salt, Hash256(salt));
        assert_eq!(config.stream.minimum_notice_period, None);
        assert_eq!(config.stream.claim_cooldown, DEFAULT_CLAIM_COOLDOWN);
        assert_eq!(config.stream.sweep_cooldown, 14 * 86_400);
        assert_eq!(config.stream.stream_duration, SECONDS_PER_YEAR);
        assert_eq!(config.sweep_notice_day, None);
        // Price path is ordered by day.
        assert_eq!(
            config.feed.path[0],
            PricePoint {
                day: 100,
                price: 4_000_000_000
            }
        );
    }

    #[test]
    fn environment_overrides_file() {
        let file = write_sample();
        let env = HashMap::from([
            ("STREAMER__STREAM__TOTAL_NATIVE_AMOUNT".to_string(), "1000".to_string()),
            ("STREAMER__SWEEP_NOTICE_DAY".to_string(), "30".to_string()),
        ]);
        let config = SimulationConfig::load_with_env(file.path(), Some(env)).unwrap();
        assert_eq!(config.stream.total_native_amount, 1_000);
        assert_eq!(config.sweep_notice_day, Some(30));
    }

    #[test]
    fn bad_address_is_reported() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        file.write_all(SAMPLE.replace("0x0303", "0xzz03").as_bytes()).unwrap();
        let err = SimulationConfig::load_with_env(file.path(), Some(HashMap::new())).unwrap_err();
        assert!(format!("{err:#}").contains("parsing"));
    }

    #[test]
    fn missing_file_is_reported() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("absent.toml");
        let err = SimulationConfig::load_with_env(&missing, None).unwrap_err();
        assert!(format!("{err:#}").contains("absent.toml"));
    }
}
