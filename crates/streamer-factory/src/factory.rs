//! [`StreamerFactory`]: deploys streamers and remembers every deployment key.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use streamer_core::error::FactoryError;
use streamer_core::traits::{AssetLedger, Clock, PriceFeed};
use streamer_core::types::{Address, Amount, Hash256, StreamerParams};
use streamer_engine::Streamer;
use streamer_feeds::RatioPriceFeed;

use crate::address::{self, DeploymentKeyPolicy};

/// Factory identity and deployment rules.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FactoryConfig {
    /// Address of the factory itself; mixed into every derived address.
    pub address: Address,
    #[serde(default)]
    pub key_policy: DeploymentKeyPolicy,
}

impl FactoryConfig {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            key_policy: DeploymentKeyPolicy::default(),
        }
    }
}

/// Where a new streamer gets its STREAMING/NATIVE price.
#[derive(Clone)]
pub enum FeedConfig {
    /// A feed already quoting the streaming asset in native units.
    Direct(Arc<dyn PriceFeed>),
    /// One feed per asset, both quoted against a common reference.
    Oracles {
        streaming: Arc<dyn PriceFeed>,
        native: Arc<dyn PriceFeed>,
        decimals: u8,
    },
}

impl fmt::Debug for FeedConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct(feed) => f.debug_tuple("Direct").field(&feed.description()).finish(),
            Self::Oracles {
                streaming,
                native,
                decimals,
            } => f
                .debug_struct("Oracles")
                .field("streaming", &streaming.description())
                .field("native", &native.description())
                .field("decimals", decimals)
                .finish(),
        }
    }
}

impl FeedConfig {
    /// Label of the feed the streamer will consume. Part of the parameter hash.
    pub fn label(&self) -> String {
        match self {
            Self::Direct(feed) => feed.description().to_string(),
            Self::Oracles {
                streaming, native, ..
            } => format!("({}) / ({})", streaming.description(), native.description()),
        }
    }

    fn build(&self) -> Result<Arc<dyn PriceFeed>, FactoryError> {
        match self {
            Self::Direct(feed) => Ok(Arc::clone(feed)),
            Self::Oracles {
                streaming,
                native,
                decimals,
            } => Ok(Arc::new(RatioPriceFeed::new(
                Arc::clone(streaming),
                Arc::clone(native),
                *decimals,
                self.label(),
            )?)),
        }
    }
}

/// Everything needed to deploy a streamer except its creator, which is
/// always the deploying caller.
#[derive(Clone, Debug)]
pub struct DeployRequest {
    pub streaming_asset: Address,
    pub native_asset: Address,
    pub return_address: Address,
    pub recipient: Address,
    pub native_decimals: u8,
    pub streaming_decimals: u8,
    pub total_native_amount: Amount,
    pub slippage_tolerance_bps: u64,
    pub claim_cooldown: u64,
    pub sweep_cooldown: u64,
    pub stream_duration: u64,
    pub minimum_notice_period: Option<u64>,
    pub feed: FeedConfig,
}

impl DeployRequest {
    pub fn params(&self, creator: Address) -> StreamerParams {
        StreamerParams {
            streaming_asset: self.streaming_asset,
            native_asset: self.native_asset,
            return_address: self.return_address,
            stream_creator: creator,
            recipient: self.recipient,
            native_decimals: self.native_decimals,
            streaming_decimals: self.streaming_decimals,
            total_native_amount: self.total_native_amount,
            slippage_tolerance_bps: self.slippage_tolerance_bps,
            claim_cooldown: self.claim_cooldown,
            sweep_cooldown: self.sweep_cooldown,
            stream_duration: self.stream_duration,
            minimum_notice_period: self.minimum_notice_period,
        }
    }
}

/// Outcome of a successful [`StreamerFactory::deploy`].
#[derive(Clone, Debug)]
pub struct Deployment {
    pub address: Address,
    pub key: Hash256,
    pub streamer: Arc<Streamer>,
}

#[derive(Default)]
struct Registry {
    /// Deployment key → address. Append-only.
    keys: HashMap<Hash256, Address>,
    streamers: HashMap<Address, Arc<Streamer>>,
}

/// Deploys streamers sharing one ledger and one clock.
pub struct StreamerFactory {
    config: FactoryConfig,
    ledger: Arc<dyn AssetLedger>,
    clock: Arc<dyn Clock>,
    registry: RwLock<Registry>,
}

impl fmt::Debug for StreamerFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StreamerFactory")
            .field("config", &self.config)
            .field("deployments", &self.deployments())
            .finish_non_exhaustive()
    }
}

impl StreamerFactory {
    pub fn new(config: FactoryConfig, ledger: Arc<dyn AssetLedger>, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            ledger,
            clock,
            registry: RwLock::new(Registry::default()),
        }
    }

    pub fn config(&self) -> &FactoryConfig {
        &self.config
    }

    /// Deploy a streamer owned by `caller`.
    ///
    /// Fails with [`FactoryError::AssetsMatch`] before anything else is
    /// looked at, and with [`FactoryError::DuplicateDeployment`] if the
    /// deployment key was already used. Nothing is recorded on failure.
    pub fn deploy(
        &self,
        caller: &Address,
        request: DeployRequest,
        salt: Hash256,
    ) -> Result<Deployment, FactoryError> {
        if request.streaming_asset == request.native_asset {
            return Err(FactoryError::AssetsMatch);
        }
        let (key, address) = self.derive(caller, &request, &salt)?;
        let feed = request.feed.build()?;
        let params = request.params(*caller);

        let mut registry = self.registry.write();
        if registry.keys.contains_key(&key) || registry.streamers.contains_key(&address) {
            warn!(%caller, %salt, %address, "duplicate deployment rejected");
            return Err(FactoryError::DuplicateDeployment { address });
        }
        let streamer = Arc::new(Streamer::new(
            address,
            params,
            feed,
            Arc::clone(&self.ledger),
            Arc::clone(&self.clock),
        )?);
        registry.keys.insert(key, address);
        registry.streamers.insert(address, Arc::clone(&streamer));

        info!(
            factory = %self.config.address,
            %caller,
            %salt,
            %address,
            feed = %request.feed.label(),
            "streamer deployed"
        );
        Ok(Deployment {
            address,
            key,
            streamer,
        })
    }

    /// Address [`deploy`](Self::deploy) would use for these inputs. Pure.
    pub fn preview_address(
        &self,
        caller: &Address,
        request: &DeployRequest,
        salt: &Hash256,
    ) -> Result<Address, FactoryError> {
        Ok(self.derive(caller, request, salt)?.1)
    }

    /// Whether the deployment key for these inputs is already taken.
    pub fn is_deployed(
        &self,
        caller: &Address,
        request: &DeployRequest,
        salt: &Hash256,
    ) -> Result<bool, FactoryError> {
        let (key, _) = self.derive(caller, request, salt)?;
        Ok(self.registry.read().keys.contains_key(&key))
    }

    pub fn get(&self, address: &Address) -> Option<Arc<Streamer>> {
        self.registry.read().streamers.get(address).cloned()
    }

    /// Number of streamers deployed so far.
    pub fn deployments(&self) -> usize {
        self.registry.read().keys.len()
    }

    fn derive(
        &self,
        caller: &Address,
        request: &DeployRequest,
        salt: &Hash256,
    ) -> Result<(Hash256, Address), FactoryError> {
        let params_hash = match self.config.key_policy {
            DeploymentKeyPolicy::CreatorAndSalt => Hash256::ZERO,
            DeploymentKeyPolicy::CreatorSaltAndParams => {
                address::params_hash(&request.params(*caller), &request.feed.label())?
            }
        };
        let key = address::deployment_key(self.config.key_policy, caller, salt, &params_hash);
        Ok((key, address::streamer_address(&self.config.address, &key)))
    }
}
