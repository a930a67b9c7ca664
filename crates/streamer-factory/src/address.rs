//! Deterministic deployment keys and streamer addresses.
//!
//! All derivations are pure: the same inputs give the same outputs on every
//! machine, so an address can be previewed before anything is deployed.

use serde::{Deserialize, Serialize};

use streamer_core::constants::{
    DEPLOYMENT_KEY_DOMAIN, PARAMS_HASH_DOMAIN, STREAMER_ADDRESS_DOMAIN,
};
use streamer_core::error::FactoryError;
use streamer_core::types::{Address, Hash256, StreamerParams};

/// Which inputs identify a deployment.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DeploymentKeyPolicy {
    /// One deployment per `(creator, salt)`, whatever the parameters.
    #[default]
    CreatorAndSalt,
    /// One deployment per `(creator, salt, parameters)`; reusing a salt with
    /// different parameters yields a new streamer.
    CreatorSaltAndParams,
}

/// Hash of the full parameter set plus the feed label.
pub fn params_hash(params: &StreamerParams, feed_label: &str) -> Result<Hash256, FactoryError> {
    let encoded = bincode::encode_to_vec((params, feed_label), bincode::config::standard())
        .map_err(|e| FactoryError::Encoding(e.to_string()))?;
    let mut hasher = blake3::Hasher::new();
    hasher.update(PARAMS_HASH_DOMAIN);
    hasher.update(&encoded);
    Ok(hasher.finalize().into())
}

/// Registry key for a deployment. `params` is only mixed in under
/// [`DeploymentKeyPolicy::CreatorSaltAndParams`].
pub fn deployment_key(
    policy: DeploymentKeyPolicy,
    creator: &Address,
    salt: &Hash256,
    params: &Hash256,
) -> Hash256 {
    let mut hasher = blake3::Hasher::new();
    hasher.update(DEPLOYMENT_KEY_DOMAIN);
    hasher.update(creator.as_bytes());
    hasher.update(salt.as_bytes());
    if policy == DeploymentKeyPolicy::CreatorSaltAndParams {
        hasher.update(params.as_bytes());
    }
    hasher.finalize().into()
}

/// Address of the streamer deployed by `factory` under `key`: the first 20
/// bytes of the domain-separated hash.
pub fn streamer_address(factory: &Address, key: &Hash256) -> Address {
    let mut hasher = blake3::Hasher::new();
    hasher.update(STREAMER_ADDRESS_DOMAIN);
    hasher.update(factory.as_bytes());
    hasher.update(key.as_bytes());
    let digest = hasher.finalize();
    let mut out = [0u8; 20];
    out.copy_from_slice(&digest.as_bytes()[..20]);
    Address(out)
}
