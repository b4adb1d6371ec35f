// Copyright 2024 MaidSafe.net limited.
//
// This SAFE Network Software is licensed to you under The General Public License (GPL), version 3.
// Unless required by applicable law or agreed to in writing, the SAFE Network Software distributed
// under the GPL Licence is distributed on an "AS IS" BASIS, WITHOUT WARRANTIES OR CONDITIONS OF ANY
// KIND, either express or implied. Please review the Licences for the specific language governing
// permissions and limitations relating to use of the SAFE Network Software.

use crate::common::{serialize_decimal, Amount, U256};
use crate::error::{Error, Result};
use crate::validation::{is_address_valid, parse_amount};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const KEY_PREFIX: &str = "utility_token_balance";

/// Key/value store holding last-known balances as decimal strings.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CacheBackend: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>>;

    async fn set(&self, key: &str, value: String) -> Result<()>;
}

/// In-process [`CacheBackend`].
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryCache {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        let _ = self.entries.write().await.insert(key.to_string(), value);
        Ok(())
    }
}

/// A cache lookup. `Miss` is distinct from a cached zero balance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "balance", rename_all = "camelCase")]
pub enum CachedBalance {
    #[serde(serialize_with = "serialize_decimal")]
    Hit(Amount),
    Miss,
}

/// Last-known balances per owner on one chain.
#[derive(Clone)]
pub struct BalanceCache {
    backend: Arc<dyn CacheBackend>,
    chain_id: u64,
}

impl BalanceCache {
    pub fn new(backend: Arc<dyn CacheBackend>, chain_id: u64) -> Self {
        Self { backend, chain_id }
    }

    pub fn key(&self, owner: &str) -> String {
        format!("{KEY_PREFIX}_{}_{}", self.chain_id, owner.to_lowercase())
    }

    pub async fn get(&self, owner: &str) -> Result<CachedBalance> {
        if !is_address_valid(owner) {
            return Err(Error::InvalidAddress(owner.to_string()));
        }

        let key = self.key(owner);
        let Some(value) = self.backend.get(&key).await.inspect_err(|err| {
            warn!("Error reading cached balance under {key}: {err}");
        })?
        else {
            debug!("No cached balance under {key}");
            return Ok(CachedBalance::Miss);
        };

        // a stored "0" is a hit, only malformed values are treated as absent
        match U256::from_str_radix(value.trim(), 10) {
            Ok(balance) => Ok(CachedBalance::Hit(balance)),
            Err(_) => {
                warn!("Ignoring malformed cached balance {value:?} under {key}");
                Ok(CachedBalance::Miss)
            }
        }
    }

    /// Overwrites whatever is cached for `owner`.
    pub async fn set(&self, owner: &str, balance: &str) -> Result<()> {
        if !is_address_valid(owner) {
            return Err(Error::InvalidAddress(owner.to_string()));
        }
        if balance != "0" && parse_amount(balance).is_none() {
            return Err(Error::InvalidAmount(balance.to_string()));
        }

        let key = self.key(owner);
        self.backend
            .set(&key, balance.to_string())
            .await
            .inspect_err(|err| warn!("Error caching balance under {key}: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const OWNER: &str = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";

    #[tokio::test]
    async fn miss_is_not_zero() {
        let cache = BalanceCache::new(Arc::new(MemoryCache::new()), 1409);

        assert_eq!(cache.get(OWNER).await.unwrap(), CachedBalance::Miss);

        cache.set(OWNER, "0").await.unwrap();
        assert_eq!(
            cache.get(OWNER).await.unwrap(),
            CachedBalance::Hit(U256::ZERO)
        );
    }

    #[tokio::test]
    async fn set_overwrites_and_key_ignores_case() {
        let cache = BalanceCache::new(Arc::new(MemoryCache::new()), 1409);

        cache.set(OWNER, "1000").await.unwrap();
        cache.set(&OWNER.to_lowercase(), "250").await.unwrap();

        assert_eq!(
            cache.get(OWNER).await.unwrap(),
            CachedBalance::Hit(U256::from(250))
        );
        assert_eq!(
            cache.key(OWNER),
            "utility_token_balance_1409_0x5aaeb6053f3e94c9b9a09f33669435e7ef1beaed"
        );
    }

    #[tokio::test]
    async fn amounts_beyond_u64_survive() {
        let cache = BalanceCache::new(Arc::new(MemoryCache::new()), 1);
        let big = "800000000000000000000000000";

        cache.set(OWNER, big).await.unwrap();
        assert_eq!(
            cache.get(OWNER).await.unwrap(),
            CachedBalance::Hit(U256::from_str_radix(big, 10).unwrap())
        );
    }

    #[test]
    fn hit_serialises_as_decimal_string() {
        assert_eq!(
            serde_json::to_value(CachedBalance::Hit(U256::from(1000))).unwrap(),
            serde_json::json!({ "status": "hit", "balance": "1000" })
        );
        assert_eq!(
            serde_json::to_value(CachedBalance::Miss).unwrap(),
            serde_json::json!({ "status": "miss" })
        );
    }

    #[tokio::test]
    async fn backend_failure_surfaces_as_dependency_failure() {
        let mut backend = MockCacheBackend::new();
        backend
            .expect_get()
            .returning(|_| Err(Error::DependencyFailure("cache unreachable".to_string())));
        let cache = BalanceCache::new(Arc::new(backend), 1);

        let err = cache.get(OWNER).await.unwrap_err();
        assert_eq!(err.code(), "dependency_failed");
    }
}
