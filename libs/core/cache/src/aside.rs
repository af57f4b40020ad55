use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use core_config::cache::CacheTtlConfig;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::backend::CacheBackend;
use crate::key::{CacheKey, Namespace, NamespacedKey, OwnerScoped};

/// Cache-aside layer over a [`CacheBackend`]
///
/// Reads go cache first and fall back to a loader against the store. Every
/// entry lives under a namespace generation captured before the loader runs;
/// writes bump the affected namespaces after commit, so a put racing a write
/// lands under a generation no reader will resolve again. Backend failures
/// are logged at warn level and treated as misses, so none of these methods
/// fail because of the cache.
#[derive(Clone)]
pub struct CacheAside {
    backend: Arc<dyn CacheBackend>,
    ttl: CacheTtlConfig,
}

impl CacheAside {
    pub fn new(backend: Arc<dyn CacheBackend>, ttl: CacheTtlConfig) -> Self {
        Self { backend, ttl }
    }

    /// TTL for single entities and filtered lists
    pub fn entity_ttl(&self) -> Duration {
        self.ttl.entity_ttl
    }

    /// TTL for slow-moving aggregates
    pub fn aggregate_ttl(&self) -> Duration {
        self.ttl.aggregate_ttl
    }

    /// Cached value under `key`, if present and decodable
    async fn get_cached<V: DeserializeOwned>(&self, key: &CacheKey) -> Option<V> {
        match self.backend.get(key.as_str()).await {
            Ok(Some(raw)) => match serde_json::from_str(&raw) {
                Ok(value) => {
                    debug!(key = %key, "Cache hit");
                    Some(value)
                }
                Err(e) => {
                    warn!(key = %key, error = %e, "Undecodable cache entry, treating as miss");
                    None
                }
            },
            Ok(None) => {
                debug!(key = %key, "Cache miss");
                None
            }
            Err(e) => {
                warn!(key = %key, error = %e, "Cache read failed, falling back to store");
                None
            }
        }
    }

    async fn put<V: Serialize + ?Sized>(&self, key: &CacheKey, value: &V, ttl: Duration) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key = %key, error = %e, "Failed to serialize cache value");
                return;
            }
        };

        if let Err(e) = self.backend.set(key.as_str(), raw, ttl).await {
            warn!(key = %key, error = %e, "Cache write failed");
        }
    }

    /// Delete `keys`; idempotent
    async fn invalidate(&self, keys: &[CacheKey]) {
        if keys.is_empty() {
            return;
        }

        let raw: Vec<String> = keys.iter().map(|key| key.as_str().to_string()).collect();
        match self.backend.delete(&raw).await {
            Ok(()) => debug!(keys = ?raw, "Invalidated cache keys"),
            Err(e) => warn!(keys = ?raw, error = %e, "Cache invalidation failed"),
        }
    }

    async fn read_through<V, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        loader: F,
    ) -> Result<V, E>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        if let Some(value) = self.get_cached(key).await {
            return Ok(value);
        }

        let value = loader().await?;
        self.put(key, &value, ttl).await;
        Ok(value)
    }

    /// Like [`read_through`](Self::read_through); absent values are not cached
    async fn read_through_optional<V, E, F, Fut>(
        &self,
        key: &CacheKey,
        ttl: Duration,
        loader: F,
    ) -> Result<Option<V>, E>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        if let Some(value) = self.get_cached(key).await {
            return Ok(Some(value));
        }

        let value = loader().await?;
        if let Some(value) = &value {
            self.put(key, value, ttl).await;
        }
        Ok(value)
    }

    /// Read-through for owner-scoped records
    ///
    /// A cached record that fails the ownership check is evicted and the
    /// loader is consulted. Records not owned by `owner` are never returned
    /// or cached.
    async fn read_through_owned<V, E, F, Fut>(
        &self,
        key: &CacheKey,
        owner: Uuid,
        ttl: Duration,
        loader: F,
    ) -> Result<Option<V>, E>
    where
        V: OwnerScoped + Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        if let Some(value) = self.get_cached::<V>(key).await {
            if value.owned_by(owner) {
                return Ok(Some(value));
            }
            warn!(key = %key, %owner, "Cached record fails ownership check, evicting");
            self.invalidate(std::slice::from_ref(key)).await;
        }

        let value = loader().await?.filter(|value| value.owned_by(owner));
        if let Some(value) = &value {
            self.put(key, value, ttl).await;
        }
        Ok(value)
    }

    /// Current generation token of `namespace`, created on first use
    ///
    /// `None` when the backend cannot provide one; callers must then bypass
    /// the cache for the whole namespace.
    pub async fn namespace_token(&self, namespace: &Namespace) -> Option<String> {
        let token_key = namespace.token_key();

        match self.backend.get(&token_key).await {
            Ok(Some(token)) => return Some(token),
            Ok(None) => {}
            Err(e) => {
                warn!(namespace = namespace.name(), error = %e, "Namespace token unreadable");
                return None;
            }
        }

        let token = new_token();
        match self
            .backend
            .set(&token_key, token.clone(), self.ttl.aggregate_ttl)
            .await
        {
            Ok(()) => Some(token),
            Err(e) => {
                warn!(namespace = namespace.name(), error = %e, "Failed to create namespace token");
                None
            }
        }
    }

    /// Replace the generation token, orphaning every key of the namespace
    pub async fn bump_namespace(&self, namespace: &Namespace) {
        let token = new_token();
        match self
            .backend
            .set(&namespace.token_key(), token, self.ttl.aggregate_ttl)
            .await
        {
            Ok(()) => debug!(namespace = namespace.name(), "Bumped namespace generation"),
            Err(e) => {
                warn!(namespace = namespace.name(), error = %e, "Failed to bump namespace generation")
            }
        }
    }

    /// Bump each of `namespaces` in turn
    pub async fn bump_namespaces(&self, namespaces: &[Namespace]) {
        for namespace in namespaces {
            self.bump_namespace(namespace).await;
        }
    }

    /// Concrete key of `key` under the current generation
    pub async fn current_key(&self, key: &NamespacedKey) -> Option<CacheKey> {
        self.namespace_token(key.namespace())
            .await
            .map(|token| key.in_generation(&token))
    }

    /// Read-through under the current generation of `key`'s namespace
    ///
    /// Without a token the loader result is returned uncached.
    pub async fn read_through_namespaced<V, E, F, Fut>(
        &self,
        key: &NamespacedKey,
        ttl: Duration,
        loader: F,
    ) -> Result<V, E>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<V, E>>,
    {
        match self.current_key(key).await {
            Some(key) => self.read_through(&key, ttl, loader).await,
            None => loader().await,
        }
    }

    /// Namespaced read-through; absent values are not cached
    pub async fn read_through_optional_namespaced<V, E, F, Fut>(
        &self,
        key: &NamespacedKey,
        ttl: Duration,
        loader: F,
    ) -> Result<Option<V>, E>
    where
        V: Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        match self.current_key(key).await {
            Some(key) => self.read_through_optional(&key, ttl, loader).await,
            None => loader().await,
        }
    }

    /// Namespaced read-through for owner-scoped records
    ///
    /// The ownership check applies whether or not a generation is available.
    pub async fn read_through_owned_namespaced<V, E, F, Fut>(
        &self,
        key: &NamespacedKey,
        owner: Uuid,
        ttl: Duration,
        loader: F,
    ) -> Result<Option<V>, E>
    where
        V: OwnerScoped + Serialize + DeserializeOwned,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<Option<V>, E>>,
    {
        match self.current_key(key).await {
            Some(key) => self.read_through_owned(&key, owner, ttl, loader).await,
            None => Ok(loader().await?.filter(|value| value.owned_by(owner))),
        }
    }
}

fn new_token() -> String {
    Uuid::new_v4().simple().to_string()
}
