//! Cache-aside plumbing shared by the domain services
//!
//! - [`CacheBackend`]: the key-value capability (get, set with TTL, delete)
//! - [`RedisCache`] and [`InMemoryCache`]: the two backends
//! - [`Namespace`] and [`NamespacedKey`]: keys resolved against a generation token
//! - [`CacheAside`]: read-through under the current generation, bumps after writes
//!
//! The cache is never authoritative. Every failure is logged and degrades to
//! the store, so callers never see a [`CacheError`] from [`CacheAside`].

mod aside;
mod backend;
mod error;
mod key;
#[cfg(feature = "redis")]
mod redis_backend;

pub use aside::CacheAside;
#[cfg(any(test, feature = "mock"))]
pub use backend::MockCacheBackend;
pub use backend::{CacheBackend, InMemoryCache};
pub use error::{CacheError, CacheResult};
pub use key::{CacheKey, Namespace, NamespacedKey, OwnerScoped};
#[cfg(feature = "redis")]
pub use redis_backend::RedisCache;
