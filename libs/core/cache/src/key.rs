use std::borrow::Cow;
use std::fmt;

use uuid::Uuid;

/// A concrete cache key
///
/// Only built from a [`NamespacedKey`] and the generation token current at
/// read time, so every entry belongs to exactly one generation.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    inner: String,
}

impl CacheKey {
    /// Member of a namespace generation, e.g. `concerts:{gen}:{search}:{city}`
    ///
    /// Parts are percent-encoded so free-text input cannot forge a separator.
    pub(crate) fn in_namespace(namespace: &Namespace, generation: &str, parts: &[String]) -> Self {
        let mut inner = format!("{}:{generation}", namespace.name);
        for part in parts {
            inner.push(':');
            inner.push_str(&urlencoding::encode(part));
        }
        Self { inner }
    }

    pub fn as_str(&self) -> &str {
        &self.inner
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.inner)
    }
}

/// A family of keys sharing a generation token
///
/// The token lives under `ns:{name}`. Replacing it orphans every key built
/// with the previous token, including entries put by readers that loaded
/// before the replacement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Namespace {
    name: Cow<'static, str>,
}

impl Namespace {
    /// Process-wide namespace, e.g. `concerts`
    pub const fn new(name: &'static str) -> Self {
        Self {
            name: Cow::Borrowed(name),
        }
    }

    /// Namespace of a single entity or owner, e.g. `owner:{id}`
    pub fn scoped(kind: &str, id: Uuid) -> Self {
        Self {
            name: Cow::Owned(format!("{kind}:{id}")),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub(crate) fn token_key(&self) -> String {
        format!("ns:{}", self.name)
    }
}

/// A key inside a namespace, resolved against the current generation on use
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NamespacedKey {
    namespace: Namespace,
    parts: Vec<String>,
}

impl NamespacedKey {
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            parts: Vec::new(),
        }
    }

    pub fn part(mut self, part: impl fmt::Display) -> Self {
        self.parts.push(part.to_string());
        self
    }

    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    pub(crate) fn in_generation(&self, generation: &str) -> CacheKey {
        CacheKey::in_namespace(&self.namespace, generation, &self.parts)
    }
}

/// Records carrying an owner that must be re-checked after a cache hit
pub trait OwnerScoped {
    fn owned_by(&self, owner: Uuid) -> bool;
}

impl<T: OwnerScoped> OwnerScoped for Vec<T> {
    fn owned_by(&self, owner: Uuid) -> bool {
        self.iter().all(|item| item.owned_by(owner))
    }
}
