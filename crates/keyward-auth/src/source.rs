//! Where a verifier gets its key set from.

use std::sync::Arc;

use async_trait::async_trait;

use crate::cache::JwksCache;
use crate::error::Result;
use crate::jwks::JwkSet;

/// A provider of the key set used to verify token signatures.
#[async_trait]
pub trait KeySetSource: Send + Sync {
    /// Return the current key set.
    ///
    /// # Errors
    ///
    /// Returns `AuthError::JwksUnavailable` if no key set can be produced.
    async fn key_set(&self) -> Result<Arc<JwkSet>>;
}

/// A remote JWKS endpoint read through a shared cache.
#[derive(Clone)]
pub struct RemoteJwks {
    cache: Arc<JwksCache>,
    url: String,
}

impl RemoteJwks {
    /// Read `url` through `cache`.
    #[must_use]
    pub fn new(cache: Arc<JwksCache>, url: impl Into<String>) -> Self {
        Self {
            cache,
            url: url.into(),
        }
    }

    /// The JWKS URL.
    #[must_use]
    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl KeySetSource for RemoteJwks {
    async fn key_set(&self) -> Result<Arc<JwkSet>> {
        self.cache.get(&self.url).await
    }
}

#[async_trait]
impl<T: KeySetSource + ?Sized> KeySetSource for Arc<T> {
    async fn key_set(&self) -> Result<Arc<JwkSet>> {
        (**self).key_set().await
    }
}
