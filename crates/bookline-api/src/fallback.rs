//! "Network first, cache second" loading for collections.

use std::future::Future;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cache::{CacheStore, ResourceKind};
use crate::error::ApiError;

/// Non-fatal notice shown when a collection is served from the cache.
pub const OFFLINE_NOTICE: &str = "You appear to be offline. Showing saved data.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DataOrigin {
    Network,
    /// Served from the cache because the fetch failed with `cause`.
    Cache { cause: ApiError },
}

#[derive(Debug, Clone, PartialEq)]
pub struct Loaded<T> {
    pub items: Vec<T>,
    pub origin: DataOrigin,
}

impl<T> Loaded<T> {
    #[must_use]
    pub fn is_from_cache(&self) -> bool {
        matches!(self.origin, DataOrigin::Cache { .. })
    }

    #[must_use]
    pub fn offline_notice(&self) -> Option<&'static str> {
        self.is_from_cache().then_some(OFFLINE_NOTICE)
    }
}

/// Fetch a collection, refreshing the cache on success and falling back to
/// it on failure.
///
/// 1. Run `fetch`.
/// 2. On success, overwrite the `kind` cache entry and return the items.
/// 3. On failure, return the cached collection if it is non-empty; otherwise
///    return the fetch error.
///
/// [`ApiError::Cancelled`] and [`ApiError::Unauthorized`] skip step 3: a
/// superseded request has no audience, and a 401 must reach the session
/// layer rather than be masked by stale data.
///
/// # Errors
///
/// Returns the fetch error when no usable cache entry exists.
pub async fn load_with_fallback<T, C, F, Fut>(
    cache: &C,
    kind: ResourceKind,
    fetch: F,
) -> Result<Loaded<T>, ApiError>
where
    T: Serialize + DeserializeOwned,
    C: CacheStore + ?Sized,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<Vec<T>, ApiError>>,
{
    match fetch().await {
        Ok(items) => {
            match serde_json::to_value(&items) {
                Ok(value) => {
                    if let Err(e) = cache.set(kind, value) {
                        tracing::warn!(resource = %kind, error = %e, "cache write failed");
                    }
                }
                Err(e) => {
                    tracing::warn!(resource = %kind, error = %e, "could not serialize collection for cache");
                }
            }
            Ok(Loaded {
                items,
                origin: DataOrigin::Network,
            })
        }
        Err(err) if err.is_cancelled() || err.is_unauthorized() => Err(err),
        Err(err) => match cached_items::<T, C>(cache, kind) {
            Some(items) => {
                tracing::warn!(
                    resource = %kind,
                    count = items.len(),
                    error = %err,
                    "fetch failed, serving cached collection"
                );
                Ok(Loaded {
                    items,
                    origin: DataOrigin::Cache { cause: err },
                })
            }
            None => Err(err),
        },
    }
}

fn cached_items<T, C>(cache: &C, kind: ResourceKind) -> Option<Vec<T>>
where
    T: DeserializeOwned,
    C: CacheStore + ?Sized,
{
    let value = cache.get(kind)?;
    match serde_json::from_value::<Vec<T>>(value) {
        Ok(items) if !items.is_empty() => Some(items),
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(resource = %kind, error = %e, "cached collection has unexpected shape");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;
    use serde_json::json;

    use super::*;
    use crate::cache::MemoryCache;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Item {
        id: String,
    }

    fn item(id: &str) -> Item {
        Item { id: id.to_string() }
    }

    #[tokio::test]
    async fn success_refreshes_cache() {
        let cache = MemoryCache::new();
        let loaded = load_with_fallback(&cache, ResourceKind::Offers, || async {
            Ok(vec![item("o1")])
        })
        .await
        .unwrap();
        assert_eq!(loaded.origin, DataOrigin::Network);
        assert!(loaded.offline_notice().is_none());
        assert_eq!(cache.get(ResourceKind::Offers), Some(json!([{"id": "o1"}])));
    }

    #[tokio::test]
    async fn failure_after_success_serves_cached_collection() {
        let cache = MemoryCache::new();
        load_with_fallback(&cache, ResourceKind::Providers, || async {
            Ok(vec![item("p1"), item("p2")])
        })
        .await
        .unwrap();

        let loaded = load_with_fallback(&cache, ResourceKind::Providers, || async {
            Err::<Vec<Item>, _>(ApiError::NoNetwork)
        })
        .await
        .unwrap();

        assert_eq!(loaded.items, vec![item("p1"), item("p2")]);
        assert_eq!(
            loaded.origin,
            DataOrigin::Cache {
                cause: ApiError::NoNetwork
            }
        );
        assert_eq!(loaded.offline_notice(), Some(OFFLINE_NOTICE));
    }

    #[tokio::test]
    async fn failure_with_empty_cache_is_hard_error() {
        let cache = MemoryCache::new();
        let err = load_with_fallback(&cache, ResourceKind::Bookings, || async {
            Err::<Vec<Item>, _>(ApiError::ServerError {
                status: 500,
                message: None,
            })
        })
        .await
        .unwrap_err();
        assert_eq!(err.status(), Some(500));
    }

    #[tokio::test]
    async fn cached_empty_collection_does_not_count() {
        let cache = MemoryCache::new();
        cache.set(ResourceKind::Bookings, json!([])).unwrap();
        let err = load_with_fallback(&cache, ResourceKind::Bookings, || async {
            Err::<Vec<Item>, _>(ApiError::NoNetwork)
        })
        .await
        .unwrap_err();
        assert_eq!(err, ApiError::NoNetwork);
    }

    #[tokio::test]
    async fn caches_are_isolated_by_kind() {
        let cache = MemoryCache::new();
        cache.set(ResourceKind::Offers, json!([{"id": "o1"}])).unwrap();
        let err = load_with_fallback(&cache, ResourceKind::Providers, || async {
            Err::<Vec<Item>, _>(ApiError::NoNetwork)
        })
        .await
        .unwrap_err();
        assert_eq!(err, ApiError::NoNetwork);
    }

    #[tokio::test]
    async fn unauthorized_and_cancelled_bypass_cache() {
        let cache = MemoryCache::new();
        cache.set(ResourceKind::Offers, json!([{"id": "o1"}])).unwrap();
        for err in [ApiError::Unauthorized, ApiError::Cancelled] {
            let expected = err.clone();
            let got = load_with_fallback(&cache, ResourceKind::Offers, || async move {
                Err::<Vec<Item>, _>(err)
            })
            .await
            .unwrap_err();
            assert_eq!(got, expected);
        }
    }

    #[tokio::test]
    async fn works_through_trait_object() {
        let cache: Box<dyn CacheStore> = Box::new(MemoryCache::new());
        let loaded = load_with_fallback(cache.as_ref(), ResourceKind::Offers, || async {
            Ok(vec![item("o9")])
        })
        .await
        .unwrap();
        assert_eq!(loaded.items.len(), 1);
    }
}
