use async_trait::async_trait;
use serde::{Serialize, de::DeserializeOwned};
use std::fmt::Debug;
use tracing::{debug, warn};

use super::EphemerisSource;
use super::query::{ObserverQuery, VectorsQuery};
use crate::Result;
use crate::cache::PersistentCache;
use crate::models::{ObserverRow, StateVector};

/// Ephemeris source that answers repeated queries from the persistent cache
pub struct CachedSource<S> {
    inner: S,
    cache: Option<PersistentCache>,
}

impl<S: EphemerisSource> CachedSource<S> {
    pub fn new(inner: S, cache: PersistentCache) -> Self {
        Self {
            inner,
            cache: Some(cache),
        }
    }

    /// Pass-through wrapper, used when caching is disabled
    pub fn uncached(inner: S) -> Self {
        Self { inner, cache: None }
    }

    pub fn inner(&self) -> &S {
        &self.inner
    }

    async fn lookup<T: DeserializeOwned + Send + 'static>(&self, key: &str) -> Option<T> {
        let cache = self.cache.as_ref()?;
        match cache.get(key).await {
            Ok(hit) => hit,
            Err(e) => {
                warn!("Cache read failed, querying Horizons instead: {}", e);
                None
            }
        }
    }

    async fn store<T: Serialize + Send + Debug + 'static>(&self, key: &str, value: T) {
        let Some(cache) = &self.cache else {
            return;
        };
        if let Err(e) = cache.put(key, value, cache.jittered_ttl()).await {
            warn!("Cache write failed: {}", e);
        }
    }
}

#[async_trait]
impl<S: EphemerisSource> EphemerisSource for CachedSource<S> {
    async fn vectors(&self, query: &VectorsQuery) -> Result<Vec<StateVector>> {
        let key = query.cache_key();
        if let Some(hit) = self.lookup::<Vec<StateVector>>(&key).await {
            debug!("Vectors for {} served from cache", query.target);
            return Ok(hit);
        }
        let vectors = self.inner.vectors(query).await?;
        self.store(&key, vectors.clone()).await;
        Ok(vectors)
    }

    async fn observer(&self, query: &ObserverQuery) -> Result<Vec<ObserverRow>> {
        let key = query.cache_key();
        if let Some(hit) = self.lookup::<Vec<ObserverRow>>(&key).await {
            debug!("Observer rows for {} served from cache", query.target);
            return Ok(hit);
        }
        let rows = self.inner.observer(query).await?;
        self.store(&key, rows.clone()).await;
        Ok(rows)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::horizons::query::Center;
    use crate::models::{ObservingSite, Target};
    use crate::time::Epochs;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;
    use tempfile::TempDir;

    #[derive(Default)]
    struct CountingSource {
        calls: AtomicUsize,
    }

    #[async_trait]
    impl EphemerisSource for CountingSource {
        async fn vectors(&self, _query: &VectorsQuery) -> Result<Vec<StateVector>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![StateVector::new(2_460_676.5, [-1.5, 2.5, 0.5])])
        }

        async fn observer(&self, _query: &ObserverQuery) -> Result<Vec<ObserverRow>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(Vec::new())
        }
    }

    fn vectors_query(id: &str) -> VectorsQuery {
        VectorsQuery {
            target: Target::small_body(id).unwrap(),
            center: Center::Sun,
            epochs: Epochs::list(vec![2_460_676.5]).unwrap(),
        }
    }

    #[tokio::test]
    async fn test_second_query_hits_cache() {
        let dir = TempDir::new().unwrap();
        let cache = PersistentCache::open(dir.path(), Duration::from_secs(3600)).unwrap();
        let source = CachedSource::new(CountingSource::default(), cache);

        let first = source.vectors(&vectors_query("Ceres")).await.unwrap();
        let second = source.vectors(&vectors_query("Ceres")).await.unwrap();
        assert_eq!(first, second);
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 1);

        source.vectors(&vectors_query("Vesta")).await.unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_uncached_always_forwards() {
        let source = CachedSource::uncached(CountingSource::default());
        let query = ObserverQuery {
            target: Target::major_body("301").unwrap(),
            site: ObservingSite::geocenter(),
            epochs: Epochs::list(vec![2_460_892.9]).unwrap(),
        };
        source.observer(&query).await.unwrap();
        source.observer(&query).await.unwrap();
        assert_eq!(source.inner().calls.load(Ordering::SeqCst), 2);
    }
}
