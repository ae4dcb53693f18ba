use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Time-windowed memoization for one expensive lookup.
///
/// Holds at most one entry; the lookups it guards take no arguments so
/// there is nothing to key on. Each cached category (GPU, network) gets its
/// own instance, so their staleness clocks never interfere. There is no
/// explicit invalidation; entries only expire by age.
#[derive(Debug, Default)]
pub struct TimedCache<T> {
    entry: Option<(Instant, T)>,
}

impl<T: Clone> TimedCache<T> {
    pub fn new() -> Self {
        Self { entry: None }
    }

    /// The cached value, if one was stored less than `ttl` ago.
    pub fn lookup(&self, now: Instant, ttl: Duration) -> Option<&T> {
        match &self.entry {
            Some((captured_at, value)) if now.duration_since(*captured_at) < ttl => Some(value),
            _ => None,
        }
    }

    pub fn store(&mut self, now: Instant, value: T) {
        self.entry = Some((now, value));
    }

    /// Return the cached value while fresh, otherwise await `fetch` and
    /// cache its result. `fetch` is lazy: it does no work on a cache hit.
    pub async fn get_or_refresh<Fut>(&mut self, ttl: Duration, fetch: Fut) -> T
    where
        Fut: Future<Output = T>,
    {
        let now = Instant::now();
        if let Some(value) = self.lookup(now, ttl) {
            return value.clone();
        }
        let value = fetch.await;
        self.store(Instant::now(), value.clone());
        value
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TTL: Duration = Duration::from_millis(5000);

    #[test]
    fn expires_by_age_only() {
        let start = Instant::now();
        let mut cache = TimedCache::new();
        cache.store(start, 7u32);
        assert_eq!(cache.lookup(start + Duration::from_millis(1000), TTL), Some(&7));
        assert_eq!(cache.lookup(start + Duration::from_millis(4999), TTL), Some(&7));
        assert_eq!(cache.lookup(start + Duration::from_millis(5000), TTL), None);
        assert_eq!(cache.lookup(start + Duration::from_millis(6000), TTL), None);
    }

    #[tokio::test(start_paused = true)]
    async fn fresh_hit_skips_the_fetch() {
        let mut cache = TimedCache::new();
        let mut fetches = 0;
        let v = cache
            .get_or_refresh(TTL, async {
                fetches += 1;
                1u32
            })
            .await;
        assert_eq!((v, fetches), (1, 1));

        tokio::time::advance(Duration::from_millis(1000)).await;
        let v = cache
            .get_or_refresh(TTL, async {
                fetches += 1;
                2u32
            })
            .await;
        // Second call 1000ms later hits the cache: one fetch in total.
        assert_eq!((v, fetches), (1, 1));
    }

    #[tokio::test(start_paused = true)]
    async fn stale_entry_refetches() {
        let mut cache = TimedCache::new();
        let mut fetches = 0;
        cache
            .get_or_refresh(TTL, async {
                fetches += 1;
                1u32
            })
            .await;
        tokio::time::advance(Duration::from_millis(6000)).await;
        let v = cache
            .get_or_refresh(TTL, async {
                fetches += 1;
                2u32
            })
            .await;
        assert_eq!((v, fetches), (2, 2));
    }

    #[tokio::test(start_paused = true)]
    async fn categories_age_independently() {
        let mut gpu = TimedCache::new();
        let mut net = TimedCache::new();

        gpu.get_or_refresh(TTL, async { "gpu-1" }).await;
        tokio::time::advance(Duration::from_millis(4000)).await;
        net.get_or_refresh(TTL, async { "net-1" }).await;

        // 2000ms later the GPU entry (age 6000ms) is stale but the network
        // entry (age 2000ms) is not; refreshing GPU must not touch it.
        tokio::time::advance(Duration::from_millis(2000)).await;
        let g = gpu.get_or_refresh(TTL, async { "gpu-2" }).await;
        let n = net.get_or_refresh(TTL, async { panic!("network refetched") }).await;
        assert_eq!(g, "gpu-2");
        assert_eq!(n, "net-1");
    }
}
