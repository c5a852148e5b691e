use std::time::{Duration, Instant};

/// Last health probe result and when it was taken.
#[derive(Debug, Default)]
pub(crate) struct HealthCache {
    checked_at: Option<Instant>,
    healthy: bool
}

impl HealthCache {
    /// The cached status if it is younger than `ttl`.
    pub(crate) fn fresh(&self, ttl: Duration) -> Option<bool> {
        self.checked_at
            .filter(|checked_at| checked_at.elapsed() < ttl)
            .map(|_| self.healthy)
    }

    /// Status of the most recent probe, stale or not; false before any probe.
    pub(crate) fn last_known(&self) -> bool {
        self.healthy
    }

    pub(crate) fn record(&mut self, healthy: bool) {
        self.checked_at = Some(Instant::now());
        self.healthy = healthy;
    }

    /// Force the next check to probe again. The last status is kept.
    pub(crate) fn invalidate(&mut self) {
        self.checked_at = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fresh_within_ttl() {
        let mut cache = HealthCache::default();
        assert_eq!(cache.fresh(Duration::from_secs(5)), None);
        assert!(!cache.last_known());

        cache.record(true);
        assert_eq!(cache.fresh(Duration::from_secs(5)), Some(true));
        assert_eq!(cache.fresh(Duration::ZERO), None);
        assert!(cache.last_known());
    }

    #[test]
    fn test_invalidate_keeps_last_status() {
        let mut cache = HealthCache::default();
        cache.record(true);
        cache.invalidate();
        assert_eq!(cache.fresh(Duration::from_secs(5)), None);
        assert!(cache.last_known());
    }
}
