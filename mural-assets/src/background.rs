//! Low-priority background prefetching.
//!
//! The prefetcher holds a queue of descriptors and feeds them into the
//! shared `LoadCoordinator` one batch at a time (`max_concurrent` is fixed
//! at 1), so background work never floods the pipeline. Because the
//! coordinator's promise cache is shared, a foreground request for a
//! queued asset is satisfied by the same in-flight or resolved slot —
//! no duplicate work in either direction, and the foreground is never
//! blocked behind the queue.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use parking_lot::Mutex;

use crate::coordinator::LoadCoordinator;
use crate::descriptor::AssetDescriptor;

const MAX_CONCURRENT: usize = 1;

struct Inner {
    coordinator: LoadCoordinator,
    /// Descriptors awaiting load. Drained from the end: the most recently
    /// added asset loads first.
    queue: Mutex<Vec<AssetDescriptor>>,
    active: AtomicBool,
    is_loading: AtomicBool,
}

/// Sequential background prefetcher over a shared coordinator.
#[derive(Clone)]
pub struct BackgroundPrefetcher {
    inner: Arc<Inner>,
}

impl BackgroundPrefetcher {
    pub fn new(coordinator: LoadCoordinator) -> Self {
        Self {
            inner: Arc::new(Inner {
                coordinator,
                queue: Mutex::new(Vec::new()),
                active: AtomicBool::new(true),
                is_loading: AtomicBool::new(false),
            }),
        }
    }

    /// Append descriptors to the queue and start draining if the
    /// prefetcher is active and idle.
    pub fn add<I, D>(&self, descriptors: I)
    where
        I: IntoIterator<Item = D>,
        D: Into<AssetDescriptor>,
    {
        self.inner
            .queue
            .lock()
            .extend(descriptors.into_iter().map(Into::into));
        self.maybe_drain();
    }

    /// Whether the prefetcher is allowed to drain. Reading never blocks.
    pub fn active(&self) -> bool {
        self.inner.active.load(Ordering::SeqCst)
    }

    /// Pause or resume draining. Pausing loses no queued work; resuming
    /// an idle prefetcher with queued work starts a drain cycle.
    pub fn set_active(&self, active: bool) {
        self.inner.active.store(active, Ordering::SeqCst);
        if active {
            self.maybe_drain();
        }
    }

    /// Whether a drain cycle is currently in flight.
    pub fn is_loading(&self) -> bool {
        self.inner.is_loading.load(Ordering::SeqCst)
    }

    /// Number of descriptors still queued.
    pub fn queued(&self) -> usize {
        self.inner.queue.lock().len()
    }

    fn maybe_drain(&self) {
        if !self.active() {
            return;
        }
        if self.inner.is_loading.swap(true, Ordering::SeqCst) {
            return;
        }
        let this = self.clone();
        tokio::spawn(async move {
            this.drain().await;
        });
    }

    /// Drain the queue one batch at a time until it is empty, the
    /// prefetcher is deactivated, or a load fails.
    ///
    /// Failures stop the drain chain and leave the rest of the queue in
    /// place — the behavior callers opt out of by configuring a `skip`
    /// strategy or an `on_error` handler on the coordinator. The error
    /// itself is only logged here; background loading is best-effort.
    async fn drain(&self) {
        loop {
            if !self.active() {
                break;
            }
            let batch: Vec<AssetDescriptor> = {
                let mut queue = self.inner.queue.lock();
                let take = queue.len().min(MAX_CONCURRENT);
                if take == 0 {
                    break;
                }
                let at = queue.len() - take;
                queue.split_off(at)
            };
            if let Err(error) = self.inner.coordinator.load(batch, None).await {
                log::warn!("background load failed, stopping drain: {error}");
                break;
            }
        }
        self.inner.is_loading.store(false, Ordering::SeqCst);

        // An add() racing the flag flip above would have seen is_loading
        // and not spawned; pick its work up now.
        if self.active() && !self.inner.queue.lock().is_empty() {
            self.maybe_drain();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{AssetParser, LoadContext, ParserCaps};
    use crate::value::AssetValue;
    use async_trait::async_trait;
    use mural_config::AssetSettings;
    use mural_core::{CoreError, FetchedData, Platform, Surface};
    use std::sync::atomic::AtomicUsize;
    use std::time::Duration;

    struct NullPlatform;

    #[async_trait]
    impl Platform for NullPlatform {
        async fn fetch(&self, _url: &str) -> Result<FetchedData, CoreError> {
            Ok(FetchedData::new(Vec::new()))
        }

        fn create_surface(
            &self,
            width: u32,
            height: u32,
        ) -> Result<Box<dyn Surface>, CoreError> {
            Err(CoreError::SurfaceCreation {
                width,
                height,
                reason: "not supported in this test".to_string(),
            })
        }
    }

    /// Parser that records the peak number of concurrently running loads.
    struct ConcurrencyProbe {
        current: AtomicUsize,
        peak: AtomicUsize,
        calls: AtomicUsize,
    }

    #[async_trait]
    impl AssetParser for ConcurrencyProbe {
        fn name(&self) -> &str {
            "probe"
        }

        fn capabilities(&self) -> ParserCaps {
            ParserCaps::loader()
        }

        fn test(&self, _url: &str, _descriptor: &AssetDescriptor) -> bool {
            true
        }

        async fn load(
            &self,
            url: &str,
            _descriptor: &AssetDescriptor,
            _ctx: &LoadContext,
        ) -> Result<AssetValue, crate::AssetError> {
            let now = self.current.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak.fetch_max(now, Ordering::SeqCst);
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_millis(5)).await;
            self.current.fetch_sub(1, Ordering::SeqCst);
            Ok(AssetValue::from_text(url.to_string()))
        }
    }

    fn probe_setup() -> (LoadCoordinator, Arc<ConcurrencyProbe>) {
        let coordinator =
            LoadCoordinator::new(Arc::new(NullPlatform), AssetSettings::default());
        let probe = Arc::new(ConcurrencyProbe {
            current: AtomicUsize::new(0),
            peak: AtomicUsize::new(0),
            calls: AtomicUsize::new(0),
        });
        coordinator.register_parser(Arc::clone(&probe) as Arc<dyn AssetParser>);
        (coordinator, probe)
    }

    async fn wait_idle(prefetcher: &BackgroundPrefetcher) {
        for _ in 0..400 {
            if !prefetcher.is_loading() && prefetcher.queued() == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        panic!("prefetcher never went idle");
    }

    #[tokio::test]
    async fn drains_one_at_a_time() {
        let (coordinator, probe) = probe_setup();
        let prefetcher = BackgroundPrefetcher::new(coordinator);
        prefetcher.add(["a.txt", "b.txt", "c.txt", "d.txt", "e.txt"]);
        wait_idle(&prefetcher).await;

        assert_eq!(probe.calls.load(Ordering::SeqCst), 5);
        assert_eq!(
            probe.peak.load(Ordering::SeqCst),
            1,
            "background loads must never overlap"
        );
    }

    #[tokio::test]
    async fn most_recently_added_loads_first() {
        let (coordinator, _probe) = probe_setup();
        let prefetcher = BackgroundPrefetcher::new(coordinator.clone());
        prefetcher.set_active(false);
        prefetcher.add(["first.txt", "second.txt"]);

        prefetcher.set_active(true);
        // Poll until the newest item resolves; the older one should still
        // be pending or just behind it.
        for _ in 0..400 {
            if coordinator.promise_cache().contains("second.txt") {
                break;
            }
            tokio::time::sleep(Duration::from_millis(2)).await;
        }
        assert!(
            coordinator.promise_cache().contains("second.txt"),
            "LIFO drain must start with the newest descriptor"
        );
        wait_idle(&prefetcher).await;
        assert!(coordinator.promise_cache().contains("first.txt"));
    }

    #[tokio::test]
    async fn pausing_keeps_queued_work() {
        let (coordinator, probe) = probe_setup();
        let prefetcher = BackgroundPrefetcher::new(coordinator);
        prefetcher.set_active(false);
        prefetcher.add(["a.txt", "b.txt"]);
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 0, "paused means idle");
        assert_eq!(prefetcher.queued(), 2);

        prefetcher.set_active(true);
        wait_idle(&prefetcher).await;
        assert_eq!(probe.calls.load(Ordering::SeqCst), 2);
    }
}
