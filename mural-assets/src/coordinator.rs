//! The load coordinator.
//!
//! Per descriptor: resolve the canonical key, consult the promise cache
//! (dedup — concurrent requests share one in-flight load), select a
//! parser, run its `load`, run every chainable parser's `parse` pass over
//! the result, and settle the cache slot. Failures go through the
//! configured `throw`/`skip`/`retry` policy; batch calls dispatch their
//! assets concurrently and report weighted progress in completion order.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::task::JoinSet;

use mural_config::{AssetSettings, LoadStrategy};
use mural_core::Platform;

use crate::cache::{self, Acquire, PromiseCache};
use crate::decode::DecodePool;
use crate::descriptor::{AssetDescriptor, resolve_key};
use crate::error::AssetError;
use crate::options::{LoadOptions, ResolvedOptions};
use crate::parser::{AssetParser, LoadContext};
use crate::registry::ParserRegistry;
use crate::value::{AssetValue, LoadedAsset};

/// Terminal outcome of one asset under a failure policy.
enum AssetOutcome {
    /// Loaded, or deliberately resolved to nothing (no parser matched).
    Loaded(Option<AssetValue>),
    /// Failed under `Skip`: reported, omitted from the result map.
    Skipped,
    Failed(AssetError),
}

struct Inner {
    registry: Mutex<ParserRegistry>,
    cache: PromiseCache,
    context: LoadContext,
    base_path: Mutex<String>,
    settings: AssetSettings,
    options: Mutex<LoadOptions>,
}

/// Parser-pluggable, promise-deduplicated asset loader.
///
/// Cheap to clone; clones share the registry, promise cache, and platform
/// context, which is how the background prefetcher and the foreground
/// loader avoid duplicating work.
#[derive(Clone)]
pub struct LoadCoordinator {
    inner: Arc<Inner>,
}

impl LoadCoordinator {
    pub fn new(platform: Arc<dyn Platform>, settings: AssetSettings) -> Self {
        let decode = Arc::new(DecodePool::new(settings.decode_workers));
        Self {
            inner: Arc::new(Inner {
                registry: Mutex::new(ParserRegistry::new()),
                cache: PromiseCache::new(),
                context: LoadContext { platform, decode },
                base_path: Mutex::new(String::new()),
                settings,
                options: Mutex::new(LoadOptions::default()),
            }),
        }
    }

    /// Base URL or path relative sources resolve against.
    pub fn set_base_path(&self, base: impl Into<String>) {
        *self.inner.base_path.lock() = base.into();
    }

    /// Instance-level default options, overridden per call site.
    pub fn set_default_options(&self, options: LoadOptions) {
        *self.inner.options.lock() = options;
    }

    pub fn register_parser(&self, parser: Arc<dyn AssetParser>) {
        self.inner.registry.lock().register(parser);
    }

    pub fn unregister_parser(&self, name: &str) -> bool {
        self.inner.registry.lock().unregister(name)
    }

    /// The shared promise cache, exposed for inspection and test
    /// isolation (`reset`).
    pub fn promise_cache(&self) -> &PromiseCache {
        &self.inner.cache
    }

    /// Resolve a source to its canonical cache key.
    pub fn resolve(&self, src: &str) -> String {
        resolve_key(src, &self.inner.base_path.lock())
    }

    /// Load a batch of assets. The result map is keyed by each
    /// descriptor's original `src`; assets skipped under the `Skip`
    /// strategy leave a hole, assets with no matching parser map to
    /// `None`. The first `Throw`-policy failure rejects the whole call —
    /// other assets in the batch still settle their own cache slots.
    pub async fn load<I, D>(
        &self,
        descriptors: I,
        options: Option<LoadOptions>,
    ) -> Result<HashMap<String, Option<AssetValue>>, AssetError>
    where
        I: IntoIterator<Item = D>,
        D: Into<AssetDescriptor>,
    {
        let descriptors: Vec<AssetDescriptor> =
            descriptors.into_iter().map(Into::into).collect();
        if descriptors.is_empty() {
            return Ok(HashMap::new());
        }

        let opts = ResolvedOptions::merge(
            options.as_ref(),
            &self.inner.options.lock().clone(),
            &self.inner.settings,
        );
        let total_weight: f32 = descriptors.iter().map(|d| d.progress_size).sum();
        let completed = Arc::new(Mutex::new(0.0_f32));

        let mut join_set = JoinSet::new();
        for descriptor in descriptors {
            let this = self.clone();
            let opts = opts.clone();
            let completed = Arc::clone(&completed);
            join_set.spawn(async move {
                let src = descriptor.src.clone();
                let weight = descriptor.progress_size;
                let outcome = this.load_with_policy(&descriptor, &opts).await;
                if let Some(on_progress) = &opts.on_progress {
                    let mut done = completed.lock();
                    *done += weight;
                    on_progress((*done / total_weight).min(1.0));
                }
                (src, outcome)
            });
        }

        let mut results = HashMap::new();
        let mut first_error = None;
        while let Some(joined) = join_set.join_next().await {
            match joined {
                Ok((src, AssetOutcome::Loaded(value))) => {
                    results.insert(src, value);
                }
                Ok((_, AssetOutcome::Skipped)) => {}
                Ok((_, AssetOutcome::Failed(error))) => {
                    if first_error.is_none() {
                        first_error = Some(error);
                    }
                }
                Err(join_error) => {
                    if first_error.is_none() {
                        first_error = Some(AssetError::WorkerJoin(join_error.to_string()));
                    }
                }
            }
        }
        match first_error {
            Some(error) => Err(error),
            None => Ok(results),
        }
    }

    /// Load a single asset. Skipped assets resolve to `None`.
    pub async fn load_one(
        &self,
        descriptor: impl Into<AssetDescriptor>,
        options: Option<LoadOptions>,
    ) -> Result<Option<AssetValue>, AssetError> {
        let descriptor = descriptor.into();
        let src = descriptor.src.clone();
        let mut results = self.load([descriptor], options).await?;
        Ok(results.remove(&src).flatten())
    }

    /// Evict assets from the cache, invoking the owning parser's `unload`
    /// hook. In-flight loads are awaited first — never aborted mid-run.
    pub async fn unload<I, D>(&self, descriptors: I)
    where
        I: IntoIterator<Item = D>,
        D: Into<AssetDescriptor>,
    {
        for descriptor in descriptors {
            let descriptor = descriptor.into();
            let key = self.resolve(&descriptor.src);
            if let Some(rx) = self.inner.cache.pending(&key) {
                let _ = cache::await_outcome(rx, &key).await;
            }
            let Some(Ok(asset)) = self.inner.cache.remove(&key) else {
                continue;
            };
            log::debug!("unloaded '{key}'");
            let Some(value) = &asset.value else { continue };
            let Some(parser_name) = &asset.parser else {
                continue;
            };
            let parser = self.inner.registry.lock().lookup(parser_name);
            if let Some(parser) = parser
                && parser.capabilities().unload
            {
                parser.unload(value, &descriptor).await;
            }
        }
    }

    /// Clear every cached asset without running unload hooks. Intended
    /// for test isolation.
    pub fn reset(&self) {
        self.inner.cache.reset();
    }

    /// Run one asset through the cache and the failure policy.
    async fn load_with_policy(
        &self,
        descriptor: &AssetDescriptor,
        opts: &ResolvedOptions,
    ) -> AssetOutcome {
        let key = self.resolve(&descriptor.src);
        let mut attempt: u32 = 0;
        loop {
            match self.inner.cache.acquire(&key) {
                Acquire::Settled(Ok(asset)) => return AssetOutcome::Loaded(asset.value),
                Acquire::Settled(Err(shared)) => {
                    return self.settle_failure(shared, &key, opts);
                }
                Acquire::Waiter(rx) => {
                    // The owner applies its own retry policy before
                    // publishing; a shared rejection is terminal here.
                    return match cache::await_outcome(rx, &key).await {
                        Ok(asset) => AssetOutcome::Loaded(asset.value),
                        Err(shared) => self.settle_failure(shared, &key, opts),
                    };
                }
                Acquire::Owner(token) => match self.run_pipeline(&key, descriptor).await {
                    Ok(asset) => {
                        let value = asset.value.clone();
                        token.fulfill(asset);
                        return AssetOutcome::Loaded(value);
                    }
                    Err(error) => {
                        let error = error.with_url(&key);
                        if opts.strategy == LoadStrategy::Retry && attempt < opts.retry_count {
                            attempt += 1;
                            if let Some(on_error) = &opts.on_error {
                                on_error(&error, &key);
                            }
                            log::warn!(
                                "load failed for '{key}' (attempt {attempt}/{}), \
                                 retrying in {:?}: {error}",
                                opts.retry_count,
                                opts.retry_delay
                            );
                            // Dropping the token clears the cache entry, so
                            // the retry is a fresh attempt rather than a
                            // replay of the failed one.
                            drop(token);
                            tokio::time::sleep(opts.retry_delay).await;
                            continue;
                        }
                        let shared = Arc::new(error);
                        token.reject(Arc::clone(&shared));
                        return self.settle_failure(shared, &key, opts);
                    }
                },
            }
        }
    }

    /// Apply the failure strategy to a terminal error.
    fn settle_failure(
        &self,
        shared: Arc<AssetError>,
        key: &str,
        opts: &ResolvedOptions,
    ) -> AssetOutcome {
        match opts.strategy {
            LoadStrategy::Skip => {
                if let Some(on_error) = &opts.on_error {
                    on_error(&shared, key);
                }
                log::warn!("skipping failed asset '{key}': {shared}");
                AssetOutcome::Skipped
            }
            LoadStrategy::Throw => AssetOutcome::Failed(AssetError::from_shared(shared)),
            LoadStrategy::Retry => {
                // Exhausted retries behave like `Throw`, but the failure
                // is still reported.
                if let Some(on_error) = &opts.on_error {
                    on_error(&shared, key);
                }
                AssetOutcome::Failed(AssetError::from_shared(shared))
            }
        }
    }

    /// One fresh load attempt: parser selection, `load`, chained `parse`
    /// passes.
    async fn run_pipeline(
        &self,
        key: &str,
        descriptor: &AssetDescriptor,
    ) -> Result<LoadedAsset, AssetError> {
        let parsers = self.inner.registry.lock().ordered();

        let selected: Option<Arc<dyn AssetParser>> = match &descriptor.parser {
            Some(name) => {
                let found = self.inner.registry.lock().lookup(name);
                if found.is_none() {
                    log::warn!(
                        "explicit parser '{name}' for '{key}' is not registered; \
                         asset resolves to nothing"
                    );
                    return Ok(LoadedAsset::none());
                }
                found
            }
            None => parsers
                .iter()
                .find(|p| p.capabilities().selectable() && p.test(key, descriptor))
                .cloned(),
        };

        let Some(parser) = selected else {
            log::warn!("no parser matched '{key}'; asset resolves to nothing");
            return Ok(LoadedAsset::none());
        };

        let mut value = parser.load(key, descriptor, &self.inner.context).await?;

        // Chained parse passes: any registered parser may transform the
        // already-loaded value, in registration order.
        for candidate in &parsers {
            if candidate.capabilities().chainable()
                && candidate.test_parse(&value, descriptor).await
            {
                log::trace!("parser '{}' transforming '{key}'", candidate.name());
                value = candidate
                    .parse(value, descriptor, &self.inner.context)
                    .await?;
            }
        }

        Ok(LoadedAsset {
            value: Some(value),
            parser: Some(parser.name().to_string()),
        })
    }
}
