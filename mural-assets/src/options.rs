//! Per-load options and their merge rules.
//!
//! Options merge in priority order: call site over coordinator instance
//! over the configured defaults. Only explicitly-set fields override.

use std::sync::Arc;
use std::time::Duration;

use mural_config::{AssetSettings, LoadStrategy};

use crate::error::AssetError;

/// Progress callback: receives `completed_weight / total_weight`.
pub type ProgressFn = Arc<dyn Fn(f32) + Send + Sync>;

/// Error callback: receives the failure and the resolved key it belongs
/// to.
pub type ErrorFn = Arc<dyn Fn(&AssetError, &str) + Send + Sync>;

/// Partially-specified load options; unset fields fall through to the
/// next layer of the merge.
#[derive(Clone, Default)]
pub struct LoadOptions {
    pub on_progress: Option<ProgressFn>,
    pub on_error: Option<ErrorFn>,
    pub strategy: Option<LoadStrategy>,
    pub retry_count: Option<u32>,
    pub retry_delay: Option<Duration>,
}

impl LoadOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress(mut self, f: impl Fn(f32) + Send + Sync + 'static) -> Self {
        self.on_progress = Some(Arc::new(f));
        self
    }

    pub fn on_error(mut self, f: impl Fn(&AssetError, &str) + Send + Sync + 'static) -> Self {
        self.on_error = Some(Arc::new(f));
        self
    }

    pub fn strategy(mut self, strategy: LoadStrategy) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn retry_count(mut self, retry_count: u32) -> Self {
        self.retry_count = Some(retry_count);
        self
    }

    pub fn retry_delay(mut self, retry_delay: Duration) -> Self {
        self.retry_delay = Some(retry_delay);
        self
    }
}

/// Fully-resolved options a load actually runs with.
#[derive(Clone)]
pub struct ResolvedOptions {
    pub on_progress: Option<ProgressFn>,
    pub on_error: Option<ErrorFn>,
    pub strategy: LoadStrategy,
    pub retry_count: u32,
    pub retry_delay: Duration,
}

impl ResolvedOptions {
    /// Merge call-site options over instance options over configured
    /// defaults.
    pub fn merge(
        call: Option<&LoadOptions>,
        instance: &LoadOptions,
        defaults: &AssetSettings,
    ) -> Self {
        let strategy = call
            .and_then(|o| o.strategy)
            .or(instance.strategy)
            .unwrap_or(defaults.strategy);

        let retry_count = call
            .and_then(|o| o.retry_count)
            .or(instance.retry_count)
            .unwrap_or(defaults.retry_count);

        let retry_delay = call
            .and_then(|o| o.retry_delay)
            .or(instance.retry_delay)
            .unwrap_or(Duration::from_millis(defaults.retry_delay_ms));

        let on_progress = call
            .and_then(|o| o.on_progress.clone())
            .or_else(|| instance.on_progress.clone());

        let on_error = call
            .and_then(|o| o.on_error.clone())
            .or_else(|| instance.on_error.clone());

        Self {
            on_progress,
            on_error,
            strategy,
            retry_count,
            retry_delay,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn call_site_beats_instance_beats_defaults() {
        let defaults = AssetSettings::default();
        let instance = LoadOptions::new()
            .strategy(LoadStrategy::Skip)
            .retry_count(7);
        let call = LoadOptions::new().strategy(LoadStrategy::Retry);

        let resolved = ResolvedOptions::merge(Some(&call), &instance, &defaults);
        assert_eq!(resolved.strategy, LoadStrategy::Retry, "call site wins");
        assert_eq!(resolved.retry_count, 7, "instance fills unset call fields");
        assert_eq!(
            resolved.retry_delay,
            Duration::from_millis(defaults.retry_delay_ms),
            "defaults fill the rest"
        );
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let defaults = AssetSettings::default();
        let resolved = ResolvedOptions::merge(None, &LoadOptions::new(), &defaults);
        assert_eq!(resolved.strategy, defaults.strategy);
        assert_eq!(resolved.retry_count, defaults.retry_count);
        assert!(resolved.on_progress.is_none());
    }
}
