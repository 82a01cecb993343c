//! Bounded worker pool for CPU-bound image decode.
//!
//! Decoding is the pipeline's only true parallelism: decode jobs run on
//! blocking worker threads behind a semaphore sized to the hardware
//! parallelism (capped at 4). Everything else in the pipeline is
//! cooperative async interleaving.

use std::sync::Arc;

use image::RgbaImage;
use tokio::sync::Semaphore;

use crate::error::AssetError;

/// Semaphore-bounded decode offload.
pub struct DecodePool {
    semaphore: Arc<Semaphore>,
    workers: usize,
}

impl DecodePool {
    /// `workers == 0` selects the hardware parallelism, capped at 4.
    pub fn new(workers: usize) -> Self {
        let workers = if workers == 0 {
            std::thread::available_parallelism().map_or(4, |p| p.get().min(4))
        } else {
            workers
        };
        Self {
            semaphore: Arc::new(Semaphore::new(workers)),
            workers,
        }
    }

    pub fn workers(&self) -> usize {
        self.workers
    }

    /// Decode image bytes off the async executor.
    pub async fn decode(&self, bytes: Arc<Vec<u8>>) -> Result<RgbaImage, AssetError> {
        let permit = Arc::clone(&self.semaphore)
            .acquire_owned()
            .await
            .map_err(|e| AssetError::WorkerJoin(e.to_string()))?;
        let handle = tokio::task::spawn_blocking(move || {
            let _permit = permit;
            image::load_from_memory(&bytes).map(|decoded| decoded.to_rgba8())
        });
        handle
            .await
            .map_err(|e| AssetError::WorkerJoin(e.to_string()))?
            .map_err(AssetError::from)
    }
}

impl Default for DecodePool {
    fn default() -> Self {
        Self::new(0)
    }
}
