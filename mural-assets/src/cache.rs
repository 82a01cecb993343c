//! The promise cache.
//!
//! One slot per canonical key. The first requester becomes the slot's
//! owner and runs the load; every concurrent requester for the same key
//! becomes a waiter on the owner's completion channel. Success leaves the
//! settled slot resident as the cache; failure is published to the current
//! waiters and the slot is removed, so the next request is a fresh
//! attempt.
//!
//! Invariant: at most one in-flight load per key at any time, and all
//! requesters of one key observe the identical `Arc`-backed outcome.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;

use crate::error::AssetError;
use crate::value::LoadedAsset;

/// What a settled slot holds.
pub type CachedOutcome = Result<LoadedAsset, Arc<AssetError>>;

type SlotMap = Arc<Mutex<HashMap<String, Slot>>>;

struct Slot {
    rx: watch::Receiver<Option<CachedOutcome>>,
}

/// Result of asking the cache for a key.
pub enum Acquire {
    /// The caller owns the load and must settle the token.
    Owner(OwnerToken),
    /// Someone else is loading; await the channel.
    Waiter(watch::Receiver<Option<CachedOutcome>>),
    /// The slot already settled.
    Settled(CachedOutcome),
}

/// Exclusive right (and obligation) to settle one cache slot.
///
/// Dropping an unsettled token removes the slot and closes the channel,
/// surfacing `InFlightDropped` to any waiters instead of wedging them.
pub struct OwnerToken {
    key: String,
    slots: SlotMap,
    tx: watch::Sender<Option<CachedOutcome>>,
    settled: bool,
}

impl OwnerToken {
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Publish a successful load; the slot stays resident as the cache.
    pub fn fulfill(mut self, asset: LoadedAsset) {
        self.settled = true;
        let _ = self.tx.send(Some(Ok(asset)));
    }

    /// Publish a failure to current waiters and clear the slot so a later
    /// request starts fresh.
    pub fn reject(mut self, error: Arc<AssetError>) {
        self.settled = true;
        self.slots.lock().remove(&self.key);
        let _ = self.tx.send(Some(Err(error)));
    }
}

impl Drop for OwnerToken {
    fn drop(&mut self) {
        if !self.settled {
            log::debug!("in-flight load for '{}' dropped before settling", self.key);
            self.slots.lock().remove(&self.key);
        }
    }
}

/// Keyed map of in-flight and settled loads.
#[derive(Default, Clone)]
pub struct PromiseCache {
    slots: SlotMap,
}

impl PromiseCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the slot for a key: become its owner, join as a waiter, or
    /// read the settled outcome.
    pub fn acquire(&self, key: &str) -> Acquire {
        let mut slots = self.slots.lock();
        if let Some(slot) = slots.get(key) {
            let current = slot.rx.borrow().clone();
            return match current {
                Some(outcome) => Acquire::Settled(outcome),
                None => Acquire::Waiter(slot.rx.clone()),
            };
        }
        let (tx, rx) = watch::channel(None);
        slots.insert(key.to_string(), Slot { rx });
        Acquire::Owner(OwnerToken {
            key: key.to_string(),
            slots: Arc::clone(&self.slots),
            tx,
            settled: false,
        })
    }

    /// The settled outcome for a key, if the slot exists and has settled.
    pub fn peek(&self, key: &str) -> Option<CachedOutcome> {
        self.slots.lock().get(key).and_then(|slot| slot.rx.borrow().clone())
    }

    /// A completion receiver for a pending slot, used to await in-flight
    /// work before unloading.
    pub fn pending(&self, key: &str) -> Option<watch::Receiver<Option<CachedOutcome>>> {
        let slots = self.slots.lock();
        let slot = slots.get(key)?;
        if slot.rx.borrow().is_some() {
            None
        } else {
            Some(slot.rx.clone())
        }
    }

    pub fn contains(&self, key: &str) -> bool {
        self.slots.lock().contains_key(key)
    }

    /// Remove a slot outright. Returns the settled outcome when there was
    /// one.
    pub fn remove(&self, key: &str) -> Option<CachedOutcome> {
        self.slots
            .lock()
            .remove(key)
            .and_then(|slot| slot.rx.borrow().clone())
    }

    pub fn len(&self) -> usize {
        self.slots.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().is_empty()
    }

    /// Drop every slot. Intended for test isolation.
    pub fn reset(&self) {
        self.slots.lock().clear();
    }
}

/// Await a waiter channel until the owner settles it.
pub async fn await_outcome(
    mut rx: watch::Receiver<Option<CachedOutcome>>,
    key: &str,
) -> CachedOutcome {
    match rx.wait_for(Option::is_some).await {
        Ok(value) => value.clone().unwrap_or_else(|| {
            Err(Arc::new(AssetError::InFlightDropped(key.to_string())))
        }),
        Err(_) => Err(Arc::new(AssetError::InFlightDropped(key.to_string()))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::value::{AssetValue, LoadedAsset};

    fn loaded(text: &str) -> LoadedAsset {
        LoadedAsset {
            value: Some(AssetValue::from_text(text)),
            parser: Some("test".to_string()),
        }
    }

    #[tokio::test]
    async fn second_acquire_waits_on_the_first() {
        let cache = PromiseCache::new();
        let Acquire::Owner(owner) = cache.acquire("a.png") else {
            panic!("first acquire must own the slot");
        };
        let Acquire::Waiter(rx) = cache.acquire("a.png") else {
            panic!("second acquire must wait");
        };

        owner.fulfill(loaded("pixels"));
        let outcome = await_outcome(rx, "a.png").await.unwrap();
        assert!(outcome.value.is_some());
    }

    #[tokio::test]
    async fn settled_slots_resolve_immediately_and_share_the_value() {
        let cache = PromiseCache::new();
        let Acquire::Owner(owner) = cache.acquire("a.png") else {
            panic!()
        };
        owner.fulfill(loaded("pixels"));

        let Acquire::Settled(Ok(first)) = cache.acquire("a.png") else {
            panic!("slot must be settled");
        };
        let Acquire::Settled(Ok(second)) = cache.acquire("a.png") else {
            panic!()
        };
        assert!(
            first
                .value
                .as_ref()
                .unwrap()
                .same_allocation(second.value.as_ref().unwrap()),
            "all readers share one allocation"
        );
    }

    #[tokio::test]
    async fn rejection_clears_the_slot_for_a_fresh_attempt() {
        let cache = PromiseCache::new();
        let Acquire::Owner(owner) = cache.acquire("bad.png") else {
            panic!()
        };
        let Acquire::Waiter(rx) = cache.acquire("bad.png") else {
            panic!()
        };

        owner.reject(Arc::new(AssetError::InFlightDropped("bad.png".into())));
        assert!(await_outcome(rx, "bad.png").await.is_err());
        assert!(
            !cache.contains("bad.png"),
            "failed slots must not stay resident"
        );
        assert!(matches!(cache.acquire("bad.png"), Acquire::Owner(_)));
    }

    #[tokio::test]
    async fn dropped_owner_unwedges_waiters() {
        let cache = PromiseCache::new();
        let Acquire::Owner(owner) = cache.acquire("gone.png") else {
            panic!()
        };
        let Acquire::Waiter(rx) = cache.acquire("gone.png") else {
            panic!()
        };

        drop(owner);
        let outcome = await_outcome(rx, "gone.png").await;
        assert!(matches!(
            outcome.unwrap_err().as_ref(),
            AssetError::InFlightDropped(_)
        ));
        assert!(!cache.contains("gone.png"));
    }
}
