//! Planet detail-asset loading with per-planet deduplication.
//!
//! An [`AssetLoad`] is the in-flight handle of one load; it resolves on some
//! later frame when its sender (usually a worker thread) delivers a result.
//! [`AssetPreloader`] keys those handles by planet so that selecting the same
//! planet repeatedly, approaching it, and activating its surface all share a
//! single load. Results are drained once per frame on the simulation thread.

use std::sync::Arc;

use crossbeam_channel::{Receiver, Sender, TryRecvError, bounded};
use rustc_hash::FxHashMap;
use tracing::{debug, warn};

use crate::registry::PlanetModule;
use crate::state::PlanetId;

/// Planet-specific detail data consumed by surface descriptor factories.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DetailAssets {
    /// Asset pack identifier, e.g. `"mars/detail"`.
    pub pack: String,
    /// Height samples used to refine the terrain.
    pub height_samples: Vec<f32>,
    /// Texture names provided by the pack.
    pub textures: Vec<String>,
}

/// Why a detail-asset load produced nothing.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum AssetLoadError {
    /// The loader reported a failure.
    #[error("asset load failed: {0}")]
    Failed(String),
    /// The loader dropped its sender without delivering a result.
    #[error("asset loader exited without a result")]
    Abandoned,
    /// The worker thread could not be started.
    #[error("failed to spawn asset worker: {0}")]
    Spawn(String),
}

type LoadResult = Result<DetailAssets, AssetLoadError>;

/// Completion side of an [`AssetLoad`].
pub struct AssetLoadSender {
    sender: Sender<LoadResult>,
}

impl AssetLoadSender {
    /// Deliver the load result. Later calls are ignored.
    pub fn complete(self, result: Result<DetailAssets, AssetLoadError>) {
        let _ = self.sender.try_send(result);
    }
}

/// In-flight handle of one detail-asset load.
pub struct AssetLoad {
    receiver: Receiver<LoadResult>,
}

impl AssetLoad {
    /// A load completed by whoever holds the returned sender.
    pub fn channel() -> (AssetLoadSender, Self) {
        let (sender, receiver) = bounded(1);
        (AssetLoadSender { sender }, Self { receiver })
    }

    /// A load that is already finished.
    pub fn ready(result: Result<DetailAssets, AssetLoadError>) -> Self {
        let (sender, load) = Self::channel();
        sender.complete(result);
        load
    }

    /// Run `load` on a named worker thread.
    pub fn spawn<F>(name: &str, load: F) -> Self
    where
        F: FnOnce() -> Result<DetailAssets, AssetLoadError> + Send + 'static,
    {
        let (sender, handle) = Self::channel();
        let spawned = std::thread::Builder::new()
            .name(format!("asset-load-{name}"))
            .spawn(move || sender.complete(load()));
        match spawned {
            Ok(_) => handle,
            Err(e) => Self::ready(Err(AssetLoadError::Spawn(e.to_string()))),
        }
    }

    /// Take the result if it has arrived.
    fn try_take(&self) -> Option<LoadResult> {
        match self.receiver.try_recv() {
            Ok(result) => Some(result),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(AssetLoadError::Abandoned)),
        }
    }
}

/// Where a planet's detail assets stand.
#[derive(Clone, Debug, PartialEq)]
pub enum PreloadStatus {
    /// No load was requested (or the planet has no detail assets).
    NotRequested,
    /// A load is in flight.
    Pending,
    /// Assets are available.
    Ready,
    /// The load failed; activation proceeds without assets.
    Failed(AssetLoadError),
}

enum PreloadSlot {
    Pending(AssetLoad),
    Ready(Arc<DetailAssets>),
    Failed(AssetLoadError),
}

/// Pending-load map keyed by planet.
#[derive(Default)]
pub struct AssetPreloader {
    slots: FxHashMap<PlanetId, PreloadSlot>,
}

impl AssetPreloader {
    /// Create an empty preloader.
    pub fn new() -> Self {
        Self::default()
    }

    /// Start loading `module`'s detail assets unless a load already exists.
    ///
    /// Returns `true` only when a new load was started.
    pub fn request(&mut self, planet: &PlanetId, module: &PlanetModule) -> bool {
        let Some(loader) = module.detail_assets() else {
            return false;
        };
        if self.slots.contains_key(planet) {
            debug!(%planet, "detail assets already requested");
            return false;
        }
        debug!(%planet, "preloading detail assets");
        let load = loader.load_detail_assets(planet);
        self.slots.insert(planet.clone(), PreloadSlot::Pending(load));
        true
    }

    /// Drain finished loads. Call once per frame.
    pub fn poll(&mut self) {
        for (planet, slot) in self.slots.iter_mut() {
            let PreloadSlot::Pending(load) = slot else {
                continue;
            };
            match load.try_take() {
                None => {}
                Some(Ok(assets)) => {
                    debug!(%planet, pack = %assets.pack, "detail assets ready");
                    *slot = PreloadSlot::Ready(Arc::new(assets));
                }
                Some(Err(e)) => {
                    warn!(%planet, error = %e, "detail asset load failed");
                    *slot = PreloadSlot::Failed(e);
                }
            }
        }
    }

    /// Status of `planet`'s load.
    pub fn status(&self, planet: &PlanetId) -> PreloadStatus {
        match self.slots.get(planet) {
            None => PreloadStatus::NotRequested,
            Some(PreloadSlot::Pending(_)) => PreloadStatus::Pending,
            Some(PreloadSlot::Ready(_)) => PreloadStatus::Ready,
            Some(PreloadSlot::Failed(e)) => PreloadStatus::Failed(e.clone()),
        }
    }

    /// Loaded assets for `planet`, if ready.
    pub fn assets(&self, planet: &PlanetId) -> Option<Arc<DetailAssets>> {
        match self.slots.get(planet) {
            Some(PreloadSlot::Ready(assets)) => Some(Arc::clone(assets)),
            _ => None,
        }
    }

    /// Drop a failed slot so the next request retries. Ready and pending
    /// slots are kept.
    pub fn forget_failure(&mut self, planet: &PlanetId) {
        if matches!(self.slots.get(planet), Some(PreloadSlot::Failed(_))) {
            self.slots.remove(planet);
        }
    }

    /// Number of loads still in flight.
    pub fn pending_count(&self) -> usize {
        self.slots
            .values()
            .filter(|s| matches!(s, PreloadSlot::Pending(_)))
            .count()
    }

    /// Drop every slot, abandoning in-flight loads.
    pub fn clear(&mut self) {
        self.slots.clear();
    }
}
