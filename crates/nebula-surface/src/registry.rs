//! Planet registry: metadata plus optional loading capabilities per planet.

use nebula_config::{PlanetEntry, SurfaceDescriptor};
use rustc_hash::FxHashMap;

use crate::assets::{AssetLoad, DetailAssets};
use crate::state::PlanetId;

/// Static facts about a planet.
#[derive(Clone, Debug, PartialEq)]
pub struct PlanetMetadata {
    /// Registry key.
    pub id: PlanetId,
    /// Display name.
    pub name: String,
    /// Radius in world units.
    pub radius_m: f64,
}

impl PlanetMetadata {
    /// Metadata with a default radius.
    pub fn new(id: impl Into<PlanetId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            radius_m: 1_000.0,
        }
    }
}

/// Starts a planet's detail-asset load.
pub trait DetailAssetLoader {
    /// Begin loading; the returned handle resolves on a later frame.
    fn load_detail_assets(&self, planet: &PlanetId) -> AssetLoad;
}

impl<F> DetailAssetLoader for F
where
    F: Fn(&PlanetId) -> AssetLoad,
{
    fn load_detail_assets(&self, planet: &PlanetId) -> AssetLoad {
        self(planet)
    }
}

/// Inputs available when building a surface descriptor.
pub struct DescriptorContext<'a> {
    /// Planet being activated.
    pub metadata: &'a PlanetMetadata,
    /// Detail assets, when they loaded.
    pub assets: Option<&'a DetailAssets>,
}

/// Builds a planet's surface descriptor.
pub trait SurfaceDescriptorFactory {
    /// `None` means the planet has no surface of its own.
    fn create_surface_descriptor(&self, ctx: &DescriptorContext<'_>) -> Option<SurfaceDescriptor>;
}

impl<F> SurfaceDescriptorFactory for F
where
    F: Fn(&DescriptorContext<'_>) -> Option<SurfaceDescriptor>,
{
    fn create_surface_descriptor(&self, ctx: &DescriptorContext<'_>) -> Option<SurfaceDescriptor> {
        self(ctx)
    }
}

/// Registry entry of one planet.
///
/// The optional capabilities are decided once here; nothing probes for them
/// per call.
pub struct PlanetModule {
    metadata: PlanetMetadata,
    detail_assets: Option<Box<dyn DetailAssetLoader>>,
    surface: Option<Box<dyn SurfaceDescriptorFactory>>,
}

impl PlanetModule {
    /// A module with metadata only.
    pub fn new(metadata: PlanetMetadata) -> Self {
        Self {
            metadata,
            detail_assets: None,
            surface: None,
        }
    }

    /// Add a detail-asset loader.
    pub fn with_detail_assets(mut self, loader: impl DetailAssetLoader + 'static) -> Self {
        self.detail_assets = Some(Box::new(loader));
        self
    }

    /// Add a surface descriptor factory.
    pub fn with_surface_descriptor(
        mut self,
        factory: impl SurfaceDescriptorFactory + 'static,
    ) -> Self {
        self.surface = Some(Box::new(factory));
        self
    }

    /// Planet metadata.
    pub fn metadata(&self) -> &PlanetMetadata {
        &self.metadata
    }

    /// Detail-asset loader, if the planet has one.
    pub fn detail_assets(&self) -> Option<&dyn DetailAssetLoader> {
        self.detail_assets.as_deref()
    }

    /// Build this planet's surface descriptor, if it defines one.
    pub fn surface_descriptor(&self, assets: Option<&DetailAssets>) -> Option<SurfaceDescriptor> {
        let factory = self.surface.as_deref()?;
        factory.create_surface_descriptor(&DescriptorContext {
            metadata: &self.metadata,
            assets,
        })
    }
}

/// All planets of the solar system.
#[derive(Default)]
pub struct PlanetRegistry {
    modules: FxHashMap<PlanetId, PlanetModule>,
}

impl PlanetRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Build modules from config entries.
    ///
    /// Each entry with a surface section gets a factory returning that
    /// descriptor. Detail-asset loaders are attached by the caller, since
    /// how assets load is a host concern.
    pub fn from_catalog(entries: &[PlanetEntry]) -> Self {
        let mut registry = Self::new();
        for entry in entries {
            let metadata = PlanetMetadata {
                id: PlanetId::new(entry.id.clone()),
                name: entry.name.clone(),
                radius_m: entry.radius_m,
            };
            let mut module = PlanetModule::new(metadata);
            if let Some(descriptor) = entry.surface.clone() {
                module = module.with_surface_descriptor(
                    move |_: &DescriptorContext<'_>| Some(descriptor.clone()),
                );
            }
            registry.insert(module);
        }
        registry
    }

    /// Add or replace a module, returning the one it replaced.
    pub fn insert(&mut self, module: PlanetModule) -> Option<PlanetModule> {
        self.modules.insert(module.metadata.id.clone(), module)
    }

    /// Look up a module.
    pub fn get(&self, id: &PlanetId) -> Option<&PlanetModule> {
        self.modules.get(id)
    }

    /// Take a module out, e.g. to attach a loader and re-insert it.
    pub fn remove(&mut self, id: &PlanetId) -> Option<PlanetModule> {
        self.modules.remove(id)
    }

    /// Whether `id` is registered.
    pub fn contains(&self, id: &PlanetId) -> bool {
        self.modules.contains_key(id)
    }

    /// Registered planet ids, sorted.
    pub fn ids(&self) -> Vec<PlanetId> {
        let mut ids: Vec<_> = self.modules.keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Number of registered planets.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Whether the registry is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }
}
