//! Planet registry for the driver.
//!
//! Planets come from the config catalogue. Those flagged with detail assets
//! get a [`ProceduralDetailLoader`] that synthesises a height-sample strip on
//! a worker thread, and a descriptor factory that roughens the catalogue
//! terrain with those samples once they arrive.

use nebula_config::{Config, SurfaceDescriptor};
use nebula_surface::{
    AssetLoad, AssetLoadError, DescriptorContext, DetailAssetLoader, DetailAssets, PlanetId,
    PlanetModule, PlanetRegistry,
};
use noise::{NoiseFn, Simplex};

/// Height samples generated per detail pack.
pub const DETAIL_SAMPLES: usize = 1024;

/// Largest terrain amplitude gain detail assets may apply.
const MAX_ROUGHNESS_GAIN: f64 = 0.5;

/// Generates a planet's detail pack from noise on a worker thread.
#[derive(Debug, Clone)]
pub struct ProceduralDetailLoader {
    samples: usize,
}

impl ProceduralDetailLoader {
    /// Loader producing `samples` height samples per pack.
    pub fn new(samples: usize) -> Self {
        Self { samples }
    }
}

impl Default for ProceduralDetailLoader {
    fn default() -> Self {
        Self::new(DETAIL_SAMPLES)
    }
}

impl DetailAssetLoader for ProceduralDetailLoader {
    fn load_detail_assets(&self, planet: &PlanetId) -> AssetLoad {
        let name = planet.to_string();
        let planet = planet.clone();
        let samples = self.samples;
        AssetLoad::spawn(&name, move || generate_detail(&planet, samples))
    }
}

/// Build the detail pack of `planet`.
pub fn generate_detail(planet: &PlanetId, samples: usize) -> Result<DetailAssets, AssetLoadError> {
    if samples == 0 {
        return Err(AssetLoadError::Failed(format!(
            "empty detail pack requested for '{planet}'"
        )));
    }
    let noise = Simplex::new(planet_seed(planet));
    let height_samples = (0..samples)
        .map(|i| noise.get([i as f64 * 0.05, 0.5]) as f32)
        .collect();
    Ok(DetailAssets {
        pack: format!("{planet}/detail"),
        height_samples,
        textures: vec![format!("{planet}/albedo"), format!("{planet}/normal")],
    })
}

/// Stable 32-bit seed derived from a planet id (FNV-1a).
pub fn planet_seed(planet: &PlanetId) -> u32 {
    planet
        .as_str()
        .bytes()
        .fold(0x811c_9dc5_u32, |hash, b| (hash ^ u32::from(b)).wrapping_mul(0x0100_0193))
}

/// Adjust a catalogue descriptor with detail assets.
///
/// Mean absolute sample value raises the terrain amplitude by up to
/// [`MAX_ROUGHNESS_GAIN`]; the map id records which pack was applied.
pub fn refine_descriptor(mut base: SurfaceDescriptor, assets: Option<&DetailAssets>) -> SurfaceDescriptor {
    let Some(assets) = assets.filter(|a| !a.height_samples.is_empty()) else {
        return base;
    };
    let roughness = assets
        .height_samples
        .iter()
        .map(|h| f64::from(h.abs()))
        .sum::<f64>()
        / assets.height_samples.len() as f64;
    base.terrain.amplitude_m *= 1.0 + roughness.min(1.0) * MAX_ROUGHNESS_GAIN;
    base.map_id = format!("{}+{}", base.map_id, assets.pack);
    base
}

/// Build the registry from the config catalogue.
pub fn build_registry(config: &Config) -> PlanetRegistry {
    let mut registry = PlanetRegistry::from_catalog(&config.planets);
    for entry in config.planets.iter().filter(|e| e.detail_assets) {
        let id = PlanetId::new(entry.id.clone());
        let Some(module) = registry.remove(&id) else {
            continue;
        };
        let mut module = PlanetModule::new(module.metadata().clone())
            .with_detail_assets(ProceduralDetailLoader::default());
        if let Some(base) = entry.surface.clone() {
            module = module.with_surface_descriptor(move |ctx: &DescriptorContext<'_>| {
                Some(refine_descriptor(base.clone(), ctx.assets))
            });
        }
        registry.insert(module);
    }
    registry
}
