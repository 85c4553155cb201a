//! Procedural heightfield surface world.
//!
//! Terrain height is multi-octave fractal Brownian motion over simplex noise,
//! seeded from the surface descriptor. The world streams square chunks around
//! the focus position; only the chunk bookkeeping is simulated here, since
//! the headless driver has no renderer to upload meshes to.

use glam::DVec3;
use nebula_config::{SurfaceDescriptor, TerrainParams};
use nebula_surface::{
    InitializedWorld, SurfaceWorld, WorldInitError, WorldInitRequest, WorldInitializer,
};
use noise::{NoiseFn, Simplex};
use rustc_hash::FxHashSet;
use tracing::{debug, info};

/// Edge length of one streamed terrain chunk.
pub const CHUNK_SIZE_M: f64 = 256.0;

/// Chunks kept loaded in each direction around the focus chunk.
pub const STREAM_RADIUS_CHUNKS: i32 = 2;

/// Upper bound on terrain octaves accepted from a descriptor.
const MAX_OCTAVES: u32 = 12;

/// Fractal heightfield sampler.
pub struct Heightfield {
    noise: Simplex,
    params: TerrainParams,
}

impl Heightfield {
    /// Create a sampler for `params`.
    pub fn new(params: TerrainParams) -> Self {
        Self {
            noise: Simplex::new(params.seed),
            params,
        }
    }

    /// Terrain height at `(x, y)`, clamped to the playable extent.
    ///
    /// Each octave doubles the frequency and halves the amplitude; the result
    /// stays within `[-2 * amplitude, 2 * amplitude]`.
    pub fn sample(&self, x: f64, y: f64) -> f64 {
        let extent = self.params.extent_m;
        let x = x.clamp(-extent, extent);
        let y = y.clamp(-extent, extent);

        let mut total = 0.0;
        let mut frequency = self.params.base_frequency;
        let mut amplitude = self.params.amplitude_m;
        for _ in 0..self.params.octaves {
            total += self.noise.get([x * frequency, y * frequency]) * amplitude;
            frequency *= 2.0;
            amplitude *= 0.5;
        }
        total
    }

    /// Parameters the sampler was built from.
    pub fn params(&self) -> &TerrainParams {
        &self.params
    }
}

/// A live heightfield world.
pub struct HeightfieldWorld {
    map_id: String,
    terrain: Heightfield,
    loaded: FxHashSet<(i32, i32)>,
    focus: Option<(i32, i32)>,
}

impl HeightfieldWorld {
    /// Build a world from a descriptor. Nothing is streamed until the first update.
    pub fn new(descriptor: &SurfaceDescriptor) -> Self {
        Self {
            map_id: descriptor.map_id.clone(),
            terrain: Heightfield::new(descriptor.terrain.clone()),
            loaded: FxHashSet::default(),
            focus: None,
        }
    }

    /// Map identifier.
    pub fn map_id(&self) -> &str {
        &self.map_id
    }

    /// Number of chunks currently loaded.
    pub fn loaded_chunks(&self) -> usize {
        self.loaded.len()
    }

    fn chunk_of(position: DVec3) -> (i32, i32) {
        (
            (position.x / CHUNK_SIZE_M).floor() as i32,
            (position.y / CHUNK_SIZE_M).floor() as i32,
        )
    }
}

impl SurfaceWorld for HeightfieldWorld {
    fn update(&mut self, focus: DVec3) {
        let center = Self::chunk_of(focus);
        if self.focus == Some(center) {
            return;
        }
        self.focus = Some(center);

        let in_range = |(cx, cy): (i32, i32)| {
            (cx - center.0).abs() <= STREAM_RADIUS_CHUNKS
                && (cy - center.1).abs() <= STREAM_RADIUS_CHUNKS
        };
        let before = self.loaded.len();
        self.loaded.retain(|c| in_range(*c));
        let unloaded = before - self.loaded.len();

        let mut loaded = 0;
        for dx in -STREAM_RADIUS_CHUNKS..=STREAM_RADIUS_CHUNKS {
            for dy in -STREAM_RADIUS_CHUNKS..=STREAM_RADIUS_CHUNKS {
                if self.loaded.insert((center.0 + dx, center.1 + dy)) {
                    loaded += 1;
                }
            }
        }
        debug!(
            map = %self.map_id,
            chunk = ?center,
            loaded,
            unloaded,
            "terrain streamed"
        );
    }

    fn height_at(&self, x: f64, y: f64) -> f64 {
        self.terrain.sample(x, y)
    }

    fn dispose(self: Box<Self>) {
        info!(map = %self.map_id, chunks = self.loaded.len(), "heightfield released");
    }
}

/// Builds [`HeightfieldWorld`]s.
#[derive(Debug, Default)]
pub struct HeightfieldInitializer {
    built: u32,
}

impl HeightfieldInitializer {
    /// Create an initialiser.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of worlds built so far.
    pub fn built(&self) -> u32 {
        self.built
    }
}

impl WorldInitializer for HeightfieldInitializer {
    fn initialize(&mut self, request: WorldInitRequest) -> Result<InitializedWorld, WorldInitError> {
        if let Some(previous) = request.current_world {
            previous.dispose();
        }
        let map_definition = request.map_definition;
        validate_terrain(&map_definition)?;

        let world = HeightfieldWorld::new(&map_definition);
        self.built += 1;
        info!(
            map = %map_definition.map_id,
            seed = map_definition.terrain.seed,
            extent = map_definition.terrain.extent_m,
            sun = map_definition.environment.sun_elevation_deg,
            "heightfield built"
        );
        Ok(InitializedWorld {
            world: Box::new(world),
            map_definition,
        })
    }
}

fn validate_terrain(descriptor: &SurfaceDescriptor) -> Result<(), WorldInitError> {
    let terrain = &descriptor.terrain;
    if !terrain.extent_m.is_finite() || terrain.extent_m <= 0.0 {
        return Err(WorldInitError(format!(
            "map '{}' has invalid extent {}",
            descriptor.map_id, terrain.extent_m
        )));
    }
    if terrain.octaves == 0 || terrain.octaves > MAX_OCTAVES {
        return Err(WorldInitError(format!(
            "map '{}' requests {} octaves (1..={MAX_OCTAVES})",
            descriptor.map_id, terrain.octaves
        )));
    }
    if !terrain.base_frequency.is_finite() || terrain.base_frequency <= 0.0 {
        return Err(WorldInitError(format!(
            "map '{}' has invalid base frequency {}",
            descriptor.map_id, terrain.base_frequency
        )));
    }
    Ok(())
}
