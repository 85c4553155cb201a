//! Surface activation and teardown.
//!
//! Activation is single-flight: [`PlanetSurfaceManager::activate_surface`]
//! records a [`PendingActivation`] and requests the planet's detail assets.
//! The activation completes on a later update once the load has resolved,
//! and only if the manager still wants a surface for that planet. A failure
//! at any step leaves no partial world behind and is retried while the
//! manager stays in SURFACE.

use glam::DVec3;
use nebula_config::SurfaceDescriptor;
use tracing::{debug, info, warn};

use super::PlanetSurfaceManager;
use crate::assets::PreloadStatus;
use crate::collaborators::{InitializedWorld, JoinOptions, SurfaceWorld, WorldId, WorldInitRequest};
use crate::error::ActivationError;
use crate::events::TransitionEvent;
use crate::registry::PlanetMetadata;
use crate::state::PlanetId;

/// An activation waiting for its detail assets.
#[derive(Clone, Debug, PartialEq)]
pub(super) struct PendingActivation {
    pub(super) planet: PlanetId,
}

/// The live surface world and what it was built from.
pub struct SurfaceContext {
    planet_id: PlanetId,
    metadata: PlanetMetadata,
    map_definition: SurfaceDescriptor,
    world_id: WorldId,
    pub(super) world: Box<dyn SurfaceWorld>,
}

impl SurfaceContext {
    /// Planet the world belongs to.
    pub fn planet_id(&self) -> &PlanetId {
        &self.planet_id
    }

    /// Registry metadata of that planet.
    pub fn metadata(&self) -> &PlanetMetadata {
        &self.metadata
    }

    /// Descriptor the world was built from.
    pub fn map_definition(&self) -> &SurfaceDescriptor {
        &self.map_definition
    }

    /// Generation tag handed to the vehicle and projectile systems.
    pub fn world_id(&self) -> WorldId {
        self.world_id
    }

    /// The live world.
    pub fn world(&self) -> &dyn SurfaceWorld {
        &*self.world
    }
}

impl PlanetSurfaceManager {
    /// Start building the surface world of the current planet.
    ///
    /// Returns `true` when a new activation was started. Does nothing while
    /// another activation is in flight or when the current planet's surface
    /// is already live.
    pub fn activate_surface(&mut self) -> bool {
        let Some(planet) = self.current_planet.clone() else {
            debug!("no current planet to activate");
            return false;
        };
        if let Some(pending) = &self.activation {
            debug!(planet = %pending.planet, "surface activation already in flight");
            return false;
        }
        if self.surface.as_ref().is_some_and(|s| s.planet_id == planet) {
            return false;
        }

        let Some(module) = self.registry.get(&planet) else {
            self.abort_activation(planet.clone(), ActivationError::UnknownPlanet(planet));
            return false;
        };

        self.preloader.request(&planet, module);
        info!(%planet, "surface activation started");
        self.activation = Some(PendingActivation { planet });
        true
    }

    /// Dispose the live surface world and detach it from every collaborator.
    ///
    /// Does nothing when no world is live.
    pub fn teardown_surface(&mut self) {
        let Some(context) = self.surface.take() else {
            return;
        };
        let SurfaceContext {
            planet_id,
            world_id,
            world,
            ..
        } = context;

        self.estimator.reset(0.0);
        let collaborators = &mut self.collaborators;
        collaborators.vehicles.clear_vehicles();
        collaborators.projectiles.clear();
        world.dispose();
        collaborators.vehicles.set_world(None);
        collaborators.projectiles.set_world(None);

        info!(planet = %planet_id, world = %world_id, "surface world disposed");
        self.events.push(TransitionEvent::SurfaceDisposed {
            planet: planet_id,
            world: world_id,
        });
    }

    /// Complete the pending activation once its assets have resolved.
    pub(super) fn poll_activation(&mut self) {
        let Some(pending) = &self.activation else {
            return;
        };
        let planet = pending.planet.clone();
        if self.preloader.status(&planet) == PreloadStatus::Pending {
            return;
        }
        self.activation = None;

        let wanted =
            self.state.keeps_surface() && self.current_planet.as_ref() == Some(&planet);
        if !wanted {
            debug!(%planet, state = %self.state, "discarding stale surface activation");
            return;
        }
        self.complete_activation(planet);
    }

    fn complete_activation(&mut self, planet: PlanetId) {
        let Some(module) = self.registry.get(&planet) else {
            self.abort_activation(planet.clone(), ActivationError::UnknownPlanet(planet));
            return;
        };

        let assets = self.preloader.assets(&planet);
        if let PreloadStatus::Failed(e) = self.preloader.status(&planet) {
            warn!(%planet, error = %e, "activating surface without detail assets");
            self.preloader.forget_failure(&planet);
        }

        let metadata = module.metadata().clone();
        let descriptor = module
            .surface_descriptor(assets.as_deref())
            .or_else(|| self.settings.default_surface.clone());
        let Some(descriptor) = descriptor else {
            self.abort_activation(planet.clone(), ActivationError::MissingDescriptor(planet));
            return;
        };

        let current_world = self.surface.take().map(|previous| {
            debug!(planet = %previous.planet_id, world = %previous.world_id, "replacing surface world");
            self.events.push(TransitionEvent::SurfaceDisposed {
                planet: previous.planet_id,
                world: previous.world_id,
            });
            previous.world
        });
        let request = WorldInitRequest {
            map_definition: descriptor,
            current_world,
        };

        let InitializedWorld {
            world,
            map_definition,
        } = match self.collaborators.world_initializer.initialize(request) {
            Ok(initialized) => initialized,
            Err(e) => {
                self.collaborators.vehicles.clear_vehicles();
                self.collaborators.vehicles.set_world(None);
                self.collaborators.projectiles.clear();
                self.collaborators.projectiles.set_world(None);
                self.abort_activation(planet, ActivationError::WorldInit(e));
                return;
            }
        };

        let world_id = WorldId(self.next_world_id);
        self.next_world_id += 1;

        let collaborators = &mut self.collaborators;
        collaborators.vehicles.clear_vehicles();
        collaborators.vehicles.set_world(Some(world_id));
        collaborators
            .vehicles
            .spawn_default_vehicles(&*world, map_definition.spawn.default_vehicles);
        let [x, y, height] = map_definition.spawn.position;
        collaborators.vehicles.handle_player_join(
            &self.settings.player_id,
            &*world,
            JoinOptions {
                spawn: DVec3::new(x, y, height),
                make_active: true,
            },
        );
        collaborators.projectiles.clear();
        collaborators.projectiles.set_world(Some(world_id));

        self.estimator.reset(0.0);
        if let Some(active) = collaborators
            .vehicles
            .active_vehicle()
            .and_then(|id| collaborators.vehicles.vehicle_state(id))
        {
            collaborators.chase_camera.snap_to(&active);
        }

        info!(
            %planet,
            world = %world_id,
            map = %map_definition.map_id,
            "surface world ready"
        );
        self.surface = Some(SurfaceContext {
            planet_id: planet.clone(),
            metadata,
            map_definition,
            world_id,
            world,
        });
        self.last_abort = None;
        self.events.push(TransitionEvent::SurfaceReady {
            planet,
            world: world_id,
        });
    }

    /// Report an activation failure. A failure identical to the previous one
    /// is logged at debug level only, since SURFACE retries every frame.
    fn abort_activation(&mut self, planet: PlanetId, error: ActivationError) {
        if self.last_abort.as_ref() == Some(&error) {
            debug!(%planet, %error, "surface activation still failing");
            return;
        }
        warn!(%planet, %error, "surface activation aborted");
        self.last_abort = Some(error.clone());
        self.events
            .push(TransitionEvent::ActivationAborted { planet, error });
    }
}
