//! Notifications emitted by the transition manager.
//!
//! Events are queued as they happen (including from
//! [`request_system_view`](crate::PlanetSurfaceManager::request_system_view),
//! which runs outside `update`) and drained by the host once per frame.

use crate::collaborators::{ProjectileEvent, WorldId};
use crate::error::ActivationError;
use crate::manager::ExitReason;
use crate::state::{PlanetId, PlanetSurfaceState};

/// Something the host may want to log, record, or react to.
#[derive(Clone, Debug, PartialEq)]
pub enum TransitionEvent {
    /// The current state changed.
    StateChanged {
        /// Previous state.
        from: PlanetSurfaceState,
        /// New state.
        to: PlanetSurfaceState,
        /// Planet in focus after the change.
        planet: Option<PlanetId>,
        /// Exit reason, when the change was part of a requested exit.
        reason: Option<ExitReason>,
    },
    /// A surface world went live.
    SurfaceReady {
        /// Planet the world belongs to.
        planet: PlanetId,
        /// Generation of the new world.
        world: WorldId,
    },
    /// A surface world was disposed.
    SurfaceDisposed {
        /// Planet the world belonged to.
        planet: PlanetId,
        /// Generation of the disposed world.
        world: WorldId,
    },
    /// An activation stopped before the world went live.
    ActivationAborted {
        /// Planet being activated.
        planet: PlanetId,
        /// Cause.
        error: ActivationError,
    },
    /// A projectile hit something.
    Projectile(ProjectileEvent),
}

/// FIFO queue of [`TransitionEvent`]s.
#[derive(Debug, Default)]
pub struct TransitionEventQueue {
    events: Vec<TransitionEvent>,
}

impl TransitionEventQueue {
    /// Queue one event.
    pub fn push(&mut self, event: TransitionEvent) {
        self.events.push(event);
    }

    /// Take every queued event in emission order.
    pub fn drain(&mut self) -> Vec<TransitionEvent> {
        std::mem::take(&mut self.events)
    }

    /// Number of queued events.
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }
}
