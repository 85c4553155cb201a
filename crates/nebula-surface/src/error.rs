//! Activation failure taxonomy.
//!
//! None of these reach the host loop as a `Result`: the manager logs them,
//! reports them as [`TransitionEvent::ActivationAborted`](crate::TransitionEvent),
//! and retries on a later frame.

use crate::collaborators::WorldInitError;
use crate::state::PlanetId;

/// Why a surface activation stopped before the world went live.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ActivationError {
    /// The planet is not in the registry.
    #[error("no planet module registered for '{0}'")]
    UnknownPlanet(PlanetId),
    /// Neither the planet nor the session default provided a descriptor.
    #[error("no surface descriptor available for '{0}'")]
    MissingDescriptor(PlanetId),
    /// The world initialiser rejected the descriptor.
    #[error(transparent)]
    WorldInit(#[from] WorldInitError),
}
