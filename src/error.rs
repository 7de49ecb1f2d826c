//! Errors that can occur while swimming a track.

use crate::swimming::{fsw, stepping::StoppingCause, IntegratorKind};
use thiserror::Error;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Reasons a swim can be refused or fail.
#[derive(Error, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum SwimError {
    #[error("Momentum {momentum} GeV/c is below the fiducial minimum of {minimum} GeV/c")]
    BelowFiducialMomentum { momentum: fsw, minimum: fsw },

    #[error("Sign of pz is inconsistent with swimming from z = {start} cm to z = {target} cm")]
    InconsistentDirection { start: fsw, target: fsw },

    #[error("{integrator} integrator diverged: {cause}")]
    NumericalDivergence {
        integrator: IntegratorKind,
        cause: StoppingCause,
    },

    #[error("Invalid sector {0}, must be in the range 1 to 6")]
    InvalidSector(usize),

    #[error("Plane normal must be a finite non-zero vector")]
    InvalidNormal,

    #[error("No track parameters have been set")]
    MissingTrack,
}

pub type SwimOutcome<T> = Result<T, SwimError>;
