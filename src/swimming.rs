//! Swimming charged particles through magnetic fields to target boundaries.

pub mod boundary;
pub mod execution;
pub mod longitudinal;
pub mod path;
pub mod result;
pub mod session;
pub mod stepping;
pub mod swimmer;
pub mod track;
pub mod trajectory;

pub use self::boundary::{Boundary, Crossing};
pub use self::result::{SwimResult, SwimStatus};
pub use self::session::{SwimSession, SwimSessionFactory};
pub use self::swimmer::{SwimTarget, Swimmer, SwimmerConfig};
pub use self::track::{SwimDirection, TrackState};

use std::fmt;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Floating-point precision to use for swimming.
#[allow(non_camel_case_types)]
pub type fsw = f64;

/// The integrators available for swimming.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum IntegratorKind {
    /// Integrates with the longitudinal coordinate z as the independent variable.
    Longitudinal,
    /// Integrates with the path length as the independent variable.
    PathLength,
}

impl fmt::Display for IntegratorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                IntegratorKind::Longitudinal => "Longitudinal",
                IntegratorKind::PathLength => "Path length",
            }
        )
    }
}
