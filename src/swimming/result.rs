//! Results of swims, in the external unit convention.

use super::{
    fsw, stepping::StoppingCause, track::TrackState, trajectory::Trajectory, IntegratorKind,
};
use crate::{
    error::SwimError,
    field::FieldProbe,
    geometry::{
        Dim3::{X, Y, Z},
        Point3, Vec3,
    },
};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// How a swim ended.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum SwimStatus {
    /// The target boundary was reached.
    Reached,
    /// Swimming stopped before the boundary was reached.
    Terminated(StoppingCause),
    /// The start point already lay beyond the target plane.
    AlreadyPastBoundary,
    /// The swim was refused and no integrator was run.
    Rejected(SwimError),
    /// The general integrator failed.
    Failed(SwimError),
}

/// Outcome of a swim.
///
/// Positions and path lengths are in centimeters, momenta in GeV/c and the
/// field integral in tesla centimeters. Refused and failed swims carry
/// all-zero values.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct SwimResult {
    pub position: Point3<fsw>,
    pub momentum: Vec3<fsw>,
    pub path_length: fsw,
    pub bdl: fsw,
    pub status: SwimStatus,
    /// The integrator producing the result, if any ran.
    pub integrator: Option<IntegratorKind>,
}

impl SwimResult {
    /// Creates an all-zero result with the given status.
    pub fn null(status: SwimStatus) -> Self {
        SwimResult {
            position: Point3::origin(),
            momentum: Vec3::zero(),
            path_length: 0.0,
            bdl: 0.0,
            status,
            integrator: None,
        }
    }

    /// Creates an all-zero result for a refused swim.
    pub fn rejected(error: SwimError) -> Self {
        Self::null(SwimStatus::Rejected(error))
    }

    /// Creates an all-zero result for a failed swim.
    pub fn failed(error: SwimError) -> Self {
        Self::null(SwimStatus::Failed(error))
    }

    /// Creates a result holding the unmodified start state of the track.
    pub fn unmoved(track: &TrackState, status: SwimStatus) -> Self {
        SwimResult {
            position: track.position_cm(),
            momentum: track.momentum_vector(),
            path_length: 0.0,
            bdl: 0.0,
            status,
            integrator: None,
        }
    }

    /// Translates the end of a trajectory into a result.
    ///
    /// The field integral is computed with the same probe that the
    /// trajectory was swum with.
    pub fn from_trajectory<P>(trajectory: &Trajectory, momentum: fsw, probe: &P) -> Self
    where
        P: FieldProbe + ?Sized,
    {
        let unit = trajectory.length_unit();
        let last = trajectory.last();
        let status = match trajectory.stopping_cause() {
            StoppingCause::ReachedBoundary => SwimStatus::Reached,
            cause => SwimStatus::Terminated(cause),
        };
        SwimResult {
            position: last.position.scaled(unit.centimeters()),
            momentum: &last.direction * momentum,
            path_length: last.path_length * unit.centimeters(),
            bdl: trajectory.compute_bdl(probe) * unit.field_integral_to_tesla_cm(),
            status,
            integrator: Some(trajectory.integrator()),
        }
    }

    /// Whether every value of the result is zero.
    pub fn is_null(&self) -> bool {
        self.to_array().iter().all(|&value| value == 0.0)
    }

    /// Whether the boundary was reached.
    pub fn reached(&self) -> bool {
        self.status == SwimStatus::Reached
    }

    /// Returns `[x, y, z, px, py, pz, path length, bdl]`.
    pub fn to_array(&self) -> [fsw; 8] {
        [
            self.position[X],
            self.position[Y],
            self.position[Z],
            self.momentum[X],
            self.momentum[Y],
            self.momentum[Z],
            self.path_length,
            self.bdl,
        ]
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::field::UniformField;
    use crate::swimming::trajectory::TrajectoryPoint;
    use crate::units::LengthUnit;
    use approx::assert_abs_diff_eq;

    #[test]
    fn meter_trajectory_is_converted_to_external_units() {
        let direction = Vec3::new(0.6, 0.0, 0.8);
        let mut trajectory = Trajectory::new(
            IntegratorKind::PathLength,
            LengthUnit::Meter,
            TrajectoryPoint {
                position: Point3::origin(),
                direction: direction.clone(),
                path_length: 0.0,
            },
        );
        trajectory.push(TrajectoryPoint {
            position: Point3::new(0.3, 0.0, 0.4),
            direction: direction.clone(),
            path_length: 0.5,
        });

        // 5 kG = 0.5 T over 50 cm
        let result = SwimResult::from_trajectory(&trajectory, 2.0, &UniformField::new(0.0, 5.0, 0.0));
        assert_eq!(result.status, SwimStatus::Reached);
        assert_eq!(result.integrator, Some(IntegratorKind::PathLength));
        let values = result.to_array();
        assert_abs_diff_eq!(values[0], 30.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[2], 40.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[3], 1.2, epsilon = 1e-12);
        assert_abs_diff_eq!(values[5], 1.6, epsilon = 1e-12);
        assert_abs_diff_eq!(values[6], 50.0, epsilon = 1e-12);
        assert_abs_diff_eq!(values[7], 25.0, epsilon = 1e-12);
    }

    #[test]
    fn centimeter_trajectory_field_integral_is_scaled_down() {
        let mut trajectory = Trajectory::new(
            IntegratorKind::Longitudinal,
            LengthUnit::Centimeter,
            TrajectoryPoint {
                position: Point3::origin(),
                direction: Vec3::new(0.0, 0.0, 1.0),
                path_length: 0.0,
            },
        );
        trajectory.push(TrajectoryPoint {
            position: Point3::new(0.0, 0.0, 50.0),
            direction: Vec3::new(0.0, 0.0, 1.0),
            path_length: 50.0,
        });
        let result = SwimResult::from_trajectory(&trajectory, 1.0, &UniformField::new(5.0, 0.0, 0.0));
        assert_abs_diff_eq!(result.bdl, 25.0, epsilon = 1e-12);
        assert_abs_diff_eq!(result.path_length, 50.0, epsilon = 1e-12);
    }

    #[test]
    fn refusals_are_null() {
        let result = SwimResult::rejected(SwimError::MissingTrack);
        assert!(result.is_null());
        assert!(!result.reached());
        assert_eq!(result.integrator, None);
    }
}
