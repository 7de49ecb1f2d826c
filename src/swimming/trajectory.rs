//! Trajectories produced by the swimming integrators.

use super::{fsw, stepping::StoppingCause, IntegratorKind};
use crate::{
    field::FieldProbe,
    geometry::{Point3, Vec3},
    units::LengthUnit,
};

/// A point on a trajectory.
#[derive(Clone, Debug, PartialEq)]
pub struct TrajectoryPoint {
    /// Position in the length unit of the trajectory.
    pub position: Point3<fsw>,
    /// Unit vector along the momentum.
    pub direction: Vec3<fsw>,
    /// Path length from the start of the trajectory, in the length unit of the trajectory.
    pub path_length: fsw,
}

/// The sequence of accepted states of a swim, together with the reason the swim ended.
#[derive(Clone, Debug)]
pub struct Trajectory {
    integrator: IntegratorKind,
    length_unit: LengthUnit,
    points: Vec<TrajectoryPoint>,
    stopping_cause: StoppingCause,
}

impl Trajectory {
    /// Creates a new trajectory starting at the given point.
    pub fn new(integrator: IntegratorKind, length_unit: LengthUnit, start: TrajectoryPoint) -> Self {
        Trajectory {
            integrator,
            length_unit,
            points: vec![start],
            stopping_cause: StoppingCause::ReachedBoundary,
        }
    }

    /// Appends a point to the trajectory.
    pub fn push(&mut self, point: TrajectoryPoint) {
        self.points.push(point);
    }

    /// Records why the swim ended.
    pub fn finish(mut self, stopping_cause: StoppingCause) -> Self {
        self.stopping_cause = stopping_cause;
        self
    }

    /// Returns the integrator that produced the trajectory.
    pub fn integrator(&self) -> IntegratorKind {
        self.integrator
    }

    /// Returns the length unit used for positions and path lengths.
    pub fn length_unit(&self) -> LengthUnit {
        self.length_unit
    }

    /// Returns the reason the swim ended.
    pub fn stopping_cause(&self) -> StoppingCause {
        self.stopping_cause
    }

    /// Returns the points of the trajectory.
    pub fn points(&self) -> &[TrajectoryPoint] {
        &self.points
    }

    /// Returns the number of points in the trajectory.
    pub fn number_of_points(&self) -> usize {
        self.points.len()
    }

    /// Returns the last point of the trajectory.
    pub fn last(&self) -> &TrajectoryPoint {
        // A trajectory always holds at least its start point
        &self.points[self.points.len() - 1]
    }

    /// Returns the total path length of the trajectory.
    pub fn path_length(&self) -> fsw {
        self.last().path_length
    }

    /// Integrates the field magnitude along the trajectory.
    ///
    /// Each segment contributes the field magnitude at its midpoint times
    /// its path length. The result is in kilogauss times the length unit
    /// of the trajectory.
    pub fn compute_bdl<P: FieldProbe + ?Sized>(&self, probe: &P) -> fsw {
        let to_cm = self.length_unit.centimeters();
        self.points
            .windows(2)
            .map(|segment| {
                let (start, end) = (&segment[0], &segment[1]);
                let midpoint = (&start.position + &((&end.position - &start.position) * 0.5))
                    .scaled(to_cm);
                probe.magnitude(&midpoint) * (end.path_length - start.path_length)
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::field::{FnField, UniformField};
    use crate::geometry::Dim3::Z;

    fn straight_trajectory(length_unit: LengthUnit) -> Trajectory {
        let direction = Vec3::new(0.0, 0.0, 1.0);
        let mut trajectory = Trajectory::new(
            IntegratorKind::PathLength,
            length_unit,
            TrajectoryPoint {
                position: Point3::origin(),
                direction: direction.clone(),
                path_length: 0.0,
            },
        );
        for idx in 1..=4 {
            let z = 0.5 * idx as fsw;
            trajectory.push(TrajectoryPoint {
                position: Point3::new(0.0, 0.0, z),
                direction: direction.clone(),
                path_length: z,
            });
        }
        trajectory
    }

    #[test]
    fn bdl_in_uniform_field_is_field_times_length() {
        let trajectory = straight_trajectory(LengthUnit::Meter);
        let bdl = trajectory.compute_bdl(&UniformField::new(3.0, 0.0, 4.0));
        assert!((bdl - 10.0).abs() < 1e-12);
        assert_eq!(trajectory.path_length(), 2.0);
        assert_eq!(trajectory.last().position[Z], 2.0);
    }

    #[test]
    fn bdl_probes_field_in_centimeters() {
        let trajectory = straight_trajectory(LengthUnit::Meter);
        // B = z [m] kG, integrated over 2 m
        let field = FnField::new(|position: &Point3<fsw>| Vec3::new(0.0, 0.0, 1e-2 * position[Z]));
        let bdl = trajectory.compute_bdl(&field);
        assert!((bdl - 2.0).abs() < 1e-10);
    }

    #[test]
    fn single_point_trajectory_has_no_field_integral() {
        let trajectory = Trajectory::new(
            IntegratorKind::Longitudinal,
            LengthUnit::Centimeter,
            TrajectoryPoint {
                position: Point3::origin(),
                direction: Vec3::new(1.0, 0.0, 0.0),
                path_length: 0.0,
            },
        );
        assert_eq!(trajectory.compute_bdl(&UniformField::new(1.0, 1.0, 1.0)), 0.0);
    }
}
