//! Swimming with the path length as the independent variable.
//!
//! The state is `[x, y, z, ux, uy, uz]`, with the position in meters and
//! `u` the unit vector along the momentum, obeying
//! `du/ds = κ (q/p) u × B`.

use super::{
    boundary::Boundary,
    fsw,
    stepping::{
        rkf::{rkf45::RKF45Stepper, RKFStepperConfig},
        OdeSystem, Stepper, StepperResult, SteppingSense, StoppingCause,
    },
    track::TrackState,
    trajectory::{Trajectory, TrajectoryPoint},
    IntegratorKind,
};
use crate::{
    error::{SwimError, SwimOutcome},
    field::FieldProbe,
    geometry::{
        Dim3::{X, Y, Z},
        Point3, Vec3,
    },
    units::{LengthUnit, CM_PER_M, CURVATURE_PER_KG_M},
};

/// Remaining path length [m] below which the budget counts as used up.
const BUDGET_TOLERANCE: fsw = 1e-12;

/// Configuration parameters for the path-length swimmer.
#[derive(Clone, Debug)]
pub struct PathSwimmerConfig {
    /// Configuration for the stepper, with lengths in meters.
    pub stepper_config: RKFStepperConfig,
    /// Absolute error tolerance for the position components [m].
    pub position_tolerance: fsw,
    /// Absolute error tolerance for the direction components.
    pub direction_tolerance: fsw,
    /// Largest distance [m] beyond a boundary at which the exit point is accepted.
    pub accuracy: fsw,
    /// Maximum number of steps before the swim is abandoned.
    pub max_steps: usize,
    /// Maximum number of bisections when refining a boundary crossing.
    pub max_refinements: usize,
}

/// Swimmer integrating along the path length until a boundary is crossed.
#[derive(Clone, Debug)]
pub struct PathSwimmer {
    config: PathSwimmerConfig,
    stepper: RKF45Stepper<6>,
}

/// Motion of a charged particle in a static magnetic field.
struct LorentzMotion<'a, P: ?Sized> {
    probe: &'a P,
    curvature_per_kg: fsw,
}

impl PathSwimmerConfig {
    pub const DEFAULT_POSITION_TOLERANCE: fsw = 1e-7;
    pub const DEFAULT_DIRECTION_TOLERANCE: fsw = 1e-7;
    pub const DEFAULT_ACCURACY: fsw = 20e-6;
    pub const DEFAULT_MAX_STEPS: usize = 100_000;
    pub const DEFAULT_MAX_REFINEMENTS: usize = 64;

    fn tolerances(&self) -> [fsw; 6] {
        [
            self.position_tolerance,
            self.position_tolerance,
            self.position_tolerance,
            self.direction_tolerance,
            self.direction_tolerance,
            self.direction_tolerance,
        ]
    }

    pub fn validate(&self) {
        self.stepper_config.validate();
        assert!(
            self.position_tolerance > 0.0,
            "Position tolerance must be larger than zero."
        );
        assert!(
            self.direction_tolerance > 0.0,
            "Direction tolerance must be larger than zero."
        );
        assert!(self.accuracy > 0.0, "Accuracy must be larger than zero.");
        assert!(self.max_steps > 0, "Maximum number of steps must be larger than zero.");
    }
}

impl Default for PathSwimmerConfig {
    fn default() -> Self {
        PathSwimmerConfig {
            stepper_config: RKFStepperConfig::default(),
            position_tolerance: Self::DEFAULT_POSITION_TOLERANCE,
            direction_tolerance: Self::DEFAULT_DIRECTION_TOLERANCE,
            accuracy: Self::DEFAULT_ACCURACY,
            max_steps: Self::DEFAULT_MAX_STEPS,
            max_refinements: Self::DEFAULT_MAX_REFINEMENTS,
        }
    }
}

impl<'a, P: FieldProbe + ?Sized> OdeSystem<6> for LorentzMotion<'a, P> {
    fn derivatives(&self, _path_length: fsw, values: &[fsw; 6]) -> StepperResult<[fsw; 6]> {
        let position = Point3::new(values[0], values[1], values[2]).scaled(CM_PER_M);
        let b = self.probe.field(&position);
        let [_, _, _, ux, uy, uz] = *values;
        let k = self.curvature_per_kg;
        StepperResult::Ok([
            ux,
            uy,
            uz,
            k * (uy * b[Z] - uz * b[Y]),
            k * (uz * b[X] - ux * b[Z]),
            k * (ux * b[Y] - uy * b[X]),
        ])
    }
}

fn point_from_values(values: &[fsw; 6], path_length: fsw) -> TrajectoryPoint {
    let [x, y, z, ux, uy, uz] = *values;
    let direction = Vec3::new(ux, uy, uz);
    let length = direction.length();
    TrajectoryPoint {
        position: Point3::new(x, y, z),
        direction: if length > 0.0 {
            direction / length
        } else {
            direction
        },
        path_length,
    }
}

impl PathSwimmer {
    /// Creates a new path-length swimmer with the given configuration.
    pub fn new(config: PathSwimmerConfig) -> Self {
        config.validate();
        let stepper = RKF45Stepper::new(config.stepper_config.clone(), config.tolerances());
        PathSwimmer { config, stepper }
    }

    /// Returns the configuration of the swimmer.
    pub fn config(&self) -> &PathSwimmerConfig {
        &self.config
    }

    /// Swims the given track until it crosses the boundary [m], exhausts its
    /// path-length budget or leaves its radial safety bound.
    ///
    /// The returned trajectory is in meters. When the boundary is crossed,
    /// the last point lies beyond it by at most the configured accuracy.
    ///
    /// # Errors
    ///
    /// `NumericalDivergence` if the stepping breaks down.
    pub fn swim<P>(
        &mut self,
        probe: &P,
        track: &TrackState,
        boundary: &Boundary,
    ) -> SwimOutcome<Trajectory>
    where
        P: FieldProbe + ?Sized,
    {
        let diverged = |cause| SwimError::NumericalDivergence {
            integrator: IntegratorKind::PathLength,
            cause,
        };

        let direction = track.direction();
        let mut trajectory = Trajectory::new(
            IntegratorKind::PathLength,
            LengthUnit::Meter,
            TrajectoryPoint {
                position: track.position().clone(),
                direction: direction.clone(),
                path_length: 0.0,
            },
        );
        if boundary.is_reached(track.position()) {
            return Ok(trajectory.finish(StoppingCause::ReachedBoundary));
        }

        let system = LorentzMotion {
            probe,
            curvature_per_kg: CURVATURE_PER_KG_M * fsw::from(track.charge()) / track.momentum(),
        };
        let position = track.position();
        let initial_values = [
            position[X],
            position[Y],
            position[Z],
            direction[X],
            direction[Y],
            direction[Z],
        ];
        if let StepperResult::Stopped(cause) =
            self.stepper.place(&system, SteppingSense::Same, 0.0, &initial_values)
        {
            return Err(diverged(cause));
        }

        let max_path_length = track.max_path_length();
        let mut n_steps = 0;
        loop {
            let remaining = max_path_length - self.stepper.parameter();
            if remaining <= BUDGET_TOLERANCE {
                return Ok(trajectory.finish(StoppingCause::PathLengthExhausted));
            }
            n_steps += 1;
            if n_steps > self.config.max_steps {
                return Err(diverged(StoppingCause::TooManySteps));
            }
            if let StepperResult::Stopped(cause) = self.stepper.step(&system, remaining) {
                return Err(diverged(cause));
            }

            let point = point_from_values(self.stepper.values(), self.stepper.parameter());
            if boundary.is_reached(&point.position) {
                let point = self.refine_crossing(boundary, point);
                trajectory.push(point);
                return Ok(trajectory.finish(StoppingCause::ReachedBoundary));
            }
            let out_of_bounds = point.position.distance_from_origin() > track.max_radius();
            trajectory.push(point);
            if out_of_bounds {
                return Ok(trajectory.finish(StoppingCause::OutOfBounds));
            }
        }
    }

    /// Bisects the dense output of the last step until the crossing point
    /// lies beyond the boundary by at most the configured accuracy.
    fn refine_crossing(&self, boundary: &Boundary, end: TrajectoryPoint) -> TrajectoryPoint {
        let start_path_length = self.stepper.previous_parameter();
        let step_length = self.stepper.parameter() - start_path_length;

        let mut lower = 0.0;
        let mut upper = 1.0;
        let mut best = end;
        for _ in 0..self.config.max_refinements {
            if boundary.excess(&best.position) <= self.config.accuracy {
                break;
            }
            let middle = 0.5 * (lower + upper);
            let candidate = point_from_values(
                &self.stepper.interpolate(middle),
                start_path_length + middle * step_length,
            );
            if boundary.is_reached(&candidate.position) {
                upper = middle;
                best = candidate;
            } else {
                lower = middle;
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::field::UniformField;
    use crate::swimming::boundary::Crossing;
    use approx::assert_abs_diff_eq;

    fn track(px: fsw, py: fsw, pz: fsw, charge: i32) -> TrackState {
        TrackState::from_momentum(&Point3::origin(), px, py, pz, charge)
    }

    #[test]
    fn straight_line_stops_just_past_sphere() {
        let mut swimmer = PathSwimmer::new(PathSwimmerConfig::default());
        let trajectory = swimmer
            .swim(
                &UniformField::<f64>::zero(),
                &track(1.0, 1.0, 1.0, 1),
                &Boundary::sphere(1.5),
            )
            .unwrap();
        assert_eq!(trajectory.stopping_cause(), StoppingCause::ReachedBoundary);
        let radius = trajectory.last().position.distance_from_origin();
        assert!(radius > 1.5);
        assert!(radius <= 1.5 + PathSwimmerConfig::DEFAULT_ACCURACY);
        assert_abs_diff_eq!(trajectory.path_length(), radius, epsilon = 1e-9);
    }

    #[test]
    fn circle_in_solenoidal_field_never_reaches_large_cylinder() {
        // pT = 0.3 GeV/c in 10 kG gives a radius of about 1 m
        let mut swimmer = PathSwimmer::new(PathSwimmerConfig::default());
        let trajectory = swimmer
            .swim(
                &UniformField::new(0.0, 0.0, 10.0),
                &track(0.3, 0.0, 0.0, -1),
                &Boundary::cylinder(2.5),
            )
            .unwrap();
        assert_eq!(
            trajectory.stopping_cause(),
            StoppingCause::PathLengthExhausted
        );
        assert_abs_diff_eq!(
            trajectory.path_length(),
            TrackState::DEFAULT_MAX_PATH_LENGTH,
            epsilon = 1e-9
        );
        let radius_of_curvature = 0.3 / (CURVATURE_PER_KG_M * 10.0);
        for point in trajectory.points() {
            assert!(point.position.transverse_distance() <= 2.0 * radius_of_curvature + 1e-6);
        }
    }

    #[test]
    fn leaving_radial_bound_terminates() {
        let mut swimmer = PathSwimmer::new(PathSwimmerConfig::default());
        let trajectory = swimmer
            .swim(
                &UniformField::<f64>::zero(),
                &track(0.0, 0.0, 1.0, 1).with_max_radius(2.0),
                &Boundary::cylinder(1.0),
            )
            .unwrap();
        assert_eq!(trajectory.stopping_cause(), StoppingCause::OutOfBounds);
        assert!(trajectory.last().position.distance_from_origin() > 2.0);
    }

    #[test]
    fn plane_crossing_is_refined_on_stopping_side() {
        let mut swimmer = PathSwimmer::new(PathSwimmerConfig::default());
        let boundary = Boundary::plane(&Vec3::new(1.0, 0.0, 1.0), 0.5, Crossing::Increasing).unwrap();
        let trajectory = swimmer
            .swim(
                &UniformField::new(0.0, 2.0, 0.0),
                &track(0.2, 0.0, 1.0, 1),
                &boundary,
            )
            .unwrap();
        let excess = boundary.excess(&trajectory.last().position);
        assert!(excess > 0.0);
        assert!(excess <= PathSwimmerConfig::DEFAULT_ACCURACY);
    }

    #[test]
    fn start_beyond_boundary_stops_immediately() {
        let mut swimmer = PathSwimmer::new(PathSwimmerConfig::default());
        let start = TrackState::from_momentum(&Point3::new(300.0, 0.0, 0.0), 1.0, 0.0, 0.0, 1);
        let trajectory = swimmer
            .swim(
                &UniformField::<f64>::zero(),
                &start,
                &Boundary::cylinder(2.0),
            )
            .unwrap();
        assert_eq!(trajectory.number_of_points(), 1);
        assert_eq!(trajectory.path_length(), 0.0);
    }
}
