//! Swimming with the longitudinal coordinate z as the independent variable.
//!
//! The state is `[x, y, tx, ty, s]` in centimeters, where `tx = px/pz` and
//! `ty = py/pz` are the transverse slopes and `s` is the path length. Since z
//! advances monotonically, the swim lands exactly on the requested z. Tracks
//! that curl back in z cannot be represented and are reported as diverging.

use super::{
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
    num::sign,
    units::{LengthUnit, CM_PER_M, CURVATURE_PER_KG_CM},
};

/// Distance from the target z [cm] below which the target counts as reached.
const LANDING_TOLERANCE: fsw = 1e-9;

/// Configuration parameters for the longitudinal swimmer.
#[derive(Clone, Debug)]
pub struct LongitudinalSwimmerConfig {
    /// Configuration for the stepper, with lengths in centimeters.
    pub stepper_config: RKFStepperConfig,
    /// Absolute error tolerance for the transverse positions [cm].
    pub position_tolerance: fsw,
    /// Absolute error tolerance for the slopes.
    pub slope_tolerance: fsw,
    /// Absolute error tolerance for the path length [cm].
    pub path_length_tolerance: fsw,
    /// Maximum number of steps before the swim is abandoned.
    pub max_steps: usize,
    /// Largest allowed value of `sqrt(1 + tx² + ty²)`, i.e. the inverse of
    /// the smallest allowed |cos θ|.
    pub max_slope_norm: fsw,
}

/// Start state for a longitudinal swim.
#[derive(Clone, Debug, PartialEq)]
pub struct LongitudinalState {
    /// Start position [cm].
    pub position: Point3<fsw>,
    /// Charge over momentum [c/GeV].
    pub q_over_p: fsw,
    /// Polar angle of the momentum [deg].
    pub theta: fsw,
    /// Azimuthal angle of the momentum [deg].
    pub phi: fsw,
}

/// Swimmer integrating in z towards a target z.
#[derive(Clone, Debug)]
pub struct LongitudinalSwimmer {
    config: LongitudinalSwimmerConfig,
    stepper: RKF45Stepper<5>,
}

struct LongitudinalMotion<'a, P: ?Sized> {
    probe: &'a P,
    q_over_p: fsw,
    pz_sign: fsw,
    max_slope_norm: fsw,
}

impl LongitudinalSwimmerConfig {
    pub const DEFAULT_POSITION_TOLERANCE: fsw = 1e-5;
    pub const DEFAULT_SLOPE_TOLERANCE: fsw = 1e-8;
    pub const DEFAULT_PATH_LENGTH_TOLERANCE: fsw = 1e-5;
    pub const DEFAULT_MAX_STEPS: usize = 100_000;
    pub const DEFAULT_MAX_SLOPE_NORM: fsw = 50.0;

    fn tolerances(&self) -> [fsw; 5] {
        [
            self.position_tolerance,
            self.position_tolerance,
            self.slope_tolerance,
            self.slope_tolerance,
            self.path_length_tolerance,
        ]
    }

    pub fn validate(&self) {
        self.stepper_config.validate();
        assert!(
            self.position_tolerance > 0.0,
            "Position tolerance must be larger than zero."
        );
        assert!(
            self.slope_tolerance > 0.0,
            "Slope tolerance must be larger than zero."
        );
        assert!(
            self.path_length_tolerance > 0.0,
            "Path length tolerance must be larger than zero."
        );
        assert!(self.max_steps > 0, "Maximum number of steps must be larger than zero.");
        assert!(
            self.max_slope_norm > 1.0,
            "Maximum slope norm must be larger than one."
        );
    }
}

impl Default for LongitudinalSwimmerConfig {
    fn default() -> Self {
        LongitudinalSwimmerConfig {
            stepper_config: RKFStepperConfig::default().with_lengths_scaled(CM_PER_M),
            position_tolerance: Self::DEFAULT_POSITION_TOLERANCE,
            slope_tolerance: Self::DEFAULT_SLOPE_TOLERANCE,
            path_length_tolerance: Self::DEFAULT_PATH_LENGTH_TOLERANCE,
            max_steps: Self::DEFAULT_MAX_STEPS,
            max_slope_norm: Self::DEFAULT_MAX_SLOPE_NORM,
        }
    }
}

impl LongitudinalState {
    /// Builds the longitudinal start state of the given track.
    pub fn from_track(track: &TrackState) -> Self {
        LongitudinalState {
            position: track.position_cm(),
            q_over_p: fsw::from(track.charge()) / track.momentum(),
            theta: track.theta(),
            phi: track.phi(),
        }
    }

    /// Returns the sign of pz, or zero for purely transverse momentum.
    pub fn pz_sign(&self) -> fsw {
        let cos_theta = self.theta.to_radians().cos();
        if cos_theta.abs() < 1e-12 {
            0.0
        } else {
            sign(cos_theta)
        }
    }

    /// Whether the momentum points from the start z towards the given target z [cm].
    pub fn is_pz_sign_consistent(&self, z_target: fsw) -> bool {
        let required = z_target - self.position[Z];
        self.pz_sign() * required > 0.0
    }

    fn slopes(&self) -> (fsw, fsw) {
        let tan_theta = self.theta.to_radians().tan();
        let phi = self.phi.to_radians();
        (tan_theta * phi.cos(), tan_theta * phi.sin())
    }
}

impl<'a, P: FieldProbe + ?Sized> LongitudinalMotion<'a, P> {
    fn direction(&self, tx: fsw, ty: fsw) -> Vec3<fsw> {
        Vec3::new(tx, ty, 1.0) * (self.pz_sign / slope_norm(tx, ty))
    }
}

impl<'a, P: FieldProbe + ?Sized> OdeSystem<5> for LongitudinalMotion<'a, P> {
    fn derivatives(&self, z: fsw, values: &[fsw; 5]) -> StepperResult<[fsw; 5]> {
        let [x, y, tx, ty, _] = *values;
        let norm = slope_norm(tx, ty);
        if norm.is_nan() || norm > self.max_slope_norm {
            return StepperResult::Stopped(StoppingCause::TurnedAround);
        }
        let b = self.probe.field(&Point3::new(x, y, z));
        let (bx, by, bz) = (b[X], b[Y], b[Z]);
        let factor = CURVATURE_PER_KG_CM * self.q_over_p * self.pz_sign * norm;
        StepperResult::Ok([
            tx,
            ty,
            factor * (tx * ty * bx - (1.0 + tx * tx) * by + ty * bz),
            factor * ((1.0 + ty * ty) * bx - tx * ty * by - tx * bz),
            self.pz_sign * norm,
        ])
    }
}

fn slope_norm(tx: fsw, ty: fsw) -> fsw {
    fsw::sqrt(1.0 + tx * tx + ty * ty)
}

/// Moves z onto the target plane when it is within the landing tolerance.
fn snapped_z(z: fsw, z_target: fsw) -> fsw {
    if (z_target - z).abs() <= LANDING_TOLERANCE {
        z_target
    } else {
        z
    }
}

impl LongitudinalSwimmer {
    /// Creates a new longitudinal swimmer with the given configuration.
    pub fn new(config: LongitudinalSwimmerConfig) -> Self {
        config.validate();
        let stepper = RKF45Stepper::new(config.stepper_config.clone(), config.tolerances());
        LongitudinalSwimmer { config, stepper }
    }

    /// Returns the configuration of the swimmer.
    pub fn config(&self) -> &LongitudinalSwimmerConfig {
        &self.config
    }

    /// Swims from the given start state to the plane `z = z_target` [cm].
    ///
    /// The returned trajectory is in centimeters and always ends exactly on
    /// the target plane.
    ///
    /// # Errors
    ///
    /// - `InconsistentDirection` if pz does not point towards the target.
    /// - `NumericalDivergence` if the stepping breaks down or the track turns
    ///   too far away from the z-axis.
    pub fn swim<P>(
        &mut self,
        probe: &P,
        start: &LongitudinalState,
        z_target: fsw,
    ) -> SwimOutcome<Trajectory>
    where
        P: FieldProbe + ?Sized,
    {
        let z_start = start.position[Z];
        if !start.is_pz_sign_consistent(z_target) {
            return Err(SwimError::InconsistentDirection {
                start: z_start,
                target: z_target,
            });
        }

        let system = LongitudinalMotion {
            probe,
            q_over_p: start.q_over_p,
            pz_sign: start.pz_sign(),
            max_slope_norm: self.config.max_slope_norm,
        };
        let (tx, ty) = start.slopes();
        let initial_values = [start.position[X], start.position[Y], tx, ty, 0.0];

        let diverged = |cause| SwimError::NumericalDivergence {
            integrator: IntegratorKind::Longitudinal,
            cause,
        };

        let sense = SteppingSense::towards(z_start, z_target);
        if let StepperResult::Stopped(cause) =
            self.stepper.place(&system, sense, z_start, &initial_values)
        {
            return Err(diverged(cause));
        }

        let mut trajectory = Trajectory::new(
            IntegratorKind::Longitudinal,
            LengthUnit::Centimeter,
            TrajectoryPoint {
                position: Point3::new(
                    start.position[X],
                    start.position[Y],
                    snapped_z(z_start, z_target),
                ),
                direction: system.direction(tx, ty),
                path_length: 0.0,
            },
        );

        let mut n_steps = 0;
        loop {
            let remaining = (z_target - trajectory.last().position[Z]).abs();
            if remaining <= LANDING_TOLERANCE {
                break;
            }
            n_steps += 1;
            if n_steps > self.config.max_steps {
                return Err(diverged(StoppingCause::TooManySteps));
            }
            if let StepperResult::Stopped(cause) = self.stepper.step(&system, remaining) {
                return Err(diverged(cause));
            }
            let [x, y, tx, ty, s] = *self.stepper.values();
            let z = snapped_z(self.stepper.parameter(), z_target);
            trajectory.push(TrajectoryPoint {
                position: Point3::new(x, y, z),
                direction: system.direction(tx, ty),
                path_length: s,
            });
        }
        Ok(trajectory.finish(StoppingCause::ReachedBoundary))
    }
}
