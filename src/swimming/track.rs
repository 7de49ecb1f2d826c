//! Construction of the track state that a swim starts from.

use super::fsw;
use crate::{
    geometry::{Point3, Vec3},
    units::CM_PER_M,
};

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Whether to swim along the momentum or retrace the track against it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SwimDirection {
    Forward,
    Backward,
}

impl SwimDirection {
    /// Returns 1 for forward and -1 for backward swimming.
    pub fn sign(self) -> i32 {
        match self {
            SwimDirection::Forward => 1,
            SwimDirection::Backward => -1,
        }
    }
}

/// Kinematic state of a particle at the start of a swim.
///
/// Positions and lengths are stored in meters, angles in degrees and
/// momentum in GeV/c. The charge is the effective charge used for
/// swimming, which is the particle charge times the sign of the swim
/// direction.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub struct TrackState {
    position: Point3<fsw>,
    phi: fsw,
    theta: fsw,
    momentum: fsw,
    charge: i32,
    charge_flipped: bool,
    max_path_length: fsw,
    max_radius: fsw,
}

impl TrackState {
    /// Default path-length budget [m].
    pub const DEFAULT_MAX_PATH_LENGTH: fsw = 9.0;
    /// Default radial safety bound [m].
    pub const DEFAULT_MAX_RADIUS: fsw = 8.0;

    /// Creates a track state from slopes relative to the z-axis, swimming in
    /// the given direction.
    ///
    /// # Parameters
    ///
    /// - `direction`: Backward swimming reverses the momentum and flips the charge.
    /// - `position`: Start position [cm].
    /// - `thx`: Slope px/pz.
    /// - `thy`: Slope py/pz.
    /// - `momentum`: Total momentum [GeV/c].
    /// - `charge`: Particle charge.
    pub fn with_direction(
        direction: SwimDirection,
        position: &Point3<fsw>,
        thx: fsw,
        thy: fsw,
        momentum: fsw,
        charge: i32,
    ) -> Self {
        let sign = fsw::from(direction.sign());
        let pz = sign * momentum / fsw::sqrt(thx * thx + thy * thy + 1.0);
        let mut state = Self::from_momentum(position, thx * pz, thy * pz, pz, charge);
        state.charge = direction.sign() * charge;
        state.charge_flipped = direction == SwimDirection::Backward;
        state
    }

    /// Creates a track state from slopes relative to the z-axis, swimming forward.
    pub fn from_slopes(position: &Point3<fsw>, thx: fsw, thy: fsw, momentum: fsw, charge: i32) -> Self {
        Self::with_direction(SwimDirection::Forward, position, thx, thy, momentum, charge)
    }

    /// Creates a track state from the momentum components [GeV/c] at a position [cm].
    pub fn from_momentum(position: &Point3<fsw>, px: fsw, py: fsw, pz: fsw, charge: i32) -> Self {
        let momentum = fsw::sqrt(px * px + py * py + pz * pz);
        let theta = if momentum > 0.0 {
            fsw::acos((pz / momentum).clamp(-1.0, 1.0)).to_degrees()
        } else {
            0.0
        };
        let phi = fsw::atan2(py, px).to_degrees();
        Self::new(position, phi, theta, momentum, charge)
    }

    /// Creates a track state from the azimuthal and polar angles [deg] of the
    /// momentum, with the path-length budget [cm] overridden.
    pub fn from_angles(
        position: &Point3<fsw>,
        phi: fsw,
        theta: fsw,
        momentum: fsw,
        charge: i32,
        max_path_length: fsw,
    ) -> Self {
        let mut state = Self::new(position, phi, theta, momentum, charge);
        state.max_path_length = max_path_length / CM_PER_M;
        state
    }

    fn new(position: &Point3<fsw>, phi: fsw, theta: fsw, momentum: fsw, charge: i32) -> Self {
        TrackState {
            position: position.scaled(1.0 / CM_PER_M),
            phi,
            theta,
            momentum,
            charge,
            charge_flipped: false,
            max_path_length: Self::DEFAULT_MAX_PATH_LENGTH,
            max_radius: Self::DEFAULT_MAX_RADIUS,
        }
    }

    /// Returns a copy of the state with the given radial safety bound [m].
    pub fn with_max_radius(mut self, max_radius: fsw) -> Self {
        self.max_radius = max_radius;
        self
    }

    /// Returns the start position [m].
    pub fn position(&self) -> &Point3<fsw> {
        &self.position
    }

    /// Returns the start position [cm].
    pub fn position_cm(&self) -> Point3<fsw> {
        self.position.scaled(CM_PER_M)
    }

    /// Returns the azimuthal angle of the momentum [deg].
    pub fn phi(&self) -> fsw {
        self.phi
    }

    /// Returns the polar angle of the momentum [deg].
    pub fn theta(&self) -> fsw {
        self.theta
    }

    /// Returns the total momentum [GeV/c].
    pub fn momentum(&self) -> fsw {
        self.momentum
    }

    /// Returns the effective charge used for swimming.
    pub fn charge(&self) -> i32 {
        self.charge
    }

    /// Whether the effective charge is the flipped particle charge.
    pub fn is_charge_flipped(&self) -> bool {
        self.charge_flipped
    }

    /// Returns the path-length budget [m].
    pub fn max_path_length(&self) -> fsw {
        self.max_path_length
    }

    /// Returns the radial safety bound [m].
    pub fn max_radius(&self) -> fsw {
        self.max_radius
    }

    /// Computes the unit vector along the momentum.
    pub fn direction(&self) -> Vec3<fsw> {
        Vec3::from_spherical_angles(self.phi.to_radians(), self.theta.to_radians())
    }

    /// Computes the momentum vector [GeV/c].
    pub fn momentum_vector(&self) -> Vec3<fsw> {
        self.direction() * self.momentum
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::geometry::Dim3::{X, Y, Z};
    use approx::assert_abs_diff_eq;

    #[test]
    fn slopes_give_consistent_momentum() {
        let state = TrackState::from_slopes(&Point3::new(10.0, -20.0, 30.0), 0.2, -0.1, 2.0, -1);
        let p = state.momentum_vector();
        assert_abs_diff_eq!(state.momentum(), 2.0, epsilon = 1e-12);
        assert_abs_diff_eq!(p[X] / p[Z], 0.2, epsilon = 1e-12);
        assert_abs_diff_eq!(p[Y] / p[Z], -0.1, epsilon = 1e-12);
        assert!(p[Z] > 0.0);
        assert_abs_diff_eq!(state.position()[Z], 0.3, epsilon = 1e-15);
        assert_eq!(state.charge(), -1);
        assert!(!state.is_charge_flipped());
    }

    #[test]
    fn backward_direction_flips_charge_and_momentum() {
        let position = Point3::new(0.0, 0.0, 100.0);
        let state = TrackState::with_direction(SwimDirection::Backward, &position, 0.1, 0.3, 1.5, 1);
        assert!(state.is_charge_flipped());
        assert_eq!(state.charge(), -1);
        let p = state.momentum_vector();
        assert!(p[Z] < 0.0);
        assert_abs_diff_eq!(p[X] / p[Z], 0.1, epsilon = 1e-12);
        assert_abs_diff_eq!(p[Y] / p[Z], 0.3, epsilon = 1e-12);
    }

    #[test]
    fn momentum_components_round_trip_through_angles() {
        let state = TrackState::from_momentum(&Point3::origin(), -0.3, 0.4, 1.2, 1);
        let p = state.momentum_vector();
        assert_abs_diff_eq!(p, Vec3::new(-0.3, 0.4, 1.2), epsilon = 1e-12);
        assert_abs_diff_eq!(state.momentum(), 1.3, epsilon = 1e-12);
    }

    #[test]
    fn angle_setter_overrides_path_budget_in_centimeters() {
        let state = TrackState::from_angles(&Point3::origin(), 30.0, 10.0, 1.0, 1, 250.0);
        assert_abs_diff_eq!(state.max_path_length(), 2.5, epsilon = 1e-15);
        assert_eq!(state.max_radius(), TrackState::DEFAULT_MAX_RADIUS);
        let default = TrackState::from_momentum(&Point3::origin(), 0.0, 0.0, 1.0, 1);
        assert_eq!(default.max_path_length(), TrackState::DEFAULT_MAX_PATH_LENGTH);
    }
}
