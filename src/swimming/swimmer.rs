//! The swim interface used by track reconstruction.
//!
//! A [`Swimmer`] holds the parameters of the current track and a
//! [`SwimSession`]. Swims to longitudinal planes use the fast longitudinal
//! integrator for tracks at or above the fast momentum threshold, and fall
//! back to the path-length integrator if it diverges. All other boundaries,
//! and slower tracks, go straight to the path-length integrator.

use super::{
    boundary::{Boundary, Crossing},
    fsw,
    longitudinal::{LongitudinalState, LongitudinalSwimmer, LongitudinalSwimmerConfig},
    path::{PathSwimmer, PathSwimmerConfig},
    result::{SwimResult, SwimStatus},
    session::SwimSession,
    track::{SwimDirection, TrackState},
};
use crate::{
    error::SwimError,
    field::{FieldProbe, Sector, SectorProbe},
    geometry::{Dim3::Z, Point3, Vec3},
    units::{CM_PER_M, KG_PER_T},
};
use log::{debug, error, warn};

/// Configuration parameters for swimming.
#[derive(Clone, Debug)]
pub struct SwimmerConfig {
    /// Tracks with lower momentum [GeV/c] are not swum.
    pub min_momentum: fsw,
    /// Tracks with at least this momentum [GeV/c] use the longitudinal
    /// integrator for longitudinal planes.
    pub fast_momentum_threshold: fsw,
    /// Configuration for the path-length integrator.
    pub path: PathSwimmerConfig,
    /// Configuration for the longitudinal integrator.
    pub longitudinal: LongitudinalSwimmerConfig,
}

/// Boundary to swim to, with lengths in centimeters.
#[derive(Clone, Debug, PartialEq)]
pub enum SwimTarget {
    /// Plane of constant z in the tilted frame of a sector.
    SectorPlane { sector: Sector, z: fsw },
    /// Plane of constant z in the lab frame.
    LabPlane { z: fsw },
    /// Plane `normal·r = offset` in the lab frame.
    Plane {
        offset: fsw,
        normal: Vec3<fsw>,
        crossing: Crossing,
    },
    /// Cylinder around the lab z-axis.
    Cylinder { radius: fsw },
    /// Sphere around the lab origin.
    Sphere { radius: fsw },
}

/// Swims the current track to requested boundaries.
#[derive(Clone, Debug)]
pub struct Swimmer<P> {
    session: SwimSession<P>,
    track: Option<TrackState>,
}

struct IntegratorSelector<'a, Q: ?Sized> {
    config: &'a SwimmerConfig,
    probe: &'a Q,
    longitudinal: &'a mut LongitudinalSwimmer,
    path: &'a mut PathSwimmer,
}

impl SwimmerConfig {
    pub const DEFAULT_MIN_MOMENTUM: fsw = 0.05;
    pub const DEFAULT_FAST_MOMENTUM_THRESHOLD: fsw = 0.75;

    pub fn validate(&self) {
        assert!(
            self.min_momentum >= 0.0,
            "Minimum momentum must be larger than or equal to zero."
        );
        assert!(
            self.fast_momentum_threshold >= self.min_momentum,
            "Fast momentum threshold must be larger than or equal to the minimum momentum."
        );
        self.path.validate();
        self.longitudinal.validate();
    }
}

impl Default for SwimmerConfig {
    fn default() -> Self {
        SwimmerConfig {
            min_momentum: Self::DEFAULT_MIN_MOMENTUM,
            fast_momentum_threshold: Self::DEFAULT_FAST_MOMENTUM_THRESHOLD,
            path: PathSwimmerConfig::default(),
            longitudinal: LongitudinalSwimmerConfig::default(),
        }
    }
}

impl<'a, Q: FieldProbe + ?Sized> IntegratorSelector<'a, Q> {
    fn swim_to_z(self, track: &TrackState, z: fsw) -> SwimResult {
        #![allow(clippy::float_cmp)]
        let start_z = track.position_cm()[Z];
        if z == start_z {
            return SwimResult::unmoved(track, SwimStatus::Reached);
        }

        if track.momentum() >= self.config.fast_momentum_threshold {
            let start = LongitudinalState::from_track(track);
            match self.longitudinal.swim(self.probe, &start, z) {
                Ok(trajectory) => {
                    return SwimResult::from_trajectory(&trajectory, track.momentum(), self.probe)
                }
                Err(error @ SwimError::InconsistentDirection { .. }) => {
                    debug!("Refusing swim: {}", error);
                    return SwimResult::rejected(error);
                }
                Err(error) => {
                    warn!("{}, retrying with path-length integration", error);
                }
            }
        }

        let boundary = Boundary::longitudinal_plane(z / CM_PER_M, start_z / CM_PER_M);
        self.swim_to_boundary(track, &boundary)
    }

    fn swim_to_boundary(self, track: &TrackState, boundary: &Boundary) -> SwimResult {
        match self.path.swim(self.probe, track, boundary) {
            Ok(trajectory) => {
                SwimResult::from_trajectory(&trajectory, track.momentum(), self.probe)
            }
            Err(error) => {
                error!("Swimming failed: {}", error);
                SwimResult::failed(error)
            }
        }
    }
}

impl<P: FieldProbe> Swimmer<P> {
    /// Creates a new swimmer using the given session.
    pub fn new(session: SwimSession<P>) -> Self {
        Swimmer {
            session,
            track: None,
        }
    }

    /// Creates a new swimmer with the default configuration swimming through
    /// the given probe.
    pub fn with_probe(probe: P) -> Self {
        Self::new(SwimSession::new(probe, SwimmerConfig::default()))
    }

    /// Returns the session of the swimmer.
    pub fn session(&self) -> &SwimSession<P> {
        &self.session
    }

    /// Returns the current track, if one has been set.
    pub fn track(&self) -> Option<&TrackState> {
        self.track.as_ref()
    }

    /// Sets the current track.
    pub fn set_track(&mut self, track: TrackState) {
        self.track = Some(track);
    }

    /// Sets the current track from a position [cm], slopes relative to the
    /// z-axis, momentum [GeV/c] and charge, swimming in the given direction.
    pub fn set_parameters_with_direction(
        &mut self,
        direction: SwimDirection,
        position: &Point3<fsw>,
        thx: fsw,
        thy: fsw,
        momentum: fsw,
        charge: i32,
    ) {
        self.set_track(TrackState::with_direction(
            direction, position, thx, thy, momentum, charge,
        ));
    }

    /// Sets the current track from a position [cm], slopes relative to the
    /// z-axis, momentum [GeV/c] and charge.
    pub fn set_parameters_from_slopes(
        &mut self,
        position: &Point3<fsw>,
        thx: fsw,
        thy: fsw,
        momentum: fsw,
        charge: i32,
    ) {
        self.set_track(TrackState::from_slopes(position, thx, thy, momentum, charge));
    }

    /// Sets the current track from a position [cm], momentum components
    /// [GeV/c] and charge.
    pub fn set_parameters_from_momentum(
        &mut self,
        position: &Point3<fsw>,
        px: fsw,
        py: fsw,
        pz: fsw,
        charge: i32,
    ) {
        self.set_track(TrackState::from_momentum(position, px, py, pz, charge));
    }

    /// Sets the current track from a position [cm], momentum angles [deg],
    /// momentum [GeV/c], charge and path-length budget [cm].
    pub fn set_parameters_from_angles(
        &mut self,
        position: &Point3<fsw>,
        phi: fsw,
        theta: fsw,
        momentum: fsw,
        charge: i32,
        max_path_length: fsw,
    ) {
        self.set_track(TrackState::from_angles(
            position,
            phi,
            theta,
            momentum,
            charge,
            max_path_length,
        ));
    }

    /// Whether the charge of the current track was flipped for swimming backward.
    pub fn is_charge_flipped(&self) -> bool {
        self.track
            .as_ref()
            .map_or(false, TrackState::is_charge_flipped)
    }

    /// Swims to the plane of constant z [cm] in the tilted frame of the
    /// given sector. The track parameters are taken to be in the same frame.
    pub fn swim_to_sector_plane(&mut self, sector: Sector, z: fsw) -> SwimResult {
        self.swim(&SwimTarget::SectorPlane { sector, z })
    }

    /// Swims to the plane of constant z [cm] in the lab frame.
    pub fn swim_to_lab_plane(&mut self, z: fsw) -> SwimResult {
        self.swim(&SwimTarget::LabPlane { z })
    }

    /// Swims until the transverse distance from the z-axis exceeds the radius [cm].
    pub fn swim_to_cylinder(&mut self, radius: fsw) -> SwimResult {
        self.swim(&SwimTarget::Cylinder { radius })
    }

    /// Swims until the distance from the origin exceeds the radius [cm].
    pub fn swim_to_sphere(&mut self, radius: fsw) -> SwimResult {
        self.swim(&SwimTarget::Sphere { radius })
    }

    /// Swims until the signed distance `normal·r` crosses the offset [cm]
    /// in the given direction.
    pub fn swim_to_plane(&mut self, offset: fsw, normal: &Vec3<fsw>, crossing: Crossing) -> SwimResult {
        self.swim(&SwimTarget::Plane {
            offset,
            normal: normal.clone(),
            crossing,
        })
    }

    /// Swims the current track to the given target.
    ///
    /// Refusals and failures are reported through the status of the
    /// returned result, which then holds zeros.
    pub fn swim(&mut self, target: &SwimTarget) -> SwimResult {
        let track = match &self.track {
            Some(track) => track,
            None => {
                debug!("Refusing swim: {}", SwimError::MissingTrack);
                return SwimResult::rejected(SwimError::MissingTrack);
            }
        };
        let parts = self.session.parts();

        if track.momentum() < parts.config.min_momentum {
            let error = SwimError::BelowFiducialMomentum {
                momentum: track.momentum(),
                minimum: parts.config.min_momentum,
            };
            debug!("Refusing swim: {}", error);
            return SwimResult::rejected(error);
        }

        let boundary = match target {
            SwimTarget::SectorPlane { sector, z } => {
                let probe = SectorProbe::new(*sector, parts.probe);
                return IntegratorSelector {
                    config: parts.config,
                    probe: &probe,
                    longitudinal: parts.longitudinal,
                    path: parts.path,
                }
                .swim_to_z(track, *z);
            }
            SwimTarget::LabPlane { z } => {
                return IntegratorSelector {
                    config: parts.config,
                    probe: parts.probe,
                    longitudinal: parts.longitudinal,
                    path: parts.path,
                }
                .swim_to_z(track, *z);
            }
            SwimTarget::Plane {
                offset,
                normal,
                crossing,
            } => match Boundary::plane(normal, offset / CM_PER_M, *crossing) {
                Ok(boundary) => boundary,
                Err(error) => {
                    debug!("Refusing swim: {}", error);
                    return SwimResult::rejected(error);
                }
            },
            SwimTarget::Cylinder { radius } => Boundary::cylinder(radius / CM_PER_M),
            SwimTarget::Sphere { radius } => Boundary::sphere(radius / CM_PER_M),
        };

        // Compared against the offset as given, not the normalized plane distance
        if let SwimTarget::Plane {
            offset,
            crossing: Crossing::Increasing,
            ..
        } = target
        {
            if track.position().distance_from_origin() > offset / CM_PER_M {
                debug!("Start point already lies beyond the target plane");
                return SwimResult::unmoved(track, SwimStatus::AlreadyPastBoundary);
            }
        }

        IntegratorSelector {
            config: parts.config,
            probe: parts.probe,
            longitudinal: parts.longitudinal,
            path: parts.path,
        }
        .swim_to_boundary(track, &boundary)
    }

    /// Returns the field [T] at the given position [cm] in the tilted frame
    /// of the given sector, expressed in the same frame.
    pub fn field_at(&self, sector: Sector, position: &Point3<fsw>) -> Vec3<fsw> {
        SectorProbe::new(sector, self.session.probe()).field(position) / KG_PER_T
    }

    /// Returns the field [T] at the given position [cm] in the lab frame.
    pub fn field_at_lab(&self, position: &Point3<fsw>) -> Vec3<fsw> {
        self.session.probe().field(position) / KG_PER_T
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::field::UniformField;
    use crate::geometry::Dim3::{X, Y};
    use approx::assert_abs_diff_eq;

    #[test]
    fn swimming_without_track_is_refused() {
        let mut swimmer = Swimmer::with_probe(UniformField::<f64>::zero());
        let result = swimmer.swim_to_sphere(100.0);
        assert_eq!(result.status, SwimStatus::Rejected(SwimError::MissingTrack));
        assert!(result.is_null());
        assert!(!swimmer.is_charge_flipped());
    }

    #[test]
    fn target_at_start_z_returns_start_state() {
        let mut swimmer = Swimmer::with_probe(UniformField::new(0.0, 0.0, 5.0));
        let position = Point3::new(3.0, 4.0, 120.0);
        swimmer.set_parameters_from_slopes(&position, 0.1, 0.0, 2.0, 1);
        let result = swimmer.swim_to_lab_plane(120.0);
        assert_eq!(result.status, SwimStatus::Reached);
        assert_eq!(result.path_length, 0.0);
        assert_abs_diff_eq!(result.position, position, epsilon = 1e-12);
    }

    #[test]
    fn invalid_plane_normal_is_refused() {
        let mut swimmer = Swimmer::with_probe(UniformField::<f64>::zero());
        swimmer.set_parameters_from_momentum(&Point3::origin(), 0.0, 0.0, 1.0, 1);
        let result = swimmer.swim_to_plane(10.0, &Vec3::zero(), Crossing::Increasing);
        assert_eq!(result.status, SwimStatus::Rejected(SwimError::InvalidNormal));
    }

    #[test]
    fn plane_with_scaled_normal_is_not_skipped_before_its_offset() {
        let mut swimmer = Swimmer::with_probe(UniformField::<f64>::zero());
        // 2y = 200 is the plane y = 100 cm, reachable from x = 150 cm
        swimmer.set_parameters_from_momentum(&Point3::new(150.0, 0.0, 0.0), 0.0, 1.0, 0.0, 1);
        let result = swimmer.swim_to_plane(200.0, &Vec3::new(0.0, 2.0, 0.0), Crossing::Increasing);
        assert_eq!(result.status, SwimStatus::Reached);
        assert!(result.position[Y] > 100.0 - 1e-9);
        assert!(result.position[Y] <= 100.0 + 2e-3);
        assert_abs_diff_eq!(result.position[X], 150.0, epsilon = 1e-9);

        // Beyond the offset as given the swim is skipped
        swimmer.set_parameters_from_momentum(&Point3::new(250.0, 0.0, 0.0), 0.0, 1.0, 0.0, 1);
        let result = swimmer.swim_to_plane(200.0, &Vec3::new(0.0, 2.0, 0.0), Crossing::Increasing);
        assert_eq!(result.status, SwimStatus::AlreadyPastBoundary);
        assert_eq!(result.path_length, 0.0);
    }

    #[test]
    fn field_is_reported_in_tesla() {
        let swimmer = Swimmer::with_probe(UniformField::new(0.0, 0.0, 20.0));
        let field = swimmer.field_at_lab(&Point3::new(10.0, 0.0, 0.0));
        assert_abs_diff_eq!(field[Z], 2.0, epsilon = 1e-12);

        // The sector z-axis is tilted 25 degrees away from the lab z-axis
        let sector_field = swimmer.field_at(Sector::new(1).unwrap(), &Point3::origin());
        let tilt = 25.0_f64.to_radians();
        assert_abs_diff_eq!(sector_field[Z], 2.0 * tilt.cos(), epsilon = 1e-12);
        assert_abs_diff_eq!(sector_field[X], -2.0 * tilt.sin(), epsilon = 1e-12);
        assert_abs_diff_eq!(sector_field[Y], 0.0, epsilon = 1e-12);
    }
}
