//! Geometric boundaries that terminate a swim.

use super::fsw;
use crate::{
    error::SwimError,
    geometry::{Dim3::Z, Point3, Vec3},
};

/// Which way a signed distance must cross its boundary value to stop the swim.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crossing {
    /// Stop when the signed distance rises above the boundary value.
    Increasing,
    /// Stop when the signed distance falls below the boundary value.
    Decreasing,
}

impl Crossing {
    /// Interprets a signed direction flag, where negative values mean decreasing.
    pub fn from_sign(direction: i32) -> Self {
        if direction < 0 {
            Crossing::Decreasing
        } else {
            Crossing::Increasing
        }
    }

    fn excess(self, distance: fsw, boundary_value: fsw) -> fsw {
        match self {
            Crossing::Increasing => distance - boundary_value,
            Crossing::Decreasing => boundary_value - distance,
        }
    }
}

/// A stopping boundary, with all lengths in the unit of the integrator
/// evaluating it.
#[derive(Clone, Debug, PartialEq)]
pub enum Boundary {
    /// Plane of constant z.
    LongitudinalPlane { z: fsw, crossing: Crossing },
    /// Plane of points `r` with `normal·r = offset`, where `normal` has unit length.
    Plane {
        normal: Vec3<fsw>,
        offset: fsw,
        crossing: Crossing,
    },
    /// Cylinder around the z-axis.
    Cylinder { radius: fsw },
    /// Sphere around the origin.
    Sphere { radius: fsw },
}

impl Boundary {
    /// Creates a plane of constant z, to be approached from the given start z.
    pub fn longitudinal_plane(z: fsw, start_z: fsw) -> Self {
        let crossing = if z >= start_z {
            Crossing::Increasing
        } else {
            Crossing::Decreasing
        };
        Boundary::LongitudinalPlane { z, crossing }
    }

    /// Creates an arbitrarily oriented plane `normal·r = offset`.
    ///
    /// The normal does not need unit length; the offset is rescaled along
    /// with it so that the plane and crossing condition stay the same.
    pub fn plane(normal: &Vec3<fsw>, offset: fsw, crossing: Crossing) -> Result<Self, SwimError> {
        let length = normal.length();
        if !normal.is_finite() || length == 0.0 || !offset.is_finite() {
            return Err(SwimError::InvalidNormal);
        }
        Ok(Boundary::Plane {
            normal: normal / length,
            offset: offset / length,
            crossing,
        })
    }

    /// Creates a cylinder around the z-axis.
    pub fn cylinder(radius: fsw) -> Self {
        Boundary::Cylinder { radius }
    }

    /// Creates a sphere around the origin.
    pub fn sphere(radius: fsw) -> Self {
        Boundary::Sphere { radius }
    }

    /// Computes how far beyond the boundary the given position lies.
    ///
    /// The value is positive once the boundary has been crossed and
    /// negative before.
    pub fn excess(&self, position: &Point3<fsw>) -> fsw {
        match self {
            Boundary::LongitudinalPlane { z, crossing } => crossing.excess(position[Z], *z),
            Boundary::Plane {
                normal,
                offset,
                crossing,
            } => crossing.excess(position.to_vec3().dot(normal), *offset),
            Boundary::Cylinder { radius } => position.transverse_distance() - radius,
            Boundary::Sphere { radius } => position.distance_from_origin() - radius,
        }
    }

    /// Whether the swim should stop at the given position.
    pub fn is_reached(&self, position: &Point3<fsw>) -> bool {
        self.excess(position) > 0.0
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn longitudinal_plane_crossing_depends_on_start_side() {
        let forward = Boundary::longitudinal_plane(2.0, 0.0);
        assert!(!forward.is_reached(&Point3::new(0.0, 0.0, 1.9)));
        assert!(forward.is_reached(&Point3::new(0.0, 0.0, 2.1)));

        let backward = Boundary::longitudinal_plane(-2.0, 0.0);
        assert!(!backward.is_reached(&Point3::new(0.0, 0.0, -1.9)));
        assert!(backward.is_reached(&Point3::new(0.0, 0.0, -2.1)));
    }

    #[test]
    fn plane_stops_according_to_crossing_direction() {
        let normal = Vec3::new(0.0, 2.0, 0.0);
        let rising = Boundary::plane(&normal, 2.0, Crossing::from_sign(1)).unwrap();
        assert!(!rising.is_reached(&Point3::new(5.0, 0.9, 5.0)));
        assert!(rising.is_reached(&Point3::new(5.0, 1.1, 5.0)));

        let falling = Boundary::plane(&normal, 2.0, Crossing::from_sign(-1)).unwrap();
        assert!(falling.is_reached(&Point3::new(5.0, 0.9, 5.0)));
        assert!(!falling.is_reached(&Point3::new(5.0, 1.1, 5.0)));
    }

    #[test]
    fn zero_normal_is_rejected() {
        assert_eq!(
            Boundary::plane(&Vec3::zero(), 1.0, Crossing::Increasing),
            Err(SwimError::InvalidNormal)
        );
    }

    #[test]
    fn cylinder_ignores_z_but_sphere_does_not() {
        let position = Point3::new(0.6, 0.0, 0.8);
        assert!(!Boundary::cylinder(0.7).is_reached(&position));
        assert!(Boundary::sphere(0.7).is_reached(&position));
        assert!((Boundary::sphere(0.7).excess(&position) - 0.3).abs() < 1e-12);
    }
}
