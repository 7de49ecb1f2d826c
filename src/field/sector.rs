//! Field lookup in the tilted coordinate systems of the detector sectors.
//!
//! A sector frame is obtained from the lab frame by rotating about the
//! z-axis to the sector midplane and then tilting about the new y-axis, so
//! that the sector's drift chamber planes have constant z.

use super::FieldProbe;
use crate::{
    error::SwimError,
    geometry::{Point3, Vec3},
    swimming::fsw,
};
use lazy_static::lazy_static;
use std::fmt;

/// Number of detector sectors.
pub const N_SECTORS: usize = 6;
/// Tilt of the sector frames relative to the lab z-axis [deg].
pub const SECTOR_TILT: fsw = 25.0;

lazy_static! {
    /// Cosine and sine of the azimuthal rotation of each sector.
    static ref SECTOR_ROTATIONS: [(fsw, fsw); N_SECTORS] = {
        let mut rotations = [(1.0, 0.0); N_SECTORS];
        for (idx, rotation) in rotations.iter_mut().enumerate() {
            let phi = (60.0 * idx as fsw).to_radians();
            *rotation = (phi.cos(), phi.sin());
        }
        rotations
    };
    /// Cosine and sine of the sector tilt.
    static ref SECTOR_TILT_ROTATION: (fsw, fsw) =
        (SECTOR_TILT.to_radians().cos(), SECTOR_TILT.to_radians().sin());
}

/// A detector sector, numbered from 1 to 6.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sector(usize);

impl Sector {
    /// Creates a new sector with the given number.
    pub fn new(number: usize) -> Result<Self, SwimError> {
        if (1..=N_SECTORS).contains(&number) {
            Ok(Sector(number))
        } else {
            Err(SwimError::InvalidSector(number))
        }
    }

    /// Returns the sector number.
    pub fn number(self) -> usize {
        self.0
    }

    /// Transforms a vector from the tilted sector frame to the lab frame.
    pub fn vector_to_lab(self, vector: &Vec3<fsw>) -> Vec3<fsw> {
        let (cos_tilt, sin_tilt) = *SECTOR_TILT_ROTATION;
        let (cos_phi, sin_phi) = SECTOR_ROTATIONS[self.0 - 1];
        vector
            .rotated_about_y(cos_tilt, sin_tilt)
            .rotated_about_z(cos_phi, sin_phi)
    }

    /// Transforms a vector from the lab frame to the tilted sector frame.
    pub fn vector_from_lab(self, vector: &Vec3<fsw>) -> Vec3<fsw> {
        let (cos_tilt, sin_tilt) = *SECTOR_TILT_ROTATION;
        let (cos_phi, sin_phi) = SECTOR_ROTATIONS[self.0 - 1];
        vector
            .rotated_about_z(cos_phi, -sin_phi)
            .rotated_about_y(cos_tilt, -sin_tilt)
    }

    /// Transforms a point from the tilted sector frame to the lab frame.
    pub fn point_to_lab(self, point: &Point3<fsw>) -> Point3<fsw> {
        self.vector_to_lab(&point.to_vec3()).to_point3()
    }
}

impl fmt::Display for Sector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "sector {}", self.number())
    }
}

/// Probe evaluating a lab frame field at positions given in a sector frame,
/// returning the field in the same sector frame.
#[derive(Clone, Debug)]
pub struct SectorProbe<'a, P: ?Sized> {
    sector: Sector,
    lab_probe: &'a P,
}

impl<'a, P: FieldProbe + ?Sized> SectorProbe<'a, P> {
    /// Creates a new sector probe wrapping the given lab frame probe.
    pub fn new(sector: Sector, lab_probe: &'a P) -> Self {
        SectorProbe { sector, lab_probe }
    }
}

impl<'a, P: FieldProbe + ?Sized> FieldProbe for SectorProbe<'a, P> {
    type Value = fsw;

    fn probe(&self, position: &Point3<fsw>) -> Vec3<fsw> {
        let lab_position = self.sector.point_to_lab(position);
        let lab_field = self.lab_probe.field(&lab_position);
        self.sector.vector_from_lab(&lab_field)
    }
}

#[cfg(test)]
mod tests {

    use super::*;
    use crate::field::{FnField, UniformField};
    use crate::geometry::Dim3::{X, Y, Z};

    #[test]
    fn invalid_sector_numbers_are_rejected() {
        assert_eq!(Sector::new(0), Err(SwimError::InvalidSector(0)));
        assert_eq!(Sector::new(7), Err(SwimError::InvalidSector(7)));
        let sector = Sector::new(6).unwrap();
        assert_eq!(sector.number(), 6);
        assert_eq!(sector.to_string(), "sector 6");
    }

    #[test]
    fn sector_transformation_round_trips() {
        let vector = Vec3::new(12.0, -4.0, 250.0);
        for number in 1..=N_SECTORS {
            let sector = Sector::new(number).unwrap();
            let back = sector.vector_from_lab(&sector.vector_to_lab(&vector));
            for dim in [X, Y, Z] {
                assert!((back[dim] - vector[dim]).abs() < 1e-10);
            }
        }
    }

    #[test]
    fn first_sector_only_tilts_about_y() {
        let sector = Sector::new(1).unwrap();
        let lab = sector.vector_to_lab(&Vec3::new(0.0, 0.0, 1.0));
        assert!((lab[X] - SECTOR_TILT.to_radians().sin()).abs() < 1e-12);
        assert!(lab[Y].abs() < 1e-12);
        assert!((lab[Z] - SECTOR_TILT.to_radians().cos()).abs() < 1e-12);
    }

    #[test]
    fn sector_probe_preserves_field_magnitude() {
        let lab_field = UniformField::new(1.0, 2.0, 3.0);
        let sector_probe = SectorProbe::new(Sector::new(4).unwrap(), &lab_field);
        let position = Point3::new(10.0, 20.0, 300.0);
        let magnitude = sector_probe.magnitude(&position);
        assert!((magnitude - lab_field.magnitude(&position)).abs() < 1e-12);
    }

    #[test]
    fn sector_probe_evaluates_lab_field_at_rotated_position() {
        let lab_field = FnField::new(|position: &Point3<fsw>| Vec3::new(0.0, 0.0, position[X]));
        let sector = Sector::new(2).unwrap();
        let sector_probe = SectorProbe::new(sector, &lab_field);
        let position = Point3::new(50.0, 0.0, 100.0);
        let expected = sector.point_to_lab(&position)[X];
        assert!((sector_probe.magnitude(&position) - expected.abs()).abs() < 1e-10);
    }
}
