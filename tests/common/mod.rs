#![allow(dead_code)]

use trackswim::{
    field::FieldProbe,
    geometry::{
        Dim3::{X, Y, Z},
        Point3,
    },
    swimming::{fsw, Swimmer},
    units::CURVATURE_PER_KG_CM,
};

#[macro_export]
macro_rules! def_swim_test {
    (
        FIELD[$field:expr]
        fn $name:ident |$swimmer:ident| $test_body:block
    ) => {
        #[test]
        fn $name() {
            #[allow(unused_mut)]
            let mut $swimmer = common::swimmer($field);
            $test_body
        }
    };
}

/// Largest distance beyond a boundary accepted for an exit point [cm].
pub const ACCURACY_CM: fsw = 20e-4;

pub fn swimmer<P: FieldProbe>(probe: P) -> Swimmer<P> {
    Swimmer::with_probe(probe)
}

/// Helical trajectory in a uniform field along z.
pub struct Helix {
    start: Point3<fsw>,
    phi: fsw,
    theta: fsw,
    angular_rate: fsw,
}

impl Helix {
    /// Creates the helix of a particle starting at the given position [cm]
    /// with momentum angles [deg], momentum [GeV/c] and charge, in the
    /// field `bz` [kG].
    pub fn new(
        start: &Point3<fsw>,
        phi: fsw,
        theta: fsw,
        momentum: fsw,
        charge: i32,
        bz: fsw,
    ) -> Self {
        Helix {
            start: start.clone(),
            phi: phi.to_radians(),
            theta: theta.to_radians(),
            angular_rate: CURVATURE_PER_KG_CM * fsw::from(charge) * bz / momentum,
        }
    }

    /// Computes the position [cm] after the given path length [cm].
    pub fn position_at(&self, path_length: fsw) -> Point3<fsw> {
        let turned_phi = self.phi - self.angular_rate * path_length;
        let transverse = self.theta.sin() / self.angular_rate;
        Point3::new(
            self.start[X] + transverse * (self.phi.sin() - turned_phi.sin()),
            self.start[Y] + transverse * (turned_phi.cos() - self.phi.cos()),
            self.start[Z] + self.theta.cos() * path_length,
        )
    }

    /// Computes the path length [cm] at which the helix reaches the given z [cm].
    pub fn path_length_at_z(&self, z: fsw) -> fsw {
        (z - self.start[Z]) / self.theta.cos()
    }
}

pub fn distance(a: &Point3<fsw>, b: &Point3<fsw>) -> fsw {
    (a - b).length()
}

pub fn assert_points_close(actual: &Point3<fsw>, expected: &Point3<fsw>, tolerance: fsw) {
    let distance = distance(actual, expected);
    assert!(
        distance <= tolerance,
        "Point {} differs from {} by {} (tolerance {})",
        actual,
        expected,
        distance,
        tolerance
    );
}
