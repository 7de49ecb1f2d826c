//! Units used at the swimming interfaces and inside the integrators.
//!
//! Callers work in centimeters and tesla. The path-length integrator works in
//! meters, the longitudinal integrator in centimeters, and field probes
//! report kilogauss at positions given in centimeters.

use crate::constants::P_PER_B_RADIUS;

/// Floating-point precision to use for units.
#[allow(non_camel_case_types)]
pub type fun = f64;

/// Number of centimeters in a meter.
pub const CM_PER_M: fun = 100.0;
/// Number of kilogauss in a tesla.
pub const KG_PER_T: fun = 10.0;

/// Curvature factor for lengths in meters and fields in kilogauss [GeV/(c kG m)].
pub const CURVATURE_PER_KG_M: fun = P_PER_B_RADIUS / KG_PER_T;
/// Curvature factor for lengths in centimeters and fields in kilogauss [GeV/(c kG cm)].
pub const CURVATURE_PER_KG_CM: fun = CURVATURE_PER_KG_M / CM_PER_M;

/// Length unit used by a trajectory.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LengthUnit {
    Meter,
    Centimeter,
}

impl LengthUnit {
    /// Number of centimeters in one unit.
    pub fn centimeters(self) -> fun {
        match self {
            LengthUnit::Meter => CM_PER_M,
            LengthUnit::Centimeter => 1.0,
        }
    }

    /// Factor converting a field integral in kilogauss times this unit to tesla centimeters.
    pub fn field_integral_to_tesla_cm(self) -> fun {
        self.centimeters() / KG_PER_T
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    #[test]
    fn field_integral_factors_match_unit_systems() {
        // kG m -> T cm and kG cm -> T cm
        assert_eq!(LengthUnit::Meter.field_integral_to_tesla_cm(), 10.0);
        assert_eq!(LengthUnit::Centimeter.field_integral_to_tesla_cm(), 0.1);
    }
}
