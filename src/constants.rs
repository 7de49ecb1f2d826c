//! Physical and mathematical constants.

/// Floating-point precision to use for constants.
#[allow(non_camel_case_types)]
pub type fcn = f64;

// Physical constants

/// Momentum per unit charge, field strength and radius of curvature [GeV/(c T m)].
pub const P_PER_B_RADIUS: fcn = 0.299_792_458;
