//! Magnetic field lookup.
//!
//! Field maps are external to this crate. Anything that can report the
//! field at a position implements [`FieldProbe`]; positions are given in
//! centimeters and fields are returned in kilogauss.

pub mod sector;
pub mod uniform;

pub use self::sector::{Sector, SectorProbe};
pub use self::uniform::{FnField, UniformField};

use crate::{
    geometry::{Point3, Vec3},
    num::BFloat,
    swimming::fsw,
};
use std::sync::Arc;

/// Defines the properties of a magnetic field lookup.
pub trait FieldProbe {
    /// Floating point type of the field values.
    type Value: BFloat;

    /// Returns the field vector [kG] at the given position [cm].
    fn probe(&self, position: &Point3<fsw>) -> Vec3<Self::Value>;

    /// Returns the field vector [kG] at the given position [cm]
    /// with swimming precision.
    fn field(&self, position: &Point3<fsw>) -> Vec3<fsw> {
        Vec3::from(&self.probe(position))
    }

    /// Returns the field magnitude [kG] at the given position [cm].
    fn magnitude(&self, position: &Point3<fsw>) -> fsw {
        self.field(position).length()
    }
}

impl<P: FieldProbe + ?Sized> FieldProbe for &P {
    type Value = P::Value;

    fn probe(&self, position: &Point3<fsw>) -> Vec3<Self::Value> {
        (**self).probe(position)
    }
}

impl<P: FieldProbe + ?Sized> FieldProbe for Arc<P> {
    type Value = P::Value;

    fn probe(&self, position: &Point3<fsw>) -> Vec3<Self::Value> {
        (**self).probe(position)
    }
}
