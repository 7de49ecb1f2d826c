//! Simple analytical field probes.

use super::FieldProbe;
use crate::{
    geometry::{Point3, Vec3},
    num::BFloat,
    swimming::fsw,
};
use std::marker::PhantomData;

/// A field that has the same value everywhere.
#[derive(Clone, Debug)]
pub struct UniformField<F: BFloat> {
    field: Vec3<F>,
}

impl<F: BFloat> UniformField<F> {
    /// Creates a new uniform field with the given components [kG].
    pub fn new(bx: F, by: F, bz: F) -> Self {
        UniformField {
            field: Vec3::new(bx, by, bz),
        }
    }

    /// Creates a field that is zero everywhere.
    pub fn zero() -> Self {
        UniformField {
            field: Vec3::zero(),
        }
    }
}

impl<F: BFloat> FieldProbe for UniformField<F> {
    type Value = F;

    fn probe(&self, _position: &Point3<fsw>) -> Vec3<F> {
        self.field.clone()
    }
}

/// A field evaluated by a closure taking a position [cm] and returning the field [kG].
#[derive(Clone)]
pub struct FnField<F, C> {
    evaluate: C,
    _phantom: PhantomData<F>,
}

impl<F, C> FnField<F, C>
where
    F: BFloat,
    C: Fn(&Point3<fsw>) -> Vec3<F>,
{
    /// Wraps the given closure as a field probe.
    pub fn new(evaluate: C) -> Self {
        FnField {
            evaluate,
            _phantom: PhantomData,
        }
    }
}

impl<F, C> FieldProbe for FnField<F, C>
where
    F: BFloat,
    C: Fn(&Point3<fsw>) -> Vec3<F>,
{
    type Value = F;

    fn probe(&self, position: &Point3<fsw>) -> Vec3<F> {
        (self.evaluate)(position)
    }
}
