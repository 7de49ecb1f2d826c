//! The `trackswim` crate swims charged-particle tracks through magnetic
//! fields to detector boundaries, returning the exit state and the field
//! integral along the path.
pub mod constants;
pub mod error;
pub mod field;
pub mod geometry;
pub mod num;
pub mod swimming;
pub mod units;
