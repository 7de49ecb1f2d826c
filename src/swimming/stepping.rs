//! Stepping along the solution of a system of ordinary differential equations.

pub mod rkf;

use super::fsw;
use std::fmt;

#[cfg(feature = "serialization")]
use serde::Serialize;

/// Stepping in the direction of increasing or decreasing independent variable.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
pub enum SteppingSense {
    Same,
    Opposite,
}

impl SteppingSense {
    /// Returns the stepping sense for stepping from `start` towards `target`.
    pub fn towards(start: fsw, target: fsw) -> Self {
        if target >= start {
            SteppingSense::Same
        } else {
            SteppingSense::Opposite
        }
    }

    /// Returns 1 for the same sense and -1 for the opposite sense.
    pub fn sign(self) -> fsw {
        match self {
            SteppingSense::Same => 1.0,
            SteppingSense::Opposite => -1.0,
        }
    }
}

/// A stepper result which is either OK (with an an abitrary value) or stopped (with a cause).
#[derive(Clone, Debug)]
pub enum StepperResult<T> {
    Ok(T),
    Stopped(StoppingCause),
}

/// Reason for terminating stepping.
#[derive(Copy, Clone, PartialEq, Eq, Debug)]
#[cfg_attr(feature = "serialization", derive(Serialize))]
pub enum StoppingCause {
    /// The target boundary was reached.
    ReachedBoundary,
    /// The path-length budget was used up.
    PathLengthExhausted,
    /// The radial safety bound was exceeded.
    OutOfBounds,
    /// No step with acceptable error was found within the allowed number of attempts.
    TooManyAttempts,
    /// The step length shrank below the smallest allowed value.
    StepCollapse,
    /// The maximum number of steps was taken.
    TooManySteps,
    /// The state became infinite or NaN.
    NonFinite,
    /// The trajectory turned too far away from the direction of the independent variable.
    TurnedAround,
}

impl StoppingCause {
    /// Whether the cause signals a numerical failure rather than a regular termination.
    pub fn is_divergence(self) -> bool {
        matches!(
            self,
            StoppingCause::TooManyAttempts
                | StoppingCause::StepCollapse
                | StoppingCause::TooManySteps
                | StoppingCause::NonFinite
                | StoppingCause::TurnedAround
        )
    }
}

impl fmt::Display for StoppingCause {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}",
            match self {
                StoppingCause::ReachedBoundary => "reached boundary",
                StoppingCause::PathLengthExhausted => "path length exhausted",
                StoppingCause::OutOfBounds => "out of bounds",
                StoppingCause::TooManyAttempts => "too many step attempts",
                StoppingCause::StepCollapse => "step length collapsed",
                StoppingCause::TooManySteps => "too many steps",
                StoppingCause::NonFinite => "non-finite state",
                StoppingCause::TurnedAround => "turned around",
            }
        )
    }
}

/// Defines a system of `N` first order ordinary differential equations.
pub trait OdeSystem<const N: usize> {
    /// Computes the derivatives of the dependent variables with respect to
    /// the independent variable.
    fn derivatives(&self, parameter: fsw, values: &[fsw; N]) -> StepperResult<[fsw; N]>;
}

/// Defines the properties of a stepping scheme.
pub trait Stepper<const N: usize> {
    /// Places the stepper at the given initial state.
    ///
    /// # Parameters
    ///
    /// - `system`: System of equations to step.
    /// - `sense`: Whether to step towards increasing or decreasing independent variable.
    /// - `parameter`: Initial value of the independent variable.
    /// - `values`: Initial values of the dependent variables.
    ///
    /// # Returns
    ///
    /// A `StepperResult<()>` which is either:
    ///
    /// - `Ok`: Stepper placement succeeded.
    /// - `Stopped`: Contains a `StoppingCause` indicating why stepper placement failed.
    ///
    /// # Type parameters
    ///
    /// - `S`: Type of equation system.
    fn place<S>(
        &mut self,
        system: &S,
        sense: SteppingSense,
        parameter: fsw,
        values: &[fsw; N],
    ) -> StepperResult<()>
    where
        S: OdeSystem<N>;

    /// Performs a step no longer than the given limit.
    ///
    /// # Parameters
    ///
    /// - `system`: System of equations to step.
    /// - `max_step_length`: Upper limit on the length of this step.
    ///
    /// # Returns
    ///
    /// A `StepperResult<()>` which is either:
    ///
    /// - `Ok`: The step succeeded.
    /// - `Stopped`: Contains a `StoppingCause` indicating why the step failed.
    ///
    /// # Type parameters
    ///
    /// - `S`: Type of equation system.
    fn step<S>(&mut self, system: &S, max_step_length: fsw) -> StepperResult<()>
    where
        S: OdeSystem<N>;

    /// Computes the interpolated state at the given fraction between the
    /// previous and current state.
    fn interpolate(&self, fraction: fsw) -> [fsw; N];

    /// Returns the current values of the dependent variables.
    fn values(&self) -> &[fsw; N];

    /// Returns the current value of the independent variable.
    fn parameter(&self) -> fsw;

    /// Returns the value of the independent variable before the previous step.
    fn previous_parameter(&self) -> fsw;
}
