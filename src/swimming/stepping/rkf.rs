//! Stepping using Runge–Kutta–Fehlberg methods,
//! a set of RK methods with step size adaptation driven by
//! error estimation through an embedded lower-order step.

pub mod rkf45;

use super::{OdeSystem, StepperResult, SteppingSense, StoppingCause};
use crate::swimming::fsw;

#[derive(Clone, Debug)]
struct RKFStepperState<const N: usize> {
    /// Configuration parameters for the stepper.
    config: RKFStepperConfig,
    /// PI control parameters for the stepper.
    pi_control: PIControlParams,
    /// Absolute error tolerance for each dependent variable.
    tolerances: [fsw; N],
    /// Whether the independent variable increases or decreases.
    sense: SteppingSense,
    /// Current value of the independent variable.
    parameter: fsw,
    /// Current values of the dependent variables.
    values: [fsw; N],
    /// Derivatives at the current state.
    derivatives: [fsw; N],
    /// Step length to use in the next step.
    step_length: fsw,
    /// The estimated error of the step from the previous to the current state.
    error: fsw,
    /// The step length used to get from the previous to the current state.
    previous_step_length: fsw,
    /// Value of the independent variable before the previous step.
    previous_parameter: fsw,
    /// Dependent variables before the previous step.
    previous_values: [fsw; N],
    /// Derivatives before the previous step.
    previous_derivatives: [fsw; N],
    /// Intermediate derivatives evaluated during the previous step.
    intermediate_derivatives: Vec<[fsw; N]>,
}

/// Configuration parameters for RKF steppers.
#[derive(Clone, Debug)]
pub struct RKFStepperConfig {
    /// Maximum number of step attempts before terminating.
    pub max_step_attempts: u32,
    /// Scaling factor for the error to reduce oscillations.
    pub safety_factor: fsw,
    /// Smallest allowed scaling of the step size in one step.
    pub min_step_scale: fsw,
    /// Largest allowed scaling of the step size in one step.
    pub max_step_scale: fsw,
    /// Start value for error.
    pub initial_error: fsw,
    /// Initial step size.
    pub initial_step_length: fsw,
    /// Steps shorter than this are considered a collapse of the integration.
    pub min_step_length: fsw,
    /// Steps are never made longer than this.
    pub max_step_length: fsw,
    /// Whether to use Proportional Integral (PI) control for stabilizing the stepping.
    pub use_pi_control: bool,
}

#[derive(Clone, Debug)]
struct PIControlParams {
    k_i: fsw,
    k_p: fsw,
}

#[derive(Clone, Debug)]
enum StepError {
    Acceptable(fsw),
    TooLarge(fsw),
}

#[derive(Clone, Debug)]
struct StepAttempt<const N: usize> {
    step_length: fsw,
    next_values: [fsw; N],
    next_derivatives: [fsw; N],
    intermediate_derivatives: Vec<[fsw; N]>,
}

/// Computes `base + scale*sum(coef*vector)` for the given terms.
fn combine<const N: usize>(base: &[fsw; N], terms: &[(fsw, &[fsw; N])], scale: fsw) -> [fsw; N] {
    let mut result = *base;
    for (coef, vector) in terms {
        let factor = coef * scale;
        for (component, value) in result.iter_mut().zip(vector.iter()) {
            *component += factor * value;
        }
    }
    result
}

fn all_finite<const N: usize>(values: &[fsw; N]) -> bool {
    values.iter().all(|value| value.is_finite())
}

trait RKFStepper<const N: usize> {
    fn state(&self) -> &RKFStepperState<N>;
    fn state_mut(&mut self) -> &mut RKFStepperState<N>;

    fn attempt_step<S>(&self, system: &S, step_length: fsw) -> StepperResult<StepAttempt<N>>
    where
        S: OdeSystem<N>;

    fn compute_error_deltas(&self, attempt: &StepAttempt<N>) -> [fsw; N];

    fn compute_dense_interpolation_coefs(&self) -> Vec<[fsw; N]>;

    /// Computes the interpolated state at the given fraction between
    /// the previous and current state.
    fn interpolate_dense_values(&self, coefs: &[[fsw; N]], fraction: fsw) -> [fsw; N];

    fn reset_state(
        &mut self,
        sense: SteppingSense,
        parameter: fsw,
        values: &[fsw; N],
        derivatives: &[fsw; N],
    ) {
        let state = self.state_mut();
        state.sense = sense;
        state.parameter = parameter;
        state.values = *values;
        state.derivatives = *derivatives;
        state.step_length = state.config.initial_step_length;
        state.error = state.config.initial_error;
        state.previous_step_length = 0.0;
        state.previous_parameter = parameter;
        state.previous_values = *values;
        state.previous_derivatives = *derivatives;
        state.intermediate_derivatives.clear();
    }

    fn perform_place<S>(
        &mut self,
        system: &S,
        sense: SteppingSense,
        parameter: fsw,
        values: &[fsw; N],
    ) -> StepperResult<()>
    where
        S: OdeSystem<N>,
    {
        if !all_finite(values) {
            return StepperResult::Stopped(StoppingCause::NonFinite);
        }
        match system.derivatives(parameter, values) {
            StepperResult::Ok(derivatives) => {
                self.reset_state(sense, parameter, values, &derivatives);
                StepperResult::Ok(())
            }
            StepperResult::Stopped(cause) => StepperResult::Stopped(cause),
        }
    }

    fn perform_step<S>(&mut self, system: &S, max_step_length: fsw) -> StepperResult<()>
    where
        S: OdeSystem<N>,
    {
        let mut attempts = 0;

        while attempts < self.state().config.max_step_attempts {
            let clipped = max_step_length < self.state().step_length;
            let step_length = fsw::min(self.state().step_length, max_step_length);

            let step_attempt = match self.attempt_step(system, step_length) {
                StepperResult::Ok(step_attempt) => step_attempt,
                StepperResult::Stopped(cause) => return StepperResult::Stopped(cause),
            };

            attempts += 1;

            match self.compute_error(&step_attempt) {
                StepError::Acceptable(new_error) => {
                    let new_step_length = if clipped {
                        // A clipped step says nothing about the natural step length
                        self.state().step_length
                    } else {
                        let mut new_step_length =
                            self.compute_step_length_accepted(new_error, step_length);

                        // Don't increase step size if the previous attempt was rejected
                        if attempts > 1 && new_step_length > step_length {
                            new_step_length = step_length;
                        }
                        fsw::min(new_step_length, self.state().config.max_step_length)
                    };

                    self.apply_step_attempt(step_attempt);
                    self.update_step_length(new_step_length, new_error);
                    return StepperResult::Ok(());
                }
                StepError::TooLarge(new_error) => {
                    let new_step_length = self.compute_step_length_rejected(new_error, step_length);
                    if new_step_length < self.state().config.min_step_length {
                        return StepperResult::Stopped(StoppingCause::StepCollapse);
                    }
                    let state = self.state_mut();
                    state.step_length = new_step_length;
                    state.error = new_error;
                }
            };
        }

        StepperResult::Stopped(StoppingCause::TooManyAttempts)
    }

    fn compute_error(&self, attempt: &StepAttempt<N>) -> StepError {
        let state = self.state();
        let error_deltas = self.compute_error_deltas(attempt);

        let squared_error_sum: fsw = error_deltas
            .iter()
            .zip(state.tolerances.iter())
            .map(|(delta, tolerance)| {
                let scaled = delta / tolerance;
                scaled * scaled
            })
            .sum();

        #[allow(clippy::cast_precision_loss)]
        let error = fsw::sqrt(squared_error_sum / N as fsw);

        if error <= 1.0 {
            StepError::Acceptable(error)
        } else {
            StepError::TooLarge(error)
        }
    }

    fn compute_step_length_accepted(&self, new_error: fsw, step_length: fsw) -> fsw {
        let state = self.state();
        let step_scale = if new_error < 1e-9 {
            // Use max step scale directly for very small error to avoid division by zero
            state.config.max_step_scale
        } else {
            let step_scale = state.config.safety_factor * (state.error.powf(state.pi_control.k_i))
                / (new_error.powf(state.pi_control.k_p));
            step_scale.clamp(state.config.min_step_scale, state.config.max_step_scale)
        };
        step_length * step_scale
    }

    fn compute_step_length_rejected(&self, new_error: fsw, step_length: fsw) -> fsw {
        let state = self.state();
        fsw::max(
            state.config.safety_factor / (new_error.powf(state.pi_control.k_p)),
            state.config.min_step_scale,
        ) * step_length
    }

    fn apply_step_attempt(&mut self, attempt: StepAttempt<N>) {
        let state = self.state_mut();
        state.previous_parameter = state.parameter;
        state.previous_values = state.values;
        state.previous_derivatives = state.derivatives;
        state.values = attempt.next_values;
        state.derivatives = attempt.next_derivatives;
        state.parameter += state.sense.sign() * attempt.step_length;
        state.previous_step_length = attempt.step_length;
        state.intermediate_derivatives = attempt.intermediate_derivatives;
    }

    fn update_step_length(&mut self, new_step_length: fsw, new_error: fsw) {
        let state = self.state_mut();
        state.step_length = new_step_length;
        state.error = new_error;
    }

    fn interpolate_previous_step(&self, fraction: fsw) -> [fsw; N] {
        #![allow(clippy::float_cmp)] // Allows the float comparison with zero
        let state = self.state();
        if state.previous_step_length == 0.0 {
            return state.values;
        }
        let coefs = self.compute_dense_interpolation_coefs();
        self.interpolate_dense_values(&coefs, fraction.clamp(0.0, 1.0))
    }
}

impl RKFStepperConfig {
    pub const DEFAULT_MAX_STEP_ATTEMPTS: u32 = 16;
    pub const DEFAULT_SAFETY_FACTOR: fsw = 0.9;
    pub const DEFAULT_MIN_STEP_SCALE: fsw = 0.2;
    pub const DEFAULT_MAX_STEP_SCALE: fsw = 10.0;
    pub const DEFAULT_INITIAL_ERROR: fsw = 1e-4;
    pub const DEFAULT_INITIAL_STEP_LENGTH: fsw = 5e-4;
    pub const DEFAULT_MIN_STEP_LENGTH: fsw = 1e-9;
    pub const DEFAULT_MAX_STEP_LENGTH: fsw = 0.2;
    pub const DEFAULT_USE_PI_CONTROL: bool = true;

    /// Returns a copy of the configuration with all lengths multiplied by the given factor.
    pub fn with_lengths_scaled(&self, factor: fsw) -> Self {
        RKFStepperConfig {
            initial_step_length: self.initial_step_length * factor,
            min_step_length: self.min_step_length * factor,
            max_step_length: self.max_step_length * factor,
            ..self.clone()
        }
    }

    pub fn validate(&self) {
        assert!(
            self.max_step_attempts > 0,
            "Maximum number of step attempts must be larger than zero."
        );
        assert!(
            self.safety_factor > 0.0 && self.safety_factor <= 1.0,
            "Safety factor must be in the range (0, 1]."
        );
        assert!(
            self.min_step_scale > 0.0,
            "Minimum step scale must be larger than zero."
        );
        assert!(
            self.max_step_scale >= self.min_step_scale,
            "Maximum step scale must be larger than or equal to the minimum step scale."
        );
        assert!(
            self.initial_error > 0.0 && self.initial_error <= 1.0,
            "Initial error must be in the range (0, 1]."
        );
        assert!(
            self.min_step_length > 0.0,
            "Minimum step size must be larger than zero."
        );
        assert!(
            self.initial_step_length >= self.min_step_length,
            "Initial step size must be larger than or equal to the minimum step size."
        );
        assert!(
            self.max_step_length >= self.initial_step_length,
            "Maximum step size must be larger than or equal to the initial step size."
        );
    }
}

impl Default for RKFStepperConfig {
    fn default() -> Self {
        RKFStepperConfig {
            max_step_attempts: Self::DEFAULT_MAX_STEP_ATTEMPTS,
            safety_factor: Self::DEFAULT_SAFETY_FACTOR,
            min_step_scale: Self::DEFAULT_MIN_STEP_SCALE,
            max_step_scale: Self::DEFAULT_MAX_STEP_SCALE,
            initial_error: Self::DEFAULT_INITIAL_ERROR,
            initial_step_length: Self::DEFAULT_INITIAL_STEP_LENGTH,
            min_step_length: Self::DEFAULT_MIN_STEP_LENGTH,
            max_step_length: Self::DEFAULT_MAX_STEP_LENGTH,
            use_pi_control: Self::DEFAULT_USE_PI_CONTROL,
        }
    }
}

impl PIControlParams {
    fn activated(scheme_order: u8) -> Self {
        let order = fsw::from(scheme_order);
        let k_i = 0.4 / order;
        let k_p = 1.0 / order - 0.75 * k_i;
        PIControlParams { k_i, k_p }
    }

    fn deactivated(scheme_order: u8) -> Self {
        let order = fsw::from(scheme_order);
        let k_i = 0.0;
        let k_p = 1.0 / order;
        PIControlParams { k_i, k_p }
    }
}
