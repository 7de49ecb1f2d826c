//! Stepping using the the Dormand-Prince scheme,
//! a fifth-order Runge-Kutta method with error
//! estimation through an embedded fourth-order step.

use super::super::{OdeSystem, Stepper, StepperResult, SteppingSense};
use super::{
    all_finite, combine, PIControlParams, RKFStepper, RKFStepperConfig, RKFStepperState,
    StepAttempt,
};
use crate::swimming::{fsw, stepping::StoppingCause};

/// A stepper using the fifth order Runge–Kutta–Fehlberg method.
#[derive(Clone, Debug)]
pub struct RKF45Stepper<const N: usize>(RKFStepperState<N>);

macro_rules! derivatives_or_stop {
    ($system:expr, $parameter:expr, $values:expr) => {
        match $system.derivatives($parameter, $values) {
            StepperResult::Ok(derivatives) => derivatives,
            StepperResult::Stopped(cause) => return StepperResult::Stopped(cause),
        }
    };
}

impl<const N: usize> RKF45Stepper<N> {
    const ORDER: u8 = 5;
    const N_INTERMEDIATE_STEPS: usize = 5;

    const C2: fsw = 1.0 / 5.0;
    const C3: fsw = 3.0 / 10.0;
    const C4: fsw = 4.0 / 5.0;
    const C5: fsw = 8.0 / 9.0;

    const A21: fsw = 1.0 / 5.0;
    const A31: fsw = 3.0 / 40.0;
    const A32: fsw = 9.0 / 40.0;
    const A41: fsw = 44.0 / 45.0;
    const A42: fsw = -56.0 / 15.0;
    const A43: fsw = 32.0 / 9.0;
    const A51: fsw = 19_372.0 / 6561.0;
    const A52: fsw = -25_360.0 / 2187.0;
    const A53: fsw = 64_448.0 / 6561.0;
    const A54: fsw = -212.0 / 729.0;
    const A61: fsw = 9017.0 / 3168.0;
    const A62: fsw = -355.0 / 33.0;
    const A63: fsw = 46_732.0 / 5247.0;
    const A64: fsw = 49.0 / 176.0;
    const A65: fsw = -5103.0 / 18_656.0;
    const A71: fsw = 35.0 / 384.0;
    //  const A72: fsw =       0.0         ;
    const A73: fsw = 500.0 / 1113.0;
    const A74: fsw = 125.0 / 192.0;
    const A75: fsw = -2187.0 / 6784.0;
    const A76: fsw = 11.0 / 84.0;

    const E1: fsw = 71.0 / 57_600.0;
    //  const E2: fsw =       0.0          ;
    const E3: fsw = -71.0 / 16_695.0;
    const E4: fsw = 71.0 / 1920.0;
    const E5: fsw = -17_253.0 / 339_200.0;
    const E6: fsw = 22.0 / 525.0;
    const E7: fsw = -1.0 / 40.0;

    const D1: fsw = -12_715_105_075.0 / 11_282_082_432.0;
    //  const D2: fsw =               0.0                  ;
    const D3: fsw = 87_487_479_700.0 / 32_700_410_799.0;
    const D4: fsw = -10_690_763_975.0 / 1_880_347_072.0;
    const D5: fsw = 701_980_252_875.0 / 199_316_789_632.0;
    const D6: fsw = -1_453_857_185.0 / 822_651_844.0;
    const D7: fsw = 69_997_945.0 / 29_380_423.0;

    /// Creates a new RKF45 stepper with the given configuration and
    /// absolute error tolerance for each dependent variable.
    pub fn new(config: RKFStepperConfig, tolerances: [fsw; N]) -> Self {
        config.validate();
        assert!(
            tolerances.iter().all(|&tolerance| tolerance > 0.0),
            "Error tolerances must be larger than zero."
        );

        let pi_control = if config.use_pi_control {
            PIControlParams::activated(Self::ORDER)
        } else {
            PIControlParams::deactivated(Self::ORDER)
        };
        let step_length = config.initial_step_length;
        let error = config.initial_error;

        RKF45Stepper(RKFStepperState {
            config,
            pi_control,
            tolerances,
            sense: SteppingSense::Same,
            parameter: 0.0,
            values: [0.0; N],
            derivatives: [0.0; N],
            step_length,
            error,
            previous_step_length: 0.0,
            previous_parameter: 0.0,
            previous_values: [0.0; N],
            previous_derivatives: [0.0; N],
            intermediate_derivatives: Vec::with_capacity(Self::N_INTERMEDIATE_STEPS),
        })
    }
}

impl<const N: usize> RKFStepper<N> for RKF45Stepper<N> {
    fn state(&self) -> &RKFStepperState<N> {
        &self.0
    }
    fn state_mut(&mut self) -> &mut RKFStepperState<N> {
        &mut self.0
    }

    fn attempt_step<S>(&self, system: &S, step_length: fsw) -> StepperResult<StepAttempt<N>>
    where
        S: OdeSystem<N>,
    {
        let state = self.state();
        let h = state.sense.sign() * step_length;
        let t = state.parameter;
        let y = &state.values;
        let k1 = &state.derivatives;

        let y2 = combine(y, &[(Self::A21, k1)], h);
        let k2 = derivatives_or_stop!(system, t + Self::C2 * h, &y2);

        let y3 = combine(y, &[(Self::A31, k1), (Self::A32, &k2)], h);
        let k3 = derivatives_or_stop!(system, t + Self::C3 * h, &y3);

        let y4 = combine(y, &[(Self::A41, k1), (Self::A42, &k2), (Self::A43, &k3)], h);
        let k4 = derivatives_or_stop!(system, t + Self::C4 * h, &y4);

        let y5 = combine(
            y,
            &[
                (Self::A51, k1),
                (Self::A52, &k2),
                (Self::A53, &k3),
                (Self::A54, &k4),
            ],
            h,
        );
        let k5 = derivatives_or_stop!(system, t + Self::C5 * h, &y5);

        let y6 = combine(
            y,
            &[
                (Self::A61, k1),
                (Self::A62, &k2),
                (Self::A63, &k3),
                (Self::A64, &k4),
                (Self::A65, &k5),
            ],
            h,
        );
        let k6 = derivatives_or_stop!(system, t + h, &y6);

        let next_values = combine(
            y,
            &[
                (Self::A71, k1),
                (Self::A73, &k3),
                (Self::A74, &k4),
                (Self::A75, &k5),
                (Self::A76, &k6),
            ],
            h,
        );
        if !all_finite(&next_values) {
            return StepperResult::Stopped(StoppingCause::NonFinite);
        }
        let next_derivatives = derivatives_or_stop!(system, t + h, &next_values);

        StepperResult::Ok(StepAttempt {
            step_length,
            next_values,
            next_derivatives,
            intermediate_derivatives: vec![k2, k3, k4, k5, k6],
        })
    }

    fn compute_error_deltas(&self, attempt: &StepAttempt<N>) -> [fsw; N] {
        let state = self.state();
        combine(
            &[0.0; N],
            &[
                (Self::E1, &state.derivatives),
                (Self::E3, &attempt.intermediate_derivatives[1]),
                (Self::E4, &attempt.intermediate_derivatives[2]),
                (Self::E5, &attempt.intermediate_derivatives[3]),
                (Self::E6, &attempt.intermediate_derivatives[4]),
                (Self::E7, &attempt.next_derivatives),
            ],
            attempt.step_length,
        )
    }

    fn compute_dense_interpolation_coefs(&self) -> Vec<[fsw; N]> {
        let state = self.state();
        let h = state.sense.sign() * state.previous_step_length;
        let coef_vec_1 = state.previous_values;
        let coef_vec_2 = combine(&state.values, &[(-1.0, &state.previous_values)], 1.0);
        let coef_vec_3 = combine(
            &[0.0; N],
            &[(h, &state.previous_derivatives), (-1.0, &coef_vec_2)],
            1.0,
        );
        let coef_vec_4 = combine(
            &coef_vec_2,
            &[(-h, &state.derivatives), (-1.0, &coef_vec_3)],
            1.0,
        );
        let coef_vec_5 = combine(
            &[0.0; N],
            &[
                (Self::D1, &state.previous_derivatives),
                (Self::D3, &state.intermediate_derivatives[1]),
                (Self::D4, &state.intermediate_derivatives[2]),
                (Self::D5, &state.intermediate_derivatives[3]),
                (Self::D6, &state.intermediate_derivatives[4]),
                (Self::D7, &state.derivatives),
            ],
            h,
        );
        vec![coef_vec_1, coef_vec_2, coef_vec_3, coef_vec_4, coef_vec_5]
    }

    fn interpolate_dense_values(&self, coefs: &[[fsw; N]], fraction: fsw) -> [fsw; N] {
        debug_assert!((0.0..=1.0).contains(&fraction));
        let one_minus_fraction = 1.0 - fraction;
        let values = combine(&coefs[3], &[(one_minus_fraction, &coefs[4])], 1.0);
        let values = combine(&coefs[2], &[(fraction, &values)], 1.0);
        let values = combine(&coefs[1], &[(one_minus_fraction, &values)], 1.0);
        combine(&coefs[0], &[(fraction, &values)], 1.0)
    }
}

impl<const N: usize> Stepper<N> for RKF45Stepper<N> {
    fn place<S>(
        &mut self,
        system: &S,
        sense: SteppingSense,
        parameter: fsw,
        values: &[fsw; N],
    ) -> StepperResult<()>
    where
        S: OdeSystem<N>,
    {
        self.perform_place(system, sense, parameter, values)
    }

    fn step<S>(&mut self, system: &S, max_step_length: fsw) -> StepperResult<()>
    where
        S: OdeSystem<N>,
    {
        self.perform_step(system, max_step_length)
    }

    fn interpolate(&self, fraction: fsw) -> [fsw; N] {
        self.interpolate_previous_step(fraction)
    }

    fn values(&self) -> &[fsw; N] {
        &self.state().values
    }
    fn parameter(&self) -> fsw {
        self.state().parameter
    }
    fn previous_parameter(&self) -> fsw {
        self.state().previous_parameter
    }
}

#[cfg(test)]
mod tests {

    use super::*;

    /// Harmonic oscillator y'' = -y written as a first order system.
    struct Oscillator;

    impl OdeSystem<2> for Oscillator {
        fn derivatives(&self, _parameter: fsw, values: &[fsw; 2]) -> StepperResult<[fsw; 2]> {
            StepperResult::Ok([values[1], -values[0]])
        }
    }

    struct Exploding;

    impl OdeSystem<1> for Exploding {
        fn derivatives(&self, _parameter: fsw, values: &[fsw; 1]) -> StepperResult<[fsw; 1]> {
            StepperResult::Ok([values[0] * values[0] * 1e300])
        }
    }

    fn stepper<const N: usize>() -> RKF45Stepper<N> {
        RKF45Stepper::new(
            RKFStepperConfig {
                max_step_length: 0.5,
                ..RKFStepperConfig::default()
            },
            [1e-10; N],
        )
    }

    #[test]
    fn oscillator_is_integrated_accurately() {
        let mut stepper = stepper::<2>();
        assert!(matches!(
            stepper.place(&Oscillator, SteppingSense::Same, 0.0, &[0.0, 1.0]),
            StepperResult::Ok(())
        ));
        let end = 3.0;
        while stepper.parameter() < end {
            let remaining = end - stepper.parameter();
            if let StepperResult::Stopped(cause) = stepper.step(&Oscillator, remaining) {
                panic!("Stepping stopped: {}", cause);
            }
        }
        assert!((stepper.parameter() - end).abs() < 1e-12);
        assert!((stepper.values()[0] - end.sin()).abs() < 1e-7);
        assert!((stepper.values()[1] - end.cos()).abs() < 1e-7);
    }

    #[test]
    fn stepping_in_opposite_sense_decreases_parameter() {
        let mut stepper = stepper::<2>();
        stepper.place(&Oscillator, SteppingSense::Opposite, 0.0, &[0.0, 1.0]);
        stepper.step(&Oscillator, 0.1);
        assert!(stepper.parameter() < 0.0);
        let parameter = stepper.parameter();
        assert!((stepper.values()[0] - parameter.sin()).abs() < 1e-8);
    }

    #[test]
    fn dense_output_matches_solution_within_step() {
        let mut stepper = stepper::<2>();
        stepper.place(&Oscillator, SteppingSense::Same, 0.0, &[0.0, 1.0]);
        stepper.step(&Oscillator, 0.4);
        let start = stepper.previous_parameter();
        let length = stepper.parameter() - start;
        for fraction in [0.0, 0.25, 0.5, 0.75, 1.0] {
            let values = stepper.interpolate(fraction);
            let parameter = start + fraction * length;
            assert!((values[0] - parameter.sin()).abs() < 1e-6);
        }
    }

    #[test]
    fn diverging_system_stops_stepping() {
        let mut stepper = stepper::<1>();
        stepper.place(&Exploding, SteppingSense::Same, 0.0, &[1.0]);
        let mut result = StepperResult::Ok(());
        for _ in 0..1000 {
            result = stepper.step(&Exploding, 1.0);
            if let StepperResult::Stopped(_) = result {
                break;
            }
        }
        match result {
            StepperResult::Stopped(cause) => assert!(cause.is_divergence()),
            StepperResult::Ok(_) => panic!("Stepping should have stopped"),
        }
    }
}
