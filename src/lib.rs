//! Numeric core of a field oriented motor controller.
//!
//! The building blocks (filters, PI/PID controllers, the Clarke and Park
//! transforms, the current controller and the space vector modulators) are
//! usable on their own. [`Foc`] wires them together into the per period
//! update that turns measured phase currents and a rotor angle into three
//! phase duty cycles.
//!
//! Everything on the control path is allocation free and runs in bounded
//! time, so it can be called straight from the PWM interrupt.

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

pub mod config;
pub mod current;
pub mod filter;
pub mod math;
pub mod park_clarke;
pub mod pid;
pub mod pwm;
pub mod svpwm;

use current::CurrentController;
use math::{DefaultMath, MathBackend};
use park_clarke::TwoPhaseStationaryOrthogonalReferenceFrame;
use pwm::{Modulation, Modulator};

pub use config::ConfigError;

pub const SQRT_3: f32 = 1.732_050_8;
pub const FRAC_1_SQRT_3: f32 = 0.577_350_26;
pub const FRAC_2_SQRT_3: f32 = 1.154_700_5;
pub const FRAC_SQRT_3_2: f32 = 0.866_025_4;
pub const FRAC_2_3: f32 = 2.0 / 3.0;
pub const FRAC_1_3: f32 = 1.0 / 3.0;

/// Duty cycles of the null vector: every phase at half the period.
pub const NULL_VECTOR_DUTY: [f32; 3] = [0.5; 3];

/// A complete current loop for one motor: Clarke, Park, the d-q current
/// controller, inverse Park and the modulator `M`.
#[derive(Debug, Clone)]
pub struct Foc<M: Modulation, B: MathBackend = DefaultMath> {
    current_controller: CurrentController<B>,
    modulator: Modulator<M, B>,
}

impl<M: Modulation, B: MathBackend> Foc<M, B> {
    pub fn new(current_controller: CurrentController<B>, modulator: Modulator<M, B>) -> Self {
        Self {
            current_controller,
            modulator,
        }
    }

    /// Runs one control period.
    ///
    /// `currents` is either a full three phase measurement or a balanced two
    /// phase one, which picks the matching Clarke transform. `angle_deg` is the
    /// electrical angle in degrees. Returns the duty cycles for phases A, B
    /// and C.
    pub fn update(
        &mut self,
        currents: impl Into<TwoPhaseStationaryOrthogonalReferenceFrame>,
        angle_deg: f32,
    ) -> [f32; 3] {
        let (sin_angle, cos_angle) = B::sin_cos(angle_deg.to_radians());

        let current = park_clarke::park(cos_angle, sin_angle, currents.into());
        let voltage = self.current_controller.run(current, cos_angle, sin_angle);

        self.modulator.set_vref_ab(voltage.alpha, voltage.beta);
        self.modulator.run();
        self.modulator.duties()
    }

    pub fn set_current_reference(&mut self, id_ref: f32, iq_ref: f32) {
        self.current_controller.set_id_ref(id_ref);
        self.current_controller.set_iq_ref(iq_ref);
    }

    pub fn current_controller(&self) -> &CurrentController<B> {
        &self.current_controller
    }

    pub fn current_controller_mut(&mut self) -> &mut CurrentController<B> {
        &mut self.current_controller
    }

    pub fn modulator(&self) -> &Modulator<M, B> {
        &self.modulator
    }

    pub fn modulator_mut(&mut self) -> &mut Modulator<M, B> {
        &mut self.modulator
    }

    /// Clears the controller integrators, e.g. after the bridge was disabled.
    pub fn reset_state(&mut self) {
        self.current_controller.reset_state();
    }
}

impl<M: Modulation, B: MathBackend> Default for Foc<M, B> {
    fn default() -> Self {
        Self::new(CurrentController::default(), Modulator::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        config::{CurrentLoopConfig, PiGains},
        math::Software,
        park_clarke::{
            ThreePhaseBalancedStationaryReferenceFrame, ThreePhaseStationaryReferenceFrame,
        },
        svpwm::{AlternatingReverse, SevenSegment},
    };
    use approx::assert_abs_diff_eq;

    fn foc<M: Modulation>() -> Foc<M, Software> {
        let gains = PiGains {
            k_p: 0.5,
            k_i: 0.05,
            out_min: -0.8,
            out_max: 0.8,
        };
        let config = CurrentLoopConfig {
            id: gains,
            iq: gains,
        };
        Foc::new(
            CurrentController::from_config(&config).unwrap(),
            Modulator::new(),
        )
    }

    #[test]
    fn idle_loop_outputs_null_vector() {
        let mut foc = foc::<SevenSegment>();
        for angle in [0., 45., 200., 359.] {
            let duty = foc.update(ThreePhaseBalancedStationaryReferenceFrame::default(), angle);
            assert_eq!(duty, NULL_VECTOR_DUTY);
        }
    }

    #[test]
    fn torque_request_produces_q_voltage() {
        let mut foc = foc::<AlternatingReverse>();
        foc.set_current_reference(0., 0.4);
        let duty = foc.update(ThreePhaseBalancedStationaryReferenceFrame::default(), 0.);

        // Vq = 0.5 * 0.4 + 0.05 * 0.4 at 0 degrees lies on +beta.
        let voltage = foc.current_controller().voltage();
        assert_abs_diff_eq!(voltage.alpha, 0., epsilon = 1e-6);
        assert_abs_diff_eq!(voltage.beta, 0.22, epsilon = 1e-6);

        assert_abs_diff_eq!(duty[0], 0.5, epsilon = 1e-6);
        assert!(duty[1] > 0.5);
        assert!(duty[2] < 0.5);
        assert_abs_diff_eq!(duty[1] - duty[2], FRAC_2_SQRT_3 * 0.22, epsilon = 1e-6);
    }

    #[test]
    fn clarke_mode_follows_input_type() {
        let mut balanced = foc::<SevenSegment>();
        let mut full = foc::<SevenSegment>();
        balanced.set_current_reference(0.2, 0.3);
        full.set_current_reference(0.2, 0.3);

        let a = balanced.update(
            ThreePhaseBalancedStationaryReferenceFrame { a: 0.1, b: -0.3 },
            30.,
        );
        let b = full.update(
            ThreePhaseStationaryReferenceFrame {
                a: 0.1,
                b: -0.3,
                c: 0.2,
            },
            30.,
        );
        for (a, b) in a.iter().zip(b) {
            assert_abs_diff_eq!(*a, b, epsilon = 1e-6);
        }
    }

    #[test]
    fn output_stays_in_range_when_saturated() {
        let mut foc = foc::<AlternatingReverse>();
        foc.set_current_reference(5., -5.);
        for step in 0..720 {
            let duty = foc.update(
                ThreePhaseBalancedStationaryReferenceFrame { a: 0., b: 0. },
                step as f32 * 0.5,
            );
            for d in duty {
                assert!((0.0..=1.0).contains(&d));
            }
        }
        // Both axes at 0.8 exceed the inscribed circle and get limited.
        let vref = foc.modulator().vref();
        assert_abs_diff_eq!(
            libm::sqrtf(vref.alpha * vref.alpha + vref.beta * vref.beta),
            FRAC_SQRT_3_2,
            epsilon = 1e-5
        );
    }

    #[test]
    fn reset_clears_integrators() {
        let mut foc = foc::<SevenSegment>();
        foc.set_current_reference(0.1, 0.1);
        foc.update(ThreePhaseBalancedStationaryReferenceFrame::default(), 0.);
        assert!(foc.current_controller().iq_controller().integral() != 0.);

        foc.reset_state();
        assert_eq!(foc.current_controller().id_controller().integral(), 0.);
        assert_eq!(foc.current_controller().iq_controller().integral(), 0.);
    }
}
