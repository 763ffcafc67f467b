//! Algorithms to convert a value from a two-phase stationary orthogonal
//! reference frame to a value suitable to be used for PWM generation.
//!
//! [`Modulation`] is the stateless algorithm, [`Modulator`] wraps one with the
//! state a control loop keeps between setting the reference and reading the
//! duty cycles back.

use core::marker::PhantomData;

use crate::{
    math::{saturate_duty, DefaultMath, MathBackend},
    park_clarke::TwoPhaseStationaryOrthogonalReferenceFrame,
    svpwm::{AlternatingReverse, Odtv1Norm, SevenSegment, SvGen},
    FRAC_2_3, FRAC_SQRT_3_2, NULL_VECTOR_DUTY,
};

pub trait Modulation {
    /// Returns the three duty cycles in the range 0-1, one for each motor
    /// coil.
    fn modulate(value: TwoPhaseStationaryOrthogonalReferenceFrame) -> [f32; 3];
}

/// Generate PWM values based on a sinusoidal waveform.
///
/// While this method is very simple (and fast) it is less efficient than SVPWM
/// as it does not utilise the bus voltage as well: it leaves the linear range
/// at a magnitude of 0.75 rather than `sqrt(3)/2`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Sinusoidal;

impl Modulation for Sinusoidal {
    fn modulate(value: TwoPhaseStationaryOrthogonalReferenceFrame) -> [f32; 3] {
        let voltages = crate::park_clarke::inverse_clarke(value);

        [voltages.a, voltages.b, voltages.c].map(|v| saturate_duty(0.5 + v * FRAC_2_3))
    }
}

/// A modulator for one inverter, running the algorithm `M` with math backend
/// `B`.
///
/// Unless over-modulation is allowed, references longer than the radius of
/// the circle inscribed in the hexagon (`sqrt(3)/2`) are scaled back onto it
/// before modulating, keeping the output sinusoidal.
#[derive(Debug, Clone)]
pub struct Modulator<M: Modulation, B: MathBackend = DefaultMath> {
    vref: TwoPhaseStationaryOrthogonalReferenceFrame,
    overmodulation: bool,
    duty: [f32; 3],
    _marker: PhantomData<fn() -> (M, B)>,
}

impl<M: Modulation, B: MathBackend> Modulator<M, B> {
    /// The duties start at the null vector output until the first
    /// [`Modulator::run`].
    pub const fn new() -> Self {
        Self {
            vref: TwoPhaseStationaryOrthogonalReferenceFrame {
                alpha: 0.0,
                beta: 0.0,
            },
            overmodulation: false,
            duty: NULL_VECTOR_DUTY,
            _marker: PhantomData,
        }
    }

    /// Set the voltage reference used by the next [`Modulator::run`].
    pub fn set_vref_ab(&mut self, alpha: f32, beta: f32) {
        self.vref = TwoPhaseStationaryOrthogonalReferenceFrame { alpha, beta };
    }

    /// The stored reference, after limiting if [`Modulator::run`] has applied
    /// it.
    pub fn vref(&self) -> TwoPhaseStationaryOrthogonalReferenceFrame {
        self.vref
    }

    pub fn allow_overmodulation(&mut self, allow: bool) {
        self.overmodulation = allow;
    }

    pub fn overmodulation_allowed(&self) -> bool {
        self.overmodulation
    }

    /// Limit the reference (unless over-modulation is allowed) and modulate it.
    pub fn run(&mut self) {
        self.limit_vref();
        self.duty = M::modulate(self.vref);
    }

    pub fn phase_duty_a(&self) -> f32 {
        self.duty[0]
    }

    pub fn phase_duty_b(&self) -> f32 {
        self.duty[1]
    }

    pub fn phase_duty_c(&self) -> f32 {
        self.duty[2]
    }

    pub fn duties(&self) -> [f32; 3] {
        self.duty
    }

    fn limit_vref(&mut self) {
        if self.overmodulation {
            return;
        }

        let TwoPhaseStationaryOrthogonalReferenceFrame { alpha, beta } = self.vref;
        let magnitude = B::sqrt(alpha * alpha + beta * beta);
        if magnitude > FRAC_SQRT_3_2 {
            let scale = FRAC_SQRT_3_2 / magnitude;
            self.vref.alpha = alpha * scale;
            self.vref.beta = beta * scale;
        }
    }
}

impl<M: Modulation, B: MathBackend> Default for Modulator<M, B> {
    fn default() -> Self {
        Self::new()
    }
}

pub type AlternatingReverseModulator<B = DefaultMath> = Modulator<AlternatingReverse, B>;
pub type Odtv1NormModulator<B = DefaultMath> = Modulator<Odtv1Norm, B>;
pub type SvGenModulator<B = DefaultMath> = Modulator<SvGen, B>;
pub type SevenSegmentModulator<B = DefaultMath> = Modulator<SevenSegment, B>;
