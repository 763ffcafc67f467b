//! PI and PID controllers with a clamped integrator.
//!
//! Both controllers compute
//!
//! ```text
//! output = clamp(P + I [+ D] + feedforward, out_min, out_max)
//! ```
//!
//! once per control tick. The integrator itself is clamped to the output
//! limits, which bounds windup while the output is saturated. Inputs are not
//! validated: a NaN setpoint or measurement propagates to the output.
//!
//! `out_min <= out_max` is a precondition. It is checked by `debug_assert!`
//! at construction and never on the control path.

#[cfg(feature = "defmt")]
use defmt::Format;

use crate::{filter::LowPassFirstOrder, math::clamp};

/// The inputs of the most recent tick.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct Sample {
    pub setpoint: f32,
    pub process_variable: f32,
    pub feedforward: f32,
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct PIController {
    k_p: f32,
    integral: IntegralComponent,
    out_min: f32,
    out_max: f32,
    last: Sample,
}

impl PIController {
    pub fn new(k_p: f32, k_i: f32, out_min: f32, out_max: f32) -> Self {
        debug_assert!(out_min <= out_max, "output limits are inverted");
        Self {
            k_p,
            integral: IntegralComponent::new(k_i),
            out_min,
            out_max,
            last: Sample::default(),
        }
    }

    /// Runs one controller tick.
    pub fn run(&mut self, setpoint: f32, process_variable: f32, feedforward: f32) -> f32 {
        let error = setpoint - process_variable;

        let p_term = self.k_p * error;
        let i_term = self.integral.update(error, self.out_min, self.out_max);

        self.last = Sample {
            setpoint,
            process_variable,
            feedforward,
        };

        clamp(p_term + i_term + feedforward, self.out_min, self.out_max)
    }

    /// Clears the integrator and the remembered inputs. Gains and limits are
    /// kept.
    pub fn reset_state(&mut self) {
        self.integral.reset();
        self.last = Sample::default();
    }

    pub fn k_p(&self) -> f32 {
        self.k_p
    }

    pub fn set_k_p(&mut self, k_p: f32) {
        self.k_p = k_p;
    }

    pub fn k_i(&self) -> f32 {
        self.integral.k_i
    }

    pub fn set_k_i(&mut self, k_i: f32) {
        self.integral.k_i = k_i;
    }

    pub fn out_min(&self) -> f32 {
        self.out_min
    }

    pub fn set_out_min(&mut self, out_min: f32) {
        self.out_min = out_min;
    }

    pub fn out_max(&self) -> f32 {
        self.out_max
    }

    pub fn set_out_max(&mut self, out_max: f32) {
        self.out_max = out_max;
    }

    /// Current integrator value.
    pub fn integral(&self) -> f32 {
        self.integral.integral
    }

    pub fn last_sample(&self) -> Sample {
        self.last
    }
}

/// PID controller whose derivative term runs through a first order filter.
///
/// The filter shapes the derivative action: the default coefficients pass
/// `k_d * error` straight through, a differentiator can be configured with
/// [`PIDController::set_derivative_filter`].
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct PIDController {
    k_p: f32,
    integral: IntegralComponent,
    derivative: DerivativeComponent,
    out_min: f32,
    out_max: f32,
    last: Sample,
}

impl PIDController {
    pub fn new(k_p: f32, k_i: f32, k_d: f32, out_min: f32, out_max: f32) -> Self {
        debug_assert!(out_min <= out_max, "output limits are inverted");
        Self {
            k_p,
            integral: IntegralComponent::new(k_i),
            derivative: DerivativeComponent::new(k_d),
            out_min,
            out_max,
            last: Sample::default(),
        }
    }

    /// Sets the derivative filter coefficients and seeds its delay line with
    /// the input `x1` and output `y1` at n-1.
    pub fn set_derivative_filter(&mut self, a1: f32, b0: f32, b1: f32, x1: f32, y1: f32) {
        let filter = &mut self.derivative.filter;
        filter.set_a1(a1);
        filter.set_b0(b0);
        filter.set_b1(b1);
        filter.set_initial_condition(x1, y1);
    }

    pub fn derivative_filter(&self) -> &LowPassFirstOrder {
        &self.derivative.filter
    }

    /// Runs one controller tick.
    pub fn run(&mut self, setpoint: f32, process_variable: f32, feedforward: f32) -> f32 {
        let error = setpoint - process_variable;

        let p_term = self.k_p * error;
        let i_term = self.integral.update(error, self.out_min, self.out_max);
        let d_term = self.derivative.update(error);

        self.last = Sample {
            setpoint,
            process_variable,
            feedforward,
        };

        clamp(
            p_term + i_term + d_term + feedforward,
            self.out_min,
            self.out_max,
        )
    }

    /// Clears the integrator, the derivative filter's delay line and the
    /// remembered inputs. Gains, limits and filter coefficients are kept.
    pub fn reset_state(&mut self) {
        self.integral.reset();
        self.derivative.filter.reset();
        self.last = Sample::default();
    }

    pub fn k_p(&self) -> f32 {
        self.k_p
    }

    pub fn set_k_p(&mut self, k_p: f32) {
        self.k_p = k_p;
    }

    pub fn k_i(&self) -> f32 {
        self.integral.k_i
    }

    pub fn set_k_i(&mut self, k_i: f32) {
        self.integral.k_i = k_i;
    }

    pub fn k_d(&self) -> f32 {
        self.derivative.k_d
    }

    pub fn set_k_d(&mut self, k_d: f32) {
        self.derivative.k_d = k_d;
    }

    pub fn out_min(&self) -> f32 {
        self.out_min
    }

    pub fn set_out_min(&mut self, out_min: f32) {
        self.out_min = out_min;
    }

    pub fn out_max(&self) -> f32 {
        self.out_max
    }

    pub fn set_out_max(&mut self, out_max: f32) {
        self.out_max = out_max;
    }

    /// Current integrator value.
    pub fn integral(&self) -> f32 {
        self.integral.integral
    }

    pub fn last_sample(&self) -> Sample {
        self.last
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
struct IntegralComponent {
    k_i: f32,
    integral: f32,
}

impl IntegralComponent {
    const fn new(k_i: f32) -> Self {
        Self { k_i, integral: 0.0 }
    }

    /// With `k_i == 0` the term is zero and the integrator is left alone.
    fn update(&mut self, error: f32, min: f32, max: f32) -> f32 {
        if self.k_i == 0.0 {
            return 0.0;
        }
        self.integral = clamp(self.integral + self.k_i * error, min, max);
        self.integral
    }

    fn reset(&mut self) {
        self.integral = 0.0;
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
struct DerivativeComponent {
    k_d: f32,
    filter: LowPassFirstOrder,
}

impl DerivativeComponent {
    const fn new(k_d: f32) -> Self {
        Self {
            k_d,
            filter: LowPassFirstOrder::passthrough(),
        }
    }

    /// With `k_d == 0` the term is zero and the filter does not advance.
    fn update(&mut self, error: f32) -> f32 {
        if self.k_d == 0.0 {
            return 0.0;
        }
        self.filter.run(self.k_d * error)
    }
}
