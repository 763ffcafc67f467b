//! First and second order IIR low-pass filters.
//!
//! Both filters implement the direct form I difference equation
//!
//! ```text
//! y[n] = b0*x[n] + b1*x[n-1] + b2*x[n-2] - a1*y[n-1] - a2*y[n-2]
//! ```
//!
//! with `a0` fixed at 1. They hold no buffers beyond their delay line and run
//! in constant time.

#[cfg(feature = "defmt")]
use defmt::Format;

/// First order low-pass filter, `y[n] = b0*x[n] + b1*x[n-1] - a1*y[n-1]`.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct LowPassFirstOrder {
    a1: f32,
    b0: f32,
    b1: f32,
    /// Input at n-1
    x1: f32,
    /// Output at n-1
    y1: f32,
}

impl LowPassFirstOrder {
    /// Creates a filter with the given coefficients and a zero delay line.
    pub const fn new(a1: f32, b0: f32, b1: f32) -> Self {
        Self {
            a1,
            b0,
            b1,
            x1: 0.0,
            y1: 0.0,
        }
    }

    /// A filter that passes its input straight through.
    pub const fn passthrough() -> Self {
        Self::new(0.0, 1.0, 0.0)
    }

    /// Seeds the delay line with the input and output at n-1.
    pub fn set_initial_condition(&mut self, x1: f32, y1: f32) {
        self.x1 = x1;
        self.y1 = y1;
    }

    /// Clears the delay line, leaving the coefficients alone.
    pub fn reset(&mut self) {
        self.set_initial_condition(0.0, 0.0);
    }

    pub fn a1(&self) -> f32 {
        self.a1
    }

    pub fn set_a1(&mut self, a1: f32) {
        self.a1 = a1;
    }

    pub fn b0(&self) -> f32 {
        self.b0
    }

    pub fn set_b0(&mut self, b0: f32) {
        self.b0 = b0;
    }

    pub fn b1(&self) -> f32 {
        self.b1
    }

    pub fn set_b1(&mut self, b1: f32) {
        self.b1 = b1;
    }

    /// Returns `(x1, y1)`.
    pub fn delay_line(&self) -> (f32, f32) {
        (self.x1, self.y1)
    }

    /// Filters one sample.
    #[inline]
    pub fn run(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 - self.a1 * self.y1;

        self.x1 = input;
        self.y1 = output;

        output
    }
}

impl Default for LowPassFirstOrder {
    fn default() -> Self {
        Self::passthrough()
    }
}

/// Second order low-pass filter (biquad).
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct LowPassSecondOrder {
    a1: f32,
    a2: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    x1: f32,
    x2: f32,
    y1: f32,
    y2: f32,
}

impl LowPassSecondOrder {
    /// Creates a filter with the given coefficients and a zero delay line.
    pub const fn new(a1: f32, a2: f32, b0: f32, b1: f32, b2: f32) -> Self {
        Self {
            a1,
            a2,
            b0,
            b1,
            b2,
            x1: 0.0,
            x2: 0.0,
            y1: 0.0,
            y2: 0.0,
        }
    }

    /// Seeds the delay line with the inputs and outputs at n-1 and n-2.
    pub fn set_initial_condition(&mut self, x1: f32, x2: f32, y1: f32, y2: f32) {
        self.x1 = x1;
        self.x2 = x2;
        self.y1 = y1;
        self.y2 = y2;
    }

    /// Clears the delay line, leaving the coefficients alone.
    pub fn reset(&mut self) {
        self.set_initial_condition(0.0, 0.0, 0.0, 0.0);
    }

    /// Returns `(a1, a2)`.
    pub fn denominator_coefficients(&self) -> (f32, f32) {
        (self.a1, self.a2)
    }

    pub fn set_denominator_coefficients(&mut self, a1: f32, a2: f32) {
        self.a1 = a1;
        self.a2 = a2;
    }

    /// Returns `(b0, b1, b2)`.
    pub fn numerator_coefficients(&self) -> (f32, f32, f32) {
        (self.b0, self.b1, self.b2)
    }

    pub fn set_numerator_coefficients(&mut self, b0: f32, b1: f32, b2: f32) {
        self.b0 = b0;
        self.b1 = b1;
        self.b2 = b2;
    }

    /// Returns `(x1, x2, y1, y2)`.
    pub fn delay_line(&self) -> (f32, f32, f32, f32) {
        (self.x1, self.x2, self.y1, self.y2)
    }

    /// Filters one sample.
    #[inline]
    pub fn run(&mut self, input: f32) -> f32 {
        let output = self.b0 * input + self.b1 * self.x1 + self.b2 * self.x2
            - self.a1 * self.y1
            - self.a2 * self.y2;

        // Shift the oldest sample out first.
        self.x2 = self.x1;
        self.x1 = input;
        self.y2 = self.y1;
        self.y1 = output;

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn first_order_default_is_passthrough() {
        let mut filter = LowPassFirstOrder::default();
        for x in [0.0, 1.0, -3.5, 42.0] {
            assert_eq!(filter.run(x), x);
        }
    }

    #[test]
    fn first_order_step_response() {
        // y[n] = 0.25 x[n] + 0.75 y[n-1]
        let mut filter = LowPassFirstOrder::new(-0.75, 0.25, 0.0);
        let outputs: [f32; 3] = core::array::from_fn(|_| filter.run(1.0));
        assert_abs_diff_eq!(outputs[0], 0.25);
        assert_abs_diff_eq!(outputs[1], 0.4375);
        assert_abs_diff_eq!(outputs[2], 0.578125);

        let mut value = 0.0;
        for _ in 0..200 {
            value = filter.run(1.0);
        }
        assert_abs_diff_eq!(value, 1.0, epsilon = 1e-5);
    }

    #[test]
    fn first_order_initial_condition() {
        let mut filter = LowPassFirstOrder::new(-0.5, 0.5, 0.0);
        filter.set_initial_condition(2.0, 2.0);
        // Seeded at steady state, so a matching input produces no transient.
        assert_abs_diff_eq!(filter.run(2.0), 2.0);
        assert_eq!(filter.delay_line(), (2.0, 2.0));

        filter.reset();
        assert_eq!(filter.delay_line(), (0.0, 0.0));
        assert_eq!(filter.a1(), -0.5);
    }

    #[test]
    fn first_order_uses_previous_input() {
        // Two-tap moving average
        let mut filter = LowPassFirstOrder::new(0.0, 0.5, 0.5);
        assert_eq!(filter.run(2.0), 1.0);
        assert_eq!(filter.run(4.0), 3.0);
        assert_eq!(filter.run(4.0), 4.0);
    }

    #[test]
    fn second_order_keeps_two_samples() {
        // y[n] = x[n-2]
        let mut filter = LowPassSecondOrder::new(0.0, 0.0, 0.0, 0.0, 1.0);
        assert_eq!(filter.run(1.0), 0.0);
        assert_eq!(filter.run(2.0), 0.0);
        assert_eq!(filter.run(3.0), 1.0);
        assert_eq!(filter.run(4.0), 2.0);
        assert_eq!(filter.delay_line(), (4.0, 3.0, 2.0, 1.0));
    }

    #[test]
    fn second_order_feedback_uses_both_outputs() {
        // y[n] = x[n] + 0.5 y[n-2]
        let mut filter = LowPassSecondOrder::new(0.0, -0.5, 1.0, 0.0, 0.0);
        assert_eq!(filter.run(1.0), 1.0);
        assert_eq!(filter.run(0.0), 0.0);
        assert_eq!(filter.run(0.0), 0.5);
        assert_eq!(filter.run(0.0), 0.0);
        assert_eq!(filter.run(0.0), 0.25);
    }

    #[test]
    fn second_order_unity_dc_gain() {
        // Critically damped low-pass with coefficients summing to unity gain.
        let (a1, a2) = (-1.0, 0.25);
        let b = (1.0 + a1 + a2) / 4.0;
        let mut filter = LowPassSecondOrder::new(a1, a2, b, 2.0 * b, b);
        let mut value = 0.0;
        for _ in 0..500 {
            value = filter.run(3.0);
        }
        assert_abs_diff_eq!(value, 3.0, epsilon = 1e-4);
    }

    #[test]
    fn second_order_coefficient_accessors() {
        let mut filter = LowPassSecondOrder::new(0.1, 0.2, 0.3, 0.4, 0.5);
        assert_eq!(filter.denominator_coefficients(), (0.1, 0.2));
        assert_eq!(filter.numerator_coefficients(), (0.3, 0.4, 0.5));

        filter.set_denominator_coefficients(-0.1, -0.2);
        filter.set_numerator_coefficients(1.0, 0.0, 0.0);
        assert_eq!(filter.denominator_coefficients(), (-0.1, -0.2));
        assert_eq!(filter.numerator_coefficients(), (1.0, 0.0, 0.0));

        filter.set_initial_condition(1.0, 2.0, 3.0, 4.0);
        assert_eq!(filter.delay_line(), (1.0, 2.0, 3.0, 4.0));
        filter.reset();
        assert_eq!(filter.delay_line(), (0.0, 0.0, 0.0, 0.0));
    }
}
