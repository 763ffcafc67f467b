//! Scalar math used on the control path.
//!
//! Trigonometry and square roots go through a [`MathBackend`] so a target with
//! a hardware accelerator can swap the implementation at build time. The
//! backend is a type parameter everywhere it is needed, so the choice costs
//! nothing at runtime.

use core::f32::consts::TAU;

use fixed::types::{I11F21, I16F16};

/// Provider of the trigonometric and square root primitives.
///
/// Angles are in radians.
pub trait MathBackend {
    fn sin(angle: f32) -> f32;

    fn cos(angle: f32) -> f32;

    /// Returns `(sin(angle), cos(angle))`.
    fn sin_cos(angle: f32) -> (f32, f32) {
        (Self::sin(angle), Self::cos(angle))
    }

    fn sqrt(value: f32) -> f32;
}

/// Software implementation backed by `libm`.
#[derive(Debug, Clone, Copy, Default)]
pub struct Software;

impl MathBackend for Software {
    fn sin(angle: f32) -> f32 {
        libm::sinf(angle)
    }

    fn cos(angle: f32) -> f32 {
        libm::cosf(angle)
    }

    fn sqrt(value: f32) -> f32 {
        libm::sqrtf(value)
    }
}

/// Fixed-point CORDIC implementation.
///
/// Values that do not fit the fixed-point format (including NaN) fall back to
/// the software routines, so the result is always defined.
#[derive(Debug, Clone, Copy, Default)]
pub struct Cordic;

impl MathBackend for Cordic {
    fn sin(angle: f32) -> f32 {
        Self::sin_cos(angle).0
    }

    fn cos(angle: f32) -> f32 {
        Self::sin_cos(angle).1
    }

    fn sin_cos(angle: f32) -> (f32, f32) {
        // Wrap into [-pi, pi] so the fixed-point format never overflows.
        let wrapped = libm::remainderf(angle, TAU);
        match I11F21::checked_from_num(wrapped) {
            Some(angle) => {
                let (sin, cos) = cordic::sin_cos(angle);
                (sin.to_num(), cos.to_num())
            }
            None => Software::sin_cos(angle),
        }
    }

    fn sqrt(value: f32) -> f32 {
        if value <= 0.0 {
            return Software::sqrt(value);
        }
        match I16F16::checked_from_num(value) {
            Some(value) => cordic::sqrt(value).to_num(),
            None => Software::sqrt(value),
        }
    }
}

/// Backend selected by the `cordic-math` feature.
#[cfg(feature = "cordic-math")]
pub type DefaultMath = Cordic;

/// Backend selected by the `cordic-math` feature.
#[cfg(not(feature = "cordic-math"))]
pub type DefaultMath = Software;

/// Limit `value` to `[min, max]`.
///
/// Unlike [`f32::clamp`] this never panics when `min > max`, and a NaN
/// `value` passes through unchanged.
#[inline]
pub fn clamp(value: f32, min: f32, max: f32) -> f32 {
    if value < min {
        min
    } else if value > max {
        max
    } else {
        value
    }
}

/// Limit a duty cycle to `[0, 1]`, mapping NaN to 0.
#[inline]
pub(crate) fn saturate_duty(duty: f32) -> f32 {
    if duty > 0.0 {
        if duty < 1.0 {
            duty
        } else {
            1.0
        }
    } else {
        0.0
    }
}
