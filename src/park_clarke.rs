//! Park and Clarke transformations (along with their inverses).
//!
//! The algorithms implemented here are based on [Microsemi's suggested implementation](https://www.microsemi.com/document-portal/doc_view/132799-park-inverse-park-and-clarke-inverse-clarke-transformations-mss-software-implementation-user-guide)
//!
//! The Clarke mode is picked by the type of the measurement: a
//! [`ThreePhaseStationaryReferenceFrame`] uses all three phases, while a
//! [`ThreePhaseBalancedStationaryReferenceFrame`] reconstructs the third phase
//! from `a + b + c = 0`. Both convert into the two-phase frame with [`From`].

#[cfg(feature = "defmt")]
use defmt::Format;
use serde::{Deserialize, Serialize};

use crate::{FRAC_1_3, FRAC_1_SQRT_3, FRAC_2_3, FRAC_2_SQRT_3, FRAC_SQRT_3_2};

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct RotatingReferenceFrame {
    pub d: f32,
    pub q: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct TwoPhaseStationaryOrthogonalReferenceFrame {
    pub alpha: f32,
    pub beta: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct ThreePhaseStationaryReferenceFrame {
    pub a: f32,
    pub b: f32,
    /// C is optional if a + b + c equals zero.
    pub c: f32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "defmt", derive(Format))]
pub struct ThreePhaseBalancedStationaryReferenceFrame {
    pub a: f32,
    pub b: f32,
}

/// Clarke transform from two measured phases
///
/// Implements equations 1-4 from the Microsemi guide.
pub fn clarke(
    inputs: ThreePhaseBalancedStationaryReferenceFrame,
) -> TwoPhaseStationaryOrthogonalReferenceFrame {
    TwoPhaseStationaryOrthogonalReferenceFrame {
        // Eq3
        alpha: inputs.a,
        // Eq4
        beta: FRAC_1_SQRT_3 * inputs.a + FRAC_2_SQRT_3 * inputs.b,
    }
}

/// Clarke transform from all three measured phases
///
/// Averages out any common-mode offset present in the measurements.
pub fn clarke_three_phase(
    inputs: ThreePhaseStationaryReferenceFrame,
) -> TwoPhaseStationaryOrthogonalReferenceFrame {
    TwoPhaseStationaryOrthogonalReferenceFrame {
        alpha: FRAC_2_3 * inputs.a - FRAC_1_3 * (inputs.b + inputs.c),
        beta: FRAC_1_SQRT_3 * (inputs.b - inputs.c),
    }
}

/// Inverse Clarke transform
///
/// Implements equations 5-7 from the Microsemi guide.
pub fn inverse_clarke(
    inputs: TwoPhaseStationaryOrthogonalReferenceFrame,
) -> ThreePhaseStationaryReferenceFrame {
    ThreePhaseStationaryReferenceFrame {
        // Eq5
        a: inputs.alpha,
        // Eq6
        b: -0.5 * inputs.alpha + FRAC_SQRT_3_2 * inputs.beta,
        // Eq7
        c: -0.5 * inputs.alpha - FRAC_SQRT_3_2 * inputs.beta,
    }
}

/// Inverse Clarke transform without the third phase, for two-wire sensing
pub fn inverse_clarke_balanced(
    inputs: TwoPhaseStationaryOrthogonalReferenceFrame,
) -> ThreePhaseBalancedStationaryReferenceFrame {
    ThreePhaseBalancedStationaryReferenceFrame {
        a: inputs.alpha,
        b: -0.5 * inputs.alpha + FRAC_SQRT_3_2 * inputs.beta,
    }
}

/// Park transform
///
/// Implements equations 8 and 9 from the Microsemi guide.
pub fn park(
    cos_angle: f32,
    sin_angle: f32,
    inputs: TwoPhaseStationaryOrthogonalReferenceFrame,
) -> RotatingReferenceFrame {
    RotatingReferenceFrame {
        // Eq8
        d: cos_angle * inputs.alpha + sin_angle * inputs.beta,
        // Eq9
        q: cos_angle * inputs.beta - sin_angle * inputs.alpha,
    }
}

/// Inverse Park transform
///
/// Implements equations 10 and 11 from the Microsemi guide.
pub fn inverse_park(
    cos_angle: f32,
    sin_angle: f32,
    inputs: RotatingReferenceFrame,
) -> TwoPhaseStationaryOrthogonalReferenceFrame {
    TwoPhaseStationaryOrthogonalReferenceFrame {
        // Eq10
        alpha: cos_angle * inputs.d - sin_angle * inputs.q,
        // Eq11
        beta: sin_angle * inputs.d + cos_angle * inputs.q,
    }
}

impl From<ThreePhaseBalancedStationaryReferenceFrame>
    for TwoPhaseStationaryOrthogonalReferenceFrame
{
    fn from(value: ThreePhaseBalancedStationaryReferenceFrame) -> Self {
        clarke(value)
    }
}

impl From<ThreePhaseStationaryReferenceFrame> for TwoPhaseStationaryOrthogonalReferenceFrame {
    fn from(value: ThreePhaseStationaryReferenceFrame) -> Self {
        clarke_three_phase(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::{MathBackend, Software};
    use approx::assert_abs_diff_eq;
    use proptest::prelude::*;

    #[track_caller]
    fn clarke_round_trip(a: f32, b: f32) {
        let input = ThreePhaseBalancedStationaryReferenceFrame { a, b };
        let two_phase = clarke(input);
        let result = inverse_clarke_balanced(two_phase);

        assert_abs_diff_eq!(result.a, input.a, epsilon = 1e-4);
        assert_abs_diff_eq!(result.b, input.b, epsilon = 1e-4);
    }

    #[test]
    fn clarke_round_trip_zero() {
        clarke_round_trip(0., 0.);
    }

    #[test]
    fn clarke_round_trip_two_inputs() {
        clarke_round_trip(0., 1.);
        clarke_round_trip(1., 0.);
        clarke_round_trip(-0.5, -0.5);
        clarke_round_trip(-0.1, -0.2);
        clarke_round_trip(13., 21.);
    }

    #[test]
    fn clarke_three_phase_balanced_unit_vector() {
        let result = clarke_three_phase(ThreePhaseStationaryReferenceFrame {
            a: 1.,
            b: -0.5,
            c: -0.5,
        });
        assert_abs_diff_eq!(result.alpha, 1.0, epsilon = 1e-6);
        assert_abs_diff_eq!(result.beta, 0.0, epsilon = 1e-6);
    }

    #[test]
    fn clarke_three_phase_round_trip() {
        // Phase B lags phase A by 120 degrees.
        let a = Software::cos(0.4);
        let b = Software::cos(0.4 - 2.094_395_1);
        let input = ThreePhaseStationaryReferenceFrame { a, b, c: -a - b };

        let result = inverse_clarke(clarke_three_phase(input));
        assert_abs_diff_eq!(result.a, input.a, epsilon = 1e-6);
        assert_abs_diff_eq!(result.b, input.b, epsilon = 1e-6);
        assert_abs_diff_eq!(result.c, input.c, epsilon = 1e-6);
    }

    #[test]
    fn clarke_modes_agree_on_balanced_currents() {
        let full = ThreePhaseStationaryReferenceFrame {
            a: 0.3,
            b: 0.9,
            c: -1.2,
        };
        let two = ThreePhaseBalancedStationaryReferenceFrame { a: 0.3, b: 0.9 };

        let from_full: TwoPhaseStationaryOrthogonalReferenceFrame = full.into();
        let from_two: TwoPhaseStationaryOrthogonalReferenceFrame = two.into();
        assert_abs_diff_eq!(from_full.alpha, from_two.alpha, epsilon = 1e-5);
        assert_abs_diff_eq!(from_full.beta, from_two.beta, epsilon = 1e-5);
    }

    #[test]
    fn clarke_three_phase_rejects_common_mode() {
        let offset = 0.25;
        let clean = clarke_three_phase(ThreePhaseStationaryReferenceFrame {
            a: 1.,
            b: -0.5,
            c: -0.5,
        });
        let shifted = clarke_three_phase(ThreePhaseStationaryReferenceFrame {
            a: 1. + offset,
            b: -0.5 + offset,
            c: -0.5 + offset,
        });
        assert_abs_diff_eq!(clean.alpha, shifted.alpha, epsilon = 1e-6);
        assert_abs_diff_eq!(clean.beta, shifted.beta, epsilon = 1e-6);
    }

    #[test]
    fn inverse_clarke_sums_to_zero() {
        let result = inverse_clarke(TwoPhaseStationaryOrthogonalReferenceFrame {
            alpha: 1.,
            beta: 0.,
        });
        assert_abs_diff_eq!(result.a, 1.0);
        assert_abs_diff_eq!(result.b, -0.5);
        assert_abs_diff_eq!(result.c, -0.5);
        assert_abs_diff_eq!(result.a + result.b + result.c, 0.0);
    }

    #[test]
    fn park_round_trip() {
        let (sin_angle, cos_angle) = Software::sin_cos(0.82);

        let input = TwoPhaseStationaryOrthogonalReferenceFrame {
            alpha: 2.,
            beta: 3.,
        };
        let moving_reference = park(cos_angle, sin_angle, input);
        let result = inverse_park(cos_angle, sin_angle, moving_reference);

        assert_abs_diff_eq!(result.alpha, input.alpha, epsilon = 1e-5);
        assert_abs_diff_eq!(result.beta, input.beta, epsilon = 1e-5);
    }

    #[test]
    fn park_aligned_with_vector() {
        // A vector at the rotor angle lies entirely on the d axis.
        let angle = 1.1_f32;
        let (sin_angle, cos_angle) = Software::sin_cos(angle);
        let input = TwoPhaseStationaryOrthogonalReferenceFrame {
            alpha: 2. * cos_angle,
            beta: 2. * sin_angle,
        };
        let result = park(cos_angle, sin_angle, input);
        assert_abs_diff_eq!(result.d, 2.0, epsilon = 1e-5);
        assert_abs_diff_eq!(result.q, 0.0, epsilon = 1e-5);
    }

    proptest! {
        #[test]
        fn park_round_trip_arbitrary(
            alpha in -100f32..100.,
            beta in -100f32..100.,
            angle in -10f32..10.,
        ) {
            let (sin_angle, cos_angle) = Software::sin_cos(angle);
            let input = TwoPhaseStationaryOrthogonalReferenceFrame { alpha, beta };
            let rotated = park(cos_angle, sin_angle, input);
            let result = inverse_park(cos_angle, sin_angle, rotated);
            let scale = 1. + alpha.abs().max(beta.abs());
            prop_assert!((result.alpha - alpha).abs() <= 1e-4 * scale);
            prop_assert!((result.beta - beta).abs() <= 1e-4 * scale);
        }

        #[test]
        fn clarke_round_trip_arbitrary(a in -100f32..100., b in -100f32..100.) {
            let input = ThreePhaseBalancedStationaryReferenceFrame { a, b };
            let result = inverse_clarke(clarke(input));
            let scale = 1. + a.abs().max(b.abs());
            prop_assert!((result.a - a).abs() <= 1e-5 * scale);
            prop_assert!((result.b - b).abs() <= 1e-5 * scale);
            prop_assert!((result.c + a + b).abs() <= 1e-5 * scale);
        }

        #[test]
        fn clarke_three_phase_round_trip_arbitrary(a in -100f32..100., b in -100f32..100.) {
            let c = -a - b;
            let input = ThreePhaseStationaryReferenceFrame { a, b, c };
            let result = inverse_clarke(clarke_three_phase(input));
            let scale = 1. + a.abs().max(b.abs()).max(c.abs());
            prop_assert!((result.a - a).abs() <= 1e-5 * scale);
            prop_assert!((result.b - b).abs() <= 1e-5 * scale);
            prop_assert!((result.c - c).abs() <= 1e-5 * scale);
        }
    }
}
