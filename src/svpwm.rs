//! Space vector modulation algorithms.
//!
//! Every algorithm here takes a voltage vector normalized so that a hexagon
//! vertex has a magnitude of 1, and produces the centred duty pattern: the
//! zero vector time is split evenly between the all-low and all-high states.
//! Inside the inscribed circle (magnitude `sqrt(3)/2`) the algorithms agree
//! with each other; they differ in how they find the sector and in how many
//! operations they need to get there.
//!
//! A duty of 1 keeps the phase's high side on for the whole period.

use crate::{
    math::saturate_duty,
    park_clarke::TwoPhaseStationaryOrthogonalReferenceFrame,
    pwm::Modulation,
    FRAC_1_SQRT_3, FRAC_2_3, FRAC_2_SQRT_3, FRAC_SQRT_3_2,
};

/// Duties emitted when the vector can not be placed in any sector.
const UNRECOGNIZED_SECTOR: [f32; 3] = [0.0; 3];

fn saturate(duty: [f32; 3]) -> [f32; 3] {
    duty.map(saturate_duty)
}

/// Alternating Reverse Sequencing, the classic sector based SVPWM.
///
/// The sector is found from the quadrant and the ratio of the components, the
/// two active vector times are computed for that sector and the phases are
/// stacked on top of half the zero vector time.
#[derive(Debug, Clone, Copy, Default)]
pub struct AlternatingReverse;

impl AlternatingReverse {
    /// Get the one-indexed sector of a vector. Returns `None` if the vector
    /// has no defined direction (NaN components).
    pub fn sector(alpha: f32, beta: f32) -> Option<u8> {
        if beta >= 0.0 {
            Some(if alpha >= 0.0 {
                if FRAC_1_SQRT_3 * beta > alpha {
                    2
                } else {
                    1
                }
            } else if -FRAC_1_SQRT_3 * beta > alpha {
                3
            } else {
                2
            })
        } else if beta < 0.0 {
            Some(if alpha >= 0.0 {
                if -FRAC_1_SQRT_3 * beta > alpha {
                    5
                } else {
                    6
                }
            } else if FRAC_1_SQRT_3 * beta > alpha {
                4
            } else {
                5
            })
        } else {
            None
        }
    }
}

impl Modulation for AlternatingReverse {
    fn modulate(value: TwoPhaseStationaryOrthogonalReferenceFrame) -> [f32; 3] {
        let TwoPhaseStationaryOrthogonalReferenceFrame { alpha, beta } = value;

        let (da, db, dc);
        match Self::sector(alpha, beta) {
            Some(1) => {
                let t1 = alpha - FRAC_1_SQRT_3 * beta;
                let t2 = FRAC_2_SQRT_3 * beta;
                dc = (1.0 - t1 - t2) * 0.5;
                db = dc + t2;
                da = db + t1;
            }
            Some(2) => {
                let t2 = alpha + FRAC_1_SQRT_3 * beta;
                let t3 = -alpha + FRAC_1_SQRT_3 * beta;
                dc = (1.0 - t2 - t3) * 0.5;
                da = dc + t2;
                db = da + t3;
            }
            Some(3) => {
                let t3 = FRAC_2_SQRT_3 * beta;
                let t4 = -alpha - FRAC_1_SQRT_3 * beta;
                da = (1.0 - t3 - t4) * 0.5;
                dc = da + t4;
                db = dc + t3;
            }
            Some(4) => {
                let t4 = -alpha + FRAC_1_SQRT_3 * beta;
                let t5 = -FRAC_2_SQRT_3 * beta;
                da = (1.0 - t4 - t5) * 0.5;
                db = da + t4;
                dc = db + t5;
            }
            Some(5) => {
                let t5 = -alpha - FRAC_1_SQRT_3 * beta;
                let t6 = alpha - FRAC_1_SQRT_3 * beta;
                db = (1.0 - t5 - t6) * 0.5;
                da = db + t6;
                dc = da + t5;
            }
            Some(6) => {
                let t6 = -FRAC_2_SQRT_3 * beta;
                let t1 = alpha + FRAC_1_SQRT_3 * beta;
                db = (1.0 - t6 - t1) * 0.5;
                dc = db + t6;
                da = dc + t1;
            }
            _ => return UNRECOGNIZED_SECTOR,
        }

        saturate([da, db, dc])
    }
}

/// ODTV 1-norm modulation.
///
/// Picks the formula from whichever of three projections of the vector has
/// the largest magnitude, so no explicit sector number is needed.
///
/// Reference: <https://www.mdpi.com/1996-1073/15/11/4065>
#[derive(Debug, Clone, Copy, Default)]
pub struct Odtv1Norm;

impl Modulation for Odtv1Norm {
    fn modulate(value: TwoPhaseStationaryOrthogonalReferenceFrame) -> [f32; 3] {
        let TwoPhaseStationaryOrthogonalReferenceFrame { alpha, beta } = value;

        let a = alpha + FRAC_1_SQRT_3 * beta;
        let b = FRAC_2_SQRT_3 * beta;
        let c = a - b;

        let (abs_a, abs_b, abs_c) = (libm::fabsf(a), libm::fabsf(b), libm::fabsf(c));
        let (half_a, half_b, half_c) = (a * 0.5, b * 0.5, c * 0.5);

        // The |b| case differs from the paper's dA formula to match the phase
        // order used here.
        let duty = if abs_c >= abs_a && abs_c > abs_b {
            [half_c + 0.5, -half_c + 0.5, -half_a - half_b + 0.5]
        } else if abs_a >= abs_b && abs_a > abs_c {
            [half_a + 0.5, half_b - half_c + 0.5, -half_a + 0.5]
        } else if abs_b >= abs_a && abs_b >= abs_c {
            [half_a + half_c + 0.5, half_b + 0.5, -half_b + 0.5]
        } else {
            UNRECOGNIZED_SECTOR
        };

        saturate(duty)
    }
}

/// Min-max zero sequence injection, as generated by the Space Vector
/// Generator block of Simulink.
///
/// No sector is computed at all: the phase voltages are shifted by the mean of
/// their extremes, which centres them in the available range.
#[derive(Debug, Clone, Copy, Default)]
pub struct SvGen;

impl Modulation for SvGen {
    fn modulate(value: TwoPhaseStationaryOrthogonalReferenceFrame) -> [f32; 3] {
        let TwoPhaseStationaryOrthogonalReferenceFrame { alpha, beta } = value;
        // f32::max and f32::min skip a NaN operand, so catch it up front.
        if alpha.is_nan() || beta.is_nan() {
            return UNRECOGNIZED_SECTOR;
        }

        let half_alpha = 0.5 * alpha;
        let scaled_beta = FRAC_SQRT_3_2 * beta;
        let va = alpha;
        let vb = scaled_beta - half_alpha;
        let vc = -half_alpha - scaled_beta;

        let offset = -0.5 * (va.max(vb).max(vc) + va.min(vb).min(vc));

        saturate([
            0.5 + (va + offset) * FRAC_2_3,
            0.5 + (vb + offset) * FRAC_2_3,
            0.5 + (vc + offset) * FRAC_2_3,
        ])
    }
}

/// Symmetric seven segment modulation.
///
/// The vector is projected onto three axes 120 degrees apart, the signs of the
/// projections give the sector, and the two adjacent projections are the
/// active vector times.
#[derive(Debug, Clone, Copy, Default)]
pub struct SevenSegment;

impl SevenSegment {
    /// Projections `(a, b, c)` of the vector. They always sum to zero.
    fn project(alpha: f32, beta: f32) -> (f32, f32, f32) {
        let a = alpha - FRAC_1_SQRT_3 * beta;
        let b = FRAC_2_SQRT_3 * beta;
        let c = -alpha - FRAC_1_SQRT_3 * beta;
        (a, b, c)
    }

    /// Get the one-indexed sector from the projections. Returns `None` if the
    /// projections are NaN.
    pub fn sector(a: f32, b: f32, c: f32) -> Option<u8> {
        if c < 0.0 {
            if a < 0.0 {
                Some(2)
            } else if b < 0.0 {
                Some(6)
            } else {
                Some(1)
            }
        } else if c >= 0.0 {
            if a < 0.0 {
                if b <= 0.0 {
                    Some(4)
                } else {
                    Some(3)
                }
            } else {
                Some(5)
            }
        } else {
            None
        }
    }
}

impl Modulation for SevenSegment {
    fn modulate(value: TwoPhaseStationaryOrthogonalReferenceFrame) -> [f32; 3] {
        let (a, b, c) = Self::project(value.alpha, value.beta);

        // x and y are the active vector times of the sector, half of the
        // remaining zero vector time goes on either side of them.
        let centre = |x: f32, y: f32| (x, y, (1.0 - (x + y)) * 0.5);

        let duty = match Self::sector(a, b, c) {
            Some(1) => {
                let (x, y, z) = centre(a, b);
                [x + y + z, y + z, z]
            }
            Some(2) => {
                let (x, y, z) = centre(-c, -a);
                [x + z, x + y + z, z]
            }
            Some(3) => {
                let (x, y, z) = centre(b, c);
                [z, x + y + z, y + z]
            }
            Some(4) => {
                let (x, y, z) = centre(-a, -b);
                [z, x + z, x + y + z]
            }
            Some(5) => {
                let (x, y, z) = centre(c, a);
                [y + z, z, x + y + z]
            }
            Some(6) => {
                let (x, y, z) = centre(-b, -c);
                [x + y + z, z, x + z]
            }
            _ => UNRECOGNIZED_SECTOR,
        };

        saturate(duty)
    }
}
