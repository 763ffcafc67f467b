//! d-q current (torque) controller.

use core::marker::PhantomData;

use crate::{
    config::{ConfigError, CurrentLoopConfig},
    math::{DefaultMath, MathBackend},
    park_clarke::{
        inverse_park, RotatingReferenceFrame, TwoPhaseStationaryOrthogonalReferenceFrame,
    },
    pid::PIController,
};

/// Regulates the measured d and q currents to their references with one PI
/// controller per axis, and rotates the resulting voltage back into the
/// stationary frame.
///
/// Feed-forward is not wired yet, both controllers run with a feed-forward
/// of zero.
#[derive(Debug, Clone)]
pub struct CurrentController<B: MathBackend = DefaultMath> {
    id_controller: PIController,
    iq_controller: PIController,
    id_ref: f32,
    iq_ref: f32,
    voltage: TwoPhaseStationaryOrthogonalReferenceFrame,
    _math: PhantomData<fn() -> B>,
}

impl<B: MathBackend> CurrentController<B> {
    pub fn new(id_controller: PIController, iq_controller: PIController) -> Self {
        Self {
            id_controller,
            iq_controller,
            id_ref: 0.0,
            iq_ref: 0.0,
            voltage: TwoPhaseStationaryOrthogonalReferenceFrame::default(),
            _math: PhantomData,
        }
    }

    /// Builds a controller from a validated gain set.
    pub fn from_config(config: &CurrentLoopConfig) -> Result<Self, ConfigError> {
        let id_controller = PIController::try_from(config.id)?;
        let iq_controller = PIController::try_from(config.iq)?;
        log::debug!("current loop configured: {:?}", config);
        Ok(Self::new(id_controller, iq_controller))
    }

    pub fn set_id_pi_params(&mut self, k_p: f32, k_i: f32, min: f32, max: f32) {
        Self::set_pi_params(&mut self.id_controller, k_p, k_i, min, max);
    }

    pub fn set_iq_pi_params(&mut self, k_p: f32, k_i: f32, min: f32, max: f32) {
        Self::set_pi_params(&mut self.iq_controller, k_p, k_i, min, max);
    }

    fn set_pi_params(controller: &mut PIController, k_p: f32, k_i: f32, min: f32, max: f32) {
        controller.set_k_p(k_p);
        controller.set_k_i(k_i);
        controller.set_out_max(max);
        controller.set_out_min(min);
    }

    pub fn id_ref(&self) -> f32 {
        self.id_ref
    }

    pub fn set_id_ref(&mut self, id_ref: f32) {
        self.id_ref = id_ref;
    }

    pub fn iq_ref(&self) -> f32 {
        self.iq_ref
    }

    pub fn set_iq_ref(&mut self, iq_ref: f32) {
        self.iq_ref = iq_ref;
    }

    pub fn id_controller(&self) -> &PIController {
        &self.id_controller
    }

    pub fn iq_controller(&self) -> &PIController {
        &self.iq_controller
    }

    /// Runs both axes with a precomputed sine and cosine of the electrical
    /// angle, returning the stationary frame voltage.
    pub fn run(
        &mut self,
        current: RotatingReferenceFrame,
        cos_angle: f32,
        sin_angle: f32,
    ) -> TwoPhaseStationaryOrthogonalReferenceFrame {
        let voltage = RotatingReferenceFrame {
            d: self.id_controller.run(self.id_ref, current.d, 0.0),
            q: self.iq_controller.run(self.iq_ref, current.q, 0.0),
        };

        self.voltage = inverse_park(cos_angle, sin_angle, voltage);
        self.voltage
    }

    /// Runs both axes at an electrical angle given in degrees.
    pub fn run_with_angle(
        &mut self,
        current: RotatingReferenceFrame,
        angle_deg: f32,
    ) -> TwoPhaseStationaryOrthogonalReferenceFrame {
        let (sin_angle, cos_angle) = B::sin_cos(angle_deg.to_radians());
        self.run(current, cos_angle, sin_angle)
    }

    /// The voltage computed by the last run.
    pub fn voltage(&self) -> TwoPhaseStationaryOrthogonalReferenceFrame {
        self.voltage
    }

    pub fn v_alpha(&self) -> f32 {
        self.voltage.alpha
    }

    pub fn v_beta(&self) -> f32 {
        self.voltage.beta
    }

    /// Clears both integrators. References and gains are kept.
    pub fn reset_state(&mut self) {
        self.id_controller.reset_state();
        self.iq_controller.reset_state();
    }
}

impl<B: MathBackend> Default for CurrentController<B> {
    fn default() -> Self {
        Self::new(PIController::default(), PIController::default())
    }
}
