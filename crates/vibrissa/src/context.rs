//! Timing and solver settings shared by every component of a run.

use vibrissa_contact::ContactSolver;

use crate::Parameters;

/// Numerical settings of one simulation run.
#[derive(Debug, Clone)]
pub struct SimulationContext {
    /// Output frame period (s).
    pub time_step: f64,
    /// Substeps per frame.
    pub num_step_int: u32,
    pub time_stop: f64,
    /// Natural frequency (rad/s) of the base servo in active whisking.
    pub servo_frequency: f64,
    pub servo_damping_ratio: f64,
    pub contact: ContactSolver,
}

impl SimulationContext {
    pub fn from_parameters(params: &Parameters) -> Self {
        Self {
            time_step: params.time_step,
            num_step_int: params.num_step_int,
            time_stop: params.time_stop,
            servo_frequency: params.servo_frequency,
            servo_damping_ratio: params.servo_damping_ratio,
            contact: params.contact.solver(),
        }
    }

    /// Substep length.
    pub fn substep_dt(&self) -> f64 {
        self.time_step / f64::from(self.num_step_int)
    }

    /// Simulated time after `substeps` substeps, computed from the counter.
    pub fn time_at(&self, substeps: u64) -> f64 {
        substeps as f64 * self.time_step / f64::from(self.num_step_int)
    }

    /// Frames needed to reach `time_stop`.
    pub fn total_frames(&self) -> u64 {
        // Tolerate time_stop / time_step landing just above an integer.
        let frames = self.time_stop / self.time_step - 1e-9;
        frames.ceil().max(0.0) as u64
    }
}

impl Default for SimulationContext {
    fn default() -> Self {
        Self::from_parameters(&Parameters::default())
    }
}
