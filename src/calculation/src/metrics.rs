//! Post-processing of simulated trajectories.
//!
//! Helipad motion (what a landing aircraft sees) and a handful of summary
//! statistics used to compare runs. Statistics only cover the finite prefix
//! of a diverged run.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::dynamics::{ShipState, SimulationResult};
use crate::vector::{Mat3, Vec3};

/// Helipad position and velocity at one time sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct HelipadSample {
    pub t: f64,
    /// Helipad offset from the CoG, rotated by the ship attitude
    pub position: Vec3,
    /// Rigid-body velocity of the helipad point, rotated the same way
    pub velocity: Vec3,
}

/// Motion of the helipad for every sample of the run.
///
/// With `r = p − helipad`, the position is `R(φ,θ,ψ) r` and the velocity
/// `R(φ,θ,ψ) (ω × r + v)`.
pub fn helipad_motion(result: &SimulationResult) -> Vec<HelipadSample> {
    result
        .trajectory
        .iter()
        .zip(result.t_vec.iter())
        .map(|(s, &t)| helipad_sample(s, &result.helipad_pos, t))
        .collect()
}

fn helipad_sample(s: &ShipState, helipad: &Vec3, t: f64) -> HelipadSample {
    let r = s.position.sub(helipad);
    let rot = Mat3::euler_xyz(s.attitude.x, s.attitude.y, s.attitude.z);
    HelipadSample {
        t,
        position: rot.mul_vec(&r),
        velocity: rot.mul_vec(&s.rates.cross(&r).add(&s.velocity)),
    }
}

/// Summary statistics of one run.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct TrajectoryMetrics {
    /// Samples the statistics were computed over
    pub samples: usize,
    /// Max |φ| (rad)
    pub max_abs_roll: f64,
    /// Max |θ| (rad)
    pub max_abs_pitch: f64,
    /// RMS of z about its mean (m)
    pub rms_heave: f64,
    /// Mean v_u (m/s)
    pub mean_surge: f64,
    /// Max helipad speed (m/s)
    pub max_helipad_speed: f64,
    /// First step with a non-finite state, if the run diverged
    pub first_non_finite: Option<usize>,
}

impl TrajectoryMetrics {
    pub fn from_result(result: &SimulationResult) -> Self {
        let first_non_finite = result.first_non_finite_step();
        let n = first_non_finite.unwrap_or(result.trajectory.len());
        let states = &result.trajectory[..n];
        if states.is_empty() {
            return Self {
                first_non_finite,
                ..Self::default()
            };
        }

        let count = n as f64;
        let mean_z = states.iter().map(|s| s.position.z).sum::<f64>() / count;
        let rms_heave = (states
            .iter()
            .map(|s| (s.position.z - mean_z).powi(2))
            .sum::<f64>()
            / count)
            .sqrt();

        let max_helipad_speed = states
            .iter()
            .map(|s| helipad_sample(s, &result.helipad_pos, 0.0).velocity.magnitude())
            .fold(0.0, f64::max);

        Self {
            samples: n,
            max_abs_roll: states.iter().map(|s| s.attitude.x.abs()).fold(0.0, f64::max),
            max_abs_pitch: states.iter().map(|s| s.attitude.y.abs()).fold(0.0, f64::max),
            rms_heave,
            mean_surge: states.iter().map(|s| s.velocity.x).sum::<f64>() / count,
            max_helipad_speed,
            first_non_finite,
        }
    }

    pub fn diverged(&self) -> bool {
        self.first_non_finite.is_some()
    }

    /// Get a summary of metrics as a hash map.
    pub fn get_summary(&self) -> HashMap<String, f64> {
        let mut summary = HashMap::new();
        summary.insert("samples".to_string(), self.samples as f64);
        summary.insert("max_abs_roll_deg".to_string(), self.max_abs_roll.to_degrees());
        summary.insert("max_abs_pitch_deg".to_string(), self.max_abs_pitch.to_degrees());
        summary.insert("rms_heave".to_string(), self.rms_heave);
        summary.insert("mean_surge".to_string(), self.mean_surge);
        summary.insert("max_helipad_speed".to_string(), self.max_helipad_speed);
        if let Some(step) = self.first_non_finite {
            summary.insert("first_non_finite".to_string(), step as f64);
        }
        summary
    }
}
