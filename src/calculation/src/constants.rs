/// Physical constants and tuning parameters for the ship simulation.
///
/// Everything the integrator needs beyond the ship itself lives here, so a
/// run is fully described by a `Constants`, a `ShipConfig` and a `WaveField`.

use serde::{Deserialize, Serialize};

/// Physical constants, regulator gains and damping coefficients.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Constants {
    /// Gravitational acceleration (m/s²)
    pub g: f64,

    /// Water density (kg/m³)
    pub rho_water: f64,

    /// Surge-speed regulator: proportional gain
    pub kp_force: f64,
    /// Surge-speed regulator: accumulator retention per step
    pub ki_force: f64,

    /// Yaw regulator: proportional gain
    pub kp_torque: f64,
    /// Yaw regulator: accumulator retention per step
    pub ki_torque: f64,

    /// Linear drag coefficients along the body u, v, w axes
    pub c_du: f64,
    pub c_dv: f64,
    pub c_dw: f64,

    /// Rotational damping about the body axes (N·m·s)
    pub b_phi: f64,
    pub b_th: f64,
    pub b_psi: f64,
}

impl Constants {
    /// Default constants, tuned for a frigate-sized hull.
    pub const fn new() -> Self {
        Self {
            g: 9.81,
            rho_water: 997.0,
            kp_force: 9.5,
            ki_force: 0.82,
            kp_torque: 3.5,
            ki_torque: 0.5,
            c_du: 2.5,
            c_dv: 2.5,
            c_dw: 2.5,
            b_phi: 1e10 / 20.0,
            b_th: 1e10,
            b_psi: 1e10,
        }
    }

    /// Constants with both regulators disabled. Useful to look at the free
    /// response of the hull.
    pub fn uncontrolled() -> Self {
        Self {
            kp_force: 0.0,
            ki_force: 0.0,
            kp_torque: 0.0,
            ki_torque: 0.0,
            ..Self::new()
        }
    }

    /// Sea water (ρ = 1025 kg/m³) instead of the fresh-water default.
    pub fn sea_water() -> Self {
        Self {
            rho_water: 1025.0,
            ..Self::new()
        }
    }

    /// ρ·g, the hydrostatic pressure gradient.
    #[inline(always)]
    pub fn pressure_gradient(&self) -> f64 {
        self.rho_water * self.g
    }

    /// Get a summary of constants as a hash map for reporting.
    pub fn summary(&self) -> std::collections::HashMap<String, String> {
        let mut map = std::collections::HashMap::new();
        map.insert("g (m/s²)".to_string(), format!("{:.4}", self.g));
        map.insert("ρ_water (kg/m³)".to_string(), format!("{:.1}", self.rho_water));
        map.insert(
            "surge PI (kp, ki)".to_string(),
            format!("({:.3}, {:.3})", self.kp_force, self.ki_force),
        );
        map.insert(
            "yaw PI (kp, ki)".to_string(),
            format!("({:.3}, {:.3})", self.kp_torque, self.ki_torque),
        );
        map.insert(
            "C_d (u, v, w)".to_string(),
            format!("({:.2}, {:.2}, {:.2})", self.c_du, self.c_dv, self.c_dw),
        );
        map.insert(
            "B (φ, θ, ψ)".to_string(),
            format!("({:.3e}, {:.3e}, {:.3e})", self.b_phi, self.b_th, self.b_psi),
        );
        map
    }
}

impl Default for Constants {
    fn default() -> Self {
        Self::new()
    }
}

/// Sea-state classification and significant wave height brackets
/// (Fossen, Handbook of Marine Craft Hydrodynamics, p. 204).
pub mod sea_state {
    use rand::Rng;

    use crate::error::{Result, SimError};

    /// Highest supported sea state.
    pub const MAX_SEA_STATE: u8 = 8;

    /// `[min, max]` significant wave height (m) per sea state 0..=8.
    pub const HS_BRACKETS: [(f64, f64); 9] = [
        (0.0, 0.0),
        (0.0, 0.3),
        (0.3, 0.6),
        (1.0, 2.0),
        (2.0, 3.0),
        (3.0, 4.0),
        (4.0, 6.0),
        (6.0, 9.0),
        (9.0, 14.0),
    ];

    /// The `[min, max]` Hs bracket for a sea state.
    pub fn hs_bracket(sea_state: u8) -> Result<(f64, f64)> {
        HS_BRACKETS
            .get(usize::from(sea_state))
            .copied()
            .ok_or_else(|| {
                SimError::invalid(format!(
                    "sea state {sea_state} outside 0..={MAX_SEA_STATE}"
                ))
            })
    }

    /// Draw a significant wave height for the sea state. State 0 is calm
    /// water and returns exactly 0 without consuming randomness.
    pub fn significant_wave_height<R: Rng>(sea_state: u8, rng: &mut R) -> Result<f64> {
        let (lo, hi) = hs_bracket(sea_state)?;
        if sea_state == 0 {
            return Ok(0.0);
        }
        Ok(rng.gen_range(lo..=hi))
    }
}
