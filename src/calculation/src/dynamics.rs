/// Rigid-body ship motion on a synthesised sea.
///
/// The ship is a 12-state rigid body: earth-fixed position (z down), body
/// velocities, Euler angles and body rates. Linear drag and rotational
/// damping form a linear model that is discretised once by zero-order hold.
/// Buoyancy, gravity and the two station-keeping regulators enter as inputs
/// every step; Coriolis coupling and the frame rotations are applied on top
/// of the linear update.
///
/// The hull mesh lives in the z-up frame of the wave grid and is moved in
/// place each step to follow the state.

use ndarray::{Array1, Array2};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::config::ShipConfig;
use crate::constants::Constants;
use crate::error::{Result, SimError};
use crate::hull::HullMesh;
use crate::ode::{DiscreteModel, LinearModel};
use crate::vector::{Mat3, Vec3};
use crate::waves::WaveField;

/// Number of state components.
pub const STATE_DIM: usize = 12;
/// Number of inputs: three accelerations, three angular accelerations.
pub const INPUT_DIM: usize = 6;

/// `[x, y, z, v_u, v_v, v_w, φ, θ, ψ, ω_φ, ω_θ, ω_ψ]`
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ShipState {
    /// Earth-fixed position, y and z flipped relative to the mesh frame
    pub position: Vec3,
    /// Body-fixed velocity (u, v, w)
    pub velocity: Vec3,
    /// Roll, pitch, yaw
    pub attitude: Vec3,
    /// Body rates
    pub rates: Vec3,
}

impl ShipState {
    pub fn to_array(&self) -> [f64; STATE_DIM] {
        let mut out = [0.0; STATE_DIM];
        for (k, v) in [self.position, self.velocity, self.attitude, self.rates]
            .iter()
            .enumerate()
        {
            out[3 * k..3 * k + 3].copy_from_slice(&v.to_array());
        }
        out
    }

    pub fn from_array(a: &[f64; STATE_DIM]) -> Self {
        Self {
            position: Vec3::new(a[0], a[1], a[2]),
            velocity: Vec3::new(a[3], a[4], a[5]),
            attitude: Vec3::new(a[6], a[7], a[8]),
            rates: Vec3::new(a[9], a[10], a[11]),
        }
    }

    pub fn is_finite(&self) -> bool {
        self.position.is_finite()
            && self.velocity.is_finite()
            && self.attitude.is_finite()
            && self.rates.is_finite()
    }
}

/// Leaky PI regulator: `u ← k_i·u + k_p·(ref − y)`.
///
/// `k_i` is the per-step retention of the accumulated command rather than an
/// integral gain, so the loop keeps a small steady-state error.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PiRegulator {
    pub kp: f64,
    pub ki: f64,
    command: f64,
}

impl PiRegulator {
    pub fn new(kp: f64, ki: f64) -> Self {
        Self {
            kp,
            ki,
            command: 0.0,
        }
    }

    pub fn update(&mut self, reference: f64, measured: f64) -> f64 {
        self.command = self.ki * self.command + self.kp * (reference - measured);
        self.command
    }

    pub fn command(&self) -> f64 {
        self.command
    }
}

/// Trajectory and plotting data of one run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimulationResult {
    /// One state per entry of `t_vec`
    pub trajectory: Vec<ShipState>,
    /// Centre of gravity in the mesh frame, one per entry of `t_vec`
    pub cog_history: Vec<Vec3>,
    /// Hull as it was after the last step
    pub final_mesh: HullMesh,
    pub t_vec: Array1<f64>,
    pub ts: f64,
    pub beta: f64,
    pub helipad_pos: Vec3,
    /// Hull faces and vertices after placement, before any motion
    pub faces: Vec<[usize; 3]>,
    pub vertices: Vec<Vec3>,
}

/// What a plotting tool needs to draw the state channels.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotBundle {
    pub trajectory: Vec<ShipState>,
    pub t_vec: Array1<f64>,
    pub ts: f64,
    pub beta: f64,
    pub helipad_pos: Vec3,
}

/// What a 3D viewer needs to replay the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VisualBundle {
    pub trajectory: Vec<ShipState>,
    pub elevation: ndarray::Array3<f64>,
    pub x_vec: Array1<f64>,
    pub y_vec: Array1<f64>,
    pub t_vec: Array1<f64>,
    pub faces: Vec<[usize; 3]>,
    pub vertices: Vec<Vec3>,
    pub cog_history: Vec<Vec3>,
}

impl SimulationResult {
    /// First step whose state has an `Inf` or `NaN` component.
    pub fn first_non_finite_step(&self) -> Option<usize> {
        self.trajectory.iter().position(|s| !s.is_finite())
    }

    /// Whether the run blew up. A diverged run still carries its full
    /// trajectory.
    pub fn diverged(&self) -> bool {
        self.first_non_finite_step().is_some()
    }

    pub fn plot_bundle(&self) -> PlotBundle {
        PlotBundle {
            trajectory: self.trajectory.clone(),
            t_vec: self.t_vec.clone(),
            ts: self.ts,
            beta: self.beta,
            helipad_pos: self.helipad_pos,
        }
    }

    pub fn visual_bundle(&self, waves: &WaveField) -> VisualBundle {
        VisualBundle {
            trajectory: self.trajectory.clone(),
            elevation: waves.elevation.clone(),
            x_vec: waves.x_vec.clone(),
            y_vec: waves.y_vec.clone(),
            t_vec: waves.t_vec.clone(),
            faces: self.faces.clone(),
            vertices: self.vertices.clone(),
            cog_history: self.cog_history.clone(),
        }
    }
}

/// Continuous-time drag/damping model of the ship.
pub fn ship_model(constants: &Constants, ship: &ShipConfig) -> Result<LinearModel> {
    let [au, av, aw] = ship.drag_areas();
    let [iu, iv, iw] = ship.inertia();
    let rho = constants.rho_water;
    let drag = [
        constants.c_du * rho * au / ship.mass,
        constants.c_dv * rho * av / ship.mass,
        constants.c_dw * rho * aw / ship.mass,
    ];
    let damping = [constants.b_phi / iu, constants.b_th / iv, constants.b_psi / iw];

    let mut a = Array2::<f64>::zeros((STATE_DIM, STATE_DIM));
    let mut b = Array2::<f64>::zeros((STATE_DIM, INPUT_DIM));
    for k in 0..3 {
        a[[k, 3 + k]] = 1.0;
        a[[3 + k, 3 + k]] = -drag[k];
        a[[6 + k, 9 + k]] = 1.0;
        a[[9 + k, 9 + k]] = -damping[k];
        b[[3 + k, k]] = 1.0;
        b[[9 + k, 3 + k]] = 1.0;
    }
    LinearModel::new(a, b)
}

/// Integrates ship motion over a wave field.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct RigidBodyIntegrator {
    pub constants: Constants,
}

impl RigidBodyIntegrator {
    pub fn new(constants: Constants) -> Self {
        Self { constants }
    }

    fn validate(ship: &ShipConfig, hull: &HullMesh, waves: &WaveField) -> Result<()> {
        if waves.t_vec.len() < 2 {
            return Err(SimError::shape(format!(
                "need at least two time samples, got {}",
                waves.t_vec.len()
            )));
        }
        if !(waves.ts.is_finite() && waves.ts > 0.0) {
            return Err(SimError::shape(format!(
                "sample time must be positive, got {}",
                waves.ts
            )));
        }
        waves.check_shape()?;
        if hull.is_empty() {
            return Err(SimError::shape("hull mesh has no faces"));
        }
        let faces = hull.faces.len();
        let derived = [hull.centroids.len(), hull.areas.len(), hull.normals.len()];
        if derived.iter().any(|&n| n != faces) {
            return Err(SimError::shape(format!(
                "hull has {faces} faces but centroids/areas/normals of length {derived:?}"
            )));
        }
        let physical = [ship.mass, ship.length, ship.width, ship.height];
        if physical.iter().any(|v| !(v.is_finite() && *v > 0.0)) {
            return Err(SimError::invalid(format!(
                "mass and dimensions must be positive, got {physical:?}"
            )));
        }
        Ok(())
    }

    /// Run the simulation over every sample of `waves.t_vec`.
    ///
    /// Only setup problems are errors. Once stepping starts the run always
    /// completes; check [`SimulationResult::diverged`] for blow-ups.
    pub fn simulate(
        &self,
        ship: &ShipConfig,
        mut hull: HullMesh,
        waves: &WaveField,
    ) -> Result<SimulationResult> {
        Self::validate(ship, &hull, waves)?;

        let c = &self.constants;
        let ts = waves.ts;
        let steps = waves.t_vec.len();
        let model = ship_model(c, ship)?.discretize(ts)?;
        let [iu, iv, iw] = ship.inertia();

        hull.translate(&ship.vertex_offset);
        let placed_vertices = hull.vertices.clone();
        let placed_faces = hull.faces.clone();
        let mut cog = hull.bounding_center().add(&ship.cog_offset);

        let init = &ship.initial;
        let mut state = ShipState {
            position: cog.flip_yz(),
            velocity: Vec3::new(init[0], init[1], init[2]),
            attitude: Vec3::new(init[3], init[4], init[5]),
            rates: Vec3::new(init[6], init[7], init[8]),
        };
        let Vec3 { x: phi, y: th, z: psi } = state.attitude;
        hull.rotate_about(&cog, &Mat3::euler_xyz(phi, -th, -psi).transpose());

        if let Some(i) = hull
            .centroids
            .iter()
            .position(|p| !waves.contains(p.x, p.y))
        {
            return Err(SimError::shape(format!(
                "face {i} at ({:.2}, {:.2}) lies outside the wave grid",
                hull.centroids[i].x, hull.centroids[i].y
            )));
        }

        log::info!(
            "simulating {} steps of {ts} s with {} hull faces",
            steps - 1,
            hull.face_count()
        );
        log::debug!("ship: {ship:?}");

        let mut surge = PiRegulator::new(c.kp_force, c.ki_force);
        let mut yaw = PiRegulator::new(c.kp_torque, c.ki_torque);

        let mut trajectory = Vec::with_capacity(steps);
        let mut cog_history = Vec::with_capacity(steps);
        trajectory.push(state);

        for step in 0..steps - 1 {
            cog_history.push(cog);

            let Vec3 { x: phi, y: th, z: psi } = state.attitude;
            let r_mesh = Mat3::euler_xyz(phi, -th, -psi);
            let (force, torque) = self.buoyancy(&hull, &cog, &r_mesh, waves, step);

            let surge_cmd = surge.update(ship.ref_speed_u, state.velocity.x);
            let yaw_cmd = yaw.update(ship.ref_yaw, psi);

            let m = ship.mass;
            let accel = r_mesh
                .mul_vec(&Vec3::new(force.x / m, -force.y / m, -force.z / m + c.g))
                .add(&Vec3::new(surge_cmd, 0.0, 0.0));
            let angular = Vec3::new(torque.x / iu, -torque.y / iv, -torque.z / iw + yaw_cmd);

            let next = advance(&model, &state, &accel, &angular);

            let d_pos = next.position.sub(&state.position);
            let d_att = next.attitude.sub(&state.attitude);
            hull.rotate_about(
                &cog,
                &Mat3::euler_xyz(d_att.x, -d_att.y, -d_att.z).transpose(),
            );
            let shift = d_pos.flip_yz();
            hull.translate(&shift);
            cog = cog.add(&shift);

            state = next;
            trajectory.push(state);
        }
        cog_history.push(cog);

        match trajectory.iter().position(|s| !s.is_finite()) {
            Some(i) => log::warn!("state became non-finite at step {i}"),
            None => log::info!("simulation done"),
        }

        Ok(SimulationResult {
            trajectory,
            cog_history,
            final_mesh: hull,
            t_vec: waves.t_vec.clone(),
            ts,
            beta: waves.beta,
            helipad_pos: ship.helipad_pos,
            faces: placed_faces,
            vertices: placed_vertices,
        })
    }

    /// Net buoyancy force and torque (mesh frame) at time index `step`.
    ///
    /// Faces are evaluated in parallel and summed in face order.
    fn buoyancy(
        &self,
        hull: &HullMesh,
        cog: &Vec3,
        rotation: &Mat3,
        waves: &WaveField,
        step: usize,
    ) -> (Vec3, Vec3) {
        let pressure = self.constants.pressure_gradient();
        let contributions: Vec<Option<(Vec3, Vec3)>> = (0..hull.face_count())
            .into_par_iter()
            .map(|f| {
                let p = hull.centroids[f];
                let (iy, ix) = waves.sample_index(p.x, p.y);
                let eta = waves.elevation[[iy, ix, step]];
                if !(eta > p.z) {
                    return None;
                }
                let volume = (eta - p.z) * hull.areas[f];
                let force = hull.normals[f].mul(pressure * volume);
                let lever = rotation.mul_vec(&p.sub(cog));
                let torque = lever.cross(&rotation.mul_vec(&force));
                Some((force, torque))
            })
            .collect();

        contributions
            .into_iter()
            .flatten()
            .fold((Vec3::zero(), Vec3::zero()), |(f, t), (df, dt)| {
                (f.add(&df), t.add(&dt))
            })
    }
}

/// One time update of the state given body accelerations.
fn advance(model: &DiscreteModel, s: &ShipState, accel: &Vec3, angular: &Vec3) -> ShipState {
    let ad = &model.ad;
    let Vec3 { x: phi, y: th, z: psi } = s.attitude;

    let vel_earth = Mat3::euler_xyz(phi, th, psi).transpose().mul_vec(&s.velocity);
    let attitude_rate = Mat3::euler_rate_transform(phi, th).mul_vec(&s.rates);
    let coriolis = s.rates.cross(&s.velocity);

    let vel_earth = vel_earth.to_array();
    let attitude_rate = attitude_rate.to_array();
    let coriolis = coriolis.to_array();
    let pos = s.position.to_array();
    let vel = s.velocity.to_array();
    let att = s.attitude.to_array();
    let rates = s.rates.to_array();

    let mut next = [0.0; STATE_DIM];
    for k in 0..3 {
        next[k] = pos[k] + ad[[k, 3 + k]] * vel_earth[k];
        next[3 + k] = ad[[3 + k, 3 + k]] * vel[k] - model.ts * coriolis[k];
        next[6 + k] = att[k] + ad[[6 + k, 9 + k]] * attitude_rate[k];
        next[9 + k] = ad[[9 + k, 9 + k]] * rates[k];
    }

    let input = Array1::from(vec![
        accel.x, accel.y, accel.z, angular.x, angular.y, angular.z,
    ]);
    for (n, du) in next.iter_mut().zip(model.input_response(&input).iter()) {
        *n += du;
    }
    ShipState::from_array(&next)
}
