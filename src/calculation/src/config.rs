//! Ship configuration.

use serde::{Deserialize, Serialize};

use crate::vector::Vec3;

/// Everything about the ship that does not change during a run.
///
/// Lengths are in metres, angles in radians. The hull is treated as a solid
/// cuboid of `length × width × height` for inertia and drag areas; the mesh
/// only drives buoyancy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipConfig {
    /// Mass (kg)
    pub mass: f64,
    /// Length along the body x axis (m)
    pub length: f64,
    /// Width along the body y axis (m)
    pub width: f64,
    /// Height along the body z axis (m)
    pub height: f64,
    /// Added to every mesh vertex once, before the run starts
    pub vertex_offset: Vec3,
    /// From the mesh bounding-box centre to the centre of gravity
    pub cog_offset: Vec3,
    /// Surge speed the speed regulator holds (m/s)
    pub ref_speed_u: f64,
    /// Heading the yaw regulator holds (rad)
    pub ref_yaw: f64,
    /// `[v_u, v_v, v_w, φ, θ, ψ, ω_φ, ω_θ, ω_ψ]` at t = 0
    pub initial: [f64; 9],
    /// Helipad position used by the helipad motion analysis
    pub helipad_pos: Vec3,
}

impl ShipConfig {
    /// HMS Norfolk hull, placed on a grid with one-metre spacing starting
    /// at the origin. The forward speed is zero because any ship speed is
    /// baked into the wave field as advection.
    pub fn hms_norfolk() -> Self {
        Self {
            mass: 2.5e6,
            length: 137.0,
            width: 15.0,
            height: 16.0,
            vertex_offset: Vec3::new(35.0, 70.0, 5.55),
            cog_offset: Vec3::new(-4.77, 0.022, -2.0),
            ref_speed_u: 0.0,
            ref_yaw: 0.0,
            initial: [0.0; 9],
            helipad_pos: Vec3::new(40.0, 35.0, 6.0),
        }
    }

    /// Cross-sectional areas of the submerged hull normal to u, v, w.
    pub fn drag_areas(&self) -> [f64; 3] {
        [
            self.width * 0.9 * self.height * 0.33,
            self.height * 0.33 * self.length,
            self.length * self.width * 0.9,
        ]
    }

    /// Principal moments of inertia of the equivalent solid cuboid.
    pub fn inertia(&self) -> [f64; 3] {
        let (l2, w2, h2) = (
            self.length * self.length,
            self.width * self.width,
            self.height * self.height,
        );
        let k = self.mass / 12.0;
        [k * (w2 + h2), k * (l2 + h2), k * (l2 + w2)]
    }
}

impl Default for ShipConfig {
    fn default() -> Self {
        Self::hms_norfolk()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_cuboid_inertia() {
        let ship = ShipConfig {
            mass: 12.0,
            length: 1.0,
            width: 2.0,
            height: 3.0,
            ..ShipConfig::hms_norfolk()
        };
        let [iu, iv, iw] = ship.inertia();
        assert_relative_eq!(iu, 13.0);
        assert_relative_eq!(iv, 10.0);
        assert_relative_eq!(iw, 5.0);
    }

    #[test]
    fn test_drag_areas() {
        let [au, av, aw] = ShipConfig::hms_norfolk().drag_areas();
        assert_relative_eq!(au, 15.0 * 0.9 * 16.0 * 0.33);
        assert_relative_eq!(av, 16.0 * 0.33 * 137.0);
        assert_relative_eq!(aw, 137.0 * 15.0 * 0.9);
    }
}
