//! 3D vectors and Euler-angle rotation matrices for hull kinematics.

/// 3D vector with the handful of operations the hull and buoyancy code needs.
#[derive(Debug, Clone, Copy, PartialEq, Default, serde::Serialize, serde::Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Vec3 {
    /// Creates a new vector.
    pub const fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Zero vector.
    pub const fn zero() -> Self {
        Self { x: 0.0, y: 0.0, z: 0.0 }
    }

    /// Magnitude (length) of the vector.
    #[inline(always)]
    pub fn magnitude(&self) -> f64 {
        (self.x * self.x + self.y * self.y + self.z * self.z).sqrt()
    }

    /// Dot product.
    #[inline(always)]
    pub fn dot(&self, other: &Self) -> f64 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    /// Cross product: self × other
    #[inline(always)]
    pub fn cross(&self, other: &Self) -> Self {
        Self::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    /// Element-wise addition.
    #[inline(always)]
    pub fn add(&self, other: &Self) -> Self {
        Self::new(self.x + other.x, self.y + other.y, self.z + other.z)
    }

    /// Element-wise subtraction.
    #[inline(always)]
    pub fn sub(&self, other: &Self) -> Self {
        Self::new(self.x - other.x, self.y - other.y, self.z - other.z)
    }

    /// Scalar multiplication.
    #[inline(always)]
    pub fn mul(&self, scalar: f64) -> Self {
        Self::new(self.x * scalar, self.y * scalar, self.z * scalar)
    }

    /// Flip the y and z components. Converts between the z-up mesh frame
    /// and the z-down state frame.
    #[inline(always)]
    pub fn flip_yz(&self) -> Self {
        Self::new(self.x, -self.y, -self.z)
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }

    /// Convert to array.
    pub fn to_array(&self) -> [f64; 3] {
        [self.x, self.y, self.z]
    }

    /// Convert from array.
    pub fn from_array(arr: &[f64; 3]) -> Self {
        Self::new(arr[0], arr[1], arr[2])
    }
}

/// Row-major 3x3 matrix.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Mat3 {
    pub m: [[f64; 3]; 3],
}

impl Mat3 {
    pub const fn identity() -> Self {
        Self {
            m: [[1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.0, 0.0, 1.0]],
        }
    }

    /// Rotation matrix for roll `phi`, pitch `th`, yaw `psi` using the xyz rule
    /// (Gustafsson, "Statistical Sensor Fusion", eq. 13.7). Maps earth-frame
    /// vectors into the body frame.
    pub fn euler_xyz(phi: f64, th: f64, psi: f64) -> Self {
        let (sphi, cphi) = phi.sin_cos();
        let (sth, cth) = th.sin_cos();
        let (spsi, cpsi) = psi.sin_cos();
        Self {
            m: [
                [cth * cpsi, cth * spsi, -sth],
                [
                    -cphi * spsi + sphi * sth * cpsi,
                    cphi * cpsi + sphi * sth * spsi,
                    sphi * cth,
                ],
                [
                    sphi * spsi + cphi * sth * cpsi,
                    -sphi * cpsi + cphi * sth * spsi,
                    cphi * cth,
                ],
            ],
        }
    }

    /// Body rates to Euler-angle rates (Gustafsson eq. 13.9).
    ///
    /// Singular at `th = ±π/2`; callers are expected to stay away from it.
    pub fn euler_rate_transform(phi: f64, th: f64) -> Self {
        let (sphi, cphi) = phi.sin_cos();
        let tth = th.tan();
        let cth = th.cos();
        Self {
            m: [
                [1.0, sphi * tth, cphi * tth],
                [0.0, cphi, -sphi],
                [0.0, sphi / cth, cphi / cth],
            ],
        }
    }

    pub fn transpose(&self) -> Self {
        let m = &self.m;
        Self {
            m: [
                [m[0][0], m[1][0], m[2][0]],
                [m[0][1], m[1][1], m[2][1]],
                [m[0][2], m[1][2], m[2][2]],
            ],
        }
    }

    #[inline(always)]
    pub fn mul_vec(&self, v: &Vec3) -> Vec3 {
        let m = &self.m;
        Vec3::new(
            m[0][0] * v.x + m[0][1] * v.y + m[0][2] * v.z,
            m[1][0] * v.x + m[1][1] * v.y + m[1][2] * v.z,
            m[2][0] * v.x + m[2][1] * v.y + m[2][2] * v.z,
        )
    }
}
