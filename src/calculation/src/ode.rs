/// Zero-order-hold discretisation of linear time-invariant models.
///
/// For `ẋ = A x + B u` with `u` held constant over a step of length `Ts`,
/// the exact update is `x⁺ = Ad x + Bd u` with
///
/// ```text
/// expm([A B; 0 0] · Ts) = [Ad Bd; 0 I]
/// ```
///
/// The matrix exponential uses scaling and squaring around a truncated
/// Taylor series, which is plenty for the small, well-conditioned models the
/// ship integrator builds.

use ndarray::{s, Array1, Array2};

use crate::error::{Result, SimError};

/// Norm the scaled matrix is brought under before the Taylor series.
const SCALED_NORM: f64 = 0.5;
/// Taylor terms; with ‖M‖ ≤ 0.5 the truncation error is far below f64 epsilon.
const TAYLOR_TERMS: usize = 18;

/// Continuous-time model `ẋ = A x + B u`.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearModel {
    pub a: Array2<f64>,
    pub b: Array2<f64>,
}

/// Discrete-time model `x⁺ = Ad x + Bd u`.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscreteModel {
    pub ad: Array2<f64>,
    pub bd: Array2<f64>,
    pub ts: f64,
}

impl LinearModel {
    pub fn new(a: Array2<f64>, b: Array2<f64>) -> Result<Self> {
        let (n, m) = a.dim();
        if n != m {
            return Err(SimError::shape(format!("A must be square, got {n}x{m}")));
        }
        if b.nrows() != n {
            return Err(SimError::shape(format!(
                "B has {} rows, A has {n}",
                b.nrows()
            )));
        }
        Ok(Self { a, b })
    }

    pub fn states(&self) -> usize {
        self.a.nrows()
    }

    pub fn inputs(&self) -> usize {
        self.b.ncols()
    }

    /// Discretise with a zero-order hold on the input.
    pub fn discretize(&self, ts: f64) -> Result<DiscreteModel> {
        if !(ts.is_finite() && ts > 0.0) {
            return Err(SimError::invalid(format!(
                "sample time must be positive, got {ts}"
            )));
        }
        let n = self.states();
        let m = self.inputs();

        let mut augmented = Array2::<f64>::zeros((n + m, n + m));
        augmented.slice_mut(s![..n, ..n]).assign(&(&self.a * ts));
        augmented.slice_mut(s![..n, n..]).assign(&(&self.b * ts));

        let e = expm(&augmented);
        Ok(DiscreteModel {
            ad: e.slice(s![..n, ..n]).to_owned(),
            bd: e.slice(s![..n, n..]).to_owned(),
            ts,
        })
    }
}

impl DiscreteModel {
    /// `Bd u`.
    pub fn input_response(&self, u: &Array1<f64>) -> Array1<f64> {
        self.bd.dot(u)
    }
}

/// Matrix exponential by scaling and squaring.
pub fn expm(m: &Array2<f64>) -> Array2<f64> {
    let n = m.nrows();
    let norm = m
        .rows()
        .into_iter()
        .map(|row| row.iter().map(|v| v.abs()).sum::<f64>())
        .fold(0.0, f64::max);

    let squarings = if norm > SCALED_NORM {
        (norm / SCALED_NORM).log2().ceil() as i32
    } else {
        0
    };
    let scaled = m / 2f64.powi(squarings);

    let mut result = Array2::<f64>::eye(n);
    let mut term = Array2::<f64>::eye(n);
    for k in 1..=TAYLOR_TERMS {
        term = term.dot(&scaled) / k as f64;
        result += &term;
    }

    for _ in 0..squarings {
        result = result.dot(&result);
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::array;

    #[test]
    fn test_expm_of_zero_is_identity() {
        let e = expm(&Array2::zeros((4, 4)));
        assert_eq!(e, Array2::<f64>::eye(4));
    }

    #[test]
    fn test_expm_diagonal() {
        let e = expm(&array![[-3.0, 0.0], [0.0, 1.5]]);
        assert_relative_eq!(e[[0, 0]], (-3.0f64).exp(), max_relative = 1e-13);
        assert_relative_eq!(e[[1, 1]], 1.5f64.exp(), max_relative = 1e-13);
        assert_eq!(e[[0, 1]], 0.0);
    }

    #[test]
    fn test_expm_rotation_generator() {
        // exp of a skew matrix is a rotation.
        let t: f64 = 2.5;
        let e = expm(&array![[0.0, -t], [t, 0.0]]);
        assert_relative_eq!(e[[0, 0]], t.cos(), epsilon = 1e-12);
        assert_relative_eq!(e[[1, 0]], t.sin(), epsilon = 1e-12);
    }

    #[test]
    fn test_damped_channel_matches_closed_form() {
        // Position integrates velocity, velocity damped at rate a, force on velocity.
        let a = 0.7;
        let ts = 0.2;
        let model = LinearModel::new(array![[0.0, 1.0], [0.0, -a]], array![[0.0], [1.0]]).unwrap();
        let d = model.discretize(ts).unwrap();

        let decay = (-a * ts).exp();
        let gain = (1.0 - decay) / a;
        assert_relative_eq!(d.ad[[0, 0]], 1.0, epsilon = 1e-14);
        assert_relative_eq!(d.ad[[1, 1]], decay, epsilon = 1e-14);
        assert_relative_eq!(d.ad[[0, 1]], gain, epsilon = 1e-14);
        assert_relative_eq!(d.bd[[1, 0]], gain, epsilon = 1e-14);
        assert_relative_eq!(d.bd[[0, 0]], (ts - gain) / a, epsilon = 1e-14);
        assert_eq!(d.ad[[1, 0]], 0.0);
    }

    #[test]
    fn test_input_response() {
        let model = LinearModel::new(array![[-1.0]], array![[2.0, 0.0]]).unwrap();
        let d = model.discretize(0.1).unwrap();
        let x = d.input_response(&array![1.0, 5.0]);
        assert_relative_eq!(x[0], 2.0 * (1.0 - (-0.1f64).exp()), epsilon = 1e-14);
    }

    #[test]
    fn test_shape_and_sample_time_validation() {
        assert!(matches!(
            LinearModel::new(Array2::zeros((2, 3)), Array2::zeros((2, 1))),
            Err(SimError::ShapeMismatch(_))
        ));
        assert!(matches!(
            LinearModel::new(Array2::zeros((2, 2)), Array2::zeros((3, 1))),
            Err(SimError::ShapeMismatch(_))
        ));
        let model = LinearModel::new(Array2::zeros((1, 1)), Array2::zeros((1, 1))).unwrap();
        assert!(matches!(model.discretize(0.0), Err(SimError::InvalidInput(_))));
    }
}
