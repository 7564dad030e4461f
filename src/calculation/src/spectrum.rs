/// Wave power spectral densities S(ω).
///
/// Five analytic families (Fossen, Handbook of Marine Craft Hydrodynamics,
/// ch. 8) behind one closed enum. Each variant carries exactly the parameters
/// its formula needs and is evaluated by its own function.
///
/// # Conventions
///
/// - Frequencies are angular (rad/s), strictly positive and finite.
/// - Densities are in m²·s.
/// - The density at the first supplied frequency is always forced to zero.

use ndarray::{Array1, ArrayView1, ArrayView2, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SimError};
use crate::torsethaugen;

/// Gravity used by the spectral formulas (m/s²).
pub const GRAVITY: f64 = 9.81;

/// Phillips constant times g², the `A` of the Pierson–Moskowitz family.
pub const PM_ALPHA_G2: f64 = 8.1e-3 * GRAVITY * GRAVITY;

/// Spectrum selection with its parameters.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SpectrumParameters {
    /// S = A ω⁻⁵ exp(−B/ω⁴)
    Bretschneider { a: f64, b: f64 },
    /// Fully developed sea from the wind speed 20 m above sea level.
    PiersonMoskowitz { wind_speed_20m: f64 },
    /// ITTC-modified PM from Hs and the modal period T0.
    IttcModifiedT0 { hs: f64, t0: f64 },
    /// ITTC-modified PM from Hs and the mean period T1.
    IttcModifiedT1 { hs: f64, t1: f64 },
    /// ITTC-modified PM from Hs and the zero-crossing period Tz.
    IttcModifiedTz { hs: f64, tz: f64 },
    /// JONSWAP from wind speed 10 m above sea level and fetch (m).
    JonswapFetch { wind_speed_10m: f64, fetch: f64 },
    /// JONSWAP from Hs, peak frequency and peakedness γ. A γ outside
    /// `[1, 7]` falls back to the DNV recommendation.
    JonswapPeak { hs: f64, w0: f64, gamma: f64 },
    /// Two-peaked wind sea + swell spectrum.
    Torsethaugen { hs: f64, w0: f64 },
}

impl SpectrumParameters {
    /// Bretschneider spectrum for a significant wave height, as used by the
    /// wave synthesizer. Calm water (Hs = 0) uses an effectively infinite `B`
    /// so the spectrum vanishes instead of dividing by zero.
    pub fn bretschneider_from_hs(hs: f64) -> Self {
        let b = if hs != 0.0 { 3.11 / (hs * hs) } else { 1e15 };
        Self::Bretschneider { a: PM_ALPHA_G2, b }
    }

    /// Human readable name of the family.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Bretschneider { .. } => "Bretschneider",
            Self::PiersonMoskowitz { .. } => "Pierson-Moskowitz",
            Self::IttcModifiedT0 { .. }
            | Self::IttcModifiedT1 { .. }
            | Self::IttcModifiedTz { .. } => "ITTC-modified Pierson-Moskowitz",
            Self::JonswapFetch { .. } | Self::JonswapPeak { .. } => "JONSWAP",
            Self::Torsethaugen { .. } => "Torsethaugen",
        }
    }

    /// Evaluate the density at every frequency.
    pub fn evaluate(&self, frequencies: ArrayView1<f64>) -> Result<Array1<f64>> {
        validate_frequencies(frequencies)?;
        self.validate_params()?;

        let mut s = match *self {
            Self::Bretschneider { a, b } => pm_family(a, b, frequencies),
            Self::PiersonMoskowitz { wind_speed_20m } => {
                let b = 0.74 * (GRAVITY / wind_speed_20m).powi(4);
                pm_family(PM_ALPHA_G2, b, frequencies)
            }
            Self::IttcModifiedT0 { hs, t0 } => {
                pm_family(487.0 * hs * hs / t0.powi(4), 1949.0 / t0.powi(4), frequencies)
            }
            Self::IttcModifiedT1 { hs, t1 } => {
                pm_family(173.0 * hs * hs / t1.powi(4), 691.0 / t1.powi(4), frequencies)
            }
            Self::IttcModifiedTz { hs, tz } => {
                pm_family(123.0 * hs * hs / tz.powi(4), 495.0 / tz.powi(4), frequencies)
            }
            Self::JonswapFetch { wind_speed_10m, fetch } => {
                jonswap_fetch(wind_speed_10m, fetch, frequencies)
            }
            Self::JonswapPeak { hs, w0, gamma } => jonswap_peak(hs, w0, gamma, frequencies),
            Self::Torsethaugen { hs, w0 } => torsethaugen::density(hs, w0, frequencies),
        };

        // Degenerate value at the lower edge of the band.
        s[0] = 0.0;
        Ok(s)
    }

    /// Evaluate from a 2D array that must be a single column, the layout
    /// frequency vectors come in from column-major tooling.
    pub fn evaluate_column(&self, frequencies: ArrayView2<f64>) -> Result<Array1<f64>> {
        let (rows, cols) = frequencies.dim();
        if cols != 1 || rows == 0 {
            return Err(SimError::invalid(format!(
                "frequencies must be a column vector, got {rows}x{cols}"
            )));
        }
        self.evaluate(frequencies.index_axis(Axis(1), 0))
    }

    fn validate_params(&self) -> Result<()> {
        let (values, positive): (Vec<f64>, Vec<f64>) = match *self {
            Self::Bretschneider { a, b } => (vec![a, b], vec![]),
            Self::PiersonMoskowitz { wind_speed_20m } => (vec![], vec![wind_speed_20m]),
            Self::IttcModifiedT0 { hs, t0 } => (vec![hs], vec![t0]),
            Self::IttcModifiedT1 { hs, t1 } => (vec![hs], vec![t1]),
            Self::IttcModifiedTz { hs, tz } => (vec![hs], vec![tz]),
            Self::JonswapFetch { wind_speed_10m, fetch } => (vec![], vec![wind_speed_10m, fetch]),
            Self::JonswapPeak { hs, w0, gamma } => (vec![hs, gamma], vec![w0]),
            Self::Torsethaugen { hs, w0 } => (vec![hs], vec![w0]),
        };
        if values.iter().chain(&positive).any(|v| !v.is_finite()) {
            return Err(SimError::invalid(format!(
                "{} parameters must be finite: {self:?}",
                self.name()
            )));
        }
        if positive.iter().any(|v| *v <= 0.0) {
            return Err(SimError::invalid(format!(
                "{} parameters must be positive: {self:?}",
                self.name()
            )));
        }
        Ok(())
    }
}

fn validate_frequencies(frequencies: ArrayView1<f64>) -> Result<()> {
    if frequencies.is_empty() {
        return Err(SimError::invalid("frequency vector is empty"));
    }
    if let Some(w) = frequencies.iter().find(|w| !(w.is_finite() && **w > 0.0)) {
        return Err(SimError::invalid(format!(
            "frequencies must be finite and strictly positive, found {w}"
        )));
    }
    Ok(())
}

/// A ω⁻⁵ exp(−B/ω⁴), shared by Bretschneider, PM and the ITTC variants.
#[inline(always)]
fn pm_family(a: f64, b: f64, frequencies: ArrayView1<f64>) -> Array1<f64> {
    frequencies.mapv(|w| a * w.powi(-5) * (-b / w.powi(4)).exp())
}

/// JONSWAP shape: α g² ω⁻⁵ exp(−5/4 (ω0/ω)⁴) γ^r
#[inline(always)]
fn jonswap_shape(alpha: f64, w0: f64, gamma: f64, w: f64) -> f64 {
    let sigma = if w < w0 { 0.07 } else { 0.09 };
    let s1 = alpha * GRAVITY * GRAVITY * w.powi(-5) * (-1.25 * (w0 / w).powi(4)).exp();
    let r = (-(w - w0).powi(2) / (2.0 * (sigma * w0).powi(2))).exp();
    s1 * gamma.powf(r)
}

fn jonswap_fetch(wind_speed: f64, fetch: f64, frequencies: ArrayView1<f64>) -> Array1<f64> {
    let x_tilde = GRAVITY * fetch / (wind_speed * wind_speed);
    let f0 = 3.5 * (GRAVITY / wind_speed) * x_tilde.powf(-0.33);
    let w0 = 2.0 * std::f64::consts::PI * f0;
    let alpha = 0.076 * x_tilde.powf(-0.22);
    frequencies.mapv(|w| jonswap_shape(alpha, w0, 3.3, w))
}

/// DNV recommended peakedness when the supplied γ is out of range.
pub fn dnv_gamma(hs: f64, w0: f64) -> f64 {
    let k = 2.0 * std::f64::consts::PI / (w0 * hs.sqrt());
    if k <= 3.6 {
        5.0
    } else if k <= 5.0 {
        (5.75 - 1.15 * k).exp()
    } else {
        1.0
    }
}

fn jonswap_peak(hs: f64, w0: f64, gamma: f64, frequencies: ArrayView1<f64>) -> Array1<f64> {
    let gamma = if (1.0..=7.0).contains(&gamma) {
        gamma
    } else {
        if gamma != 0.0 {
            log::warn!("JONSWAP gamma {gamma} outside validity range [1, 7], using DNV formula");
        }
        dnv_gamma(hs, w0)
    };
    let alpha = 0.2 * hs * hs * w0.powi(4) / (GRAVITY * GRAVITY);
    let conversion = 1.0 - 0.287 * gamma.ln();
    frequencies.mapv(|w| jonswap_shape(alpha, w0, gamma, w) * conversion)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array2};

    fn band() -> Array1<f64> {
        Array1::range(0.05, 3.0, 0.01)
    }

    fn all_families() -> Vec<SpectrumParameters> {
        vec![
            SpectrumParameters::bretschneider_from_hs(3.0),
            SpectrumParameters::PiersonMoskowitz { wind_speed_20m: 15.0 },
            SpectrumParameters::IttcModifiedT0 { hs: 3.0, t0: 9.0 },
            SpectrumParameters::IttcModifiedT1 { hs: 3.0, t1: 8.0 },
            SpectrumParameters::IttcModifiedTz { hs: 3.0, tz: 7.0 },
            SpectrumParameters::JonswapFetch { wind_speed_10m: 12.0, fetch: 100e3 },
            SpectrumParameters::JonswapPeak { hs: 3.0, w0: 0.7, gamma: 3.3 },
            SpectrumParameters::Torsethaugen { hs: 3.0, w0: 0.7 },
        ]
    }

    /// Zeroth moment by the rectangle rule.
    fn m0(s: &Array1<f64>, dw: f64) -> f64 {
        s.sum() * dw
    }

    #[test]
    fn test_first_density_is_zero_for_every_family() {
        let w = band();
        for spec in all_families() {
            let s = spec.evaluate(w.view()).unwrap();
            assert_eq!(s[0], 0.0, "{}", spec.name());
            assert_eq!(s.len(), w.len());
            assert!(s.iter().all(|v| v.is_finite() && *v >= 0.0), "{}", spec.name());
        }
    }

    #[test]
    fn test_single_frequency_is_zero() {
        let w = array![0.8];
        let s = SpectrumParameters::bretschneider_from_hs(2.0)
            .evaluate(w.view())
            .unwrap();
        assert_eq!(s[0], 0.0);
    }

    #[test]
    fn test_bretschneider_formula() {
        let spec = SpectrumParameters::Bretschneider { a: 2.0, b: 0.5 };
        let w = array![0.5, 1.0, 2.0];
        let s = spec.evaluate(w.view()).unwrap();
        assert_relative_eq!(s[1], 2.0 * (-0.5f64).exp(), epsilon = 1e-14);
        assert_relative_eq!(s[2], 2.0 / 32.0 * (-0.5f64 / 16.0).exp(), epsilon = 1e-14);
    }

    #[test]
    fn test_bretschneider_energy_matches_hs() {
        // m0 = Hs² / 16 for the Bretschneider parameterisation.
        let hs = 4.0;
        let w = Array1::range(0.01, 6.0, 0.001);
        let s = SpectrumParameters::bretschneider_from_hs(hs)
            .evaluate(w.view())
            .unwrap();
        assert_relative_eq!(m0(&s, 0.001), hs * hs / 16.0, max_relative = 0.05);
    }

    #[test]
    fn test_calm_bretschneider_is_zero() {
        let s = SpectrumParameters::bretschneider_from_hs(0.0)
            .evaluate(band().view())
            .unwrap();
        assert!(s.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_jonswap_peak_at_w0() {
        let w = band();
        let s = SpectrumParameters::JonswapPeak { hs: 3.0, w0: 0.8, gamma: 3.3 }
            .evaluate(w.view())
            .unwrap();
        let (imax, _) = s
            .iter()
            .enumerate()
            .fold((0, f64::MIN), |acc, (i, v)| if *v > acc.1 { (i, *v) } else { acc });
        assert_relative_eq!(w[imax], 0.8, epsilon = 0.02);
    }

    #[test]
    fn test_jonswap_out_of_range_gamma_uses_dnv() {
        let w = band();
        let fallback = SpectrumParameters::JonswapPeak { hs: 3.0, w0: 0.8, gamma: 0.0 }
            .evaluate(w.view())
            .unwrap();
        let explicit = SpectrumParameters::JonswapPeak {
            hs: 3.0,
            w0: 0.8,
            gamma: dnv_gamma(3.0, 0.8),
        }
        .evaluate(w.view())
        .unwrap();
        assert_eq!(fallback, explicit);
    }

    #[test]
    fn test_dnv_gamma_branches() {
        assert_eq!(dnv_gamma(16.0, 0.5), 5.0);
        assert_eq!(dnv_gamma(0.25, 1.0), 1.0);
        let k: f64 = 2.0 * std::f64::consts::PI / (1.5 * 1.0);
        assert_relative_eq!(dnv_gamma(1.0, 1.5), (5.75 - 1.15 * k).exp());
    }

    #[test]
    fn test_column_vector_accepted() {
        let col = Array2::from_shape_vec((3, 1), vec![0.5, 1.0, 1.5]).unwrap();
        let s = SpectrumParameters::bretschneider_from_hs(2.0)
            .evaluate_column(col.view())
            .unwrap();
        assert_eq!(s.len(), 3);
    }

    #[test]
    fn test_row_vector_rejected() {
        let row = Array2::from_shape_vec((1, 3), vec![0.5, 1.0, 1.5]).unwrap();
        let err = SpectrumParameters::bretschneider_from_hs(2.0)
            .evaluate_column(row.view())
            .unwrap_err();
        assert!(matches!(err, SimError::InvalidInput(_)));
    }

    #[test]
    fn test_non_positive_frequency_rejected() {
        let w = array![0.0, 0.5];
        assert!(matches!(
            SpectrumParameters::bretschneider_from_hs(2.0).evaluate(w.view()),
            Err(SimError::InvalidInput(_))
        ));
        let empty = Array1::<f64>::zeros(0);
        assert!(SpectrumParameters::bretschneider_from_hs(2.0)
            .evaluate(empty.view())
            .is_err());
    }

    #[test]
    fn test_bad_parameters_rejected() {
        let w = band();
        assert!(SpectrumParameters::IttcModifiedT0 { hs: 2.0, t0: 0.0 }
            .evaluate(w.view())
            .is_err());
        assert!(SpectrumParameters::Bretschneider { a: f64::NAN, b: 1.0 }
            .evaluate(w.view())
            .is_err());
    }
}
