/// Torsethaugen two-peaked spectrum.
///
/// Sum of a wind-sea peak and a swell peak, each a generalised JONSWAP shape
/// whose parameters follow from Hs and the overall peak period. Which peak
/// dominates depends on where the peak period sits relative to the fully
/// developed sea period `tf = 6.6 Hs^(1/3)`.
///
/// Reference: Torsethaugen & Haver, "Simplified double peak spectral model
/// for ocean waves" (2004).

use ndarray::{Array1, ArrayView1};

use std::f64::consts::PI;

/// Dominant sea component for a given Hs and peak period.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeaRegime {
    /// Peak period below `tf`: wind sea dominates.
    WindDominated,
    /// Peak period at or above `tf`: swell dominates.
    SwellDominated,
}

/// Shape parameters of one spectral peak.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeakParams {
    /// Significant wave height of this component (m)
    pub hs: f64,
    /// Peak period (s)
    pub tp: f64,
    /// Peak enhancement
    pub gamma: f64,
    /// High-frequency tail exponent
    pub n: f64,
    /// Spectral width exponent
    pub m: f64,
}

/// Both components of the spectrum.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TorsethaugenParams {
    pub regime: SeaRegime,
    pub wind: PeakParams,
    pub swell: PeakParams,
}

// Model constants, Torsethaugen & Haver table 1.
const AF: f64 = 6.6;
const AE: f64 = 2.0;
const AU: f64 = 25.0;
const A10: f64 = 0.7;
const A1: f64 = 0.5;
const KG: f64 = 35.0;
const KG0: f64 = 3.5;
const R: f64 = 0.857;
const K0: f64 = 0.5;
const K00: f64 = 3.2;
const M0: f64 = 4.0;
const A20: f64 = 0.6;
const A2: f64 = 0.3;
const A3: f64 = 6.0;
const S0: f64 = 0.08;
const B2: f64 = 0.7;
const B3: f64 = 3.0;
const SIGMA_A2: f64 = 2.0 * 0.07 * 0.07;
const SIGMA_B2: f64 = 2.0 * 0.09 * 0.09;
const G: f64 = 9.81;

/// Fully developed sea peak period for a significant wave height.
pub fn fully_developed_period(hs: f64) -> f64 {
    AF * hs.powf(1.0 / 3.0)
}

impl TorsethaugenParams {
    /// Split Hs and the peak frequency `w0` into wind and swell components.
    pub fn new(hs: f64, w0: f64) -> Self {
        let tp = 2.0 * PI / w0;
        let tf = fully_developed_period(hs);
        let hs_shape = KG * (1.0 + KG0 * (-hs).exp());

        if tp < tf {
            let tl = AE * hs.sqrt();
            let eps = (tf - tp) / (tf - tl);
            let rpw = (1.0 - A10) * (-(eps / A1).powi(2)).exp() + A10;
            let hsw = rpw * hs;
            let hss = (1.0 - rpw * rpw).sqrt() * hs;
            let steepness = (2.0 * PI / G) * hsw / (tp * tp);
            let n = K0 * hs.sqrt() + K00;
            Self {
                regime: SeaRegime::WindDominated,
                wind: PeakParams {
                    hs: hsw,
                    tp,
                    gamma: hs_shape * steepness.powf(R),
                    n,
                    m: M0,
                },
                swell: PeakParams {
                    hs: hss,
                    tp: tf + 2.0,
                    gamma: 1.0,
                    n,
                    m: M0,
                },
            }
        } else {
            let epsu = (tp - tf) / (AU - tf);
            let rps = (1.0 - A20) * (-(epsu / A2).powi(2)).exp() + A20;
            let hss = rps * hs;
            let hsw = (1.0 - rps * rps).sqrt() * hs;
            let ns = K0 * hs.sqrt() + K00;
            let nw = ns;
            let mw = M0 * (1.0 - B2 * (-hs / B3).exp());
            let s4 = S0 * (1.0 - (-hs / B3).exp());
            let g0w = normalisation(nw, mw);
            let tpw = ((g0w * hsw * hsw) / (16.0 * s4 * 0.4f64.powf(nw))).powf(1.0 / (nw - 1.0));
            let sf = (2.0 * PI / G) * hs / (tf * tf);
            Self {
                regime: SeaRegime::SwellDominated,
                wind: PeakParams {
                    hs: hsw,
                    tp: tpw,
                    gamma: 1.0,
                    n: nw,
                    m: mw,
                },
                swell: PeakParams {
                    hs: hss,
                    tp,
                    gamma: hs_shape * sf.powf(R) * (1.0 + A3 * epsu),
                    n: ns,
                    m: M0,
                },
            }
        }
    }
}

/// Normalisation `G0` of the generalised shape `fn^-n exp(-(n/m) fn^-m)`, so
/// that its integral over normalised frequency is one.
pub fn normalisation(n: f64, m: f64) -> f64 {
    let a = (n - 1.0) / m;
    1.0 / ((1.0 / m) * libm::tgamma(a) * (n / m).powf(-a))
}

/// Correction that keeps the variance of a peak independent of γ.
fn gamma_correction(gamma: f64, n: f64, m: f64) -> f64 {
    let b1m = 2.0 * m.powf(0.28) - 5.3;
    let c1m = -1.45 * m.powf(0.1) + 0.96;
    let a2m = 2.2 / m.powf(3.3) + 0.57;
    let b2m = -0.58 * m.powf(0.37) + 0.53;
    let c2m = -1.04 / m.powf(1.9) + 0.94;
    let f1 = 4.1 * (n - b1m).powf(c1m);
    let f2 = a2m * n.powf(b2m) + c2m;
    (1.0 + f1 * gamma.ln().powf(f2)) / gamma
}

/// Density of one peak at angular frequency `w`.
#[inline(always)]
fn peak_density(p: &PeakParams, g0: f64, a_gamma: f64, w: f64) -> f64 {
    let fn_ = w / (2.0 * PI) * p.tp;
    let sigma2 = if fn_ < 1.0 { SIGMA_A2 } else { SIGMA_B2 };
    let shape = fn_.powf(-p.n) * (-(p.n / p.m) * fn_.powf(-p.m)).exp();
    let peak = p.gamma.powf((-(fn_ - 1.0).powi(2) / sigma2).exp());
    g0 * a_gamma * shape * peak * p.tp * p.hs * p.hs / 16.0 / (2.0 * PI)
}

/// Evaluate the spectrum. A non-positive Hs gives zeros. Any non-finite
/// value is reported and replaced by an all-zero spectrum.
pub fn density(hs: f64, w0: f64, frequencies: ArrayView1<f64>) -> Array1<f64> {
    if hs <= 0.0 {
        return Array1::zeros(frequencies.len());
    }

    let params = TorsethaugenParams::new(hs, w0);
    let peaks = [params.wind, params.swell].map(|p| {
        (p, normalisation(p.n, p.m), gamma_correction(p.gamma, p.n, p.m))
    });

    let s = frequencies.mapv(|w| {
        peaks
            .iter()
            .map(|(p, g0, ag)| peak_density(p, *g0, *ag, w))
            .sum::<f64>()
    });

    finite_or_zeros(s, hs, w0, params.regime)
}

/// The density as computed, or all zeros with a warning if any bin is
/// NaN or infinite.
fn finite_or_zeros(s: Array1<f64>, hs: f64, w0: f64, regime: SeaRegime) -> Array1<f64> {
    if s.iter().all(|v| v.is_finite()) {
        return s;
    }
    log::warn!("Torsethaugen spectrum not finite for Hs={hs}, w0={w0} ({regime:?}); returning zeros");
    Array1::zeros(s.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn band() -> (Array1<f64>, f64) {
        let dw = 0.005;
        (Array1::range(0.01, 6.0, dw), dw)
    }

    fn argmax(s: &Array1<f64>) -> usize {
        s.iter()
            .enumerate()
            .fold((0, f64::MIN), |acc, (i, v)| if *v > acc.1 { (i, *v) } else { acc })
            .0
    }

    #[test]
    fn test_gamma_function() {
        assert_relative_eq!(libm::tgamma(5.0), 24.0, max_relative = 1e-12);
        assert_relative_eq!(libm::tgamma(0.5), PI.sqrt(), max_relative = 1e-12);
        assert_relative_eq!(libm::tgamma(1.0), 1.0, max_relative = 1e-12);
        assert_relative_eq!(libm::tgamma(0.25), 3.625_609_908_221_908, max_relative = 1e-10);
    }

    #[test]
    fn test_regime_selection() {
        // Hs = 4 gives tf ≈ 10.5 s.
        assert_eq!(TorsethaugenParams::new(4.0, 0.8).regime, SeaRegime::WindDominated);
        assert_eq!(TorsethaugenParams::new(4.0, 0.4).regime, SeaRegime::SwellDominated);
    }

    #[test]
    fn test_energy_matches_hs_in_both_regimes() {
        let (w, dw) = band();
        for (hs, w0) in [(4.0, 0.8), (4.0, 0.4), (2.0, 1.0), (10.0, 0.3)] {
            let s = density(hs, w0, w.view());
            let m0 = s.sum() * dw;
            assert_relative_eq!(m0, hs * hs / 16.0, max_relative = 0.1);
        }
    }

    #[test]
    fn test_peak_at_w0() {
        let (w, _) = band();
        for (hs, w0) in [(4.0, 0.8), (4.0, 0.4)] {
            let s = density(hs, w0, w.view());
            assert_relative_eq!(w[argmax(&s)], w0, epsilon = 0.02);
        }
    }

    #[test]
    fn test_wind_regime_uses_same_normalisation_as_swell() {
        // G0 must normalise the shape to unit area for any (n, m).
        for (n, m) in [(4.2, 4.0), (5.0, 3.0)] {
            let g0 = normalisation(n, m);
            let df = 1e-4;
            let area: f64 = (1..200_000)
                .map(|i| {
                    let f = i as f64 * df;
                    f.powf(-n) * (-(n / m) * f.powf(-m)).exp()
                })
                .sum::<f64>()
                * df;
            assert_relative_eq!(g0 * area, 1.0, max_relative = 1e-3);
        }
    }

    #[test]
    fn test_non_negative_and_finite() {
        let (w, _) = band();
        let s = density(3.0, 0.6, w.view());
        assert!(s.iter().all(|v| v.is_finite() && *v >= 0.0));
    }

    #[test]
    fn test_zero_hs_is_zero() {
        let (w, _) = band();
        assert!(density(0.0, 0.6, w.view()).iter().all(|v| *v == 0.0));
        assert!(density(-1.0, 0.6, w.view()).iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_non_finite_density_becomes_zeros() {
        let s = ndarray::array![0.0, 1.5, f64::NAN, 2.0];
        let out = finite_or_zeros(s, 3.0, 0.7, SeaRegime::WindDominated);
        assert_eq!(out, Array1::<f64>::zeros(4));

        let s = ndarray::array![0.0, f64::INFINITY];
        assert_eq!(finite_or_zeros(s, 3.0, 0.7, SeaRegime::SwellDominated), Array1::<f64>::zeros(2));

        let s = ndarray::array![0.0, 1.5, 2.0];
        assert_eq!(finite_or_zeros(s.clone(), 3.0, 0.7, SeaRegime::WindDominated), s);
    }
}
