/// Random sea surface synthesis.
///
/// The surface is a superposition of regular wavelets whose amplitudes come
/// from a Bretschneider spectrum for the drawn significant wave height. Each
/// frequency bin gets a jittered frequency and a random phase. Short-crested
/// seas additionally spread the energy over jittered directions with a
/// cos² spreading function.
///
/// Elevations are stored `[y][x][t]`, matching the layout the integrator
/// samples from.

use std::f64::consts::{FRAC_PI_2, PI};
use std::fmt::Write as _;

use ndarray::{Array1, Array3, Axis};
use ndarray::parallel::prelude::*;
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::constants::sea_state;
use crate::error::{Result, SimError};
use crate::spectrum::{SpectrumParameters, GRAVITY};

/// Width of a frequency bin (rad/s).
pub const FREQUENCY_STEP: f64 = 0.1;
/// Upper end of the synthesised frequency band (rad/s).
pub const FREQUENCY_MAX: f64 = 3.0;
/// Upper bound on the direction bins of a short-crested sea (0.05° spacing).
pub const MAX_DIRECTIONS: usize = 3600;

/// Directional model of the sea.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Crest {
    /// All energy travels along the main direction β.
    LongCrested,
    /// Energy spread over `directions` (rad, relative to β), each bin `dmu` wide.
    ShortCrested { directions: Vec<f64>, dmu: f64 },
}

impl Crest {
    /// Directions −π/2, −π/2 + dmu, … below π/2.
    pub fn short_crested(dmu: f64) -> Result<Self> {
        if !(dmu.is_finite() && dmu > 0.0) {
            return Err(SimError::invalid(format!(
                "direction step must be positive, got {dmu}"
            )));
        }
        let count = (PI / dmu).ceil();
        if count > MAX_DIRECTIONS as f64 {
            return Err(SimError::invalid(format!(
                "direction step {dmu} gives {count} directions, at most {MAX_DIRECTIONS} allowed"
            )));
        }
        let count = count as usize;
        let directions = (0..count)
            .map(|i| -FRAC_PI_2 + i as f64 * dmu)
            .filter(|mu| *mu < FRAC_PI_2)
            .collect();
        Ok(Self::ShortCrested { directions, dmu })
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::LongCrested => "long",
            Self::ShortCrested { .. } => "short",
        }
    }
}

/// cos² spreading, `(2/π) cos² μ` inside ±π/2 and zero outside.
#[inline(always)]
pub fn spreading(mu: f64) -> f64 {
    if (-FRAC_PI_2..=FRAC_PI_2).contains(&mu) {
        2.0 / PI * mu.cos().powi(2)
    } else {
        0.0
    }
}

/// What to synthesise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveRequest {
    pub sea_state: u8,
    pub x_vec: Array1<f64>,
    pub y_vec: Array1<f64>,
    /// Main wave direction (rad)
    pub beta: f64,
    pub t_vec: Array1<f64>,
    /// Ship speed along x (m/s), applied as advection of the field
    pub ship_speed: f64,
    pub crest: Crest,
    /// Fixed wavelength for long-crested seas. `None` uses the deep-water
    /// dispersion relation `κ = ω²/g`.
    #[serde(default)]
    pub wavelength: Option<f64>,
}

impl WaveRequest {
    fn validate(&self) -> Result<()> {
        for (name, v) in [("x", &self.x_vec), ("y", &self.y_vec), ("t", &self.t_vec)] {
            if v.is_empty() {
                return Err(SimError::invalid(format!("{name} vector is empty")));
            }
            if v.iter().any(|c| !c.is_finite()) {
                return Err(SimError::invalid(format!("{name} vector has non-finite values")));
            }
        }
        if !self.beta.is_finite() || !self.ship_speed.is_finite() {
            return Err(SimError::invalid("beta and ship speed must be finite"));
        }
        if let Some(lambda) = self.wavelength {
            if !(lambda.is_finite() && lambda > 0.0) {
                return Err(SimError::invalid(format!(
                    "wavelength must be positive, got {lambda}"
                )));
            }
        }
        if let Crest::ShortCrested { directions, dmu } = &self.crest {
            if !(dmu.is_finite() && *dmu > 0.0) {
                return Err(SimError::invalid(format!(
                    "direction step must be positive, got {dmu}"
                )));
            }
            if directions.is_empty() || directions.iter().any(|d| !d.is_finite()) {
                return Err(SimError::invalid(
                    "short-crested sea needs a non-empty, finite direction vector",
                ));
            }
        }
        Ok(())
    }
}

/// Where a wave field came from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum WaveSource {
    Synthesized {
        sea_state: u8,
        significant_wave_height: f64,
        crest: Crest,
        ship_speed: f64,
    },
    /// Flat water.
    Calm,
    /// Supplied by the caller.
    External,
}

/// Sampled sea surface elevation on a regular grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WaveField {
    pub x_vec: Array1<f64>,
    pub y_vec: Array1<f64>,
    pub t_vec: Array1<f64>,
    pub ts: f64,
    pub beta: f64,
    /// Elevation (m), `[y][x][t]`
    pub elevation: Array3<f64>,
    pub source: WaveSource,
}

fn sample_time(t_vec: &Array1<f64>) -> f64 {
    if t_vec.len() >= 2 {
        t_vec[1] - t_vec[0]
    } else {
        0.0
    }
}

impl WaveField {
    /// Wrap an externally computed elevation array.
    pub fn new(
        x_vec: Array1<f64>,
        y_vec: Array1<f64>,
        t_vec: Array1<f64>,
        beta: f64,
        elevation: Array3<f64>,
    ) -> Result<Self> {
        let field = Self {
            ts: sample_time(&t_vec),
            x_vec,
            y_vec,
            t_vec,
            beta,
            elevation,
            source: WaveSource::External,
        };
        field.check_shape()?;
        Ok(field)
    }

    /// Flat water over the grid.
    pub fn calm(x_vec: Array1<f64>, y_vec: Array1<f64>, t_vec: Array1<f64>) -> Self {
        let elevation = Array3::zeros((y_vec.len(), x_vec.len(), t_vec.len()));
        Self {
            ts: sample_time(&t_vec),
            x_vec,
            y_vec,
            t_vec,
            beta: 0.0,
            elevation,
            source: WaveSource::Calm,
        }
    }

    pub fn check_shape(&self) -> Result<()> {
        let expected = (self.y_vec.len(), self.x_vec.len(), self.t_vec.len());
        if self.elevation.dim() != expected {
            return Err(SimError::shape(format!(
                "elevation is {:?}, grid is (y, x, t) = {expected:?}",
                self.elevation.dim()
            )));
        }
        Ok(())
    }

    /// Nearest grid index `(iy, ix)` for a mesh-frame point, clamped to the
    /// grid. The grid is assumed regular.
    pub fn sample_index(&self, x: f64, y: f64) -> (usize, usize) {
        (nearest(&self.y_vec, y), nearest(&self.x_vec, x))
    }

    /// Whether `(x, y)` lies inside the grid extent.
    pub fn contains(&self, x: f64, y: f64) -> bool {
        within(&self.x_vec, x) && within(&self.y_vec, y)
    }

    pub fn significant_wave_height(&self) -> f64 {
        match &self.source {
            WaveSource::Synthesized {
                significant_wave_height,
                ..
            } => *significant_wave_height,
            _ => 0.0,
        }
    }

    /// Multi-line human readable description.
    pub fn display_name(&self) -> String {
        let mut out = String::from("Waves with properties:");
        match &self.source {
            WaveSource::Synthesized {
                sea_state,
                significant_wave_height,
                crest,
                ship_speed,
            } => {
                let _ = write!(out, "\n   -Sea state: {sea_state}");
                let _ = write!(
                    out,
                    "\n   -Significant wave height: {significant_wave_height:.2} m"
                );
                let _ = write!(out, "\n   -{} crested", crest.label());
                let _ = write!(out, "\n   -Main wave direction (beta): {:.4} rad", self.beta);
                self.write_grid(&mut out);
                let _ = write!(out, "\n   -U: {ship_speed} m/s");
            }
            WaveSource::Calm => {
                out.push_str("\n   -Calm water");
                self.write_grid(&mut out);
            }
            WaveSource::External => {
                out.push_str("\n   -External elevation data");
                let _ = write!(out, "\n   -Main wave direction (beta): {:.4} rad", self.beta);
                self.write_grid(&mut out);
            }
        }
        out
    }

    fn write_grid(&self, out: &mut String) {
        for (name, v, unit) in [("x", &self.x_vec, "m"), ("y", &self.y_vec, "m")] {
            if let Some((a, b)) = ends(v) {
                let step = if v.len() > 1 { (b - a) / (v.len() - 1) as f64 } else { 0.0 };
                let _ = write!(out, "\n   -{name}: {a}:{step}:{b} {unit}");
            }
        }
        if let Some((a, b)) = ends(&self.t_vec) {
            let _ = write!(out, "\n   -t: {a}:{}:{b} s", self.ts);
        }
    }
}

fn ends(grid: &Array1<f64>) -> Option<(f64, f64)> {
    if grid.is_empty() {
        None
    } else {
        Some((grid[0], grid[grid.len() - 1]))
    }
}

fn nearest(grid: &Array1<f64>, v: f64) -> usize {
    let n = grid.len();
    if n < 2 {
        return 0;
    }
    let step = grid[1] - grid[0];
    let idx = ((v - grid[0]) / step).round();
    if !(idx > 0.0) {
        0
    } else {
        (idx as usize).min(n - 1)
    }
}

fn within(grid: &Array1<f64>, v: f64) -> bool {
    match ends(grid) {
        Some((a, b)) => v >= a.min(b) && v <= a.max(b),
        None => false,
    }
}

/// One regular wave component.
#[derive(Debug, Clone, Copy)]
struct Wavelet {
    amplitude: f64,
    wavenumber: f64,
    cos_dir: f64,
    sin_dir: f64,
    frequency: f64,
    phase: f64,
}

/// Synthesises [`WaveField`]s.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WaveSynthesizer {
    pub g: f64,
}

impl Default for WaveSynthesizer {
    fn default() -> Self {
        Self { g: GRAVITY }
    }
}

impl WaveSynthesizer {
    pub fn new(g: f64) -> Self {
        Self { g }
    }

    /// Draws, in order: Hs, one jitter per frequency bin, one jitter per
    /// direction, then the phases frequency-major. A seeded generator
    /// therefore reproduces the field exactly.
    pub fn synthesize<R: Rng>(&self, request: &WaveRequest, rng: &mut R) -> Result<WaveField> {
        request.validate()?;

        let hs = sea_state::significant_wave_height(request.sea_state, rng)?;
        log::info!(
            "synthesising {}-crested sea state {} (Hs = {hs:.3} m) on a {}x{}x{} grid",
            request.crest.label(),
            request.sea_state,
            request.y_vec.len(),
            request.x_vec.len(),
            request.t_vec.len()
        );

        let centres = Array1::range(FREQUENCY_STEP / 2.0, FREQUENCY_MAX, FREQUENCY_STEP);
        let spectrum = SpectrumParameters::bretschneider_from_hs(hs).evaluate(centres.view())?;

        let frequencies: Vec<f64> = centres
            .iter()
            .map(|c| c - FREQUENCY_STEP / 2.0 + FREQUENCY_STEP * rng.r#gen::<f64>())
            .collect();

        let wavelets = match &request.crest {
            Crest::LongCrested => {
                let phases: Vec<f64> = (0..frequencies.len())
                    .map(|_| 2.0 * PI * rng.r#gen::<f64>())
                    .collect();
                let (sin_dir, cos_dir) = (-request.beta).sin_cos();
                frequencies
                    .iter()
                    .zip(&spectrum)
                    .zip(&phases)
                    .map(|((&w, &s), &phase)| Wavelet {
                        amplitude: (2.0 * s * FREQUENCY_STEP).sqrt(),
                        wavenumber: match request.wavelength {
                            Some(lambda) => 2.0 * PI / lambda,
                            None => w * w / self.g,
                        },
                        cos_dir,
                        sin_dir,
                        frequency: w,
                        phase,
                    })
                    .collect::<Vec<_>>()
            }
            Crest::ShortCrested { directions, dmu } => {
                let jittered: Vec<f64> = directions
                    .iter()
                    .map(|d| d - dmu / 2.0 + dmu * rng.r#gen::<f64>())
                    .collect();
                let mut wavelets = Vec::with_capacity(frequencies.len() * jittered.len());
                for (&w, &s) in frequencies.iter().zip(&spectrum) {
                    for &mu in &jittered {
                        let (sin_dir, cos_dir) = (mu - request.beta).sin_cos();
                        wavelets.push(Wavelet {
                            amplitude: (2.0 * s * spreading(mu) * FREQUENCY_STEP * dmu).sqrt(),
                            wavenumber: w * w / self.g,
                            cos_dir,
                            sin_dir,
                            frequency: w,
                            phase: 2.0 * PI * rng.r#gen::<f64>(),
                        });
                    }
                }
                wavelets
            }
        };

        let mut elevation =
            Array3::<f64>::zeros((request.y_vec.len(), request.x_vec.len(), request.t_vec.len()));
        let (x_vec, y_vec, t_vec) = (&request.x_vec, &request.y_vec, &request.t_vec);
        let u = request.ship_speed;

        elevation
            .axis_iter_mut(Axis(0))
            .into_par_iter()
            .enumerate()
            .for_each(|(iy, mut row)| {
                let y = y_vec[iy];
                for (ix, &x) in x_vec.iter().enumerate() {
                    for (it, &t) in t_vec.iter().enumerate() {
                        let along = x + u * t;
                        row[[ix, it]] = wavelets
                            .iter()
                            .map(|c| {
                                let arg = c.wavenumber * (along * c.cos_dir + y * c.sin_dir)
                                    - c.frequency * t
                                    + c.phase;
                                c.amplitude * arg.cos()
                            })
                            .sum::<f64>();
                    }
                }
            });

        log::debug!("wave synthesis done, {} wavelets", wavelets.len());

        Ok(WaveField {
            ts: sample_time(&request.t_vec),
            x_vec: request.x_vec.clone(),
            y_vec: request.y_vec.clone(),
            t_vec: request.t_vec.clone(),
            beta: request.beta,
            elevation,
            source: WaveSource::Synthesized {
                sea_state: request.sea_state,
                significant_wave_height: hs,
                crest: request.crest.clone(),
                ship_speed: request.ship_speed,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn request(sea_state: u8, crest: Crest) -> WaveRequest {
        WaveRequest {
            sea_state,
            x_vec: Array1::linspace(0.0, 19.0, 20),
            y_vec: Array1::linspace(0.0, 9.0, 10),
            beta: PI,
            t_vec: Array1::linspace(0.0, 1.8, 10),
            ship_speed: 0.0,
            crest,
            wavelength: None,
        }
    }

    #[test]
    fn test_long_and_short_crested_differ_but_share_shape() {
        let long = WaveSynthesizer::default()
            .synthesize(&request(5, Crest::LongCrested), &mut StdRng::seed_from_u64(3))
            .unwrap();
        let short = WaveSynthesizer::default()
            .synthesize(
                &request(5, Crest::short_crested(PI / 20.0).unwrap()),
                &mut StdRng::seed_from_u64(3),
            )
            .unwrap();
        assert_eq!(long.elevation.dim(), (10, 20, 10));
        assert_eq!(short.elevation.dim(), (10, 20, 10));
        assert_ne!(long.elevation, short.elevation);
        assert!(long.elevation.iter().all(|v| v.is_finite()));
        assert!(short.elevation.iter().all(|v| v.is_finite()));
    }

    #[test]
    fn test_seeded_synthesis_is_reproducible() {
        let req = request(4, Crest::short_crested(PI / 10.0).unwrap());
        let a = WaveSynthesizer::default()
            .synthesize(&req, &mut StdRng::seed_from_u64(42))
            .unwrap();
        let b = WaveSynthesizer::default()
            .synthesize(&req, &mut StdRng::seed_from_u64(42))
            .unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_sea_state_zero_is_flat() {
        let field = WaveSynthesizer::default()
            .synthesize(&request(0, Crest::LongCrested), &mut StdRng::seed_from_u64(1))
            .unwrap();
        assert_eq!(field.significant_wave_height(), 0.0);
        assert!(field.elevation.iter().all(|v| *v == 0.0));
    }

    #[test]
    fn test_hs_recorded_within_bracket() {
        let field = WaveSynthesizer::default()
            .synthesize(&request(6, Crest::LongCrested), &mut StdRng::seed_from_u64(9))
            .unwrap();
        let hs = field.significant_wave_height();
        assert!((4.0..=6.0).contains(&hs));
        assert!(field.display_name().contains("Sea state: 6"));
        assert!(field.display_name().contains("long crested"));
    }

    #[test]
    fn test_fixed_wavelength_changes_field() {
        let mut req = request(5, Crest::LongCrested);
        let deep = WaveSynthesizer::default()
            .synthesize(&req, &mut StdRng::seed_from_u64(5))
            .unwrap();
        req.wavelength = Some(30.0);
        let fixed = WaveSynthesizer::default()
            .synthesize(&req, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert_ne!(deep.elevation, fixed.elevation);
    }

    #[test]
    fn test_invalid_requests() {
        let synth = WaveSynthesizer::default();
        let mut rng = StdRng::seed_from_u64(0);

        let mut req = request(9, Crest::LongCrested);
        assert!(matches!(synth.synthesize(&req, &mut rng), Err(SimError::InvalidInput(_))));

        req = request(3, Crest::ShortCrested { directions: vec![0.0], dmu: 0.0 });
        assert!(matches!(synth.synthesize(&req, &mut rng), Err(SimError::InvalidInput(_))));

        req = request(3, Crest::ShortCrested { directions: vec![], dmu: 0.1 });
        assert!(matches!(synth.synthesize(&req, &mut rng), Err(SimError::InvalidInput(_))));

        req = request(3, Crest::LongCrested);
        req.wavelength = Some(-1.0);
        assert!(matches!(synth.synthesize(&req, &mut rng), Err(SimError::InvalidInput(_))));

        req = request(3, Crest::LongCrested);
        req.t_vec = Array1::zeros(0);
        assert!(matches!(synth.synthesize(&req, &mut rng), Err(SimError::InvalidInput(_))));

        assert!(Crest::short_crested(-0.1).is_err());
    }

    #[test]
    fn test_short_crested_directions() {
        let Crest::ShortCrested { directions, .. } = Crest::short_crested(PI / 20.0).unwrap() else {
            panic!("expected short-crested");
        };
        assert_eq!(directions.len(), 20);
        assert_eq!(directions[0], -FRAC_PI_2);
        assert!(directions.iter().all(|d| *d < FRAC_PI_2));
    }

    #[test]
    fn test_direction_step_too_fine_is_rejected() {
        for dmu in [1e-300, PI / 10_000.0] {
            let err = Crest::short_crested(dmu).unwrap_err();
            assert!(matches!(err, SimError::InvalidInput(_)));
        }
        let Crest::ShortCrested { directions, .. } = Crest::short_crested(PI / 1800.0).unwrap() else {
            panic!("expected short-crested");
        };
        assert!(directions.len() <= MAX_DIRECTIONS);
    }

    #[test]
    fn test_spreading_function() {
        assert!((spreading(0.0) - 2.0 / PI).abs() < 1e-15);
        assert_eq!(spreading(2.0), 0.0);
        assert!(spreading(FRAC_PI_2) < 1e-30);
    }

    #[test]
    fn test_external_field_shape_checked() {
        let x = Array1::linspace(0.0, 4.0, 5);
        let y = Array1::linspace(0.0, 2.0, 3);
        let t = Array1::range(0.0, 1.0, 0.5);
        assert!(WaveField::new(x.clone(), y.clone(), t.clone(), 0.0, Array3::zeros((3, 5, 2))).is_ok());
        assert!(matches!(
            WaveField::new(x, y, t, 0.0, Array3::zeros((5, 3, 2))),
            Err(SimError::ShapeMismatch(_))
        ));
    }

    #[test]
    fn test_sample_index_is_nearest_and_clamped() {
        let field = WaveField::calm(
            Array1::linspace(0.0, 9.0, 10),
            Array1::linspace(-2.0, 2.0, 5),
            Array1::range(0.0, 1.0, 0.5),
        );
        assert_eq!(field.sample_index(3.4, 0.6), (3, 3));
        assert_eq!(field.sample_index(3.6, -1.6), (0, 4));
        assert_eq!(field.sample_index(-5.0, 50.0), (4, 0));
        assert!(field.contains(9.0, -2.0));
        assert!(!field.contains(9.1, 0.0));
        assert_eq!(field.ts, 0.5);
    }
}
