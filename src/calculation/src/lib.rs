//! Seakeeping simulation library: random sea surfaces and the motion of a
//! ship hull riding on them.
//!
//! This library provides:
//! - Wave power spectra (Bretschneider, PM, ITTC, JONSWAP, Torsethaugen)
//! - Long- and short-crested wave field synthesis with an injectable RNG
//! - Triangulated hull geometry and a binary STL reader
//! - A 12-state rigid-body integrator with face-by-face buoyancy, linear
//!   drag and two station-keeping regulators
//! - Helipad motion and trajectory statistics
//!
//! # Example
//!
//! ```no_run
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//! use ndarray::Array1;
//! use seakeeping_calc::{Crest, HullMesh, RigidBodyIntegrator, ShipConfig, WaveRequest, WaveSynthesizer};
//!
//! let request = WaveRequest {
//!     sea_state: 5,
//!     x_vec: Array1::linspace(0.0, 299.0, 300),
//!     y_vec: Array1::linspace(0.0, 99.0, 100),
//!     beta: std::f64::consts::PI,
//!     t_vec: Array1::linspace(0.0, 60.0, 301),
//!     ship_speed: 0.0,
//!     crest: Crest::LongCrested,
//!     wavelength: None,
//! };
//! let waves = WaveSynthesizer::default()
//!     .synthesize(&request, &mut StdRng::seed_from_u64(1))
//!     .unwrap();
//! let ship = ShipConfig::hms_norfolk();
//! let hull = HullMesh::cuboid(ship.length, ship.width, ship.height).unwrap();
//! let result = RigidBodyIntegrator::default().simulate(&ship, hull, &waves).unwrap();
//! assert_eq!(result.trajectory.len(), 301);
//! ```

#![warn(clippy::doc_markdown)]
#![allow(clippy::tabs_in_doc_comments)]
#![allow(clippy::inconsistent_struct_constructor)]

pub mod error;
pub mod vector;
pub mod constants;
pub mod config;
pub mod spectrum;
pub mod torsethaugen;
pub mod waves;
pub mod hull;
pub mod stl;
pub mod ode;
pub mod dynamics;
pub mod metrics;

// Re-export key types and functions for easy use
pub use config::ShipConfig;
pub use constants::Constants;
pub use dynamics::{PiRegulator, RigidBodyIntegrator, ShipState, SimulationResult};
pub use error::{Result, SimError};
pub use hull::{derive_face_properties, HullMesh};
pub use metrics::{helipad_motion, TrajectoryMetrics};
pub use spectrum::SpectrumParameters;
pub use stl::{parse_binary_stl, read_stl};
pub use vector::{Mat3, Vec3};
pub use waves::{Crest, WaveField, WaveRequest, WaveSynthesizer};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
