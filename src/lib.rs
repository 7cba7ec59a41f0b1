//! # Galaxy
//!
//! Procedural spiral galaxies as GPU point clouds, with a live parameter
//! panel.
//!
//! The interesting part is small: [`generate`] turns a [`GalaxyParams`] into
//! a [`PointCloud`], and [`ParameterHost`] keeps exactly one generated cloud
//! installed in a [`PointScene`], swapping it whenever a parameter is
//! committed. Everything else is window, camera and panel glue.
//!
//! ## Quick Start
//!
//! ```ignore
//! use galaxy::prelude::*;
//!
//! fn main() -> Result<(), AppError> {
//!     Galaxy::new()
//!         .with_params(GalaxyParams {
//!             branches: 3,
//!             spin: -1.5,
//!             ..Default::default()
//!         })
//!         .run()
//! }
//! ```
//!
//! ## Placement
//!
//! For point `i` with a random radius `r` in `[0, radius]`:
//!
//! | step | value |
//! |------|-------|
//! | arm | `(i % branches) / branches * 2π` |
//! | twist | `r * spin` |
//! | jitter | `±uniform^power` per axis |
//! | color | inside → outside by `r / radius` |
//!
//! `randomness` is part of the parameter set and the panel but does not
//! enter the formula.

mod app;
pub mod error;
pub mod generator;
mod gpu;
pub mod host;
#[cfg(feature = "egui")]
pub mod panel;
pub mod params;
pub mod scene;

pub use app::Galaxy;
pub use error::{AppError, ColorParseError, GpuError};
pub use generator::{generate, generate_with_rng, place_star, sample_star, PointCloud, PointVertex, StarSample};
pub use glam::Vec3;
pub use gpu::{Camera, GpuPoints, GpuState, Viewport};
pub use host::ParameterHost;
pub use params::{Color, GalaxyParams, ParamName, ParamRange, ParamUpdate};
pub use scene::{PointMaterial, PointScene};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use galaxy::prelude::*;
/// ```
pub mod prelude {
    pub use crate::app::Galaxy;
    pub use crate::error::AppError;
    pub use crate::generator::{generate, PointCloud};
    pub use crate::host::ParameterHost;
    pub use crate::params::{Color, GalaxyParams, ParamUpdate};
    pub use crate::scene::{PointMaterial, PointScene};
    pub use crate::Vec3;
}
