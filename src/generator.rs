//! Spiral galaxy point-cloud generation.
//!
//! Each point picks a radius uniformly in `[0, radius]` (uniform in radius,
//! not area, so the core comes out denser), sits on one of `branches` arms
//! chosen by its index, twists by `radius * spin`, and is then jittered per
//! axis by `±uniform^power`. Color blends from the inside color to the
//! outside color with distance from the center.
//!
//! ```ignore
//! use galaxy::{generate, GalaxyParams};
//!
//! let cloud = generate(&GalaxyParams::default());
//! assert_eq!(cloud.len(), 20_000);
//! ```

use std::f32::consts::TAU;

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::params::GalaxyParams;

/// Generated positions and colors, one entry per point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointCloud {
    pub positions: Vec<Vec3>,
    pub colors: Vec<Vec3>,
}

/// Interleaved vertex record uploaded to the GPU.
#[repr(C)]
#[derive(Debug, Copy, Clone, PartialEq, Pod, Zeroable)]
pub struct PointVertex {
    pub position: [f32; 3],
    pub color: [f32; 3],
}

impl PointCloud {
    pub fn with_capacity(count: usize) -> Self {
        Self {
            positions: Vec::with_capacity(count),
            colors: Vec::with_capacity(count),
        }
    }

    pub fn push(&mut self, position: Vec3, color: Vec3) {
        self.positions.push(position);
        self.colors.push(color);
    }

    /// Number of points.
    #[inline]
    pub fn len(&self) -> usize {
        self.positions.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Positions as `3 * len` floats (x, y, z per point).
    pub fn flat_positions(&self) -> &[f32] {
        bytemuck::cast_slice(&self.positions)
    }

    /// Colors as `3 * len` floats (r, g, b per point).
    pub fn flat_colors(&self) -> &[f32] {
        bytemuck::cast_slice(&self.colors)
    }

    /// Interleave positions and colors for a vertex buffer.
    pub fn vertices(&self) -> Vec<PointVertex> {
        self.positions
            .iter()
            .zip(&self.colors)
            .map(|(p, c)| PointVertex {
                position: p.to_array(),
                color: c.to_array(),
            })
            .collect()
    }
}

/// The random draws behind one point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StarSample {
    /// Distance from the center before jitter, in `[0, params.radius]`.
    pub radius: f32,
    /// Per-axis offset added after spiral placement.
    pub jitter: Vec3,
}

/// Draw the radius and jitter for one point.
pub fn sample_star<R: Rng + ?Sized>(params: &GalaxyParams, rng: &mut R) -> StarSample {
    let radius = rng.gen::<f32>() * params.radius.max(0.0);
    let mut axis = || {
        let magnitude = rng.gen::<f32>().powf(params.power);
        if rng.gen_bool(0.5) {
            magnitude
        } else {
            -magnitude
        }
    };
    let jitter = Vec3::new(axis(), axis(), axis());

    StarSample { radius, jitter }
}

/// Place point `index` on its arm and color it.
///
/// Returns `(position, color)`. The color only depends on `sample.radius`.
pub fn place_star(index: u32, sample: StarSample, params: &GalaxyParams) -> (Vec3, Vec3) {
    let branches = params.branches.max(1);
    let branch_angle = (index % branches) as f32 / branches as f32 * TAU;
    let spin_angle = sample.radius * params.spin;
    let angle = branch_angle + spin_angle;

    let position = Vec3::new(
        angle.cos() * sample.radius,
        0.0,
        angle.sin() * sample.radius,
    ) + sample.jitter;

    let t = if params.radius > 0.0 {
        (sample.radius / params.radius).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let color = params.inside_color.lerp(params.outside_color, t).to_vec3();

    (position, color)
}

/// Generate a fresh cloud. Every call produces a different galaxy.
pub fn generate(params: &GalaxyParams) -> PointCloud {
    generate_with_rng(params, &mut SmallRng::from_entropy())
}

/// Generate a cloud from a caller-supplied RNG.
pub fn generate_with_rng<R: Rng + ?Sized>(params: &GalaxyParams, rng: &mut R) -> PointCloud {
    let mut cloud = PointCloud::with_capacity(params.count as usize);
    for i in 0..params.count {
        let sample = sample_star(params, rng);
        let (position, color) = place_star(i, sample, params);
        cloud.push(position, color);
    }
    cloud
}
