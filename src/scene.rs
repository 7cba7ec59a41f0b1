//! The render-side seam: anything that can hold colored point sets.
//!
//! The host only talks to a [`PointScene`]. The wgpu renderer implements it
//! for real; tests implement it with counters.

use crate::generator::PointCloud;
use crate::params::GalaxyParams;

/// How a point set is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointMaterial {
    /// Point size in world units.
    pub size: f32,
    /// Add colors onto what is already drawn instead of alpha blending, so
    /// overlapping points get brighter.
    pub additive: bool,
    /// Shrink points with distance from the camera.
    pub size_attenuation: bool,
    pub depth_write: bool,
    /// Use the per-point colors rather than a flat white.
    pub vertex_colors: bool,
}

impl PointMaterial {
    /// Glowing, depth-agnostic points sized from the galaxy parameters.
    pub fn for_galaxy(params: &GalaxyParams) -> Self {
        Self {
            size: params.size,
            additive: true,
            size_attenuation: true,
            depth_write: false,
            vertex_colors: true,
        }
    }
}

/// A scene graph that owns GPU-side point sets.
///
/// Every handle returned by [`create_points`](PointScene::create_points)
/// must eventually be passed to [`dispose`](PointScene::dispose); taking the
/// handle by value means it cannot be disposed twice.
pub trait PointScene {
    /// Handle to a created point set.
    type Points;

    /// Upload a cloud and return a handle to the new resource.
    fn create_points(&mut self, cloud: &PointCloud, material: &PointMaterial) -> Self::Points;

    /// Attach a point set so it is drawn.
    fn add(&mut self, points: &Self::Points);

    /// Detach a point set. It stays allocated until disposed.
    fn remove(&mut self, points: &Self::Points);

    /// Release the resources behind a point set.
    fn dispose(&mut self, points: Self::Points);
}
