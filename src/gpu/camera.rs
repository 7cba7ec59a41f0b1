//! Orbit camera and viewport for viewing the galaxy.

use glam::{Mat4, Vec3};

const ROTATE_SPEED: f32 = 0.005;
const ZOOM_SPEED: f32 = 0.3;
const PITCH_LIMIT: f32 = 1.5;
const MIN_DISTANCE: f32 = 0.5;
const MAX_DISTANCE: f32 = 50.0;
const MAX_PIXEL_RATIO: f32 = 2.0;

/// Orbit camera with damped rotation, pan and zoom.
///
/// Mouse input accumulates pending motion; [`update`](Camera::update)
/// applies a `damping` fraction of it each frame, so the view eases to a stop
/// instead of snapping.
pub struct Camera {
    /// Horizontal rotation angle in radians.
    pub yaw: f32,
    /// Vertical rotation angle in radians.
    pub pitch: f32,
    /// Distance from the target point.
    pub distance: f32,
    /// Point the camera orbits around.
    pub target: Vec3,
    /// Vertical field of view in radians.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    /// Fraction of pending rotation applied per frame, in `(0, 1]`.
    pub damping: f32,
    pending_yaw: f32,
    pending_pitch: f32,
    pending_zoom: f32,
    pending_pan: Vec3,
}

impl Camera {
    /// Camera at (3, 3, 3) looking at the origin.
    pub fn new() -> Self {
        Self::looking_from(Vec3::splat(3.0), Vec3::ZERO)
    }

    /// Camera placed at `eye`, orbiting `target`.
    pub fn looking_from(eye: Vec3, target: Vec3) -> Self {
        let offset = eye - target;
        let distance = offset.length().max(f32::EPSILON);
        Self {
            yaw: offset.x.atan2(offset.z),
            pitch: (offset.y / distance).asin(),
            distance,
            target,
            fov_y: 75.0_f32.to_radians(),
            near: 0.1,
            far: 100.0,
            damping: 0.05,
            pending_yaw: 0.0,
            pending_pitch: 0.0,
            pending_zoom: 0.0,
            pending_pan: Vec3::ZERO,
        }
    }

    /// Queue a rotation from a mouse drag in pixels.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.pending_yaw -= dx * ROTATE_SPEED;
        self.pending_pitch += dy * ROTATE_SPEED;
    }

    /// Queue a zoom in scroll lines. Positive moves closer.
    pub fn zoom(&mut self, scroll: f32) {
        self.pending_zoom += scroll * ZOOM_SPEED;
    }

    /// Queue a pan from a mouse drag in pixels.
    ///
    /// The orbit target follows the cursor: a drag across the full
    /// `viewport_height` moves it by the visible height at the target's depth.
    pub fn pan(&mut self, dx: f32, dy: f32, viewport_height: f32) {
        if viewport_height <= 0.0 {
            return;
        }
        let world_per_pixel = 2.0 * self.distance * (self.fov_y * 0.5).tan() / viewport_height;
        let forward = (self.target - self.position()).normalize();
        let right = forward.cross(Vec3::Y).normalize();
        let up = right.cross(forward);
        self.pending_pan += (up * dy - right * dx) * world_per_pixel;
    }

    /// Advance the damped motion by one frame.
    pub fn update(&mut self) {
        let factor = self.damping.clamp(f32::EPSILON, 1.0);
        let keep = 1.0 - factor;

        self.yaw += self.pending_yaw * factor;
        self.pitch = (self.pitch + self.pending_pitch * factor).clamp(-PITCH_LIMIT, PITCH_LIMIT);
        self.distance =
            (self.distance - self.pending_zoom * factor).clamp(MIN_DISTANCE, MAX_DISTANCE);
        self.target += self.pending_pan * factor;

        self.pending_yaw *= keep;
        self.pending_pitch *= keep;
        self.pending_zoom *= keep;
        self.pending_pan *= keep;
    }

    /// Calculate the camera's world position.
    pub fn position(&self) -> Vec3 {
        let x = self.distance * self.pitch.cos() * self.yaw.sin();
        let y = self.distance * self.pitch.sin();
        let z = self.distance * self.pitch.cos() * self.yaw.cos();
        self.target + Vec3::new(x, y, z)
    }

    /// Calculate the view matrix for rendering.
    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position(), self.target, Vec3::Y)
    }

    /// Projection times view for a viewport of the given aspect ratio.
    pub fn view_proj(&self, aspect: f32) -> Mat4 {
        Mat4::perspective_rh(self.fov_y, aspect, self.near, self.far) * self.view_matrix()
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new()
    }
}

/// Drawable area of the window.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    /// Width in physical pixels.
    pub width: u32,
    /// Height in physical pixels.
    pub height: u32,
    /// Device pixels per logical pixel.
    pub scale_factor: f32,
}

impl Viewport {
    pub fn new(width: u32, height: u32, scale_factor: f32) -> Self {
        Self { width, height, scale_factor }
    }

    /// Width over height. A zero height (minimized window) yields 1.
    pub fn aspect(&self) -> f32 {
        if self.height == 0 {
            1.0
        } else {
            self.width as f32 / self.height as f32
        }
    }

    /// Device pixels per logical pixel used for point sizes, capped at 2 so
    /// very dense displays do not blow points up.
    pub fn pixel_ratio(&self) -> f32 {
        self.scale_factor.clamp(f32::EPSILON, MAX_PIXEL_RATIO)
    }

    /// Whether there is anything to draw into.
    pub fn is_drawable(&self) -> bool {
        self.width > 0 && self.height > 0
    }
}
