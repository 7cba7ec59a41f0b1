//! Galaxy builder and window runner.

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::{ElementState, MouseButton, MouseScrollDelta, WindowEvent},
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::error::AppError;
use crate::gpu::{Camera, GpuState};
use crate::host::ParameterHost;
use crate::params::GalaxyParams;
#[cfg(feature = "egui")]
use crate::{gpu::EguiIntegration, panel::ControlPanel};

/// A galaxy explorer window builder.
///
/// Use method chaining to configure, then call `.run()` to open the window.
///
/// ```ignore
/// Galaxy::new()
///     .with_params(GalaxyParams { branches: 3, ..Default::default() })
///     .run()?;
/// ```
pub struct Galaxy {
    params: GalaxyParams,
    title: String,
    window_size: (u32, u32),
    seed: Option<u64>,
}

impl Galaxy {
    pub fn new() -> Self {
        Self {
            params: GalaxyParams::default(),
            title: "Galaxy Generator".to_string(),
            window_size: (1280, 720),
            seed: None,
        }
    }

    /// Starting parameters. The panel edits them from here.
    pub fn with_params(mut self, params: GalaxyParams) -> Self {
        self.params = params;
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Initial window size in logical pixels.
    pub fn with_window_size(mut self, width: u32, height: u32) -> Self {
        self.window_size = (width, height);
        self
    }

    /// Make every regenerated cloud reproducible for this seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Open the window and run until it is closed.
    pub fn run(self) -> Result<(), AppError> {
        let event_loop = EventLoop::new()?;
        event_loop.set_control_flow(ControlFlow::Poll);

        let mut app = App::new(self);
        event_loop.run_app(&mut app)?;

        match app.error.take() {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }
}

impl Default for Galaxy {
    fn default() -> Self {
        Self::new()
    }
}

struct App {
    title: String,
    window_size: (u32, u32),
    window: Option<Arc<Window>>,
    gpu_state: Option<GpuState>,
    host: ParameterHost<GpuState>,
    camera: Camera,
    #[cfg(feature = "egui")]
    egui: Option<EguiIntegration>,
    #[cfg(feature = "egui")]
    panel: ControlPanel,
    /// Button held for a camera drag: left rotates, right pans.
    dragging: Option<MouseButton>,
    last_mouse_pos: Option<(f64, f64)>,
    error: Option<AppError>,
}

impl App {
    fn new(config: Galaxy) -> Self {
        #[cfg(feature = "egui")]
        let panel = ControlPanel::new(&config.params);

        let host = match config.seed {
            Some(seed) => ParameterHost::with_seed(config.params, seed),
            None => ParameterHost::new(config.params),
        };

        Self {
            title: config.title,
            window_size: config.window_size,
            window: None,
            gpu_state: None,
            host,
            camera: Camera::new(),
            #[cfg(feature = "egui")]
            egui: None,
            #[cfg(feature = "egui")]
            panel,
            dragging: None,
            last_mouse_pos: None,
            error: None,
        }
    }

    fn init(&mut self, event_loop: &ActiveEventLoop) -> Result<(), AppError> {
        let window_attrs = Window::default_attributes()
            .with_title(self.title.as_str())
            .with_inner_size(winit::dpi::LogicalSize::new(
                self.window_size.0,
                self.window_size.1,
            ));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let mut gpu_state = pollster::block_on(GpuState::new(window.clone()))?;

        self.host.regenerate(&mut gpu_state);
        debug_assert_eq!(gpu_state.attached_count(), 1);
        log::info!(
            "{} points across {} arms",
            self.host.params().count,
            self.host.params().branches
        );

        #[cfg(feature = "egui")]
        {
            self.egui = Some(EguiIntegration::new(
                gpu_state.device(),
                gpu_state.surface_format(),
                &window,
            ));
        }

        self.window = Some(window);
        self.gpu_state = Some(gpu_state);
        Ok(())
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let (Some(window), Some(gpu_state)) = (&self.window, &mut self.gpu_state) else {
            return;
        };

        self.camera.update();

        #[cfg(feature = "egui")]
        let ui_frame = self.egui.as_mut().map(|egui| {
            let panel = &mut self.panel;
            let mut commits = Vec::new();
            let frame = egui.run(window, |ctx| commits = panel.show(ctx));
            (frame, commits)
        });

        #[cfg(feature = "egui")]
        let result = {
            if let Some((_, commits)) = &ui_frame {
                for &update in commits {
                    self.host.update_parameter(gpu_state, update);
                    debug_assert_eq!(gpu_state.attached_count(), 1);
                }
            }
            let overlay = match (&mut self.egui, &ui_frame) {
                (Some(egui), Some((frame, _))) => Some((egui, frame)),
                _ => None,
            };
            gpu_state.render(&self.camera, overlay)
        };

        #[cfg(not(feature = "egui"))]
        let result = gpu_state.render(&self.camera);

        match result {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => gpu_state.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("GPU out of memory, exiting");
                event_loop.exit();
            }
            Err(e) => log::warn!("render error: {:?}", e),
        }

        window.request_redraw();
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        if let Err(e) = self.init(event_loop) {
            log::error!("{}", e);
            self.error = Some(e);
            event_loop.exit();
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        #[cfg(feature = "egui")]
        let ui_consumed = match (&mut self.egui, &self.window) {
            (Some(egui), Some(window)) => {
                egui.on_window_event(window, &event) || egui.wants_pointer()
            }
            _ => false,
        };
        #[cfg(not(feature = "egui"))]
        let ui_consumed = false;

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(physical_size) => {
                if let (Some(gpu_state), Some(window)) = (&mut self.gpu_state, &self.window) {
                    gpu_state.resize(physical_size, window.scale_factor() as f32);
                }
            }
            WindowEvent::MouseInput { state, button, .. }
                if matches!(button, MouseButton::Left | MouseButton::Right) =>
            {
                match state {
                    ElementState::Pressed if !ui_consumed && self.dragging.is_none() => {
                        self.dragging = Some(button);
                    }
                    ElementState::Released if self.dragging == Some(button) => {
                        self.dragging = None;
                        self.last_mouse_pos = None;
                    }
                    _ => {}
                }
            }
            WindowEvent::CursorMoved { position, .. } => {
                let Some(button) = self.dragging else {
                    return;
                };
                if let Some((last_x, last_y)) = self.last_mouse_pos {
                    let dx = (position.x - last_x) as f32;
                    let dy = (position.y - last_y) as f32;
                    if button == MouseButton::Right {
                        let height = self
                            .gpu_state
                            .as_ref()
                            .map_or(0.0, |gpu| gpu.config.height as f32);
                        self.camera.pan(dx, dy, height);
                    } else {
                        self.camera.rotate(dx, dy);
                    }
                }
                self.last_mouse_pos = Some((position.x, position.y));
            }
            WindowEvent::MouseWheel { delta, .. } if !ui_consumed => {
                let scroll = match delta {
                    MouseScrollDelta::LineDelta(_, y) => y,
                    MouseScrollDelta::PixelDelta(pos) => pos.y as f32 * 0.1,
                };
                self.camera.zoom(scroll);
            }
            WindowEvent::RedrawRequested => self.redraw(event_loop),
            _ => {}
        }
    }
}
