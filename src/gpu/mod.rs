mod camera;
#[cfg(feature = "egui")]
mod egui_integration;

use std::collections::HashMap;
use std::sync::Arc;

use bytemuck::{Pod, Zeroable};
use wgpu::util::DeviceExt;
use winit::window::Window;

pub use camera::{Camera, Viewport};
#[cfg(feature = "egui")]
pub use egui_integration::{EguiFrameOutput, EguiIntegration};

use crate::error::GpuError;
use crate::generator::{PointCloud, PointVertex};
use crate::scene::{PointMaterial, PointScene};

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;
const POINT_SHADER: &str = include_str!("points.wgsl");
const CLEAR_COLOR: wgpu::Color = wgpu::Color {
    r: 0.0,
    g: 0.0,
    b: 0.0,
    a: 1.0,
};

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct CameraUniforms {
    view_proj: [[f32; 4]; 4],
    aspect: f32,
    viewport_height: f32,
    pixel_ratio: f32,
    _padding: f32,
}

#[repr(C)]
#[derive(Copy, Clone, Pod, Zeroable)]
struct MaterialUniforms {
    size: f32,
    attenuate: f32,
    vertex_colors: f32,
    _padding: f32,
}

impl From<&PointMaterial> for MaterialUniforms {
    fn from(m: &PointMaterial) -> Self {
        Self {
            size: m.size,
            attenuate: if m.size_attenuation { 1.0 } else { 0.0 },
            vertex_colors: if m.vertex_colors { 1.0 } else { 0.0 },
            _padding: 0.0,
        }
    }
}

/// Handle to a point set living on the GPU.
///
/// Not `Clone`: whoever holds it is responsible for disposing it.
#[derive(Debug, PartialEq, Eq)]
pub struct GpuPoints {
    id: u64,
}

/// Pipelines differ by (additive blending, depth write).
type PipelineKey = (bool, bool);

/// Geometry and material buffers for one point set.
struct PointSet {
    vertex_buffer: wgpu::Buffer,
    material_buffer: wgpu::Buffer,
    material_bind_group: wgpu::BindGroup,
    pipeline_key: PipelineKey,
    count: u32,
}

pub struct GpuState {
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    pub config: wgpu::SurfaceConfiguration,
    viewport: Viewport,
    camera_buffer: wgpu::Buffer,
    camera_bind_group: wgpu::BindGroup,
    material_layout: wgpu::BindGroupLayout,
    pipeline_layout: wgpu::PipelineLayout,
    shader: wgpu::ShaderModule,
    pipelines: HashMap<PipelineKey, wgpu::RenderPipeline>,
    depth_texture: wgpu::TextureView,
    point_sets: HashMap<u64, PointSet>,
    attached: Vec<u64>,
    next_id: u64,
}

impl GpuState {
    pub async fn new(window: Arc<Window>) -> Result<Self, GpuError> {
        let size = window.inner_size();
        let scale_factor = window.scale_factor() as f32;

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });

        let surface = instance.create_surface(window)?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .ok_or(GpuError::NoAdapter)?;

        let info = adapter.get_info();
        log::info!("using {} ({:?})", info.name, info.backend);

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("Device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: Default::default(),
                },
                None,
            )
            .await?;

        let surface_caps = surface.get_capabilities(&adapter);
        let (surface_format, alpha_mode) =
            choose_surface(&surface_caps.formats, &surface_caps.alpha_modes)?;

        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width: size.width.max(1),
            height: size.height.max(1),
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode,
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth_texture = create_depth_texture(&device, &config);

        let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Camera Uniform Buffer"),
            contents: bytemuck::bytes_of(&CameraUniforms::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let camera_layout = uniform_layout(&device, "Camera Bind Group Layout");
        let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Camera Bind Group"),
            layout: &camera_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: camera_buffer.as_entire_binding(),
            }],
        });

        let material_layout = uniform_layout(&device, "Material Bind Group Layout");

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("Point Pipeline Layout"),
            bind_group_layouts: &[&camera_layout, &material_layout],
            push_constant_ranges: &[],
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("Point Shader"),
            source: wgpu::ShaderSource::Wgsl(POINT_SHADER.into()),
        });

        Ok(Self {
            surface,
            device,
            queue,
            config,
            viewport: Viewport::new(size.width, size.height, scale_factor),
            camera_buffer,
            camera_bind_group,
            material_layout,
            pipeline_layout,
            shader,
            pipelines: HashMap::new(),
            depth_texture,
            point_sets: HashMap::new(),
            attached: Vec::new(),
            next_id: 0,
        })
    }

    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    pub fn surface_format(&self) -> wgpu::TextureFormat {
        self.config.format
    }

    /// Number of point sets currently drawn.
    pub fn attached_count(&self) -> usize {
        self.attached.len()
    }

    /// Follow a window resize. Zero-sized (minimized) windows are ignored.
    pub fn resize(&mut self, new_size: winit::dpi::PhysicalSize<u32>, scale_factor: f32) {
        let viewport = Viewport::new(new_size.width, new_size.height, scale_factor);
        if viewport.is_drawable() {
            self.viewport = viewport;
            self.config.width = new_size.width;
            self.config.height = new_size.height;
            self.surface.configure(&self.device, &self.config);
            self.depth_texture = create_depth_texture(&self.device, &self.config);
        }
    }

    /// Reconfigure the surface at its current size, after it was lost.
    pub fn reconfigure(&mut self) {
        self.surface.configure(&self.device, &self.config);
    }

    fn ensure_pipeline(&mut self, key: PipelineKey) {
        if self.pipelines.contains_key(&key) {
            return;
        }
        let (additive, depth_write) = key;
        let pipeline = self.device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("Point Render Pipeline"),
            layout: Some(&self.pipeline_layout),
            vertex: wgpu::VertexState {
                module: &self.shader,
                entry_point: Some("vs_main"),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Instance,
                    attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
                }],
                compilation_options: Default::default(),
            },
            fragment: Some(wgpu::FragmentState {
                module: &self.shader,
                entry_point: Some("fs_main"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: self.config.format,
                    blend: Some(blend_state(additive)),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: Default::default(),
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: depth_write,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        self.pipelines.insert(key, pipeline);
    }

    fn write_camera(&self, camera: &Camera) {
        let uniforms = CameraUniforms {
            view_proj: camera.view_proj(self.viewport.aspect()).to_cols_array_2d(),
            aspect: self.viewport.aspect(),
            viewport_height: self.config.height as f32,
            pixel_ratio: self.viewport.pixel_ratio(),
            _padding: 0.0,
        };
        self.queue
            .write_buffer(&self.camera_buffer, 0, bytemuck::bytes_of(&uniforms));
    }

    /// Draw every attached point set from `camera`, then the UI overlay.
    pub fn render(
        &mut self,
        camera: &Camera,
        #[cfg(feature = "egui")] ui: Option<(&mut EguiIntegration, &EguiFrameOutput)>,
    ) -> Result<(), wgpu::SurfaceError> {
        self.write_camera(camera);

        let output = self.surface.get_current_texture()?;
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Render Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Point Render Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(CLEAR_COLOR),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_texture,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            render_pass.set_bind_group(0, &self.camera_bind_group, &[]);
            for set in self.attached.iter().filter_map(|id| self.point_sets.get(id)) {
                // Zero-length buffers cannot be sliced.
                if set.count == 0 {
                    continue;
                }
                let Some(pipeline) = self.pipelines.get(&set.pipeline_key) else {
                    continue;
                };
                render_pass.set_pipeline(pipeline);
                render_pass.set_bind_group(1, &set.material_bind_group, &[]);
                render_pass.set_vertex_buffer(0, set.vertex_buffer.slice(..));
                render_pass.draw(0..6, 0..set.count);
            }
        }

        #[cfg(feature = "egui")]
        if let Some((egui, frame)) = ui {
            egui.paint(
                &self.device,
                &self.queue,
                &mut encoder,
                &view,
                frame,
                [self.config.width, self.config.height],
            );
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        output.present();

        Ok(())
    }
}

impl PointScene for GpuState {
    type Points = GpuPoints;

    fn create_points(&mut self, cloud: &PointCloud, material: &PointMaterial) -> GpuPoints {
        let key = (material.additive, material.depth_write);
        self.ensure_pipeline(key);

        let vertex_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Point Vertex Buffer"),
                contents: bytemuck::cast_slice(&cloud.vertices()),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let material_buffer = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Point Material Buffer"),
                contents: bytemuck::bytes_of(&MaterialUniforms::from(material)),
                usage: wgpu::BufferUsages::UNIFORM,
            });

        let material_bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Point Material Bind Group"),
            layout: &self.material_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: material_buffer.as_entire_binding(),
            }],
        });

        let id = self.next_id;
        self.next_id += 1;
        let count = cloud.len() as u32;

        self.point_sets.insert(
            id,
            PointSet {
                vertex_buffer,
                material_buffer,
                material_bind_group,
                pipeline_key: key,
                count,
            },
        );

        GpuPoints { id }
    }

    fn add(&mut self, points: &GpuPoints) {
        if !self.attached.contains(&points.id) {
            self.attached.push(points.id);
        }
    }

    fn remove(&mut self, points: &GpuPoints) {
        self.attached.retain(|&id| id != points.id);
    }

    fn dispose(&mut self, points: GpuPoints) {
        if let Some(set) = self.point_sets.remove(&points.id) {
            set.vertex_buffer.destroy();
            set.material_buffer.destroy();
        }
    }
}

fn uniform_layout(device: &wgpu::Device, label: &str) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some(label),
        entries: &[wgpu::BindGroupLayoutEntry {
            binding: 0,
            visibility: wgpu::ShaderStages::VERTEX,
            ty: wgpu::BindingType::Buffer {
                ty: wgpu::BufferBindingType::Uniform,
                has_dynamic_offset: false,
                min_binding_size: None,
            },
            count: None,
        }],
    })
}

/// Pick an sRGB format when there is one, and the first alpha mode.
fn choose_surface(
    formats: &[wgpu::TextureFormat],
    alpha_modes: &[wgpu::CompositeAlphaMode],
) -> Result<(wgpu::TextureFormat, wgpu::CompositeAlphaMode), GpuError> {
    let format = formats
        .iter()
        .find(|f| f.is_srgb())
        .or_else(|| formats.first())
        .copied()
        .ok_or(GpuError::UnsupportedSurface)?;
    let alpha_mode = alpha_modes
        .first()
        .copied()
        .ok_or(GpuError::UnsupportedSurface)?;
    Ok((format, alpha_mode))
}

fn blend_state(additive: bool) -> wgpu::BlendState {
    if !additive {
        return wgpu::BlendState::ALPHA_BLENDING;
    }
    wgpu::BlendState {
        color: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::SrcAlpha,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
        alpha: wgpu::BlendComponent {
            src_factor: wgpu::BlendFactor::One,
            dst_factor: wgpu::BlendFactor::One,
            operation: wgpu::BlendOperation::Add,
        },
    }
}

fn create_depth_texture(
    device: &wgpu::Device,
    config: &wgpu::SurfaceConfiguration,
) -> wgpu::TextureView {
    let texture = device.create_texture(&wgpu::TextureDescriptor {
        label: Some("Depth Texture"),
        size: wgpu::Extent3d {
            width: config.width,
            height: config.height,
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: wgpu::TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    texture.create_view(&wgpu::TextureViewDescriptor::default())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_shader() -> naga::Module {
        naga::front::wgsl::parse_str(POINT_SHADER)
            .unwrap_or_else(|e| panic!("WGSL parse error: {:?}", e))
    }

    fn struct_span(module: &naga::Module, name: &str) -> Option<u32> {
        module.types.iter().find_map(|(_, ty)| match (&ty.name, &ty.inner) {
            (Some(n), naga::TypeInner::Struct { span, .. }) if n == name => Some(*span),
            _ => None,
        })
    }

    #[test]
    fn test_point_shader_validates() {
        let module = parse_shader();
        let mut validator = naga::valid::Validator::new(
            naga::valid::ValidationFlags::all(),
            naga::valid::Capabilities::all(),
        );
        if let Err(e) = validator.validate(&module) {
            panic!("WGSL validation error: {:?}", e);
        }

        let entry_points: Vec<&str> = module.entry_points.iter().map(|e| e.name.as_str()).collect();
        assert!(entry_points.contains(&"vs_main"));
        assert!(entry_points.contains(&"fs_main"));
    }

    #[test]
    fn test_uniforms_match_shader_layout() {
        assert_eq!(std::mem::size_of::<CameraUniforms>(), 80);
        assert_eq!(std::mem::size_of::<MaterialUniforms>(), 16);

        let module = parse_shader();
        assert_eq!(
            struct_span(&module, "Camera"),
            Some(std::mem::size_of::<CameraUniforms>() as u32)
        );
        assert_eq!(
            struct_span(&module, "Material"),
            Some(std::mem::size_of::<MaterialUniforms>() as u32)
        );
    }

    #[test]
    fn test_vertex_stride() {
        assert_eq!(std::mem::size_of::<PointVertex>(), 24);
    }

    #[test]
    fn test_material_flags_become_floats() {
        let material = PointMaterial {
            size: 0.02,
            additive: true,
            size_attenuation: true,
            depth_write: false,
            vertex_colors: false,
        };
        let uniforms = MaterialUniforms::from(&material);
        assert_eq!(uniforms.size, 0.02);
        assert_eq!(uniforms.attenuate, 1.0);
        assert_eq!(uniforms.vertex_colors, 0.0);
    }

    #[test]
    fn test_choose_surface_prefers_srgb() {
        let formats = [wgpu::TextureFormat::Bgra8Unorm, wgpu::TextureFormat::Bgra8UnormSrgb];
        let alpha = [wgpu::CompositeAlphaMode::Opaque];
        let (format, mode) = choose_surface(&formats, &alpha).unwrap();
        assert_eq!(format, wgpu::TextureFormat::Bgra8UnormSrgb);
        assert_eq!(mode, wgpu::CompositeAlphaMode::Opaque);

        let (format, _) = choose_surface(&formats[..1], &alpha).unwrap();
        assert_eq!(format, wgpu::TextureFormat::Bgra8Unorm);
    }

    #[test]
    fn test_choose_surface_without_capabilities_errors() {
        let alpha = [wgpu::CompositeAlphaMode::Auto];
        assert!(matches!(
            choose_surface(&[], &alpha),
            Err(GpuError::UnsupportedSurface)
        ));
        assert!(matches!(
            choose_surface(&[wgpu::TextureFormat::Rgba8UnormSrgb], &[]),
            Err(GpuError::UnsupportedSurface)
        ));
    }

    #[test]
    fn test_additive_blend_adds_onto_destination() {
        let additive = blend_state(true);
        assert_eq!(additive.color.dst_factor, wgpu::BlendFactor::One);
        assert_eq!(additive.color.operation, wgpu::BlendOperation::Add);
        assert_eq!(blend_state(false), wgpu::BlendState::ALPHA_BLENDING);
    }
}
