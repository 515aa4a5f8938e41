//! Renderer: wgpu init + depth + static triangle-list mesh + loading bar.
//! wgpu = 26.x, winit = 0.30.x

use std::num::NonZeroU64;
use std::sync::Arc;

use asset::TriangleSoup;
use bytemuck::{Pod, Zeroable};
use glam::Mat4;
use wgpu::{
    BindGroup, BindGroupLayoutDescriptor, BindGroupLayoutEntry, BindingType, BlendState, Buffer,
    BufferBindingType, BufferUsages, Color, ColorTargetState, ColorWrites, CommandEncoderDescriptor,
    CompositeAlphaMode, DepthBiasState, DepthStencilState, Device, DeviceDescriptor, ErrorFilter,
    Extent3d, Features, FragmentState, Instance, InstanceDescriptor, Limits, LoadOp, Operations,
    PipelineLayoutDescriptor, PowerPreference, PresentMode, Queue, RenderPassColorAttachment,
    RenderPassDescriptor, RenderPipeline, RenderPipelineDescriptor, ShaderModuleDescriptor,
    ShaderSource, ShaderStages, StoreOp, Surface, SurfaceConfiguration, SurfaceError,
    TextureDescriptor, TextureDimension, TextureFormat, TextureUsages, TextureView,
    TextureViewDescriptor, VertexBufferLayout, VertexState, VertexStepMode, util::DeviceExt,
};
use winit::{dpi::PhysicalSize, window::Window};

mod error;
pub mod loading;

pub use error::{RenderError, RenderResult};
pub use loading::loading_bar_geometry;

/// Slot 0: positions, slot 1: colors. Both tightly packed `[f32; 3]`.
const POSITION_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![0 => Float32x3],
};
const COLOR_LAYOUT: VertexBufferLayout<'static> = VertexBufferLayout {
    array_stride: std::mem::size_of::<[f32; 3]>() as u64,
    step_mode: VertexStepMode::Vertex,
    attributes: &wgpu::vertex_attr_array![1 => Float32x3],
};

/// Transform UBO (16-byte aligned).
#[repr(C)]
#[derive(Clone, Copy, Pod, Zeroable)]
struct TransformUniform {
    mvp: [[f32; 4]; 4],
}

const DEPTH_FORMAT: TextureFormat = TextureFormat::Depth32Float;

const SCENE_CLEAR: Color = Color {
    r: 0.1,
    g: 0.1,
    b: 0.1,
    a: 1.0,
};

/// Pair of static vertex buffers drawn as one triangle list.
struct GpuMesh {
    positions: Buffer,
    colors: Buffer,
    vertex_count: u32,
}

/// Owns every device handle; the camera and parser never see these.
pub struct GpuState {
    // Surface
    surface: Surface<'static>,
    surface_config: SurfaceConfiguration,

    // Device/queue
    device: Device,
    queue: Queue,

    // Pipeline & geometry
    pipeline: RenderPipeline,
    mesh: Option<GpuMesh>,
    loading_bar: GpuMesh,

    // Transform
    transform_bg: BindGroup,
    transform_buf: Buffer,

    // Depth
    depth_view: TextureView,

    // Size cache
    width: u32,
    height: u32,
}

impl GpuState {
    /// Create device state bound to an `Arc<Window>`. No mesh is uploaded yet.
    pub async fn new(window: Arc<Window>, backends: wgpu::Backends) -> RenderResult<Self> {
        let PhysicalSize { width, height } = window.inner_size();
        let width = width.max(1);
        let height = height.max(1);

        // Instance & surface
        let instance = Instance::new(&InstanceDescriptor {
            backends,
            ..Default::default()
        });
        let surface: Surface<'static> = instance.create_surface(window.clone())?;

        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await?;
        let info = adapter.get_info();
        log::info!("Using adapter '{}' ({:?})", info.name, info.backend);

        // Large meshes need more than the downlevel buffer size.
        let mut required_limits =
            Limits::downlevel_webgl2_defaults().using_resolution(adapter.limits());
        required_limits.max_buffer_size = adapter.limits().max_buffer_size;

        let (device, queue) = adapter
            .request_device(&DeviceDescriptor {
                label: Some("Splatview Device"),
                required_features: Features::empty(),
                required_limits,
                ..Default::default()
            })
            .await?;

        // Mesh colors are raw display bytes, so skip the sRGB conversion.
        let caps = surface.get_capabilities(&adapter);
        let surface_format = caps
            .formats
            .iter()
            .copied()
            .find(|f| !f.is_srgb())
            .or_else(|| caps.formats.first().copied())
            .ok_or(RenderError::NoSurfaceFormat)?;
        log::info!("Surface format: {:?}", surface_format);

        // Configure surface
        let surface_config = SurfaceConfiguration {
            usage: TextureUsages::RENDER_ATTACHMENT,
            format: surface_format,
            width,
            height,
            present_mode: PresentMode::AutoVsync,
            alpha_mode: caps
                .alpha_modes
                .first()
                .copied()
                .unwrap_or(CompositeAlphaMode::Auto),
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &surface_config);

        // Depth texture
        let depth_view = create_depth_view(&device, &surface_config);

        // ==== Transform BGL/BG ====
        let transform_bgl = device.create_bind_group_layout(&BindGroupLayoutDescriptor {
            label: Some("Transform BGL"),
            entries: &[BindGroupLayoutEntry {
                binding: 0,
                visibility: ShaderStages::VERTEX,
                ty: BindingType::Buffer {
                    ty: BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(
                        std::mem::size_of::<TransformUniform>() as u64
                    ),
                },
                count: None,
            }],
        });

        let transform_buf = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("Transform UBO"),
            contents: bytemuck::bytes_of(&TransformUniform {
                mvp: Mat4::IDENTITY.to_cols_array_2d(),
            }),
            usage: BufferUsages::UNIFORM | BufferUsages::COPY_DST,
        });
        let transform_bg = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("Transform BG"),
            layout: &transform_bgl,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: transform_buf.as_entire_binding(),
            }],
        });

        // ==== Shader + pipeline, validated inside an error scope ====
        device.push_error_scope(ErrorFilter::Validation);
        let shader = device.create_shader_module(ShaderModuleDescriptor {
            label: Some("Mesh WGSL"),
            source: ShaderSource::Wgsl(include_str!("shaders/mesh.wgsl").into()),
        });
        let pipeline_layout = device.create_pipeline_layout(&PipelineLayoutDescriptor {
            label: Some("Mesh PipelineLayout"),
            bind_group_layouts: &[&transform_bgl],
            push_constant_ranges: &[],
        });
        let pipeline = device.create_render_pipeline(&RenderPipelineDescriptor {
            label: Some("Mesh Pipeline"),
            layout: Some(&pipeline_layout),
            vertex: VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                buffers: &[POSITION_LAYOUT, COLOR_LAYOUT],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            fragment: Some(FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                targets: &[Some(ColorTargetState {
                    format: surface_format,
                    blend: Some(BlendState::REPLACE),
                    write_mask: ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            // Assets come with arbitrary winding: no culling.
            primitive: wgpu::PrimitiveState::default(),
            depth_stencil: Some(DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::LessEqual,
                stencil: wgpu::StencilState::default(),
                bias: DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });
        if let Some(err) = device.pop_error_scope().await {
            return Err(RenderError::Pipeline {
                label: "Mesh Pipeline",
                message: err.to_string(),
            });
        }

        let loading_bar = GpuMesh {
            positions: create_dynamic_vb(&device, "Loading positions"),
            colors: create_dynamic_vb(&device, "Loading colors"),
            vertex_count: loading::LOADING_VERTEX_COUNT as u32,
        };

        Ok(Self {
            surface,
            surface_config,
            device,
            queue,
            pipeline,
            mesh: None,
            loading_bar,
            transform_bg,
            transform_buf,
            depth_view,
            width,
            height,
        })
    }

    /// Upload the triangle list into static vertex buffers (once).
    pub fn upload_mesh(&mut self, soup: &TriangleSoup) -> RenderResult<()> {
        if soup.is_empty() {
            log::warn!("Mesh has no triangles; nothing will be drawn");
            self.mesh = None;
            return Ok(());
        }

        let too_large = || RenderError::MeshTooLarge {
            vertices: soup.vertex_count(),
        };
        let vertex_count = u32::try_from(soup.vertex_count()).map_err(|_| too_large())?;
        let bytes = std::mem::size_of_val(soup.positions.as_slice()) as u64;
        if bytes > self.device.limits().max_buffer_size {
            return Err(too_large());
        }

        let positions = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh positions VB"),
                contents: bytemuck::cast_slice(&soup.positions),
                usage: BufferUsages::VERTEX,
            });
        let colors = self
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh colors VB"),
                contents: bytemuck::cast_slice(&soup.colors),
                usage: BufferUsages::VERTEX,
            });

        log::info!(
            "Uploaded mesh: {} vertices ({} KiB per buffer)",
            vertex_count,
            bytes / 1024
        );
        self.mesh = Some(GpuMesh {
            positions,
            colors,
            vertex_count,
        });
        Ok(())
    }

    /// Set the per-frame model-view-projection transform.
    pub fn set_transform(&self, mvp: Mat4) {
        let uniform = TransformUniform {
            mvp: mvp.to_cols_array_2d(),
        };
        self.queue
            .write_buffer(&self.transform_buf, 0, bytemuck::bytes_of(&uniform));
    }

    /// Resize: reconfigure surface & recreate depth view.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.width = width.max(1);
        self.height = height.max(1);
        self.surface_config.width = self.width;
        self.surface_config.height = self.height;
        self.surface.configure(&self.device, &self.surface_config);
        self.depth_view = create_depth_view(&self.device, &self.surface_config);
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    /// Render one frame: clear + draw the uploaded triangle list.
    pub fn render(&self) -> Result<(), SurfaceError> {
        self.draw(SCENE_CLEAR, self.mesh.as_ref())
    }

    /// Render the loading screen for `fraction` in `[0, 1]`.
    pub fn render_loading(&self, fraction: f32) -> Result<(), SurfaceError> {
        let bar = loading_bar_geometry(self.width, self.height, fraction);
        self.queue.write_buffer(
            &self.loading_bar.positions,
            0,
            bytemuck::cast_slice(&bar.positions),
        );
        self.queue.write_buffer(
            &self.loading_bar.colors,
            0,
            bytemuck::cast_slice(&bar.colors),
        );
        self.set_transform(Mat4::IDENTITY);

        let [r, g, b] = loading::BACKGROUND.map(f64::from);
        self.draw(Color { r, g, b, a: 1.0 }, Some(&self.loading_bar))
    }

    fn draw(&self, clear: Color, mesh: Option<&GpuMesh>) -> Result<(), SurfaceError> {
        let frame = self.surface.get_current_texture()?;
        let view = frame.texture.create_view(&Default::default());

        let mut encoder = self
            .device
            .create_command_encoder(&CommandEncoderDescriptor {
                label: Some("MainEncoder"),
            });

        {
            let mut rpass = encoder.begin_render_pass(&RenderPassDescriptor {
                label: Some("MainPass"),
                color_attachments: &[Some(RenderPassColorAttachment {
                    view: &view,
                    depth_slice: None,
                    resolve_target: None,
                    ops: Operations {
                        load: LoadOp::Clear(clear),
                        store: StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth_view,
                    depth_ops: Some(Operations {
                        load: LoadOp::Clear(1.0),
                        store: StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                occlusion_query_set: None,
                timestamp_writes: None,
            });

            if let Some(mesh) = mesh {
                rpass.set_pipeline(&self.pipeline);
                rpass.set_bind_group(0, &self.transform_bg, &[]);
                rpass.set_vertex_buffer(0, mesh.positions.slice(..));
                rpass.set_vertex_buffer(1, mesh.colors.slice(..));
                rpass.draw(0..mesh.vertex_count, 0..1);
            }
        }

        self.queue.submit(Some(encoder.finish()));
        frame.present();
        Ok(())
    }

    pub fn is_surface_lost(err: &SurfaceError) -> bool {
        matches!(err, SurfaceError::Lost | SurfaceError::Outdated)
    }

    pub fn recreate_surface(&mut self) {
        self.resize(self.width, self.height);
    }
}

/// Vertex buffer sized for the loading bar, rewritten on every progress update.
fn create_dynamic_vb(device: &Device, label: &str) -> Buffer {
    device.create_buffer(&wgpu::BufferDescriptor {
        label: Some(label),
        size: (loading::LOADING_VERTEX_COUNT * std::mem::size_of::<[f32; 3]>()) as u64,
        usage: BufferUsages::VERTEX | BufferUsages::COPY_DST,
        mapped_at_creation: false,
    })
}

/// Create a depth texture view matching the surface config.
fn create_depth_view(device: &Device, sc: &SurfaceConfiguration) -> TextureView {
    let tex = device.create_texture(&TextureDescriptor {
        label: Some("DepthTex"),
        size: Extent3d {
            width: sc.width.max(1),
            height: sc.height.max(1),
            depth_or_array_layers: 1,
        },
        mip_level_count: 1,
        sample_count: 1,
        dimension: TextureDimension::D2,
        format: DEPTH_FORMAT,
        usage: TextureUsages::RENDER_ATTACHMENT,
        view_formats: &[],
    });
    tex.create_view(&TextureViewDescriptor::default())
}
