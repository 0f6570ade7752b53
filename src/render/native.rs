use std::num::NonZeroU64;
use std::sync::Arc;

use anyhow::{anyhow, Context, Result};
use bytemuck::{bytes_of, Pod, Zeroable};
use glam::{Mat3, Mat4};
use log::info;
use wgpu::util::DeviceExt;
use winit::dpi::PhysicalSize;
use winit::window::Window;

use crate::app::Reveal;
use crate::backdrop::{backdrop_view_proj, ParticleField};
use crate::obj::MeshData;
use crate::particles::{sprite_pixels, Cloud, PLATINUM, SPRITE_SIZE};
use crate::render::shared::{EMBLEM_SHADER, QUAD_CORNERS, SKY_SHADER};
use crate::viewer::ModelViewer;

const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth24Plus;

/// Key light: direction toward the light in xyz, intensity in w.
const KEY_LIGHT: [f32; 4] = [3.0, 5.0, 4.0, 0.8];

/// Additive blending for the particle layers. Sprite alpha scales each
/// contribution and the destination is never darkened.
const ADDITIVE_BLEND: wgpu::BlendState = wgpu::BlendState {
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
};

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct EmblemUniform {
    view_proj: [[f32; 4]; 4],
    model: [[f32; 4]; 4],
    normal: [[f32; 4]; 3],
    light: [f32; 4],
    tint: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct SkyGlobals {
    view: [[f32; 4]; 4],
    proj: [[f32; 4]; 4],
    reveal: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct LayerUniform {
    orientation: [[f32; 4]; 4],
    tuning: [f32; 4],
}

#[repr(C)]
#[derive(Debug, Clone, Copy, Pod, Zeroable)]
struct ParticleInstance {
    center: [f32; 3],
    color: [f32; 3],
}

/// Upper 3x3 inverse-transpose of the model matrix, padded to three vec4
/// columns for the uniform layout.
fn normal_matrix(model: &Mat4) -> [[f32; 4]; 3] {
    let basis = Mat3::from_mat4(*model).inverse().transpose();
    [
        [basis.x_axis.x, basis.x_axis.y, basis.x_axis.z, 0.0],
        [basis.y_axis.x, basis.y_axis.y, basis.y_axis.z, 0.0],
        [basis.z_axis.x, basis.z_axis.y, basis.z_axis.z, 0.0],
    ]
}

fn pack_instances(cloud: &Cloud) -> Vec<ParticleInstance> {
    cloud
        .positions
        .iter()
        .zip(&cloud.colors)
        .map(|(position, color)| ParticleInstance {
            center: position.to_array(),
            color: color.to_array(),
        })
        .collect()
}

struct DepthBuffer {
    _texture: wgpu::Texture,
    view: wgpu::TextureView,
}

impl DepthBuffer {
    fn create(device: &wgpu::Device, config: &wgpu::SurfaceConfiguration) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("emblem-depth"),
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
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            _texture: texture,
            view,
        }
    }
}

struct MeshBuffers {
    vertices: wgpu::Buffer,
    indices: wgpu::Buffer,
    index_count: u32,
}

impl MeshBuffers {
    fn from_mesh(device: &wgpu::Device, mesh: &MeshData) -> Self {
        let vertices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("emblem-vertices"),
            contents: bytemuck::cast_slice(&mesh.vertices),
            usage: wgpu::BufferUsages::VERTEX,
        });
        let indices = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("emblem-indices"),
            contents: bytemuck::cast_slice(&mesh.indices),
            usage: wgpu::BufferUsages::INDEX,
        });
        Self {
            vertices,
            indices,
            index_count: mesh.indices.len() as u32,
        }
    }
}

struct EmblemPass {
    pipeline: wgpu::RenderPipeline,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
    mesh: Option<MeshBuffers>,
}

impl EmblemPass {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("emblem-shader"),
            source: wgpu::ShaderSource::Wgsl(EMBLEM_SHADER.into()),
        });

        let uniform = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("emblem-uniform"),
            size: std::mem::size_of::<EmblemUniform>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("emblem-bind-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<EmblemUniform>() as u64),
                },
                count: None,
            }],
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("emblem-bind-group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("emblem-pipeline-layout"),
            bind_group_layouts: &[&layout],
            push_constant_ranges: &[],
        });

        let vertex_attrs = wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3];
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("emblem-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[wgpu::VertexBufferLayout {
                    array_stride: 6 * std::mem::size_of::<f32>() as wgpu::BufferAddress,
                    step_mode: wgpu::VertexStepMode::Vertex,
                    attributes: &vertex_attrs,
                }],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(wgpu::BlendState::ALPHA_BLENDING),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            depth_stencil: Some(wgpu::DepthStencilState {
                format: DEPTH_FORMAT,
                depth_write_enabled: true,
                depth_compare: wgpu::CompareFunction::Less,
                stencil: wgpu::StencilState::default(),
                bias: wgpu::DepthBiasState::default(),
            }),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform,
            bind_group,
            mesh: None,
        }
    }
}

struct LayerBuffers {
    instances: wgpu::Buffer,
    count: u32,
    uniform: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

struct SkyPass {
    pipeline: wgpu::RenderPipeline,
    globals: wgpu::Buffer,
    globals_bind_group: wgpu::BindGroup,
    quad: wgpu::Buffer,
    layers: Vec<LayerBuffers>,
    _sprite: wgpu::Texture,
}

impl SkyPass {
    fn new(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        format: wgpu::TextureFormat,
        backdrop: &ParticleField,
    ) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sky-shader"),
            source: wgpu::ShaderSource::Wgsl(SKY_SHADER.into()),
        });

        let globals = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("sky-globals"),
            size: std::mem::size_of::<SkyGlobals>() as u64,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });

        let sprite = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("sprite-texture"),
            size: wgpu::Extent3d {
                width: SPRITE_SIZE,
                height: SPRITE_SIZE,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: wgpu::TextureFormat::Rgba8Unorm,
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let pixels = sprite_pixels();
        queue.write_texture(
            wgpu::TexelCopyTextureInfo {
                texture: &sprite,
                mip_level: 0,
                origin: wgpu::Origin3d::ZERO,
                aspect: wgpu::TextureAspect::All,
            },
            &pixels,
            wgpu::TexelCopyBufferLayout {
                offset: 0,
                bytes_per_row: Some(SPRITE_SIZE * 4),
                rows_per_image: Some(SPRITE_SIZE),
            },
            wgpu::Extent3d {
                width: SPRITE_SIZE,
                height: SPRITE_SIZE,
                depth_or_array_layers: 1,
            },
        );
        let sprite_view = sprite.create_view(&wgpu::TextureViewDescriptor::default());

        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("sprite-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Nearest,
            min_filter: wgpu::FilterMode::Nearest,
            ..Default::default()
        });

        let globals_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky-globals-layout"),
            entries: &[
                wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: false,
                        min_binding_size: NonZeroU64::new(
                            std::mem::size_of::<SkyGlobals>() as u64
                        ),
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 1,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Texture {
                        sample_type: wgpu::TextureSampleType::Float { filterable: true },
                        view_dimension: wgpu::TextureViewDimension::D2,
                        multisampled: false,
                    },
                    count: None,
                },
                wgpu::BindGroupLayoutEntry {
                    binding: 2,
                    visibility: wgpu::ShaderStages::FRAGMENT,
                    ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
                    count: None,
                },
            ],
        });

        let globals_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky-globals-bind-group"),
            layout: &globals_layout,
            entries: &[
                wgpu::BindGroupEntry {
                    binding: 0,
                    resource: globals.as_entire_binding(),
                },
                wgpu::BindGroupEntry {
                    binding: 1,
                    resource: wgpu::BindingResource::TextureView(&sprite_view),
                },
                wgpu::BindGroupEntry {
                    binding: 2,
                    resource: wgpu::BindingResource::Sampler(&sampler),
                },
            ],
        });

        let layer_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky-layer-layout"),
            entries: &[wgpu::BindGroupLayoutEntry {
                binding: 0,
                visibility: wgpu::ShaderStages::VERTEX | wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Buffer {
                    ty: wgpu::BufferBindingType::Uniform,
                    has_dynamic_offset: false,
                    min_binding_size: NonZeroU64::new(std::mem::size_of::<LayerUniform>() as u64),
                },
                count: None,
            }],
        });

        let quad = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sky-quad"),
            contents: bytemuck::cast_slice(&QUAD_CORNERS),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let layers = backdrop
            .layers()
            .iter()
            .map(|layer| {
                let instances = pack_instances(&layer.cloud);
                let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some("sky-layer-instances"),
                    contents: bytemuck::cast_slice(&instances),
                    usage: wgpu::BufferUsages::VERTEX,
                });
                let uniform = device.create_buffer(&wgpu::BufferDescriptor {
                    label: Some("sky-layer-uniform"),
                    size: std::mem::size_of::<LayerUniform>() as u64,
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                    mapped_at_creation: false,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some("sky-layer-bind-group"),
                    layout: &layer_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform.as_entire_binding(),
                    }],
                });
                LayerBuffers {
                    instances: buffer,
                    count: instances.len() as u32,
                    uniform,
                    bind_group,
                }
            })
            .collect();

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sky-pipeline-layout"),
            bind_group_layouts: &[&globals_layout, &layer_layout],
            push_constant_ranges: &[],
        });

        let corner_attrs = wgpu::vertex_attr_array![0 => Float32x2];
        let instance_attrs = wgpu::vertex_attr_array![1 => Float32x3, 2 => Float32x3];
        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sky-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_main"),
                compilation_options: Default::default(),
                buffers: &[
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<[f32; 2]>() as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Vertex,
                        attributes: &corner_attrs,
                    },
                    wgpu::VertexBufferLayout {
                        array_stride: std::mem::size_of::<ParticleInstance>()
                            as wgpu::BufferAddress,
                        step_mode: wgpu::VertexStepMode::Instance,
                        attributes: &instance_attrs,
                    },
                ],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_main"),
                compilation_options: Default::default(),
                targets: &[Some(wgpu::ColorTargetState {
                    format,
                    blend: Some(ADDITIVE_BLEND),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..Default::default()
            },
            // additive points never need a depth test
            depth_stencil: None,
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
            cache: None,
        });

        Self {
            pipeline,
            globals,
            globals_bind_group,
            quad,
            layers,
            _sprite: sprite,
        }
    }
}

/// GPU renderer for the showcase: a particle sky pass under an emblem pass,
/// composed into one surface frame.
pub struct Renderer {
    window: Arc<Window>,
    surface: wgpu::Surface<'static>,
    device: wgpu::Device,
    queue: wgpu::Queue,
    config: wgpu::SurfaceConfiguration,
    depth: DepthBuffer,
    emblem: EmblemPass,
    sky: SkyPass,
}

impl Renderer {
    /// Initializes the GPU stack against the window surface and uploads the
    /// backdrop's generated clouds.
    pub async fn new(window: Arc<Window>, backdrop: &ParticleField) -> Result<Self> {
        let size = window.inner_size();
        if size.width == 0 || size.height == 0 {
            return Err(anyhow!("window has zero area"));
        }

        let instance = wgpu::Instance::new(&wgpu::InstanceDescriptor {
            backends: wgpu::Backends::PRIMARY,
            ..Default::default()
        });
        let surface = instance
            .create_surface(Arc::clone(&window))
            .context("failed to create rendering surface")?;
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: Some(&surface),
                force_fallback_adapter: false,
            })
            .await
            .context("failed to acquire GPU adapter")?;
        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("showcase-device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::default(),
                    memory_hints: wgpu::MemoryHints::default(),
                },
                None,
            )
            .await
            .context("failed to acquire GPU device")?;

        let caps = surface.get_capabilities(&adapter);
        let format = caps
            .formats
            .iter()
            .copied()
            .find(|format| format.is_srgb())
            .unwrap_or(caps.formats[0]);
        let config = wgpu::SurfaceConfiguration {
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT,
            format,
            width: size.width,
            height: size.height,
            present_mode: wgpu::PresentMode::AutoVsync,
            alpha_mode: caps.alpha_modes[0],
            view_formats: vec![],
            desired_maximum_frame_latency: 2,
        };
        surface.configure(&device, &config);

        let depth = DepthBuffer::create(&device, &config);
        let emblem = EmblemPass::new(&device, format);
        let sky = SkyPass::new(&device, &queue, format, backdrop);
        info!(
            "renderer ready: {}x{} {:?}, {} backdrop points",
            config.width,
            config.height,
            format,
            backdrop.total_points()
        );

        Ok(Self {
            window,
            surface,
            device,
            queue,
            config,
            depth,
            emblem,
            sky,
        })
    }

    pub fn window(&self) -> &Window {
        &self.window
    }

    /// Reconfigures the surface and depth buffer. Runs on every resize
    /// event; camera refits are debounced separately by the viewer.
    pub fn resize(&mut self, new_size: PhysicalSize<u32>) {
        if new_size.width == 0 || new_size.height == 0 {
            return;
        }
        self.config.width = new_size.width;
        self.config.height = new_size.height;
        self.surface.configure(&self.device, &self.config);
        self.depth = DepthBuffer::create(&self.device, &self.config);
    }

    /// Draws one frame: the sky pass clears to black and lays down the
    /// spiral, then the emblem pass draws the mesh over it with a fresh
    /// depth buffer.
    pub fn render(
        &mut self,
        viewer: &ModelViewer,
        backdrop: &ParticleField,
        reveal: Reveal,
    ) -> Result<(), wgpu::SurfaceError> {
        self.upload_pending_mesh(viewer);
        self.write_uniforms(viewer, backdrop, reveal);

        let frame = self.surface.get_current_texture()?;
        let view = frame
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        let mut encoder = self
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("showcase-encoder"),
            });

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("sky-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: None,
                ..Default::default()
            });
            pass.set_pipeline(&self.sky.pipeline);
            pass.set_bind_group(0, &self.sky.globals_bind_group, &[]);
            pass.set_vertex_buffer(0, self.sky.quad.slice(..));
            let live = backdrop.layers().len().min(self.sky.layers.len());
            for layer in &self.sky.layers[..live] {
                pass.set_bind_group(1, &layer.bind_group, &[]);
                pass.set_vertex_buffer(1, layer.instances.slice(..));
                pass.draw(0..6, 0..layer.count);
            }
        }

        {
            let mut pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("emblem-pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Load,
                        store: wgpu::StoreOp::Store,
                    },
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: &self.depth.view,
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Discard,
                    }),
                    stencil_ops: None,
                }),
                ..Default::default()
            });
            if let Some(mesh) = self.emblem.mesh.as_ref() {
                pass.set_pipeline(&self.emblem.pipeline);
                pass.set_bind_group(0, &self.emblem.bind_group, &[]);
                pass.set_vertex_buffer(0, mesh.vertices.slice(..));
                pass.set_index_buffer(mesh.indices.slice(..), wgpu::IndexFormat::Uint32);
                pass.draw_indexed(0..mesh.index_count, 0, 0..1);
            }
        }

        self.queue.submit(std::iter::once(encoder.finish()));
        frame.present();
        Ok(())
    }

    fn upload_pending_mesh(&mut self, viewer: &ModelViewer) {
        if self.emblem.mesh.is_some() {
            return;
        }
        let Some(framed) = viewer.framed() else {
            return;
        };
        self.emblem.mesh = Some(MeshBuffers::from_mesh(&self.device, &framed.mesh));
        info!(
            "uploaded emblem mesh: {} vertices, {} indices",
            framed.mesh.vertex_count(),
            framed.mesh.indices.len()
        );
    }

    fn write_uniforms(&self, viewer: &ModelViewer, backdrop: &ParticleField, reveal: Reveal) {
        let camera = viewer.camera();
        let model = viewer.model_matrix().unwrap_or(Mat4::IDENTITY);
        let uniform = EmblemUniform {
            view_proj: camera.view_proj().to_cols_array_2d(),
            model: model.to_cols_array_2d(),
            normal: normal_matrix(&model),
            light: KEY_LIGHT,
            tint: [PLATINUM.x, PLATINUM.y, PLATINUM.z, reveal.emblem],
        };
        self.queue
            .write_buffer(&self.emblem.uniform, 0, bytes_of(&uniform));

        let (view, proj) = backdrop_view_proj(self.config.width, self.config.height);
        let globals = SkyGlobals {
            view: view.to_cols_array_2d(),
            proj: proj.to_cols_array_2d(),
            reveal: [reveal.backdrop, 0.0, 0.0, 0.0],
        };
        self.queue
            .write_buffer(&self.sky.globals, 0, bytes_of(&globals));

        for (buffers, frame) in self.sky.layers.iter().zip(backdrop.layer_frames()) {
            let layer_uniform = LayerUniform {
                orientation: frame.orientation().to_cols_array_2d(),
                tuning: [frame.point_size, frame.opacity, frame.alpha_test, 0.0],
            };
            self.queue
                .write_buffer(&buffers.uniform, 0, bytes_of(&layer_uniform));
        }
    }

    /// Tears the GPU state down in order: passes and their buffers first,
    /// then a device flush, then surface and device. Consumes the renderer
    /// so nothing can draw afterwards.
    pub fn dispose(self) {
        let Renderer {
            window,
            surface,
            device,
            queue,
            config: _,
            depth,
            emblem,
            sky,
        } = self;
        drop(emblem);
        drop(sky);
        drop(depth);
        let _ = device.poll(wgpu::Maintain::Wait);
        drop(surface);
        drop(queue);
        drop(device);
        drop(window);
    }
}
