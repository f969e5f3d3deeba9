//! The wgpu particle pipeline.
//!
//! Setup acquires a device, queue, shader pair and pipeline state exactly
//! once; any failure there is fatal, since rendering capability is a hard
//! precondition for the whole system. After setup there is no fallible
//! path: per frame the renderer uploads the prepared draw list and issues
//! one alpha-blended draw per particle.
//!
//! The renderer never owns a render target. The hosting application hands
//! in a borrowed texture view each frame and keeps full control of its
//! lifecycle.

use bytemuck::{Pod, Zeroable};
use thiserror::Error;

use skyshell_shared::Color;

use crate::frame::RenderFrame;
use crate::quad::{particle_quad, ParticleVertex};

/// Depth buffer format. Matches the AR compositor's depth attachment.
pub const DEPTH_FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

/// Byte stride between per-draw uniform blocks.
///
/// 256 is the guaranteed `min_uniform_buffer_offset_alignment`.
pub const UNIFORM_STRIDE: u64 = 256;

/// WGSL source for the particle quad shader pair.
const SHADER_SOURCE: &str = r#"
struct Uniforms {
    mvp: mat4x4<f32>,
    tint: vec4<f32>,
    // x = quad edge length in metres; yzw unused padding.
    size: vec4<f32>,
};

@group(0) @binding(0) var<uniform> uniforms: Uniforms;

struct VertexInput {
    @location(0) position: vec4<f32>,
    @location(1) color: vec4<f32>,
    @location(2) tex_coord: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip: vec4<f32>,
    @location(0) color: vec4<f32>,
    @location(1) tex_coord: vec2<f32>,
};

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var out: VertexOutput;
    let scaled = vec4<f32>(in.position.xy * uniforms.size.x, in.position.z, 1.0);
    out.clip = uniforms.mvp * scaled;
    out.color = in.color * uniforms.tint;
    out.tex_coord = in.tex_coord;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    // Radial falloff: tex_coord spans -0.5..0.5 across the quad.
    let d = length(in.tex_coord) * 2.0;
    let falloff = clamp(1.0 - d, 0.0, 1.0);
    let alpha = in.color.a * smoothstep(0.0, 0.35, falloff);
    if (alpha <= 0.001) {
        discard;
    }
    return vec4<f32>(in.color.rgb, alpha);
}
"#;

/// Fatal render setup failures. Initialization aborts on any of these.
#[derive(Error, Debug)]
pub enum RenderSetupError {
    /// No compatible GPU adapter on this system.
    #[error("no compatible GPU adapter available")]
    AdapterUnavailable,

    /// The adapter refused to provide a device/queue pair.
    #[error("failed to acquire GPU device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),
}

/// Acquired GPU device and command queue.
pub struct GpuContext {
    /// The logical device.
    pub device: wgpu::Device,
    /// Its command queue.
    pub queue: wgpu::Queue,
}

impl GpuContext {
    /// Acquires a device and queue, validating GPU availability once.
    ///
    /// # Errors
    ///
    /// [`RenderSetupError`] when no adapter exists or device creation
    /// fails. Both are unrecoverable.
    pub async fn new() -> Result<Self, RenderSetupError> {
        let instance = wgpu::Instance::new(wgpu::InstanceDescriptor::default());
        let adapter = instance
            .request_adapter(&wgpu::RequestAdapterOptions {
                power_preference: wgpu::PowerPreference::HighPerformance,
                compatible_surface: None,
                force_fallback_adapter: false,
            })
            .await
            .ok_or(RenderSetupError::AdapterUnavailable)?;
        tracing::info!(adapter = ?adapter.get_info().name, "acquired GPU adapter");

        let (device, queue) = adapter
            .request_device(
                &wgpu::DeviceDescriptor {
                    label: Some("skyshell device"),
                    required_features: wgpu::Features::empty(),
                    required_limits: wgpu::Limits::downlevel_defaults(),
                },
                None,
            )
            .await?;
        Ok(Self { device, queue })
    }
}

/// Per-draw uniform block as laid out in the shader.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, Pod, Zeroable)]
struct ParticleUniforms {
    /// projection x view x model.
    mvp: [[f32; 4]; 4],
    /// Quad tint.
    tint: [f32; 4],
    /// x = quad edge length; rest padding.
    size: [f32; 4],
}

/// Blend state for particle quads.
///
/// SrcAlpha / OneMinusSrcAlpha on both channels: semi-transparent stars
/// composite over each other and the camera image.
#[must_use]
pub fn particle_blend_state() -> wgpu::BlendState {
    let component = wgpu::BlendComponent {
        src_factor: wgpu::BlendFactor::SrcAlpha,
        dst_factor: wgpu::BlendFactor::OneMinusSrcAlpha,
        operation: wgpu::BlendOperation::Add,
    };
    wgpu::BlendState {
        color: component,
        alpha: component,
    }
}

/// Depth state for particle quads.
///
/// Depth test Less against the scene, but depth writes disabled: an
/// earlier star must not occlude a later overlapping one.
#[must_use]
pub fn particle_depth_state() -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DEPTH_FORMAT,
        depth_write_enabled: false,
        depth_compare: wgpu::CompareFunction::Less,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}

/// GPU-side particle renderer: one draw call per particle.
pub struct ParticleRenderer {
    pipeline: wgpu::RenderPipeline,
    bind_group_layout: wgpu::BindGroupLayout,
    bind_group: wgpu::BindGroup,
    uniform_buffer: wgpu::Buffer,
    quad_buffer: wgpu::Buffer,
    /// How many uniform slots the buffer currently holds.
    capacity: usize,
    /// Draws uploaded for the current frame.
    draw_count: usize,
}

impl ParticleRenderer {
    /// Builds the pipeline against the surface's color format.
    ///
    /// Shader compilation or pipeline-state failure surfaces through
    /// wgpu's validation and is fatal, matching the one-time precondition
    /// check this constructor represents.
    #[must_use]
    pub fn new(gpu: &GpuContext, color_format: wgpu::TextureFormat) -> Self {
        use wgpu::util::DeviceExt as _;

        let device = &gpu.device;
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("particle shader"),
            source: wgpu::ShaderSource::Wgsl(SHADER_SOURCE.into()),
        });

        let bind_group_layout =
            device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
                label: Some("particle uniforms layout"),
                entries: &[wgpu::BindGroupLayoutEntry {
                    binding: 0,
                    visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
                    ty: wgpu::BindingType::Buffer {
                        ty: wgpu::BufferBindingType::Uniform,
                        has_dynamic_offset: true,
                        min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<
                            ParticleUniforms,
                        >() as u64),
                    },
                    count: None,
                }],
            });

        let layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("particle pipeline layout"),
            bind_group_layouts: &[&bind_group_layout],
            push_constant_ranges: &[],
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("particle pipeline"),
            layout: Some(&layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: "vs_main",
                buffers: &[ParticleVertex::desc()],
            },
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: "fs_main",
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: Some(particle_blend_state()),
                    write_mask: wgpu::ColorWrites::ALL,
                })],
            }),
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                cull_mode: None,
                ..wgpu::PrimitiveState::default()
            },
            depth_stencil: Some(particle_depth_state()),
            multisample: wgpu::MultisampleState::default(),
            multiview: None,
        });

        // A white unit quad; per-draw size and tint come from the uniform.
        let quad_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("particle quad"),
            contents: bytemuck::cast_slice(&particle_quad(1.0, Color::WHITE)),
            usage: wgpu::BufferUsages::VERTEX,
        });

        let capacity = 1024;
        let (uniform_buffer, bind_group) =
            Self::allocate_uniforms(device, &bind_group_layout, capacity);

        Self {
            pipeline,
            bind_group_layout,
            bind_group,
            uniform_buffer,
            quad_buffer,
            capacity,
            draw_count: 0,
        }
    }

    fn allocate_uniforms(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        capacity: usize,
    ) -> (wgpu::Buffer, wgpu::BindGroup) {
        let buffer = device.create_buffer(&wgpu::BufferDescriptor {
            label: Some("particle uniforms"),
            size: capacity as u64 * UNIFORM_STRIDE,
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
            mapped_at_creation: false,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("particle uniforms"),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: wgpu::BindingResource::Buffer(wgpu::BufferBinding {
                    buffer: &buffer,
                    offset: 0,
                    size: wgpu::BufferSize::new(std::mem::size_of::<ParticleUniforms>() as u64),
                }),
            }],
        });
        (buffer, bind_group)
    }

    /// Uploads the prepared frame's per-draw uniforms.
    pub fn upload(&mut self, gpu: &GpuContext, frame: &RenderFrame) {
        if frame.draws.len() > self.capacity {
            self.capacity = frame.draws.len().next_power_of_two();
            let (buffer, bind_group) =
                Self::allocate_uniforms(&gpu.device, &self.bind_group_layout, self.capacity);
            self.uniform_buffer = buffer;
            self.bind_group = bind_group;
        }

        let mut staging = vec![0u8; frame.draws.len() * UNIFORM_STRIDE as usize];
        for (i, draw) in frame.draws.iter().enumerate() {
            let uniforms = ParticleUniforms {
                mvp: draw.mvp.cols,
                tint: draw.color.to_array(),
                size: [draw.size, 0.0, 0.0, 0.0],
            };
            let offset = i * UNIFORM_STRIDE as usize;
            staging[offset..offset + std::mem::size_of::<ParticleUniforms>()]
                .copy_from_slice(bytemuck::bytes_of(&uniforms));
        }
        if !staging.is_empty() {
            gpu.queue.write_buffer(&self.uniform_buffer, 0, &staging);
        }
        self.draw_count = frame.draws.len();
    }

    /// Records one draw per uploaded particle into a borrowed render pass.
    pub fn render<'pass>(&'pass self, pass: &mut wgpu::RenderPass<'pass>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_vertex_buffer(0, self.quad_buffer.slice(..));
        for i in 0..self.draw_count {
            #[allow(clippy::cast_possible_truncation)]
            let offset = (i as u64 * UNIFORM_STRIDE) as wgpu::DynamicOffset;
            pass.set_bind_group(0, &self.bind_group, &[offset]);
            pass.draw(0..6, 0..1);
        }
    }

    /// Draws uploaded for the current frame.
    #[must_use]
    pub fn draw_count(&self) -> usize {
        self.draw_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blend_is_source_alpha_over() {
        let blend = particle_blend_state();
        assert_eq!(blend.color.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.color.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
        assert_eq!(blend.alpha.src_factor, wgpu::BlendFactor::SrcAlpha);
        assert_eq!(blend.alpha.dst_factor, wgpu::BlendFactor::OneMinusSrcAlpha);
    }

    #[test]
    fn test_depth_tests_but_never_writes() {
        let depth = particle_depth_state();
        assert_eq!(depth.depth_compare, wgpu::CompareFunction::Less);
        assert!(!depth.depth_write_enabled);
        assert_eq!(depth.format, DEPTH_FORMAT);
    }

    #[test]
    fn test_uniform_block_fits_stride() {
        let size = std::mem::size_of::<ParticleUniforms>() as u64;
        assert!(size <= UNIFORM_STRIDE);
        assert_eq!(size % 16, 0);
    }
}
