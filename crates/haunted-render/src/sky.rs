//! Preetham daylight sky drawn as a full-screen background.
//!
//! The sun-dependent terms come precomputed from
//! [`Sky::scattering`](haunted_scene::Sky::scattering); the shader only
//! evaluates the view-dependent part per pixel.

use bytemuck::{Pod, Zeroable};
use glam::Vec3;
use haunted_scene::{Camera, Sky};
use wgpu::util::DeviceExt;

use crate::depth::depth_state;
use crate::standard_pipeline::uniform_entry;

/// Sky uniform block, 144 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct SkyUniform {
    pub inv_view_proj: [f32; 16],
    /// xyz = camera position.
    pub camera_position: [f32; 4],
    /// xyz = normalized sun direction, w = sun intensity.
    pub sun: [f32; 4],
    /// xyz = up, w = sun fade.
    pub up: [f32; 4],
    /// xyz = total Rayleigh coefficient, w = Mie directional g.
    pub beta_rayleigh: [f32; 4],
    /// xyz = total Mie coefficient.
    pub beta_mie: [f32; 4],
}

impl SkyUniform {
    pub fn new(sky: &Sky, camera: &Camera) -> Self {
        let scattering = sky.scattering();
        let up = sky.up.try_normalize().unwrap_or(Vec3::Y);
        Self {
            inv_view_proj: camera.view_projection_matrix().inverse().to_cols_array(),
            camera_position: camera.position.extend(1.0).to_array(),
            sun: scattering.sun_direction.extend(scattering.sun_intensity).to_array(),
            up: up.extend(scattering.sun_fade).to_array(),
            beta_rayleigh: scattering.beta_rayleigh.extend(sky.mie_directional_g).to_array(),
            beta_mie: scattering.beta_mie.extend(0.0).to_array(),
        }
    }
}

/// WGSL source of the sky pass.
pub const SKY_SHADER_SOURCE: &str = r#"
const PI: f32 = 3.141592653589793;
const RAYLEIGH_ZENITH_LENGTH: f32 = 8.4e3;
const MIE_ZENITH_LENGTH: f32 = 1.25e3;
const SUN_ANGULAR_DIAMETER_COS: f32 = 0.9999566769464484;
const THREE_OVER_SIXTEEN_PI: f32 = 0.05968310365946075;
const ONE_OVER_FOUR_PI: f32 = 0.07957747154594767;

struct SkyUniform {
    inv_view_proj: mat4x4<f32>,
    camera_position: vec4<f32>,
    sun: vec4<f32>,
    up: vec4<f32>,
    beta_rayleigh: vec4<f32>,
    beta_mie: vec4<f32>,
};

@group(0) @binding(0) var<uniform> sky: SkyUniform;

struct VertexOutput {
    @builtin(position) position: vec4<f32>,
    @location(0) ndc: vec2<f32>,
};

@vertex
fn vs_sky(@builtin(vertex_index) idx: u32) -> VertexOutput {
    let uv = vec2<f32>(f32((idx << 1u) & 2u), f32(idx & 2u));
    let ndc = uv * 2.0 - 1.0;
    var out: VertexOutput;
    // Reverse-Z far plane.
    out.position = vec4<f32>(ndc, 0.0, 1.0);
    out.ndc = ndc;
    return out;
}

fn rayleigh_phase(cos_theta: f32) -> f32 {
    return THREE_OVER_SIXTEEN_PI * (1.0 + cos_theta * cos_theta);
}

fn hg_phase(cos_theta: f32, g: f32) -> f32 {
    let g2 = g * g;
    let inverse = 1.0 / pow(1.0 - 2.0 * g * cos_theta + g2, 1.5);
    return ONE_OVER_FOUR_PI * ((1.0 - g2) * inverse);
}

@fragment
fn fs_sky(in: VertexOutput) -> @location(0) vec4<f32> {
    // Reverse-Z near plane, so the point is always in front of the camera.
    let near_point = sky.inv_view_proj * vec4<f32>(in.ndc, 1.0, 1.0);
    let direction = normalize(near_point.xyz / near_point.w - sky.camera_position.xyz);

    let up = sky.up.xyz;
    let sun_direction = sky.sun.xyz;
    let sun_e = sky.sun.w;
    let sun_fade = sky.up.w;
    let beta_r = sky.beta_rayleigh.xyz;
    let beta_m = sky.beta_mie.xyz;

    // Optical length at this zenith angle.
    let zenith_angle = acos(max(0.0, dot(up, direction)));
    let inverse = 1.0 / (cos(zenith_angle) + 0.15 * pow(93.885 - ((zenith_angle * 180.0) / PI), -1.253));
    let s_r = RAYLEIGH_ZENITH_LENGTH * inverse;
    let s_m = MIE_ZENITH_LENGTH * inverse;

    // Combined extinction factor.
    let fex = exp(-(beta_r * s_r + beta_m * s_m));

    // In-scattering.
    let cos_theta = dot(direction, sun_direction);
    let beta_r_theta = beta_r * rayleigh_phase(cos_theta * 0.5 + 0.5);
    let beta_m_theta = beta_m * hg_phase(cos_theta, sky.beta_rayleigh.w);
    let scatter = sun_e * ((beta_r_theta + beta_m_theta) / (beta_r + beta_m));
    var lin = pow(scatter * (1.0 - fex), vec3<f32>(1.5));
    lin *= mix(
        vec3<f32>(1.0),
        pow(scatter * fex, vec3<f32>(0.5)),
        clamp(pow(1.0 - dot(up, sun_direction), 5.0), 0.0, 1.0),
    );

    // Night sky and sun disk.
    var l0 = vec3<f32>(0.1) * fex;
    let sundisk = smoothstep(SUN_ANGULAR_DIAMETER_COS, SUN_ANGULAR_DIAMETER_COS + 0.00002, cos_theta);
    l0 += (sun_e * 19000.0 * fex) * sundisk;

    let tex_color = (lin + l0) * 0.04 + vec3<f32>(0.0, 0.0003, 0.00075);
    let color = pow(tex_color, vec3<f32>(1.0 / (1.2 + (1.2 * sun_fade))));
    return vec4<f32>(color, 1.0);
}
"#;

/// Draws the sky behind all scene geometry.
pub struct SkyRenderer {
    pipeline: wgpu::RenderPipeline,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl SkyRenderer {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("sky-shader"),
            source: wgpu::ShaderSource::Wgsl(SKY_SHADER_SOURCE.into()),
        });

        let layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("sky-uniform-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::FRAGMENT,
                std::mem::size_of::<SkyUniform>(),
            )],
        });

        let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("sky-uniform-buffer"),
            contents: bytemuck::bytes_of(&SkyUniform::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("sky-uniform-bind-group"),
            layout: &layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: uniform_buffer.as_entire_binding(),
            }],
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("sky-pipeline-layout"),
            bind_group_layouts: &[&layout],
            immediate_size: 0,
        });

        let pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
            label: Some("sky-pipeline"),
            layout: Some(&pipeline_layout),
            vertex: wgpu::VertexState {
                module: &shader,
                entry_point: Some("vs_sky"),
                buffers: &[],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            },
            primitive: wgpu::PrimitiveState {
                topology: wgpu::PrimitiveTopology::TriangleList,
                ..Default::default()
            },
            // Drawn first in the main pass; never writes depth.
            depth_stencil: Some(depth_state(false, wgpu::CompareFunction::Always)),
            multisample: wgpu::MultisampleState::default(),
            fragment: Some(wgpu::FragmentState {
                module: &shader,
                entry_point: Some("fs_sky"),
                targets: &[Some(wgpu::ColorTargetState {
                    format: color_format,
                    blend: None,
                    write_mask: wgpu::ColorWrites::ALL,
                })],
                compilation_options: wgpu::PipelineCompilationOptions::default(),
            }),
            multiview_mask: None,
            cache: None,
        });

        Self {
            pipeline,
            uniform_buffer,
            bind_group,
        }
    }

    /// Upload the camera and sun terms for this frame.
    pub fn update(&self, queue: &wgpu::Queue, sky: &Sky, camera: &Camera) {
        queue.write_buffer(&self.uniform_buffer, 0, bytemuck::bytes_of(&SkyUniform::new(sky, camera)));
    }

    pub fn draw(&self, pass: &mut wgpu::RenderPass<'_>) {
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, &self.bind_group, &[]);
        pass.draw(0..3, 0..1);
    }
}
