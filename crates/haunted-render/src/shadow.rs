//! Shadow maps and the depth-only pipelines that fill them.
//!
//! Casters are drawn from the sun's orthographic shadow camera into a square
//! reverse-Z depth texture. Shadow-casting point lights get six 90° faces
//! each, stored as layers of one texture and sampled through cube views. The
//! standard pipeline reads both at group 3 with one comparison sampler.

use glam::Mat4;
use haunted_lighting::MAX_POINT_SHADOWS;
use wgpu::util::DeviceExt;

use crate::buffer::VertexPositionNormalUv;
use crate::depth::DepthBuffer;
use crate::standard_pipeline::uniform_entry;

/// Faces per point light shadow cube.
pub const CUBE_FACES: usize = 6;

/// Group 3 binding of the first point shadow cube; the rest follow by slot.
pub const POINT_SHADOW_FIRST_BINDING: u32 = 2;

/// WGSL source for depth-only shadow rendering.
pub const SHADOW_SHADER_SOURCE: &str = r#"
struct LightMatrix {
    view_proj: mat4x4<f32>,
};

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    flags: vec4<f32>,
};

@group(0) @binding(0) var<uniform> light: LightMatrix;
@group(1) @binding(0) var<uniform> mesh_object: ObjectUniform;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

@vertex
fn vs_shadow(in: VertexInput) -> @builtin(position) vec4<f32> {
    return light.view_proj * mesh_object.model * vec4<f32>(in.position, 1.0);
}
"#;

/// A light matrix uniform and its bind group.
///
/// Every shadow view needs its own, since all writes land before the frame
/// is submitted.
pub struct LightMatrixBinding {
    buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

impl LightMatrixBinding {
    fn new(device: &wgpu::Device, layout: &wgpu::BindGroupLayout, label: &str) -> Self {
        let buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{label}-matrix")),
            contents: bytemuck::cast_slice(&Mat4::IDENTITY.to_cols_array()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{label}-bind-group")),
            layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: buffer.as_entire_binding(),
            }],
        });
        Self { buffer, bind_group }
    }

    pub fn write(&self, queue: &wgpu::Queue, view_proj: Mat4) {
        queue.write_buffer(&self.buffer, 0, bytemuck::cast_slice(&view_proj.to_cols_array()));
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

/// Depth-only pipelines plus the sun's light matrix.
pub struct ShadowPipeline {
    pub pipeline: wgpu::RenderPipeline,
    /// Same pipeline with clockwise front faces, for the mirrored cube face cameras.
    pub cube_face_pipeline: wgpu::RenderPipeline,
    light_layout: wgpu::BindGroupLayout,
    sun_light: LightMatrixBinding,
}

impl ShadowPipeline {
    /// `object_layout` is the per-object layout shared with the standard pipeline.
    pub fn new(device: &wgpu::Device, object_layout: &wgpu::BindGroupLayout) -> Self {
        let light_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("shadow-light-bgl"),
            entries: &[uniform_entry(0, wgpu::ShaderStages::VERTEX, 64)],
        });
        let sun_light = LightMatrixBinding::new(device, &light_layout, "sun-shadow-light");

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("shadow-shader"),
            source: wgpu::ShaderSource::Wgsl(SHADOW_SHADER_SOURCE.into()),
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("shadow-pipeline-layout"),
            bind_group_layouts: &[&light_layout, object_layout],
            immediate_size: 0,
        });

        let pipeline = create_depth_pipeline(
            device,
            &pipeline_layout,
            &shader,
            wgpu::FrontFace::Ccw,
            "shadow-depth-pipeline",
        );
        let cube_face_pipeline = create_depth_pipeline(
            device,
            &pipeline_layout,
            &shader,
            wgpu::FrontFace::Cw,
            "cube-shadow-depth-pipeline",
        );

        Self {
            pipeline,
            cube_face_pipeline,
            light_layout,
            sun_light,
        }
    }

    /// Upload the sun's light-space view-projection matrix for this frame.
    pub fn set_light_matrix(&self, queue: &wgpu::Queue, view_proj: Mat4) {
        self.sun_light.write(queue, view_proj);
    }

    pub fn light_bind_group(&self) -> &wgpu::BindGroup {
        self.sun_light.bind_group()
    }

    /// A fresh light matrix binding for another shadow view.
    pub fn create_light_binding(&self, device: &wgpu::Device, label: &str) -> LightMatrixBinding {
        LightMatrixBinding::new(device, &self.light_layout, label)
    }
}

fn create_depth_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    front_face: wgpu::FrontFace,
    label: &'static str,
) -> wgpu::RenderPipeline {
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_shadow"),
            buffers: &[VertexPositionNormalUv::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face,
            // Back faces only, so lit front faces do not shadow themselves.
            cull_mode: Some(wgpu::Face::Front),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(wgpu::DepthStencilState {
            format: DepthBuffer::FORMAT,
            depth_write_enabled: true,
            depth_compare: DepthBuffer::COMPARE_FUNCTION,
            stencil: wgpu::StencilState::default(),
            // Negative under reverse-Z: pushes stored depth away from the light.
            bias: wgpu::DepthBiasState {
                constant: -2,
                slope_scale: -1.75,
                clamp: 0.0,
            },
        }),
        multisample: wgpu::MultisampleState::default(),
        fragment: None,
        multiview_mask: None,
        cache: None,
    })
}

/// Layer of face `face` of cube `slot` in the point shadow texture.
pub fn cube_face_layer(slot: usize, face: usize) -> u32 {
    (slot * CUBE_FACES + face) as u32
}

/// Cube shadow maps for up to [`MAX_POINT_SHADOWS`] point lights.
///
/// One layered texture holds every face. Faces are rendered through
/// single-layer views and sampled through one cube view per slot.
pub struct PointShadowMaps {
    face_views: Vec<wgpu::TextureView>,
    cube_views: Vec<wgpu::TextureView>,
    face_lights: Vec<LightMatrixBinding>,
    size: u32,
}

impl PointShadowMaps {
    pub fn new(device: &wgpu::Device, pipeline: &ShadowPipeline, size: u32) -> Self {
        let size = size.max(1);
        let layers = cube_face_layer(MAX_POINT_SHADOWS, 0);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("point-shadow-maps"),
            size: wgpu::Extent3d {
                width: size,
                height: size,
                depth_or_array_layers: layers,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: DepthBuffer::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });

        let face_views = (0..layers)
            .map(|layer| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("point-shadow-face-{layer}")),
                    dimension: Some(wgpu::TextureViewDimension::D2),
                    base_array_layer: layer,
                    array_layer_count: Some(1),
                    ..Default::default()
                })
            })
            .collect();
        let cube_views = (0..MAX_POINT_SHADOWS)
            .map(|slot| {
                texture.create_view(&wgpu::TextureViewDescriptor {
                    label: Some(&format!("point-shadow-cube-{slot}")),
                    dimension: Some(wgpu::TextureViewDimension::Cube),
                    base_array_layer: cube_face_layer(slot, 0),
                    array_layer_count: Some(CUBE_FACES as u32),
                    ..Default::default()
                })
            })
            .collect();
        let face_lights = (0..layers)
            .map(|layer| pipeline.create_light_binding(device, &format!("point-shadow-face-{layer}")))
            .collect();

        log::info!("Point shadow maps created ({MAX_POINT_SHADOWS} cubes, {size}x{size} per face)");
        Self {
            face_views,
            cube_views,
            face_lights,
            size,
        }
    }

    pub fn size(&self) -> u32 {
        self.size
    }

    /// Upload the six face matrices of cube `slot`.
    pub fn set_face_matrices(&self, queue: &wgpu::Queue, slot: usize, faces: &[Mat4; CUBE_FACES]) {
        for (face, view_proj) in faces.iter().enumerate() {
            if let Some(light) = self.face_lights.get(cube_face_layer(slot, face) as usize) {
                light.write(queue, *view_proj);
            }
        }
    }

    /// Render target and light matrix of one face. `None` past the last slot.
    pub fn face(&self, slot: usize, face: usize) -> Option<(&wgpu::TextureView, &LightMatrixBinding)> {
        let layer = cube_face_layer(slot, face) as usize;
        Some((self.face_views.get(layer)?, self.face_lights.get(layer)?))
    }

    fn cube_views(&self) -> &[wgpu::TextureView] {
        &self.cube_views
    }
}

/// The sun and point light shadow textures and their sampling bind group.
pub struct ShadowMap {
    pub depth: DepthBuffer,
    pub points: PointShadowMaps,
    sampler: wgpu::Sampler,
    bind_group: wgpu::BindGroup,
}

impl ShadowMap {
    /// A `size`×`size` sun map plus point cubes of `point_size` per face.
    /// `layout` is the standard pipeline's shadow layout.
    pub fn new(
        device: &wgpu::Device,
        layout: &wgpu::BindGroupLayout,
        pipeline: &ShadowPipeline,
        size: u32,
        point_size: u32,
    ) -> Self {
        let depth = DepthBuffer::new(device, "shadow-map", size, size);
        let points = PointShadowMaps::new(device, pipeline, point_size);
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            label: Some("shadow-comparison-sampler"),
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            address_mode_w: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            compare: Some(DepthBuffer::COMPARE_FUNCTION),
            ..Default::default()
        });
        let bind_group = create_bind_group(device, layout, &depth, &points, &sampler);
        log::info!("Shadow map created ({size}x{size})");
        Self {
            depth,
            points,
            sampler,
            bind_group,
        }
    }

    /// Resize the sun map, rebuilding the bind group if the texture changed.
    pub fn resize(&mut self, device: &wgpu::Device, layout: &wgpu::BindGroupLayout, size: u32) {
        if self.depth.resize(device, size, size) {
            self.bind_group = create_bind_group(device, layout, &self.depth, &self.points, &self.sampler);
        }
    }

    pub fn size(&self) -> u32 {
        self.depth.width()
    }

    pub fn bind_group(&self) -> &wgpu::BindGroup {
        &self.bind_group
    }
}

fn create_bind_group(
    device: &wgpu::Device,
    layout: &wgpu::BindGroupLayout,
    depth: &DepthBuffer,
    points: &PointShadowMaps,
    sampler: &wgpu::Sampler,
) -> wgpu::BindGroup {
    let mut entries = vec![
        wgpu::BindGroupEntry {
            binding: 0,
            resource: wgpu::BindingResource::TextureView(&depth.view),
        },
        wgpu::BindGroupEntry {
            binding: 1,
            resource: wgpu::BindingResource::Sampler(sampler),
        },
    ];
    for (slot, view) in points.cube_views().iter().enumerate() {
        entries.push(wgpu::BindGroupEntry {
            binding: POINT_SHADOW_FIRST_BINDING + slot as u32,
            resource: wgpu::BindingResource::TextureView(view),
        });
    }
    device.create_bind_group(&wgpu::BindGroupDescriptor {
        label: Some("shadow-map-bind-group"),
        layout,
        entries: &entries,
    })
}
