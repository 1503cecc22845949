//! Metallic/roughness surface pipeline with textures, shadows and fog.
//!
//! Bind groups:
//! - group 0: [`FrameUniform`](crate::uniforms::FrameUniform)
//! - group 1: [`ObjectUniform`](crate::uniforms::ObjectUniform)
//! - group 2: [`MaterialUniform`](crate::uniforms::MaterialUniform), seven maps
//!   and two samplers (detail and alpha)
//! - group 3: directional shadow map, comparison sampler and one depth cube
//!   per point shadow slot
//!
//! Two pipelines share the layout: an opaque one and a transparent one with
//! alpha blending.

use std::num::NonZeroU64;

use haunted_lighting::MAX_POINT_SHADOWS;

use crate::buffer::VertexPositionNormalUv;
use crate::depth::{DepthBuffer, depth_state};
use crate::shadow::POINT_SHADOW_FIRST_BINDING;
use crate::uniforms::{FrameUniform, MaterialUniform, ObjectUniform};

/// Texture bindings of group 2, in order, after the material uniform.
pub const MATERIAL_TEXTURE_BINDINGS: u32 = 7;

/// Opaque and transparent variants of the standard surface shader.
pub struct StandardPipeline {
    pub opaque: wgpu::RenderPipeline,
    pub transparent: wgpu::RenderPipeline,
    pub frame_layout: wgpu::BindGroupLayout,
    pub object_layout: wgpu::BindGroupLayout,
    pub material_layout: wgpu::BindGroupLayout,
    pub shadow_layout: wgpu::BindGroupLayout,
}

impl StandardPipeline {
    pub fn new(device: &wgpu::Device, color_format: wgpu::TextureFormat) -> Self {
        let frame_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("standard-frame-bgl"),
            entries: &[uniform_entry(
                0,
                wgpu::ShaderStages::VERTEX_FRAGMENT,
                std::mem::size_of::<FrameUniform>(),
            )],
        });

        let object_layout = object_bind_group_layout(device);

        let mut material_entries = vec![uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            std::mem::size_of::<MaterialUniform>(),
        )];
        for binding in 1..=MATERIAL_TEXTURE_BINDINGS {
            // The displacement map is read by the vertex stage.
            let visibility = if binding == MATERIAL_TEXTURE_BINDINGS {
                wgpu::ShaderStages::VERTEX
            } else {
                wgpu::ShaderStages::FRAGMENT
            };
            material_entries.push(texture_entry(binding, visibility));
        }
        material_entries.push(wgpu::BindGroupLayoutEntry {
            binding: 8,
            visibility: wgpu::ShaderStages::VERTEX_FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        material_entries.push(wgpu::BindGroupLayoutEntry {
            binding: 9,
            visibility: wgpu::ShaderStages::FRAGMENT,
            ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Filtering),
            count: None,
        });
        let material_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("standard-material-bgl"),
            entries: &material_entries,
        });

        let mut shadow_entries = vec![
            depth_texture_entry(0, wgpu::TextureViewDimension::D2),
            wgpu::BindGroupLayoutEntry {
                binding: 1,
                visibility: wgpu::ShaderStages::FRAGMENT,
                ty: wgpu::BindingType::Sampler(wgpu::SamplerBindingType::Comparison),
                count: None,
            },
        ];
        for slot in 0..MAX_POINT_SHADOWS as u32 {
            shadow_entries.push(depth_texture_entry(
                POINT_SHADOW_FIRST_BINDING + slot,
                wgpu::TextureViewDimension::Cube,
            ));
        }
        let shadow_layout = device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
            label: Some("standard-shadow-bgl"),
            entries: &shadow_entries,
        });

        let pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
            label: Some("standard-pipeline-layout"),
            bind_group_layouts: &[&frame_layout, &object_layout, &material_layout, &shadow_layout],
            immediate_size: 0,
        });

        let shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
            label: Some("standard-shader"),
            source: wgpu::ShaderSource::Wgsl(STANDARD_SHADER_SOURCE.into()),
        });

        let opaque = create_pipeline(device, &pipeline_layout, &shader, color_format, None);
        let transparent = create_pipeline(
            device,
            &pipeline_layout,
            &shader,
            color_format,
            Some(wgpu::BlendState::ALPHA_BLENDING),
        );
        log::info!("Standard pipeline created for {color_format:?}");

        Self {
            opaque,
            transparent,
            frame_layout,
            object_layout,
            material_layout,
            shadow_layout,
        }
    }
}

/// Layout of the per-object uniform, shared with the shadow pipeline.
pub fn object_bind_group_layout(device: &wgpu::Device) -> wgpu::BindGroupLayout {
    device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        label: Some("object-bgl"),
        entries: &[uniform_entry(
            0,
            wgpu::ShaderStages::VERTEX_FRAGMENT,
            std::mem::size_of::<ObjectUniform>(),
        )],
    })
}

pub(crate) fn uniform_entry(
    binding: u32,
    visibility: wgpu::ShaderStages,
    size: usize,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: NonZeroU64::new(size as u64),
        },
        count: None,
    }
}

fn texture_entry(binding: u32, visibility: wgpu::ShaderStages) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Float { filterable: true },
            view_dimension: wgpu::TextureViewDimension::D2,
            multisampled: false,
        },
        count: None,
    }
}

fn depth_texture_entry(
    binding: u32,
    view_dimension: wgpu::TextureViewDimension,
) -> wgpu::BindGroupLayoutEntry {
    wgpu::BindGroupLayoutEntry {
        binding,
        visibility: wgpu::ShaderStages::FRAGMENT,
        ty: wgpu::BindingType::Texture {
            sample_type: wgpu::TextureSampleType::Depth,
            view_dimension,
            multisampled: false,
        },
        count: None,
    }
}

fn create_pipeline(
    device: &wgpu::Device,
    layout: &wgpu::PipelineLayout,
    shader: &wgpu::ShaderModule,
    color_format: wgpu::TextureFormat,
    blend: Option<wgpu::BlendState>,
) -> wgpu::RenderPipeline {
    let label = if blend.is_some() {
        "standard-transparent-pipeline"
    } else {
        "standard-opaque-pipeline"
    };
    device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
        label: Some(label),
        layout: Some(layout),
        vertex: wgpu::VertexState {
            module: shader,
            entry_point: Some("vs_main"),
            buffers: &[VertexPositionNormalUv::layout()],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        },
        primitive: wgpu::PrimitiveState {
            topology: wgpu::PrimitiveTopology::TriangleList,
            strip_index_format: None,
            front_face: wgpu::FrontFace::Ccw,
            cull_mode: Some(wgpu::Face::Back),
            unclipped_depth: false,
            polygon_mode: wgpu::PolygonMode::Fill,
            conservative: false,
        },
        depth_stencil: Some(depth_state(true, DepthBuffer::COMPARE_FUNCTION)),
        multisample: wgpu::MultisampleState::default(),
        fragment: Some(wgpu::FragmentState {
            module: shader,
            entry_point: Some("fs_main"),
            targets: &[Some(wgpu::ColorTargetState {
                format: color_format,
                blend,
                write_mask: wgpu::ColorWrites::ALL,
            })],
            compilation_options: wgpu::PipelineCompilationOptions::default(),
        }),
        multiview_mask: None,
        cache: None,
    })
}

/// WGSL source of the standard surface shader.
///
/// Cook-Torrance BRDF with GGX distribution, Schlick Fresnel and Smith
/// geometry terms. Texture channels: AO red, roughness green, metalness blue,
/// alpha green, displacement red.
pub const STANDARD_SHADER_SOURCE: &str = r#"
const PI: f32 = 3.14159265359;
const MAX_POINT_LIGHTS: u32 = 8u;
const MIN_ROUGHNESS: f32 = 0.0525;
const POINT_SHADOW_BIAS: f32 = 0.001;

struct PointLight {
    position_distance: vec4<f32>,
    color_intensity: vec4<f32>,
    // x decay, y shadow slot (-1 for none), z shadow near, w shadow far
    decay_shadow: vec4<f32>,
};

struct Lighting {
    ambient: vec4<f32>,
    sun_direction: vec4<f32>,
    sun_color: vec4<f32>,
    shadow_view_proj: mat4x4<f32>,
    shadow_params: vec4<f32>,
    point_count: vec4<u32>,
    point_lights: array<PointLight, 8>,
};

struct FrameUniform {
    view_proj: mat4x4<f32>,
    view: mat4x4<f32>,
    camera_position: vec4<f32>,
    fog: vec4<f32>,
    lighting: Lighting,
};

struct ObjectUniform {
    model: mat4x4<f32>,
    normal_matrix: mat4x4<f32>,
    flags: vec4<f32>,
};

struct MaterialUniform {
    color_roughness: vec4<f32>,
    surface: vec4<f32>,
    uv_repeat: vec4<f32>,
    flags: vec4<f32>,
};

@group(0) @binding(0) var<uniform> frame: FrameUniform;
@group(1) @binding(0) var<uniform> mesh_object: ObjectUniform;

@group(2) @binding(0) var<uniform> material: MaterialUniform;
@group(2) @binding(1) var color_map: texture_2d<f32>;
@group(2) @binding(2) var ao_map: texture_2d<f32>;
@group(2) @binding(3) var roughness_map: texture_2d<f32>;
@group(2) @binding(4) var metalness_map: texture_2d<f32>;
@group(2) @binding(5) var normal_map: texture_2d<f32>;
@group(2) @binding(6) var alpha_map: texture_2d<f32>;
@group(2) @binding(7) var displacement_map: texture_2d<f32>;
@group(2) @binding(8) var detail_sampler: sampler;
@group(2) @binding(9) var alpha_sampler: sampler;

@group(3) @binding(0) var shadow_map: texture_depth_2d;
@group(3) @binding(1) var shadow_sampler: sampler_comparison;
@group(3) @binding(2) var point_shadow_map0: texture_depth_cube;
@group(3) @binding(3) var point_shadow_map1: texture_depth_cube;
@group(3) @binding(4) var point_shadow_map2: texture_depth_cube;

struct VertexInput {
    @location(0) position: vec3<f32>,
    @location(1) normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
};

struct VertexOutput {
    @builtin(position) clip_position: vec4<f32>,
    @location(0) world_position: vec3<f32>,
    @location(1) world_normal: vec3<f32>,
    @location(2) uv: vec2<f32>,
    @location(3) view_depth: f32,
};

// UVs run top to bottom. The repeat is applied bottom-up so clamped
// partial repeats cover the same texels as an image-space repeat from
// the bottom-left corner.
fn detail_uv(uv: vec2<f32>) -> vec2<f32> {
    let repeat = material.uv_repeat.xy;
    return vec2<f32>(uv.x * repeat.x, 1.0 - (1.0 - uv.y) * repeat.y);
}

// --- BRDF ---

fn distribution_ggx(n_dot_h: f32, roughness: f32) -> f32 {
    let a = roughness * roughness;
    let a2 = a * a;
    let denom = n_dot_h * n_dot_h * (a2 - 1.0) + 1.0;
    return a2 / (PI * denom * denom);
}

fn geometry_schlick_ggx(n_dot: f32, roughness: f32) -> f32 {
    let r = roughness + 1.0;
    let k = (r * r) / 8.0;
    return n_dot / (n_dot * (1.0 - k) + k);
}

fn geometry_smith(n_dot_v: f32, n_dot_l: f32, roughness: f32) -> f32 {
    return geometry_schlick_ggx(n_dot_v, roughness) * geometry_schlick_ggx(n_dot_l, roughness);
}

fn fresnel_schlick(cos_theta: f32, f0: vec3<f32>) -> vec3<f32> {
    return f0 + (1.0 - f0) * pow(clamp(1.0 - cos_theta, 0.0, 1.0), 5.0);
}

fn evaluate_brdf(
    light_dir: vec3<f32>,
    view_dir: vec3<f32>,
    normal: vec3<f32>,
    albedo: vec3<f32>,
    metalness: f32,
    roughness: f32,
) -> vec3<f32> {
    let half_vec = normalize(view_dir + light_dir);

    let n_dot_l = max(dot(normal, light_dir), 0.0);
    let n_dot_v = max(dot(normal, view_dir), 0.0);
    let n_dot_h = max(dot(normal, half_vec), 0.0);
    let h_dot_v = max(dot(half_vec, view_dir), 0.0);

    let f0 = mix(vec3<f32>(0.04), albedo, metalness);

    let d = distribution_ggx(n_dot_h, roughness);
    let g = geometry_smith(n_dot_v, n_dot_l, roughness);
    let f = fresnel_schlick(h_dot_v, f0);

    let specular = d * g * f / (4.0 * n_dot_v * n_dot_l + 0.0001);
    let k_d = (vec3<f32>(1.0) - f) * (1.0 - metalness);
    let diffuse = k_d * albedo / PI;

    return (diffuse + specular) * n_dot_l;
}

// --- Lights ---

fn distance_attenuation(dist: f32, cutoff: f32, decay: f32) -> f32 {
    var falloff = 1.0 / max(pow(max(dist, 0.0001), decay), 0.01);
    if cutoff > 0.0 {
        let ratio = dist / cutoff;
        let window = saturate(1.0 - ratio * ratio * ratio * ratio);
        falloff *= window * window;
    }
    return falloff;
}

// 3x3 percentage-closer filtering. Reverse-Z: a fragment is lit when its
// light-space depth is at least the stored occluder depth.
fn sun_shadow(world_position: vec3<f32>) -> f32 {
    let params = frame.lighting.shadow_params;
    if params.x < 0.5 || mesh_object.flags.x < 0.5 {
        return 1.0;
    }
    let light_clip = frame.lighting.shadow_view_proj * vec4<f32>(world_position, 1.0);
    let coord = light_clip.xyz / light_clip.w;
    let uv = vec2<f32>(coord.x * 0.5 + 0.5, -coord.y * 0.5 + 0.5);
    if any(uv < vec2<f32>(0.0)) || any(uv > vec2<f32>(1.0)) || coord.z < 0.0 || coord.z > 1.0 {
        return 1.0;
    }

    let reference = coord.z + params.y;
    var lit = 0.0;
    for (var y = -1; y <= 1; y++) {
        for (var x = -1; x <= 1; x++) {
            let offset = vec2<f32>(f32(x), f32(y)) * params.z;
            lit += textureSampleCompareLevel(shadow_map, shadow_sampler, uv + offset, reference);
        }
    }
    return lit / 9.0;
}

// The cube face that sees the fragment stored depth along its major axis,
// with the same reverse-Z perspective as the face cameras.
fn point_shadow(light: PointLight, world_position: vec3<f32>) -> f32 {
    let shadow = light.decay_shadow;
    if shadow.y < 0.0 || mesh_object.flags.x < 0.5 {
        return 1.0;
    }
    let offset = world_position - light.position_distance.xyz;
    let axis = max(max(abs(offset.x), abs(offset.y)), abs(offset.z));
    let near_plane = shadow.z;
    let far_plane = shadow.w;
    if axis >= far_plane || axis <= 0.0 {
        return 1.0;
    }

    let reference = near_plane * (far_plane - axis) / ((far_plane - near_plane) * axis) + POINT_SHADOW_BIAS;
    var lit = 1.0;
    switch u32(shadow.y) {
        case 0u: {
            lit = textureSampleCompareLevel(point_shadow_map0, shadow_sampler, offset, reference);
        }
        case 1u: {
            lit = textureSampleCompareLevel(point_shadow_map1, shadow_sampler, offset, reference);
        }
        default: {
            lit = textureSampleCompareLevel(point_shadow_map2, shadow_sampler, offset, reference);
        }
    }
    return lit;
}

// Tangent frame from screen-space derivatives of position and UV.
fn tangent_frame(position: vec3<f32>, normal: vec3<f32>, uv: vec2<f32>) -> mat3x3<f32> {
    let q0 = dpdx(position);
    let q1 = dpdy(position);
    let st0 = dpdx(uv);
    let st1 = dpdy(uv);

    let q1_perp = cross(q1, normal);
    let q0_perp = cross(normal, q0);
    let tangent = q1_perp * st0.x + q0_perp * st1.x;
    let bitangent = q1_perp * st0.y + q0_perp * st1.y;

    let det = max(dot(tangent, tangent), dot(bitangent, bitangent));
    let scale = select(inverseSqrt(det), 0.0, det == 0.0);
    return mat3x3<f32>(tangent * scale, bitangent * scale, normal);
}

// --- Vertex & Fragment ---

@vertex
fn vs_main(in: VertexInput) -> VertexOutput {
    var local_position = in.position;
    if material.flags.y > 0.5 {
        let height = textureSampleLevel(displacement_map, detail_sampler, detail_uv(in.uv), 0.0).r;
        local_position += normalize(in.normal) * (height * material.surface.y + material.surface.z);
    }

    let world = mesh_object.model * vec4<f32>(local_position, 1.0);
    var out: VertexOutput;
    out.clip_position = frame.view_proj * world;
    out.world_position = world.xyz;
    out.world_normal = (mesh_object.normal_matrix * vec4<f32>(in.normal, 0.0)).xyz;
    out.uv = in.uv;
    out.view_depth = -(frame.view * world).z;
    return out;
}

@fragment
fn fs_main(in: VertexOutput) -> @location(0) vec4<f32> {
    let uv = detail_uv(in.uv);

    // Implicit-derivative sampling stays ahead of any branching.
    let base_texel = textureSample(color_map, detail_sampler, uv);
    let ao_texel = textureSample(ao_map, detail_sampler, uv).r;
    let roughness_texel = textureSample(roughness_map, detail_sampler, uv).g;
    let metalness_texel = textureSample(metalness_map, detail_sampler, uv).b;
    let normal_texel = textureSample(normal_map, detail_sampler, uv).xyz;
    let alpha_texel = textureSample(alpha_map, alpha_sampler, in.uv).g;

    let geometric_normal = normalize(in.world_normal);
    let tbn = tangent_frame(in.world_position, geometric_normal, uv);
    var normal = geometric_normal;
    if material.flags.x > 0.5 {
        var map_normal = normal_texel * 2.0 - 1.0;
        // Green points up the image; v points down it.
        map_normal.y = -map_normal.y;
        normal = normalize(tbn * map_normal);
    }

    let albedo = material.color_roughness.rgb * base_texel.rgb;
    var alpha = base_texel.a;
    if material.flags.z > 0.5 {
        alpha *= alpha_texel;
    }
    let roughness = clamp(material.color_roughness.w * roughness_texel, MIN_ROUGHNESS, 1.0);
    let metalness = clamp(material.surface.x * metalness_texel, 0.0, 1.0);
    let view_dir = normalize(frame.camera_position.xyz - in.world_position);

    let sun = frame.lighting.sun_direction;
    var color = evaluate_brdf(-sun.xyz, view_dir, normal, albedo, metalness, roughness)
              * frame.lighting.sun_color.rgb * sun.w * sun_shadow(in.world_position);

    let count = min(frame.lighting.point_count.x, MAX_POINT_LIGHTS);
    for (var i = 0u; i < count; i++) {
        let light = frame.lighting.point_lights[i];
        let to_light = light.position_distance.xyz - in.world_position;
        let dist = length(to_light);
        let attenuation = distance_attenuation(dist, light.position_distance.w, light.decay_shadow.x);
        if attenuation <= 0.0 {
            continue;
        }
        color += evaluate_brdf(to_light / max(dist, 0.0001), view_dir, normal, albedo, metalness, roughness)
               * light.color_intensity.rgb * light.color_intensity.w * attenuation
               * point_shadow(light, in.world_position);
    }

    let ambient = frame.lighting.ambient;
    color += ambient.rgb * ambient.w * albedo * (1.0 - metalness) / PI * ao_texel;

    let density = frame.fog.w;
    let fog_factor = 1.0 - exp(-density * density * in.view_depth * in.view_depth);
    color = mix(color, frame.fog.rgb, saturate(fog_factor));

    return vec4<f32>(color, alpha);
}
"#;
