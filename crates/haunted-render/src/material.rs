//! GPU-side materials: uniform, texture set and samplers per
//! [`StandardMaterial`].

use std::collections::HashMap;
use std::sync::Arc;

use haunted_scene::{StandardMaterial, TextureSlot, WrapMode};
use wgpu::util::DeviceExt;

use crate::blit::Blitter;
use crate::texture::{GpuTexture, TextureManager};
use crate::uniforms::MaterialUniform;

fn address_mode(wrap: WrapMode) -> wgpu::AddressMode {
    match wrap {
        WrapMode::Repeat => wgpu::AddressMode::Repeat,
        WrapMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
    }
}

/// Trilinear samplers keyed by their U/V addressing.
#[derive(Default)]
pub struct SamplerCache {
    samplers: HashMap<[WrapMode; 2], wgpu::Sampler>,
}

impl SamplerCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get or create the sampler for `wrap`.
    pub fn get(&mut self, device: &wgpu::Device, wrap: [WrapMode; 2]) -> wgpu::Sampler {
        self.samplers
            .entry(wrap)
            .or_insert_with(|| {
                device.create_sampler(&wgpu::SamplerDescriptor {
                    label: Some("material-sampler"),
                    address_mode_u: address_mode(wrap[0]),
                    address_mode_v: address_mode(wrap[1]),
                    mag_filter: wgpu::FilterMode::Linear,
                    min_filter: wgpu::FilterMode::Linear,
                    mipmap_filter: wgpu::MipmapFilterMode::Linear,
                    ..Default::default()
                })
            })
            .clone()
    }

    pub fn len(&self) -> usize {
        self.samplers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samplers.is_empty()
    }
}

/// A material ready to bind at group 2 of the standard pipeline.
pub struct GpuMaterial {
    pub name: String,
    pub transparent: bool,
    pub uniform_buffer: wgpu::Buffer,
    pub bind_group: wgpu::BindGroup,
    /// Kept alive for the bind group, in [`TextureSlot::ALL`] order.
    pub textures: Vec<Arc<GpuTexture>>,
}

/// Shared state needed to turn scene materials into GPU materials.
pub struct MaterialContext<'a> {
    pub device: &'a wgpu::Device,
    pub queue: &'a wgpu::Queue,
    pub layout: &'a wgpu::BindGroupLayout,
    pub textures: &'a mut TextureManager,
    pub samplers: &'a mut SamplerCache,
    pub blitter: &'a mut Blitter,
}

impl GpuMaterial {
    pub fn new(ctx: &mut MaterialContext<'_>, material: &StandardMaterial) -> Self {
        let uniform = MaterialUniform::new(material);
        let uniform_buffer = ctx.device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some(&format!("{}-material-uniform", material.name)),
            contents: bytemuck::bytes_of(&uniform),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });

        let textures: Vec<Arc<GpuTexture>> = TextureSlot::ALL
            .iter()
            .map(|&slot| {
                ctx.textures
                    .load_slot(ctx.device, ctx.queue, ctx.blitter, material.texture(slot), slot)
            })
            .collect();

        let detail_sampler = ctx.samplers.get(ctx.device, material.wrap);
        // The alpha map is never repeated.
        let alpha_sampler = ctx.samplers.get(ctx.device, [WrapMode::ClampToEdge; 2]);

        let mut entries = vec![wgpu::BindGroupEntry {
            binding: 0,
            resource: uniform_buffer.as_entire_binding(),
        }];
        for (i, texture) in textures.iter().enumerate() {
            entries.push(wgpu::BindGroupEntry {
                binding: i as u32 + 1,
                resource: wgpu::BindingResource::TextureView(&texture.view),
            });
        }
        entries.push(wgpu::BindGroupEntry {
            binding: 8,
            resource: wgpu::BindingResource::Sampler(&detail_sampler),
        });
        entries.push(wgpu::BindGroupEntry {
            binding: 9,
            resource: wgpu::BindingResource::Sampler(&alpha_sampler),
        });

        let bind_group = ctx.device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some(&format!("{}-material-bind-group", material.name)),
            layout: ctx.layout,
            entries: &entries,
        });

        log::debug!(
            "Material '{}' ready ({})",
            material.name,
            if material.transparent { "transparent" } else { "opaque" }
        );

        Self {
            name: material.name.clone(),
            transparent: material.transparent,
            uniform_buffer,
            bind_group,
            textures,
        }
    }
}
