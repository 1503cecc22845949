//! Per-frame command encoding: render pass setup, submission and present.

use haunted_scene::FogExp2;

use crate::depth::{DepthBuffer, clear_attachment};

/// Clear colour when the scene has no fog.
pub const NIGHT_CLEAR: wgpu::Color = wgpu::Color::BLACK;

/// Clear colour matching the fog, so distant geometry fades into the background.
pub fn clear_color(fog: Option<&FogExp2>) -> wgpu::Color {
    fog.map_or(NIGHT_CLEAR, |fog| {
        let c = fog.color.linear();
        wgpu::Color {
            r: f64::from(c.x),
            g: f64::from(c.y),
            b: f64::from(c.z),
            a: 1.0,
        }
    })
}

/// Builder for colour+depth render passes.
#[derive(Debug, Clone, Copy)]
pub struct RenderPassBuilder {
    clear_color: wgpu::Color,
    label: &'static str,
}

impl RenderPassBuilder {
    pub fn new(label: &'static str) -> Self {
        Self {
            clear_color: NIGHT_CLEAR,
            label,
        }
    }

    pub fn clear_color(mut self, color: wgpu::Color) -> Self {
        self.clear_color = color;
        self
    }

    /// Begin a pass that clears `color` and `depth`.
    pub fn begin<'encoder>(
        &self,
        encoder: &'encoder mut wgpu::CommandEncoder,
        color: &wgpu::TextureView,
        depth: &DepthBuffer,
    ) -> wgpu::RenderPass<'encoder> {
        encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
            label: Some(self.label),
            color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                view: color,
                resolve_target: None,
                ops: wgpu::Operations {
                    load: wgpu::LoadOp::Clear(self.clear_color),
                    store: wgpu::StoreOp::Store,
                },
                depth_slice: None,
            })],
            depth_stencil_attachment: Some(depth.attachment()),
            timestamp_writes: None,
            occlusion_query_set: None,
            multiview_mask: None,
        })
    }
}

/// Begin a depth-only pass into `depth`, a single-layer depth view.
pub fn begin_depth_pass<'encoder>(
    encoder: &'encoder mut wgpu::CommandEncoder,
    depth: &wgpu::TextureView,
    label: &'static str,
) -> wgpu::RenderPass<'encoder> {
    encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
        label: Some(label),
        color_attachments: &[],
        depth_stencil_attachment: Some(clear_attachment(depth)),
        timestamp_writes: None,
        occlusion_query_set: None,
        multiview_mask: None,
    })
}

/// Command encoder and surface texture for one frame.
pub struct FrameEncoder {
    pub encoder: wgpu::CommandEncoder,
    pub surface_view: wgpu::TextureView,
    surface_texture: wgpu::SurfaceTexture,
}

impl FrameEncoder {
    pub fn new(device: &wgpu::Device, surface_texture: wgpu::SurfaceTexture) -> Self {
        let encoder = device.create_command_encoder(&wgpu::CommandEncoderDescriptor {
            label: Some("frame-encoder"),
        });
        let surface_view = surface_texture
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());
        Self {
            encoder,
            surface_view,
            surface_texture,
        }
    }

    /// Submit the recorded commands and present the surface texture.
    pub fn submit(self, queue: &wgpu::Queue) {
        queue.submit([self.encoder.finish()]);
        self.surface_texture.present();
    }
}
