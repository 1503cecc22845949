//! Reverse-Z depth targets.
//!
//! The near plane maps to 1.0 and the far plane to 0.0, so targets clear to
//! 0.0 and closer fragments win with `GreaterEqual`. The camera, the shadow
//! camera and every pipeline here follow the same convention.

/// A depth texture usable as a render attachment and, optionally, for sampling.
pub struct DepthBuffer {
    pub texture: wgpu::Texture,
    pub view: wgpu::TextureView,
    label: &'static str,
    width: u32,
    height: u32,
}

impl DepthBuffer {
    /// 32-bit float depth format for maximum precision with reverse-Z.
    pub const FORMAT: wgpu::TextureFormat = wgpu::TextureFormat::Depth32Float;

    /// Reverse-Z clear value: 0.0 represents the far plane.
    pub const CLEAR_VALUE: f32 = 0.0;

    /// Reverse-Z depth comparison: closer objects have higher depth values.
    pub const COMPARE_FUNCTION: wgpu::CompareFunction = wgpu::CompareFunction::GreaterEqual;

    /// Zero dimensions are clamped to 1.
    pub fn new(device: &wgpu::Device, label: &'static str, width: u32, height: u32) -> Self {
        let width = width.max(1);
        let height = height.max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d {
                width,
                height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: Self::FORMAT,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());

        Self {
            texture,
            view,
            label,
            width,
            height,
        }
    }

    /// Recreate the texture at a new size. Returns whether anything changed.
    pub fn resize(&mut self, device: &wgpu::Device, width: u32, height: u32) -> bool {
        if self.width == width.max(1) && self.height == height.max(1) {
            return false;
        }
        *self = Self::new(device, self.label, width, height);
        true
    }

    /// Attachment that clears to the far plane and keeps the result.
    pub fn attachment(&self) -> wgpu::RenderPassDepthStencilAttachment<'_> {
        clear_attachment(&self.view)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

/// Attachment for any [`DepthBuffer::FORMAT`] view, such as one layer of a
/// shadow texture, cleared to the far plane.
pub fn clear_attachment(view: &wgpu::TextureView) -> wgpu::RenderPassDepthStencilAttachment<'_> {
    wgpu::RenderPassDepthStencilAttachment {
        view,
        depth_ops: Some(wgpu::Operations {
            load: wgpu::LoadOp::Clear(DepthBuffer::CLEAR_VALUE),
            store: wgpu::StoreOp::Store,
        }),
        stencil_ops: None,
    }
}

/// Depth state for pipelines drawing into a [`DepthBuffer`].
pub fn depth_state(write: bool, compare: wgpu::CompareFunction) -> wgpu::DepthStencilState {
    wgpu::DepthStencilState {
        format: DepthBuffer::FORMAT,
        depth_write_enabled: write,
        depth_compare: compare,
        stencil: wgpu::StencilState::default(),
        bias: wgpu::DepthBiasState::default(),
    }
}
