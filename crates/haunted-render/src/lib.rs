//! wgpu renderer for the haunted house: surface management, textured PBR
//! materials, directional and point light shadow maps, the Preetham sky, and
//! exponential fog.

pub mod blit;
pub mod buffer;
pub mod depth;
pub mod gpu;
pub mod material;
pub mod pass;
pub mod renderer;
pub mod shadow;
pub mod sky;
pub mod standard_pipeline;
pub mod surface;
pub mod texture;
pub mod uniforms;

pub use blit::Blitter;
pub use buffer::{MeshBuffer, VertexPositionNormalUv, interleave};
pub use depth::DepthBuffer;
pub use gpu::{RenderContext, RenderContextError, SurfaceError, init_render_context_blocking};
pub use material::{GpuMaterial, MaterialContext, SamplerCache};
pub use pass::{FrameEncoder, NIGHT_CLEAR, RenderPassBuilder, clear_color};
pub use renderer::{RendererSettings, SceneRenderer, draw_order};
pub use shadow::{LightMatrixBinding, PointShadowMaps, ShadowMap, ShadowPipeline};
pub use sky::{SkyRenderer, SkyUniform};
pub use standard_pipeline::StandardPipeline;
pub use surface::{PhysicalSize, SurfaceResizeEvent, SurfaceWrapper};
pub use texture::{GpuTexture, TextureError, TextureManager};
pub use uniforms::{FrameUniform, MaterialUniform, ObjectUniform};
