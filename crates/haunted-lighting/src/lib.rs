//! Light types, distance attenuation, directional and point shadow cameras,
//! and the GPU-side lighting uniform.

mod color;
mod directional;
mod point;
mod uniform;

pub use color::{Color, srgb_to_linear};
pub use directional::{DirectionalLight, DirectionalShadow};
pub use point::{NO_SHADOW_SLOT, PointLight, PointLightGpu, PointShadow, distance_attenuation};
pub use uniform::{
    AmbientLight, LightingUniform, MAX_POINT_LIGHTS, MAX_POINT_SHADOWS, PointShadowCaster,
    point_shadow_casters,
};
