//! Uniform blocks shared between the CPU and the scene shaders.

use bytemuck::{Pod, Zeroable};
use glam::{Mat3, Mat4};
use haunted_lighting::LightingUniform;
use haunted_scene::{Camera, FogExp2, StandardMaterial};

/// Per-frame data bound at group 0 of the standard pipeline, 688 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, Pod, Zeroable)]
pub struct FrameUniform {
    pub view_proj: [f32; 16],
    pub view: [f32; 16],
    /// xyz = camera position, w unused.
    pub camera_position: [f32; 4],
    /// rgb = linear fog colour, w = density. Density 0 disables fog.
    pub fog: [f32; 4],
    pub lighting: LightingUniform,
}

impl FrameUniform {
    pub fn new(camera: &Camera, fog: Option<&FogExp2>, lighting: LightingUniform) -> Self {
        let fog = fog.map_or([0.0; 4], |fog| fog.color.with_intensity(fog.density));
        Self {
            view_proj: camera.view_projection_matrix().to_cols_array(),
            view: camera.view_matrix().to_cols_array(),
            camera_position: camera.position.extend(1.0).to_array(),
            fog,
            lighting,
        }
    }
}

/// Per-object data bound at group 1, 144 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct ObjectUniform {
    pub model: [f32; 16],
    /// Inverse-transpose of the model matrix, padded to a mat4.
    pub normal_matrix: [f32; 16],
    /// x = receives shadows.
    pub flags: [f32; 4],
}

impl ObjectUniform {
    pub fn new(model: Mat4, receive_shadow: bool) -> Self {
        let normal = Mat3::from_mat4(model).inverse().transpose();
        Self {
            model: model.to_cols_array(),
            normal_matrix: Mat4::from_mat3(normal).to_cols_array(),
            flags: [f32::from(u8::from(receive_shadow)), 0.0, 0.0, 0.0],
        }
    }
}

/// Material factors bound at group 2, 64 bytes.
#[repr(C)]
#[derive(Clone, Copy, Debug, PartialEq, Pod, Zeroable)]
pub struct MaterialUniform {
    /// rgb = linear base colour, w = roughness.
    pub color_roughness: [f32; 4],
    /// x = metalness, y = displacement scale, z = displacement bias.
    pub surface: [f32; 4],
    /// xy = UV repeat for the detail maps.
    pub uv_repeat: [f32; 4],
    /// x = has normal map, y = has displacement map, z = has alpha map.
    pub flags: [f32; 4],
}

impl MaterialUniform {
    pub fn new(material: &StandardMaterial) -> Self {
        let flag = |present: bool| f32::from(u8::from(present));
        Self {
            color_roughness: material.color.with_intensity(material.roughness),
            surface: [
                material.metalness,
                material.displacement_scale,
                material.displacement_bias,
                0.0,
            ],
            uv_repeat: [material.uv_repeat.x, material.uv_repeat.y, 0.0, 0.0],
            flags: [
                flag(material.normal_map.is_some()),
                flag(material.displacement_map.is_some()),
                flag(material.alpha_map.is_some()),
                0.0,
            ],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::{Quat, Vec3};
    use haunted_lighting::{AmbientLight, Color, DirectionalLight};

    fn lighting() -> LightingUniform {
        let sun = DirectionalLight::new(Color::WHITE, 1.0, Vec3::new(3.0, 2.0, -8.0));
        LightingUniform::pack(&AmbientLight::default(), &sun, false, Vec::new())
    }

    #[test]
    fn test_layouts_match_shader() {
        assert_eq!(std::mem::size_of::<FrameUniform>(), 688);
        assert_eq!(std::mem::offset_of!(FrameUniform, camera_position), 128);
        assert_eq!(std::mem::offset_of!(FrameUniform, fog), 144);
        assert_eq!(std::mem::offset_of!(FrameUniform, lighting), 160);
        assert_eq!(std::mem::size_of::<ObjectUniform>(), 144);
        assert_eq!(std::mem::size_of::<MaterialUniform>(), 64);
    }

    #[test]
    fn test_missing_fog_has_zero_density() {
        let camera = Camera::default();
        let frame = FrameUniform::new(&camera, None, lighting());
        assert_eq!(frame.fog[3], 0.0);

        let fog = FogExp2::new(Color::from_srgb_hex(0x02343f), 0.1);
        let frame = FrameUniform::new(&camera, Some(&fog), lighting());
        assert!((frame.fog[3] - 0.1).abs() < 1e-6);
        assert!(frame.fog[2] > frame.fog[0]);
    }

    #[test]
    fn test_normal_matrix_undoes_non_uniform_scale() {
        let model = Mat4::from_scale_rotation_translation(
            Vec3::new(2.0, 1.0, 1.0),
            Quat::IDENTITY,
            Vec3::new(5.0, 0.0, 0.0),
        );
        let object = ObjectUniform::new(model, true);
        let normal = Mat4::from_cols_array(&object.normal_matrix);
        let n = normal.transform_vector3(Vec3::X);
        assert!((n.x - 0.5).abs() < 1e-6);
        assert_eq!(object.flags[0], 1.0);
        assert_eq!(ObjectUniform::new(Mat4::IDENTITY, false).flags[0], 0.0);
    }

    #[test]
    fn test_material_flags() {
        let plain = MaterialUniform::new(&StandardMaterial::new("plain"));
        assert_eq!(plain.flags, [0.0; 4]);
        assert_eq!(plain.color_roughness, [1.0, 1.0, 1.0, 1.0]);

        let floor = StandardMaterial::new("floor")
            .with_alpha_map("alpha.webp")
            .with_displacement_map("disp.webp", 0.3, -0.2);
        let uniform = MaterialUniform::new(&floor);
        assert_eq!(uniform.flags, [0.0, 1.0, 1.0, 0.0]);
        assert_eq!(uniform.surface, [0.0, 0.3, -0.2, 0.0]);
    }
}
