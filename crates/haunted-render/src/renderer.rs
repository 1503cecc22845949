//! Scene renderer: uploads a [`Scene`] once and draws [`SceneState`] frames.

use glam::{Mat4, Vec3};
use haunted_lighting::{LightingUniform, point_shadow_casters};
use haunted_scene::{Camera, NodeId, Scene, SceneState};
use wgpu::util::DeviceExt;

use crate::blit::Blitter;
use crate::buffer::MeshBuffer;
use crate::depth::DepthBuffer;
use crate::gpu::{RenderContext, SurfaceError};
use crate::material::{GpuMaterial, MaterialContext, SamplerCache};
use crate::pass::{FrameEncoder, RenderPassBuilder, begin_depth_pass, clear_color};
use crate::shadow::{CUBE_FACES, ShadowMap, ShadowPipeline};
use crate::sky::SkyRenderer;
use crate::standard_pipeline::StandardPipeline;
use crate::surface::PhysicalSize;
use crate::texture::TextureManager;
use crate::uniforms::{FrameUniform, ObjectUniform};

/// Renderer options fixed at start-up.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RendererSettings {
    pub shadows: bool,
    pub shadow_map_size: u32,
}

impl Default for RendererSettings {
    fn default() -> Self {
        Self {
            shadows: true,
            shadow_map_size: 256,
        }
    }
}

/// One mesh node with its own object uniform.
struct DrawObject {
    node: NodeId,
    geometry: usize,
    material: usize,
    cast_shadow: bool,
    receive_shadow: bool,
    uniform_buffer: wgpu::Buffer,
    bind_group: wgpu::BindGroup,
}

/// Colour target used when the scene renders below the surface resolution.
struct OffscreenTarget {
    view: wgpu::TextureView,
}

impl OffscreenTarget {
    fn new(device: &wgpu::Device, format: wgpu::TextureFormat, size: PhysicalSize) -> Self {
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some("scene-color"),
            size: wgpu::Extent3d {
                width: size.width,
                height: size.height,
                depth_or_array_layers: 1,
            },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format,
            usage: wgpu::TextureUsages::RENDER_ATTACHMENT | wgpu::TextureUsages::TEXTURE_BINDING,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        Self { view }
    }
}

/// Draws the haunted house scene.
pub struct SceneRenderer {
    standard: StandardPipeline,
    shadow_pipeline: ShadowPipeline,
    shadow_map: ShadowMap,
    sky: SkyRenderer,
    blitter: Blitter,
    depth: DepthBuffer,
    offscreen: Option<OffscreenTarget>,
    frame_buffer: wgpu::Buffer,
    frame_bind_group: wgpu::BindGroup,
    meshes: Vec<MeshBuffer>,
    materials: Vec<GpuMaterial>,
    objects: Vec<DrawObject>,
    // Kept so later material uploads share the cache.
    textures: TextureManager,
    shadows_enabled: bool,
    sun_shadows: bool,
    point_shadows: bool,
    render_size: PhysicalSize,
    color_format: wgpu::TextureFormat,
    frames_rendered: u64,
}

impl SceneRenderer {
    /// Upload every geometry, material and mesh node of `scene`.
    pub fn new(
        ctx: &RenderContext,
        scene: &Scene,
        render_size: PhysicalSize,
        settings: RendererSettings,
    ) -> Self {
        let device = &ctx.device;
        let color_format = ctx.surface_format;

        let standard = StandardPipeline::new(device, color_format);
        let shadow_pipeline = ShadowPipeline::new(device, &standard.object_layout);
        let shadows_enabled = settings.shadows;
        let sun_shadows = shadows_enabled && scene.sun.shadow.is_some();
        let point_lights = scene.point_lights();
        let point_shadow_size = point_shadow_casters(point_lights.iter().copied())
            .map(|caster| caster.shadow.map_size)
            .max()
            .filter(|_| shadows_enabled);
        let point_shadows = point_shadow_size.is_some();
        // 1×1 maps keep group 3 bound when shadows are off.
        let shadow_size = if sun_shadows {
            settings.shadow_map_size.max(1)
        } else {
            1
        };
        let shadow_map = ShadowMap::new(
            device,
            &standard.shadow_layout,
            &shadow_pipeline,
            shadow_size,
            point_shadow_size.unwrap_or(1),
        );
        let sky = SkyRenderer::new(device, color_format);
        let mut blitter = Blitter::new(device);

        let frame_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
            label: Some("frame-uniform-buffer"),
            contents: bytemuck::bytes_of(&<FrameUniform as bytemuck::Zeroable>::zeroed()),
            usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
        });
        let frame_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
            label: Some("frame-bind-group"),
            layout: &standard.frame_layout,
            entries: &[wgpu::BindGroupEntry {
                binding: 0,
                resource: frame_buffer.as_entire_binding(),
            }],
        });

        let meshes = scene
            .geometries()
            .iter()
            .enumerate()
            .map(|(i, mesh)| MeshBuffer::upload(device, &format!("geometry{i}"), mesh))
            .collect();

        let mut textures = TextureManager::new();
        let mut samplers = SamplerCache::new();
        let materials = {
            let mut material_ctx = MaterialContext {
                device,
                queue: &ctx.queue,
                layout: &standard.material_layout,
                textures: &mut textures,
                samplers: &mut samplers,
                blitter: &mut blitter,
            };
            scene
                .materials()
                .iter()
                .map(|material| GpuMaterial::new(&mut material_ctx, material))
                .collect()
        };

        let objects = scene
            .meshes()
            .map(|(node, mesh)| {
                let name = &scene.node(node).name;
                let uniform = ObjectUniform::new(scene.world_matrix(node), mesh.receive_shadow);
                let uniform_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
                    label: Some(&format!("{name}-object-uniform")),
                    contents: bytemuck::bytes_of(&uniform),
                    usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
                });
                let bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
                    label: Some(&format!("{name}-object-bind-group")),
                    layout: &standard.object_layout,
                    entries: &[wgpu::BindGroupEntry {
                        binding: 0,
                        resource: uniform_buffer.as_entire_binding(),
                    }],
                });
                DrawObject {
                    node,
                    geometry: mesh.geometry.index(),
                    material: mesh.material.index(),
                    cast_shadow: mesh.cast_shadow,
                    receive_shadow: mesh.receive_shadow,
                    uniform_buffer,
                    bind_group,
                }
            })
            .collect::<Vec<_>>();

        let depth = DepthBuffer::new(device, "scene-depth", render_size.width, render_size.height);
        let offscreen = offscreen_for(device, color_format, render_size, ctx.size());

        log::info!(
            "Scene uploaded: {} geometries, {} materials, {} textures, {} objects, sun shadow {}, point shadows {}",
            scene.geometries().len(),
            scene.materials().len(),
            textures.len(),
            objects.len(),
            if sun_shadows { "on" } else { "off" },
            if point_shadows { "on" } else { "off" }
        );

        Self {
            standard,
            shadow_pipeline,
            shadow_map,
            sky,
            blitter,
            depth,
            offscreen,
            frame_buffer,
            frame_bind_group,
            meshes,
            materials,
            objects,
            textures,
            shadows_enabled,
            sun_shadows,
            point_shadows,
            render_size,
            color_format,
            frames_rendered: 0,
        }
    }

    /// Resize the render targets. The surface itself is resized by the caller.
    pub fn resize(&mut self, ctx: &RenderContext, render_size: PhysicalSize) {
        self.render_size = render_size;
        self.depth.resize(&ctx.device, render_size.width, render_size.height);
        self.offscreen = offscreen_for(&ctx.device, self.color_format, render_size, ctx.size());
        log::debug!(
            "Render targets resized to {}x{} (surface {:?}, offscreen {})",
            render_size.width,
            render_size.height,
            ctx.size(),
            self.offscreen.is_some()
        );
    }

    pub fn render_size(&self) -> PhysicalSize {
        self.render_size
    }

    pub fn frames_rendered(&self) -> u64 {
        self.frames_rendered
    }

    /// Number of distinct image files uploaded.
    pub fn texture_count(&self) -> usize {
        self.textures.len()
    }

    /// Draw one frame: shadow passes, then sky, opaque and transparent objects.
    ///
    /// Surface errors skip the frame and are returned for the caller to log.
    pub fn render(&mut self, ctx: &RenderContext, state: &SceneState) -> Result<(), SurfaceError> {
        let scene = &state.scene;
        self.upload_frame(ctx, state);

        let surface_texture = ctx.get_current_texture()?;
        let mut frame = FrameEncoder::new(&ctx.device, surface_texture);

        if self.sun_shadows {
            let mut pass = begin_depth_pass(&mut frame.encoder, &self.shadow_map.depth.view, "shadow-pass");
            pass.set_pipeline(&self.shadow_pipeline.pipeline);
            pass.set_bind_group(0, self.shadow_pipeline.light_bind_group(), &[]);
            self.draw_casters(&mut pass);
        }

        if self.point_shadows {
            for caster in point_shadow_casters(scene.point_lights()) {
                for face in 0..CUBE_FACES {
                    let Some((view, light)) = self.shadow_map.points.face(caster.slot, face) else {
                        continue;
                    };
                    let mut pass = begin_depth_pass(&mut frame.encoder, view, "point-shadow-pass");
                    pass.set_pipeline(&self.shadow_pipeline.cube_face_pipeline);
                    pass.set_bind_group(0, light.bind_group(), &[]);
                    self.draw_casters(&mut pass);
                }
            }
        }

        {
            let target = match &self.offscreen {
                Some(offscreen) => &offscreen.view,
                None => &frame.surface_view,
            };
            let mut pass = RenderPassBuilder::new("main-pass")
                .clear_color(clear_color(scene.fog.as_ref()))
                .begin(&mut frame.encoder, target, &self.depth);

            if scene.sky.is_some() {
                self.sky.draw(&mut pass);
            }

            pass.set_bind_group(0, &self.frame_bind_group, &[]);
            pass.set_bind_group(3, self.shadow_map.bind_group(), &[]);
            let world_positions: Vec<Vec3> = self
                .objects
                .iter()
                .map(|o| scene.world_position(o.node))
                .collect();
            let transparency: Vec<bool> = self
                .objects
                .iter()
                .map(|o| self.materials[o.material].transparent)
                .collect();
            let mut current_blend = None;
            for index in draw_order(&state.camera, &world_positions, &transparency) {
                let object = &self.objects[index];
                let material = &self.materials[object.material];
                if current_blend != Some(material.transparent) {
                    pass.set_pipeline(if material.transparent {
                        &self.standard.transparent
                    } else {
                        &self.standard.opaque
                    });
                    current_blend = Some(material.transparent);
                }
                pass.set_bind_group(1, &object.bind_group, &[]);
                pass.set_bind_group(2, &material.bind_group, &[]);
                let mesh = &self.meshes[object.geometry];
                mesh.bind(&mut pass);
                mesh.draw(&mut pass);
            }
        }

        if let Some(offscreen) = &self.offscreen {
            self.blitter.blit(
                &ctx.device,
                &mut frame.encoder,
                &offscreen.view,
                &frame.surface_view,
                self.color_format,
            );
        }

        frame.submit(&ctx.queue);
        self.frames_rendered += 1;
        Ok(())
    }

    fn draw_casters(&self, pass: &mut wgpu::RenderPass<'_>) {
        for object in self.objects.iter().filter(|o| o.cast_shadow) {
            pass.set_bind_group(1, &object.bind_group, &[]);
            let mesh = &self.meshes[object.geometry];
            mesh.bind(pass);
            mesh.draw(pass);
        }
    }

    /// Write the frame, object, shadow and sky uniforms for `state`.
    fn upload_frame(&self, ctx: &RenderContext, state: &SceneState) {
        let scene = &state.scene;
        let lighting = LightingUniform::pack(
            &scene.ambient,
            &scene.sun,
            self.shadows_enabled,
            scene.point_lights(),
        );
        let frame = FrameUniform::new(&state.camera, scene.fog.as_ref(), lighting);
        ctx.queue.write_buffer(&self.frame_buffer, 0, bytemuck::bytes_of(&frame));

        let world = scene.world_matrices();
        for object in &self.objects {
            let model = world.get(object.node.index()).copied().unwrap_or(Mat4::IDENTITY);
            let uniform = ObjectUniform::new(model, object.receive_shadow);
            ctx.queue.write_buffer(&object.uniform_buffer, 0, bytemuck::bytes_of(&uniform));
        }

        if self.sun_shadows
            && let Some(view_proj) = scene.sun.shadow_view_projection()
        {
            self.shadow_pipeline.set_light_matrix(&ctx.queue, view_proj);
        }

        if self.point_shadows {
            for caster in point_shadow_casters(scene.point_lights()) {
                let faces = caster.shadow.face_view_projections(caster.position);
                self.shadow_map.points.set_face_matrices(&ctx.queue, caster.slot, &faces);
            }
        }

        if let Some(sky) = &scene.sky {
            self.sky.update(&ctx.queue, sky, &state.camera);
        }
    }
}

/// An offscreen target is needed only when the render size differs from the surface.
fn offscreen_for(
    device: &wgpu::Device,
    format: wgpu::TextureFormat,
    render_size: PhysicalSize,
    surface_size: (u32, u32),
) -> Option<OffscreenTarget> {
    ((render_size.width, render_size.height) != surface_size)
        .then(|| OffscreenTarget::new(device, format, render_size))
}

/// Indices in draw order: opaque objects in scene order, then transparent
/// objects from farthest to nearest along the camera's view axis.
pub fn draw_order(camera: &Camera, world_positions: &[Vec3], transparent: &[bool]) -> Vec<usize> {
    let view = camera.view_matrix();
    let mut opaque = Vec::new();
    let mut blended = Vec::new();
    for (i, position) in world_positions.iter().enumerate() {
        if transparent.get(i).copied().unwrap_or(false) {
            // View space looks down -Z, so more negative is farther.
            blended.push((i, view.transform_point3(*position).z));
        } else {
            opaque.push(i);
        }
    }
    blended.sort_by(|a, b| a.1.total_cmp(&b.1));
    opaque.extend(blended.into_iter().map(|(i, _)| i));
    opaque
}

#[cfg(test)]
mod tests {
    use super::*;

    fn camera_at(position: Vec3) -> Camera {
        let mut camera = Camera::default();
        camera.position = position;
        camera.look_at(Vec3::ZERO);
        camera
    }

    #[test]
    fn test_opaque_first_in_scene_order() {
        let camera = camera_at(Vec3::new(0.0, 0.0, 10.0));
        let positions = [Vec3::ZERO, Vec3::X, Vec3::Y, Vec3::Z];
        let transparent = [true, false, true, false];
        let order = draw_order(&camera, &positions, &transparent);
        assert_eq!(&order[..2], &[1, 3]);
        assert_eq!(order.len(), 4);
    }

    #[test]
    fn test_transparent_back_to_front() {
        let camera = camera_at(Vec3::new(0.0, 1.0, 10.0));
        let positions = [
            Vec3::new(0.0, 0.0, 2.0),
            Vec3::new(0.0, 0.0, -5.0),
            Vec3::new(0.0, 0.0, 0.0),
        ];
        let order = draw_order(&camera, &positions, &[true, true, true]);
        assert_eq!(order, vec![1, 2, 0]);
    }

    #[test]
    fn test_order_follows_camera() {
        let near_door = [Vec3::new(0.0, 1.0, 2.01), Vec3::ZERO];
        let front = draw_order(&camera_at(Vec3::new(4.0, 2.0, 5.0)), &near_door, &[true, true]);
        assert_eq!(front, vec![1, 0]);
        let behind = draw_order(&camera_at(Vec3::new(0.0, 2.0, -8.0)), &near_door, &[true, true]);
        assert_eq!(behind, vec![0, 1]);
    }

    #[test]
    fn test_missing_transparency_treated_as_opaque() {
        let camera = camera_at(Vec3::new(0.0, 0.0, 10.0));
        let order = draw_order(&camera, &[Vec3::ZERO, Vec3::X], &[true]);
        assert_eq!(order, vec![1, 0]);
    }

    #[test]
    fn test_default_settings() {
        let settings = RendererSettings::default();
        assert!(settings.shadows);
        assert_eq!(settings.shadow_map_size, 256);
    }
}
