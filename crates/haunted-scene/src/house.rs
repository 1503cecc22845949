//! Builds the haunted house scene: floor, house, bushes, graves, lights, fog, and sky.

use std::f32::consts::{FRAC_PI_2, FRAC_PI_4};
use std::path::Path;

use glam::Vec3;
use haunted_config::Config;
use haunted_lighting::{
    AmbientLight, Color, DirectionalLight, DirectionalShadow, PointLight, PointShadow,
};
use rand::Rng;
use tracing::{debug, info};

use crate::camera::Camera;
use crate::environment::{FogExp2, Sky};
use crate::flicker::Flicker;
use crate::frame::{GhostLight, SceneState};
use crate::geometry::MeshData;
use crate::ghost::GHOST_ORBITS;
use crate::graph::{GeometryId, MaterialId, MeshNode, Scene, Transform};
use crate::graves::scatter_graves;
use crate::material::{StandardMaterial, WrapMode};

const MOONLIGHT: u32 = 0x86cdff;
const DOOR_LIGHT_COLOR: u32 = 0xff7d46;
const GHOST_COLORS: [u32; 3] = [0xff00ff, 0x00ffff, 0xffff00];
const GHOST_INTENSITY: f32 = 2.0;
const GHOST_CUTOFF: f32 = 3.0;
const GHOST_SHADOW_NEAR: f32 = 0.5;
const GHOST_SHADOW_FAR: f32 = 10.0;
const FOG_COLOR: u32 = 0x02343f;

const WALL_HEIGHT: f32 = 2.5;
const ROOF_HEIGHT: f32 = 1.5;

/// Bush scale and position pairs, relative to the house.
const BUSHES: [(f32, Vec3); 4] = [
    (0.5, Vec3::new(0.8, 0.2, 2.2)),
    (0.25, Vec3::new(1.4, 0.1, 2.1)),
    (0.4, Vec3::new(-0.8, 0.1, 2.2)),
    (0.15, Vec3::new(-1.0, 0.05, 2.6)),
];

fn mesh(geometry: GeometryId, material: MaterialId) -> MeshNode {
    MeshNode {
        geometry,
        material,
        cast_shadow: false,
        receive_shadow: false,
    }
}

/// A diffuse + ARM + normal material from one texture set directory.
fn textured(name: &str, assets: &Path, dir: &str, stem: &str) -> StandardMaterial {
    let file = |suffix: &str| assets.join(dir).join(format!("{stem}_{suffix}_1k.webp"));
    StandardMaterial::new(name)
        .with_color_map(file("diff"))
        .with_arm_map(file("arm"))
        .with_normal_map(file("nor_gl"))
}

/// Build the complete scene from `config`. `rng` drives grave placement.
pub fn build_haunted_house<R: Rng + ?Sized>(config: &Config, rng: &mut R) -> SceneState {
    let assets = config.scene.assets_dir.as_path();

    let moonlight = Color::from_srgb_hex(MOONLIGHT);
    let mut sun = DirectionalLight::new(moonlight, 1.0, Vec3::new(3.0, 2.0, -8.0));
    if config.render.shadows {
        sun = sun.with_shadow(DirectionalShadow::square(
            config.render.shadow_map_size,
            8.0,
            1.0,
            20.0,
        ));
    }
    let mut scene = Scene::new(AmbientLight::new(moonlight, 0.275), sun);

    // Floor
    let floor_dir = "floor/coast_sand_rocks_02_1k";
    let floor_material = textured("floor", assets, floor_dir, "coast_sand_rocks_02")
        .with_alpha_map(assets.join("floor/alpha.webp"))
        .with_displacement_map(
            assets.join(floor_dir).join("coast_sand_rocks_02_disp_1k.webp"),
            config.scene.floor_displacement_scale,
            config.scene.floor_displacement_bias,
        )
        .with_repeat(8.0, 8.0, WrapMode::Repeat, WrapMode::Repeat);
    let floor_geometry = scene.add_geometry(MeshData::plane(20.0, 20.0, 100, 100));
    let floor_material = scene.add_material(floor_material);
    scene.add_mesh(
        "floor",
        Transform::IDENTITY.with_rotation(Vec3::new(-FRAC_PI_2, 0.0, 0.0)),
        None,
        MeshNode {
            receive_shadow: true,
            ..mesh(floor_geometry, floor_material)
        },
    );

    let house = scene.add_group("house", Transform::IDENTITY, None);

    // Walls
    let walls_geometry = scene.add_geometry(MeshData::cuboid(4.0, WALL_HEIGHT, 4.0));
    let walls_material = scene.add_material(textured("walls", assets, "wall/brick_4_1k", "brick_4"));
    scene.add_mesh(
        "walls",
        Transform::from_translation(Vec3::new(0.0, WALL_HEIGHT / 2.0, 0.0)),
        Some(house),
        MeshNode {
            cast_shadow: true,
            receive_shadow: true,
            ..mesh(walls_geometry, walls_material)
        },
    );

    // Roof
    let roof_geometry = scene.add_geometry(MeshData::cone(3.5, ROOF_HEIGHT, 4));
    let roof_material = textured("roof", assets, "roof/roof_slates_02_1k", "roof_slates_02")
        .with_repeat(3.0, 1.0, WrapMode::Repeat, WrapMode::ClampToEdge);
    let roof_material = scene.add_material(roof_material);
    scene.add_mesh(
        "roof",
        Transform::from_translation(Vec3::new(0.0, WALL_HEIGHT + ROOF_HEIGHT / 2.0, 0.0))
            .with_rotation(Vec3::new(0.0, FRAC_PI_4, 0.0)),
        Some(house),
        MeshNode {
            cast_shadow: true,
            ..mesh(roof_geometry, roof_material)
        },
    );

    // Door
    let door_file = |name: &str| assets.join("door").join(format!("{name}.webp"));
    let door_material = StandardMaterial::new("door")
        .with_alpha_map(door_file("alpha"))
        .with_color_map(door_file("color"))
        .with_ao_map(door_file("ambientOcclusion"))
        .with_roughness_map(door_file("roughness"))
        .with_metalness_map(door_file("metalness"))
        .with_normal_map(door_file("normal"))
        .with_displacement_map(door_file("height"), 0.15, -0.04);
    let door_geometry = scene.add_geometry(MeshData::plane(2.2, 2.2, 100, 100));
    let door_material = scene.add_material(door_material);
    scene.add_mesh(
        "door",
        Transform::from_translation(Vec3::new(0.0, 1.0, 2.0 + 0.01)),
        Some(house),
        mesh(door_geometry, door_material),
    );

    // Bushes
    let bush_geometry = scene.add_geometry(MeshData::sphere(1.0, 16, 16));
    let bush_material = textured("bush", assets, "bush/forest_leaves_03_1k", "forest_leaves_03")
        .with_color(Color::from_srgb_hex(0xccff00))
        .with_repeat(2.0, 1.0, WrapMode::Repeat, WrapMode::ClampToEdge);
    let bush_material = scene.add_material(bush_material);
    for (i, (scale, position)) in BUSHES.into_iter().enumerate() {
        scene.add_mesh(
            format!("bush{}", i + 1),
            Transform::from_translation(position).with_uniform_scale(scale),
            Some(house),
            mesh(bush_geometry, bush_material),
        );
    }

    let door_light = scene.add_point_light(
        "door_light",
        Vec3::new(0.0, 2.2, 2.5),
        Some(house),
        PointLight::new(
            Color::from_srgb_hex(DOOR_LIGHT_COLOR),
            config.scene.door_light_intensity,
        ),
    );

    // Graves
    let graves = scene.add_group("graves", Transform::IDENTITY, None);
    let grave_geometry = scene.add_geometry(MeshData::cuboid(0.6, 0.8, 0.2));
    let grave_material = textured(
        "grave",
        assets,
        "grave/plastered_stone_wall_1k",
        "plastered_stone_wall",
    )
    .with_repeat(0.3, 0.4, WrapMode::ClampToEdge, WrapMode::ClampToEdge);
    let grave_material = scene.add_material(grave_material);
    let placements = scatter_graves(config.scene.grave_count, rng);
    for (i, grave) in placements.iter().enumerate() {
        scene.add_mesh(
            format!("grave{i}"),
            Transform::from_translation(grave.position).with_rotation(grave.rotation),
            Some(graves),
            MeshNode {
                cast_shadow: true,
                receive_shadow: true,
                ..mesh(grave_geometry, grave_material)
            },
        );
    }
    debug!(count = placements.len(), "graves placed");

    // Ghosts
    let ghosts = GHOST_ORBITS
        .iter()
        .zip(GHOST_COLORS)
        .enumerate()
        .map(|(i, (orbit, color))| {
            let mut light = PointLight::new(Color::from_srgb_hex(color), GHOST_INTENSITY)
                .with_distance(GHOST_CUTOFF);
            if config.render.shadows {
                light = light.with_shadow(PointShadow::new(
                    config.render.shadow_map_size,
                    GHOST_SHADOW_NEAR,
                    GHOST_SHADOW_FAR,
                ));
            }
            GhostLight {
                node: scene.add_point_light(format!("ghost{}", i + 1), orbit.position(0.0), None, light),
                orbit: *orbit,
            }
        })
        .collect();

    scene.fog = Some(FogExp2::new(
        Color::from_srgb_hex(FOG_COLOR),
        config.scene.fog_density,
    ));
    scene.sky = Some(Sky {
        turbidity: 10.0,
        rayleigh: 3.0,
        mie_coefficient: 0.1,
        mie_directional_g: 0.95,
        sun_position: Vec3::new(0.3, -0.038, -0.95),
        up: Vec3::Y,
    });

    let camera_config = &config.camera;
    let aspect_ratio = config.window.width.max(1) as f32 / config.window.height.max(1) as f32;
    let mut camera = Camera::perspective(
        Vec3::from_array(camera_config.position),
        camera_config.fov_y_degrees.to_radians(),
        aspect_ratio,
        camera_config.near,
        camera_config.far,
    );
    camera.look_at(Vec3::ZERO);

    info!(
        nodes = scene.len(),
        meshes = scene.meshes().count(),
        materials = scene.materials().len(),
        "haunted house built"
    );

    SceneState {
        scene,
        camera,
        ghosts,
        door_light,
        flicker: Flicker::default(),
        elapsed: 0.0,
    }
}
