//! Builds the per-frame triangle list from the environment and world state.
//!
//! Scenery never changes, so it is tessellated once. Boxes and the avatar are
//! re-appended every frame. Clouds go last because they are translucent.

use glam::{Mat4, Quat, Vec3};
use mh_render::CpuMesh;
use mh_sim::{Environment, World};

use crate::feedback::CollectFeedback;

pub const SKY: [f32; 4] = hex_srgb(0x87ceeb, 1.0);
pub const GROUND: [f32; 4] = hex_srgb(0x4a7c59, 1.0);
pub const COLLECTED: [f32; 4] = hex_srgb(0x808080, 1.0);
pub const SKIN: [f32; 4] = hex_srgb(0xffdbac, 1.0);
const CLOUD: [f32; 4] = [1.0, 1.0, 1.0, 0.8];

const MOUNTAIN_HUE: f32 = 0.3;
const MOUNTAIN_SATURATION: f32 = 0.3;
const BOX_SATURATION: f32 = 0.8;
const BOX_LIGHTNESS: f32 = 0.6;

/// 0xRRGGBB to sRGB-encoded floats.
pub const fn hex_srgb(hex: u32, alpha: f32) -> [f32; 4] {
    [
        ((hex >> 16) & 0xff) as f32 / 255.0,
        ((hex >> 8) & 0xff) as f32 / 255.0,
        (hex & 0xff) as f32 / 255.0,
        alpha,
    ]
}

/// HSL with every channel in [0, 1] to sRGB-encoded RGB.
pub fn hsl(h: f32, s: f32, l: f32) -> [f32; 4] {
    if s <= 0.0 {
        return [l, l, l, 1.0];
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let channel = |t: f32| {
        let t = t.rem_euclid(1.0);
        if t < 1.0 / 6.0 {
            p + (q - p) * 6.0 * t
        } else if t < 0.5 {
            q
        } else if t < 2.0 / 3.0 {
            p + (q - p) * (2.0 / 3.0 - t) * 6.0
        } else {
            p
        }
    };
    [channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0), 1.0]
}

/// Decodes sRGB color channels for a linear (sRGB-format) render target.
pub fn to_linear(color: [f32; 4]) -> [f32; 4] {
    let decode = |c: f32| {
        if c <= 0.04045 {
            c / 12.92
        } else {
            ((c + 0.055) / 1.055).powf(2.4)
        }
    };
    [decode(color[0]), decode(color[1]), decode(color[2]), color[3]]
}

pub fn clear_color() -> wgpu::Color {
    let [r, g, b, a] = to_linear(SKY);
    wgpu::Color {
        r: r as f64,
        g: g as f64,
        b: b as f64,
        a: a as f64,
    }
}

pub struct SceneMeshBuilder {
    scenery: CpuMesh,
    clouds: CpuMesh,
    unit_cube: CpuMesh,
}

impl SceneMeshBuilder {
    pub fn new(env: &Environment) -> Self {
        let mut scenery = CpuMesh::new();
        scenery.append_transformed(
            &CpuMesh::plane(env.ground_size, to_linear(GROUND)),
            Mat4::from_translation(Vec3::new(0.0, env.ground_y, 0.0)),
            None,
        );
        for mountain in &env.mountains {
            let color = to_linear(hsl(MOUNTAIN_HUE, MOUNTAIN_SATURATION, mountain.lightness));
            let cone = CpuMesh::cone(mountain.radius, mountain.height, 8, color);
            let transform = Mat4::from_rotation_translation(
                Quat::from_rotation_y(mountain.yaw),
                mountain.base,
            );
            scenery.append_transformed(&cone, transform, None);
        }

        let mut clouds = CpuMesh::new();
        let sphere = CpuMesh::uv_sphere(1.0, 8, 12, CLOUD);
        for cloud in &env.clouds {
            let transform = Mat4::from_scale_rotation_translation(
                Vec3::splat(cloud.radius),
                Quat::IDENTITY,
                cloud.center,
            );
            clouds.append_transformed(&sphere, transform, None);
        }

        Self {
            scenery,
            clouds,
            unit_cube: CpuMesh::cuboid(Vec3::ONE, [1.0; 4]),
        }
    }

    /// Rebuilds `out` for the current frame. `avatar_mesh` is `None` while
    /// the model is still loading.
    pub fn build(
        &self,
        world: &World,
        avatar_mesh: Option<&CpuMesh>,
        feedback: &CollectFeedback,
        out: &mut CpuMesh,
    ) {
        out.clear();
        out.append_transformed(&self.scenery, Mat4::IDENTITY, None);

        for entity in world.collectibles() {
            let color = if entity.is_collected() {
                COLLECTED
            } else {
                hsl(entity.hue, BOX_SATURATION, BOX_LIGHTNESS)
            };
            let edge = entity.size * feedback.scale(entity.id);
            let transform = Mat4::from_scale_rotation_translation(
                Vec3::splat(edge),
                Quat::IDENTITY,
                entity.position,
            );
            out.append_transformed(&self.unit_cube, transform, Some(to_linear(color)));
        }

        if let (Some(avatar), Some(mesh)) = (world.avatar(), avatar_mesh) {
            out.append_transformed(mesh, Mat4::from_translation(avatar.position), None);
        }

        out.append_transformed(&self.clouds, Mat4::IDENTITY, None);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mh_sim::{EnvironmentConfig, MotionConfig, MoveInput, WindState};

    fn close(a: [f32; 4], b: [f32; 4]) -> bool {
        a.iter().zip(b.iter()).all(|(x, y)| (x - y).abs() < 1e-3)
    }

    #[test]
    fn hsl_primaries_and_grays() {
        assert!(close(hsl(0.0, 1.0, 0.5), [1.0, 0.0, 0.0, 1.0]));
        assert!(close(hsl(1.0 / 3.0, 1.0, 0.5), [0.0, 1.0, 0.0, 1.0]));
        assert!(close(hsl(2.0 / 3.0, 1.0, 0.5), [0.0, 0.0, 1.0, 1.0]));
        assert!(close(hsl(0.7, 0.0, 0.25), [0.25, 0.25, 0.25, 1.0]));
    }

    #[test]
    fn hex_and_linear_conversion() {
        assert!(close(hex_srgb(0xffffff, 1.0), [1.0; 4]));
        assert!(close(hex_srgb(0x808080, 0.5), [0.502, 0.502, 0.502, 0.5]));
        assert!(close(to_linear(COLLECTED), [0.2159, 0.2159, 0.2159, 1.0]));
        assert!(close(to_linear([0.0, 1.0, 0.0, 0.8]), [0.0, 1.0, 0.0, 0.8]));
    }

    fn small_env() -> Environment {
        let config = EnvironmentConfig {
            collectible_count: 3,
            mountain_count: 2,
            cloud_count: 1,
            ..EnvironmentConfig::default()
        };
        Environment::generate(&config, &MotionConfig::default())
    }

    #[test]
    fn frame_mesh_contains_every_part() {
        let env = small_env();
        let builder = SceneMeshBuilder::new(&env);
        let mut world = World::new(MotionConfig::default(), env.collectibles.clone());
        let mut out = CpuMesh::new();

        builder.build(&world, None, &CollectFeedback::new(), &mut out);
        let without_avatar = out.indices.len();
        // ground + 2 cones + 3 boxes + 1 sphere
        assert_eq!(without_avatar, 6 + 2 * 48 + 3 * 36 + 8 * 12 * 6);

        world.spawn_avatar();
        world.step(1.0 / 60.0, MoveInput::IDLE, WindState::CALM);
        let avatar_mesh = CpuMesh::cuboid(Vec3::new(0.18, 0.18, 0.07), SKIN);
        builder.build(&world, Some(&avatar_mesh), &CollectFeedback::new(), &mut out);
        assert_eq!(out.indices.len(), without_avatar + 36);
        assert!(out
            .indices
            .iter()
            .all(|i| (*i as usize) < out.vertices.len()));
    }

    #[test]
    fn pulsing_box_is_scaled_up() {
        let env = small_env();
        let builder = SceneMeshBuilder::new(&env);
        let world = World::new(MotionConfig::default(), env.collectibles.clone());
        let first = &env.collectibles[0];

        let mut feedback = CollectFeedback::new();
        feedback.trigger(&mh_sim::CollectionEvent {
            id: first.id,
            points: first.points,
            position: first.position,
        });
        let mut out = CpuMesh::new();
        builder.build(&world, None, &feedback, &mut out);

        // The first box's 24 vertices follow the scenery.
        let start = builder.scenery.vertices.len();
        let xs: Vec<f32> = out.vertices[start..start + 24]
            .iter()
            .map(|v| v.position[0])
            .collect();
        let width = xs.iter().cloned().fold(f32::MIN, f32::max)
            - xs.iter().cloned().fold(f32::MAX, f32::min);
        assert!((width - first.size * 1.2).abs() < 1e-5);
    }
}
