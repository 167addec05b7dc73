use glam::{Mat4, Vec3};

/// Per-frame scene constants. Vectors are padded to 16 bytes for WGSL.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct SceneUniform {
    pub view_proj: [[f32; 4]; 4],
    /// Unit vector pointing toward the sun.
    pub sun_dir: [f32; 4],
    pub sun_color: [f32; 4],
    pub ambient: [f32; 4],
}

const SUN_POSITION: Vec3 = Vec3::new(-5.0, 10.0, 5.0);
const SUN_COLOR: [f32; 4] = [1.0, 1.0, 1.0, 1.0];
// 0x404040 ambient, raised so unshadowed faces stay readable.
const AMBIENT: [f32; 4] = [0.35, 0.35, 0.35, 1.0];

/// Third-person camera trailing the avatar from behind and above.
pub struct FollowCamera {
    pub eye: Vec3,
    pub target: Vec3,
    pub offset: Vec3,
    /// Fraction of the remaining distance covered per `follow` call.
    pub smoothing: f32,
    pub fov_y_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub viewport: (u32, u32),
}

impl FollowCamera {
    pub fn new(viewport_width: u32, viewport_height: u32) -> Self {
        let offset = Vec3::new(0.0, 2.0, 5.0);
        Self {
            eye: offset,
            target: Vec3::ZERO,
            offset,
            smoothing: 0.1,
            fov_y_degrees: 75.0,
            near: 0.1,
            far: 1000.0,
            viewport: (viewport_width, viewport_height),
        }
    }

    /// Eases the eye toward `target + offset` and looks at `target`.
    pub fn follow(&mut self, target: Vec3) {
        let desired = target + self.offset;
        self.eye = self.eye.lerp(desired, self.smoothing);
        self.target = target;
    }

    pub fn snap_to(&mut self, target: Vec3) {
        self.eye = target + self.offset;
        self.target = target;
    }

    pub fn aspect(&self) -> f32 {
        self.viewport.0.max(1) as f32 / self.viewport.1.max(1) as f32
    }

    pub fn view_proj(&self) -> Mat4 {
        let proj = Mat4::perspective_rh(
            self.fov_y_degrees.to_radians(),
            self.aspect(),
            self.near,
            self.far,
        );
        let view = Mat4::look_at_rh(self.eye, self.target, Vec3::Y);
        proj * view
    }

    pub fn build_uniform(&self) -> SceneUniform {
        SceneUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
            sun_dir: SUN_POSITION.normalize().extend(0.0).to_array(),
            sun_color: SUN_COLOR,
            ambient: AMBIENT,
        }
    }
}
