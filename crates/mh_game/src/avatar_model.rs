//! Avatar mesh loading. The glTF import runs on a worker thread; until it
//! reports back the world has no avatar and does not step.

use std::path::{Path, PathBuf};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use glam::{Mat4, Vec3};
use gltf::mesh::util::ReadIndices;
use mh_render::CpuMesh;
use mh_sim::Aabb3;

use crate::scene_mesh::{to_linear, SKIN};

#[derive(Debug, Clone, PartialEq)]
pub enum ModelSource {
    File(PathBuf),
    Fallback,
}

#[derive(Debug, Clone)]
pub struct AvatarModel {
    /// Centered on the origin; the scene builder moves it to the avatar.
    pub mesh: CpuMesh,
    pub source: ModelSource,
}

impl AvatarModel {
    pub fn fallback(size: Vec3) -> Self {
        Self {
            mesh: fallback_model(size),
            source: ModelSource::Fallback,
        }
    }

    /// Keeps the fallback box matching the physical avatar after a size
    /// change. Imported meshes are left alone. Returns true when rebuilt.
    pub fn refit_fallback(&mut self, size: Vec3) -> bool {
        if self.source != ModelSource::Fallback {
            return false;
        }
        self.mesh = fallback_model(size);
        true
    }

    pub fn source_label(&self) -> String {
        match &self.source {
            ModelSource::File(path) => path.display().to_string(),
            ModelSource::Fallback => "fallback box".to_string(),
        }
    }
}

/// Skin-colored box with the avatar's physical dimensions.
pub fn fallback_model(size: Vec3) -> CpuMesh {
    CpuMesh::cuboid(size, to_linear(SKIN))
}

/// Imports every mesh reachable from the default scene, bakes node
/// transforms, and recenters the result on its bounding-box center.
pub fn load_gltf_model(path: &Path) -> Result<CpuMesh, String> {
    let (document, buffers, _images) = gltf::import(path)
        .map_err(|e| format!("Failed to import glTF {}: {e}", path.display()))?;

    let mut mesh = CpuMesh::new();
    match document.default_scene().or_else(|| document.scenes().next()) {
        Some(scene) => {
            for node in scene.nodes() {
                append_node(&node, Mat4::IDENTITY, &buffers, &mut mesh);
            }
        }
        None => {
            for gltf_mesh in document.meshes() {
                append_mesh(&gltf_mesh, Mat4::IDENTITY, &buffers, &mut mesh);
            }
        }
    }

    if mesh.is_empty() {
        return Err(format!("glTF {} contains no triangles", path.display()));
    }
    recenter(&mut mesh);
    Ok(mesh)
}

/// Loads `path`, substituting the fallback box on any failure.
pub fn load_avatar_model(path: &Path, size: Vec3) -> AvatarModel {
    match load_gltf_model(path) {
        Ok(mesh) => {
            log::info!(
                "Avatar model '{}' loaded ({} triangles)",
                path.display(),
                mesh.indices.len() / 3
            );
            AvatarModel {
                mesh,
                source: ModelSource::File(path.to_path_buf()),
            }
        }
        Err(err) => {
            log::error!("{err}. Using fallback box.");
            AvatarModel::fallback(size)
        }
    }
}

fn append_node(node: &gltf::Node, parent: Mat4, buffers: &[gltf::buffer::Data], out: &mut CpuMesh) {
    let world = parent * Mat4::from_cols_array_2d(&node.transform().matrix());
    if let Some(gltf_mesh) = node.mesh() {
        append_mesh(&gltf_mesh, world, buffers, out);
    }
    for child in node.children() {
        append_node(&child, world, buffers, out);
    }
}

fn append_mesh(
    gltf_mesh: &gltf::Mesh,
    transform: Mat4,
    buffers: &[gltf::buffer::Data],
    out: &mut CpuMesh,
) {
    for primitive in gltf_mesh.primitives() {
        if primitive.mode() != gltf::mesh::Mode::Triangles {
            log::warn!("Skipping non-triangle primitive in mesh {:?}", gltf_mesh.name());
            continue;
        }
        let reader = primitive.reader(|b| buffers.get(b.index()).map(|data| data.0.as_slice()));
        let Some(positions) = reader.read_positions() else {
            continue;
        };
        let positions: Vec<[f32; 3]> = positions.collect();
        let indices: Vec<u32> = match reader.read_indices() {
            Some(ReadIndices::U8(it)) => it.map(u32::from).collect(),
            Some(ReadIndices::U16(it)) => it.map(u32::from).collect(),
            Some(ReadIndices::U32(it)) => it.collect(),
            None => (0..positions.len() as u32).collect(),
        };
        if indices.iter().any(|i| *i as usize >= positions.len()) {
            log::warn!("Skipping primitive with out-of-range indices");
            continue;
        }
        let normals: Vec<[f32; 3]> = match reader.read_normals() {
            Some(it) => it.collect(),
            None => smooth_normals(&positions, &indices),
        };

        // Textures are not sampled; textured materials get the skin tone.
        let pbr = primitive.material().pbr_metallic_roughness();
        let color = if pbr.base_color_texture().is_some() {
            to_linear(SKIN)
        } else {
            pbr.base_color_factor()
        };

        let local = CpuMesh {
            vertices: positions
                .iter()
                .zip(normals.iter())
                .map(|(p, n)| mh_render::MeshVertex {
                    position: *p,
                    normal: *n,
                    color,
                })
                .collect(),
            indices,
        };
        out.append_transformed(&local, transform, None);
    }
}

/// Area-weighted vertex normals for meshes that ship without them.
fn smooth_normals(positions: &[[f32; 3]], indices: &[u32]) -> Vec<[f32; 3]> {
    let mut sums = vec![Vec3::ZERO; positions.len()];
    for tri in indices.chunks_exact(3) {
        let [a, b, c] = [tri[0], tri[1], tri[2]].map(|i| Vec3::from_array(positions[i as usize]));
        let face = (b - a).cross(c - a);
        for i in tri {
            sums[*i as usize] += face;
        }
    }
    sums.into_iter()
        .map(|n| {
            let n = n.normalize_or_zero();
            if n == Vec3::ZERO {
                Vec3::Y.to_array()
            } else {
                n.to_array()
            }
        })
        .collect()
}

fn recenter(mesh: &mut CpuMesh) {
    let Some(bounds) = Aabb3::from_points(mesh.vertices.iter().map(|v| Vec3::from_array(v.position)))
    else {
        return;
    };
    let center = bounds.center();
    for v in &mut mesh.vertices {
        v.position = (Vec3::from_array(v.position) - center).to_array();
    }
}

/// Background import of the avatar model. `poll` yields the model exactly
/// once.
pub struct AvatarLoader {
    receiver: Receiver<AvatarModel>,
    fallback_size: Vec3,
    finished: bool,
}

impl AvatarLoader {
    pub fn spawn(path: PathBuf, size: Vec3) -> Self {
        let (sender, receiver) = mpsc::channel();
        let worker_sender = sender.clone();
        let spawned = thread::Builder::new()
            .name("avatar-loader".to_string())
            .spawn(move || {
                let model = load_avatar_model(&path, size);
                // The receiver may be gone if the window closed first.
                let _ = worker_sender.send(model);
            });
        if let Err(err) = spawned {
            log::error!("Failed to start avatar loader thread: {err}. Using fallback box.");
            let _ = sender.send(AvatarModel::fallback(size));
        }
        Self {
            receiver,
            fallback_size: size,
            finished: false,
        }
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    pub fn poll(&mut self) -> Option<AvatarModel> {
        if self.finished {
            return None;
        }
        match self.receiver.try_recv() {
            Ok(model) => {
                self.finished = true;
                Some(model)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                log::error!("Avatar loader exited without a model. Using fallback box.");
                self.finished = true;
                Some(AvatarModel::fallback(self.fallback_size))
            }
        }
    }
}
