pub mod camera;
pub mod gpu_context;
pub mod mesh_pipeline;
pub mod primitives;
pub mod vertex;

pub use camera::{FollowCamera, SceneUniform};
pub use gpu_context::GpuContext;
pub use mesh_pipeline::MeshPipeline;
pub use primitives::CpuMesh;
pub use vertex::MeshVertex;
