//! Avatar motion and collection engine.
//!
//! Everything here is plain arithmetic over an explicit [`world::World`]
//! session object: no window, GPU, or clock is needed to drive a step, which
//! is what lets the tests script whole play sessions.

pub mod avatar;
pub mod bounds;
pub mod collectible;
pub mod config;
pub mod environment;
#[cfg(test)]
mod replay;
pub mod wind;
pub mod world;

pub use avatar::{Avatar, MoveInput};
pub use bounds::Aabb3;
pub use collectible::{Collectible, CollectionEvent};
pub use config::MotionConfig;
pub use environment::{Environment, EnvironmentConfig};
pub use wind::{WindCell, WindConfig, WindState, WindTimer};
pub use world::{StepReport, World};
