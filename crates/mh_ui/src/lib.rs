pub mod hud;
pub mod overlay;

pub use hud::HudState;
pub use overlay::{Overlay, OverlayActions, OverlayStats};
