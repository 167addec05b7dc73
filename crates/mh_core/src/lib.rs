pub mod controls;
pub mod input;
pub mod joystick;
pub mod time;
