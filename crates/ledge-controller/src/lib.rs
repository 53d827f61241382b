pub mod config;
pub mod controller;
pub mod input;
mod probe;

pub use config::{ConfigError, ControllerConfig, SlopeAngleError, slope_climbing_factor};
pub use controller::{Anchor, Contact, PlatformerController};
pub use input::{ControlInput, ControlSignal, UnknownSignal};
pub use probe::{can_grab, grab_line_crossed};
