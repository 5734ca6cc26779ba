// Scroll-triggered reveal animations: tag elements, watch visibility, mark them animated once seen.

pub mod animation;
pub mod controller;

pub use animation::AnimationType;
pub use controller::{RevealController, RevealStats};
