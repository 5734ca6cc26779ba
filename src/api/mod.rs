// Public entry points: the preloader composition root and tracing setup.

pub mod preload_api;
pub mod telemetry;
