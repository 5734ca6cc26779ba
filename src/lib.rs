//! Priority-tiered resource preloader and scroll-reveal controller.
//!
//! Browser facilities sit behind the capability traits in [`host`], so the
//! loading logic runs on tokio with either the reqwest-backed [`host::HttpLoader`]
//! or an in-memory [`host::MemoryDocument`].

pub mod api;
pub mod catalog;
pub mod config;
pub mod engine;
pub mod host;
pub mod report;
pub mod reveal;

pub use api::preload_api::{FailedResource, PreloadStatus, Preloader};
pub use api::telemetry::init_tracing;
