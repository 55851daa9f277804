pub mod adapters;
pub mod app;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::{cli::LocalStorage, CliConfig};

pub use crate::app::pipelines::FramePipeline;
pub use crate::core::engine::VisionEngine;
pub use crate::utils::error::{Result, VisionError};
