#[cfg(feature = "cli")]
pub mod cli;
pub mod toml_config;

#[cfg(feature = "cli")]
use crate::adapters::frames::FrameFormat;
#[cfg(feature = "cli")]
use crate::core::params::{VisionParams, IMG_COLS, IMG_ROWS};
#[cfg(feature = "cli")]
use crate::core::ConfigProvider;
#[cfg(feature = "cli")]
use crate::utils::error::Result;
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "microcv")]
#[command(about = "Run the robot camera pipeline over captured frame dumps")]
pub struct CliConfig {
    #[arg(long, default_value = "./hex_images")]
    pub input_dir: String,

    #[arg(long, default_value = "./output")]
    pub output_path: String,

    #[arg(long, value_delimiter = ',', default_value = ".bin,.BIN")]
    pub extensions: Vec<String>,

    #[arg(long, value_enum, default_value_t = FrameFormat::Auto)]
    pub format: FrameFormat,

    #[arg(long, default_value_t = IMG_COLS)]
    pub width: u32,

    #[arg(long, default_value_t = IMG_ROWS)]
    pub height: u32,

    #[arg(long, help = "TOML file overriding the vision parameters")]
    pub params: Option<String>,

    #[arg(long, help = "Also write every decoded frame as PNG")]
    pub save_frames: bool,

    #[arg(long, help = "Enable the experimental obstacle detector")]
    pub obstacles: bool,

    #[arg(long, help = "Analyse a colour-bar frame when no dumps are found")]
    pub test_pattern: bool,

    #[arg(long, default_value = "4")]
    pub preview_scale: u32,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Log CPU and memory use after each phase")]
    pub monitor: bool,

    #[arg(skip)]
    pub vision: VisionParams,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Load `--params` into `vision`, if given.
    pub fn load_params(&mut self) -> Result<()> {
        if let Some(path) = &self.params {
            let content = std::fs::read_to_string(path)?;
            self.vision = VisionParams::from_toml_str(&content)?;
            tracing::debug!("Vision parameters loaded from {}", path);
        }
        Ok(())
    }
}

#[cfg(feature = "cli")]
impl ConfigProvider for CliConfig {
    fn input_dir(&self) -> &str {
        &self.input_dir
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn extensions(&self) -> &[String] {
        &self.extensions
    }

    fn frame_format(&self) -> FrameFormat {
        self.format
    }

    fn frame_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn vision_params(&self) -> &VisionParams {
        &self.vision
    }

    fn obstacle_detection(&self) -> bool {
        self.obstacles
    }

    fn save_frames(&self) -> bool {
        self.save_frames
    }

    fn test_pattern(&self) -> bool {
        self.test_pattern
    }

    fn preview_scale(&self) -> u32 {
        self.preview_scale
    }
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("input_dir", &self.input_dir)?;
        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_extensions("extensions", &self.extensions)?;
        self.vision.validate_for_frame(self.width, self.height)?;
        validation::validate_preview_size("preview_scale", self.preview_scale, self.width, self.height)
    }
}
