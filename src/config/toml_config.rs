use crate::adapters::frames::FrameFormat;
use crate::core::params::{VisionParams, IMG_COLS, IMG_ROWS};
use crate::core::ConfigProvider;
use crate::utils::error::{Result, VisionError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub run: Option<RunInfo>,
    pub input: InputConfig,
    #[serde(default)]
    pub vision: VisionParams,
    #[serde(default)]
    pub detection: DetectionConfig,
    pub output: OutputConfig,
    pub monitoring: Option<MonitoringConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunInfo {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputConfig {
    pub dir: String,
    pub extensions: Option<Vec<String>>,
    pub format: Option<FrameFormat>,
    pub width: Option<u32>,
    pub height: Option<u32>,
    pub test_pattern: Option<bool>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DetectionConfig {
    pub obstacles: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub path: String,
    pub save_frames: Option<bool>,
    pub preview_scale: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringConfig {
    pub enabled: bool,
    /// "compact" (default) or "json".
    pub log_format: Option<String>,
}

impl TomlConfig {
    /// Load a configuration file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(VisionError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// Parse configuration text, substituting `${VAR}` from the environment first.
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;
        let mut config: TomlConfig = toml::from_str(&processed_content)?;

        if config.input.extensions.is_none() {
            config.input.extensions = Some(vec![".bin".to_string(), ".BIN".to_string()]);
        }
        Ok(config)
    }

    /// Unknown variables are left as written.
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| VisionError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_path("input.dir", &self.input.dir)?;
        validation::validate_path("output.path", &self.output.path)?;
        validation::validate_extensions("input.extensions", self.extensions())?;

        if let Some(monitoring) = &self.monitoring {
            if let Some(format) = &monitoring.log_format {
                if format != "compact" && format != "json" {
                    return Err(VisionError::InvalidConfigValueError {
                        field: "monitoring.log_format".to_string(),
                        value: format.clone(),
                        reason: "Valid formats: compact, json".to_string(),
                    });
                }
            }
        }

        let (width, height) = self.frame_size();
        self.vision.validate_for_frame(width, height)?;
        validation::validate_preview_size("output.preview_scale", self.preview_scale(), width, height)
    }

    pub fn run_name(&self) -> &str {
        self.run.as_ref().map(|r| r.name.as_str()).unwrap_or("microcv")
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }

    pub fn json_logs(&self) -> bool {
        self.monitoring
            .as_ref()
            .and_then(|m| m.log_format.as_deref())
            .map(|f| f == "json")
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn input_dir(&self) -> &str {
        &self.input.dir
    }

    fn output_path(&self) -> &str {
        &self.output.path
    }

    fn extensions(&self) -> &[String] {
        self.input.extensions.as_deref().unwrap_or(&[])
    }

    fn frame_format(&self) -> FrameFormat {
        self.input.format.unwrap_or_default()
    }

    fn frame_size(&self) -> (u32, u32) {
        (
            self.input.width.unwrap_or(IMG_COLS),
            self.input.height.unwrap_or(IMG_ROWS),
        )
    }

    fn vision_params(&self) -> &VisionParams {
        &self.vision
    }

    fn obstacle_detection(&self) -> bool {
        self.detection.obstacles.unwrap_or(false)
    }

    fn save_frames(&self) -> bool {
        self.output.save_frames.unwrap_or(false)
    }

    fn test_pattern(&self) -> bool {
        self.input.test_pattern.unwrap_or(false)
    }

    fn preview_scale(&self) -> u32 {
        self.output.preview_scale.unwrap_or(4)
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
