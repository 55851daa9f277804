use crate::adapters::frames::FrameFormat;
use crate::core::params::VisionParams;
use crate::domain::model::{AnalysisResult, Frame};
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait Storage: Send + Sync {
    /// Names of regular files directly under `dir` ending in one of
    /// `extensions` (all files when empty), sorted.
    fn list_files(
        &self,
        dir: &str,
        extensions: &[String],
    ) -> impl std::future::Future<Output = Result<Vec<String>>> + Send;
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn input_dir(&self) -> &str;
    fn output_path(&self) -> &str;
    fn extensions(&self) -> &[String];
    fn frame_format(&self) -> FrameFormat;
    fn frame_size(&self) -> (u32, u32);
    fn vision_params(&self) -> &VisionParams;
    fn obstacle_detection(&self) -> bool;
    fn save_frames(&self) -> bool;
    fn test_pattern(&self) -> bool;
    fn preview_scale(&self) -> u32;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Vec<Frame>>;
    async fn transform(&self, frames: Vec<Frame>) -> Result<AnalysisResult>;
    async fn load(&self, result: AnalysisResult) -> Result<String>;
}
