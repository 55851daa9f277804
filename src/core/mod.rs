pub mod contour;
pub mod detect;
pub mod engine;
pub mod params;
pub mod pixel;
pub mod raster;

pub use crate::domain::model::{AnalysisResult, Frame, FramePreview, FrameReport};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage};
pub use crate::utils::error::Result;
