use crate::core::pixel::rgb565_to_rgb888;
use crate::utils::error::{Result, VisionError};
use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

/// One camera frame as RGB565 words, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub name: String,
    pub width: u32,
    pub height: u32,
    pub pixels: Vec<u16>,
}

impl Frame {
    pub fn new(name: impl Into<String>, width: u32, height: u32, pixels: Vec<u16>) -> Result<Self> {
        let name = name.into();
        let expected = width as usize * height as usize;
        if pixels.len() != expected {
            return Err(VisionError::FrameDecodeError {
                source_name: name,
                message: format!("expected {} pixels, got {}", expected, pixels.len()),
            });
        }
        Ok(Self {
            name,
            width,
            height,
            pixels,
        })
    }

    pub fn filled(name: impl Into<String>, width: u32, height: u32, word: u16) -> Self {
        Self {
            name: name.into(),
            width,
            height,
            pixels: vec![word; width as usize * height as usize],
        }
    }

    pub fn pixel(&self, x: u32, y: u32) -> u16 {
        self.pixels[(y * self.width + x) as usize]
    }

    pub fn set_pixel(&mut self, x: u32, y: u32, word: u16) {
        self.pixels[(y * self.width + x) as usize] = word;
    }

    pub fn rgb888(&self, x: u32, y: u32) -> (u16, u16, u16) {
        rgb565_to_rgb888(self.pixel(x, y))
    }

    pub fn to_rgb_image(&self) -> RgbImage {
        RgbImage::from_fn(self.width, self.height, |x, y| {
            let (r, g, b) = self.rgb888(x, y);
            Rgb([r as u8, g as u8, b as u8])
        })
    }
}

/// Per-frame detection summary, one row of the run report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FrameReport {
    pub frame: String,
    pub stop_detected: bool,
    pub stop_pixels: u32,
    /// Share of the stop box covered by red, in basis points.
    pub stop_coverage_bp: u32,
    pub white_detected: bool,
    pub white_distance: Option<i8>,
    pub white_blob_area: f64,
    pub obstacle_detected: Option<bool>,
    pub obstacle_pixels: Option<u32>,
}

/// Contents of `report.json`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunSummary {
    pub generated_at: String,
    pub frames: usize,
    pub stop_frames: usize,
    pub white_frames: usize,
    pub obstacle_frames: usize,
    pub reports: Vec<FrameReport>,
}

impl RunSummary {
    pub fn from_reports(reports: Vec<FrameReport>) -> Self {
        Self {
            generated_at: chrono::Utc::now().to_rfc3339(),
            frames: reports.len(),
            stop_frames: reports.iter().filter(|r| r.stop_detected).count(),
            white_frames: reports.iter().filter(|r| r.white_detected).count(),
            obstacle_frames: reports
                .iter()
                .filter(|r| r.obstacle_detected == Some(true))
                .count(),
            reports,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FramePreview {
    pub name: String,
    pub original: RgbImage,
    pub overlay: RgbImage,
}

#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub reports: Vec<FrameReport>,
    pub csv_output: String,
    pub previews: Vec<FramePreview>,
}
