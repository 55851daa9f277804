//! Tuning parameters for the frame processing pipeline.
//!
//! Defaults are the values flashed on the robot. Every section may be
//! overridden from TOML; missing keys keep their default.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Frame width the defaults are tuned for.
pub const IMG_COLS: u32 = 96;
/// Frame height the defaults are tuned for.
pub const IMG_ROWS: u32 = 96;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

/// Inclusive pixel rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Region {
    pub top_left: Point,
    pub bottom_right: Point,
}

impl Region {
    pub const fn new(top_left: Point, bottom_right: Point) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }

    /// Number of pixels covered, or 0 when the corners are inverted.
    /// Saturates for corners spanning the whole `i32` range.
    pub fn area(&self) -> u64 {
        let (tl, br) = (self.top_left, self.bottom_right);
        if br.x >= tl.x && br.y >= tl.y {
            let width = (br.x as i64 - tl.x as i64 + 1) as u64;
            let height = (br.y as i64 - tl.y as i64 + 1) as u64;
            width.saturating_mul(height)
        } else {
            0
        }
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.top_left.x
            && x <= self.bottom_right.x
            && y >= self.top_left.y
            && y <= self.bottom_right.y
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({},{})-({},{})",
            self.top_left.x, self.top_left.y, self.bottom_right.x, self.bottom_right.y
        )
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StopLineParams {
    pub region: Region,
    /// Percentage of the box that must be red to register a stop.
    pub percent_to_stop: u8,
    /// How much more red than green a pixel must be.
    pub green_tolerance: u8,
    /// How much more red than blue a pixel must be.
    pub blue_tolerance: u8,
}

impl Default for StopLineParams {
    fn default() -> Self {
        Self {
            region: Region::new(Point::new(15, 75), Point::new(40, 85)),
            percent_to_stop: 20,
            green_tolerance: 15,
            blue_tolerance: 20,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WhiteLineParams {
    /// Rows above this are ignored.
    pub vertical_crop: u32,
    /// Columns from this one rightwards are ignored.
    pub horizontal_crop: u32,
    pub red_threshold: u8,
    pub green_threshold: u8,
    pub blue_threshold: u8,
    /// Smallest blob area accepted as the line.
    pub min_blob_area: u32,
    /// Column the robot keeps the line at.
    pub center_x: u32,
}

impl Default for WhiteLineParams {
    fn default() -> Self {
        Self {
            vertical_crop: 50,
            horizontal_crop: 75,
            red_threshold: 240,
            green_threshold: 240,
            blue_threshold: 240,
            min_blob_area: 50,
            center_x: 28,
        }
    }
}

impl WhiteLineParams {
    /// Largest distance that can be reported without leaving a frame of `cols` columns.
    pub fn max_distance(&self, cols: u32) -> i32 {
        if cols > 2 * self.center_x {
            self.center_x as i32
        } else {
            cols as i32 - self.center_x as i32
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleParams {
    pub region: Region,
    pub percent_to_detect: u8,
    /// How much more green than red a pixel must be.
    pub red_tolerance: u8,
    /// How much more green than blue a pixel must be.
    pub blue_tolerance: u8,
}

impl Default for ObstacleParams {
    fn default() -> Self {
        Self {
            region: Region::new(Point::new(0, 50), Point::new(15, 70)),
            percent_to_detect: 8,
            red_tolerance: 50,
            blue_tolerance: 30,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VisionParams {
    pub stop_line: StopLineParams,
    pub white_line: WhiteLineParams,
    pub obstacle: ObstacleParams,
}

impl VisionParams {
    pub fn from_toml_str(content: &str) -> crate::utils::error::Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Check that every box and line lies inside a `width` x `height` frame.
    pub fn validate_for_frame(&self, width: u32, height: u32) -> crate::utils::error::Result<()> {
        use crate::utils::validation::{validate_range, validate_region};

        validate_range("width", width, 1, 4096)?;
        validate_range("height", height, 1, 4096)?;

        validate_region("vision.stop_line.region", &self.stop_line.region, width, height)?;
        validate_range("vision.stop_line.percent_to_stop", self.stop_line.percent_to_stop, 0, 100)?;

        validate_region("vision.obstacle.region", &self.obstacle.region, width, height)?;
        validate_range("vision.obstacle.percent_to_detect", self.obstacle.percent_to_detect, 0, 100)?;

        validate_range("vision.white_line.center_x", self.white_line.center_x, 0, width - 1)?;
        validate_range("vision.white_line.vertical_crop", self.white_line.vertical_crop, 0, height - 1)?;
        Ok(())
    }
}
