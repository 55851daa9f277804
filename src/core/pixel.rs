//! Per-pixel colour conversion and classification.
//!
//! These match the integer arithmetic running on the camera board, so a
//! frame classified here is classified the same way on the robot.

use crate::core::params::{ObstacleParams, StopLineParams, WhiteLineParams};

/// Expand one RGB565 word to 8-bit channels.
pub fn rgb565_to_rgb888(pixel: u16) -> (u16, u16, u16) {
    let red = (pixel >> 11) & 0x1F;
    let green = (pixel >> 5) & 0x3F;
    let blue = pixel & 0x1F;

    ((red * 255) / 31, (green * 255) / 63, (blue * 255) / 31)
}

/// Quantise 8-bit channels to one RGB565 word.
pub const fn rgb888_to_rgb565(r: u8, g: u8, b: u8) -> u16 {
    let red = (r as u16 * 31) / 255;
    let green = (g as u16 * 63) / 255;
    let blue = (b as u16 * 31) / 255;

    (red << 11) | (green << 5) | blue
}

pub fn is_stop_line(red: u16, green: u16, blue: u16, params: &StopLineParams) -> bool {
    red >= green + params.green_tolerance as u16 && red >= blue + params.blue_tolerance as u16
}

pub fn is_white_line(red: u16, green: u16, blue: u16, params: &WhiteLineParams) -> bool {
    red >= params.red_threshold as u16
        && green >= params.green_threshold as u16
        && blue >= params.blue_threshold as u16
}

pub fn is_obstacle(red: u16, green: u16, blue: u16, params: &ObstacleParams) -> bool {
    green >= red + params.red_tolerance as u16 && green >= blue + params.blue_tolerance as u16
}
