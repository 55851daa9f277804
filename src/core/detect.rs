//! Per-frame detectors: stop line (red), white lane line and obstacles
//! (green), plus the overlay that combines their masks.

use crate::core::contour::{contour_area, find_contours};
use crate::core::params::{Point, Region, VisionParams, WhiteLineParams};
use crate::core::pixel::{is_obstacle, is_stop_line, is_white_line};
use crate::core::raster::{
    colorize_mask, draw_circle, draw_line, draw_rectangle, draw_text, layer_mask, BLUE, GREEN,
    RED, WHITE,
};
use crate::domain::model::{Frame, FrameReport};
use crate::utils::error::Result;
use image::{GrayImage, Luma, RgbImage};

/// Outcome of counting matching pixels inside a detection box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionDetection {
    pub detected: bool,
    pub pixels: u32,
    /// Share of the box covered, in basis points.
    pub coverage_bp: u32,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WhiteLineReport {
    pub detected: bool,
    /// Clamped lateral distance of the line from the target column.
    pub distance: Option<i8>,
    /// Distance before clamping.
    pub raw_distance: Option<i32>,
    pub blob_area: f64,
}

impl WhiteLineReport {
    fn missing(blob_area: f64) -> Self {
        Self {
            detected: false,
            distance: None,
            raw_distance: None,
            blob_area,
        }
    }
}

#[derive(Debug, Clone)]
pub struct WhiteLineOutput {
    pub report: WhiteLineReport,
    /// White pixels considered for the line.
    pub mask: GrayImage,
    /// Extreme points, fitted line and reference lines.
    pub guides: GrayImage,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DetectionOptions {
    pub obstacles: bool,
}

#[derive(Debug, Clone)]
pub struct FrameAnalysis {
    pub report: FrameReport,
    pub original: RgbImage,
    pub overlay: RgbImage,
}

fn detect_in_region<F>(frame: &Frame, region: &Region, percent: u8, is_hit: F) -> (RegionDetection, GrayImage)
where
    F: Fn(u16, u16, u16) -> bool,
{
    let mut mask = GrayImage::new(frame.width, frame.height);
    let mut pixels = 0u32;

    for y in 0..frame.height {
        for x in 0..frame.width {
            if !region.contains(x as i32, y as i32) {
                continue;
            }
            let (r, g, b) = frame.rgb888(x, y);
            if is_hit(r, g, b) {
                pixels += 1;
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    draw_rectangle(&mut mask, region, 255);

    let area = region.area();
    let coverage_bp = if area == 0 {
        0
    } else {
        (pixels as u64 * 10_000 / area) as u32
    };
    let detected = area > 0 && coverage_bp >= percent as u32 * 100;

    (
        RegionDetection {
            detected,
            pixels,
            coverage_bp,
        },
        mask,
    )
}

/// Stop line: red, non-white pixels inside the stop box.
pub fn process_red_frame(frame: &Frame, params: &VisionParams) -> (RegionDetection, GrayImage) {
    let stop = &params.stop_line;
    let white = &params.white_line;
    detect_in_region(frame, &stop.region, stop.percent_to_stop, |r, g, b| {
        is_stop_line(r, g, b, stop) && !is_white_line(r, g, b, white)
    })
}

/// Obstacles and other cars: strongly green pixels inside the obstacle box.
pub fn process_car_frame(frame: &Frame, params: &VisionParams) -> (RegionDetection, GrayImage) {
    let obstacle = &params.obstacle;
    detect_in_region(frame, &obstacle.region, obstacle.percent_to_detect, |r, g, b| {
        is_obstacle(r, g, b, obstacle)
    })
}

/// Extreme points of a contour. Each pair is (min, max) along the other axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Extremes {
    top: (Point, Point),
    bottom: (Point, Point),
    left: (Point, Point),
    right: (Point, Point),
}

impl Extremes {
    fn of(contour: &[Point]) -> Option<Self> {
        let first = *contour.first()?;
        let y_min = contour.iter().map(|p| p.y).min()?;
        let y_max = contour.iter().map(|p| p.y).max()?;
        let x_min = contour.iter().map(|p| p.x).min()?;
        let x_max = contour.iter().map(|p| p.x).max()?;

        let mut ext = Extremes {
            top: (first, first),
            bottom: (first, first),
            left: (first, first),
            right: (first, first),
        };
        let (mut top, mut bottom, mut left, mut right) = (false, false, false, false);

        let widen_x = |pair: &mut (Point, Point), seen: &mut bool, p: Point| {
            if !*seen {
                *pair = (p, p);
                *seen = true;
            } else {
                if p.x < pair.0.x {
                    pair.0 = p;
                }
                if p.x > pair.1.x {
                    pair.1 = p;
                }
            }
        };
        let widen_y = |pair: &mut (Point, Point), seen: &mut bool, p: Point| {
            if !*seen {
                *pair = (p, p);
                *seen = true;
            } else {
                if p.y < pair.0.y {
                    pair.0 = p;
                }
                if p.y > pair.1.y {
                    pair.1 = p;
                }
            }
        };

        for &p in contour {
            if p.y == y_min {
                widen_x(&mut ext.top, &mut top, p);
            }
            if p.y == y_max {
                widen_x(&mut ext.bottom, &mut bottom, p);
            }
            if p.x == x_min {
                widen_y(&mut ext.left, &mut left, p);
            }
            if p.x == x_max {
                widen_y(&mut ext.right, &mut right, p);
            }
        }

        Some(ext)
    }

    fn points(&self) -> [Point; 8] {
        [
            self.left.0,
            self.top.0,
            self.right.0,
            self.top.1,
            self.left.1,
            self.bottom.0,
            self.right.1,
            self.bottom.1,
        ]
    }
}

/// Line through two contour points, evaluated as x for a given row.
///
/// The two points are the top of the leftmost column and the left end of
/// the bottom row. They can only share a row when they are the same point,
/// so every fit is either vertical or has a non-zero row delta.
#[derive(Debug, Clone, Copy)]
enum LaneFit {
    Vertical { x: i32 },
    Slanted { anchor: Point, dx: i32, dy: i32 },
}

impl LaneFit {
    fn through(top: Point, bottom: Point) -> Self {
        let dx = bottom.x - top.x;
        let dy = bottom.y - top.y;
        if dx == 0 || dy == 0 {
            LaneFit::Vertical { x: top.x }
        } else {
            LaneFit::Slanted { anchor: top, dx, dy }
        }
    }

    /// Column where the line crosses `row`, truncated toward zero.
    fn x_at(&self, row: i32) -> i32 {
        match *self {
            LaneFit::Vertical { x } => x,
            LaneFit::Slanted { anchor, dx, dy } => {
                (anchor.x as f32 + (row - anchor.y) as f32 * dx as f32 / dy as f32) as i32
            }
        }
    }

    fn draw(&self, guides: &mut GrayImage) {
        let last_row = guides.height() as i32 - 1;
        draw_line(
            guides,
            Point::new(self.x_at(0), 0),
            Point::new(self.x_at(last_row), last_row),
            255,
        );
    }
}

/// White lane line: the largest bright blob below the crop line gives the
/// lane edge, and its crossing of the crop line gives the steering distance.
pub fn process_white_frame(frame: &Frame, params: &WhiteLineParams) -> WhiteLineOutput {
    let mut mask = GrayImage::new(frame.width, frame.height);
    let mut guides = GrayImage::new(frame.width, frame.height);

    let column_limit = params.horizontal_crop.min(frame.width);
    for y in params.vertical_crop.min(frame.height)..frame.height {
        for x in 0..column_limit {
            let (r, g, b) = frame.rgb888(x, y);
            if is_white_line(r, g, b, params) {
                mask.put_pixel(x, y, Luma([255]));
            }
        }
    }

    let contours = find_contours(&mask);

    // largest blob, first one wins ties
    let mut largest: Option<(&[Point], f64)> = None;
    for contour in &contours {
        let area = contour_area(contour);
        if largest.map_or(true, |(_, best)| area > best) {
            largest = Some((contour, area));
        }
    }

    let Some((blob, blob_area)) = largest else {
        return WhiteLineOutput {
            report: WhiteLineReport::missing(0.0),
            mask,
            guides,
        };
    };
    if blob_area < params.min_blob_area as f64 {
        tracing::trace!(frame = %frame.name, blob_area, "white blob too small");
        return WhiteLineOutput {
            report: WhiteLineReport::missing(blob_area),
            mask,
            guides,
        };
    }
    let Some(extremes) = Extremes::of(blob) else {
        return WhiteLineOutput {
            report: WhiteLineReport::missing(blob_area),
            mask,
            guides,
        };
    };

    for point in extremes.points() {
        draw_circle(&mut guides, point, 1, 255);
    }

    let top = extremes.left.0;
    let bottom = extremes.bottom.0;
    let fit = LaneFit::through(top, bottom);
    fit.draw(&mut guides);

    let crop_row = params.vertical_crop as i32;
    let crossing = Point::new(fit.x_at(crop_row), crop_row);
    draw_circle(&mut guides, crossing, 2, 255);

    let center = params.center_x as i32;
    let last_row = frame.height as i32 - 1;
    let last_col = frame.width as i32 - 1;
    draw_line(&mut guides, Point::new(center, 0), Point::new(center, last_row), 255);

    let raw_distance = crossing.x - center;
    draw_text(&mut guides, &raw_distance.to_string(), Point::new(0, 10), 255);
    draw_line(&mut guides, Point::new(0, crop_row), Point::new(last_col, crop_row), 255);

    let max = params.max_distance(frame.width);
    let distance = raw_distance
        .clamp(-max, max)
        .clamp(i8::MIN as i32, i8::MAX as i32) as i8;

    WhiteLineOutput {
        report: WhiteLineReport {
            detected: true,
            distance: Some(distance),
            raw_distance: Some(raw_distance),
            blob_area,
        },
        mask,
        guides,
    }
}

/// Run every enabled detector on `frame` and layer their masks into one
/// overlay: white line white, guides green, stop line red, obstacles blue.
pub fn analyze_frame(frame: &Frame, params: &VisionParams, options: DetectionOptions) -> Result<FrameAnalysis> {
    let mut overlay = RgbImage::new(frame.width, frame.height);

    let white = process_white_frame(frame, &params.white_line);
    layer_mask(&mut overlay, &colorize_mask(&white.mask, WHITE))?;
    layer_mask(&mut overlay, &colorize_mask(&white.guides, GREEN))?;

    let (stop, red_mask) = process_red_frame(frame, params);
    layer_mask(&mut overlay, &colorize_mask(&red_mask, RED))?;

    let obstacle = if options.obstacles {
        let (obstacle, car_mask) = process_car_frame(frame, params);
        layer_mask(&mut overlay, &colorize_mask(&car_mask, BLUE))?;
        Some(obstacle)
    } else {
        None
    };

    tracing::debug!(
        frame = %frame.name,
        stop = stop.detected,
        stop_coverage_bp = stop.coverage_bp,
        white = white.report.detected,
        distance = ?white.report.distance,
        "frame analysed"
    );

    Ok(FrameAnalysis {
        report: FrameReport {
            frame: frame.name.clone(),
            stop_detected: stop.detected,
            stop_pixels: stop.pixels,
            stop_coverage_bp: stop.coverage_bp,
            white_detected: white.report.detected,
            white_distance: white.report.distance,
            white_blob_area: white.report.blob_area,
            obstacle_detected: obstacle.map(|o| o.detected),
            obstacle_pixels: obstacle.map(|o| o.pixels),
        },
        original: frame.to_rgb_image(),
        overlay,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::{IMG_COLS, IMG_ROWS};
    use crate::core::pixel::rgb888_to_rgb565;

    const RED_WORD: u16 = rgb888_to_rgb565(255, 0, 0);
    const GREEN_WORD: u16 = rgb888_to_rgb565(0, 255, 0);
    const WHITE_WORD: u16 = 0xFFFF;

    fn blank() -> Frame {
        Frame::filled("blank", IMG_COLS, IMG_ROWS, 0)
    }

    fn paint(frame: &mut Frame, region: Region, word: u16) {
        for y in region.top_left.y..=region.bottom_right.y {
            for x in region.top_left.x..=region.bottom_right.x {
                frame.set_pixel(x as u32, y as u32, word);
            }
        }
    }

    #[test]
    fn test_red_frame_fully_covered_box_stops() {
        let params = VisionParams::default();
        let frame = Frame::filled("red", IMG_COLS, IMG_ROWS, RED_WORD);

        let (stop, mask) = process_red_frame(&frame, &params);
        assert!(stop.detected);
        assert_eq!(stop.pixels as u64, params.stop_line.region.area());
        assert_eq!(stop.coverage_bp, 10_000);
        // nothing outside the box is marked
        assert_eq!(mask.get_pixel(0, 0)[0], 0);
        assert_eq!(mask.get_pixel(20, 80)[0], 255);
    }

    #[test]
    fn test_large_box_coverage_does_not_overflow() {
        let mut params = VisionParams::default();
        params.stop_line.region = Region::new(Point::new(0, 0), Point::new(999, 999));
        assert!(params.validate_for_frame(1000, 1000).is_ok());

        let frame = Frame::filled("large", 1000, 1000, RED_WORD);
        let (stop, _) = process_red_frame(&frame, &params);
        assert_eq!(stop.pixels, 1_000_000);
        assert_eq!(stop.coverage_bp, 10_000);
        assert!(stop.detected);
    }

    #[test]
    fn test_red_frame_threshold_is_inclusive() {
        let params = VisionParams::default();
        let mut frame = blank();
        // stop box is 26 x 11 = 286 pixels, 20% is 57.2 pixels
        // 58 red pixels: 2027 bp, 57 red pixels: 1993 bp
        let mut painted = 0;
        'outer: for y in 75..=85 {
            for x in 15..=40 {
                if painted == 58 {
                    break 'outer;
                }
                frame.set_pixel(x, y, RED_WORD);
                painted += 1;
            }
        }
        let (stop, _) = process_red_frame(&frame, &params);
        assert_eq!(stop.pixels, 58);
        assert!(stop.detected);

        frame.set_pixel(15, 77, 0);
        let (stop, _) = process_red_frame(&frame, &params);
        assert_eq!(stop.pixels, 57);
        assert!(!stop.detected);
    }

    #[test]
    fn test_red_outside_box_is_ignored() {
        let params = VisionParams::default();
        let mut frame = blank();
        paint(&mut frame, Region::new(Point::new(50, 0), Point::new(95, 40)), RED_WORD);

        let (stop, mask) = process_red_frame(&frame, &params);
        assert!(!stop.detected);
        assert_eq!(stop.pixels, 0);
        // only the box outline is drawn
        let lit = mask.pixels().filter(|p| p[0] > 0).count();
        assert_eq!(lit, 2 * 26 + 2 * 9);
    }

    #[test]
    fn test_zero_area_box_never_detects() {
        let mut params = VisionParams::default();
        params.stop_line.region = Region::new(Point::new(40, 85), Point::new(15, 75));
        let frame = Frame::filled("red", IMG_COLS, IMG_ROWS, RED_WORD);

        let (stop, _) = process_red_frame(&frame, &params);
        assert!(!stop.detected);
        assert_eq!(stop.coverage_bp, 0);
    }

    #[test]
    fn test_car_frame_detects_green() {
        let params = VisionParams::default();
        let mut frame = blank();
        paint(&mut frame, params.obstacle.region, GREEN_WORD);

        let (obstacle, _) = process_car_frame(&frame, &params);
        assert!(obstacle.detected);
        assert_eq!(obstacle.pixels as u64, params.obstacle.region.area());
    }

    #[test]
    fn test_white_line_missing_on_dark_frame() {
        let output = process_white_frame(&blank(), &WhiteLineParams::default());
        assert!(!output.report.detected);
        assert_eq!(output.report.distance, None);
        assert!(output.guides.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_white_pixels_above_crop_are_ignored() {
        let mut frame = blank();
        paint(&mut frame, Region::new(Point::new(0, 0), Point::new(95, 49)), WHITE_WORD);

        let output = process_white_frame(&frame, &WhiteLineParams::default());
        assert!(!output.report.detected);
        assert!(output.mask.pixels().all(|p| p[0] == 0));
    }

    #[test]
    fn test_small_white_blob_rejected() {
        let mut frame = blank();
        // 6x6 pixels: contour area 25 < 50
        paint(&mut frame, Region::new(Point::new(10, 60), Point::new(15, 65)), WHITE_WORD);

        let output = process_white_frame(&frame, &WhiteLineParams::default());
        assert!(!output.report.detected);
        assert_eq!(output.report.blob_area, 25.0);
    }

    #[test]
    fn test_vertical_white_band_distance() {
        let mut frame = blank();
        paint(&mut frame, Region::new(Point::new(20, 50), Point::new(29, 95)), WHITE_WORD);

        let output = process_white_frame(&frame, &WhiteLineParams::default());
        assert!(output.report.detected);
        // left edge at x = 20, target column 28
        assert_eq!(output.report.raw_distance, Some(-8));
        assert_eq!(output.report.distance, Some(-8));
        // target column and crop row are drawn
        assert_eq!(output.guides.get_pixel(28, 0)[0], 255);
        assert_eq!(output.guides.get_pixel(95, 50)[0], 255);
    }

    #[test]
    fn test_slanted_white_line_fit() {
        let mut frame = blank();
        // band whose left edge runs from (20, 50) down-right to (42, 95)
        for y in 50..96u32 {
            let left = 20 + (y - 50) / 2;
            for x in left..left + 8 {
                frame.set_pixel(x, y, WHITE_WORD);
            }
        }

        let output = process_white_frame(&frame, &WhiteLineParams::default());
        assert!(output.report.detected);
        assert_eq!(output.report.raw_distance, Some(-8));
        // fitted line ends on the bottom left corner of the band, which the
        // radius 1 marker around it leaves unlit
        assert_eq!(output.guides.get_pixel(42, 95)[0], 255);
    }

    #[test]
    fn test_equal_blobs_first_in_raster_order_wins() {
        let mut frame = blank();
        paint(&mut frame, Region::new(Point::new(10, 50), Point::new(19, 95)), WHITE_WORD);
        paint(&mut frame, Region::new(Point::new(40, 50), Point::new(49, 95)), WHITE_WORD);

        let output = process_white_frame(&frame, &WhiteLineParams::default());
        assert!(output.report.detected);
        assert_eq!(output.report.raw_distance, Some(10 - 28));

        // same blobs, the right one starting a row higher
        let mut frame = blank();
        paint(&mut frame, Region::new(Point::new(10, 51), Point::new(19, 95)), WHITE_WORD);
        paint(&mut frame, Region::new(Point::new(40, 50), Point::new(49, 94)), WHITE_WORD);

        let output = process_white_frame(&frame, &WhiteLineParams::default());
        assert_eq!(output.report.raw_distance, Some(40 - 28));
    }

    #[test]
    fn test_white_distance_is_clamped() {
        let mut frame = blank();
        paint(&mut frame, Region::new(Point::new(64, 50), Point::new(74, 95)), WHITE_WORD);

        let output = process_white_frame(&frame, &WhiteLineParams::default());
        assert!(output.report.detected);
        assert_eq!(output.report.raw_distance, Some(36));
        assert_eq!(output.report.distance, Some(28));
    }

    #[test]
    fn test_analyze_frame_layers_overlay() {
        let params = VisionParams::default();
        let mut frame = blank();
        paint(&mut frame, Region::new(Point::new(20, 50), Point::new(29, 95)), WHITE_WORD);
        paint(&mut frame, params.stop_line.region, RED_WORD);

        let analysis = analyze_frame(&frame, &params, DetectionOptions { obstacles: true }).unwrap();
        assert!(analysis.report.stop_detected);
        assert!(analysis.report.white_detected);
        assert_eq!(analysis.report.obstacle_detected, Some(false));

        // red layer is applied last over the stop box
        assert_eq!(analysis.overlay.get_pixel(35, 80), &RED);
        // white pixels outside the red box stay white
        assert_eq!(analysis.overlay.get_pixel(24, 70), &WHITE);
        assert_eq!(analysis.original.get_pixel(35, 80), &RED);
    }
}
