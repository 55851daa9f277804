//! Mask and overlay helpers: cropping, colouring, layering and the few
//! drawing primitives used to annotate masks.
//!
//! All drawing is clipped to the image, so callers may pass coordinates that
//! fall outside it.

use crate::core::params::{Point, Region};
use crate::utils::error::{Result, VisionError};
use image::{GrayImage, ImageBuffer, Luma, Pixel, Rgb, RgbImage};

pub const WHITE: Rgb<u8> = Rgb([255, 255, 255]);
pub const RED: Rgb<u8> = Rgb([255, 0, 0]);
pub const GREEN: Rgb<u8> = Rgb([0, 255, 0]);
pub const BLUE: Rgb<u8> = Rgb([0, 0, 255]);

/// Set every pixel outside the inclusive box `top_left`..`bottom_right` to black.
pub fn crop_image<P>(image: &mut ImageBuffer<P, Vec<u8>>, top_left: Point, bottom_right: Point)
where
    P: Pixel<Subpixel = u8>,
{
    let region = Region::new(top_left, bottom_right);
    for (x, y, pixel) in image.enumerate_pixels_mut() {
        if !region.contains(x as i32, y as i32) {
            pixel.channels_mut().iter_mut().for_each(|c| *c = 0);
        }
    }
}

/// Paint every non-zero mask pixel with `color`, everything else black.
pub fn colorize_mask(mask: &GrayImage, color: Rgb<u8>) -> RgbImage {
    ImageBuffer::from_fn(mask.width(), mask.height(), |x, y| {
        if mask.get_pixel(x, y)[0] > 0 {
            color
        } else {
            Rgb([0, 0, 0])
        }
    })
}

/// Copy every non-black pixel of `layer` onto `dest`.
pub fn layer_mask(dest: &mut RgbImage, layer: &RgbImage) -> Result<()> {
    if dest.dimensions() != layer.dimensions() {
        return Err(VisionError::DimensionMismatch {
            expected: dest.dimensions(),
            actual: layer.dimensions(),
        });
    }

    for (base, top) in dest.pixels_mut().zip(layer.pixels()) {
        if top.0 != [0, 0, 0] {
            *base = *top;
        }
    }

    Ok(())
}

fn put(mask: &mut GrayImage, x: i32, y: i32, value: u8) {
    if x >= 0 && y >= 0 && (x as u32) < mask.width() && (y as u32) < mask.height() {
        mask.put_pixel(x as u32, y as u32, Luma([value]));
    }
}

/// One pixel wide outline of an inclusive rectangle.
pub fn draw_rectangle(mask: &mut GrayImage, region: &Region, value: u8) {
    let (tl, br) = (region.top_left, region.bottom_right);
    for x in tl.x..=br.x {
        put(mask, x, tl.y, value);
        put(mask, x, br.y, value);
    }
    for y in tl.y..=br.y {
        put(mask, tl.x, y, value);
        put(mask, br.x, y, value);
    }
}

pub fn fill_rectangle(mask: &mut GrayImage, region: &Region, value: u8) {
    for y in region.top_left.y..=region.bottom_right.y {
        for x in region.top_left.x..=region.bottom_right.x {
            put(mask, x, y, value);
        }
    }
}

/// Liang-Barsky clip of a segment to the image rectangle.
fn clip_segment(from: Point, to: Point, width: u32, height: u32) -> Option<(Point, Point)> {
    if width == 0 || height == 0 {
        return None;
    }
    let (x0, y0) = (from.x as f64, from.y as f64);
    let (dx, dy) = (to.x as f64 - x0, to.y as f64 - y0);
    let (x_max, y_max) = ((width - 1) as f64, (height - 1) as f64);

    let mut t0 = 0.0_f64;
    let mut t1 = 1.0_f64;
    for (p, q) in [(-dx, x0), (dx, x_max - x0), (-dy, y0), (dy, y_max - y0)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
        } else {
            let r = q / p;
            if p < 0.0 {
                t0 = t0.max(r);
            } else {
                t1 = t1.min(r);
            }
        }
    }
    if t0 > t1 {
        return None;
    }

    let at = |t: f64| Point::new((x0 + t * dx).round() as i32, (y0 + t * dy).round() as i32);
    Some((at(t0), at(t1)))
}

/// Bresenham line between two points.
pub fn draw_line(mask: &mut GrayImage, from: Point, to: Point, value: u8) {
    let Some((a, b)) = clip_segment(from, to, mask.width(), mask.height()) else {
        return;
    };

    let dx = (b.x - a.x).abs();
    let dy = -(b.y - a.y).abs();
    let sx = if a.x < b.x { 1 } else { -1 };
    let sy = if a.y < b.y { 1 } else { -1 };
    let mut err = dx + dy;
    let (mut x, mut y) = (a.x, a.y);

    loop {
        put(mask, x, y, value);
        if x == b.x && y == b.y {
            break;
        }
        let e2 = 2 * err;
        if e2 >= dy {
            err += dy;
            x += sx;
        }
        if e2 <= dx {
            err += dx;
            y += sy;
        }
    }
}

/// Midpoint circle outline.
pub fn draw_circle(mask: &mut GrayImage, center: Point, radius: i32, value: u8) {
    if radius <= 0 {
        put(mask, center.x, center.y, value);
        return;
    }

    let (mut x, mut y, mut err) = (radius, 0, 1 - radius);
    while x >= y {
        for (ox, oy) in [
            (x, y),
            (y, x),
            (-y, x),
            (-x, y),
            (-x, -y),
            (-y, -x),
            (y, -x),
            (x, -y),
        ] {
            put(mask, center.x + ox, center.y + oy, value);
        }
        y += 1;
        if err < 0 {
            err += 2 * y + 1;
        } else {
            x -= 1;
            err += 2 * (y - x) + 1;
        }
    }
}

const GLYPH_WIDTH: i32 = 3;
const GLYPH_HEIGHT: i32 = 5;

// 3x5 bitmaps, one row per entry, bit 2 is the leftmost column.
fn glyph(c: char) -> Option<[u8; 5]> {
    let rows = match c {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b001, 0b001],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        _ => return None,
    };
    Some(rows)
}

/// Render digits and '-' with the bottom-left corner of the text at `origin`.
/// Other characters leave a gap.
pub fn draw_text(mask: &mut GrayImage, text: &str, origin: Point, value: u8) {
    let top = origin.y - (GLYPH_HEIGHT - 1);
    for (i, c) in text.chars().enumerate() {
        let left = origin.x + i as i32 * (GLYPH_WIDTH + 1);
        let Some(rows) = glyph(c) else { continue };
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..GLYPH_WIDTH {
                if bits & (1 << (GLYPH_WIDTH - 1 - col)) != 0 {
                    put(mask, left + col, top + row as i32, value);
                }
            }
        }
    }
}
