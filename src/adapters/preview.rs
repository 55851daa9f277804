//! Preview images: each frame next to its detection overlay, enlarged so the
//! 96 pixel frames are readable.

use crate::utils::error::{Result, VisionError};
use image::{imageops, ImageOutputFormat, Rgb, RgbImage};
use std::io::Cursor;

/// Pixels between the two halves, before scaling.
const GAP: u32 = 2;
const GAP_COLOR: Rgb<u8> = Rgb([64, 64, 64]);

fn upscale(image: &RgbImage, scale: u32) -> RgbImage {
    if scale <= 1 {
        return image.clone();
    }
    imageops::resize(
        image,
        image.width() * scale,
        image.height() * scale,
        imageops::FilterType::Nearest,
    )
}

/// `original` and `processed` side by side, both enlarged `scale` times.
pub fn side_by_side(original: &RgbImage, processed: &RgbImage, scale: u32) -> Result<RgbImage> {
    if original.dimensions() != processed.dimensions() {
        return Err(VisionError::DimensionMismatch {
            expected: original.dimensions(),
            actual: processed.dimensions(),
        });
    }

    let scale = scale.max(1);
    let left = upscale(original, scale);
    let right = upscale(processed, scale);
    let gap = GAP * scale;

    let mut canvas = RgbImage::from_pixel(left.width() * 2 + gap, left.height(), GAP_COLOR);
    imageops::replace(&mut canvas, &left, 0, 0);
    imageops::replace(&mut canvas, &right, (left.width() + gap) as i64, 0);
    Ok(canvas)
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>> {
    let mut cursor = Cursor::new(Vec::new());
    image.write_to(&mut cursor, ImageOutputFormat::Png)?;
    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_side_by_side_layout() {
        let original = RgbImage::from_pixel(4, 3, Rgb([255, 0, 0]));
        let processed = RgbImage::from_pixel(4, 3, Rgb([0, 0, 255]));

        let canvas = side_by_side(&original, &processed, 2).unwrap();
        assert_eq!(canvas.dimensions(), (4 * 2 * 2 + 4, 6));
        assert_eq!(canvas.get_pixel(7, 5), &Rgb([255, 0, 0]));
        assert_eq!(canvas.get_pixel(8, 0), &GAP_COLOR);
        assert_eq!(canvas.get_pixel(12, 0), &Rgb([0, 0, 255]));
    }

    #[test]
    fn test_side_by_side_size_mismatch() {
        let a = RgbImage::new(4, 3);
        let b = RgbImage::new(3, 3);
        assert!(side_by_side(&a, &b, 1).is_err());
    }

    #[test]
    fn test_png_signature() {
        let png = encode_png(&RgbImage::new(2, 2)).unwrap();
        assert_eq!(&png[..8], b"\x89PNG\r\n\x1a\n");
    }
}
