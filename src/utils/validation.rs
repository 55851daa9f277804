use crate::core::params::Region;
use crate::utils::error::{Result, VisionError};

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(VisionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(VisionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

/// Extensions are matched as filename suffixes, so each must start with a dot.
pub fn validate_extensions(field_name: &str, extensions: &[String]) -> Result<()> {
    for ext in extensions {
        if !ext.starts_with('.') || ext.len() < 2 || ext.contains('/') {
            return Err(VisionError::InvalidConfigValueError {
                field: field_name.to_string(),
                value: ext.clone(),
                reason: "Extension must look like '.bin'".to_string(),
            });
        }
    }
    Ok(())
}

pub fn validate_range<T: PartialOrd + std::fmt::Display + Copy>(
    field_name: &str,
    value: T,
    min: T,
    max: T,
) -> Result<()> {
    if value < min || value > max {
        return Err(VisionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: format!("Value must be between {} and {}", min, max),
        });
    }
    Ok(())
}

/// Longest side, in pixels, of one upscaled preview panel.
pub const MAX_PREVIEW_SIDE: u64 = 4096;

/// The scale must be at least 1 and the upscaled frame must fit in
/// `MAX_PREVIEW_SIDE` on both axes.
pub fn validate_preview_size(field_name: &str, scale: u32, width: u32, height: u32) -> Result<()> {
    validate_range(field_name, scale, 1, 32)?;

    let longest = width.max(height) as u64 * scale as u64;
    if longest > MAX_PREVIEW_SIDE {
        return Err(VisionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: scale.to_string(),
            reason: format!(
                "A {}x{} frame at this scale is {} pixels wide, the limit is {}",
                width, height, longest, MAX_PREVIEW_SIDE
            ),
        });
    }
    Ok(())
}

/// A detection box must be non-empty and lie inside a `width` x `height` frame.
pub fn validate_region(field_name: &str, region: &Region, width: u32, height: u32) -> Result<()> {
    if region.area() == 0 {
        return Err(VisionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: "Bottom-right corner must not be above or left of top-left corner".to_string(),
        });
    }

    let inside = |x: i32, y: i32| x >= 0 && y >= 0 && (x as u32) < width && (y as u32) < height;
    if !inside(region.top_left.x, region.top_left.y)
        || !inside(region.bottom_right.x, region.bottom_right.y)
    {
        return Err(VisionError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: region.to_string(),
            reason: format!("Region must lie inside a {}x{} frame", width, height),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::Point;

    #[test]
    fn test_validate_extensions() {
        let good = vec![".bin".to_string(), ".BIN".to_string()];
        assert!(validate_extensions("extensions", &good).is_ok());

        let bad = vec!["bin".to_string()];
        assert!(validate_extensions("extensions", &bad).is_err());
    }

    #[test]
    fn test_validate_region() {
        let region = Region::new(Point::new(15, 75), Point::new(40, 85));
        assert!(validate_region("stop_line.region", &region, 96, 96).is_ok());
        assert!(validate_region("stop_line.region", &region, 32, 96).is_err());

        let inverted = Region::new(Point::new(40, 85), Point::new(15, 75));
        assert!(validate_region("stop_line.region", &inverted, 96, 96).is_err());
    }

    #[test]
    fn test_validate_region_extreme_corners() {
        let region = Region::new(Point::new(i32::MIN, 0), Point::new(i32::MAX, 0));
        let err = validate_region("stop_line.region", &region, 96, 96).unwrap_err();
        assert!(matches!(err, VisionError::InvalidConfigValueError { .. }));

        let inverted = Region::new(Point::new(i32::MAX, i32::MAX), Point::new(i32::MIN, i32::MIN));
        assert!(validate_region("stop_line.region", &inverted, 96, 96).is_err());
    }

    #[test]
    fn test_validate_preview_size() {
        assert!(validate_preview_size("preview_scale", 4, 96, 96).is_ok());
        assert!(validate_preview_size("preview_scale", 32, 128, 96).is_ok());
        assert!(validate_preview_size("preview_scale", 0, 96, 96).is_err());
        assert!(validate_preview_size("preview_scale", 33, 96, 96).is_err());

        let err = validate_preview_size("preview_scale", 32, 4096, 4096).unwrap_err();
        assert!(err.to_string().contains("preview_scale"));
        assert!(validate_preview_size("preview_scale", 1, 4096, 4096).is_ok());
        assert!(validate_preview_size("preview_scale", 2, 4096, 16).is_err());
    }

    #[test]
    fn test_validate_range() {
        assert!(validate_range("percent_to_stop", 20u8, 0, 100).is_ok());
        assert!(validate_range("percent_to_stop", 120u8, 0, 100).is_err());
    }
}
