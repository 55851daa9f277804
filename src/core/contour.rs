//! Border following on binary masks (Suzuki & Abe, 1985).
//!
//! Every outer border and every hole border of the non-zero pixels becomes
//! one contour. Points in the middle of straight horizontal, vertical or
//! diagonal runs are dropped, leaving only the corners of each border.

use crate::core::params::Point;
use image::GrayImage;

pub type Contour = Vec<Point>;

// Neighbour offsets (dx, dy), counter-clockwise on screen starting east.
const NEIGHBOURS: [(i32, i32); 8] = [
    (1, 0),
    (1, -1),
    (0, -1),
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, 1),
    (1, 1),
];

/// Label grid with a one pixel zero frame around the mask.
struct Labels {
    width: i32,
    height: i32,
    cells: Vec<i32>,
}

impl Labels {
    fn from_mask(mask: &GrayImage) -> Self {
        let width = mask.width() as i32 + 2;
        let height = mask.height() as i32 + 2;
        let mut cells = vec![0; (width * height) as usize];
        for (x, y, pixel) in mask.enumerate_pixels() {
            if pixel[0] > 0 {
                cells[((y as i32 + 1) * width + x as i32 + 1) as usize] = 1;
            }
        }
        Self {
            width,
            height,
            cells,
        }
    }

    fn get(&self, x: i32, y: i32) -> i32 {
        self.cells[(y * self.width + x) as usize]
    }

    fn set(&mut self, x: i32, y: i32, value: i32) {
        self.cells[(y * self.width + x) as usize] = value;
    }
}

fn direction(from: (i32, i32), to: (i32, i32)) -> usize {
    let delta = (to.0 - from.0, to.1 - from.1);
    NEIGHBOURS.iter().position(|&d| d == delta).unwrap_or(0)
}

fn step(from: (i32, i32), dir: usize) -> (i32, i32) {
    let (dx, dy) = NEIGHBOURS[dir % 8];
    (from.0 + dx, from.1 + dy)
}

/// Follow one border starting at `start`, with `previous` the zero pixel the
/// scan came from. Marks the border in `labels` with `nbd`.
fn follow_border(labels: &mut Labels, start: (i32, i32), previous: (i32, i32), nbd: i32) -> Vec<(i32, i32)> {
    let start_dir = direction(start, previous);

    // clockwise search for the first non-zero neighbour
    let first = (0..8)
        .map(|k| step(start, (start_dir + 8 - k) % 8))
        .find(|&(x, y)| labels.get(x, y) != 0);

    let Some(first) = first else {
        labels.set(start.0, start.1, -nbd);
        return vec![start];
    };

    let mut points = Vec::new();
    let mut prev = first;
    let mut current = start;

    loop {
        points.push(current);

        // counter-clockwise search starting just after `prev`
        let base = direction(current, prev);
        let mut east_is_zero = false;
        let mut next = prev;
        for k in 1..=8 {
            let dir = (base + k) % 8;
            let candidate = step(current, dir);
            if labels.get(candidate.0, candidate.1) != 0 {
                next = candidate;
                break;
            }
            if dir == 0 {
                east_is_zero = true;
            }
        }

        if east_is_zero {
            labels.set(current.0, current.1, -nbd);
        } else if labels.get(current.0, current.1) == 1 {
            labels.set(current.0, current.1, nbd);
        }

        if next == start && current == first {
            break;
        }
        prev = current;
        current = next;
    }

    points
}

/// Remove points lying strictly inside a straight run of the closed border.
fn compress(points: Vec<(i32, i32)>) -> Vec<(i32, i32)> {
    let n = points.len();
    if n <= 2 {
        return points;
    }

    (0..n)
        .filter(|&i| {
            let prev = points[(i + n - 1) % n];
            let cur = points[i];
            let next = points[(i + 1) % n];
            (cur.0 - prev.0, cur.1 - prev.1) != (next.0 - cur.0, next.1 - cur.1)
        })
        .map(|i| points[i])
        .collect()
}

/// All outer and hole borders of the non-zero pixels of `mask`, in raster
/// order of their starting pixel.
pub fn find_contours(mask: &GrayImage) -> Vec<Contour> {
    let mut labels = Labels::from_mask(mask);
    let mut contours = Vec::new();
    let mut nbd = 1;

    for y in 1..labels.height - 1 {
        for x in 1..labels.width - 1 {
            let value = labels.get(x, y);
            if value == 0 {
                continue;
            }

            let previous = if value == 1 && labels.get(x - 1, y) == 0 {
                Some((x - 1, y))
            } else if value >= 1 && labels.get(x + 1, y) == 0 {
                Some((x + 1, y))
            } else {
                None
            };

            if let Some(previous) = previous {
                nbd += 1;
                let border = follow_border(&mut labels, (x, y), previous, nbd);
                contours.push(
                    compress(border)
                        .into_iter()
                        .map(|(bx, by)| Point::new(bx - 1, by - 1))
                        .collect(),
                );
            }
        }
    }

    contours
}

/// Absolute polygon area of a closed contour (shoelace formula).
pub fn contour_area(contour: &[Point]) -> f64 {
    if contour.len() < 3 {
        return 0.0;
    }

    let twice: i64 = contour
        .iter()
        .zip(contour.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum();

    (twice as f64 / 2.0).abs()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::params::Region;
    use crate::core::raster::fill_rectangle;

    fn filled(width: u32, height: u32, regions: &[Region]) -> GrayImage {
        let mut mask = GrayImage::new(width, height);
        for region in regions {
            fill_rectangle(&mut mask, region, 255);
        }
        mask
    }

    #[test]
    fn test_empty_mask_has_no_contours() {
        assert!(find_contours(&GrayImage::new(10, 10)).is_empty());
    }

    #[test]
    fn test_filled_square_compresses_to_corners() {
        let mask = filled(20, 20, &[Region::new(Point::new(2, 3), Point::new(11, 12))]);
        let contours = find_contours(&mask);

        assert_eq!(contours.len(), 1);
        let square = &contours[0];
        assert_eq!(square.len(), 4);
        for corner in [
            Point::new(2, 3),
            Point::new(11, 3),
            Point::new(11, 12),
            Point::new(2, 12),
        ] {
            assert!(square.contains(&corner), "missing corner {:?}", corner);
        }
        assert_eq!(contour_area(square), 81.0);
    }

    #[test]
    fn test_single_pixel_blob() {
        let mut mask = GrayImage::new(5, 5);
        mask.put_pixel(2, 2, image::Luma([255]));
        let contours = find_contours(&mask);

        assert_eq!(contours, vec![vec![Point::new(2, 2)]]);
        assert_eq!(contour_area(&contours[0]), 0.0);
    }

    #[test]
    fn test_blob_touching_image_border() {
        let mask = filled(6, 6, &[Region::new(Point::new(0, 0), Point::new(5, 5))]);
        let contours = find_contours(&mask);

        assert_eq!(contours.len(), 1);
        assert_eq!(contour_area(&contours[0]), 25.0);
    }

    #[test]
    fn test_separate_blobs_and_holes() {
        let mut mask = filled(
            30,
            30,
            &[
                Region::new(Point::new(1, 1), Point::new(10, 10)),
                Region::new(Point::new(15, 15), Point::new(25, 25)),
            ],
        );
        // punch a hole in the second blob
        for y in 18..=21 {
            for x in 18..=21 {
                mask.put_pixel(x, y, image::Luma([0]));
            }
        }

        let contours = find_contours(&mask);
        // two outer borders and one hole border
        assert_eq!(contours.len(), 3);

        let mut areas: Vec<f64> = contours.iter().map(|c| contour_area(c)).collect();
        areas.sort_by(|a, b| b.total_cmp(a));
        assert_eq!(areas[0], 100.0);
        assert_eq!(areas[1], 81.0);
        assert!(areas[2] > 0.0 && areas[2] < 36.0);
    }

    #[test]
    fn test_diagonal_run_compresses() {
        let mut mask = GrayImage::new(10, 10);
        for i in 0..6 {
            mask.put_pixel(i + 2, i + 2, image::Luma([255]));
        }
        let contours = find_contours(&mask);

        assert_eq!(contours.len(), 1);
        assert_eq!(contours[0], vec![Point::new(2, 2), Point::new(7, 7)]);
    }
}
