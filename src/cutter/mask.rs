use image::{GrayImage, Luma, Pixel};
use imageproc::drawing::{draw_line_segment_mut, draw_polygon_mut};
use imageproc::point::Point;

use super::Image;

const INSIDE: Luma<u8> = Luma([255]);

/// Scan-fill the closed polygon (boundary included) into a binary mask.
pub fn polygon_mask(width: u32, height: u32, polygon: &[Point<i32>]) -> GrayImage {
    let mut mask = GrayImage::new(width, height);

    let mut outline: Vec<Point<i32>> = Vec::with_capacity(polygon.len());
    for &p in polygon {
        if outline.last() != Some(&p) {
            outline.push(p);
        }
    }
    // draw_polygon_mut closes the outline itself and rejects an explicit closing point.
    while outline.len() > 1 && outline.first() == outline.last() {
        outline.pop();
    }

    match outline.as_slice() {
        [] => {}
        [p] => {
            if p.x >= 0 && p.y >= 0 && (p.x as u32) < width && (p.y as u32) < height {
                mask.put_pixel(p.x as u32, p.y as u32, INSIDE);
            }
        }
        [a, b] => draw_line_segment_mut(
            &mut mask,
            (a.x as f32, a.y as f32),
            (b.x as f32, b.y as f32),
            INSIDE,
        ),
        points => draw_polygon_mut(&mut mask, points, INSIDE),
    }
    mask
}

/// Keep pixels inside the mask and replace everything else with `fill`.
pub fn apply_mask<P>(image: &mut Image<P>, mask: &GrayImage, fill: P)
where
    P: Pixel<Subpixel = u8>,
{
    for (pixel, m) in image.pixels_mut().zip(mask.pixels()) {
        if m[0] == 0 {
            *pixel = fill;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_triangle_mask_includes_boundary() {
        let mask = polygon_mask(5, 5, &[Point::new(0, 0), Point::new(4, 0), Point::new(0, 4)]);
        assert_eq!(mask.get_pixel(0, 0)[0], 255);
        assert_eq!(mask.get_pixel(4, 0)[0], 255);
        assert_eq!(mask.get_pixel(1, 1)[0], 255);
        assert_eq!(mask.get_pixel(4, 4)[0], 0);
    }

    #[test]
    fn test_explicitly_closed_outline_is_accepted() {
        let mask = polygon_mask(
            4,
            4,
            &[
                Point::new(0, 0),
                Point::new(3, 0),
                Point::new(3, 3),
                Point::new(0, 3),
                Point::new(0, 0),
            ],
        );
        assert!(mask.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_single_point_and_segment() {
        let dot = polygon_mask(3, 3, &[Point::new(1, 1)]);
        assert_eq!(dot.pixels().filter(|p| p[0] == 255).count(), 1);

        let seg = polygon_mask(4, 1, &[Point::new(0, 0), Point::new(3, 0)]);
        assert!(seg.pixels().all(|p| p[0] == 255));
    }

    #[test]
    fn test_apply_mask_fills_outside() {
        let mut img = GrayImage::from_raw(2, 1, vec![10, 20]).unwrap();
        let mask = GrayImage::from_raw(2, 1, vec![255, 0]).unwrap();
        apply_mask(&mut img, &mask, Luma([99]));
        assert_eq!(img.into_raw(), vec![10, 99]);
    }
}
