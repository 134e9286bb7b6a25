// Rotate-and-expand: one affine transform shared by the pixels and the polygon.

use image::{ImageBuffer, Pixel};
use imageproc::geometric_transformations::{Interpolation, Projection, warp_into};

use super::Image;

/// Clockwise rotation about the image centre onto a canvas large enough to
/// hold the whole rotated rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rotation {
    /// Row-major 2x3 affine matrix mapping source (x, y) to canvas (x, y).
    matrix: [f64; 6],
    pub width: u32,
    pub height: u32,
}

impl Rotation {
    pub fn expanded(width: u32, height: u32, angle_deg: f64) -> Self {
        let theta = angle_deg.to_radians();
        let (sin, cos) = theta.sin_cos();
        let (w, h) = (f64::from(width), f64::from(height));

        let new_w = (h * sin.abs() + w * cos.abs()).ceil();
        let new_h = (h * cos.abs() + w * sin.abs()).ceil();

        // Integer centre of the source, float centre of the canvas.
        let cx = f64::from(width / 2);
        let cy = f64::from(height / 2);
        let tx = new_w / 2.0 - cos * cx + sin * cy;
        let ty = new_h / 2.0 - sin * cx - cos * cy;

        Rotation {
            matrix: [cos, -sin, tx, sin, cos, ty],
            width: new_w as u32,
            height: new_h as u32,
        }
    }

    pub fn apply(&self, x: f64, y: f64) -> (f64, f64) {
        let m = &self.matrix;
        (m[0] * x + m[1] * y + m[2], m[3] * x + m[4] * y + m[5])
    }

    /// Resample `image` onto the expanded canvas, bilinear, exposed border set to `fill`.
    pub fn warp<P>(&self, image: &Image<P>, fill: P) -> Image<P>
    where
        P: Pixel<Subpixel = u8> + Send + Sync + 'static,
    {
        let mut out = ImageBuffer::from_pixel(self.width, self.height, fill);
        let m = self.matrix.map(|v| v as f32);
        let Some(projection) = Projection::from_matrix([m[0], m[1], m[2], m[3], m[4], m[5], 0.0, 0.0, 1.0])
        else {
            tracing::warn!("rotation matrix is not invertible, returning blank canvas");
            return out;
        };
        warp_into(image, &projection, Interpolation::Bilinear, fill, &mut out);
        out
    }
}
