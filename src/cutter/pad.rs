use image::{ImageBuffer, Pixel, imageops};

use super::Image;
use crate::config::settings::Padding;

/// Surround `image` with a constant border.
pub fn pad<P>(image: &Image<P>, padding: Padding, fill: P) -> Image<P>
where
    P: Pixel<Subpixel = u8>,
{
    let width = image.width() + padding.left + padding.right;
    let height = image.height() + padding.top + padding.bottom;
    let mut out = ImageBuffer::from_pixel(width, height, fill);
    imageops::replace(
        &mut out,
        image,
        i64::from(padding.left),
        i64::from(padding.top),
    );
    out
}
