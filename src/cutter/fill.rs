use image::Pixel;

use super::Image;

/// Colour used outside the mask and for border pixels exposed by rotation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FillPolicy<P> {
    Explicit(P),
    /// Brightest pixel of the cropped, unrotated region.
    Auto,
}

impl<P> FillPolicy<P>
where
    P: Pixel<Subpixel = u8>,
{
    pub fn resolve(&self, region: &Image<P>) -> P {
        match self {
            FillPolicy::Explicit(p) => *p,
            FillPolicy::Auto => brightest_pixel(region).unwrap_or_else(white),
        }
    }
}

/// The pixel with the highest channel mean, first in row-major order on ties.
///
/// For single-channel images this is simply the maximum value.
pub fn brightest_pixel<P>(region: &Image<P>) -> Option<P>
where
    P: Pixel<Subpixel = u8>,
{
    let mut best: Option<(u32, P)> = None;
    for pixel in region.pixels() {
        // Channel count is fixed per pixel type, so the sum orders like the mean.
        let sum: u32 = pixel.channels().iter().map(|&c| u32::from(c)).sum();
        if best.as_ref().is_none_or(|(best_sum, _)| sum > *best_sum) {
            best = Some((sum, *pixel));
        }
    }
    best.map(|(_, p)| p)
}

fn white<P>() -> P
where
    P: Pixel<Subpixel = u8>,
{
    let channels = [u8::MAX; 4];
    *P::from_slice(&channels[..usize::from(P::CHANNEL_COUNT)])
}
