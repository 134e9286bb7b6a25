// Phase 2: 行切り出し: ページ画像 + 行ポリゴン -> 傾き補正・マスク済みの行画像

pub mod fill;
pub mod mask;
pub mod pad;
pub mod rotate;

use image::{DynamicImage, ImageBuffer, Pixel, imageops};
use imageproc::point::Point as XyPoint;

use crate::config::settings::{CutMode, Padding};
use crate::geometry::{LayoutPolygon, MinAreaRect, Polygon, Vec2};

pub use fill::FillPolicy;
use rotate::Rotation;

/// Owned 8-bit pixel buffer.
pub type Image<P> = ImageBuffer<P, Vec<u8>>;

/// Rotations smaller than this are treated as none.
const ANGLE_EPSILON: f64 = 1e-9;

/// Where the de-skew rotation comes from.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AngleSpec {
    /// Rotate clockwise by this many degrees (0 disables rotation).
    Fixed(f64),
    /// Estimate from the polygon's minimum-area rectangle, accepted only
    /// when its magnitude is at most `max_angle` degrees.
    Auto { max_angle: f64 },
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CutParams<P> {
    pub mode: CutMode,
    pub angle: AngleSpec,
    pub fill: FillPolicy<P>,
    /// Factor mapping layout coordinates onto the image's pixel grid.
    pub scale: f64,
}

impl<P> CutParams<P> {
    pub fn new(mode: CutMode) -> Self {
        CutParams {
            mode,
            angle: AngleSpec::Fixed(0.0),
            fill: FillPolicy::Auto,
            scale: 1.0,
        }
    }

    pub fn with_angle(mut self, angle: AngleSpec) -> Self {
        self.angle = angle;
        self
    }

    pub fn with_fill(mut self, fill: FillPolicy<P>) -> Self {
        self.fill = fill;
        self
    }

    pub fn with_scale(mut self, scale: f64) -> Self {
        self.scale = scale;
        self
    }
}

/// Cut the region outlined by `polygon` out of `page`.
///
/// The page image is never modified; the result is a new buffer. Degenerate
/// geometry (empty polygon, or a bounding box that does not overlap the
/// image) yields a 0x0 image instead of an error.
///
/// Steps:
/// 1. Scale the polygon and crop the page to its bounding box (clamped to the image)
/// 2. Resolve the rotation angle and the fill colour on the unrotated crop
/// 3. Rotate crop and polygon with the same transform, expanding the canvas
/// 4. For `Mbr`, replace the polygon by its minimum-area rectangle
/// 5. For `Polygon`/`Mbr`, fill everything outside the polygon
/// 6. Crop tightly to the final polygon
pub fn cutout<P>(page: &Image<P>, polygon: &Polygon, params: &CutParams<P>) -> Image<P>
where
    P: Pixel<Subpixel = u8> + Send + Sync + 'static,
{
    cut_pixels(page, &polygon.scaled(params.scale), params)
}

/// [`cutout`] on a polygon that is already on the page's pixel grid.
fn cut_pixels<P>(page: &Image<P>, polygon: &Polygon, params: &CutParams<P>) -> Image<P>
where
    P: Pixel<Subpixel = u8> + Send + Sync + 'static,
{
    let Some(bbox) = polygon.bounding_box() else {
        return ImageBuffer::new(0, 0);
    };

    let (page_w, page_h) = (i64::from(page.width()), i64::from(page.height()));
    let top = i64::from(bbox.min_row).max(0);
    let left = i64::from(bbox.min_col).max(0);
    let bottom = i64::from(bbox.max_row).min(page_h - 1);
    let right = i64::from(bbox.max_col).min(page_w - 1);
    if top > bottom || left > right {
        return ImageBuffer::new(0, 0);
    }

    let crop = imageops::crop_imm(
        page,
        left as u32,
        top as u32,
        (right - left + 1) as u32,
        (bottom - top + 1) as u32,
    )
    .to_image();
    let local = polygon.translated(-(top as i32), -(left as i32));

    let angle = resolve_angle(params.angle, &local);
    let fill = params.fill.resolve(&crop);

    let (mut region, mut outline) = if angle.abs() > ANGLE_EPSILON {
        let rotation = Rotation::expanded(crop.width(), crop.height(), angle);
        let outline: Vec<XyPoint<i32>> = local
            .points
            .iter()
            .map(|p| {
                let (x, y) = rotation.apply(f64::from(p.col), f64::from(p.row));
                XyPoint::new(x.round() as i32, y.round() as i32)
            })
            .collect();
        (rotation.warp(&crop, fill), outline)
    } else {
        let outline = local
            .points
            .iter()
            .map(|p| XyPoint::new(p.col, p.row))
            .collect();
        (crop, outline)
    };

    if params.mode == CutMode::Mbr {
        outline = min_area_rect_outline(&outline);
    }

    if matches!(params.mode, CutMode::Polygon | CutMode::Mbr) {
        let polygon_mask = mask::polygon_mask(region.width(), region.height(), &outline);
        mask::apply_mask(&mut region, &polygon_mask, fill);
    }

    crop_to_outline(&region, &outline)
}

/// Parse a PAGE points string and cut it out, see [`cutout`]. Fractional
/// coordinates are scaled before they are rounded.
pub fn cutout_points<P>(
    page: &Image<P>,
    points: &str,
    params: &CutParams<P>,
) -> crate::error::Result<Image<P>>
where
    P: Pixel<Subpixel = u8> + Send + Sync + 'static,
{
    let polygon = LayoutPolygon::parse(points)?.to_pixels(params.scale);
    Ok(cut_pixels(page, &polygon, params))
}

/// Bring a decoded page into a colour type [`cutout_dynamic`] cuts without
/// converting: grayscale and RGB pass through, everything else becomes RGB.
pub fn normalize_page(page: DynamicImage) -> DynamicImage {
    match page {
        DynamicImage::ImageLuma8(_) | DynamicImage::ImageRgb8(_) => page,
        other => DynamicImage::ImageRgb8(other.to_rgb8()),
    }
}

/// Cut a layout polygon from a decoded page of any colour type. Grayscale
/// pages stay single-channel; everything else is cut as RGB. Fill is automatic.
///
/// Pages that are neither grayscale nor RGB are converted on every call;
/// pass them through [`normalize_page`] first when cutting many lines.
pub fn cutout_dynamic(
    page: &DynamicImage,
    polygon: &LayoutPolygon,
    mode: CutMode,
    angle: AngleSpec,
    scale: f64,
) -> DynamicImage {
    let polygon = polygon.to_pixels(scale);
    match page {
        DynamicImage::ImageLuma8(gray) => {
            let params = CutParams::new(mode).with_angle(angle);
            DynamicImage::ImageLuma8(cut_pixels(gray, &polygon, &params))
        }
        DynamicImage::ImageRgb8(rgb) => {
            let params = CutParams::new(mode).with_angle(angle);
            DynamicImage::ImageRgb8(cut_pixels(rgb, &polygon, &params))
        }
        other => {
            let rgb = other.to_rgb8();
            let params = CutParams::new(mode).with_angle(angle);
            DynamicImage::ImageRgb8(cut_pixels(&rgb, &polygon, &params))
        }
    }
}

/// Pad a cut line with its own brightest colour.
pub fn pad_dynamic(line: &DynamicImage, padding: Padding) -> DynamicImage {
    match line {
        DynamicImage::ImageLuma8(gray) => {
            let fill = FillPolicy::Auto.resolve(gray);
            DynamicImage::ImageLuma8(pad::pad(gray, padding, fill))
        }
        other => {
            let rgb = other.to_rgb8();
            let fill = FillPolicy::Auto.resolve(&rgb);
            DynamicImage::ImageRgb8(pad::pad(&rgb, padding, fill))
        }
    }
}

/// Clockwise rotation that straightens the region.
///
/// The automatic estimate is the minimum-area rectangle's orientation folded
/// into (-45, 45]: rectangles reported steeper than 45 degrees are read as
/// `angle - 90`. The rectangle is measured on (row, col) ordered points.
pub fn resolve_angle(spec: AngleSpec, local: &Polygon) -> f64 {
    match spec {
        AngleSpec::Fixed(angle) => angle,
        AngleSpec::Auto { max_angle } if max_angle > 0.0 => {
            let points: Vec<Vec2> = local
                .points
                .iter()
                .map(|p| Vec2::new(f64::from(p.row), f64::from(p.col)))
                .collect();
            let Some(rect) = MinAreaRect::from_points(&points) else {
                return 0.0;
            };
            let candidate = if rect.angle > 45.0 {
                rect.angle - 90.0
            } else {
                rect.angle
            };
            if candidate.abs() > max_angle {
                0.0
            } else {
                candidate
            }
        }
        AngleSpec::Auto { .. } => 0.0,
    }
}

fn min_area_rect_outline(outline: &[XyPoint<i32>]) -> Vec<XyPoint<i32>> {
    let points: Vec<Vec2> = outline
        .iter()
        .map(|p| Vec2::new(f64::from(p.x), f64::from(p.y)))
        .collect();
    match MinAreaRect::from_points(&points) {
        Some(rect) => rect
            .corners()
            .iter()
            .map(|c| XyPoint::new(c.x.round() as i32, c.y.round() as i32))
            .collect(),
        None => outline.to_vec(),
    }
}

fn crop_to_outline<P>(region: &Image<P>, outline: &[XyPoint<i32>]) -> Image<P>
where
    P: Pixel<Subpixel = u8> + 'static,
{
    let (w, h) = (i64::from(region.width()), i64::from(region.height()));
    let bounds = outline.iter().fold(None, |acc: Option<(i64, i64, i64, i64)>, p| {
        let (x, y) = (i64::from(p.x), i64::from(p.y));
        Some(match acc {
            None => (x, y, x, y),
            Some((x0, y0, x1, y1)) => (x0.min(x), y0.min(y), x1.max(x), y1.max(y)),
        })
    });
    let Some((x0, y0, x1, y1)) = bounds else {
        return ImageBuffer::new(0, 0);
    };

    let (x0, y0) = (x0.max(0), y0.max(0));
    let (x1, y1) = (x1.min(w - 1), y1.min(h - 1));
    if x0 > x1 || y0 > y1 {
        return ImageBuffer::new(0, 0);
    }
    imageops::crop_imm(
        region,
        x0 as u32,
        y0 as u32,
        (x1 - x0 + 1) as u32,
        (y1 - y0 + 1) as u32,
    )
    .to_image()
}
