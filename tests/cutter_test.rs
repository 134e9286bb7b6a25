// Phase 2: 行切り出しテスト (切り出し範囲, マスク, 塗り色, 回転)

use image::{DynamicImage, GrayImage, Luma, LumaA, Rgb, RgbImage, imageops};

use pagexml_lines::config::settings::CutMode;
use pagexml_lines::cutter::{
    AngleSpec, CutParams, FillPolicy, cutout, cutout_dynamic, cutout_points, normalize_page,
    resolve_angle,
};
use pagexml_lines::geometry::{LayoutPolygon, Point, Polygon};

// ============================================================
// Helpers
// ============================================================

/// Gray page whose pixel values encode their position.
fn gradient_page(width: u32, height: u32) -> GrayImage {
    GrayImage::from_fn(width, height, |x, y| Luma([((x * 7 + y * 13) % 200) as u8]))
}

fn polygon(points: &str) -> Polygon {
    Polygon::parse(points).expect("valid points string")
}

// ============================================================
// 1. BOX mode without rotation
// ============================================================

#[test]
fn test_box_dimensions_match_bounding_box() {
    let page = gradient_page(120, 80);
    let poly = polygon("10,5 60,8 55,30 12,25");
    let bbox = poly.bounding_box().unwrap();

    let cut = cutout(&page, &poly, &CutParams::new(CutMode::Box));

    assert_eq!(i64::from(cut.height()), bbox.height());
    assert_eq!(i64::from(cut.width()), bbox.width());
    assert_eq!(cut.dimensions(), (51, 26));
}

#[test]
fn test_zero_angle_is_identity_crop() {
    let page = gradient_page(100, 60);
    let poly = polygon("20,10 70,10 70,40 20,40");

    let params = CutParams::new(CutMode::Box).with_angle(AngleSpec::Fixed(0.0));
    let cut = cutout(&page, &poly, &params);
    let expected = imageops::crop_imm(&page, 20, 10, 51, 31).to_image();

    assert_eq!(cut, expected);
}

#[test]
fn test_page_is_not_modified() {
    let page = gradient_page(50, 50);
    let before = page.clone();
    let params = CutParams::new(CutMode::Polygon)
        .with_angle(AngleSpec::Fixed(7.0))
        .with_fill(FillPolicy::Explicit(Luma([0])));
    let _ = cutout(&page, &polygon("5,5 40,8 30,30"), &params);
    assert_eq!(page, before);
}

#[test]
fn test_scale_maps_layout_coordinates() {
    let page = gradient_page(100, 100);
    // Layout defined on a page twice as wide as the image.
    let poly = polygon("20,20 120,20 120,60 20,60");
    let params = CutParams::new(CutMode::Box).with_scale(0.5);
    let cut = cutout(&page, &poly, &params);
    assert_eq!(cut.dimensions(), (51, 21));
    assert_eq!(cut.get_pixel(0, 0), page.get_pixel(10, 10));
}

#[test]
fn test_fractional_points_are_rounded_after_scaling() {
    let page = gradient_page(100, 100);
    // 20.6 * 0.5 = 10.3 and 61.4 * 0.5 = 30.7: columns 10..=31, rows 10..=31.
    let params = CutParams::new(CutMode::Box).with_scale(0.5);
    let cut = cutout_points(&page, "20.6,20.6 61.4,20.6 61.4,61.4 20.6,61.4", &params).unwrap();
    assert_eq!(cut.dimensions(), (22, 22));
    assert_eq!(cut.get_pixel(0, 0), page.get_pixel(10, 10));
}

// ============================================================
// 2. POLYGON mode masking
// ============================================================

#[test]
fn test_polygon_mask_keeps_inside_and_fills_outside() {
    let page = gradient_page(60, 60);
    let fill = Luma([255u8]);
    let params = CutParams::new(CutMode::Polygon).with_fill(FillPolicy::Explicit(fill));

    // Right triangle with legs along the top and left edges of its box.
    let cut = cutout(&page, &polygon("10,10 40,10 10,40"), &params);
    assert_eq!(cut.dimensions(), (31, 31));

    for (x, y, pixel) in cut.enumerate_pixels() {
        if x + y <= 28 {
            assert_eq!(pixel, page.get_pixel(x + 10, y + 10), "inside at ({x}, {y})");
        } else if x + y >= 32 {
            assert_eq!(*pixel, fill, "outside at ({x}, {y})");
        }
    }
}

#[test]
fn test_polygon_mask_rgb_uses_fill_per_channel() {
    let page = RgbImage::from_pixel(40, 40, Rgb([10, 20, 30]));
    let fill = Rgb([200, 100, 50]);
    let params = CutParams::new(CutMode::Polygon).with_fill(FillPolicy::Explicit(fill));

    let cut = cutout(&page, &polygon("0,0 20,0 0,20"), &params);
    assert_eq!(*cut.get_pixel(20, 20), fill);
    assert_eq!(*cut.get_pixel(2, 2), Rgb([10, 20, 30]));
}

#[test]
fn test_auto_fill_is_maximum_of_crop() {
    let mut page = GrayImage::from_pixel(50, 50, Luma([40]));
    // Unique brightest pixel inside the triangle's bounding box.
    page.put_pixel(12, 12, Luma([180]));
    // Brighter pixel outside the bounding box must not be used.
    page.put_pixel(45, 45, Luma([250]));

    let params = CutParams::new(CutMode::Polygon);
    let cut = cutout(&page, &polygon("10,10 30,10 10,30"), &params);

    assert_eq!(*cut.get_pixel(20, 20), Luma([180]));
    assert_eq!(*cut.get_pixel(1, 1), Luma([40]));
}

// ============================================================
// 3. 退化したジオメトリ
// ============================================================

#[test]
fn test_empty_polygon_gives_empty_result() {
    let page = gradient_page(20, 20);
    let cut = cutout(&page, &Polygon::default(), &CutParams::new(CutMode::Polygon));
    assert_eq!(cut.dimensions(), (0, 0));
}

#[test]
fn test_polygon_outside_image_gives_empty_result() {
    let page = gradient_page(20, 20);
    for points in ["100,100 120,100 120,120", "-30,-30 -10,-30 -10,-10"] {
        let cut = cutout(&page, &polygon(points), &CutParams::new(CutMode::Mbr));
        assert_eq!(cut.dimensions(), (0, 0), "points {points}");
    }
}

#[test]
fn test_collinear_polygon_does_not_panic() {
    let page = gradient_page(30, 30);
    let params = CutParams::new(CutMode::Mbr).with_angle(AngleSpec::Auto { max_angle: 10.0 });
    let cut = cutout(&page, &polygon("5,5 10,5 20,5"), &params);
    assert_eq!(cut.height(), 1);
    assert_eq!(cut.width(), 16);
}

#[test]
fn test_partially_outside_polygon_is_clamped() {
    let page = gradient_page(30, 30);
    let cut = cutout(&page, &polygon("-5,-5 10,-5 10,10 -5,10"), &CutParams::new(CutMode::Box));
    assert_eq!(cut.dimensions(), (11, 11));
    assert_eq!(cut.get_pixel(0, 0), page.get_pixel(0, 0));
}

#[test]
fn test_malformed_points_string_is_an_error() {
    let page = gradient_page(10, 10);
    let result = cutout_points(&page, "1,2 3", &CutParams::new(CutMode::Box));
    assert!(result.is_err());
}

// ============================================================
// 4. MBR mode
// ============================================================

#[test]
fn test_mbr_on_axis_aligned_rectangle_matches_box() {
    let page = gradient_page(80, 50);
    let poly = polygon("10,10 60,10 60,30 10,30");

    let boxed = cutout(&page, &poly, &CutParams::new(CutMode::Box));
    let mbr = cutout(&page, &poly, &CutParams::new(CutMode::Mbr));

    assert_eq!(mbr.dimensions(), boxed.dimensions());
    assert_eq!(mbr, boxed);
}

// ============================================================
// 5. Rotation
// ============================================================

#[test]
fn test_fixed_rotation_expands_and_fills_border() {
    let page = GrayImage::from_pixel(100, 20, Luma([0]));
    let params = CutParams::new(CutMode::Box)
        .with_angle(AngleSpec::Fixed(30.0))
        .with_fill(FillPolicy::Explicit(Luma([200])));

    let cut = cutout(&page, &polygon("0,0 99,0 99,19 0,19"), &params);

    // Bounding box of the rotated corners inside the 97x68 canvas.
    assert_eq!(cut.dimensions(), (96, 67));
    assert_eq!(*cut.get_pixel(0, 0), Luma([200]));
    assert_eq!(*cut.get_pixel(48, 33), Luma([0]));
}

/// Corners of a 100x20 rectangle tilted clockwise by `deg`, as PAGE points.
fn tilted_rectangle(deg: f64) -> Polygon {
    let (s, c) = deg.to_radians().sin_cos();
    let origin = (20.0, 20.0);
    let corners = [(0.0, 0.0), (100.0, 0.0), (100.0, 20.0), (0.0, 20.0)];
    let points = corners
        .iter()
        .map(|&(u, v)| {
            let x = origin.0 + u * c - v * s;
            let y = origin.1 + u * s + v * c;
            Point::new(y.round() as i32, x.round() as i32)
        })
        .collect();
    Polygon::new(points)
}

#[test]
fn test_auto_angle_straightens_tilted_line() {
    let poly = tilted_rectangle(10.0);
    let angle = resolve_angle(AngleSpec::Auto { max_angle: 20.0 }, &poly);
    assert!((angle + 10.0).abs() < 0.75, "expected about -10, got {angle}");
}

#[test]
fn test_auto_angle_above_limit_is_discarded() {
    let poly = tilted_rectangle(10.0);
    assert_eq!(resolve_angle(AngleSpec::Auto { max_angle: 5.0 }, &poly), 0.0);
    assert_eq!(resolve_angle(AngleSpec::Auto { max_angle: 0.0 }, &poly), 0.0);
}

#[test]
fn test_auto_angle_exactly_45_degrees_is_not_folded() {
    // A diamond: its minimum-area rectangle is rotated by exactly 45 degrees.
    let poly = polygon("20,0 40,20 20,40 0,20");
    assert_eq!(resolve_angle(AngleSpec::Auto { max_angle: 45.0 }, &poly), 45.0);
    assert_eq!(resolve_angle(AngleSpec::Auto { max_angle: 44.9 }, &poly), 0.0);
}

#[test]
fn test_explicit_angle_wins_over_auto_estimate() {
    let poly = tilted_rectangle(10.0);
    assert_eq!(resolve_angle(AngleSpec::Fixed(3.5), &poly), 3.5);
}

#[test]
fn test_auto_rotation_produces_wide_line() {
    let page = GrayImage::from_pixel(160, 80, Luma([90]));
    let poly = tilted_rectangle(10.0);
    let params = CutParams::new(CutMode::Polygon)
        .with_angle(AngleSpec::Auto { max_angle: 20.0 })
        .with_fill(FillPolicy::Explicit(Luma([255])));

    let unrotated = cutout(&page, &poly, &CutParams::new(CutMode::Polygon));
    let straightened = cutout(&page, &poly, &params);

    // De-skewing a 100x20 line shrinks its bounding box height towards 20.
    assert!(straightened.height() < unrotated.height());
    assert!((98..=104).contains(&straightened.width()), "width {}", straightened.width());
}

// ============================================================
// 6. デコード済みページ
// ============================================================

#[test]
fn test_normalize_page_keeps_gray_and_rgb() {
    let gray = DynamicImage::ImageLuma8(GrayImage::new(4, 4));
    assert!(matches!(normalize_page(gray), DynamicImage::ImageLuma8(_)));

    let rgb = DynamicImage::ImageRgb8(RgbImage::new(4, 4));
    assert!(matches!(normalize_page(rgb), DynamicImage::ImageRgb8(_)));

    let gray_alpha = DynamicImage::ImageLumaA8(image::GrayAlphaImage::from_pixel(4, 4, LumaA([9, 255])));
    let normalized = normalize_page(gray_alpha);
    assert!(matches!(normalized, DynamicImage::ImageRgb8(_)));
    assert_eq!(normalized.to_rgb8().get_pixel(0, 0), &Rgb([9, 9, 9]));
}

#[test]
fn test_cutout_dynamic_on_rgb_page() {
    let page = DynamicImage::ImageRgb8(RgbImage::from_pixel(40, 40, Rgb([1, 2, 3])));
    let polygon = LayoutPolygon::parse("10,10 29,10 29,19 10,19").unwrap();
    let cut = cutout_dynamic(&page, &polygon, CutMode::Box, AngleSpec::Fixed(0.0), 1.0);
    assert!(matches!(cut, DynamicImage::ImageRgb8(_)));
    assert_eq!((cut.width(), cut.height()), (20, 10));
}
