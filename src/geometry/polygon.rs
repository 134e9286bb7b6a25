use crate::error::{LineCutError, Result};

/// Integer pixel coordinate in (row, column) order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Point {
    pub row: i32,
    pub col: i32,
}

impl Point {
    pub const fn new(row: i32, col: i32) -> Self {
        Point { row, col }
    }
}

/// Axis-aligned, inclusive bounding box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoundingBox {
    pub min_row: i32,
    pub max_row: i32,
    pub min_col: i32,
    pub max_col: i32,
}

impl BoundingBox {
    pub fn height(&self) -> i64 {
        i64::from(self.max_row) - i64::from(self.min_row) + 1
    }

    pub fn width(&self) -> i64 {
        i64::from(self.max_col) - i64::from(self.min_col) + 1
    }

    /// Smallest box containing all points, `None` for an empty iterator.
    pub fn of_points<I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = Point>,
    {
        let mut iter = points.into_iter();
        let first = iter.next()?;
        let init = BoundingBox {
            min_row: first.row,
            max_row: first.row,
            min_col: first.col,
            max_col: first.col,
        };
        Some(iter.fold(init, |b, p| BoundingBox {
            min_row: b.min_row.min(p.row),
            max_row: b.max_row.max(p.row),
            min_col: b.min_col.min(p.col),
            max_col: b.max_col.max(p.col),
        }))
    }
}

/// Ordered outline of a region. Order matters for masking only.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Polygon {
    pub points: Vec<Point>,
}

impl Polygon {
    pub fn new(points: Vec<Point>) -> Self {
        Polygon { points }
    }

    /// Parse a PAGE points string: whitespace-separated `col,row` pairs.
    ///
    /// Fractional coordinates are rounded to the nearest pixel.
    pub fn parse(s: &str) -> Result<Self> {
        Ok(LayoutPolygon::parse(s)?.to_pixels(1.0))
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// Map layout coordinates onto an image whose width differs from the declared one.
    pub fn scaled(&self, scale: f64) -> Polygon {
        if scale == 1.0 {
            return self.clone();
        }
        let points = self
            .points
            .iter()
            .map(|p| {
                Point::new(
                    (f64::from(p.row) * scale).round() as i32,
                    (f64::from(p.col) * scale).round() as i32,
                )
            })
            .collect();
        Polygon { points }
    }

    pub fn bounding_box(&self) -> Option<BoundingBox> {
        BoundingBox::of_points(self.points.iter().copied())
    }

    pub fn translated(&self, d_row: i32, d_col: i32) -> Polygon {
        let points = self
            .points
            .iter()
            .map(|p| Point::new(p.row + d_row, p.col + d_col))
            .collect();
        Polygon { points }
    }

    /// Render back to the PAGE `col,row` string form.
    pub fn to_points_string(&self) -> String {
        self.points
            .iter()
            .map(|p| format!("{},{}", p.col, p.row))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// Region outline exactly as written in the layout, before it is mapped
/// onto an image. Coordinates stay fractional until [`to_pixels`].
///
/// [`to_pixels`]: LayoutPolygon::to_pixels
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LayoutPolygon {
    /// `(row, col)` pairs.
    pub points: Vec<(f64, f64)>,
}

impl LayoutPolygon {
    /// Parse a PAGE points string: whitespace-separated `col,row` pairs.
    pub fn parse(s: &str) -> Result<Self> {
        let points = s
            .split_whitespace()
            .map(parse_pair)
            .collect::<Result<Vec<_>>>()?;
        Ok(LayoutPolygon { points })
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Scale onto the image grid, rounding each coordinate once.
    pub fn to_pixels(&self, scale: f64) -> Polygon {
        let points = self
            .points
            .iter()
            .map(|&(row, col)| Point::new((row * scale).round() as i32, (col * scale).round() as i32))
            .collect();
        Polygon { points }
    }

    pub fn to_points_string(&self) -> String {
        self.points
            .iter()
            .map(|(row, col)| format!("{col},{row}"))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

fn parse_pair(pair: &str) -> Result<(f64, f64)> {
    let (col, row) = pair
        .split_once(',')
        .ok_or_else(|| LineCutError::layout(format!("Invalid point '{pair}': expected 'col,row'")))?;
    Ok((parse_coord(row, pair)?, parse_coord(col, pair)?))
}

fn parse_coord(value: &str, pair: &str) -> Result<f64> {
    value
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
        .ok_or_else(|| LineCutError::layout(format!("Invalid coordinate in point '{pair}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_swaps_to_row_col() {
        let poly = Polygon::parse("10,20 30,40").unwrap();
        assert_eq!(poly.points, vec![Point::new(20, 10), Point::new(40, 30)]);
    }

    #[test]
    fn test_parse_rounds_fractional_coordinates() {
        let poly = Polygon::parse("1.6,2.4").unwrap();
        assert_eq!(poly.points, vec![Point::new(2, 2)]);
    }

    #[test]
    fn test_parse_rejects_malformed_pair() {
        assert!(Polygon::parse("10;20").is_err());
        assert!(Polygon::parse("a,1").is_err());
    }

    #[test]
    fn test_parse_empty_string_is_empty_polygon() {
        let poly = Polygon::parse("   ").unwrap();
        assert!(poly.is_empty());
        assert!(poly.bounding_box().is_none());
    }

    #[test]
    fn test_scaled_rounds_to_nearest() {
        let poly = Polygon::new(vec![Point::new(3, 5)]);
        let scaled = poly.scaled(0.5);
        assert_eq!(scaled.points, vec![Point::new(2, 3)]);
    }

    #[test]
    fn test_layout_polygon_rounds_after_scaling() {
        // 2.6 * 0.5 = 1.3 -> 1, whereas rounding first would give 3 * 0.5 = 1.5 -> 2.
        let layout = LayoutPolygon::parse("2.6,2.6").unwrap();
        assert_eq!(layout.to_pixels(0.5).points, vec![Point::new(1, 1)]);
    }

    #[test]
    fn test_layout_polygon_keeps_written_form() {
        let layout = LayoutPolygon::parse("10,20 30.5,40").unwrap();
        assert_eq!(layout.points, vec![(20.0, 10.0), (40.0, 30.5)]);
        assert_eq!(layout.to_points_string(), "10,20 30.5,40");
    }

    #[test]
    fn test_points_string_roundtrip_order() {
        let poly = Polygon::parse("1,2 3,4").unwrap();
        assert_eq!(poly.to_points_string(), "1,2 3,4");
    }
}
