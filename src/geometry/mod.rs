pub mod min_area_rect;
pub mod polygon;

pub use min_area_rect::{MinAreaRect, Vec2};
pub use polygon::{BoundingBox, LayoutPolygon, Point, Polygon};
