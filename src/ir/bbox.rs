//! Axis-aligned bounding boxes in XYXY form.

use super::coord::Coord;

/// An axis-aligned bounding box stored as (xmin, ymin, xmax, ymax).
///
/// Boxes derived from polygons are always ordered, but may be degenerate:
/// a single point or a collinear polygon yields zero width or height, and
/// that box is passed through as-is.
#[derive(Clone, Copy, PartialEq)]
pub struct BBoxXYXY<TSpace> {
    pub min: Coord<TSpace>,
    pub max: Coord<TSpace>,
}

impl<TSpace> BBoxXYXY<TSpace> {
    #[inline]
    pub fn from_xyxy(xmin: f64, ymin: f64, xmax: f64, ymax: f64) -> Self {
        Self {
            min: Coord::new(xmin, ymin),
            max: Coord::new(xmax, ymax),
        }
    }

    /// Builds the tightest box around a set of points.
    ///
    /// Returns `None` when there are no points.
    pub fn enclosing<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Coord<TSpace>>,
        TSpace: 'a,
    {
        let mut points = points.into_iter();
        let first = points.next()?;
        let (xmin, ymin, xmax, ymax) = points.fold(
            (first.x, first.y, first.x, first.y),
            |(xmin, ymin, xmax, ymax), p| (xmin.min(p.x), ymin.min(p.y), xmax.max(p.x), ymax.max(p.y)),
        );
        Some(Self::from_xyxy(xmin, ymin, xmax, ymax))
    }

    #[inline]
    pub fn xmin(&self) -> f64 {
        self.min.x
    }

    #[inline]
    pub fn ymin(&self) -> f64 {
        self.min.y
    }

    #[inline]
    pub fn xmax(&self) -> f64 {
        self.max.x
    }

    #[inline]
    pub fn ymax(&self) -> f64 {
        self.max.y
    }

    #[inline]
    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    #[inline]
    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    #[inline]
    pub fn area(&self) -> f64 {
        self.width() * self.height()
    }

    /// (x, y, width, height) with (x, y) the top-left corner. COCO layout.
    #[inline]
    pub fn to_xywh(&self) -> (f64, f64, f64, f64) {
        (self.xmin(), self.ymin(), self.width(), self.height())
    }

    /// (center x, center y, width, height) in the box's own space.
    #[inline]
    pub fn to_cxcywh(&self) -> (f64, f64, f64, f64) {
        let (w, h) = (self.width(), self.height());
        (self.xmin() + w / 2.0, self.ymin() + h / 2.0, w, h)
    }
}

impl<TSpace> std::fmt::Debug for BBoxXYXY<TSpace> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BBoxXYXY")
            .field("xmin", &self.min.x)
            .field("ymin", &self.min.y)
            .field("xmax", &self.max.x)
            .field("ymax", &self.max.y)
            .finish()
    }
}
