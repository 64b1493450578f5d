//! Data space ⇄ screen space mapping.
//!
//! Data space is the fixed `[-10, 10] × [-10, 10]` authoring domain. Screen
//! space is the pixel rectangle of the canvas minus its margins. The mapping
//! is an emath [`RectTransform`] onto a vertically flipped plot rectangle, so
//! that data "up" is a smaller pixel y.

use std::ops::RangeInclusive;

use emath::{Rangef, Rect, RectTransform, pos2, remap};
use serde::{Deserialize, Serialize};

/// Lower and upper bound of both data axes.
pub const DATA_MIN: f64 = -10.0;
pub const DATA_MAX: f64 = 10.0;

/// A position in data coordinates, `{"x", "y"}` on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DataPos {
    pub x: f64,
    pub y: f64,
}

impl DataPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// A position in canvas pixels, origin at the top-left corner.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ScreenPos {
    pub x: f64,
    pub y: f64,
}

impl ScreenPos {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: ScreenPos) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }
}

/// Pixel margins around the plot area.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
    pub left: f64,
}

/// Canvas size and the margins reserved for the axes.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub width: f64,
    pub height: f64,
    pub margins: Margins,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            width: 600.0,
            height: 500.0,
            margins: Margins {
                top: 20.0,
                right: 20.0,
                bottom: 40.0,
                left: 50.0,
            },
        }
    }
}

/// Evenly spaced "nice" tick values covering `lo..=hi`.
///
/// The step is 1, 2 or 5 times a power of ten, picked so that roughly
/// `count` ticks fit in the interval.
pub fn nice_ticks(lo: f64, hi: f64, count: usize) -> Vec<f64> {
    let (lo, hi) = if lo <= hi { (lo, hi) } else { (hi, lo) };
    if count == 0 || hi <= lo || hi.is_nan() || lo.is_nan() {
        return vec![lo];
    }
    let step = nice_step((hi - lo) / count as f64);
    let first = (lo / step).ceil() as i64;
    let last = (hi / step).floor() as i64;
    (first..=last).map(|i| i as f64 * step).collect()
}

fn nice_step(raw: f64) -> f64 {
    let power = raw.log10().floor();
    let magnitude = 10f64.powf(power);
    let error = raw / magnitude;
    let factor = if error >= 50f64.sqrt() {
        10.0
    } else if error >= 10f64.sqrt() {
        5.0
    } else if error >= 2f64.sqrt() {
        2.0
    } else {
        1.0
    };
    factor * magnitude
}

fn span(range: Rangef) -> RangeInclusive<f64> {
    range.min as f64..=range.max as f64
}

/// Applies `transform` per axis in `f64`, so round trips stay exact to
/// double precision while the rectangles themselves live in emath.
fn apply(transform: &RectTransform, x: f64, y: f64) -> (f64, f64) {
    let (from, to) = (transform.from(), transform.to());
    (
        remap(x, span(from.x_range()), span(to.x_range())),
        remap(y, span(from.y_range()), span(to.y_range())),
    )
}

/// Bidirectional mapping between the data domain and the plot pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CoordinateMapper {
    viewport: Viewport,
    to_screen: RectTransform,
    to_data: RectTransform,
}

impl CoordinateMapper {
    pub fn new(viewport: Viewport) -> Self {
        let m = viewport.margins;
        let data_rect = Rect::from_min_max(
            pos2(DATA_MIN as f32, DATA_MIN as f32),
            pos2(DATA_MAX as f32, DATA_MAX as f32),
        );
        // Flipped vertically: data y grows up, pixel y grows down.
        let plot_rect = Rect::from_min_max(
            pos2(m.left as f32, (viewport.height - m.bottom) as f32),
            pos2((viewport.width - m.right) as f32, m.top as f32),
        );
        let to_screen = RectTransform::from_to(data_rect, plot_rect);
        Self {
            viewport,
            to_screen,
            to_data: to_screen.inverse(),
        }
    }

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    pub fn to_screen(&self, p: DataPos) -> ScreenPos {
        let (x, y) = apply(&self.to_screen, p.x, p.y);
        ScreenPos::new(x, y)
    }

    pub fn to_data(&self, p: ScreenPos) -> DataPos {
        let (x, y) = apply(&self.to_data, p.x, p.y);
        DataPos::new(x, y)
    }

    /// Tick values shared by both axes.
    pub fn ticks(&self, count: usize) -> Vec<f64> {
        nice_ticks(DATA_MIN, DATA_MAX, count)
    }

    /// Whether a data position lies inside the authoring domain (bounds included).
    pub fn contains_data(&self, p: DataPos) -> bool {
        let bounds: RangeInclusive<f64> = DATA_MIN..=DATA_MAX;
        bounds.contains(&p.x) && bounds.contains(&p.y)
    }

    /// Inverse-maps a pointer position, rejecting anything outside the domain.
    pub fn pick(&self, p: ScreenPos) -> Option<DataPos> {
        let data = self.to_data(p);
        self.contains_data(data).then_some(data)
    }
}

impl Default for CoordinateMapper {
    fn default() -> Self {
        Self::new(Viewport::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_corners_map_to_plot_area() {
        let mapper = CoordinateMapper::default();
        let bottom_left = mapper.to_screen(DataPos::new(-10.0, -10.0));
        let top_right = mapper.to_screen(DataPos::new(10.0, 10.0));
        assert_relative_eq!(bottom_left.x, 50.0);
        assert_relative_eq!(bottom_left.y, 460.0);
        assert_relative_eq!(top_right.x, 580.0);
        assert_relative_eq!(top_right.y, 20.0);
    }

    #[test]
    fn test_vertical_axis_is_inverted() {
        let mapper = CoordinateMapper::default();
        let low = mapper.to_screen(DataPos::new(0.0, -1.0));
        let high = mapper.to_screen(DataPos::new(0.0, 1.0));
        assert!(high.y < low.y);
    }

    #[test]
    fn test_round_trip() {
        let mapper = CoordinateMapper::default();
        let mut x = -10.0;
        while x <= 10.0 {
            let mut y = -10.0;
            while y <= 10.0 {
                let p = DataPos::new(x, y);
                let back = mapper.to_data(mapper.to_screen(p));
                assert_relative_eq!(back.x, p.x, epsilon = 1e-9);
                assert_relative_eq!(back.y, p.y, epsilon = 1e-9);
                y += 0.37;
            }
            x += 0.41;
        }
    }

    #[test]
    fn test_pick_rejects_margins() {
        let mapper = CoordinateMapper::default();
        assert!(mapper.pick(ScreenPos::new(10.0, 200.0)).is_none());
        assert!(mapper.pick(ScreenPos::new(300.0, 490.0)).is_none());
        assert!(mapper.pick(ScreenPos::new(599.0, 5.0)).is_none());
        let inside = mapper.pick(ScreenPos::new(315.0, 240.0)).unwrap();
        assert_relative_eq!(inside.x, 0.0, epsilon = 1e-9);
        assert_relative_eq!(inside.y, 0.0, epsilon = 1e-9);
    }

    #[test]
    fn test_pick_accepts_exact_edge() {
        let mapper = CoordinateMapper::default();
        assert!(mapper.pick(ScreenPos::new(50.0, 460.0)).is_some());
    }

    #[test]
    fn test_ticks() {
        let mapper = CoordinateMapper::default();
        assert_eq!(
            mapper.ticks(10),
            vec![-10.0, -8.0, -6.0, -4.0, -2.0, 0.0, 2.0, 4.0, 6.0, 8.0, 10.0]
        );
        assert_eq!(nice_ticks(0.0, 1.0, 5).len(), 6);
        assert_eq!(nice_ticks(3.0, 3.0, 5), vec![3.0]);
        assert_eq!(nice_ticks(f64::NAN, 1.0, 5).len(), 1);
    }

    #[test]
    fn test_custom_viewport() {
        let viewport = Viewport {
            width: 220.0,
            height: 120.0,
            margins: Margins {
                top: 10.0,
                right: 10.0,
                bottom: 10.0,
                left: 10.0,
            },
        };
        let mapper = CoordinateMapper::new(viewport);
        let center = mapper.to_screen(DataPos::new(0.0, 0.0));
        assert_relative_eq!(center.x, 110.0, epsilon = 1e-9);
        assert_relative_eq!(center.y, 60.0, epsilon = 1e-9);
        let top_left = mapper.to_data(ScreenPos::new(10.0, 10.0));
        assert_relative_eq!(top_left.x, -10.0, epsilon = 1e-9);
        assert_relative_eq!(top_left.y, 10.0, epsilon = 1e-9);
    }
}
