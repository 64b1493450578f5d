//! Overlay rendering: a pure function from a view snapshot to draw layers.
//!
//! The frontend paints the returned layers in order and never decides what
//! to draw on its own. Layer order is fixed so that points and the test
//! marker are never hidden under regions, axes or model artifacts.

use ecolor::Color32;

use crate::algorithm::{Algorithm, TaskType};
use crate::coords::{CoordinateMapper, DATA_MAX, DATA_MIN, DataPos, ScreenPos};
use crate::points::{Label, PointId, PointStore};
use crate::protocol::{DecisionBoundary, ModelUpdate};

pub const BACKGROUND: Color32 = Color32::from_rgb(0x1a, 0x1a, 0x2e);
pub const AXIS: Color32 = Color32::from_rgb(0x66, 0x66, 0x66);
pub const AXIS_TEXT: Color32 = Color32::WHITE;
// Region tints are 20% opaque, stored premultiplied.
pub const REGION_NEGATIVE: Color32 = Color32::from_rgba_premultiplied(20, 30, 51, 51);
pub const REGION_POSITIVE: Color32 = Color32::from_rgba_premultiplied(51, 20, 30, 51);
pub const REGRESSION_LINE: Color32 = Color32::from_rgb(0x00, 0xff, 0x88);
pub const CLUSTER_CENTER: Color32 = Color32::from_rgb(0xff, 0xaa, 0x00);
pub const SUPPORT_VECTOR: Color32 = Color32::from_rgb(0xff, 0xff, 0x00);
pub const TEST_POINT: Color32 = Color32::from_rgb(0xff, 0xff, 0x00);
pub const DEFAULT_POINT: Color32 = Color32::from_rgb(0x00, 0xff, 0x88);
pub const POINT_OUTLINE: Color32 = Color32::WHITE;

/// Colors for class labels and cluster indices, cycled.
pub const PALETTE: [Color32; 5] = [
    Color32::from_rgb(0x64, 0x96, 0xff),
    Color32::from_rgb(0xff, 0x64, 0x64),
    Color32::from_rgb(0x64, 0xff, 0x64),
    Color32::from_rgb(0xff, 0xaa, 0x64),
    Color32::from_rgb(0xaa, 0x64, 0xff),
];

pub const POINT_RADIUS: f64 = 6.0;
pub const POINT_STROKE: f64 = 2.0;
const CENTER_RING_RADIUS: f64 = 12.0;
const CENTER_DOT_RADIUS: f64 = 4.0;
const SUPPORT_RING_RADIUS: f64 = 10.0;
const TEST_RING_RADIUS: f64 = 8.0;
const TEST_DOT_RADIUS: f64 = 4.0;
const TICK_COUNT: usize = 10;
const TICK_SIZE: f64 = 6.0;
/// Tile size used when the grid is too small to measure its own spacing.
const FALLBACK_TILE: (f64, f64) = (12.0, 10.0);

pub fn palette_color(label: Label) -> Color32 {
    PALETTE[label.rem_euclid(PALETTE.len() as Label) as usize]
}

/// What the renderer looks at. Borrowed, never mutated.
#[derive(Debug, Clone, Copy)]
pub struct ViewState<'a> {
    pub algorithm: Algorithm,
    pub points: &'a PointStore,
    pub test_point: Option<DataPos>,
    pub payload: Option<&'a ModelUpdate>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stroke {
    pub width: f64,
    pub color: Color32,
}

impl Stroke {
    pub fn new(width: f64, color: Color32) -> Self {
        Self { width, color }
    }
}

/// Where a text label sits relative to its anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Anchor {
    CenterTop,
    RightCenter,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Rect {
        min: ScreenPos,
        max: ScreenPos,
        fill: Color32,
    },
    Circle {
        center: ScreenPos,
        radius: f64,
        fill: Option<Color32>,
        stroke: Option<Stroke>,
    },
    Segment {
        from: ScreenPos,
        to: ScreenPos,
        stroke: Stroke,
    },
    Polyline {
        points: Vec<ScreenPos>,
        stroke: Stroke,
    },
    Text {
        at: ScreenPos,
        anchor: Anchor,
        text: String,
        color: Color32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum LayerKind {
    Background,
    DecisionRegions,
    Axes,
    RegressionLine,
    ClusterCenters,
    SupportVectors,
    DataPoints,
    TestPoint,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Layer {
    pub kind: LayerKind,
    pub shapes: Vec<Shape>,
}

/// A clickable data-point glyph.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointGlyph {
    pub id: PointId,
    pub center: ScreenPos,
    pub radius: f64,
}

impl PointGlyph {
    /// Whether a pointer position falls on the glyph, outline included.
    pub fn contains(&self, pos: ScreenPos) -> bool {
        self.center.distance(pos) <= self.radius
    }
}

/// Everything to paint for one frame.
#[derive(Debug, Clone, PartialEq)]
pub struct Scene {
    pub layers: Vec<Layer>,
    pub glyphs: Vec<PointGlyph>,
}

impl Scene {
    pub fn layer(&self, kind: LayerKind) -> Option<&Layer> {
        self.layers.iter().find(|layer| layer.kind == kind)
    }

    pub fn kinds(&self) -> Vec<LayerKind> {
        self.layers.iter().map(|layer| layer.kind).collect()
    }

    /// The topmost point glyph under the pointer.
    pub fn hit_test(&self, pos: ScreenPos) -> Option<PointId> {
        hit_test(&self.glyphs, pos)
    }
}

/// Glyphs are painted in order, so the last one containing `pos` is on top.
pub fn hit_test(glyphs: &[PointGlyph], pos: ScreenPos) -> Option<PointId> {
    glyphs
        .iter()
        .rev()
        .find(|glyph| glyph.contains(pos))
        .map(|glyph| glyph.id)
}

/// Clickable glyphs for the stored points, in paint order.
pub fn point_glyphs(points: &PointStore, mapper: &CoordinateMapper) -> Vec<PointGlyph> {
    points
        .iter()
        .map(|(id, point)| PointGlyph {
            id,
            center: mapper.to_screen(point.pos()),
            radius: POINT_RADIUS + POINT_STROKE / 2.0,
        })
        .collect()
}

pub fn render(view: &ViewState<'_>, mapper: &CoordinateMapper) -> Scene {
    let visualization = view.payload.map(|payload| &payload.visualization);
    let mut layers = vec![background(mapper)];

    if let Some(boundary) = visualization.and_then(|v| v.decision_boundary.as_ref()) {
        layers.push(decision_regions(boundary, mapper));
    }
    layers.push(axes(mapper));
    if let Some(line) = visualization.and_then(|v| v.line.as_ref()) {
        layers.push(Layer {
            kind: LayerKind::RegressionLine,
            shapes: vec![Shape::Polyline {
                points: line.iter().map(|p| mapper.to_screen(*p)).collect(),
                stroke: Stroke::new(3.0, REGRESSION_LINE),
            }],
        });
    }
    if let Some(centers) = visualization.and_then(|v| v.centers.as_ref()) {
        layers.push(cluster_centers(centers, mapper));
    }
    if let Some(v) = visualization.filter(|v| v.support_vectors.is_some()) {
        let shapes = v
            .support_vectors()
            .map(|sv| Shape::Circle {
                center: mapper.to_screen(sv),
                radius: SUPPORT_RING_RADIUS,
                fill: None,
                stroke: Some(Stroke::new(2.0, SUPPORT_VECTOR)),
            })
            .collect();
        layers.push(Layer {
            kind: LayerKind::SupportVectors,
            shapes,
        });
    }

    let glyphs = point_glyphs(view.points, mapper);
    layers.push(data_points(view, &glyphs));

    if let Some(test_point) = view.test_point {
        let center = mapper.to_screen(test_point);
        layers.push(Layer {
            kind: LayerKind::TestPoint,
            shapes: vec![
                Shape::Circle {
                    center,
                    radius: TEST_RING_RADIUS,
                    fill: None,
                    stroke: Some(Stroke::new(3.0, TEST_POINT)),
                },
                Shape::Circle {
                    center,
                    radius: TEST_DOT_RADIUS,
                    fill: Some(TEST_POINT),
                    stroke: None,
                },
            ],
        });
    }

    Scene { layers, glyphs }
}

fn background(mapper: &CoordinateMapper) -> Layer {
    let viewport = mapper.viewport();
    Layer {
        kind: LayerKind::Background,
        shapes: vec![Shape::Rect {
            min: ScreenPos::new(0.0, 0.0),
            max: ScreenPos::new(viewport.width, viewport.height),
            fill: BACKGROUND,
        }],
    }
}

fn sample_at(boundary: &DecisionBoundary, index: [usize; 2]) -> Option<DataPos> {
    Some(DataPos::new(*boundary.x.get(index)?, *boundary.y.get(index)?))
}

/// Screen size of one grid cell, measured from neighbouring samples.
fn tile_size(boundary: &DecisionBoundary, mapper: &CoordinateMapper) -> (f64, f64) {
    let origin = sample_at(boundary, [0, 0]).map(|p| mapper.to_screen(p));
    let step = |index| Some((origin?, mapper.to_screen(sample_at(boundary, index)?)));
    let width = step([0, 1]).map_or(FALLBACK_TILE.0, |(a, b)| (b.x - a.x).abs());
    let height = step([1, 0]).map_or(FALLBACK_TILE.1, |(a, b)| (b.y - a.y).abs());
    (width, height)
}

fn decision_regions(boundary: &DecisionBoundary, mapper: &CoordinateMapper) -> Layer {
    let (width, height) = tile_size(boundary, mapper);
    let shapes = boundary
        .samples()
        .map(|(pos, class)| {
            let center = mapper.to_screen(pos);
            let fill = if class == 0.0 {
                REGION_NEGATIVE
            } else {
                REGION_POSITIVE
            };
            Shape::Rect {
                min: ScreenPos::new(center.x - width / 2.0, center.y - height / 2.0),
                max: ScreenPos::new(center.x + width / 2.0, center.y + height / 2.0),
                fill,
            }
        })
        .collect();
    Layer {
        kind: LayerKind::DecisionRegions,
        shapes,
    }
}

fn axes(mapper: &CoordinateMapper) -> Layer {
    let stroke = Stroke::new(1.0, AXIS);
    let bottom_left = mapper.to_screen(DataPos::new(DATA_MIN, DATA_MIN));
    let top_right = mapper.to_screen(DataPos::new(DATA_MAX, DATA_MAX));
    let (left, bottom) = (bottom_left.x, bottom_left.y);
    let (right, top) = (top_right.x, top_right.y);
    let mut shapes = vec![
        Shape::Segment {
            from: ScreenPos::new(left, bottom),
            to: ScreenPos::new(right, bottom),
            stroke,
        },
        Shape::Segment {
            from: ScreenPos::new(left, bottom),
            to: ScreenPos::new(left, top),
            stroke,
        },
    ];
    let ticks = mapper.ticks(TICK_COUNT);
    for &tick in &ticks {
        let x = mapper.to_screen(DataPos::new(tick, DATA_MIN)).x;
        shapes.push(Shape::Segment {
            from: ScreenPos::new(x, bottom),
            to: ScreenPos::new(x, bottom + TICK_SIZE),
            stroke,
        });
        shapes.push(Shape::Text {
            at: ScreenPos::new(x, bottom + TICK_SIZE + 3.0),
            anchor: Anchor::CenterTop,
            text: format!("{tick}"),
            color: AXIS_TEXT,
        });
    }
    for &tick in &ticks {
        let y = mapper.to_screen(DataPos::new(DATA_MIN, tick)).y;
        shapes.push(Shape::Segment {
            from: ScreenPos::new(left - TICK_SIZE, y),
            to: ScreenPos::new(left, y),
            stroke,
        });
        shapes.push(Shape::Text {
            at: ScreenPos::new(left - TICK_SIZE - 3.0, y),
            anchor: Anchor::RightCenter,
            text: format!("{tick}"),
            color: AXIS_TEXT,
        });
    }
    Layer {
        kind: LayerKind::Axes,
        shapes,
    }
}

fn cluster_centers(centers: &[DataPos], mapper: &CoordinateMapper) -> Layer {
    let mut shapes = Vec::with_capacity(centers.len() * 2);
    for center in centers.iter().map(|c| mapper.to_screen(*c)) {
        shapes.push(Shape::Circle {
            center,
            radius: CENTER_RING_RADIUS,
            fill: None,
            stroke: Some(Stroke::new(3.0, CLUSTER_CENTER)),
        });
    }
    for center in centers.iter().map(|c| mapper.to_screen(*c)) {
        shapes.push(Shape::Circle {
            center,
            radius: CENTER_DOT_RADIUS,
            fill: Some(CLUSTER_CENTER),
            stroke: None,
        });
    }
    Layer {
        kind: LayerKind::ClusterCenters,
        shapes,
    }
}

/// Fill color of the point at `index`.
///
/// Cluster labels come from the payload by position; a payload produced
/// before later edits may be shorter than the store, and the extra points
/// fall back to the default color.
fn point_color(view: &ViewState<'_>, index: usize, label: Option<Label>) -> Color32 {
    match view.algorithm.task_type() {
        TaskType::Classification => label.map_or(DEFAULT_POINT, palette_color),
        TaskType::Clustering => view
            .payload
            .and_then(|payload| payload.visualization.labels.as_ref())
            .and_then(|labels| labels.get(index))
            .map_or(DEFAULT_POINT, |cluster| palette_color(*cluster)),
        TaskType::Regression => DEFAULT_POINT,
    }
}

fn data_points(view: &ViewState<'_>, glyphs: &[PointGlyph]) -> Layer {
    let shapes = view
        .points
        .iter()
        .zip(glyphs)
        .enumerate()
        .map(|(index, ((_, point), glyph))| Shape::Circle {
            center: glyph.center,
            radius: POINT_RADIUS,
            fill: Some(point_color(view, index, point.label)),
            stroke: Some(Stroke::new(POINT_STROKE, POINT_OUTLINE)),
        })
        .collect();
    Layer {
        kind: LayerKind::DataPoints,
        shapes,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::points::Point;
    use crate::protocol::decode_update;
    use ndarray::Array2;

    fn view<'a>(
        algorithm: Algorithm,
        points: &'a PointStore,
        payload: Option<&'a ModelUpdate>,
        test_point: Option<DataPos>,
    ) -> ViewState<'a> {
        ViewState {
            algorithm,
            points,
            test_point,
            payload,
        }
    }

    fn fills(scene: &Scene) -> Vec<Color32> {
        scene
            .layer(LayerKind::DataPoints)
            .unwrap()
            .shapes
            .iter()
            .map(|shape| match shape {
                Shape::Circle { fill: Some(fill), .. } => *fill,
                other => panic!("unexpected shape {other:?}"),
            })
            .collect()
    }

    #[test]
    fn test_empty_view_has_background_axes_points() {
        let points = PointStore::new();
        let scene = render(
            &view(Algorithm::LinearRegression, &points, None, None),
            &CoordinateMapper::default(),
        );
        assert_eq!(
            scene.kinds(),
            vec![LayerKind::Background, LayerKind::Axes, LayerKind::DataPoints]
        );
    }

    #[test]
    fn test_full_payload_layer_order() {
        let payload = decode_update(
            r#"{"visualization": {
                "decision_boundary": {"x": [[0.0, 1.0]], "y": [[0.0, 0.0]], "z": [[0, 1]]},
                "line": [{"x": -1.0, "y": -1.0}, {"x": 1.0, "y": 1.0}],
                "centers": [{"x": 0.0, "y": 0.0}],
                "support_vectors": [[1.0, 1.0]]
            }}"#,
        )
        .unwrap();
        let points = PointStore::new();
        let scene = render(
            &view(Algorithm::Svm, &points, Some(&payload), Some(DataPos::new(2.0, 2.0))),
            &CoordinateMapper::default(),
        );
        assert_eq!(
            scene.kinds(),
            vec![
                LayerKind::Background,
                LayerKind::DecisionRegions,
                LayerKind::Axes,
                LayerKind::RegressionLine,
                LayerKind::ClusterCenters,
                LayerKind::SupportVectors,
                LayerKind::DataPoints,
                LayerKind::TestPoint,
            ]
        );
        let mut sorted = scene.kinds();
        sorted.sort();
        assert_eq!(sorted, scene.kinds());
    }

    #[test]
    fn test_region_tint_is_binary() {
        let payload = decode_update(
            r#"{"visualization": {"decision_boundary": {
                "x": [[0.0, 1.0, 2.0]], "y": [[0.0, 0.0, 0.0]], "z": [[0, 1, 2]]
            }}}"#,
        )
        .unwrap();
        let points = PointStore::new();
        let scene = render(
            &view(Algorithm::Knn, &points, Some(&payload), None),
            &CoordinateMapper::default(),
        );
        let tints: Vec<_> = scene
            .layer(LayerKind::DecisionRegions)
            .unwrap()
            .shapes
            .iter()
            .map(|shape| match shape {
                Shape::Rect { fill, min, max } => {
                    assert!(max.x > min.x);
                    *fill
                }
                other => panic!("unexpected shape {other:?}"),
            })
            .collect();
        assert_eq!(tints, vec![REGION_NEGATIVE, REGION_POSITIVE, REGION_POSITIVE]);
    }

    #[test]
    fn test_degenerate_grid_uses_fallback_tiles() {
        let points = PointStore::new();
        let mapper = CoordinateMapper::default();
        for (rows, cols) in [(2, 0), (0, 3), (1, 1)] {
            let mut payload = ModelUpdate::default();
            payload.visualization.decision_boundary = Some(DecisionBoundary {
                x: Array2::zeros((rows, cols)),
                y: Array2::zeros((rows, cols)),
                z: Array2::zeros((rows, cols)),
            });
            let scene = render(&view(Algorithm::Svm, &points, Some(&payload), None), &mapper);
            let regions = scene.layer(LayerKind::DecisionRegions).unwrap();
            assert_eq!(regions.shapes.len(), rows * cols);
        }
    }

    #[test]
    fn test_classification_colors_by_label() {
        let mut points = PointStore::new();
        points.add(Point::labeled(0.0, 0.0, 1));
        points.add(Point::labeled(1.0, 1.0, 0));
        let scene = render(
            &view(Algorithm::LogisticRegression, &points, None, None),
            &CoordinateMapper::default(),
        );
        assert_eq!(fills(&scene), vec![PALETTE[1], PALETTE[0]]);
    }

    #[test]
    fn test_clustering_colors_by_payload_labels() {
        let mut points = PointStore::new();
        for i in 0..3 {
            points.add(Point::new(i as f64, 0.0));
        }
        let mapper = CoordinateMapper::default();
        let scene = render(&view(Algorithm::Kmeans, &points, None, None), &mapper);
        assert_eq!(fills(&scene), vec![DEFAULT_POINT; 3]);

        let payload = decode_update(r#"{"visualization": {"labels": [2, 0]}}"#).unwrap();
        let scene = render(&view(Algorithm::Kmeans, &points, Some(&payload), None), &mapper);
        assert_eq!(fills(&scene), vec![PALETTE[2], PALETTE[0], DEFAULT_POINT]);
    }

    #[test]
    fn test_regression_ignores_labels() {
        let mut points = PointStore::new();
        points.add(Point::labeled(0.0, 0.0, 1));
        let payload = decode_update(r#"{"visualization": {"labels": [3]}}"#).unwrap();
        let scene = render(
            &view(Algorithm::LinearRegression, &points, Some(&payload), None),
            &CoordinateMapper::default(),
        );
        assert_eq!(fills(&scene), vec![DEFAULT_POINT]);
    }

    #[test]
    fn test_hit_test_prefers_topmost() {
        let mut points = PointStore::new();
        let below = points.add(Point::new(0.0, 0.0));
        let above = points.add(Point::new(0.1, 0.0));
        let far = points.add(Point::new(5.0, 5.0));
        let mapper = CoordinateMapper::default();
        let scene = render(&view(Algorithm::Kmeans, &points, None, None), &mapper);

        let on_both = mapper.to_screen(DataPos::new(0.05, 0.0));
        assert_eq!(scene.hit_test(on_both), Some(above));
        let on_far = mapper.to_screen(DataPos::new(5.0, 5.0));
        assert_eq!(scene.hit_test(on_far), Some(far));
        let left_edge = mapper.to_screen(DataPos::new(0.0, 0.0));
        let just_left = ScreenPos::new(left_edge.x - 6.5, left_edge.y);
        assert_eq!(scene.hit_test(just_left), Some(below));
        assert_eq!(scene.hit_test(ScreenPos::new(0.0, 0.0)), None);
    }

    #[test]
    fn test_palette_cycles() {
        assert_eq!(palette_color(5), PALETTE[0]);
        assert_eq!(palette_color(-1), PALETTE[4]);
    }
}
