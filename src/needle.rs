//! Needle geometry: loudness → angle mapping, polygon rotation and the
//! anti-aliased polygon fill used to paint the needle.
//!
//! Angles follow the mathematical convention on a y-down screen: 0° points
//! right, 90° points up, positive rotation is counter-clockwise as seen on
//! the LCD.

use core::f32::consts::PI;

use embedded_graphics::{
    pixelcolor::Rgb565,
    prelude::*,
    primitives::Rectangle,
};

use crate::{
    config::{
        FIRST_BREAKPOINT,
        SECOND_SEGMENT_SPAN,
    },
    level::Loudness,
    offscreen::OffscreenBuffer,
};

pub const DEG_TO_RAD: f32 = PI / 180.0;

/// Needle rest position for silence (lower left).
pub const REST_DEGREES: f32 = 225.0;

/// Needle position at the first breakpoint (upper left).
pub const BREAKPOINT_DEGREES: f32 = 135.0;

/// Needle position at full scale (upper right).
pub const FULL_SCALE_DEGREES: f32 = 45.0;

const FIRST_SLOPE: f32 = 0.006;
const SECOND_SLOPE: f32 = 0.012;

/// Shape of the loudness → angle curve past the first breakpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum NeedleCurve {
    /// Keeps sweeping clockwise at double rate and pins at full scale.
    #[default]
    Monotonic,
    /// Reverses direction after the breakpoint and snaps back to rest at the
    /// ceiling, as the first dial firmware did.
    Legacy,
}

/// Needle angle in degrees for a normalised loudness.
pub fn loudness_to_degrees(value: Loudness, curve: NeedleCurve) -> f32 {
    let v = value.get();
    if v < FIRST_BREAKPOINT {
        return REST_DEGREES - FIRST_SLOPE * v as f32;
    }

    let tail = v - FIRST_BREAKPOINT;
    match curve {
        NeedleCurve::Monotonic if tail < SECOND_SEGMENT_SPAN => {
            BREAKPOINT_DEGREES - SECOND_SLOPE * tail as f32
        }
        NeedleCurve::Monotonic => FULL_SCALE_DEGREES,
        NeedleCurve::Legacy if tail < SECOND_SEGMENT_SPAN => {
            BREAKPOINT_DEGREES + SECOND_SLOPE * tail as f32
        }
        NeedleCurve::Legacy => REST_DEGREES,
    }
}

/// Needle angle in radians for a normalised loudness.
pub fn loudness_to_angle(value: Loudness, curve: NeedleCurve) -> f32 {
    loudness_to_degrees(value, curve) * DEG_TO_RAD
}

/// Sub-pixel polygon vertex in screen coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Vertex {
    pub x: f32,
    pub y: f32,
}

impl Vertex {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

impl From<Point> for Vertex {
    fn from(p: Point) -> Self {
        Self::new(p.x as f32, p.y as f32)
    }
}

/// Needle outline pointing along +x with the pivot at the origin.
pub const NEEDLE_TEMPLATE: [Vertex; 5] = [
    Vertex::new(-12.0, -3.0),
    Vertex::new(0.0, -4.5),
    Vertex::new(54.0, 0.0),
    Vertex::new(0.0, 4.5),
    Vertex::new(-12.0, 3.0),
];

/// Rotate `template` by `angle` radians about the origin and move it to `pivot`.
///
/// Always returns a fresh copy; the template is never touched.
pub fn rotate_polygon<const N: usize>(
    template: &[Vertex; N],
    angle: f32,
    pivot: Vertex,
) -> [Vertex; N] {
    let (sin, cos) = (libm::sinf(angle), libm::cosf(angle));
    template.map(|v| Vertex {
        x: pivot.x + v.x * cos + v.y * sin,
        y: pivot.y - v.x * sin + v.y * cos,
    })
}

/// Smallest pixel rectangle containing every vertex.
pub fn polygon_bounds(points: &[Vertex]) -> Rectangle {
    let Some(first) = points.first() else {
        return Rectangle::zero();
    };
    let (mut min, mut max) = (*first, *first);
    for p in &points[1..] {
        min.x = min.x.min(p.x);
        min.y = min.y.min(p.y);
        max.x = max.x.max(p.x);
        max.y = max.y.max(p.y);
    }
    Rectangle::with_corners(
        Point::new(libm::floorf(min.x) as i32, libm::floorf(min.y) as i32),
        Point::new(libm::floorf(max.x) as i32, libm::floorf(max.y) as i32),
    )
}

/// Even-odd point-in-polygon test.
pub fn contains(points: &[Vertex], x: f32, y: f32) -> bool {
    let n = points.len();
    let mut inside = false;
    for (i, a) in points.iter().enumerate() {
        let b = points[(i + n - 1) % n];
        if (a.y > y) != (b.y > y) && x < (b.x - a.x) * (y - a.y) / (b.y - a.y) + a.x {
            inside = !inside;
        }
    }
    inside
}

/// Fill `points` with `color`, sampling each pixel `factor × factor` times and
/// blending partial coverage over what is already in `target`.
///
/// Returns the pixel area that may have changed.
pub fn fill_polygon_aa(
    target: &mut OffscreenBuffer,
    points: &[Vertex],
    color: Rgb565,
    factor: u8,
) -> Rectangle {
    let bounds = polygon_bounds(points).intersection(&target.bounding_box());
    if bounds.is_zero_sized() {
        return bounds;
    }

    let factor = u32::from(factor.max(1));
    let samples = factor * factor;
    let step = 1.0 / factor as f32;

    for pixel in bounds.points() {
        let mut hits = 0;
        for sy in 0..factor {
            let y = pixel.y as f32 + (sy as f32 + 0.5) * step;
            for sx in 0..factor {
                let x = pixel.x as f32 + (sx as f32 + 0.5) * step;
                if contains(points, x, y) {
                    hits += 1;
                }
            }
        }
        if hits > 0 {
            target.blend(pixel, color, hits, samples);
        }
    }

    bounds
}

#[cfg(test)]
mod tests {
    use approx::assert_abs_diff_eq;

    use super::*;

    const EPS: f32 = 1e-3;

    #[test]
    fn silence_rests_at_225_degrees() {
        for curve in [NeedleCurve::Monotonic, NeedleCurve::Legacy] {
            assert_abs_diff_eq!(loudness_to_degrees(Loudness::ZERO, curve), 225.0, epsilon = EPS);
            assert_abs_diff_eq!(
                loudness_to_angle(Loudness::ZERO, curve),
                225.0 * PI / 180.0,
                epsilon = EPS
            );
        }
    }

    #[test]
    fn first_breakpoint_is_continuous() {
        for curve in [NeedleCurve::Monotonic, NeedleCurve::Legacy] {
            let below = loudness_to_degrees(Loudness::new(14_999), curve);
            let at = loudness_to_degrees(Loudness::new(15_000), curve);
            assert_abs_diff_eq!(at, 135.0, epsilon = EPS);
            assert_abs_diff_eq!(below, at, epsilon = 0.02);
        }
    }

    #[test]
    fn legacy_curve_pins_back_at_rest() {
        let curve = NeedleCurve::Legacy;
        assert_abs_diff_eq!(loudness_to_degrees(Loudness::new(18_750), curve), 180.0, epsilon = EPS);
        assert_abs_diff_eq!(loudness_to_degrees(Loudness::new(22_500), curve), 225.0, epsilon = EPS);
        assert_abs_diff_eq!(loudness_to_degrees(Loudness::new(40_000), curve), 225.0, epsilon = EPS);
    }

    #[test]
    fn monotonic_curve_sweeps_to_full_scale() {
        let curve = NeedleCurve::Monotonic;
        let mut last = loudness_to_degrees(Loudness::ZERO, curve);
        for v in (0..=Loudness::MAX.get()).step_by(50) {
            let deg = loudness_to_degrees(Loudness::new(v), curve);
            assert!(deg <= last + EPS, "{v}: {deg} > {last}");
            last = deg;
        }
        assert_abs_diff_eq!(loudness_to_degrees(Loudness::new(22_499), curve), 45.012, epsilon = EPS);
        assert_abs_diff_eq!(loudness_to_degrees(Loudness::MAX, curve), 45.0, epsilon = EPS);
    }

    #[test]
    fn ten_sample_frame_maps_to_205_8_degrees() {
        let loudness = crate::level::estimate_loudness(&[3200; 10]);
        assert_eq!(loudness.get(), 3200);
        assert_abs_diff_eq!(
            loudness_to_degrees(loudness, NeedleCurve::default()),
            205.8,
            epsilon = EPS
        );
    }

    #[test]
    fn mapping_is_pure() {
        let v = Loudness::new(17_321);
        let a = loudness_to_angle(v, NeedleCurve::default());
        let b = loudness_to_angle(v, NeedleCurve::default());
        assert_eq!(a.to_bits(), b.to_bits());
    }

    #[test]
    fn rotation_is_counter_clockwise_on_screen() {
        let tip = [Vertex::new(10.0, 0.0)];
        let up = rotate_polygon(&tip, 90.0 * DEG_TO_RAD, Vertex::new(100.0, 100.0));
        assert_abs_diff_eq!(up[0].x, 100.0, epsilon = EPS);
        assert_abs_diff_eq!(up[0].y, 90.0, epsilon = EPS);

        let rest = rotate_polygon(&tip, REST_DEGREES * DEG_TO_RAD, Vertex::default());
        assert!(rest[0].x < 0.0 && rest[0].y > 0.0);
    }

    #[test]
    fn rotation_leaves_template_alone() {
        let before = NEEDLE_TEMPLATE;
        let _ = rotate_polygon(&NEEDLE_TEMPLATE, 1.0, Vertex::new(5.0, 5.0));
        assert_eq!(before, NEEDLE_TEMPLATE);
    }

    #[test]
    fn bounds_cover_all_vertices() {
        let square = [
            Vertex::new(2.5, 3.5),
            Vertex::new(6.2, 3.5),
            Vertex::new(6.2, 8.9),
            Vertex::new(2.5, 8.9),
        ];
        let b = polygon_bounds(&square);
        assert_eq!(b.top_left, Point::new(2, 3));
        assert_eq!(b.bottom_right(), Some(Point::new(6, 8)));
        assert_eq!(polygon_bounds(&[]), Rectangle::zero());
    }

    #[test]
    fn even_odd_containment() {
        let square = [
            Vertex::new(0.0, 0.0),
            Vertex::new(4.0, 0.0),
            Vertex::new(4.0, 4.0),
            Vertex::new(0.0, 4.0),
        ];
        assert!(contains(&square, 2.0, 2.0));
        assert!(!contains(&square, 5.0, 2.0));
        assert!(!contains(&square, 2.0, -0.5));
        assert!(!contains(&[], 0.0, 0.0));
    }

    #[test]
    fn aa_fill_blends_edges_and_leaves_outside_untouched() {
        let area = Rectangle::new(Point::zero(), Size::new(8, 8));
        let mut buf = OffscreenBuffer::try_new(area, Rgb565::BLACK).unwrap();
        // Covers pixels 1..=3 fully in x, half of pixel 4; rows 1..=3.
        let poly = [
            Vertex::new(1.0, 1.0),
            Vertex::new(4.5, 1.0),
            Vertex::new(4.5, 4.0),
            Vertex::new(1.0, 4.0),
        ];
        let touched = fill_polygon_aa(&mut buf, &poly, Rgb565::WHITE, 4);

        assert_eq!(buf.pixel(Point::new(2, 2)), Some(Rgb565::WHITE));
        assert_eq!(buf.pixel(Point::new(0, 0)), Some(Rgb565::BLACK));
        assert_eq!(buf.pixel(Point::new(6, 2)), Some(Rgb565::BLACK));

        let edge = buf.pixel(Point::new(4, 2)).unwrap();
        assert!(edge.r() > 0 && edge.r() < Rgb565::MAX_R);
        assert!(touched.contains(Point::new(4, 2)));
    }

    #[test]
    fn aa_fill_outside_buffer_is_noop() {
        let area = Rectangle::new(Point::new(10, 10), Size::new(4, 4));
        let mut buf = OffscreenBuffer::try_new(area, Rgb565::BLACK).unwrap();
        let poly = [Vertex::new(0.0, 0.0), Vertex::new(3.0, 0.0), Vertex::new(0.0, 3.0)];
        let touched = fill_polygon_aa(&mut buf, &poly, Rgb565::WHITE, 4);
        assert!(touched.is_zero_sized());
        assert!(area.points().all(|p| buf.pixel(p) == Some(Rgb565::BLACK)));
    }
}
