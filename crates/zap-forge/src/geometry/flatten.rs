//! Path flattening: path commands → polyline contours.
//!
//! Béziers are flattened by De Casteljau bisection until the control points
//! sit within `curve_tolerance` of the chord. Elliptical arcs go through
//! lyon's endpoint → center conversion and are sampled with a segment count
//! solved from the chord-error formula `error ≈ r·(1 − cos(Δ/2))`.

use glam::DVec2;
use lyon::geom::{Angle, Arc, ArcFlags, Point, SvgArc, Vector};
use serde::{Deserialize, Serialize};

use super::path::{parse_path, PathCommand, PathError};
use super::polygon::distance_to_segment;

/// Consecutive contour points closer than this are merged.
pub const POINT_EPSILON: f64 = 1e-3;

/// Hard cap on the number of segments a single arc or ellipse may produce.
pub const MAX_ARC_SEGMENTS: usize = 1024;

/// Tolerances for curve flattening, in the path's own length units.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FlattenOptions {
    pub curve_tolerance: f64,
    pub arc_tolerance: f64,
    pub max_recursion_depth: u32,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            curve_tolerance: 0.75,
            arc_tolerance: 0.75,
            max_recursion_depth: 10,
        }
    }
}

/// A flattened polyline. Closed contours never repeat their first point.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Contour {
    pub points: Vec<DVec2>,
    pub closed: bool,
}

impl Contour {
    pub fn new(points: Vec<DVec2>, closed: bool) -> Self {
        Self { points, closed }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Area of the axis-aligned bounding box.
    pub fn bounds_area(&self) -> f64 {
        let Some(&first) = self.points.first() else { return 0.0 };
        let (min, max) = self
            .points
            .iter()
            .fold((first, first), |(lo, hi), &p| (lo.min(p), hi.max(p)));
        let extent = max - min;
        extent.x * extent.y
    }

    /// Polyline length, including the closing edge for closed contours.
    pub fn length(&self) -> f64 {
        let open: f64 = self
            .points
            .windows(2)
            .map(|w| w[0].distance(w[1]))
            .sum();
        match (self.closed, self.points.first(), self.points.last()) {
            (true, Some(&first), Some(&last)) => open + last.distance(first),
            _ => open,
        }
    }
}

/// Parse and flatten a path string.
pub fn flatten_path(data: &str, options: &FlattenOptions) -> Result<Vec<Contour>, PathError> {
    let commands = parse_path(data)?;
    Ok(flatten_commands(&commands, options))
}

/// Flatten already-parsed commands.
pub fn flatten_commands(commands: &[PathCommand], options: &FlattenOptions) -> Vec<Contour> {
    let mut flattener = Flattener::new(*options);
    for command in commands {
        flattener.command(command);
    }
    flattener.finish(false);
    flattener.contours
}

#[inline(always)]
fn midpoint(a: DVec2, b: DVec2) -> DVec2 {
    (a + b) * 0.5
}

/// Number of segments needed so that a circular arc of `radius` spanning
/// `sweep` radians deviates from its chords by at most `tolerance`.
pub fn arc_segment_count(radius: f64, sweep: f64, tolerance: f64, min_segments: usize) -> usize {
    let min_segments = min_segments.max(1);
    if !(radius > 0.0) || !sweep.is_finite() {
        return min_segments;
    }
    let ratio = (1.0 - tolerance.max(0.0) / radius).clamp(-1.0, 1.0);
    let step = 2.0 * ratio.acos();
    if !(step > 0.0) {
        return MAX_ARC_SEGMENTS;
    }
    let needed = (sweep.abs() / step).ceil();
    (needed as usize).clamp(min_segments, MAX_ARC_SEGMENTS)
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum LastControl {
    None,
    Quadratic(DVec2),
    Cubic(DVec2),
}

struct Flattener {
    options: FlattenOptions,
    contours: Vec<Contour>,
    current: Vec<DVec2>,
    pen: DVec2,
    start: DVec2,
    last_control: LastControl,
}

impl Flattener {
    fn new(options: FlattenOptions) -> Self {
        Self {
            options,
            contours: Vec::new(),
            current: Vec::new(),
            pen: DVec2::ZERO,
            start: DVec2::ZERO,
            last_control: LastControl::None,
        }
    }

    fn resolve(&self, p: DVec2, relative: bool) -> DVec2 {
        if relative {
            self.pen + p
        } else {
            p
        }
    }

    fn command(&mut self, command: &PathCommand) {
        match *command {
            PathCommand::MoveTo { to, relative } => {
                let to = self.resolve(to, relative);
                self.finish(true);
                self.current.push(to);
                self.pen = to;
                self.start = to;
                self.last_control = LastControl::None;
            }
            PathCommand::LineTo { to, relative } => {
                let to = self.resolve(to, relative);
                self.line_to(to);
            }
            PathCommand::HorizontalTo { x, relative } => {
                let x = if relative { self.pen.x + x } else { x };
                self.line_to(DVec2::new(x, self.pen.y));
            }
            PathCommand::VerticalTo { y, relative } => {
                let y = if relative { self.pen.y + y } else { y };
                self.line_to(DVec2::new(self.pen.x, y));
            }
            PathCommand::QuadraticTo { ctrl, to, relative } => {
                let ctrl = self.resolve(ctrl, relative);
                let to = self.resolve(to, relative);
                self.quadratic_to(ctrl, to);
            }
            PathCommand::SmoothQuadraticTo { to, relative } => {
                let to = self.resolve(to, relative);
                let ctrl = match self.last_control {
                    LastControl::Quadratic(prev) => self.pen * 2.0 - prev,
                    _ => self.pen,
                };
                self.quadratic_to(ctrl, to);
            }
            PathCommand::CubicTo { ctrl1, ctrl2, to, relative } => {
                let ctrl1 = self.resolve(ctrl1, relative);
                let ctrl2 = self.resolve(ctrl2, relative);
                let to = self.resolve(to, relative);
                self.cubic_to(ctrl1, ctrl2, to);
            }
            PathCommand::SmoothCubicTo { ctrl2, to, relative } => {
                let ctrl2 = self.resolve(ctrl2, relative);
                let to = self.resolve(to, relative);
                let ctrl1 = match self.last_control {
                    LastControl::Cubic(prev) => self.pen * 2.0 - prev,
                    _ => self.pen,
                };
                self.cubic_to(ctrl1, ctrl2, to);
            }
            PathCommand::ArcTo { radii, x_rotation, large_arc, sweep, to, relative } => {
                let to = self.resolve(to, relative);
                self.arc_to(radii, x_rotation, large_arc, sweep, to);
            }
            PathCommand::Close => {
                self.finish(true);
                self.pen = self.start;
                self.last_control = LastControl::None;
            }
        }
    }

    /// Drawing after a close (without a move) starts a new contour at the
    /// previous start point.
    fn begin_segment(&mut self) {
        if self.current.is_empty() {
            self.current.push(self.pen);
        }
    }

    fn push(&mut self, p: DVec2) {
        match self.current.last() {
            Some(last) if last.distance(p) <= POINT_EPSILON => {}
            _ => self.current.push(p),
        }
    }

    fn line_to(&mut self, to: DVec2) {
        self.begin_segment();
        self.push(to);
        self.pen = to;
        self.last_control = LastControl::None;
    }

    fn quadratic_to(&mut self, ctrl: DVec2, to: DVec2) {
        self.begin_segment();
        let from = self.pen;
        self.flatten_quadratic(from, ctrl, to, 0);
        self.pen = to;
        self.last_control = LastControl::Quadratic(ctrl);
    }

    fn cubic_to(&mut self, ctrl1: DVec2, ctrl2: DVec2, to: DVec2) {
        self.begin_segment();
        let from = self.pen;
        self.flatten_cubic(from, ctrl1, ctrl2, to, 0);
        self.pen = to;
        self.last_control = LastControl::Cubic(ctrl2);
    }

    fn flatten_quadratic(&mut self, p0: DVec2, p1: DVec2, p2: DVec2, depth: u32) {
        if depth >= self.options.max_recursion_depth
            || distance_to_segment(p1, p0, p2) <= self.options.curve_tolerance
        {
            self.push(p2);
            return;
        }
        let p01 = midpoint(p0, p1);
        let p12 = midpoint(p1, p2);
        let p012 = midpoint(p01, p12);
        self.flatten_quadratic(p0, p01, p012, depth + 1);
        self.flatten_quadratic(p012, p12, p2, depth + 1);
    }

    fn flatten_cubic(&mut self, p0: DVec2, p1: DVec2, p2: DVec2, p3: DVec2, depth: u32) {
        let deviation = distance_to_segment(p1, p0, p3).max(distance_to_segment(p2, p0, p3));
        if depth >= self.options.max_recursion_depth || deviation <= self.options.curve_tolerance {
            self.push(p3);
            return;
        }
        let p01 = midpoint(p0, p1);
        let p12 = midpoint(p1, p2);
        let p23 = midpoint(p2, p3);
        let p012 = midpoint(p01, p12);
        let p123 = midpoint(p12, p23);
        let p0123 = midpoint(p012, p123);
        self.flatten_cubic(p0, p01, p012, p0123, depth + 1);
        self.flatten_cubic(p0123, p123, p23, p3, depth + 1);
    }

    fn arc_to(&mut self, radii: DVec2, x_rotation_deg: f64, large_arc: bool, sweep: bool, to: DVec2) {
        let from = self.pen;
        let radii = radii.abs();
        if radii.x <= f64::EPSILON || radii.y <= f64::EPSILON || from.distance(to) <= POINT_EPSILON {
            self.line_to(to);
            return;
        }

        let svg_arc = SvgArc {
            from: Point::new(from.x, from.y),
            to: Point::new(to.x, to.y),
            radii: Vector::new(radii.x, radii.y),
            x_rotation: Angle::radians(x_rotation_deg.to_radians()),
            flags: ArcFlags { large_arc, sweep },
        };
        let arc = Arc::from_svg_arc(&svg_arc);
        let sweep_angle = arc.sweep_angle.radians;
        if !sweep_angle.is_finite() || sweep_angle.abs() < 1e-12 {
            self.line_to(to);
            return;
        }

        self.begin_segment();
        let radius = arc.radii.x.max(arc.radii.y);
        let segments = arc_segment_count(radius, sweep_angle, self.options.arc_tolerance, 1);
        for i in 1..segments {
            let p = arc.sample(i as f64 / segments as f64);
            self.push(DVec2::new(p.x, p.y));
        }
        self.push(to);
        self.pen = to;
        self.last_control = LastControl::None;
    }

    /// Emit the contour under construction, if it has enough points.
    fn finish(&mut self, closed: bool) {
        let mut points = std::mem::take(&mut self.current);
        if closed {
            while points.len() > 1 {
                match (points.first(), points.last()) {
                    (Some(first), Some(last)) if first.distance(*last) <= POINT_EPSILON => {
                        points.pop();
                    }
                    _ => break,
                }
            }
        }
        match points.len() {
            0 | 1 => {}
            2 => self.contours.push(Contour::new(points, false)),
            _ => self.contours.push(Contour::new(points, closed)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use std::f64::consts::PI;

    fn flatten(data: &str) -> Vec<Contour> {
        flatten_path(data, &FlattenOptions::default()).unwrap()
    }

    fn max_distance_to_polyline(samples: &[DVec2], poly: &[DVec2]) -> f64 {
        samples
            .iter()
            .map(|&s| {
                poly.windows(2)
                    .map(|w| distance_to_segment(s, w[0], w[1]))
                    .fold(f64::INFINITY, f64::min)
            })
            .fold(0.0, f64::max)
    }

    #[test]
    fn closed_square() {
        let contours = flatten("M 0 0 L 10 0 L 10 10 L 0 10 Z");
        assert_eq!(contours.len(), 1);
        assert!(contours[0].closed);
        assert_eq!(contours[0].len(), 4);
    }

    #[test]
    fn explicit_return_to_start_is_not_duplicated() {
        let contours = flatten("M 0 0 L 10 0 L 10 10 L 0 0 Z");
        assert_eq!(contours[0].len(), 3);
        assert!(contours[0].closed);
    }

    #[test]
    fn unterminated_contour_is_open() {
        let contours = flatten("M 0 0 L 10 0 L 10 10");
        assert_eq!(contours.len(), 1);
        assert!(!contours[0].closed);
        assert_eq!(contours[0].len(), 3);
    }

    #[test]
    fn move_starts_new_contour() {
        let contours = flatten("M 0 0 L 10 0 L 10 10 Z M 20 20 l 5 0 l 0 5 z");
        assert_eq!(contours.len(), 2);
        assert_eq!(contours[1].points[0], DVec2::new(20.0, 20.0));
        assert_eq!(contours[1].points[2], DVec2::new(25.0, 25.0));
    }

    #[test]
    fn move_closes_previous_contour() {
        let contours = flatten("M 0 0 L 10 0 L 10 10 M 20 20 L 30 20 L 30 30");
        assert_eq!(contours.len(), 2);
        assert!(contours[0].closed);
        assert_eq!(contours[0].len(), 3);
        // only the trailing subpath is left open
        assert!(!contours[1].closed);
    }

    #[test]
    fn move_after_two_points_stays_open() {
        let contours = flatten("M 0 0 L 10 0 M 20 20 L 30 20 L 30 30 Z");
        assert!(!contours[0].closed);
        assert!(contours[1].closed);
    }

    #[test]
    fn duplicate_points_are_dropped() {
        let contours = flatten("M 0 0 L 0 0 L 10 0 L 10.0001 0 L 10 10 Z");
        assert_eq!(contours[0].len(), 3);
    }

    #[test]
    fn relative_horizontal_and_vertical() {
        let contours = flatten("M 5 5 h 10 v 10 h -10 z");
        assert_eq!(
            contours[0].points,
            vec![
                DVec2::new(5.0, 5.0),
                DVec2::new(15.0, 5.0),
                DVec2::new(15.0, 15.0),
                DVec2::new(5.0, 15.0)
            ]
        );
    }

    #[test]
    fn cubic_within_tolerance() {
        let (p0, p1, p2, p3) = (
            DVec2::new(0.0, 0.0),
            DVec2::new(0.0, 100.0),
            DVec2::new(100.0, 100.0),
            DVec2::new(100.0, 0.0),
        );
        let contours = flatten("M 0 0 C 0 100 100 100 100 0");
        let poly = &contours[0].points;
        assert!(poly.len() > 4);
        assert_eq!(*poly.last().unwrap(), p3);

        let samples: Vec<DVec2> = (0..=1000)
            .map(|i| {
                let t = i as f64 / 1000.0;
                let u = 1.0 - t;
                p0 * (u * u * u) + p1 * (3.0 * u * u * t) + p2 * (3.0 * u * t * t) + p3 * (t * t * t)
            })
            .collect();
        assert!(max_distance_to_polyline(&samples, poly) <= 0.75 + 1e-9);
    }

    #[test]
    fn quadratic_within_tolerance() {
        let (p0, p1, p2) = (DVec2::new(0.0, 0.0), DVec2::new(50.0, 80.0), DVec2::new(100.0, 0.0));
        let contours = flatten("M 0 0 Q 50 80 100 0");
        let poly = &contours[0].points;

        let samples: Vec<DVec2> = (0..=1000)
            .map(|i| {
                let t = i as f64 / 1000.0;
                let u = 1.0 - t;
                p0 * (u * u) + p1 * (2.0 * u * t) + p2 * (t * t)
            })
            .collect();
        assert!(max_distance_to_polyline(&samples, poly) <= 0.75 + 1e-9);
    }

    #[test]
    fn degenerate_curve_terminates() {
        let contours = flatten("M 0 0 C 0 0 0 0 10 0");
        assert_eq!(contours[0].points, vec![DVec2::ZERO, DVec2::new(10.0, 0.0)]);
    }

    #[test]
    fn smooth_cubic_reflects_previous_control() {
        // The S segment mirrors (0,-50) about (50,0) to get (100,50): a symmetric wave.
        let contours = flatten("M -50 0 C -50 50 0 -50 50 0 S 150 50 150 0");
        let poly = &contours[0].points;
        let max_y = poly.iter().map(|p| p.y).fold(f64::MIN, f64::max);
        let min_y = poly.iter().map(|p| p.y).fold(f64::MAX, f64::min);
        assert!(max_y > 10.0);
        assert!(min_y < -10.0);
    }

    #[test]
    fn smooth_quadratic_without_previous_curve_is_a_line() {
        let contours = flatten("M 0 0 T 10 0");
        assert_eq!(contours[0].points, vec![DVec2::ZERO, DVec2::new(10.0, 0.0)]);
    }

    #[test]
    fn semicircle_arc_stays_on_circle() {
        let contours = flatten("M 0 0 A 50 50 0 0 1 100 0");
        let poly = &contours[0].points;
        assert!(poly.len() > 3);
        let center = DVec2::new(50.0, 0.0);
        for p in poly {
            assert_abs_diff_eq!(p.distance(center), 50.0, epsilon = 1e-6);
        }
        // Sweep flag 1 in a Y-down authoring frame bulges toward negative y.
        assert!(poly.iter().any(|p| p.y < -40.0));
    }

    #[test]
    fn undersized_radii_are_scaled_up() {
        let contours = flatten("M 0 0 A 1 1 0 0 0 100 0");
        let poly = &contours[0].points;
        let center = DVec2::new(50.0, 0.0);
        for p in poly {
            assert_abs_diff_eq!(p.distance(center), 50.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn zero_radius_arc_is_a_line() {
        let contours = flatten("M 0 0 A 0 10 0 0 1 10 10");
        assert_eq!(contours[0].points, vec![DVec2::ZERO, DVec2::new(10.0, 10.0)]);
    }

    #[test]
    fn arc_segment_count_formula() {
        // r(1 - cos(step/2)) = tol  =>  step = 2 acos(1 - tol/r)
        let step = 2.0 * (1.0 - 0.75f64 / 100.0).acos();
        let expected = (2.0 * PI / step).ceil() as usize;
        assert_eq!(arc_segment_count(100.0, 2.0 * PI, 0.75, 1), expected);
        assert_eq!(arc_segment_count(1.0, 2.0 * PI, 0.75, 12), 12);
        assert_eq!(arc_segment_count(0.0, PI, 0.75, 12), 12);
    }

    #[test]
    fn contour_measures() {
        let square = Contour::new(
            vec![
                DVec2::new(0.0, 0.0),
                DVec2::new(4.0, 0.0),
                DVec2::new(4.0, 2.0),
                DVec2::new(0.0, 2.0),
            ],
            true,
        );
        assert_abs_diff_eq!(square.bounds_area(), 8.0);
        assert_abs_diff_eq!(square.length(), 12.0);

        let open = Contour::new(square.points.clone(), false);
        assert_abs_diff_eq!(open.length(), 10.0);
    }
}
