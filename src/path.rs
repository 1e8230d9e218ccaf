//! Path segment storage and PDF path-operator emission.
//!
//! Coordinates are stored in device space: the page context transforms
//! every point by the CTM before it lands here. At emission time the
//! mean of the CTM scale components is factored back out so that stroke
//! pen widths stay consistent (see `write`).

use std::fmt::Write;

use serde_derive::{Deserialize, Serialize};

use crate::graphics::Point;
use crate::matrix::Matrix;
use crate::units::Pt;

#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SegmentKind {
    MoveTo,
    LineTo,
    /// Three consecutive records: two control points and the endpoint
    CurveTo,
    /// Two consecutive records: lower-left corner and (width, height)
    Rect,
}

#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PathPoint {
    pub x: f32,
    pub y: f32,
    pub kind: SegmentKind,
    /// Set on the terminating record(s) of a closed line/curve run
    pub closed: bool,
}

impl PathPoint {
    fn new(x: f32, y: f32, kind: SegmentKind) -> Self {
        Self {
            x,
            y,
            kind,
            closed: false,
        }
    }
}

/// Append-only path under construction.
///
/// Every path carries a synthetic `MoveTo(0,0)` at index 0 so that
/// callers who draw without an explicit moveto get PostScript-like
/// behavior; `new_path` truncates back to that record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Path {
    points: Vec<PathPoint>,
}

impl Default for Path {
    fn default() -> Self {
        Self::new()
    }
}

impl Path {
    pub fn new() -> Self {
        let mut points = Vec::with_capacity(16);
        // implicit moveto
        points.push(PathPoint::new(0.0, 0.0, SegmentKind::MoveTo));
        Self { points }
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        // the implicit moveto alone does not count as content
        self.points.len() <= 1
    }

    pub(crate) fn points(&self) -> &[PathPoint] {
        &self.points
    }

    pub fn move_to(&mut self, x: f32, y: f32) {
        if self.points.len() == 1 {
            // replace the implicit moveto in place
            self.points[0].x = x;
            self.points[0].y = y;
        } else {
            self.points.push(PathPoint::new(x, y, SegmentKind::MoveTo));
        }
    }

    pub fn line_to(&mut self, x: f32, y: f32) {
        self.points.push(PathPoint::new(x, y, SegmentKind::LineTo));
    }

    pub fn curve_to(&mut self, x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32) {
        self.points.push(PathPoint::new(x1, y1, SegmentKind::CurveTo));
        self.points.push(PathPoint::new(x2, y2, SegmentKind::CurveTo));
        self.points.push(PathPoint::new(x3, y3, SegmentKind::CurveTo));
    }

    pub fn rect(&mut self, x: f32, y: f32, width: f32, height: f32) {
        self.points.push(PathPoint::new(x, y, SegmentKind::Rect));
        self.points
            .push(PathPoint::new(width, height, SegmentKind::Rect));
    }

    /// Truncate back to the implicit moveto and zero it.
    pub fn new_path(&mut self) {
        self.points.truncate(1);
        self.points[0].x = 0.0;
        self.points[0].y = 0.0;
    }

    /// Mark the trailing line/curve run closed. Rects and empty paths
    /// are left alone; closing an already-closed run is a no-op.
    pub fn close_path(&mut self) {
        let count = self.points.len();
        if count <= 1 {
            return;
        }
        match self.points[count - 1].kind {
            SegmentKind::LineTo => {
                self.points[count - 1].closed = true;
            }
            SegmentKind::CurveTo => {
                self.points[count - 1].closed = true;
                self.points[count - 2].closed = true;
                self.points[count - 3].closed = true;
            }
            _ => {}
        }
    }

    pub fn first_point(&self) -> Point {
        Point::new(Pt(self.points[0].x), Pt(self.points[0].y))
    }

    pub fn last_point(&self) -> Point {
        let p = &self.points[self.points.len() - 1];
        Point::new(Pt(p.x), Pt(p.y))
    }

    pub fn append(&mut self, other: &Path) {
        self.points.extend_from_slice(&other.points);
    }

    pub fn transform(&mut self, m: &Matrix) {
        for p in &mut self.points {
            let t = m.transform_point(Point::new(Pt(p.x), Pt(p.y)));
            p.x = t.x.0;
            p.y = t.y.0;
        }
    }

    /// Emit the path and the painting operator `op` into a content stream.
    ///
    /// The CTM is reduced to `scale = (sx + sy) / 2`: the residual
    /// `(sx/scale, 0, 0, sy/scale)` is written as `cm` and divided back
    /// out of every coordinate. Writing the full CTM instead would also
    /// scale the stroke pen. The caller carries `scale` into the `w`
    /// operand. A degenerate CTM (sx = sy = 0) suppresses the emission.
    pub(crate) fn write(&self, stream: &mut String, op: &str, ctm: &Matrix) {
        if ctm.sx == 0.0 && ctm.sy == 0.0 {
            return;
        }

        let scale = (ctm.sx + ctm.sy) / 2.0;
        let rsx = ctm.sx / scale;
        let rsy = ctm.sy / scale;

        let residual = Matrix::new(rsx, 0.0, 0.0, rsy, 0.0, 0.0);
        residual.write(stream, "cm");

        let rescale = |v: f32, s: f32| if s == 0.0 { 0.0 } else { v / s };

        let count = self.points.len();
        let mut i = 0;
        while i < count {
            let p = &self.points[i];
            let x = rescale(p.x, rsx);
            let y = rescale(p.y, rsy);
            match p.kind {
                SegmentKind::MoveTo => {
                    // exclude any moveto at the end
                    if i + 1 < count {
                        let _ = writeln!(stream, "{x:.2} {y:.2} m");
                    }
                }
                SegmentKind::LineTo => {
                    if p.closed {
                        let _ = writeln!(stream, "{x:.2} {y:.2} l h");
                    } else {
                        let _ = writeln!(stream, "{x:.2} {y:.2} l");
                    }
                }
                SegmentKind::CurveTo => {
                    let p2 = &self.points[i + 1];
                    let p3 = &self.points[i + 2];
                    let tail = if p.closed { "c h" } else { "c" };
                    let _ = writeln!(
                        stream,
                        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {}",
                        x,
                        y,
                        rescale(p2.x, rsx),
                        rescale(p2.y, rsy),
                        rescale(p3.x, rsx),
                        rescale(p3.y, rsy),
                        tail
                    );
                    i += 2;
                }
                SegmentKind::Rect => {
                    let p2 = &self.points[i + 1];
                    let _ = writeln!(
                        stream,
                        "{:.2} {:.2} {:.2} {:.2} re",
                        x,
                        y,
                        rescale(p2.x, rsx),
                        rescale(p2.y, rsy)
                    );
                    i += 1;
                }
            }
            i += 1;
        }

        let _ = writeln!(stream, "{op}");
    }

    /// Emit the stored coordinates verbatim followed by `op` (`W n` / `W* n`).
    pub(crate) fn write_clip(&self, stream: &mut String, op: &str) {
        let count = self.points.len();
        let mut i = 0;
        while i < count {
            let p = &self.points[i];
            match p.kind {
                SegmentKind::MoveTo => {
                    let _ = writeln!(stream, "{:.2} {:.2} m", p.x, p.y);
                }
                SegmentKind::LineTo => {
                    if p.closed {
                        let _ = writeln!(stream, "{:.2} {:.2} l h", p.x, p.y);
                    } else {
                        let _ = writeln!(stream, "{:.2} {:.2} l", p.x, p.y);
                    }
                }
                SegmentKind::CurveTo => {
                    let p2 = &self.points[i + 1];
                    let p3 = &self.points[i + 2];
                    let tail = if p.closed { "c h" } else { "c" };
                    let _ = writeln!(
                        stream,
                        "{:.2} {:.2} {:.2} {:.2} {:.2} {:.2} {}",
                        p.x, p.y, p2.x, p2.y, p3.x, p3.y, tail
                    );
                    i += 2;
                }
                SegmentKind::Rect => {
                    let p2 = &self.points[i + 1];
                    let _ = writeln!(stream, "{:.2} {:.2} {:.2} {:.2} re", p.x, p.y, p2.x, p2.y);
                    i += 1;
                }
            }
            i += 1;
        }

        let _ = writeln!(stream, "{op}");
    }

    /// Replace curves and rects with line segments. Curves are
    /// subdivided until they are flat within `tolerance` (device units).
    pub fn flatten(&mut self, tolerance: f32) {
        if self.points.len() < 2 {
            return;
        }

        let tolerance = tolerance.max(0.01);
        let old = std::mem::take(&mut self.points);
        self.points.push(PathPoint::new(0.0, 0.0, SegmentKind::MoveTo));

        let mut cur = (old[0].x, old[0].y);
        let count = old.len();
        let mut i = 0;
        while i < count {
            let p = old[i];
            match p.kind {
                SegmentKind::MoveTo => {
                    self.move_to(p.x, p.y);
                    cur = (p.x, p.y);
                }
                SegmentKind::LineTo => {
                    self.line_to(p.x, p.y);
                    if p.closed {
                        self.close_path();
                    }
                    cur = (p.x, p.y);
                }
                SegmentKind::CurveTo => {
                    let p2 = old[i + 1];
                    let p3 = old[i + 2];
                    flatten_cubic(
                        cur,
                        (p.x, p.y),
                        (p2.x, p2.y),
                        (p3.x, p3.y),
                        tolerance,
                        0,
                        &mut self.points,
                    );
                    if p.closed {
                        self.close_path();
                    }
                    cur = (p3.x, p3.y);
                    i += 2;
                }
                SegmentKind::Rect => {
                    let p2 = old[i + 1];
                    let (x, y, w, h) = (p.x, p.y, p2.x, p2.y);
                    self.move_to(x, y);
                    self.line_to(x + w, y);
                    self.line_to(x + w, y + h);
                    self.line_to(x, y + h);
                    self.line_to(x, y);
                    self.close_path();
                    cur = (x, y);
                    i += 1;
                }
            }
            i += 1;
        }
    }
}

/// Distance-from-chord flatness test plus midpoint subdivision.
fn flatten_cubic(
    p0: (f32, f32),
    p1: (f32, f32),
    p2: (f32, f32),
    p3: (f32, f32),
    tolerance: f32,
    depth: u32,
    out: &mut Vec<PathPoint>,
) {
    let dx = p3.0 - p0.0;
    let dy = p3.1 - p0.1;
    let d1 = ((p1.0 - p0.0) * dy - (p1.1 - p0.1) * dx).abs();
    let d2 = ((p2.0 - p0.0) * dy - (p2.1 - p0.1) * dx).abs();
    let chord_sq = dx * dx + dy * dy;

    let flat = (d1 + d2) * (d1 + d2) <= tolerance * tolerance * chord_sq;

    if flat || depth >= 16 {
        out.push(PathPoint::new(p3.0, p3.1, SegmentKind::LineTo));
        return;
    }

    let mid = |a: (f32, f32), b: (f32, f32)| ((a.0 + b.0) * 0.5, (a.1 + b.1) * 0.5);
    let p01 = mid(p0, p1);
    let p12 = mid(p1, p2);
    let p23 = mid(p2, p3);
    let p012 = mid(p01, p12);
    let p123 = mid(p12, p23);
    let p0123 = mid(p012, p123);

    flatten_cubic(p0, p01, p012, p0123, tolerance, depth + 1, out);
    flatten_cubic(p0123, p123, p23, p3, tolerance, depth + 1, out);
}

#[test]
fn implicit_moveto_is_replaced_in_place() {
    let mut p = Path::new();
    assert_eq!(p.len(), 1);
    p.move_to(3.0, 4.0);
    assert_eq!(p.len(), 1);
    assert_eq!(p.first_point(), Point::new(Pt(3.0), Pt(4.0)));
    p.line_to(10.0, 10.0);
    p.move_to(5.0, 5.0);
    assert_eq!(p.len(), 3);
}

#[test]
fn new_path_keeps_the_head_record() {
    let mut p = Path::new();
    p.move_to(3.0, 4.0);
    p.line_to(10.0, 10.0);
    p.new_path();
    assert_eq!(p.len(), 1);
    assert_eq!(p.first_point(), Point::new(Pt(0.0), Pt(0.0)));
}

#[test]
fn close_path_is_idempotent() {
    let mut p = Path::new();
    p.move_to(0.0, 0.0);
    p.line_to(10.0, 0.0);
    p.close_path();
    let once = p.clone();
    p.close_path();
    assert_eq!(p, once);
}

#[test]
fn close_path_marks_a_whole_curve_run() {
    let mut p = Path::new();
    p.move_to(0.0, 0.0);
    p.curve_to(1.0, 1.0, 2.0, 2.0, 3.0, 0.0);
    p.close_path();
    let pts = p.points();
    assert!(pts[1].closed && pts[2].closed && pts[3].closed);
}

#[test]
fn trailing_moveto_is_suppressed() {
    let mut p = Path::new();
    p.move_to(1.0, 2.0);
    p.line_to(3.0, 4.0);
    p.move_to(9.0, 9.0);
    let mut out = String::new();
    p.write(&mut out, "S", &Matrix::IDENTITY);
    assert!(out.contains("1.00 2.00 m\n"));
    assert!(out.contains("3.00 4.00 l\n"));
    assert!(!out.contains("9.00 9.00 m"));
    assert!(out.ends_with("S\n"));
}

#[test]
fn nonuniform_scale_splits_into_residual_cm() {
    let mut p = Path::new();
    p.move_to(8.0, 2.0); // device coordinates
    p.line_to(16.0, 4.0);
    let mut ctm = Matrix::IDENTITY;
    ctm.scale(4.0, 1.0);
    let mut out = String::new();
    p.write(&mut out, "S", &ctm);
    // scale = 2.5, residual = (1.6, 0.4), coordinates divided back out
    assert!(out.starts_with("1.60 0.00 0.00 0.40 0.00 0.00 cm\n"));
    assert!(out.contains("5.00 5.00 m\n"));
    assert!(out.contains("10.00 10.00 l\n"));
}

#[test]
fn flatten_replaces_curves_with_lines() {
    let mut p = Path::new();
    p.move_to(0.0, 0.0);
    p.curve_to(0.0, 50.0, 100.0, 50.0, 100.0, 0.0);
    p.flatten(0.25);
    assert!(p.len() > 3);
    assert!(p
        .points()
        .iter()
        .all(|pt| pt.kind != SegmentKind::CurveTo && pt.kind != SegmentKind::Rect));
    let last = p.last_point();
    assert_eq!(last, Point::new(Pt(100.0), Pt(0.0)));
}
