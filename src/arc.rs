//! Elliptical-arc tesselation into cubic Bézier segments.
//!
//! The classic AGG `bezier_arc` decomposition: the sweep is cut into
//! chunks of at most π/2, and each chunk is approximated by one cubic
//! whose control handles come from the half-angle construction.

use std::f64::consts::PI;

use smallvec::SmallVec;

const ANGLE_EPSILON: f64 = 0.01;

/// Flat vertex list: the start point (2 values) followed by 6 values
/// per cubic segment (two control points and an endpoint). A full turn
/// needs 4 segments, so 26 values at most.
pub struct BezierArc {
    vertices: SmallVec<[f64; 26]>,
}

impl BezierArc {
    /// Tesselate the arc of the ellipse centered on `(cx, cy)` with
    /// radii `(rx, ry)`, starting at `start_angle` and sweeping by
    /// `sweep_angle` (radians, y-down angles like the consumer's screen
    /// space). A vanishing sweep degenerates to a two-point line.
    pub fn new(cx: f64, cy: f64, rx: f64, ry: f64, start_angle: f64, sweep_angle: f64) -> Self {
        let start_angle = start_angle % (2.0 * PI);
        let sweep_angle = sweep_angle.clamp(-2.0 * PI, 2.0 * PI);

        let mut vertices = SmallVec::new();

        if sweep_angle.abs() < 1e-10 {
            vertices.push(cx + rx * start_angle.cos());
            vertices.push(cy + ry * start_angle.sin());
            vertices.push(cx + rx * (start_angle + sweep_angle).cos());
            vertices.push(cy + ry * (start_angle + sweep_angle).sin());
            return Self { vertices };
        }

        vertices.push(cx + rx * start_angle.cos());
        vertices.push(cy + ry * start_angle.sin());

        let mut angle = start_angle;
        let mut total_sweep = 0.0_f64;
        let mut done = false;

        while !done && vertices.len() < 26 {
            let local_sweep;
            if sweep_angle < 0.0 {
                let prev_sweep = total_sweep;
                total_sweep -= PI * 0.5;
                if total_sweep <= sweep_angle + ANGLE_EPSILON {
                    local_sweep = sweep_angle - prev_sweep;
                    done = true;
                } else {
                    local_sweep = -PI * 0.5;
                }
            } else {
                let prev_sweep = total_sweep;
                total_sweep += PI * 0.5;
                if total_sweep >= sweep_angle - ANGLE_EPSILON {
                    local_sweep = sweep_angle - prev_sweep;
                    done = true;
                } else {
                    local_sweep = PI * 0.5;
                }
            }

            arc_segment(cx, cy, rx, ry, angle, local_sweep, &mut vertices);
            angle += local_sweep;
        }

        Self { vertices }
    }

    /// Number of values (not points) in the vertex list.
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    pub fn vertices(&self) -> &[f64] {
        &self.vertices
    }

    pub(crate) fn vertices_mut(&mut self) -> &mut [f64] {
        &mut self.vertices
    }
}

/// Append one cubic (6 values) approximating an arc chunk of at most
/// ±π/2. The unit-circle control polygon is built at the half angle and
/// rotated to the chunk's midpoint.
fn arc_segment(
    cx: f64,
    cy: f64,
    rx: f64,
    ry: f64,
    start_angle: f64,
    sweep_angle: f64,
    out: &mut SmallVec<[f64; 26]>,
) {
    let x0 = (sweep_angle / 2.0).cos();
    let y0 = (sweep_angle / 2.0).sin();
    let tx = (1.0 - x0) * 4.0 / 3.0;
    let ty = y0 - tx * x0 / y0;

    let px = [x0, x0 + tx, x0 + tx, x0];
    let py = [-y0, -ty, ty, y0];

    let sn = (start_angle + sweep_angle / 2.0).sin();
    let cs = (start_angle + sweep_angle / 2.0).cos();

    // the first of the four points is the chunk's start point, which the
    // caller already holds
    for i in 1..4 {
        out.push(cx + rx * (px[i] * cs - py[i] * sn));
        out.push(cy + ry * (px[i] * sn + py[i] * cs));
    }
}

#[test]
fn full_turn_uses_four_segments() {
    let arc = BezierArc::new(100.0, 100.0, 50.0, 50.0, 0.0, 2.0 * PI);
    assert_eq!(arc.num_vertices(), 26);
    let v = arc.vertices();
    // starts and ends on the circle at angle 0
    assert!((v[0] - 150.0).abs() < 1e-9);
    assert!((v[1] - 100.0).abs() < 1e-9);
    assert!((v[24] - 150.0).abs() < 1e-6);
    assert!((v[25] - 100.0).abs() < 1e-6);
}

#[test]
fn quarter_turn_is_one_segment() {
    let arc = BezierArc::new(0.0, 0.0, 10.0, 10.0, 0.0, PI / 2.0);
    assert_eq!(arc.num_vertices(), 8);
    let v = arc.vertices();
    assert!((v[0] - 10.0).abs() < 1e-9);
    assert!((v[1]).abs() < 1e-9);
    // endpoint at the top of the circle
    assert!((v[6]).abs() < 1e-6);
    assert!((v[7] - 10.0).abs() < 1e-6);
    // the control handle magnitude matches (4/3)·tan(θ/4)·r
    let handle = (4.0 / 3.0) * (PI / 8.0).tan() * 10.0;
    assert!((v[2] - 10.0).abs() < 1e-6);
    assert!((v[3] - handle).abs() < 1e-6);
}

#[test]
fn vanishing_sweep_degenerates_to_a_line() {
    let arc = BezierArc::new(0.0, 0.0, 10.0, 10.0, 0.0, 0.0);
    assert_eq!(arc.num_vertices(), 4);
}

#[test]
fn points_stay_on_the_circle() {
    let arc = BezierArc::new(0.0, 0.0, 100.0, 100.0, 0.3, 1.9 * PI);
    let v = arc.vertices();
    // every segment endpoint (not the control points) lies on the circle
    let mut i = 0;
    while i < v.len() {
        if i == 0 || (i - 2) % 6 == 4 {
            let r = (v[i] * v[i] + v[i + 1] * v[i + 1]).sqrt();
            assert!((r - 100.0).abs() < 1e-3, "r = {r}");
        }
        i += 2;
    }
}
