//! Graphics state: line styles, dash patterns, rendering modes and the
//! full per-page state record that backs gsave/grestore.

use std::fmt::Write;

use serde_derive::{Deserialize, Serialize};
use smallvec::SmallVec;

use crate::color::{Cmyk, Color, Greyscale, Rgb};
use crate::font::{DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE};
use crate::matrix::Matrix;
use crate::path::Path;
use crate::units::Pt;

#[derive(Debug, Default, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Point {
    /// x position from the bottom left corner in pt
    pub x: Pt,
    /// y position from the bottom left corner in pt
    pub y: Pt,
}

impl Point {
    /// **WARNING: The reference point is the bottom left corner, not the top left**
    #[inline]
    pub fn new(x: Pt, y: Pt) -> Self {
        Self { x, y }
    }
}

/// __See PDF Reference Page 216__ - Line cap (ending) style
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineCapStyle {
    /// Butt cap. The stroke is squared off at the endpoint of the path.
    #[default]
    Butt,
    /// Round cap. A semicircular arc is drawn around the endpoint and filled in.
    Round,
    /// Projecting square cap. The stroke continues half a line width
    /// beyond the endpoint and is squared off.
    ProjectingSquare,
}

impl LineCapStyle {
    pub fn id(&self) -> i64 {
        match self {
            LineCapStyle::Butt => 0,
            LineCapStyle::Round => 1,
            LineCapStyle::ProjectingSquare => 2,
        }
    }
}

/// __See PDF Reference Page 216__ - Line join style
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum LineJoinStyle {
    /// Miter join. The outer edges of the two segments are extended
    /// until they meet; too sharp an angle falls back to bevel per the
    /// miter limit.
    #[default]
    Miter,
    /// Round join. A pie slice around the meeting point is filled in.
    Round,
    /// Bevel join. The notch between the two butt-capped segments is
    /// filled with a triangle.
    Bevel,
}

impl LineJoinStyle {
    pub fn id(&self) -> i64 {
        match self {
            LineJoinStyle::Miter => 0,
            LineJoinStyle::Round => 1,
            LineJoinStyle::Bevel => 2,
        }
    }
}

/// The text rendering mode determines how text is drawn: filled,
/// stroked, both, invisible, with each variant optionally adding the
/// glyph outlines to the clipping path.
///
/// See PDF Reference 1.7 Page 402
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TextRenderingMode {
    #[default]
    Fill,
    Stroke,
    FillStroke,
    Invisible,
    FillClip,
    StrokeClip,
    FillStrokeClip,
    Clip,
}

impl TextRenderingMode {
    pub fn from_i64(i: i64) -> Self {
        match i {
            0 => TextRenderingMode::Fill,
            1 => TextRenderingMode::Stroke,
            2 => TextRenderingMode::FillStroke,
            3 => TextRenderingMode::Invisible,
            4 => TextRenderingMode::FillClip,
            5 => TextRenderingMode::StrokeClip,
            6 => TextRenderingMode::FillStrokeClip,
            7 => TextRenderingMode::Clip,
            _ => TextRenderingMode::Fill,
        }
    }

    pub fn id(&self) -> i64 {
        match self {
            TextRenderingMode::Fill => 0,
            TextRenderingMode::Stroke => 1,
            TextRenderingMode::FillStroke => 2,
            TextRenderingMode::Invisible => 3,
            TextRenderingMode::FillClip => 4,
            TextRenderingMode::StrokeClip => 5,
            TextRenderingMode::FillStrokeClip => 6,
            TextRenderingMode::Clip => 7,
        }
    }

    /// Whether the mode paints a fill / a stroke. Modes 3 and 7 paint
    /// nothing.
    pub(crate) fn marks(&self) -> (bool, bool) {
        match self.id() {
            0 | 4 => (true, false),
            1 | 5 => (false, true),
            2 | 6 => (true, true),
            _ => (false, false),
        }
    }
}

/// The rule used by filling and clipping paint operations.
///
/// `NonZero` is the appropriate option most of the time.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum WindingOrder {
    /// Count signed crossings of a ray from the point; zero = outside.
    #[default]
    NonZero,
    /// Count crossings regardless of direction; odd = inside.
    EvenOdd,
}

impl WindingOrder {
    /// The clip-and-no-op operator pair for this rule.
    pub fn clip_op(&self) -> &'static str {
        match self {
            WindingOrder::NonZero => "W n",
            WindingOrder::EvenOdd => "W* n",
        }
    }

    /// The fill operator for this rule.
    pub fn fill_op(&self) -> &'static str {
        match self {
            WindingOrder::NonZero => "f",
            WindingOrder::EvenOdd => "f*",
        }
    }
}

/// Dash array plus phase. An empty array with phase 0 is the solid
/// default. All-zero arrays and negative lengths are invalid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LineDashPattern {
    /// Dash, gap, dash, gap, ...
    pub pattern: SmallVec<[f32; 6]>,
    /// Offset into the pattern at which the line starts
    pub phase: f32,
}

impl LineDashPattern {
    pub fn is_default(&self) -> bool {
        self.phase == 0.0 && self.pattern.is_empty()
    }

    pub fn clear(&mut self) {
        self.pattern.clear();
        self.phase = 0.0;
    }

    /// Emit `[a b ...] phase d`.
    pub(crate) fn write(&self, stream: &mut String) {
        stream.push('[');
        for (i, v) in self.pattern.iter().enumerate() {
            if i > 0 {
                stream.push(' ');
            }
            let _ = write!(stream, "{v:.2}");
        }
        let _ = writeln!(stream, "] {:.2} d", self.phase);
    }
}

/// Which clip rule is active, if any.
pub(crate) type ClipRule = Option<WindingOrder>;

/// The font bound into the graphics state: a registry name plus the
/// font matrix (uniform `scale_font` sizes set sx = sy = size).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FontBinding {
    pub name: String,
    pub matrix: Matrix,
}

impl FontBinding {
    pub fn size(&self) -> f32 {
        self.matrix.sy
    }

    pub fn scale(&mut self, size: f32) {
        self.matrix.sx = size;
        self.matrix.sy = size;
    }
}

impl Default for FontBinding {
    fn default() -> Self {
        Self {
            name: DEFAULT_FONT_NAME.to_string(),
            matrix: Matrix::new(DEFAULT_FONT_SIZE, 0.0, 0.0, DEFAULT_FONT_SIZE, 0.0, 0.0),
        }
    }
}

/// The full graphics state. `gsave` pushes a deep copy (value
/// semantics, including the clipping path and its substack).
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct GraphicsState {
    pub stroke_color: Color,
    pub fill_color: Color,
    pub opacity: f32,
    pub line_width: f32,
    pub fill_rule: WindingOrder,
    /// Device-space current point (already CTM-transformed)
    pub current_point: Point,
    pub has_current_point: bool,
    pub line_join: LineJoinStyle,
    pub line_cap: LineCapStyle,
    pub font: FontBinding,
    pub flatness: f32,
    pub ctm: Matrix,
    pub last_move_to: Point,
    pub rendering_mode: TextRenderingMode,
    pub miter_limit: f32,
    pub clipping_path: Path,
    pub dash: LineDashPattern,
    pub clip_stack: Vec<Path>,
    pub clip_rule: ClipRule,
}

impl Default for GraphicsState {
    fn default() -> Self {
        Self {
            stroke_color: Color::default(),
            fill_color: Color::default(),
            opacity: 1.0,
            line_width: 1.0,
            fill_rule: WindingOrder::NonZero,
            current_point: Point::default(),
            has_current_point: false,
            line_join: LineJoinStyle::Miter,
            line_cap: LineCapStyle::Butt,
            font: FontBinding::default(),
            flatness: 0.0,
            ctm: Matrix::IDENTITY,
            last_move_to: Point::default(),
            rendering_mode: TextRenderingMode::Fill,
            miter_limit: 10.0,
            clipping_path: Path::new(),
            dash: LineDashPattern::default(),
            clip_stack: Vec::new(),
            clip_rule: None,
        }
    }
}

impl GraphicsState {
    /// Back to the page defaults. The font binding survives a reset,
    /// so a face selected on one page stays selected on the next.
    pub fn reset(&mut self) {
        let font = self.font.clone();
        *self = GraphicsState::default();
        self.font = font;
    }

    // -- current point ------------------------------------------------

    /// The current point in user space (inverse-transformed by the CTM).
    pub fn current_point(&self) -> Point {
        self.ctm.itransform_point(self.current_point)
    }

    pub fn set_has_current_point(&mut self, value: bool) {
        self.has_current_point = value;
        if !value {
            self.current_point = Point::default();
            self.last_move_to = Point::default();
        }
    }

    // -- colors -------------------------------------------------------

    pub fn stroke_rgb(&mut self, r: f32, g: f32, b: f32) {
        self.stroke_color = Color::Rgb(Rgb::new(r, g, b));
    }

    pub fn fill_rgb(&mut self, r: f32, g: f32, b: f32) {
        self.fill_color = Color::Rgb(Rgb::new(r, g, b));
    }

    /// Sets fill and stroke to the same color, like PostScript `setrgbcolor`.
    pub fn set_rgb_color(&mut self, r: f32, g: f32, b: f32) {
        self.stroke_rgb(r, g, b);
        self.fill_color = self.stroke_color;
    }

    pub fn stroke_cmyk(&mut self, c: f32, m: f32, y: f32, k: f32) {
        self.stroke_color = Color::Cmyk(Cmyk::new(c, m, y, k));
    }

    pub fn fill_cmyk(&mut self, c: f32, m: f32, y: f32, k: f32) {
        self.fill_color = Color::Cmyk(Cmyk::new(c, m, y, k));
    }

    pub fn set_cmyk_color(&mut self, c: f32, m: f32, y: f32, k: f32) {
        self.stroke_cmyk(c, m, y, k);
        self.fill_color = self.stroke_color;
    }

    pub fn gray(&mut self, value: f32) {
        self.stroke_color = Color::Greyscale(Greyscale::new(value));
        self.fill_color = self.stroke_color;
    }

    // -- line attributes ----------------------------------------------

    /// Miter limit must be at least 1; smaller values are rejected.
    pub fn set_miter_limit(&mut self, value: f32) -> bool {
        if value >= 1.0 {
            self.miter_limit = value;
            true
        } else {
            false
        }
    }

    /// Flatness is clamped into [0.2, 100].
    pub fn set_flat(&mut self, value: f32) {
        self.flatness = value.clamp(0.2, 100.0);
    }

    /// Rejects negative lengths and all-zero arrays.
    pub fn set_dash(&mut self, pattern: &[f32], phase: f32) -> bool {
        if !pattern.is_empty() {
            let mut zeros = 0;
            for v in pattern {
                if *v == 0.0 {
                    zeros += 1;
                } else if *v < 0.0 {
                    return false;
                }
            }
            if zeros == pattern.len() {
                return false;
            }
        }
        self.dash.pattern = SmallVec::from_slice(pattern);
        self.dash.phase = phase;
        true
    }

    // -- clipping -----------------------------------------------------

    pub fn clip_save(&mut self) {
        self.clip_stack.push(self.clipping_path.clone());
    }

    pub fn clip_restore(&mut self) {
        if let Some(path) = self.clip_stack.pop() {
            self.clipping_path = path;
        }
    }

    pub fn clear_clip_stack(&mut self) {
        self.clip_stack.clear();
    }

    /// Emit the active clipping path (if any) followed by `W n` / `W* n`.
    pub fn write_clip(&self, stream: &mut String) {
        if let Some(rule) = self.clip_rule {
            self.clipping_path.write_clip(stream, rule.clip_op());
        }
    }

    // -- operator emission --------------------------------------------

    /// Emit the operators a stroke depends on: join, cap, miter limit
    /// and dash when non-default, then the stroke color and the pen
    /// width. The width is multiplied by the mean CTM scale because the
    /// path emission divides that same factor out of the coordinates.
    pub fn on_stroke(&self, stream: &mut String, ctm: &Matrix) {
        let scale = (ctm.sx + ctm.sy) / 2.0;

        if self.line_join != LineJoinStyle::Miter {
            let _ = writeln!(stream, "{} j", self.line_join.id());
        }
        if self.line_cap != LineCapStyle::Butt {
            let _ = writeln!(stream, "{} J", self.line_cap.id());
        }
        if self.miter_limit != 10.0 {
            let _ = writeln!(stream, "{:.2} M", self.miter_limit);
        }
        if !self.dash.is_default() {
            self.dash.write(stream);
        }
        self.stroke_color.write_stroke(stream);
        let _ = writeln!(stream, "{:.2} w", self.line_width * scale);
    }

    /// A fill only depends on the fill color.
    pub fn on_fill(&self, stream: &mut String) {
        self.fill_color.write_fill(stream);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn dash_validation() {
        let mut gs = GraphicsState::default();
        assert!(gs.set_dash(&[3.0, 1.0], 0.5));
        assert!(!gs.dash.is_default());
        assert!(!gs.set_dash(&[0.0, 0.0], 0.0), "all zeros");
        assert!(!gs.set_dash(&[3.0, -1.0], 0.0), "negative length");
        // the failed calls left the previous pattern in place
        assert_eq!(gs.dash.pattern.as_slice(), &[3.0, 1.0]);
        assert!(gs.set_dash(&[], 0.0));
        assert!(gs.dash.is_default());
    }

    #[test]
    fn default_stroke_emits_color_and_width_only() {
        let gs = GraphicsState::default();
        let mut out = String::new();
        gs.on_stroke(&mut out, &Matrix::IDENTITY);
        assert_eq!(out, "0.00 0.00 0.00 RG\n1.00 w\n");
    }

    #[test]
    fn stroke_emits_modified_attributes() {
        let mut gs = GraphicsState::default();
        gs.line_join = LineJoinStyle::Round;
        gs.line_cap = LineCapStyle::ProjectingSquare;
        gs.set_miter_limit(4.0);
        gs.set_dash(&[2.0, 1.0], 0.0);
        gs.stroke_rgb(1.0, 0.0, 0.0);
        gs.line_width = 2.0;

        let mut ctm = Matrix::IDENTITY;
        ctm.scale(3.0, 1.0);
        let mut out = String::new();
        gs.on_stroke(&mut out, &ctm);
        assert_eq!(
            out,
            "1 j\n2 J\n4.00 M\n[2.00 1.00] 0.00 d\n1.00 0.00 0.00 RG\n4.00 w\n"
        );
    }

    #[test]
    fn miter_limit_below_one_is_rejected() {
        let mut gs = GraphicsState::default();
        assert!(!gs.set_miter_limit(0.5));
        assert_eq!(gs.miter_limit, 10.0);
        assert!(gs.set_miter_limit(1.0));
    }

    #[test]
    fn flatness_is_clamped() {
        let mut gs = GraphicsState::default();
        gs.set_flat(0.05);
        assert_eq!(gs.flatness, 0.2);
        gs.set_flat(500.0);
        assert_eq!(gs.flatness, 100.0);
        gs.set_flat(3.0);
        assert_eq!(gs.flatness, 3.0);
    }

    #[test]
    fn reset_keeps_the_font_binding() {
        let mut gs = GraphicsState::default();
        gs.font.name = "Helvetica".to_string();
        gs.font.scale(24.0);
        gs.stroke_rgb(1.0, 0.0, 0.0);
        gs.reset();
        assert_eq!(gs.font.name, "Helvetica");
        assert_eq!(gs.font.size(), 24.0);
        assert_eq!(gs.stroke_color, Color::default());
    }

    #[test]
    fn clip_substack_round_trip() {
        let mut gs = GraphicsState::default();
        gs.clipping_path.rect(0.0, 0.0, 10.0, 10.0);
        let saved = gs.clipping_path.clone();
        gs.clip_save();
        gs.clipping_path.rect(2.0, 2.0, 4.0, 4.0);
        gs.clip_restore();
        assert_eq!(gs.clipping_path, saved);
        // restoring from an empty stack is a no-op
        gs.clip_restore();
        assert_eq!(gs.clipping_path, saved);
    }
}
