//! The page context: a PostScript-flavored drawing façade that turns
//! API calls into PDF content-stream bytes.
//!
//! Every coordinate entering a path operation is transformed by the
//! CTM before it is stored, so the content stream works in
//! identity-relative coordinates (plus the residual `cm` the path
//! emission splits off). The page owns the current graphics state, the
//! current path and the gsave/grestore stacks; the document it borrows
//! owns everything that outlives the page.

use std::f64::consts::PI;
use std::fmt::Write as FmtWrite;
use std::io::Write;

use crate::arc::BezierArc;
use crate::color::{Cmyk, Rgb};
use crate::document::PdfDocument;
use crate::error::Error;
use crate::font::{OutlineSegment, DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE};
use crate::graphics::{
    GraphicsState, LineCapStyle, LineDashPattern, LineJoinStyle, Point, TextRenderingMode,
    WindingOrder,
};
use crate::matrix::Matrix;
use crate::path::{Path, SegmentKind};
use crate::units::Pt;

/// Map a counterclockwise (PostScript) angle onto the clockwise
/// parameterization the tesselator works in.
fn ccw_to_cw(angle: f32) -> f32 {
    if (0.0..=360.0).contains(&angle) {
        360.0 - angle
    } else if (-360.0..0.0).contains(&angle) {
        -angle
    } else {
        angle
    }
}

/// One page of a document, with fixed dimensions and rotation.
///
/// Drawing accumulates in an in-memory buffer; `show_page` compresses
/// the buffer and hands it to the document. Dropping a page with
/// undrawn content shows it implicitly.
pub struct PdfPage<'a, W: Write> {
    doc: &'a mut PdfDocument<W>,
    page_width: f32,
    page_height: f32,
    page_rotation: i32,
    gstate: GraphicsState,
    stream: String,
    path: Path,
    graphics_stack: Vec<GraphicsState>,
    path_stack: Vec<Path>,
}

impl<'a, W: Write> PdfPage<'a, W> {
    /// Open a page. Width and height are in points; rotation must be a
    /// non-negative multiple of 90. Binds the default face
    /// (Times-Roman at 11 pt), so the document's font source must be
    /// able to supply it.
    pub fn new(
        doc: &'a mut PdfDocument<W>,
        width: Pt,
        height: Pt,
        rotation: i32,
    ) -> Result<Self, Error> {
        if width.0 <= 0.0 {
            return Err(Error::InvalidWidth);
        }
        if height.0 <= 0.0 {
            return Err(Error::InvalidHeight);
        }
        if rotation < 0 || rotation % 90 != 0 {
            return Err(Error::InvalidRotation);
        }

        let (_, base_font) = doc
            .find_font(DEFAULT_FONT_NAME)
            .map_err(|_| Error::MissingFont)?;

        let mut gstate = GraphicsState::default();
        gstate.font.name = base_font;
        gstate.font.scale(DEFAULT_FONT_SIZE);

        Ok(Self {
            doc,
            page_width: width.0,
            page_height: height.0,
            page_rotation: rotation,
            gstate,
            stream: String::new(),
            path: Path::new(),
            graphics_stack: Vec::new(),
            path_stack: Vec::new(),
        })
    }

    pub fn width(&self) -> Pt {
        Pt(self.page_width)
    }

    pub fn height(&self) -> Pt {
        Pt(self.page_height)
    }

    pub fn rotation(&self) -> i32 {
        self.page_rotation
    }

    // -- page lifecycle -----------------------------------------------

    /// Flush the accumulated content through the document and reset
    /// the page for the next round: default graphics state (the font
    /// binding persists), empty path, empty stacks.
    pub fn show_page(&mut self) -> Result<(), Error> {
        self.doc.write_page(
            self.stream.as_bytes(),
            self.page_width,
            self.page_height,
            self.page_rotation,
        )?;
        self.stream.clear();
        self.path.new_path();
        self.gstate.reset();
        self.graphics_stack.clear();
        self.path_stack.clear();
        Ok(())
    }

    /// Paint an opaque white rectangle over the whole page, under an
    /// identity matrix and outside the caller's graphics state.
    pub fn erase_page(&mut self) {
        self.gsave();
        self.set_fill_rgb(1.0, 1.0, 1.0);
        self.set_matrix(Matrix::IDENTITY);
        self.move_to(Pt(0.0), Pt(0.0));
        self.line_to(Pt(0.0), Pt(self.page_height));
        self.line_to(Pt(self.page_width), Pt(self.page_height));
        self.line_to(Pt(self.page_width), Pt(0.0));
        self.close_path();
        self.fill();
        self.grestore();
    }

    // -- graphics state stack -----------------------------------------

    /// Push a deep copy of the graphics state and the current path.
    /// The clipping substack of the live state is cleared so that
    /// clip_save/clip_restore scope to the new state.
    pub fn gsave(&mut self) {
        self.graphics_stack.push(self.gstate.clone());
        self.gstate.clear_clip_stack();
        self.path_stack.push(self.path.clone());
    }

    pub fn grestore(&mut self) {
        if let Some(gs) = self.graphics_stack.pop() {
            self.gstate = gs;
        }
        if let Some(path) = self.path_stack.pop() {
            self.path = path;
        }
    }

    /// Pop everything, restoring the bottom-most saved state and path.
    pub fn grestore_all(&mut self) {
        if !self.graphics_stack.is_empty() {
            self.gstate = self.graphics_stack.swap_remove(0);
            self.graphics_stack.clear();
        }
        if !self.path_stack.is_empty() {
            self.path = self.path_stack.swap_remove(0);
            self.path_stack.clear();
        }
    }

    // -- fonts --------------------------------------------------------

    /// Bind a face by name, keeping the current size. Unknown names
    /// fall back to the document's default face.
    pub fn set_font(&mut self, name: &str) -> Result<(), Error> {
        let (_, base_font) = self.doc.find_font(name).map_err(|_| Error::InvalidFont)?;
        self.gstate.font.name = base_font;
        Ok(())
    }

    pub fn scale_font(&mut self, size: f32) -> Result<(), Error> {
        if size >= 0.0 {
            self.gstate.font.scale(size);
            Ok(())
        } else {
            Err(Error::RangeCheck)
        }
    }

    pub fn select_font(&mut self, name: &str, size: f32) -> Result<(), Error> {
        self.set_font(name)?;
        self.scale_font(size)
    }

    pub fn current_font_size(&self) -> Pt {
        Pt(self.gstate.font.size())
    }

    pub fn font_ascent(&self) -> Result<Pt, Error> {
        let record = self
            .doc
            .font_record(&self.gstate.font.name)
            .ok_or(Error::MissingFont)?;
        Ok(Pt(record.ascent(self.gstate.font.size())))
    }

    pub fn font_descent(&self) -> Result<Pt, Error> {
        let record = self
            .doc
            .font_record(&self.gstate.font.name)
            .ok_or(Error::MissingFont)?;
        Ok(Pt(record.descent(self.gstate.font.size())))
    }

    pub fn font_internal_leading(&self) -> Result<Pt, Error> {
        let record = self
            .doc
            .font_record(&self.gstate.font.name)
            .ok_or(Error::MissingFont)?;
        Ok(Pt(record.internal_leading(self.gstate.font.size())))
    }

    pub fn font_external_leading(&self) -> Result<Pt, Error> {
        let record = self
            .doc
            .font_record(&self.gstate.font.name)
            .ok_or(Error::MissingFont)?;
        Ok(Pt(record.external_leading(self.gstate.font.size())))
    }

    // -- line attributes and colors -----------------------------------

    pub fn set_line_width(&mut self, width: Pt) {
        self.gstate.line_width = width.0;
    }

    pub fn current_line_width(&self) -> Pt {
        Pt(self.gstate.line_width)
    }

    pub fn set_line_cap(&mut self, cap: LineCapStyle) {
        self.gstate.line_cap = cap;
    }

    pub fn current_line_cap(&self) -> LineCapStyle {
        self.gstate.line_cap
    }

    pub fn set_line_join(&mut self, join: LineJoinStyle) {
        self.gstate.line_join = join;
    }

    pub fn current_line_join(&self) -> LineJoinStyle {
        self.gstate.line_join
    }

    pub fn set_miter_limit(&mut self, limit: f32) -> Result<(), Error> {
        if self.gstate.set_miter_limit(limit) {
            Ok(())
        } else {
            Err(Error::RangeCheck)
        }
    }

    pub fn current_miter_limit(&self) -> f32 {
        self.gstate.miter_limit
    }

    pub fn set_flat(&mut self, flatness: f32) {
        self.gstate.set_flat(flatness);
    }

    pub fn current_flat(&self) -> f32 {
        self.gstate.flatness
    }

    pub fn set_rendering_mode(&mut self, mode: TextRenderingMode) {
        self.gstate.rendering_mode = mode;
    }

    pub fn current_rendering_mode(&self) -> TextRenderingMode {
        self.gstate.rendering_mode
    }

    pub fn set_dash(&mut self, pattern: &[f32], phase: f32) -> Result<(), Error> {
        if self.gstate.set_dash(pattern, phase) {
            Ok(())
        } else {
            Err(Error::RangeCheck)
        }
    }

    pub fn current_dash(&self) -> LineDashPattern {
        self.gstate.dash.clone()
    }

    /// Set stroke and fill to the same gray level, like PostScript `setgray`.
    pub fn set_gray(&mut self, value: f32) {
        self.gstate.gray(value);
    }

    pub fn set_stroke_rgb(&mut self, r: f32, g: f32, b: f32) {
        self.gstate.stroke_rgb(r, g, b);
    }

    pub fn set_fill_rgb(&mut self, r: f32, g: f32, b: f32) {
        self.gstate.fill_rgb(r, g, b);
    }

    /// Set stroke and fill to the same color, like PostScript `setrgbcolor`.
    pub fn set_rgb_color(&mut self, r: f32, g: f32, b: f32) {
        self.gstate.set_rgb_color(r, g, b);
    }

    pub fn set_stroke_cmyk(&mut self, c: f32, m: f32, y: f32, k: f32) {
        self.gstate.stroke_cmyk(c, m, y, k);
    }

    pub fn set_fill_cmyk(&mut self, c: f32, m: f32, y: f32, k: f32) {
        self.gstate.fill_cmyk(c, m, y, k);
    }

    pub fn set_cmyk_color(&mut self, c: f32, m: f32, y: f32, k: f32) {
        self.gstate.set_cmyk_color(c, m, y, k);
    }

    pub fn current_stroke_rgb(&self) -> Rgb {
        self.gstate.stroke_color.to_rgb()
    }

    pub fn current_fill_rgb(&self) -> Rgb {
        self.gstate.fill_color.to_rgb()
    }

    pub fn current_stroke_cmyk(&self) -> Cmyk {
        self.gstate.stroke_color.to_cmyk()
    }

    pub fn current_fill_cmyk(&self) -> Cmyk {
        self.gstate.fill_color.to_cmyk()
    }

    pub fn current_stroke_gray(&self) -> f32 {
        self.gstate.stroke_color.to_greyscale()
    }

    pub fn current_fill_gray(&self) -> f32 {
        self.gstate.fill_color.to_greyscale()
    }

    // -- transforms ---------------------------------------------------

    pub fn rotate(&mut self, degrees: f32) {
        self.gstate.ctm.rotate(degrees);
    }

    pub fn scale(&mut self, x: f32, y: f32) {
        self.gstate.ctm.scale(x, y);
    }

    pub fn translate(&mut self, x: Pt, y: Pt) {
        self.gstate.ctm.translate(x.0, y.0);
    }

    pub fn concat_matrix(&mut self, m: Matrix) {
        self.gstate.ctm.multiply(&m);
    }

    pub fn set_matrix(&mut self, m: Matrix) {
        self.gstate.ctm = m;
    }

    pub fn current_matrix(&self) -> Matrix {
        self.gstate.ctm
    }

    /// Replace the CTM with its inverse.
    pub fn invert_matrix(&mut self) -> Result<(), Error> {
        match self.gstate.ctm.invert() {
            Some(inverse) => {
                self.gstate.ctm = inverse;
                Ok(())
            }
            None => Err(Error::InvalidParameter),
        }
    }

    pub fn transform_point(&self, p: Point) -> Point {
        self.gstate.ctm.transform_point(p)
    }

    pub fn transform_distance(&self, p: Point) -> Point {
        self.gstate.ctm.transform_distance(p)
    }

    pub fn itransform_point(&self, p: Point) -> Point {
        self.gstate.ctm.itransform_point(p)
    }

    // -- current point ------------------------------------------------

    pub fn has_current_point(&self) -> bool {
        self.gstate.has_current_point
    }

    /// The current point in user space.
    pub fn current_point(&self) -> Result<Point, Error> {
        if self.gstate.has_current_point {
            Ok(self.gstate.current_point())
        } else {
            Err(Error::NoCurrentPoint)
        }
    }

    // -- path construction --------------------------------------------

    pub fn new_path(&mut self) {
        self.path.new_path();
        self.gstate.set_has_current_point(false);
    }

    pub fn move_to(&mut self, x: Pt, y: Pt) {
        let pt = self.gstate.ctm.transform_point(Point::new(x, y));
        self.path.move_to(pt.x.0, pt.y.0);
        self.gstate.current_point = pt;
        self.gstate.last_move_to = pt;
        self.gstate.has_current_point = true;
    }

    pub fn line_to(&mut self, x: Pt, y: Pt) {
        let pt = self.gstate.ctm.transform_point(Point::new(x, y));
        self.path.line_to(pt.x.0, pt.y.0);
        self.gstate.current_point = pt;
    }

    pub fn curve_to(&mut self, x1: Pt, y1: Pt, x2: Pt, y2: Pt, x3: Pt, y3: Pt) {
        let p1 = self.gstate.ctm.transform_point(Point::new(x1, y1));
        let p2 = self.gstate.ctm.transform_point(Point::new(x2, y2));
        let p3 = self.gstate.ctm.transform_point(Point::new(x3, y3));
        self.path
            .curve_to(p1.x.0, p1.y.0, p2.x.0, p2.y.0, p3.x.0, p3.y.0);
        self.gstate.current_point = p3;
    }

    /// Append an axis-aligned rectangle (two records in the path) and
    /// leave the current point on its origin corner.
    pub fn rectangle(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        let p1 = self.gstate.ctm.transform_point(Point::new(x, y));
        let p2 = self
            .gstate
            .ctm
            .transform_point(Point::new(x + width, y + height));
        self.path
            .rect(p1.x.0, p1.y.0, p2.x.0 - p1.x.0, p2.y.0 - p1.y.0);
        self.move_to(x, y);
    }

    /// Close the trailing subpath; the current point returns to the
    /// last explicit moveto, not the final drawn point.
    pub fn close_path(&mut self) {
        self.path.close_path();
        self.gstate.current_point = self.gstate.last_move_to;
    }

    pub fn rmove_to(&mut self, dx: Pt, dy: Pt) -> Result<(), Error> {
        if !self.gstate.has_current_point {
            return Err(Error::NoCurrentPoint);
        }
        let pt = self.gstate.current_point();
        self.move_to(pt.x + dx, pt.y + dy);
        Ok(())
    }

    pub fn rline_to(&mut self, dx: Pt, dy: Pt) -> Result<(), Error> {
        if !self.gstate.has_current_point {
            return Err(Error::NoCurrentPoint);
        }
        let pt = self.gstate.current_point();
        self.line_to(pt.x + dx, pt.y + dy);
        Ok(())
    }

    pub fn rcurve_to(
        &mut self,
        dx1: Pt,
        dy1: Pt,
        dx2: Pt,
        dy2: Pt,
        dx3: Pt,
        dy3: Pt,
    ) -> Result<(), Error> {
        if !self.gstate.has_current_point {
            return Err(Error::NoCurrentPoint);
        }
        let pt = self.gstate.current_point();
        self.curve_to(
            pt.x + dx1,
            pt.y + dy1,
            pt.x + dx2,
            pt.y + dy2,
            pt.x + dx3,
            pt.y + dy3,
        );
        Ok(())
    }

    // -- arcs ---------------------------------------------------------

    /// Counterclockwise arc, like PostScript `arc`. Continues from the
    /// current point with a line when one exists.
    pub fn arc(
        &mut self,
        cx: Pt,
        cy: Pt,
        radius: Pt,
        start_angle: f32,
        end_angle: f32,
    ) -> Result<(), Error> {
        if radius.0 <= 0.0 {
            return Err(Error::RangeCheck);
        }
        self.do_arc(cx.0, cy.0, radius.0, radius.0, start_angle, end_angle, true)
    }

    /// Clockwise arc, like PostScript `arcn`.
    pub fn arcn(
        &mut self,
        cx: Pt,
        cy: Pt,
        radius: Pt,
        start_angle: f32,
        end_angle: f32,
    ) -> Result<(), Error> {
        if radius.0 <= 0.0 {
            return Err(Error::RangeCheck);
        }
        self.do_arc(cx.0, cy.0, radius.0, radius.0, start_angle, end_angle, false)
    }

    pub fn ellipse(&mut self, cx: Pt, cy: Pt, rx: Pt, ry: Pt) -> Result<(), Error> {
        if rx.0 <= 0.0 || ry.0 <= 0.0 {
            return Err(Error::RangeCheck);
        }
        self.do_arc(cx.0, cy.0, rx.0, ry.0, 0.0, 360.0, true)
    }

    fn do_arc(
        &mut self,
        cx: f32,
        cy: f32,
        rx: f32,
        ry: f32,
        start_angle: f32,
        end_angle: f32,
        anticlockwise: bool,
    ) -> Result<(), Error> {
        // the tesselator runs clockwise in a y-down frame; reflect the
        // angles (swapping them for anticlockwise traversal) ...
        let (start_angle, end_angle) = if anticlockwise {
            (ccw_to_cw(end_angle), ccw_to_cw(start_angle))
        } else {
            (ccw_to_cw(start_angle), ccw_to_cw(end_angle))
        };

        let sweep_angle = if start_angle < end_angle {
            end_angle - start_angle
        } else {
            (360.0 - start_angle + end_angle).abs()
        };

        let start_rad = (start_angle as f64) * PI / 180.0;
        let sweep_rad = (sweep_angle as f64) * PI / 180.0;

        // ... and the center about the page height
        let cy_flipped = (-cy + self.page_height) as f64;

        let mut arc = BezierArc::new(
            cx as f64,
            cy_flipped,
            rx as f64,
            ry as f64,
            start_rad,
            sweep_rad,
        );

        let count = arc.num_vertices();
        if count < 4 {
            return Err(Error::InvalidParameter);
        }

        // flip the y axis back into user space
        let page_height = self.page_height as f64;
        let vertices = arc.vertices_mut();
        let mut i = 1;
        while i < count {
            vertices[i] = -vertices[i] + page_height;
            i += 2;
        }

        if anticlockwise {
            self.do_arc_anticlockwise(arc.vertices());
        } else {
            self.do_arc_clockwise(arc.vertices());
        }
        Ok(())
    }

    fn do_arc_clockwise(&mut self, v: &[f64]) {
        let start = Point::new(Pt(v[0] as f32), Pt(v[1] as f32));
        if self.gstate.has_current_point {
            self.line_to(start.x, start.y);
        } else {
            self.move_to(start.x, start.y);
        }

        if v.len() == 4 {
            self.line_to(Pt(v[2] as f32), Pt(v[3] as f32));
        } else {
            let mut i = 2;
            while i + 5 < v.len() {
                self.curve_to(
                    Pt(v[i] as f32),
                    Pt(v[i + 1] as f32),
                    Pt(v[i + 2] as f32),
                    Pt(v[i + 3] as f32),
                    Pt(v[i + 4] as f32),
                    Pt(v[i + 5] as f32),
                );
                i += 6;
            }
        }
    }

    /// Replay the tessellated vertex list in reverse, so the control
    /// polygons match the forward traversal exactly.
    fn do_arc_anticlockwise(&mut self, v: &[f64]) {
        let count = v.len();
        if count == 4 {
            let start = Point::new(Pt(v[2] as f32), Pt(v[3] as f32));
            if self.gstate.has_current_point {
                self.line_to(start.x, start.y);
            } else {
                self.move_to(start.x, start.y);
            }
            self.line_to(Pt(v[0] as f32), Pt(v[1] as f32));
        } else {
            let last = count - 1;
            let start = Point::new(Pt(v[last - 1] as f32), Pt(v[last] as f32));
            if self.gstate.has_current_point {
                self.line_to(start.x, start.y);
            } else {
                self.move_to(start.x, start.y);
            }

            let mut i = last as isize - 2;
            while i >= 5 {
                let j = i as usize;
                self.curve_to(
                    Pt(v[j - 1] as f32),
                    Pt(v[j] as f32),
                    Pt(v[j - 3] as f32),
                    Pt(v[j - 2] as f32),
                    Pt(v[j - 5] as f32),
                    Pt(v[j - 4] as f32),
                );
                i -= 6;
            }
        }
    }

    // -- painting -----------------------------------------------------

    pub fn stroke(&mut self) {
        let ctm = self.gstate.ctm;
        if ctm.sx != 0.0 || ctm.sy != 0.0 {
            self.stream.push_str("q\n");
            self.gstate.write_clip(&mut self.stream);
            self.gstate.on_stroke(&mut self.stream, &ctm);
            self.path.write(&mut self.stream, "S", &ctm);
            self.stream.push_str("Q\n");
        }
        self.new_path();
    }

    pub fn fill(&mut self) {
        let ctm = self.gstate.ctm;
        self.stream.push_str("q\n");
        self.gstate.write_clip(&mut self.stream);
        self.gstate.on_fill(&mut self.stream);
        self.path
            .write(&mut self.stream, self.gstate.fill_rule.fill_op(), &ctm);
        self.stream.push_str("Q\n");
        self.new_path();
    }

    pub fn eofill(&mut self) {
        let ctm = self.gstate.ctm;
        self.stream.push_str("q\n");
        self.gstate.write_clip(&mut self.stream);
        self.gstate.on_fill(&mut self.stream);
        self.path
            .write(&mut self.stream, WindingOrder::EvenOdd.fill_op(), &ctm);
        self.stream.push_str("Q\n");
        self.new_path();
    }

    pub fn fill_and_stroke(&mut self) {
        let ctm = self.gstate.ctm;
        if ctm.sx != 0.0 || ctm.sy != 0.0 {
            self.stream.push_str("q\n");
            self.gstate.write_clip(&mut self.stream);
            self.gstate.on_fill(&mut self.stream);
            self.gstate.on_stroke(&mut self.stream, &ctm);
            self.path.write(&mut self.stream, "B", &ctm);
            self.stream.push_str("Q\n");
        }
        self.new_path();
    }

    pub fn eofill_and_stroke(&mut self) {
        let ctm = self.gstate.ctm;
        if ctm.sx != 0.0 || ctm.sy != 0.0 {
            self.stream.push_str("q\n");
            self.gstate.write_clip(&mut self.stream);
            self.gstate.on_fill(&mut self.stream);
            self.gstate.on_stroke(&mut self.stream, &ctm);
            self.path.write(&mut self.stream, "B*", &ctm);
            self.stream.push_str("Q\n");
        }
        self.new_path();
    }

    fn rect_paint(&mut self, x: Pt, y: Pt, width: Pt, height: Pt, do_stroke: bool) {
        // the path and the current point both survive a rect paint
        let saved_point = (
            self.gstate.current_point,
            self.gstate.has_current_point,
            self.gstate.last_move_to,
        );
        self.path_stack.push(self.path.clone());

        self.new_path();
        self.rectangle(x, y, width, height);
        self.stream.push_str("q\n");
        if do_stroke {
            self.stroke();
        } else {
            self.fill();
        }
        self.stream.push_str("Q\n");

        if let Some(path) = self.path_stack.pop() {
            self.path = path;
        }
        self.gstate.current_point = saved_point.0;
        self.gstate.has_current_point = saved_point.1;
        self.gstate.last_move_to = saved_point.2;
    }

    pub fn rect_stroke(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.rect_paint(x, y, width, height, true);
    }

    pub fn rect_fill(&mut self, x: Pt, y: Pt, width: Pt, height: Pt) {
        self.rect_paint(x, y, width, height, false);
    }

    // -- text ---------------------------------------------------------

    /// Show text at the current point.
    pub fn show(&mut self, text: &str) -> Result<(), Error> {
        self.show_bytes(text.as_bytes())
    }

    /// Show raw one-byte character codes at the current point.
    pub fn show_bytes(&mut self, codes: &[u8]) -> Result<(), Error> {
        if codes.is_empty() {
            return Err(Error::InvalidParameter);
        }
        let pt = self.gstate.current_point();
        self.write_text(pt.x, pt.y, codes)
    }

    /// Show text at an explicit position (user space).
    pub fn show_at(&mut self, x: Pt, y: Pt, text: &str) -> Result<(), Error> {
        self.show_bytes_at(x, y, text.as_bytes())
    }

    pub fn show_bytes_at(&mut self, x: Pt, y: Pt, codes: &[u8]) -> Result<(), Error> {
        if codes.is_empty() {
            return Err(Error::InvalidParameter);
        }
        self.write_text(x, y, codes)
    }

    /// Emit the stroke/fill operators the rendering mode calls for.
    fn prepare_graphics(&mut self) {
        let (apply_fill, apply_stroke) = self.gstate.rendering_mode.marks();
        let ctm = self.gstate.ctm;
        if apply_stroke {
            self.gstate.on_stroke(&mut self.stream, &ctm);
        }
        if apply_fill {
            self.gstate.on_fill(&mut self.stream);
        }
    }

    fn write_text(&mut self, x: Pt, y: Pt, codes: &[u8]) -> Result<(), Error> {
        let font_name = self.gstate.font.name.clone();
        let size = self.gstate.font.size();

        let number = self
            .doc
            .mark_font_in_use(&font_name)
            .ok_or(Error::MissingFont)?;
        let total_width: f32 = {
            let record = self
                .doc
                .font_record(&font_name)
                .ok_or(Error::MissingFont)?;
            codes.iter().map(|c| record.scaled_width(*c, size)).sum()
        };

        let ctm = self.gstate.ctm;

        self.stream.push_str("q\n");
        self.gstate.write_clip(&mut self.stream);
        if !ctm.is_identity() {
            ctm.write(&mut self.stream, "cm");
        }
        self.prepare_graphics();

        self.stream.push_str("BT\n");
        let _ = writeln!(self.stream, "{} Tr", self.gstate.rendering_mode.id());

        let mut font_ctm = self.gstate.font.matrix;
        font_ctm.tx += x.0;
        font_ctm.ty += y.0;
        font_ctm.write(&mut self.stream, "Tm");

        let _ = writeln!(self.stream, "/F{number} 1.0 Tf");

        self.stream.push('(');
        for &code in codes {
            if (0x20..=0x7e).contains(&code) {
                if code == b'(' || code == b')' || code == b'\\' {
                    self.stream.push('\\');
                }
                self.stream.push(code as char);
            } else {
                let _ = write!(self.stream, "\\{code:03o}");
            }
        }
        self.stream.push_str(") Tj\n");
        self.stream.push_str("ET\nQ\n");

        // the current point advances by the run's width
        self.move_to(x + Pt(total_width), y);
        Ok(())
    }

    /// Sum of the scaled advance widths and the line height of a run.
    pub fn string_width(&self, text: &str) -> Result<(Pt, Pt), Error> {
        self.string_width_bytes(text.as_bytes())
    }

    pub fn string_width_bytes(&self, codes: &[u8]) -> Result<(Pt, Pt), Error> {
        let record = self
            .doc
            .font_record(&self.gstate.font.name)
            .ok_or(Error::MissingFont)?;
        let size = self.gstate.font.size();
        let width: f32 = codes.iter().map(|c| record.scaled_width(*c, size)).sum();
        Ok((Pt(width), Pt(record.height(size))))
    }

    /// Append the outlines of a byte string to the current path, in
    /// place of showing it. Requires an outline-capable font source.
    pub fn char_path(&mut self, text: &str) -> Result<(), Error> {
        if text.is_empty() {
            return Err(Error::InvalidParameter);
        }
        let codes = text.as_bytes().to_vec();
        let font_name = self.gstate.font.name.clone();
        let size = self.gstate.font.size();

        let (em_square, advance) = {
            let record = self
                .doc
                .font_record(&font_name)
                .ok_or(Error::MissingFont)?;
            let advance: f32 = codes.iter().map(|c| record.scaled_width(*c, size)).sum();
            (record.data.metrics.em_square, advance)
        };

        let outlines = self
            .doc
            .char_outlines(&font_name, &codes)
            .ok_or(Error::UnsupportedFontType)?;

        let start = self.gstate.current_point();

        // em-square outline coordinates → font size and position
        let mut font_mtx = self.gstate.font.matrix;
        font_mtx.tx += start.x.0;
        font_mtx.ty += start.y.0;
        font_mtx.scale(1.0 / em_square, 1.0 / em_square);

        for segment in outlines {
            match segment {
                OutlineSegment::MoveTo { x, y } => {
                    let p = font_mtx.transform_point(Point::new(Pt(x), Pt(y)));
                    self.move_to(p.x, p.y);
                }
                OutlineSegment::LineTo { x, y } => {
                    let p = font_mtx.transform_point(Point::new(Pt(x), Pt(y)));
                    self.line_to(p.x, p.y);
                }
                OutlineSegment::CurveTo {
                    x1,
                    y1,
                    x2,
                    y2,
                    x3,
                    y3,
                } => {
                    let p1 = font_mtx.transform_point(Point::new(Pt(x1), Pt(y1)));
                    let p2 = font_mtx.transform_point(Point::new(Pt(x2), Pt(y2)));
                    let p3 = font_mtx.transform_point(Point::new(Pt(x3), Pt(y3)));
                    self.curve_to(p1.x, p1.y, p2.x, p2.y, p3.x, p3.y);
                }
                OutlineSegment::Close => self.close_path(),
            }
        }

        self.move_to(start.x + Pt(advance), start.y);
        Ok(())
    }

    // -- images -------------------------------------------------------

    /// Place a registered image with its lower-left corner at (x, y),
    /// scaled to width × height (user space).
    pub fn image(&mut self, key: &str, x: Pt, y: Pt, width: Pt, height: Pt) -> Result<(), Error> {
        let number = self.doc.find_image(key)?;

        let placement = Matrix::new(width.0, 0.0, 0.0, height.0, x.0, y.0);
        let ctm = self.gstate.ctm;

        self.stream.push_str("q\n");
        ctm.write(&mut self.stream, "cm");
        placement.write(&mut self.stream, "cm");
        let _ = writeln!(self.stream, "/Im{number} Do");
        self.stream.push_str("Q\n");
        Ok(())
    }

    // -- clipping -----------------------------------------------------

    /// Reset the clipping path to the full page rectangle.
    pub fn init_clip(&mut self) {
        self.gstate.clipping_path.new_path();
        self.gstate
            .clipping_path
            .rect(0.0, 0.0, self.page_width, self.page_height);
    }

    /// Intersect with the current path, non-zero winding rule.
    pub fn clip(&mut self) {
        self.do_clip(WindingOrder::NonZero);
    }

    /// Intersect with the current path, even-odd rule.
    pub fn eo_clip(&mut self) {
        self.do_clip(WindingOrder::EvenOdd);
    }

    fn do_clip(&mut self, rule: WindingOrder) {
        if self.path.len() > 2 {
            let path = self.path.clone();
            self.gstate.clipping_path.append(&path);
        }
        self.gstate.clip_rule = Some(rule);
    }

    pub fn clip_save(&mut self) {
        self.gstate.clip_save();
    }

    pub fn clip_restore(&mut self) {
        self.gstate.clip_restore();
    }

    /// Replay the stored clipping path through the path operations,
    /// appending it to the current path.
    pub fn clip_path(&mut self) {
        let clip = self.gstate.clipping_path.clone();
        if clip.len() < 3 {
            return;
        }
        let points = clip.points();
        let count = points.len();
        let mut i = 0;
        while i < count {
            let p = points[i];
            match p.kind {
                SegmentKind::MoveTo => {
                    self.move_to(Pt(p.x), Pt(p.y));
                }
                SegmentKind::LineTo => {
                    self.line_to(Pt(p.x), Pt(p.y));
                    if p.closed {
                        self.close_path();
                    }
                }
                SegmentKind::CurveTo => {
                    let p2 = points[i + 1];
                    let p3 = points[i + 2];
                    self.curve_to(
                        Pt(p.x),
                        Pt(p.y),
                        Pt(p2.x),
                        Pt(p2.y),
                        Pt(p3.x),
                        Pt(p3.y),
                    );
                    if p.closed {
                        self.close_path();
                    }
                    i += 2;
                }
                SegmentKind::Rect => {
                    let p2 = points[i + 1];
                    self.rectangle(Pt(p.x), Pt(p.y), Pt(p2.x), Pt(p2.y));
                    i += 1;
                }
            }
            i += 1;
        }
    }

    /// Flatten the current path with the state's flatness tolerance.
    pub fn flatten_path(&mut self) {
        let tolerance = if self.gstate.flatness > 0.0 {
            self.gstate.flatness
        } else {
            1.0
        };
        self.path.flatten(tolerance);
    }

    // -- test access --------------------------------------------------

    #[cfg(test)]
    pub(crate) fn content(&self) -> &str {
        &self.stream
    }
}

impl<W: Write> Drop for PdfPage<'_, W> {
    fn drop(&mut self) {
        if !self.stream.is_empty() {
            let _ = self.show_page();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::PdfDocument;
    use crate::font::BuiltinFonts;
    use crate::image::NoImages;

    fn test_doc() -> PdfDocument<Vec<u8>> {
        PdfDocument::with_writer(Vec::new(), Box::new(BuiltinFonts), Box::new(NoImages)).unwrap()
    }

    #[test]
    fn page_dimensions_are_validated() {
        let mut doc = test_doc();
        assert!(matches!(
            PdfPage::new(&mut doc, Pt(0.0), Pt(792.0), 0),
            Err(Error::InvalidWidth)
        ));
        assert!(matches!(
            PdfPage::new(&mut doc, Pt(612.0), Pt(-1.0), 0),
            Err(Error::InvalidHeight)
        ));
        assert!(matches!(
            PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 45),
            Err(Error::InvalidRotation)
        ));
        assert!(matches!(
            PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), -90),
            Err(Error::InvalidRotation)
        ));
        assert!(PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 180).is_ok());
    }

    #[test]
    fn relative_ops_need_a_current_point() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.new_path();
        let before = page.path.clone();
        assert!(matches!(
            page.rline_to(Pt(10.0), Pt(10.0)),
            Err(Error::NoCurrentPoint)
        ));
        assert!(matches!(
            page.rmove_to(Pt(1.0), Pt(1.0)),
            Err(Error::NoCurrentPoint)
        ));
        assert!(matches!(
            page.rcurve_to(Pt(1.0), Pt(1.0), Pt(2.0), Pt(2.0), Pt(3.0), Pt(3.0)),
            Err(Error::NoCurrentPoint)
        ));
        assert_eq!(page.path, before, "failed relative ops must not touch the path");
        page.move_to(Pt(5.0), Pt(5.0));
        assert!(page.rline_to(Pt(10.0), Pt(10.0)).is_ok());
        assert_eq!(
            page.current_point().unwrap(),
            Point::new(Pt(15.0), Pt(15.0))
        );
    }

    #[test]
    fn close_path_returns_to_the_last_moveto() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.move_to(Pt(10.0), Pt(20.0));
        page.line_to(Pt(100.0), Pt(20.0));
        page.line_to(Pt(100.0), Pt(80.0));
        page.close_path();
        assert_eq!(
            page.current_point().unwrap(),
            Point::new(Pt(10.0), Pt(20.0))
        );
    }

    #[test]
    fn points_are_transformed_before_storage() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.translate(Pt(100.0), Pt(50.0));
        page.move_to(Pt(10.0), Pt(10.0));
        // stored device-space point carries the translation
        assert_eq!(page.path.first_point(), Point::new(Pt(110.0), Pt(60.0)));
        // while the user-space current point does not
        assert_eq!(
            page.current_point().unwrap(),
            Point::new(Pt(10.0), Pt(10.0))
        );
    }

    #[test]
    fn gsave_grestore_round_trips_the_state() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.set_fill_rgb(0.1, 0.2, 0.3);
        page.set_line_width(Pt(4.0));
        page.rotate(30.0);
        page.move_to(Pt(7.0), Pt(9.0));
        let saved_state = page.gstate.clone();
        let saved_path = page.path.clone();

        page.gsave();
        page.set_fill_rgb(0.9, 0.9, 0.9);
        page.set_dash(&[1.0, 2.0], 0.0).unwrap();
        page.scale(3.0, 3.0);
        page.line_to(Pt(50.0), Pt(50.0));
        page.grestore();

        assert_eq!(page.gstate, saved_state);
        assert_eq!(page.path, saved_path);
    }

    #[test]
    fn show_page_resets_everything_but_the_font() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.select_font("Helvetica", 24.0).unwrap();
        page.set_stroke_rgb(1.0, 0.0, 0.0);
        page.rotate(45.0);
        page.gsave();
        page.move_to(Pt(1.0), Pt(1.0));
        page.line_to(Pt(2.0), Pt(2.0));
        page.stroke();
        page.show_page().unwrap();

        let default_state = GraphicsState::default();
        assert_eq!(page.gstate.ctm, default_state.ctm);
        assert_eq!(page.gstate.stroke_color, default_state.stroke_color);
        assert!(!page.gstate.has_current_point);
        assert!(page.graphics_stack.is_empty());
        assert!(page.path_stack.is_empty());
        assert!(page.content().is_empty());
        assert_eq!(page.gstate.font.name, "Helvetica");
        assert_eq!(page.gstate.font.size(), 24.0);
    }

    #[test]
    fn rect_paint_preserves_path_and_current_point() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.move_to(Pt(33.0), Pt(44.0));
        page.line_to(Pt(55.0), Pt(66.0));
        let path = page.path.clone();
        let point = page.current_point().unwrap();

        page.rect_fill(Pt(0.0), Pt(0.0), Pt(10.0), Pt(10.0));
        assert_eq!(page.path, path);
        assert_eq!(page.current_point().unwrap(), point);

        page.rect_stroke(Pt(5.0), Pt(5.0), Pt(10.0), Pt(10.0));
        assert_eq!(page.path, path);
        assert_eq!(page.current_point().unwrap(), point);
    }

    #[test]
    fn invert_matrix_replaces_the_ctm() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.translate(Pt(10.0), Pt(0.0));
        page.scale(2.0, 2.0);
        let forward = page.current_matrix();
        page.invert_matrix().unwrap();
        let mut product = page.current_matrix();
        product.multiply(&forward);
        assert!(product.is_identity());

        page.set_matrix(Matrix::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        assert!(matches!(page.invert_matrix(), Err(Error::InvalidParameter)));
    }

    #[test]
    fn degenerate_ctm_suppresses_strokes() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.set_matrix(Matrix::new(0.0, 0.0, 0.0, 0.0, 0.0, 0.0));
        page.move_to(Pt(0.0), Pt(0.0));
        page.line_to(Pt(10.0), Pt(10.0));
        page.stroke();
        assert!(page.content().is_empty());
        // the failed stroke still starts a fresh path
        assert!(page.path.is_empty());
        page.show_page().unwrap();
    }

    #[test]
    fn arc_radius_is_range_checked() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        assert!(matches!(
            page.arc(Pt(0.0), Pt(0.0), Pt(0.0), 0.0, 90.0),
            Err(Error::RangeCheck)
        ));
        assert!(matches!(
            page.ellipse(Pt(0.0), Pt(0.0), Pt(5.0), Pt(-5.0)),
            Err(Error::RangeCheck)
        ));
        assert!(page.arc(Pt(100.0), Pt(100.0), Pt(50.0), 0.0, 90.0).is_ok());
    }

    #[test]
    fn ellipse_appends_four_cubics() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.ellipse(Pt(100.0), Pt(100.0), Pt(50.0), Pt(50.0)).unwrap();
        let curves = page
            .path
            .points()
            .iter()
            .filter(|p| p.kind == SegmentKind::CurveTo)
            .count();
        assert_eq!(curves, 12, "4 cubics à 3 records");
    }

    #[test]
    fn clip_rule_and_path_accumulate() {
        let mut doc = test_doc();
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.rectangle(Pt(10.0), Pt(10.0), Pt(100.0), Pt(100.0));
        page.clip();
        assert_eq!(page.gstate.clip_rule, Some(WindingOrder::NonZero));
        assert!(page.gstate.clipping_path.len() > 1);
        page.new_path();
        page.rectangle(Pt(20.0), Pt(20.0), Pt(50.0), Pt(50.0));
        page.eo_clip();
        assert_eq!(page.gstate.clip_rule, Some(WindingOrder::EvenOdd));
    }
}
