//! # pspdf
//!
//! pspdf writes PDF 1.4 documents through a PostScript-flavored
//! imperative drawing API: open a document, open a page, issue path /
//! paint / text / clip commands, `show_page`, `close`.
//!
//! PDF is a state-based format: colors, line attributes, the CTM and
//! the bound font stay set until changed, and `gsave`/`grestore`
//! bracket state the way PostScript does. Coordinates are in points
//! (1/72 inch) with the origin at the bottom-left of the page.
//!
//! Fonts and images are collaborators, not built-ins: a [`FontSource`]
//! supplies metrics (and font programs for embedding), an
//! [`ImageSource`] supplies decoded RGB8 pixels. [`BuiltinFonts`]
//! covers the standard Latin base-14 faces out of the box.
//!
//! ```rust
//! use pspdf::*;
//!
//! # fn run() -> Result<(), Error> {
//! let mut doc = PdfDocument::with_writer(
//!     Vec::new(),
//!     Box::new(BuiltinFonts),
//!     Box::new(NoImages),
//! )?;
//! {
//!     let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0)?;
//!
//!     page.select_font("Helvetica", 18.0)?;
//!     page.show_at(Pt(72.0), Pt(700.0), "Hello, PDF!")?;
//!
//!     page.set_stroke_rgb(0.0, 0.0, 1.0);
//!     page.set_line_width(Pt(2.0));
//!     page.move_to(Pt(72.0), Pt(690.0));
//!     page.line_to(Pt(300.0), Pt(690.0));
//!     page.stroke();
//!
//!     page.show_page()?;
//! }
//! let bytes = doc.finish()?;
//! assert!(bytes.starts_with(b"%PDF-1.4"));
//! # Ok(()) }
//! # run().unwrap();
//! ```
//!
//! Writing to a file works the same way through
//! [`PdfDocument::create`], which picks the builtin fonts and no image
//! source.

pub mod arc;
pub mod color;
mod compress;
pub mod document;
pub mod error;
pub mod font;
pub mod graphics;
pub mod image;
pub mod matrix;
mod objects;
pub mod page;
pub mod path;
mod resources;
pub mod units;

pub use crate::arc::BezierArc;
pub use crate::color::{Cmyk, Color, Greyscale, Rgb};
pub use crate::document::PdfDocument;
pub use crate::error::Error;
pub use crate::font::{
    BuiltinFonts, FontData, FontFile, FontMetrics, FontSource, FontSubtype, OutlineSegment,
    DEFAULT_FONT_NAME, DEFAULT_FONT_SIZE,
};
pub use crate::graphics::{
    FontBinding, LineCapStyle, LineDashPattern, LineJoinStyle, Point, TextRenderingMode,
    WindingOrder,
};
pub use crate::image::{ImageSource, NoImages, RasterImage};
pub use crate::matrix::Matrix;
pub use crate::page::PdfPage;
pub use crate::path::{Path, PathPoint, SegmentKind};
pub use crate::units::{Mm, Pt};
