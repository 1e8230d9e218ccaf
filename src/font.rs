//! Font records, the metrics-source collaborator boundary, and font
//! object emission.
//!
//! The crate never loads fonts from disk and never parses font
//! programs beyond the `.pfb` segment framing: a [`FontSource`] hands
//! over metrics plus (for embedded fonts) the raw program bytes, and
//! the document marshals those into PDF objects. [`BuiltinFonts`]
//! backs the standard Latin base-14 faces with their AFM metrics so a
//! document works out of the box.

use std::collections::BTreeMap;
use std::io::Write;

use log::warn;

use crate::compress::{compress, STREAM_COMPRESSION};
use crate::error::Error;
use crate::objects::{CountingWriter, ObjectTable};

/// Every page starts out with this face bound at [`DEFAULT_FONT_SIZE`].
pub const DEFAULT_FONT_NAME: &str = "Times-Roman";
pub const DEFAULT_FONT_SIZE: f32 = 11.0;

/// PDF font program flavor; selects `/FontFile`, `/FontFile2` or
/// `/FontFile3` in the descriptor.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum FontSubtype {
    Type1,
    TrueType,
    Cff,
}

impl FontSubtype {
    pub fn as_str(&self) -> &'static str {
        match self {
            FontSubtype::Type1 => "Type1",
            FontSubtype::TrueType => "TrueType",
            FontSubtype::Cff => "CFF",
        }
    }

    fn font_file_key(&self) -> &'static str {
        match self {
            FontSubtype::Type1 => "FontFile",
            FontSubtype::TrueType => "FontFile2",
            FontSubtype::Cff => "FontFile3",
        }
    }
}

/// The font program bytes, as handed over by the source.
#[derive(Debug, Clone, PartialEq)]
pub enum FontFile {
    /// Nothing embedded (the base-14 faces every viewer carries)
    None,
    /// A Type1 `.pfb` file: segment headers included, parsed at emission
    Pfb(Vec<u8>),
    /// A raw TrueType or bare-CFF program
    Raw(Vec<u8>),
}

/// Metrics in em-square units (usually a 1000-unit grid).
#[derive(Debug, Clone, PartialEq)]
pub struct FontMetrics {
    pub first_char: u32,
    pub last_char: u32,
    pub ascent: i32,
    pub descent: i32,
    pub cap_height: i32,
    pub x_height: i32,
    pub internal_leading: i32,
    pub external_leading: i32,
    pub font_bbox: [i32; 4],
    /// Advance widths indexed by `char_code - first_char`
    pub widths: Vec<i32>,
    pub em_square: f32,
    pub italic_angle: f32,
    pub stem_v: f32,
}

/// Everything a [`FontSource`] supplies for one face.
#[derive(Debug, Clone, PartialEq)]
pub struct FontData {
    pub base_font: String,
    pub subtype: FontSubtype,
    /// Base-14 faces get no `/Widths`, descriptor or font file
    pub is_base_font: bool,
    pub metrics: FontMetrics,
    pub file: FontFile,
}

/// One glyph-outline drawing step, in em-square coordinates.
#[derive(Debug, Copy, Clone, PartialEq)]
pub enum OutlineSegment {
    MoveTo { x: f32, y: f32 },
    LineTo { x: f32, y: f32 },
    CurveTo { x1: f32, y1: f32, x2: f32, y2: f32, x3: f32, y3: f32 },
    Close,
}

/// The collaborator that resolves font names to metrics and program
/// bytes. Implementations may read AFM/PFB pairs, query a platform
/// font API, or serve from memory — the core does not care.
pub trait FontSource {
    fn load_font(&mut self, name: &str) -> Option<FontData>;

    /// Glyph outlines for a byte string, in em-square coordinates.
    /// Sources without outline access return `None`, which surfaces as
    /// `UnsupportedFontType` from `char_path`.
    fn char_outlines(&mut self, _font: &FontData, _codes: &[u8]) -> Option<Vec<OutlineSegment>> {
        None
    }
}

/// Registry entry: the source's data plus the document-side bookkeeping.
#[derive(Debug)]
pub(crate) struct FontRecord {
    pub data: FontData,
    /// Object number; 0 until the document materializes the font
    pub number: u32,
    pub descriptor_number: u32,
    pub file_number: u32,
    /// Only fonts that actually produced text are written out
    pub in_use: bool,
}

impl FontRecord {
    fn new(data: FontData) -> Self {
        Self {
            data,
            number: 0,
            descriptor_number: 0,
            file_number: 0,
            in_use: false,
        }
    }

    /// Advance width in em units; unmapped codes are zero wide.
    pub fn width(&self, code: u8) -> i32 {
        let m = &self.data.metrics;
        let c = code as u32;
        if c >= m.first_char && c <= m.last_char {
            m.widths
                .get((c - m.first_char) as usize)
                .copied()
                .unwrap_or(0)
        } else {
            0
        }
    }

    /// Advance width in points at the given font size.
    pub fn scaled_width(&self, code: u8, size: f32) -> f32 {
        self.width(code) as f32 * size / self.data.metrics.em_square
    }

    pub fn ascent(&self, size: f32) -> f32 {
        self.data.metrics.ascent as f32 * size / self.data.metrics.em_square
    }

    pub fn descent(&self, size: f32) -> f32 {
        self.data.metrics.descent as f32 * size / self.data.metrics.em_square
    }

    pub fn internal_leading(&self, size: f32) -> f32 {
        self.data.metrics.internal_leading as f32 * size / self.data.metrics.em_square
    }

    pub fn external_leading(&self, size: f32) -> f32 {
        self.data.metrics.external_leading as f32 * size / self.data.metrics.em_square
    }

    /// Line height: ascent plus the magnitude of the descent.
    pub fn height(&self, size: f32) -> f32 {
        self.ascent(size) + self.descent(size).abs()
    }

    fn write_font_info<W: Write>(
        &self,
        out: &mut CountingWriter<W>,
        objects: &mut ObjectTable,
    ) -> Result<(), Error> {
        objects.begin_object(self.number, out)?;
        write!(
            out,
            "<</Type /Font\n/Subtype /{}\n/BaseFont /{}\n",
            self.data.subtype.as_str(),
            self.data.base_font
        )?;

        if !self.data.is_base_font {
            let m = &self.data.metrics;
            write!(out, "/FirstChar {}\n", m.first_char)?;
            write!(out, "/LastChar {}\n", m.last_char)?;

            out.write_all(b"/Widths [\n")?;
            let mut n = 0;
            for w in &m.widths {
                write!(out, "{w} ")?;
                // only 20 per row
                n += 1;
                if n == 20 {
                    out.write_all(b"\n")?;
                    n = 0;
                }
            }
            out.write_all(b"]\n")?;

            write!(out, "/FontDescriptor {} 0 R\n", self.descriptor_number)?;
        }

        out.write_all(b">>\nendobj\n")?;
        Ok(())
    }

    fn write_font_descriptor<W: Write>(
        &self,
        out: &mut CountingWriter<W>,
        objects: &mut ObjectTable,
    ) -> Result<(), Error> {
        let m = &self.data.metrics;
        objects.begin_object(self.descriptor_number, out)?;
        write!(
            out,
            "<</Type /FontDescriptor\n/FontName /{}\n",
            self.data.base_font
        )?;
        write!(
            out,
            "/FontBBox [{} {} {} {}]\n",
            m.font_bbox[0], m.font_bbox[1], m.font_bbox[2], m.font_bbox[3]
        )?;
        write!(out, "/Flags 4\n")?;
        write!(out, "/Ascent {}\n", m.ascent)?;
        write!(out, "/Descent {}\n", m.descent)?;
        write!(out, "/ItalicAngle {:.2}\n", m.italic_angle)?;
        write!(out, "/StemV {:.2}\n", m.stem_v)?;
        write!(out, "/CapHeight {}\n", m.cap_height)?;
        if self.file_number != 0 {
            write!(
                out,
                "/{} {} 0 R\n",
                self.data.subtype.font_file_key(),
                self.file_number
            )?;
        }
        out.write_all(b">>\nendobj\n")?;
        Ok(())
    }

    fn write_font_file<W: Write>(
        &self,
        out: &mut CountingWriter<W>,
        objects: &mut ObjectTable,
    ) -> Result<(), Error> {
        objects.begin_object(self.file_number, out)?;

        match (&self.data.file, self.data.subtype) {
            (FontFile::Pfb(bytes), FontSubtype::Type1) => {
                let (program, length1, length2) =
                    parse_pfb(bytes).ok_or(Error::InvalidFontType)?;
                match compress(&program, STREAM_COMPRESSION) {
                    Some(packed) => {
                        write!(
                            out,
                            "<</Filter /FlateDecode /Length {} /Length1 {} /Length2 {} /Length3 0>>\nstream\n",
                            packed.len(),
                            length1,
                            length2
                        )?;
                        out.write_all(&packed)?;
                    }
                    None => {
                        write!(
                            out,
                            "<</Length {} /Length1 {} /Length2 {} /Length3 0>>\nstream\n",
                            program.len(),
                            length1,
                            length2
                        )?;
                        out.write_all(&program)?;
                    }
                }
                out.write_all(b"\nendstream\n")?;
            }
            (FontFile::Raw(bytes), FontSubtype::TrueType) => {
                match compress(bytes, STREAM_COMPRESSION) {
                    Some(packed) => {
                        write!(
                            out,
                            "<</Filter /FlateDecode /Length {} /Length1 {}>>\nstream\n",
                            packed.len(),
                            bytes.len()
                        )?;
                        out.write_all(&packed)?;
                    }
                    None => {
                        write!(
                            out,
                            "<</Length {} /Length1 {}>>\nstream\n",
                            bytes.len(),
                            bytes.len()
                        )?;
                        out.write_all(bytes)?;
                    }
                }
                out.write_all(b"\nendstream\n")?;
            }
            (FontFile::Raw(bytes), FontSubtype::Cff) => {
                match compress(bytes, STREAM_COMPRESSION) {
                    Some(packed) => {
                        write!(
                            out,
                            "<</Filter /FlateDecode /Length {}>>\nstream\n",
                            packed.len()
                        )?;
                        out.write_all(&packed)?;
                    }
                    None => {
                        write!(out, "<</Length {}>>\nstream\n", bytes.len())?;
                        out.write_all(bytes)?;
                    }
                }
                out.write_all(b"\nendstream\n")?;
            }
            _ => return Err(Error::InvalidFontType),
        }

        out.write_all(b"endobj\n")?;
        Ok(())
    }

    pub fn write<W: Write>(
        &self,
        out: &mut CountingWriter<W>,
        objects: &mut ObjectTable,
    ) -> Result<(), Error> {
        self.write_font_info(out, objects)?;
        if self.descriptor_number != 0 {
            self.write_font_descriptor(out, objects)?;
        }
        if self.file_number != 0 {
            self.write_font_file(out, objects)?;
        }
        Ok(())
    }
}

/// Split a `.pfb` into its ASCII and binary segments and return them
/// concatenated, plus the two lengths for `/Length1` and `/Length2`.
/// Segments carry 6-byte headers: `0x80`, a type byte (1 = ASCII,
/// 2 = binary), and a little-endian u32 length. The trailing cleartext
/// section is dropped (`/Length3 0`).
pub(crate) fn parse_pfb(data: &[u8]) -> Option<(Vec<u8>, usize, usize)> {
    fn segment(data: &[u8], offset: usize, segment_type: u8) -> Option<(usize, usize)> {
        let header = data.get(offset..offset + 6)?;
        if header[0] != 0x80 || header[1] != segment_type {
            return None;
        }
        let len = u32::from_le_bytes([header[2], header[3], header[4], header[5]]) as usize;
        data.get(offset + 6..offset + 6 + len)?;
        Some((offset + 6, len))
    }

    let (ascii_start, length1) = segment(data, 0, 1)?;
    let (binary_start, length2) = segment(data, ascii_start + length1, 2)?;

    let mut program = Vec::with_capacity(length1 + length2);
    program.extend_from_slice(&data[ascii_start..ascii_start + length1]);
    program.extend_from_slice(&data[binary_start..binary_start + length2]);
    Some((program, length1, length2))
}

/// Name-keyed font store plus the source it loads from.
pub(crate) struct FontRegistry {
    table: BTreeMap<String, FontRecord>,
    source: Box<dyn FontSource>,
}

impl FontRegistry {
    pub fn new(source: Box<dyn FontSource>) -> Self {
        Self {
            table: BTreeMap::new(),
            source,
        }
    }

    fn ensure_loaded(&mut self, key: &str, name: &str) -> bool {
        if self.table.contains_key(key) {
            return true;
        }
        match self.source.load_font(name) {
            Some(data) => {
                self.table.insert(key.to_string(), FontRecord::new(data));
                true
            }
            None => false,
        }
    }

    /// Find or load a record. Unknown names fall back to the default
    /// face, the way PostScript interpreters substitute a resident font.
    pub fn find(&mut self, name: &str) -> Option<&mut FontRecord> {
        let key = name.to_ascii_lowercase();
        let key = if self.ensure_loaded(&key, name) {
            key
        } else if !name.eq_ignore_ascii_case(DEFAULT_FONT_NAME) {
            warn!("font {name:?} not available, substituting {DEFAULT_FONT_NAME}");
            let fallback = DEFAULT_FONT_NAME.to_ascii_lowercase();
            if !self.ensure_loaded(&fallback, DEFAULT_FONT_NAME) {
                return None;
            }
            fallback
        } else {
            return None;
        };
        self.table.get_mut(&key)
    }

    /// Lookup without loading; for metrics queries on already-bound fonts.
    pub fn get(&self, name: &str) -> Option<&FontRecord> {
        self.table.get(&name.to_ascii_lowercase())
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut FontRecord> {
        self.table.get_mut(&name.to_ascii_lowercase())
    }

    pub fn char_outlines(&mut self, name: &str, codes: &[u8]) -> Option<Vec<OutlineSegment>> {
        let record = self.table.get(&name.to_ascii_lowercase())?;
        self.source.char_outlines(&record.data, codes)
    }

    /// Write every font that was actually used.
    pub fn write_fonts<W: Write>(
        &self,
        out: &mut CountingWriter<W>,
        objects: &mut ObjectTable,
    ) -> Result<(), Error> {
        for record in self.table.values() {
            if record.in_use {
                record.write(out, objects)?;
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------
// Builtin base-14 metrics
// ---------------------------------------------------------------------

/// Metrics-only source for the 12 standard Latin base-14 faces
/// (Times, Helvetica, Courier families), carrying the published AFM
/// advance widths for chars 32..=126. Nothing is embedded: viewers
/// supply these fonts themselves.
#[derive(Debug, Default)]
pub struct BuiltinFonts;

impl FontSource for BuiltinFonts {
    fn load_font(&mut self, name: &str) -> Option<FontData> {
        builtin_font_data(name)
    }
}

const BUILTIN_FIRST_CHAR: u32 = 32;
const BUILTIN_LAST_CHAR: u32 = 126;

struct BuiltinFace {
    name: &'static str,
    ascent: i32,
    descent: i32,
    cap_height: i32,
    x_height: i32,
    font_bbox: [i32; 4],
    italic_angle: f32,
    stem_v: f32,
    widths: &'static [i32; 95],
}

#[rustfmt::skip]
static TIMES_ROMAN_WIDTHS: [i32; 95] = [
    250, 333, 408, 500, 500, 833, 778, 180, 333, 333, 500, 564, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 278, 278, 564, 564, 564, 444,
    921, 722, 667, 667, 722, 611, 556, 722, 722, 333, 389, 722, 611, 889, 722, 722,
    556, 722, 667, 556, 611, 722, 722, 944, 722, 722, 611, 333, 278, 333, 469, 500,
    333, 444, 500, 444, 500, 444, 333, 500, 500, 278, 278, 500, 278, 778, 500, 500,
    500, 500, 333, 389, 278, 500, 500, 722, 500, 500, 444, 480, 200, 480, 541,
];

#[rustfmt::skip]
static TIMES_BOLD_WIDTHS: [i32; 95] = [
    250, 333, 555, 500, 500, 1000, 833, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    930, 722, 667, 722, 722, 667, 611, 778, 778, 389, 500, 778, 667, 944, 722, 778,
    611, 778, 722, 556, 667, 722, 722, 1000, 722, 722, 667, 333, 278, 333, 581, 500,
    333, 500, 556, 444, 556, 444, 333, 500, 556, 278, 333, 556, 278, 833, 556, 500,
    556, 556, 444, 389, 333, 556, 500, 722, 500, 500, 444, 394, 220, 394, 520,
];

#[rustfmt::skip]
static TIMES_ITALIC_WIDTHS: [i32; 95] = [
    250, 333, 420, 500, 500, 833, 778, 214, 333, 333, 500, 675, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 675, 675, 675, 500,
    920, 611, 611, 667, 722, 611, 611, 722, 722, 333, 444, 667, 556, 833, 667, 722,
    611, 722, 611, 500, 556, 722, 611, 833, 611, 556, 556, 389, 278, 389, 422, 500,
    333, 500, 500, 444, 500, 444, 278, 500, 500, 278, 278, 444, 278, 722, 500, 500,
    500, 500, 389, 389, 278, 500, 444, 667, 444, 444, 389, 400, 275, 400, 541,
];

#[rustfmt::skip]
static TIMES_BOLD_ITALIC_WIDTHS: [i32; 95] = [
    250, 389, 555, 500, 500, 833, 778, 278, 333, 333, 500, 570, 250, 333, 250, 278,
    500, 500, 500, 500, 500, 500, 500, 500, 500, 500, 333, 333, 570, 570, 570, 500,
    832, 667, 667, 667, 722, 667, 667, 722, 778, 389, 500, 667, 611, 889, 722, 722,
    611, 722, 667, 556, 611, 722, 667, 889, 667, 611, 611, 333, 278, 333, 570, 500,
    333, 500, 500, 444, 500, 444, 333, 500, 556, 278, 278, 500, 278, 778, 556, 500,
    500, 500, 389, 389, 278, 556, 444, 667, 500, 444, 389, 348, 220, 348, 570,
];

#[rustfmt::skip]
static HELVETICA_WIDTHS: [i32; 95] = [
    278, 278, 355, 556, 556, 889, 667, 191, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 278, 278, 584, 584, 584, 556,
    1015, 667, 667, 722, 722, 667, 611, 778, 722, 278, 500, 667, 556, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 278, 278, 278, 469, 556,
    333, 556, 556, 500, 556, 556, 278, 556, 556, 222, 222, 500, 222, 833, 556, 556,
    556, 556, 333, 500, 278, 556, 500, 722, 500, 500, 500, 334, 260, 334, 584,
];

#[rustfmt::skip]
static HELVETICA_BOLD_WIDTHS: [i32; 95] = [
    278, 333, 474, 556, 556, 889, 722, 238, 333, 333, 389, 584, 278, 333, 278, 278,
    556, 556, 556, 556, 556, 556, 556, 556, 556, 556, 333, 333, 584, 584, 584, 611,
    975, 722, 722, 722, 722, 667, 611, 778, 722, 278, 556, 722, 611, 833, 722, 778,
    667, 778, 722, 667, 611, 722, 667, 944, 667, 667, 611, 333, 278, 333, 584, 556,
    333, 556, 611, 556, 611, 556, 333, 611, 611, 278, 278, 556, 278, 889, 611, 611,
    611, 611, 389, 556, 333, 611, 556, 778, 556, 556, 500, 389, 280, 389, 584,
];

static COURIER_WIDTHS: [i32; 95] = [600; 95];

static BUILTIN_FACES: &[BuiltinFace] = &[
    BuiltinFace {
        name: "Times-Roman",
        ascent: 683,
        descent: -217,
        cap_height: 662,
        x_height: 450,
        font_bbox: [-168, -218, 1000, 898],
        italic_angle: 0.0,
        stem_v: 84.0,
        widths: &TIMES_ROMAN_WIDTHS,
    },
    BuiltinFace {
        name: "Times-Bold",
        ascent: 683,
        descent: -217,
        cap_height: 676,
        x_height: 461,
        font_bbox: [-168, -218, 1000, 935],
        italic_angle: 0.0,
        stem_v: 139.0,
        widths: &TIMES_BOLD_WIDTHS,
    },
    BuiltinFace {
        name: "Times-Italic",
        ascent: 683,
        descent: -217,
        cap_height: 653,
        x_height: 441,
        font_bbox: [-169, -217, 1010, 883],
        italic_angle: -15.5,
        stem_v: 76.0,
        widths: &TIMES_ITALIC_WIDTHS,
    },
    BuiltinFace {
        name: "Times-BoldItalic",
        ascent: 683,
        descent: -217,
        cap_height: 669,
        x_height: 462,
        font_bbox: [-200, -218, 996, 921],
        italic_angle: -15.0,
        stem_v: 121.0,
        widths: &TIMES_BOLD_ITALIC_WIDTHS,
    },
    BuiltinFace {
        name: "Helvetica",
        ascent: 718,
        descent: -207,
        cap_height: 718,
        x_height: 523,
        font_bbox: [-166, -225, 1000, 931],
        italic_angle: 0.0,
        stem_v: 88.0,
        widths: &HELVETICA_WIDTHS,
    },
    BuiltinFace {
        name: "Helvetica-Bold",
        ascent: 718,
        descent: -207,
        cap_height: 718,
        x_height: 532,
        font_bbox: [-170, -228, 1003, 962],
        italic_angle: 0.0,
        stem_v: 140.0,
        widths: &HELVETICA_BOLD_WIDTHS,
    },
    BuiltinFace {
        name: "Helvetica-Oblique",
        ascent: 718,
        descent: -207,
        cap_height: 718,
        x_height: 523,
        font_bbox: [-170, -225, 1116, 931],
        italic_angle: -12.0,
        stem_v: 88.0,
        widths: &HELVETICA_WIDTHS,
    },
    BuiltinFace {
        name: "Helvetica-BoldOblique",
        ascent: 718,
        descent: -207,
        cap_height: 718,
        x_height: 532,
        font_bbox: [-174, -228, 1114, 962],
        italic_angle: -12.0,
        stem_v: 140.0,
        widths: &HELVETICA_BOLD_WIDTHS,
    },
    BuiltinFace {
        name: "Courier",
        ascent: 629,
        descent: -157,
        cap_height: 562,
        x_height: 426,
        font_bbox: [-23, -250, 715, 805],
        italic_angle: 0.0,
        stem_v: 51.0,
        widths: &COURIER_WIDTHS,
    },
    BuiltinFace {
        name: "Courier-Bold",
        ascent: 629,
        descent: -157,
        cap_height: 562,
        x_height: 439,
        font_bbox: [-113, -250, 749, 801],
        italic_angle: 0.0,
        stem_v: 106.0,
        widths: &COURIER_WIDTHS,
    },
    BuiltinFace {
        name: "Courier-Oblique",
        ascent: 629,
        descent: -157,
        cap_height: 562,
        x_height: 426,
        font_bbox: [-27, -250, 849, 805],
        italic_angle: -12.0,
        stem_v: 51.0,
        widths: &COURIER_WIDTHS,
    },
    BuiltinFace {
        name: "Courier-BoldOblique",
        ascent: 629,
        descent: -157,
        cap_height: 562,
        x_height: 439,
        font_bbox: [-57, -250, 869, 801],
        italic_angle: -12.0,
        stem_v: 106.0,
        widths: &COURIER_WIDTHS,
    },
];

fn builtin_font_data(name: &str) -> Option<FontData> {
    let face = BUILTIN_FACES
        .iter()
        .find(|f| f.name.eq_ignore_ascii_case(name))?;
    let em_square = 1000.0;
    Some(FontData {
        base_font: face.name.to_string(),
        subtype: FontSubtype::Type1,
        is_base_font: true,
        metrics: FontMetrics {
            first_char: BUILTIN_FIRST_CHAR,
            last_char: BUILTIN_LAST_CHAR,
            ascent: face.ascent,
            descent: face.descent,
            cap_height: face.cap_height,
            x_height: face.x_height,
            internal_leading: em_square as i32 - (face.ascent - face.descent),
            external_leading: 0,
            font_bbox: face.font_bbox,
            widths: face.widths.to_vec(),
            em_square,
            italic_angle: face.italic_angle,
            stem_v: face.stem_v,
        },
        file: FontFile::None,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builtin_lookup_is_case_insensitive() {
        let mut src = BuiltinFonts;
        let a = src.load_font("Helvetica-Bold").unwrap();
        let b = src.load_font("helvetica-bold").unwrap();
        assert_eq!(a.base_font, b.base_font);
        assert!(a.is_base_font);
        assert!(src.load_font("Wingdings-3D").is_none());
    }

    #[test]
    fn builtin_width_tables_cover_printable_ascii() {
        for name in ["Times-Roman", "Helvetica", "Courier"] {
            let data = builtin_font_data(name).unwrap();
            assert_eq!(data.metrics.widths.len(), 95, "{name}");
            assert_eq!(data.metrics.first_char, 32);
            assert_eq!(data.metrics.last_char, 126);
        }
    }

    #[test]
    fn scaled_width_follows_the_em_square() {
        let mut registry = FontRegistry::new(Box::new(BuiltinFonts));
        let rec = registry.find("Courier").unwrap();
        assert_eq!(rec.width(b'M'), 600);
        assert!((rec.scaled_width(b'M', 10.0) - 6.0).abs() < 1e-6);
        // out-of-range codes are zero wide
        assert_eq!(rec.width(0x07), 0);
    }

    #[test]
    fn unknown_names_fall_back_to_the_default_face() {
        let mut registry = FontRegistry::new(Box::new(BuiltinFonts));
        let rec = registry.find("Comic-Sans").unwrap();
        assert_eq!(rec.data.base_font, DEFAULT_FONT_NAME);
    }

    #[test]
    fn pfb_segments_are_parsed_and_concatenated() {
        let ascii = b"%!PS-AdobeFont-1.0: Test\n";
        let binary = [0xde, 0xad, 0xbe, 0xef, 0x01];
        let mut pfb = Vec::new();
        pfb.push(0x80);
        pfb.push(1);
        pfb.extend_from_slice(&(ascii.len() as u32).to_le_bytes());
        pfb.extend_from_slice(ascii);
        pfb.push(0x80);
        pfb.push(2);
        pfb.extend_from_slice(&(binary.len() as u32).to_le_bytes());
        pfb.extend_from_slice(&binary);
        // trailing cleartext segment is ignored
        pfb.extend_from_slice(&[0x80, 1, 2, 0, 0, 0]);
        pfb.extend_from_slice(b"0\n");

        let (program, length1, length2) = parse_pfb(&pfb).unwrap();
        assert_eq!(length1, ascii.len());
        assert_eq!(length2, binary.len());
        assert_eq!(program.len(), ascii.len() + binary.len());
        assert_eq!(&program[..ascii.len()], ascii);
        assert_eq!(&program[ascii.len()..], &binary);
    }

    #[test]
    fn truncated_pfb_is_rejected() {
        assert!(parse_pfb(&[0x80, 1, 0xff, 0, 0, 0, b'x']).is_none());
        assert!(parse_pfb(b"%!PS-AdobeFont").is_none());
    }
}
