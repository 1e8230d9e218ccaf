use std::io::Read;

use pretty_assertions::assert_eq;

use pspdf::{
    BuiltinFonts, Error, FontData, FontFile, FontMetrics, FontSource, FontSubtype, ImageSource,
    NoImages, OutlineSegment, PdfDocument, PdfPage, Point, Pt, RasterImage, TextRenderingMode,
};

// ---------------------------------------------------------------------
// helpers
// ---------------------------------------------------------------------

fn build_doc() -> PdfDocument<Vec<u8>> {
    PdfDocument::with_writer(Vec::new(), Box::new(BuiltinFonts), Box::new(NoImages)).unwrap()
}

fn find(haystack: &[u8], needle: &[u8], from: usize) -> Option<usize> {
    haystack[from..]
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|i| i + from)
}

/// Every stream in the file, deflate-decoded when possible, raw otherwise.
fn extract_streams(bytes: &[u8]) -> Vec<Vec<u8>> {
    const OPEN: &[u8] = b">>\nstream\n";
    const CLOSE: &[u8] = b"\nendstream";
    let mut streams = Vec::new();
    let mut pos = 0;
    while let Some(start) = find(bytes, OPEN, pos) {
        let data_start = start + OPEN.len();
        let end = find(bytes, CLOSE, data_start).expect("unterminated stream");
        let raw = &bytes[data_start..end];
        let mut decoded = Vec::new();
        if flate2::read::ZlibDecoder::new(raw)
            .read_to_end(&mut decoded)
            .is_err()
        {
            decoded = raw.to_vec();
        }
        streams.push(decoded);
        pos = end + CLOSE.len();
    }
    streams
}

fn as_text(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).to_string()
}

// ---------------------------------------------------------------------
// file structure
// ---------------------------------------------------------------------

#[test]
fn empty_document_has_header_tree_catalog_and_xref() {
    let doc = build_doc();
    let bytes = doc.finish().unwrap();

    assert!(bytes.starts_with(b"%PDF-1.4\n%\x84\x85\x86\x87\n"));

    let text = as_text(&bytes);
    assert!(text.contains("<</Type /Pages\n/Count 0\n/Kids [\n\t]\n>>\nendobj\n"));
    assert!(text.contains("<</Type /Catalog\n/Pages 1 0 R\n>>\nendobj\n"));
    // two objects plus the free-list head
    assert!(text.contains("xref\n0 3\n"));
    assert!(text.contains("/Size 3"));
    assert!(text.contains("/Root 2 0 R"));
    assert!(text.ends_with("%%EOF"));

    // the recorded startxref offset really points at the xref keyword
    let startxref = find(&bytes, b"startxref\n", 0).unwrap() + "startxref\n".len();
    let offset: usize = std::str::from_utf8(&bytes[startxref..])
        .unwrap()
        .lines()
        .next()
        .unwrap()
        .trim()
        .parse()
        .unwrap();
    assert_eq!(&bytes[offset..offset + 4], b"xref");
}

#[test]
fn close_is_idempotent() {
    let mut doc = build_doc();
    doc.close().unwrap();
    doc.close().unwrap();
    let bytes = doc.finish().unwrap();
    let text = as_text(&bytes);
    assert_eq!(text.matches("%%EOF").count(), 1);
}

#[test]
fn missing_filename_is_rejected() {
    assert!(matches!(
        PdfDocument::create(""),
        Err(Error::MissingFilename)
    ));
}

#[test]
fn page_objects_reference_content_and_parent() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 90).unwrap();
        page.move_to(Pt(0.0), Pt(0.0));
        page.line_to(Pt(10.0), Pt(10.0));
        page.stroke();
        page.show_page().unwrap();
    }
    let text = as_text(&doc.finish().unwrap());

    assert!(text.contains("/Type /Page\n"));
    assert!(text.contains("/Parent 1 0 R\n"));
    assert!(text.contains("/MediaBox [0 0 612.00 792.00]\n"));
    assert!(text.contains("/Contents [4 0 R]\n"));
    assert!(text.contains("/Rotate 90\n"));
    // the default font was registered for the page even though unused
    assert!(text.contains("/Font <<\n\t\t/F3 3 0 R\n"));
}

#[test]
fn unused_fonts_become_free_xref_entries() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.show_page().unwrap();
    }
    let text = as_text(&doc.finish().unwrap());

    // no text was shown, so no font object body exists
    assert!(!text.contains("/Type /Font\n"));
    // objects: font 3 (never written), content 4, page 5 → size 6
    assert!(text.contains("xref\n0 6\n"));
    assert!(text.contains("0000000000 00007 f\r\n"));
}

#[test]
fn object_count_matches_pages_plus_resources() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.show_at(Pt(72.0), Pt(700.0), "one").unwrap();
        page.show_page().unwrap();
        page.show_at(Pt(72.0), Pt(700.0), "two").unwrap();
        page.show_page().unwrap();
    }
    assert_eq!(doc.page_count(), 2);
    let text = as_text(&doc.finish().unwrap());

    // N pages → font + 2×(content+page) + tree + catalog = 7 objects
    assert!(text.contains("xref\n0 8\n"));
    assert!(text.contains("/Count 2\n"));
    assert_eq!(text.matches("/Type /Page\n").count(), 2);
    // both pages carry the font resource, not just the first
    assert_eq!(text.matches("/Font <<\n").count(), 2);
}

// ---------------------------------------------------------------------
// content streams
// ---------------------------------------------------------------------

#[test]
fn single_stroked_line_content() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.move_to(Pt(0.0), Pt(0.0));
        page.line_to(Pt(100.0), Pt(100.0));
        page.stroke();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let streams = extract_streams(&bytes);
    assert_eq!(streams.len(), 1);

    let content = as_text(&streams[0]);
    assert_eq!(
        content,
        "q\n0.00 0.00 0.00 RG\n1.00 w\n1.00 0.00 0.00 1.00 0.00 0.00 cm\n\
         0.00 0.00 m\n100.00 100.00 l\nS\nQ\n"
    );
}

#[test]
fn filled_ellipse_content() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.set_fill_rgb(0.0, 0.5, 0.75);
        page.ellipse(Pt(100.0), Pt(100.0), Pt(50.0), Pt(50.0)).unwrap();
        page.fill();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let content = as_text(&extract_streams(&bytes)[0]);

    assert!(content.contains("0.00 0.50 0.75 rg\n"));
    assert_eq!(content.matches(" c\n").count(), 4, "exactly 4 cubic segments");
    assert!(content.contains("f\nQ\n"));
}

#[test]
fn empty_page_stores_a_zero_length_stream_raw() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(200.0), Pt(200.0), 0).unwrap();
        page.show_page().unwrap();
    }
    let text = as_text(&doc.finish().unwrap());
    // nothing to compress: no /Filter, length 0
    assert!(text.contains("<</Length 0>>\nstream\n"));
    assert!(!text.contains("/Filter"));
    assert!(text.contains("/MediaBox [0 0 200.00 200.00]\n"));
}

#[test]
fn long_content_is_flate_compressed() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        for i in 0..100 {
            page.move_to(Pt(0.0), Pt(i as f32));
            page.line_to(Pt(600.0), Pt(i as f32));
            page.stroke();
        }
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let text = as_text(&bytes);
    assert!(text.contains("/Filter /FlateDecode"));
    let content = as_text(&extract_streams(&bytes)[0]);
    assert_eq!(content.matches("S\n").count(), 100);
}

#[test]
fn dash_pattern_is_emitted_before_the_stroke() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.set_dash(&[3.0, 1.0], 0.5).unwrap();
        page.move_to(Pt(0.0), Pt(0.0));
        page.line_to(Pt(50.0), Pt(0.0));
        page.stroke();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let content = as_text(&extract_streams(&bytes)[0]);
    assert!(content.contains("[3.00 1.00] 0.50 d\n"));
}

#[test]
fn erase_page_paints_an_opaque_white_page_rect() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.rotate(45.0); // erase_page must not be affected by the CTM
        page.erase_page();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let content = as_text(&extract_streams(&bytes)[0]);

    assert!(content.contains("1.00 1.00 1.00 rg\n"));
    assert!(content.contains("0.00 0.00 m\n"));
    assert!(content.contains("0.00 792.00 l\n"));
    assert!(content.contains("612.00 792.00 l\n"));
    assert!(content.contains("612.00 0.00 l h\n"));
    assert!(content.contains("f\n"));
}

#[test]
fn clip_is_written_before_painting() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.rectangle(Pt(10.0), Pt(10.0), Pt(100.0), Pt(100.0));
        page.clip();
        page.new_path();
        page.move_to(Pt(0.0), Pt(0.0));
        page.line_to(Pt(200.0), Pt(200.0));
        page.stroke();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let content = as_text(&extract_streams(&bytes)[0]);

    let clip_at = content.find("W n\n").expect("clip emitted");
    let stroke_at = content.rfind("S\n").unwrap();
    assert!(clip_at < stroke_at);
    assert!(content.contains("10.00 10.00 100.00 100.00 re\n"));
}

// ---------------------------------------------------------------------
// text
// ---------------------------------------------------------------------

#[test]
fn rotated_text_advance_matches_string_width() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.select_font("Times-Roman", 12.0).unwrap();
        page.rotate(45.0);

        let (width, _) = page.string_width("Hi").unwrap();
        page.show("Hi").unwrap();

        // the advance is recorded pre-rotation, in user space
        let cp = page.current_point().unwrap();
        assert!((cp.x.0 - width.0).abs() < 1e-3);
        assert!(cp.y.0.abs() < 1e-3);
        // Times-Roman: H = 722, i = 278 → 1000/1000 × 12
        assert!((width.0 - 12.0).abs() < 1e-4);

        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let content = as_text(&extract_streams(&bytes)[0]);

    // the rotation rides in as cm; the Tm carries the font matrix
    assert!(content.contains("0.71 0.71 -0.71 0.71 0.00 0.00 cm\n"));
    assert!(content.contains("12.00 0.00 0.00 12.00 0.00 0.00 Tm\n"));
    assert!(content.contains("/F3 1.0 Tf\n"));
    assert!(content.contains("(Hi) Tj\n"));
    assert!(content.contains("BT\n0 Tr\n"));
}

#[test]
fn text_runs_are_framed_and_escaped() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.show_bytes_at(Pt(10.0), Pt(10.0), b"a(b)c\\d \x07 \xff")
            .unwrap();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let content = as_text(&extract_streams(&bytes)[0]);

    assert!(content.contains("q\n"));
    assert!(content.contains("BT\n"));
    assert!(content.contains("(a\\(b\\)c\\\\d \\007 \\377) Tj\n"));
    assert!(content.contains("ET\nQ\n"));
}

#[test]
fn show_requires_text() {
    let mut doc = build_doc();
    let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
    assert!(matches!(page.show(""), Err(Error::InvalidParameter)));
}

#[test]
fn stroked_rendering_mode_emits_stroke_operators_and_tr() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.set_rendering_mode(TextRenderingMode::Stroke);
        page.set_stroke_rgb(0.0, 0.0, 1.0);
        page.show_at(Pt(5.0), Pt(10.0), "outline").unwrap();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let content = as_text(&extract_streams(&bytes)[0]);

    assert!(content.contains("0.00 0.00 1.00 RG\n"));
    assert!(content.contains("1 Tr\n"));
}

#[test]
fn invisible_rendering_mode_emits_no_paint_operators() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.set_rendering_mode(TextRenderingMode::Invisible);
        page.show_at(Pt(5.0), Pt(10.0), "ghost").unwrap();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let content = as_text(&extract_streams(&bytes)[0]);

    assert!(content.contains("3 Tr\n"));
    assert!(!content.contains(" rg\n"));
    assert!(!content.contains(" RG\n"));
}

#[test]
fn used_base_font_is_written_without_widths() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.select_font("Helvetica", 14.0).unwrap();
        page.show_at(Pt(10.0), Pt(10.0), "hello").unwrap();
        page.show_page().unwrap();
    }
    let text = as_text(&doc.finish().unwrap());

    assert!(text.contains("<</Type /Font\n/Subtype /Type1\n/BaseFont /Helvetica\n>>\nendobj\n"));
    assert!(!text.contains("/Widths"));
    assert!(!text.contains("/FontDescriptor"));
}

#[test]
fn unknown_font_falls_back_to_the_default_face() {
    let mut doc = build_doc();
    let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
    page.select_font("ZapfDingbats", 14.0).unwrap();
    let (w, _) = page.string_width(" ").unwrap();
    // Times-Roman space = 250/1000 × 14
    assert!((w.0 - 3.5).abs() < 1e-4);
}

// ---------------------------------------------------------------------
// embedded fonts and glyph outlines
// ---------------------------------------------------------------------

fn make_pfb(ascii: &[u8], binary: &[u8]) -> Vec<u8> {
    let mut pfb = Vec::new();
    pfb.push(0x80);
    pfb.push(1);
    pfb.extend_from_slice(&(ascii.len() as u32).to_le_bytes());
    pfb.extend_from_slice(ascii);
    pfb.push(0x80);
    pfb.push(2);
    pfb.extend_from_slice(&(binary.len() as u32).to_le_bytes());
    pfb.extend_from_slice(binary);
    pfb
}

struct StubFonts {
    builtin: BuiltinFonts,
    pfb: Vec<u8>,
}

impl FontSource for StubFonts {
    fn load_font(&mut self, name: &str) -> Option<FontData> {
        if !name.eq_ignore_ascii_case("Test-Regular") {
            return self.builtin.load_font(name);
        }
        Some(FontData {
            base_font: "Test-Regular".to_string(),
            subtype: FontSubtype::Type1,
            is_base_font: false,
            metrics: FontMetrics {
                first_char: 32,
                last_char: 34,
                ascent: 700,
                descent: -200,
                cap_height: 660,
                x_height: 450,
                internal_leading: 100,
                external_leading: 0,
                font_bbox: [-100, -200, 1000, 900],
                widths: vec![250, 333, 408],
                em_square: 1000.0,
                italic_angle: 0.0,
                stem_v: 80.0,
            },
            file: FontFile::Pfb(self.pfb.clone()),
        })
    }

    fn char_outlines(&mut self, font: &FontData, codes: &[u8]) -> Option<Vec<OutlineSegment>> {
        if font.base_font != "Test-Regular" {
            return None;
        }
        let mut segments = Vec::new();
        for _ in codes {
            segments.push(OutlineSegment::MoveTo { x: 0.0, y: 0.0 });
            segments.push(OutlineSegment::LineTo { x: 250.0, y: 0.0 });
            segments.push(OutlineSegment::LineTo { x: 250.0, y: 700.0 });
            segments.push(OutlineSegment::Close);
        }
        Some(segments)
    }
}

#[test]
fn type1_font_is_embedded_from_its_pfb_segments() {
    let ascii = b"%!PS-AdobeFont-1.0: Test-Regular\ncurrentfile eexec\n".to_vec();
    let binary: Vec<u8> = (0..64u8).collect();
    let fonts = StubFonts {
        builtin: BuiltinFonts,
        pfb: make_pfb(&ascii, &binary),
    };
    let mut doc =
        PdfDocument::with_writer(Vec::new(), Box::new(fonts), Box::new(NoImages)).unwrap();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.select_font("Test-Regular", 10.0).unwrap();
        page.show_at(Pt(10.0), Pt(10.0), "!!").unwrap();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let text = as_text(&bytes);

    assert!(text.contains("/Subtype /Type1\n/BaseFont /Test-Regular\n"));
    assert!(text.contains("/FirstChar 32\n"));
    assert!(text.contains("/LastChar 34\n"));
    assert!(text.contains("/Widths [\n250 333 408 ]\n"));
    assert!(text.contains("/FontDescriptor"));
    assert!(text.contains("/Flags 4\n"));
    assert!(text.contains("/FontBBox [-100 -200 1000 900]\n"));
    assert!(text.contains(&format!(
        "/Length1 {} /Length2 {} /Length3 0",
        ascii.len(),
        binary.len()
    )));
    assert!(text.contains("/FontFile "));

    // the embedded program is the two segments, concatenated
    let streams = extract_streams(&bytes);
    let mut expected = ascii.clone();
    expected.extend_from_slice(&binary);
    assert!(streams.iter().any(|s| *s == expected));
}

#[test]
fn char_path_builds_outlines_and_advances() {
    let fonts = StubFonts {
        builtin: BuiltinFonts,
        pfb: make_pfb(b"%!\n", &[0u8; 4]),
    };
    let mut doc =
        PdfDocument::with_writer(Vec::new(), Box::new(fonts), Box::new(NoImages)).unwrap();
    let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
    page.select_font("Test-Regular", 20.0).unwrap();
    page.move_to(Pt(100.0), Pt(100.0));
    page.char_path("!").unwrap();

    // '!' is width 333 → advance 333/1000 × 20
    let cp = page.current_point().unwrap();
    assert!((cp.x.0 - 106.66).abs() < 0.01);
    assert!((cp.y.0 - 100.0).abs() < 1e-3);
}

#[test]
fn char_path_without_outline_support_is_unsupported() {
    let mut doc = build_doc();
    let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
    page.move_to(Pt(10.0), Pt(10.0));
    assert!(matches!(
        page.char_path("abc"),
        Err(Error::UnsupportedFontType)
    ));
}

// ---------------------------------------------------------------------
// images
// ---------------------------------------------------------------------

struct StubImages;

impl ImageSource for StubImages {
    fn load_image(&mut self, key: &str) -> Option<RasterImage> {
        if key != "pic" {
            return None;
        }
        let pixels = vec![
            255, 0, 0, 0, 255, 0, //
            0, 0, 255, 255, 255, 255,
        ];
        Some(RasterImage::rgb8(2, 2, pixels))
    }
}

#[test]
fn images_are_streamed_once_and_reused() {
    let mut doc =
        PdfDocument::with_writer(Vec::new(), Box::new(BuiltinFonts), Box::new(StubImages))
            .unwrap();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.image("pic", Pt(10.0), Pt(10.0), Pt(200.0), Pt(100.0))
            .unwrap();
        page.image("pic", Pt(300.0), Pt(10.0), Pt(100.0), Pt(50.0))
            .unwrap();
        page.show_page().unwrap();
    }
    let bytes = doc.finish().unwrap();
    let text = as_text(&bytes);

    // one XObject, two placements
    assert_eq!(text.matches("/Subtype /Image\n").count(), 1);
    assert!(text.contains("/Width 2\n/Height 2\n"));
    assert!(text.contains("/ColorSpace /DeviceRGB\n/BitsPerComponent 8\n"));
    assert!(text.contains("/XObject <<\n\t\t/Im4 4 0 R\n"));

    let content = as_text(&extract_streams(&bytes).pop().unwrap());
    assert_eq!(content.matches("/Im4 Do\n").count(), 2);
    assert!(content.contains("200.00 0.00 0.00 100.00 10.00 10.00 cm\n"));
}

#[test]
fn unresolvable_image_keys_fail_cleanly() {
    let mut doc =
        PdfDocument::with_writer(Vec::new(), Box::new(BuiltinFonts), Box::new(StubImages))
            .unwrap();
    let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
    assert!(matches!(
        page.image("nope", Pt(0.0), Pt(0.0), Pt(10.0), Pt(10.0)),
        Err(Error::FileOpenFailed)
    ));
}

// ---------------------------------------------------------------------
// state round trips
// ---------------------------------------------------------------------

#[test]
fn gsave_grestore_restores_the_fill_color() {
    let mut doc = build_doc();
    let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
    page.set_fill_rgb(0.25, 0.5, 0.75);
    page.gsave();
    page.set_fill_rgb(1.0, 1.0, 0.0);
    page.grestore();
    let rgb = page.current_fill_rgb();
    assert!((rgb.r - 0.25).abs() < 1e-6);
    assert!((rgb.g - 0.5).abs() < 1e-6);
    assert!((rgb.b - 0.75).abs() < 1e-6);
}

#[test]
fn transform_round_trip_at_the_page_level() {
    let mut doc = build_doc();
    let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
    page.translate(Pt(120.0), Pt(40.0));
    page.rotate(30.0);
    page.scale(2.0, 0.5);

    let p = Point::new(Pt(17.0), Pt(-4.0));
    let q = page.itransform_point(page.transform_point(p));
    assert!((q.x.0 - p.x.0).abs() < 1e-3);
    assert!((q.y.0 - p.y.0).abs() < 1e-3);
}

#[test]
fn implicit_show_page_on_drop() {
    let mut doc = build_doc();
    {
        let mut page = PdfPage::new(&mut doc, Pt(612.0), Pt(792.0), 0).unwrap();
        page.move_to(Pt(0.0), Pt(0.0));
        page.line_to(Pt(10.0), Pt(0.0));
        page.stroke();
        // no explicit show_page
    }
    assert_eq!(doc.page_count(), 1);
    let text = as_text(&doc.finish().unwrap());
    assert!(text.contains("/Count 1\n"));
}
