//! The document: output sink, object table, font and image registries.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path as FsPath;

use log::{debug, warn};

use crate::compress::{compress, STREAM_COMPRESSION};
use crate::error::Error;
use crate::font::{BuiltinFonts, FontFile, FontRecord, FontRegistry, FontSource, OutlineSegment};
use crate::image::{write_image_object, ImageRegistry, ImageSource, NoImages};
use crate::objects::{CountingWriter, ObjectTable, PAGE_TREE_NUMBER};
use crate::resources::PageResources;

/// A PDF 1.4 document under construction.
///
/// The document owns the output sink exclusively; pages write through
/// its helpers. Content is streamed: every `show_page` appends the
/// page's objects to the sink immediately, and `close` finishes the
/// file with the in-use fonts, the page tree, the catalog and the
/// cross-reference table. Call [`close`](Self::close) (or
/// [`finish`](Self::finish)) when done — a document dropped without it
/// is missing its trailer.
pub struct PdfDocument<W: Write> {
    out: CountingWriter<W>,
    objects: ObjectTable,
    resources: PageResources,
    fonts: FontRegistry,
    images: ImageRegistry,
    closed: bool,
}

impl PdfDocument<BufWriter<File>> {
    /// Create a document writing to `path`, with the builtin base-14
    /// metrics and no image source.
    pub fn create<P: AsRef<FsPath>>(path: P) -> Result<Self, Error> {
        Self::create_with_sources(path, Box::new(BuiltinFonts), Box::new(NoImages))
    }

    pub fn create_with_sources<P: AsRef<FsPath>>(
        path: P,
        fonts: Box<dyn FontSource>,
        images: Box<dyn ImageSource>,
    ) -> Result<Self, Error> {
        let path = path.as_ref();
        if path.as_os_str().is_empty() {
            return Err(Error::MissingFilename);
        }
        let file = File::create(path).map_err(|_| Error::FileCreateError)?;
        Self::with_writer(BufWriter::new(file), fonts, images)
    }
}

impl<W: Write> PdfDocument<W> {
    /// Create a document writing to an arbitrary sink (a `Vec<u8>`, a
    /// socket, ...). Writes the PDF header immediately; the 4-byte
    /// high-bit comment marks the file as binary.
    pub fn with_writer(
        writer: W,
        fonts: Box<dyn FontSource>,
        images: Box<dyn ImageSource>,
    ) -> Result<Self, Error> {
        let mut out = CountingWriter::new(writer);
        out.write_all(b"%PDF-1.4\n%\x84\x85\x86\x87\n")?;
        Ok(Self {
            out,
            objects: ObjectTable::new(),
            resources: PageResources::new(),
            fonts: FontRegistry::new(fonts),
            images: ImageRegistry::new(images),
            closed: false,
        })
    }

    pub fn page_count(&self) -> usize {
        self.objects.page_count()
    }

    fn write_content_stream(&mut self, content: &[u8]) -> Result<u32, Error> {
        let number = self.objects.next_object();
        self.objects.begin_object(number, &mut self.out)?;

        match compress(content, STREAM_COMPRESSION) {
            Some(packed) => {
                write!(
                    self.out,
                    "<</Length {}/Filter /FlateDecode>>\nstream\n",
                    packed.len()
                )?;
                self.out.write_all(&packed)?;
            }
            None => {
                debug!("{}-byte content stream stored uncompressed", content.len());
                write!(self.out, "<</Length {}>>\nstream\n", content.len())?;
                self.out.write_all(content)?;
            }
        }

        self.out.write_all(b"\nendstream\nendobj\n")?;
        Ok(number)
    }

    fn write_page_info(
        &mut self,
        content_number: u32,
        width: f32,
        height: f32,
        rotation: i32,
    ) -> Result<(), Error> {
        let number = self.objects.new_page_object();
        self.objects.begin_object(number, &mut self.out)?;

        write!(self.out, "<<\n/Type /Page\n/Parent {PAGE_TREE_NUMBER} 0 R\n")?;
        write!(
            self.out,
            "/MediaBox [0 0 {width:.2} {height:.2}]\n/Contents [{content_number} 0 R]\n"
        )?;
        if rotation != 0 {
            write!(self.out, "/Rotate {rotation}\n")?;
        }

        self.out.write_all(b"/Resources ")?;
        if self.resources.is_empty() {
            self.out.write_all(b"<<>>\n")?;
        } else {
            self.resources.write(&mut self.out)?;
        }

        self.out.write_all(b">>\nendobj\n")?;
        Ok(())
    }

    /// Write one finished page: the content stream object, then the
    /// page object referencing it and the accumulated resources.
    pub(crate) fn write_page(
        &mut self,
        content: &[u8],
        width: f32,
        height: f32,
        rotation: i32,
    ) -> Result<(), Error> {
        let content_number = self.write_content_stream(content)?;
        self.write_page_info(content_number, width, height, rotation)
    }

    /// Find or load a font, materialize its object numbers, and add it
    /// to the current page's resources. Returns the object number and
    /// the canonical base-font name (which may differ from `name` when
    /// the source substituted the default face).
    pub(crate) fn find_font(&mut self, name: &str) -> Result<(u32, String), Error> {
        let record = self.fonts.find(name).ok_or(Error::MissingFont)?;
        if record.number == 0 {
            record.number = self.objects.next_object();
            if !record.data.is_base_font {
                record.descriptor_number = self.objects.next_object();
                if !matches!(record.data.file, FontFile::None) {
                    record.file_number = self.objects.next_object();
                }
            }
        }
        let number = record.number;
        let base_font = record.data.base_font.clone();
        self.resources.add_font(number);
        Ok((number, base_font))
    }

    /// Metrics access for an already-bound font.
    pub(crate) fn font_record(&self, name: &str) -> Option<&FontRecord> {
        self.fonts.get(name)
    }

    /// Flag a bound font as producing marks and re-add it to the page
    /// resources, returning its object number.
    pub(crate) fn mark_font_in_use(&mut self, name: &str) -> Option<u32> {
        let record = self.fonts.get_mut(name)?;
        record.in_use = true;
        let number = record.number;
        self.resources.add_font(number);
        Some(number)
    }

    pub(crate) fn char_outlines(&mut self, name: &str, codes: &[u8]) -> Option<Vec<OutlineSegment>> {
        self.fonts.char_outlines(name, codes)
    }

    /// Find or load an image. First references decode and stream the
    /// XObject immediately; later ones reuse the object number.
    pub(crate) fn find_image(&mut self, key: &str) -> Result<u32, Error> {
        if let Some(number) = self.images.lookup(key) {
            self.resources.add_image(number);
            return Ok(number);
        }

        let image = match self.images.load(key) {
            Some(image) => image,
            None => {
                warn!("image {key:?} could not be decoded");
                return Err(Error::FileOpenFailed);
            }
        };

        let number = self.objects.next_object();
        write_image_object(&image, number, &mut self.out, &mut self.objects)?;
        self.images.insert(key, number);
        self.resources.add_image(number);
        Ok(number)
    }

    /// Write the in-use fonts, the page tree, the catalog and the
    /// xref/trailer, then flush the sink. Idempotent.
    pub fn close(&mut self) -> Result<(), Error> {
        if self.closed {
            return Ok(());
        }
        debug!("closing document with {} page(s)", self.objects.page_count());
        self.fonts.write_fonts(&mut self.out, &mut self.objects)?;
        self.objects.write_ender(&mut self.out)?;
        self.out.flush()?;
        self.closed = true;
        Ok(())
    }

    /// Close the document and hand back the sink.
    pub fn finish(mut self) -> Result<W, Error> {
        self.close()?;
        Ok(self.out.into_inner())
    }
}
