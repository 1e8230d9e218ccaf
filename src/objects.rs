//! Low-level PDF file structure: indirect objects, the cross-reference
//! table and the trailer.
//!
//! Object numbers are 1-based and assigned sequentially; object 1 is
//! reserved for the page tree and object 2 for the catalog, which is
//! why the trailer can hardcode `/Root 2 0 R`. An object's byte offset
//! is captured at the moment its `N 0 obj` header goes through the
//! counting writer.

use std::io::{self, Write};

pub(crate) const PAGE_TREE_NUMBER: u32 = 1;
pub(crate) const CATALOG_NUMBER: u32 = 2;

/// Wraps the output sink and tracks bytes written, so object offsets
/// never depend on the sink being seekable.
pub(crate) struct CountingWriter<W: Write> {
    inner: W,
    bytes_written: u64,
}

impl<W: Write> CountingWriter<W> {
    pub fn new(inner: W) -> Self {
        Self {
            inner,
            bytes_written: 0,
        }
    }

    /// Bytes from the start of the file.
    pub fn position(&self) -> u64 {
        self.bytes_written
    }

    pub fn into_inner(self) -> W {
        self.inner
    }
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buffer: &[u8]) -> io::Result<usize> {
        let result = self.inner.write(buffer);
        if let Ok(bytes) = result {
            self.bytes_written += bytes as u64;
        }
        result
    }

    fn write_all(&mut self, buffer: &[u8]) -> io::Result<()> {
        // on error the count is off, but the whole file is abandoned then anyway
        self.bytes_written += buffer.len() as u64;
        self.inner.write_all(buffer)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Object numbers, offsets and the page list.
pub(crate) struct ObjectTable {
    /// Index = object number - 1. Offset 0 means the number was
    /// assigned but the object body was never written; the xref lists
    /// such slots as free.
    offsets: Vec<u64>,
    pages: Vec<u32>,
}

impl ObjectTable {
    pub fn new() -> Self {
        let mut table = Self {
            offsets: Vec::with_capacity(32),
            pages: Vec::with_capacity(32),
        };
        // page tree and catalog are allocated up front
        let _ = table.next_object();
        let _ = table.next_object();
        table
    }

    pub fn next_object(&mut self) -> u32 {
        self.offsets.push(0);
        self.offsets.len() as u32
    }

    pub fn new_page_object(&mut self) -> u32 {
        let number = self.next_object();
        self.pages.push(number);
        number
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Record the object's offset and write its `N 0 obj` header.
    pub fn begin_object<W: Write>(
        &mut self,
        number: u32,
        out: &mut CountingWriter<W>,
    ) -> io::Result<()> {
        self.offsets[(number - 1) as usize] = out.position();
        write!(out, "{number} 0 obj\n")
    }

    fn write_page_tree<W: Write>(&mut self, out: &mut CountingWriter<W>) -> io::Result<()> {
        self.begin_object(PAGE_TREE_NUMBER, out)?;
        write!(out, "<</Type /Pages\n/Count {}\n/Kids [\n", self.pages.len())?;
        for page in &self.pages {
            write!(out, "\t{page} 0 R\n")?;
        }
        out.write_all(b"\t]\n>>\nendobj\n")
    }

    fn write_catalog<W: Write>(&mut self, out: &mut CountingWriter<W>) -> io::Result<()> {
        self.begin_object(CATALOG_NUMBER, out)?;
        write!(
            out,
            "<</Type /Catalog\n/Pages {PAGE_TREE_NUMBER} 0 R\n>>\nendobj\n"
        )
    }

    fn write_xref<W: Write>(&self, out: &mut CountingWriter<W>) -> io::Result<()> {
        let xref = out.position();
        let object_count = self.offsets.len() + 1;
        let mut generation = object_count;

        write!(out, "xref\n0 {object_count}\n")?;
        out.write_all(b"0000000000 65535 f\r\n")?;

        for offset in &self.offsets {
            if *offset != 0 {
                write!(out, "{offset:010} 00000 n\r\n")?;
            } else {
                generation += 1;
                write!(out, "{offset:010} {generation:05} f\r\n")?;
            }
        }

        write!(
            out,
            "trailer\n<</Size {object_count}\n/Root {CATALOG_NUMBER} 0 R\n>>\n"
        )?;
        write!(out, "startxref\n{xref}\n%%EOF")
    }

    /// Page tree, catalog, xref, trailer — the document's closing bytes.
    pub fn write_ender<W: Write>(&mut self, out: &mut CountingWriter<W>) -> io::Result<()> {
        self.write_page_tree(out)?;
        self.write_catalog(out)?;
        self.write_xref(out)
    }
}
