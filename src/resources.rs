//! Per-page `/Resources` dictionary.

use std::collections::BTreeSet;
use std::io::{self, Write};

/// Object numbers of the fonts and image XObjects a page references.
/// The object number doubles as the local resource name (`/F7`, `/Im9`),
/// so no separate name table is needed. The set empties itself after
/// each write; every reference re-adds its number so later pages stay
/// complete.
#[derive(Debug, Default)]
pub(crate) struct PageResources {
    fonts: BTreeSet<u32>,
    images: BTreeSet<u32>,
}

impl PageResources {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.fonts.clear();
        self.images.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.fonts.is_empty() && self.images.is_empty()
    }

    pub fn add_font(&mut self, number: u32) {
        self.fonts.insert(number);
    }

    pub fn add_image(&mut self, number: u32) {
        self.images.insert(number);
    }

    pub fn write<W: Write>(&mut self, out: &mut W) -> io::Result<()> {
        out.write_all(b"\n\t<<\n")?;

        if !self.fonts.is_empty() {
            out.write_all(b"\t/Font <<\n")?;
            for number in &self.fonts {
                write!(out, "\t\t/F{number} {number} 0 R\n")?;
            }
            out.write_all(b"\t\t>>\n")?;
        }
        if !self.images.is_empty() {
            out.write_all(b"\t/XObject <<\n")?;
            for number in &self.images {
                write!(out, "\t\t/Im{number} {number} 0 R\n")?;
            }
            out.write_all(b"\t\t>>\n")?;
        }
        out.write_all(b"\t>>\n")?;

        self.clear();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn write_emits_both_dictionaries_and_clears() {
        let mut res = PageResources::new();
        res.add_font(3);
        res.add_font(3);
        res.add_image(7);

        let mut out = Vec::new();
        res.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("/Font <<\n\t\t/F3 3 0 R\n"));
        assert!(text.contains("/XObject <<\n\t\t/Im7 7 0 R\n"));
        assert!(res.is_empty());
    }

    #[test]
    fn numbers_come_out_sorted() {
        let mut res = PageResources::new();
        res.add_font(9);
        res.add_font(4);
        let mut out = Vec::new();
        res.write(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.find("/F4").unwrap() < text.find("/F9").unwrap());
    }
}
