//! Raster images: the decoder collaborator boundary and XObject emission.
//!
//! The crate does not decode image formats. An [`ImageSource`] resolves
//! a caller-chosen key (a path, a cache id, anything) to decoded RGB8
//! pixels; the document deflates them into an image XObject the first
//! time the key is referenced and reuses the object afterwards.

use std::collections::BTreeMap;
use std::io::Write;

use crate::compress::{compress, STREAM_COMPRESSION};
use crate::error::Error;
use crate::objects::{CountingWriter, ObjectTable};

/// Decoded raster data: RGB8, row major, no stride padding. Decoders
/// working from BGR sources convert before handing the rows over.
#[derive(Debug, Clone, PartialEq)]
pub struct RasterImage {
    pub width: u32,
    pub height: u32,
    pub bits_per_component: u16,
    pub data: Vec<u8>,
}

impl RasterImage {
    pub fn rgb8(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            bits_per_component: 8,
            data,
        }
    }
}

/// The decoder collaborator. `None` means the key could not be
/// resolved or decoded.
pub trait ImageSource {
    fn load_image(&mut self, key: &str) -> Option<RasterImage>;
}

/// Source for documents that place no images.
#[derive(Debug, Default)]
pub struct NoImages;

impl ImageSource for NoImages {
    fn load_image(&mut self, _key: &str) -> Option<RasterImage> {
        None
    }
}

/// Key → object number, plus the source behind it. Unlike fonts,
/// images are written immediately when first referenced.
pub(crate) struct ImageRegistry {
    table: BTreeMap<String, u32>,
    source: Box<dyn ImageSource>,
}

impl ImageRegistry {
    pub fn new(source: Box<dyn ImageSource>) -> Self {
        Self {
            table: BTreeMap::new(),
            source,
        }
    }

    pub fn lookup(&self, key: &str) -> Option<u32> {
        self.table.get(key).copied()
    }

    pub fn load(&mut self, key: &str) -> Option<RasterImage> {
        self.source.load_image(key)
    }

    pub fn insert(&mut self, key: &str, number: u32) {
        self.table.insert(key.to_string(), number);
    }
}

/// Emit one image XObject. `/Filter` only appears when the deflate
/// pass actually shrank the pixels.
pub(crate) fn write_image_object<W: Write>(
    image: &RasterImage,
    number: u32,
    out: &mut CountingWriter<W>,
    objects: &mut ObjectTable,
) -> Result<(), Error> {
    objects.begin_object(number, out)?;
    write!(
        out,
        "<</Type /XObject\n/Subtype /Image\n/Width {}\n/Height {}\n",
        image.width, image.height
    )?;
    write!(
        out,
        "/ColorSpace /DeviceRGB\n/BitsPerComponent {}\n",
        image.bits_per_component
    )?;

    match compress(&image.data, STREAM_COMPRESSION) {
        Some(packed) => {
            write!(out, "/Filter /FlateDecode\n/Length {}\n>>\nstream\n", packed.len())?;
            out.write_all(&packed)?;
        }
        None => {
            write!(out, "/Length {}\n>>\nstream\n", image.data.len())?;
            out.write_all(&image.data)?;
        }
    }

    out.write_all(b"\nendstream\nendobj\n")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;

    fn find_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .position(|window| window == needle)
    }

    fn rfind_bytes(haystack: &[u8], needle: &[u8]) -> Option<usize> {
        haystack
            .windows(needle.len())
            .rposition(|window| window == needle)
    }

    #[test]
    fn image_object_round_trips_through_deflate() {
        let pixels: Vec<u8> = (0..((8 * 8 * 3) as u8)).map(|i| i / 3).collect();
        let image = RasterImage::rgb8(8, 8, pixels.clone());

        let mut objects = ObjectTable::new();
        let number = objects.next_object();
        let mut out = CountingWriter::new(Vec::new());
        write_image_object(&image, number, &mut out, &mut objects).unwrap();

        let bytes = out.into_inner();
        let text = String::from_utf8_lossy(&bytes);
        assert!(text.contains("/Subtype /Image"));
        assert!(text.contains("/Width 8"));
        assert!(text.contains("/Filter /FlateDecode"));

        let start = find_bytes(&bytes, b"stream\n").unwrap() + b"stream\n".len();
        let end = rfind_bytes(&bytes, b"\nendstream").unwrap();
        let mut unpacked = Vec::new();
        flate2::read::ZlibDecoder::new(&bytes[start..end])
            .read_to_end(&mut unpacked)
            .unwrap();
        assert_eq!(unpacked, pixels);
    }

    #[test]
    fn incompressible_image_is_stored_raw() {
        // 1×1 pixel: deflate overhead exceeds the 3 payload bytes
        let image = RasterImage::rgb8(1, 1, vec![1, 2, 3]);
        let mut objects = ObjectTable::new();
        let number = objects.next_object();
        let mut out = CountingWriter::new(Vec::new());
        write_image_object(&image, number, &mut out, &mut objects).unwrap();
        let text = String::from_utf8_lossy(&out.into_inner()).to_string();
        assert!(!text.contains("/Filter"));
        assert!(text.contains("/Length 3\n"));
    }
}
