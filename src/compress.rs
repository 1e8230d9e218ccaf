//! Content-stream compression: deflate with expansion fallback.

use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

/// Streams are always compressed at the highest level; PDF writing is
/// not latency sensitive.
pub(crate) const STREAM_COMPRESSION: u32 = 9;

/// Deflate `data`. Returns `None` when compression would grow the
/// input (tiny streams mostly), in which case the caller writes the
/// raw bytes and omits `/Filter`.
pub(crate) fn compress(data: &[u8], level: u32) -> Option<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(
        Vec::with_capacity(data.len()),
        Compression::new(level.min(9)),
    );
    encoder.write_all(data).ok()?;
    let compressed = encoder.finish().ok()?;
    if compressed.len() > data.len() {
        None
    } else {
        Some(compressed)
    }
}
