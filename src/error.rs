//! Errors for pspdf

use std::error::Error as IError;
use std::fmt;
use std::io::Error as IoError;

/// Error-handling crates are overkill for this surface: one enum,
/// `From` + pattern matching covers everything the API can report.
///
/// What this macro does is (simplified): `impl From<$a> for $b { $b::$variant(error) }`
macro_rules! impl_from {
    ($from:ident, $to:ident::$variant:ident) => {
        impl From<$from> for $to {
            fn from(err: $from) -> Self {
                $to::$variant(err)
            }
        }
    };
}

/// Everything that can go wrong while building a document.
///
/// Drawing operations never panic across the API boundary; a failed
/// operation is a no-op and returns one of these.
#[derive(Debug)]
pub enum Error {
    /// External: std::io::Error while writing to the output sink.
    /// The file may be truncated; no salvage is attempted.
    Io(IoError),
    /// The output file could not be created
    FileCreateError,
    /// An input resource (image key, font file) could not be opened or decoded
    FileOpenFailed,
    /// An allocation failed (kept for API completeness)
    OutOfMemory,
    /// Page width must be > 0
    InvalidWidth,
    /// Page height must be > 0
    InvalidHeight,
    /// Page rotation must be a non-negative multiple of 90
    InvalidRotation,
    /// An empty filename was passed to `PdfDocument::create`
    MissingFilename,
    /// A parameter was outside the operation's domain
    InvalidParameter,
    /// The font registry has no record for the requested name
    MissingFont,
    /// The font source could not supply the requested font
    InvalidFont,
    /// The font record's data does not match its declared subtype
    InvalidFontType,
    /// The operation is not available for this font's subtype
    UnsupportedFontType,
    /// A relative path operation was issued without a current point
    NoCurrentPoint,
    /// A numeric argument was out of range
    RangeCheck,
}

impl_from!(IoError, Error::Io);

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        use self::Error::*;
        match self {
            Io(e) => write!(f, "{e}"),
            FileCreateError => write!(f, "Could not create the output file"),
            FileOpenFailed => write!(f, "Could not open or decode an input resource"),
            OutOfMemory => write!(f, "Out of memory"),
            InvalidWidth => write!(f, "Page width must be greater than zero"),
            InvalidHeight => write!(f, "Page height must be greater than zero"),
            InvalidRotation => write!(f, "Page rotation must be a non-negative multiple of 90"),
            MissingFilename => write!(f, "No output filename given"),
            InvalidParameter => write!(f, "Invalid parameter"),
            MissingFont => write!(f, "Font not found"),
            InvalidFont => write!(f, "Invalid or unknown font"),
            InvalidFontType => write!(f, "Font data does not match its declared subtype"),
            UnsupportedFontType => write!(f, "Operation not supported for this font type"),
            NoCurrentPoint => write!(f, "No current point"),
            RangeCheck => write!(f, "Numeric argument out of range"),
        }
    }
}

impl IError for Error {}
