//! Runtime parse knobs. Cargo features (§10.1) select which format families are compiled in;
//! `ParseOptions` carries the one knob left over once a feature is enabled, mirroring the
//! small per-format `...Options` structs the teacher threads into its format readers.

/// Options threaded through [`crate::io::ByteSource`]-driven parsing.
#[derive(Debug, Clone, Copy)]
pub struct ParseOptions {
    /// Whether formats with no native ID3v1 convention of their own (TTA, Shorten) should still
    /// scan for a trailing ID3v1 tag. Formats that declare ID3v1 as part of their own format
    /// (MPEG) always scan it regardless of this flag.
    pub scan_trailing_id3v1: bool,
}

impl Default for ParseOptions {
    fn default() -> Self {
        ParseOptions { scan_trailing_id3v1: true }
    }
}
