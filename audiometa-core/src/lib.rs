//! Core primitives shared by every audiometa format parser: the byte-source contract, endian and
//! varint helpers, the text decoder, fixed-point math and ReplayGain conversion, and the uniform
//! [`MetadataRecord`] every parser fills in.

pub mod endian;
pub mod errors;
pub mod fixedpoint;
pub mod io;
pub mod options;
pub mod record;
pub mod replaygain;
pub mod text;

pub use errors::{
    invalid_magic_error, invalid_stream_parameters_error, io_error, malformed_error,
    short_read_error, unknown_codec_error, unsupported_encryption_error,
    unsupported_version_error, Error, ErrorKind, Result,
};
pub use io::{ByteSource, BufferedSource, Whence};
pub use options::ParseOptions;
pub use record::{AlbumArt, AlbumArtType, Codec, CueSheet, CueSheetEncoding, Id3Version, MetadataRecord};
