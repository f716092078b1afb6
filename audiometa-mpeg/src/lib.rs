//! MPEG-1/2/2.5 layer I/II/III frame engine: header decoding, Xing/Info/VBRI parsing, the
//! twin-header synchronisation search, and the top-level file reader.

pub mod demuxer;
pub mod header;
pub mod sync;
pub mod xing;

pub use demuxer::read_mpeg;
