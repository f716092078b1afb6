//! MP4/QuickTime atom walker: the recursive container traversal, the `esds` AAC-HE/SBR
//! descriptor chain, and the iTunes `ilst`/freeform tag table.

pub mod atom;
pub mod demuxer;
pub mod esds;
pub mod ilst;

pub use demuxer::read_mp4;
