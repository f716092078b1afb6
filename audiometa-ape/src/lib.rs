//! Monkey's Audio: the stream header in [`header`], wired to the shared APEv2 tag engine.

pub mod header;

use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::Result;
use audiometa_metadata::ape_tags::read_apev2;

pub use header::read_ape_header;

/// Reads a full Monkey's Audio file: stream parameters, then a trailing APEv2 tag if present.
pub fn read_ape<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Ape;
    read_ape_header(src, record)?;
    read_apev2(src, record)?;
    src.seek(0, Whence::Start)?;
    Ok(())
}
