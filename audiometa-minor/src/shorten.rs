//! Shorten (`.shn`): this library only reads ID3 tags for Shorten files; the compression scheme
//! itself is opaque here, so every file is reported as VBR with no further stream analysis.

use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::{ParseOptions, Result};
use audiometa_metadata::id3v1::read_id3v1;
use audiometa_metadata::id3v2::read_id3v2;

/// Reads a Shorten file's ID3 tags only.
pub fn read_shorten<S: ByteSource + ?Sized>(
    src: &mut S,
    record: &mut MetadataRecord,
    options: &ParseOptions,
) -> Result<()> {
    record.codec = Codec::Shorten;
    record.filesize = src.size()?;
    record.vbr = true;

    if options.scan_trailing_id3v1 {
        read_id3v1(src, record)?;
    }

    src.seek(0, Whence::Start)?;
    let id3v2_len = read_id3v2(src, record)?;
    record.first_frame_offset = id3v2_len as u64;

    src.seek(0, Whence::Start)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    #[test]
    fn reads_leading_id3v2_tag() {
        let mut tag = Vec::new();
        tag.extend_from_slice(b"ID3");
        tag.push(3); // version
        tag.push(0); // revision
        tag.push(0); // flags
        let frame_body = b"Shorten Song";
        let mut frame = Vec::new();
        frame.extend_from_slice(b"TIT2");
        frame.extend_from_slice(&((frame_body.len() + 1) as u32).to_be_bytes());
        frame.extend_from_slice(&[0, 0]);
        frame.push(0); // ISO-8859-1 encoding byte
        frame.extend_from_slice(frame_body);
        let len = frame.len() as u32;
        tag.extend_from_slice(&[
            ((len >> 21) & 0x7F) as u8,
            ((len >> 14) & 0x7F) as u8,
            ((len >> 7) & 0x7F) as u8,
            (len & 0x7F) as u8,
        ]);
        tag.extend_from_slice(&frame);

        let mut file = tag;
        file.extend_from_slice(&[0u8; 128]);

        let mut src = BufferedSource::new(Cursor::new(file), "t.shn");
        let mut record = MetadataRecord::new();
        read_shorten(&mut src, &mut record, &ParseOptions::default()).unwrap();
        assert!(record.vbr);
        assert_eq!(record.title, "Shorten Song");
    }
}
