//! The Monkey's Audio stream header: `"MAC "` magic, a 16-bit file version, and a
//! version-dependent layout for `blocks_per_frame`/`final_frame_blocks`/`total_frames`/
//! `sample_rate`.

use audiometa_core::endian::{read_le16, read_le32};
use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::MetadataRecord;
use audiometa_core::{invalid_magic_error, invalid_stream_parameters_error, malformed_error, unsupported_version_error, Result};

const HEADER_BUF_SIZE: usize = 240;
const FIXED_BLOCKS_PER_FRAME: u32 = 73728 * 4;

/// Reads the Monkey's Audio stream header and fills `record`'s stream-parameter fields.
/// Tag reading (APEv2) is a separate step; callers run this first.
pub fn read_ape_header<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    let filesize = src.size()?;
    record.filesize = filesize;

    src.seek(0, Whence::Start)?;
    let mut buf = [0u8; HEADER_BUF_SIZE];
    let n = src.read_fully(&mut buf)?;
    if n < 4 || &buf[0..4] != b"MAC " {
        return invalid_magic_error("ape: missing 'MAC ' magic");
    }
    if n < HEADER_BUF_SIZE {
        return malformed_error("ape: truncated header");
    }

    let file_version = read_le16(&buf[4..6]) as u32;
    if file_version < 3970 {
        return unsupported_version_error("ape: file version older than 3.97 unsupported");
    }

    let (blocks_per_frame, final_frame_blocks, total_frames, sample_rate) = if file_version >= 3980 {
        let descriptor_length = read_le32(&buf[8..12]) as usize;
        if descriptor_length + 24 > HEADER_BUF_SIZE {
            return malformed_error("ape: descriptor length out of range");
        }
        let header = &buf[descriptor_length..];
        (
            read_le32(&header[4..8]),
            read_le32(&header[8..12]),
            read_le32(&header[12..16]),
            read_le32(&header[20..24]),
        )
    } else {
        (
            FIXED_BLOCKS_PER_FRAME,
            read_le32(&buf[28..32]),
            read_le32(&buf[24..28]),
            read_le32(&buf[12..16]),
        )
    };

    if sample_rate == 0 {
        return invalid_stream_parameters_error("ape: sample rate is zero");
    }

    let total_samples = if total_frames > 1 {
        final_frame_blocks as u64 + blocks_per_frame as u64 * (total_frames as u64 - 1)
    } else {
        final_frame_blocks as u64
    };

    record.vbr = true;
    record.frequency = sample_rate;
    record.samples = total_samples;
    record.length = total_samples * 1000 / sample_rate as u64;
    if record.length > 0 {
        record.bitrate = (record.filesize * 8 / record.length) as u32;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    fn build_header_3980(blocks_per_frame: u32, final_frame_blocks: u32, total_frames: u32, sample_rate: u32) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_BUF_SIZE];
        buf[0..4].copy_from_slice(b"MAC ");
        buf[4..6].copy_from_slice(&3980u16.to_le_bytes());
        let descriptor_length = 52u32; // a plausible 3.98 descriptor size
        buf[8..12].copy_from_slice(&descriptor_length.to_le_bytes());
        let header_start = descriptor_length as usize;
        buf[header_start + 4..header_start + 8].copy_from_slice(&blocks_per_frame.to_le_bytes());
        buf[header_start + 8..header_start + 12].copy_from_slice(&final_frame_blocks.to_le_bytes());
        buf[header_start + 12..header_start + 16].copy_from_slice(&total_frames.to_le_bytes());
        buf[header_start + 20..header_start + 24].copy_from_slice(&sample_rate.to_le_bytes());
        buf
    }

    #[test]
    fn reads_3980_layout() {
        let mut header = build_header_3980(9216, 5000, 10, 44100);
        header.extend_from_slice(&[0u8; 64]); // padding so the file is longer than the header
        let mut src = BufferedSource::new(Cursor::new(header), "t.ape");
        let mut record = MetadataRecord::new();
        read_ape_header(&mut src, &mut record).unwrap();
        assert_eq!(record.frequency, 44100);
        assert!(record.vbr);
        let expected_samples = 5000u64 + 9216u64 * 9;
        assert_eq!(record.samples, expected_samples);
        assert_eq!(record.length, expected_samples * 1000 / 44100);
    }

    #[test]
    fn rejects_old_version() {
        let mut buf = vec![0u8; HEADER_BUF_SIZE];
        buf[0..4].copy_from_slice(b"MAC ");
        buf[4..6].copy_from_slice(&3960u16.to_le_bytes());
        let mut src = BufferedSource::new(Cursor::new(buf), "t.ape");
        let mut record = MetadataRecord::new();
        assert!(read_ape_header(&mut src, &mut record).is_err());
    }

    #[test]
    fn rejects_missing_magic() {
        let mut src = BufferedSource::new(Cursor::new(vec![0u8; 240]), "t.ape");
        let mut record = MetadataRecord::new();
        assert!(read_ape_header(&mut src, &mut record).is_err());
    }
}
