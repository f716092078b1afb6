//! True Audio (`.tta`): leading ID3v2/trailing ID3v1 tags around a 22-byte stream header,
//! with a bitrate recomputed from the compressed/uncompressed size ratio since TTA's own header
//! carries no bitrate field.

use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::{invalid_stream_parameters_error, ParseOptions, Result};
use audiometa_metadata::id3v1::read_id3v1;
use audiometa_metadata::id3v2::read_id3v2;

const HEADER_SIZE: usize = 22;

/// Reads a TTA file's ID3 tags, then its stream header.
pub fn read_tta<S: ByteSource + ?Sized>(
    src: &mut S,
    record: &mut MetadataRecord,
    options: &ParseOptions,
) -> Result<()> {
    record.codec = Codec::Tta;
    let filesize = src.size()?;
    record.filesize = filesize;
    record.vbr = false;

    // Trailing ID3v1 first, so its length is known before computing the compressed-data size.
    if options.scan_trailing_id3v1 {
        read_id3v1(src, record)?;
    }

    src.seek(0, Whence::Start)?;
    let id3v2_len = read_id3v2(src, record)?;
    record.first_frame_offset = id3v2_len as u64;

    src.seek(id3v2_len as i64, Whence::Start)?;
    let mut buf = [0u8; HEADER_SIZE];
    let n = src.read_fully(&mut buf)?;
    if n < HEADER_SIZE || &buf[0..4] != b"TTA1" {
        return invalid_stream_parameters_error("tta: missing TTA1 header");
    }

    let channels = u16::from_le_bytes([buf[4], buf[5]]) as u32;
    let bits_per_sample = u16::from_le_bytes([buf[6], buf[7]]) as u64;
    let sample_rate = u32::from_le_bytes([buf[8], buf[9], buf[10], buf[11]]);
    let data_length = u32::from_le_bytes([buf[12], buf[13], buf[14], buf[15]]) as u64;
    // CRC32 at buf[18..22] is intentionally not verified.

    if sample_rate == 0 {
        return invalid_stream_parameters_error("tta: sample rate is zero");
    }

    record.channels = channels;
    record.frequency = sample_rate;
    record.samples = data_length;
    record.length = data_length * 1000 / sample_rate as u64;

    let compressed_size = filesize.saturating_sub(record.first_frame_offset);
    let uncompressed_size =
        data_length * ((bits_per_sample + 7) / 8) * channels as u64;
    if uncompressed_size > 0 && record.length > 0 {
        record.bitrate =
            (compressed_size * sample_rate as u64 * channels as u64 * bits_per_sample
                / (uncompressed_size * 1000)) as u32;
    }

    src.seek(0, Whence::Start)?;
    Ok(())
}
