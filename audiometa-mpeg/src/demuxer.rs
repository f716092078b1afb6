//! Top-level MPEG file reader: ID3v2 (leading) + ID3v1 (trailing) tags, the first valid frame
//! pair, and Xing/Info/VBRI-derived stream parameters.

use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::{invalid_stream_parameters_error, Result};
use audiometa_metadata::id3v1::read_id3v1;
use audiometa_metadata::id3v2::read_id3v2;

use crate::header::{decode, frame_samples, vbr_header_offset};
use crate::sync::{find_first_frame, MAX_OFFSET};
use crate::xing;

/// Reads stream parameters and tags for an MPEG (MP2/MP3) file.
pub fn read_mpeg<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Mpeg;

    let filesize = src.size()?;
    if filesize < 8 {
        return invalid_stream_parameters_error("mpeg: file too small");
    }
    record.filesize = filesize;

    // ID3v1 trailer first, so its length is known before estimating CBR file time.
    read_id3v1(src, record)?;

    src.seek(0, Whence::Start)?;
    let id3v2_len = read_id3v2(src, record)?;
    let after_tag = id3v2_len as u64;

    let scan_len = MAX_OFFSET.min((filesize.saturating_sub(after_tag)) as usize) + 4;
    let mut buf = vec![0u8; scan_len];
    src.seek(after_tag as i64, Whence::Start)?;
    let n = src.read_fully(&mut buf)?;
    buf.truncate(n);

    let Some((offset, header_bits)) = find_first_frame(&buf) else {
        return invalid_stream_parameters_error("mpeg: no valid frame sync found");
    };

    let header = decode(header_bits).expect("find_first_frame only returns decodable headers");
    record.first_frame_offset = after_tag + offset as u64;
    record.frequency = header.frequency;
    record.channels = header.channels;
    record.layer = match header.layer {
        crate::header::Layer::L1 => 1,
        crate::header::Layer::L2 => 2,
        crate::header::Layer::L3 => 3,
    };

    let vbr_probe_offset = offset + vbr_header_offset(&header);
    let vbr = if vbr_probe_offset + 4 <= buf.len() {
        xing::parse(&buf[vbr_probe_offset..])
    } else {
        None
    };

    let samples_per_frame = frame_samples(&header) as u64;

    let (bitrate, length_ms, frame_count, vbr_flag, has_toc, toc) = match vbr {
        Some(info) if info.frames.is_some() && info.bytes.is_some() => {
            let frames = info.frames.unwrap() as u64;
            let bytes = info.bytes.unwrap() as u64;
            let file_time_ms = frames * samples_per_frame * 1000 / header.frequency.max(1) as u64;
            let bitrate = if file_time_ms > 0 { (bytes * 8 / file_time_ms) as u32 } else { 0 };
            (bitrate, file_time_ms, frames as u32, info.is_vbr, info.has_toc, info.toc)
        }
        _ => {
            // No (usable) VBR header: estimate from file size.
            let estimated_bytes = filesize
                .saturating_sub(record.id3v1_len as u64)
                .saturating_sub(record.first_frame_offset);
            let bitrate = header.bitrate;
            let file_time_ms = if bitrate > 0 { estimated_bytes * 8 / bitrate as u64 } else { 0 };
            let frames = if samples_per_frame > 0 && header.frequency > 0 {
                (file_time_ms * header.frequency as u64 / samples_per_frame / 1000) as u32
            } else {
                0
            };
            (bitrate, file_time_ms, frames, false, false, None)
        }
    };

    if let Some(info) = vbr {
        if record.lead_trim == 0 {
            if let Some(delay) = info.enc_delay {
                record.lead_trim = delay as u64;
            }
        }
        if record.tail_trim == 0 {
            if let Some(padding) = info.enc_padding {
                record.tail_trim = padding as u64;
            }
        }
    }

    record.bitrate = bitrate;
    record.length = length_ms;
    record.frame_count = frame_count;
    record.vbr = vbr_flag;
    record.has_toc = has_toc;
    record.toc = toc;

    if record.length == 0 {
        return invalid_stream_parameters_error("mpeg: computed length is zero");
    }

    src.seek(0, Whence::Start)?;
    Ok(())
}
