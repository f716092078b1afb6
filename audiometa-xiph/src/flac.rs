//! The FLAC container: `"fLaC"` magic followed by a sequence of metadata blocks. Only
//! `STREAMINFO`, `VORBIS_COMMENT`, and `PICTURE` carry information this library surfaces; every
//! other block type is skipped by its declared length.

use audiometa_core::endian::{read_be32, read_be64};
use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{AlbumArtType, MetadataRecord};
use audiometa_core::{invalid_magic_error, invalid_stream_parameters_error, malformed_error, Result};
use audiometa_metadata::vorbis::read_vorbis_comments;

const BLOCK_STREAMINFO: u8 = 0;
const BLOCK_VORBIS_COMMENT: u8 = 4;
const BLOCK_PICTURE: u8 = 6;

/// Reads a FLAC file's stream parameters and tags.
pub fn read_flac<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    let filesize = src.size()?;
    record.filesize = filesize;

    let mut magic = [0u8; 4];
    src.read_fully(&mut magic)?;
    if &magic != b"fLaC" {
        return invalid_magic_error("flac: missing fLaC magic");
    }

    loop {
        let mut header = [0u8; 4];
        let n = src.read_fully(&mut header)?;
        if n < 4 {
            break;
        }
        let is_last = header[0] & 0x80 != 0;
        let block_type = header[0] & 0x7F;
        let length = ((header[1] as u32) << 16) | ((header[2] as u32) << 8) | header[3] as u32;

        let block_start = src.seek(0, Whence::Current)?;
        match block_type {
            BLOCK_STREAMINFO => {
                let mut body = vec![0u8; length as usize];
                let n = src.read_fully(&mut body)?;
                body.truncate(n);
                apply_streaminfo(&body, record)?;
            }
            BLOCK_VORBIS_COMMENT => {
                let mut body = vec![0u8; length as usize];
                let n = src.read_fully(&mut body)?;
                body.truncate(n);
                read_vorbis_comments(&body, block_start, record)?;
            }
            BLOCK_PICTURE => {
                let mut body = vec![0u8; length as usize];
                let n = src.read_fully(&mut body)?;
                body.truncate(n);
                apply_picture(&body, block_start, record);
            }
            _ => {
                src.seek(block_start + length as i64, Whence::Start)?;
            }
        }

        if is_last {
            break;
        }
    }

    if record.frequency == 0 || record.length == 0 {
        return invalid_stream_parameters_error("flac: STREAMINFO missing or incomplete");
    }

    src.seek(0, Whence::Start)?;
    Ok(())
}

/// `STREAMINFO` is 34 bytes: 10 bytes of block-size/frame-size fields, then a packed 20-bit
/// sample rate, 3-bit channels-minus-one, 5-bit bits-per-sample-minus-one, and 36-bit total
/// sample count, followed by a 128-bit MD5 this library does not surface.
fn apply_streaminfo(body: &[u8], record: &mut MetadataRecord) -> Result<()> {
    if body.len() < 18 {
        return malformed_error("flac: truncated STREAMINFO");
    }
    let packed = read_be64(&body[10..18]);
    let sample_rate = ((packed >> 44) & 0xF_FFFF) as u32;
    let channels = (((packed >> 41) & 0x7) as u32) + 1;
    // bits_per_sample (bits 40..36) is not surfaced on the record.
    let total_samples = packed & 0xF_FFFF_FFFF;

    record.frequency = sample_rate;
    record.channels = channels;
    record.samples = total_samples;
    if sample_rate > 0 {
        record.length = total_samples * 1000 / sample_rate as u64;
    }
    Ok(())
}

fn apply_picture(body: &[u8], block_start: u64, record: &mut MetadataRecord) {
    if record.has_album_art || body.len() < 8 {
        return;
    }
    let mime_len = read_be32(&body[4..8]) as usize;
    let mime_start = 8;
    if body.len() < mime_start + mime_len {
        return;
    }
    let mime = String::from_utf8_lossy(&body[mime_start..mime_start + mime_len]);
    let art_type = match mime.as_ref() {
        "image/png" => AlbumArtType::Png,
        "image/jpeg" => AlbumArtType::Jpg,
        "image/bmp" => AlbumArtType::Bmp,
        _ => AlbumArtType::Unknown,
    };

    let mut cursor = mime_start + mime_len;
    if body.len() < cursor + 4 {
        return;
    }
    let desc_len = read_be32(&body[cursor..cursor + 4]) as usize;
    cursor += 4 + desc_len;
    // width, height, colour depth, colour count: 4 fields of 4 bytes, skipped.
    cursor += 16;
    if body.len() < cursor + 4 {
        return;
    }
    let data_len = read_be32(&body[cursor..cursor + 4]) as usize;
    cursor += 4;

    record.has_album_art = true;
    record.album_art.art_type = art_type;
    record.album_art.pos = block_start + cursor as u64;
    record.album_art.size = data_len as u64;
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    fn streaminfo_block(sample_rate: u32, channels: u32, total_samples: u64) -> Vec<u8> {
        let mut body = vec![0u8; 34];
        let packed: u64 = ((sample_rate as u64) << 44)
            | (((channels - 1) as u64) << 41)
            | (15u64 << 36) // bits_per_sample - 1 = 15 (16-bit)
            | (total_samples & 0xF_FFFF_FFFF);
        body[10..18].copy_from_slice(&packed.to_be_bytes());
        body
    }

    fn block_header(is_last: bool, block_type: u8, length: u32) -> [u8; 4] {
        let mut b0 = block_type;
        if is_last {
            b0 |= 0x80;
        }
        [b0, (length >> 16) as u8, (length >> 8) as u8, length as u8]
    }

    #[test]
    fn scenario_4_streaminfo_and_picture() {
        let si = streaminfo_block(48000, 2, 4_800_000);
        let mut file = b"fLaC".to_vec();
        file.extend_from_slice(&block_header(false, BLOCK_STREAMINFO, si.len() as u32));
        file.extend_from_slice(&si);

        let mime = b"image/png";
        let mut picture = Vec::new();
        picture.extend_from_slice(&0u32.to_be_bytes()); // picture type
        picture.extend_from_slice(&(mime.len() as u32).to_be_bytes());
        picture.extend_from_slice(mime);
        picture.extend_from_slice(&0u32.to_be_bytes()); // description length
        picture.extend_from_slice(&[0u8; 16]); // width/height/depth/colour-count
        picture.extend_from_slice(&100u32.to_be_bytes()); // data length
        picture.extend_from_slice(&vec![0u8; 100]);

        file.extend_from_slice(&block_header(true, BLOCK_PICTURE, picture.len() as u32));
        file.extend_from_slice(&picture);

        // 4 ("fLaC") + 4 (STREAMINFO block header) + len(si) + 4 (PICTURE block header) +
        // (picture-type + mime-len + mime + desc-len + 16 field bytes + data-len field).
        let picture_block_start = 4 + 4 + si.len() + 4;
        let picture_header_len = 4 + 4 + mime.len() + 4 + 16 + 4;
        let expected_pos = (picture_block_start + picture_header_len) as u64;

        let mut src = BufferedSource::new(Cursor::new(file), "t.flac");
        let mut record = MetadataRecord::new();
        read_flac(&mut src, &mut record).unwrap();
        assert_eq!(record.length, 100_000);
        assert!(record.has_album_art);
        assert_eq!(record.album_art.art_type, AlbumArtType::Png);
        assert_eq!(record.album_art.pos, expected_pos);
    }

    #[test]
    fn missing_magic_is_fatal() {
        let mut src = BufferedSource::new(Cursor::new(b"RIFF".to_vec()), "t.flac");
        let mut record = MetadataRecord::new();
        assert!(read_flac(&mut src, &mut record).is_err());
    }
}
