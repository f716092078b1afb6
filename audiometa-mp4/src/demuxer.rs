//! The recursive MP4/QuickTime atom walker: container recursion, `stts` sample accumulation,
//! `mp4a`/`alac` sample-entry codec detection, `chpl` lead-trim, and the `ilst` tag table.

use audiometa_core::endian::{read_be32, read_be64};
use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::{invalid_stream_parameters_error, malformed_error, unsupported_version_error, Result};

use crate::atom::slice_atoms;

struct Ctx {
    /// The most recently seen `hdlr` atom's 4-byte handler type, scoped loosely to the current
    /// subtree (real files always declare `hdlr` before the `minf`/`ilst` siblings that need it).
    handler: Option<[u8; 4]>,
}

/// Reads stream parameters and tags for an MP4/QuickTime file.
pub fn read_mp4<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    let filesize = src.size()?;
    if filesize < 8 {
        return invalid_stream_parameters_error("mp4: file too small");
    }
    record.filesize = filesize;

    src.seek(0, Whence::Start)?;
    let mut ctx = Ctx { handler: None };
    walk(src, filesize, record, &mut ctx)?;

    if record.codec == Codec::Unknown && (record.samples > 0 || record.frequency > 0) {
        // A stream was found but esds/alac never resolved a codec tag; this is still usable.
        record.codec = Codec::Mp4Aac;
    }

    if record.samples == 0 || record.frequency == 0 || record.filesize == 0 {
        return invalid_stream_parameters_error("mp4: missing samples, frequency, or filesize");
    }
    if record.length == 0 {
        record.length = record.samples * 1000 / record.frequency as u64;
    }

    src.seek(0, Whence::Start)?;
    Ok(())
}

fn walk<S: ByteSource + ?Sized>(src: &mut S, end: u64, record: &mut MetadataRecord, ctx: &mut Ctx) -> Result<bool> {
    loop {
        let pos = src.seek(0, Whence::Current)? as u64;
        if pos + 8 > end {
            break;
        }
        let mut header = [0u8; 8];
        let n = src.read_fully(&mut header)?;
        if n < 8 {
            break;
        }
        let raw_size = read_be32(&header[0..4]) as u64;
        let fourcc = [header[4], header[5], header[6], header[7]];
        if raw_size == 1 {
            return unsupported_version_error("mp4: 64-bit atom sizes unsupported");
        }
        let content_start = pos + 8;
        let content_len = if raw_size == 0 {
            end.saturating_sub(content_start)
        } else if raw_size >= 8 {
            raw_size - 8
        } else {
            return malformed_error("mp4: atom size too small");
        };
        let content_end = (content_start + content_len).min(end);

        let stop = handle_atom(src, &fourcc, content_start, content_end, record, ctx)?;
        src.seek(content_end as i64, Whence::Start)?;
        if stop {
            return Ok(true);
        }
    }
    Ok(false)
}

fn handle_atom<S: ByteSource + ?Sized>(
    src: &mut S,
    fourcc: &[u8; 4],
    content_start: u64,
    content_end: u64,
    record: &mut MetadataRecord,
    ctx: &mut Ctx,
) -> Result<bool> {
    let content_len = (content_end - content_start) as usize;
    match fourcc {
        b"moov" | b"udta" | b"trak" | b"stbl" | b"mdia" => {
            return walk(src, content_end, record, ctx);
        }
        b"minf" => {
            if ctx.handler == Some(*b"soun") {
                return walk(src, content_end, record, ctx);
            }
        }
        b"stsd" => {
            src.seek(content_start as i64 + 8, Whence::Start)?;
            return walk(src, content_end, record, ctx);
        }
        b"meta" => {
            src.seek(content_start as i64 + 4, Whence::Start)?;
            return walk(src, content_end, record, ctx);
        }
        b"ilst" => {
            if ctx.handler == Some(*b"mdir") {
                let mut buf = vec![0u8; content_len];
                src.read_fully(&mut buf)?;
                crate::ilst::apply_ilst(&buf, content_start, record);
            }
        }
        b"ftyp" => {
            let mut buf = vec![0u8; content_len.min(64)];
            src.read_fully(&mut buf)?;
            handle_ftyp(&buf);
        }
        b"hdlr" => {
            if content_len >= 12 {
                let mut buf = [0u8; 12];
                src.read_fully(&mut buf)?;
                ctx.handler = Some([buf[8], buf[9], buf[10], buf[11]]);
            }
        }
        b"stts" => {
            let mut buf = vec![0u8; content_len];
            src.read_fully(&mut buf)?;
            handle_stts(&buf, record);
        }
        b"mp4a" => {
            let mut buf = vec![0u8; content_len];
            src.read_fully(&mut buf)?;
            handle_mp4a(&buf, record);
        }
        b"alac" => {
            let mut buf = vec![0u8; content_len];
            src.read_fully(&mut buf)?;
            handle_alac(&buf, record);
        }
        b"mdat" => {
            record.filesize = src.size()?;
            if record.samples > 0 {
                return Ok(true);
            }
        }
        b"chpl" => {
            let mut buf = vec![0u8; content_len];
            src.read_fully(&mut buf)?;
            handle_chpl(&buf, record);
        }
        _ => {
            log::debug!("mp4: skipping atom {:?}", String::from_utf8_lossy(fourcc));
        }
    }
    Ok(false)
}

fn handle_ftyp(buf: &[u8]) {
    if buf.len() < 4 {
        return;
    }
    const VALID_BRANDS: [&[u8; 4]; 7] = [b"M4A ", b"M4B ", b"mp42", b"qt  ", b"3gp6", b"m4a ", b"isom"];
    let brand = &buf[0..4];
    if !VALID_BRANDS.iter().any(|b| b.as_slice() == brand) {
        log::debug!("mp4: unexpected major brand {:?}", String::from_utf8_lossy(brand));
    }
}

fn handle_stts(buf: &[u8], record: &mut MetadataRecord) {
    if buf.len() < 8 {
        return;
    }
    let count = read_be32(&buf[4..8]) as usize;
    let mut cursor = 8;
    let mut total = 0u64;
    for _ in 0..count {
        if cursor + 8 > buf.len() {
            break;
        }
        let entry_count = read_be32(&buf[cursor..cursor + 4]) as u64;
        let duration = read_be32(&buf[cursor + 4..cursor + 8]) as u64;
        let mut n = entry_count * duration;
        if record.codec == Codec::Mp4AacHe && duration <= 1024 {
            n *= 2;
            record.needs_upsampling_correction = true;
        }
        total += n;
        cursor += 8;
    }
    record.samples += total;
}

fn handle_mp4a(buf: &[u8], record: &mut MetadataRecord) {
    if buf.len() < 28 {
        return;
    }
    for (fourcc, content) in slice_atoms(&buf[28..]) {
        if &fourcc == b"esds" {
            if let Some(codec) = crate::esds::parse_esds(&content, record) {
                record.codec = codec;
            }
        }
    }
}

fn handle_alac(buf: &[u8], record: &mut MetadataRecord) {
    if buf.len() < 28 {
        return;
    }
    for (fourcc, content) in slice_atoms(&buf[28..]) {
        if &fourcc == b"alac" && content.len() == 20 {
            record.frequency = read_be32(&content[16..20]);
            record.codec = Codec::Mp4Alac;
        }
    }
}

fn handle_chpl(buf: &[u8], record: &mut MetadataRecord) {
    if buf.len() < 13 || record.lead_trim != 0 || record.frequency == 0 {
        return;
    }
    // version(1) + flags(3) + chapter_count(1), then {timestamp:BE64, len:u8, name} entries.
    let ts = read_be64(&buf[5..13]);
    record.lead_trim = ts * record.frequency as u64 / 10_000_000;
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    fn atom(fourcc: &[u8; 4], content: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&((8 + content.len()) as u32).to_be_bytes());
        out.extend_from_slice(fourcc);
        out.extend_from_slice(content);
        out
    }

    fn mp4a_with_esds(sample_rate_idx: u8, object_type: u8) -> Vec<u8> {
        let mut sample_entry = vec![0u8; 28];
        let packed: u32 = ((object_type as u32) << 11) | ((sample_rate_idx as u32) << 7) | (2u32 << 3);
        let dsi = [(packed >> 8) as u8, packed as u8];

        let mut esds_content = vec![0u8; 4];
        esds_content.push(0x03);
        esds_content.push(0x00);
        esds_content.extend_from_slice(&[0u8; 3]);
        esds_content.push(0x04);
        esds_content.push(0x00);
        esds_content.extend_from_slice(&[0u8; 13]);
        esds_content.push(0x05);
        esds_content.push(dsi.len() as u8);
        esds_content.extend_from_slice(&dsi);

        sample_entry.extend(atom(b"esds", &esds_content));
        sample_entry
    }

    fn build_minimal_mp4(stts_entries: &[(u32, u32)], object_type: u8) -> Vec<u8> {
        let mut stts_content = vec![0u8; 4];
        stts_content.extend_from_slice(&(stts_entries.len() as u32).to_be_bytes());
        for (count, duration) in stts_entries {
            stts_content.extend_from_slice(&count.to_be_bytes());
            stts_content.extend_from_slice(&duration.to_be_bytes());
        }
        let stts = atom(b"stts", &stts_content);

        let mp4a_content = mp4a_with_esds(3, object_type); // freq index 3 = 48000
        let mut stsd_content = vec![0u8; 8];
        stsd_content.extend(atom(b"mp4a", &mp4a_content));
        let stsd = atom(b"stsd", &stsd_content);

        let mut stbl_content = Vec::new();
        stbl_content.extend(stsd);
        stbl_content.extend(stts);
        let stbl = atom(b"stbl", &stbl_content);

        let minf = atom(b"minf", &stbl);

        let mut hdlr_content = vec![0u8; 8];
        hdlr_content.extend_from_slice(b"soun");
        let hdlr = atom(b"hdlr", &hdlr_content);

        let mut mdia_content = Vec::new();
        mdia_content.extend(hdlr);
        mdia_content.extend(minf);
        let mdia = atom(b"mdia", &mdia_content);

        let trak = atom(b"trak", &mdia);
        let moov = atom(b"moov", &trak);

        let mut out = atom(b"ftyp", b"M4A \0\0\0\0");
        out.extend(moov);
        out.extend(atom(b"mdat", &[0u8; 16]));
        out
    }

    #[test]
    fn scenario_3_aac_he_stts_doubling() {
        let buf = build_minimal_mp4(&[(1000, 1024)], 5); // object_type 5 = SBR
        let mut src = BufferedSource::new(Cursor::new(buf), "t.m4a");
        let mut record = MetadataRecord::new();
        read_mp4(&mut src, &mut record).unwrap();
        assert_eq!(record.samples, 2_048_000);
        assert!(record.needs_upsampling_correction);
        assert_eq!(record.codec, Codec::Mp4AacHe);
    }

    #[test]
    fn plain_aac_lc_does_not_double() {
        let buf = build_minimal_mp4(&[(1000, 1024)], 2); // object_type 2 = AAC LC
        let mut src = BufferedSource::new(Cursor::new(buf), "t.m4a");
        let mut record = MetadataRecord::new();
        read_mp4(&mut src, &mut record).unwrap();
        assert_eq!(record.samples, 1_024_000);
        assert!(!record.needs_upsampling_correction);
        assert_eq!(record.codec, Codec::Mp4Aac);
    }

    #[test]
    fn too_small_file_is_fatal() {
        let mut src = BufferedSource::new(Cursor::new(vec![0u8; 4]), "t.m4a");
        let mut record = MetadataRecord::new();
        assert!(read_mp4(&mut src, &mut record).is_err());
    }
}
