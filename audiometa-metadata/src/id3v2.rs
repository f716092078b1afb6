//! An ID3v2.2/2.3/2.4 frame-walking metadata reader: unsynchronisation, extended headers,
//! per-frame flags, and the tag-dispatch table of §4.6.

use audiometa_core::endian::{read_be32, synchsafe4};
use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{AlbumArtType, CueSheetEncoding, Id3Version, MetadataRecord};
use audiometa_core::text::{decode_id3_multi_string, decode_id3_text};
use audiometa_core::{malformed_error, Result};

use crate::genre::lookup as genre_lookup;

/// A single oversized frame must not dominate the internal read buffer.
const ID3V2_MAX_ITEM_SIZE: usize = 240;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Version {
    V2,
    V3,
    V4,
}

/// Reads an ID3v2 tag starting at the source's current position (normally offset 0). Returns the
/// total on-disk size of the tag (header + frames + padding), or 0 if no `"ID3"` magic is present.
pub fn read_id3v2<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<u32> {
    let mut header = [0u8; 10];
    let n = src.read_fully(&mut header)?;
    if n != 10 || &header[0..3] != b"ID3" {
        src.seek(0, Whence::Start)?;
        return Ok(0);
    }

    let version = match header[3] {
        2 => Version::V2,
        3 => Version::V3,
        4 => Version::V4,
        _ => {
            // Unknown major version: recoverable at the file level, but there is nothing sound
            // to parse, so treat it as "no tag".
            src.seek(0, Whence::Start)?;
            return Ok(0);
        }
    };

    let flags = header[5];
    let unsync = flags & 0x80 != 0;
    let has_ext_header = flags & 0x40 != 0;
    let tag_size = synchsafe4(header[6], header[7], header[8], header[9]);

    let mut body = vec![0u8; tag_size as usize];
    let read_n = src.read_fully(&mut body)?;
    body.truncate(read_n);

    let mut cursor = 0usize;

    if has_ext_header {
        if body.len() < cursor + 4 {
            return malformed_error("id3v2: truncated extended header");
        }
        let ext_size = match version {
            // v2.3: extended header size does not include itself, not synchsafe.
            Version::V3 => read_be32(&body[cursor..]) as usize,
            // v2.4: extended header size includes itself, synchsafe.
            Version::V4 => {
                synchsafe4(body[cursor], body[cursor + 1], body[cursor + 2], body[cursor + 3])
                    as usize
            }
            Version::V2 => 0,
        };
        let skip = match version {
            Version::V3 => 4 + ext_size,
            Version::V4 => ext_size,
            Version::V2 => 0,
        };
        cursor = (cursor + skip).min(body.len());
    }

    let body = if unsync && version != Version::V4 {
        remove_unsync_stuffing(&body)
    } else {
        body
    };

    record.id3v2_len = 10 + tag_size;
    if record.id3_version.is_none() {
        record.id3_version = Some(match version {
            Version::V2 => Id3Version::V2_2,
            Version::V3 => Id3Version::V2_3,
            Version::V4 => Id3Version::V2_4,
        });
    }

    // The tag always starts at absolute file offset 0 (callers seek there first), so the body
    // begins at the fixed 10-byte header offset; `cursor` is body-relative from here on.
    const BODY_FILE_OFFSET: u64 = 10;

    while cursor < body.len() {
        let frame_file_offset = BODY_FILE_OFFSET + cursor as u64;
        let consumed = match version {
            Version::V2 => read_frame_v2(&body[cursor..], frame_file_offset, record),
            Version::V3 | Version::V4 => {
                read_frame_v3_v4(&body[cursor..], version, frame_file_offset, record)
            }
        };
        match consumed {
            Some(0) => break, // padding reached
            Some(n) => cursor += n,
            None => break, // malformed frame header: stop, tag already partially applied
        }
    }

    src.seek(10 + tag_size as i64, Whence::Start)?;
    Ok(10 + tag_size)
}

/// Removes the stuffing byte following every `0xFF 0x00` pair, carrying the "did we just see an
/// 0xFF" bit across the whole body in one pass.
fn remove_unsync_stuffing(body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(body.len());
    let mut ff_found = false;
    for &b in body {
        if ff_found && b == 0 {
            ff_found = false;
            continue;
        }
        ff_found = b == 0xFF;
        out.push(b);
    }
    out
}

fn read_frame_v2(buf: &[u8], frame_file_offset: u64, record: &mut MetadataRecord) -> Option<usize> {
    if buf.len() < 6 {
        return None;
    }
    let id = &buf[0..3];
    if id == [0, 0, 0] {
        return Some(0);
    }
    let size = ((buf[3] as u32) << 16 | (buf[4] as u32) << 8 | buf[5] as u32) as usize;
    if size == 0 {
        return Some(6);
    }
    if buf.len() < 6 + size {
        return None;
    }
    let name = v2_name_to_v3(id);
    let payload = &buf[6..6 + size];
    dispatch_frame(name, payload, frame_file_offset + 6, record);
    Some(6 + size)
}

fn read_frame_v3_v4(
    buf: &[u8],
    version: Version,
    frame_file_offset: u64,
    record: &mut MetadataRecord,
) -> Option<usize> {
    if buf.len() < 10 {
        return None;
    }
    let id = &buf[0..4];
    if id == [0, 0, 0, 0] {
        return Some(0);
    }
    let size = match version {
        Version::V4 => synchsafe4(buf[4], buf[5], buf[6], buf[7]) as usize,
        _ => read_be32(&buf[4..8]) as usize,
    };
    let flags = ((buf[8] as u16) << 8) | buf[9] as u16;
    if buf.len() < 10 + size {
        return None;
    }
    let mut payload = &buf[10..10 + size];
    let mut payload_file_offset = frame_file_offset + 10;

    // Compression (0x0080 in v2.3, part of 0x000C in v2.4) or encryption: skip, recoverable.
    let compressed_or_encrypted = match version {
        Version::V3 => flags & 0x00C0 != 0,
        Version::V4 => flags & 0x000C != 0,
        Version::V2 => false,
    };
    if compressed_or_encrypted {
        return Some(10 + size);
    }

    // v2.4 grouping / data-length-indicator bytes precede the actual frame data.
    if version == Version::V4 {
        let mut skip = 0;
        if flags & 0x0040 != 0 {
            skip += 1; // group identifier
        }
        if flags & 0x0001 != 0 {
            skip += 4; // data length indicator
        }
        if payload.len() < skip {
            return Some(10 + size);
        }
        payload = &payload[skip..];
        payload_file_offset += skip as u64;
    }

    let frame_unsync = version == Version::V4 && flags & 0x0002 != 0;
    let owned;
    let payload = if frame_unsync {
        owned = remove_unsync_stuffing(payload);
        &owned[..]
    } else {
        payload
    };

    let name = std::str::from_utf8(id).unwrap_or("????");
    dispatch_frame(name, payload, payload_file_offset, record);
    Some(10 + size)
}

fn v2_name_to_v3(id: &[u8]) -> &'static str {
    match id {
        b"TP1" => "TPE1",
        b"TT2" => "TIT2",
        b"TAL" => "TALB",
        b"TRK" => "TRCK",
        b"TPA" => "TPOS",
        b"TYE" => "TYER",
        b"TCM" => "TCOM",
        b"TP2" => "TPE2",
        b"TT1" => "TIT1",
        b"COM" => "COMM",
        b"TCO" => "TCON",
        b"PIC" => "APIC",
        b"UFI" => "UFID",
        _ => "????",
    }
}

fn truncate_payload(payload: &[u8]) -> &[u8] {
    &payload[..payload.len().min(ID3V2_MAX_ITEM_SIZE)]
}

fn dispatch_frame(name: &str, payload: &[u8], payload_file_offset: u64, record: &mut MetadataRecord) {
    if payload.is_empty() && !matches!(name, "APIC" | "PIC") {
        return;
    }
    match name {
        "TPE1" => set_text_field(&mut record.artist, payload),
        "TIT2" => set_text_field(&mut record.title, payload),
        "TALB" => set_text_field(&mut record.album, payload),
        "TPE2" => set_text_field(&mut record.album_artist, payload),
        "TIT1" => set_text_field(&mut record.grouping, payload),
        "TCOM" => set_text_field(&mut record.composer, payload),
        "TRCK" => {
            let s = decode_text_frame(payload);
            if record.track_string.is_empty() {
                record.track_string = s.clone();
            }
            if record.track_num == 0 {
                if let Some(n) = leading_integer(&s) {
                    record.track_num = n;
                }
            }
        }
        "TPOS" => {
            let s = decode_text_frame(payload);
            if record.disc_string.is_empty() {
                record.disc_string = s.clone();
            }
            if record.disc_num == 0 {
                if let Some(n) = leading_integer(&s) {
                    record.disc_num = n;
                }
            }
        }
        "TYER" | "TDRC" => {
            let s = decode_text_frame(payload);
            if record.year == 0 {
                if let Some(n) = leading_integer(&s) {
                    record.year = n;
                }
            }
            MetadataRecord::set_if_empty(&mut record.year_string, s);
        }
        "TCON" => apply_genre(payload, record),
        "COMM" => apply_comment(payload, record),
        "APIC" => apply_album_art(payload, payload_file_offset, record),
        "TXXX" => apply_txxx(payload, payload_file_offset, record),
        "RVA2" => apply_rva2(payload, record),
        "UFID" => apply_ufid(payload, record),
        _ => {
            log::debug!("id3v2: skipping unrecognised frame {name}");
        }
    }
}

fn set_text_field(field: &mut String, payload: &[u8]) {
    if !field.is_empty() {
        return;
    }
    *field = decode_text_frame(payload);
}

fn decode_text_frame(payload: &[u8]) -> String {
    if payload.is_empty() {
        return String::new();
    }
    let enc = payload[0];
    let body = truncate_payload(&payload[1..]);
    decode_id3_text(enc, body).trim_end().to_string()
}

fn leading_integer(s: &str) -> Option<u32> {
    let digits: String = s.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        None
    } else {
        digits.parse().ok()
    }
}

/// TCON accepts a bare numeric index, a parenthesised index with optional trailing free text, or
/// a literal genre string, tried in that order.
fn apply_genre(payload: &[u8], record: &mut MetadataRecord) {
    if !record.genre.is_empty() || payload.is_empty() {
        return;
    }
    let enc = payload[0];
    let body = truncate_payload(&payload[1..]);
    let text = decode_id3_text(enc, body).trim().to_string();

    if let Ok(index) = text.parse::<u8>() {
        if let Some(name) = genre_lookup(index) {
            record.genre = name.to_string();
            return;
        }
    }

    if let Some(rest) = text.strip_prefix('(') {
        if let Some(close) = rest.find(')') {
            let inner = &rest[..close];
            if inner != "RX" && inner != "CR" {
                if let Ok(index) = inner.parse::<u8>() {
                    if let Some(name) = genre_lookup(index) {
                        record.genre = name.to_string();
                        return;
                    }
                }
            }
        }
    }

    if !text.is_empty() {
        record.genre = text;
    }
}

/// Strips the 3-byte language code and the short description, then checks for the iTunes
/// `iTunSMPB` gapless marker, which carries lead/tail trim as hex fields instead of free text.
fn apply_comment(payload: &[u8], record: &mut MetadataRecord) {
    if payload.len() < 4 {
        return;
    }
    let enc = payload[0];
    // payload[1..4] is the 3-byte language code.
    let rest = &payload[4..];

    let (description, body, _value_offset) = split_description(enc, rest);

    if description.trim() == "iTunSMPB" {
        apply_itunsmpb(&body, record);
        return;
    }

    if record.comment.is_empty() {
        let text = decode_id3_multi_string(enc, truncate_payload(&body));
        record.comment = text.trim_end().to_string();
    }
}

/// Splits `enc`+`rest` at the first NUL (double-NUL for UTF-16) terminator into (description,
/// remaining body, byte offset of the body's first byte within `rest`).
fn split_description(enc: u8, rest: &[u8]) -> (String, Vec<u8>, usize) {
    let sep_width: usize = if enc == 1 || enc == 2 { 2 } else { 1 };
    let mut i = 0;
    while i + sep_width <= rest.len() {
        if rest[i..i + sep_width].iter().all(|&b| b == 0) {
            let description = decode_id3_text(enc, &rest[..i]);
            return (description, rest[i + sep_width..].to_vec(), i + sep_width);
        }
        i += sep_width;
    }
    (String::new(), rest.to_vec(), 0)
}

fn apply_itunsmpb(body: &[u8], record: &mut MetadataRecord) {
    let enc = 0; // iTunSMPB payloads are always ISO-8859-1/ASCII hex text.
    let text = decode_id3_text(enc, body);
    let fields: Vec<&str> = text.split_whitespace().collect();
    if fields.len() < 3 {
        return;
    }
    if record.lead_trim == 0 {
        if let Ok(v) = u64::from_str_radix(fields[1], 16) {
            record.lead_trim = v;
        }
    }
    if record.tail_trim == 0 {
        if let Ok(v) = u64::from_str_radix(fields[2], 16) {
            record.tail_trim = v;
        }
    }
}

fn apply_album_art(payload: &[u8], payload_file_offset: u64, record: &mut MetadataRecord) {
    if record.has_album_art || payload.len() < 2 {
        return;
    }
    // MIME type / picture-type prefix, then a NUL-terminated description, then the binary blob.
    // This is approximated here by scanning for a JPEG/PNG/BMP magic within the first 64 bytes,
    // which is robust to both the v2.2 (3-char type code) and v2.3+ (MIME string) framings.
    let scan_window = &payload[..payload.len().min(64)];
    let (art_type, offset_in_window) = if let Some(pos) = find(scan_window, &[0xFF, 0xD8, 0xFF]) {
        (AlbumArtType::Jpg, pos)
    } else if let Some(pos) = find(scan_window, b"\x89PNG\r\n\x1a\n") {
        (AlbumArtType::Png, pos)
    } else if let Some(pos) = find(scan_window, b"BM") {
        (AlbumArtType::Bmp, pos)
    } else {
        return;
    };

    record.has_album_art = true;
    record.album_art.art_type = art_type;
    record.album_art.pos = payload_file_offset + offset_in_window as u64;
    record.album_art.size = (payload.len() - offset_in_window) as u64;
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack.windows(needle.len()).position(|w| w == needle)
}

fn apply_txxx(payload: &[u8], payload_file_offset: u64, record: &mut MetadataRecord) {
    if payload.is_empty() {
        return;
    }
    let enc = payload[0];
    let (description, value_bytes, value_offset) = split_description(enc, &payload[1..]);
    let value = decode_id3_text(enc, truncate_payload(&value_bytes));
    let key = description.trim();

    if key.eq_ignore_ascii_case("ALBUM ARTIST") {
        MetadataRecord::set_if_empty(&mut record.album_artist, value);
    } else if key.eq_ignore_ascii_case("CUESHEET") {
        if !record.has_embedded_cue_sheet {
            record.has_embedded_cue_sheet = true;
            record.cue_sheet.encoding = CueSheetEncoding::Utf8;
            record.cue_sheet.size = value.len() as u64;
            // payload[0] is the encoding byte; `value_offset` is relative to payload[1..].
            record.cue_sheet.pos = payload_file_offset + 1 + value_offset as u64;
        }
    } else {
        audiometa_core::replaygain::parse_replaygain_key(key, &value, record);
    }
}

/// Master-volume ReplayGain per the ID3v2.4 `RVA2` frame: 16-bit signed gain in 1/512 dB units,
/// a peak-bits byte, then a variable-length big-endian peak of which only the top 24 bits are
/// used.
fn apply_rva2(payload: &[u8], record: &mut MetadataRecord) {
    // Skip the NUL-terminated identification string.
    let Some(nul) = payload.iter().position(|&b| b == 0) else {
        return;
    };
    let rest = &payload[nul + 1..];
    if rest.len() < 4 {
        return;
    }
    let channel = rest[0];
    if channel != 1 {
        // Only the "master volume" channel is in scope.
        return;
    }
    let gain = i16::from_be_bytes([rest[1], rest[2]]) as i64;
    let peak_bits = rest[3];
    let peak_bytes = ((peak_bits as usize) + 7) / 8;
    let peak = if rest.len() >= 4 + peak_bytes && peak_bytes > 0 {
        let mut v: u64 = 0;
        for &b in &rest[4..4 + peak_bytes.min(4)] {
            v = (v << 8) | b as u64;
        }
        // Only the top 24 bits are meaningful; shift down to Q7.24-ish scale heuristically.
        (v as i64) << (24i64 - peak_bits.min(24) as i64).max(0)
    } else {
        0
    };
    audiometa_core::replaygain::set_gain_from_units(record, false, gain, peak);
}

fn apply_ufid(payload: &[u8], record: &mut MetadataRecord) {
    let Some(nul) = payload.iter().position(|&b| b == 0) else {
        return;
    };
    let owner = String::from_utf8_lossy(&payload[..nul]);
    if !owner.eq_ignore_ascii_case("http://musicbrainz.org") {
        return;
    }
    let id_bytes = &payload[nul + 1..];
    if id_bytes.len() == 36 && record.mb_track_id.is_empty() {
        record.mb_track_id = String::from_utf8_lossy(id_bytes).into_owned();
    }
}
