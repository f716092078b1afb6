//! Console/home-computer synthesis-chip formats that this library renders with a single fixed
//! timbre (16-bit, 44.1 kHz, stereo, 706 kbps): SID, SGC, GBS, HES, and KSS. Each format's only
//! real per-file information is a magic check, an optional title/artist/copyright block, and a
//! subtune count that stands in for playback length.

use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::text::decode_iso8859_1;
use audiometa_core::{invalid_magic_error, invalid_stream_parameters_error, Result};

const SYNTH_BITRATE: u32 = 706;
const SYNTH_FREQUENCY: u32 = 44100;

fn apply_synth_defaults(record: &mut MetadataRecord, filesize: u64) {
    record.filesize = filesize;
    record.vbr = false;
    record.bitrate = SYNTH_BITRATE;
    record.frequency = SYNTH_FREQUENCY;
    record.channels = 2;
}

fn field(buf: &[u8]) -> String {
    decode_iso8859_1(buf).trim_end_matches('\0').trim().to_string()
}

/// C64 SID: a fixed 0x80-byte header with title/artist/release fields and a subtune count that
/// this library maps onto track length (one second per subtune).
pub fn read_sid<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Sid;
    let filesize = src.size()?;
    apply_synth_defaults(record, filesize);

    src.seek(0, Whence::Start)?;
    let mut buf = [0u8; 0x80];
    let n = src.read_fully(&mut buf)?;
    if n < buf.len() {
        return invalid_stream_parameters_error("sid: file too small");
    }
    if &buf[0..4] != b"PSID" && &buf[0..4] != b"RSID" {
        return invalid_magic_error("sid: missing PSID/RSID magic");
    }

    record.title = field(&buf[0x16..0x16 + 0x1F]);
    record.artist = field(&buf[0x36..0x36 + 0x1F]);
    if let Ok(year) = std::str::from_utf8(&buf[0x56..0x56 + 4]).unwrap_or("").trim().parse::<u32>() {
        record.year = year;
    }
    record.album = field(&buf[0x56..0x56 + 0x1F]);

    // The subtune count is a 16-bit value at 0xE, but only the low byte is used here.
    record.length = (buf[0x0F].saturating_sub(1) as u64) * 1000;

    src.seek(0, Whence::Start)?;
    Ok(())
}

/// Sega/NES/PC Engine SGC: `"SGC\x1A"` magic, then a 0xA0-byte header.
pub fn read_sgc<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Sgc;
    let filesize = src.size()?;
    apply_synth_defaults(record, filesize);

    src.seek(0, Whence::Start)?;
    let mut buf = [0u8; 0xA0];
    let n = src.read_fully(&mut buf)?;
    if n < buf.len() {
        return invalid_stream_parameters_error("sgc: file too small");
    }
    if &buf[0..4] != b"SGC\x1A" {
        return invalid_magic_error("sgc: missing SGC magic");
    }

    record.length = (buf[37] as u64) * 1000;
    record.title = field(&buf[64..64 + 32]);
    record.artist = field(&buf[96..96 + 32]);
    record.album = field(&buf[128..128 + 32]);

    src.seek(0, Whence::Start)?;
    Ok(())
}

/// Game Boy GBS: `"GBS"` magic, then a 112-byte header.
pub fn read_gbs<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Gbs;
    let filesize = src.size()?;
    apply_synth_defaults(record, filesize);

    src.seek(0, Whence::Start)?;
    let mut buf = [0u8; 112];
    let n = src.read_fully(&mut buf)?;
    if n < buf.len() {
        return invalid_stream_parameters_error("gbs: file too small");
    }
    if &buf[0..3] != b"GBS" {
        return invalid_magic_error("gbs: missing GBS magic");
    }

    record.length = (buf[4] as u64) * 1000;
    record.title = field(&buf[16..16 + 32]);
    record.artist = field(&buf[48..48 + 32]);
    record.album = field(&buf[80..80 + 32]);

    src.seek(0, Whence::Start)?;
    Ok(())
}

/// PC Engine HES: `"HESM"` magic. The format carries no usable subtune count, so this library
/// falls back to a flat 255-subtune default, same as the other chip formats' worst case.
pub fn read_hes<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Hes;
    let filesize = src.size()?;
    apply_synth_defaults(record, filesize);

    src.seek(0, Whence::Start)?;
    let mut magic = [0u8; 4];
    let n = src.read_fully(&mut magic)?;
    if n < 4 || &magic != b"HESM" {
        return invalid_magic_error("hes: missing HESM magic");
    }

    record.length = 255 * 1000;

    src.seek(0, Whence::Start)?;
    Ok(())
}

/// MSX KSS: `"KSCC"` or `"KSSX"` magic, then a 32-byte header. Track count lives at byte 26 only
/// when byte 14 flags an extended header; otherwise the 255-subtune default applies.
pub fn read_kss<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Kss;
    let filesize = src.size()?;
    apply_synth_defaults(record, filesize);

    src.seek(0, Whence::Start)?;
    let mut buf = [0u8; 0x20];
    let n = src.read_fully(&mut buf)?;
    if n < buf.len() {
        return invalid_stream_parameters_error("kss: file too small");
    }
    if &buf[0..4] != b"KSCC" && &buf[0..4] != b"KSSX" {
        return invalid_magic_error("kss: missing KSCC/KSSX magic");
    }

    let mut length = 0u64;
    if buf[14] == 0x10 {
        let track_count = u16::from_le_bytes([buf[26], buf[27]]) as u64;
        length = (track_count + 1) * 1000;
    }
    record.length = if length > 0 { length } else { 255 * 1000 };

    src.seek(0, Whence::Start)?;
    Ok(())
}
