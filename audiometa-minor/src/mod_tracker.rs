//! ProTracker-family module trackers (`.mod`): a 1084-byte header whose trailing 4-byte
//! signature identifies the format. Synthesis parameters are fixed; there is no real way to know
//! a module's playback length without executing it, so a flat default is used.

use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::text::decode_iso8859_1;
use audiometa_core::{invalid_stream_parameters_error, malformed_error, Result};

const HEADER_SIZE: usize = 0x438;
const TITLE_SIZE: usize = 20;

/// Reads a `.mod` file's embedded song title after validating its format signature.
///
/// The signature check is an OR-fold across every known variant: a later candidate that fails to
/// match must never clear a match a previous candidate already found.
pub fn read_mod<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Mod;
    let filesize = src.size()?;
    record.filesize = filesize;

    src.seek(0, Whence::Start)?;
    let mut title_buf = [0u8; TITLE_SIZE];
    let n = src.read_fully(&mut title_buf)?;
    if n < TITLE_SIZE {
        return invalid_stream_parameters_error("mod: file too small");
    }

    src.seek(HEADER_SIZE as i64, Whence::Start)?;
    let mut id = [0u8; 4];
    let n = src.read_fully(&mut id)?;
    if n < 4 {
        return invalid_stream_parameters_error("mod: file too small");
    }

    if !is_known_signature(&id) {
        return malformed_error("mod: unrecognised module signature");
    }

    record.title = decode_iso8859_1(&title_buf).trim_end_matches('\0').to_string();
    record.bitrate = (filesize / 1024) as u32;
    record.frequency = 44100;
    record.length = 120 * 1000;
    record.vbr = false;

    src.seek(0, Whence::Start)?;
    Ok(())
}

fn is_known_signature(id: &[u8; 4]) -> bool {
    let mut is_mod = false;

    // Protracker and variants.
    is_mod |= id == b"M.K." || id == b"M!K!";

    // Star Tracker: "FLT"/"EXO" + a channel-count digit of 4 or 8.
    if (&id[0..3] == b"FLT" || &id[0..3] == b"EXO") && id[3].is_ascii_digit() {
        let chans = (id[3] - b'0') as u32;
        is_mod |= chans == 4 || chans == 8;
    }

    // Fasttracker: a digit followed by "CHN".
    is_mod |= id[0].is_ascii_digit() && &id[1..4] == b"CHN";

    // Fasttracker or Taketracker: two digits followed by "CH" or "CN".
    if &id[2..4] == b"CH" || &id[2..4] == b"CN" {
        is_mod |= id[0].is_ascii_digit() && id[1].is_ascii_digit();
    }

    is_mod
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    fn build(title: &str, id: &[u8; 4]) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE + 4];
        let bytes = title.as_bytes();
        buf[..bytes.len()].copy_from_slice(bytes);
        buf[HEADER_SIZE..HEADER_SIZE + 4].copy_from_slice(id);
        buf
    }

    #[test]
    fn recognises_protracker_signature() {
        let buf = build("Song Title", b"M.K.");
        let mut src = BufferedSource::new(Cursor::new(buf), "t.mod");
        let mut record = MetadataRecord::new();
        read_mod(&mut src, &mut record).unwrap();
        assert_eq!(record.title, "Song Title");
        assert_eq!(record.frequency, 44100);
        assert_eq!(record.length, 120_000);
    }

    #[test]
    fn recognises_fasttracker_8_channel_signature() {
        let buf = build("8 Channels", b"8CHN");
        let mut src = BufferedSource::new(Cursor::new(buf), "t.mod");
        let mut record = MetadataRecord::new();
        read_mod(&mut src, &mut record).unwrap();
        assert_eq!(record.title, "8 Channels");
    }

    #[test]
    fn rejects_unknown_signature() {
        let buf = build("Not A Module", b"ZZZZ");
        let mut src = BufferedSource::new(Cursor::new(buf), "t.mod");
        let mut record = MetadataRecord::new();
        assert!(read_mod(&mut src, &mut record).is_err());
    }
}
