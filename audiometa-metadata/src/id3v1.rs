//! An ID3v1/ID3v1.1 metadata reader.

use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Id3Version, MetadataRecord};
use audiometa_core::text::decode_iso8859_1;
use audiometa_core::Result;

use crate::genre::lookup as genre_lookup;

/// Attempts to read a trailing ID3v1 tag from `src`, restoring the cursor afterwards. Returns
/// `true` if a tag was found and applied to `record` (first-writer-wins on every field).
pub fn read_id3v1<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<bool> {
    let size = src.size()?;
    if size < 128 {
        return Ok(false);
    }

    let mut buf = [0u8; 128];
    let n = src.scoped_read_at(-128, Whence::End, &mut buf)?;
    if n != 128 || &buf[0..3] != b"TAG" {
        return Ok(false);
    }

    record.id3v1_len = 128;

    let title = decode_field(&buf[3..33]);
    MetadataRecord::set_if_empty(&mut record.title, title);

    let artist = decode_field(&buf[33..63]);
    MetadataRecord::set_if_empty(&mut record.artist, artist);

    let album = decode_field(&buf[63..93]);
    MetadataRecord::set_if_empty(&mut record.album, album);

    let year_str = decode_field(&buf[93..97]);
    if record.year == 0 {
        if let Ok(year) = year_str.parse::<u32>() {
            record.year = year;
        }
        MetadataRecord::set_if_empty(&mut record.year_string, year_str);
    }

    // ID3v1.1: byte 125 (buf[125]) == 0 signals the track number lives in byte 126 (buf[126]).
    let (comment_bytes, version) = if buf[125] == 0 {
        if record.track_num == 0 {
            record.track_num = buf[126] as u32;
            record.track_string = record.track_num.to_string();
        }
        (&buf[97..125], Id3Version::V1_1)
    } else {
        (&buf[97..127], Id3Version::V1_0)
    };

    let comment = decode_field(comment_bytes);
    MetadataRecord::set_if_empty(&mut record.comment, comment);

    if record.genre.is_empty() {
        if let Some(name) = genre_lookup(buf[127]) {
            record.genre = name.to_string();
        }
    }

    if record.id3_version.is_none() {
        record.id3_version = Some(version);
    }

    Ok(true)
}

/// Decodes a fixed-width ISO-8859-1 field, stripping trailing spaces and NULs.
fn decode_field(bytes: &[u8]) -> String {
    let trimmed_len = bytes
        .iter()
        .rposition(|&b| b != 0 && b != b' ')
        .map(|i| i + 1)
        .unwrap_or(0);
    decode_iso8859_1(&bytes[..trimmed_len])
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    fn tag_bytes() -> Vec<u8> {
        let mut buf = vec![0u8; 128];
        buf[0..3].copy_from_slice(b"TAG");
        buf[3..3 + 4].copy_from_slice(b"Song");
        // remaining title bytes are already space-filled by the test below
        for b in buf[7..33].iter_mut() {
            *b = b' ';
        }
        buf[33..33 + 6].copy_from_slice(b"Artist");
        buf[93..93 + 4].copy_from_slice(b"2001");
        buf[97] = b'c';
        // byte 125 (index 125) = 0 => ID3v1.1, track number at 126.
        buf[125] = 0;
        buf[126] = 7;
        buf[127] = 17; // Rock
        buf
    }

    #[test]
    fn scenario_1_from_spec() {
        let mut full = vec![0u8; 50];
        full.extend_from_slice(&tag_bytes());
        let mut src = BufferedSource::new(Cursor::new(full), "test.mp3");
        let mut record = MetadataRecord::new();
        let found = read_id3v1(&mut src, &mut record).unwrap();
        assert!(found);
        assert_eq!(record.title, "Song");
        assert_eq!(record.artist, "Artist");
        assert_eq!(record.year, 2001);
        assert_eq!(record.track_num, 7);
        assert_eq!(record.genre, "Rock");
        assert_eq!(record.comment, "c");
    }

    #[test]
    fn no_tag_present_is_not_an_error() {
        let mut src = BufferedSource::new(Cursor::new(vec![0u8; 200]), "test.mp3");
        let mut record = MetadataRecord::new();
        let found = read_id3v1(&mut src, &mut record).unwrap();
        assert!(!found);
    }

    #[test]
    fn first_writer_wins_against_a_later_call() {
        let mut full = vec![0u8; 50];
        full.extend_from_slice(&tag_bytes());
        let mut src = BufferedSource::new(Cursor::new(full), "test.mp3");
        let mut record = MetadataRecord::new();
        record.title = "Already set".to_string();
        read_id3v1(&mut src, &mut record).unwrap();
        assert_eq!(record.title, "Already set");
    }

    #[test]
    fn out_of_range_genre_leaves_field_empty() {
        let mut full = vec![0u8; 50];
        let mut tag = tag_bytes();
        tag[127] = 250;
        full.extend_from_slice(&tag);
        let mut src = BufferedSource::new(Cursor::new(full), "test.mp3");
        let mut record = MetadataRecord::new();
        read_id3v1(&mut src, &mut record).unwrap();
        assert_eq!(record.genre, "");
    }
}
