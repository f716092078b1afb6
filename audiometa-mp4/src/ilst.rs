//! iTunes-style `ilst` tag table and the `----` freeform routing rule.

use audiometa_core::endian::read_be16;
use audiometa_core::record::{AlbumArtType, MetadataRecord};
use audiometa_metadata::genre::lookup as genre_lookup;

use crate::atom::{slice_atoms, slice_atoms_with_offsets};

/// Applies every child of an already-read `ilst` atom body. `content_start` is the absolute file
/// offset of `buf[0]` (the `ilst` atom's content-start), used to resolve `covr`'s absolute art
/// position.
pub fn apply_ilst(buf: &[u8], content_start: u64, record: &mut MetadataRecord) {
    for (fourcc, content, local_offset) in slice_atoms_with_offsets(buf) {
        apply_entry(fourcc, &content, content_start + local_offset as u64, record);
    }
}

fn apply_entry(fourcc: [u8; 4], content: &[u8], content_offset: u64, record: &mut MetadataRecord) {
    if &fourcc == b"----" {
        apply_freeform(content, record);
        return;
    }
    // Every non-freeform tag value is wrapped in a nested `data` atom whose own 16-byte header
    // (8-byte box header + 4-byte version/flags + 4-byte reserved) precedes the payload.
    if content.len() < 16 {
        return;
    }
    let payload = &content[16..];
    let payload_offset = content_offset + 16;
    match &fourcc {
        b"\xa9nam" => set_text(&mut record.title, payload),
        b"\xa9ART" => set_text(&mut record.artist, payload),
        b"aART" => set_text(&mut record.album_artist, payload),
        b"\xa9alb" => set_text(&mut record.album, payload),
        b"\xa9wrt" => set_text(&mut record.composer, payload),
        b"\xa9cmt" => set_text(&mut record.comment, payload),
        b"\xa9gen" => set_text(&mut record.genre, payload),
        b"\xa9grp" => set_text(&mut record.grouping, payload),
        b"\xa9day" => apply_year(payload, record),
        b"gnre" => apply_gnre(payload, record),
        b"trkn" => apply_index(payload, &mut record.track_num, &mut record.track_string),
        b"disk" => apply_index(payload, &mut record.disc_num, &mut record.disc_string),
        b"covr" => apply_cover(payload, payload_offset, record),
        _ => log::debug!("mp4: skipping unrecognised ilst atom {:?}", String::from_utf8_lossy(&fourcc)),
    }
}

fn set_text(field: &mut String, payload: &[u8]) {
    if !field.is_empty() {
        return;
    }
    *field = String::from_utf8_lossy(payload).trim_end().to_string();
}

fn apply_year(payload: &[u8], record: &mut MetadataRecord) {
    let text = String::from_utf8_lossy(payload).trim_end().to_string();
    let digits: String = text.chars().take_while(|c| c.is_ascii_digit()).collect();
    if record.year == 0 {
        if let Ok(year) = digits.parse::<u32>() {
            if year >= 1900 {
                record.year = year;
            }
        }
    }
    MetadataRecord::set_if_empty(&mut record.year_string, text);
}

fn apply_gnre(payload: &[u8], record: &mut MetadataRecord) {
    if payload.len() < 2 || !record.genre.is_empty() {
        return;
    }
    let index = read_be16(&payload[0..2]);
    if index == 0 {
        return;
    }
    if let Some(name) = genre_lookup((index - 1) as u8) {
        record.genre = name.to_string();
    }
}

fn apply_index(payload: &[u8], num_field: &mut u32, string_field: &mut String) {
    if payload.len() < 4 || *num_field != 0 {
        return;
    }
    let index = read_be16(&payload[2..4]) as u32;
    if index > 0 {
        *num_field = index;
        MetadataRecord::set_if_empty(string_field, index.to_string());
    }
}

fn apply_cover(payload: &[u8], payload_offset: u64, record: &mut MetadataRecord) {
    if record.has_album_art || payload.is_empty() {
        return;
    }
    let art_type = if payload.starts_with(&[0xFF, 0xD8, 0xFF, 0xE0]) {
        AlbumArtType::Jpg
    } else if payload.starts_with(b"\x89PNG\r\n\x1a\n") {
        AlbumArtType::Png
    } else {
        return;
    };
    record.has_album_art = true;
    record.album_art.art_type = art_type;
    record.album_art.pos = payload_offset;
    record.album_art.size = payload.len() as u64;
}

/// `mean`/`name`/`data` triple. `name`'s text (after its own 4-byte version/flags) is matched
/// case-insensitively against the known routing keys; the `mean` reverse-DNS namespace is read
/// but not itself inspected, matching every freeform tag writer in practice using `com.apple.iTunes`.
fn apply_freeform(content: &[u8], record: &mut MetadataRecord) {
    let mut name: Option<String> = None;
    let mut value: Option<String> = None;
    for (fourcc, sub) in slice_atoms(content) {
        match &fourcc {
            b"name" if sub.len() > 4 => {
                name = Some(String::from_utf8_lossy(&sub[4..]).chars().take(32).collect());
            }
            b"data" if sub.len() > 8 => {
                value = Some(String::from_utf8_lossy(&sub[8..]).trim_end().to_string());
            }
            _ => {}
        }
    }
    let (Some(name), Some(value)) = (name, value) else { return };
    route_freeform(&name, &value, record);
}

fn route_freeform(name: &str, value: &str, record: &mut MetadataRecord) {
    if name.eq_ignore_ascii_case("iTunSMPB") {
        apply_itunsmpb_text(value, record);
    } else if name.eq_ignore_ascii_case("MusicBrainz Track Id") {
        MetadataRecord::set_if_empty(&mut record.mb_track_id, value.to_string());
    } else if name.eq_ignore_ascii_case("ALBUM ARTIST") {
        MetadataRecord::set_if_empty(&mut record.album_artist, value.to_string());
    } else if name.to_ascii_lowercase().starts_with("replaygain_") {
        audiometa_core::replaygain::parse_replaygain_key(name, value, record);
    } else {
        log::debug!("mp4: skipping unrecognised freeform tag {name:?}");
    }
}

fn apply_itunsmpb_text(text: &str, record: &mut MetadataRecord) {
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

#[cfg(test)]
mod tests {
    use super::*;

    fn data_atom(payload: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; 4 + 4]; // version/flags + reserved
        out.extend_from_slice(payload);
        let mut atom = ((8 + out.len()) as u32).to_be_bytes().to_vec();
        atom.extend_from_slice(b"data");
        atom.extend_from_slice(&out);
        atom
    }

    fn tag_atom(fourcc: &[u8; 4], payload: &[u8]) -> Vec<u8> {
        let data = data_atom(payload);
        let mut atom = ((8 + data.len()) as u32).to_be_bytes().to_vec();
        atom.extend_from_slice(fourcc);
        atom.extend_from_slice(&data);
        atom
    }

    #[test]
    fn title_tag_is_applied() {
        let buf = tag_atom(b"\xa9nam", b"Song Title");
        let mut record = MetadataRecord::new();
        apply_ilst(&buf, 0, &mut record);
        assert_eq!(record.title, "Song Title");
    }

    #[test]
    fn covr_pos_is_absolute_file_offset() {
        let jpeg = [0xFFu8, 0xD8, 0xFF, 0xE0, 0, 0, 0, 0];
        let buf = tag_atom(b"covr", &jpeg);
        let ilst_content_start = 5000u64;
        let mut record = MetadataRecord::new();
        apply_ilst(&buf, ilst_content_start, &mut record);
        assert!(record.has_album_art);
        // `covr` atom header (8) + nested `data` atom header (16) past the ilst content start.
        assert_eq!(record.album_art.pos, ilst_content_start + 8 + 16);
    }

    #[test]
    fn trkn_reads_index_at_offset_two() {
        let payload = [0u8, 0, 0, 7, 0, 0, 0, 0];
        let buf = tag_atom(b"trkn", &payload);
        let mut record = MetadataRecord::new();
        apply_ilst(&buf, 0, &mut record);
        assert_eq!(record.track_num, 7);
        assert_eq!(record.track_string, "7");
    }

    #[test]
    fn freeform_replaygain_is_routed() {
        let mut mean = vec![0u8; 4];
        mean.extend_from_slice(b"com.apple.iTunes");
        let mut mean_atom = ((8 + mean.len()) as u32).to_be_bytes().to_vec();
        mean_atom.extend_from_slice(b"mean");
        mean_atom.extend_from_slice(&mean);

        let mut name = vec![0u8; 4];
        name.extend_from_slice(b"replaygain_track_gain");
        let mut name_atom = ((8 + name.len()) as u32).to_be_bytes().to_vec();
        name_atom.extend_from_slice(b"name");
        name_atom.extend_from_slice(&name);

        let mut data = vec![0u8; 8];
        data.extend_from_slice(b"-3.0 dB");
        let mut data_atom_bytes = ((8 + data.len()) as u32).to_be_bytes().to_vec();
        data_atom_bytes.extend_from_slice(b"data");
        data_atom_bytes.extend_from_slice(&data);

        let mut content = mean_atom;
        content.extend(name_atom);
        content.extend(data_atom_bytes);

        let mut atom = ((8 + content.len()) as u32).to_be_bytes().to_vec();
        atom.extend_from_slice(b"----");
        atom.extend_from_slice(&content);

        let mut record = MetadataRecord::new();
        apply_ilst(&atom, 0, &mut record);
        assert_ne!(record.track_gain, 0);
    }
}
