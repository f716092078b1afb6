//! The Vorbis-comment packet parser: vendor string plus `key=value` pairs. Usable standalone,
//! embedded in a FLAC `VORBIS_COMMENT` block, or unwrapped from an Ogg/Opus/Speex packet stream
//! by `audiometa-xiph` before being handed here.

use audiometa_core::endian::read_le32;
use audiometa_core::record::{CueSheetEncoding, MetadataRecord};
use audiometa_core::{malformed_error, Result};

use crate::common::{apply_tag, TagFamily};

const MAX_KEY_LEN: usize = 32;

/// Parses a complete Vorbis-comment packet body (vendor string + comment list) and applies every
/// recognised key to `record`. `packet_file_offset` is the absolute file offset of `packet[0]`,
/// used to resolve tags (e.g. `CUESHEET`) whose value position must be file-absolute.
pub fn read_vorbis_comments(
    packet: &[u8],
    packet_file_offset: u64,
    record: &mut MetadataRecord,
) -> Result<()> {
    if packet.len() < 4 {
        return malformed_error("vorbis comment: truncated vendor length");
    }
    let vendor_len = read_le32(packet) as usize;
    let mut cursor = 4;
    if packet.len() < cursor + vendor_len + 4 {
        return malformed_error("vorbis comment: truncated vendor string");
    }
    cursor += vendor_len;

    let comment_count = read_le32(&packet[cursor..]) as usize;
    cursor += 4;

    for _ in 0..comment_count {
        if packet.len() < cursor + 4 {
            log::debug!("vorbis comment: truncated comment list, stopping early");
            break;
        }
        let len = read_le32(&packet[cursor..]) as usize;
        cursor += 4;
        if packet.len() < cursor + len {
            log::debug!("vorbis comment: comment entry overruns packet, stopping early");
            break;
        }
        let entry = &packet[cursor..cursor + len];
        let entry_file_offset = packet_file_offset + cursor as u64;
        cursor += len;

        apply_comment_entry(entry, entry_file_offset, record);
    }

    Ok(())
}

fn apply_comment_entry(entry: &[u8], entry_file_offset: u64, record: &mut MetadataRecord) {
    let text = String::from_utf8_lossy(entry);
    let Some(eq) = text.find('=') else {
        log::debug!("vorbis comment: entry without '=' ignored");
        return;
    };
    let key: String = text[..eq].chars().take(MAX_KEY_LEN).collect();
    let value = &text[eq + 1..];

    if key.eq_ignore_ascii_case("CUESHEET") {
        if !record.has_embedded_cue_sheet {
            record.has_embedded_cue_sheet = true;
            record.cue_sheet.encoding = CueSheetEncoding::Utf8;
            record.cue_sheet.size = value.len() as u64;
            record.cue_sheet.pos = entry_file_offset + eq as u64 + 1;
        }
        return;
    }

    apply_tag(TagFamily::Vorbis, &key, value, record);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn build_packet(vendor: &str, comments: &[&str]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        out.extend_from_slice(vendor.as_bytes());
        out.extend_from_slice(&(comments.len() as u32).to_le_bytes());
        for c in comments {
            out.extend_from_slice(&(c.len() as u32).to_le_bytes());
            out.extend_from_slice(c.as_bytes());
        }
        out
    }

    #[test]
    fn scenario_5_first_writer_wins() {
        let packet = build_packet("test vendor", &["ARTIST=Bach", "ARTIST=Mozart"]);
        let mut record = MetadataRecord::new();
        read_vorbis_comments(&packet, 0, &mut record).unwrap();
        assert_eq!(record.artist, "Bach");
    }

    #[test]
    fn cuesheet_key_is_recorded_with_absolute_pos() {
        let packet = build_packet("v", &["CUESHEET=FILE \"x\" WAVE"]);
        let packet_file_offset = 1000u64;
        let mut record = MetadataRecord::new();
        read_vorbis_comments(&packet, packet_file_offset, &mut record).unwrap();
        assert!(record.has_embedded_cue_sheet);
        // 4 (vendor len) + 1 (vendor "v") + 4 (comment count) + 4 (entry len) + len("CUESHEET=").
        let expected = packet_file_offset + 4 + 1 + 4 + 4 + "CUESHEET=".len() as u64;
        assert_eq!(record.cue_sheet.pos, expected);
    }
}
