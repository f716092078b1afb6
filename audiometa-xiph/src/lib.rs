//! Ogg-packet demuxing for Vorbis/Opus/Speex and the standalone FLAC container.

pub mod flac;
pub mod ogg;

use audiometa_core::endian::read_le32;
use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::{invalid_stream_parameters_error, malformed_error, Result};
use audiometa_metadata::vorbis::read_vorbis_comments;

pub use flac::read_flac;

/// Reads an Ogg-contained Vorbis, Opus, or Speex stream: the identification header supplies
/// `frequency`/`channels` (the comment packet carries none of its own for Opus/Speex), and the
/// comment header supplies every tag.
pub fn read_ogg<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    let filesize = src.size()?;
    record.filesize = filesize;
    src.seek(0, Whence::Start)?;

    let packets = ogg::read_packets(src, 2)?;
    if packets.len() < 2 {
        return malformed_error("ogg: fewer than two packets in logical stream");
    }
    let (id_header, _id_offset) = &packets[0];
    let (comment_packet, comment_offset) = &packets[1];

    let (codec, comment_body, body_offset) = gate_comment_packet(id_header, comment_packet)?;
    record.codec = codec;

    if let Some(rate) = ogg::opus_id_header_sample_rate(id_header) {
        if record.frequency == 0 {
            record.frequency = rate;
        }
    } else if let Some((rate, channels)) = ogg::speex_id_header_params(id_header) {
        if record.frequency == 0 {
            record.frequency = rate;
        }
        if record.channels == 0 {
            record.channels = channels;
        }
    } else if let Some((rate, channels)) = vorbis_id_header_params(id_header) {
        if record.frequency == 0 {
            record.frequency = rate;
        }
        if record.channels == 0 {
            record.channels = channels;
        }
    }

    read_vorbis_comments(comment_body, comment_offset + body_offset as u64, record)?;

    if record.frequency == 0 {
        return invalid_stream_parameters_error("ogg: no identification header sample rate found");
    }
    src.seek(0, Whence::Start)?;
    Ok(())
}

/// Returns the codec, the comment body with its packet-type framing stripped, and the byte
/// offset within `comment_packet` where that body starts.
fn gate_comment_packet<'a>(
    id_header: &[u8],
    comment_packet: &'a [u8],
) -> Result<(Codec, &'a [u8], usize)> {
    if comment_packet.len() >= 7 && comment_packet[0] == 0x03 && &comment_packet[1..7] == b"vorbis" {
        return Ok((Codec::Vorbis, &comment_packet[7..], 7));
    }
    if comment_packet.len() >= 8 && &comment_packet[0..8] == b"OpusTags" {
        return Ok((Codec::Opus, &comment_packet[8..], 8));
    }
    // Speex's comment packet carries no packet-type framing of its own; gate on the
    // identification header's magic instead.
    if id_header.len() >= 8 && &id_header[0..8] == b"Speex   " {
        return Ok((Codec::Speex, comment_packet, 0));
    }
    malformed_error("ogg: unrecognised comment-packet framing")
}

/// Vorbis identification header: `0x01` + `"vorbis"` + version(4) + channels(1) + rate(4 LE) + ...
fn vorbis_id_header_params(packet: &[u8]) -> Option<(u32, u32)> {
    if packet.len() < 16 || packet[0] != 0x01 || &packet[1..7] != b"vorbis" {
        return None;
    }
    let channels = packet[11] as u32;
    let rate = read_le32(&packet[12..16]);
    Some((rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    fn ogg_page(serial: u32, sequence: u32, packets: &[&[u8]]) -> Vec<u8> {
        let mut segments = Vec::new();
        let mut body = Vec::new();
        for p in packets {
            let mut remaining = p.len();
            while remaining >= 255 {
                segments.push(255u8);
                remaining -= 255;
            }
            segments.push(remaining as u8);
            body.extend_from_slice(p);
        }
        let mut out = Vec::new();
        out.extend_from_slice(b"OggS");
        out.push(0);
        out.push(0x02);
        out.extend_from_slice(&0u64.to_le_bytes());
        out.extend_from_slice(&serial.to_le_bytes());
        out.extend_from_slice(&sequence.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes());
        out.push(segments.len() as u8);
        out.extend_from_slice(&segments);
        out.extend_from_slice(&body);
        out
    }

    fn vorbis_id_header(rate: u32, channels: u8) -> Vec<u8> {
        let mut h = vec![0x01];
        h.extend_from_slice(b"vorbis");
        h.extend_from_slice(&1u32.to_le_bytes()); // version
        h.push(channels);
        h.extend_from_slice(&rate.to_le_bytes());
        h.extend_from_slice(&0u32.to_le_bytes()); // bitrate_max
        h.extend_from_slice(&0u32.to_le_bytes()); // bitrate_nominal
        h.extend_from_slice(&0u32.to_le_bytes()); // bitrate_min
        h.push(0); // blocksize
        h.push(1); // framing
        h
    }

    fn vorbis_comment_packet(vendor: &str, comments: &[&str]) -> Vec<u8> {
        let mut h = vec![0x03];
        h.extend_from_slice(b"vorbis");
        h.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        h.extend_from_slice(vendor.as_bytes());
        h.extend_from_slice(&(comments.len() as u32).to_le_bytes());
        for c in comments {
            h.extend_from_slice(&(c.len() as u32).to_le_bytes());
            h.extend_from_slice(c.as_bytes());
        }
        h
    }

    #[test]
    fn vorbis_stream_reads_rate_and_tags() {
        let id = vorbis_id_header(44100, 2);
        let comment = vorbis_comment_packet("libvorbis", &["ARTIST=Bach"]);
        let mut file = ogg_page(1, 0, &[&id]);
        file.extend(ogg_page(1, 1, &[&comment]));

        let mut src = BufferedSource::new(Cursor::new(file), "t.ogg");
        let mut record = MetadataRecord::new();
        read_ogg(&mut src, &mut record).unwrap();
        assert_eq!(record.frequency, 44100);
        assert_eq!(record.channels, 2);
        assert_eq!(record.artist, "Bach");
        assert_eq!(record.codec, Codec::Vorbis);
    }

    #[test]
    fn opus_tags_packet_is_gated_and_stripped() {
        let mut id = b"OpusHead".to_vec();
        id.push(1);
        id.push(2);
        id.extend_from_slice(&0u16.to_le_bytes());
        id.extend_from_slice(&48000u32.to_le_bytes());

        let mut comment = b"OpusTags".to_vec();
        comment.extend_from_slice(&vorbis_comment_body("libopus", &["TITLE=Song"]));

        let mut file = ogg_page(2, 0, &[&id]);
        file.extend(ogg_page(2, 1, &[&comment]));

        let mut src = BufferedSource::new(Cursor::new(file), "t.opus");
        let mut record = MetadataRecord::new();
        read_ogg(&mut src, &mut record).unwrap();
        assert_eq!(record.frequency, 48000);
        assert_eq!(record.title, "Song");
        assert_eq!(record.codec, Codec::Opus);
    }

    fn vorbis_comment_body(vendor: &str, comments: &[&str]) -> Vec<u8> {
        let mut h = Vec::new();
        h.extend_from_slice(&(vendor.len() as u32).to_le_bytes());
        h.extend_from_slice(vendor.as_bytes());
        h.extend_from_slice(&(comments.len() as u32).to_le_bytes());
        for c in comments {
            h.extend_from_slice(&(c.len() as u32).to_le_bytes());
            h.extend_from_slice(c.as_bytes());
        }
        h
    }
}
