//! An Ogg page demuxer: capture-pattern sync, segment-table parsing, and packet reassembly across
//! page boundaries, simplified from the teacher's CRC-checked `PageReader` (no checksum
//! verification — this library only needs packet boundaries, not stream integrity).

use audiometa_core::endian::read_le32;
use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::{invalid_magic_error, malformed_error, Result};

const PAGE_HEADER_SIZE: usize = 27;

struct PageHeader {
    serial: u32,
    n_segments: u8,
}

fn read_page_header<S: ByteSource + ?Sized>(src: &mut S) -> Result<Option<PageHeader>> {
    let mut header = [0u8; PAGE_HEADER_SIZE];
    let n = src.read_fully(&mut header)?;
    if n == 0 {
        return Ok(None);
    }
    if n < PAGE_HEADER_SIZE || &header[0..4] != b"OggS" {
        return invalid_magic_error("ogg: missing page capture pattern");
    }
    let serial = read_le32(&header[14..18]);
    let n_segments = header[26];
    Ok(Some(PageHeader { serial, n_segments }))
}

/// Reads up to `max_packets` complete packets from the first logical Ogg stream found (its
/// serial number is locked on the first page read; pages belonging to any other stream
/// interleaved in the same container are skipped). The current byte-source position is left
/// wherever the last page read ends.
///
/// Each returned packet is paired with the absolute file offset of its first byte, so that
/// metadata embedded in a packet (e.g. a Vorbis-comment `CUESHEET` entry) can report a
/// file-absolute position rather than one relative to the reassembled packet buffer.
pub fn read_packets<S: ByteSource + ?Sized>(
    src: &mut S,
    max_packets: usize,
) -> Result<Vec<(Vec<u8>, u64)>> {
    let mut packets = Vec::new();
    let mut current = Vec::new();
    let mut current_start = 0u64;
    let mut locked_serial: Option<u32> = None;

    while packets.len() < max_packets {
        let Some(header) = read_page_header(src)? else { break };

        let mut segment_table = vec![0u8; header.n_segments as usize];
        let n = src.read_fully(&mut segment_table)?;
        if n < segment_table.len() {
            return malformed_error("ogg: truncated segment table");
        }
        let body_start = src.seek(0, Whence::Current)?;
        let body_len: usize = segment_table.iter().map(|&s| s as usize).sum();
        let mut body = vec![0u8; body_len];
        let n = src.read_fully(&mut body)?;
        body.truncate(n);

        if let Some(serial) = locked_serial {
            if header.serial != serial {
                continue;
            }
        } else {
            locked_serial = Some(header.serial);
        }

        let mut cursor = 0usize;
        for &seg_len in &segment_table {
            if current.is_empty() {
                current_start = body_start + cursor as u64;
            }
            let end = (cursor + seg_len as usize).min(body.len());
            current.extend_from_slice(&body[cursor..end]);
            cursor = end;
            if seg_len < 255 {
                packets.push((std::mem::take(&mut current), current_start));
                if packets.len() >= max_packets {
                    break;
                }
            }
        }
    }
    Ok(packets)
}

/// Reads the 32-bit little-endian sample rate at byte offset 12 of an Opus identification header
/// packet (`"OpusHead"` + version + channels + pre-skip + rate + ...), or `None` if `packet`
/// doesn't look like one.
pub fn opus_id_header_sample_rate(packet: &[u8]) -> Option<u32> {
    if packet.len() < 16 || &packet[0..8] != b"OpusHead" {
        return None;
    }
    Some(read_le32(&packet[12..16]))
}

/// Reads the frequency/channels pair from a Speex identification header (magic `"Speex   "`,
/// version string, then a fixed-offset header with rate at byte 64 and channels at byte 72, all
/// little-endian, matching `libspeex`'s `SpeexHeader` layout).
pub fn speex_id_header_params(packet: &[u8]) -> Option<(u32, u32)> {
    if packet.len() < 76 || &packet[0..8] != b"Speex   " {
        return None;
    }
    let rate = read_le32(&packet[64..68]);
    let channels = read_le32(&packet[72..76]);
    Some((rate, channels))
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    fn build_page(serial: u32, sequence: u32, segments: &[u8], body: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"OggS");
        out.push(0); // version
        out.push(0x02); // flags: first page
        out.extend_from_slice(&0u64.to_le_bytes()); // granule position
        out.extend_from_slice(&serial.to_le_bytes());
        out.extend_from_slice(&sequence.to_le_bytes());
        out.extend_from_slice(&0u32.to_le_bytes()); // crc, unchecked
        out.push(segments.len() as u8);
        out.extend_from_slice(segments);
        out.extend_from_slice(body);
        out
    }

    #[test]
    fn single_page_single_packet() {
        let page = build_page(1, 0, &[5], b"hello");
        let mut src = BufferedSource::new(Cursor::new(page), "t.ogg");
        let packets = read_packets(&mut src, 1).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].0, b"hello".to_vec());
        // Page header (27 bytes) + 1-byte segment table.
        assert_eq!(packets[0].1, 28);
    }

    #[test]
    fn packet_spans_two_pages() {
        let first_body: Vec<u8> = std::iter::repeat(b'a').take(255).chain(std::iter::repeat(b'b').take(3)).collect();
        let page1 = build_page(1, 0, &[255], &first_body[..255]);
        let page2 = build_page(1, 1, &[3], &first_body[255..]);
        let mut combined = page1;
        combined.extend(page2);
        let mut src = BufferedSource::new(Cursor::new(combined), "t.ogg");
        let packets = read_packets(&mut src, 1).unwrap();
        assert_eq!(packets.len(), 1);
        assert_eq!(packets[0].0.len(), 258);
        // Packet starts at the first page's body, same as the single-page case.
        assert_eq!(packets[0].1, 28);
    }

    #[test]
    fn opus_id_header_reads_rate() {
        let mut packet = b"OpusHead".to_vec();
        packet.push(1); // version
        packet.push(2); // channels
        packet.extend_from_slice(&0u16.to_le_bytes()); // pre-skip
        packet.extend_from_slice(&48000u32.to_le_bytes());
        assert_eq!(opus_id_header_sample_rate(&packet), Some(48000));
    }
}
