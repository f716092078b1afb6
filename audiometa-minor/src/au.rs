//! Sun/NeXT `.au` audio: a `".snd"` header when present, or an assumed 8 kHz/8-bit mono stream
//! spanning the whole file when it's absent.

use audiometa_core::endian::read_be32;
use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::{invalid_stream_parameters_error, Result};

const HEADER_SIZE: usize = 24;

/// Bits per sample for encodings 1..7; index 8 holds the value for encoding 27 (G.711 ALAW).
const BITS_PER_SAMPLE: [u32; 9] = [0, 8, 8, 16, 24, 32, 32, 64, 8];

fn bits_per_sample(encoding: u32) -> u32 {
    if encoding < 8 {
        BITS_PER_SAMPLE[encoding as usize]
    } else if encoding == 27 {
        BITS_PER_SAMPLE[8]
    } else {
        0
    }
}

/// Reads a Sun audio file's stream parameters. All `.au` files are treated as CBR.
pub fn read_au<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Au;
    let filesize = src.size()?;
    record.filesize = filesize;
    record.vbr = false;

    src.seek(0, Whence::Start)?;
    let mut buf = [0u8; HEADER_SIZE];
    let n = src.read_fully(&mut buf)?;

    let (num_bytes, frequency, bitrate) = if n < HEADER_SIZE || &buf[0..4] != b".snd" {
        (filesize as u32, 8000u32, 8u32)
    } else {
        let offset = read_be32(&buf[4..8]);
        if offset < HEADER_SIZE as u32 {
            return invalid_stream_parameters_error("au: data offset smaller than header size");
        }
        let mut data_bytes = read_be32(&buf[8..12]);
        if data_bytes == 0xFFFF_FFFF {
            data_bytes = filesize as u32 - offset;
        }
        let frequency = read_be32(&buf[16..20]);
        let channels = read_be32(&buf[20..24]);
        let bps = bits_per_sample(read_be32(&buf[12..16]));
        let bitrate = bps * channels * frequency / 1000;
        (data_bytes, frequency, bitrate)
    };

    record.frequency = frequency;
    record.bitrate = bitrate;
    record.length = if bitrate != 0 {
        ((num_bytes as u64) << 3) / bitrate as u64
    } else {
        0
    };

    src.seek(0, Whence::Start)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    #[test]
    fn headerless_file_assumes_8khz_8bit_mono() {
        let mut src = BufferedSource::new(Cursor::new(vec![0u8; 1000]), "t.au");
        let mut record = MetadataRecord::new();
        read_au(&mut src, &mut record).unwrap();
        assert_eq!(record.frequency, 8000);
        assert_eq!(record.bitrate, 8);
        assert!(!record.vbr);
    }

    #[test]
    fn parses_snd_header() {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(b".snd");
        buf[4..8].copy_from_slice(&(HEADER_SIZE as u32).to_be_bytes()); // offset
        buf[8..12].copy_from_slice(&8000u32.to_be_bytes()); // byte count
        buf[12..16].copy_from_slice(&3u32.to_be_bytes()); // encoding: 16-bit linear PCM
        buf[16..20].copy_from_slice(&16000u32.to_be_bytes()); // sample rate
        buf[20..24].copy_from_slice(&1u32.to_be_bytes()); // channels
        buf.extend_from_slice(&[0u8; 8000]);

        let mut src = BufferedSource::new(Cursor::new(buf), "t.au");
        let mut record = MetadataRecord::new();
        read_au(&mut src, &mut record).unwrap();
        assert_eq!(record.frequency, 16000);
        assert_eq!(record.bitrate, 16 * 1 * 16000 / 1000);
    }

    #[test]
    fn extend_to_eof_marker_uses_filesize() {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0..4].copy_from_slice(b".snd");
        buf[4..8].copy_from_slice(&(HEADER_SIZE as u32).to_be_bytes());
        buf[8..12].copy_from_slice(&0xFFFF_FFFFu32.to_be_bytes());
        buf[12..16].copy_from_slice(&2u32.to_be_bytes()); // encoding: 8-bit linear PCM
        buf[16..20].copy_from_slice(&8000u32.to_be_bytes());
        buf[20..24].copy_from_slice(&1u32.to_be_bytes());
        buf.extend_from_slice(&[0u8; 1000]);

        let mut src = BufferedSource::new(Cursor::new(buf), "t.au");
        let mut record = MetadataRecord::new();
        read_au(&mut src, &mut record).unwrap();
        assert_eq!(record.frequency, 8000);
    }
}
