//! CRI ADX streams: a fixed 0x38-byte header, an optional loop-point sub-header whose shape
//! depends on a 3-byte type code, and a `"(c)CRI"` sanity check just before the sample data.

use audiometa_core::endian::read_be32;
use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::{
    invalid_magic_error, invalid_stream_parameters_error, malformed_error,
    unsupported_encryption_error, Result,
};

const HEADER_SIZE: usize = 0x38;

/// Reads an ADX stream's channel layout, sample rate, and (loop-adjusted) length.
pub fn read_adx<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::Adx;
    record.filesize = src.size()?;

    src.seek(0, Whence::Start)?;
    let mut buf = [0u8; HEADER_SIZE];
    let n = src.read_fully(&mut buf)?;
    if n < HEADER_SIZE {
        return invalid_stream_parameters_error("adx: file too small");
    }
    if buf[0] != 0x80 {
        return invalid_magic_error("adx: missing leading 0x80 byte");
    }

    let chan_start = (((buf[2] as u16) << 8) | buf[3] as u16) as i64 + 4;
    if chan_start > 4096 {
        return malformed_error("adx: implausible channel-data offset");
    }

    let channels = buf[7] as u32;
    if channels != 1 && channels != 2 {
        return malformed_error("adx: channel count is neither 1 nor 2");
    }

    let frequency = read_be32(&buf[8..12]);
    if frequency == 0 {
        return invalid_stream_parameters_error("adx: sample rate is zero");
    }
    // 32 samples packed into 18 bytes per channel.
    let bitrate = frequency * channels * 18 * 8 / 32 / 1000;
    let total_samples = read_be32(&buf[12..16]) as u64;
    let mut length = total_samples / frequency as u64 * 1000;

    if buf[0x13] == 0x08 {
        return unsupported_encryption_error("adx: encrypted ADX streams are not supported");
    }

    let loop_info = match &buf[0x10..0x13] {
        b"\x01\xF4\x03" => {
            // Soul Calibur 2 style (sub-format 03).
            if chan_start - 6 < 0x2C {
                None
            } else {
                let looping = read_be32(&buf[0x18..0x1C]);
                let end_adr = read_be32(&buf[0x28..0x2C]) as i64;
                let start_adr =
                    read_be32(&buf[0x1C..0x20]) as i64 / 32 * channels as i64 + chan_start;
                Some((looping, start_adr, end_adr))
            }
        }
        b"\x01\xF4\x04" => {
            // Standard (sub-format 04).
            if chan_start - 6 < 0x38 {
                None
            } else {
                let looping = read_be32(&buf[0x24..0x28]);
                let end_adr = read_be32(&buf[0x34..0x38]) as i64;
                let start_adr =
                    read_be32(&buf[0x28..0x2C]) as i64 / 32 * channels as i64 + chan_start;
                Some((looping, start_adr, end_adr))
            }
        }
        _ => return malformed_error("adx: unrecognised loop sub-format"),
    };

    if let Some((looping, start_adr, end_adr)) = loop_info {
        if looping != 0 {
            // Two loop passes, plus a fixed 10-second fade.
            let samples = (start_adr - chan_start) + 2 * (end_adr - start_adr);
            length = (samples * 8 / bitrate as i64 + 10_000) as u64;
        }
    }

    record.channels = channels;
    record.frequency = frequency;
    record.bitrate = bitrate;
    record.samples = total_samples;
    record.length = length;
    record.vbr = false;

    src.seek(chan_start - 6, Whence::Start)?;
    let mut tag = [0u8; 6];
    let n = src.read_fully(&mut tag)?;
    if n < 6 || &tag != b"(c)CRI" {
        return malformed_error("adx: missing '(c)CRI' channel header");
    }

    src.seek(0, Whence::Start)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use audiometa_core::io::BufferedSource;
    use std::io::Cursor;

    fn build_header(channels: u8, frequency: u32, samples: u32) -> Vec<u8> {
        let mut buf = vec![0u8; HEADER_SIZE];
        buf[0] = 0x80;
        // chan_start - 4 = 0x20, so chan_start = 0x24.
        buf[2] = 0x00;
        buf[3] = 0x20;
        buf[7] = channels;
        buf[8..12].copy_from_slice(&frequency.to_be_bytes());
        buf[12..16].copy_from_slice(&samples.to_be_bytes());
        buf[0x10..0x13].copy_from_slice(b"\x01\xF4\x04");
        buf
    }

    #[test]
    fn reads_stream_parameters_and_channel_tag() {
        let mut buf = build_header(2, 44100, 88200);
        let chan_start = 0x24i64;
        buf.resize((chan_start - 6) as usize, 0);
        buf.extend_from_slice(b"(c)CRI");
        buf.extend_from_slice(&[0u8; 64]);

        let mut src = BufferedSource::new(Cursor::new(buf), "t.adx");
        let mut record = MetadataRecord::new();
        read_adx(&mut src, &mut record).unwrap();
        assert_eq!(record.channels, 2);
        assert_eq!(record.frequency, 44100);
        assert_eq!(record.samples, 88200);
        assert_eq!(record.length, 2000);
        assert!(!record.vbr);
    }

    #[test]
    fn rejects_encrypted_stream() {
        let mut buf = build_header(1, 44100, 1000);
        buf[0x13] = 0x08;
        let chan_start = 0x24i64;
        buf.resize((chan_start - 6) as usize, 0);
        buf.extend_from_slice(b"(c)CRI");

        let mut src = BufferedSource::new(Cursor::new(buf), "t.adx");
        let mut record = MetadataRecord::new();
        assert!(read_adx(&mut src, &mut record).is_err());
    }

    #[test]
    fn rejects_bad_magic() {
        let mut src = BufferedSource::new(Cursor::new(vec![0u8; HEADER_SIZE]), "t.adx");
        let mut record = MetadataRecord::new();
        assert!(read_adx(&mut src, &mut record).is_err());
    }
}
