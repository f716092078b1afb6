//! Bare A52/AC3 elementary streams: a 5-byte frame header gives bitrate, sample rate, and
//! (for 44.1 kHz only) an exact frame size; other rates are simple multiples of the bitrate.

use audiometa_core::io::{ByteSource, Whence};
use audiometa_core::record::{Codec, MetadataRecord};
use audiometa_core::{invalid_magic_error, invalid_stream_parameters_error, malformed_error, Result};

const BITRATES: [u32; 19] = [
    32, 40, 48, 56, 64, 80, 96, 112, 128, 160, 192, 224, 256, 320, 384, 448, 512, 576, 640,
];

/// Frame sizes in bytes for 44.1 kHz only, indexed by `frmsizecod`; other sample rates derive
/// their frame size from the bitrate directly.
const FRAME_SIZES_441: [u32; 38] = [
    69 * 2, 70 * 2, 87 * 2, 88 * 2, 104 * 2, 105 * 2, 121 * 2, 122 * 2, 139 * 2, 140 * 2, 174 * 2,
    175 * 2, 208 * 2, 209 * 2, 243 * 2, 244 * 2, 278 * 2, 279 * 2, 348 * 2, 349 * 2, 417 * 2,
    418 * 2, 487 * 2, 488 * 2, 557 * 2, 558 * 2, 696 * 2, 697 * 2, 835 * 2, 836 * 2, 975 * 2,
    976 * 2, 1114 * 2, 1115 * 2, 1253 * 2, 1254 * 2, 1393 * 2, 1394 * 2,
];

/// Reads an A52/AC3 elementary stream's bitrate and sample rate, and derives a duration from
/// filesize and frame size.
pub fn read_a52<S: ByteSource + ?Sized>(src: &mut S, record: &mut MetadataRecord) -> Result<()> {
    record.codec = Codec::A52;
    let filesize = src.size()?;
    record.filesize = filesize;

    src.seek(0, Whence::Start)?;
    let mut buf = [0u8; 5];
    let n = src.read_fully(&mut buf)?;
    if n < 5 {
        return invalid_stream_parameters_error("a52: file too small");
    }
    if buf[0] != 0x0B || buf[1] != 0x77 {
        return invalid_magic_error("a52: missing 0x0B77 sync word");
    }

    let i = buf[4] & 0x3E;
    if i > 36 {
        return malformed_error("a52: invalid frmsizecod");
    }
    let bitrate = BITRATES[(i >> 1) as usize];

    let (frequency, bytes_per_frame) = match buf[4] & 0xC0 {
        0x00 => (48000u32, bitrate * 2 * 2),
        0x40 => (44100u32, FRAME_SIZES_441[(i >> 1) as usize]),
        0x80 => (32000u32, bitrate * 3 * 2),
        _ => return malformed_error("a52: invalid sample rate code"),
    };

    record.vbr = false;
    record.bitrate = bitrate;
    record.frequency = frequency;
    record.bytes_per_frame = bytes_per_frame;

    // One A52 frame holds 6 blocks of 256 samples each.
    let total_samples = (filesize / bytes_per_frame as u64) * 6 * 256;
    record.samples = total_samples;
    record.length = total_samples * 1000 / frequency as u64;

    src.seek(0, Whence::Start)?;
    Ok(())
}
